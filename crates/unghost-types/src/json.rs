//! Lenient JSON for content that is still streaming.
//!
//! Planner and podcast messages carry JSON in their text body. While the
//! message streams the text is a prefix of a JSON document, often wrapped in a
//! markdown code fence. [`parse_partial`] turns such a prefix into the largest
//! structure it can recover and reports whether the document was complete.
//! Once a message is finalized, [`parse_exact`] gives the strict result.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Best-effort parse result.
#[derive(Debug, Clone, PartialEq)]
pub struct Partial<T> {
    pub value: T,
    /// The text parsed as-is, without any repair.
    pub complete: bool,
}

impl<T> Partial<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Partial<U> {
        Partial {
            value: f(self.value),
            complete: self.complete,
        }
    }
}

/// Strip code fences and any prose around the first JSON object or array.
pub fn extract_json(text: &str) -> &str {
    let mut cleaned = text.trim();

    if let Some(rest) = cleaned.strip_prefix("```") {
        let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
        cleaned = rest.trim_start();
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest.trim_end();
    }

    if !cleaned.starts_with('{') && !cleaned.starts_with('[') {
        if let Some(start) = cleaned.find(['{', '[']) {
            cleaned = &cleaned[start..];
        }
    }

    cleaned
}

/// Strict parse of a finalized message body.
pub fn parse_exact<T: DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(extract_json(text))
}

/// Best-effort parse of a possibly truncated message body.
///
/// Returns `None` when nothing structured can be recovered yet.
pub fn parse_partial_value(text: &str) -> Option<Partial<Value>> {
    let json = extract_json(text);
    if json.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<Value>(json) {
        return Some(Partial {
            value,
            complete: true,
        });
    }

    repair(json).map(|value| Partial {
        value,
        complete: false,
    })
}

/// Best-effort parse into `T`, falling back to `T::default()`.
///
/// Fields that could not be recovered take their serde defaults, so `T`
/// should mark optional members with `#[serde(default)]`.
pub fn parse_partial<T: DeserializeOwned + Default>(text: &str) -> Partial<T> {
    match parse_partial_value(text) {
        Some(partial) => match serde_json::from_value::<T>(partial.value) {
            Ok(value) => Partial {
                value,
                complete: partial.complete,
            },
            Err(e) => {
                tracing::debug!(error = %e, "partial JSON does not match the expected shape");
                Partial {
                    value: T::default(),
                    complete: false,
                }
            }
        },
        None => Partial {
            value: T::default(),
            complete: false,
        },
    }
}

/// Position where the text may be cut and still form a valid prefix once the
/// open containers are closed.
struct CutPoint {
    pos: usize,
    depth: usize,
}

fn close(prefix: &str, closers: &[char]) -> String {
    let mut repaired = String::with_capacity(prefix.len() + closers.len());
    repaired.push_str(prefix);
    repaired.extend(closers.iter().rev());
    repaired
}

fn repair(json: &str) -> Option<Value> {
    let mut closers: Vec<char> = Vec::new();
    let mut cut_points: Vec<CutPoint> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (pos, c) in json.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => {
                closers.push('}');
                cut_points.push(CutPoint {
                    pos: pos + 1,
                    depth: closers.len(),
                });
            }
            '[' => {
                closers.push(']');
                cut_points.push(CutPoint {
                    pos: pos + 1,
                    depth: closers.len(),
                });
            }
            '}' | ']' => {
                if closers.pop() != Some(c) {
                    return None;
                }
                cut_points.retain(|cut| cut.depth <= closers.len());
                if closers.is_empty() {
                    // Anything after the top-level value is noise.
                    return serde_json::from_str(&json[..=pos]).ok();
                }
            }
            ',' => cut_points.push(CutPoint {
                pos,
                depth: closers.len(),
            }),
            _ => {}
        }
    }

    // First try keeping everything, terminating a dangling string.
    let mut whole = json.trim_end().to_string();
    if in_string {
        if escaped {
            whole.pop();
        }
        whole.push('"');
    }
    let whole = whole.trim_end_matches([',', ':', ' ', '\n', '\r', '\t']);
    if let Ok(value) = serde_json::from_str(&close(whole, &closers)) {
        return Some(value);
    }

    // Otherwise drop trailing members until the rest parses.
    for cut in cut_points.iter().rev() {
        let candidate = close(&json[..cut.pos], &closers[..cut.depth]);
        if let Ok(value) = serde_json::from_str(&candidate) {
            return Some(value);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_complete_document() {
        let partial = parse_partial_value(r#"{"title": "Plan", "steps": []}"#).unwrap();
        assert!(partial.complete);
        assert_eq!(partial.value, json!({"title": "Plan", "steps": []}));
    }

    #[test]
    fn test_code_fence_is_stripped() {
        let text = "```json\n{\"title\": \"Plan\"}\n```";
        let partial = parse_partial_value(text).unwrap();
        assert!(partial.complete);
        assert_eq!(partial.value["title"], "Plan");
    }

    #[test]
    fn test_leading_prose_is_skipped() {
        let text = "Here is the plan: {\"title\": \"Plan\"}";
        assert_eq!(extract_json(text), "{\"title\": \"Plan\"}");
    }

    #[test]
    fn test_unterminated_string_is_closed() {
        let partial = parse_partial_value(r#"{"title": "Outreach to Sar"#).unwrap();
        assert!(!partial.complete);
        assert_eq!(partial.value, json!({"title": "Outreach to Sar"}));
    }

    #[test]
    fn test_dangling_key_is_dropped() {
        let partial = parse_partial_value(r#"{"title": "Plan", "tho"#).unwrap();
        assert_eq!(partial.value, json!({"title": "Plan"}));

        let partial = parse_partial_value(r#"{"title": "Plan", "thought":"#).unwrap();
        assert_eq!(partial.value, json!({"title": "Plan"}));
    }

    #[test]
    fn test_nested_arrays_are_closed() {
        let text = r#"{"title": "Plan", "steps": [{"title": "Background", "description": "Look"#;
        let partial = parse_partial_value(text).unwrap();
        assert_eq!(
            partial.value,
            json!({"title": "Plan", "steps": [{"title": "Background", "description": "Look"}]})
        );
    }

    #[test]
    fn test_closed_inner_container_keeps_outer_cut_points() {
        let partial = parse_partial_value(r#"{"steps": [1, 2], "title": tr"#).unwrap();
        assert_eq!(partial.value, json!({"steps": [1, 2]}));
    }

    #[test]
    fn test_partial_literal_falls_back_to_last_member() {
        let partial = parse_partial_value(r#"{"title": "Plan", "has_enough_context": tr"#).unwrap();
        assert_eq!(partial.value, json!({"title": "Plan"}));
    }

    #[test]
    fn test_trailing_escape_is_dropped() {
        let partial = parse_partial_value("{\"title\": \"say \\").unwrap();
        assert_eq!(partial.value, json!({"title": "say "}));
    }

    #[test]
    fn test_nothing_structured_yet() {
        assert!(parse_partial_value("").is_none());
        assert!(parse_partial_value("```json").is_none());
    }

    #[test]
    fn test_typed_partial_defaults_missing_fields() {
        #[derive(Debug, Default, serde::Deserialize)]
        struct Preview {
            #[serde(default)]
            title: Option<String>,
            #[serde(default)]
            thought: Option<String>,
        }

        let partial: Partial<Preview> = parse_partial(r#"{"title": "Pla"#);
        assert!(!partial.complete);
        assert_eq!(partial.value.title.as_deref(), Some("Pla"));
        assert!(partial.value.thought.is_none());
    }

    #[test]
    fn test_exact_parse_rejects_truncation() {
        assert!(parse_exact::<Value>(r#"{"title": "Pla"#).is_err());
        assert!(parse_exact::<Value>("```json\n{\"a\": 1}\n```").is_ok());
    }
}
