use serde::{Deserialize, Serialize};

use crate::json::{parse_partial, Partial};
use crate::message::Message;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepPreview {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// The parts of a research plan shown while the planner streams.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanPreview {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub thought: Option<String>,
    #[serde(default)]
    pub steps: Vec<StepPreview>,
    #[serde(default)]
    pub has_enough_context: Option<bool>,
}

impl PlanPreview {
    pub fn from_message(message: &Message) -> Partial<Self> {
        parse_partial(&message.content)
    }

    /// Title to display, with a placeholder while the planner is still thinking.
    pub fn display_title(&self, is_streaming: bool) -> String {
        match &self.title {
            Some(title) => title.clone(),
            None if is_streaming => "Generating Outreach Plan...".to_string(),
            None => "Outreach Plan".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Agent, Role};

    #[test]
    fn test_preview_of_streaming_planner() {
        let mut message = Message::streaming("p1", "t1", Role::Assistant, Some(Agent::Planner));
        message.content =
            r#"```json
{"locale": "en-US", "has_enough_context": false, "title": "Reach Sarah", "steps": [{"title": "Background", "descr"#
                .to_string();

        let preview = PlanPreview::from_message(&message);
        assert!(!preview.complete);
        assert_eq!(preview.value.title.as_deref(), Some("Reach Sarah"));
        assert_eq!(preview.value.has_enough_context, Some(false));
        assert_eq!(preview.value.steps.len(), 1);
        assert_eq!(preview.value.steps[0].title.as_deref(), Some("Background"));
        assert_eq!(preview.value.display_title(true), "Reach Sarah");
    }

    #[test]
    fn test_placeholder_title() {
        let preview = PlanPreview::default();
        assert_eq!(preview.display_title(true), "Generating Outreach Plan...");
        assert_eq!(preview.display_title(false), "Outreach Plan");
    }
}
