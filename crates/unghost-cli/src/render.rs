//! Plain-text rendering of the conversation for the terminal.

use std::collections::HashMap;
use std::fmt::Write;

use unghost_store::MessageStore;
use unghost_types::{parse_partial, Agent, FeedbackOption, Message, PlanPreview, PodcastContent, Role};

/// Messages shown in the main conversation, in order. Research activity is
/// folded into a card keyed by the research id.
pub fn visible_ids(store: &MessageStore) -> Vec<&str> {
    store
        .messages()
        .filter(|message| is_main_view(store, message))
        .map(|message| message.id.as_str())
        .collect()
}

fn is_main_view(store: &MessageStore, message: &Message) -> bool {
    if store.research().contains(&message.id) {
        return true;
    }
    match message.role {
        Role::User => true,
        Role::Assistant => match &message.agent {
            Some(agent) if agent.is_research_activity() => false,
            _ => !message.is_empty(),
        },
    }
}

/// Render one entry of the main view.
pub fn render_entry(store: &MessageStore, message: &Message) -> String {
    render_block(store, message, true)
}

fn render_block(store: &MessageStore, message: &Message, streaming_marker: bool) -> String {
    if store.research().contains(&message.id) {
        return render_research_card(store, &message.id);
    }
    match (&message.role, &message.agent) {
        (Role::User, _) => render_user(message),
        (_, Some(Agent::Planner)) => render_plan(message),
        (_, Some(Agent::Podcast)) => render_podcast(message),
        _ => render_assistant(message, streaming_marker),
    }
}

pub fn render_conversation(store: &MessageStore) -> String {
    visible_ids(store)
        .into_iter()
        .filter_map(|id| store.get_message(id))
        .map(|message| render_entry(store, message))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_user(message: &Message) -> String {
    let mut out = String::new();
    for line in message.content.lines() {
        let _ = writeln!(out, "> {}", line);
    }
    for resource in &message.resources {
        let _ = writeln!(out, ">   @{} ({})", resource.title, resource.uri);
    }
    out.trim_end().to_string()
}

fn render_assistant(message: &Message, streaming_marker: bool) -> String {
    let mut out = String::new();
    if let Some(reasoning) = message.reasoning_content.as_deref().filter(|r| !r.trim().is_empty()) {
        let _ = writeln!(out, "[thinking] {}", reasoning.trim());
    }
    out.push_str(message.content.trim());
    if message.is_streaming && streaming_marker {
        out.push_str(" ...");
    }
    if message.is_interrupt() {
        out.push('\n');
        out.push_str(&render_options(&message.options));
    }
    out.trim_end().to_string()
}

pub fn render_plan(message: &Message) -> String {
    let plan = PlanPreview::from_message(message).value;
    let mut out = String::new();

    if let Some(reasoning) = message.reasoning_content.as_deref().filter(|r| !r.trim().is_empty()) {
        let _ = writeln!(out, "[thinking] {}", reasoning.trim());
    }
    let _ = writeln!(out, "### {}", plan.display_title(message.is_streaming));
    if let Some(thought) = &plan.thought {
        let _ = writeln!(out, "{}", thought);
    }
    for (index, step) in plan.steps.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {}",
            index + 1,
            step.title.as_deref().unwrap_or("...")
        );
        if let Some(description) = &step.description {
            let _ = writeln!(out, "   {}", description);
        }
    }
    out.trim_end().to_string()
}

pub fn render_podcast(message: &Message) -> String {
    let podcast: PodcastContent = parse_partial::<Option<PodcastContent>>(&message.content)
        .value
        .unwrap_or_else(|| PodcastContent::pending(None));
    let title = podcast.title.as_deref().unwrap_or("Podcast");

    match (&podcast.audio_url, &podcast.error) {
        (_, Some(error)) => format!("[podcast] {}: generation failed ({})", title, error),
        (Some(url), None) => format!("[podcast] {}: {}", title, url),
        (None, None) => format!("[podcast] {}: generating...", title),
    }
}

/// Card for one research thread: plan title, progress and report state.
pub fn render_research_card(store: &MessageStore, research_id: &str) -> String {
    let research = store.research();
    let title = research
        .plan_id(research_id)
        .and_then(|id| store.get_message(id))
        .map(|plan| PlanPreview::from_message(plan).value.display_title(plan.is_streaming))
        .unwrap_or_else(|| "Research".to_string());

    let ongoing = research.ongoing_id() == Some(research_id);
    let status = match store.research_report(research_id) {
        Some(report) if !report.is_streaming => "report ready",
        Some(_) => "writing report",
        None if ongoing => "researching",
        None => "stopped",
    };

    let mut out = format!("[research] {} ({})", title, status);
    if let Some(activity) = store.research_last_activity(research_id) {
        let label = activity.agent.as_ref().map_or("assistant", |agent| agent.as_str());
        let steps = research.activity_ids(research_id).len();
        let _ = write!(out, "\n  {} steps, latest: {}", steps, label);
    }
    out
}

pub fn render_options(options: &[FeedbackOption]) -> String {
    options
        .iter()
        .enumerate()
        .map(|(index, option)| format!("  [{}] {}", index + 1, option.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Terminal output that follows the store while a turn streams.
///
/// An entry that keeps growing at the bottom is extended in place. Any other
/// change redraws the entry as a new block, so research cards and plans show
/// up again when their text changes.
#[derive(Debug, Default)]
pub struct LiveView {
    drawn: HashMap<String, String>,
    open: Option<String>,
}

impl LiveView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text to print so the terminal reflects `store`.
    pub fn refresh(&mut self, store: &MessageStore) -> String {
        let mut out = String::new();

        for id in visible_ids(store) {
            let Some(message) = store.get_message(id) else {
                continue;
            };
            let block = render_block(store, message, false);
            let is_open = self.open.as_deref() == Some(id);

            let drawn = self.drawn.get(id);
            if drawn != Some(&block) {
                let extended = drawn
                    .filter(|previous| is_open && block.starts_with(previous.as_str()))
                    .map(String::len);
                match extended {
                    Some(len) => out.push_str(&block[len..]),
                    None => {
                        self.close(&mut out);
                        out.push_str(&block);
                        self.open = Some(id.to_string());
                    }
                }
                self.drawn.insert(id.to_string(), block);
            }

            let settled = !message.is_streaming || store.research().contains(id);
            if settled && self.open.as_deref() == Some(id) {
                self.close(&mut out);
            }
        }
        out
    }

    /// Like [`refresh`](Self::refresh), also ending an entry left open.
    pub fn finish(&mut self, store: &MessageStore) -> String {
        let mut out = self.refresh(store);
        self.close(&mut out);
        out
    }

    fn close(&mut self, out: &mut String) {
        if self.open.take().is_some() {
            out.push_str("\n\n");
        }
    }
}
