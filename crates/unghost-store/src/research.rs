use std::collections::HashMap;

/// Research threads of a chat session.
///
/// A research is keyed by the id of the message that started it. It owns the
/// plan that led to it, the ordered ids of its activity messages and at most
/// one report.
#[derive(Debug, Clone, Default)]
pub struct ResearchThreads {
    ids: Vec<String>,
    plan_ids: HashMap<String, String>,
    report_ids: HashMap<String, String>,
    activity_ids: HashMap<String, Vec<String>>,
    ongoing_id: Option<String>,
    open_id: Option<String>,
}

impl ResearchThreads {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a research and make it the ongoing one.
    pub(crate) fn start(&mut self, research_id: &str, plan_id: Option<&str>) {
        let mut activity = Vec::with_capacity(2);
        if let Some(plan_id) = plan_id {
            self.plan_ids
                .insert(research_id.to_string(), plan_id.to_string());
            activity.push(plan_id.to_string());
        }
        activity.push(research_id.to_string());

        if !self.contains(research_id) {
            self.ids.push(research_id.to_string());
        }
        self.activity_ids.insert(research_id.to_string(), activity);
        self.ongoing_id = Some(research_id.to_string());
    }

    /// Record a message as activity of the ongoing research.
    pub(crate) fn append_activity(&mut self, message_id: &str, is_report: bool) {
        let Some(research_id) = self.ongoing_id.clone() else {
            return;
        };

        let activity = self.activity_ids.entry(research_id.clone()).or_default();
        if !activity.iter().any(|id| id == message_id) {
            activity.push(message_id.to_string());
        }

        if is_report {
            self.register_report(&research_id, message_id);
        }
    }

    /// Associate a report with a known research; the last registration wins.
    ///
    /// Returns `false` and changes nothing when the research is unknown.
    pub fn register_report(&mut self, research_id: &str, report_id: &str) -> bool {
        if !self.contains(research_id) {
            tracing::debug!(research_id, report_id, "ignoring report for unknown research");
            return false;
        }
        self.report_ids
            .insert(research_id.to_string(), report_id.to_string());
        true
    }

    /// Stop tracking the ongoing research once its report is complete.
    pub(crate) fn finish_if_report(&mut self, message_id: &str) -> bool {
        let finished = self
            .ongoing_id
            .as_deref()
            .and_then(|research_id| self.report_ids.get(research_id))
            .map_or(false, |report_id| report_id == message_id);
        if finished {
            self.ongoing_id = None;
        }
        finished
    }

    pub fn open(&mut self, research_id: impl Into<String>) {
        self.open_id = Some(research_id.into());
    }

    pub fn close(&mut self) {
        self.open_id = None;
    }

    pub fn contains(&self, research_id: &str) -> bool {
        self.ids.iter().any(|id| id == research_id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn plan_id(&self, research_id: &str) -> Option<&str> {
        self.plan_ids.get(research_id).map(String::as_str)
    }

    pub fn report_id(&self, research_id: &str) -> Option<&str> {
        self.report_ids.get(research_id).map(String::as_str)
    }

    pub fn activity_ids(&self, research_id: &str) -> &[String] {
        self.activity_ids
            .get(research_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn ongoing_id(&self) -> Option<&str> {
        self.ongoing_id.as_deref()
    }

    pub fn open_id(&self) -> Option<&str> {
        self.open_id.as_deref()
    }
}
