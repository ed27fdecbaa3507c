use std::collections::HashMap;

use unghost_types::{Agent, EventPayload, Message, MessageEvent, Role};

use crate::error::{Result, StoreError};
use crate::merge::{finalize, merge_payload};
use crate::research::ResearchThreads;

/// Canonical chat state rebuilt from the event stream.
///
/// The store has a single writer: every mutation takes `&mut self`, while
/// views borrow `&self`, so a reader always sees the state between two whole
/// events.
#[derive(Debug, Clone)]
pub struct MessageStore {
    thread_id: String,
    messages: HashMap<String, Message>,
    message_ids: Vec<String>,
    research: ResearchThreads,
    responding: bool,
}

impl MessageStore {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            messages: HashMap::new(),
            message_ids: Vec::new(),
            research: ResearchThreads::new(),
            responding: false,
        }
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// Apply one stream event.
    ///
    /// Events that cannot be applied are logged and dropped without changing
    /// any state.
    pub fn apply_event(&mut self, event: MessageEvent) {
        let message_id = event.id.clone();
        let kind = event.payload.kind();
        if let Err(e) = self.try_apply_event(event) {
            tracing::warn!(message_id = %message_id, kind, error = %e, "dropping stream event");
        }
    }

    fn try_apply_event(&mut self, event: MessageEvent) -> Result<()> {
        // Results belong to whichever message issued the call.
        if let EventPayload::ToolCallResult { tool_call_id, .. } = &event.payload {
            let owner_id = self
                .find_tool_call_owner(tool_call_id)
                .ok_or_else(|| StoreError::ToolCallNotFound(tool_call_id.clone()))?;
            if let Some(owner) = self.messages.get_mut(&owner_id) {
                merge_payload(owner, event.payload)?;
            }
            return Ok(());
        }

        if event.id.is_empty() {
            return Err(StoreError::MissingMessageId {
                kind: event.payload.kind(),
            });
        }

        let id = event.id;
        match self.messages.get_mut(&id) {
            Some(message) => merge_payload(message, event.payload)?,
            None => {
                let thread_id = if event.thread_id.is_empty() {
                    self.thread_id.clone()
                } else {
                    event.thread_id
                };
                let mut message = Message::streaming(id.clone(), thread_id, event.role, event.agent);
                merge_payload(&mut message, event.payload)?;
                self.append_message(message);
            }
        }

        self.after_update(&id);
        Ok(())
    }

    /// Add a complete message, such as one the user typed.
    ///
    /// Research activity messages open a new research when none is ongoing.
    /// Appending an id that already exists replaces that message in place.
    pub fn append_message(&mut self, message: Message) {
        let is_activity = message.role == Role::Assistant
            && message
                .agent
                .as_ref()
                .map_or(false, Agent::is_research_activity);

        if is_activity {
            if self.research.ongoing_id().is_none() {
                let plan_id = self.last_message_by_agent(&Agent::Planner).map(|m| m.id.clone());
                if plan_id.is_none() {
                    tracing::debug!(research_id = %message.id, "research started without a plan");
                }
                self.research.start(&message.id, plan_id.as_deref());
                self.research.open(message.id.clone());
            }
            self.research
                .append_activity(&message.id, message.is_agent(&Agent::Reporter));
        }

        let id = message.id.clone();
        if self.messages.insert(id.clone(), message).is_none() {
            self.message_ids.push(id.clone());
        }
        self.after_update(&id);
    }

    fn after_update(&mut self, id: &str) {
        let finalized = self.messages.get(id).map_or(false, |m| !m.is_streaming);
        if finalized && self.research.finish_if_report(id) {
            tracing::debug!(report_id = %id, "research report completed");
        }
    }

    fn find_tool_call_owner(&self, tool_call_id: &str) -> Option<String> {
        self.message_ids
            .iter()
            .rev()
            .filter_map(|id| self.messages.get(id))
            .find(|message| message.tool_calls.iter().any(|call| call.id == tool_call_id))
            .map(|message| message.id.clone())
    }

    fn last_message_by_agent(&self, agent: &Agent) -> Option<&Message> {
        self.message_ids
            .iter()
            .rev()
            .filter_map(|id| self.messages.get(id))
            .find(|message| message.is_agent(agent))
    }

    /// Finalize every message that is still streaming, e.g. after the user
    /// stopped generation or the transport failed. Returns how many changed.
    pub fn finalize_streaming(&mut self) -> usize {
        let streaming: Vec<String> = self
            .message_ids
            .iter()
            .filter(|id| self.messages.get(*id).map_or(false, |m| m.is_streaming))
            .cloned()
            .collect();

        for id in &streaming {
            if let Some(message) = self.messages.get_mut(id) {
                finalize(message, None);
            }
            self.after_update(id);
        }
        streaming.len()
    }

    pub fn get_message(&self, id: &str) -> Option<&Message> {
        self.messages.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.messages.contains_key(id)
    }

    /// Message ids in creation order.
    pub fn ordered_ids(&self) -> &[String] {
        &self.message_ids
    }

    /// Messages in creation order.
    pub fn messages(&self) -> impl Iterator<Item = &Message> + '_ {
        self.message_ids
            .iter()
            .filter_map(|id| self.messages.get(id))
    }

    pub fn len(&self) -> usize {
        self.message_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.message_ids.is_empty()
    }

    pub fn responding(&self) -> bool {
        self.responding
    }

    pub fn set_responding(&mut self, responding: bool) {
        self.responding = responding;
    }

    pub fn open_research(&mut self, research_id: impl Into<String>) {
        self.research.open(research_id);
    }

    pub fn close_research(&mut self) {
        self.research.close();
    }

    /// See [`ResearchThreads::register_report`].
    pub fn register_research_report(
        &mut self,
        research_id: &str,
        report_message_id: &str,
    ) -> bool {
        self.research.register_report(research_id, report_message_id)
    }

    pub fn research(&self) -> &ResearchThreads {
        &self.research
    }

    pub fn open_research_id(&self) -> Option<&str> {
        self.research.open_id()
    }

    pub fn ongoing_research_id(&self) -> Option<&str> {
        self.research.ongoing_id()
    }

    pub fn research_report(&self, research_id: &str) -> Option<&Message> {
        self.research
            .report_id(research_id)
            .and_then(|id| self.messages.get(id))
    }

    /// Latest activity message of a research, shown on its card.
    pub fn research_last_activity(&self, research_id: &str) -> Option<&Message> {
        self.research
            .activity_ids(research_id)
            .last()
            .and_then(|id| self.messages.get(id))
    }

    /// The last message, when it is waiting for the user's feedback.
    pub fn last_interrupt_message(&self) -> Option<&Message> {
        self.message_ids
            .last()
            .and_then(|id| self.messages.get(id))
            .filter(|message| message.is_interrupt())
    }

    /// The message the pending feedback applies to (the one before the interrupt).
    pub fn last_feedback_message_id(&self) -> Option<&str> {
        self.last_interrupt_message()?;
        let len = self.message_ids.len();
        if len < 2 {
            return None;
        }
        Some(self.message_ids[len - 2].as_str())
    }
}
