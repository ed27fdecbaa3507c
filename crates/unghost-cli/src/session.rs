use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::StreamExt;
use thiserror::Error;
use tokio::sync::watch;
use unghost_client::{ChatBackend, ChatEventStream, ChatRequest, EnhanceRequest};
use unghost_store::{MessageStore, SettingsError, SettingsStore};
use unghost_types::{Agent, EventPayload, Message, MessageEvent, PodcastContent, Resource, Role};

const PODCAST_REQUEST: &str = "Please generate a podcast for the above research.";

#[derive(Error, Debug)]
pub enum SessionError {
    /// The backend could not be reached or the stream broke mid-way.
    #[error("Backend unavailable: {0:#}")]
    Unavailable(anyhow::Error),

    #[error("Research {0} has no report yet")]
    NoReport(String),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Asks a running stream to stop. Cloneable so another task (a Ctrl-C
/// handler) can hold it while the session is borrowed mutably.
#[derive(Debug, Clone)]
pub struct StopHandle {
    sender: Arc<watch::Sender<u64>>,
}

impl StopHandle {
    fn new() -> Self {
        let (sender, _) = watch::channel(0);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Returns false when no turn was listening, so the request had no effect.
    pub fn stop(&self) -> bool {
        self.sender.send_modify(|generation| *generation += 1);
        self.in_flight()
    }

    /// Whether a turn is currently streaming.
    pub fn in_flight(&self) -> bool {
        self.sender.receiver_count() > 0
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.sender.subscribe()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    pub interrupt_feedback: Option<String>,
    pub resources: Vec<Resource>,
}

impl SendOptions {
    pub fn feedback(value: impl Into<String>) -> Self {
        Self {
            interrupt_feedback: Some(value.into()),
            ..Self::default()
        }
    }
}

/// How a streamed turn ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamOutcome {
    pub events: usize,
    pub skipped: usize,
    pub stopped: bool,
}

/// One conversation thread: owns the store and drives backend streams into it.
pub struct ChatSession {
    store: MessageStore,
    backend: Arc<dyn ChatBackend>,
    settings: SettingsStore,
    output_dir: PathBuf,
    enable_background_investigation: bool,
    stop: StopHandle,
}

impl ChatSession {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        settings: SettingsStore,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store: MessageStore::new(uuid::Uuid::new_v4().to_string()),
            backend,
            settings,
            output_dir: output_dir.into(),
            enable_background_investigation: true,
            stop: StopHandle::new(),
        }
    }

    pub fn with_background_investigation(mut self, enabled: bool) -> Self {
        self.enable_background_investigation = enabled;
        self
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut MessageStore {
        &mut self.store
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut SettingsStore {
        &mut self.settings
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Stop the turn in flight, if any.
    pub fn stop(&self) -> bool {
        self.stop.stop()
    }

    /// Send a user turn and stream the reply into the store.
    ///
    /// Empty content is allowed when answering an interrupt; no local user
    /// message is recorded then.
    pub async fn send_message(
        &mut self,
        content: &str,
        options: SendOptions,
    ) -> Result<StreamOutcome, SessionError> {
        self.send_message_with_updates(content, options, |_, _| {}).await
    }

    /// Like [`send_message`](Self::send_message), calling `on_update` with the
    /// store and the message id after every applied event.
    pub async fn send_message_with_updates<F>(
        &mut self,
        content: &str,
        options: SendOptions,
        on_update: F,
    ) -> Result<StreamOutcome, SessionError>
    where
        F: FnMut(&MessageStore, &str),
    {
        let thread_id = self.store.thread_id().to_string();

        if !content.trim().is_empty() {
            let mut message = Message::user(&thread_id, content).with_resources(options.resources.clone());
            if let Some(feedback) = &options.interrupt_feedback {
                message = message.with_interrupt_feedback(feedback.clone());
            }
            self.store.append_message(message);
        }

        let mut request = ChatRequest::new(&thread_id, content)
            .with_settings(self.settings.settings().chat_stream_settings())
            .with_resources(options.resources)
            .with_background_investigation(self.enable_background_investigation);
        if let Some(feedback) = options.interrupt_feedback {
            request = request.with_interrupt_feedback(feedback);
        }

        tracing::info!(%thread_id, "Sending message");
        self.store.set_responding(true);
        let stop = self.stop.subscribe();
        let stream = self.backend.chat_stream(request).await;
        let outcome = self.consume(stream, stop, on_update).await;
        self.store.set_responding(false);
        outcome
    }

    /// Stream a recorded transcript into the store.
    pub async fn replay(&mut self, replay_id: &str) -> Result<StreamOutcome, SessionError> {
        self.replay_with_updates(replay_id, |_, _| {}).await
    }

    pub async fn replay_with_updates<F>(
        &mut self,
        replay_id: &str,
        on_update: F,
    ) -> Result<StreamOutcome, SessionError>
    where
        F: FnMut(&MessageStore, &str),
    {
        tracing::info!(replay_id, "Replaying transcript");
        self.store.set_responding(true);
        let stop = self.stop.subscribe();
        let stream = self.backend.fetch_replay(replay_id).await;
        let outcome = self.consume(stream, stop, on_update).await;
        self.store.set_responding(false);
        outcome
    }

    /// Drain `stream` into the store. `stop` is subscribed before the request
    /// goes out so a stop issued while connecting still counts.
    async fn consume<F>(
        &mut self,
        stream: anyhow::Result<ChatEventStream>,
        mut stop: watch::Receiver<u64>,
        mut on_update: F,
    ) -> Result<StreamOutcome, SessionError>
    where
        F: FnMut(&MessageStore, &str),
    {
        let mut stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                self.store.finalize_streaming();
                return Err(SessionError::Unavailable(e));
            }
        };

        let mut outcome = StreamOutcome::default();

        loop {
            tokio::select! {
                biased;
                _ = stop.changed() => {
                    outcome.stopped = true;
                    break;
                }
                item = stream.next() => match item {
                    None => break,
                    Some(Ok(event)) => {
                        outcome.events += 1;
                        for update in event.into_message_events() {
                            let message_id = update.id.clone();
                            self.store.apply_event(update);
                            on_update(&self.store, &message_id);
                        }
                    }
                    Some(Err(e)) if e.is_recoverable() => {
                        tracing::warn!(error = %e, "Skipping malformed event");
                        outcome.skipped += 1;
                    }
                    Some(Err(e)) => {
                        let finalized = self.store.finalize_streaming();
                        tracing::error!(error = %e, finalized, "Chat stream broke");
                        return Err(SessionError::Unavailable(e.into()));
                    }
                }
            }
        }

        if outcome.stopped {
            let finalized = self.store.finalize_streaming();
            tracing::info!(finalized, "Stream stopped by user");
        }
        Ok(outcome)
    }

    /// Rewrite a prompt in the configured report style.
    pub async fn enhance_prompt(
        &self,
        prompt: &str,
        context: Option<&str>,
    ) -> Result<String, SessionError> {
        let mut request = EnhanceRequest::new(prompt, self.settings.settings().general.report_style);
        if let Some(context) = context {
            request = request.with_context(context);
        }
        self.backend
            .enhance_prompt(request)
            .await
            .map_err(SessionError::Unavailable)
    }

    /// Turn a research report into podcast audio saved under the output
    /// directory. The podcast message tracks progress in the store either way.
    pub async fn listen_to_podcast(&mut self, research_id: &str) -> Result<PathBuf, SessionError> {
        let report = self
            .store
            .research_report(research_id)
            .ok_or_else(|| SessionError::NoReport(research_id.to_string()))?;
        let report_content = report.content.clone();
        let title = report_title(&report_content);
        let thread_id = self.store.thread_id().to_string();

        self.store.append_message(Message::user(&thread_id, PODCAST_REQUEST));

        let podcast_id = uuid::Uuid::new_v4().to_string();
        self.store.append_message(Message::streaming(
            &podcast_id,
            &thread_id,
            Role::Assistant,
            Some(Agent::Podcast),
        ));
        self.update_podcast(&podcast_id, PodcastContent::pending(title.clone()));

        let audio = match self.backend.generate_podcast(&report_content).await {
            Ok(audio) => audio,
            Err(e) => {
                self.update_podcast(&podcast_id, PodcastContent::failed(title, format!("{:#}", e)));
                return Err(SessionError::Unavailable(e));
            }
        };

        let path = self.output_dir.join(format!("podcast-{}.mp3", podcast_id));
        if let Err(e) = write_file(&path, &audio).await {
            self.update_podcast(&podcast_id, PodcastContent::failed(title, e.to_string()));
            return Err(e.into());
        }

        tracing::info!(path = %path.display(), "Podcast saved");
        self.update_podcast(
            &podcast_id,
            PodcastContent::ready(title, path.display().to_string()),
        );
        Ok(path)
    }

    fn update_podcast(&mut self, podcast_id: &str, podcast: PodcastContent) {
        self.store.apply_event(
            MessageEvent::new(podcast_id, EventPayload::PodcastUpdate { podcast })
                .with_agent(Agent::Podcast),
        );
    }

    /// Write a research report as markdown. Defaults to a timestamped file in
    /// the output directory.
    pub async fn export_report(
        &self,
        research_id: &str,
        path: Option<&Path>,
    ) -> Result<PathBuf, SessionError> {
        let report = self
            .store
            .research_report(research_id)
            .ok_or_else(|| SessionError::NoReport(research_id.to_string()))?;

        let path = match path {
            Some(path) => path.to_path_buf(),
            None => self.output_dir.join(format!(
                "report-{}.md",
                chrono::Utc::now().format("%Y%m%d-%H%M%S")
            )),
        };
        write_file(&path, report.content.as_bytes()).await?;
        tracing::info!(path = %path.display(), "Report exported");
        Ok(path)
    }
}

/// First markdown heading of a report.
fn report_title(content: &str) -> Option<String> {
    content
        .lines()
        .find_map(|line| line.trim().strip_prefix("# "))
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
}

async fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_title() {
        assert_eq!(
            report_title("Intro\n# Reaching Sarah Johnson\nBody").as_deref(),
            Some("Reaching Sarah Johnson")
        );
        assert_eq!(report_title("## Only a subheading"), None);
        assert_eq!(report_title("# "), None);
    }

    #[test]
    fn test_stop_handle_notifies_subscribers() {
        let handle = StopHandle::new();
        let mut receiver = handle.subscribe();
        assert!(!receiver.has_changed().unwrap());

        assert!(handle.clone().stop());
        assert!(receiver.has_changed().unwrap());
    }

    #[test]
    fn test_stop_without_turn_is_not_in_flight() {
        let handle = StopHandle::new();
        assert!(!handle.in_flight());
        assert!(!handle.stop());

        let receiver = handle.subscribe();
        assert!(handle.in_flight());
        drop(receiver);
        assert!(!handle.stop());
    }
}
