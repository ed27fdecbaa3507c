use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use unghost_cli::{ChatSession, SendOptions, SessionError};
use unghost_client::{ChatBackend, ChatEventStream, ChatRequest, EnhanceRequest, StreamError};
use unghost_store::SettingsStore;
use unghost_types::{Agent, ChatEvent, PodcastContent, ReportStyle, ServerConfig};

/// Backend that replays canned wire frames and records what it was sent.
#[derive(Default)]
struct MockBackend {
    frames: Vec<(&'static str, &'static str)>,
    break_after: Option<usize>,
    fail_podcast: bool,
    requests: Mutex<Vec<ChatRequest>>,
    enhance_requests: Mutex<Vec<EnhanceRequest>>,
}

impl MockBackend {
    fn with_frames(frames: Vec<(&'static str, &'static str)>) -> Self {
        Self {
            frames,
            ..Self::default()
        }
    }

    fn stream(&self) -> ChatEventStream {
        let mut items: Vec<Result<ChatEvent, StreamError>> = self
            .frames
            .iter()
            .map(|(event, data)| {
                ChatEvent::from_sse(event, data).map_err(|source| StreamError::Decode {
                    event: event.to_string(),
                    source,
                })
            })
            .collect();
        if let Some(at) = self.break_after {
            items.truncate(at);
            items.push(Err(StreamError::Transport("connection reset".to_string())));
        }
        futures::stream::iter(items).boxed()
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn chat_stream(&self, request: ChatRequest) -> Result<ChatEventStream> {
        self.requests.lock().unwrap().push(request);
        Ok(self.stream())
    }

    async fn enhance_prompt(&self, request: EnhanceRequest) -> Result<String> {
        let enhanced = format!("{} (enhanced)", request.prompt);
        self.enhance_requests.lock().unwrap().push(request);
        Ok(enhanced)
    }

    async fn generate_podcast(&self, content: &str) -> Result<Vec<u8>> {
        if self.fail_podcast {
            anyhow::bail!("Podcast API error (500): tts down");
        }
        Ok(content.as_bytes().to_vec())
    }

    async fn fetch_config(&self) -> Result<ServerConfig> {
        Ok(ServerConfig::default())
    }

    async fn fetch_replay(&self, _replay_id: &str) -> Result<ChatEventStream> {
        Ok(self.stream())
    }
}

struct Unreachable;

#[async_trait]
impl ChatBackend for Unreachable {
    async fn chat_stream(&self, _request: ChatRequest) -> Result<ChatEventStream> {
        anyhow::bail!("Failed to send chat request: connection refused")
    }

    async fn enhance_prompt(&self, _request: EnhanceRequest) -> Result<String> {
        anyhow::bail!("connection refused")
    }

    async fn generate_podcast(&self, _content: &str) -> Result<Vec<u8>> {
        anyhow::bail!("connection refused")
    }

    async fn fetch_config(&self) -> Result<ServerConfig> {
        anyhow::bail!("connection refused")
    }

    async fn fetch_replay(&self, _replay_id: &str) -> Result<ChatEventStream> {
        anyhow::bail!("connection refused")
    }
}

const RESEARCH_FRAMES: [(&str, &str); 4] = [
    (
        "message_chunk",
        r#"{"id":"res","thread_id":"t","agent":"researcher","role":"assistant","content":"Found her profile"}"#,
    ),
    (
        "message_chunk",
        r#"{"id":"res","thread_id":"t","agent":"researcher","role":"assistant","finish_reason":"stop"}"#,
    ),
    (
        "message_chunk",
        r##"{"id":"rep","thread_id":"t","agent":"reporter","role":"assistant","content":"# Hello Sarah\nLoved your talk."}"##,
    ),
    (
        "message_chunk",
        r#"{"id":"rep","thread_id":"t","agent":"reporter","role":"assistant","finish_reason":"stop"}"#,
    ),
];

fn session_with(backend: Arc<dyn ChatBackend>, dir: &tempfile::TempDir) -> ChatSession {
    let settings = SettingsStore::open(dir.path().join("settings"));
    ChatSession::new(backend, settings, dir.path().join("out"))
}

#[tokio::test]
async fn test_send_message_streams_into_store() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(MockBackend::with_frames(vec![
        (
            "message_chunk",
            r#"{"id":"m1","agent":"coordinator","role":"assistant","content":"Hi"}"#,
        ),
        ("message_chunk", "{broken"),
        (
            "message_chunk",
            r#"{"id":"m1","agent":"coordinator","role":"assistant","content":" there","finish_reason":"stop"}"#,
        ),
    ]));
    let mut session = session_with(backend.clone(), &dir);

    let outcome = session
        .send_message("Who is Sarah Johnson?", SendOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.events, 2);
    assert_eq!(outcome.skipped, 1);
    assert!(!outcome.stopped);

    let store = session.store();
    assert_eq!(store.len(), 2);
    assert!(!store.responding());
    let reply = store.get_message("m1").unwrap();
    assert_eq!(reply.content, "Hi there");
    assert!(!reply.is_streaming);

    let requests = backend.requests.lock().unwrap();
    assert_eq!(requests[0].messages[0].content, "Who is Sarah Johnson?");
    assert_eq!(requests[0].thread_id, store.thread_id());
    assert_eq!(requests[0].interrupt_feedback, None);
}

#[tokio::test]
async fn test_feedback_without_content_adds_no_user_message() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(MockBackend::with_frames(Vec::new()));
    let mut session = session_with(backend.clone(), &dir);

    session
        .send_message("", SendOptions::feedback("accepted"))
        .await
        .unwrap();

    assert!(session.store().is_empty());
    let requests = backend.requests.lock().unwrap();
    assert_eq!(requests[0].interrupt_feedback.as_deref(), Some("accepted"));
}

#[tokio::test]
async fn test_transport_failure_is_unavailable_and_finalizes() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = MockBackend::with_frames(RESEARCH_FRAMES.to_vec());
    backend.break_after = Some(3);
    let mut session = session_with(Arc::new(backend), &dir);

    let error = session
        .send_message("Draft it", SendOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(error, SessionError::Unavailable(_)));
    let store = session.store();
    assert!(!store.responding());
    assert!(store.messages().all(|message| !message.is_streaming));
    assert_eq!(store.ongoing_research_id(), None);
}

#[tokio::test]
async fn test_unreachable_backend_keeps_user_message() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_with(Arc::new(Unreachable), &dir);

    let error = session
        .send_message("hello", SendOptions::default())
        .await
        .unwrap_err();

    assert!(error.to_string().starts_with("Backend unavailable"));
    assert_eq!(session.store().len(), 1);
    assert!(!session.store().responding());
}

#[tokio::test]
async fn test_stop_before_stream_is_polled() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(MockBackend::with_frames(RESEARCH_FRAMES.to_vec()));
    let mut session = session_with(backend, &dir);
    let handle = session.stop_handle();

    // A stop issued from a previous turn does not cancel the next one.
    assert!(!handle.stop());
    let outcome = session
        .send_message("Draft it", SendOptions::default())
        .await
        .unwrap();
    assert!(!outcome.stopped);
    assert_eq!(outcome.events, 4);
}

#[tokio::test]
async fn test_export_report_and_podcast() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(MockBackend::with_frames(RESEARCH_FRAMES.to_vec()));
    let mut session = session_with(backend, &dir);
    session
        .send_message("Draft it", SendOptions::default())
        .await
        .unwrap();

    assert_eq!(session.store().research().report_id("res"), Some("rep"));

    let path = session.export_report("res", None).await.unwrap();
    assert!(path.starts_with(dir.path().join("out")));
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "# Hello Sarah\nLoved your talk."
    );

    let audio = session.listen_to_podcast("res").await.unwrap();
    assert!(audio.exists());

    let store = session.store();
    let podcast = store
        .messages()
        .find(|message| message.is_agent(&Agent::Podcast))
        .unwrap();
    assert!(!podcast.is_streaming);
    let content: PodcastContent = serde_json::from_str(&podcast.content).unwrap();
    assert_eq!(content.title.as_deref(), Some("Hello Sarah"));
    assert_eq!(content.audio_url, Some(audio.display().to_string()));

    let request = store
        .messages()
        .find(|message| message.content == "Please generate a podcast for the above research.");
    assert!(request.is_some());
}

#[tokio::test]
async fn test_podcast_failure_is_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = MockBackend::with_frames(RESEARCH_FRAMES.to_vec());
    backend.fail_podcast = true;
    let mut session = session_with(Arc::new(backend), &dir);
    session
        .send_message("Draft it", SendOptions::default())
        .await
        .unwrap();

    assert!(session.listen_to_podcast("res").await.is_err());

    let podcast = session
        .store()
        .messages()
        .find(|message| message.is_agent(&Agent::Podcast))
        .unwrap();
    let content: PodcastContent = serde_json::from_str(&podcast.content).unwrap();
    assert!(content.error.unwrap().contains("tts down"));
    assert!(!podcast.is_streaming);
}

#[tokio::test]
async fn test_report_actions_need_a_report() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_with(Arc::new(MockBackend::default()), &dir);

    assert!(matches!(
        session.export_report("missing", None).await,
        Err(SessionError::NoReport(_))
    ));
    assert!(matches!(
        session.listen_to_podcast("missing").await,
        Err(SessionError::NoReport(_))
    ));
    assert!(session.store().is_empty());
}

#[tokio::test]
async fn test_enhance_uses_report_style() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(MockBackend::default());
    let mut session = session_with(backend.clone(), &dir);
    session
        .settings_mut()
        .set_report_style(ReportStyle::Conservative)
        .unwrap();

    let enhanced = session
        .enhance_prompt("email Sarah", Some("we met at RustConf"))
        .await
        .unwrap();

    assert_eq!(enhanced, "email Sarah (enhanced)");
    let requests = backend.enhance_requests.lock().unwrap();
    assert_eq!(requests[0].report_style, ReportStyle::Conservative);
    assert_eq!(requests[0].context.as_deref(), Some("we met at RustConf"));
}

#[tokio::test]
async fn test_replay_fills_store() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(MockBackend::with_frames(RESEARCH_FRAMES.to_vec()));
    let mut session = session_with(backend, &dir);

    let outcome = session.replay("demo").await.unwrap();

    assert_eq!(outcome.events, 4);
    assert_eq!(session.store().ordered_ids(), ["res", "rep"].map(String::from));
    assert!(session.store().research_report("res").is_some());
}

#[tokio::test]
async fn test_updates_show_store_before_stream_ends() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(MockBackend::with_frames(vec![
        (
            "message_chunk",
            r#"{"id":"m1","agent":"coordinator","role":"assistant","content":"Hi"}"#,
        ),
        (
            "message_chunk",
            r#"{"id":"m1","agent":"coordinator","role":"assistant","content":" there","finish_reason":"stop"}"#,
        ),
    ]));
    let mut session = session_with(backend, &dir);

    let mut seen = Vec::new();
    session
        .send_message_with_updates("Who is Sarah?", SendOptions::default(), |store, id| {
            let message = store.get_message(id).unwrap();
            seen.push((message.content.clone(), message.is_streaming, store.responding()));
        })
        .await
        .unwrap();

    assert_eq!(
        seen,
        vec![
            ("Hi".to_string(), true, true),
            ("Hi there".to_string(), true, true),
            ("Hi there".to_string(), false, true),
        ]
    );
    assert!(!session.store().responding());
}

#[tokio::test]
async fn test_stop_during_turn_finalizes_everything() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(MockBackend::with_frames(RESEARCH_FRAMES.to_vec()));
    let mut session = session_with(backend, &dir);
    let handle = session.stop_handle();
    assert!(!handle.in_flight());

    let mut accepted = Vec::new();
    let outcome = session
        .send_message_with_updates("Draft it", SendOptions::default(), |_, _| {
            accepted.push(handle.stop());
        })
        .await
        .unwrap();

    assert_eq!(accepted, vec![true]);
    assert!(outcome.stopped);
    assert_eq!(outcome.events, 1);
    let store = session.store();
    assert!(store.messages().all(|message| !message.is_streaming));
    assert_eq!(store.ongoing_research_id(), None);
    assert!(!handle.in_flight());
}

#[tokio::test]
async fn test_replay_reports_each_update() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(MockBackend::with_frames(RESEARCH_FRAMES.to_vec()));
    let mut session = session_with(backend, &dir);

    let mut ids = Vec::new();
    session
        .replay_with_updates("demo", |_, id| ids.push(id.to_string()))
        .await
        .unwrap();

    assert_eq!(ids, ["res", "res", "rep", "rep"].map(String::from));
}
