pub mod config;
pub mod render;
pub mod session;

pub use config::Config;
pub use session::{ChatSession, SendOptions, SessionError, StopHandle, StreamOutcome};
