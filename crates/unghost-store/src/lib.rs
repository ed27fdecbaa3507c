mod merge;

pub mod error;
pub mod research;
pub mod settings;
pub mod store;

pub use error::{SettingsError, StoreError};
pub use research::ResearchThreads;
pub use settings::{SettingsStore, SETTINGS_KEY};
pub use store::MessageStore;
