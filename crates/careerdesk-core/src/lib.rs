pub mod ai;
pub mod chat;
pub mod config;
pub mod gateway;
pub mod image;
pub mod prefs;
pub mod session;
pub mod state;
pub mod theme;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenience
pub use ai::{AiProvider, ChatTransport, GeminiClient, ProviderError};
pub use chat::{ChatCompletion, ChatController, ChatPhase, PendingChat};
pub use config::{Config, ConfigError};
pub use gateway::{ChatReply, ChatSessionHandle, Gateway, GeneratedImage, ImageError};
pub use image::{ImageCompletion, ImageController, ImageRequestState, ImageStatus, PendingImage};
pub use prefs::{JsonPreferenceStore, MemoryPreferenceStore, PreferenceStore};
pub use session::{MountId, SessionGate, Workspace};
pub use state::{ChatMessage, ChatRole};
pub use theme::{SystemAppearance, Theme, ThemeStore, UnknownTheme};
