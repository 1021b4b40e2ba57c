pub mod chapters;
pub mod domain;
pub mod library;
pub mod mock;
pub mod ports;
pub mod progress;
pub mod session;
pub mod workflow;

mod memory;
pub use memory::MemoryStorage;

pub use domain::{
    Chapter, Gender, GenerationRequest, ProgressUpdate, SavedStory, Session, Story, ART_STYLES,
    THEMES,
};
pub use library::LibraryStore;
pub use ports::{
    AuthService, AuthenticatedUser, GeneratedIllustration, GeneratedStory, IllustrationRequest,
    KeyValueStorage, PortError, PortResult, StoryBackend, StoryTextRequest, TokenProvider,
};
pub use progress::ProgressObserver;
pub use session::{SessionManager, SessionStore};
pub use workflow::{GenerationOptions, StoryGenerator};
