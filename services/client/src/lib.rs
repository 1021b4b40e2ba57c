pub mod adapters;
pub mod config;
pub mod error;
pub mod export;
pub mod state;

pub use adapters::{FileStorage, HttpApiClient};
pub use config::Config;
pub use error::ClientError;
pub use state::AppState;
