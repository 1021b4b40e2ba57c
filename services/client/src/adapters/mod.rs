pub mod api_client;
pub mod events;
pub mod file_storage;
pub mod records;
pub mod resources;

pub use api_client::HttpApiClient;
pub use file_storage::FileStorage;
