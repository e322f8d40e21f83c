// Parley run transport
//
// Production backends for the synchronization engine:
// - HttpRunApi: request/response calls plus the SSE live stream
// - FileKeyValueStore: resumable run pointers in a JSON file

pub mod config;
pub mod file_store;
pub mod http;
pub mod sse;

pub use config::{ClientConfig, ConfigError};
pub use file_store::{FileKeyValueStore, RUN_POINTERS_FILE};
pub use http::HttpRunApi;
