pub mod config;
pub mod crawler;
pub mod error;
pub mod logging;
pub mod publisher;
pub mod run_context;
pub mod supabase_client;

pub use config::{Config, OutputConfig, TwitterConfig, TwitterCredentials};
pub use crawler::{Crawler, CrawlerManager};
pub use error::{CrawlerError, CrawlerResult};
pub use publisher::{remote_key, ObjectStore, RemotePublisher};
pub use run_context::RunContext;
pub use supabase_client::SupabaseStorageClient;
