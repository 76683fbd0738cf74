// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod file_checkpoint;
pub mod postgres_source;
pub mod squac_client;
