// Application layer - Use cases and the traits they depend on
pub mod batch_publisher;
pub mod checkpoint_store;
pub mod error;
pub mod key_translator;
pub mod measurement_source;
pub mod metric_migration_service;
pub mod migration_service;
pub mod squac_api;

#[cfg(test)]
pub mod test_support;
