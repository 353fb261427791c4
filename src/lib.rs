pub mod config;
pub mod cursor;
pub mod dispatch;
pub mod errors;
pub mod events_store;
pub mod ingest;
pub mod market;
pub mod metrics;
pub mod models;
pub mod normalizer;
pub mod orchestrator;
pub mod report;
pub mod scheduler;
pub mod selector;
