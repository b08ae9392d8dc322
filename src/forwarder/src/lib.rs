pub mod adapters;
pub mod cloud_providers;
pub mod config;
pub mod constants;
pub mod daemon;
pub mod fleet;
pub mod forwarder;
pub mod logging;
pub mod retry;
pub mod types;
pub mod utils;
