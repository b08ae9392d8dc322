pub mod config;
mod discovery;
mod dynamodb;
mod ecs;
mod errors;
mod logs;

pub use discovery::EcsServiceDiscovery;
pub use dynamodb::DynamoMarkerStore;
pub use ecs::EcsEventSource;
pub use errors::classify_error_code;
pub use logs::CloudWatchLogSink;
