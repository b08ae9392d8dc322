pub const LOG_LEVEL: &str = "INFO";
pub const CLOUDWATCH_LOG_GROUP: &str = "ecs_service_events";
pub const MARKER_TABLE: &str = "ecs_service_events";

pub const POLL_INTERVAL_SECS: f64 = 60.0;
pub const API_REQUEST_SPACING_SECS: f64 = 0.2;

pub const RETRY_MAX_ATTEMPTS: u32 = 5;
pub const RETRY_INITIAL_DELAY_SECS: f64 = 3.0;
pub const RETRY_BACKOFF_FACTOR: f64 = 2.0;

/// Environment variable pointing at an optional TOML config file.
pub const CONFIG_FILE_ENV_VAR: &str = "FORWARDER_CONFIG";

/// Older name of the marker table setting, still honoured when MARKER_TABLE is unset.
pub const LEGACY_MARKER_TABLE_ENV_VAR: &str = "SDB_DOMAIN";

pub const LOG_FILE_NAME: &str = "ecs-event-forwarder.log";

// The SDK crates are chatty at debug level; keep them at warn unless asked for explicitly.
pub const QUIET_DEPENDENCIES: &[&str] = &[
    "aws_config=warn",
    "aws_smithy_runtime=warn",
    "aws_smithy_runtime_api=warn",
    "hyper=warn",
    "rustls=warn",
];

pub const AWS_SESSION_PROVIDER_NAME: &str = "ecs-event-forwarder-config";
