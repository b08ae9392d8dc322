use crate::config::Config;
use crate::constants::{
    API_REQUEST_SPACING_SECS, CLOUDWATCH_LOG_GROUP, LOG_LEVEL, MARKER_TABLE, POLL_INTERVAL_SECS,
    RETRY_BACKOFF_FACTOR, RETRY_INITIAL_DELAY_SECS, RETRY_MAX_ATTEMPTS,
};

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LOG_LEVEL.to_string(),
            log_dir: None,

            cloudwatch_log_group: CLOUDWATCH_LOG_GROUP.to_string(),
            marker_table: MARKER_TABLE.to_string(),
            create_missing_resources: true,

            poll_interval: POLL_INTERVAL_SECS,
            api_request_spacing: API_REQUEST_SPACING_SECS,

            retry_max_attempts: RETRY_MAX_ATTEMPTS,
            retry_initial_delay: RETRY_INITIAL_DELAY_SECS,
            retry_backoff_factor: RETRY_BACKOFF_FACTOR,

            region: None,
            access_key: None,
            secret_key: None,
            aws_profile: None,

            sentry_dsn: None,
        }
    }
}
