use sentry::ClientOptions;

pub struct Sentry;

impl Sentry {
    /// Initializes Sentry if a DSN is configured.
    /// Returns a guard to keep Sentry active for the program's lifetime.
    pub fn setup(dsn: Option<&str>) -> Option<sentry::ClientInitGuard> {
        if cfg!(test) {
            return None;
        }
        let dsn = dsn.filter(|dsn| !dsn.trim().is_empty())?;

        let guard = sentry::init((
            dsn,
            ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ));

        Self::add_tag("type", "ecs-event-forwarder");
        Some(guard)
    }

    /// Adds a tag (key-value pair) to every subsequent Sentry event.
    pub fn add_tag(key: &str, value: &str) {
        if cfg!(test) {
            return;
        }
        sentry::configure_scope(|scope| {
            scope.set_tag(key, value);
        });
    }
}
