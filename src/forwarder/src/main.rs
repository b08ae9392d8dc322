use ecs_event_forwarder::config::ConfigLoader;
use ecs_event_forwarder::daemon;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::load()?;
    config.validate()?;
    daemon::run(config).await
}
