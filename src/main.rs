use anyhow::Context;
use weather_desk::configuration::get_configuration;
use weather_desk::startup::Application;
use weather_desk::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("weather_desk".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let configuration = get_configuration().context("Failed to read configuration.")?;
    let application = Application::build(configuration).await?;
    tracing::info!(port = application.port(), "Listening.");
    application.run_until_stopped().await?;
    Ok(())
}
