use divoora_backend_rs::{
    app::App,
    types::{AppEnvironment, Config, ToContext},
};
use std::sync::Arc;
use tracing_subscriber::prelude::*;

fn init_tracing(environment: &AppEnvironment) {
    let production = *environment == AppEnvironment::Production;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(production.then(|| tracing_subscriber::fmt::layer().compact().with_ansi(false)))
        .with((!production).then(tracing_subscriber::fmt::layer))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.app.environment);

    let ctx = Arc::new(config.to_context().await?);

    App::new(ctx).serve().await?;

    Ok(())
}
