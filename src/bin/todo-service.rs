use anyhow::Context;
use todoapp::{app, config::AppConfig, state::TodoState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    app::init_tracing();

    let config = AppConfig::from_env(3002).context("load configuration")?;
    let state = TodoState::init(&config).await?;

    app::serve(app::build_todo_app(state), &config).await
}
