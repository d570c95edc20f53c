use anyhow::Context;
use todoapp::{app, config::AppConfig, state::AuthState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    app::init_tracing();

    let config = AppConfig::from_env(3001).context("load configuration")?;
    let state = AuthState::init(&config).await?;

    app::serve(app::build_auth_app(state), &config).await
}
