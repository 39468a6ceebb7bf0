//! Opens two tabs over one storage database and walks through the account
//! flows: tab one registers (or signs in), tab two follows along through
//! cross-tab sync, then tab one signs out and tab two is sent home.

use std::time::Duration;

use rewear_core::{AuthError, Config, Context, CoreError, Database};

const EMAIL: &str = "demo@rewear.example";
const PASSWORD: &str = "swap-not-shop";

#[tokio::main]
async fn main() {
    rewear_core::init_logging();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Demo failed");
        std::process::exit(1);
    }
}

fn load_config() -> Result<Config, CoreError> {
    match std::env::var_os("REWEAR_CONFIG") {
        Some(path) => Config::from_file(path),
        None => Ok(Config::default()),
    }
}

async fn run() -> Result<(), CoreError> {
    let config = load_config()?;

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = Database::open(&config.database_path)?;

    let landing = config.landing_url.clone();
    let home = Context::open(&db, &config, &landing)?;
    let dashboard = Context::open(&db, &config, &landing)?;
    dashboard.location().navigate("dashboard.html")?;

    home.initialize()?;
    dashboard.initialize()?;
    dashboard.spawn_sync();

    let user = match home
        .create_account_with_email(EMAIL, PASSWORD, Some("Demo"), Some("Berlin"))
        .await
    {
        Ok(user) => user,
        Err(CoreError::Auth(AuthError::EmailAlreadyInUse)) => {
            home.sign_in_with_email(EMAIL, PASSWORD).await?
        }
        Err(e) => {
            tracing::warn!(reason = e.user_message(), "Registration failed");
            return Err(e);
        }
    };

    let gate = dashboard.require_auth().await?;
    tracing::info!(uid = %user.uid, dashboard_user = %gate.email, nav = ?dashboard.nav_bar(), "Dashboard unlocked");

    if let Some(profile) = home.current_user_data() {
        tracing::info!(points = profile.points, location = %profile.location, "Profile");
    }

    home.sign_out().await?;
    tokio::time::sleep(Duration::from_millis(50)).await;

    tracing::info!(
        href = %dashboard.location().href(),
        nav = ?dashboard.nav_bar(),
        "Dashboard after sign-out elsewhere"
    );

    Ok(())
}
