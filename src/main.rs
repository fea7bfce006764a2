use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use carservice::config::AppConfig;
use carservice::db;
use carservice::services::gateway::razorpay::RazorpayGateway;
use carservice::services::gateway::PaymentGateway;
use carservice::services::notify::http_email::HttpEmailNotifier;
use carservice::services::notify::Notifier;
use carservice::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let gateway: Option<Box<dyn PaymentGateway>> = match RazorpayGateway::from_config(&config) {
        Ok(gateway) => {
            tracing::info!(
                "payments enabled (api: {}, currency: {})",
                config.razorpay_api_url,
                config.payment_currency
            );
            Some(Box::new(gateway))
        }
        Err(e) => {
            tracing::warn!("payments disabled: {e}");
            None
        }
    };

    let notifier: Option<Box<dyn Notifier>> = if config.email_configured() {
        tracing::info!("email notifications enabled (relay: {})", config.email_api_url);
        Some(Box::new(HttpEmailNotifier::new(
            config.email_api_url.clone(),
            config.email_api_key.clone(),
            config.business_email.clone(),
            Duration::from_millis(config.gateway_timeout_ms),
        )?))
    } else {
        tracing::warn!("EMAIL_API_URL not set, contact form disabled");
        None
    };

    if config.admin_token == "changeme" {
        tracing::warn!("ADMIN_TOKEN is the default value, set it before deploying");
    }

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        gateway,
        notifier,
    });

    let app = carservice::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
