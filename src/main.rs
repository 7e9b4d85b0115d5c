//! LK Reactor Pro backend server.
//!
//! ## REST Endpoints
//!
//! - `POST /api/auth/verify-license` - License verification (service token)
//! - `POST /api/auth/resend-license` - Email the license key
//! - `POST /api/auth/manage-subscription` - Subscription info or downgrade
//! - `POST /api/users/create` - Direct signup
//! - `GET /api/clinics/get-by-email` - Clinic lookup
//! - `POST /api/usage/record` - Usage counters (service token)
//! - `POST /api/campaigns/:id/ai-generate` - AI message drafting
//! - `POST /api/webhooks/mercadopago` - Payment notifications
//! - `POST /api/analytics/track` - Funnel events
//! - `POST /api/facebook/capi` - Conversions relay
//! - `POST /api/admin/login`, `GET /api/admin/analytics`, `DELETE /api/admin/leads/delete`
//! - `GET /api/admin/diagnostic` - Configured integrations
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use reactor_backend::adapters::http::{
    build_router, AccessSettings, AppState, BillingSettings, Integrations, Storage,
};
use reactor_backend::adapters::postgres;
use reactor_backend::adapters::{
    DisabledConversionsApi, GraphConversionsApi, InMemoryRateLimiter, JwtAdminSessions,
    LoggingEmailSender, MercadoPagoConfig, MercadoPagoGateway, OpenAIConfig, OpenAIDrafter,
    RateLimitConfig, RedisRateLimiter, ResendEmailSender,
};
use reactor_backend::config::AppConfig;
use reactor_backend::domain::foundation::Timestamp;
use reactor_backend::ports::{ConversionsApi, EmailSender, MessageDrafter, RateLimiter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("loading configuration")?;
    config.validate().context("validating configuration")?;

    init_tracing(&config);

    tracing::info!(
        environment = %config.server.environment,
        in_memory_storage = config.features.in_memory_storage,
        "Starting LK Reactor Pro backend"
    );

    let storage = build_storage(&config).await?;
    let integrations = build_integrations(&config).await?;
    let billing = BillingSettings::from_config(&config).context("building price table")?;
    let access = AccessSettings::from_config(&config);

    let state = AppState::new(storage, integrations, billing, access)
        .with_config_report(config.report());

    let sweeper = config
        .billing
        .sweep_interval()
        .map(|every| spawn_period_sweeper(state.clone(), every));

    let app = build_router(state, &config.server);
    let addr = config.server.socket_addr()?;

    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.is_production() {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn build_storage(config: &AppConfig) -> anyhow::Result<Storage> {
    if config.features.in_memory_storage {
        tracing::warn!("Using in-memory storage; data is lost on restart");
        return Ok(Storage::in_memory());
    }

    let pool = postgres::connect(&config.database)
        .await
        .context("connecting to database")?;
    tracing::info!(database = %config.database.redacted_url(), "Database pool created");

    if config.database.run_migrations {
        postgres::run_migrations(&pool)
            .await
            .context("running migrations")?;
        tracing::info!("Migrations applied");
    }

    Ok(Storage::postgres(pool))
}

async fn build_integrations(config: &AppConfig) -> anyhow::Result<Integrations> {
    let payments = MercadoPagoGateway::new(MercadoPagoConfig::from_app_config(&config.payment))
        .context("building Mercado Pago client")?;

    let email: Arc<dyn EmailSender> = if config.email.is_configured() {
        Arc::new(ResendEmailSender::new(&config.email).context("building email client")?)
    } else {
        tracing::warn!("Resend API key not set; emails will only be logged");
        Arc::new(LoggingEmailSender)
    };

    let drafter: Arc<dyn MessageDrafter> = match OpenAIConfig::from_app_config(&config.ai) {
        Some(openai) => Arc::new(OpenAIDrafter::new(openai).context("building OpenAI client")?),
        None => {
            tracing::warn!("OpenAI API key not set; AI drafting is unavailable");
            Arc::new(OpenAIDrafter::disabled())
        }
    };

    let conversions: Arc<dyn ConversionsApi> = if config.conversions.is_configured() {
        Arc::new(
            GraphConversionsApi::new(&config.conversions)
                .context("building Conversions API client")?,
        )
    } else {
        Arc::new(DisabledConversionsApi)
    };

    let admin_sessions = Arc::new(JwtAdminSessions::new(
        &config.auth.admin_jwt_secret,
        config.auth.admin_session_ttl(),
    ));

    Ok(Integrations {
        payments: Arc::new(payments),
        email,
        drafter,
        conversions,
        admin_sessions,
        rate_limiter: build_rate_limiter(config).await,
    })
}

/// Redis when configured and reachable, otherwise a per-process limiter.
async fn build_rate_limiter(config: &AppConfig) -> Arc<dyn RateLimiter> {
    let limits = RateLimitConfig::from_flags(&config.features);

    if let Some(url) = config.redis.url() {
        match RedisRateLimiter::connect(url, limits.clone()).await {
            Ok(limiter) => {
                tracing::info!("Rate limiting backed by Redis");
                return Arc::new(limiter);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Redis unavailable, falling back to in-memory rate limiting");
            }
        }
    }

    Arc::new(InMemoryRateLimiter::new(limits))
}

/// Applies scheduled plan changes whose period has ended, independent of
/// license checks.
fn spawn_period_sweeper(state: AppState, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match state.apply_due_changes_handler().handle(Timestamp::now()).await {
                Ok(result) if result.applied > 0 || result.failed > 0 => {
                    tracing::info!(
                        applied = result.applied,
                        failed = result.failed,
                        "period sweep finished"
                    );
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "period sweep failed"),
            }
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
