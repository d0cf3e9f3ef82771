use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sharpe_core::config::{ProviderKind, Settings};
use sharpe_core::dashboard::{
    self,
    error::{DashboardError, Stage},
    report::DashboardReport,
};
use sharpe_core::domain::inputs::{DashboardForm, DashboardRequest, DEFAULT_TICKERS};
use sharpe_core::ingest::{
    fixture::StaticPriceProvider,
    provider::{PriceProvider, YahooChartProvider},
};
use sharpe_core::time::session;

mod charts;
mod page;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let provider = match build_provider(&settings) {
        Ok(p) => p,
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "price provider init failed");
            return Err(e);
        }
    };
    tracing::info!(provider = provider.provider_name(), "price provider ready");

    let app = app(AppState { provider });

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port));
    tracing::info!(%addr, "dashboard listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[derive(Clone)]
struct AppState {
    provider: Arc<dyn PriceProvider>,
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/portfolio", get(portfolio))
        .route("/healthz", get(healthz))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

fn build_provider(settings: &Settings) -> anyhow::Result<Arc<dyn PriceProvider>> {
    match settings.data_provider_kind()? {
        ProviderKind::Yahoo => Ok(Arc::new(YahooChartProvider::from_settings(settings)?)),
        ProviderKind::Static => {
            let tickers: Vec<&str> = DEFAULT_TICKERS.split(',').collect();
            let start = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap_or_default();
            let provider =
                StaticPriceProvider::synthetic(&tickers, start, session::today(Utc::now()))?;
            tracing::info!(
                rows = provider.table().len(),
                "serving synthetic prices for {DEFAULT_TICKERS}"
            );
            Ok(Arc::new(provider))
        }
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn index(
    State(state): State<AppState>,
    Query(request): Query<DashboardRequest>,
) -> Html<String> {
    let (form, outcome) = compute(&state, request).await;
    Html(page::render(&form, &outcome))
}

#[derive(Debug, Serialize)]
struct ApiError {
    error: &'static str,
    stage: Stage,
}

async fn portfolio(
    State(state): State<AppState>,
    Query(request): Query<DashboardRequest>,
) -> Result<Json<DashboardReport>, (StatusCode, Json<ApiError>)> {
    let (_, outcome) = compute(&state, request).await;
    outcome.map(Json).map_err(|e| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiError {
                error: e.user_message(),
                stage: e.stage,
            }),
        )
    })
}

async fn compute(
    state: &AppState,
    request: DashboardRequest,
) -> (DashboardForm, Result<DashboardReport, DashboardError>) {
    let form = request.resolve(session::today(Utc::now()));
    let outcome = dashboard::run(&form, state.provider.as_ref()).await;
    if let Err(e) = &outcome {
        // Bad user input is expected traffic, not an incident.
        if e.stage != Stage::ParseInput {
            sentry_anyhow::capture_anyhow(&anyhow::Error::new(e.clone()));
        }
    }
    (form, outcome)
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
