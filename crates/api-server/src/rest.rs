//! REST API handlers for the dashboard: filter options, summaries, views,
//! CSV export, and operational endpoints.
//!
//! Every request recomputes from the loaded table; nothing is cached.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use insights_core::{ChannelTaxonomy, Dimension, InsightsError, Metric};
use insights_ingest::{EventTable, Selection};
use insights_reporting::export;
use insights_reporting::{build_summary, build_view, SummaryRow, Totals, View, ViewReport};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, warn};
use utoipa::{IntoParams, ToSchema};

/// Grouping used when a request does not name one.
const DEFAULT_GROUP_BY: [Dimension; 2] = [Dimension::Market, Dimension::Channel];

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<EventTable>,
    pub taxonomy: Arc<ChannelTaxonomy>,
    pub source: String,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(table: EventTable, taxonomy: ChannelTaxonomy, source: impl Into<String>) -> Self {
        Self {
            table: Arc::new(table),
            taxonomy: Arc::new(taxonomy),
            source: source.into(),
            start_time: Instant::now(),
        }
    }
}

// ─── Errors ─────────────────────────────────────────────────────────────────

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Maps engine errors onto HTTP responses.
pub struct ApiError(pub InsightsError);

impl From<InsightsError> for ApiError {
    fn from(err: InsightsError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            InsightsError::InvalidDimension(_) => (StatusCode::BAD_REQUEST, "invalid_dimension"),
            InsightsError::InvalidMetric { .. } => (StatusCode::BAD_REQUEST, "invalid_metric"),
            InsightsError::InvalidView(_) => (StatusCode::NOT_FOUND, "unknown_view"),
            InsightsError::EmptyGrouping => (StatusCode::BAD_REQUEST, "empty_grouping"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        if self.0.is_user_error() {
            warn!(error = %self.0, "Rejected dashboard request");
            metrics::counter!("dashboard.validation_errors").increment(1);
        } else {
            error!(error = %self.0, "Dashboard request failed");
            metrics::counter!("dashboard.errors").increment(1);
        }

        (
            status,
            Json(ErrorResponse {
                error: code.to_string(),
                message: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

// ─── Query parameters ───────────────────────────────────────────────────────

/// Raw query string as ordered pairs. Multi-valued filters repeat their key
/// (`market=Uk&market=Us`), which a plain struct extractor cannot express.
pub type QueryPairs = Vec<(String, String)>;

fn first_value(pairs: &[(String, String)], key: &str) -> Option<String> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
}

fn all_values(pairs: &[(String, String)], key: &str) -> Option<Vec<String>> {
    let values: Vec<String> = pairs
        .iter()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
        .collect();
    (!values.is_empty()).then_some(values)
}

/// Market and month selection. Each value is its own repeated key; an absent
/// key selects everything and a single blank value selects nothing.
#[derive(Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SummaryQuery {
    /// Grouping dimensions, e.g. `market,channel` or `month`.
    pub group_by: Option<String>,
    /// Markets to include, e.g. `market=UK&market=US`. `(blank)` selects rows
    /// with no market.
    pub market: Option<Vec<String>>,
    /// Months to include, e.g. `month=2024-01&month=2024-02`. `(blank)`
    /// selects undated rows.
    pub month: Option<Vec<String>>,
}

impl SummaryQuery {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            group_by: first_value(pairs, "group_by"),
            market: all_values(pairs, "market"),
            month: all_values(pairs, "month"),
        }
    }

    fn selection(&self) -> Selection {
        Selection::from_values(self.market.clone(), self.month.clone())
    }

    fn dimensions(&self) -> Result<Vec<Dimension>, InsightsError> {
        match self.group_by.as_deref() {
            None => Ok(DEFAULT_GROUP_BY.to_vec()),
            Some(raw) => Dimension::parse_list(raw),
        }
    }
}

#[derive(Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ViewQuery {
    /// Metric to chart, e.g. `ROAS` or `New Conversions`. Defaults to the
    /// first metric the view offers.
    pub metric: Option<String>,
    pub market: Option<Vec<String>>,
    pub month: Option<Vec<String>>,
}

impl ViewQuery {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            metric: first_value(pairs, "metric"),
            market: all_values(pairs, "market"),
            month: all_values(pairs, "month"),
        }
    }

    fn selection(&self) -> Selection {
        Selection::from_values(self.market.clone(), self.month.clone())
    }
}

// ─── Responses ──────────────────────────────────────────────────────────────

#[derive(Serialize, ToSchema)]
pub struct ViewInfo {
    pub view: View,
    pub title: String,
    pub metrics: Vec<Metric>,
    pub default_metric: Metric,
}

#[derive(Serialize, ToSchema)]
pub struct FiltersResponse {
    /// Market options; `(blank)` is listed when some rows have no market.
    pub markets: Vec<String>,
    /// Month options; `(blank)` is listed when some rows have no date.
    pub months: Vec<String>,
    pub views: Vec<ViewInfo>,
    /// Channels in the data that are neither paid nor owned/earned.
    pub unmapped_channels: Vec<String>,
    pub rows: usize,
}

#[derive(Serialize, ToSchema)]
pub struct SummaryResponse {
    pub group_by: Vec<Dimension>,
    pub rows: Vec<SummaryRow>,
    pub totals: Totals,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub source: String,
    pub rows: usize,
    pub uptime_secs: u64,
}

/// CSV body served as a download.
pub struct CsvDownload {
    pub body: String,
    pub filename: String,
}

impl IntoResponse for CsvDownload {
    fn into_response(self) -> Response {
        (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", self.filename),
                ),
            ],
            self.body,
        )
            .into_response()
    }
}

// ─── Handlers ───────────────────────────────────────────────────────────────

fn record_recompute(endpoint: &'static str, started: Instant, rows: usize) {
    metrics::counter!("dashboard.requests", "endpoint" => endpoint).increment(1);
    metrics::histogram!("dashboard.recompute_ms", "endpoint" => endpoint)
        .record(started.elapsed().as_secs_f64() * 1000.0);
    metrics::histogram!("dashboard.summary_rows").record(rows as f64);
}

/// GET /v1/filters — Filter options and the metric choices for each view.
#[utoipa::path(
    get,
    path = "/v1/filters",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Markets, months and views available for selection", body = FiltersResponse),
    )
)]
pub async fn filters(State(state): State<AppState>) -> Json<FiltersResponse> {
    metrics::counter!("dashboard.requests", "endpoint" => "filters").increment(1);

    let channels = state.table.channels();
    let views = View::available(&state.taxonomy)
        .into_iter()
        .map(|view| ViewInfo {
            view,
            title: view.title().to_string(),
            metrics: view.metrics().to_vec(),
            default_metric: view.default_metric(),
        })
        .collect();

    Json(FiltersResponse {
        markets: state.table.market_options(),
        months: state.table.month_options(),
        views,
        unmapped_channels: state.taxonomy.unmapped(channels.iter().map(String::as_str)),
        rows: state.table.len(),
    })
}

/// GET /v1/summary — Aggregated summary for the selected markets and months.
#[utoipa::path(
    get,
    path = "/v1/summary",
    tag = "Dashboard",
    params(SummaryQuery),
    responses(
        (status = 200, description = "One row per group", body = SummaryResponse),
        (status = 400, description = "Unknown grouping dimension", body = ErrorResponse),
    )
)]
pub async fn summary(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let started = Instant::now();
    let query = SummaryQuery::from_pairs(&pairs);
    let group_by = query.dimensions()?;
    let selected = state.table.filter(&query.selection());
    let rows = build_summary(&selected, &group_by)?;
    let totals = Totals::of(&rows);

    record_recompute("summary", started, rows.len());
    Ok(Json(SummaryResponse {
        group_by,
        rows,
        totals,
    }))
}

/// GET /v1/views/{view} — Rows, totals and chart series for one dashboard tab.
#[utoipa::path(
    get,
    path = "/v1/views/{view}",
    tag = "Dashboard",
    params(
        ("view" = String, Path, description = "paid, owned_earned, unclassified or monthly"),
        ViewQuery,
    ),
    responses(
        (status = 200, description = "View recomputed for the selection", body = ViewReport),
        (status = 400, description = "Metric not offered by this view", body = ErrorResponse),
        (status = 404, description = "Unknown or disabled view", body = ErrorResponse),
    )
)]
pub async fn view(
    State(state): State<AppState>,
    Path(view): Path<String>,
    Query(pairs): Query<QueryPairs>,
) -> Result<Json<ViewReport>, ApiError> {
    let started = Instant::now();
    let query = ViewQuery::from_pairs(&pairs);
    let view: View = view.parse()?;
    let metric = query
        .metric
        .as_deref()
        .map(|m| m.parse::<Metric>())
        .transpose()
        .map_err(|_| InsightsError::InvalidMetric {
            metric: query.metric.clone().unwrap_or_default(),
            view: view.slug().to_string(),
        })?;
    let report = build_view(&state.table, &query.selection(), &state.taxonomy, view, metric)?;

    record_recompute("view", started, report.rows.len());
    Ok(Json(report))
}

/// GET /v1/export.csv — Summary as a CSV download.
#[utoipa::path(
    get,
    path = "/v1/export.csv",
    tag = "Dashboard",
    params(SummaryQuery),
    responses(
        (status = 200, description = "CSV summary", content_type = "text/csv", body = String),
        (status = 400, description = "Unknown grouping dimension", body = ErrorResponse),
    )
)]
pub async fn export_csv(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
) -> Result<CsvDownload, ApiError> {
    let started = Instant::now();
    let query = SummaryQuery::from_pairs(&pairs);
    let group_by = query.dimensions()?;
    let selected = state.table.filter(&query.selection());
    let rows = build_summary(&selected, &group_by)?;
    let body = export::to_csv(&rows, &group_by)?;

    record_recompute("export", started, rows.len());
    let suffix: Vec<&str> = group_by.iter().map(|d| d.column()).collect();
    Ok(CsvDownload {
        body,
        filename: format!("summary_by_{}.csv", suffix.join("_").to_lowercase()),
    })
}

/// GET /health — Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Operations",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        source: state.source.clone(),
        rows: state.table.len(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /ready — Readiness probe. The table is loaded before the server
/// starts, so an empty table is the only not-ready state.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "Operations",
    responses(
        (status = 200, description = "Data loaded"),
        (status = 503, description = "No rows loaded"),
    )
)]
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.table.is_empty() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}

/// GET /live — Liveness probe.
#[utoipa::path(
    get,
    path = "/live",
    tag = "Operations",
    responses(
        (status = 200, description = "Process is alive"),
    )
)]
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}
