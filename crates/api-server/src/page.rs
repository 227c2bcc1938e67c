//! The browser dashboard. A single static page that calls the JSON
//! endpoints and draws the grouped bar chart with Plotly.

use axum::response::Html;

const DASHBOARD_HTML: &str = include_str!("../assets/dashboard.html");

/// GET / — Dashboard page.
#[utoipa::path(
    get,
    path = "/",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Dashboard HTML page", content_type = "text/html", body = String),
    )
)]
pub async fn dashboard() -> Html<&'static str> {
    metrics::counter!("dashboard.requests", "endpoint" => "page").increment(1);
    Html(DASHBOARD_HTML)
}
