//! OpenAPI specification and Swagger UI configuration.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Channel Insights API",
        version = "0.1.0",
        description = "Marketing channel performance dashboard.\n\nAggregates the attribution export by market, channel and month and derives ROAS, CAC, CPP, AOV and return conversions.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Dashboard", description = "Filter options, summaries, channel views and exports"),
        (name = "Operations", description = "Health, readiness, and liveness probes"),
    ),
    paths(
        // Dashboard
        crate::page::dashboard,
        crate::rest::filters,
        crate::rest::summary,
        crate::rest::view,
        crate::rest::export_csv,
        // Operations
        crate::rest::health_check,
        crate::rest::readiness,
        crate::rest::liveness,
    ),
    components(schemas(
        // Domain types
        insights_core::Dimension,
        insights_core::Metric,
        insights_reporting::View,
        insights_reporting::SummaryRow,
        insights_reporting::Totals,
        insights_reporting::ViewReport,
        insights_reporting::BarChart,
        insights_reporting::Series,
        // Response types
        crate::rest::FiltersResponse,
        crate::rest::ViewInfo,
        crate::rest::SummaryResponse,
        crate::rest::ErrorResponse,
        crate::rest::HealthResponse,
    ))
)]
pub struct ApiDoc;
