use std::future::ready;

use axum::{routing::get, Router};
use lifecycle::ReadinessHandler;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::trace::TraceLayer;

use crate::metrics::track_metrics;

async fn index() -> &'static str {
    "checkout-api"
}

/// Normalize a configured base path: leading slash, no trailing slash. The root comes back
/// as `None`, since axum cannot nest there.
pub fn normalize_base_path(base_path: &str) -> Option<String> {
    let trimmed = base_path.trim().trim_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(format!("/{trimmed}"))
    }
}

pub fn router(
    base_path: &str,
    routes: Router,
    readiness: ReadinessHandler,
    recorder_handle: Option<PrometheusHandle>,
) -> Router {
    let app = Router::new()
        .route(
            "/_readiness",
            get(move || {
                let readiness = readiness.clone();
                async move { readiness.check().await }
            }),
        )
        .route("/_liveness", get(|| ready("ok")));

    let app = match normalize_base_path(base_path) {
        Some(path) => app.route("/", get(index)).nest(&path, routes),
        // Business routes own the root when mounted there
        None => app.merge(routes),
    };

    let app = app
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(track_metrics));

    // Don't install metrics unless asked to
    // Installing a global recorder when used as a library (during tests etc)
    // does not work well.
    match recorder_handle {
        Some(handle) => app.route("/metrics", get(move || ready(handle.render()))),
        None => app,
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_base_path;

    #[test]
    fn base_path_is_normalized() {
        assert_eq!(normalize_base_path("/api"), Some("/api".to_string()));
        assert_eq!(normalize_base_path("api/"), Some("/api".to_string()));
        assert_eq!(normalize_base_path("/v1/checkout/"), Some("/v1/checkout".to_string()));
        assert_eq!(normalize_base_path("/"), None);
        assert_eq!(normalize_base_path(""), None);
    }
}
