use axum::{routing::get, Router};

/// Business route table, mounted under the configured base path. The lifecycle core only
/// mounts it and never looks inside.
pub fn routes(service_name: &str, service_version: &str) -> Router {
    let banner = format!("{service_name} {service_version}");
    Router::new().route("/", get(move || async move { banner }))
}
