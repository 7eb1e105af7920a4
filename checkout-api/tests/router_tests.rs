use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use checkout_api::router::router;
use checkout_api::routes::routes;
use lifecycle::{ReadinessHandler, ShutdownTrigger};

fn app(base_path: &str, trigger: &ShutdownTrigger) -> Router {
    router(
        base_path,
        routes("checkout-api", "1.2.3"),
        ReadinessHandler::new(trigger.clone()),
        None,
    )
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn readiness_flips_once_shutdown_fires() {
    let trigger = ShutdownTrigger::new();

    let (status, _) = get(app("/api", &trigger), "/_readiness").await;
    assert_eq!(status, StatusCode::OK);

    trigger.fire("test");
    let (status, _) = get(app("/api", &trigger), "/_readiness").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    // Liveness is unaffected by draining
    let (status, body) = get(app("/api", &trigger), "/_liveness").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn business_routes_are_mounted_under_base_path() {
    let trigger = ShutdownTrigger::new();

    let (status, body) = get(app("/api/", &trigger), "/api").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "checkout-api 1.2.3");

    let (status, body) = get(app("/api/", &trigger), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "checkout-api");
}

#[tokio::test]
async fn business_routes_own_the_root_when_mounted_there() {
    let trigger = ShutdownTrigger::new();

    let (status, body) = get(app("/", &trigger), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "checkout-api 1.2.3");

    let (status, _) = get(app("/", &trigger), "/api").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn metrics_route_is_absent_without_recorder() {
    let trigger = ShutdownTrigger::new();
    let (status, _) = get(app("/api", &trigger), "/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
