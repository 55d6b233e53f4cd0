//! Operator API regression tests.
//!
//! Drives the full router against a governor running on the simulated
//! backend, the same way `autosmpd run --backend sim` wires it.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use autosmp_api::build_router;
use autosmp_core::Phase;
use autosmp_governor::{GovernorHandle, GovernorOptions};
use autosmp_platform::SimPlatform;

const MAX: u64 = 2_000_000;

fn start(cores: u32, startup_delay: Duration) -> (Arc<SimPlatform>, GovernorHandle, Router) {
    let sim = Arc::new(SimPlatform::new(cores, MAX));
    let options = GovernorOptions {
        startup_delay,
        ..GovernorOptions::defaults(cores)
    };
    let (governor, _worker) = autosmp_governor::spawn(sim.clone(), sim.clone(), options).unwrap();
    let router = build_router(governor.clone());
    (sim, governor, router)
}

async fn body_string(resp: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn put(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "text/plain")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn conf_lists_defaults() {
    let (_sim, _gov, router) = start(4, Duration::from_secs(3600));

    let resp = router.oneshot(get("/conf")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    let data = &json["data"];
    assert_eq!(data["tick_delay"], 100);
    assert_eq!(data["min_cores"], 1);
    assert_eq!(data["max_cores"], 4);
    assert_eq!(data["up_threshold_pct"], 90);
    assert_eq!(data["down_threshold_pct"], 60);
    assert_eq!(data["cycles_up"], 1);
    assert_eq!(data["cycles_down"], 1);
}

#[tokio::test]
async fn tunable_read_write_round_trip() {
    let (_sim, _gov, router) = start(4, Duration::from_secs(3600));

    let resp = router.clone().oneshot(put("/conf/cycles_down", "3\n")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = router.oneshot(get("/conf/cycles_down")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "3\n");
}

#[tokio::test]
async fn non_numeric_write_is_rejected() {
    let (_sim, gov, router) = start(4, Duration::from_secs(3600));

    for name in [
        "tick_delay",
        "min_cores",
        "max_cores",
        "up_threshold_pct",
        "down_threshold_pct",
        "cycles_up",
        "cycles_down",
    ] {
        let before = gov.get(name).unwrap();
        let resp = router
            .clone()
            .oneshot(put(&format!("/conf/{name}"), "fast"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{name}");
        assert_eq!(gov.get(name).unwrap(), before, "{name}");
    }
}

#[tokio::test]
async fn unknown_tunable_is_not_found() {
    let (_sim, _gov, router) = start(2, Duration::from_secs(3600));

    let resp = router.clone().oneshot(get("/conf/cpufreq_up")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = router.oneshot(put("/conf/cpufreq_up", "50")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn disabling_through_api_restores_all_cores() {
    let (sim, gov, router) = start(4, Duration::from_secs(3600));
    sim.set_online([0]);
    let mut status = gov.subscribe();

    let resp = router.clone().oneshot(put("/enabled", "0")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    status.wait_for(|s| s.phase == Phase::Disabled).await.unwrap();
    assert_eq!(sim.online_count(), 4);

    let resp = router.oneshot(get("/enabled")).await.unwrap();
    assert_eq!(body_string(resp).await, "0\n");
}

#[tokio::test]
async fn suspend_and_resume_endpoints() {
    let (sim, gov, router) = start(4, Duration::from_secs(3600));
    gov.set("max_cores", "3").unwrap();
    let mut status = gov.subscribe();

    let resp = router.clone().oneshot(post("/suspend")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    status.wait_for(|s| s.phase == Phase::Suspended).await.unwrap();
    assert_eq!(sim.online_count(), 1);

    let resp = router.clone().oneshot(post("/resume")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    status.wait_for(|s| s.phase == Phase::Running).await.unwrap();
    assert_eq!(sim.online_count(), 3);

    let resp = router.oneshot(get("/status")).await.unwrap();
    let json: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(json["data"]["phase"], "running");
}

#[tokio::test(start_paused = true)]
async fn governor_parks_idle_cores_one_per_tick() {
    let (sim, gov, _router) = start(4, Duration::from_millis(10));
    sim.set_all_rates(MAX / 4);
    let mut status = gov.subscribe();

    status.wait_for(|s| s.ticks >= 1).await.unwrap();
    assert_eq!(sim.online_count(), 3);

    status.wait_for(|s| s.ticks >= 10).await.unwrap();
    assert_eq!(sim.online_count(), 1);
    assert!(sim.is_online(0));
}
