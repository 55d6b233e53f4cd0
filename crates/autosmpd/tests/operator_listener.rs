//! Operator API listener tests.
//!
//! A failed bind must leave the governor running on its in-memory tunables.

use std::sync::Arc;
use std::time::Duration;

use autosmp_governor::GovernorOptions;
use autosmp_platform::SimPlatform;
use autosmpd::operator::spawn_api;

const MAX: u64 = 2_000_000;

#[tokio::test]
async fn governor_keeps_ticking_when_api_address_is_taken() {
    let occupied = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = occupied.local_addr().unwrap();

    let sim = Arc::new(SimPlatform::new(4, MAX));
    let options = GovernorOptions {
        startup_delay: Duration::ZERO,
        ..GovernorOptions::defaults(4)
    };
    let (governor, _worker) = autosmp_governor::spawn(sim.clone(), sim.clone(), options).unwrap();

    assert!(spawn_api(addr, governor.clone()).await.is_none());

    governor.set("tick_delay", "1").unwrap();
    assert_eq!(governor.get("tick_delay").unwrap(), "1");
    sim.set_online([0]);
    sim.set_all_rates(MAX);

    let mut status = governor.subscribe();
    let baseline = status.borrow().ticks;
    tokio::time::timeout(Duration::from_secs(5), status.wait_for(|s| s.ticks >= baseline + 3))
        .await
        .expect("governor stopped ticking")
        .unwrap();
    assert!(sim.online_count() > 1);
}

#[tokio::test]
async fn api_serves_on_free_address() {
    let sim = Arc::new(SimPlatform::new(2, MAX));
    let options = GovernorOptions {
        startup_delay: Duration::from_secs(3600),
        ..GovernorOptions::defaults(2)
    };
    let (governor, _worker) = autosmp_governor::spawn(sim.clone(), sim, options).unwrap();

    let handle = spawn_api("127.0.0.1:0".parse().unwrap(), governor)
        .await
        .expect("listener should bind");
    handle.abort();
}
