use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tokio::sync::{broadcast, mpsc, watch};
use tower::ServiceExt;

use mass_core::{spatial, GateConfig, SimConfig, StreamFrame, VesselEvent, VesselSim};

use crate::state::AppState;
use crate::{api, loops};

const TEST_TICK_HZ: f64 = 50.0;

fn open_water_scenario() -> SimConfig {
    let mut config = SimConfig::default_scenario();
    config.vessel.cog_deg = 0.0;
    config.vessel.sog_knots = 10.0;
    // Fast rudder so steering is observable within a short test window.
    config.kinematics.turn_rate_deg_per_sec = Some(45.0);
    config.gates = Vec::new();
    config
}

fn gate_ahead_scenario() -> SimConfig {
    let mut config = open_water_scenario();
    config.gates = vec![GateConfig {
        id: 1,
        lat: 30.0 + spatial::meters_to_lat(1900.0, 30.0),
        lon: -40.0,
        radius_m: 100.0,
        threshold_secs: 900.0,
    }];
    config
}

async fn setup_app(config: SimConfig) -> (Router, Arc<AppState>, broadcast::Sender<()>) {
    let sim = VesselSim::new(config).expect("valid scenario");

    let (inbound_tx, inbound_rx) = mpsc::channel(64);
    let (frames_tx, _) = broadcast::channel(1024);
    let (report_tx, report_rx) = watch::channel(Arc::new(sim.initial_report(Utc::now())));
    let (track_tx, track_rx) = watch::channel(Arc::new(sim.track_snapshot()));
    let (shutdown_tx, _) = broadcast::channel(1);

    tokio::spawn(loops::sim_loop::run_sim_loop(
        sim,
        inbound_rx,
        frames_tx.clone(),
        report_tx,
        track_tx,
        TEST_TICK_HZ,
        shutdown_tx.subscribe(),
    ));

    let state = Arc::new(AppState::new(inbound_tx, frames_tx, report_rx, track_rx));
    let app = api::routes().with_state(state.clone());
    (app, state, shutdown_tx)
}

async fn get_json(app: &Router, uri: &str) -> Value {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

async fn post_json(app: &Router, uri: &str, body: Value) -> StatusCode {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    response.status()
}

async fn wait_for_event<F>(
    rx: &mut broadcast::Receiver<StreamFrame>,
    mut matches: F,
) -> VesselEvent
where
    F: FnMut(&VesselEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match rx.recv().await {
                Ok(StreamFrame::Broadcast(event)) if matches(&event) => return event,
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(_) => panic!("frame channel closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

#[tokio::test]
async fn legacy_cog_command_steers_vessel() {
    let (app, _state, _shutdown) = setup_app(open_water_scenario()).await;

    let status = post_json(&app, "/v1/control/cog", json!({ "value": 90.0 })).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let report = get_json(&app, "/v1/vessel").await;
        let cog = report["nav"]["cog_deg"].as_f64().unwrap();
        if cog > 10.0 {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "vessel never turned, cog={cog}"
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

#[tokio::test]
async fn non_priority_command_is_rejected() {
    let (app, state, _shutdown) = setup_app(open_water_scenario()).await;
    let mut frames = state.subscribe_frames();

    let status = post_json(
        &app,
        "/v1/control/roc/ROC_2/sog",
        json!({ "value": 2.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let event = wait_for_event(&mut frames, |e| {
        matches!(e, VesselEvent::CommandRejected { roc_id, .. } if roc_id == "ROC_2")
    })
    .await;
    assert!(matches!(
        event,
        VesselEvent::CommandRejected { field, .. } if field == "SOG"
    ));

    let report = get_json(&app, "/v1/vessel").await;
    let sog = report["nav"]["sog_knots"].as_f64().unwrap();
    assert!((sog - 10.0).abs() < 1e-9, "sog changed to {sog}");
    assert_eq!(report["nav"]["priority_roc"], "ROC_1");
}

#[tokio::test]
async fn handover_completes_over_http() {
    let (app, state, _shutdown) = setup_app(gate_ahead_scenario()).await;
    let mut frames = state.subscribe_frames();

    let ready = wait_for_event(&mut frames, |e| {
        matches!(e, VesselEvent::ReadyForHandover { .. })
    })
    .await;
    assert!(matches!(
        ready,
        VesselEvent::ReadyForHandover { gate_id: 1, ref current_roc, .. }
            if current_roc == "ROC_1"
    ));

    let status = post_json(
        &app,
        "/v1/handover/relinquish",
        json!({ "roc_id": "ROC_1", "gate_id": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let status = post_json(
        &app,
        "/v1/handover/takeover",
        json!({ "roc_id": "ROC_2", "gate_id": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let completed = wait_for_event(&mut frames, |e| {
        matches!(e, VesselEvent::HandoverCompleted { .. })
    })
    .await;
    assert!(matches!(
        completed,
        VesselEvent::HandoverCompleted { gate_id: 1, ref new_priority, .. }
            if new_priority == "ROC_2"
    ));

    let report = get_json(&app, "/v1/vessel").await;
    assert_eq!(report["nav"]["priority_roc"], "ROC_2");

    let gates = get_json(&app, "/v1/gates").await;
    assert_eq!(gates[0]["active"], Value::Bool(false));
}

#[tokio::test]
async fn gate_toggle_parses_string_payload() {
    let (app, _state, _shutdown) = setup_app(gate_ahead_scenario()).await;

    let status = post_json(&app, "/v1/control/gate-status", json!({ "value": "1 0" })).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let gates = get_json(&app, "/v1/gates").await;
        if gates[0]["active"] == Value::Bool(false) {
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "gate never toggled");
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

#[tokio::test]
async fn malformed_payloads_are_bad_requests() {
    let (app, _state, _shutdown) = setup_app(open_water_scenario()).await;

    let status = post_json(&app, "/v1/control/cog", json!({ "value": "north" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let status = post_json(&app, "/v1/control/state", json!({ "value": "full-ahead" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let status = post_json(&app, "/v1/control/warp", json!({ "value": 9.0 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn track_snapshot_accumulates_positions() {
    let (app, _state, _shutdown) = setup_app(open_water_scenario()).await;

    // The plot snapshot refreshes every 25 ticks (0.5s at the test rate).
    tokio::time::sleep(Duration::from_millis(1200)).await;

    let track = get_json(&app, "/v1/track").await;
    let points = track["track"].as_array().unwrap();
    assert!(points.len() > 1, "expected accumulated track points");
    assert_eq!(track["name"], "MASS_0");
}
