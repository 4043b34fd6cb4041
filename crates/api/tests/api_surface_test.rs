use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use turnover_api::{create_routes, AppState};
use turnover_coordinator::{Aggregator, SettlementCalculator, TaskPoolService};
use turnover_domain::repositories::TaskRepository;
use turnover_testing_utils::{at, MockTaskRepository, MockWorkerRepository, ReservationBuilder, WorkerBuilder};

fn test_app() -> (Router, Arc<MockTaskRepository>) {
    let task_repo = Arc::new(MockTaskRepository::new());
    let worker_repo = Arc::new(MockWorkerRepository::with_workers(vec![
        WorkerBuilder::new("w-1").build(),
        WorkerBuilder::new("w-2").build(),
    ]));

    let task_pool = Arc::new(TaskPoolService::new(task_repo.clone(), worker_repo.clone()));
    let settlement = Arc::new(SettlementCalculator::new(task_repo.clone()));
    let aggregator = Arc::new(Aggregator::new(
        task_repo.clone(),
        worker_repo,
        settlement.clone(),
    ));

    let state = AppState {
        task_pool,
        settlement,
        aggregator,
        default_alert_days: 3,
    };
    (create_routes(state), task_repo)
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post(uri: &str, actor: &str, role: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("x-actor-id", actor);
    if let Some(role) = role {
        builder = builder.header("x-actor-role", role);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = test_app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_claim_flow_and_lost_race() {
    let (app, task_repo) = test_app();
    let reservation = task_repo
        .create(&ReservationBuilder::new().checkout_in_hours(-1).build())
        .await
        .unwrap();

    let uri = format!("/api/tasks/{}/claim", reservation.id);
    let response = app.clone().oneshot(post(&uri, "w-1", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["assigned_worker_id"], "w-1");

    // 晚到者收到类型化的认领冲突
    let response = app.clone().oneshot(post(&uri, "w-2", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert_eq!(body["error"]["type"], "TASK_ALREADY_CLAIMED");
}

#[tokio::test]
async fn test_claim_requires_actor_header() {
    let (app, task_repo) = test_app();
    let reservation = task_repo
        .create(&ReservationBuilder::new().build())
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/tasks/{}/claim", reservation.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["type"], "MISSING_ACTOR");
}

#[tokio::test]
async fn test_reassign_requires_manager_role() {
    let (app, task_repo) = test_app();
    let reservation = task_repo
        .create(&ReservationBuilder::new().checkout_in_hours(-1).build())
        .await
        .unwrap();

    app.clone()
        .oneshot(post(&format!("/api/tasks/{}/claim", reservation.id), "w-1", None))
        .await
        .unwrap();

    let reassign = |role: Option<&str>| {
        let mut builder = Request::builder()
            .method("POST")
            .uri(format!("/api/tasks/{}/reassign", reservation.id))
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-actor-id", "admin");
        if let Some(role) = role {
            builder = builder.header("x-actor-role", role);
        }
        builder
            .body(Body::from(r#"{"new_worker_id":"w-2"}"#))
            .unwrap()
    };

    let response = app.clone().oneshot(reassign(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.clone().oneshot(reassign(Some("manager"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        task_repo.get_raw(reservation.id).unwrap().assigned_worker_id,
        Some("w-2".to_string())
    );
}

#[tokio::test]
async fn test_complete_premature_conflict() {
    let (app, task_repo) = test_app();
    let reservation = task_repo
        .create(&ReservationBuilder::new().checkout_in_hours(5).build())
        .await
        .unwrap();

    app.clone()
        .oneshot(post(&format!("/api/tasks/{}/claim", reservation.id), "w-1", None))
        .await
        .unwrap();

    let response = app
        .oneshot(post(
            &format!("/api/tasks/{}/complete", reservation.id),
            "w-1",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert_eq!(body["error"]["type"], "PREMATURE_COMPLETION");
}

#[tokio::test]
async fn test_settlement_endpoint() {
    let (app, task_repo) = test_app();
    task_repo
        .create(
            &ReservationBuilder::new()
                .with_stay(at(2024, 3, 1, 14, 0), at(2024, 3, 3, 11, 0))
                .with_fee(120.0)
                .paid()
                .completed_by("w-1")
                .build(),
        )
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/workers/w-1/settlement?period=2024-03")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["received_total"], 120.0);
    assert_eq!(body["data"]["line_items"].as_array().unwrap().len(), 1);

    // 非法周期
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/workers/w-1/settlement?period=2024-13")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_fleet_risk_alerts_with_default_window() {
    let (app, task_repo) = test_app();
    task_repo
        .create(&ReservationBuilder::new().checkout_in_hours(-60).build())
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/alerts/fleet-risk")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let alerts = body["data"].as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["urgency"], "overdue");
}

#[tokio::test]
async fn test_available_list_endpoint() {
    let (app, task_repo) = test_app();
    task_repo
        .create(&ReservationBuilder::new().checkout_in_hours(-49).build())
        .await
        .unwrap();
    task_repo
        .create(&ReservationBuilder::new().checkout_in_hours(5).build())
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/workers/w-1/tasks/available")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let tasks = body["data"].as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0]["urgency"], "overdue");
    assert_eq!(tasks[1]["urgency"], "normal");
}
