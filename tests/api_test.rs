//! HTTP-level tests: routes, extractors and error mapping over the memory store.

use actix_web::http::StatusCode;
use actix_web::web::Data;
use actix_web::{App, test};
use attendance::config::{Config, DEFAULT_IDENTITY_HEADER};
use attendance::routes::{self, RateLimiters};
use attendance::store::{AnyTableStore, AppStore, MemoryTableStore, StoreClient};
use serde_json::{Value, json};
use std::net::SocketAddr;

fn peer() -> SocketAddr {
    "192.0.2.10:40000".parse().unwrap()
}

macro_rules! init_app {
    () => {
        init_app!(Config::default())
    };
    ($config:expr) => {{
        let config: Config = $config;
        let limiters = RateLimiters::from_config(&config).unwrap();
        let store: AppStore = StoreClient::new(AnyTableStore::Memory(MemoryTableStore::new()));
        test::init_service(
            App::new()
                .app_data(Data::new(store))
                .app_data(Data::new(config.clone()))
                .configure(|cfg| routes::configure(cfg, &config, &limiters)),
        )
        .await
    }};
}

#[actix_web::test]
async fn full_attendance_cycle() {
    let app = init_app!();

    let req = test::TestRequest::post()
        .uri("/api/projects")
        .peer_addr(peer())
        .set_json(json!({"name": "Design Review", "estimated_time": 45}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let project: Value = test::read_body_json(resp).await;
    let project_id = project["id"].as_u64().unwrap();

    let req = test::TestRequest::post()
        .uri("/api/attendance/check-in")
        .peer_addr(peer())
        .insert_header((DEFAULT_IDENTITY_HEADER, "laptop-7"))
        .set_json(json!({"project_id": project_id, "metadata": {"timezone": "UTC"}}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["session"]["identity"], "laptop-7");
    assert_eq!(body["session"]["project_id"], project_id);
    assert_eq!(body["session"]["check_in_metadata"], json!({"timezone": "UTC"}));
    assert!(body["session"]["checkout"].is_null());
    assert_eq!(body["view"]["checked_in"], true);

    let req = test::TestRequest::get()
        .uri("/api/attendance")
        .peer_addr(peer())
        .insert_header((DEFAULT_IDENTITY_HEADER, "laptop-7"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["checked_in"], true);
    assert_eq!(body["sessions"].as_array().unwrap().len(), 1);

    let req = test::TestRequest::post()
        .uri("/api/attendance/check-out")
        .peer_addr(peer())
        .insert_header((DEFAULT_IDENTITY_HEADER, "laptop-7"))
        .set_json(json!({"metadata": {"timezone": "UTC"}}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["session"]["work_minutes"], 0);
    assert!(body["session"]["checkout"].is_string());
    assert_eq!(body["view"]["checked_in"], false);
    assert!(body["view"]["active_session"].is_null());
}

#[actix_web::test]
async fn check_out_without_check_in_is_conflict() {
    let app = init_app!();

    let req = test::TestRequest::post()
        .uri("/api/attendance/check-out")
        .peer_addr(peer())
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "No active session found");
}

#[actix_web::test]
async fn check_in_without_project_is_bad_request() {
    let app = init_app!();

    let req = test::TestRequest::post()
        .uri("/api/attendance/check-in")
        .peer_addr(peer())
        .set_json(json!({"metadata": {}}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn zero_estimate_is_rejected() {
    let app = init_app!();

    let req = test::TestRequest::post()
        .uri("/api/projects")
        .peer_addr(peer())
        .set_json(json!({"name": "Design Review", "estimated_time": 0}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/projects")
        .peer_addr(peer())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"], json!([]));
}

#[actix_web::test]
async fn log_is_scoped_to_the_caller_unless_all_is_requested() {
    let app = init_app!();

    let req = test::TestRequest::post()
        .uri("/api/projects")
        .peer_addr(peer())
        .set_json(json!({"name": "Audit", "estimated_time": 30}))
        .to_request();
    let project: Value = test::call_and_read_body_json(&app, req).await;

    for who in ["alice", "bob"] {
        let req = test::TestRequest::post()
            .uri("/api/attendance/check-in")
            .peer_addr(peer())
            .insert_header((DEFAULT_IDENTITY_HEADER, who))
            .set_json(json!({"project_id": project["id"]}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let req = test::TestRequest::get()
        .uri("/api/attendance")
        .peer_addr(peer())
        .insert_header((DEFAULT_IDENTITY_HEADER, "alice"))
        .to_request();
    let mine: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(mine["sessions"].as_array().unwrap().len(), 1);
    assert_eq!(mine["identity"], "alice");

    let req = test::TestRequest::get()
        .uri("/api/attendance?scope=all")
        .peer_addr(peer())
        .insert_header((DEFAULT_IDENTITY_HEADER, "alice"))
        .to_request();
    let all: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(all["sessions"].as_array().unwrap().len(), 2);
    assert_eq!(all["checked_in"], true);
}

#[actix_web::test]
async fn peer_address_is_the_fallback_identity() {
    let app = init_app!();

    let req = test::TestRequest::get()
        .uri("/api/attendance")
        .peer_addr(peer())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["identity"], "192.0.2.10");
    assert_eq!(body["checked_in"], false);
}

#[actix_web::test]
async fn over_long_identity_header_is_bad_request() {
    let app = init_app!();

    let req = test::TestRequest::get()
        .uri("/api/attendance")
        .peer_addr(peer())
        .insert_header((DEFAULT_IDENTITY_HEADER, "d".repeat(256)))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["message"].as_str().unwrap().contains("Identity"));
}

#[actix_web::test]
async fn adding_projects_uses_the_mutation_limit() {
    let app = init_app!(Config {
        rate_mutations_per_min: 1,
        ..Config::default()
    });

    let add = |name: &str| {
        test::TestRequest::post()
            .uri("/api/projects")
            .peer_addr(peer())
            .set_json(json!({"name": name, "estimated_time": 30}))
            .to_request()
    };

    let resp = test::call_service(&app, add("Audit")).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = test::call_service(&app, add("Planning")).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    let req = test::TestRequest::get()
        .uri("/api/projects")
        .peer_addr(peer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}
