//! HTTP tests for the protected leave and notification routes.

use super::*;
use crate::auth::jwt::generate_access_token;
use crate::config::Config;
use crate::leave::{BalancePolicy, LeaveWorkflow};
use crate::model::notification::NewNotification;
use crate::model::role::Role;
use crate::model::user::{User, UserId};
use crate::notify;
use crate::store::{MemoryStore, NotificationFeed};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web::Data};
use serde_json::{Value, json};
use std::net::SocketAddr;

const SECRET: &str = "test-secret";

fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "SERVER_ADDR" => Some("127.0.0.1:0".to_string()),
        "DATABASE_URL" => Some("mysql://unused".to_string()),
        "JWT_SECRET" => Some(SECRET.to_string()),
        _ => None,
    })
    .unwrap()
}

fn staff() -> MemoryStore {
    let user = |id: &str, role, manager: Option<&str>, balance| User {
        id: UserId::from(id),
        role,
        manager_id: manager.map(UserId::from),
        full_name: id.to_uppercase(),
        leave_balance: balance,
    };
    MemoryStore::with_users([
        user("hr1", Role::HrAdmin, None, None),
        user("m1", Role::Manager, None, Some(25)),
        user("m2", Role::Manager, None, Some(25)),
        user("e1", Role::Employee, Some("m1"), Some(18)),
        user("f1", Role::Employee, Some("m1"), Some(2)),
    ])
}

fn test_app(
    store: Arc<MemoryStore>,
    policy: BalancePolicy,
    per_min: u32,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let config = test_config();
    let (sink, _notices) = notify::channel();
    let workflow = LeaveWorkflow::new(store.clone(), store.clone(), Arc::new(sink), policy);
    let feed: Data<dyn NotificationFeed> = Data::from(store as Arc<dyn NotificationFeed>);
    let limiter = Arc::new(build_limiter(per_min).unwrap());
    let prefix = config.api_prefix.clone();

    App::new()
        .app_data(Data::new(config))
        .app_data(Data::new(workflow))
        .app_data(feed)
        .configure(|cfg| configure(cfg, &prefix, limiter))
}

fn request(method: &str, uri: &str, user: Option<&str>) -> actix_test::TestRequest {
    let peer: SocketAddr = "10.0.0.7:40000".parse().unwrap();
    let req = match method {
        "POST" => actix_test::TestRequest::post(),
        "PUT" => actix_test::TestRequest::put(),
        "DELETE" => actix_test::TestRequest::delete(),
        _ => actix_test::TestRequest::get(),
    }
    .uri(uri)
    .peer_addr(peer);

    match user {
        Some(id) => {
            let token = generate_access_token(id, SECRET, 300).unwrap();
            req.insert_header(("Authorization", format!("Bearer {token}")))
        }
        None => req,
    }
}

fn leave_body() -> Value {
    json!({
        "start_date": "2024-06-10",
        "end_date": "2024-06-14",
        "leave_type": "annual"
    })
}

#[actix_web::test]
async fn health_needs_no_token() {
    let app = actix_test::init_service(test_app(
        Arc::new(staff()),
        BalancePolicy::AllowNegative,
        1000,
    ))
    .await;

    let res = actix_test::call_service(&app, request("GET", "/health", None).to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn protected_routes_require_a_known_bearer() {
    let app = actix_test::init_service(test_app(
        Arc::new(staff()),
        BalancePolicy::AllowNegative,
        1000,
    ))
    .await;

    let res = actix_test::call_service(&app, request("GET", "/api/leave", None).to_request()).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["error"], "unauthorized");

    let bad = request("GET", "/api/leave", None)
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let res = actix_test::call_service(&app, bad).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let stranger = request("GET", "/api/leave", Some("ghost")).to_request();
    let res = actix_test::call_service(&app, stranger).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn approval_flow_over_http() {
    let store = Arc::new(staff());
    let app = actix_test::init_service(test_app(
        store.clone(),
        BalancePolicy::AllowNegative,
        1000,
    ))
    .await;

    let created = request("POST", "/api/leave", Some("e1"))
        .set_json(leave_body())
        .to_request();
    let res = actix_test::call_service(&app, created).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["employee_id"], "e1");
    let id = body["id"].as_u64().unwrap();

    let res = actix_test::call_service(
        &app,
        request("PUT", &format!("/api/leave/{id}/approve"), Some("m1")).to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["status"], "manager_approved");

    let res = actix_test::call_service(
        &app,
        request("PUT", &format!("/api/leave/{id}/approve"), Some("hr1")).to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        store.user(&"e1".into()).and_then(|u| u.leave_balance),
        Some(13)
    );

    let res = actix_test::call_service(
        &app,
        request("PUT", &format!("/api/leave/{id}/reject"), Some("hr1")).to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["error"], "invalid_transition");
}

#[actix_web::test]
async fn domain_errors_map_to_status_codes() {
    let store = Arc::new(staff());
    let app = actix_test::init_service(test_app(store, BalancePolicy::Block, 1000)).await;

    let backwards = request("POST", "/api/leave", Some("e1"))
        .set_json(json!({
            "start_date": "2024-06-14",
            "end_date": "2024-06-10",
            "leave_type": "annual"
        }))
        .to_request();
    let res = actix_test::call_service(&app, backwards).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["error"], "validation_error");

    let created = request("POST", "/api/leave", Some("f1"))
        .set_json(leave_body())
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, created).await;
    let id = body["id"].as_u64().unwrap();

    let res = actix_test::call_service(
        &app,
        request("GET", &format!("/api/leave/{id}"), Some("m2")).to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = actix_test::call_service(
        &app,
        request("PUT", &format!("/api/leave/{id}/approve"), Some("f1")).to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = actix_test::call_service(
        &app,
        request("PUT", &format!("/api/leave/{id}/approve"), Some("hr1")).to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["error"], "insufficient_balance");
}

#[actix_web::test]
async fn owner_edits_then_cannot_delete_after_review() {
    let app = actix_test::init_service(test_app(
        Arc::new(staff()),
        BalancePolicy::AllowNegative,
        1000,
    ))
    .await;

    let created = request("POST", "/api/leave", Some("e1"))
        .set_json(leave_body())
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, created).await;
    let id = body["id"].as_u64().unwrap();

    let edit = request("PUT", &format!("/api/leave/{id}"), Some("e1"))
        .set_json(json!({ "leave_type": "sick" }))
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, edit).await;
    assert_eq!(body["leave_type"], "sick");
    assert_eq!(body["version"], 2);

    let status_edit = request("PUT", &format!("/api/leave/{id}"), Some("e1"))
        .set_json(json!({ "status": "final_approved" }))
        .to_request();
    let res = actix_test::call_service(&app, status_edit).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    actix_test::call_service(
        &app,
        request("PUT", &format!("/api/leave/{id}/approve"), Some("m1")).to_request(),
    )
    .await;

    let res = actix_test::call_service(
        &app,
        request("DELETE", &format!("/api/leave/{id}"), Some("e1")).to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = actix_test::call_service(
        &app,
        request("DELETE", &format!("/api/leave/{id}"), Some("hr1")).to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn list_is_scoped_and_paged() {
    let app = actix_test::init_service(test_app(
        Arc::new(staff()),
        BalancePolicy::AllowNegative,
        1000,
    ))
    .await;

    for user in ["e1", "f1", "m2"] {
        let req = request("POST", "/api/leave", Some(user))
            .set_json(leave_body())
            .to_request();
        actix_test::call_service(&app, req).await;
    }

    let body: Value = actix_test::call_and_read_body_json(
        &app,
        request("GET", "/api/leave?per_page=1", Some("m1")).to_request(),
    )
    .await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["per_page"], 1);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let body: Value = actix_test::call_and_read_body_json(
        &app,
        request("GET", "/api/leave?status=pending", Some("hr1")).to_request(),
    )
    .await;
    assert_eq!(body["total"], 3);
}

#[actix_web::test]
async fn notification_feed_round() {
    let store = Arc::new(staff());
    for title in ["first", "second"] {
        store
            .push(&NewNotification {
                user_id: "e1".into(),
                title: title.to_string(),
                message: "m".to_string(),
                category: "leave".to_string(),
                link: None,
            })
            .await
            .unwrap();
    }
    let app = actix_test::init_service(test_app(
        store,
        BalancePolicy::AllowNegative,
        1000,
    ))
    .await;

    let body: Value = actix_test::call_and_read_body_json(
        &app,
        request("GET", "/api/notifications?unread_only=true", Some("e1")).to_request(),
    )
    .await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    let first_id = rows[0]["id"].as_u64().unwrap();

    let res = actix_test::call_service(
        &app,
        request("PUT", &format!("/api/notifications/{first_id}/read"), Some("e1")).to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let body: Value = actix_test::call_and_read_body_json(
        &app,
        request("GET", "/api/notifications/unread-count", Some("e1")).to_request(),
    )
    .await;
    assert_eq!(body["count"], 1);

    let body: Value = actix_test::call_and_read_body_json(
        &app,
        request("PUT", "/api/notifications/read-all", Some("e1")).to_request(),
    )
    .await;
    assert_eq!(body["updated"], 1);

    let body: Value = actix_test::call_and_read_body_json(
        &app,
        request("GET", "/api/notifications/unread-count", Some("m1")).to_request(),
    )
    .await;
    assert_eq!(body["count"], 0);
}

#[actix_web::test]
async fn protected_scope_is_rate_limited_per_ip() {
    let app = actix_test::init_service(test_app(
        Arc::new(staff()),
        BalancePolicy::AllowNegative,
        1,
    ))
    .await;

    let first =
        actix_test::call_service(&app, request("GET", "/api/leave", Some("e1")).to_request())
            .await;
    assert_eq!(first.status(), StatusCode::OK);

    // The limiter answers with an error response rather than Ok.
    let second =
        actix_test::try_call_service(&app, request("GET", "/api/leave", Some("e1")).to_request())
            .await;
    let status = match second {
        Ok(res) => res.status(),
        Err(err) => err.error_response().status(),
    };
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[test]
fn limiter_accepts_zero_as_slowest_rate() {
    assert!(build_limiter(0).is_ok());
}
