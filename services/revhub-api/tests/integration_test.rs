//! End-to-end integration tests for the RevHub API

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use revhub_api::{build_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

/// Initialize tracing for tests (call once)
fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("revhub_api=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

fn create_app() -> Router {
    init_tracing();
    build_router(AppState::new(4, 2))
}

async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()))
    };
    (status, value)
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    post_raw(app, uri, "application/json", serde_json::to_vec(&body).unwrap()).await
}

async fn post_raw(app: &Router, uri: &str, content_type: &str, body: Vec<u8>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    read_json(response).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read_json(response).await
}

async fn add_team(app: &Router, team_name: &str, members: &[(&str, bool)]) -> (StatusCode, Value) {
    let members: Vec<Value> = members
        .iter()
        .map(|(id, active)| json!({"user_id": id, "username": id.to_uppercase(), "is_active": active}))
        .collect();
    post(app, "/team/add", json!({"team_name": team_name, "members": members})).await
}

async fn create_pr(app: &Router, id: &str, author: &str) -> (StatusCode, Value) {
    post(
        app,
        "/pullRequest/create",
        json!({"pull_request_id": id, "pull_request_name": "x", "author_id": author}),
    )
    .await
}

#[tokio::test]
async fn test_health_check() {
    let app = create_app();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn test_register_team() {
    let app = create_app();

    let (status, body) = add_team(&app, "t1", &[("u1", true)]).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["team_name"], "t1");
    assert_eq!(body["member_count"], 1);
}

#[tokio::test]
async fn test_create_pull_request_and_duplicate() {
    let app = create_app();
    add_team(&app, "t1", &[("u1", true)]).await;

    let (status, body) = create_pr(&app, "pr-1", "u1").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["pull_request_id"], "pr-1");
    assert_eq!(body["status"], "open");
    // Lone member: nobody to review.
    assert_eq!(body["assigned_reviewers"], json!([]));

    let (status, body) = create_pr(&app, "pr-1", "u1").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "duplicate_id");
}

#[tokio::test]
async fn test_unknown_author() {
    let app = create_app();

    let (status, body) = create_pr(&app, "pr-9", "ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown_author");
}

#[tokio::test]
async fn test_stats_after_one_pull_request() {
    let app = create_app();
    add_team(&app, "t1", &[("u1", true)]).await;
    create_pr(&app, "pr-1", "u1").await;

    let (status, body) = get(&app, "/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_teams"], 1);
    assert_eq!(body["total_members"], 1);
    assert_eq!(body["total_pull_requests"], 1);
    assert_eq!(body["pull_requests_per_author"], json!({"u1": 1}));
    assert_eq!(body["pull_requests_by_status"], json!({"open": 1, "merged": 0}));
}

#[tokio::test]
async fn test_stats_empty() {
    let app = create_app();

    let (status, body) = get(&app, "/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_teams"], 0);
    assert_eq!(body["total_pull_requests"], 0);
    assert_eq!(body["pull_requests_per_author"], json!({}));
}

#[tokio::test]
async fn test_duplicate_team_and_member() {
    let app = create_app();
    add_team(&app, "t1", &[("u1", true)]).await;

    let (status, body) = add_team(&app, "t1", &[("u2", true)]).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "duplicate_team");

    let (status, body) = add_team(&app, "t2", &[("u3", true), ("u3", false)]).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "duplicate_member");

    // Nothing from the rejected registration is visible.
    let (status, _) = get(&app, "/team/get?team_name=t2").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, stats) = get(&app, "/stats").await;
    assert_eq!(stats["total_teams"], 1);
    assert_eq!(stats["total_members"], 1);
}

#[tokio::test]
async fn test_malformed_requests() {
    let app = create_app();

    let cases = [
        // invalid JSON
        ("/team/add", "application/json", b"{not json".to_vec()),
        // missing members
        ("/team/add", "application/json", br#"{"team_name":"t1"}"#.to_vec()),
        // wrong field type
        (
            "/team/add",
            "application/json",
            br#"{"team_name":"t1","members":[{"user_id":"u1","username":"A","is_active":"yes"}]}"#.to_vec(),
        ),
        // unknown field
        (
            "/pullRequest/create",
            "application/json",
            br#"{"pull_request_id":"p","pull_request_name":"x","author_id":"u1","extra":1}"#.to_vec(),
        ),
        // empty identifier
        (
            "/pullRequest/create",
            "application/json",
            br#"{"pull_request_id":"","pull_request_name":"x","author_id":"u1"}"#.to_vec(),
        ),
        // wrong content type
        ("/pullRequest/create", "text/plain", br#"{"pull_request_id":"p"}"#.to_vec()),
    ];

    for (uri, content_type, body) in cases {
        let (status, value) = post_raw(&app, uri, content_type, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}: {value}");
        assert_eq!(value["error"], "validation_error");
    }

    let (status, body) = get(&app, "/team/get").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_get_team() {
    let app = create_app();
    add_team(&app, "backend", &[("u1", true), ("u2", false)]).await;

    let (status, body) = get(&app, "/team/get?team_name=backend").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["team_name"], "backend");
    assert_eq!(body["members"][1]["user_id"], "u2");
    assert_eq!(body["members"][1]["is_active"], false);

    let (status, body) = get(&app, "/team/get?team_name=missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "team_not_found");
}

#[tokio::test]
async fn test_reviewers_assigned_from_active_teammates() {
    let app = create_app();
    add_team(&app, "t1", &[("u1", true), ("u2", true), ("u3", true), ("u4", false)]).await;

    let (status, body) = create_pr(&app, "pr-1", "u1").await;
    assert_eq!(status, StatusCode::CREATED);

    let reviewers: Vec<String> = serde_json::from_value(body["assigned_reviewers"].clone()).unwrap();
    assert_eq!(reviewers.len(), 2);
    assert!(reviewers.iter().all(|r| r == "u2" || r == "u3"));

    let (status, body) = get(&app, "/users/getReview?user_id=u2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], "u2");
    assert_eq!(body["pull_requests"][0]["pull_request_id"], "pr-1");
    assert_eq!(body["pull_requests"][0]["status"], "open");

    let (status, body) = get(&app, "/users/getReview?user_id=ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "user_not_found");
}

#[tokio::test]
async fn test_set_is_active() {
    let app = create_app();
    add_team(&app, "t1", &[("u1", true)]).await;

    let (status, body) = post(&app, "/users/setIsActive", json!({"user_id": "u1", "is_active": false})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["user_id"], "u1");
    assert_eq!(body["user"]["is_active"], false);
    assert_eq!(body["user"]["teams"], json!(["t1"]));

    // Inactive authors cannot open pull requests.
    let (status, body) = create_pr(&app, "pr-1", "u1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown_author");

    let (status, body) = post(&app, "/users/setIsActive", json!({"user_id": "ghost", "is_active": true})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "user_not_found");
}

#[tokio::test]
async fn test_merge_is_idempotent() {
    let app = create_app();
    add_team(&app, "t1", &[("u1", true)]).await;
    create_pr(&app, "pr-1", "u1").await;

    let (status, first) = post(&app, "/pullRequest/merge", json!({"pull_request_id": "pr-1"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["pr"]["status"], "merged");

    let (status, second) = post(&app, "/pullRequest/merge", json!({"pull_request_id": "pr-1"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["pr"]["merged_at"], first["pr"]["merged_at"]);

    let (status, body) = post(&app, "/pullRequest/merge", json!({"pull_request_id": "nope"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "pull_request_not_found");

    let (_, stats) = get(&app, "/stats").await;
    assert_eq!(stats["pull_requests_by_status"], json!({"open": 0, "merged": 1}));
}

#[tokio::test]
async fn test_reassign_reviewer() {
    let app = create_app();
    add_team(&app, "t1", &[("u1", true), ("u2", true), ("u3", true), ("u4", true)]).await;
    let (_, pr) = create_pr(&app, "pr-1", "u1").await;
    let old = pr["assigned_reviewers"][0].as_str().unwrap().to_string();

    let (status, body) = post(
        &app,
        "/pullRequest/reassign",
        json!({"pull_request_id": "pr-1", "old_user_id": old}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let replaced_by = body["replaced_by"].as_str().unwrap();
    assert_ne!(replaced_by, old);
    assert_ne!(replaced_by, "u1");
    assert_eq!(body["pr"]["assigned_reviewers"][0], replaced_by);
    assert_eq!(body["pr"]["assigned_reviewers"].as_array().unwrap().len(), 2);

    // The old reviewer is no longer assigned.
    let (status, body) = post(
        &app,
        "/pullRequest/reassign",
        json!({"pull_request_id": "pr-1", "old_user_id": old}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "reviewer_not_assigned");

    // The first reviewer is the only candidate left.
    let (status, body) = post(
        &app,
        "/pullRequest/reassign",
        json!({"pull_request_id": "pr-1", "old_user_id": replaced_by}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["replaced_by"], old.as_str());

    post(&app, "/pullRequest/merge", json!({"pull_request_id": "pr-1"})).await;
    let reviewer = body["pr"]["assigned_reviewers"][0].as_str().unwrap().to_string();
    let (status, body) = post(
        &app,
        "/pullRequest/reassign",
        json!({"pull_request_id": "pr-1", "old_user_id": reviewer}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "pull_request_merged");
}

#[tokio::test]
async fn test_reassign_without_candidate() {
    let app = create_app();
    add_team(&app, "t1", &[("u1", true), ("u2", true)]).await;
    create_pr(&app, "pr-1", "u1").await;

    let (status, body) = post(
        &app,
        "/pullRequest/reassign",
        json!({"pull_request_id": "pr-1", "old_user_id": "u2"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "no_candidate");
}

#[tokio::test]
async fn test_metrics_endpoint_reports_requests() {
    let app = create_app();
    add_team(&app, "t1", &[("u1", true)]).await;
    create_pr(&app, "pr-1", "u1").await;

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("revhub_api_requests_total"));
    assert!(text.contains("revhub_pull_requests_created_total"));
    assert!(text.contains("revhub_teams_created_total"));
}

#[tokio::test]
async fn test_unknown_query_parameters_rejected() {
    let app = create_app();
    add_team(&app, "t1", &[("u1", true)]).await;

    for uri in [
        "/team/get?team_name=t1&verbose=1",
        "/users/getReview?user_id=u1&page=2",
    ] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}: {body}");
        assert_eq!(body["error"], "validation_error");
    }
}

#[tokio::test]
async fn test_deactivate_members_hands_over_reviews() {
    let app = create_app();
    add_team(&app, "t1", &[("u1", true), ("u2", true), ("u3", true), ("u4", true)]).await;
    let (_, pr) = create_pr(&app, "pr-1", "u1").await;
    let leaving = pr["assigned_reviewers"][0].as_str().unwrap().to_string();
    let staying = pr["assigned_reviewers"][1].as_str().unwrap().to_string();

    let (status, body) = post(
        &app,
        "/team/deactivateMembers",
        json!({"team_name": "t1", "user_ids": [leaving]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["team"]["team_name"], "t1");

    let members = body["team"]["members"].as_array().unwrap();
    let flag = |id: &str| members.iter().find(|m| m["user_id"] == id).unwrap()["is_active"].clone();
    assert_eq!(flag(&leaving), false);
    assert_eq!(flag(&staying), true);

    let reassigned = body["reassigned"].as_array().unwrap();
    assert_eq!(reassigned.len(), 1);
    let reviewers: Vec<String> =
        serde_json::from_value(reassigned[0]["assigned_reviewers"].clone()).unwrap();
    assert_eq!(reviewers.len(), 2);
    assert_eq!(reviewers[1], staying);
    assert!(!reviewers.contains(&leaving));
    assert!(!reviewers.contains(&"u1".to_string()));

    let (status, body) = get(&app, &format!("/users/getReview?user_id={leaving}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pull_requests"], json!([]));
}

#[tokio::test]
async fn test_deactivate_members_without_candidate() {
    let app = create_app();
    add_team(&app, "t1", &[("u1", true), ("u2", true), ("u3", true)]).await;
    create_pr(&app, "pr-1", "u1").await;

    let (status, body) = post(
        &app,
        "/team/deactivateMembers",
        json!({"team_name": "t1", "user_ids": ["u2", "u3"]}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "no_candidate");

    // Nothing was applied.
    let (_, team) = get(&app, "/team/get?team_name=t1").await;
    assert!(team["members"].as_array().unwrap().iter().all(|m| m["is_active"] == true));
    let (_, reviews) = get(&app, "/users/getReview?user_id=u2").await;
    assert_eq!(reviews["pull_requests"][0]["pull_request_id"], "pr-1");
}

#[tokio::test]
async fn test_deactivate_members_outside_team() {
    let app = create_app();
    add_team(&app, "t1", &[("u1", true)]).await;
    add_team(&app, "t2", &[("u2", true)]).await;

    let (status, body) = post(
        &app,
        "/team/deactivateMembers",
        json!({"team_name": "t1", "user_ids": ["u1", "u2"]}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "user_not_found");

    let (_, team) = get(&app, "/team/get?team_name=t1").await;
    assert_eq!(team["members"][0]["is_active"], true);

    let (status, body) = post(
        &app,
        "/team/deactivateMembers",
        json!({"team_name": "missing", "user_ids": ["u1"]}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "team_not_found");

    let (status, body) = post(
        &app,
        "/team/deactivateMembers",
        json!({"team_name": "t1", "user_ids": []}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}
