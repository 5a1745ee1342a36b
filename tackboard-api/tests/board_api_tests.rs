/// Board, membership, and activity feed tests over the HTTP surface
///
/// Exercises the full router against the in-memory store: role gating,
/// owner-only mutations, idempotent invites, the owner guard, and the
/// newest-first activity feed.

mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use serde_json::json;
use tower::Service as _;

#[tokio::test]
async fn test_health_endpoint() {
    let mut app = common::test_app();

    let (status, body) = common::request(&mut app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_security_headers_present() {
    let mut app = common::test_app();

    let response = app
        .call(
            Request::builder()
                .method(Method::GET)
                .uri("/health")
                .body(Body::empty())
                .expect("Failed to build request"),
        )
        .await
        .expect("Failed to send request");

    let headers = response.headers();
    assert_eq!(headers.get("X-Content-Type-Options").unwrap(), "nosniff");
    assert_eq!(headers.get("X-Frame-Options").unwrap(), "DENY");
    assert!(headers.get("Content-Security-Policy").is_some());
    // HSTS only applies in production mode
    assert!(headers.get("Strict-Transport-Security").is_none());
}

#[tokio::test]
async fn test_boards_require_auth() {
    let mut app = common::test_app();

    let (status, body) = common::request(
        &mut app,
        Method::POST,
        "/v1/boards",
        None,
        Some(json!({ "name": "Sprint" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = common::request(&mut app, Method::GET, "/v1/boards", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_board_lifecycle_end_to_end() {
    let mut app = common::test_app();

    let (alice_id, alice) = common::register(&mut app, "Alice", "alice@example.com").await;
    let (bob_id, bob) = common::register(&mut app, "Bob", "bob@example.com").await;

    let board_id = common::create_board(&mut app, &alice, "Sprint 12").await;

    // The creator sees the board with their role and the owner annotation
    let (status, body) =
        common::request(&mut app, Method::GET, "/v1/boards", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let boards = body["boards"].as_array().expect("Missing boards");
    assert_eq!(boards.len(), 1);
    assert_eq!(boards[0]["name"], "Sprint 12");
    assert_eq!(boards[0]["my_role"], "OWNER");
    assert_eq!(boards[0]["owner"]["id"], alice_id.as_str());

    // Bob cannot see it yet
    let (status, body) =
        common::request(&mut app, Method::GET, "/v1/boards", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["boards"].as_array().expect("Missing boards").len(), 0);

    // Invite Bob
    let (status, body) = common::request(
        &mut app,
        Method::POST,
        &format!("/v1/boards/{}/members", board_id),
        Some(&alice),
        Some(json!({ "email": "bob@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let members = body["members"].as_array().expect("Missing members");
    assert_eq!(members.len(), 2);

    // Bob now sees the board as a viewer
    let (status, body) = common::request(
        &mut app,
        Method::GET,
        &format!("/v1/boards/{}", board_id),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["my_role"], "VIEWER");
    assert_eq!(body["board"]["name"], "Sprint 12");
    assert_eq!(body["owner"]["name"], "Alice");
    assert_eq!(body["members"].as_array().expect("Missing members").len(), 2);

    // Rename
    let (status, body) = common::request(
        &mut app,
        Method::PATCH,
        &format!("/v1/boards/{}", board_id),
        Some(&alice),
        Some(json!({ "name": "Sprint 13" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["board"]["name"], "Sprint 13");

    // The feed has the invite and the creation, newest first
    let (status, body) = common::request(
        &mut app,
        Method::GET,
        &format!("/v1/boards/{}/activity", board_id),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let activities = body["activities"].as_array().expect("Missing activities");
    assert_eq!(activities.len(), 2);
    assert_eq!(activities[0]["type"], "MEMBER_ADDED");
    assert_eq!(activities[0]["meta"]["member_user_id"], bob_id.as_str());
    assert_eq!(activities[1]["type"], "BOARD_CREATED");

    // Delete the board
    let (status, body) = common::request(
        &mut app,
        Method::DELETE,
        &format!("/v1/boards/{}", board_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    // Gone for everyone
    let (status, body) = common::request(
        &mut app,
        Method::GET,
        &format!("/v1/boards/{}", board_id),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, body) =
        common::request(&mut app, Method::GET, "/v1/boards", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["boards"].as_array().expect("Missing boards").len(), 0);
}

#[tokio::test]
async fn test_board_mutations_are_owner_only() {
    let mut app = common::test_app();

    let (_, alice) = common::register(&mut app, "Alice", "alice@example.com").await;
    let (_, bob) = common::register(&mut app, "Bob", "bob@example.com").await;
    let (_, carol) = common::register(&mut app, "Carol", "carol@example.com").await;

    let board_id = common::create_board(&mut app, &alice, "Sprint").await;

    common::request(
        &mut app,
        Method::POST,
        &format!("/v1/boards/{}/members", board_id),
        Some(&alice),
        Some(json!({ "email": "bob@example.com" })),
    )
    .await;

    // A viewer cannot rename, delete, or invite
    let (status, body) = common::request(
        &mut app,
        Method::PATCH,
        &format!("/v1/boards/{}", board_id),
        Some(&bob),
        Some(json!({ "name": "Hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = common::request(
        &mut app,
        Method::DELETE,
        &format!("/v1/boards/{}", board_id),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = common::request(
        &mut app,
        Method::POST,
        &format!("/v1/boards/{}/members", board_id),
        Some(&bob),
        Some(json!({ "email": "carol@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // A non-member cannot even read
    let (status, body) = common::request(
        &mut app,
        Method::GET,
        &format!("/v1/boards/{}", board_id),
        Some(&carol),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
    assert_eq!(body["message"], "Not a member of this board");

    // A missing board outranks the membership check
    let (status, body) = common::request(
        &mut app,
        Method::GET,
        "/v1/boards/00000000-0000-0000-0000-000000000000",
        Some(&carol),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_invite_is_idempotent_and_requires_registered_email() {
    let mut app = common::test_app();

    let (_, alice) = common::register(&mut app, "Alice", "alice@example.com").await;
    common::register(&mut app, "Bob", "bob@example.com").await;

    let board_id = common::create_board(&mut app, &alice, "Sprint").await;

    for _ in 0..2 {
        let (status, body) = common::request(
            &mut app,
            Method::POST,
            &format!("/v1/boards/{}/members", board_id),
            Some(&alice),
            Some(json!({ "email": "bob@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["members"].as_array().expect("Missing members").len(), 2);
    }

    // Only the first invite shows up in the feed
    let (_, body) = common::request(
        &mut app,
        Method::GET,
        &format!("/v1/boards/{}/activity", board_id),
        Some(&alice),
        None,
    )
    .await;
    let invites = body["activities"]
        .as_array()
        .expect("Missing activities")
        .iter()
        .filter(|a| a["type"] == "MEMBER_ADDED")
        .count();
    assert_eq!(invites, 1);

    // Inviting an unregistered address is a 404
    let (status, body) = common::request(
        &mut app,
        Method::POST,
        &format!("/v1/boards/{}/members", board_id),
        Some(&alice),
        Some(json!({ "email": "ghost@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
    assert!(body["message"]
        .as_str()
        .expect("Missing message")
        .contains("ghost@example.com"));
}

#[tokio::test]
async fn test_member_role_updates_and_owner_guard() {
    let mut app = common::test_app();

    let (alice_id, alice) = common::register(&mut app, "Alice", "alice@example.com").await;
    let (bob_id, bob) = common::register(&mut app, "Bob", "bob@example.com").await;

    let board_id = common::create_board(&mut app, &alice, "Sprint").await;

    let (_, body) = common::request(
        &mut app,
        Method::POST,
        &format!("/v1/boards/{}/members", board_id),
        Some(&alice),
        Some(json!({ "email": "bob@example.com" })),
    )
    .await;

    let members = body["members"].as_array().expect("Missing members");
    let member_id_of = |user_id: &str| {
        members
            .iter()
            .find(|m| m["user"]["id"] == user_id)
            .and_then(|m| m["id"].as_str())
            .expect("Membership row missing")
            .to_string()
    };
    let bob_member = member_id_of(&bob_id);
    let alice_member = member_id_of(&alice_id);

    // Promote Bob to editor
    let (status, body) = common::request(
        &mut app,
        Method::PATCH,
        &format!("/v1/boards/{}/members/{}", board_id, bob_member),
        Some(&alice),
        Some(json!({ "role": "EDITOR" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let updated = body["members"]
        .as_array()
        .expect("Missing members")
        .iter()
        .find(|m| m["user"]["id"] == bob_id.as_str())
        .expect("Bob missing")
        .clone();
    assert_eq!(updated["role"], "EDITOR");

    // OWNER is not assignable
    let (status, body) = common::request(
        &mut app,
        Method::PATCH,
        &format!("/v1/boards/{}/members/{}", board_id, bob_member),
        Some(&alice),
        Some(json!({ "role": "OWNER" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    // Unknown roles fail validation
    let (status, body) = common::request(
        &mut app,
        Method::PATCH,
        &format!("/v1/boards/{}/members/{}", board_id, bob_member),
        Some(&alice),
        Some(json!({ "role": "ADMIN" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    // The owner's row cannot be touched
    let (status, body) = common::request(
        &mut app,
        Method::PATCH,
        &format!("/v1/boards/{}/members/{}", board_id, alice_member),
        Some(&alice),
        Some(json!({ "role": "VIEWER" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = common::request(
        &mut app,
        Method::DELETE,
        &format!("/v1/boards/{}/members/{}", board_id, alice_member),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // A non-owner cannot manage members at all
    let (status, _) = common::request(
        &mut app,
        Method::PATCH,
        &format!("/v1/boards/{}/members/{}", board_id, bob_member),
        Some(&bob),
        Some(json!({ "role": "VIEWER" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Remove Bob, then removing again is a 404
    let (status, body) = common::request(
        &mut app,
        Method::DELETE,
        &format!("/v1/boards/{}/members/{}", board_id, bob_member),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["members"].as_array().expect("Missing members").len(), 1);

    let (status, body) = common::request(
        &mut app,
        Method::DELETE,
        &format!("/v1/boards/{}/members/{}", board_id, bob_member),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_activity_limit_parameter() {
    let mut app = common::test_app();

    let (_, alice) = common::register(&mut app, "Alice", "alice@example.com").await;
    common::register(&mut app, "Bob", "bob@example.com").await;

    let board_id = common::create_board(&mut app, &alice, "Sprint").await;
    common::request(
        &mut app,
        Method::POST,
        &format!("/v1/boards/{}/members", board_id),
        Some(&alice),
        Some(json!({ "email": "bob@example.com" })),
    )
    .await;

    // limit=1 returns just the newest record
    let (status, body) = common::request(
        &mut app,
        Method::GET,
        &format!("/v1/boards/{}/activity?limit=1", board_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let activities = body["activities"].as_array().expect("Missing activities");
    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0]["type"], "MEMBER_ADDED");

    // A non-positive limit falls back to the default
    let (status, body) = common::request(
        &mut app,
        Method::GET,
        &format!("/v1/boards/{}/activity?limit=-5", board_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["activities"].as_array().expect("Missing activities").len(), 2);
}

#[tokio::test]
async fn test_board_name_validation() {
    let mut app = common::test_app();

    let (_, alice) = common::register(&mut app, "Alice", "alice@example.com").await;

    let (status, body) = common::request(
        &mut app,
        Method::POST,
        "/v1/boards",
        Some(&alice),
        Some(json!({ "name": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert!(body["details"]
        .as_array()
        .expect("Missing details")
        .iter()
        .any(|d| d["field"] == "name"));

    let (status, _) = common::request(
        &mut app,
        Method::POST,
        "/v1/boards",
        Some(&alice),
        Some(json!({ "name": "x".repeat(101) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_viewer_promotion_collaboration_flow() {
    let mut app = common::test_app();

    let (_, alice) = common::register(&mut app, "Alice", "alice@example.com").await;
    let (bob_id, bob) = common::register(&mut app, "Bob", "bob@example.com").await;

    let board_id = common::create_board(&mut app, &alice, "Launch").await;

    // Invite Bob and pull the membership id from the returned roster
    let (status, body) = common::request(
        &mut app,
        Method::POST,
        &format!("/v1/boards/{}/members", board_id),
        Some(&alice),
        Some(json!({ "email": "bob@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let member_id = body["members"]
        .as_array()
        .expect("Missing members")
        .iter()
        .find(|m| m["user"]["id"] == bob_id.as_str())
        .expect("Bob missing from roster")["id"]
        .as_str()
        .expect("Missing member id")
        .to_string();

    // As a viewer Bob can read the board's tasks
    let (status, body) = common::request(
        &mut app,
        Method::GET,
        &format!("/v1/boards/{}/tasks", board_id),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tasks"].as_array().expect("Missing tasks").len(), 0);

    // But not rename the board
    let (status, body) = common::request(
        &mut app,
        Method::PATCH,
        &format!("/v1/boards/{}", board_id),
        Some(&bob),
        Some(json!({ "name": "Bob's board" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    // Promote Bob to editor
    let (status, body) = common::request(
        &mut app,
        Method::PATCH,
        &format!("/v1/boards/{}/members/{}", board_id, member_id),
        Some(&alice),
        Some(json!({ "role": "EDITOR" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let promoted = body["members"]
        .as_array()
        .expect("Missing members")
        .iter()
        .find(|m| m["user"]["id"] == bob_id.as_str())
        .expect("Bob missing from roster");
    assert_eq!(promoted["role"], "EDITOR");

    // Bob now creates a task and moves it across lanes
    let (status, body) = common::request(
        &mut app,
        Method::POST,
        &format!("/v1/boards/{}/tasks", board_id),
        Some(&bob),
        Some(json!({ "title": "Wire up the demo" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let task_id = body["task"]["id"]
        .as_str()
        .expect("Missing task id")
        .to_string();

    let (status, body) = common::request(
        &mut app,
        Method::PATCH,
        &format!("/v1/tasks/{}", task_id),
        Some(&bob),
        Some(json!({ "status": "DOING" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task"]["status"], "DOING");

    // The whole story reads back newest first
    let (status, body) = common::request(
        &mut app,
        Method::GET,
        &format!("/v1/boards/{}/activity", board_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let activities = body["activities"].as_array().expect("Missing activities");
    let kinds: Vec<&str> = activities
        .iter()
        .map(|a| a["type"].as_str().expect("Missing type"))
        .collect();
    assert_eq!(
        kinds,
        vec!["TASK_MOVED", "TASK_CREATED", "MEMBER_ADDED", "BOARD_CREATED"]
    );
    assert_eq!(activities[0]["actor_id"], bob_id.as_str());
    assert_eq!(activities[0]["meta"]["from_status"], "TODO");
    assert_eq!(activities[0]["meta"]["to_status"], "DOING");
}
