/// Integration tests for the EventHub API
///
/// These drive the real router over in-memory storage:
/// - Registration and login
/// - Authentication (401) versus role and ownership (403)
/// - Event lifecycle with banner uploads
/// - Subscription uniqueness, including concurrent requests
/// - Two-way subscription removal

mod common;

use axum::http::{Method, StatusCode};
use common::{
    empty_request, json_request, multipart_request, MultipartBody, TestContext, TEST_PASSWORD,
};
use eventhub_shared::{auth::jwt::Claims, models::user::Role};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_health() {
    let ctx = TestContext::new();

    let (status, body) = ctx.send(empty_request(Method::GET, "/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_register_hides_password_hash() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .send(json_request(
            Method::POST,
            "/v1/auth/register",
            None,
            json!({
                "name": "Ana",
                "email": "Ana@Example.com",
                "password": "s3cret-password",
                "role": "ORGANIZER"
            }),
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["email"], "ana@example.com");
    assert_eq!(body["role"], "ORGANIZER");
    assert!(body.get("password_hash").is_none());
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let ctx = TestContext::new();
    ctx.user("taken@example.com", Role::Participant).await;

    let (status, body) = ctx
        .send(json_request(
            Method::POST,
            "/v1/auth/register",
            None,
            json!({
                "name": "Other",
                "email": "taken@example.com",
                "password": "s3cret-password",
                "role": "PARTICIPANT"
            }),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_register_validation_lists_fields() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .send(json_request(
            Method::POST,
            "/v1/auth/register",
            None,
            json!({
                "name": "",
                "email": "not-an-email",
                "password": "short",
                "role": "PARTICIPANT"
            }),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "name", "password"]);
}

#[tokio::test]
async fn test_register_unknown_role_rejected() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .send(json_request(
            Method::POST,
            "/v1/auth/register",
            None,
            json!({
                "name": "Eve",
                "email": "eve@example.com",
                "password": "s3cret-password",
                "role": "ADMIN"
            }),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "role");
}

#[tokio::test]
async fn test_register_missing_field_names_it() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .send(json_request(
            Method::POST,
            "/v1/auth/register",
            None,
            json!({
                "name": "Eve",
                "password": "s3cret-password",
                "role": "PARTICIPANT"
            }),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "email");
}

#[tokio::test]
async fn test_register_malformed_json_is_structured() {
    let ctx = TestContext::new();

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/v1/auth/register")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let (status, body) = ctx.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "body");
}

#[tokio::test]
async fn test_login_issues_usable_token() {
    let ctx = TestContext::new();
    let (user, _) = ctx.user("org@example.com", Role::Organizer).await;

    let (status, body) = ctx
        .send(json_request(
            Method::POST,
            "/v1/auth/login",
            None,
            json!({ "email": "org@example.com", "password": TEST_PASSWORD }),
        ))
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["user_id"], user.id.to_string());
    assert_eq!(body["role"], "ORGANIZER");
    assert_eq!(body["expires_in"], 8 * 3600);

    let token = body["token"].as_str().unwrap();
    let (status, _) = ctx
        .send(empty_request(Method::GET, "/v1/events/myevents", Some(token)))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_failures_look_identical() {
    let ctx = TestContext::new();
    ctx.user("par@example.com", Role::Participant).await;

    let (wrong_status, wrong_body) = ctx
        .send(json_request(
            Method::POST,
            "/v1/auth/login",
            None,
            json!({ "email": "par@example.com", "password": "not-the-password" }),
        ))
        .await;
    let (unknown_status, unknown_body) = ctx
        .send(json_request(
            Method::POST,
            "/v1/auth/login",
            None,
            json!({ "email": "nobody@example.com", "password": "whatever-password" }),
        ))
        .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
}

#[tokio::test]
async fn test_create_event_without_token_persists_nothing() {
    let ctx = TestContext::new();

    let form = MultipartBody::new()
        .text("title", "Gig")
        .text("description", "Live music")
        .text("location", "Hall")
        .file("banner", "image/png", b"png");
    let (status, body) = ctx
        .send(multipart_request(Method::POST, "/v1/events", None, form))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
    assert_eq!(ctx.store.event_count().await, 0);
    assert_eq!(ctx.uploader.calls(), 0);
}

#[tokio::test]
async fn test_bad_tokens_are_unauthorized() {
    let ctx = TestContext::new();
    let (user, token) = ctx.user("org@example.com", Role::Organizer).await;

    let mut tampered: Vec<char> = token.chars().collect();
    let pos = tampered.len() - 10;
    tampered[pos] = if tampered[pos] == 'x' { 'y' } else { 'x' };
    let tampered: String = tampered.into_iter().collect();

    let expired = {
        let issued = chrono::Utc::now() - chrono::Duration::hours(9);
        ctx.state
            .tokens
            .sign(&Claims::issued_at(user.id, Role::Organizer, issued))
            .unwrap()
    };

    for header_token in [tampered.as_str(), expired.as_str(), "garbage"] {
        let (status, _) = ctx
            .send(empty_request(Method::GET, "/v1/events/myevents", Some(header_token)))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let request = axum::http::Request::builder()
        .uri("/v1/events/myevents")
        .header("authorization", format!("Token {}", token))
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, _) = ctx.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_participant_cannot_create_event() {
    let ctx = TestContext::new();
    let (_, token) = ctx.user("par@example.com", Role::Participant).await;

    let form = MultipartBody::new()
        .text("title", "Gig")
        .text("description", "Live music")
        .text("location", "Hall")
        .file("banner", "image/png", b"png");
    let (status, body) = ctx
        .send(multipart_request(Method::POST, "/v1/events", Some(&token), form))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
    assert_eq!(ctx.store.event_count().await, 0);
}

#[tokio::test]
async fn test_event_create_list_and_detail() {
    let ctx = TestContext::new();
    let (organizer, token) = ctx.user("org@example.com", Role::Organizer).await;

    let event = ctx.create_event(&token, "Rust meetup").await;
    assert_eq!(event["organizer_id"], organizer.id.to_string());
    assert_eq!(event["price"], 10.0);
    assert_eq!(event["banner_url"], "https://img.test/banners/1.png");

    let (status, list) = ctx.send(empty_request(Method::GET, "/v1/events", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["title"], "Rust meetup");
    assert_eq!(list[0]["organizer"]["email"], "org@example.com");
    assert_eq!(list[0]["subscription_count"], 0);

    let id = event["id"].as_str().unwrap();
    let (status, detail) = ctx
        .send(empty_request(Method::GET, &format!("/v1/events/{}", id), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["id"], id);

    let (status, body) = ctx
        .send(empty_request(
            Method::GET,
            &format!("/v1/events/{}", Uuid::new_v4()),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_my_events_only_lists_own() {
    let ctx = TestContext::new();
    let (_, token) = ctx.user("org@example.com", Role::Organizer).await;
    let (_, other_token) = ctx.user("org2@example.com", Role::Organizer).await;

    ctx.create_event(&token, "Mine").await;
    ctx.create_event(&other_token, "Theirs").await;

    let (status, mine) = ctx
        .send(empty_request(Method::GET, "/v1/events/myevents", Some(&token)))
        .await;

    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = mine
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Mine"]);
}

#[tokio::test]
async fn test_create_event_requires_banner() {
    let ctx = TestContext::new();
    let (_, token) = ctx.user("org@example.com", Role::Organizer).await;

    let form = MultipartBody::new()
        .text("title", "Gig")
        .text("description", "Live music")
        .text("location", "Hall");
    let (status, body) = ctx
        .send(multipart_request(Method::POST, "/v1/events", Some(&token), form))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "banner");
    assert_eq!(ctx.uploader.calls(), 0);
}

#[tokio::test]
async fn test_create_event_rejects_non_image_banner() {
    let ctx = TestContext::new();
    let (_, token) = ctx.user("org@example.com", Role::Organizer).await;

    let form = MultipartBody::new()
        .text("title", "Gig")
        .text("description", "Live music")
        .text("location", "Hall")
        .file("banner", "application/pdf", b"%PDF");
    let (status, body) = ctx
        .send(multipart_request(Method::POST, "/v1/events", Some(&token), form))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "banner");
    assert_eq!(ctx.store.event_count().await, 0);
}

#[tokio::test]
async fn test_upload_failure_is_bad_gateway() {
    let ctx = TestContext::new();
    let (_, token) = ctx.user("org@example.com", Role::Organizer).await;
    ctx.uploader.fail();

    let form = MultipartBody::new()
        .text("title", "Gig")
        .text("description", "Live music")
        .text("location", "Hall")
        .file("banner", "image/png", b"png");
    let (status, body) = ctx
        .send(multipart_request(Method::POST, "/v1/events", Some(&token), form))
        .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "upload_error");
    assert_eq!(ctx.store.event_count().await, 0);
}

#[tokio::test]
async fn test_non_owner_cannot_modify_event() {
    let ctx = TestContext::new();
    let (_, owner_token) = ctx.user("org@example.com", Role::Organizer).await;
    let (_, other_token) = ctx.user("org2@example.com", Role::Organizer).await;

    let event = ctx.create_event(&owner_token, "Original").await;
    let uri = format!("/v1/events/{}", event["id"].as_str().unwrap());

    let form = MultipartBody::new().text("title", "Hijacked");
    let (status, body) = ctx
        .send(multipart_request(Method::PUT, &uri, Some(&other_token), form))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = ctx
        .send(empty_request(Method::DELETE, &uri, Some(&other_token)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, detail) = ctx.send(empty_request(Method::GET, &uri, None)).await;
    assert_eq!(detail["title"], "Original");
    assert_eq!(ctx.store.event_count().await, 1);
}

#[tokio::test]
async fn test_non_owner_json_update_is_forbidden() {
    let ctx = TestContext::new();
    let (_, owner_token) = ctx.user("org@example.com", Role::Organizer).await;
    let (_, other_token) = ctx.user("org2@example.com", Role::Organizer).await;

    let event = ctx.create_event(&owner_token, "Original").await;
    let uri = format!("/v1/events/{}", event["id"].as_str().unwrap());

    let (status, body) = ctx
        .send(json_request(
            Method::PUT,
            &uri,
            Some(&other_token),
            json!({ "title": "Hijacked" }),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    // The owner sending the wrong encoding gets a validation error instead
    let (status, body) = ctx
        .send(json_request(
            Method::PUT,
            &uri,
            Some(&owner_token),
            json!({ "title": "Renamed" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "body");

    let (_, detail) = ctx.send(empty_request(Method::GET, &uri, None)).await;
    assert_eq!(detail["title"], "Original");
}

#[tokio::test]
async fn test_create_event_requires_multipart_body() {
    let ctx = TestContext::new();
    let (_, token) = ctx.user("org@example.com", Role::Organizer).await;

    let (status, body) = ctx
        .send(json_request(
            Method::POST,
            "/v1/events",
            Some(&token),
            json!({ "title": "Gig" }),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(ctx.store.event_count().await, 0);
    assert_eq!(ctx.uploader.calls(), 0);
}

#[tokio::test]
async fn test_malformed_ids_are_structured_errors() {
    let ctx = TestContext::new();
    let (_, organizer_token) = ctx.user("org@example.com", Role::Organizer).await;
    let (_, token) = ctx.user("par@example.com", Role::Participant).await;

    let requests = [
        empty_request(Method::GET, "/v1/events/not-a-uuid", None),
        empty_request(Method::DELETE, "/v1/events/not-a-uuid", Some(&organizer_token)),
        empty_request(
            Method::GET,
            "/v1/events/not-a-uuid/subscriptions",
            Some(&organizer_token),
        ),
        empty_request(Method::POST, "/v1/events/not-a-uuid/subscribe", Some(&token)),
        empty_request(Method::DELETE, "/v1/subscriptions/not-a-uuid", Some(&token)),
    ];

    for request in requests {
        let uri = request.uri().to_string();
        let (status, body) = ctx.send(request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["error"], "validation_error", "{}", uri);
        assert_eq!(body["details"][0]["field"], "id", "{}", uri);
    }
}

#[tokio::test]
async fn test_owner_partial_update() {
    let ctx = TestContext::new();
    let (_, token) = ctx.user("org@example.com", Role::Organizer).await;

    let event = ctx.create_event(&token, "Original").await;
    let uri = format!("/v1/events/{}", event["id"].as_str().unwrap());

    let form = MultipartBody::new()
        .text("location", "Rooftop")
        .text("price", "0")
        .file("banner", "image/jpeg", b"jpeg");
    let (status, updated) = ctx
        .send(multipart_request(Method::PUT, &uri, Some(&token), form))
        .await;

    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(updated["title"], "Original");
    assert_eq!(updated["location"], "Rooftop");
    assert_eq!(updated["price"], 0.0);
    assert_eq!(updated["banner_url"], "https://img.test/banners/2.png");

    let form = MultipartBody::new().text("price", "-5");
    let (status, body) = ctx
        .send(multipart_request(Method::PUT, &uri, Some(&token), form))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "price");
}

#[tokio::test]
async fn test_update_missing_event_is_not_found() {
    let ctx = TestContext::new();
    let (_, token) = ctx.user("org@example.com", Role::Organizer).await;

    let uri = format!("/v1/events/{}", Uuid::new_v4());
    let form = MultipartBody::new().text("title", "Anything");
    let (status, _) = ctx
        .send(multipart_request(Method::PUT, &uri, Some(&token), form))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_subscribe_twice_conflicts() {
    let ctx = TestContext::new();
    let (_, organizer_token) = ctx.user("org@example.com", Role::Organizer).await;
    let (participant, token) = ctx.user("par@example.com", Role::Participant).await;

    let event = ctx.create_event(&organizer_token, "Gig").await;
    let uri = format!("/v1/events/{}/subscribe", event["id"].as_str().unwrap());

    let (status, subscription) = ctx.send(empty_request(Method::POST, &uri, Some(&token))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(subscription["user_id"], participant.id.to_string());
    assert_eq!(subscription["event_id"], event["id"]);

    let (status, body) = ctx.send(empty_request(Method::POST, &uri, Some(&token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "conflict");
    assert_eq!(ctx.store.subscription_count().await, 1);
}

#[tokio::test]
async fn test_concurrent_subscribe_requests_persist_one() {
    let ctx = TestContext::new();
    let (_, organizer_token) = ctx.user("org@example.com", Role::Organizer).await;
    let (_, token) = ctx.user("par@example.com", Role::Participant).await;

    let event = ctx.create_event(&organizer_token, "Gig").await;
    let uri = format!("/v1/events/{}/subscribe", event["id"].as_str().unwrap());

    let attempts = (0..12).map(|_| ctx.send(empty_request(Method::POST, &uri, Some(&token))));
    let results = futures::future::join_all(attempts).await;

    let created = results
        .iter()
        .filter(|(status, _)| *status == StatusCode::CREATED)
        .count();
    assert_eq!(created, 1);
    assert!(results
        .iter()
        .all(|(status, _)| *status == StatusCode::CREATED || *status == StatusCode::BAD_REQUEST));
    assert_eq!(ctx.store.subscription_count().await, 1);
}

#[tokio::test]
async fn test_subscribe_requires_participant_role() {
    let ctx = TestContext::new();
    let (_, organizer_token) = ctx.user("org@example.com", Role::Organizer).await;

    let event = ctx.create_event(&organizer_token, "Gig").await;
    let uri = format!("/v1/events/{}/subscribe", event["id"].as_str().unwrap());

    let (status, _) = ctx
        .send(empty_request(Method::POST, &uri, Some(&organizer_token)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.send(empty_request(Method::POST, &uri, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_subscribe_to_missing_event() {
    let ctx = TestContext::new();
    let (_, token) = ctx.user("par@example.com", Role::Participant).await;

    let uri = format!("/v1/events/{}/subscribe", Uuid::new_v4());
    let (status, _) = ctx.send(empty_request(Method::POST, &uri, Some(&token))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_organizer_removes_subscription_then_subscriber_gets_not_found() {
    let ctx = TestContext::new();
    let (_, organizer_token) = ctx.user("org@example.com", Role::Organizer).await;
    let (_, token) = ctx.user("par@example.com", Role::Participant).await;

    let event = ctx.create_event(&organizer_token, "Gig").await;
    let (_, subscription) = ctx
        .send(empty_request(
            Method::POST,
            &format!("/v1/events/{}/subscribe", event["id"].as_str().unwrap()),
            Some(&token),
        ))
        .await;
    let uri = format!("/v1/subscriptions/{}", subscription["id"].as_str().unwrap());

    let (status, body) = ctx
        .send(empty_request(Method::DELETE, &uri, Some(&organizer_token)))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = ctx.send(empty_request(Method::DELETE, &uri, Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_subscription_removal_permissions() {
    let ctx = TestContext::new();
    let (_, organizer_token) = ctx.user("org@example.com", Role::Organizer).await;
    let (_, other_organizer_token) = ctx.user("org2@example.com", Role::Organizer).await;
    let (_, token) = ctx.user("par@example.com", Role::Participant).await;
    let (_, stranger_token) = ctx.user("par2@example.com", Role::Participant).await;

    let event = ctx.create_event(&organizer_token, "Gig").await;
    let (_, subscription) = ctx
        .send(empty_request(
            Method::POST,
            &format!("/v1/events/{}/subscribe", event["id"].as_str().unwrap()),
            Some(&token),
        ))
        .await;
    let uri = format!("/v1/subscriptions/{}", subscription["id"].as_str().unwrap());

    for outsider in [&stranger_token, &other_organizer_token] {
        let (status, _) = ctx.send(empty_request(Method::DELETE, &uri, Some(outsider))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
    assert_eq!(ctx.store.subscription_count().await, 1);

    let (status, _) = ctx.send(empty_request(Method::DELETE, &uri, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx.send(empty_request(Method::DELETE, &uri, Some(&token))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(ctx.store.subscription_count().await, 0);
}

#[tokio::test]
async fn test_subscriber_roster_owner_only() {
    let ctx = TestContext::new();
    let (_, organizer_token) = ctx.user("org@example.com", Role::Organizer).await;
    let (_, other_organizer_token) = ctx.user("org2@example.com", Role::Organizer).await;
    let (participant, token) = ctx.user("par@example.com", Role::Participant).await;

    let event = ctx.create_event(&organizer_token, "Gig").await;
    let id = event["id"].as_str().unwrap();
    ctx.send(empty_request(
        Method::POST,
        &format!("/v1/events/{}/subscribe", id),
        Some(&token),
    ))
    .await;

    let uri = format!("/v1/events/{}/subscriptions", id);
    let (status, roster) = ctx
        .send(empty_request(Method::GET, &uri, Some(&organizer_token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(roster.as_array().unwrap().len(), 1);
    assert_eq!(roster[0]["user_id"], participant.id.to_string());
    assert_eq!(roster[0]["user_email"], "par@example.com");

    let (status, _) = ctx
        .send(empty_request(Method::GET, &uri, Some(&other_organizer_token)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.send(empty_request(Method::GET, &uri, Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_delete_event_removes_subscriptions() {
    let ctx = TestContext::new();
    let (_, organizer_token) = ctx.user("org@example.com", Role::Organizer).await;
    let (_, token) = ctx.user("par@example.com", Role::Participant).await;

    let event = ctx.create_event(&organizer_token, "Gig").await;
    let id = event["id"].as_str().unwrap();
    ctx.send(empty_request(
        Method::POST,
        &format!("/v1/events/{}/subscribe", id),
        Some(&token),
    ))
    .await;
    assert_eq!(ctx.store.subscription_count().await, 1);

    let uri = format!("/v1/events/{}", id);
    let (status, _) = ctx
        .send(empty_request(Method::DELETE, &uri, Some(&organizer_token)))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(ctx.store.subscription_count().await, 0);

    let (status, _) = ctx.send(empty_request(Method::GET, &uri, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .send(empty_request(Method::DELETE, &uri, Some(&organizer_token)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_security_headers_on_api_responses() {
    let ctx = TestContext::new();

    let response = tower::ServiceExt::oneshot(
        ctx.app.clone(),
        empty_request(Method::GET, "/v1/events", None),
    )
    .await
    .unwrap();

    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert_eq!(response.headers()["x-frame-options"], "DENY");
}
