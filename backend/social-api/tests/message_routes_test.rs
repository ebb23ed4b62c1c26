mod common;

use actix_web::{http::StatusCode, test};
use common::{bearer, build_app, seed_user};
use serde_json::{json, Value};
use social_api::{
    config::{DeletePolicy, ServiceSettings},
    models::Role,
    store::{ChatDirectory, MemoryStore},
};

/// POST a message into a private chat and return its id
macro_rules! send_message {
    ($app:expr, $author:expr, $text:expr, $chat:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/v1/messages")
            .insert_header(bearer(&$author))
            .set_json(json!({
                "user_id": $author.id,
                "text": $text,
                "private_chat_id": $chat
            }))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        body["id"].as_i64().expect("message id")
    }};
}

macro_rules! list_private {
    ($app:expr, $caller:expr, $chat:expr) => {{
        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/messages/private?chat_id={}", $chat))
            .insert_header(bearer(&$caller))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Vec<Value> = test::read_body_json(resp).await;
        body
    }};
}

#[actix_web::test]
async fn test_messages_listed_in_creation_order_with_authors() {
    let store = MemoryStore::new();
    let mut alice = seed_user(&store, "alice", Role::Member).await;
    alice.image_url = Some("alice.png".into());
    store.put_user(alice.clone()).await;
    let bob = seed_user(&store, "bob", Role::Member).await;
    let chat = store.create_private(alice.id, bob.id).await.unwrap();
    let app = test::init_service(build_app(store, ServiceSettings::default())).await;

    let first = send_message!(app, alice, "t1", chat);
    let second = send_message!(app, bob, "t2", chat);
    let third = send_message!(app, alice, "t3", chat);

    let messages = list_private!(app, bob, chat);
    let ids: Vec<i64> = messages.iter().map(|m| m["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![first, second, third]);

    assert_eq!(messages[0]["private_chat_id"], json!(chat));
    assert_eq!(messages[0]["group_chat_id"], Value::Null);
    assert_eq!(messages[0]["is_read"], json!(false));
    assert_eq!(messages[0]["user"]["user_name"], "alice");
    assert_eq!(messages[0]["user"]["image_url"], "Resources/Images/alice.png");
    assert_eq!(messages[1]["user"]["full_name"], "bob tester");
}

#[actix_web::test]
async fn test_create_message_validation() {
    let store = MemoryStore::new();
    let alice = seed_user(&store, "alice", Role::Member).await;
    let bob = seed_user(&store, "bob", Role::Member).await;
    let chat = store.create_private(alice.id, bob.id).await.unwrap();
    let app = test::init_service(build_app(store, ServiceSettings::default())).await;

    let cases = [
        (json!({ "user_id": alice.id, "text": "", "private_chat_id": chat }), StatusCode::BAD_REQUEST),
        (json!({ "user_id": alice.id, "text": "hi" }), StatusCode::BAD_REQUEST),
        (
            json!({ "user_id": alice.id, "text": "hi", "private_chat_id": chat, "group_chat_id": 1 }),
            StatusCode::BAD_REQUEST,
        ),
        (json!({ "user_id": bob.id, "text": "hi", "private_chat_id": chat }), StatusCode::FORBIDDEN),
        (json!({ "user_id": alice.id, "text": "hi", "group_chat_id": 999 }), StatusCode::NOT_FOUND),
    ];

    for (body, expected) in cases {
        let req = test::TestRequest::post()
            .uri("/api/v1/messages")
            .insert_header(bearer(&alice))
            .set_json(&body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected, "body: {body}");
    }

    assert!(list_private!(app, alice, chat).is_empty());
}

#[actix_web::test]
async fn test_mark_read_unknown_id_changes_nothing() {
    let store = MemoryStore::new();
    let alice = seed_user(&store, "alice", Role::Member).await;
    let bob = seed_user(&store, "bob", Role::Member).await;
    let chat = store.create_private(alice.id, bob.id).await.unwrap();
    let app = test::init_service(build_app(store, ServiceSettings::default())).await;

    let seeded = send_message!(app, alice, "still unread", chat);

    let req = test::TestRequest::post()
        .uri("/api/v1/messages/read")
        .insert_header(bearer(&bob))
        .insert_header(("x-correlation-id", "mark-404"))
        .set_json(json!({ "message_id": seeded + 1000 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 404);
    assert_eq!(body["code"], "MESSAGE_NOT_FOUND");
    assert_eq!(body["error_type"], "not_found_error");
    assert_eq!(body["trace_id"], "mark-404");

    let messages = list_private!(app, bob, chat);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["id"], json!(seeded));
    assert_eq!(messages[0]["is_read"], json!(false));
}

#[actix_web::test]
async fn test_mark_read_is_idempotent() {
    let store = MemoryStore::new();
    let alice = seed_user(&store, "alice", Role::Member).await;
    let bob = seed_user(&store, "bob", Role::Member).await;
    let chat = store.create_private(alice.id, bob.id).await.unwrap();
    let app = test::init_service(build_app(store, ServiceSettings::default())).await;

    let id = send_message!(app, alice, "ping", chat);

    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/api/v1/messages/read")
            .insert_header(bearer(&bob))
            .set_json(json!({ "message_id": id }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    let messages = list_private!(app, bob, chat);
    assert_eq!(messages[0]["is_read"], json!(true));
}

#[actix_web::test]
async fn test_mark_chat_read_only_marks_other_authors() {
    let store = MemoryStore::new();
    let u1 = seed_user(&store, "user_one", Role::Member).await;
    let u2 = seed_user(&store, "user_two", Role::Member).await;
    let chat = store.create_private(u1.id, u2.id).await.unwrap();
    let app = test::init_service(build_app(store, ServiceSettings::default())).await;

    let from_u2_a = send_message!(app, u2, "a", chat);
    let from_u2_b = send_message!(app, u2, "b", chat);
    let from_u1 = send_message!(app, u1, "c", chat);

    let req = test::TestRequest::post()
        .uri("/api/v1/messages/read-all")
        .insert_header(bearer(&u1))
        .set_json(json!({ "user_id": u1.id, "private_chat_id": chat }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["updated"], 2);

    let messages = list_private!(app, u1, chat);
    let read_state = |id: i64| {
        messages
            .iter()
            .find(|m| m["id"].as_i64() == Some(id))
            .map(|m| m["is_read"].as_bool().unwrap())
            .unwrap()
    };
    assert!(read_state(from_u2_a));
    assert!(read_state(from_u2_b));
    assert!(!read_state(from_u1));
}

#[actix_web::test]
async fn test_mark_chat_read_errors() {
    let store = MemoryStore::new();
    let alice = seed_user(&store, "alice", Role::Member).await;
    let app = test::init_service(build_app(store, ServiceSettings::default())).await;

    let cases = [
        (json!({ "user_id": alice.id }), StatusCode::BAD_REQUEST),
        (
            json!({ "user_id": alice.id, "private_chat_id": 1, "group_chat_id": 2 }),
            StatusCode::BAD_REQUEST,
        ),
        (
            json!({ "user_id": uuid::Uuid::new_v4(), "group_chat_id": 2 }),
            StatusCode::NOT_FOUND,
        ),
    ];

    for (body, expected) in cases {
        let req = test::TestRequest::post()
            .uri("/api/v1/messages/read-all")
            .insert_header(bearer(&alice))
            .set_json(&body)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), expected, "body: {body}");
    }
}

#[actix_web::test]
async fn test_delete_removes_message_from_listing() {
    let store = MemoryStore::new();
    let alice = seed_user(&store, "alice", Role::Member).await;
    let bob = seed_user(&store, "bob", Role::Member).await;
    let chat = store.create_private(alice.id, bob.id).await.unwrap();
    let app = test::init_service(build_app(store, ServiceSettings::default())).await;

    let kept = send_message!(app, alice, "keep", chat);
    let doomed = send_message!(app, alice, "drop", chat);

    // Default policy lets any caller delete
    let req = test::TestRequest::post()
        .uri("/api/v1/messages/delete")
        .insert_header(bearer(&bob))
        .set_json(json!({ "message_id": doomed }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let ids: Vec<i64> = list_private!(app, alice, chat)
        .iter()
        .map(|m| m["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![kept]);

    let req = test::TestRequest::post()
        .uri("/api/v1/messages/delete")
        .insert_header(bearer(&bob))
        .set_json(json!({ "message_id": doomed }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_author_or_admin_policy_blocks_other_members() {
    let store = MemoryStore::new();
    let alice = seed_user(&store, "alice", Role::Member).await;
    let bob = seed_user(&store, "bob", Role::Member).await;
    let chat = store.create_private(alice.id, bob.id).await.unwrap();
    let settings = ServiceSettings {
        delete_policy: DeletePolicy::AuthorOrAdmin,
        ..ServiceSettings::default()
    };
    let app = test::init_service(build_app(store, settings)).await;

    let id = send_message!(app, alice, "mine", chat);

    let req = test::TestRequest::post()
        .uri("/api/v1/messages/delete")
        .insert_header(bearer(&bob))
        .set_json(json!({ "message_id": id }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/api/v1/messages/delete")
        .insert_header(bearer(&alice))
        .set_json(json!({ "message_id": id }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_listing_without_chat_id_and_unknown_chat() {
    let store = MemoryStore::new();
    let alice = seed_user(&store, "alice", Role::Member).await;
    let group = store.create_group("empty", alice.id, &[]).await.unwrap();
    let app = test::init_service(build_app(store, ServiceSettings::default())).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/messages/group")
        .insert_header(bearer(&alice))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Vec<Value> = test::read_body_json(resp).await;
    assert!(body.is_empty());

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/messages/group?chat_id={group}"))
        .insert_header(bearer(&alice))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Vec<Value> = test::read_body_json(resp).await;
    assert!(body.is_empty());

    let req = test::TestRequest::get()
        .uri("/api/v1/messages/private?chat_id=4242")
        .insert_header(bearer(&alice))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_requests_without_token_are_rejected() {
    let store = MemoryStore::new();
    let app = test::init_service(build_app(store, ServiceSettings::default())).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/messages/private?chat_id=1")
        .to_request();
    let status = match test::try_call_service(&app, req).await {
        Ok(resp) => resp.status(),
        Err(e) => e.error_response().status(),
    };
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
