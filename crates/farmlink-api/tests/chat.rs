mod common;

use axum::http::StatusCode;
use chrono::Duration;
use serde_json::{Value, json};
use uuid::Uuid;

use common::{TestApp, crop_offer, service_offer};
use farmlink_db::OfferRow;
use farmlink_types::models::{Message, OfferStatus, OfferType, timestamp_now};

fn ids(contacts: &[Value]) -> Vec<String> {
    contacts
        .iter()
        .map(|c| c["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn crop_offer_makes_both_sides_contacts() {
    let app = TestApp::spawn().await;
    let farmer = app.sync("Farah", "farmer").await;
    let buyer = app.sync("Bina", "buyer").await;

    app.offer(&buyer, crop_offer(&farmer, &buyer)).await;

    let farmer_contacts = app.contacts(&farmer).await;
    assert_eq!(ids(&farmer_contacts), vec![buyer.id.to_string()]);
    assert_eq!(farmer_contacts[0]["name"], "Bina");
    assert_eq!(farmer_contacts[0]["role"], "buyer");
    assert_eq!(farmer_contacts[0]["lastMessage"], Value::Null);
    assert_eq!(farmer_contacts[0]["lastMessageTime"], Value::Null);
    assert_eq!(farmer_contacts[0]["unreadCount"], 0);

    let buyer_contacts = app.contacts(&buyer).await;
    assert_eq!(ids(&buyer_contacts), vec![farmer.id.to_string()]);
}

#[tokio::test]
async fn service_offer_lists_provider_without_empty_entries() {
    let app = TestApp::spawn().await;
    let farmer = app.sync("Farah", "farmer").await;
    let provider = app.sync("Pavel", "service").await;

    app.offer(&provider, service_offer(&farmer, &provider)).await;

    let contacts = app.contacts(&farmer).await;
    assert_eq!(ids(&contacts), vec![provider.id.to_string()]);
    assert!(contacts.iter().all(|c| !c["id"].is_null()));

    let contacts = app.contacts(&provider).await;
    assert_eq!(ids(&contacts), vec![farmer.id.to_string()]);
}

#[tokio::test]
async fn repeated_offers_yield_one_contact() {
    let app = TestApp::spawn().await;
    let farmer = app.sync("Farah", "farmer").await;
    let buyer = app.sync("Bina", "buyer").await;

    app.offer(&buyer, crop_offer(&farmer, &buyer)).await;
    app.offer(&buyer, crop_offer(&farmer, &buyer)).await;
    app.offer(
        &farmer,
        json!({
            "offerType": "need_fulfillment",
            "farmer": farmer.id,
            "buyer": buyer.id,
            "buyerNeed": Uuid::new_v4(),
        }),
    )
    .await;

    assert_eq!(app.contacts(&farmer).await.len(), 1);
    assert_eq!(app.contacts(&buyer).await.len(), 1);
}

#[tokio::test]
async fn user_without_offers_has_no_contacts() {
    let app = TestApp::spawn().await;
    let loner = app.sync("Lone", "farmer").await;
    assert!(app.contacts(&loner).await.is_empty());
}

#[tokio::test]
async fn messages_alone_do_not_create_contacts() {
    let app = TestApp::spawn().await;
    let a = app.sync("Ada", "farmer").await;
    let b = app.sync("Ben", "buyer").await;

    app.send(&a, &b, "hello").await;
    assert!(app.contacts(&b).await.is_empty());
}

#[tokio::test]
async fn viewing_conversation_clears_unread() {
    let app = TestApp::spawn().await;
    let farmer = app.sync("Farah", "farmer").await;
    let buyer = app.sync("Bina", "buyer").await;
    app.offer(&buyer, crop_offer(&farmer, &buyer)).await;

    for text in ["hi", "are you there?", "price ok?"] {
        app.send(&buyer, &farmer, text).await;
    }

    let contacts = app.contacts(&farmer).await;
    assert_eq!(contacts[0]["unreadCount"], 3);
    assert_eq!(contacts[0]["lastMessage"], "price ok?");

    // The sender's own messages never count as unread for them.
    assert_eq!(app.contacts(&buyer).await[0]["unreadCount"], 0);

    let (status, thread) = app
        .get(&format!("/api/chat/messages/{}", buyer.id), Some(&farmer))
        .await;
    assert_eq!(status, StatusCode::OK);
    let thread = thread.as_array().unwrap();
    assert_eq!(thread.len(), 3);
    assert!(thread.iter().all(|m| m["read"] == true));

    assert_eq!(app.contacts(&farmer).await[0]["unreadCount"], 0);

    // Second view marks nothing new and returns the same thread.
    let (status, again) = app
        .get(&format!("/api/chat/messages/{}", buyer.id), Some(&farmer))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn sender_viewing_thread_leaves_receiver_unread() {
    let app = TestApp::spawn().await;
    let farmer = app.sync("Farah", "farmer").await;
    let buyer = app.sync("Bina", "buyer").await;
    app.offer(&buyer, crop_offer(&farmer, &buyer)).await;

    app.send(&buyer, &farmer, "one").await;
    app.send(&buyer, &farmer, "two").await;

    let (status, thread) = app
        .get(&format!("/api/chat/messages/{}", farmer.id), Some(&buyer))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(thread.as_array().unwrap().iter().all(|m| m["read"] == false));

    assert_eq!(app.contacts(&farmer).await[0]["unreadCount"], 2);
}

#[tokio::test]
async fn conversation_is_ordered_by_creation_time() {
    let app = TestApp::spawn().await;
    let farmer = app.sync("Farah", "farmer").await;
    let buyer = app.sync("Bina", "buyer").await;
    app.offer(&buyer, crop_offer(&farmer, &buyer)).await;

    // Written newest first, as a skewed client clock might.
    let now = timestamp_now();
    let mut late = Message::new(farmer.id, buyer.id, "second");
    late.created_at = now;
    let mut early = Message::new(buyer.id, farmer.id, "first");
    early.created_at = now - Duration::seconds(30);
    app.state.db.insert_message(&late).unwrap();
    app.state.db.insert_message(&early).unwrap();

    let (status, thread) = app
        .get(&format!("/api/chat/messages/{}", farmer.id), Some(&buyer))
        .await;
    assert_eq!(status, StatusCode::OK);
    let contents: Vec<&str> = thread
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["first", "second"]);

    let contacts = app.contacts(&buyer).await;
    assert_eq!(contacts[0]["lastMessage"], "second");
}

#[tokio::test]
async fn contacts_are_ordered_by_latest_interaction() {
    let app = TestApp::spawn().await;
    let farmer = app.sync("Farah", "farmer").await;
    let first = app.sync("Bina", "buyer").await;
    let second = app.sync("Pavel", "service").await;

    app.offer(&first, crop_offer(&farmer, &first)).await;
    app.offer(&second, service_offer(&farmer, &second)).await;

    // Newest offer wins until a message arrives on the older link.
    assert_eq!(
        ids(&app.contacts(&farmer).await),
        vec![second.id.to_string(), first.id.to_string()]
    );

    app.send(&first, &farmer, "still interested").await;
    assert_eq!(
        ids(&app.contacts(&farmer).await),
        vec![first.id.to_string(), second.id.to_string()]
    );
}

#[tokio::test]
async fn malformed_stored_offer_is_skipped() {
    let app = TestApp::spawn().await;
    let farmer = app.sync("Farah", "farmer").await;

    app.state
        .db
        .insert_offer_row(&OfferRow {
            id: Uuid::new_v4(),
            offer_type: OfferType::Crop,
            farmer_id: farmer.id,
            buyer_id: None,
            provider_id: None,
            crop_id: None,
            service_request_id: None,
            buyer_need_id: None,
            price_per_unit: None,
            quantity_requested: None,
            bid_amount: None,
            message: None,
            status: OfferStatus::Pending,
            created_at: timestamp_now(),
        })
        .unwrap();

    assert!(app.contacts(&farmer).await.is_empty());
    let (status, offers) = app.get("/api/offers", Some(&farmer)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(offers.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn identity_header_is_required() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/api/chat/contacts", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unauthorized");

    let ghost = common::TestUser {
        id: Uuid::new_v4(),
        clerk_id: "clerk_ghost".into(),
    };
    let (status, body) = app.get("/api/chat/contacts", Some(&ghost)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn send_rejects_bad_input() {
    let app = TestApp::spawn().await;
    let a = app.sync("Ada", "farmer").await;
    let b = app.sync("Ben", "buyer").await;

    let cases = [
        (json!({ "receiverId": b.id, "content": "" }), StatusCode::BAD_REQUEST),
        (json!({ "receiverId": b.id, "content": "   \n" }), StatusCode::BAD_REQUEST),
        (json!({ "receiverId": b.id }), StatusCode::BAD_REQUEST),
        (json!({ "receiverId": a.id, "content": "note to self" }), StatusCode::BAD_REQUEST),
        (json!({ "receiverId": Uuid::new_v4(), "content": "hi" }), StatusCode::NOT_FOUND),
    ];
    for (body, expected) in cases {
        let (status, _) = app.post("/api/chat/messages", Some(&a), body.clone()).await;
        assert_eq!(status, expected, "body {}", body);
    }

    let (status, thread) = app
        .get(&format!("/api/chat/messages/{}", b.id), Some(&a))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(thread.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn sent_message_starts_unread() {
    let app = TestApp::spawn().await;
    let a = app.sync("Ada", "farmer").await;
    let b = app.sync("Ben", "buyer").await;

    let message = app.send(&a, &b, "  fresh eggs today  ").await;
    assert_eq!(message["senderId"], a.id.to_string());
    assert_eq!(message["receiverId"], b.id.to_string());
    assert_eq!(message["read"], false);
    assert!(message["createdAt"].is_string());
}

#[tokio::test]
async fn conversation_with_unknown_contact_is_not_found() {
    let app = TestApp::spawn().await;
    let a = app.sync("Ada", "farmer").await;

    let (status, body) = app
        .get(&format!("/api/chat/messages/{}", Uuid::new_v4()), Some(&a))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Contact not found");
}

#[tokio::test]
async fn malformed_contact_id_is_a_json_bad_request() {
    let app = TestApp::spawn().await;
    let a = app.sync("Ada", "farmer").await;

    let (status, body) = app.get("/api/chat/messages/not-a-uuid", Some(&a)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string(), "unexpected body {}", body);
}

#[tokio::test]
async fn send_without_receiver_is_a_json_bad_request() {
    let app = TestApp::spawn().await;
    let a = app.sync("Ada", "farmer").await;

    let (status, body) = app
        .post("/api/chat/messages", Some(&a), json!({ "content": "hi" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string(), "unexpected body {}", body);

    let (status, body) = app.post_raw("/api/chat/messages", Some(&a), "{\"receiverId\":").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string(), "unexpected body {}", body);
}
