//! Address book and payment wallet against a real database.
//!
//! These tests require a running `PostgreSQL` database reachable through
//! `BOOKSTORE_TEST_DATABASE_URL`.

use axum::http::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

use bookstore_api::db::{AddressRepository, OrderRepository, PaymentRepository};
use bookstore_core::OrderStatus;
use bookstore_integration_tests::{TEST_CARD, TestContext, id_of, order_body, order_id_of};

fn address(zipcode: &str) -> Value {
    json!({
        "line1": "Avenida da Liberdade",
        "number": "200",
        "city": "Lisbon",
        "state": "Lisboa",
        "country": "Portugal",
        "zipcode": zipcode,
    })
}

// ============================================================================
// Addresses
// ============================================================================

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_first_address_becomes_default() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let zip = Uuid::new_v4().to_string();

    let (status, first) = ctx
        .send("POST", "/addresses", Some(user.id), Some(address(&zip)))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["is_default"], true);
    assert_eq!(first["zipcode"], zip.as_str());

    let (_, second) = ctx
        .send("POST", "/addresses", Some(user.id), Some(address("9999-001")))
        .await;
    assert_eq!(second["is_default"], false);
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_duplicate_address_is_refused() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let zip = Uuid::new_v4().to_string();

    ctx.send("POST", "/addresses", Some(user.id), Some(address(&zip)))
        .await;
    let (status, body) = ctx
        .send("POST", "/addresses", Some(user.id), Some(address(&zip)))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "This address is in your address list");
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_identical_address_is_shared() {
    let ctx = TestContext::new().await;
    let alice = ctx.create_user().await;
    let bob = ctx.create_user().await;
    let zip = Uuid::new_v4().to_string();

    let (_, first) = ctx
        .send("POST", "/addresses", Some(alice.id), Some(address(&zip)))
        .await;
    let (status, second) = ctx
        .send("POST", "/addresses", Some(bob.id), Some(address(&zip)))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(id_of(&first), id_of(&second));
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_set_default_moves_flag() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let first = ctx.create_address(user.id).await;
    let second = ctx.create_address(user.id).await;

    let (status, _) = ctx
        .send("PUT", &format!("/addresses/{second}/default"), Some(user.id), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, list) = ctx.send("GET", "/addresses", Some(user.id), None).await;
    let list = list.as_array().expect("array");
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["id"], second.as_i32());
    assert_eq!(list[0]["is_default"], true);
    assert_eq!(list[1]["id"], first.as_i32());
    assert_eq!(list[1]["is_default"], false);
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_set_default_on_unlinked_address_is_refused() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let other = ctx.create_user().await;
    let foreign = ctx.create_address(other.id).await;

    let (status, body) = ctx
        .send("PUT", &format!("/addresses/{foreign}/default"), Some(user.id), None)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "This address is not in your address list");
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_removing_default_promotes_another() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let first = ctx.create_address(user.id).await;
    let second = ctx.create_address(user.id).await;

    let (status, body) = ctx
        .send("DELETE", &format!("/addresses/{first}"), Some(user.id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Your address successfully deleted from address list");

    let (_, list) = ctx.send("GET", "/addresses", Some(user.id), None).await;
    assert_eq!(list.as_array().map(Vec::len), Some(1));
    assert_eq!(list[0]["id"], second.as_i32());
    assert_eq!(list[0]["is_default"], true);

    let mut conn = ctx.pool.acquire().await.expect("acquire");
    assert!(AddressRepository::new(&mut conn).find(first).await.expect("query").is_none());
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_remove_unlinked_and_unknown_addresses() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let other = ctx.create_user().await;
    let foreign = ctx.create_address(other.id).await;

    let (status, body) = ctx
        .send("DELETE", &format!("/addresses/{foreign}"), Some(user.id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "This address is not in your address list");

    let (status, body) = ctx
        .send("DELETE", &format!("/addresses/{}", i32::MAX), Some(user.id), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Address not found.");
}

// ============================================================================
// Payments
// ============================================================================

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_card_is_masked() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    ctx.create_payment(user.id).await;

    let (status, body) = ctx.send("GET", "/payments", Some(user.id), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["card_number"], "************1111");
    assert_eq!(body[0]["last_four"], "1111");
    assert!(!body.to_string().contains(TEST_CARD));
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_duplicate_card_is_refused() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    ctx.create_payment(user.id).await;

    let (status, body) = ctx
        .send(
            "POST",
            "/payments",
            Some(user.id),
            Some(json!({"card_number": "4111 1111 1111 1111", "expiry_month": 1, "expiry_year": 2098})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Card ending in 1111 is already in your payment methods."
    );
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_expired_card_is_refused() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;

    let (status, body) = ctx
        .send(
            "POST",
            "/payments",
            Some(user.id),
            Some(json!({"card_number": TEST_CARD, "expiry_month": 1, "expiry_year": 2001})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"]["expiry_year"][0], "card has expired");
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_remove_someone_elses_card() {
    let ctx = TestContext::new().await;
    let owner = ctx.create_user().await;
    let other = ctx.create_user().await;
    let payment = ctx.create_payment(owner.id).await;

    let (status, body) = ctx
        .send("DELETE", &format!("/payments/{payment}"), Some(other.id), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "This payment is not in your payment methods");

    let (_, wallet) = ctx.send("GET", "/payments", Some(owner.id), None).await;
    assert_eq!(wallet[0]["id"], payment.as_i32());
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_card_used_by_order_is_detached() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let book = ctx.create_book(1000).await;
    let cart = ctx.fill_cart(user.id, &book, 1).await;
    let address = ctx.create_address(user.id).await;
    let payment = ctx.create_payment(user.id).await;
    let (_, body) = ctx
        .place_order(user.id, cart, address, payment, order_body(Some("Processing")))
        .await;
    let order_id = order_id_of(&body);

    let (status, body) = ctx
        .send("DELETE", &format!("/payments/{payment}"), Some(user.id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        "Your card information successfully deleted from payment methods"
    );

    let (_, wallet) = ctx.send("GET", "/payments", Some(user.id), None).await;
    assert_eq!(wallet, json!([]));

    let mut conn = ctx.pool.acquire().await.expect("acquire");
    let order = OrderRepository::new(&mut conn)
        .find(order_id)
        .await
        .expect("query")
        .expect("order kept");
    assert_eq!(order.payment_id, payment);
    assert_eq!(order.status, OrderStatus::Processing);
    let stored = PaymentRepository::new(&mut conn)
        .find(payment)
        .await
        .expect("query")
        .expect("payment kept");
    assert_eq!(stored.user_id, None);
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_unused_card_is_deleted() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let payment = ctx.create_payment(user.id).await;

    let (status, _) = ctx
        .send("DELETE", &format!("/payments/{payment}"), Some(user.id), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let mut conn = ctx.pool.acquire().await.expect("acquire");
    assert!(PaymentRepository::new(&mut conn).find(payment).await.expect("query").is_none());

    let (status, body) = ctx
        .send("DELETE", &format!("/payments/{payment}"), Some(user.id), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Payment not found.");
}
