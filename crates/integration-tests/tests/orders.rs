//! Order placement and cancellation against a real database.
//!
//! These tests require a running `PostgreSQL` database reachable through
//! `BOOKSTORE_TEST_DATABASE_URL`.
//!
//! Run with: cargo test -p bookstore-integration-tests -- --ignored

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use bookstore_api::db::{CartRepository, OrderRepository};
use bookstore_core::{CartId, OrderStatus};
use bookstore_integration_tests::{TestContext, order_body, order_id_of};

// ============================================================================
// Placement
// ============================================================================

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_checkout_consumes_cart() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let book = ctx.create_book(1000).await;
    let cart = ctx.fill_cart(user.id, &book, 2).await;
    let address = ctx.create_address(user.id).await;
    let payment = ctx.create_payment(user.id).await;

    let (status, body) = ctx
        .place_order(user.id, cart, address, payment, order_body(None))
        .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["order_books"][0]["quantity"], 2);
    assert_eq!(body["order_books"][0]["book"]["isbn"], book.isbn.as_str());
    assert_eq!(body["order_info"]["status"], "Pending");
    assert_eq!(body["order_info"]["shipping_method"], "InStore");
    assert_eq!(body["order_info"]["total"], "27.00");
    assert_eq!(body["order_info"]["user_id"], user.id.as_i32());

    assert_eq!(ctx.cart_id(user.id).await, None);
    let (_, cart_body) = ctx.send("GET", "/carts", Some(user.id), None).await;
    assert_eq!(cart_body["message"], "There is no cart for you");
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_every_cart_line_becomes_an_order_line() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let address = ctx.create_address(user.id).await;
    let payment = ctx.create_payment(user.id).await;

    let mut cart = None;
    for copies in 1..=3 {
        let book = ctx.create_book(500).await;
        cart = Some(ctx.fill_cart(user.id, &book, copies).await);
    }
    let cart = cart.expect("cart");

    let (status, body) = ctx
        .place_order(user.id, cart, address, payment, order_body(None))
        .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    let order_id = order_id_of(&body);
    assert_eq!(ctx.order_line_count(order_id).await, 3);

    let mut quantities: Vec<i64> = body["order_books"]
        .as_array()
        .expect("order_books")
        .iter()
        .filter_map(|line| line["quantity"].as_i64())
        .collect();
    quantities.sort_unstable();
    assert_eq!(quantities, vec![1, 2, 3]);
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_empty_cart_places_order_without_lines() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let book = ctx.create_book(1000).await;
    ctx.fill_cart(user.id, &book, 1).await;
    let (status, _) = ctx
        .send("PUT", &format!("/carts/remove_book/{}", book.id), Some(user.id), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let mut conn = ctx.pool.acquire().await.expect("acquire");
    let cart = CartRepository::new(&mut conn)
        .find_by_user(user.id)
        .await
        .expect("query")
        .expect("empty cart still exists");
    drop(conn);

    let address = ctx.create_address(user.id).await;
    let payment = ctx.create_payment(user.id).await;
    let (status, body) = ctx
        .place_order(user.id, cart.id, address, payment, order_body(None))
        .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["order_books"], json!([]));
    assert_eq!(ctx.order_line_count(order_id_of(&body)).await, 0);
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_someone_elses_cart_is_refused() {
    let ctx = TestContext::new().await;
    let owner = ctx.create_user().await;
    let intruder = ctx.create_user().await;
    let book = ctx.create_book(1000).await;
    let cart = ctx.fill_cart(owner.id, &book, 1).await;
    let address = ctx.create_address(intruder.id).await;
    let payment = ctx.create_payment(intruder.id).await;

    let (status, body) = ctx
        .place_order(intruder.id, cart, address, payment, order_body(None))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cart does not belong to you.");
    assert_eq!(ctx.order_count(intruder.id).await, 0);
    assert_eq!(ctx.cart_id(owner.id).await, Some(cart));
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_someone_elses_payment_is_refused() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let other = ctx.create_user().await;
    let book = ctx.create_book(1000).await;
    let cart = ctx.fill_cart(user.id, &book, 1).await;
    let address = ctx.create_address(user.id).await;
    let payment = ctx.create_payment(other.id).await;

    let (status, body) = ctx
        .place_order(user.id, cart, address, payment, order_body(None))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Payment method does not belong to you.");
    assert_eq!(ctx.order_count(user.id).await, 0);
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_unlinked_address_is_refused() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let other = ctx.create_user().await;
    let book = ctx.create_book(1000).await;
    let cart = ctx.fill_cart(user.id, &book, 1).await;
    let address = ctx.create_address(other.id).await;
    let payment = ctx.create_payment(user.id).await;

    let (status, body) = ctx
        .place_order(user.id, cart, address, payment, order_body(None))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Address does not belong to you.");
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_missing_cart_is_not_found() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let address = ctx.create_address(user.id).await;
    let payment = ctx.create_payment(user.id).await;

    let (status, body) = ctx
        .place_order(user.id, CartId::new(i32::MAX), address, payment, order_body(None))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Cart not found.");
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_concurrent_checkout_places_one_order() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let book = ctx.create_book(1000).await;
    let cart = ctx.fill_cart(user.id, &book, 1).await;
    let address = ctx.create_address(user.id).await;
    let payment = ctx.create_payment(user.id).await;

    let (first, second) = tokio::join!(
        ctx.place_order(user.id, cart, address, payment, order_body(None)),
        ctx.place_order(user.id, cart, address, payment, order_body(None)),
    );

    let mut statuses = [first.0, second.0];
    statuses.sort_unstable_by_key(|s| s.as_u16());
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::NOT_FOUND]);
    assert_eq!(ctx.order_count(user.id).await, 1);
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_card_deleted_during_checkout_is_not_found() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let book = ctx.create_book(1000).await;
    let cart = ctx.fill_cart(user.id, &book, 1).await;
    let address = ctx.create_address(user.id).await;
    let payment = ctx.create_payment(user.id).await;

    let mut removal = ctx.pool.begin().await.expect("begin");
    sqlx::query("DELETE FROM bookstore.payment WHERE id = $1")
        .bind(payment)
        .execute(&mut *removal)
        .await
        .expect("delete payment");
    let commit_later = async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        removal.commit().await.expect("commit removal");
    };

    let ((status, body), ()) = tokio::join!(
        ctx.place_order(user.id, cart, address, payment, order_body(None)),
        commit_later,
    );

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Payment method not found.");
    assert_eq!(ctx.order_count(user.id).await, 0);
    assert_eq!(ctx.cart_id(user.id).await, Some(cart));
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_failed_line_copy_rolls_back_order() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let kept = ctx.create_book(1000).await;
    let rejected = ctx.create_book(500).await;
    ctx.fill_cart(user.id, &kept, 2).await;
    let cart = ctx.fill_cart(user.id, &rejected, 1).await;
    let address = ctx.create_address(user.id).await;
    let payment = ctx.create_payment(user.id).await;

    // Fail the second line copy, after the order row and the first line.
    sqlx::query(
        r"
        CREATE OR REPLACE FUNCTION bookstore.reject_order_line() RETURNS trigger AS $$
        BEGIN
            IF NEW.book_id = TG_ARGV[0]::INTEGER THEN
                RAISE EXCEPTION 'order line rejected';
            END IF;
            RETURN NEW;
        END;
        $$ LANGUAGE plpgsql
        ",
    )
    .execute(&ctx.pool)
    .await
    .expect("create trigger function");
    let trigger = format!("reject_order_line_{}", rejected.id);
    sqlx::query(&format!(
        "CREATE TRIGGER {trigger} BEFORE INSERT ON bookstore.order_line \
         FOR EACH ROW EXECUTE FUNCTION bookstore.reject_order_line('{}')",
        rejected.id
    ))
    .execute(&ctx.pool)
    .await
    .expect("create trigger");

    let (status, body) = ctx
        .place_order(user.id, cart, address, payment, order_body(None))
        .await;

    sqlx::query(&format!("DROP TRIGGER {trigger} ON bookstore.order_line"))
        .execute(&ctx.pool)
        .await
        .expect("drop trigger");

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
    assert_eq!(ctx.order_count(user.id).await, 0);
    assert_eq!(ctx.book_order_line_count(kept.id).await, 0);
    assert_eq!(ctx.cart_id(user.id).await, Some(cart));
    assert_eq!(ctx.cart_quantities(cart).await, vec![2, 1]);
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_cancel_pending_deletes_order() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let book = ctx.create_book(1000).await;
    let cart = ctx.fill_cart(user.id, &book, 2).await;
    let address = ctx.create_address(user.id).await;
    let payment = ctx.create_payment(user.id).await;
    let (_, body) = ctx
        .place_order(user.id, cart, address, payment, order_body(None))
        .await;
    let order_id = order_id_of(&body);

    let (status, body) = ctx
        .send("DELETE", &format!("/orders/{order_id}"), Some(user.id), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Your order has been deleted");
    assert_eq!(ctx.order_line_count(order_id).await, 0);

    let mut conn = ctx.pool.acquire().await.expect("acquire");
    assert!(OrderRepository::new(&mut conn).find(order_id).await.expect("query").is_none());

    let (status, body) = ctx
        .send("DELETE", &format!("/orders/{order_id}"), Some(user.id), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Order not found.");
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_cancel_processing_marks_cancelled() {
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
        .send("DELETE", &format!("/orders/{order_id}"), Some(user.id), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Your order status changed to Cancelled");
    assert_eq!(ctx.order_line_count(order_id).await, 1);

    let mut conn = ctx.pool.acquire().await.expect("acquire");
    let order = OrderRepository::new(&mut conn)
        .find(order_id)
        .await
        .expect("query")
        .expect("order kept");
    assert_eq!(order.status, OrderStatus::Cancelled);

    let (status, body) = ctx
        .send("DELETE", &format!("/orders/{order_id}"), Some(user.id), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "This order is already cancelled.");
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_cancel_shipped_is_refused() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let book = ctx.create_book(1000).await;
    let cart = ctx.fill_cart(user.id, &book, 1).await;
    let address = ctx.create_address(user.id).await;
    let payment = ctx.create_payment(user.id).await;
    let (_, body) = ctx
        .place_order(user.id, cart, address, payment, order_body(Some("Shipped")))
        .await;
    let order_id = order_id_of(&body);

    let (status, body) = ctx
        .send("DELETE", &format!("/orders/{order_id}"), Some(user.id), None)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "You can not cancel this order, because it has already been shipped."
    );

    let mut conn = ctx.pool.acquire().await.expect("acquire");
    let order = OrderRepository::new(&mut conn)
        .find(order_id)
        .await
        .expect("query")
        .expect("order kept");
    assert_eq!(order.status, OrderStatus::Shipped);
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_cancel_someone_elses_order_is_refused() {
    let ctx = TestContext::new().await;
    let owner = ctx.create_user().await;
    let other = ctx.create_user().await;
    let book = ctx.create_book(1000).await;
    let cart = ctx.fill_cart(owner.id, &book, 1).await;
    let address = ctx.create_address(owner.id).await;
    let payment = ctx.create_payment(owner.id).await;
    let (_, body) = ctx
        .place_order(owner.id, cart, address, payment, order_body(None))
        .await;
    let order_id = order_id_of(&body);

    let (status, body) = ctx
        .send("DELETE", &format!("/orders/{order_id}"), Some(other.id), None)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "You can not cancel this order, because it does not belong to you."
    );
    assert_eq!(ctx.order_count(owner.id).await, 1);
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_list_orders_is_public() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let book = ctx.create_book(1250).await;
    let cart = ctx.fill_cart(user.id, &book, 3).await;
    let address = ctx.create_address(user.id).await;
    let payment = ctx.create_payment(user.id).await;
    let (_, body) = ctx
        .place_order(user.id, cart, address, payment, order_body(None))
        .await;
    let order_id = order_id_of(&body);

    let (status, body) = ctx.send("GET", "/orders", None, None).await;

    assert_eq!(status, StatusCode::OK);
    let listed = body
        .as_array()
        .expect("array")
        .iter()
        .find(|view| view["order_info"]["id"] == order_id.as_i32())
        .expect("placed order is listed");
    assert_eq!(listed["order_books"][0]["quantity"], 3);
    assert_eq!(listed["order_books"][0]["book"]["price"], "12.50");
}
