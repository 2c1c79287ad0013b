mod common;

use common::{ADMIN, GUEST, OTHER, TestApp};
use http::{Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};

async fn add_to_cart(
    app: &TestApp,
    token: &str,
    email: &str,
    menu_item_id: &str,
    price: f64,
) -> String {
    let (status, body) = app
        .post(
            "/carts",
            Some(token),
            json!({ "email": email, "menuId": menu_item_id, "name": "Dish", "price": price }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    body["insertedId"].as_str().unwrap().to_string()
}

fn payment(transaction_id: &str, cart_ids: &[&str], menu_item_ids: &[&str]) -> Value {
    json!({
        "email": GUEST,
        "price": 25,
        "transactionId": transaction_id,
        "date": "2026-03-01T12:00:00Z",
        "cartId": cart_ids,
        "menuItemId": menu_item_ids,
        "status": "pending",
    })
}

#[tokio::test]
async fn test_checkout_settles_exactly_the_paid_items() {
    let app = TestApp::new();
    app.store.seed_menu_item("p1", "Pizza", Decimal::new(10, 0)).await;
    app.store.seed_menu_item("p2", "Pizza", Decimal::new(15, 0)).await;
    let token = app.token_for(GUEST);

    let c1 = add_to_cart(&app, &token, GUEST, "p1", 10.0).await;
    let c2 = add_to_cart(&app, &token, GUEST, "p2", 15.0).await;
    let c3 = add_to_cart(&app, &token, GUEST, "p2", 15.0).await;

    let (status, cart) = app.get(&format!("/carts?email={GUEST}"), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart.as_array().unwrap().len(), 3);

    let (status, body) = app
        .post("/create-payment-intent", Some(&token), json!({ "price": 12.5 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["clientSecret"], "secret_1250_usd");

    let (status, body) = app
        .post(
            "/payments",
            Some(&token),
            payment("pi_1", &[c1.as_str(), c2.as_str()], &["p1", "p2"]),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "settled");
    assert!(body.get("code").is_none());
    assert_eq!(body["deleteResult"]["deletedCount"], 2);
    assert!(body["paymentResult"]["insertedId"].is_string());
    assert_eq!(body["missingCartIds"], json!([]));

    let (_, cart) = app.get("/carts", Some(&token)).await;
    let remaining: Vec<&str> = cart
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(remaining, vec![c3.as_str()]);

    let (status, payments) = app.get(&format!("/payments/{GUEST}"), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let payments = payments.as_array().unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0]["transactionId"], "pi_1");
    assert_eq!(payments[0]["cartId"], json!([c1, c2]));

    let (status, stats) = app.get("/order-stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats[0]["category"], "Pizza");
    assert_eq!(stats[0]["quantity"], 2);
    assert_eq!(stats[0]["revenue"], 25.0);
}

#[tokio::test]
async fn test_vanished_cart_items_are_reported_not_hidden() {
    let app = TestApp::new();
    app.store.seed_user(ADMIN, Some("admin")).await;
    let token = app.token_for(GUEST);
    let c1 = add_to_cart(&app, &token, GUEST, "p1", 10.0).await;
    let theirs = add_to_cart(&app, &app.token_for(OTHER), OTHER, "p1", 10.0).await;

    let (status, body) = app
        .post(
            "/payments",
            Some(&token),
            payment("pi_2", &[c1.as_str(), "already-gone", theirs.as_str()], &["p1"]),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "partial");
    assert_eq!(body["code"], 4004);
    assert_eq!(body["deleteResult"]["deletedCount"], 1);
    assert_eq!(body["missingCartIds"], json!(["already-gone", theirs]));

    // Another identity's cart item survives
    let (_, other_cart) = app.get("/carts", Some(&app.token_for(OTHER))).await;
    assert_eq!(other_cart.as_array().unwrap().len(), 1);

    let (status, issues) = app
        .get("/settlement-issues", Some(&app.token_for(ADMIN)))
        .await;
    assert_eq!(status, StatusCode::OK);
    let issues = issues.as_array().unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0]["email"], GUEST);
    assert_eq!(
        issues[0]["paymentId"],
        body["paymentResult"]["insertedId"]
    );
}

#[tokio::test]
async fn test_concurrent_settlements_cannot_both_take_the_cart() {
    let app = TestApp::new();
    app.store.seed_user(ADMIN, Some("admin")).await;
    let token = app.token_for(GUEST);
    let c1 = add_to_cart(&app, &token, GUEST, "p1", 10.0).await;
    let c2 = add_to_cart(&app, &token, GUEST, "p1", 10.0).await;
    let cart_ids = [c1.as_str(), c2.as_str()];

    let ((status_a, a), (status_b, b)) = tokio::join!(
        app.post("/payments", Some(&token), payment("pi_a", &cart_ids, &["p1"])),
        app.post("/payments", Some(&token), payment("pi_b", &cart_ids, &["p1"])),
    );
    assert_eq!(status_a, StatusCode::OK);
    assert_eq!(status_b, StatusCode::OK);

    // Exactly one settlement retired both items; the other found none left
    let (winner, loser) = if a["status"] == "settled" { (a, b) } else { (b, a) };
    assert_eq!(winner["status"], "settled");
    assert_eq!(winner["deleteResult"]["deletedCount"], 2);
    assert_eq!(loser["status"], "partial");
    assert_eq!(loser["deleteResult"]["deletedCount"], 0);
    assert_eq!(loser["missingCartIds"], json!([c1, c2]));

    // Both payments are recorded
    let (_, payments) = app.get(&format!("/payments/{GUEST}"), Some(&token)).await;
    assert_eq!(payments.as_array().unwrap().len(), 2);

    let (_, issues) = app
        .get("/settlement-issues", Some(&app.token_for(ADMIN)))
        .await;
    let issues = issues.as_array().unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0]["paymentId"], loser["paymentResult"]["insertedId"]);

    let (_, cart) = app.get("/carts", Some(&token)).await;
    assert!(cart.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_payment_body_is_a_validation_error() {
    let app = TestApp::new();
    let token = app.token_for(GUEST);
    let c1 = add_to_cart(&app, &token, GUEST, "p1", 10.0).await;

    let mut body = payment("pi_bad", &[c1.as_str()], &["p1"]);
    body["price"] = json!("abc");
    let (status, body) = app.post("/payments", Some(&token), body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2);
    assert!(body["message"].is_string());

    // Nothing was settled
    let (_, cart) = app.get("/carts", Some(&token)).await;
    assert_eq!(cart.as_array().unwrap().len(), 1);

    let (status, body) = app
        .post("/carts", Some(&token), json!({ "email": GUEST, "price": [] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2);
}

#[tokio::test]
async fn test_duplicate_transaction_is_409() {
    let app = TestApp::new();
    let token = app.token_for(GUEST);
    let c1 = add_to_cart(&app, &token, GUEST, "p1", 10.0).await;
    let c2 = add_to_cart(&app, &token, GUEST, "p1", 10.0).await;

    let (status, _) = app
        .post("/payments", Some(&token), payment("pi_dup", &[c1.as_str()], &["p1"]))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post("/payments", Some(&token), payment("pi_dup", &[c2.as_str()], &["p1"]))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 4003);

    // The rejected settlement removed nothing
    let (_, cart) = app.get("/carts", Some(&token)).await;
    assert_eq!(cart.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_payment_must_be_recorded_under_own_email() {
    let app = TestApp::new();
    app.store.seed_user(ADMIN, Some("admin")).await;

    for caller in [OTHER, ADMIN] {
        let (status, body) = app
            .post("/payments", Some(&app.token_for(caller)), payment("pi_3", &["c1"], &[]))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], 2001);
    }
}

#[tokio::test]
async fn test_payment_without_cart_items_is_rejected() {
    let app = TestApp::new();
    let token = app.token_for(GUEST);

    let (status, body) = app
        .post("/payments", Some(&token), payment("pi_4", &[], &[]))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4002);
}

#[tokio::test]
async fn test_payment_intent_rejects_bad_price() {
    let app = TestApp::new();
    let token = app.token_for(GUEST);

    for price in [json!("abc"), json!(0), json!(-4), json!(null)] {
        let (status, _) = app
            .post("/create-payment-intent", Some(&token), json!({ "price": price }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{price}");
    }
}

#[tokio::test]
async fn test_cart_ownership() {
    let app = TestApp::new();
    let guest = app.token_for(GUEST);
    let other = app.token_for(OTHER);
    let item = add_to_cart(&app, &guest, GUEST, "p1", 10.0).await;

    // Adding to someone else's cart
    let (status, _) = app
        .post(
            "/carts",
            Some(&other),
            json!({ "email": GUEST, "menuItemId": "p1", "price": 10 }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get(&format!("/carts?email={GUEST}"), Some(&other)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(Method::DELETE, &format!("/carts/{item}"), Some(&other), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(Method::DELETE, &format!("/carts/{item}"), Some(&guest), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deletedCount"], 1);

    let (status, body) = app
        .send(Method::DELETE, &format!("/carts/{item}"), Some(&guest), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 4001);
}

#[tokio::test]
async fn test_admin_stats() {
    let app = TestApp::new();
    app.store.seed_user(ADMIN, Some("admin")).await;
    let admin = app.token_for(ADMIN);

    let (status, body) = app.get("/admin-stats", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["revenue"], 0.0);
    assert_eq!(body["orders"], 0);
    assert_eq!(body["users"], 1);

    let token = app.token_for(GUEST);
    let c1 = add_to_cart(&app, &token, GUEST, "p1", 10.0).await;
    app.post("/payments", Some(&token), payment("pi_5", &[c1.as_str()], &["p1"]))
        .await;

    let (_, body) = app.get("/admin-stats", Some(&admin)).await;
    assert_eq!(body["orders"], 1);
    assert_eq!(body["revenue"], 25.0);
}
