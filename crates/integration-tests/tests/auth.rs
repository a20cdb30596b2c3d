//! Integration tests for registration, login and logout.

use axum::http::StatusCode;
use shopfront_integration_tests::TestContext;

#[tokio::test]
async fn test_register_logs_in() {
    let ctx = TestContext::new();
    let client = ctx.client();

    client
        .post_form("/register", &[("username", "alice"), ("password", "secret1")])
        .await
        .assert_redirect("/");

    assert_eq!(client.get("/").await.user(), Some("alice"));
    assert_eq!(ctx.users.len(), 1);
}

#[tokio::test]
async fn test_register_rejects_taken_username() {
    let ctx = TestContext::new();
    ctx.create_user("alice", "secret1").await;
    let client = ctx.client();

    let resp = client
        .post_form("/register", &[("username", "alice"), ("password", "other-pass")])
        .await;

    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert!(resp.body.contains("Username taken"));
    assert_eq!(client.get("/").await.user(), None);
    assert_eq!(ctx.users.len(), 1);
}

#[tokio::test]
async fn test_register_rejects_bad_input() {
    let ctx = TestContext::new();
    let client = ctx.client();

    let short_password = client
        .post_form("/register", &[("username", "alice"), ("password", "abc")])
        .await;
    assert_eq!(short_password.status, StatusCode::BAD_REQUEST);

    let bad_username = client
        .post_form("/register", &[("username", "a b"), ("password", "secret1")])
        .await;
    assert_eq!(bad_username.status, StatusCode::BAD_REQUEST);

    let empty = client.post_form("/register", &[]).await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    assert!(ctx.users.is_empty());
    assert_eq!(client.session_cookie(), None);
}

#[tokio::test]
async fn test_login_with_valid_credentials() {
    let ctx = TestContext::new();
    ctx.create_user("demo", "demo123").await;
    let client = ctx.client();

    client.login("demo", "demo123").await;

    assert_eq!(client.get("/").await.user(), Some("demo"));
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let ctx = TestContext::new();
    ctx.create_user("demo", "demo123").await;
    let client = ctx.client();

    let wrong_password = client
        .post_form("/login", &[("username", "demo"), ("password", "nope123")])
        .await;
    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert!(wrong_password.body.contains("Invalid credentials"));

    let unknown_user = client
        .post_form("/login", &[("username", "ghost"), ("password", "demo123")])
        .await;
    assert_eq!(unknown_user.status, StatusCode::UNAUTHORIZED);
    assert!(unknown_user.body.contains("Invalid credentials"));

    assert_eq!(client.get("/").await.user(), None);
}

#[tokio::test]
async fn test_login_keeps_cart_and_session() {
    let ctx = TestContext::new();
    ctx.create_user("demo", "demo123").await;
    let client = ctx.client();

    client.post("/cart/add/2").await;
    let anonymous_cookie = client.session_cookie();
    assert!(anonymous_cookie.is_some());

    client.login("demo", "demo123").await;

    assert_eq!(client.session_cookie(), anonymous_cookie);
    let cart = client.get("/cart").await;
    assert_eq!(cart.user(), Some("demo"));
    assert_eq!(cart.quantity_of(2), Some(1));
}

#[tokio::test]
async fn test_tab_opened_before_login_shares_session() {
    let ctx = TestContext::new();
    ctx.create_user("demo", "demo123").await;
    let client = ctx.client();

    client.post("/cart/add/1").await;
    let other_tab = client.new_tab();

    client.login("demo", "demo123").await;
    other_tab.post("/cart/add/2").await.assert_redirect("/cart");

    for tab in [&client, &other_tab] {
        let cart = tab.get("/cart").await;
        assert_eq!(cart.user(), Some("demo"));
        assert_eq!(cart.quantity_of(1), Some(1));
        assert_eq!(cart.quantity_of(2), Some(1));
    }
}

#[tokio::test]
async fn test_logout_clears_identity_and_cart() {
    let ctx = TestContext::new();
    ctx.create_user("demo", "demo123").await;
    let client = ctx.client();

    client.login("demo", "demo123").await;
    client.post("/cart/add/1").await;

    client.get("/logout").await.assert_redirect("/");

    let home = client.get("/").await;
    assert_eq!(home.user(), None);
    assert_eq!(home.cart_count(), 0);
    assert!(client.get("/cart").await.body.contains("Your cart is empty"));
}

#[tokio::test]
async fn test_auth_pages_render() {
    let ctx = TestContext::new();
    let client = ctx.client();

    assert_eq!(client.get("/login").await.status, StatusCode::OK);
    assert_eq!(client.get("/register").await.status, StatusCode::OK);
    assert_eq!(client.get("/health").await.body, "ok");
}
