//! End-to-end tests for the HTTP API.
//!
//! Each test starts the real router on an ephemeral port with its own
//! in-memory store and drives it with `reqwest`. No external services are
//! needed.
//!
//! Run with: `cargo test --test api_tests`
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use mirror_of_dreams::{AppState, Config, build_router};

const PASSWORD: &str = "correct horse battery";
const ADMIN_EMAIL: &str = "admin@example.com";
const CREATOR_EMAIL: &str = "creator@example.com";

/// A running server plus an HTTP client pointed at it.
struct TestFixture {
    base_url: String,
    client: Client,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    async fn with_config(config: Config) -> Self {
        let state = AppState::new(config).expect("Failed to build state");
        state
            .initialize_defaults()
            .await
            .expect("Failed to seed defaults");
        let app = build_router(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to ephemeral port");
        let addr = listener.local_addr().expect("Failed to get local address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server failed");
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: format!("http://{addr}"),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sign up and return `(token, user_id)`.
    async fn signup(&self, email: &str) -> (String, String) {
        let response = self
            .client
            .post(self.url("/auth/signup"))
            .json(&json!({ "email": email, "password": PASSWORD, "name": "Dreamer" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body: Value = response.json().await.unwrap();
        (
            body["token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    async fn demo_token(&self) -> String {
        let body: Value = self
            .client
            .post(self.url("/auth/demo"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    async fn get(&self, path: &str, token: &str) -> Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    async fn post(&self, path: &str, token: &str, body: Value) -> Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn create_dream(&self, token: &str, title: &str) -> String {
        let response = self
            .post("/dreams", token, json!({ "title": title, "category": "creative" }))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = response.json().await.unwrap();
        body["id"].as_str().unwrap().to_string()
    }

    async fn reflect(&self, token: &str, dream_id: &str) -> Response {
        self.post(
            "/reflections",
            token,
            json!({
                "dream_id": dream_id,
                "dream": "Publish a novel",
                "plan": "Write every morning",
                "relationship": "Nervous but committed",
                "offering": "An hour a day",
                "tone": "gentle"
            }),
        )
        .await
    }

    async fn set_tier(&self, admin_token: &str, user_id: &str, tier: &str) {
        let response = self
            .client
            .patch(self.url(&format!("/admin/users/{user_id}/tier")))
            .bearer_auth(admin_token)
            .json(&json!({ "tier": tier }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

fn test_config() -> Config {
    Config {
        bcrypt_cost: 4,
        metrics_port: 0,
        admin_emails: vec![ADMIN_EMAIL.to_string()],
        creator_emails: vec![CREATOR_EMAIL.to_string()],
        ..Config::default()
    }
}

/// Assert the status and return the `{error, message}` body.
async fn expect_error(response: Response, status: StatusCode, code: &str) -> String {
    assert_eq!(response.status(), status);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], code);
    body["message"].as_str().unwrap().to_string()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_and_readiness() {
    let fixture = TestFixture::new().await;

    let response = fixture.client.get(fixture.url("/health")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["users"], 1);

    let response = fixture.client.get(fixture.url("/ready")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_anonymous_and_invalid_tokens_are_unauthenticated() {
    let fixture = TestFixture::new().await;

    let response = fixture.client.get(fixture.url("/users/me")).send().await.unwrap();
    let message = expect_error(response, StatusCode::UNAUTHORIZED, "UNAUTHENTICATED").await;
    assert_eq!(message, "Authentication required. Please sign in.");

    let response = fixture.get("/users/me", "not-a-jwt").await;
    expect_error(response, StatusCode::UNAUTHORIZED, "UNAUTHENTICATED").await;
}

#[tokio::test]
async fn test_signup_signin_and_profile() {
    let fixture = TestFixture::new().await;
    let (token, user_id) = fixture.signup("Dreamer@Example.com").await;

    let profile: Value = fixture.get("/users/me", &token).await.json().await.unwrap();
    assert_eq!(profile["id"], user_id.as_str());
    assert_eq!(profile["email"], "dreamer@example.com");
    assert_eq!(profile["tier"], "free");
    assert!(profile.get("password_hash").is_none());

    let response = fixture
        .client
        .post(fixture.url("/auth/signin"))
        .json(&json!({ "email": "dreamer@example.com", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_duplicate_signup_is_conflict() {
    let fixture = TestFixture::new().await;
    fixture.signup("twice@example.com").await;

    let response = fixture
        .client
        .post(fixture.url("/auth/signup"))
        .json(&json!({ "email": "TWICE@example.com", "password": PASSWORD, "name": "Again" }))
        .send()
        .await
        .unwrap();
    expect_error(response, StatusCode::CONFLICT, "CONFLICT").await;
}

#[tokio::test]
async fn test_malformed_bodies_get_api_errors() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .client
        .post(fixture.url("/auth/signup"))
        .header("content-type", "application/json")
        .body("{")
        .send()
        .await
        .unwrap();
    let message = expect_error(response, StatusCode::BAD_REQUEST, "BAD_REQUEST").await;
    assert_eq!(message, "Malformed JSON in request body");

    let response = fixture
        .client
        .post(fixture.url("/auth/signup"))
        .json(&json!({ "email": "partial@example.com", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    let message = expect_error(response, StatusCode::BAD_REQUEST, "BAD_REQUEST").await;
    assert_eq!(message, "Missing required field: name");

    let response = fixture
        .client
        .post(fixture.url("/auth/signin"))
        .body(r#"{"email":"a@example.com","password":"x"}"#)
        .send()
        .await
        .unwrap();
    expect_error(response, StatusCode::BAD_REQUEST, "BAD_REQUEST").await;
}

#[tokio::test]
async fn test_signin_failures_look_the_same() {
    let fixture = TestFixture::new().await;
    fixture.signup("known@example.com").await;

    let mut messages = Vec::new();
    for (email, password) in [
        ("known@example.com", "wrong password"),
        ("unknown@example.com", PASSWORD),
    ] {
        let response = fixture
            .client
            .post(fixture.url("/auth/signin"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap();
        messages.push(expect_error(response, StatusCode::UNAUTHORIZED, "UNAUTHENTICATED").await);
    }

    assert_eq!(messages[0], messages[1]);
}

#[tokio::test]
async fn test_signin_attempts_are_limited() {
    let fixture = TestFixture::with_config(Config {
        signin_attempts_per_minute: 3,
        ..test_config()
    })
    .await;

    for _ in 0..3 {
        let response = fixture
            .client
            .post(fixture.url("/auth/signin"))
            .json(&json!({ "email": "victim@example.com", "password": "guess-guess" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = fixture
        .client
        .post(fixture.url("/auth/signin"))
        .json(&json!({ "email": "victim@example.com", "password": "guess-guess" }))
        .send()
        .await
        .unwrap();
    expect_error(response, StatusCode::TOO_MANY_REQUESTS, "TOO_MANY_REQUESTS").await;
}

#[tokio::test]
async fn test_invalid_signin_emails_do_not_use_attempts() {
    let fixture = TestFixture::with_config(Config {
        signin_attempts_per_minute: 1,
        ..test_config()
    })
    .await;
    fixture.signup("patient@example.com").await;

    let oversized = format!("{}@example.com", "x".repeat(10_000));
    for email in [oversized.as_str(), "not-an-email", "   "] {
        let response = fixture
            .client
            .post(fixture.url("/auth/signin"))
            .json(&json!({ "email": email, "password": PASSWORD }))
            .send()
            .await
            .unwrap();
        expect_error(response, StatusCode::UNAUTHORIZED, "UNAUTHENTICATED").await;
    }

    // The single allowed attempt is still available for a real address
    let response = fixture
        .client
        .post(fixture.url("/auth/signin"))
        .json(&json!({ "email": "patient@example.com", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Write procedure (demo accounts)
// ============================================================================

#[tokio::test]
async fn test_demo_account_is_read_only() {
    let fixture = TestFixture::new().await;
    let token = fixture.demo_token().await;

    let response = fixture.get("/dreams", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = fixture
        .post("/dreams", &token, json!({ "title": "Try the app" }))
        .await;
    let message = expect_error(response, StatusCode::FORBIDDEN, "FORBIDDEN").await;
    assert_eq!(
        message,
        "Demo accounts cannot modify data. Sign up to save changes."
    );
}

// ============================================================================
// Usage-limited procedure
// ============================================================================

#[tokio::test]
async fn test_free_tier_monthly_limit() {
    let fixture = TestFixture::new().await;
    let (token, _) = fixture.signup("free@example.com").await;
    let dream_id = fixture.create_dream(&token, "Write a novel").await;

    for _ in 0..3 {
        let response = fixture.reflect(&token, &dream_id).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = fixture.reflect(&token, &dream_id).await;
    let message = expect_error(response, StatusCode::FORBIDDEN, "FORBIDDEN").await;
    assert_eq!(
        message,
        "Monthly reflection limit reached (3). Please upgrade or wait until next month."
    );

    let usage: Value = fixture.get("/users/me/usage", &token).await.json().await.unwrap();
    assert_eq!(usage["used"], 3);
    assert_eq!(usage["limit"], 3);
    assert_eq!(usage["remaining"], 0);
    assert_eq!(usage["can_reflect"], false);

    let reflections: Value = fixture
        .get(&format!("/reflections?dream_id={dream_id}"), &token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(reflections.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_concurrent_reflections_respect_limit() {
    let fixture = TestFixture::new().await;
    let (token, _) = fixture.signup("racer@example.com").await;
    let dream_id = fixture.create_dream(&token, "Win the race").await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let client = fixture.client.clone();
        let url = fixture.url("/reflections");
        let token = token.clone();
        let body = json!({
            "dream_id": dream_id,
            "dream": "Finish first",
            "plan": "Intervals",
            "relationship": "Determined",
            "offering": "Rest days"
        });
        handles.push(tokio::spawn(async move {
            client
                .post(url)
                .bearer_auth(token)
                .json(&body)
                .send()
                .await
                .unwrap()
                .status()
        }));
    }

    let mut created = 0;
    let mut forbidden = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::CREATED => created += 1,
            StatusCode::FORBIDDEN => forbidden += 1,
            other => panic!("unexpected status {other}"),
        }
    }

    assert_eq!(created, 3);
    assert_eq!(forbidden, 7);
}

#[tokio::test]
async fn test_creators_are_never_limited() {
    let fixture = TestFixture::new().await;
    let (token, _) = fixture.signup(CREATOR_EMAIL).await;
    let dream_id = fixture.create_dream(&token, "Build the product").await;

    for _ in 0..5 {
        let response = fixture.reflect(&token, &dream_id).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let usage: Value = fixture.get("/users/me/usage", &token).await.json().await.unwrap();
    assert_eq!(usage["can_reflect"], true);
    assert!(usage["remaining"].is_null());
}

// ============================================================================
// Premium procedure
// ============================================================================

#[tokio::test]
async fn test_evolution_report_requires_paid_tier() {
    let fixture = TestFixture::new().await;
    let (admin_token, _) = fixture.signup(ADMIN_EMAIL).await;
    let (token, user_id) = fixture.signup("upgrader@example.com").await;
    let dream_id = fixture.create_dream(&token, "Learn the cello").await;
    fixture.reflect(&token, &dream_id).await;

    let path = format!("/dreams/{dream_id}/evolution");
    let response = fixture.post(&path, &token, json!({})).await;
    let message = expect_error(response, StatusCode::FORBIDDEN, "FORBIDDEN").await;
    assert_eq!(
        message,
        "Premium tier required. Please upgrade your subscription."
    );

    // The tier change applies to the very next request with the same token
    fixture.set_tier(&admin_token, &user_id, "essential").await;

    let response = fixture.post(&path, &token, json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let report: Value = response.json().await.unwrap();
    assert_eq!(report["reflection_count"], 1);
    assert_eq!(report["tone_distribution"]["gentle"], 1);
}

// ============================================================================
// Creator procedure
// ============================================================================

#[tokio::test]
async fn test_admin_endpoints_require_role() {
    let fixture = TestFixture::new().await;
    let (admin_token, _) = fixture.signup(ADMIN_EMAIL).await;
    let (token, _) = fixture.signup("regular@example.com").await;

    let response = fixture.get("/admin/users", &token).await;
    let message = expect_error(response, StatusCode::FORBIDDEN, "FORBIDDEN").await;
    assert_eq!(message, "Creator or admin access required.");

    let response = fixture.get("/admin/users", &admin_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let users: Value = response.json().await.unwrap();
    let users = users.as_array().unwrap();
    // demo + admin + regular
    assert_eq!(users.len(), 3);
    assert!(users.iter().all(|u| u.get("password_hash").is_none()));
}

// ============================================================================
// Ownership
// ============================================================================

#[tokio::test]
async fn test_other_users_dreams_are_not_found() {
    let fixture = TestFixture::new().await;
    let (owner, _) = fixture.signup("owner@example.com").await;
    let (stranger, _) = fixture.signup("stranger@example.com").await;
    let dream_id = fixture.create_dream(&owner, "Private dream").await;

    let response = fixture.get(&format!("/dreams/{dream_id}"), &stranger).await;
    expect_error(response, StatusCode::NOT_FOUND, "NOT_FOUND").await;

    let response = fixture.reflect(&stranger, &dream_id).await;
    expect_error(response, StatusCode::NOT_FOUND, "NOT_FOUND").await;

    let response = fixture
        .client
        .delete(fixture.url(&format!("/dreams/{dream_id}")))
        .bearer_auth(&stranger)
        .send()
        .await
        .unwrap();
    expect_error(response, StatusCode::NOT_FOUND, "NOT_FOUND").await;

    let response = fixture.get(&format!("/dreams/{dream_id}"), &owner).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_dream_target_date_can_be_cleared() {
    let fixture = TestFixture::new().await;
    let (token, _) = fixture.signup("planner@example.com").await;
    let dream_id = fixture.create_dream(&token, "Run a marathon").await;
    let path = fixture.url(&format!("/dreams/{dream_id}"));

    let body: Value = fixture
        .client
        .patch(&path)
        .bearer_auth(&token)
        .json(&json!({ "target_date": "2027-04-01" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["target_date"], "2027-04-01");

    // Absent leaves the date alone
    let body: Value = fixture
        .client
        .patch(&path)
        .bearer_auth(&token)
        .json(&json!({ "title": "Run two marathons" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["target_date"], "2027-04-01");

    let body: Value = fixture
        .client
        .patch(&path)
        .bearer_auth(&token)
        .json(&json!({ "target_date": null }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["target_date"].is_null());
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .client
        .get(fixture.url("/health"))
        .header("x-request-id", "trace-me")
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "trace-me");
}
