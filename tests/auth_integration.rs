use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Arc;

use authgate::auth::{generate_access_token, Identity};
use authgate::configuration::{HashingSettings, JwtSettings};
use authgate::startup::run;
use authgate::store::JsonFileUserStore;
use serde_json::{json, Value};

pub struct TestApp {
    pub address: String,
    pub users_file: PathBuf,
    pub jwt: JwtSettings,
    pub client: reqwest::Client,
}

impl TestApp {
    async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(&format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn register(&self, email: &str, password: &str) -> reqwest::Response {
        self.post(
            "/auth/register",
            &json!({
                "email": email,
                "firstName": "A",
                "lastName": "B",
                "password": password
            }),
        )
        .await
    }

    async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.post("/auth/login", &json!({"email": email, "password": password}))
            .await
    }

    async fn refresh(&self, refresh_token: &str) -> reqwest::Response {
        self.post("/auth/refresh", &json!({"refreshToken": refresh_token}))
            .await
    }

    async fn get_profile(&self, authorization: Option<&str>) -> reqwest::Response {
        let mut request = self.client.get(&format!("{}/profile", self.address));
        if let Some(value) = authorization {
            request = request.header("Authorization", value);
        }
        request.send().await.expect("Failed to execute request.")
    }

    /// Raw records currently in the backing file
    async fn stored_users(&self) -> Vec<Value> {
        let contents = tokio::fs::read(&self.users_file)
            .await
            .expect("Failed to read users file");
        serde_json::from_slice(&contents).expect("Users file is not a JSON array")
    }
}

async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let users_file = std::env::temp_dir()
        .join(format!("authgate_test_{}", uuid::Uuid::new_v4()))
        .join("users.json");
    let store = JsonFileUserStore::new(&users_file)
        .await
        .expect("Failed to open user store");

    let jwt = JwtSettings {
        access_secret: "integration-access-secret".to_string(),
        refresh_secret: "integration-refresh-secret".to_string(),
        access_token_expiry: 1800,
        refresh_token_expiry: 604800,
        issuer: "test".to_string(),
    };

    let server = run(
        listener,
        Arc::new(store),
        jwt.clone(),
        HashingSettings { bcrypt_cost: 4 },
    )
    .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        users_file,
        jwt,
        client: reqwest::Client::new(),
    }
}

// --- Registration Tests ---

#[tokio::test]
async fn register_returns_201_and_persists_user() {
    let app = spawn_app().await;

    let response = app.register("a@x.com", "secret").await;
    assert_eq!(201, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["message"].is_string());
    let user_id = body["userId"].as_u64().expect("userId should be a number");

    // Registration does not log the user in
    assert!(body.get("accessToken").is_none());

    let users = app.stored_users().await;
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["id"].as_u64(), Some(user_id));
    assert_eq!(users[0]["email"], "a@x.com");
    assert_eq!(users[0]["firstName"], "A");
    assert_ne!(users[0]["passwordHash"], "secret");
}

#[tokio::test]
async fn register_returns_400_for_duplicate_email() {
    let app = spawn_app().await;
    assert_eq!(201, app.register("a@x.com", "secret").await.status().as_u16());

    let response = app.register("a@x.com", "other").await;
    assert_eq!(400, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "DUPLICATE_IDENTITY");
    assert_eq!(app.stored_users().await.len(), 1);
}

#[tokio::test]
async fn register_returns_400_when_fields_are_missing() {
    let app = spawn_app().await;

    let test_cases = vec![
        (json!({"firstName": "A", "lastName": "B", "password": "secret"}), "missing email"),
        (json!({"email": "a@x.com", "lastName": "B", "password": "secret"}), "missing first name"),
        (json!({"email": "a@x.com", "firstName": "A", "password": "secret"}), "missing last name"),
        (json!({"email": "a@x.com", "firstName": "A", "lastName": "B"}), "missing password"),
        (json!({"email": "", "firstName": "A", "lastName": "B", "password": "secret"}), "empty email"),
        (json!({}), "empty body"),
    ];

    for (body, description) in test_cases {
        let response = app.post("/auth/register", &body).await;
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request when the payload was {}.",
            description
        );
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["code"], "MISSING_FIELDS");
    }

    assert!(app.stored_users().await.is_empty());
}

#[tokio::test]
async fn malformed_json_returns_400() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(&format!("{}/auth/register", app.address))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "MALFORMED_BODY");
}

#[tokio::test]
async fn concurrent_registrations_are_all_persisted() {
    let app = Arc::new(spawn_app().await);

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                app.register(&format!("user{}@x.com", i), "secret")
                    .await
                    .status()
                    .as_u16()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(201, handle.await.unwrap());
    }

    let users = app.stored_users().await;
    assert_eq!(users.len(), 10);
}

// --- Login Tests ---

#[tokio::test]
async fn login_returns_both_tokens() {
    let app = spawn_app().await;
    app.register("a@x.com", "secret").await;

    let response = app.login("a@x.com", "secret").await;
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    assert!(body["accessToken"].is_string());
    assert!(body["refreshToken"].is_string());
    assert_ne!(body["accessToken"], body["refreshToken"]);
}

#[tokio::test]
async fn login_failures_do_not_reveal_which_part_was_wrong() {
    let app = spawn_app().await;
    app.register("a@x.com", "secret").await;

    let wrong_password = app.login("a@x.com", "wrong").await;
    let unknown_email = app.login("nobody@x.com", "secret").await;

    assert_eq!(400, wrong_password.status().as_u16());
    assert_eq!(400, unknown_email.status().as_u16());

    let wrong_password: Value = wrong_password.json().await.unwrap();
    let unknown_email: Value = unknown_email.json().await.unwrap();
    assert_eq!(wrong_password["message"], unknown_email["message"]);
    assert_eq!(wrong_password["code"], "INVALID_CREDENTIALS");
    assert_eq!(unknown_email["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn login_returns_400_when_fields_are_missing() {
    let app = spawn_app().await;

    for body in [json!({"email": "a@x.com"}), json!({"password": "secret"}), json!({})] {
        let response = app.post("/auth/login", &body).await;
        assert_eq!(400, response.status().as_u16());
    }
}

// --- Refresh Tests ---

#[tokio::test]
async fn refresh_returns_new_access_token() {
    let app = spawn_app().await;
    app.register("a@x.com", "secret").await;
    let tokens: Value = app.login("a@x.com", "secret").await.json().await.unwrap();
    let refresh_token = tokens["refreshToken"].as_str().unwrap();

    let response = app.refresh(refresh_token).await;
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    let access_token = body["accessToken"].as_str().expect("accessToken missing");
    assert!(body.get("refreshToken").is_none());

    // The new access token opens the protected profile
    let profile = app
        .get_profile(Some(&format!("Bearer {}", access_token)))
        .await;
    assert_eq!(200, profile.status().as_u16());

    // The refresh token is not rotated
    assert_eq!(200, app.refresh(refresh_token).await.status().as_u16());
}

#[tokio::test]
async fn refresh_rejects_garbage_and_access_tokens() {
    let app = spawn_app().await;
    app.register("a@x.com", "secret").await;
    let tokens: Value = app.login("a@x.com", "secret").await.json().await.unwrap();

    let response = app.refresh("garbage").await;
    assert_eq!(403, response.status().as_u16());

    let response = app.refresh(tokens["accessToken"].as_str().unwrap()).await;
    assert_eq!(403, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_OR_EXPIRED_TOKEN");
}

#[tokio::test]
async fn refresh_returns_400_without_token() {
    let app = spawn_app().await;

    let response = app.post("/auth/refresh", &json!({})).await;
    assert_eq!(400, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "MISSING_TOKEN");
}

// --- Profile / Guard Tests ---

#[tokio::test]
async fn profile_requires_credentials() {
    let app = spawn_app().await;

    assert_eq!(401, app.get_profile(None).await.status().as_u16());
    assert_eq!(401, app.get_profile(Some("Basic abc")).await.status().as_u16());
    assert_eq!(403, app.get_profile(Some("Bearer garbage")).await.status().as_u16());
    assert_eq!(403, app.get_profile(Some("bearer garbage")).await.status().as_u16());
}

#[tokio::test]
async fn profile_accepts_any_scheme_casing() {
    let app = spawn_app().await;
    app.register("case@x.com", "secret").await;
    let tokens: Value = app.login("case@x.com", "secret").await.json().await.unwrap();
    let access_token = tokens["accessToken"].as_str().unwrap();

    for scheme in ["Bearer", "bearer", "BEARER"] {
        let header = format!("{} {}", scheme, access_token);
        let response = app.get_profile(Some(&header)).await;
        assert_eq!(200, response.status().as_u16(), "scheme {}", scheme);
    }
}

#[tokio::test]
async fn profile_rejects_expired_access_token() {
    let app = spawn_app().await;

    let mut expired = app.jwt.clone();
    expired.access_token_expiry = -60;
    let identity = Identity {
        id: 1,
        email: "a@x.com".to_string(),
    };
    let token = generate_access_token(&identity, &expired).unwrap();

    let response = app.get_profile(Some(&format!("Bearer {}", token))).await;
    assert_eq!(403, response.status().as_u16());
}

#[tokio::test]
async fn profile_returns_user_without_password() {
    let app = spawn_app().await;
    let registered: Value = app.register("a@x.com", "secret").await.json().await.unwrap();
    let tokens: Value = app.login("a@x.com", "secret").await.json().await.unwrap();
    let access_token = tokens["accessToken"].as_str().unwrap();

    let response = app
        .get_profile(Some(&format!("Bearer {}", access_token)))
        .await;
    assert_eq!(200, response.status().as_u16());

    let profile: Value = response.json().await.unwrap();
    assert_eq!(profile["id"], registered["userId"]);
    assert_eq!(profile["email"], "a@x.com");
    assert_eq!(profile["firstName"], "A");
    assert_eq!(profile["lastName"], "B");
    assert!(profile.get("passwordHash").is_none());
    assert!(profile.get("password").is_none());
}

#[tokio::test]
async fn profile_returns_404_for_unknown_subject() {
    let app = spawn_app().await;

    let identity = Identity {
        id: 123,
        email: "ghost@x.com".to_string(),
    };
    let token = generate_access_token(&identity, &app.jwt).unwrap();

    let response = app.get_profile(Some(&format!("Bearer {}", token))).await;
    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn cors_preflight_is_answered() {
    let app = spawn_app().await;

    let response = app
        .client
        .request(reqwest::Method::OPTIONS, &format!("{}/auth/login", app.address))
        .header("Origin", "http://localhost:3000")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .send()
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());
    let allow_origin = response
        .headers()
        .get("access-control-allow-origin")
        .and_then(|v| v.to_str().ok());
    assert_eq!(allow_origin, Some("http://localhost:3000"));
    assert!(response.headers().contains_key("access-control-allow-methods"));
}

#[tokio::test]
async fn cors_headers_on_simple_requests() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(&format!("{}/auth/login", app.address))
        .header("Origin", "http://localhost:3000")
        .json(&json!({"email": "nobody@x.com", "password": "pw"}))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());
    assert!(response.headers().contains_key("access-control-allow-origin"));
}
