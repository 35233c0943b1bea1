use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{json, Value};

use lostfound_api::app::{build_app, services::AppServices};
use lostfound_auth::{Argon2Hasher, Argon2Params, JwtClaims, Role, TokenService};
use lostfound_core::UserId;
use lostfound_infra::{InMemoryStore, UserStore};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    store: Arc<InMemoryStore>,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory store, cheap hashing, ephemeral port.
        let store = Arc::new(InMemoryStore::new());
        let hasher = Argon2Hasher::with_params(Argon2Params::new(8, 1, 1, None).unwrap());
        let services = AppServices::new(
            store.clone(),
            TokenService::with_default_ttl(JWT_SECRET.as_bytes()),
            Arc::new(hasher),
        );
        let app = build_app(Arc::new(services));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            store,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register a student and return `(token, user id)`.
    async fn register(&self, email: &str) -> (String, String) {
        let res = self
            .client
            .post(self.url("/auth/register"))
            .json(&json!({ "email": email, "password": "password123", "name": "Test User" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        (
            body["token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    /// Change a stored account directly, leaving previously issued tokens as they are.
    async fn update_account(&self, email: &str, f: impl FnOnce(&mut lostfound_auth::UserAccount)) {
        let mut account = self.store.find_user_by_email(email).await.unwrap().unwrap();
        f(&mut account);
        self.store.update_user(&account).await.unwrap();
    }

    async fn report_found(&self, token: &str, title: &str) -> String {
        let res = self
            .client
            .post(self.url("/items/found"))
            .bearer_auth(token)
            .json(&json!({
                "title": title,
                "description": "black, cracked screen",
                "category": "electronics",
                "location": "Library, 2nd floor",
                "date": "2026-03-01",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        body["item"]["id"].as_str().unwrap().to_string()
    }

    async fn claim(&self, token: &str, item_id: &str) -> reqwest::Response {
        self.client
            .post(self.url("/claims"))
            .bearer_auth(token)
            .json(&json!({ "found_item_id": item_id, "details": "it has my sticker on it" }))
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(secret: &str, claims: &JwtClaims) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn error_code(res: reqwest::Response) -> String {
    let body: Value = res.json().await.unwrap();
    body["error"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_token_is_rejected() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/auth/me")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "missing_token");
}

#[tokio::test]
async fn expired_and_foreign_tokens_are_rejected() {
    let srv = TestServer::spawn().await;
    let now = Utc::now();
    let expired = JwtClaims {
        id: UserId::new(),
        email: "old@uni.edu".to_string(),
        role: Role::Student,
        iat: (now - ChronoDuration::days(8)).timestamp(),
        exp: (now - ChronoDuration::days(1)).timestamp(),
    };

    let res = srv
        .client
        .get(srv.url("/auth/me"))
        .bearer_auth(mint_jwt(JWT_SECRET, &expired))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "token_expired");

    let foreign = JwtClaims {
        exp: (now + ChronoDuration::hours(1)).timestamp(),
        ..expired
    };
    let res = srv
        .client
        .get(srv.url("/auth/me"))
        .bearer_auth(mint_jwt("some-other-secret", &foreign))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "token_bad_signature");
}

#[tokio::test]
async fn register_login_and_me() {
    let srv = TestServer::spawn().await;
    let (token, id) = srv.register("  Alice@Uni.EDU ").await;

    let res = srv.client.get(srv.url("/auth/me")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["user"]["id"], id.as_str());
    assert_eq!(body["user"]["email"], "alice@uni.edu");
    assert_eq!(body["user"]["role"], "student");
    assert!(body["user"].get("password_hash").is_none());

    let res = srv
        .client
        .post(srv.url("/auth/login"))
        .json(&json!({ "email": "alice@uni.edu", "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv
        .client
        .post(srv.url("/auth/login"))
        .json(&json!({ "email": "alice@uni.edu", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "invalid_credentials");
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let srv = TestServer::spawn().await;
    srv.register("bob@uni.edu").await;

    let res = srv
        .client
        .post(srv.url("/auth/register"))
        .json(&json!({ "email": "BOB@uni.edu", "password": "password123", "name": "Bob" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(error_code(res).await, "email_taken");
}

#[tokio::test]
async fn banned_account_cannot_log_in() {
    let srv = TestServer::spawn().await;
    srv.register("carol@uni.edu").await;
    srv.update_account("carol@uni.edu", |a| a.banned = true).await;

    let res = srv
        .client
        .post(srv.url("/auth/login"))
        .json(&json!({ "email": "carol@uni.edu", "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(res).await, "account_disabled");
}

#[tokio::test]
async fn banned_student_token_loses_access() {
    let srv = TestServer::spawn().await;
    let (owner, _) = srv.register("owner@uni.edu").await;
    let (token, _) = srv.register("dave@uni.edu").await;
    let item_id = srv.report_found(&owner, "Umbrella").await;
    srv.update_account("dave@uni.edu", |a| a.banned = true).await;

    let res = srv.client.get(srv.url("/auth/me")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(res).await, "account_disabled");

    let res = srv.claim(&token, &item_id).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(res).await, "account_disabled");

    let res = srv.client.post(srv.url("/auth/refresh")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_email_and_wrong_password_look_the_same() {
    let srv = TestServer::spawn().await;
    srv.register("erin@uni.edu").await;

    for email in ["erin@uni.edu", "nobody@uni.edu"] {
        let res = srv
            .client
            .post(srv.url("/auth/login"))
            .json(&json!({ "email": email, "password": "wrong-password" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(res).await, "invalid_credentials");
    }
}

#[tokio::test]
async fn claim_scenario_approve_then_late_claim() {
    let srv = TestServer::spawn().await;
    let (owner, _) = srv.register("owner@uni.edu").await;
    let (c1, _) = srv.register("c1@uni.edu").await;
    let (c2, _) = srv.register("c2@uni.edu").await;
    let item_id = srv.report_found(&owner, "Phone").await;

    let res = srv.claim(&c1, &item_id).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["claim"]["status"], "pending");
    let claim_id = body["claim"]["id"].as_str().unwrap().to_string();

    // Claimant cannot approve their own claim.
    let res = srv
        .client
        .patch(srv.url(&format!("/claims/{claim_id}")))
        .bearer_auth(&c1)
        .json(&json!({ "status": "approved" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .patch(srv.url(&format!("/claims/{claim_id}")))
        .bearer_auth(&owner)
        .json(&json!({ "status": "approved" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["claim"]["status"], "approved");

    let res = srv
        .client
        .get(srv.url(&format!("/items/found/{item_id}")))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["item"]["status"], "claimed");

    let res = srv.claim(&c2, &item_id).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "no_longer_available");

    // Approved claims cannot be withdrawn.
    let res = srv
        .client
        .delete(srv.url(&format!("/claims/{claim_id}")))
        .bearer_auth(&c1)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "claim_not_pending");

    let res = srv
        .client
        .patch(srv.url(&format!("/items/found/{item_id}/returned")))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["item"]["status"], "returned");
}

#[tokio::test]
async fn claim_validation_and_ownership_errors() {
    let srv = TestServer::spawn().await;
    let (owner, _) = srv.register("finder@uni.edu").await;
    let (other, _) = srv.register("other@uni.edu").await;
    let item_id = srv.report_found(&owner, "Umbrella").await;

    let res = srv.claim(&owner, &item_id).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "cannot_claim_own");

    let res = srv
        .client
        .post(srv.url("/claims"))
        .bearer_auth(&other)
        .json(&json!({ "details": "no item id" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv.claim(&other, &UserId::new().to_string()).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    assert_eq!(srv.claim(&other, &item_id).await.status(), StatusCode::CREATED);
    let res = srv.claim(&other, &item_id).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "already_claimed");

    // Only the reporter (or an admin) sees an item's claims.
    let res = srv
        .client
        .get(srv.url(&format!("/items/found/{item_id}/claims")))
        .bearer_auth(&other)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .get(srv.url(&format!("/items/found/{item_id}/claims")))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["claims"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn claim_listings_by_type() {
    let srv = TestServer::spawn().await;
    let (owner, _) = srv.register("lister@uni.edu").await;
    let (claimant, _) = srv.register("claimant@uni.edu").await;
    let item_id = srv.report_found(&owner, "Keys").await;
    assert_eq!(srv.claim(&claimant, &item_id).await.status(), StatusCode::CREATED);

    let list = |token: String, query: &'static str| {
        let req = srv.client.get(srv.url(&format!("/claims{query}"))).bearer_auth(token);
        async move { req.send().await.unwrap() }
    };

    let res = list(claimant.clone(), "").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["claims"].as_array().unwrap().len(), 1);

    let res = list(owner.clone(), "?type=received").await;
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["claims"].as_array().unwrap().len(), 1);

    let res = list(owner.clone(), "?type=made").await;
    let body: Value = res.json().await.unwrap();
    assert!(body["claims"].as_array().unwrap().is_empty());

    let res = list(owner, "?type=bogus").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn lost_item_lifecycle() {
    let srv = TestServer::spawn().await;
    let (owner, _) = srv.register("loser@uni.edu").await;
    let (stranger, _) = srv.register("stranger@uni.edu").await;

    let res = srv
        .client
        .post(srv.url("/items/lost"))
        .bearer_auth(&owner)
        .json(&json!({
            "title": "Blue backpack",
            "category": "bags",
            "location": "Gym",
            "date": "2026-02-14",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    let id = body["item"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["item"]["status"], "active");

    let res = srv
        .client
        .patch(srv.url(&format!("/items/lost/{id}/status")))
        .bearer_auth(&stranger)
        .json(&json!({ "status": "found" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .patch(srv.url(&format!("/items/lost/{id}/status")))
        .bearer_auth(&owner)
        .json(&json!({ "status": "found" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv.client.get(srv.url("/items/lost")).bearer_auth(&owner).send().await.unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["items"][0]["status"], "found");
}

#[tokio::test]
async fn found_item_filters() {
    let srv = TestServer::spawn().await;
    let (owner, _) = srv.register("filter@uni.edu").await;
    srv.report_found(&owner, "Laptop").await;

    let res = srv
        .client
        .get(srv.url("/items/found?status=available&category=electronics"))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let res = srv
        .client
        .get(srv.url("/items/found?status=lost-forever"))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_verify_requires_admin_context_role() {
    let srv = TestServer::spawn().await;
    let (student, _) = srv.register("student@uni.edu").await;

    let res = srv
        .client
        .get(srv.url("/admin/auth/verify"))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Stored role wins over the role in the (older) token.
    srv.update_account("student@uni.edu", |a| a.role = Role::Admin).await;
    let res = srv
        .client
        .get(srv.url("/admin/auth/verify"))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["user"]["role"], "admin");
    assert_eq!(body["permissions"][0], "*");
}

#[tokio::test]
async fn deactivated_admin_with_valid_token_is_forbidden() {
    let srv = TestServer::spawn().await;
    let (token, _) = srv.register("exadmin@uni.edu").await;
    srv.update_account("exadmin@uni.edu", |a| {
        a.role = Role::Admin;
        a.active = false;
    })
    .await;

    for path in ["/admin/auth/verify", "/admin/users"] {
        let res = srv.client.get(srv.url(path)).bearer_auth(&token).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN, "{path}");
        assert_eq!(error_code(res).await, "account_disabled");
    }
}

#[tokio::test]
async fn moderator_bans_but_cannot_change_roles() {
    let srv = TestServer::spawn().await;
    let (moderator, moderator_id) = srv.register("mod@uni.edu").await;
    let (_, target_id) = srv.register("target@uni.edu").await;
    srv.update_account("mod@uni.edu", |a| a.role = Role::Moderator).await;

    let res = srv
        .client
        .post(srv.url(&format!("/admin/users/{target_id}/ban")))
        .bearer_auth(&moderator)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["user"]["is_banned"], true);

    let res = srv
        .client
        .post(srv.url(&format!("/admin/users/{moderator_id}/ban")))
        .bearer_auth(&moderator)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "invariant_violation");

    let res = srv
        .client
        .patch(srv.url(&format!("/admin/users/{target_id}/role")))
        .bearer_auth(&moderator)
        .json(&json!({ "role": "admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_manages_users_and_reads_reports() {
    let srv = TestServer::spawn().await;
    let (admin, _) = srv.register("root@uni.edu").await;
    let (_, user_id) = srv.register("someone@uni.edu").await;
    srv.update_account("root@uni.edu", |a| a.role = Role::Admin).await;
    srv.report_found(&admin, "Wallet").await;

    let res = srv
        .client
        .patch(srv.url(&format!("/admin/users/{user_id}/role")))
        .bearer_auth(&admin)
        .json(&json!({ "role": "support_staff" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["user"]["role"], "support_staff");

    let res = srv
        .client
        .patch(srv.url(&format!("/admin/users/{user_id}/role")))
        .bearer_auth(&admin)
        .json(&json!({ "role": "overlord" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv
        .client
        .post(srv.url(&format!("/admin/users/{user_id}/deactivate")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["user"]["is_active"], false);

    let res = srv
        .client
        .get(srv.url("/admin/reports/summary"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["users"], 2);
    assert_eq!(body["found_items"]["total"], 1);
    assert_eq!(body["found_items"]["available"], 1);
    assert_eq!(body["claims"]["total"], 0);
}
