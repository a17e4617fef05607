#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use restaurant_catalog::{
    AppConfig, AppState, InMemoryRepository, ReorderPolicy, auth, create_router,
    models::{NewUser, Role, User},
    repository::{Repository, RepositoryState},
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// A router over a fresh in-memory store, plus direct access to that store
/// for seeding and for asserting on rows after a request.
pub struct TestApp {
    pub router: Router,
    pub repo: Arc<InMemoryRepository>,
    pub config: AppConfig,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn set_cookie(&self) -> Option<&str> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
    }

    pub fn error_message(&self) -> &str {
        self.body["errorMessage"].as_str().unwrap_or_default()
    }
}

pub fn test_app() -> TestApp {
    test_app_with(ReorderPolicy::Preserve)
}

pub fn test_app_with(policy: ReorderPolicy) -> TestApp {
    let config = AppConfig {
        reorder_policy: policy,
        ..AppConfig::default()
    };
    let repo = Arc::new(InMemoryRepository::new());
    let state = AppState {
        repo: repo.clone() as RepositoryState,
        config: config.clone(),
    };
    TestApp {
        router: create_router(state),
        repo,
        config,
    }
}

impl TestApp {
    /// Inserts an account directly, skipping password hashing.
    pub async fn seed_user(&self, nickname: &str, role: Role) -> User {
        self.repo
            .create_user(NewUser {
                nickname: nickname.to_string(),
                password: "not-a-real-hash".to_string(),
                role,
            })
            .await
            .unwrap()
    }

    /// `Cookie` header value carrying a valid session for `user`.
    pub fn cookie_for(&self, user: &User) -> String {
        let token = auth::issue_token(user.user_id, &self.config).unwrap();
        format!("{}=Bearer%20{}", auth::AUTH_COOKIE, token)
    }

    pub async fn owner_cookie(&self) -> String {
        let owner = self.seed_user("owner1", Role::Owner).await;
        self.cookie_for(&owner)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None, None).await
    }

    /// Creates a category through the API and returns its id.
    pub async fn create_category(&self, cookie: &str, name: &str) -> i64 {
        let res = self
            .request(
                Method::POST,
                "/api/categories",
                Some(cookie),
                Some(serde_json::json!({ "name": name })),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{:?}", res.body);

        let categories = self.repo.list_categories().await.unwrap();
        categories
            .into_iter()
            .find(|c| c.name == name)
            .map(|c| c.category_id)
            .unwrap()
    }

    /// Creates a menu through the API and returns its id.
    pub async fn create_menu(&self, cookie: &str, category_id: i64, name: &str, price: i32) -> i64 {
        let res = self
            .request(
                Method::POST,
                &format!("/api/categories/{category_id}/menus"),
                Some(cookie),
                Some(serde_json::json!({
                    "name": name,
                    "description": format!("{name} description"),
                    "image": format!("https://img.example/{name}.png"),
                    "price": price,
                })),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{:?}", res.body);

        let menus = self.repo.list_menus(category_id).await.unwrap();
        menus
            .into_iter()
            .find(|m| m.name == name)
            .map(|m| m.menu_id)
            .unwrap()
    }
}
