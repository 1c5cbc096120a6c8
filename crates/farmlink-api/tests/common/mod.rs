#![allow(dead_code)]

use std::net::SocketAddr;

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

use farmlink_api::middleware::IDENTITY_HEADER;
use farmlink_api::{AppState, AppStateInner, build_router};
use farmlink_db::Database;

/// A running server on an ephemeral port, backed by an in-memory database.
pub struct TestApp {
    pub state: AppState,
    addr: SocketAddr,
    client: reqwest::Client,
}

/// A synced user as the tests see it: internal id plus the identity header value.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub clerk_id: String,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let db = Database::open_in_memory().unwrap();
        let state = AppStateInner::new(db);
        let app = build_router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            state,
            addr,
            client: reqwest::Client::new(),
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        caller: Option<&TestUser>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = self
            .client
            .request(method, format!("http://{}{}", self.addr, uri));
        if let Some(user) = caller {
            req = req.header(IDENTITY_HEADER, user.clerk_id.as_str());
        }
        if let Some(json) = body {
            req = req.json(&json);
        }

        Self::read(req).await
    }

    /// Send `body` verbatim as a JSON request, for malformed-input cases.
    pub async fn post_raw(&self, uri: &str, caller: Option<&TestUser>, body: &str) -> (StatusCode, Value) {
        let mut req = self
            .client
            .post(format!("http://{}{}", self.addr, uri))
            .header("content-type", "application/json")
            .body(body.to_string());
        if let Some(user) = caller {
            req = req.header(IDENTITY_HEADER, user.clerk_id.as_str());
        }
        Self::read(req).await
    }

    /// Non-JSON bodies come back as a string so assertions on them fail
    /// with the body in the message.
    async fn read(req: reqwest::RequestBuilder) -> (StatusCode, Value) {
        let resp = req.send().await.unwrap();
        let status = resp.status();
        let bytes = resp.bytes().await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, caller: Option<&TestUser>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, caller, None).await
    }

    pub async fn post(&self, uri: &str, caller: Option<&TestUser>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, caller, Some(body)).await
    }

    /// Sign a user in through the sync endpoint.
    pub async fn sync(&self, name: &str, role: &str) -> TestUser {
        let clerk_id = format!("clerk_{}", name.to_lowercase());
        let (status, body) = self
            .post(
                "/api/auth/sync",
                None,
                json!({
                    "clerkId": clerk_id,
                    "email": format!("{}@farm.test", name.to_lowercase()),
                    "name": name,
                    "role": role,
                }),
            )
            .await;
        assert!(status.is_success(), "sync failed: {} {}", status, body);

        TestUser {
            id: body["user"]["id"].as_str().unwrap().parse().unwrap(),
            clerk_id,
        }
    }

    pub async fn offer(&self, caller: &TestUser, body: Value) -> Value {
        let (status, offer) = self.post("/api/offers", Some(caller), body).await;
        assert_eq!(status, StatusCode::CREATED, "offer failed: {}", offer);
        offer
    }

    pub async fn send(&self, from: &TestUser, to: &TestUser, content: &str) -> Value {
        let (status, message) = self
            .post(
                "/api/chat/messages",
                Some(from),
                json!({ "receiverId": to.id, "content": content }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "send failed: {}", message);
        message
    }

    pub async fn contacts(&self, caller: &TestUser) -> Vec<Value> {
        let (status, body) = self.get("/api/chat/contacts", Some(caller)).await;
        assert_eq!(status, StatusCode::OK, "contacts failed: {}", body);
        body.as_array().unwrap().clone()
    }
}

pub fn crop_offer(farmer: &TestUser, buyer: &TestUser) -> Value {
    json!({
        "offerType": "crop",
        "farmer": farmer.id,
        "buyer": buyer.id,
        "crop": Uuid::new_v4(),
        "pricePerUnit": 24.5,
        "quantityRequested": 100.0,
    })
}

pub fn service_offer(farmer: &TestUser, provider: &TestUser) -> Value {
    json!({
        "offerType": "service",
        "farmer": farmer.id,
        "provider": provider.id,
        "serviceRequest": Uuid::new_v4(),
        "bidAmount": "1200",
    })
}
