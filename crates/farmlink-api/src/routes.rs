use axum::{
    Json, Router, middleware,
    routing::{delete, get, patch, post, put},
};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::require_user;
use crate::state::AppState;
use crate::{auth, buyer_needs, contacts, messages, offers, rentals, tasks, users};

pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/api/auth/sync", post(auth::sync_user))
        .route("/api/users/{id}", get(users::get_user).put(users::update_user))
        .route("/api/users/{id}/toggle-save", put(users::toggle_saved_crop))
        .route("/api/rentals", get(rentals::list_rentals).post(rentals::create_rental))
        .route("/api/rentals/{id}", put(rentals::update_rental).delete(rentals::delete_rental))
        .route(
            "/api/buyer-needs",
            get(buyer_needs::list_buyer_needs).post(buyer_needs::create_buyer_need),
        )
        .route("/api/buyer-needs/{id}", delete(buyer_needs::delete_buyer_need));

    // Everything below needs a resolved caller.
    let protected_routes = Router::new()
        .route("/api/chat/contacts", get(contacts::list_contacts))
        .route("/api/chat/messages", post(messages::send_message))
        .route("/api/chat/messages/{contact_id}", get(messages::get_conversation))
        .route("/api/offers", get(offers::list_offers).post(offers::create_offer))
        .route("/api/offers/{id}/status", patch(offers::update_offer_status))
        .route("/api/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route("/api/tasks/{id}", put(tasks::update_task).delete(tasks::delete_task))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_user));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
