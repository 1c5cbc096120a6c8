pub mod auth;
pub mod buyer_needs;
pub mod contacts;
pub mod error;
pub mod extract;
pub mod messages;
pub mod middleware;
pub mod offers;
pub mod rentals;
pub mod routes;
pub mod state;
pub mod tasks;
pub mod users;

pub use error::ApiError;
pub use routes::build_router;
pub use state::{AppState, AppStateInner};
