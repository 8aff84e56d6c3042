// Export route modules
pub mod assets;
pub mod health;
pub mod reply;

use crate::state::AppState;
use axum::Router;

// Function to configure all API routes
pub fn configure(state: AppState) -> Router {
    Router::new()
        .merge(reply::routes(state.clone()))
        .merge(health::routes(state))
}
