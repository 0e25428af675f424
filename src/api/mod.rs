/// HTTP API route handlers
pub mod account;
pub mod entries;
pub mod goals;
pub mod points;
pub mod prayers;
pub mod total;

use crate::context::AppContext;
use axum::Router;

/// Build all API routes under /api
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(account::routes())
        .merge(entries::routes())
        .merge(goals::routes())
        .merge(points::routes())
        .merge(prayers::routes())
        .merge(total::routes())
}
