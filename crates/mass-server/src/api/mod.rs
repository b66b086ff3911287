//! API routes for the vessel server.

pub mod control;
pub mod gates;
pub mod handover;
mod routes;
pub mod vessel;
pub mod ws;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    routes::create_router()
}

#[cfg(test)]
mod tests;
