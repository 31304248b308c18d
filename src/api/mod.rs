//! HTTP surface of the ledger.
//!
//! Routes map one-to-one onto [`LedgerService`] operations. The service is
//! shared through axum state; every request checks a pooled connection out
//! for the duration of its handler.

pub mod dto;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::application::LedgerService;

use handlers::*;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LedgerService>,
}

impl AppState {
    pub fn new(service: LedgerService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        // Banks
        .route("/banks", get(list_banks).post(create_bank))
        .route("/banks/", get(list_banks).post(create_bank))
        .route(
            "/banks/{id}",
            get(get_bank).put(update_bank).delete(delete_bank),
        )
        .route("/banks/{id}/clients", get(list_bank_clients))
        .route("/banks/{id}/atms", get(list_bank_atms))
        .route("/banks/{id}/atms/{atm_number}", post(attach_atm_to_bank))
        // ATMs
        .route("/atms", post(create_atm))
        .route("/atms/", post(create_atm))
        .route("/atms/number/{number}", get(list_atms_by_number))
        .route(
            "/atms/{id}",
            get(get_atm).put(update_atm).delete(delete_atm),
        )
        .route(
            "/atms/{id}/operations",
            get(list_atm_operations).post(create_atm_operation),
        )
        // Clients
        .route("/clients", post(create_client))
        .route("/clients/", post(create_client))
        .route("/clients/card/{card_number}", get(list_clients_by_card))
        .route(
            "/clients/{id}",
            get(get_client).put(update_client).delete(delete_client),
        )
        .route(
            "/clients/{id}/operations",
            get(list_client_operations).post(create_client_operation),
        )
        // Withdrawals
        .route("/operations", post(create_operation))
        .route("/operations/", post(create_operation))
        .route("/operations/commission", get(list_commission_operations))
        .route(
            "/operations/{id}",
            get(get_operation).delete(delete_operation),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
