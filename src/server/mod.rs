//! HTTP surface: search, metabolomics, SQL gateway, health
//!
//! All state lives in one cloneable `AppState`; the stores are behind
//! `Arc` and internally synchronized, so handlers borrow them directly.

mod handlers;

use crate::pubmed::PubMedClient;
use crate::sqltool::SqlGateway;
use crate::storage::{MetaboStore, NetworkStore};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub network: Arc<NetworkStore>,
    pub metabo: Arc<MetaboStore>,
    pub pubmed: PubMedClient,
    pub sql: SqlGateway,
    pub started: Instant,
}

impl AppState {
    pub fn new(network: Arc<NetworkStore>, metabo: Arc<MetaboStore>) -> Self {
        Self {
            sql: SqlGateway::new(Arc::clone(&network)),
            network,
            metabo,
            pubmed: PubMedClient::new(),
            started: Instant::now(),
        }
    }

    /// Replace the PubMed client (tests point it at a mock server).
    pub fn with_pubmed(mut self, pubmed: PubMedClient) -> Self {
        self.pubmed = pubmed;
        self
    }
}

/// Build the full API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/search/interactions",
            get(handlers::search_interactions),
        )
        .route("/api/search/annotations", get(handlers::search_annotations))
        .route("/api/search/intercell", get(handlers::search_intercell))
        .route("/api/search/complexes", get(handlers::search_complexes))
        .route("/api/search/enzsub", get(handlers::search_enzsub))
        .route("/api/metabo/search", get(handlers::metabo_search))
        .route(
            "/api/metabo/autocomplete",
            get(handlers::metabo_autocomplete),
        )
        .route("/api/metabo/compound/{id}", get(handlers::metabo_compound))
        .route(
            "/api/metabo/compound/{id}/publications",
            get(handlers::metabo_publications),
        )
        .route("/api/sql", post(handlers::run_sql))
        .route("/api/schema", get(handlers::schema))
        .route("/api/health", get(handlers::health))
        .with_state(state)
}
