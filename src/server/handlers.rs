//! Request handlers
//!
//! Search handlers share one code path: resolve the query, run the
//! dataset, wrap the rows. Failures are logged server-side and surface
//! as a generic per-dataset error so internals never leak to clients.

use super::AppState;
use crate::export::to_tsv;
use crate::model::CompoundLiterature;
use crate::query::{
    query_dataset, resolve_identifiers, Dataset, DatasetRows, MatchMode, DEFAULT_SPECIES,
};
use crate::sqltool::SqlToolResponse;
use crate::storage::MetaboFilters;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

/// Minimum query length before autocomplete touches the database.
const AUTOCOMPLETE_MIN_CHARS: usize = 2;
const AUTOCOMPLETE_LIMIT: usize = 10;
const METABO_DEFAULT_LIMIT: usize = 20;
const SIMILARITY_DEFAULT_THRESHOLD: f64 = 0.7;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    q: String,
    species: Option<String>,
    #[serde(rename = "match")]
    match_mode: Option<String>,
    format: Option<String>,
}

impl SearchParams {
    fn species(&self) -> &str {
        self.species.as_deref().unwrap_or(DEFAULT_SPECIES)
    }

    fn match_mode(&self) -> MatchMode {
        match self.match_mode.as_deref() {
            Some("exact") => MatchMode::Exact,
            Some("prefix") => MatchMode::Prefix,
            _ => MatchMode::Bidirectional,
        }
    }

    fn wants_tsv(&self) -> bool {
        self.format.as_deref() == Some("tsv")
    }
}

pub async fn search_interactions(
    state: State<AppState>,
    params: Query<SearchParams>,
) -> Response {
    search_dataset(state, params, Dataset::Interactions).await
}

pub async fn search_annotations(
    state: State<AppState>,
    params: Query<SearchParams>,
) -> Response {
    search_dataset(state, params, Dataset::Annotations).await
}

pub async fn search_intercell(
    state: State<AppState>,
    params: Query<SearchParams>,
) -> Response {
    search_dataset(state, params, Dataset::Intercell).await
}

pub async fn search_complexes(
    state: State<AppState>,
    params: Query<SearchParams>,
) -> Response {
    search_dataset(state, params, Dataset::Complexes).await
}

pub async fn search_enzsub(
    state: State<AppState>,
    params: Query<SearchParams>,
) -> Response {
    search_dataset(state, params, Dataset::EnzSub).await
}

async fn search_dataset(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
    dataset: Dataset,
) -> Response {
    let query = params.q.trim();
    if query.is_empty() {
        return dataset_response(empty_rows(dataset), params.wants_tsv());
    }

    let resolved = match resolve_identifiers(
        state.network.as_ref(),
        query,
        params.species(),
        params.match_mode(),
    )
    .await
    {
        Ok(resolved) => resolved,
        Err(err) => {
            tracing::error!(%dataset, error = %err, "identifier resolution failed");
            return dataset_error(dataset);
        }
    };

    match query_dataset(&state.network, dataset, &resolved) {
        Ok(rows) => dataset_response(rows, params.wants_tsv()),
        Err(err) => {
            tracing::error!(%dataset, error = %err, "dataset query failed");
            dataset_error(dataset)
        }
    }
}

fn empty_rows(dataset: Dataset) -> DatasetRows {
    match dataset {
        Dataset::Interactions => DatasetRows::Interactions(Vec::new()),
        Dataset::Annotations => DatasetRows::Annotations(Vec::new()),
        Dataset::Intercell => DatasetRows::Intercell(Vec::new()),
        Dataset::Complexes => DatasetRows::Complexes(Vec::new()),
        Dataset::EnzSub => DatasetRows::EnzSub(Vec::new()),
    }
}

fn dataset_response(rows: DatasetRows, tsv: bool) -> Response {
    if !tsv {
        return Json(rows).into_response();
    }
    let exported = match &rows {
        DatasetRows::Interactions(rows) => to_tsv(rows),
        DatasetRows::Annotations(rows) => to_tsv(rows),
        DatasetRows::Intercell(rows) => to_tsv(rows),
        DatasetRows::Complexes(rows) => to_tsv(rows),
        DatasetRows::EnzSub(rows) => to_tsv(rows),
    };
    match exported {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/tab-separated-values")],
            body,
        )
            .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "tsv export failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to export results" })),
            )
                .into_response()
        }
    }
}

fn dataset_error(dataset: Dataset) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": format!("Failed to fetch {dataset} data") })),
    )
        .into_response()
}

// ── Metabolomics ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaboSearchParams {
    #[serde(default)]
    q: String,
    canonical_id: Option<String>,
    mode: Option<String>,
    threshold: Option<f64>,
    limit: Option<usize>,
    offset: Option<usize>,
    mol_weight_min: Option<f64>,
    mol_weight_max: Option<f64>,
    logp_min: Option<f64>,
    logp_max: Option<f64>,
    is_drug: Option<bool>,
    is_lipid: Option<bool>,
    is_metabolite: Option<bool>,
    #[serde(default)]
    lipinski_compliant: bool,
}

impl MetaboSearchParams {
    fn filters(&self) -> MetaboFilters {
        MetaboFilters {
            molecular_weight_min: self.mol_weight_min,
            molecular_weight_max: self.mol_weight_max,
            logp_min: self.logp_min,
            logp_max: self.logp_max,
            is_drug: self.is_drug,
            is_lipid: self.is_lipid,
            is_metabolite: self.is_metabolite,
            lipinski_compliant: self.lipinski_compliant,
        }
    }
}

/// Responds with a bare compound array in every mode; a blank query is an
/// empty 200 array. `canonicalId` short-circuits to a direct detail
/// lookup (the autocomplete selection path).
pub async fn metabo_search(
    State(state): State<AppState>,
    Query(params): Query<MetaboSearchParams>,
) -> Response {
    if let Some(id) = params.canonical_id.as_deref() {
        return match state.metabo.compound_detail(id) {
            Ok(Some(detail)) => Json(json!([detail])).into_response(),
            Ok(None) => Json(json!([])).into_response(),
            Err(err) => {
                tracing::error!(error = %err, compound = %id, "compound lookup failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to fetch compound data" })),
                )
                    .into_response()
            }
        };
    }

    let query = params.q.trim();
    if query.is_empty() {
        return Json(json!([])).into_response();
    }
    let filters = params.filters();
    let limit = params.limit.unwrap_or(METABO_DEFAULT_LIMIT);
    let offset = params.offset.unwrap_or(0);

    let result = match params.mode.as_deref().unwrap_or("text") {
        "substructure" => state
            .metabo
            .search_substructure(query, limit, offset, &filters)
            .map(|rows| json!(rows)),
        "similarity" => {
            let threshold = params.threshold.unwrap_or(SIMILARITY_DEFAULT_THRESHOLD);
            state
                .metabo
                .search_similarity(query, threshold, limit, offset, &filters)
                .map(|rows| json!(rows))
        }
        _ => state
            .metabo
            .search_text(query, limit, &filters)
            .map(|rows| json!(rows)),
    };

    match result {
        Ok(body) => Json(body).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "compound search failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch compound data" })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AutocompleteParams {
    #[serde(default)]
    q: String,
    limit: Option<usize>,
}

pub async fn metabo_autocomplete(
    State(state): State<AppState>,
    Query(params): Query<AutocompleteParams>,
) -> Response {
    let query = params.q.trim();
    if query.chars().count() < AUTOCOMPLETE_MIN_CHARS {
        return Json(json!([])).into_response();
    }
    let limit = params.limit.unwrap_or(AUTOCOMPLETE_LIMIT);
    match state.metabo.autocomplete(query, limit) {
        Ok(suggestions) => Json(suggestions).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "autocomplete failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch suggestions" })),
            )
                .into_response()
        }
    }
}

pub async fn metabo_compound(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.metabo.compound_detail(&id) {
        Ok(Some(detail)) => Json(detail).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Compound not found" })),
        )
            .into_response(),
        Err(err) => {
            tracing::error!(error = %err, compound = %id, "compound lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch compound data" })),
            )
                .into_response()
        }
    }
}

/// PMIDs always come from the local database; the ESummary enrichment is
/// best effort and degrades to an empty publication list.
pub async fn metabo_publications(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let pubmed_ids = match state.metabo.compound_publications(&id) {
        Ok(ids) => ids,
        Err(err) => {
            tracing::error!(error = %err, compound = %id, "publication lookup failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch publication data" })),
            )
                .into_response();
        }
    };

    let publications = match state.pubmed.fetch_summaries(&pubmed_ids).await {
        Ok(publications) => publications,
        Err(err) => {
            tracing::warn!(error = %err, compound = %id, "esummary fetch failed");
            Vec::new()
        }
    };

    Json(CompoundLiterature {
        pubmed_ids,
        publications,
    })
    .into_response()
}

// ── SQL gateway ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlRequest {
    sql_query: String,
}

pub async fn run_sql(
    State(state): State<AppState>,
    Json(request): Json<SqlRequest>,
) -> Response {
    match state.sql.run(&request.sql_query) {
        response @ SqlToolResponse::Success { .. } => Json(response).into_response(),
        response @ SqlToolResponse::Failure { .. } => {
            (StatusCode::BAD_REQUEST, Json(response)).into_response()
        }
    }
}

pub async fn schema(State(state): State<AppState>) -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.sql.schema_description(),
    )
        .into_response()
}

pub async fn health(State(state): State<AppState>) -> Response {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptimeSecs": state.started.elapsed().as_secs(),
    }))
    .into_response()
}
