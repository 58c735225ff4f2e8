//! Handlers for the `/api/items` resource.

use axum::{
    extract::{rejection::JsonRejection, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use url::form_urlencoded;

use crate::{query::Filter, state::AppState, store::Document};

use super::error::{AppError, AppResult};

#[derive(Debug, Serialize)]
struct DocsResponse {
    message: &'static str,
    data: Vec<Document>,
}

#[derive(Debug, Serialize)]
struct DocResponse {
    message: &'static str,
    data: Document,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

fn query_pairs(query: Option<&str>) -> Vec<(String, String)> {
    form_urlencoded::parse(query.unwrap_or_default().as_bytes())
        .into_owned()
        .collect()
}

/// GET handler: translate the query params into a filter and list matches.
pub async fn get(State(state): State<AppState>, RawQuery(query): RawQuery) -> AppResult<Response> {
    let filter = Filter::from_query_pairs(query_pairs(query.as_deref()))?;
    let docs = state.store.find(&filter)?;
    Ok((
        StatusCode::OK,
        Json(DocsResponse {
            message: "GET request received",
            data: docs,
        }),
    )
        .into_response())
}

/// POST handler: insert a new item with a server-assigned id.
pub async fn post(
    State(state): State<AppState>,
    body: Result<Json<Document>, JsonRejection>,
) -> AppResult<Response> {
    let Json(doc) = body.map_err(|_| AppError::bad_request("Request body is required"))?;
    if doc.is_empty() {
        return Err(AppError::bad_request("Request body is required"));
    }
    let doc = state.store.insert(doc)?;
    Ok((
        StatusCode::CREATED,
        Json(DocResponse {
            message: "Item added successfully",
            data: doc,
        }),
    )
        .into_response())
}

/// PUT handler: merge the body fields into every item matching the query.
///
/// The query params are used as exact-match filters as-is; the
/// range/membership translation applies to GET only.
pub async fn put(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    body: Result<Json<Document>, JsonRejection>,
) -> AppResult<Response> {
    let Json(fields) =
        body.map_err(|_| AppError::bad_request("Request body is required for update"))?;
    if fields.is_empty() {
        return Err(AppError::bad_request("Request body is required for update"));
    }
    let filter = Filter::exact_from_pairs(query_pairs(query.as_deref()));
    let docs = state.store.update(&filter, &fields)?;
    Ok((
        StatusCode::OK,
        Json(DocsResponse {
            message: "Items updated successfully",
            data: docs,
        }),
    )
        .into_response())
}

/// DELETE handler: remove the item with the id given as a query param.
pub async fn delete(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> AppResult<Response> {
    let pairs = query_pairs(query.as_deref());
    let id = pairs
        .iter()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.clone())
        .ok_or_else(|| AppError::bad_request("Query parameter \"id\" is required"))?;
    let removed = state.store.remove(&Filter::exact("id", id.clone()))?;
    if removed == 0 {
        return Err(AppError::not_found("Item not found"));
    }
    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: format!("Item with id {id} deleted successfully"),
        }),
    )
        .into_response())
}
