use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::core::TableRef;
use crate::frame::{BatchRows, EditedRows};
use crate::service::TabulaService;

use super::error::ApiError;
use super::types::{FilterRequest, RenderResponse, SelectTableRequest, TransitionResponse};

const CSV_MIME: &str = "text/csv";

pub async fn health() -> &'static str {
    "OK"
}

pub async fn list_schemas(
    State(service): State<Arc<TabulaService>>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(service.schemas().await?))
}

pub async fn list_tables(
    State(service): State<Arc<TabulaService>>,
    Path(schema): Path<String>,
) -> Result<Json<BTreeMap<String, TableRef>>, ApiError> {
    Ok(Json(service.tables(&schema).await?))
}

pub async fn render(
    State(service): State<Arc<TabulaService>>,
) -> Result<Json<RenderResponse>, ApiError> {
    let view = service.render().await?;
    let data = match &view.snapshot {
        Some(batch) => Some(BatchRows::try_from(batch).map(|BatchRows(v)| v)?),
        None => None,
    };
    Ok(Json(RenderResponse {
        phase: view.phase,
        generation: view.generation,
        binding_key: view.binding_key,
        table: view.table.map(|t| t.to_string()),
        filter: view.filter,
        data,
    }))
}

pub async fn select_table(
    State(service): State<Arc<TabulaService>>,
    Json(req): Json<SelectTableRequest>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let transition = service
        .select_table(TableRef::new(req.schema, req.name))
        .await?;
    Ok(Json(transition.into()))
}

pub async fn apply_filter(
    State(service): State<Arc<TabulaService>>,
    Json(req): Json<FilterRequest>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let transition = service.apply_filter(&req.text).await?;
    Ok(Json(transition.into()))
}

pub async fn clear_filter(
    State(service): State<Arc<TabulaService>>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let transition = service.clear_filter().await?;
    Ok(Json(transition.into()))
}

pub async fn rollback(
    State(service): State<Arc<TabulaService>>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let transition = service.rollback().await?;
    Ok(Json(transition.into()))
}

pub async fn commit(
    State(service): State<Arc<TabulaService>>,
    Json(edited): Json<EditedRows>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let transition = service.commit(edited).await?;
    Ok(Json(transition.into()))
}

pub async fn import(
    State(service): State<Arc<TabulaService>>,
    body: Bytes,
) -> Result<Json<TransitionResponse>, ApiError> {
    let transition = service.import_csv(&body).await?;
    Ok(Json(transition.into()))
}

pub async fn export(State(service): State<Arc<TabulaService>>) -> Result<Response, ApiError> {
    let (filename, bytes) = service.export_csv().await?;
    Ok((
        [
            (header::CONTENT_TYPE, CSV_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
