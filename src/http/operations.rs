//! `/api/operations` handlers. Every route sits behind the auth guard.

use axum::{extract::State, http::StatusCode, Json};

use crate::auth::Principal;
use crate::http::error::ApiError;
use crate::http::extract::{ApiJson, ApiQuery, IdParam};
use crate::http::server::AppState;
use crate::http::validation::{
    validate_list_query, validate_operation, CreateOperationBody, ListQuery,
};
use crate::ledger::{OperationPage, OperationView};

pub async fn create_operation(
    State(state): State<AppState>,
    principal: Principal,
    ApiJson(body): ApiJson<CreateOperationBody>,
) -> Result<(StatusCode, Json<OperationView>), ApiError> {
    let draft = validate_operation(body)?;
    let operation = state.ledger.create_operation(draft, principal.id).await?;
    Ok((StatusCode::CREATED, Json(operation)))
}

pub async fn list_operations(
    State(state): State<AppState>,
    principal: Principal,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<OperationPage>, ApiError> {
    let (page, limit) = validate_list_query(query)?;
    let page = state.ledger.list_operations(principal.id, page, limit).await?;
    Ok(Json(page))
}

pub async fn get_operation(
    State(state): State<AppState>,
    principal: Principal,
    IdParam(id): IdParam,
) -> Result<Json<OperationView>, ApiError> {
    let operation = state.ledger.get_operation(id, principal.id).await?;
    Ok(Json(operation))
}
