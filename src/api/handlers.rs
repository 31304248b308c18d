use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde_json::{Value, json};

use crate::domain::{AtmId, BankId, ClientId, Page, WithdrawalId};

use super::AppState;
use super::dto::{
    AtmBody, AtmChangesBody, AtmResponse, BankBody, BankChangesBody, BankResponse, ClientBody,
    ClientChangesBody, ClientResponse, MessageResponse, WithdrawalBody, WithdrawalResponse,
};
use super::error::ApiErrorResponse;

type ApiResult<T> = Result<Json<T>, ApiErrorResponse>;
type Created<T> = Result<(StatusCode, Json<T>), ApiErrorResponse>;

fn list<T, R: From<T>>(items: Vec<T>) -> Json<Vec<R>> {
    Json(items.into_iter().map(R::from).collect())
}

/// GET /health
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// =============================================================================
// Banks
// =============================================================================

/// GET /banks/
pub async fn list_banks(
    State(state): State<AppState>,
    Query(page): Query<Page>,
) -> ApiResult<Vec<BankResponse>> {
    Ok(list(state.service.list_banks(page).await?))
}

/// POST /banks/
pub async fn create_bank(
    State(state): State<AppState>,
    Json(body): Json<BankBody>,
) -> Created<BankResponse> {
    let bank = state.service.create_bank(body.into_new_bank()?).await?;
    Ok((StatusCode::CREATED, Json(bank.into())))
}

/// GET /banks/{id}
pub async fn get_bank(
    State(state): State<AppState>,
    Path(id): Path<BankId>,
) -> ApiResult<BankResponse> {
    Ok(Json(state.service.get_bank(id).await?.into()))
}

/// PUT /banks/{id}
pub async fn update_bank(
    State(state): State<AppState>,
    Path(id): Path<BankId>,
    Json(body): Json<BankChangesBody>,
) -> ApiResult<BankResponse> {
    let bank = state.service.update_bank(id, body.into_changes()?).await?;
    Ok(Json(bank.into()))
}

/// DELETE /banks/{id}
pub async fn delete_bank(
    State(state): State<AppState>,
    Path(id): Path<BankId>,
) -> ApiResult<MessageResponse> {
    state.service.delete_bank(id).await?;
    Ok(Json(MessageResponse::new("Bank deleted")))
}

/// GET /banks/{id}/clients
pub async fn list_bank_clients(
    State(state): State<AppState>,
    Path(id): Path<BankId>,
    Query(page): Query<Page>,
) -> ApiResult<Vec<ClientResponse>> {
    Ok(list(state.service.list_clients_of_bank(id, page).await?))
}

/// GET /banks/{id}/atms
pub async fn list_bank_atms(
    State(state): State<AppState>,
    Path(id): Path<BankId>,
    Query(page): Query<Page>,
) -> ApiResult<Vec<AtmResponse>> {
    Ok(list(state.service.list_atms_of_bank(id, page).await?))
}

/// POST /banks/{id}/atms/{atm_number}
pub async fn attach_atm_to_bank(
    State(state): State<AppState>,
    Path((id, atm_number)): Path<(BankId, String)>,
) -> ApiResult<MessageResponse> {
    state.service.attach_atm_to_bank(id, &atm_number).await?;
    Ok(Json(MessageResponse::new("ATM added to bank")))
}

// =============================================================================
// ATMs
// =============================================================================

/// POST /atms/
pub async fn create_atm(
    State(state): State<AppState>,
    Json(body): Json<AtmBody>,
) -> Created<AtmResponse> {
    let atm = state.service.create_atm(body.into_new_atm()?).await?;
    Ok((StatusCode::CREATED, Json(atm.into())))
}

/// GET /atms/{id}
pub async fn get_atm(
    State(state): State<AppState>,
    Path(id): Path<AtmId>,
) -> ApiResult<AtmResponse> {
    Ok(Json(state.service.get_atm(id).await?.into()))
}

/// PUT /atms/{id}
pub async fn update_atm(
    State(state): State<AppState>,
    Path(id): Path<AtmId>,
    Json(body): Json<AtmChangesBody>,
) -> ApiResult<AtmResponse> {
    let atm = state.service.update_atm(id, body.into_changes()?).await?;
    Ok(Json(atm.into()))
}

/// DELETE /atms/{id}
pub async fn delete_atm(
    State(state): State<AppState>,
    Path(id): Path<AtmId>,
) -> ApiResult<MessageResponse> {
    state.service.delete_atm(id).await?;
    Ok(Json(MessageResponse::new("ATM deleted")))
}

/// GET /atms/number/{number}
pub async fn list_atms_by_number(
    State(state): State<AppState>,
    Path(number): Path<String>,
    Query(page): Query<Page>,
) -> ApiResult<Vec<AtmResponse>> {
    Ok(list(state.service.list_atms_by_number(&number, page).await?))
}

/// GET /atms/{id}/operations
pub async fn list_atm_operations(
    State(state): State<AppState>,
    Path(id): Path<AtmId>,
    Query(page): Query<Page>,
) -> ApiResult<Vec<WithdrawalResponse>> {
    Ok(list(state.service.list_withdrawals_by_atm(id, page).await?))
}

/// POST /atms/{id}/operations
pub async fn create_atm_operation(
    State(state): State<AppState>,
    Path(id): Path<AtmId>,
    Json(body): Json<WithdrawalBody>,
) -> Created<WithdrawalResponse> {
    let new = body.into_new_withdrawal(None, Some(id))?;
    let withdrawal = state.service.attach_withdrawal_to_atm(id, new).await?;
    Ok((StatusCode::CREATED, Json(withdrawal.into())))
}

// =============================================================================
// Clients
// =============================================================================

/// POST /clients/
pub async fn create_client(
    State(state): State<AppState>,
    Json(body): Json<ClientBody>,
) -> Created<ClientResponse> {
    let client = state.service.create_client(body.into_new_client()?).await?;
    Ok((StatusCode::CREATED, Json(client.into())))
}

/// GET /clients/{id}
pub async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<ClientId>,
) -> ApiResult<ClientResponse> {
    Ok(Json(state.service.get_client(id).await?.into()))
}

/// PUT /clients/{id}
pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<ClientId>,
    Json(body): Json<ClientChangesBody>,
) -> ApiResult<ClientResponse> {
    let client = state.service.update_client(id, body.into_changes()?).await?;
    Ok(Json(client.into()))
}

/// DELETE /clients/{id}
pub async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<ClientId>,
) -> ApiResult<MessageResponse> {
    state.service.delete_client(id).await?;
    Ok(Json(MessageResponse::new("Client deleted")))
}

/// GET /clients/card/{card_number}
pub async fn list_clients_by_card(
    State(state): State<AppState>,
    Path(card_number): Path<String>,
    Query(page): Query<Page>,
) -> ApiResult<Vec<ClientResponse>> {
    Ok(list(
        state.service.list_clients_by_card(&card_number, page).await?,
    ))
}

/// GET /clients/{id}/operations
pub async fn list_client_operations(
    State(state): State<AppState>,
    Path(id): Path<ClientId>,
    Query(page): Query<Page>,
) -> ApiResult<Vec<WithdrawalResponse>> {
    Ok(list(state.service.list_withdrawals_by_client(id, page).await?))
}

/// POST /clients/{id}/operations
pub async fn create_client_operation(
    State(state): State<AppState>,
    Path(id): Path<ClientId>,
    Json(body): Json<WithdrawalBody>,
) -> Created<WithdrawalResponse> {
    let new = body.into_new_withdrawal(Some(id), None)?;
    let withdrawal = state.service.attach_withdrawal_to_client(id, new).await?;
    Ok((StatusCode::CREATED, Json(withdrawal.into())))
}

// =============================================================================
// Operations (withdrawals)
// =============================================================================

/// POST /operations/
pub async fn create_operation(
    State(state): State<AppState>,
    Json(body): Json<WithdrawalBody>,
) -> Created<WithdrawalResponse> {
    let new = body.into_new_withdrawal(None, None)?;
    let withdrawal = state.service.create_withdrawal(new).await?;
    Ok((StatusCode::CREATED, Json(withdrawal.into())))
}

/// GET /operations/{id}
pub async fn get_operation(
    State(state): State<AppState>,
    Path(id): Path<WithdrawalId>,
) -> ApiResult<WithdrawalResponse> {
    Ok(Json(state.service.get_withdrawal(id).await?.into()))
}

/// DELETE /operations/{id}
pub async fn delete_operation(
    State(state): State<AppState>,
    Path(id): Path<WithdrawalId>,
) -> ApiResult<MessageResponse> {
    state.service.delete_withdrawal(id).await?;
    Ok(Json(MessageResponse::new("Operation deleted")))
}

/// GET /operations/commission
pub async fn list_commission_operations(
    State(state): State<AppState>,
    Query(page): Query<Page>,
) -> ApiResult<Vec<WithdrawalResponse>> {
    Ok(list(
        state.service.list_withdrawals_with_commission(page).await?,
    ))
}
