// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use atm_ledger::api::{self, AppState};
use atm_ledger::application::LedgerService;
use atm_ledger::domain::{Atm, Bank, Client, NewAtm, NewBank, NewClient};
use axum::Router;
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Helper to build the HTTP router over a fresh temporary database
pub async fn test_app() -> Result<(Router, TempDir)> {
    let (service, temp_dir) = test_service().await?;
    Ok((api::router(AppState::new(service)), temp_dir))
}

/// Test fixture: one bank with one ATM and one client
pub struct StandardLedger {
    pub bank: Bank,
    pub atm: Atm,
    pub client: Client,
}

impl StandardLedger {
    pub async fn create(service: &LedgerService) -> Result<Self> {
        let bank = create_bank(service, "044525225", "Sberbank").await?;
        let atm = create_atm(service, "ATM-0001", bank.id).await?;
        let client = create_client(service, "4276000001", bank.id).await?;
        Ok(Self { bank, atm, client })
    }
}

pub async fn create_bank(service: &LedgerService, code: &str, name: &str) -> Result<Bank> {
    Ok(service
        .create_bank(NewBank::new(code, name, "19 Vavilova St, Moscow"))
        .await?)
}

pub async fn create_atm(service: &LedgerService, number: &str, bank_id: i64) -> Result<Atm> {
    Ok(service
        .create_atm(NewAtm::new(number, "1 Tverskaya St", bank_id))
        .await?)
}

pub async fn create_client(service: &LedgerService, card: &str, bank_id: i64) -> Result<Client> {
    Ok(service
        .create_client(NewClient::new(card, "Ivan Petrov", "5 Arbat St", bank_id))
        .await?)
}

/// Helper to create a test service plus a second, independent pool on the same
/// database for changing it behind the service's back
pub async fn test_service_with_pool() -> Result<(LedgerService, SqlitePool, TempDir)> {
    let (service, temp_dir) = test_service().await?;
    let db_path = temp_dir.path().join("test.db");
    let pool = SqlitePool::connect(&format!("sqlite:{}", db_path.display())).await?;
    Ok((service, pool, temp_dir))
}
