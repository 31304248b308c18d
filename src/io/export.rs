use std::future::Future;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::{AppError, LedgerService};
use crate::domain::{Atm, Bank, Client, DATE_FORMAT, Page, TIME_FORMAT, Withdrawal};

/// Rows fetched per query while walking a table.
const EXPORT_BATCH: u32 = 500;

/// Database snapshot for full export
#[derive(Debug, Clone, Serialize)]
pub struct LedgerSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub banks: Vec<Bank>,
    pub atms: Vec<Atm>,
    pub clients: Vec<Client>,
    pub withdrawals: Vec<Withdrawal>,
}

/// Fetch every row by walking pages until a short page comes back.
async fn collect_all<T, F, Fut>(mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(Page) -> Fut,
    Fut: Future<Output = Result<Vec<T>, AppError>>,
{
    let mut page = Page::new(0, EXPORT_BATCH);
    let mut all = Vec::new();
    loop {
        let batch = fetch(page).await?;
        let done = batch.len() < page.limit as usize;
        all.extend(batch);
        if done {
            return Ok(all);
        }
        page = page.next();
    }
}

/// Exporter for dumping ledger tables to CSV or JSON
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    pub async fn all_banks(&self) -> Result<Vec<Bank>> {
        let service = self.service;
        collect_all(move |page| service.list_banks(page)).await
    }

    pub async fn all_atms(&self) -> Result<Vec<Atm>> {
        let service = self.service;
        collect_all(move |page| service.list_atms(page)).await
    }

    pub async fn all_clients(&self) -> Result<Vec<Client>> {
        let service = self.service;
        collect_all(move |page| service.list_clients(page)).await
    }

    pub async fn all_withdrawals(&self) -> Result<Vec<Withdrawal>> {
        let service = self.service;
        collect_all(move |page| service.list_withdrawals(page)).await
    }

    /// Export banks to CSV format
    pub async fn export_banks_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let banks = self.all_banks().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["id", "bank_code", "bank_name", "legal_address"])?;
        for bank in &banks {
            csv_writer.write_record([
                bank.id.to_string(),
                bank.bank_code.clone(),
                bank.bank_name.clone(),
                bank.legal_address.clone(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(banks.len())
    }

    /// Export ATMs to CSV format
    pub async fn export_atms_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let atms = self.all_atms().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["id", "atm_number", "atm_address", "bank_id"])?;
        for atm in &atms {
            csv_writer.write_record([
                atm.id.to_string(),
                atm.atm_number.clone(),
                atm.atm_address.clone(),
                atm.bank_id.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(atms.len())
    }

    /// Export clients to CSV format
    pub async fn export_clients_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let clients = self.all_clients().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["id", "card_number", "full_name", "address", "bank_id"])?;
        for client in &clients {
            csv_writer.write_record([
                client.id.to_string(),
                client.card_number.clone(),
                client.full_name.clone(),
                client.address.clone(),
                client.bank_id.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(clients.len())
    }

    /// Export withdrawals to CSV format. Missing dates and times are empty cells.
    pub async fn export_withdrawals_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let withdrawals = self.all_withdrawals().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "client_id",
            "atm_id",
            "date",
            "time",
            "commission",
            "amount",
        ])?;
        for w in &withdrawals {
            csv_writer.write_record([
                w.id.to_string(),
                w.client_id.to_string(),
                w.atm_id.to_string(),
                w.date
                    .map(|d| d.format(DATE_FORMAT).to_string())
                    .unwrap_or_default(),
                w.time
                    .map(|t| t.format(TIME_FORMAT).to_string())
                    .unwrap_or_default(),
                w.commission.to_string(),
                w.amount.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(withdrawals.len())
    }

    /// Export a single table as a pretty-printed JSON array.
    pub fn write_json<W: Write, T: Serialize>(mut writer: W, rows: &[T]) -> Result<usize> {
        let json = serde_json::to_string_pretty(rows)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;
        Ok(rows.len())
    }

    /// Export full database as JSON snapshot
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<LedgerSnapshot> {
        let snapshot = LedgerSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            banks: self.all_banks().await?,
            atms: self.all_atms().await?,
            clients: self.all_clients().await?,
            withdrawals: self.all_withdrawals().await?,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
