use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use crate::domain::{
    Atm, AtmId, Bank, BankId, Client, ClientId, DATE_FORMAT, Entity, NewAtm, NewBank, NewClient,
    NewWithdrawal, Page, TIME_FORMAT, Withdrawal, WithdrawalId,
};

use super::MIGRATION_001_INITIAL;

const SELECT_BANK: &str = "SELECT id, bank_code, bank_name, legal_address FROM banks";
const SELECT_ATM: &str = "SELECT id, atm_number, atm_address, bank_id FROM atms";
const SELECT_CLIENT: &str = "SELECT id, card_number, full_name, address, bank_id FROM clients";
const SELECT_WITHDRAWAL: &str =
    "SELECT id, client_id, atm_id, date, time, commission, amount FROM cash_withdrawals";

/// Repository for persisting and querying banks, ATMs, clients and withdrawals.
///
/// Every method checks a connection out of the pool for the duration of its
/// statements. Writes are single statements and commit on their own.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database URL with foreign keys enforced.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .context("Invalid database URL")?
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Create the schema. Safe to run against an existing database.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Count rows of `entity` whose `column` references `id`.
    async fn count_references(&self, entity: Entity, column: &str, id: i64) -> Result<i64> {
        let table = entity.table();
        let sql = format!("SELECT COUNT(*) as count FROM {table} WHERE {column} = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to count {table} by {column}"))?;
        Ok(row.get("count"))
    }

    async fn delete_by_id(&self, entity: Entity, id: i64) -> Result<bool> {
        let table = entity.table();
        let sql = format!("DELETE FROM {table} WHERE id = ?");
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete from {table}"))?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether a write failed on a foreign key constraint.
    pub fn is_foreign_key_violation(error: &anyhow::Error) -> bool {
        error
            .downcast_ref::<sqlx::Error>()
            .and_then(sqlx::Error::as_database_error)
            .is_some_and(|db| db.is_foreign_key_violation())
    }

    // ========================
    // Bank operations
    // ========================

    /// Insert a bank and return it with its assigned id.
    pub async fn insert_bank(&self, new: NewBank) -> Result<Bank> {
        let row = sqlx::query(
            r#"
            INSERT INTO banks (bank_code, bank_name, legal_address)
            VALUES (?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&new.bank_code)
        .bind(&new.bank_name)
        .bind(&new.legal_address)
        .fetch_one(&self.pool)
        .await
        .context("Failed to save bank")?;

        Ok(Bank::from_new(row.get("id"), new))
    }

    /// Get a bank by ID.
    pub async fn get_bank(&self, id: BankId) -> Result<Option<Bank>> {
        let row = sqlx::query(&format!("{SELECT_BANK} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch bank")?;

        row.as_ref().map(Self::row_to_bank).transpose()
    }

    /// List banks in insertion order.
    pub async fn list_banks(&self, page: Page) -> Result<Vec<Bank>> {
        let rows = sqlx::query(&format!("{SELECT_BANK} ORDER BY id LIMIT ? OFFSET ?"))
            .bind(i64::from(page.limit))
            .bind(i64::from(page.skip))
            .fetch_all(&self.pool)
            .await
            .context("Failed to list banks")?;

        rows.iter().map(Self::row_to_bank).collect()
    }

    /// Overwrite every column of a stored bank.
    pub async fn update_bank(&self, bank: &Bank) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE banks
            SET bank_code = ?, bank_name = ?, legal_address = ?
            WHERE id = ?
            "#,
        )
        .bind(&bank.bank_code)
        .bind(&bank.bank_name)
        .bind(&bank.legal_address)
        .bind(bank.id)
        .execute(&self.pool)
        .await
        .context("Failed to update bank")?;
        Ok(())
    }

    /// Delete a bank. Returns false if no row had that id.
    pub async fn delete_bank(&self, id: BankId) -> Result<bool> {
        self.delete_by_id(Entity::Bank, id).await
    }

    pub async fn count_atms_for_bank(&self, bank_id: BankId) -> Result<i64> {
        self.count_references(Entity::Atm, "bank_id", bank_id).await
    }

    pub async fn count_clients_for_bank(&self, bank_id: BankId) -> Result<i64> {
        self.count_references(Entity::Client, "bank_id", bank_id).await
    }

    fn row_to_bank(row: &SqliteRow) -> Result<Bank> {
        Ok(Bank {
            id: row.try_get("id")?,
            bank_code: row.try_get("bank_code")?,
            bank_name: row.try_get("bank_name")?,
            legal_address: row.try_get("legal_address")?,
        })
    }

    // ========================
    // ATM operations
    // ========================

    pub async fn insert_atm(&self, new: NewAtm) -> Result<Atm> {
        let row = sqlx::query(
            r#"
            INSERT INTO atms (atm_number, atm_address, bank_id)
            VALUES (?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&new.atm_number)
        .bind(&new.atm_address)
        .bind(new.bank_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to save ATM")?;

        Ok(Atm::from_new(row.get("id"), new))
    }

    pub async fn get_atm(&self, id: AtmId) -> Result<Option<Atm>> {
        let row = sqlx::query(&format!("{SELECT_ATM} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch ATM")?;

        row.as_ref().map(Self::row_to_atm).transpose()
    }

    /// First ATM (lowest id) carrying the given number.
    pub async fn get_atm_by_number(&self, atm_number: &str) -> Result<Option<Atm>> {
        let row = sqlx::query(&format!("{SELECT_ATM} WHERE atm_number = ? ORDER BY id LIMIT 1"))
            .bind(atm_number)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch ATM by number")?;

        row.as_ref().map(Self::row_to_atm).transpose()
    }

    pub async fn list_atms(&self, page: Page) -> Result<Vec<Atm>> {
        let rows = sqlx::query(&format!("{SELECT_ATM} ORDER BY id LIMIT ? OFFSET ?"))
            .bind(i64::from(page.limit))
            .bind(i64::from(page.skip))
            .fetch_all(&self.pool)
            .await
            .context("Failed to list ATMs")?;

        rows.iter().map(Self::row_to_atm).collect()
    }

    pub async fn list_atms_by_number(&self, atm_number: &str, page: Page) -> Result<Vec<Atm>> {
        let rows = sqlx::query(&format!(
            "{SELECT_ATM} WHERE atm_number = ? ORDER BY id LIMIT ? OFFSET ?"
        ))
        .bind(atm_number)
        .bind(i64::from(page.limit))
        .bind(i64::from(page.skip))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list ATMs by number")?;

        rows.iter().map(Self::row_to_atm).collect()
    }

    pub async fn list_atms_for_bank(&self, bank_id: BankId, page: Page) -> Result<Vec<Atm>> {
        let rows = sqlx::query(&format!(
            "{SELECT_ATM} WHERE bank_id = ? ORDER BY id LIMIT ? OFFSET ?"
        ))
        .bind(bank_id)
        .bind(i64::from(page.limit))
        .bind(i64::from(page.skip))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list ATMs for bank")?;

        rows.iter().map(Self::row_to_atm).collect()
    }

    pub async fn update_atm(&self, atm: &Atm) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE atms
            SET atm_number = ?, atm_address = ?, bank_id = ?
            WHERE id = ?
            "#,
        )
        .bind(&atm.atm_number)
        .bind(&atm.atm_address)
        .bind(atm.bank_id)
        .bind(atm.id)
        .execute(&self.pool)
        .await
        .context("Failed to update ATM")?;
        Ok(())
    }

    pub async fn delete_atm(&self, id: AtmId) -> Result<bool> {
        self.delete_by_id(Entity::Atm, id).await
    }

    pub async fn count_withdrawals_for_atm(&self, atm_id: AtmId) -> Result<i64> {
        self.count_references(Entity::Withdrawal, "atm_id", atm_id)
            .await
    }

    fn row_to_atm(row: &SqliteRow) -> Result<Atm> {
        Ok(Atm {
            id: row.try_get("id")?,
            atm_number: row.try_get("atm_number")?,
            atm_address: row.try_get("atm_address")?,
            bank_id: row.try_get("bank_id")?,
        })
    }

    // ========================
    // Client operations
    // ========================

    pub async fn insert_client(&self, new: NewClient) -> Result<Client> {
        let row = sqlx::query(
            r#"
            INSERT INTO clients (card_number, full_name, address, bank_id)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&new.card_number)
        .bind(&new.full_name)
        .bind(&new.address)
        .bind(new.bank_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to save client")?;

        Ok(Client::from_new(row.get("id"), new))
    }

    pub async fn get_client(&self, id: ClientId) -> Result<Option<Client>> {
        let row = sqlx::query(&format!("{SELECT_CLIENT} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch client")?;

        row.as_ref().map(Self::row_to_client).transpose()
    }

    pub async fn list_clients(&self, page: Page) -> Result<Vec<Client>> {
        let rows = sqlx::query(&format!("{SELECT_CLIENT} ORDER BY id LIMIT ? OFFSET ?"))
            .bind(i64::from(page.limit))
            .bind(i64::from(page.skip))
            .fetch_all(&self.pool)
            .await
            .context("Failed to list clients")?;

        rows.iter().map(Self::row_to_client).collect()
    }

    pub async fn list_clients_for_bank(&self, bank_id: BankId, page: Page) -> Result<Vec<Client>> {
        let rows = sqlx::query(&format!(
            "{SELECT_CLIENT} WHERE bank_id = ? ORDER BY id LIMIT ? OFFSET ?"
        ))
        .bind(bank_id)
        .bind(i64::from(page.limit))
        .bind(i64::from(page.skip))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list clients for bank")?;

        rows.iter().map(Self::row_to_client).collect()
    }

    pub async fn list_clients_by_card(&self, card_number: &str, page: Page) -> Result<Vec<Client>> {
        let rows = sqlx::query(&format!(
            "{SELECT_CLIENT} WHERE card_number = ? ORDER BY id LIMIT ? OFFSET ?"
        ))
        .bind(card_number)
        .bind(i64::from(page.limit))
        .bind(i64::from(page.skip))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list clients by card number")?;

        rows.iter().map(Self::row_to_client).collect()
    }

    pub async fn update_client(&self, client: &Client) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE clients
            SET card_number = ?, full_name = ?, address = ?, bank_id = ?
            WHERE id = ?
            "#,
        )
        .bind(&client.card_number)
        .bind(&client.full_name)
        .bind(&client.address)
        .bind(client.bank_id)
        .bind(client.id)
        .execute(&self.pool)
        .await
        .context("Failed to update client")?;
        Ok(())
    }

    pub async fn delete_client(&self, id: ClientId) -> Result<bool> {
        self.delete_by_id(Entity::Client, id).await
    }

    pub async fn count_withdrawals_for_client(&self, client_id: ClientId) -> Result<i64> {
        self.count_references(Entity::Withdrawal, "client_id", client_id)
            .await
    }

    fn row_to_client(row: &SqliteRow) -> Result<Client> {
        Ok(Client {
            id: row.try_get("id")?,
            card_number: row.try_get("card_number")?,
            full_name: row.try_get("full_name")?,
            address: row.try_get("address")?,
            bank_id: row.try_get("bank_id")?,
        })
    }

    // ========================
    // Withdrawal operations
    // ========================

    pub async fn insert_withdrawal(&self, new: NewWithdrawal) -> Result<Withdrawal> {
        let row = sqlx::query(
            r#"
            INSERT INTO cash_withdrawals (client_id, atm_id, date, time, commission, amount)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(new.client_id)
        .bind(new.atm_id)
        .bind(new.date.map(|d| d.format(DATE_FORMAT).to_string()))
        .bind(new.time.map(|t| t.format(TIME_FORMAT).to_string()))
        .bind(new.commission)
        .bind(new.amount)
        .fetch_one(&self.pool)
        .await
        .context("Failed to save withdrawal")?;

        Ok(Withdrawal::from_new(row.get("id"), new))
    }

    pub async fn get_withdrawal(&self, id: WithdrawalId) -> Result<Option<Withdrawal>> {
        let row = sqlx::query(&format!("{SELECT_WITHDRAWAL} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch withdrawal")?;

        row.as_ref().map(Self::row_to_withdrawal).transpose()
    }

    pub async fn list_withdrawals(&self, page: Page) -> Result<Vec<Withdrawal>> {
        let rows = sqlx::query(&format!("{SELECT_WITHDRAWAL} ORDER BY id LIMIT ? OFFSET ?"))
            .bind(i64::from(page.limit))
            .bind(i64::from(page.skip))
            .fetch_all(&self.pool)
            .await
            .context("Failed to list withdrawals")?;

        rows.iter().map(Self::row_to_withdrawal).collect()
    }

    pub async fn list_withdrawals_for_atm(
        &self,
        atm_id: AtmId,
        page: Page,
    ) -> Result<Vec<Withdrawal>> {
        let rows = sqlx::query(&format!(
            "{SELECT_WITHDRAWAL} WHERE atm_id = ? ORDER BY id LIMIT ? OFFSET ?"
        ))
        .bind(atm_id)
        .bind(i64::from(page.limit))
        .bind(i64::from(page.skip))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list withdrawals for ATM")?;

        rows.iter().map(Self::row_to_withdrawal).collect()
    }

    pub async fn list_withdrawals_for_client(
        &self,
        client_id: ClientId,
        page: Page,
    ) -> Result<Vec<Withdrawal>> {
        let rows = sqlx::query(&format!(
            "{SELECT_WITHDRAWAL} WHERE client_id = ? ORDER BY id LIMIT ? OFFSET ?"
        ))
        .bind(client_id)
        .bind(i64::from(page.limit))
        .bind(i64::from(page.skip))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list withdrawals for client")?;

        rows.iter().map(Self::row_to_withdrawal).collect()
    }

    /// Withdrawals on which a commission was charged.
    pub async fn list_withdrawals_with_commission(&self, page: Page) -> Result<Vec<Withdrawal>> {
        let rows = sqlx::query(&format!(
            "{SELECT_WITHDRAWAL} WHERE commission != 0 ORDER BY id LIMIT ? OFFSET ?"
        ))
        .bind(i64::from(page.limit))
        .bind(i64::from(page.skip))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list withdrawals with commission")?;

        rows.iter().map(Self::row_to_withdrawal).collect()
    }

    pub async fn delete_withdrawal(&self, id: WithdrawalId) -> Result<bool> {
        self.delete_by_id(Entity::Withdrawal, id).await
    }

    fn row_to_withdrawal(row: &SqliteRow) -> Result<Withdrawal> {
        let date_str: Option<String> = row.try_get("date")?;
        let time_str: Option<String> = row.try_get("time")?;

        Ok(Withdrawal {
            id: row.try_get("id")?,
            client_id: row.try_get("client_id")?,
            atm_id: row.try_get("atm_id")?,
            date: date_str
                .map(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT))
                .transpose()
                .context("Invalid withdrawal date")?,
            time: time_str
                .map(|s| NaiveTime::parse_from_str(&s, TIME_FORMAT))
                .transpose()
                .context("Invalid withdrawal time")?,
            commission: row.try_get::<i64, _>("commission")? != 0,
            amount: row.try_get("amount")?,
        })
    }
}
