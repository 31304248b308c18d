//! Wire representations of ledger records.
//!
//! Request bodies and responses use camelCase field names. They are kept
//! separate from the persisted records in [`crate::domain`]; each body has an
//! explicit conversion into a domain type and each record converts into a
//! response.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Atm, AtmChanges, AtmId, Bank, BankChanges, BankId, Client, ClientChanges, ClientId, NewAtm,
    NewBank, NewClient, NewWithdrawal, Withdrawal,
};

use super::error::ValidationError;

// Maximum field widths, in characters.
const BANK_CODE_MAX: usize = 9;
const ATM_NUMBER_MAX: usize = 16;
const CARD_NUMBER_MAX: usize = 10;
const TEXT_MAX: usize = 100;

fn check_text(errors: &mut ValidationError, field: &str, value: &str, max: usize) {
    if value.trim().is_empty() {
        errors.push(field, "must not be blank");
    } else if value.chars().count() > max {
        errors.push(field, format!("must be at most {max} characters"));
    }
}

fn check_optional_text(
    errors: &mut ValidationError,
    field: &str,
    value: Option<&str>,
    max: usize,
) {
    if let Some(value) = value {
        check_text(errors, field, value, max);
    }
}

/// `{"message": ...}` acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// =============================================================================
// Bank
// =============================================================================

/// Body of `POST /banks/`. A client-supplied `id` is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankBody {
    pub bank_code: String,
    pub bank_name: String,
    pub legal_address: String,
}

impl BankBody {
    pub fn into_new_bank(self) -> Result<NewBank, ValidationError> {
        let mut errors = ValidationError::default();
        check_text(&mut errors, "bankCode", &self.bank_code, BANK_CODE_MAX);
        check_text(&mut errors, "bankName", &self.bank_name, TEXT_MAX);
        check_text(&mut errors, "legalAddress", &self.legal_address, TEXT_MAX);
        errors.into_result()?;

        Ok(NewBank::new(
            self.bank_code,
            self.bank_name,
            self.legal_address,
        ))
    }
}

/// Body of `PUT /banks/{id}`. Absent or null fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankChangesBody {
    #[serde(default)]
    pub bank_code: Option<String>,
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub legal_address: Option<String>,
}

impl BankChangesBody {
    pub fn into_changes(self) -> Result<BankChanges, ValidationError> {
        let mut errors = ValidationError::default();
        check_optional_text(&mut errors, "bankCode", self.bank_code.as_deref(), BANK_CODE_MAX);
        check_optional_text(&mut errors, "bankName", self.bank_name.as_deref(), TEXT_MAX);
        check_optional_text(
            &mut errors,
            "legalAddress",
            self.legal_address.as_deref(),
            TEXT_MAX,
        );
        errors.into_result()?;

        Ok(BankChanges {
            bank_code: self.bank_code,
            bank_name: self.bank_name,
            legal_address: self.legal_address,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankResponse {
    pub id: BankId,
    pub bank_code: String,
    pub bank_name: String,
    pub legal_address: String,
}

impl From<Bank> for BankResponse {
    fn from(bank: Bank) -> Self {
        Self {
            id: bank.id,
            bank_code: bank.bank_code,
            bank_name: bank.bank_name,
            legal_address: bank.legal_address,
        }
    }
}

// =============================================================================
// ATM
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtmBody {
    pub atm_number: String,
    pub atm_address: String,
    pub bank_id: BankId,
}

impl AtmBody {
    pub fn into_new_atm(self) -> Result<NewAtm, ValidationError> {
        let mut errors = ValidationError::default();
        check_text(&mut errors, "atmNumber", &self.atm_number, ATM_NUMBER_MAX);
        check_text(&mut errors, "atmAddress", &self.atm_address, TEXT_MAX);
        errors.into_result()?;

        Ok(NewAtm::new(self.atm_number, self.atm_address, self.bank_id))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtmChangesBody {
    #[serde(default)]
    pub atm_number: Option<String>,
    #[serde(default)]
    pub atm_address: Option<String>,
    #[serde(default)]
    pub bank_id: Option<BankId>,
}

impl AtmChangesBody {
    pub fn into_changes(self) -> Result<AtmChanges, ValidationError> {
        let mut errors = ValidationError::default();
        check_optional_text(
            &mut errors,
            "atmNumber",
            self.atm_number.as_deref(),
            ATM_NUMBER_MAX,
        );
        check_optional_text(&mut errors, "atmAddress", self.atm_address.as_deref(), TEXT_MAX);
        errors.into_result()?;

        Ok(AtmChanges {
            atm_number: self.atm_number,
            atm_address: self.atm_address,
            bank_id: self.bank_id,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtmResponse {
    pub id: AtmId,
    pub atm_number: String,
    pub atm_address: String,
    pub bank_id: BankId,
}

impl From<Atm> for AtmResponse {
    fn from(atm: Atm) -> Self {
        Self {
            id: atm.id,
            atm_number: atm.atm_number,
            atm_address: atm.atm_address,
            bank_id: atm.bank_id,
        }
    }
}

// =============================================================================
// Client
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientBody {
    pub card_number: String,
    pub full_name: String,
    pub address: String,
    pub bank_id: BankId,
}

impl ClientBody {
    pub fn into_new_client(self) -> Result<NewClient, ValidationError> {
        let mut errors = ValidationError::default();
        check_text(&mut errors, "cardNumber", &self.card_number, CARD_NUMBER_MAX);
        check_text(&mut errors, "fullName", &self.full_name, TEXT_MAX);
        check_text(&mut errors, "address", &self.address, TEXT_MAX);
        errors.into_result()?;

        Ok(NewClient::new(
            self.card_number,
            self.full_name,
            self.address,
            self.bank_id,
        ))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientChangesBody {
    #[serde(default)]
    pub card_number: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub bank_id: Option<BankId>,
}

impl ClientChangesBody {
    pub fn into_changes(self) -> Result<ClientChanges, ValidationError> {
        let mut errors = ValidationError::default();
        check_optional_text(
            &mut errors,
            "cardNumber",
            self.card_number.as_deref(),
            CARD_NUMBER_MAX,
        );
        check_optional_text(&mut errors, "fullName", self.full_name.as_deref(), TEXT_MAX);
        check_optional_text(&mut errors, "address", self.address.as_deref(), TEXT_MAX);
        errors.into_result()?;

        Ok(ClientChanges {
            card_number: self.card_number,
            full_name: self.full_name,
            address: self.address,
            bank_id: self.bank_id,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientResponse {
    pub id: ClientId,
    pub card_number: String,
    pub full_name: String,
    pub address: String,
    pub bank_id: BankId,
}

impl From<Client> for ClientResponse {
    fn from(client: Client) -> Self {
        Self {
            id: client.id,
            card_number: client.card_number,
            full_name: client.full_name,
            address: client.address,
            bank_id: client.bank_id,
        }
    }
}

// =============================================================================
// Withdrawal
// =============================================================================

/// Body of the withdrawal ("operation") endpoints.
///
/// `clientId` and `atmId` are optional on the wire because the attach
/// endpoints take one of them from the path instead.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalBody {
    #[serde(default)]
    pub client_id: Option<ClientId>,
    #[serde(default)]
    pub atm_id: Option<AtmId>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub time: Option<NaiveTime>,
    #[serde(default)]
    pub commission: bool,
    pub amount: i64,
}

impl WithdrawalBody {
    /// Build a new withdrawal. `client_id`/`atm_id`, when given, take
    /// precedence over the ids in the body.
    pub fn into_new_withdrawal(
        self,
        client_id: Option<ClientId>,
        atm_id: Option<AtmId>,
    ) -> Result<NewWithdrawal, ValidationError> {
        let mut errors = ValidationError::default();
        let client_id = client_id.or(self.client_id);
        let atm_id = atm_id.or(self.atm_id);
        if client_id.is_none() {
            errors.push("clientId", "is required");
        }
        if atm_id.is_none() {
            errors.push("atmId", "is required");
        }

        match (client_id, atm_id) {
            (Some(client_id), Some(atm_id)) => {
                let mut new = NewWithdrawal::new(client_id, atm_id, self.amount)
                    .with_commission(self.commission);
                if let Some(date) = self.date {
                    new = new.with_date(date);
                }
                if let Some(time) = self.time {
                    new = new.with_time(time);
                }
                Ok(new)
            }
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalResponse {
    pub id: i64,
    pub client_id: ClientId,
    pub atm_id: AtmId,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub commission: bool,
    pub amount: i64,
}

impl From<Withdrawal> for WithdrawalResponse {
    fn from(withdrawal: Withdrawal) -> Self {
        Self {
            id: withdrawal.id,
            client_id: withdrawal.client_id,
            atm_id: withdrawal.atm_id,
            date: withdrawal.date,
            time: withdrawal.time,
            commission: withdrawal.commission,
            amount: withdrawal.amount,
        }
    }
}
