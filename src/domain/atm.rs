use serde::{Deserialize, Serialize};

use super::BankId;

pub type AtmId = i64;

/// An ATM as persisted in the `atms` table. Always owned by a bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Atm {
    pub id: AtmId,
    pub atm_number: String,
    pub atm_address: String,
    pub bank_id: BankId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAtm {
    pub atm_number: String,
    pub atm_address: String,
    pub bank_id: BankId,
}

impl NewAtm {
    pub fn new(
        atm_number: impl Into<String>,
        atm_address: impl Into<String>,
        bank_id: BankId,
    ) -> Self {
        Self {
            atm_number: atm_number.into(),
            atm_address: atm_address.into(),
            bank_id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtmChanges {
    pub atm_number: Option<String>,
    pub atm_address: Option<String>,
    pub bank_id: Option<BankId>,
}

impl AtmChanges {
    pub fn with_atm_address(mut self, atm_address: impl Into<String>) -> Self {
        self.atm_address = Some(atm_address.into());
        self
    }

    pub fn with_bank_id(mut self, bank_id: BankId) -> Self {
        self.bank_id = Some(bank_id);
        self
    }
}

impl Atm {
    pub fn from_new(id: AtmId, new: NewAtm) -> Self {
        Self {
            id,
            atm_number: new.atm_number,
            atm_address: new.atm_address,
            bank_id: new.bank_id,
        }
    }

    pub fn apply(&mut self, changes: AtmChanges) {
        if let Some(atm_number) = changes.atm_number {
            self.atm_number = atm_number;
        }
        if let Some(atm_address) = changes.atm_address {
            self.atm_address = atm_address;
        }
        if let Some(bank_id) = changes.bank_id {
            self.bank_id = bank_id;
        }
    }
}
