use serde::{Deserialize, Serialize};

pub type BankId = i64;

/// A bank as persisted in the `banks` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    pub id: BankId,
    pub bank_code: String,
    pub bank_name: String,
    pub legal_address: String,
}

/// Fields of a bank that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBank {
    pub bank_code: String,
    pub bank_name: String,
    pub legal_address: String,
}

impl NewBank {
    pub fn new(
        bank_code: impl Into<String>,
        bank_name: impl Into<String>,
        legal_address: impl Into<String>,
    ) -> Self {
        Self {
            bank_code: bank_code.into(),
            bank_name: bank_name.into(),
            legal_address: legal_address.into(),
        }
    }
}

/// Partial update. `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankChanges {
    pub bank_code: Option<String>,
    pub bank_name: Option<String>,
    pub legal_address: Option<String>,
}

impl BankChanges {
    pub fn with_bank_code(mut self, bank_code: impl Into<String>) -> Self {
        self.bank_code = Some(bank_code.into());
        self
    }

    pub fn with_bank_name(mut self, bank_name: impl Into<String>) -> Self {
        self.bank_name = Some(bank_name.into());
        self
    }

    pub fn with_legal_address(mut self, legal_address: impl Into<String>) -> Self {
        self.legal_address = Some(legal_address.into());
        self
    }
}

impl Bank {
    pub fn from_new(id: BankId, new: NewBank) -> Self {
        Self {
            id,
            bank_code: new.bank_code,
            bank_name: new.bank_name,
            legal_address: new.legal_address,
        }
    }

    /// Overwrite every field present in `changes`.
    pub fn apply(&mut self, changes: BankChanges) {
        if let Some(bank_code) = changes.bank_code {
            self.bank_code = bank_code;
        }
        if let Some(bank_name) = changes.bank_name {
            self.bank_name = bank_name;
        }
        if let Some(legal_address) = changes.legal_address {
            self.legal_address = legal_address;
        }
    }
}
