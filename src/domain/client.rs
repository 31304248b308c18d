use serde::{Deserialize, Serialize};

use super::BankId;

pub type ClientId = i64;

/// A card holder as persisted in the `clients` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub card_number: String,
    pub full_name: String,
    pub address: String,
    pub bank_id: BankId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClient {
    pub card_number: String,
    pub full_name: String,
    pub address: String,
    pub bank_id: BankId,
}

impl NewClient {
    pub fn new(
        card_number: impl Into<String>,
        full_name: impl Into<String>,
        address: impl Into<String>,
        bank_id: BankId,
    ) -> Self {
        Self {
            card_number: card_number.into(),
            full_name: full_name.into(),
            address: address.into(),
            bank_id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientChanges {
    pub card_number: Option<String>,
    pub full_name: Option<String>,
    pub address: Option<String>,
    pub bank_id: Option<BankId>,
}

impl ClientChanges {
    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

impl Client {
    pub fn from_new(id: ClientId, new: NewClient) -> Self {
        Self {
            id,
            card_number: new.card_number,
            full_name: new.full_name,
            address: new.address,
            bank_id: new.bank_id,
        }
    }

    pub fn apply(&mut self, changes: ClientChanges) {
        if let Some(card_number) = changes.card_number {
            self.card_number = card_number;
        }
        if let Some(full_name) = changes.full_name {
            self.full_name = full_name;
        }
        if let Some(address) = changes.address {
            self.address = address;
        }
        if let Some(bank_id) = changes.bank_id {
            self.bank_id = bank_id;
        }
    }
}
