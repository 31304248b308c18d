use std::fmt;

/// The four kinds of records the ledger stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Bank,
    Atm,
    Client,
    Withdrawal,
}

impl Entity {
    /// Human-readable name, as used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Bank => "Bank",
            Entity::Atm => "ATM",
            Entity::Client => "Client",
            Entity::Withdrawal => "Withdrawal",
        }
    }

    /// Backing table name.
    pub fn table(&self) -> &'static str {
        match self {
            Entity::Bank => "banks",
            Entity::Atm => "atms",
            Entity::Client => "clients",
            Entity::Withdrawal => "cash_withdrawals",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
