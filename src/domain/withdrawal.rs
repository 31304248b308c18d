use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::{AtmId, ClientId};

pub type WithdrawalId = i64;

/// Amount of cash handed out, in whole currency units.
pub type Amount = i64;

/// Storage format for `Withdrawal::date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Storage format for `Withdrawal::time`. Fractional seconds are written only
/// when present, so whole-second times stay `HH:MM:SS`.
pub const TIME_FORMAT: &str = "%H:%M:%S%.f";

/// A cash withdrawal made by a client at an ATM.
/// Stored in `cash_withdrawals`; called an "operation" on the HTTP surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: WithdrawalId,
    pub client_id: ClientId,
    pub atm_id: AtmId,
    /// Calendar day of the withdrawal, if recorded
    pub date: Option<NaiveDate>,
    /// Time of day of the withdrawal, if recorded
    pub time: Option<NaiveTime>,
    /// Whether a commission was charged
    pub commission: bool,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWithdrawal {
    pub client_id: ClientId,
    pub atm_id: AtmId,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub commission: bool,
    pub amount: Amount,
}

impl NewWithdrawal {
    pub fn new(client_id: ClientId, atm_id: AtmId, amount: Amount) -> Self {
        Self {
            client_id,
            atm_id,
            date: None,
            time: None,
            commission: false,
            amount,
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_time(mut self, time: NaiveTime) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_commission(mut self, commission: bool) -> Self {
        self.commission = commission;
        self
    }

    /// Rebind to another ATM, replacing whatever the caller supplied.
    pub fn at_atm(mut self, atm_id: AtmId) -> Self {
        self.atm_id = atm_id;
        self
    }

    /// Rebind to another client, replacing whatever the caller supplied.
    pub fn for_client(mut self, client_id: ClientId) -> Self {
        self.client_id = client_id;
        self
    }
}

impl Withdrawal {
    pub fn from_new(id: WithdrawalId, new: NewWithdrawal) -> Self {
        Self {
            id,
            client_id: new.client_id,
            atm_id: new.atm_id,
            date: new.date,
            time: new.time,
            commission: new.commission,
            amount: new.amount,
        }
    }
}
