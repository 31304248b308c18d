use tracing::{debug, info};

use crate::domain::{
    Atm, AtmChanges, AtmId, Bank, BankChanges, BankId, Client, ClientChanges, ClientId, Entity,
    NewAtm, NewBank, NewClient, NewWithdrawal, Page, Withdrawal, WithdrawalId,
};
use crate::storage::Repository;

use super::AppError;

/// Application service providing the ledger operations.
/// This is the primary interface for any client (HTTP API, CLI, tests).
pub struct LedgerService {
    repo: Repository,
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Open (creating if needed) the database at the given path and ensure the schema exists.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Bank operations
    // ========================

    pub async fn get_bank(&self, id: BankId) -> Result<Bank, AppError> {
        debug!(bank_id = id, "Fetching bank");
        self.repo
            .get_bank(id)
            .await?
            .ok_or(AppError::NotFound(Entity::Bank))
    }

    pub async fn create_bank(&self, new: NewBank) -> Result<Bank, AppError> {
        let bank = self.repo.insert_bank(new).await?;
        info!(bank_id = bank.id, bank_code = %bank.bank_code, "Created bank");
        Ok(bank)
    }

    /// Overwrite the fields present in `changes`, keeping the rest.
    pub async fn update_bank(&self, id: BankId, changes: BankChanges) -> Result<Bank, AppError> {
        let mut bank = self.get_bank(id).await?;
        bank.apply(changes);
        self.repo.update_bank(&bank).await?;
        info!(bank_id = id, "Updated bank");
        Ok(bank)
    }

    /// Delete a bank that owns no ATMs and no clients.
    pub async fn delete_bank(&self, id: BankId) -> Result<(), AppError> {
        if let Some(dependent) = self.bank_dependent(id).await? {
            return Err(AppError::Conflict {
                entity: Entity::Bank,
                id,
                dependent,
            });
        }
        let deleted = match self.repo.delete_bank(id).await {
            Ok(deleted) => deleted,
            Err(err) if Repository::is_foreign_key_violation(&err) => {
                // A dependent appeared after the check above.
                let dependent = self.bank_dependent(id).await?.unwrap_or(Entity::Atm);
                return Err(AppError::Conflict {
                    entity: Entity::Bank,
                    id,
                    dependent,
                });
            }
            Err(err) => return Err(err.into()),
        };
        if !deleted {
            return Err(AppError::NotFound(Entity::Bank));
        }
        info!(bank_id = id, "Deleted bank");
        Ok(())
    }

    /// First kind of record still referencing the bank, if any.
    async fn bank_dependent(&self, id: BankId) -> Result<Option<Entity>, AppError> {
        if self.repo.count_atms_for_bank(id).await? > 0 {
            return Ok(Some(Entity::Atm));
        }
        if self.repo.count_clients_for_bank(id).await? > 0 {
            return Ok(Some(Entity::Client));
        }
        Ok(None)
    }

    pub async fn list_banks(&self, page: Page) -> Result<Vec<Bank>, AppError> {
        Ok(self.repo.list_banks(page).await?)
    }

    /// Clients of a bank. An unknown bank simply has no clients.
    pub async fn list_clients_of_bank(
        &self,
        bank_id: BankId,
        page: Page,
    ) -> Result<Vec<Client>, AppError> {
        Ok(self.repo.list_clients_for_bank(bank_id, page).await?)
    }

    pub async fn list_atms_of_bank(
        &self,
        bank_id: BankId,
        page: Page,
    ) -> Result<Vec<Atm>, AppError> {
        Ok(self.repo.list_atms_for_bank(bank_id, page).await?)
    }

    /// Reassign the first ATM carrying `atm_number` to the given bank.
    pub async fn attach_atm_to_bank(
        &self,
        bank_id: BankId,
        atm_number: &str,
    ) -> Result<Atm, AppError> {
        self.get_bank(bank_id).await?;
        let mut atm = self
            .repo
            .get_atm_by_number(atm_number)
            .await?
            .ok_or(AppError::NotFound(Entity::Atm))?;

        atm.bank_id = bank_id;
        self.repo
            .update_atm(&atm)
            .await
            .map_err(|err| missing_on_violation(err, Entity::Bank))?;
        info!(atm_id = atm.id, bank_id, "Attached ATM to bank");
        Ok(atm)
    }

    // ========================
    // ATM operations
    // ========================

    pub async fn get_atm(&self, id: AtmId) -> Result<Atm, AppError> {
        debug!(atm_id = id, "Fetching ATM");
        self.repo
            .get_atm(id)
            .await?
            .ok_or(AppError::NotFound(Entity::Atm))
    }

    pub async fn create_atm(&self, new: NewAtm) -> Result<Atm, AppError> {
        self.get_bank(new.bank_id).await?;
        let atm = self
            .repo
            .insert_atm(new)
            .await
            .map_err(|err| missing_on_violation(err, Entity::Bank))?;
        info!(atm_id = atm.id, bank_id = atm.bank_id, "Created ATM");
        Ok(atm)
    }

    pub async fn update_atm(&self, id: AtmId, changes: AtmChanges) -> Result<Atm, AppError> {
        let mut atm = self.get_atm(id).await?;
        if let Some(bank_id) = changes.bank_id {
            self.get_bank(bank_id).await?;
        }
        atm.apply(changes);
        self.repo
            .update_atm(&atm)
            .await
            .map_err(|err| missing_on_violation(err, Entity::Bank))?;
        info!(atm_id = id, "Updated ATM");
        Ok(atm)
    }

    /// Delete an ATM that has no recorded withdrawals.
    pub async fn delete_atm(&self, id: AtmId) -> Result<(), AppError> {
        if self.repo.count_withdrawals_for_atm(id).await? > 0 {
            return Err(AppError::Conflict {
                entity: Entity::Atm,
                id,
                dependent: Entity::Withdrawal,
            });
        }
        let deleted = self
            .repo
            .delete_atm(id)
            .await
            .map_err(|err| conflict_on_violation(err, Entity::Atm, id, Entity::Withdrawal))?;
        if !deleted {
            return Err(AppError::NotFound(Entity::Atm));
        }
        info!(atm_id = id, "Deleted ATM");
        Ok(())
    }

    pub async fn list_atms(&self, page: Page) -> Result<Vec<Atm>, AppError> {
        Ok(self.repo.list_atms(page).await?)
    }

    pub async fn list_atms_by_number(
        &self,
        atm_number: &str,
        page: Page,
    ) -> Result<Vec<Atm>, AppError> {
        Ok(self.repo.list_atms_by_number(atm_number, page).await?)
    }

    // ========================
    // Client operations
    // ========================

    pub async fn get_client(&self, id: ClientId) -> Result<Client, AppError> {
        debug!(client_id = id, "Fetching client");
        self.repo
            .get_client(id)
            .await?
            .ok_or(AppError::NotFound(Entity::Client))
    }

    pub async fn create_client(&self, new: NewClient) -> Result<Client, AppError> {
        self.get_bank(new.bank_id).await?;
        let client = self
            .repo
            .insert_client(new)
            .await
            .map_err(|err| missing_on_violation(err, Entity::Bank))?;
        info!(client_id = client.id, bank_id = client.bank_id, "Created client");
        Ok(client)
    }

    pub async fn update_client(
        &self,
        id: ClientId,
        changes: ClientChanges,
    ) -> Result<Client, AppError> {
        let mut client = self.get_client(id).await?;
        if let Some(bank_id) = changes.bank_id {
            self.get_bank(bank_id).await?;
        }
        client.apply(changes);
        self.repo
            .update_client(&client)
            .await
            .map_err(|err| missing_on_violation(err, Entity::Bank))?;
        info!(client_id = id, "Updated client");
        Ok(client)
    }

    /// Delete a client that has no recorded withdrawals.
    pub async fn delete_client(&self, id: ClientId) -> Result<(), AppError> {
        if self.repo.count_withdrawals_for_client(id).await? > 0 {
            return Err(AppError::Conflict {
                entity: Entity::Client,
                id,
                dependent: Entity::Withdrawal,
            });
        }
        let deleted = self
            .repo
            .delete_client(id)
            .await
            .map_err(|err| conflict_on_violation(err, Entity::Client, id, Entity::Withdrawal))?;
        if !deleted {
            return Err(AppError::NotFound(Entity::Client));
        }
        info!(client_id = id, "Deleted client");
        Ok(())
    }

    pub async fn list_clients(&self, page: Page) -> Result<Vec<Client>, AppError> {
        Ok(self.repo.list_clients(page).await?)
    }

    pub async fn list_clients_by_card(
        &self,
        card_number: &str,
        page: Page,
    ) -> Result<Vec<Client>, AppError> {
        Ok(self.repo.list_clients_by_card(card_number, page).await?)
    }

    // ========================
    // Withdrawal operations
    // ========================

    pub async fn get_withdrawal(&self, id: WithdrawalId) -> Result<Withdrawal, AppError> {
        debug!(withdrawal_id = id, "Fetching withdrawal");
        self.repo
            .get_withdrawal(id)
            .await?
            .ok_or(AppError::NotFound(Entity::Withdrawal))
    }

    /// Record a withdrawal. Both the client and the ATM must exist.
    pub async fn create_withdrawal(&self, new: NewWithdrawal) -> Result<Withdrawal, AppError> {
        if new.amount <= 0 {
            return Err(AppError::InvalidAmount(
                "Amount must be positive".to_string(),
            ));
        }
        let (client_id, atm_id) = (new.client_id, new.atm_id);
        self.get_client(client_id).await?;
        self.get_atm(atm_id).await?;

        let withdrawal = match self.repo.insert_withdrawal(new).await {
            Ok(withdrawal) => withdrawal,
            Err(err) if Repository::is_foreign_key_violation(&err) => {
                // Whichever parent vanished since the checks above reports NotFound.
                self.get_client(client_id).await?;
                self.get_atm(atm_id).await?;
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        };
        info!(
            withdrawal_id = withdrawal.id,
            client_id = withdrawal.client_id,
            atm_id = withdrawal.atm_id,
            amount = withdrawal.amount,
            "Recorded withdrawal"
        );
        Ok(withdrawal)
    }

    /// Record a withdrawal at `atm_id`, ignoring any ATM the payload names.
    pub async fn attach_withdrawal_to_atm(
        &self,
        atm_id: AtmId,
        new: NewWithdrawal,
    ) -> Result<Withdrawal, AppError> {
        self.create_withdrawal(new.at_atm(atm_id)).await
    }

    /// Record a withdrawal for `client_id`, ignoring any client the payload names.
    pub async fn attach_withdrawal_to_client(
        &self,
        client_id: ClientId,
        new: NewWithdrawal,
    ) -> Result<Withdrawal, AppError> {
        self.create_withdrawal(new.for_client(client_id)).await
    }

    pub async fn delete_withdrawal(&self, id: WithdrawalId) -> Result<(), AppError> {
        if !self.repo.delete_withdrawal(id).await? {
            return Err(AppError::NotFound(Entity::Withdrawal));
        }
        info!(withdrawal_id = id, "Deleted withdrawal");
        Ok(())
    }

    pub async fn list_withdrawals(&self, page: Page) -> Result<Vec<Withdrawal>, AppError> {
        Ok(self.repo.list_withdrawals(page).await?)
    }

    pub async fn list_withdrawals_by_atm(
        &self,
        atm_id: AtmId,
        page: Page,
    ) -> Result<Vec<Withdrawal>, AppError> {
        Ok(self.repo.list_withdrawals_for_atm(atm_id, page).await?)
    }

    pub async fn list_withdrawals_by_client(
        &self,
        client_id: ClientId,
        page: Page,
    ) -> Result<Vec<Withdrawal>, AppError> {
        Ok(self.repo.list_withdrawals_for_client(client_id, page).await?)
    }

    pub async fn list_withdrawals_with_commission(
        &self,
        page: Page,
    ) -> Result<Vec<Withdrawal>, AppError> {
        Ok(self.repo.list_withdrawals_with_commission(page).await?)
    }
}

/// A write rejected by a foreign key means the referenced `parent` is gone.
fn missing_on_violation(err: anyhow::Error, parent: Entity) -> AppError {
    if Repository::is_foreign_key_violation(&err) {
        AppError::NotFound(parent)
    } else {
        AppError::Database(err)
    }
}

/// A delete rejected by a foreign key means `dependent` rows still point at it.
fn conflict_on_violation(
    err: anyhow::Error,
    entity: Entity,
    id: i64,
    dependent: Entity,
) -> AppError {
    if Repository::is_foreign_key_violation(&err) {
        AppError::Conflict {
            entity,
            id,
            dependent,
        }
    } else {
        AppError::Database(err)
    }
}
