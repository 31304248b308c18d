mod common;

use anyhow::Result;
use atm_ledger::Repository;
use atm_ledger::application::AppError;
use atm_ledger::domain::{Entity, NewAtm, NewBank, NewClient, NewWithdrawal};
use common::{StandardLedger, create_bank, test_service_with_pool};
use tempfile::TempDir;

// The triggers below make the competing change inside the write statement
// itself, after the service's existence checks have already passed.

#[tokio::test]
async fn test_bank_removed_before_atm_insert_reports_not_found() -> Result<()> {
    let (service, pool, _temp) = test_service_with_pool().await?;
    let bank = create_bank(&service, "044525225", "Sberbank").await?;

    sqlx::query(
        "CREATE TRIGGER drop_bank BEFORE INSERT ON atms
         BEGIN DELETE FROM banks WHERE id = NEW.bank_id; END",
    )
    .execute(&pool)
    .await?;

    let err = service
        .create_atm(NewAtm::new("ATM-0001", "1 Tverskaya St", bank.id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(Entity::Bank)), "{err}");

    Ok(())
}

#[tokio::test]
async fn test_bank_removed_before_client_insert_reports_not_found() -> Result<()> {
    let (service, pool, _temp) = test_service_with_pool().await?;
    let bank = create_bank(&service, "044525225", "Sberbank").await?;

    sqlx::query(
        "CREATE TRIGGER drop_bank BEFORE INSERT ON clients
         BEGIN DELETE FROM banks WHERE id = NEW.bank_id; END",
    )
    .execute(&pool)
    .await?;

    let err = service
        .create_client(NewClient::new("4276000001", "Ivan Petrov", "5 Arbat St", bank.id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(Entity::Bank)), "{err}");

    Ok(())
}

#[tokio::test]
async fn test_withdrawal_recorded_during_atm_delete_reports_conflict() -> Result<()> {
    let (service, pool, _temp) = test_service_with_pool().await?;
    let ledger = StandardLedger::create(&service).await?;

    sqlx::query(
        "CREATE TRIGGER late_withdrawal BEFORE DELETE ON atms
         BEGIN
             INSERT INTO cash_withdrawals (client_id, atm_id, amount)
             VALUES ((SELECT MIN(id) FROM clients), OLD.id, 100);
         END",
    )
    .execute(&pool)
    .await?;

    let err = service.delete_atm(ledger.atm.id).await.unwrap_err();
    assert!(
        matches!(
            err,
            AppError::Conflict {
                entity: Entity::Atm,
                dependent: Entity::Withdrawal,
                ..
            }
        ),
        "{err}"
    );
    assert_eq!(service.get_atm(ledger.atm.id).await?, ledger.atm);

    Ok(())
}

#[tokio::test]
async fn test_client_added_during_bank_delete_reports_conflict() -> Result<()> {
    let (service, pool, _temp) = test_service_with_pool().await?;
    let bank = service
        .create_bank(NewBank::new("044525225", "Sberbank", "19 Vavilova St"))
        .await?;

    sqlx::query(
        "CREATE TRIGGER late_client BEFORE DELETE ON banks
         BEGIN
             INSERT INTO clients (card_number, full_name, address, bank_id)
             VALUES ('4276000001', 'Ivan Petrov', '5 Arbat St', OLD.id);
         END",
    )
    .execute(&pool)
    .await?;

    let err = service.delete_bank(bank.id).await.unwrap_err();
    assert!(
        matches!(
            err,
            AppError::Conflict {
                entity: Entity::Bank,
                ..
            }
        ),
        "{err}"
    );
    assert_eq!(service.get_bank(bank.id).await?, bank);

    Ok(())
}

#[tokio::test]
async fn test_repository_flags_foreign_key_failures() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let url = format!("sqlite:{}?mode=rwc", temp_dir.path().join("repo.db").display());
    let repo = Repository::init(&url).await?;

    let err = repo
        .insert_withdrawal(NewWithdrawal::new(1, 1, 100))
        .await
        .unwrap_err();
    assert!(Repository::is_foreign_key_violation(&err));

    let not_a_constraint = anyhow::anyhow!("connection lost");
    assert!(!Repository::is_foreign_key_violation(&not_a_constraint));

    Ok(())
}
