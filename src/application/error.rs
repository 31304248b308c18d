use thiserror::Error;

use crate::domain::Entity;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(Entity),

    #[error("{entity} {id} still has {dependent} records")]
    Conflict {
        entity: Entity,
        id: i64,
        dependent: Entity,
    },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_entity() {
        assert_eq!(
            AppError::NotFound(Entity::Client).to_string(),
            "Client not found"
        );
        assert_eq!(AppError::NotFound(Entity::Atm).to_string(), "ATM not found");
    }

    #[test]
    fn test_conflict_message() {
        let err = AppError::Conflict {
            entity: Entity::Bank,
            id: 4,
            dependent: Entity::Client,
        };
        assert_eq!(err.to_string(), "Bank 4 still has Client records");
    }
}
