//! Catalog stores: the operations the HTTP layer calls.
//!
//! Each public store operation runs inside exactly one unit of work. The
//! operation body works against `&mut dyn UnitOfWork`; [`finish`] then commits
//! on success or rolls back on failure, so a failed operation never leaves a
//! partial write behind.

mod category;
mod product;

#[cfg(test)]
pub(crate) mod testing;

pub use category::CategoryStore;
pub use product::ProductStore;

use warehouse_core::{DomainError, DomainResult, StorageError};

use crate::db::UnitOfWork;

/// Commit `uow` when `result` is `Ok`, roll it back otherwise.
///
/// A rollback failure is logged and the original error is returned.
pub(crate) async fn finish<T>(uow: Box<dyn UnitOfWork>, result: DomainResult<T>) -> DomainResult<T> {
    match result {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback().await {
                tracing::warn!(error = %rollback_err, cause = %err, "rollback failed");
            }
            Err(err)
        }
    }
}

/// Unique violations become `Conflict`; everything else passes through.
pub(crate) fn unique_as_conflict(err: StorageError, message: impl FnOnce() -> String) -> DomainError {
    if err.is_unique_violation() {
        DomainError::conflict(message())
    } else {
        DomainError::Storage(err)
    }
}

/// Foreign key violations become `Validation`; everything else passes through.
pub(crate) fn reference_as_validation(err: StorageError, message: impl FnOnce() -> String) -> DomainError {
    if err.is_foreign_key_violation() {
        DomainError::validation(message())
    } else {
        DomainError::Storage(err)
    }
}
