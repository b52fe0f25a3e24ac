//! Confirmation of destructive operations.
//!
//! Deletion never mutates anything until a [`ConfirmPolicy`] has approved
//! it. The policy is injected so the catalog stays testable without a
//! terminal; the interactive implementation wraps `dialoguer`.

use crate::error::CatalogError;

/// Outcome of a delete request. A refused confirmation is a normal outcome,
/// not an error, and leaves all state unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
}

/// Answers "may this destructive operation proceed?".
pub trait ConfirmPolicy {
    fn confirm(&self, prompt: &str) -> Result<bool, CatalogError>;
}

/// Interactive confirmation on the controlling terminal.
pub struct TerminalConfirm;

impl ConfirmPolicy for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> Result<bool, CatalogError> {
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| CatalogError::Config(format!("failed to get user input: {e}")))
    }
}

/// Approves everything. Used by `--force` and by tests.
pub struct Approve;

impl ConfirmPolicy for Approve {
    fn confirm(&self, _prompt: &str) -> Result<bool, CatalogError> {
        Ok(true)
    }
}

/// Refuses everything.
pub struct Deny;

impl ConfirmPolicy for Deny {
    fn confirm(&self, _prompt: &str) -> Result<bool, CatalogError> {
        Ok(false)
    }
}
