//! Keeps the visible audience page consistent with the backend.
//!
//! The synchronizer owns the only writable page snapshot. Fetches are tagged
//! with a sequence number so that only the latest request may commit, and
//! every successful mutation funnels through one hook that re-fetches with
//! the current filter.

use std::fmt::{self, Display, Formatter};

use thiserror::Error;

use crate::forms::FormError;
use crate::gateway::GatewayError;

pub mod state;
pub mod synchronizer;

pub use state::{FetchTicket, ListState, PageSnapshot};
pub use synchronizer::{AudienceSynchronizer, DEFAULT_FETCH_TIMEOUT};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("invalid form: {0}")]
    Form(#[from] FormError),

    #[error("brand and agent must be selected first")]
    NoScope,

    #[error("cancelled by operator")]
    Cancelled,
}

pub type SyncResult<T> = Result<T, SyncError>;

impl SyncError {
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, SyncError::Gateway(err) if err.is_not_implemented())
    }
}

/// Asks the operator before a destructive call is issued.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Side effects after which the list must be re-fetched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mutation {
    Create,
    Delete,
    Unsubscribe,
    Import,
    MessageSent,
}

impl Display for Mutation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mutation::Create => "create customer",
            Mutation::Delete => "delete customer",
            Mutation::Unsubscribe => "unsubscribe customer",
            Mutation::Import => "import customers",
            Mutation::MessageSent => "send message",
        })
    }
}
