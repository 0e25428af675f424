/// Account management
pub mod manager;

pub use manager::AccountManager;

use serde::{Deserialize, Serialize};

/// Session info extracted from a validated access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedSession {
    pub user_id: String,
    pub session_id: String,
}

/// Outcome of looking up a stored security token
///
/// Verification and reset tokens share the same lifecycle; a single
/// lookup-and-validate returns one of these instead of scattering null and
/// date checks across call sites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenCheck<T> {
    /// Token matched and is still usable
    Valid(T),
    /// Token matched but its expiry has passed
    Expired,
    /// No stored token matches
    NotFound,
    /// Token matched but was already spent
    Consumed,
}
