use thiserror::Error;

use crate::models::{Category, StudentHandle};

/// Conditions raised by the eligibility engine itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EligibilityError {
    /// The requester is not on the course roster. No report should be posted.
    #[error("requester `{requester}` is not on the course roster")]
    UnknownRequester { requester: StudentHandle },

    /// A group entry that names no rostered student. Dropped, never fatal.
    #[error("group entry `{entry}` under {category} matches no rostered student")]
    MalformedGroupEntry { category: Category, entry: String },
}
