//! Registration errors.

use thiserror::Error;

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors raised while populating a registry.
///
/// These are programming errors, not configuration errors: they come from
/// the set of compiled-in variants, never from user input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Duplicate {family} type '{tag}' (already registered by {existing}, again by {duplicate})")]
    DuplicateTag {
        family: String,
        tag: String,
        existing: String,
        duplicate: String,
    },

    #[error("Family '{family}' registered with two different model signatures")]
    FamilyMismatch { family: String },
}
