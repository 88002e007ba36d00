//! Ownership primitives.
//!
//! The `owner` metadata entry is the only input to access decisions. Where a
//! context file sits on disk is never consulted here.

use crate::context::Context;

/// Metadata key holding the owning username.
pub const OWNER_KEY: &str = "owner";

/// Owner assigned to contexts that predate per-owner partitions.
pub const DEFAULT_LEGACY_OWNER: &str = "admin";

/// Owner recorded in the context's metadata.
pub fn owner_of(context: &Context) -> Option<&str> {
    context.owner()
}

/// Whether `requester` may see `context`.
///
/// Administrators see everything; everyone else only what they own.
pub fn is_visible(context: &Context, requester: &str, requester_is_admin: bool) -> bool {
    requester_is_admin || owner_of(context) == Some(requester)
}

/// Outcome of checking a persisted owner against a requested one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnershipDecision {
    Admit,
    /// The document belongs to someone else, or to no one.
    Mismatch { found: Option<String> },
}

/// Decides whether a document owned by `found` may be returned for `requested`.
///
/// With no requested owner (global view) everything is admitted. Otherwise
/// the recorded owner must match exactly. Ownerless documents predate
/// partitions and belong to `legacy_owner`.
pub fn check_owner(
    found: Option<&str>,
    requested: Option<&str>,
    legacy_owner: &str,
) -> OwnershipDecision {
    match (requested, found) {
        (None, _) => OwnershipDecision::Admit,
        (Some(requested), Some(found)) if found == requested => OwnershipDecision::Admit,
        (Some(requested), None) if requested == legacy_owner => OwnershipDecision::Admit,
        (Some(_), _) => OwnershipDecision::Mismatch {
            found: found.map(str::to_string),
        },
    }
}
