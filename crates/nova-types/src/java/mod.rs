//! Java-specific algorithms over the type model: erasure, substitution, supertype walks and
//! subtyping.
//!
//! Everything here is a pure function of a read-only [`crate::TypeEnv`], so callers may share one
//! store across threads and run these helpers concurrently.

pub mod erasure;
pub mod format;
pub mod helpers;
pub mod subst;
pub mod subtyping;
