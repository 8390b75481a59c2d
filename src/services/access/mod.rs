//! Path-based authorization: the primary role table and the supplemental role channel.
//!
//! Both produce a [`Decision`]; converting a denial into a response happens in the
//! middleware layer.

mod pattern;
mod rules;
mod supplemental;

pub use pattern::{PathPattern, PatternError};
pub use rules::{Access, AccessRules, Decision, Denial};
pub use supplemental::SupplementalRoles;
