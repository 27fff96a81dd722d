//! Database record structures passed to and returned from the repositories.
//!
//! - [`profiles`]: profile + credential create/update requests and the joined profile row
//! - [`roles`]: role reference records

pub mod profiles;
pub mod roles;
