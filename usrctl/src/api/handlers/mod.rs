//! Route handlers.

pub mod profiles;
