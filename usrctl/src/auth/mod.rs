//! Credential primitives.
//!
//! Session handling and token issuance live outside this service; this module only provides
//! the secret hashing used when credential rows are written and checked.
//!
//! # Modules
//!
//! - [`password`]: Argon2id hashing and verification

pub mod password;
