//! HTTP API layer.
//!
//! - [`handlers`]: Axum route handlers for the `/api/v1/profiles` endpoints
//! - [`models`]: Request and response types, validation, and pagination
//!
//! Handlers validate input, convert it into database requests, and map [`crate::errors::Error`]
//! onto HTTP responses.

pub mod handlers;
pub mod models;
