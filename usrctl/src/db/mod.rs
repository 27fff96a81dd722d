//! Database layer for data persistence and access.
//!
//! This module implements the data access layer using SQLx with PostgreSQL.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - transactions & queries)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - records and sparse field sets)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`handlers`]: Repository implementations
//! - [`models`]: Database request/response records
//! - [`field_set`]: Sparse column assignments and their SQL encoding
//! - [`errors`]: Database-specific error types
//!
//! # Identifiers
//!
//! Tables are keyed by a `SERIAL` surrogate key used for joins and foreign keys. Callers
//! only ever see the UUID external id generated at creation time; repositories translate
//! between the two.

pub mod errors;
pub mod field_set;
pub mod handlers;
pub mod models;
