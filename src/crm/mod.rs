//! Estate CRM: customers, listings, brokers, visits and interaction tracking.
//!
//! ## Module Map
//!
//! ```text
//! ┌──────────┐   HTTP   ┌──────────────────────────────────────────────────┐
//! │  Client  │ ───────> │  server.rs  (axum Router, ServerConfig)          │
//! │   (UI)   │ <─────── │    └─ api/  (handlers per resource, AppState)    │
//! └──────────┘   JSON   │         │  ValidJson → payloads::Validate        │
//!                       │         │  ApiQuery  → filters::*Filter          │
//!                       │         v                                        │
//!                       │  db/  (CrmDb on SQLite, DbHandle)                │
//!                       │         │  validate::Checks on every write       │
//!                       │         │  estate_common::lifecycle for status   │
//!                       │         v                                        │
//!                       │  SQLite file (8 tables, foreign keys enforced)   │
//!                       └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Supporting Modules
//!
//! | Module      | Responsibility                                            |
//! |-------------|-----------------------------------------------------------|
//! | `models`    | Records and the joined views returned by the API          |
//! | `payloads`  | Create / patch / lifecycle request bodies                 |
//! | `filters`   | Query-string filters for the list endpoints               |
//! | `validate`  | Field checks shared by payloads and the storage layer     |
//! | `seed`      | Sample data set for demos                                 |
//!
//! ## Typical Request Flow (complete an interaction)
//!
//! 1. `PATCH /api/interactions/{id}/complete` → `api::interactions::complete()`
//! 2. The optional body is parsed into a `CompleteRequest` and validated.
//! 3. `DbHandle::call` moves the work onto the blocking pool, where
//!    `CrmDb::complete_interaction` checks the transition table, stamps
//!    `completedDate` and saves the row.
//! 4. An illegal transition surfaces as `CrmError::InvalidTransition`, which
//!    `ApiError` turns into a 409.

pub mod api;
pub mod db;
pub mod filters;
pub mod models;
pub mod payloads;
pub mod seed;
pub mod server;
pub mod validate;
