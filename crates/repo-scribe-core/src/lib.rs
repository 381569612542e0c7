//! # Repo Scribe Core
//!
//! Shared logic for Repo Scribe: catalog record types, the catalog store
//! abstraction with an in-memory backend, embedding helpers and notebook
//! text reconstruction.
//!
//! This crate contains no tokio, HTTP or filesystem I/O.

pub mod embedding;
pub mod models;
pub mod notebook;
pub mod store;
