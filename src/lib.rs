//! Library root for the `content_ledger` crate
//!
//! A content store that fingerprints and signs every record, chains the
//! fingerprints into a per-record trust chain and keeps a parallel
//! human-readable version history.

// Core error handling
pub mod errors;

// Hashing and signing
pub mod canonicalize;
pub mod fingerprint;

// Record model
pub mod content_record;
pub mod payload;

// Integrity history
pub mod trust_chain;
pub mod verification;
pub mod version_history;

// Storage
pub mod backend;
pub mod content_store;

// Configuration, logging & CLI
pub mod cli;
pub mod config;
pub mod logging;

// Web server interface
pub mod web;

pub use content_record::{ContentRecord, VerificationStatus};
pub use content_store::ContentStore;
pub use errors::{ContentError, ContentResult};
