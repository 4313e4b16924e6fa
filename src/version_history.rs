//! Human-readable version history, kept in lock-step with the trust chain
//!
//! [`record_mutation`] is the single step shared by create and update: it
//! appends the changelog entry, re-derives hash and signature over the
//! post-mutation record, and appends the matching trust-chain link. It works
//! on a draft, so the store either installs all of it or none of it.

use chrono::{DateTime, Utc};

use crate::content_record::{ContentRecord, VersionHistoryEntry};
use crate::errors::{ContentError, ContentResult};
use crate::fingerprint::FingerprintEngine;
use crate::trust_chain::TrustChainBuilder;

pub const INITIAL_CREATION: &str = "Initial creation";
pub const CONTENT_UPDATE: &str = "Content update";

pub struct VersionHistoryTracker<'a> {
    editor: &'a str,
}

impl<'a> VersionHistoryTracker<'a> {
    pub fn new(editor: &'a str) -> Self {
        Self { editor }
    }

    pub fn append(
        &self,
        history: &mut Vec<VersionHistoryEntry>,
        version: u64,
        changes: &str,
        now: DateTime<Utc>,
    ) {
        history.push(VersionHistoryEntry {
            version,
            timestamp: now,
            changes: changes.to_string(),
            editor: self.editor.to_string(),
        });
    }
}

/// Apply one mutation's bookkeeping to `draft`, whose payload (including
/// `temporal.version`) is already in its new state.
pub fn record_mutation(
    draft: &mut ContentRecord,
    engine: &FingerprintEngine,
    authority: &str,
    changes: &str,
    now: DateTime<Utc>,
) -> ContentResult<()> {
    let version = draft.version();
    VersionHistoryTracker::new(authority).append(
        &mut draft.audit.version_history,
        version,
        changes,
        now,
    );
    draft.audit.updated_at = now;

    let view = draft.certified_view()?;
    let content_hash = engine.fingerprint(&view)?;
    draft.verification.digital_signature = engine.sign(&view)?;

    TrustChainBuilder::new(engine, authority).append(
        &mut draft.verification.trust_chain,
        &content_hash,
        now,
    )?;
    draft.verification.content_hash = content_hash;

    check_lockstep(draft)
}

/// Chain length, history length and payload version must agree.
pub fn check_lockstep(record: &ContentRecord) -> ContentResult<()> {
    let chain = record.verification.trust_chain.len() as u64;
    let history = record.audit.version_history.len() as u64;
    let version = record.version();

    if chain != history || history != version {
        tracing::error!(
            id = record.id,
            chain,
            history,
            version,
            "trust chain and version history diverged"
        );
        return Err(ContentError::concurrency(format!(
            "record {}: trust chain has {chain} links, version history has {history} entries, version is {version}",
            record.id
        )));
    }
    Ok(())
}
