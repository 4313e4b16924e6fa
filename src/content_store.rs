//! The record store
//!
//! `ContentStore` owns the backing medium, the id counter and the in-memory
//! document. Mutations run inside one write section: the current document
//! is cloned, the change is applied to the clone, the clone is persisted and
//! only then installed. A failed persist therefore leaves both the durable
//! and the in-memory state as they were. Reads take the read side of the same
//! lock and always see a fully installed document.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::{Arc, RwLock};

use crate::backend::{JsonFileBackend, StoreBackend};
use crate::config::LedgerConfig;
use crate::content_record::{
    AuditState, ContentRecord, StoreDocument, VerificationState, VerificationStatus,
};
use crate::errors::{ContentError, ContentResult, SafeReadLock, SafeWriteLock};
use crate::fingerprint::{FingerprintEngine, SigningSecret};
use crate::payload::ContentPayload;
use crate::verification::{audit_record, verify_record, ChainAudit};
use crate::version_history::{check_lockstep, record_mutation, CONTENT_UPDATE, INITIAL_CREATION};

pub struct ContentStore {
    backend: Arc<dyn StoreBackend>,
    engine: FingerprintEngine,
    authority: String,
    state: RwLock<StoreDocument>,
}

impl ContentStore {
    /// Load the document from `backend`, creating and persisting an empty
    /// one if the medium holds nothing yet.
    ///
    /// Fails if the medium cannot be read or its contents cannot be parsed.
    pub fn open(
        backend: Arc<dyn StoreBackend>,
        engine: FingerprintEngine,
        authority: impl Into<String>,
    ) -> ContentResult<Self> {
        let document = match backend.load()? {
            Some(document) => {
                check_document(&document)?;
                document
            }
            None => {
                let document = StoreDocument::default();
                backend.save(&document)?;
                tracing::info!(backend = %backend.describe(), "initialized empty content store");
                document
            }
        };

        tracing::info!(
            backend = %backend.describe(),
            records = document.content.len(),
            last_id = document.metadata.last_id,
            "content store opened"
        );

        Ok(Self {
            backend,
            engine,
            authority: authority.into(),
            state: RwLock::new(document),
        })
    }

    /// Open the JSON file store described by `config`
    pub fn open_from_config(config: &LedgerConfig) -> ContentResult<Self> {
        config.validate()?;
        let engine = FingerprintEngine::new(SigningSecret::new(&config.signing_secret)?);
        let backend = Arc::new(JsonFileBackend::new(&config.data_path));
        Self::open(backend, engine, config.authority.clone())
    }

    /// Release the store. Every mutation is already durable.
    pub fn close(self) {
        let records = self.state.read().map(|doc| doc.content.len()).unwrap_or(0);
        tracing::info!(backend = %self.backend.describe(), records, "content store closed");
    }

    /// Discard the in-memory document and read the medium again.
    ///
    /// A medium that has gone empty is an error rather than a fresh store,
    /// and the id counter never moves backwards.
    pub fn reload(&self) -> ContentResult<()> {
        let mut guard = self.state.safe_write()?;
        let mut document = self.backend.load()?.ok_or_else(|| {
            ContentError::store_io(
                format!("reloading {}", self.backend.describe()),
                std::io::Error::new(std::io::ErrorKind::NotFound, "store document is missing"),
            )
        })?;
        check_document(&document)?;
        document.metadata.last_id = document.metadata.last_id.max(guard.metadata.last_id);
        *guard = document;
        Ok(())
    }

    pub fn create(&self, payload: Value) -> ContentResult<ContentRecord> {
        let now = Utc::now();
        let mut payload = ContentPayload::from_input(payload)?;
        payload.temporal.version = 1;
        if payload.temporal.created_date.is_none() {
            payload.temporal.created_date = Some(now.format("%Y-%m-%d").to_string());
        }

        let record = self.mutate("create", |doc| {
            let id = doc.metadata.last_id + 1;
            let mut record = self.draft(id, payload, now);
            record_mutation(&mut record, &self.engine, &self.authority, INITIAL_CREATION, now)?;

            doc.metadata.last_id = id;
            doc.content.push(record.clone());
            Ok(record)
        })?;

        tracing::info!(id = record.id, "content created");
        Ok(record)
    }

    pub fn get(&self, id: u64) -> ContentResult<ContentRecord> {
        let doc = self.state.safe_read()?;
        let record = doc.find(id).cloned().ok_or(ContentError::not_found(id))?;
        tracing::debug!(id, "content read");
        Ok(record)
    }

    /// All records in insertion order
    pub fn list(&self) -> ContentResult<Vec<ContentRecord>> {
        Ok(self.state.safe_read()?.content.clone())
    }

    pub fn update(&self, id: u64, patch: &Value) -> ContentResult<ContentRecord> {
        let now = Utc::now();

        let record = self.mutate("update", |doc| {
            let index = doc.position(id).ok_or(ContentError::not_found(id))?;
            let mut record = doc.content[index].clone();

            let mut payload = record.payload.merged_with(patch)?;
            payload.temporal.version = record.version() + 1;
            record.payload = payload;
            record_mutation(&mut record, &self.engine, &self.authority, CONTENT_UPDATE, now)?;

            doc.content[index] = record.clone();
            Ok(record)
        })?;

        tracing::info!(id, version = record.version(), "content updated");
        Ok(record)
    }

    pub fn delete(&self, id: u64) -> ContentResult<()> {
        self.mutate("delete", |doc| {
            let index = doc.position(id).ok_or(ContentError::not_found(id))?;
            doc.content.remove(index);
            Ok(())
        })?;

        tracing::info!(id, "content deleted");
        Ok(())
    }

    /// Record the approval workflow's decision. Not a content mutation: the
    /// trust chain, version history and hash are left alone.
    pub fn set_status(&self, id: u64, status: VerificationStatus) -> ContentResult<ContentRecord> {
        let record = self.mutate("set_status", |doc| {
            let index = doc.position(id).ok_or(ContentError::not_found(id))?;
            doc.content[index].verification.status = status;
            Ok(doc.content[index].clone())
        })?;

        tracing::info!(id, ?status, "verification status changed");
        Ok(record)
    }

    /// Does the stored hash still certify the stored record?
    pub fn verify(&self, id: u64) -> ContentResult<bool> {
        let record = self.get(id)?;
        let valid = verify_record(&self.engine, &record)?;
        if !valid {
            tracing::warn!(id, "content hash mismatch");
        }
        Ok(valid)
    }

    /// Full re-validation of hash, signature and every trust-chain link
    pub fn audit(&self, id: u64) -> ContentResult<ChainAudit> {
        let record = self.get(id)?;
        let audit = audit_record(&self.engine, &record)?;
        if !audit.is_intact() {
            tracing::warn!(id, findings = ?audit.findings, "trust chain audit failed");
        }
        Ok(audit)
    }

    pub fn len(&self) -> ContentResult<usize> {
        Ok(self.state.safe_read()?.content.len())
    }

    pub fn is_empty(&self) -> ContentResult<bool> {
        Ok(self.len()? == 0)
    }

    fn draft(&self, id: u64, payload: ContentPayload, now: DateTime<Utc>) -> ContentRecord {
        ContentRecord {
            id,
            payload,
            verification: VerificationState {
                content_hash: String::new(),
                digital_signature: String::new(),
                trust_chain: Vec::new(),
                status: VerificationStatus::Pending,
            },
            audit: AuditState {
                created_at: now,
                updated_at: now,
                created_by: self.authority.clone(),
                version_history: Vec::new(),
            },
        }
    }

    fn mutate<T>(
        &self,
        operation: &'static str,
        apply: impl FnOnce(&mut StoreDocument) -> ContentResult<T>,
    ) -> ContentResult<T> {
        let mut guard = self.state.safe_write()?;
        let mut draft = guard.clone();
        let outcome = apply(&mut draft)?;

        if let Err(e) = self.backend.save(&draft) {
            tracing::error!(operation, error = %e, "persist failed, mutation discarded");
            return Err(e);
        }

        *guard = draft;
        Ok(outcome)
    }
}

/// Reject documents whose counter could hand out an id that is already taken
fn check_document(document: &StoreDocument) -> ContentResult<()> {
    let highest = document.content.iter().map(|r| r.id).max().unwrap_or(0);
    if highest > document.metadata.last_id {
        return Err(ContentError::encoding(
            "store document",
            format!(
                "lastId {} is below the highest record id {highest}",
                document.metadata.last_id
            ),
        ));
    }
    for record in &document.content {
        if check_lockstep(record).is_err() {
            tracing::warn!(id = record.id, "loaded record has diverging trust chain and history");
        }
    }
    Ok(())
}
