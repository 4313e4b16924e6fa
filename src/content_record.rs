//! Record and store document types
//!
//! These are the shapes persisted in the store document. A record's hash and
//! signature cover its certified view: everything except `verification`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ContentError, ContentResult};
use crate::payload::ContentPayload;

/// Format version written into every store document
pub const DOCUMENT_FORMAT_VERSION: &str = "1.0.0";

/// The unit of storage: a payload plus its integrity and audit state.
///
/// `verification.content_hash` and `verification.digital_signature` cover the
/// record's certified view, which is everything except `verification` itself
/// (see [`ContentRecord::certified_view`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: u64,
    pub payload: ContentPayload,
    pub verification: VerificationState,
    pub audit: AuditState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationState {
    pub content_hash: String,
    pub digital_signature: String,
    pub trust_chain: Vec<TrustChainEntry>,
    pub status: VerificationStatus,
}

/// Outcome of the external approval workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Verified,
    Rejected,
}

impl std::str::FromStr for VerificationStatus {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            "rejected" => Ok(Self::Rejected),
            other => Err(ContentError::encoding(
                "verification status",
                format!("unknown status '{other}'"),
            )),
        }
    }
}

/// One link of a record's trust chain.
///
/// `fingerprint` is the content hash this link signed. Documents written
/// before it was retained load with `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustChainEntry {
    pub authority: String,
    pub signature: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditState {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    pub version_history: Vec<VersionHistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionHistoryEntry {
    pub version: u64,
    pub timestamp: DateTime<Utc>,
    pub changes: String,
    pub editor: String,
}

impl ContentRecord {
    /// The material that `content_hash` and `digital_signature` certify.
    pub fn certified_view(&self) -> ContentResult<Value> {
        #[derive(Serialize)]
        struct CertifiedView<'a> {
            id: u64,
            payload: &'a ContentPayload,
            audit: &'a AuditState,
        }

        serde_json::to_value(CertifiedView {
            id: self.id,
            payload: &self.payload,
            audit: &self.audit,
        })
        .map_err(|e| ContentError::encoding("certified view", e))
    }

    pub fn version(&self) -> u64 {
        self.payload.temporal.version
    }
}

/// The persisted state: every record plus the id counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreDocument {
    pub content: Vec<ContentRecord>,
    pub metadata: StoreMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreMetadata {
    pub last_id: u64,
    pub version: String,
}

impl Default for StoreDocument {
    fn default() -> Self {
        Self {
            content: Vec::new(),
            metadata: StoreMetadata {
                last_id: 0,
                version: DOCUMENT_FORMAT_VERSION.to_string(),
            },
        }
    }
}

impl StoreDocument {
    pub fn position(&self, id: u64) -> Option<usize> {
        self.content.iter().position(|record| record.id == id)
    }

    pub fn find(&self, id: u64) -> Option<&ContentRecord> {
        self.content.iter().find(|record| record.id == id)
    }
}
