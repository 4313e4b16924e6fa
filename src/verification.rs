//! Integrity checks over stored records
//!
//! [`verify_record`] answers the narrow question "does the stored hash still
//! match the stored record". [`audit_record`] goes further and re-validates
//! the digital signature and every trust-chain link against the fingerprint
//! it retained.

use serde::Serialize;

use crate::content_record::ContentRecord;
use crate::errors::ContentResult;
use crate::fingerprint::FingerprintEngine;

/// Recompute the record's fingerprint and compare it with `content_hash`
pub fn verify_record(engine: &FingerprintEngine, record: &ContentRecord) -> ContentResult<bool> {
    let current = engine.fingerprint(&record.certified_view()?)?;
    Ok(current == record.verification.content_hash)
}

/// A single problem found while auditing a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChainFinding {
    /// Stored hash does not match the stored record
    HashMismatch,
    /// Digital signature does not match the stored record
    SignatureMismatch,
    /// Link signature does not match its retained fingerprint
    LinkSignatureInvalid { index: usize },
    /// Link predates retained fingerprints and cannot be re-checked
    LinkUnverifiable { index: usize },
    /// Newest link does not certify the current hash
    HeadMismatch,
    TimestampRegression { index: usize },
    LengthMismatch { chain: usize, history: usize, version: u64 },
}

impl ChainFinding {
    fn is_failure(&self) -> bool {
        !matches!(self, ChainFinding::LinkUnverifiable { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChainAudit {
    pub id: u64,
    pub links: usize,
    pub findings: Vec<ChainFinding>,
}

impl ChainAudit {
    /// True when nothing but unverifiable legacy links was found
    pub fn is_intact(&self) -> bool {
        !self.findings.iter().any(ChainFinding::is_failure)
    }
}

pub fn audit_record(engine: &FingerprintEngine, record: &ContentRecord) -> ContentResult<ChainAudit> {
    let mut findings = Vec::new();
    let verification = &record.verification;
    let view = record.certified_view()?;

    if engine.fingerprint(&view)? != verification.content_hash {
        findings.push(ChainFinding::HashMismatch);
    }
    if !engine.verify_signature(&view, &verification.digital_signature)? {
        findings.push(ChainFinding::SignatureMismatch);
    }

    let chain = &verification.trust_chain;
    for (index, link) in chain.iter().enumerate() {
        match &link.fingerprint {
            Some(fingerprint) => {
                if !engine.verify_signature(fingerprint.as_str(), &link.signature)? {
                    findings.push(ChainFinding::LinkSignatureInvalid { index });
                }
            }
            None => findings.push(ChainFinding::LinkUnverifiable { index }),
        }
        if index > 0 && link.timestamp < chain[index - 1].timestamp {
            findings.push(ChainFinding::TimestampRegression { index });
        }
    }

    if let Some(Some(head)) = chain.last().map(|link| &link.fingerprint) {
        if *head != verification.content_hash {
            findings.push(ChainFinding::HeadMismatch);
        }
    }

    let history = record.audit.version_history.len();
    let version = record.version();
    if chain.len() != history || history as u64 != version {
        findings.push(ChainFinding::LengthMismatch {
            chain: chain.len(),
            history,
            version,
        });
    }

    Ok(ChainAudit {
        id: record.id,
        links: chain.len(),
        findings,
    })
}
