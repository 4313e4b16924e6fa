//! Trust chain construction
//!
//! Every successful mutation appends exactly one link. A link's signature is
//! the keyed tag over the record's new fingerprint, so it binds the link to
//! the hash that was current when it was written. The builder only appends;
//! checking earlier links is the verification module's job.

use chrono::{DateTime, Utc};

use crate::content_record::TrustChainEntry;
use crate::errors::ContentResult;
use crate::fingerprint::FingerprintEngine;

pub struct TrustChainBuilder<'a> {
    engine: &'a FingerprintEngine,
    authority: &'a str,
}

impl<'a> TrustChainBuilder<'a> {
    pub fn new(engine: &'a FingerprintEngine, authority: &'a str) -> Self {
        Self { engine, authority }
    }

    /// Sign `fingerprint` and append the resulting link to `chain`.
    ///
    /// A clock that has gone backwards never produces a decreasing
    /// timestamp: the previous link's time is reused instead.
    pub fn append(
        &self,
        chain: &mut Vec<TrustChainEntry>,
        fingerprint: &str,
        now: DateTime<Utc>,
    ) -> ContentResult<()> {
        let timestamp = match chain.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };

        chain.push(TrustChainEntry {
            authority: self.authority.to_string(),
            signature: self.engine.sign(fingerprint)?,
            timestamp,
            fingerprint: Some(fingerprint.to_string()),
        });
        Ok(())
    }
}
