use crate::models::mask_document_number;
use crate::report::ExternalReport;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Short-lived memo of provider reports, keyed by `ReportRequest::cache_key`.
///
/// Only raw provider documents are cached. Assessments are always recomputed, so a
/// policy change takes effect on the next request even for cached reports.
///
/// Entries carry a SHA-256 checksum of the stored JSON; an entry that fails
/// validation is dropped and the report is fetched again.
#[derive(Clone)]
pub struct ReportCache {
    inner: Option<Cache<String, String>>,
}

impl ReportCache {
    /// Builds the cache; a zero TTL disables it.
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        if ttl.is_zero() {
            return Self::disabled();
        }

        let inner = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(max_capacity)
            .build();
        Self { inner: Some(inner) }
    }

    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    pub async fn get(&self, key: &str) -> Option<ExternalReport> {
        let cache = self.inner.as_ref()?;
        let serialized = cache.get(key).await?;

        match CachedReport::deserialize_and_validate(&serialized) {
            Some(entry) => {
                tracing::debug!(
                    "Report cache HIT for {} (fetched at {})",
                    masked_key(key),
                    entry.fetched_at.to_rfc3339()
                );
                match serde_json::from_str(&entry.report) {
                    Ok(report) => Some(report),
                    Err(e) => {
                        tracing::warn!(
                            "Cached report for {} is not valid JSON, evicting: {}",
                            masked_key(key),
                            e
                        );
                        cache.invalidate(key).await;
                        None
                    }
                }
            }
            None => {
                tracing::warn!(
                    "Report cache entry for {} failed validation, evicting",
                    masked_key(key)
                );
                cache.invalidate(key).await;
                None
            }
        }
    }

    pub async fn insert(&self, key: String, report: &ExternalReport) {
        let Some(cache) = self.inner.as_ref() else {
            return;
        };

        match serde_json::to_string(report) {
            Ok(json) => cache.insert(key, CachedReport::new(json).serialize()).await,
            Err(e) => tracing::warn!("Could not serialize report for caching: {}", e),
        }
    }
}

/// Cache key with the document number masked, for log lines.
fn masked_key(key: &str) -> String {
    key.split(':')
        .enumerate()
        .map(|(i, part)| if i == 1 { mask_document_number(part) } else { part.to_string() })
        .collect::<Vec<_>>()
        .join(":")
}

/// Cached report with integrity checksum.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CachedReport {
    /// Report document as JSON.
    pub report: String,
    /// SHA-256 checksum of `report` (hex encoded).
    pub checksum: String,
    pub fetched_at: DateTime<Utc>,
}

impl CachedReport {
    pub fn new(report: String) -> Self {
        let checksum = Self::compute_checksum(&report);
        Self {
            report,
            checksum,
            fetched_at: Utc::now(),
        }
    }

    fn compute_checksum(data: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Returns true if the checksum matches, false if the payload was altered.
    pub fn is_valid(&self) -> bool {
        Self::compute_checksum(&self.report) == self.checksum
    }

    pub fn serialize(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Returns the entry if it parses and its checksum matches.
    pub fn deserialize_and_validate(serialized: &str) -> Option<Self> {
        let entry: CachedReport = serde_json::from_str(serialized).ok()?;

        if entry.is_valid() {
            Some(entry)
        } else {
            tracing::warn!(
                "Cache validation failed: checksum mismatch. Expected: {}, Data length: {}",
                entry.checksum,
                entry.report.len()
            );
            None
        }
    }
}
