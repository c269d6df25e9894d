use crate::client::{CollectorClient, ExchangeResponse};
use crate::config::{LEGACY_SCHEMA_VERSION, SCHEMA_VERSION};
use crate::error::SimError;
use crate::types::{CollectorResponse, RESPONSE_ERROR, RESPONSE_OK};
use serde_json::Value;
use std::collections::VecDeque;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub delivered: usize,
    pub rejected: bool,
}

/// Size-capped FIFO of encoded payloads waiting for the collector.
#[derive(Debug)]
pub struct UploadBuffer {
    entries: VecDeque<Vec<u8>>,
    total_bytes: usize,
    cap_bytes: usize,
}

impl UploadBuffer {
    pub fn new(cap_bytes: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            total_bytes: 0,
            cap_bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Drop oldest entries until the new one fits, then append it. The new
    /// entry is always admitted, even alone over the cap. Returns how many
    /// entries were dropped.
    pub fn enqueue(&mut self, payload: Vec<u8>) -> usize {
        let incoming = payload.len();
        let mut dropped = 0;

        while self.total_bytes + incoming > self.cap_bytes {
            let Some(oldest) = self.entries.pop_front() else {
                break;
            };
            self.total_bytes -= oldest.len();
            dropped += 1;
        }

        if dropped > 0 {
            warn!(
                "⚠️ UPLOAD BACKPRESSURE - dropped {} oldest payload(s) to admit {} bytes (cap {} bytes)",
                dropped, incoming, self.cap_bytes
            );
        }

        self.total_bytes += incoming;
        self.entries.push_back(payload);
        debug!(
            "📦 Buffered payload of {} bytes, {} pending ({} bytes)",
            incoming,
            self.entries.len(),
            self.total_bytes
        );
        dropped
    }

    /// Send entries front to back, removing each only once the collector
    /// accepts it. Stops at the first rejection; that entry and everything
    /// behind it wait for the next drain.
    pub async fn drain<C: CollectorClient>(&mut self, client: &C) -> Result<DrainReport, SimError> {
        let mut report = DrainReport::default();

        while let Some(entry) = self.entries.front() {
            let response = client.post(entry).await?;
            match classify(&response)? {
                Delivery::Accepted => {
                    if let Some(sent) = self.entries.pop_front() {
                        self.total_bytes -= sent.len();
                    }
                    report.delivered += 1;
                }
                Delivery::Rejected => {
                    report.rejected = true;
                    break;
                }
            }
        }

        if report.delivered > 0 {
            info!(
                "📤 Delivered {} payload(s), {} still pending",
                report.delivered,
                self.entries.len()
            );
        }
        Ok(report)
    }
}

fn is_supported_version(version: f64) -> bool {
    (version - LEGACY_SCHEMA_VERSION).abs() < f64::EPSILON
        || (version - SCHEMA_VERSION).abs() < f64::EPSILON
}

/// Decide what one collector response means. A body that is not JSON at
/// all (a proxy error page, a truncated read) is a failed delivery. Any JSON
/// body must carry a supported numeric `version`, checked before any other
/// field is looked at.
pub fn classify(response: &ExchangeResponse) -> Result<Delivery, SimError> {
    let body: Value = match serde_json::from_slice(&response.body) {
        Ok(body) => body,
        Err(e) => {
            warn!(
                "📭 Unreadable collector response (HTTP {}): {}",
                response.status, e
            );
            return Ok(Delivery::Rejected);
        }
    };

    let version = match body.get("version") {
        Some(v) => v
            .as_f64()
            .ok_or_else(|| SimError::UnversionedResponse(format!("version {v}")))?,
        None => return Err(SimError::UnversionedResponse("version missing".into())),
    };
    if !is_supported_version(version) {
        return Err(SimError::UnsupportedVersion(version));
    }

    let parsed: CollectorResponse = match serde_json::from_value(body) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(
                "📭 Malformed collector response (HTTP {}): {}",
                response.status, e
            );
            return Ok(Delivery::Rejected);
        }
    };

    match parsed.kind {
        RESPONSE_OK if response.status == 200 => Ok(Delivery::Accepted),
        RESPONSE_OK => {
            warn!("📭 Collector acknowledged with HTTP {}, will retry", response.status);
            Ok(Delivery::Rejected)
        }
        RESPONSE_ERROR => {
            let err = parsed.data.unwrap_or_default();
            warn!(
                "📭 Collector error [{}] {} (HTTP {}), will retry",
                err.code, err.message, response.status
            );
            Ok(Delivery::Rejected)
        }
        other => Err(SimError::UnsupportedResponseType(other)),
    }
}
