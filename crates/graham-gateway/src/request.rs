// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Decoding and validation of `/print` request bodies.
//
// The body is parsed as JSON whatever its Content-Type: browsers may send
// `text/plain` to avoid a CORS preflight. Checks run in a fixed order so
// each defect maps to exactly one error: JSON, printer, data, base64.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use graham_core::error::{BridgeError, Result};
use graham_core::types::PrintJob;

/// JSON body of a `/print` request. Absent and `null` fields read as empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintRequest {
    /// OS printer name.
    pub printer: Option<String>,
    /// Base64-encoded raw payload (BRF for embossers).
    pub data: Option<String>,
}

impl PrintRequest {
    pub fn new(printer: impl Into<String>, payload: &[u8]) -> Self {
        Self {
            printer: Some(printer.into()),
            data: Some(STANDARD.encode(payload)),
        }
    }

    /// Validate and decode into a `PrintJob`.
    pub fn into_job(self) -> Result<PrintJob> {
        let printer = self.printer.unwrap_or_default();
        if printer.is_empty() {
            return Err(BridgeError::MissingDevice);
        }
        let data = self.data.unwrap_or_default();
        if data.is_empty() {
            return Err(BridgeError::MissingPayload);
        }
        let payload = decode_payload(&data)?;
        PrintJob::new(printer, payload)
    }
}

/// Parse a raw request body into a validated job.
pub fn decode_print_request(body: &[u8]) -> Result<PrintJob> {
    let request: PrintRequest =
        serde_json::from_slice(body).map_err(|e| BridgeError::MalformedRequest(e.to_string()))?;
    request.into_job()
}

/// Standard padded base64. Line breaks are skipped, as MIME encoders wrap
/// long output.
fn decode_payload(data: &str) -> Result<Vec<u8>> {
    let decoded = if data.contains(['\r', '\n']) {
        let joined: String = data.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
        STANDARD.decode(joined)
    } else {
        STANDARD.decode(data)
    };
    decoded.map_err(|e| BridgeError::InvalidEncoding(e.to_string()))
}
