// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for raw device dispatch.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BridgeError, Result};

/// Spooler datatype that tells the OS to pass bytes through untouched.
pub const RAW_DATATYPE: &str = "RAW";

/// Unique identifier for a print job, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A decoded, validated request to send raw bytes to a named device.
///
/// Created per inbound request and dropped once dispatch completes.
#[derive(Debug, Clone)]
pub struct PrintJob {
    id: JobId,
    device_name: String,
    payload: Vec<u8>,
}

impl PrintJob {
    /// Build a job, rejecting an empty device name or an empty payload.
    ///
    /// The device name is not resolved here; whether the device exists is
    /// for the spooler to decide.
    pub fn new(device_name: impl Into<String>, payload: Vec<u8>) -> Result<Self> {
        let device_name = device_name.into();
        if device_name.is_empty() {
            return Err(BridgeError::MissingDevice);
        }
        if payload.is_empty() {
            return Err(BridgeError::MissingPayload);
        }
        Ok(Self {
            id: JobId::new(),
            device_name,
            payload,
        })
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// One call of the raw-print handshake with the OS spooler, in protocol order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DispatchStep {
    Open,
    StartDoc,
    StartPage,
    Write,
    EndPage,
    EndDoc,
    Close,
}

impl DispatchStep {
    /// Short lowercase name used in logs and caller-facing messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::StartDoc => "start-doc",
            Self::StartPage => "start-page",
            Self::Write => "write",
            Self::EndPage => "end-page",
            Self::EndDoc => "end-doc",
            Self::Close => "close",
        }
    }
}

impl std::fmt::Display for DispatchStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status reported by the OS for a failed spooler call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsStatus {
    /// Native error code (Win32 last-error or HRESULT), when one was available.
    pub code: Option<i32>,
    pub message: String,
}

impl OsStatus {
    pub fn new(code: Option<i32>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for OsStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (os error {code})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Why a dispatch did not deliver the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DispatchFailure {
    /// A required argument was empty; nothing was sent to the spooler.
    MissingArgument { argument: String },
    /// This platform has no raw-print mechanism.
    Unsupported { platform: String },
    /// A handshake call reported an error.
    Step { step: DispatchStep, status: OsStatus },
    /// The write call succeeded but transferred fewer bytes than requested.
    ShortWrite { written: usize, requested: usize },
    /// The write call reported more bytes than it was given.
    OverWrite { written: usize, requested: usize },
}

impl DispatchFailure {
    /// The handshake step the failure is attributed to, if any was reached.
    pub fn step(&self) -> Option<DispatchStep> {
        match self {
            Self::MissingArgument { .. } | Self::Unsupported { .. } => None,
            Self::Step { step, .. } => Some(*step),
            Self::ShortWrite { .. } | Self::OverWrite { .. } => Some(DispatchStep::Write),
        }
    }
}

impl std::fmt::Display for DispatchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingArgument { argument } => write!(f, "missing argument: {argument}"),
            Self::Unsupported { platform } => {
                write!(f, "raw printing is not supported on {platform}")
            }
            Self::Step { step, status } => write!(f, "{step} failed: {status}"),
            Self::ShortWrite { written, requested } => {
                write!(f, "write transferred {written} of {requested} bytes")
            }
            Self::OverWrite { written, requested } => {
                write!(f, "write reported {written} bytes for a {requested}-byte payload")
            }
        }
    }
}

/// A cleanup call that failed after the outcome was already settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupWarning {
    pub step: DispatchStep,
    pub status: OsStatus,
}

impl std::fmt::Display for CleanupWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.step, self.status)
    }
}

/// Outcome of one dispatch. Produced once per job and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResult {
    succeeded: bool,
    failure_reason: Option<DispatchFailure>,
    warnings: Vec<CleanupWarning>,
}

impl DispatchResult {
    pub fn success(warnings: Vec<CleanupWarning>) -> Self {
        Self {
            succeeded: true,
            failure_reason: None,
            warnings,
        }
    }

    pub fn failure(reason: DispatchFailure, warnings: Vec<CleanupWarning>) -> Self {
        Self {
            succeeded: false,
            failure_reason: Some(reason),
            warnings,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn failure_reason(&self) -> Option<&DispatchFailure> {
        self.failure_reason.as_ref()
    }

    /// Cleanup calls (end page, end doc, close) that failed without
    /// changing the outcome.
    pub fn warnings(&self) -> &[CleanupWarning] {
        &self.warnings
    }

    /// Convert into a `Result`, keeping the failure reason as the error.
    pub fn into_result(self) -> Result<Vec<CleanupWarning>> {
        match self.failure_reason {
            None => Ok(self.warnings),
            Some(DispatchFailure::Unsupported { .. }) => Err(BridgeError::PlatformUnavailable),
            Some(reason) => Err(BridgeError::Dispatch(reason)),
        }
    }
}

/// Status of the HTTP gateway listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerStatus {
    Stopped,
    Starting,
    Running,
    Error,
}
