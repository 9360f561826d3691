// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Graham Bridge.

use thiserror::Error;

use crate::types::DispatchFailure;

/// Top-level error type for all bridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    // -- Request errors (caller's fault, nothing sent to the device) --
    #[error("invalid JSON: {0}")]
    MalformedRequest(String),

    #[error("printer name is required")]
    MissingDevice,

    #[error("data is required")]
    MissingPayload,

    #[error("invalid base64 data: {0}")]
    InvalidEncoding(String),

    // -- Device errors --
    #[error("print failed: {0}")]
    Dispatch(DispatchFailure),

    #[error("raw printing is not available on this platform")]
    PlatformUnavailable,

    // -- Service errors --
    #[error("refusing to bind non-loopback address {0}")]
    NonLoopbackBind(std::net::SocketAddr),

    #[error("bridge server error: {0}")]
    Server(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BridgeError {
    /// Whether the error was caused by the request itself rather than the
    /// device or the service.
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            Self::MalformedRequest(_)
                | Self::MissingDevice
                | Self::MissingPayload
                | Self::InvalidEncoding(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BridgeError>;
