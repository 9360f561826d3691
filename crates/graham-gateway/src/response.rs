// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Caller-visible statuses.
//
// Every response body is `{"status": "..."}`. The HTTP code tells the client
// whose fault it was: 400 for the request, 500 for the device or the bridge,
// 501 when this platform cannot print raw at all.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use graham_core::error::BridgeError;

/// Status reported for a job handed to the spooler.
pub const STATUS_QUEUED: &str = "queued";

/// Status reported by the liveness probe.
pub const STATUS_OK: &str = "ok";

/// Response header carrying cleanup warnings on an otherwise queued job.
pub const WARNING_HEADER: &str = "x-bridge-warning";

/// Single-field status document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBody {
    pub status: String,
}

impl StatusBody {
    pub fn queued() -> Self {
        Self {
            status: STATUS_QUEUED.into(),
        }
    }
}

/// Liveness document returned by `/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeBody {
    pub status: String,
    pub version: String,
}

impl ProbeBody {
    pub fn ready() -> Self {
        Self {
            status: STATUS_OK.into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

/// A `BridgeError` on its way to the caller.
#[derive(Debug)]
pub struct ApiError(pub BridgeError);

impl From<BridgeError> for ApiError {
    fn from(err: BridgeError) -> Self {
        Self(err)
    }
}

/// HTTP code for an error.
pub fn status_code(err: &BridgeError) -> StatusCode {
    match err {
        e if e.is_bad_request() => StatusCode::BAD_REQUEST,
        BridgeError::PlatformUnavailable => StatusCode::NOT_IMPLEMENTED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = status_code(&self.0);
        let body = StatusBody {
            status: self.0.to_string(),
        };
        (code, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graham_core::types::{DispatchFailure, DispatchStep, OsStatus};

    #[test]
    fn request_errors_are_bad_request() {
        for err in [
            BridgeError::MalformedRequest("eof".into()),
            BridgeError::MissingDevice,
            BridgeError::MissingPayload,
            BridgeError::InvalidEncoding("bad byte".into()),
        ] {
            assert_eq!(status_code(&err), StatusCode::BAD_REQUEST, "{err}");
        }
    }

    #[test]
    fn device_errors_are_server_errors() {
        let err = BridgeError::Dispatch(DispatchFailure::Step {
            step: DispatchStep::Open,
            status: OsStatus::new(Some(1801), "OpenPrinterW failed"),
        });
        assert_eq!(status_code(&err), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.to_string(),
            "print failed: open failed: OpenPrinterW failed (os error 1801)"
        );
    }

    #[test]
    fn unsupported_platform_is_not_implemented() {
        assert_eq!(
            status_code(&BridgeError::PlatformUnavailable),
            StatusCode::NOT_IMPLEMENTED
        );
    }
}
