// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Port for platforms with no raw-print binding.
//
// Every dispatch fails as unsupported before any spooler call is made.

use graham_core::types::OsStatus;

use crate::port::{DeviceConnection, PortResult, RawPrintPort};

/// No-op port returned where no spooler binding exists.
#[derive(Debug)]
pub struct UnsupportedPort {
    platform: String,
}

impl UnsupportedPort {
    pub fn new() -> Self {
        Self {
            platform: std::env::consts::OS.to_owned(),
        }
    }
}

impl Default for UnsupportedPort {
    fn default() -> Self {
        Self::new()
    }
}

impl RawPrintPort for UnsupportedPort {
    fn platform_name(&self) -> &str {
        &self.platform
    }

    fn is_available(&self) -> bool {
        false
    }

    fn open(&self, _device_name: &str) -> PortResult<Box<dyn DeviceConnection>> {
        tracing::warn!(platform = %self.platform, "RawPrintPort::open called on unsupported port");
        Err(OsStatus::new(
            None,
            format!("no raw-print binding for {}", self.platform),
        ))
    }
}
