// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic boundary to the OS print spooler.
//
// The spooler exposes a seven-call raw-print protocol: open the device,
// start a document, start a page, write, end the page, end the document,
// close the device. A port implements exactly these calls and nothing else;
// ordering and cleanup are enforced by `session` and `dispatch`.

use graham_core::types::OsStatus;

/// Result of a single spooler call.
pub type PortResult<T> = std::result::Result<T, OsStatus>;

/// A platform's raw-print mechanism.
pub trait RawPrintPort: Send + Sync {
    /// Human-readable platform name (e.g. "Windows spooler").
    fn platform_name(&self) -> &str;

    /// Whether this port can reach a spooler at all. `false` means every
    /// dispatch fails immediately as unsupported.
    fn is_available(&self) -> bool {
        true
    }

    /// Open a connection to the named device.
    fn open(&self, device_name: &str) -> PortResult<Box<dyn DeviceConnection>>;
}

/// An open connection to one device. Each method is one spooler call.
///
/// Implementations must not reorder, retry, or skip calls; callers drive the
/// sequence.
pub trait DeviceConnection {
    /// Begin a document. `datatype` is passed to the spooler verbatim.
    fn start_doc(&mut self, doc_name: &str, datatype: &str) -> PortResult<()>;

    fn start_page(&mut self) -> PortResult<()>;

    /// Write `data` in a single call and return how many bytes the spooler
    /// accepted. A count below `data.len()` is not an error at this level.
    fn write(&mut self, data: &[u8]) -> PortResult<usize>;

    fn end_page(&mut self) -> PortResult<()>;

    fn end_doc(&mut self) -> PortResult<()>;

    /// Release the device. Called exactly once per successful `open`.
    fn close(&mut self) -> PortResult<()>;
}
