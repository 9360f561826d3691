// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scoped guards for the spooler handshake.
//
// Each guard is created by the call that opens its resource and closes it
// on drop unless it was already closed explicitly. Nesting follows the
// protocol: a `PageSession` borrows its `DocSession`, which borrows its
// `DeviceHandle`, so the borrow checker rejects any out-of-order teardown
// and drop order closes page, then document, then handle.
//
// The explicit `end`/`close` methods return the spooler status so callers
// can report cleanup failures; the `Drop` impls only log.

use tracing::{debug, warn};

use graham_core::types::DispatchStep;

use crate::port::{DeviceConnection, PortResult, RawPrintPort};

/// An open device. Released exactly once: by `close`, or on drop.
pub struct DeviceHandle {
    device: String,
    conn: Box<dyn DeviceConnection>,
    released: bool,
}

impl DeviceHandle {
    /// Open `device_name` through `port`. Release is tied to the returned
    /// value from this point on.
    pub fn open(port: &dyn RawPrintPort, device_name: &str) -> PortResult<Self> {
        let conn = port.open(device_name)?;
        debug!(device = device_name, "device handle opened");
        Ok(Self {
            device: device_name.to_owned(),
            conn,
            released: false,
        })
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    /// Begin a document of the given datatype on this handle.
    pub fn start_doc(&mut self, doc_name: &str, datatype: &str) -> PortResult<DocSession<'_>> {
        self.conn.start_doc(doc_name, datatype)?;
        debug!(device = %self.device, doc_name, datatype, "document started");
        Ok(DocSession {
            conn: &mut self.conn,
            open: true,
        })
    }

    /// Release the handle and report the spooler status.
    pub fn close(mut self) -> PortResult<()> {
        self.released = true;
        let result = self.conn.close();
        debug!(device = %self.device, ok = result.is_ok(), "device handle released");
        result
    }
}

impl Drop for DeviceHandle {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(status) = self.conn.close() {
            warn!(
                device = %self.device,
                step = %DispatchStep::Close,
                error = %status,
                "failed to release device handle during unwind"
            );
        }
    }
}

/// An open document on a device handle.
pub struct DocSession<'h> {
    conn: &'h mut Box<dyn DeviceConnection>,
    open: bool,
}

impl DocSession<'_> {
    pub fn start_page(&mut self) -> PortResult<PageSession<'_>> {
        self.conn.start_page()?;
        debug!("page started");
        Ok(PageSession {
            conn: &mut *self.conn,
            open: true,
        })
    }

    /// End the document and report the spooler status.
    pub fn end(mut self) -> PortResult<()> {
        self.open = false;
        self.conn.end_doc()
    }
}

impl Drop for DocSession<'_> {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        if let Err(status) = self.conn.end_doc() {
            warn!(step = %DispatchStep::EndDoc, error = %status, "failed to end document during unwind");
        }
    }
}

/// An open page inside a document. Bytes may only be written here.
pub struct PageSession<'d> {
    conn: &'d mut Box<dyn DeviceConnection>,
    open: bool,
}

impl PageSession<'_> {
    /// Write `data` in one spooler call, returning the accepted byte count.
    pub fn write(&mut self, data: &[u8]) -> PortResult<usize> {
        let written = self.conn.write(data)?;
        debug!(written, requested = data.len(), "payload written");
        Ok(written)
    }

    /// End the page and report the spooler status.
    pub fn end(mut self) -> PortResult<()> {
        self.open = false;
        self.conn.end_page()
    }
}

impl Drop for PageSession<'_> {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        if let Err(status) = self.conn.end_page() {
            warn!(step = %DispatchStep::EndPage, error = %status, "failed to end page during unwind");
        }
    }
}
