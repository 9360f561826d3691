// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Windows print spooler port (winspool.drv).
//
// Calls used, one per `DeviceConnection` method:
//   OpenPrinterW     - open a handle to the named printer
//   StartDocPrinterW - begin a document, DOC_INFO_1 with datatype "RAW"
//   StartPagePrinter - required by some drivers even for raw jobs
//   WritePrinter     - write raw bytes; reports the count actually written
//   EndPagePrinter   - close the page
//   EndDocPrinter    - end the document
//   ClosePrinter     - release the handle
//
// With datatype RAW the spooler bypasses GDI rendering, which is what
// embossers such as ViewPlus devices need.

#![cfg(windows)]

use core::ffi::c_void;

use windows::Win32::Graphics::Printing::{
    ClosePrinter, DOC_INFO_1W, EndDocPrinter, EndPagePrinter, OpenPrinterW, PRINTER_HANDLE,
    StartDocPrinterW, StartPagePrinter, WritePrinter,
};
use windows::core::{PCWSTR, PWSTR};

use graham_core::types::OsStatus;

use crate::port::{DeviceConnection, PortResult, RawPrintPort};

/// NUL-terminated UTF-16 copy of `s` for wide Win32 APIs.
fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Status for a call that signalled failure through its return value.
fn last_error(call: &str) -> OsStatus {
    let err = std::io::Error::last_os_error();
    OsStatus::new(err.raw_os_error(), format!("{call} failed: {err}"))
}

/// Raw-print port backed by the Windows spooler.
#[derive(Debug, Default)]
pub struct WinSpoolPort;

impl WinSpoolPort {
    pub fn new() -> Self {
        Self
    }
}

impl RawPrintPort for WinSpoolPort {
    fn platform_name(&self) -> &str {
        "Windows spooler"
    }

    fn open(&self, device_name: &str) -> PortResult<Box<dyn DeviceConnection>> {
        if device_name.contains('\0') {
            return Err(OsStatus::new(None, "printer name contains a NUL character"));
        }
        let name_w = to_wide(device_name);
        let mut handle = PRINTER_HANDLE::default();

        // SAFETY: `name_w` is NUL-terminated and outlives the call; `handle`
        // is a valid out-pointer.
        unsafe { OpenPrinterW(PCWSTR::from_raw(name_w.as_ptr()), &mut handle, None) }.map_err(
            |e| OsStatus::new(Some(e.code().0), format!("OpenPrinterW failed: {}", e.message())),
        )?;

        Ok(Box::new(WinSpoolConnection { handle }))
    }
}

/// An open winspool printer handle.
struct WinSpoolConnection {
    handle: PRINTER_HANDLE,
}

impl DeviceConnection for WinSpoolConnection {
    fn start_doc(&mut self, doc_name: &str, datatype: &str) -> PortResult<()> {
        let doc_name_w = to_wide(doc_name);
        let datatype_w = to_wide(datatype);
        let doc_info = DOC_INFO_1W {
            pDocName: PWSTR(doc_name_w.as_ptr() as *mut _),
            pOutputFile: PWSTR::null(),
            pDatatype: PWSTR(datatype_w.as_ptr() as *mut _),
        };

        // SAFETY: the wide strings referenced by `doc_info` live until the
        // end of this function; the spooler copies them.
        let job_id = unsafe { StartDocPrinterW(self.handle, 1, &doc_info as *const DOC_INFO_1W) };
        if job_id == 0 {
            return Err(last_error("StartDocPrinterW"));
        }
        tracing::debug!(job_id, "spooler job created");
        Ok(())
    }

    fn start_page(&mut self) -> PortResult<()> {
        // SAFETY: `self.handle` is open until `close`.
        if unsafe { StartPagePrinter(self.handle) }.as_bool() {
            Ok(())
        } else {
            Err(last_error("StartPagePrinter"))
        }
    }

    fn write(&mut self, data: &[u8]) -> PortResult<usize> {
        let len = u32::try_from(data.len()).map_err(|_| {
            OsStatus::new(
                None,
                format!("payload of {} bytes exceeds a single WritePrinter call", data.len()),
            )
        })?;
        let mut written: u32 = 0;

        // SAFETY: `data` is valid for `len` bytes; `written` is a valid
        // out-pointer.
        let ok = unsafe {
            WritePrinter(self.handle, data.as_ptr() as *const c_void, len, &mut written)
        };
        if !ok.as_bool() {
            return Err(last_error("WritePrinter"));
        }
        Ok(written as usize)
    }

    fn end_page(&mut self) -> PortResult<()> {
        // SAFETY: `self.handle` is open until `close`.
        if unsafe { EndPagePrinter(self.handle) }.as_bool() {
            Ok(())
        } else {
            Err(last_error("EndPagePrinter"))
        }
    }

    fn end_doc(&mut self) -> PortResult<()> {
        // SAFETY: `self.handle` is open until `close`.
        if unsafe { EndDocPrinter(self.handle) }.as_bool() {
            Ok(())
        } else {
            Err(last_error("EndDocPrinter"))
        }
    }

    fn close(&mut self) -> PortResult<()> {
        // SAFETY: called once per handle by `session::DeviceHandle`.
        unsafe { ClosePrinter(self.handle) }.map_err(|e| {
            OsStatus::new(Some(e.code().0), format!("ClosePrinter failed: {}", e.message()))
        })
    }
}
