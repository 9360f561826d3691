// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Graham Bridge spool: raw device dispatch through the native print spooler.
//
// The rest of the bridge depends only on `Dispatcher::dispatch`. Each target
// platform supplies a `RawPrintPort` that owns its foreign-call bindings;
// platforms without one get `UnsupportedPort`.

pub mod dispatch;
pub mod port;
pub mod session;
pub mod simulated;
pub mod unsupported;

#[cfg(windows)]
pub mod winspool;

use std::sync::Arc;

pub use dispatch::Dispatcher;
pub use port::{DeviceConnection, RawPrintPort};
pub use simulated::SimulatedPort;

/// Returns the raw-print port for the target operating system.
pub fn platform_port() -> Arc<dyn RawPrintPort> {
    #[cfg(windows)]
    {
        // Windows: winspool.drv through the `windows` crate.
        Arc::new(winspool::WinSpoolPort::new())
    }
    #[cfg(not(windows))]
    {
        Arc::new(unsupported::UnsupportedPort::new())
    }
}
