// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Graham Bridge gateway: the loopback HTTP surface used by the web client.
//
//   GET  /status -> 200 {"status":"ok","version":"..."}
//   POST /print  -> {"printer":"Name","data":"<base64>"} -> {"status":"queued"}
//
// CORS is open to any origin because the listener only ever binds loopback.

pub mod request;
pub mod response;
pub mod routes;
pub mod server;

pub use request::{PrintRequest, decode_print_request};
pub use routes::{GatewayState, router};
pub use server::BridgeServer;
