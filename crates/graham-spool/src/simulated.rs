// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory spooler for development hosts and tests.
//
// Accepts every call by default and can be scripted to fail at any step or
// to short-write. All clones share one call log and one set of counters, so
// a test can hand a clone to the gateway and inspect the original.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::info;

use graham_core::types::{DispatchStep, OsStatus};

use crate::port::{DeviceConnection, PortResult, RawPrintPort};

/// One recorded spooler call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortCall {
    Open(String),
    StartDoc { doc_name: String, datatype: String },
    StartPage,
    Write(Vec<u8>),
    EndPage,
    EndDoc,
    Close,
}

#[derive(Debug, Default)]
struct State {
    record: bool,
    calls: Vec<PortCall>,
    opened: usize,
    closed: usize,
    /// Step that fails, with the OS code it reports.
    failure: Option<(DispatchStep, i32)>,
    /// How a successful write reports its byte count.
    write_report: Option<WriteReport>,
}

#[derive(Debug, Clone, Copy)]
enum WriteReport {
    /// At most this many bytes.
    Capped(usize),
    /// This many bytes beyond the payload length.
    Extra(usize),
}

/// Scriptable stand-in for the OS spooler.
#[derive(Debug, Clone)]
pub struct SimulatedPort {
    state: Arc<Mutex<State>>,
}

impl Default for SimulatedPort {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedPort {
    /// A port that records every call, payload bytes included.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                record: true,
                ..State::default()
            })),
        }
    }

    /// A port that only keeps counters. Used by the `simulate` runtime mode
    /// where the call log would otherwise grow without bound.
    pub fn untracked() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Make `step` fail with OS code `code` on every dispatch.
    pub fn fail_at(self, step: DispatchStep, code: i32) -> Self {
        self.set_failure(Some((step, code)));
        self
    }

    /// Make every write accept at most `limit` bytes while reporting success.
    pub fn short_write(self, limit: usize) -> Self {
        self.lock().write_report = Some(WriteReport::Capped(limit));
        self
    }

    /// Make every write report `extra` bytes more than it was given.
    pub fn over_report(self, extra: usize) -> Self {
        self.lock().write_report = Some(WriteReport::Extra(extra));
        self
    }

    /// Change or clear the scripted failure.
    pub fn set_failure(&self, failure: Option<(DispatchStep, i32)>) {
        self.lock().failure = failure;
    }

    pub fn calls(&self) -> Vec<PortCall> {
        self.lock().calls.clone()
    }

    /// Concatenation of every payload written so far.
    pub fn written(&self) -> Vec<u8> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                PortCall::Write(bytes) => Some(bytes.as_slice()),
                _ => None,
            })
            .flatten()
            .copied()
            .collect()
    }

    /// Number of calls of the given kind.
    pub fn count(&self, step: DispatchStep) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call_step(call) == step)
            .count()
    }

    pub fn open_count(&self) -> usize {
        self.lock().opened
    }

    pub fn close_count(&self) -> usize {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A poisoned log still holds valid counters.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn call_step(call: &PortCall) -> DispatchStep {
    match call {
        PortCall::Open(_) => DispatchStep::Open,
        PortCall::StartDoc { .. } => DispatchStep::StartDoc,
        PortCall::StartPage => DispatchStep::StartPage,
        PortCall::Write(_) => DispatchStep::Write,
        PortCall::EndPage => DispatchStep::EndPage,
        PortCall::EndDoc => DispatchStep::EndDoc,
        PortCall::Close => DispatchStep::Close,
    }
}

/// Record `call`, then return the scripted outcome for its step.
fn enter(state: &Mutex<State>, call: PortCall) -> PortResult<()> {
    let mut state = state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let step = call_step(&call);
    if step == DispatchStep::Close {
        state.closed += 1;
    }
    if state.record {
        state.calls.push(call);
    }
    match state.failure {
        Some((failing, code)) if failing == step => Err(OsStatus::new(
            Some(code),
            format!("simulated {step} failure"),
        )),
        _ => Ok(()),
    }
}

impl RawPrintPort for SimulatedPort {
    fn platform_name(&self) -> &str {
        "simulated spooler"
    }

    fn open(&self, device_name: &str) -> PortResult<Box<dyn DeviceConnection>> {
        enter(&self.state, PortCall::Open(device_name.to_owned()))?;
        self.lock().opened += 1;
        Ok(Box::new(SimulatedConnection {
            device: device_name.to_owned(),
            state: Arc::clone(&self.state),
        }))
    }
}

struct SimulatedConnection {
    device: String,
    state: Arc<Mutex<State>>,
}

impl DeviceConnection for SimulatedConnection {
    fn start_doc(&mut self, doc_name: &str, datatype: &str) -> PortResult<()> {
        enter(
            &self.state,
            PortCall::StartDoc {
                doc_name: doc_name.to_owned(),
                datatype: datatype.to_owned(),
            },
        )
    }

    fn start_page(&mut self) -> PortResult<()> {
        enter(&self.state, PortCall::StartPage)
    }

    fn write(&mut self, data: &[u8]) -> PortResult<usize> {
        enter(&self.state, PortCall::Write(data.to_vec()))?;
        let report = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .write_report;
        let accepted = match report {
            None => data.len(),
            Some(WriteReport::Capped(limit)) => data.len().min(limit),
            Some(WriteReport::Extra(extra)) => data.len() + extra,
        };
        info!(device = %self.device, bytes = accepted, "simulated spooler accepted payload");
        Ok(accepted)
    }

    fn end_page(&mut self) -> PortResult<()> {
        enter(&self.state, PortCall::EndPage)
    }

    fn end_doc(&mut self) -> PortResult<()> {
        enter(&self.state, PortCall::EndDoc)
    }

    fn close(&mut self) -> PortResult<()> {
        enter(&self.state, PortCall::Close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_open_failure_does_not_count_as_opened() {
        let port = SimulatedPort::new().fail_at(DispatchStep::Open, 1801);
        let err = port.open("Missing").err().unwrap();
        assert_eq!(err.code, Some(1801));
        assert_eq!(port.open_count(), 0);
        assert_eq!(port.count(DispatchStep::Open), 1);
    }

    #[test]
    fn short_write_caps_accepted_bytes() {
        let port = SimulatedPort::new().short_write(2);
        let mut conn = port.open("Embosser1").unwrap();
        assert_eq!(conn.write(b"hello").unwrap(), 2);
        // The full buffer was offered to the spooler.
        assert_eq!(port.written(), b"hello");
    }

    #[test]
    fn untracked_port_keeps_counters_only() {
        let port = SimulatedPort::untracked();
        let mut conn = port.open("Embosser1").unwrap();
        conn.close().unwrap();
        assert!(port.calls().is_empty());
        assert_eq!(port.open_count(), 1);
        assert_eq!(port.close_count(), 1);
    }
}
