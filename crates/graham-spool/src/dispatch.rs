// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raw device dispatch.
//
// Drives one job through the spooler handshake:
//
//   open -> start doc (RAW) -> start page -> write -> end page -> end doc -> close
//
// Nothing is retried. A failure before the write stops the sequence and
// unwinds whatever was opened. Once the write has been attempted, end page
// and end doc are best-effort: their failures become warnings and never
// change the outcome decided by the write. The handle is released on every
// path after a successful open.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{debug, error, info, info_span, warn};

use graham_core::types::{
    CleanupWarning, DispatchFailure, DispatchResult, DispatchStep, PrintJob, RAW_DATATYPE,
};

use crate::port::RawPrintPort;
use crate::session::{DeviceHandle, DocSession};

/// Sends raw jobs to devices through a `RawPrintPort`.
///
/// Stateless between calls: each dispatch opens and releases its own handle,
/// so concurrent dispatches to the same device get independent handles and
/// the spooler serialises physical access.
#[derive(Clone)]
pub struct Dispatcher {
    port: Arc<dyn RawPrintPort>,
    document_name: String,
}

impl Dispatcher {
    pub fn new(port: Arc<dyn RawPrintPort>, document_name: impl Into<String>) -> Self {
        Self {
            port,
            document_name: document_name.into(),
        }
    }

    pub fn platform_name(&self) -> &str {
        self.port.platform_name()
    }

    /// Dispatch a validated job.
    pub fn dispatch_job(&self, job: &PrintJob) -> DispatchResult {
        let span = info_span!("dispatch", job_id = %job.id(), device = job.device_name());
        let _entered = span.enter();
        self.dispatch(job.device_name(), job.payload())
    }

    /// Send `payload` to `device_name` as a raw job. Blocks for the whole
    /// handshake.
    pub fn dispatch(&self, device_name: &str, payload: &[u8]) -> DispatchResult {
        if device_name.is_empty() {
            return missing_argument("device_name");
        }
        if payload.is_empty() {
            return missing_argument("payload");
        }
        if !self.port.is_available() {
            error!(platform = self.port.platform_name(), "no raw-print mechanism on this platform");
            return DispatchResult::failure(
                DispatchFailure::Unsupported {
                    platform: self.port.platform_name().to_owned(),
                },
                Vec::new(),
            );
        }

        info!(
            device = device_name,
            bytes = payload.len(),
            sha256 = %hex::encode(Sha256::digest(payload)),
            "dispatching raw job"
        );

        let mut handle = match DeviceHandle::open(self.port.as_ref(), device_name) {
            Ok(handle) => handle,
            Err(status) => {
                warn!(device = device_name, error = %status, "failed to open device");
                return DispatchResult::failure(
                    DispatchFailure::Step {
                        step: DispatchStep::Open,
                        status,
                    },
                    Vec::new(),
                );
            }
        };

        let mut warnings = Vec::new();
        let outcome = self.run_document(&mut handle, payload, &mut warnings);

        if let Err(status) = handle.close() {
            warnings.push(CleanupWarning {
                step: DispatchStep::Close,
                status,
            });
        }

        for warning in &warnings {
            warn!(device = device_name, step = %warning.step, error = %warning.status, "cleanup step failed");
        }

        match outcome {
            Ok(()) => {
                info!(device = device_name, bytes = payload.len(), "raw job delivered to spooler");
                DispatchResult::success(warnings)
            }
            Err(failure) => {
                error!(device = device_name, error = %failure, "raw job failed");
                DispatchResult::failure(failure, warnings)
            }
        }
    }

    /// Start the document, run the page, and end the document whatever the
    /// page outcome.
    fn run_document(
        &self,
        handle: &mut DeviceHandle,
        payload: &[u8],
        warnings: &mut Vec<CleanupWarning>,
    ) -> Result<(), DispatchFailure> {
        let mut doc = handle
            .start_doc(&self.document_name, RAW_DATATYPE)
            .map_err(|status| DispatchFailure::Step {
                step: DispatchStep::StartDoc,
                status,
            })?;

        let outcome = write_page(&mut doc, payload, warnings);

        if let Err(status) = doc.end() {
            warnings.push(CleanupWarning {
                step: DispatchStep::EndDoc,
                status,
            });
        }
        outcome
    }
}

/// Start a page, write the payload in one call, and end the page.
fn write_page(
    doc: &mut DocSession<'_>,
    payload: &[u8],
    warnings: &mut Vec<CleanupWarning>,
) -> Result<(), DispatchFailure> {
    let mut page = doc.start_page().map_err(|status| DispatchFailure::Step {
        step: DispatchStep::StartPage,
        status,
    })?;

    let outcome = match page.write(payload) {
        Err(status) => Err(DispatchFailure::Step {
            step: DispatchStep::Write,
            status,
        }),
        // The spooler may accept fewer bytes without reporting an error.
        Ok(written) if written < payload.len() => Err(DispatchFailure::ShortWrite {
            written,
            requested: payload.len(),
        }),
        // A count above the request means the spooler's report is unreliable.
        Ok(written) if written > payload.len() => Err(DispatchFailure::OverWrite {
            written,
            requested: payload.len(),
        }),
        Ok(written) => {
            debug!(written, "write complete");
            Ok(())
        }
    };

    if let Err(status) = page.end() {
        warnings.push(CleanupWarning {
            step: DispatchStep::EndPage,
            status,
        });
    }
    outcome
}

fn missing_argument(argument: &str) -> DispatchResult {
    warn!(argument, "dispatch called with an empty argument");
    DispatchResult::failure(
        DispatchFailure::MissingArgument {
            argument: argument.to_owned(),
        },
        Vec::new(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::{PortCall, SimulatedPort};
    use crate::unsupported::UnsupportedPort;

    const DOC_NAME: &str = "Braille Vibe Job";

    fn dispatcher(port: &SimulatedPort) -> Dispatcher {
        Dispatcher::new(Arc::new(port.clone()), DOC_NAME)
    }

    #[test]
    fn successful_dispatch_runs_full_handshake_in_order() {
        let port = SimulatedPort::new();
        let result = dispatcher(&port).dispatch("Embosser1", b"hello");

        assert!(result.succeeded());
        assert!(result.warnings().is_empty());
        assert_eq!(
            port.calls(),
            vec![
                PortCall::Open("Embosser1".into()),
                PortCall::StartDoc {
                    doc_name: DOC_NAME.into(),
                    datatype: "RAW".into(),
                },
                PortCall::StartPage,
                PortCall::Write(b"hello".to_vec()),
                PortCall::EndPage,
                PortCall::EndDoc,
                PortCall::Close,
            ]
        );
    }

    #[test]
    fn empty_arguments_fail_before_any_spooler_call() {
        let port = SimulatedPort::new();
        let d = dispatcher(&port);

        let no_device = d.dispatch("", b"hello");
        let no_payload = d.dispatch("Embosser1", b"");

        assert!(matches!(
            no_device.failure_reason(),
            Some(DispatchFailure::MissingArgument { argument }) if argument == "device_name"
        ));
        assert!(matches!(
            no_payload.failure_reason(),
            Some(DispatchFailure::MissingArgument { argument }) if argument == "payload"
        ));
        assert!(port.calls().is_empty());
    }

    #[test]
    fn open_failure_stops_the_handshake() {
        let port = SimulatedPort::new().fail_at(DispatchStep::Open, 1801);
        let result = dispatcher(&port).dispatch("Nowhere", b"hello");

        assert!(!result.succeeded());
        let reason = result.failure_reason().unwrap();
        assert_eq!(reason.step(), Some(DispatchStep::Open));
        assert!(matches!(
            reason,
            DispatchFailure::Step { status, .. } if status.code == Some(1801)
        ));
        assert_eq!(port.calls(), vec![PortCall::Open("Nowhere".into())]);
        assert_eq!(port.close_count(), 0);
    }

    #[test]
    fn start_doc_failure_releases_handle_only() {
        let port = SimulatedPort::new().fail_at(DispatchStep::StartDoc, 5);
        let result = dispatcher(&port).dispatch("Embosser1", b"hello");

        assert_eq!(
            result.failure_reason().and_then(DispatchFailure::step),
            Some(DispatchStep::StartDoc)
        );
        assert_eq!(port.count(DispatchStep::StartPage), 0);
        assert_eq!(port.count(DispatchStep::EndDoc), 0);
        assert_eq!(port.close_count(), 1);
    }

    #[test]
    fn start_page_failure_ends_document_and_releases_handle() {
        let port = SimulatedPort::new().fail_at(DispatchStep::StartPage, 5);
        let result = dispatcher(&port).dispatch("Embosser1", b"hello");

        assert_eq!(
            result.failure_reason().and_then(DispatchFailure::step),
            Some(DispatchStep::StartPage)
        );
        assert_eq!(port.count(DispatchStep::Write), 0);
        assert_eq!(port.count(DispatchStep::EndPage), 0);
        assert_eq!(port.count(DispatchStep::EndDoc), 1);
        assert_eq!(port.close_count(), 1);
    }

    #[test]
    fn short_write_is_a_write_failure() {
        let port = SimulatedPort::new().short_write(3);
        let result = dispatcher(&port).dispatch("Embosser1", b"hello");

        assert!(!result.succeeded());
        assert_eq!(
            result.failure_reason(),
            Some(&DispatchFailure::ShortWrite {
                written: 3,
                requested: 5,
            })
        );
        // Cleanup still runs after the attempted transfer.
        assert_eq!(port.count(DispatchStep::EndPage), 1);
        assert_eq!(port.count(DispatchStep::EndDoc), 1);
        assert_eq!(port.close_count(), 1);
    }

    #[test]
    fn over_reported_write_is_not_a_short_write() {
        let port = SimulatedPort::new().over_report(2);
        let result = dispatcher(&port).dispatch("Embosser1", b"hello");

        assert_eq!(
            result.failure_reason(),
            Some(&DispatchFailure::OverWrite {
                written: 7,
                requested: 5,
            })
        );
        assert_eq!(port.close_count(), 1);
    }

    #[test]
    fn cleanup_failure_after_failed_write_keeps_the_write_failure() {
        let port = SimulatedPort::new()
            .short_write(3)
            .fail_at(DispatchStep::EndDoc, 6);
        let result = dispatcher(&port).dispatch("Embosser1", b"hello");

        assert!(!result.succeeded());
        assert_eq!(
            result.failure_reason(),
            Some(&DispatchFailure::ShortWrite {
                written: 3,
                requested: 5,
            })
        );
        assert_eq!(result.warnings().len(), 1);
        assert_eq!(result.warnings()[0].step, DispatchStep::EndDoc);
        assert_eq!(port.close_count(), 1);
    }

    #[test]
    fn hard_write_error_is_distinct_from_short_write() {
        let port = SimulatedPort::new().fail_at(DispatchStep::Write, 995);
        let result = dispatcher(&port).dispatch("Embosser1", b"hello");

        assert!(matches!(
            result.failure_reason(),
            Some(DispatchFailure::Step {
                step: DispatchStep::Write,
                ..
            })
        ));
        assert_eq!(port.close_count(), 1);
    }

    #[test]
    fn cleanup_failure_after_full_write_is_a_warning() {
        for step in [DispatchStep::EndPage, DispatchStep::EndDoc, DispatchStep::Close] {
            let port = SimulatedPort::new().fail_at(step, 6);
            let result = dispatcher(&port).dispatch("Embosser1", b"hello");

            assert!(result.succeeded(), "{step} failure must not fail the job");
            assert_eq!(result.warnings().len(), 1);
            assert_eq!(result.warnings()[0].step, step);
            assert_eq!(port.close_count(), 1);
        }
    }

    #[test]
    fn acquire_and_release_counts_match_across_mixed_outcomes() {
        let port = SimulatedPort::new();
        let d = dispatcher(&port);
        let script = [
            None,
            Some((DispatchStep::Open, 2)),
            Some((DispatchStep::StartDoc, 5)),
            None,
            Some((DispatchStep::StartPage, 5)),
            Some((DispatchStep::Write, 995)),
            Some((DispatchStep::EndPage, 6)),
            Some((DispatchStep::EndDoc, 6)),
            Some((DispatchStep::Close, 6)),
            None,
        ];

        for failure in script {
            port.set_failure(failure);
            d.dispatch("Embosser1", b"\x1b@braille");
        }

        assert_eq!(port.open_count(), script.len() - 1);
        assert_eq!(port.open_count(), port.close_count());
    }

    #[test]
    fn unsupported_platform_fails_without_spooler_calls() {
        let d = Dispatcher::new(Arc::new(UnsupportedPort::new()), DOC_NAME);
        let result = d.dispatch("Embosser1", b"hello");

        assert!(matches!(
            result.failure_reason(),
            Some(DispatchFailure::Unsupported { .. })
        ));
    }

    #[test]
    fn dispatch_job_sends_exact_bytes() {
        let port = SimulatedPort::new();
        let payload: Vec<u8> = (0..=255).collect();
        let job = PrintJob::new("Embosser1", payload.clone()).unwrap();

        let result = dispatcher(&port).dispatch_job(&job);

        assert!(result.succeeded());
        assert_eq!(port.written(), payload);
    }
}
