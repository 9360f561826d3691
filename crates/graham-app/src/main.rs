// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Graham Bridge: local print bridge for Braille embossers.
//
// Entry point. Loads configuration, initialises logging, starts the loopback
// gateway on a multi-threaded runtime, then hands the main thread to the
// console control surface. Returning from the control surface ends the
// process.

mod browser;
mod config_dir;
mod control;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use graham_core::BridgeConfig;
use graham_core::error::Result;
use graham_gateway::{BridgeServer, GatewayState};
use graham_spool::{Dispatcher, RawPrintPort, SimulatedPort};

use control::ControlSurface;

fn main() -> ExitCode {
    let (config, config_path) = match load_config() {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("graham-bridge: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(config.log_filter.as_deref());
    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.display(),
        "Graham Bridge starting"
    );

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Graham Bridge failed");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` first, then the config's filter, then `info`.
fn init_tracing(config_filter: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config_filter.unwrap_or("info")))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config() -> Result<(BridgeConfig, PathBuf)> {
    let lookup = |key: &str| std::env::var(key).ok();
    let path = config_dir::config_path(lookup);
    let config = BridgeConfig::load(&path)?.apply_env(lookup)?;
    Ok((config, path))
}

fn spool_port(config: &BridgeConfig) -> Arc<dyn RawPrintPort> {
    if config.simulate {
        warn!("simulated spooler selected: jobs are logged, not printed");
        return Arc::new(SimulatedPort::untracked());
    }
    graham_spool::platform_port()
}

fn run(config: BridgeConfig) -> Result<()> {
    let port = spool_port(&config);
    if !port.is_available() {
        warn!(
            platform = port.platform_name(),
            "raw printing is not available here; print requests will be refused"
        );
    }

    let dispatcher = Dispatcher::new(port, config.document_name.clone());
    let state = GatewayState::new(dispatcher, config.max_body_bytes);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("graham-bridge")
        .build()?;

    let result = runtime.block_on(async {
        let mut server = BridgeServer::from_config(&config)?;
        let addr = server.start(state).await?;
        ControlSurface::new(addr, config.client_url.as_str())
            .run()
            .await
    });

    info!("Shutting down Graham Bridge...");
    // The stdin reader may be parked on a blocking read; do not wait for it
    // or for in-flight dispatches.
    runtime.shutdown_background();
    result
}
