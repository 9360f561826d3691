// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Console control surface.
//
// Runs on the main thread while the gateway serves from the runtime's worker
// threads. Shows where the bridge is listening, opens the companion web
// client on request, and returns when the user quits. Closing stdin (as when
// run detached) does not stop the bridge; only Quit or Ctrl-C do.

use std::net::SocketAddr;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use graham_core::error::Result;

use crate::browser;

/// A command typed at the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    /// Open the companion web client in the default browser.
    OpenClient,
    /// Print the status line again.
    Status,
    Help,
    Quit,
}

impl ControlAction {
    /// Parse one input line. Case and surrounding whitespace are ignored.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "open" | "o" => Some(Self::OpenClient),
            "status" | "s" => Some(Self::Status),
            "help" | "h" | "?" => Some(Self::Help),
            "quit" | "q" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

const MENU: &str = "\
Commands:
  open    (o)  Open Braille Vibe Editor
  status  (s)  Show the bridge address
  help    (h)  Show this menu
  quit    (q)  Quit";

pub struct ControlSurface {
    addr: SocketAddr,
    client_url: String,
}

impl ControlSurface {
    pub fn new(addr: SocketAddr, client_url: impl Into<String>) -> Self {
        Self {
            addr,
            client_url: client_url.into(),
        }
    }

    /// Passive status line, e.g. `Status: Running on 127.0.0.1:8080`.
    pub fn status_line(&self) -> String {
        format!("Status: Running on {}", self.addr)
    }

    /// Read commands from stdin until Quit or Ctrl-C.
    pub async fn run(&self) -> Result<()> {
        self.run_with(BufReader::new(tokio::io::stdin()), tokio::signal::ctrl_c())
            .await
    }

    /// Read commands from `input` until Quit or until `interrupt` resolves.
    async fn run_with<R, S>(&self, input: R, interrupt: S) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        S: Future<Output = std::io::Result<()>>,
    {
        println!("Graham Bridge");
        println!("{}", self.status_line());
        println!("{MENU}");

        let mut lines = input.lines();
        let mut stdin_open = true;

        tokio::pin!(interrupt);

        loop {
            tokio::select! {
                line = lines.next_line(), if stdin_open => match line {
                    Ok(Some(line)) => {
                        if self.handle_line(&line) == Some(ControlAction::Quit) {
                            info!("quit requested from console");
                            return Ok(());
                        }
                    }
                    Ok(None) => {
                        info!("console input closed; press Ctrl-C to stop the bridge");
                        stdin_open = false;
                    }
                    Err(e) => {
                        warn!(error = %e, "console input failed; press Ctrl-C to stop the bridge");
                        stdin_open = false;
                    }
                },
                signal = &mut interrupt => {
                    signal?;
                    info!("interrupt received");
                    return Ok(());
                }
            }
        }
    }

    /// Act on one input line and return the parsed action, if any.
    fn handle_line(&self, line: &str) -> Option<ControlAction> {
        if line.trim().is_empty() {
            return None;
        }
        let action = ControlAction::parse(line);
        match action {
            Some(ControlAction::OpenClient) => self.open_client(),
            Some(ControlAction::Status) => println!("{}", self.status_line()),
            Some(ControlAction::Help) => println!("{MENU}"),
            Some(ControlAction::Quit) => {}
            None => println!("Unknown command {:?}. Type \"help\" for the menu.", line.trim()),
        }
        action
    }

    fn open_client(&self) {
        info!(url = %self.client_url, "opening web client");
        if let Err(e) = browser::open_browser(&self.client_url) {
            warn!(url = %self.client_url, error = %e, "could not open browser");
            println!("Open {} in your browser.", self.client_url);
        }
    }
}
