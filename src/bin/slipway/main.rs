//! slipway CLI - component build tool for embedded IPC applications

use std::io::IsTerminal;

use anyhow::{bail, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Cli;
use slipway::ops::{self, Outcome};
use slipway::util::diagnostic::{
    self, suggestions, ApiFileNotFoundError, ComponentNotFoundError, Diagnostic,
};
use slipway::util::process;

fn main() {
    if let Err(e) = run() {
        report(&e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("slipway=debug")
    } else {
        EnvFilter::new("slipway=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let argv: Vec<String> = std::env::args().collect();
    let opts = cli.into_options(argv);

    match ops::make_component(&opts)? {
        Outcome::Done => Ok(()),
        Outcome::FastPath(cmd) | Outcome::Delegate(cmd) => {
            if process::find_ninja().is_none() {
                bail!("ninja not found on PATH\n{}", suggestions::NINJA_NOT_FOUND);
            }

            // Terminal hand-off to the external executor: on success this
            // never returns, so nothing after it can be relied upon.
            cmd.exec_replace()
        }
    }
}

/// Print a fatal error, with suggestions for the lookup failures a user
/// can actually act on.
fn report(err: &anyhow::Error) {
    let mut diag = Diagnostic::error(format!("{:#}", err));

    if let Some(not_found) = err.downcast_ref::<ComponentNotFoundError>() {
        for dir in &not_found.searched {
            diag = diag.with_context(format!("searched: {}", dir.display()));
        }
        diag = diag.with_suggestion(suggestions::COMPONENT_NOT_FOUND);
    } else if err.downcast_ref::<ApiFileNotFoundError>().is_some() {
        diag = diag.with_suggestion(suggestions::API_NOT_FOUND);
    }

    diagnostic::emit(&diag, std::io::stderr().is_terminal());
}
