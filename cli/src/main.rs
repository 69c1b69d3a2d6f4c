// Copyright 2023 System76 <info@system76.com>
// SPDX-License-Identifier: MPL-2.0

use clap::Parser;
use std::fmt::Write as FmtWrite;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use xrandr_wait::{Controller, EventClass, InterestMask, Report, RunMode};

/// A requested event occurred.
const EXIT_EVENT: u8 = 0;
/// Stopped before any requested event occurred.
const EXIT_NO_EVENT: u8 = 1;
/// Invalid arguments, or help was requested.
const EXIT_USAGE: u8 = 2;
/// The display could not be reached.
const EXIT_FAILURE: u8 = 3;
/// The display lacks the RandR extension.
const EXIT_UNSUPPORTED: u8 = 4;

/// Wait for a particular XRandR event
#[derive(clap::Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Listen for specific events. If omitted, all events are listened for.
    /// This option may be specified more than once.
    /// Allowed values: crtc_change, output_change, screen_change
    #[arg(short, long = "event", value_name = "EVENT")]
    events: Vec<String>,

    /// Do not exit after an event occurs
    #[arg(short, long)]
    monitor: bool,

    /// Do not print any output
    #[arg(short, long)]
    quiet: bool,

    /// Exit if no event has occurred within the specified number of seconds
    #[arg(short, long, value_name = "SECONDS")]
    timeout: Option<u32>,
}

impl Cli {
    /// Union of the recognized `--event` names; unknown names are skipped.
    fn interest(&self) -> InterestMask {
        self.events
            .iter()
            .filter_map(|name| match EventClass::try_from(name.as_str()) {
                Ok(class) => Some(class),
                Err(why) => {
                    tracing::debug!(name = %name, why, "ignoring unknown event name");
                    None
                }
            })
            .collect()
    }

    fn mode(&self) -> RunMode {
        if self.monitor {
            RunMode::Monitor
        } else {
            RunMode::SingleShot
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(why) => {
            let _res = why.print();
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    match run(cli).await {
        Ok(report) => ExitCode::from(exit_status(&report)),
        Err(why) => {
            eprintln!("{}", error_chain(&why));
            ExitCode::from(failure_status(&why))
        }
    }
}

async fn run(cli: Cli) -> Result<Report, xrandr_wait::Error> {
    let stop = xrandr_wait::stop_flag();
    let _watcher = xrandr_wait::signals::watch(stop.clone())?;

    if let Some(seconds) = cli.timeout.filter(|seconds| *seconds > 0) {
        xrandr_wait::signals::schedule_alarm(seconds);
    }

    let interest = cli.interest();
    let mut context = xrandr_wait::connect(interest)?;

    let result = Controller::new(interest, cli.mode(), stop)
        .quiet(cli.quiet)
        .run(&mut context, &mut std::io::stdout())
        .await;

    if let Err(why) = context.close() {
        tracing::debug!(%why, "failed to close display connection");
    }

    result
}

fn exit_status(report: &Report) -> u8 {
    if report.matched() {
        EXIT_EVENT
    } else {
        EXIT_NO_EVENT
    }
}

fn failure_status(why: &xrandr_wait::Error) -> u8 {
    if why.is_unsupported() {
        EXIT_UNSUPPORTED
    } else {
        EXIT_FAILURE
    }
}

/// Formats an error followed by each of its sources.
fn error_chain(why: &dyn std::error::Error) -> String {
    let mut message = format!("{}: {why}", env!("CARGO_BIN_NAME"));

    let mut source = why.source();
    while let Some(cause) = source {
        let _res = write!(message, ": {cause}");
        source = cause.source();
    }

    message
}
