//! Print every RandR notification on the default display until interrupted.
//!
//! May be used to check how a display configuration change is reported.

use xrandr_wait::{Controller, InterestMask, RunMode};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let stop = xrandr_wait::stop_flag();
    let _watcher = xrandr_wait::signals::watch(stop.clone())?;

    let mut context = xrandr_wait::connect(InterestMask::ALL)?;

    let report = Controller::new(InterestMask::ALL, RunMode::Monitor, stop)
        .run(&mut context, &mut std::io::stdout())
        .await?;

    eprintln!("{report:?}");

    Ok(())
}
