#![cfg_attr(all(windows, not(feature = "console")), windows_subsystem = "windows")]

use std::process::ExitCode;

fn main() -> ExitCode {
    sit_smart_coach::run_cli()
}
