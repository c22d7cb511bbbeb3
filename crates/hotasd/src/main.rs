use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match hotasd::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            writeln!(io::stderr(), "hotasd: {error}").ok();
            ExitCode::from(error.exit_code())
        }
    }
}
