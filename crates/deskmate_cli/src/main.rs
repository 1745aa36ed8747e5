//! `deskmate` binary: interactive shell over stdin/stdout.
//!
//! # Responsibility
//! - Resolve configuration, start logging, load saved state.
//! - Run the shell until `exit`, end-of-input or Ctrl+C at the top prompt.
//!
//! Exit code 1 means the assistant could not start; command errors never
//! change the exit code.

use deskmate_core::{build_assistant, init_logging, AppConfig, SqliteStateGateway, StdTerminal};
use log::{error, info, warn};
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("deskmate: {err}");
            return ExitCode::FAILURE;
        }
    };

    // The shell stays usable without a log file.
    if let Err(err) = init_logging(config.log_level, &config.log_dir) {
        eprintln!("deskmate: logging disabled: {err}");
    }

    let gateway = SqliteStateGateway::new(config.data_file.clone());
    let mut assistant = match build_assistant(Box::new(gateway)) {
        Ok(assistant) => assistant,
        Err(err) => {
            error!("event=app_start module=cli status=error error={err}");
            eprintln!("deskmate: {err}");
            return ExitCode::FAILURE;
        }
    };
    assistant.load_state();
    info!(
        "event=state_ready module=cli status=ok data_file={}",
        config.data_file.display()
    );

    let mut terminal = StdTerminal::new();
    // Without the handler Ctrl+C kills the process and skips the final save.
    if let Err(err) = terminal.catch_ctrl_c() {
        warn!("event=interrupt_handler module=cli status=error error={err}");
    }
    match assistant.run(&mut terminal) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=shell_stop module=cli status=error error={err}");
            eprintln!("deskmate: {err}");
            ExitCode::FAILURE
        }
    }
}
