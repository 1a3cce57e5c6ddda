// pensettings/src/main.rs

mod cli;
mod config;
mod logging;
mod paths;
mod registry;
mod settings;

use crate::cli::{report_error, run_cli};

fn main() {
    // Warnings are recorded from the start; info lines once config says so.
    logging::init(false);
    let cfg = config::load_config();
    logging::set_debug(cfg.debug_logging);
    info!("pensettings starting");

    let code = match run_cli() {
        Ok(()) => 0,
        Err(e) => report_error(e.as_ref()),
    };

    info!("pensettings exiting with code {code}");
    logging::flush();
    std::process::exit(code);
}
