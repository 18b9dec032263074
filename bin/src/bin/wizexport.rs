extern crate wizexport_lib;
extern crate wizexport_bin;
#[macro_use]
extern crate log;
extern crate colored;
extern crate ctrlc;
extern crate flexi_logger;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use colored::Colorize;
use flexi_logger::{DeferredNow, Logger, Record};
use wizexport_bin::app::{config_from_matches, gen_app};
use wizexport_lib::{run_with_curl, ExportReport, RunOutcome};

//Minimal println like formatting for flexi_logger
pub fn default_format(
    w: &mut dyn std::io::Write,
    _now: &mut DeferredNow,
    record: &Record,
) -> core::result::Result<(), std::io::Error> {
    write!(
        w,
        "{}",
        record.args()
    )
}

fn print_summary(report: &ExportReport) {
    info!("{} folder(s) processed, {} note(s) exported, {} skipped",
          report.folders, report.exported, report.failed);
}

pub fn main() {

    let _logger = Logger::try_with_str("info")
        .and_then(|logger| logger.format(default_format).start())
        .map_err(|e| eprintln!("Could not start logger: {}", e))
        .ok();

    let matches = gen_app().get_matches();

    let config = match config_from_matches(&matches) {
        Some(config) => config,
        None => {
            error!("Missing required arguments");
            return;
        }
    };

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = interrupted.clone();
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        warn!("Could not install interrupt handler: {}", e);
    }

    info!("{}", "#".repeat(60));
    info!("# WizNote Export Tool");
    info!("{}", "#".repeat(60));

    match run_with_curl(&config, interrupted) {
        Ok(RunOutcome::Completed(report)) => {
            info!("{}", "Export Complete!".green());
            print_summary(&report);
        }
        Ok(RunOutcome::Cancelled(report)) => {
            warn!("{}", "Export cancelled by user".yellow());
            print_summary(&report);
        }
        Ok(RunOutcome::NoFolders) => {
            warn!("{}", "No folders found to export".yellow());
        }
        Err(e) => {
            error!("Error: {}\n{} - ({})", e.human_readable_error_message().red(), e.to_string(), e.error_code().to_string());
        }
    }
}
