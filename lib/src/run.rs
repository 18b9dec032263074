use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::catalog::list_folders;
use crate::config::ExportConfig;
use crate::error::ExportError::OutputFolder;
use crate::error::Result;
use crate::exporter::{ExportReport, Exporter};
use crate::http::{CurlTransport, HttpTransport};
use crate::session::login;

#[derive(Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(ExportReport),
    Cancelled(ExportReport),
    NoFolders,
}

/// Logs in, lists every folder and exports it below `config.output`
pub fn run(config: &ExportConfig, transport: &dyn HttpTransport, interrupted: Arc<AtomicBool>) -> Result<RunOutcome> {
    fs::create_dir_all(&config.output)
        .map_err(|source| OutputFolder { path: config.output.clone(), source })?;
    let absolute = fs::canonicalize(&config.output).unwrap_or_else(|_| config.output.clone());
    info!("Output folder: {}", absolute.display());

    let session = login(transport, &config.user, &config.password, &config.api_url)?;
    if interrupted.load(Ordering::SeqCst) {
        return Ok(RunOutcome::Cancelled(ExportReport::default()));
    }

    let folders = list_folders(transport, &session)?;
    if folders.is_empty() {
        return Ok(RunOutcome::NoFolders);
    }

    let report = Exporter::new(transport, &config.output)
        .with_interrupt(interrupted)
        .export_all(&session, &folders)?;

    if report.cancelled {
        Ok(RunOutcome::Cancelled(report))
    } else {
        Ok(RunOutcome::Completed(report))
    }
}

/// [`run`] over libcurl, using the request policy of `config`
pub fn run_with_curl(config: &ExportConfig, interrupted: Arc<AtomicBool>) -> Result<RunOutcome> {
    let transport = CurlTransport::new(config.policy);
    run(config, &transport, interrupted)
}
