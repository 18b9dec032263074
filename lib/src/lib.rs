#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate lazy_static;

pub mod error;
pub mod policy;
pub mod config;
pub mod http;
pub mod model;
pub mod session;
pub mod catalog;
pub mod downloader;
pub mod exporter;
pub mod run;
pub mod builder;

pub use config::ExportConfig;
pub use error::{ExportError, Result};
pub use exporter::ExportReport;
pub use run::{run, run_with_curl, RunOutcome};

#[cfg(test)]
#[ctor::ctor]
fn init() {
    let _ = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Debug)
        .init();
}
