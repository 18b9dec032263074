use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExportError>;

/// Errors that abort the whole export run
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("login failed: {0}")]
    AuthError(String),
    #[error("operation requires a logged in session")]
    NotAuthenticated,
    #[error("could not create output folder {}: {source}", path.display())]
    OutputFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    pub fn human_readable_error_message(&self) -> String {
        match self {
            ExportError::AuthError(_) => "Login failed. Check credentials and API URL.".to_string(),
            ExportError::NotAuthenticated => "Not logged in.".to_string(),
            ExportError::OutputFolder { path, .. } => {
                format!("Could not create the output folder {}", path.display())
            }
        }
    }

    pub fn error_code(&self) -> i32 {
        match self {
            ExportError::AuthError(_) => 1,
            ExportError::NotAuthenticated => 2,
            ExportError::OutputFolder { .. } => 3,
        }
    }
}

/// Failure of a single HTTP exchange, never fatal on its own
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("transport error: {0}")]
    Transport(#[from] curl::Error),
    #[error("server answered with status {0}")]
    Status(u32),
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("response did not contain a result")]
    EmptyResult,
}

/// Reason a single note was skipped
#[derive(Error, Debug)]
pub enum NoteError {
    #[error("note '{0}' has no GUID")]
    MissingDocId(String),
    #[error("failed to download content for note '{0}'")]
    DownloadFailed(String),
    #[error("failed to write note '{title}': {source}")]
    WriteFailed {
        title: String,
        #[source]
        source: std::io::Error,
    },
}
