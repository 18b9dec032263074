use std::fmt;
use std::path::PathBuf;

use crate::policy::RequestPolicy;

/// Everything a run needs, assembled by the command line front end
#[derive(Clone)]
pub struct ExportConfig {
    pub user: String,
    pub password: String,
    pub output: PathBuf,
    pub api_url: String,
    pub policy: RequestPolicy,
}

impl ExportConfig {
    pub fn new(user: &str, password: &str, output: PathBuf, api_url: &str) -> ExportConfig {
        ExportConfig {
            user: user.to_string(),
            password: password.to_string(),
            output,
            api_url: api_url.to_string(),
            policy: RequestPolicy::default(),
        }
    }
}

impl fmt::Debug for ExportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportConfig")
            .field("user", &self.user)
            .field("password", &"***")
            .field("output", &self.output)
            .field("api_url", &self.api_url)
            .field("policy", &self.policy)
            .finish()
    }
}
