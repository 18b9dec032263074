use std::time::Duration;

pub const DEFAULT_DEADLINE_SECS: u64 = 30;

/// Deadline applied to every request sent by a transport.
///
/// Requests are attempted exactly once, a failed attempt is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestPolicy {
    deadline: Duration,
}

impl RequestPolicy {
    pub fn new(deadline: Duration) -> RequestPolicy {
        RequestPolicy { deadline }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

impl Default for RequestPolicy {
    fn default() -> Self {
        RequestPolicy::new(Duration::from_secs(DEFAULT_DEADLINE_SECS))
    }
}
