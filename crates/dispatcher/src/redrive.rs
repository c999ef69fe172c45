use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use crate::report::BatchReport;

/// Decides whether the failed targets of a finished run are run again.
#[async_trait]
pub trait RedriveDecider: Send + Sync {
    async fn should_redrive(&self, report: &BatchReport) -> bool;
}

/// Never re-drives.
pub struct NeverRedrive;

#[async_trait]
impl RedriveDecider for NeverRedrive {
    async fn should_redrive(&self, _report: &BatchReport) -> bool {
        false
    }
}

/// Agrees to a fixed number of re-drives, then declines.
pub struct RedriveUpTo {
    remaining: AtomicU32,
}

impl RedriveUpTo {
    pub fn new(times: u32) -> Self {
        Self {
            remaining: AtomicU32::new(times),
        }
    }
}

#[async_trait]
impl RedriveDecider for RedriveUpTo {
    async fn should_redrive(&self, _report: &BatchReport) -> bool {
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}
