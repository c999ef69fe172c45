use std::collections::HashMap;

use fleet_core::{BatchJobResult, BatchTarget, JobStatus};

/// Aggregate counts over a result set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub timed_out: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[BatchJobResult]) -> Self {
        results.iter().fold(
            Self {
                total: results.len(),
                ..Self::default()
            },
            |mut summary, result| {
                match result.status {
                    JobStatus::Success => summary.succeeded += 1,
                    JobStatus::Failed => summary.failed += 1,
                    JobStatus::Timeout => summary.timed_out += 1,
                }
                summary
            },
        )
    }

    /// Failed and timed-out targets together.
    pub fn unsuccessful(&self) -> usize {
        self.failed + self.timed_out
    }

    pub fn has_failures(&self) -> bool {
        self.unsuccessful() > 0
    }
}

/// Outcome of one batch run: exactly one result per validated target.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub command: String,
    pub validated_targets: Vec<BatchTarget>,
    /// Completion order.
    pub results: Vec<BatchJobResult>,
}

impl BatchReport {
    pub fn empty(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            validated_targets: Vec::new(),
            results: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary::from_results(&self.results)
    }

    pub fn failed_targets(&self) -> Vec<BatchTarget> {
        self.results
            .iter()
            .filter(|result| !result.status.is_success())
            .map(|result| result.target.clone())
            .collect()
    }

    /// Swap in newer results for the same targets. Results for targets that
    /// are not part of this report are ignored.
    pub fn replace_results(&mut self, newer: Vec<BatchJobResult>) -> usize {
        let mut by_target: HashMap<String, BatchJobResult> = newer
            .into_iter()
            .map(|result| (result.target.id.clone(), result))
            .collect();

        let mut replaced = 0;
        for slot in self.results.iter_mut() {
            if let Some(result) = by_target.remove(&slot.target.id) {
                *slot = result;
                replaced += 1;
            }
        }
        replaced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_testing_utils::{targets, JobResultBuilder};

    #[test]
    fn test_summary_counts() {
        let t = targets(4, "local");
        let results = vec![
            JobResultBuilder::new(t[0].clone()).build(),
            JobResultBuilder::new(t[1].clone()).failed("boom").build(),
            JobResultBuilder::new(t[2].clone()).timed_out().build(),
            JobResultBuilder::new(t[3].clone()).build(),
        ];

        let summary = BatchSummary::from_results(&results);
        assert_eq!(
            summary,
            BatchSummary {
                total: 4,
                succeeded: 2,
                failed: 1,
                timed_out: 1
            }
        );
        assert_eq!(summary.unsuccessful(), 2);
    }

    #[test]
    fn test_replace_results_matches_by_target() {
        let t = targets(3, "local");
        let mut report = BatchReport {
            command: "uptime".to_string(),
            validated_targets: t.clone(),
            results: vec![
                JobResultBuilder::new(t[0].clone()).failed("boom").build(),
                JobResultBuilder::new(t[1].clone()).build(),
                JobResultBuilder::new(t[2].clone()).timed_out().build(),
            ],
        };
        assert_eq!(report.failed_targets().len(), 2);

        let stranger = JobResultBuilder::new(targets(10, "other")[9].clone()).build();
        let replaced = report.replace_results(vec![
            JobResultBuilder::new(t[0].clone()).with_output("fixed").build(),
            stranger,
        ]);

        assert_eq!(replaced, 1);
        assert_eq!(report.results.len(), 3);
        assert_eq!(report.results[0].output, "fixed");
        assert_eq!(report.failed_targets(), vec![t[2].clone()]);
    }
}
