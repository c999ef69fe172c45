use std::sync::{Arc, Mutex, PoisonError};

use fleet_core::{
    BatchConfig, BatchJobResult, BatchTarget, HistoryStore, RemoteCommandRunner,
    TargetStatusProvider,
};
use futures::stream::{self, StreamExt};
use metrics::counter;
use tokio::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};

use crate::poller::{InvocationPoller, PollSettings};
use crate::redrive::RedriveDecider;
use crate::report::BatchReport;
use crate::retry::RetryPolicy;
use crate::validation::TargetValidator;
use crate::worker::{executor_error_result, TargetWorker};

/// Runs one command across many targets through a bounded worker pool.
///
/// Every validated target ends up with exactly one result, whatever happens to
/// its attempts. Results are appended to an in-memory history and flushed to
/// the history store after each run; a failed flush is logged and ignored.
pub struct BatchExecutor {
    worker: TargetWorker,
    validator: TargetValidator,
    history_store: Arc<dyn HistoryStore>,
    history: Mutex<Vec<BatchJobResult>>,
    history_cap: usize,
    max_concurrency: usize,
}

impl BatchExecutor {
    pub fn new(
        runner: Arc<dyn RemoteCommandRunner>,
        status_provider: Arc<dyn TargetStatusProvider>,
        history_store: Arc<dyn HistoryStore>,
        config: &BatchConfig,
        history_cap: usize,
    ) -> Self {
        let poller = InvocationPoller::new(Arc::clone(&runner), PollSettings::from_config(config));
        let worker = TargetWorker::new(
            runner,
            poller,
            RetryPolicy::from_config(config),
            config.command_timeout(),
        );

        Self {
            worker,
            validator: TargetValidator::new(status_provider),
            history_store,
            history: Mutex::new(Vec::new()),
            history_cap,
            max_concurrency: config.max_concurrency.max(1),
        }
    }

    /// Validate `targets`, then run `command` on the ones that remain.
    ///
    /// With nothing left after validation the report is empty and no command
    /// is dispatched.
    pub async fn execute(&self, targets: Vec<BatchTarget>, command: &str) -> BatchReport {
        let span = info_span!("batch_execute", targets = targets.len(), command = %command);

        async move {
            let validated = self.validator.validate(targets).await;
            if validated.is_empty() {
                warn!("校验后没有可用的目标，不执行命令");
                return BatchReport::empty(command);
            }

            let results = self.run_pool(validated.clone(), command).await;
            self.record(&results).await;

            let report = BatchReport {
                command: command.to_string(),
                validated_targets: validated,
                results,
            };
            let summary = report.summary();
            info!(
                "批量执行完成: 共 {} 个, 成功 {}, 失败 {}, 超时 {}",
                summary.total, summary.succeeded, summary.failed, summary.timed_out
            );
            report
        }
        .instrument(span)
        .await
    }

    /// Run the report's failed targets again with a fresh retry budget and
    /// put the new outcomes in place of the old ones.
    ///
    /// The failed subset goes through validation again; targets dropped there
    /// keep their previous result.
    pub async fn redrive(&self, mut report: BatchReport) -> BatchReport {
        let failed = report.failed_targets();
        if failed.is_empty() {
            return report;
        }

        info!("重新执行 {} 个失败的目标", failed.len());
        let rerun = self.execute(failed, &report.command).await;
        let replaced = report.replace_results(rerun.results);
        info!("重新执行完成，更新了 {} 个结果", replaced);
        report
    }

    /// `execute`, then offer re-drives while failures remain and `decider`
    /// agrees.
    pub async fn execute_with_redrive(
        &self,
        targets: Vec<BatchTarget>,
        command: &str,
        decider: &dyn RedriveDecider,
    ) -> BatchReport {
        let mut report = self.execute(targets, command).await;
        while report.summary().has_failures() && decider.should_redrive(&report).await {
            report = self.redrive(report).await;
        }
        report
    }

    /// In-memory history, oldest first.
    pub fn history(&self) -> Vec<BatchJobResult> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn run_pool(&self, targets: Vec<BatchTarget>, command: &str) -> Vec<BatchJobResult> {
        let pool_size = self.max_concurrency.min(targets.len()).max(1);
        info!("开始执行 {} 个目标 (并发限制: {})", targets.len(), pool_size);

        stream::iter(targets)
            .map(|target| {
                let worker = self.worker.clone();
                let command = command.to_string();
                async move {
                    let started = Instant::now();
                    let fallback = target.clone();
                    let task_command = command.clone();
                    let result =
                        match tokio::spawn(async move { worker.run(target, &task_command).await })
                            .await
                        {
                            Ok(result) => result,
                            Err(e) => {
                                error!("目标 {} 的执行任务异常退出: {}", fallback, e);
                                executor_error_result(fallback, &command, e, started.elapsed())
                            }
                        };
                    counter!("fleet_batch_results_total", "status" => result.status.as_str())
                        .increment(1);
                    result
                }
            })
            .buffer_unordered(pool_size)
            .collect()
            .await
    }

    async fn record(&self, results: &[BatchJobResult]) {
        {
            let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
            history.extend_from_slice(results);
            if history.len() > self.history_cap {
                let overflow = history.len() - self.history_cap;
                history.drain(..overflow);
            }
        }

        if let Err(e) = self
            .history_store
            .append_and_flush(results, self.history_cap)
            .await
        {
            warn!("保存执行历史失败: {}", e);
        }
    }
}
