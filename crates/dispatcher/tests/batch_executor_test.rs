use std::sync::Arc;
use std::time::Duration;

use fleet_core::{BatchConfig, BatchTarget, JobStatus};
use fleet_dispatcher::{BatchExecutor, BatchReport, NeverRedrive, RedriveUpTo};
use fleet_testing_utils::{
    targets, MockHistoryStore, MockStatusProvider, Script, ScriptedCommandRunner, TestEnv,
};

fn config(max_retries: u32) -> BatchConfig {
    BatchConfig {
        max_retries,
        ..BatchConfig::default()
    }
}

struct Harness {
    runner: ScriptedCommandRunner,
    status: MockStatusProvider,
    store: MockHistoryStore,
    executor: BatchExecutor,
}

fn harness(
    runner: ScriptedCommandRunner,
    status: MockStatusProvider,
    store: MockHistoryStore,
    config: BatchConfig,
    history_cap: usize,
) -> Harness {
    TestEnv::init_logging();
    let executor = BatchExecutor::new(
        Arc::new(runner.clone()),
        Arc::new(status.clone()),
        Arc::new(store.clone()),
        &config,
        history_cap,
    );
    Harness {
        runner,
        status,
        store,
        executor,
    }
}

fn default_harness(runner: ScriptedCommandRunner, config: BatchConfig) -> Harness {
    harness(
        runner,
        MockStatusProvider::all_reachable(),
        MockHistoryStore::new(),
        config,
        100,
    )
}

fn result_for<'a>(report: &'a BatchReport, id: &str) -> &'a fleet_core::BatchJobResult {
    report
        .results
        .iter()
        .find(|r| r.target.id == id)
        .unwrap_or_else(|| panic!("no result for {id}"))
}

#[tokio::test(start_paused = true)]
async fn test_two_persistent_failures_among_five() {
    let runner = ScriptedCommandRunner::new()
        .with_script("i-001", Script::Fail("exit 1".to_string()))
        .with_script("i-003", Script::Fail("exit 1".to_string()));
    let h = default_harness(runner, config(2));

    let report = h.executor.execute(targets(5, "us-east-1"), "uptime").await;
    let summary = report.summary();

    assert_eq!(report.results.len(), 5);
    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed, 2);

    for id in ["i-001", "i-003"] {
        let result = result_for(&report, id);
        assert_eq!(result.status, JobStatus::Failed);
        assert_eq!(result.attempts, 3);
        assert_eq!(h.runner.submit_count(id), 3);
        // 0 + 10s + 20s 的退避
        assert!((30_000..31_000).contains(&result.execution_time_ms));
    }
}

#[tokio::test(start_paused = true)]
async fn test_every_validated_target_gets_exactly_one_result() {
    let runner = ScriptedCommandRunner::new()
        .with_script("i-000", Script::Fail("boom".to_string()))
        .with_script("i-001", Script::Hang)
        .with_script("i-002", Script::SubmitError("ThrottlingException".to_string()))
        .with_script("i-003", Script::Panic)
        .with_script("i-004", Script::TransientPolls(4))
        .with_script("i-005", Script::FailTimes(1, "flaky".to_string()));
    let h = default_harness(runner, config(1));

    let all = targets(8, "us-east-1");
    let report = h.executor.execute(all.clone(), "uptime").await;

    assert_eq!(report.validated_targets, all);
    assert_eq!(report.results.len(), all.len());
    let mut ids: Vec<_> = report.results.iter().map(|r| r.target.id.clone()).collect();
    ids.sort();
    let expected: Vec<_> = all.iter().map(|t| t.id.clone()).collect();
    assert_eq!(ids, expected);

    assert_eq!(result_for(&report, "i-000").status, JobStatus::Failed);
    assert_eq!(result_for(&report, "i-001").status, JobStatus::Timeout);
    assert_eq!(result_for(&report, "i-002").status, JobStatus::Failed);
    assert!(result_for(&report, "i-002").error.contains("ThrottlingException"));

    let crashed = result_for(&report, "i-003");
    assert_eq!(crashed.status, JobStatus::Failed);
    assert!(crashed.error.starts_with("Executor error"));

    assert_eq!(result_for(&report, "i-004").status, JobStatus::Success);
    assert_eq!(result_for(&report, "i-005").status, JobStatus::Success);
    assert_eq!(result_for(&report, "i-005").attempts, 2);
}

#[tokio::test(start_paused = true)]
async fn test_retry_ceiling_is_max_retries_plus_one() {
    let runner = ScriptedCommandRunner::new().with_script("i-000", Script::Fail("no".to_string()));
    let h = default_harness(runner, config(3));

    let report = h.executor.execute(targets(1, "local"), "false").await;
    assert_eq!(report.results[0].status, JobStatus::Failed);
    assert_eq!(report.results[0].attempts, 4);
    assert_eq!(h.runner.submit_count("i-000"), 4);

    // 不会自动再次重试
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(h.runner.submit_count("i-000"), 4);
}

#[tokio::test(start_paused = true)]
async fn test_no_reachable_targets_dispatches_nothing() {
    let ids = ["i-000", "i-001", "i-002", "i-003", "i-004"];
    let h = harness(
        ScriptedCommandRunner::new(),
        MockStatusProvider::with_unreachable(&ids),
        MockHistoryStore::new(),
        config(3),
        100,
    );

    let report = h.executor.execute(targets(5, "us-east-1"), "uptime").await;

    assert!(report.is_empty());
    assert!(report.validated_targets.is_empty());
    assert_eq!(h.runner.total_submits(), 0);
    assert_eq!(h.store.flush_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_pool_never_exceeds_concurrency_limit() {
    let runner = ScriptedCommandRunner::new();
    for target in targets(12, "local") {
        runner.set_script(&target.id, Script::Slow(Duration::from_secs(5)));
    }
    let h = default_harness(runner, config(0));

    let report = h.executor.execute(targets(12, "local"), "uptime").await;

    assert_eq!(report.summary().succeeded, 12);
    assert_eq!(h.runner.max_in_flight(), 5);
    assert_eq!(h.runner.in_flight(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_pool_is_sized_to_configuration() {
    let runner = ScriptedCommandRunner::new();
    for target in targets(6, "local") {
        runner.set_script(&target.id, Script::Slow(Duration::from_secs(5)));
    }
    let h = default_harness(
        runner,
        BatchConfig {
            max_concurrency: 2,
            ..config(0)
        },
    );

    h.executor.execute(targets(6, "local"), "uptime").await;
    assert_eq!(h.runner.max_in_flight(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_validation_failure_passes_location_through() {
    let status = MockStatusProvider::all_reachable();
    status.fail_location("eu-west-1");
    let h = harness(
        ScriptedCommandRunner::new(),
        status,
        MockHistoryStore::new(),
        config(0),
        100,
    );

    let mut all = targets(2, "us-east-1");
    all.push(BatchTarget::new("db-1", "db-1", "eu-west-1"));
    let report = h.executor.execute(all, "uptime").await;

    assert_eq!(report.results.len(), 3);
    assert_eq!(h.runner.submit_count("db-1"), 1);
    assert_eq!(h.status.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_history_write_failure_does_not_affect_results() {
    let h = harness(
        ScriptedCommandRunner::new(),
        MockStatusProvider::all_reachable(),
        MockHistoryStore::failing(),
        config(0),
        100,
    );

    let report = h.executor.execute(targets(3, "local"), "uptime").await;

    assert_eq!(report.summary().succeeded, 3);
    assert_eq!(h.store.flush_count(), 1);
    assert_eq!(h.executor.history().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_history_keeps_most_recent_entries() {
    let h = harness(
        ScriptedCommandRunner::new(),
        MockStatusProvider::all_reachable(),
        MockHistoryStore::new(),
        config(0),
        4,
    );

    h.executor.execute(targets(3, "a"), "first").await;
    h.executor.execute(targets(3, "b"), "second").await;

    let stored = h.store.entries();
    assert_eq!(stored.len(), 4);
    assert_eq!(stored[0].command, "first");
    assert!(stored[1..].iter().all(|r| r.command == "second"));
    assert_eq!(h.executor.history(), stored);
}

#[tokio::test(start_paused = true)]
async fn test_redrive_replaces_only_failed_results() {
    let runner = ScriptedCommandRunner::new()
        .with_script("i-001", Script::Fail("disk full".to_string()))
        .with_script("i-002", Script::Hang);
    let h = default_harness(runner, config(1));

    let first = h.executor.execute(targets(4, "local"), "df -h").await;
    assert_eq!(first.summary().unsuccessful(), 2);

    h.runner.set_script("i-001", Script::Succeed("cleaned".to_string()));
    h.runner.set_script("i-002", Script::Succeed("done".to_string()));
    let redriven = h.executor.redrive(first.clone()).await;

    assert_eq!(redriven.results.len(), 4);
    assert!(!redriven.summary().has_failures());
    assert_eq!(result_for(&redriven, "i-001").output, "cleaned");
    // 重新执行使用全新的重试预算
    assert_eq!(result_for(&redriven, "i-002").attempts, 1);

    for id in ["i-000", "i-003"] {
        assert_eq!(result_for(&redriven, id), result_for(&first, id));
    }

    // 两次执行的结果都进入历史
    assert_eq!(h.store.entries().len(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_redrive_keeps_result_of_target_dropped_by_validation() {
    let runner = ScriptedCommandRunner::new().with_script("i-000", Script::Fail("no".to_string()));
    let h = default_harness(runner, config(0));

    let first = h.executor.execute(targets(2, "local"), "uptime").await;
    h.status.set_unreachable("i-000");

    let redriven = h.executor.redrive(first.clone()).await;
    assert_eq!(redriven, first);
    assert_eq!(h.runner.submit_count("i-000"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_execute_with_redrive_follows_decider() {
    let runner = ScriptedCommandRunner::new().with_script("i-000", Script::Fail("no".to_string()));
    let h = default_harness(runner, config(0));

    let report = h
        .executor
        .execute_with_redrive(targets(2, "local"), "uptime", &NeverRedrive)
        .await;
    assert_eq!(report.summary().failed, 1);
    assert_eq!(h.runner.submit_count("i-000"), 1);

    let report = h
        .executor
        .execute_with_redrive(targets(2, "local"), "uptime", &RedriveUpTo::new(2))
        .await;
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.summary().failed, 1);
    // 首次执行 + 两次重新执行
    assert_eq!(h.runner.submit_count("i-000"), 4);
    assert_eq!(h.runner.submit_count("i-001"), 2);
}
