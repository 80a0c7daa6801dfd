//! Upsert, validation and read-path tests against a file-backed store.

use arena_core::model::{
    EvaluationResult, ExecutionStatus, ExecutionSummary, LeaderBoardEntry, MetricScore,
    RoundHistoryEntry, RoundStatusRecord, TeamResult,
};
use arena_core::{AggregationStore, StoreError, StoreHandle};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tempfile::TempDir;

fn open() -> (TempDir, StoreHandle) {
    let dir = tempfile::tempdir().unwrap();
    let store = AggregationStore::open(dir.path().join("arena.db")).unwrap();
    let handle = store.connect().unwrap();
    (dir, handle)
}

fn entry(exec: &str, team: &str, round: u32, score: f64) -> LeaderBoardEntry {
    LeaderBoardEntry {
        execution_id: exec.to_string(),
        team_id: team.to_string(),
        round_number: round,
        submission_content: format!("{team} round {round}"),
        submission_format: "text".to_string(),
        score,
        score_details: EvaluationResult {
            overall_score: score,
            metrics: vec![MetricScore {
                name: "quality".into(),
                score,
                comment: "ok".into(),
                weight: Some(1.0),
            }],
        },
        token_usage: 100,
        final_submission: false,
        exit_reason: None,
        created_at: None,
        updated_at: None,
    }
}

#[tokio::test]
async fn repeated_leader_board_saves_keep_one_row_per_key() {
    let (_dir, store) = open();
    for score in [50.0, 60.0, 70.0] {
        store
            .save_to_leader_board(&entry("e1", "team-a", 1, score))
            .await
            .unwrap();
    }
    assert_eq!(store.count_rows("leader_board").await.unwrap(), 1);

    let rows = store.get_execution_leader_board("e1", 10).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].score, 70.0);
    assert_eq!(rows[0].score_details.metrics[0].name, "quality");
}

#[tokio::test]
async fn upsert_preserves_created_at_and_refreshes_updated_at() {
    let (_dir, store) = open();
    store
        .save_to_leader_board(&entry("e1", "team-a", 1, 40.0))
        .await
        .unwrap();
    let first = store.get_execution_leader_board("e1", 1).await.unwrap()[0].clone();

    tokio::time::sleep(Duration::from_millis(5)).await;
    store
        .save_to_leader_board(&entry("e1", "team-a", 1, 45.0))
        .await
        .unwrap();
    let second = store.get_execution_leader_board("e1", 1).await.unwrap()[0].clone();

    assert_eq!(first.created_at, second.created_at);
    assert!(second.updated_at > first.updated_at);
    assert_eq!(second.score, 45.0);
}

#[tokio::test]
async fn score_bounds_are_validated_before_writing() {
    let (_dir, store) = open();
    for bad in [-0.1, 150.0, f64::NAN] {
        let err = store
            .save_to_leader_board(&entry("e1", "team-a", 1, bad))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)), "{bad}: {err}");
    }
    assert_eq!(store.count_rows("leader_board").await.unwrap(), 0);

    store
        .save_to_leader_board(&entry("e1", "team-a", 1, 0.0))
        .await
        .unwrap();
    store
        .save_to_leader_board(&entry("e1", "team-a", 2, 100.0))
        .await
        .unwrap();
    assert_eq!(store.count_rows("leader_board").await.unwrap(), 2);
}

#[tokio::test]
async fn round_zero_and_empty_ids_are_rejected() {
    let (_dir, store) = open();
    let err = store
        .save_to_leader_board(&entry("e1", "team-a", 0, 10.0))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    let err = store
        .save_aggregation(&RoundHistoryEntry {
            execution_id: String::new(),
            team_id: "team-a".into(),
            round_number: 1,
            submission_content: "x".into(),
            messages: vec![],
            created_at: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[tokio::test]
async fn round_history_roundtrips_messages_in_round_order() {
    let (_dir, store) = open();
    for round in [2u32, 1, 2] {
        store
            .save_aggregation(&RoundHistoryEntry {
                execution_id: "e1".into(),
                team_id: "team-a".into(),
                round_number: round,
                submission_content: format!("draft {round}"),
                messages: vec![serde_json::json!({"role": "assistant", "content": round})],
                created_at: None,
            })
            .await
            .unwrap();
    }

    let history = store.get_round_history("e1", "team-a").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].round_number, 1);
    assert_eq!(history[1].submission_content, "draft 2");
    assert_eq!(history[1].messages[0]["content"], 2);
    assert!(history[0].created_at.is_some());
}

#[tokio::test]
async fn round_status_is_updated_in_place_after_judgment() {
    let (_dir, store) = open();
    let started: DateTime<Utc> = "2026-01-05T09:00:00.250Z".parse().unwrap();
    let ended: DateTime<Utc> = "2026-01-05T09:04:10Z".parse().unwrap();
    let mut record = RoundStatusRecord {
        execution_id: "e1".into(),
        team_id: "team-a".into(),
        round_number: 1,
        should_continue: None,
        reasoning: None,
        confidence_score: None,
        round_started_at: started,
        round_ended_at: Some(ended),
    };
    store.save_round_status(&record).await.unwrap();
    let pending = store.get_round_status("e1", "team-a", 1).await.unwrap().unwrap();
    assert_eq!(pending.should_continue, None);

    record.should_continue = Some(false);
    record.reasoning = Some("plateaued".into());
    record.confidence_score = Some(0.9);
    store.save_round_status(&record).await.unwrap();

    let judged = store.get_round_status("e1", "team-a", 1).await.unwrap().unwrap();
    assert_eq!(judged.should_continue, Some(false));
    assert_eq!(judged.reasoning.as_deref(), Some("plateaued"));
    assert_eq!(judged.round_started_at, started);
    assert_eq!(judged.round_ended_at, Some(ended));
    assert_eq!(store.count_rows("round_status").await.unwrap(), 1);
    assert!(store.get_round_status("e1", "team-a", 2).await.unwrap().is_none());

    record.confidence_score = Some(1.5);
    let err = store.save_round_status(&record).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    record.confidence_score = Some(0.5);
    record.round_ended_at = Some(started - chrono::Duration::seconds(1));
    assert!(store.save_round_status(&record).await.is_err());
}

#[tokio::test]
async fn only_one_final_submission_per_team() {
    let (_dir, store) = open();
    for (round, score) in [(1, 70.0), (2, 80.0), (3, 75.0)] {
        store
            .save_to_leader_board(&entry("e1", "team-a", round, score))
            .await
            .unwrap();
    }
    store
        .save_to_leader_board(&entry("e1", "team-b", 1, 60.0))
        .await
        .unwrap();
    store
        .mark_final_submission("e1", "team-b", 1, "no_improvement_expected")
        .await
        .unwrap();

    store
        .mark_final_submission("e1", "team-a", 3, "max_rounds_reached")
        .await
        .unwrap();
    store
        .mark_final_submission("e1", "team-a", 2, "max_rounds_reached")
        .await
        .unwrap();

    let rows = store.get_execution_leader_board("e1", 10).await.unwrap();
    let finals: Vec<_> = rows
        .iter()
        .filter(|r| r.team_id == "team-a" && r.final_submission)
        .collect();
    assert_eq!(finals.len(), 1);
    assert_eq!(finals[0].round_number, 2);
    assert_eq!(finals[0].exit_reason.as_deref(), Some("max_rounds_reached"));

    let other = store.get_final_submission("e1", "team-b").await.unwrap().unwrap();
    assert_eq!(other.exit_reason.as_deref(), Some("no_improvement_expected"));

    let err = store
        .mark_final_submission("e1", "team-a", 9, "max_rounds_reached")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    // The failed call rolled back: round 2 is still final.
    let still = store.get_final_submission("e1", "team-a").await.unwrap().unwrap();
    assert_eq!(still.round_number, 2);
}

#[tokio::test]
async fn team_statistics_aggregate_across_executions() {
    let (_dir, store) = open();
    store
        .save_to_leader_board(&entry("e1", "team-a", 1, 60.0))
        .await
        .unwrap();
    store
        .save_to_leader_board(&entry("e1", "team-a", 2, 80.0))
        .await
        .unwrap();
    store
        .save_to_leader_board(&entry("e2", "team-a", 1, 70.0))
        .await
        .unwrap();
    store
        .save_to_leader_board(&entry("e2", "team-b", 1, 99.0))
        .await
        .unwrap();

    let stats = store.get_team_statistics("team-a").await.unwrap();
    assert_eq!(stats.total_rounds, 3);
    assert_eq!(stats.best_score, Some(80.0));
    assert!((stats.average_score.unwrap() - 70.0).abs() < 1e-9);
    assert_eq!(stats.total_tokens, 300);

    let empty = store.get_team_statistics("nobody").await.unwrap();
    assert_eq!(empty.total_rounds, 0);
    assert_eq!(empty.average_score, None);
    assert_eq!(empty.total_tokens, 0);
}

#[tokio::test]
async fn execution_summary_upserts_by_execution_id() {
    let (_dir, store) = open();
    let partial = ExecutionSummary::from_team_results(
        "e1",
        vec![TeamResult::failed("team-a", "Alpha", "submitter crashed")],
        Duration::from_secs(4),
    );
    store.save_execution_summary(&partial).await.unwrap();

    let mut done = partial.clone();
    done.status = ExecutionStatus::PartialFailure;
    done.total_execution_time_seconds = 9.5;
    store.save_execution_summary(&done).await.unwrap();

    assert_eq!(store.count_rows("execution_summary").await.unwrap(), 1);
    let back = store.get_execution_summary("e1").await.unwrap().unwrap();
    assert_eq!(back, done);
    assert!(store.get_execution_summary("missing").await.unwrap().is_none());
}
