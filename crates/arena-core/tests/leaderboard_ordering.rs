//! The leaderboard and round finalization break score ties in opposite directions.
//! Both directions are asserted here on purpose.

use arena_core::engine::finalize::select_best_round;
use arena_core::model::{EvaluationResult, LeaderBoardEntry, RoundState};
use arena_core::{AggregationStore, StoreHandle};
use chrono::Utc;
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
        submission_content: format!("{team}/{round}"),
        submission_format: "text".to_string(),
        score,
        score_details: EvaluationResult {
            overall_score: score,
            metrics: vec![],
        },
        token_usage: 0,
        final_submission: false,
        exit_reason: None,
        created_at: None,
        updated_at: None,
    }
}

#[tokio::test]
async fn leader_board_ties_go_to_earliest_arrival() {
    let (_dir, store) = open();
    // Insertion order deliberately differs from alphabetical order.
    for team in ["team-c", "team-a", "team-b"] {
        store
            .save_to_leader_board(&entry("e1", team, 1, 85.0))
            .await
            .unwrap();
    }
    store
        .save_to_leader_board(&entry("e1", "team-d", 1, 60.0))
        .await
        .unwrap();
    store
        .save_to_leader_board(&entry("e1", "team-e", 1, 90.0))
        .await
        .unwrap();

    let board = store.get_leader_board(10).await.unwrap();
    let order: Vec<&str> = board.iter().map(|e| e.team_id.as_str()).collect();
    assert_eq!(order, ["team-e", "team-c", "team-a", "team-b", "team-d"]);

    let top = store.get_leader_board(2).await.unwrap();
    assert_eq!(top.len(), 2);
}

#[tokio::test]
async fn re_saving_a_tied_row_keeps_its_original_position() {
    let (_dir, store) = open();
    store
        .save_to_leader_board(&entry("e1", "team-x", 1, 85.0))
        .await
        .unwrap();
    store
        .save_to_leader_board(&entry("e1", "team-y", 1, 85.0))
        .await
        .unwrap();
    // Upsert of the first arrival must not move it behind the second.
    store
        .save_to_leader_board(&entry("e1", "team-x", 1, 85.0))
        .await
        .unwrap();

    let board = store.get_leader_board(10).await.unwrap();
    assert_eq!(board[0].team_id, "team-x");
    assert_eq!(board[1].team_id, "team-y");
}

#[tokio::test]
async fn finalization_and_leader_board_disagree_on_ties() {
    let (_dir, store) = open();
    store
        .save_to_leader_board(&entry("e1", "team-a", 1, 85.0))
        .await
        .unwrap();
    store
        .save_to_leader_board(&entry("e1", "team-a", 2, 85.0))
        .await
        .unwrap();

    let board = store.get_execution_leader_board("e1", 10).await.unwrap();
    assert_eq!(board[0].round_number, 1, "leader board: earliest wins");

    let rounds: Vec<RoundState> = [1u32, 2]
        .into_iter()
        .map(|n| RoundState {
            round_number: n,
            submission_content: format!("team-a/{n}"),
            evaluation_score: 85.0,
            score_details: EvaluationResult {
                overall_score: 85.0,
                metrics: vec![],
            },
            improvement_judgment: None,
            round_started_at: Utc::now(),
            round_ended_at: Utc::now(),
        })
        .collect();
    assert_eq!(
        select_best_round(&rounds).unwrap().round_number,
        2,
        "finalization: latest wins"
    );
}

#[tokio::test]
async fn ranking_takes_each_teams_best_score() {
    let (_dir, store) = open();
    for (team, round, score) in [
        ("team-b", 1, 70.0),
        ("team-b", 2, 88.0),
        ("team-a", 1, 88.0),
        ("team-c", 1, 95.0),
        ("team-c", 2, 40.0),
    ] {
        store
            .save_to_leader_board(&entry("e1", team, round, score))
            .await
            .unwrap();
    }
    store
        .save_to_leader_board(&entry("other", "team-z", 1, 100.0))
        .await
        .unwrap();

    let ranking = store.get_leader_board_ranking("e1").await.unwrap();
    let rows: Vec<(&str, f64, u32)> = ranking
        .iter()
        .map(|r| (r.team_id.as_str(), r.best_score, r.rounds))
        .collect();
    assert_eq!(
        rows,
        [("team-c", 95.0, 2), ("team-a", 88.0, 1), ("team-b", 88.0, 2)]
    );
}
