pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS leader_board (
  id                  INTEGER PRIMARY KEY AUTOINCREMENT,
  execution_id        TEXT NOT NULL,
  team_id             TEXT NOT NULL,
  round_number        INTEGER NOT NULL CHECK (round_number >= 1),
  submission_content  TEXT NOT NULL,
  submission_format   TEXT NOT NULL DEFAULT 'text',
  score               REAL NOT NULL CHECK (score >= 0.0 AND score <= 100.0),
  score_details_json  TEXT NOT NULL,
  token_usage         INTEGER NOT NULL DEFAULT 0,
  final_submission    INTEGER NOT NULL DEFAULT 0,
  exit_reason         TEXT,
  created_at          TEXT NOT NULL,
  updated_at          TEXT NOT NULL,
  UNIQUE(execution_id, team_id, round_number)
);

CREATE INDEX IF NOT EXISTS idx_leader_board_execution ON leader_board(execution_id);
CREATE INDEX IF NOT EXISTS idx_leader_board_team ON leader_board(team_id);
CREATE INDEX IF NOT EXISTS idx_leader_board_score ON leader_board(score DESC, created_at ASC, id ASC);

CREATE TABLE IF NOT EXISTS round_history (
  id                  INTEGER PRIMARY KEY AUTOINCREMENT,
  execution_id        TEXT NOT NULL,
  team_id             TEXT NOT NULL,
  round_number        INTEGER NOT NULL CHECK (round_number >= 1),
  submission_content  TEXT NOT NULL,
  messages_json       TEXT NOT NULL,
  created_at          TEXT NOT NULL,
  updated_at          TEXT NOT NULL,
  UNIQUE(execution_id, team_id, round_number)
);

CREATE INDEX IF NOT EXISTS idx_round_history_team ON round_history(execution_id, team_id);

CREATE TABLE IF NOT EXISTS round_status (
  id                  INTEGER PRIMARY KEY AUTOINCREMENT,
  execution_id        TEXT NOT NULL,
  team_id             TEXT NOT NULL,
  round_number        INTEGER NOT NULL CHECK (round_number >= 1),
  should_continue     INTEGER,
  reasoning           TEXT,
  confidence_score    REAL,
  round_started_at    TEXT NOT NULL,
  round_ended_at      TEXT,
  created_at          TEXT NOT NULL,
  updated_at          TEXT NOT NULL,
  UNIQUE(execution_id, team_id, round_number)
);

CREATE TABLE IF NOT EXISTS execution_summary (
  execution_id                  TEXT PRIMARY KEY,
  status                        TEXT NOT NULL,
  team_results_json             TEXT NOT NULL,
  total_teams                   INTEGER NOT NULL,
  best_team_id                  TEXT,
  best_score                    REAL,
  total_execution_time_seconds  REAL NOT NULL,
  created_at                    TEXT NOT NULL,
  updated_at                    TEXT NOT NULL
);
"#;

/// Tables the store owns, in creation order.
pub const TABLES: [&str; 4] = [
    "leader_board",
    "round_history",
    "round_status",
    "execution_summary",
];

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn ddl_is_valid_and_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(DDL).unwrap();
        conn.execute_batch(DDL).unwrap();

        for table in TABLES {
            let n: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [table],
                    |r| r.get(0),
                )
                .unwrap();
            assert_eq!(n, 1, "missing table {table}");
        }
    }

    #[test]
    fn score_check_rejects_out_of_range_rows() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(DDL).unwrap();
        let res = conn.execute(
            "INSERT INTO leader_board (execution_id, team_id, round_number, submission_content,
               score, score_details_json, created_at, updated_at)
             VALUES ('e', 't', 1, 'x', 150.0, '{}', 'now', 'now')",
            [],
        );
        assert!(res.is_err());
    }
}
