//! Prompt builders for the submitter and the judge.
//!
//! Wording is deliberately plain; what matters is which context each prompt carries.

use crate::model::{RoundState, TeamRanking};
use std::fmt::Write;

/// Round 1 gets the raw task. Later rounds add every prior submission with its score
/// breakdown and the current ranking.
pub fn build_round_prompt(
    user_query: &str,
    team_id: &str,
    prior: &[RoundState],
    ranking: &[TeamRanking],
) -> String {
    if prior.is_empty() {
        return user_query.to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "## Task\n{}\n", user_query);
    push_history(&mut out, prior);
    push_ranking(&mut out, team_id, ranking);
    let _ = writeln!(
        out,
        "Revise your submission for round {} to raise its score. Address the weakest \
         metrics first and return the complete submission.",
        prior.len() + 1
    );
    out
}

pub fn build_judgment_prompt(
    user_query: &str,
    team_id: &str,
    rounds: &[RoundState],
    ranking: &[TeamRanking],
    max_rounds: u32,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## Task\n{}\n", user_query);
    let _ = writeln!(
        out,
        "## Round position\n{} / {}\n",
        rounds.len(),
        max_rounds
    );
    push_history(&mut out, rounds);
    push_ranking(&mut out, team_id, ranking);
    let _ = writeln!(
        out,
        "Should team {} run another round? Continue only if a further revision is likely \
         to raise the score.",
        team_id
    );
    out
}

fn push_history(out: &mut String, rounds: &[RoundState]) {
    let _ = writeln!(out, "## Previous rounds");
    for r in rounds {
        let _ = writeln!(
            out,
            "### Round {} (score {:.1})\n{}",
            r.round_number, r.evaluation_score, r.submission_content
        );
        if !r.score_details.metrics.is_empty() {
            let _ = writeln!(out, "Feedback:");
            for m in &r.score_details.metrics {
                if m.comment.is_empty() {
                    let _ = writeln!(out, "- {}: {:.1}", m.name, m.score);
                } else {
                    let _ = writeln!(out, "- {}: {:.1} ({})", m.name, m.score, m.comment);
                }
            }
        }
        let _ = writeln!(out);
    }
}

fn push_ranking(out: &mut String, team_id: &str, ranking: &[TeamRanking]) {
    if ranking.is_empty() {
        return;
    }
    let _ = writeln!(out, "## Current ranking");
    for (i, r) in ranking.iter().enumerate() {
        let marker = if r.team_id == team_id { " (you)" } else { "" };
        let _ = writeln!(
            out,
            "{}. {}: {:.1}{}",
            i + 1,
            r.team_id,
            r.best_score,
            marker
        );
    }
    let _ = writeln!(out);
}
