use std::collections::hash_map::Entry;
use std::collections::HashMap;

use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::core::state::AppState;
use crate::core::time::format_primitive;
use crate::db::models::AttemptRow;
use crate::repositories::results as results_repo;
use crate::schemas::leaderboard::{LeaderboardEntry, LeaderboardResponse};
use crate::services::identity::display_name_or_placeholder;
use crate::services::results::ResultError;

pub(crate) const GLOBAL_TITLE: &str = "Global Leaderboard";

/// One user's standing on the global board: best scores summed across every
/// quiz they attempted.
#[derive(Debug, Clone, PartialEq)]
struct GlobalStanding {
    user_id: Uuid,
    total_score: f64,
    quizzes_taken: i32,
    last_completed: PrimitiveDateTime,
}

pub(crate) async fn global(
    state: &AppState,
    top: usize,
    bearer_token: Option<&str>,
) -> Result<LeaderboardResponse, ResultError> {
    let rows = results_repo::attempt_rows(state.db()).await?;
    let standings = rank_global(best_attempt_per_quiz(rows), top);

    let user_ids: Vec<Uuid> = standings.iter().map(|standing| standing.user_id).collect();
    let users = state.identity().users_batch(&user_ids, bearer_token).await;

    let entries = standings
        .into_iter()
        .enumerate()
        .map(|(index, standing)| {
            let user = users.get(&standing.user_id);
            LeaderboardEntry {
                rank: index as u32 + 1,
                user_id: standing.user_id,
                user_name: display_name_or_placeholder(user, standing.user_id),
                user_email: user.and_then(|info| info.email.clone()),
                score: standing.total_score,
                // Carries the number of quizzes taken; a single duration is
                // meaningless across quizzes.
                time_taken_seconds: standing.quizzes_taken,
                completed_at: format_primitive(standing.last_completed),
            }
        })
        .collect();

    Ok(LeaderboardResponse { quiz_id: None, quiz_title: GLOBAL_TITLE.to_string(), entries })
}

pub(crate) async fn for_quiz(
    state: &AppState,
    quiz_id: Uuid,
    top: usize,
    bearer_token: Option<&str>,
) -> Result<LeaderboardResponse, ResultError> {
    let rows = results_repo::attempt_rows_for_quiz(state.db(), quiz_id).await?;
    let best = rank_quiz(best_attempt_per_quiz(rows), top);

    let user_ids: Vec<Uuid> = best.iter().map(|row| row.user_id).collect();
    let (users, quizzes) = tokio::join!(
        state.identity().users_batch(&user_ids, bearer_token),
        state.catalog().quizzes_batch(std::slice::from_ref(&quiz_id)),
    );

    let quiz_title = quizzes
        .get(&quiz_id)
        .map(|info| info.title.clone())
        .unwrap_or_else(|| format!("Quiz {quiz_id}"));

    let entries = best
        .into_iter()
        .enumerate()
        .map(|(index, row)| {
            let user = users.get(&row.user_id);
            LeaderboardEntry {
                rank: index as u32 + 1,
                user_id: row.user_id,
                user_name: display_name_or_placeholder(user, row.user_id),
                user_email: user.and_then(|info| info.email.clone()),
                score: row.score,
                time_taken_seconds: row.time_taken_seconds,
                completed_at: format_primitive(row.completed_at),
            }
        })
        .collect();

    Ok(LeaderboardResponse { quiz_id: Some(quiz_id), quiz_title, entries })
}

/// Collapses repeat attempts to each user's best per quiz: highest score,
/// ties broken by the faster attempt, full ties keep the earliest row.
fn best_attempt_per_quiz(rows: Vec<AttemptRow>) -> Vec<AttemptRow> {
    let mut best: HashMap<(Uuid, Uuid), AttemptRow> = HashMap::new();

    for row in rows {
        match best.entry((row.user_id, row.quiz_id)) {
            Entry::Vacant(slot) => {
                slot.insert(row);
            }
            Entry::Occupied(mut slot) => {
                let current = slot.get();
                if row.score > current.score
                    || (row.score == current.score
                        && row.time_taken_seconds < current.time_taken_seconds)
                {
                    slot.insert(row);
                }
            }
        }
    }

    best.into_values().collect()
}

fn rank_quiz(mut best: Vec<AttemptRow>, top: usize) -> Vec<AttemptRow> {
    best.sort_by(|left, right| {
        right
            .score
            .total_cmp(&left.score)
            .then_with(|| left.time_taken_seconds.cmp(&right.time_taken_seconds))
            .then_with(|| left.completed_at.cmp(&right.completed_at))
            .then_with(|| left.user_id.cmp(&right.user_id))
    });
    best.truncate(top);
    best
}

fn rank_global(best: Vec<AttemptRow>, top: usize) -> Vec<GlobalStanding> {
    let mut by_user: HashMap<Uuid, GlobalStanding> = HashMap::new();

    for row in best {
        by_user
            .entry(row.user_id)
            .and_modify(|standing| {
                standing.total_score += row.score;
                standing.quizzes_taken += 1;
                standing.last_completed = standing.last_completed.max(row.completed_at);
            })
            .or_insert(GlobalStanding {
                user_id: row.user_id,
                total_score: row.score,
                quizzes_taken: 1,
                last_completed: row.completed_at,
            });
    }

    // Final user-id tiebreak pins an order for fully tied users; the source
    // map iterates in arbitrary order.
    let mut standings: Vec<GlobalStanding> = by_user.into_values().collect();
    standings.sort_by(|left, right| {
        right
            .total_score
            .total_cmp(&left.total_score)
            .then_with(|| left.last_completed.cmp(&right.last_completed))
            .then_with(|| left.user_id.cmp(&right.user_id))
    });
    standings.truncate(top);
    standings
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn row(
        user: Uuid,
        quiz: Uuid,
        score: f64,
        time_taken_seconds: i32,
        day: u8,
    ) -> AttemptRow {
        AttemptRow {
            user_id: user,
            quiz_id: quiz,
            score,
            time_taken_seconds,
            completed_at: datetime!(2024-06-01 00:00:00).replace_day(day).unwrap(),
        }
    }

    #[test]
    fn best_attempt_prefers_higher_score_then_faster_time() {
        let user = Uuid::new_v4();
        let quiz = Uuid::new_v4();
        let best = best_attempt_per_quiz(vec![
            row(user, quiz, 5.0, 60, 1),
            row(user, quiz, 8.0, 90, 2),
            row(user, quiz, 8.0, 45, 3),
            row(user, quiz, 8.0, 45, 4),
        ]);

        assert_eq!(best.len(), 1);
        assert_eq!(best[0].score, 8.0);
        assert_eq!(best[0].time_taken_seconds, 45);
        // Full tie keeps the attempt seen first.
        assert_eq!(best[0].completed_at, datetime!(2024-06-03 00:00:00));
    }

    #[test]
    fn quiz_ranking_orders_by_score_time_then_recency() {
        let quiz = Uuid::new_v4();
        let (a, b, c, d) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let ranked = rank_quiz(
            vec![
                row(a, quiz, 7.0, 60, 2),
                row(b, quiz, 9.0, 80, 1),
                row(c, quiz, 7.0, 30, 3),
                row(d, quiz, 7.0, 60, 1),
            ],
            10,
        );

        let order: Vec<Uuid> = ranked.iter().map(|entry| entry.user_id).collect();
        assert_eq!(order, vec![b, c, d, a]);
    }

    #[test]
    fn global_ranking_sums_best_scores_per_user() {
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();
        let (quiz_a, quiz_b) = (Uuid::new_v4(), Uuid::new_v4());

        let standings = rank_global(
            best_attempt_per_quiz(vec![
                row(user, quiz_a, 4.0, 60, 1),
                row(user, quiz_a, 9.0, 50, 2),
                row(user, quiz_b, 3.0, 40, 3),
                row(other, quiz_a, 10.0, 70, 1),
            ]),
            10,
        );

        assert_eq!(standings.len(), 2);
        assert_eq!(standings[0].user_id, user);
        assert_eq!(standings[0].total_score, 12.0);
        assert_eq!(standings[0].quizzes_taken, 2);
        assert_eq!(standings[1].user_id, other);
        assert_eq!(standings[1].quizzes_taken, 1);
    }

    #[test]
    fn global_ties_break_by_earlier_last_activity() {
        let early = Uuid::new_v4();
        let late = Uuid::new_v4();
        let quiz = Uuid::new_v4();

        let standings = rank_global(
            vec![row(late, quiz, 5.0, 60, 9), row(early, quiz, 5.0, 60, 2)],
            10,
        );

        assert_eq!(standings[0].user_id, early);
        assert_eq!(standings[1].user_id, late);
    }

    #[test]
    fn rankings_truncate_to_top() {
        let quiz = Uuid::new_v4();
        let rows: Vec<AttemptRow> = (0..5)
            .map(|offset| row(Uuid::new_v4(), quiz, f64::from(offset), 60, 1 + offset as u8))
            .collect();

        assert_eq!(rank_quiz(rows.clone(), 3).len(), 3);
        assert_eq!(rank_global(rows, 2).len(), 2);
    }

    #[test]
    fn full_ties_order_by_user_id() {
        let quiz = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let (first, second) = if a < b { (a, b) } else { (b, a) };

        let standings =
            rank_global(vec![row(b, quiz, 5.0, 60, 2), row(a, quiz, 5.0, 60, 2)], 10);
        assert_eq!(standings[0].user_id, first);
        assert_eq!(standings[1].user_id, second);

        let ranked = rank_quiz(vec![row(b, quiz, 5.0, 60, 2), row(a, quiz, 5.0, 60, 2)], 10);
        assert_eq!(ranked[0].user_id, first);
        assert_eq!(ranked[1].user_id, second);
    }

    #[test]
    fn ranking_is_deterministic_for_identical_input() {
        let quiz = Uuid::new_v4();
        let rows: Vec<AttemptRow> = (0..6)
            .map(|offset| row(Uuid::new_v4(), quiz, f64::from(offset % 3), 60 + offset, 1))
            .collect();

        let first = rank_quiz(best_attempt_per_quiz(rows.clone()), 10);
        let second = rank_quiz(best_attempt_per_quiz(rows), 10);
        let first_ids: Vec<Uuid> = first.iter().map(|entry| entry.user_id).collect();
        let second_ids: Vec<Uuid> = second.iter().map(|entry| entry.user_id).collect();
        assert_eq!(first_ids, second_ids);
    }
}
