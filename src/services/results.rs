use std::collections::HashMap;

use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{QuizResult, QuizResultAnswer};
use crate::repositories::results as results_repo;
use crate::schemas::grading::GradingOutcome;
use crate::schemas::result::{
    EnrichedResultResponse, ResultResponse, SubmitResultRequest, SubmittedAnswer,
    UserStatsResponse,
};
use crate::services::grading::{self, GradingError};

#[derive(Debug, Error)]
pub(crate) enum ResultError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("grading is unavailable: {0}")]
    GradingUnavailable(String),
    #[error(transparent)]
    UnsupportedQuestionType(#[from] GradingError),
    #[error("computed score is invalid: {0}")]
    InvalidScore(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Grades a submission against the live quiz content and persists the
/// attempt. The stored result is immutable from here on.
pub(crate) async fn submit(
    state: &AppState,
    user_id: Uuid,
    request: SubmitResultRequest,
) -> Result<ResultResponse, ResultError> {
    if request.answers.is_empty() {
        return Err(ResultError::InvalidInput("No answers provided".to_string()));
    }
    if request.time_taken_seconds <= 0 {
        return Err(ResultError::InvalidInput("Invalid time taken".to_string()));
    }

    let quiz = state
        .catalog()
        .quiz_with_questions(request.quiz_id)
        .await
        .map_err(|err| ResultError::GradingUnavailable(err.to_string()))?;

    tracing::debug!(
        quiz_id = %quiz.id,
        quiz_title = %quiz.title,
        question_count = quiz.questions.len(),
        "Fetched quiz for grading"
    );

    let outcome = grading::grade_quiz(&quiz, &request.answers)?;

    if outcome.total_score > outcome.max_possible_score {
        tracing::error!(
            quiz_id = %request.quiz_id,
            user_id = %user_id,
            total_score = outcome.total_score,
            max_possible_score = outcome.max_possible_score,
            "Grading produced a score above the quiz maximum"
        );
        return Err(ResultError::InvalidScore(format!(
            "score {} exceeds maximum {}",
            outcome.total_score, outcome.max_possible_score
        )));
    }

    let result = QuizResult {
        id: Uuid::new_v4(),
        user_id,
        quiz_id: request.quiz_id,
        score: outcome.total_score,
        max_possible_score: outcome.max_possible_score,
        time_taken_seconds: request.time_taken_seconds,
        completed_at: primitive_now_utc(),
    };
    let answers = answer_rows(result.id, &request.answers, &outcome);

    results_repo::insert_result(state.db(), &result, &answers).await?;

    tracing::info!(
        result_id = %result.id,
        quiz_id = %result.quiz_id,
        user_id = %result.user_id,
        score = result.score,
        "Stored quiz result"
    );

    Ok(ResultResponse::from_db(result, answers))
}

/// One persisted row per submitted answer. A submission for a question the
/// quiz does not contain is kept verbatim with a zero award, so the stored
/// attempt always mirrors what the client sent.
fn answer_rows(
    result_id: Uuid,
    submitted: &[SubmittedAnswer],
    outcome: &GradingOutcome,
) -> Vec<QuizResultAnswer> {
    submitted
        .iter()
        .map(|answer| {
            let graded = outcome.question(answer.question_id);
            QuizResultAnswer {
                id: Uuid::new_v4(),
                result_id,
                question_id: answer.question_id,
                given_answer: answer.given_answer.clone(),
                points_awarded: graded.map(|question| question.points_awarded).unwrap_or(0.0),
                is_correct: graded.map(|question| question.is_correct).unwrap_or(false),
            }
        })
        .collect()
}

pub(crate) async fn fetch_result(
    pool: &PgPool,
    result_id: Uuid,
) -> Result<(QuizResult, Vec<QuizResultAnswer>), ResultError> {
    let Some(result) = results_repo::find_by_id(pool, result_id).await? else {
        return Err(ResultError::NotFound(format!("Result {result_id} not found")));
    };
    let answers = results_repo::answers_for_result(pool, result_id).await?;
    Ok((result, answers))
}

pub(crate) async fn page_for_user(
    pool: &PgPool,
    user_id: Uuid,
    page: i64,
    page_size: i64,
) -> Result<(Vec<ResultResponse>, i64), ResultError> {
    let total = results_repo::count_by_user(pool, user_id).await?;
    let results = results_repo::list_by_user(pool, user_id, page_size, (page - 1) * page_size).await?;
    Ok((with_answers(pool, results).await?, total))
}

pub(crate) async fn page_for_quiz(
    pool: &PgPool,
    quiz_id: Uuid,
    page: i64,
    page_size: i64,
) -> Result<(Vec<ResultResponse>, i64), ResultError> {
    let total = results_repo::count_by_quiz(pool, quiz_id).await?;
    let results = results_repo::list_by_quiz(pool, quiz_id, page_size, (page - 1) * page_size).await?;
    Ok((with_answers(pool, results).await?, total))
}

/// Admin-wide listing, decorated with display names and quiz metadata from
/// the collaborator services. Decoration is best effort: a collaborator
/// outage degrades the page to bare ids instead of failing it.
pub(crate) async fn admin_page(
    state: &AppState,
    search: Option<&str>,
    page: i64,
    page_size: i64,
    bearer_token: Option<&str>,
) -> Result<(Vec<EnrichedResultResponse>, i64), ResultError> {
    let pool = state.db();
    let total = results_repo::count_all(pool, search).await?;
    let results = results_repo::list_all(pool, search, page_size, (page - 1) * page_size).await?;

    let user_ids: Vec<Uuid> = results.iter().map(|result| result.user_id).collect();
    let quiz_ids: Vec<Uuid> = results.iter().map(|result| result.quiz_id).collect();
    let (users, quizzes) = tokio::join!(
        state.identity().users_batch(&user_ids, bearer_token),
        state.catalog().quizzes_batch(&quiz_ids),
    );

    let result_ids: Vec<Uuid> = results.iter().map(|result| result.id).collect();
    let mut answers = group_answers(results_repo::answers_for_results(pool, &result_ids).await?);

    let items = results
        .into_iter()
        .map(|result| {
            let rows = answers.remove(&result.id).unwrap_or_default();
            let user = users.get(&result.user_id);
            let quiz = quizzes.get(&result.quiz_id);
            EnrichedResultResponse::from_db(result, rows, user, quiz)
        })
        .collect();

    Ok((items, total))
}

async fn with_answers(
    pool: &PgPool,
    results: Vec<QuizResult>,
) -> Result<Vec<ResultResponse>, ResultError> {
    let result_ids: Vec<Uuid> = results.iter().map(|result| result.id).collect();
    let mut answers = group_answers(results_repo::answers_for_results(pool, &result_ids).await?);

    Ok(results
        .into_iter()
        .map(|result| {
            let rows = answers.remove(&result.id).unwrap_or_default();
            ResultResponse::from_db(result, rows)
        })
        .collect())
}

fn group_answers(rows: Vec<QuizResultAnswer>) -> HashMap<Uuid, Vec<QuizResultAnswer>> {
    let mut grouped: HashMap<Uuid, Vec<QuizResultAnswer>> = HashMap::new();
    for row in rows {
        grouped.entry(row.result_id).or_default().push(row);
    }
    grouped
}

pub(crate) async fn user_stats(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<UserStatsResponse, ResultError> {
    let results = results_repo::list_by_user_all(pool, user_id).await?;
    compute_user_stats(user_id, &results)
        .ok_or_else(|| ResultError::NotFound(format!("No results found for user {user_id}")))
}

/// Aggregates a user's attempt history. `None` when the user has no results,
/// which the API surfaces as a 404 rather than a zeroed report.
fn compute_user_stats(user_id: Uuid, results: &[QuizResult]) -> Option<UserStatsResponse> {
    if results.is_empty() {
        return None;
    }

    let count = results.len() as f64;
    let total_score: f64 = results.iter().map(|result| result.score).sum();
    let best_score =
        results.iter().map(|result| result.score).fold(f64::NEG_INFINITY, f64::max);
    let total_time: f64 = results.iter().map(|result| f64::from(result.time_taken_seconds)).sum();

    Some(UserStatsResponse {
        user_id,
        total_quizzes_taken: results.len() as i64,
        total_score,
        average_score: round2(total_score / count),
        best_score,
        average_time_per_quiz_seconds: round2(total_time / count),
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::schemas::grading::GradedQuestion;

    fn attempt(score: f64, time_taken_seconds: i32) -> QuizResult {
        QuizResult {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            quiz_id: Uuid::new_v4(),
            score,
            max_possible_score: 10.0,
            time_taken_seconds,
            completed_at: datetime!(2024-06-01 12:00:00),
        }
    }

    #[test]
    fn stats_aggregate_count_totals_and_averages() {
        let user_id = Uuid::new_v4();
        let results = vec![attempt(7.0, 60), attempt(9.0, 45), attempt(5.0, 100)];

        let stats = compute_user_stats(user_id, &results).expect("stats");
        assert_eq!(stats.total_quizzes_taken, 3);
        assert_eq!(stats.total_score, 21.0);
        assert_eq!(stats.average_score, 7.0);
        assert_eq!(stats.best_score, 9.0);
        assert_eq!(stats.average_time_per_quiz_seconds, 68.33);
    }

    #[test]
    fn stats_for_no_attempts_is_none() {
        assert!(compute_user_stats(Uuid::new_v4(), &[]).is_none());
    }

    #[test]
    fn stats_averages_round_to_two_decimals() {
        let stats =
            compute_user_stats(Uuid::new_v4(), &[attempt(1.0, 10), attempt(2.0, 10), attempt(2.0, 11)])
                .expect("stats");
        assert_eq!(stats.average_score, 1.67);
        assert_eq!(stats.average_time_per_quiz_seconds, 10.33);
    }

    fn build_state() -> AppState {
        let settings = crate::core::config::Settings::load().expect("settings");
        let db =
            sqlx::PgPool::connect_lazy(&settings.database().database_url()).expect("lazy pool");
        let catalog = crate::services::quiz_catalog::CatalogClient::from_settings(&settings)
            .expect("catalog client");
        let identity = crate::services::identity::IdentityClient::from_settings(&settings)
            .expect("identity client");
        AppState::new(settings, db, catalog, identity)
    }

    #[tokio::test]
    async fn submit_rejects_empty_answers_then_bad_time() {
        let _guard = crate::test_support::env_lock();
        crate::test_support::set_test_env();
        let state = build_state();
        let user_id = Uuid::new_v4();

        // Rejected before any quiz fetch, so no collaborator needs to be up.
        let empty = SubmitResultRequest {
            quiz_id: Uuid::new_v4(),
            time_taken_seconds: 30,
            answers: Vec::new(),
        };
        match submit(&state, user_id, empty).await {
            Err(ResultError::InvalidInput(message)) => assert_eq!(message, "No answers provided"),
            other => panic!("expected invalid input, got {other:?}"),
        }

        let bad_time = SubmitResultRequest {
            quiz_id: Uuid::new_v4(),
            time_taken_seconds: 0,
            answers: vec![SubmittedAnswer {
                question_id: Uuid::new_v4(),
                given_answer: "x".to_string(),
            }],
        };
        match submit(&state, user_id, bad_time).await {
            Err(ResultError::InvalidInput(message)) => assert_eq!(message, "Invalid time taken"),
            other => panic!("expected invalid input, got {other:?}"),
        }

        // Both invalid: the answers check wins.
        let both = SubmitResultRequest {
            quiz_id: Uuid::new_v4(),
            time_taken_seconds: -5,
            answers: Vec::new(),
        };
        match submit(&state, user_id, both).await {
            Err(ResultError::InvalidInput(message)) => assert_eq!(message, "No answers provided"),
            other => panic!("expected invalid input, got {other:?}"),
        }
    }

    #[test]
    fn answer_rows_carry_grading_verdicts() {
        let question_id = Uuid::new_v4();
        let result_id = Uuid::new_v4();
        let submitted = vec![SubmittedAnswer {
            question_id,
            given_answer: "Paris".to_string(),
        }];
        let outcome = GradingOutcome {
            total_score: 2.0,
            max_possible_score: 2.0,
            questions: vec![GradedQuestion {
                question_id,
                points_awarded: 2.0,
                max_points: 2.0,
                is_correct: true,
                explanation: None,
                answers: Vec::new(),
            }],
        };

        let rows = answer_rows(result_id, &submitted, &outcome);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].result_id, result_id);
        assert_eq!(rows[0].given_answer, "Paris");
        assert_eq!(rows[0].points_awarded, 2.0);
        assert!(rows[0].is_correct);
    }

    #[test]
    fn answer_rows_for_unknown_questions_score_zero() {
        let outcome =
            GradingOutcome { total_score: 0.0, max_possible_score: 0.0, questions: Vec::new() };
        let submitted = vec![SubmittedAnswer {
            question_id: Uuid::new_v4(),
            given_answer: "stray".to_string(),
        }];

        let rows = answer_rows(Uuid::new_v4(), &submitted, &outcome);
        assert_eq!(rows[0].points_awarded, 0.0);
        assert!(!rows[0].is_correct);
    }
}
