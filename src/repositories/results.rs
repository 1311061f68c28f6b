use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::{AttemptRow, QuizResult, QuizResultAnswer};

pub(crate) const RESULT_COLUMNS: &str =
    "id, user_id, quiz_id, score, max_possible_score, time_taken_seconds, completed_at";

pub(crate) const ANSWER_COLUMNS: &str =
    "id, result_id, question_id, given_answer, points_awarded, is_correct";

/// Writes a graded attempt and its per-answer rows in one transaction.
pub(crate) async fn insert_result(
    pool: &PgPool,
    result: &QuizResult,
    answers: &[QuizResultAnswer],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO quiz_results \
         (id, user_id, quiz_id, score, max_possible_score, time_taken_seconds, completed_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(result.id)
    .bind(result.user_id)
    .bind(result.quiz_id)
    .bind(result.score)
    .bind(result.max_possible_score)
    .bind(result.time_taken_seconds)
    .bind(result.completed_at)
    .execute(&mut *tx)
    .await?;

    for answer in answers {
        sqlx::query(
            "INSERT INTO quiz_result_answers \
             (id, result_id, question_id, given_answer, points_awarded, is_correct) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(answer.id)
        .bind(answer.result_id)
        .bind(answer.question_id)
        .bind(&answer.given_answer)
        .bind(answer.points_awarded)
        .bind(answer.is_correct)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<QuizResult>, sqlx::Error> {
    sqlx::query_as::<_, QuizResult>(&format!(
        "SELECT {RESULT_COLUMNS}
         FROM quiz_results
         WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn answers_for_result(
    pool: &PgPool,
    result_id: Uuid,
) -> Result<Vec<QuizResultAnswer>, sqlx::Error> {
    sqlx::query_as::<_, QuizResultAnswer>(&format!(
        "SELECT {ANSWER_COLUMNS}
         FROM quiz_result_answers
         WHERE result_id = $1
         ORDER BY id"
    ))
    .bind(result_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn answers_for_results(
    pool: &PgPool,
    result_ids: &[Uuid],
) -> Result<Vec<QuizResultAnswer>, sqlx::Error> {
    if result_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, QuizResultAnswer>(&format!(
        "SELECT {ANSWER_COLUMNS}
         FROM quiz_result_answers
         WHERE result_id = ANY($1)
         ORDER BY result_id, id"
    ))
    .bind(result_ids)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_by_user(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<QuizResult>, sqlx::Error> {
    sqlx::query_as::<_, QuizResult>(&format!(
        "SELECT {RESULT_COLUMNS}
         FROM quiz_results
         WHERE user_id = $1
         ORDER BY completed_at DESC
         LIMIT $2 OFFSET $3"
    ))
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_by_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM quiz_results WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

/// Per-quiz listing is ranked, not chronological: best score first, ties
/// broken by the faster attempt.
pub(crate) async fn list_by_quiz(
    pool: &PgPool,
    quiz_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<QuizResult>, sqlx::Error> {
    sqlx::query_as::<_, QuizResult>(&format!(
        "SELECT {RESULT_COLUMNS}
         FROM quiz_results
         WHERE quiz_id = $1
         ORDER BY score DESC, time_taken_seconds ASC
         LIMIT $2 OFFSET $3"
    ))
    .bind(quiz_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_by_quiz(pool: &PgPool, quiz_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM quiz_results WHERE quiz_id = $1")
        .bind(quiz_id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn list_all(
    pool: &PgPool,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<QuizResult>, sqlx::Error> {
    match search {
        Some(term) => {
            sqlx::query_as::<_, QuizResult>(&format!(
                "SELECT {RESULT_COLUMNS}
                 FROM quiz_results
                 WHERE id::text ILIKE $1 OR user_id::text ILIKE $1 OR quiz_id::text ILIKE $1
                 ORDER BY completed_at DESC
                 LIMIT $2 OFFSET $3"
            ))
            .bind(format!("%{term}%"))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, QuizResult>(&format!(
                "SELECT {RESULT_COLUMNS}
                 FROM quiz_results
                 ORDER BY completed_at DESC
                 LIMIT $1 OFFSET $2"
            ))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
        }
    }
}

pub(crate) async fn count_all(pool: &PgPool, search: Option<&str>) -> Result<i64, sqlx::Error> {
    match search {
        Some(term) => {
            sqlx::query_scalar(
                "SELECT COUNT(*) FROM quiz_results
                 WHERE id::text ILIKE $1 OR user_id::text ILIKE $1 OR quiz_id::text ILIKE $1",
            )
            .bind(format!("%{term}%"))
            .fetch_one(pool)
            .await
        }
        None => {
            sqlx::query_scalar("SELECT COUNT(*) FROM quiz_results")
                .fetch_one(pool)
                .await
        }
    }
}

/// Every attempt for one user, oldest first. Used by the stats aggregation.
pub(crate) async fn list_by_user_all(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<QuizResult>, sqlx::Error> {
    sqlx::query_as::<_, QuizResult>(&format!(
        "SELECT {RESULT_COLUMNS}
         FROM quiz_results
         WHERE user_id = $1
         ORDER BY completed_at ASC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn attempt_rows(pool: &PgPool) -> Result<Vec<AttemptRow>, sqlx::Error> {
    sqlx::query_as::<_, AttemptRow>(
        "SELECT user_id, quiz_id, score, time_taken_seconds, completed_at
         FROM quiz_results
         ORDER BY completed_at ASC",
    )
    .fetch_all(pool)
    .await
}

pub(crate) async fn attempt_rows_for_quiz(
    pool: &PgPool,
    quiz_id: Uuid,
) -> Result<Vec<AttemptRow>, sqlx::Error> {
    sqlx::query_as::<_, AttemptRow>(
        "SELECT user_id, quiz_id, score, time_taken_seconds, completed_at
         FROM quiz_results
         WHERE quiz_id = $1
         ORDER BY completed_at ASC",
    )
    .bind(quiz_id)
    .fetch_all(pool)
    .await
}
