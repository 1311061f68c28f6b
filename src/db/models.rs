use sqlx::FromRow;
use time::PrimitiveDateTime;
use uuid::Uuid;

/// A graded quiz attempt. Immutable once written; there is no update or
/// delete path.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct QuizResult {
    pub(crate) id: Uuid,
    pub(crate) user_id: Uuid,
    pub(crate) quiz_id: Uuid,
    pub(crate) score: f64,
    pub(crate) max_possible_score: f64,
    pub(crate) time_taken_seconds: i32,
    pub(crate) completed_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct QuizResultAnswer {
    pub(crate) id: Uuid,
    pub(crate) result_id: Uuid,
    pub(crate) question_id: Uuid,
    pub(crate) given_answer: String,
    pub(crate) points_awarded: f64,
    pub(crate) is_correct: bool,
}

/// Slim projection used by the leaderboard reductions.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct AttemptRow {
    pub(crate) user_id: Uuid,
    pub(crate) quiz_id: Uuid,
    pub(crate) score: f64,
    pub(crate) time_taken_seconds: i32,
    pub(crate) completed_at: PrimitiveDateTime,
}
