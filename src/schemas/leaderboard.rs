use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LeaderboardResponse {
    pub(crate) quiz_id: Option<Uuid>,
    pub(crate) quiz_title: String,
    pub(crate) entries: Vec<LeaderboardEntry>,
}

/// Derived per query from the result store; never persisted. For the global
/// leaderboard `time_taken_seconds` carries the quizzes-taken count, since a
/// single time is meaningless across quizzes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LeaderboardEntry {
    pub(crate) rank: u32,
    pub(crate) user_id: Uuid,
    pub(crate) user_name: String,
    pub(crate) user_email: Option<String>,
    pub(crate) score: f64,
    pub(crate) time_taken_seconds: i32,
    pub(crate) completed_at: String,
}
