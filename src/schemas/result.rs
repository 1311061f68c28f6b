use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::time::format_primitive;
use crate::db::models::{QuizResult, QuizResultAnswer};
use crate::schemas::quiz::QuizInfo;
use crate::schemas::user::UserInfo;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmitResultRequest {
    pub(crate) quiz_id: Uuid,
    pub(crate) time_taken_seconds: i32,
    #[serde(default)]
    pub(crate) answers: Vec<SubmittedAnswer>,
}

/// `given_answer` semantics depend on the question type: an answer id
/// (SingleChoice), a comma-joined id list (MultipleChoice), or literal text
/// (TrueFalse / FillInBlank).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmittedAnswer {
    pub(crate) question_id: Uuid,
    pub(crate) given_answer: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResultResponse {
    pub(crate) id: Uuid,
    pub(crate) user_id: Uuid,
    pub(crate) quiz_id: Uuid,
    pub(crate) score: f64,
    pub(crate) max_possible_score: f64,
    pub(crate) time_taken_seconds: i32,
    pub(crate) completed_at: String,
    pub(crate) answers: Vec<ResultAnswerResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResultAnswerResponse {
    pub(crate) id: Uuid,
    pub(crate) question_id: Uuid,
    pub(crate) given_answer: String,
    pub(crate) points_awarded: f64,
    pub(crate) is_correct: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EnrichedResultResponse {
    pub(crate) id: Uuid,
    pub(crate) user_id: Uuid,
    pub(crate) quiz_id: Uuid,
    pub(crate) score: f64,
    pub(crate) max_possible_score: f64,
    pub(crate) time_taken_seconds: i32,
    pub(crate) completed_at: String,
    pub(crate) user_name: Option<String>,
    pub(crate) quiz_title: Option<String>,
    pub(crate) quiz_category: Option<String>,
    pub(crate) answers: Vec<ResultAnswerResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserStatsResponse {
    pub(crate) user_id: Uuid,
    pub(crate) total_quizzes_taken: i64,
    pub(crate) total_score: f64,
    pub(crate) average_score: f64,
    pub(crate) best_score: f64,
    pub(crate) average_time_per_quiz_seconds: f64,
}

impl ResultResponse {
    pub(crate) fn from_db(result: QuizResult, answers: Vec<QuizResultAnswer>) -> Self {
        Self {
            id: result.id,
            user_id: result.user_id,
            quiz_id: result.quiz_id,
            score: result.score,
            max_possible_score: result.max_possible_score,
            time_taken_seconds: result.time_taken_seconds,
            completed_at: format_primitive(result.completed_at),
            answers: answers.into_iter().map(ResultAnswerResponse::from_db).collect(),
        }
    }
}

impl ResultAnswerResponse {
    pub(crate) fn from_db(answer: QuizResultAnswer) -> Self {
        Self {
            id: answer.id,
            question_id: answer.question_id,
            given_answer: answer.given_answer,
            points_awarded: answer.points_awarded,
            is_correct: answer.is_correct,
        }
    }
}

impl EnrichedResultResponse {
    pub(crate) fn from_db(
        result: QuizResult,
        answers: Vec<QuizResultAnswer>,
        user: Option<&UserInfo>,
        quiz: Option<&QuizInfo>,
    ) -> Self {
        Self {
            id: result.id,
            user_id: result.user_id,
            quiz_id: result.quiz_id,
            score: result.score,
            max_possible_score: result.max_possible_score,
            time_taken_seconds: result.time_taken_seconds,
            completed_at: format_primitive(result.completed_at),
            user_name: user.and_then(|info| info.display_name.clone()),
            quiz_title: quiz.map(|info| info.title.clone()),
            quiz_category: quiz.and_then(|info| info.category.clone()),
            answers: answers.into_iter().map(ResultAnswerResponse::from_db).collect(),
        }
    }
}
