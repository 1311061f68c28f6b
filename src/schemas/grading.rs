use uuid::Uuid;

/// One graded row per answer the review UI should display. `answer_id` is
/// `None` when the submission referenced no real answer.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GradedAnswer {
    pub(crate) answer_id: Option<Uuid>,
    pub(crate) given_answer: String,
    pub(crate) is_correct: bool,
    pub(crate) points_awarded: f64,
    pub(crate) explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GradedQuestion {
    pub(crate) question_id: Uuid,
    pub(crate) points_awarded: f64,
    pub(crate) max_points: f64,
    pub(crate) is_correct: bool,
    pub(crate) explanation: Option<String>,
    pub(crate) answers: Vec<GradedAnswer>,
}

/// Outcome of grading one submission against one quiz snapshot.
///
/// `total_score` accumulates each question's award rounded half-away-from-zero
/// to an integer, while `max_possible_score` stays fractional. The asymmetry
/// is inherited wire behavior the rest of the platform depends on; do not
/// "fix" it here.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GradingOutcome {
    pub(crate) total_score: f64,
    pub(crate) max_possible_score: f64,
    pub(crate) questions: Vec<GradedQuestion>,
}

impl GradingOutcome {
    pub(crate) fn question(&self, question_id: Uuid) -> Option<&GradedQuestion> {
        self.questions.iter().find(|question| question.question_id == question_id)
    }
}
