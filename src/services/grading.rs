use thiserror::Error;
use uuid::Uuid;

use crate::schemas::grading::{GradedAnswer, GradedQuestion, GradingOutcome};
use crate::schemas::quiz::{Answer, Question, QuestionType, QuizSnapshot};
use crate::schemas::result::SubmittedAnswer;

/// Placeholder recorded for a correct option the user failed to select on a
/// multiple-choice question. Review UIs key on this literal.
pub(crate) const NOT_SELECTED: &str = "(Not selected)";

#[derive(Debug, Error)]
pub(crate) enum GradingError {
    #[error("unsupported question type '{question_type}' on question {question_id}")]
    UnsupportedQuestionType { question_id: Uuid, question_type: String },
}

/// Grades a submission against a quiz snapshot. Pure: no I/O, no clock, and
/// grading the same inputs twice yields an identical outcome.
///
/// Malformed submitted answers (ids that match nothing, unparseable lists)
/// are scored as incorrect, never treated as protocol errors. The only hard
/// failure is a question whose type this engine does not know, which fails
/// the whole call rather than silently under-scoring.
pub(crate) fn grade_quiz(
    quiz: &QuizSnapshot,
    answers: &[SubmittedAnswer],
) -> Result<GradingOutcome, GradingError> {
    let mut outcome = GradingOutcome {
        total_score: 0.0,
        max_possible_score: 0.0,
        questions: Vec::with_capacity(quiz.questions.len()),
    };

    for question in &quiz.questions {
        let submitted = answers.iter().find(|answer| answer.question_id == question.id);
        let graded = grade_question(question, submitted)?;

        // Total score is integer-granular while the maximum stays fractional.
        // Inherited wire behavior; see GradingOutcome.
        outcome.total_score += graded.points_awarded.round();
        outcome.max_possible_score += graded.max_points;
        outcome.questions.push(graded);
    }

    Ok(outcome)
}

fn grade_question(
    question: &Question,
    submitted: Option<&SubmittedAnswer>,
) -> Result<GradedQuestion, GradingError> {
    let Some(submitted) = submitted.filter(|answer| !answer.given_answer.trim().is_empty()) else {
        return Ok(unanswered(question));
    };

    let mut graded = match &question.question_type {
        QuestionType::SingleChoice => grade_single_choice(question, submitted),
        QuestionType::MultipleChoice => grade_multiple_choice(question, submitted),
        QuestionType::TrueFalse => grade_true_false(question, submitted),
        QuestionType::FillInBlank => grade_fill_in_blank(question, submitted),
        QuestionType::Unrecognized(raw) => {
            return Err(GradingError::UnsupportedQuestionType {
                question_id: question.id,
                question_type: raw.clone(),
            });
        }
    };

    // The award can never exceed the question's worth, whatever the
    // per-type arithmetic produced.
    graded.points_awarded = graded.points_awarded.min(question.points);
    Ok(graded)
}

fn unanswered(question: &Question) -> GradedQuestion {
    GradedQuestion {
        question_id: question.id,
        points_awarded: 0.0,
        max_points: question.points,
        is_correct: false,
        explanation: question.explanation.clone(),
        answers: Vec::new(),
    }
}

fn grade_single_choice(question: &Question, submitted: &SubmittedAnswer) -> GradedQuestion {
    let given = submitted.given_answer.trim();
    let selected = find_answer(&question.answers, given);

    let is_correct = selected.map(|answer| answer.is_correct).unwrap_or(false);
    let points_awarded = if is_correct { question.points } else { 0.0 };

    let graded_answer = GradedAnswer {
        answer_id: selected.map(|answer| answer.id),
        given_answer: submitted.given_answer.clone(),
        is_correct,
        points_awarded,
        explanation: selected.and_then(|answer| answer.explanation.clone()),
    };

    GradedQuestion {
        question_id: question.id,
        points_awarded,
        max_points: question.points,
        is_correct,
        explanation: question.explanation.clone(),
        answers: vec![graded_answer],
    }
}

fn grade_multiple_choice(question: &Question, submitted: &SubmittedAnswer) -> GradedQuestion {
    // Every comma-separated item counts as a selection, matched or not; the
    // selection count feeds the final correctness check below.
    let selected_ids: Vec<&str> =
        submitted.given_answer.split(',').map(|id| id.trim()).collect();
    let correct_answers: Vec<&Answer> =
        question.answers.iter().filter(|answer| answer.is_correct).collect();

    if correct_answers.is_empty() {
        // No answer is marked correct: the question is ungradable.
        return unanswered(question);
    }

    let points_per_correct = question.points / correct_answers.len() as f64;
    let mut points_awarded = 0.0;
    let mut all_correct = true;
    let mut graded_answers = Vec::new();

    for selected_id in &selected_ids {
        let Some(answer) = find_answer(&question.answers, selected_id) else {
            continue;
        };

        let answer_points = if answer.is_correct { points_per_correct } else { 0.0 };
        points_awarded += answer_points;
        if !answer.is_correct {
            all_correct = false;
        }

        graded_answers.push(GradedAnswer {
            answer_id: Some(answer.id),
            given_answer: selected_id.to_string(),
            is_correct: answer.is_correct,
            points_awarded: answer_points,
            explanation: answer.explanation.clone(),
        });
    }

    for correct_answer in &correct_answers {
        let id_string = correct_answer.id.to_string();
        if !selected_ids.iter().any(|selected| *selected == id_string) {
            all_correct = false;
            graded_answers.push(GradedAnswer {
                answer_id: Some(correct_answer.id),
                given_answer: NOT_SELECTED.to_string(),
                is_correct: true,
                points_awarded: 0.0,
                explanation: correct_answer.explanation.clone(),
            });
        }
    }

    GradedQuestion {
        question_id: question.id,
        points_awarded: round_to_cents(points_awarded),
        max_points: question.points,
        // Extra wrong selections or missed correct options fail the question
        // even though partial credit was still awarded above.
        is_correct: all_correct && selected_ids.len() == correct_answers.len(),
        explanation: question.explanation.clone(),
        answers: graded_answers,
    }
}

fn grade_true_false(question: &Question, submitted: &SubmittedAnswer) -> GradedQuestion {
    let given = submitted.given_answer.as_str();
    let is_correct = question
        .answers
        .iter()
        .any(|answer| answer.is_correct && text_matches(&answer.text, given, false));
    let points_awarded = if is_correct { question.points } else { 0.0 };

    // One row per answer, each mirroring the question-level verdict, so
    // review UIs can render the full option list.
    let answers = question
        .answers
        .iter()
        .map(|answer| GradedAnswer {
            answer_id: Some(answer.id),
            given_answer: submitted.given_answer.clone(),
            is_correct,
            points_awarded,
            explanation: answer.explanation.clone(),
        })
        .collect();

    GradedQuestion {
        question_id: question.id,
        points_awarded,
        max_points: question.points,
        is_correct,
        explanation: question.explanation.clone(),
        answers,
    }
}

fn grade_fill_in_blank(question: &Question, submitted: &SubmittedAnswer) -> GradedQuestion {
    let correct_answers: Vec<&Answer> =
        question.answers.iter().filter(|answer| answer.is_correct).collect();

    if correct_answers.is_empty() {
        return unanswered(question);
    }

    let given = submitted.given_answer.as_str();
    let is_correct = correct_answers
        .iter()
        .any(|answer| text_matches(&answer.text, given, question.is_case_sensitive));
    let points_awarded = if is_correct { question.points } else { 0.0 };

    let answers = correct_answers
        .iter()
        .map(|answer| GradedAnswer {
            answer_id: Some(answer.id),
            given_answer: submitted.given_answer.clone(),
            is_correct,
            points_awarded,
            explanation: answer.explanation.clone(),
        })
        .collect();

    GradedQuestion {
        question_id: question.id,
        points_awarded,
        max_points: question.points,
        is_correct,
        explanation: question.explanation.clone(),
        answers,
    }
}

fn find_answer<'a>(answers: &'a [Answer], given_id: &str) -> Option<&'a Answer> {
    answers.iter().find(|answer| answer.id.to_string() == given_id)
}

fn text_matches(expected: &str, given: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        expected == given
    } else {
        expected.to_lowercase() == given.to_lowercase()
    }
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
