use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use uuid::Uuid;

/// Authoritative quiz content fetched from the Quiz Catalog at grading time.
/// Field aliases cover the PascalCase spelling some catalog versions emit.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuizSnapshot {
    #[serde(alias = "Id")]
    pub(crate) id: Uuid,
    #[serde(default, alias = "Title")]
    pub(crate) title: String,
    #[serde(default, alias = "Category")]
    pub(crate) category: Option<String>,
    #[serde(default, alias = "Questions")]
    pub(crate) questions: Vec<Question>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Question {
    #[serde(alias = "Id")]
    pub(crate) id: Uuid,
    #[serde(default, alias = "Text")]
    pub(crate) text: String,
    #[serde(alias = "QuestionType")]
    pub(crate) question_type: QuestionType,
    #[serde(default = "default_points", alias = "Points")]
    pub(crate) points: f64,
    #[serde(default, alias = "IsCaseSensitive")]
    pub(crate) is_case_sensitive: bool,
    #[serde(default, alias = "Explanation")]
    pub(crate) explanation: Option<String>,
    #[serde(default, alias = "Answers")]
    pub(crate) answers: Vec<Answer>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Answer {
    #[serde(alias = "Id")]
    pub(crate) id: Uuid,
    #[serde(default, alias = "Text")]
    pub(crate) text: String,
    #[serde(default, alias = "IsCorrect")]
    pub(crate) is_correct: bool,
    #[serde(default, alias = "Explanation")]
    pub(crate) explanation: Option<String>,
}

/// Basic quiz metadata, used to decorate admin result listings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuizInfo {
    #[serde(alias = "Id")]
    pub(crate) id: Uuid,
    #[serde(default, alias = "Title")]
    pub(crate) title: String,
    #[serde(default, alias = "Category")]
    pub(crate) category: Option<String>,
}

fn default_points() -> f64 {
    1.0
}

/// The catalog serializes question types either as an integer ordinal or a
/// string name depending on its version. An unrecognized value is preserved
/// so grading can reject the question explicitly instead of the whole payload
/// failing to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum QuestionType {
    SingleChoice,
    MultipleChoice,
    TrueFalse,
    FillInBlank,
    Unrecognized(String),
}

impl QuestionType {
    fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("SingleChoice") {
            QuestionType::SingleChoice
        } else if name.eq_ignore_ascii_case("MultipleChoice") {
            QuestionType::MultipleChoice
        } else if name.eq_ignore_ascii_case("TrueFalse") {
            QuestionType::TrueFalse
        } else if name.eq_ignore_ascii_case("FillInBlank")
            || name.eq_ignore_ascii_case("FillInTheBlank")
        {
            QuestionType::FillInBlank
        } else {
            QuestionType::Unrecognized(name.to_string())
        }
    }

    fn from_ordinal(ordinal: u64) -> Self {
        match ordinal {
            0 => QuestionType::SingleChoice,
            1 => QuestionType::MultipleChoice,
            2 => QuestionType::TrueFalse,
            3 => QuestionType::FillInBlank,
            other => QuestionType::Unrecognized(other.to_string()),
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuestionType::SingleChoice => write!(f, "SingleChoice"),
            QuestionType::MultipleChoice => write!(f, "MultipleChoice"),
            QuestionType::TrueFalse => write!(f, "TrueFalse"),
            QuestionType::FillInBlank => write!(f, "FillInBlank"),
            QuestionType::Unrecognized(raw) => write!(f, "{raw}"),
        }
    }
}

impl<'de> Deserialize<'de> for QuestionType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct QuestionTypeVisitor;

        impl<'de> Visitor<'de> for QuestionTypeVisitor {
            type Value = QuestionType;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a question type name or ordinal")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                Ok(QuestionType::from_ordinal(value))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                if value < 0 {
                    return Ok(QuestionType::Unrecognized(value.to_string()));
                }
                Ok(QuestionType::from_ordinal(value as u64))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                Ok(QuestionType::from_name(value))
            }
        }

        deserializer.deserialize_any(QuestionTypeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_type_decodes_ordinals() {
        let parsed: QuestionType = serde_json::from_str("0").unwrap();
        assert_eq!(parsed, QuestionType::SingleChoice);
        let parsed: QuestionType = serde_json::from_str("3").unwrap();
        assert_eq!(parsed, QuestionType::FillInBlank);
    }

    #[test]
    fn question_type_decodes_names() {
        let parsed: QuestionType = serde_json::from_str("\"MultipleChoice\"").unwrap();
        assert_eq!(parsed, QuestionType::MultipleChoice);
        let parsed: QuestionType = serde_json::from_str("\"FillInTheBlank\"").unwrap();
        assert_eq!(parsed, QuestionType::FillInBlank);
        let parsed: QuestionType = serde_json::from_str("\"truefalse\"").unwrap();
        assert_eq!(parsed, QuestionType::TrueFalse);
    }

    #[test]
    fn question_type_preserves_unknown_values() {
        let parsed: QuestionType = serde_json::from_str("\"Matching\"").unwrap();
        assert_eq!(parsed, QuestionType::Unrecognized("Matching".to_string()));
        let parsed: QuestionType = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, QuestionType::Unrecognized("7".to_string()));
    }

    #[test]
    fn question_defaults_apply() {
        let raw = r#"{
            "id": "6f2c0e88-9a3e-4f6e-9d6f-0a4c1c6b1a11",
            "questionType": "TrueFalse"
        }"#;
        let question: Question = serde_json::from_str(raw).unwrap();
        assert_eq!(question.points, 1.0);
        assert!(!question.is_case_sensitive);
        assert!(question.answers.is_empty());
    }

    #[test]
    fn quiz_accepts_pascal_case_fields() {
        let raw = r#"{
            "Id": "6f2c0e88-9a3e-4f6e-9d6f-0a4c1c6b1a11",
            "Title": "Capitals",
            "Questions": [{
                "Id": "5d1b0e88-9a3e-4f6e-9d6f-0a4c1c6b1a22",
                "QuestionType": 2,
                "Points": 2.5,
                "Answers": [{"Id": "4c0a0e88-9a3e-4f6e-9d6f-0a4c1c6b1a33", "Text": "True", "IsCorrect": true}]
            }]
        }"#;
        let quiz: QuizSnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(quiz.title, "Capitals");
        assert_eq!(quiz.questions.len(), 1);
        assert_eq!(quiz.questions[0].question_type, QuestionType::TrueFalse);
        assert_eq!(quiz.questions[0].points, 2.5);
        assert!(quiz.questions[0].answers[0].is_correct);
    }
}
