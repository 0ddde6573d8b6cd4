use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Health,
    Term,
    Vehicle,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Health, Category::Term, Category::Vehicle];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Health => "health",
            Category::Term => "term",
            Category::Vehicle => "vehicle",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Category::Health => "Health Insurance",
            Category::Term => "Term Insurance",
            Category::Vehicle => "Vehicle Insurance",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Category::Health => "Coverage for medical expenses and healthcare needs",
            Category::Term => "Life coverage for a specified term or period",
            Category::Vehicle => "Protection for your car, bike, or other vehicles",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown insurance category '{0}' (expected health, term or vehicle)")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "health" => Ok(Category::Health),
            "term" => Ok(Category::Term),
            "vehicle" => Ok(Category::Vehicle),
            _ => Err(UnknownCategory(raw.to_string())),
        }
    }
}

/// How a question collects its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Text,
    Number,
    Select,
    Radio,
    /// Not used by the built-in catalogs.
    #[allow(dead_code)]
    Date,
}

impl InputKind {
    pub fn has_options(&self) -> bool {
        matches!(self, InputKind::Select | InputKind::Radio)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub id: &'static str,
    pub prompt: &'static str,
    pub kind: InputKind,
    pub options: &'static [&'static str],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    pub required: bool,
}

/// Answers keyed by question id.
///
/// Values are kept as the strings the user entered. Deserialization also
/// accepts JSON numbers and booleans so payloads written by other clients
/// load without loss; nulls are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AnswerSet {
    values: BTreeMap<String, String>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an answer, returning the previous value.
    pub fn record(
        &mut self,
        question_id: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        self.values.insert(question_id.into(), value.into())
    }

    pub fn get(&self, question_id: &str) -> Option<&str> {
        self.values.get(question_id).map(String::as_str)
    }

    /// True when the question has a non-blank answer.
    pub fn is_answered(&self, question_id: &str) -> bool {
        self.get(question_id).is_some_and(|v| !v.trim().is_empty())
    }

    /// Parse an answer as a finite number.
    pub fn number(&self, question_id: &str) -> Option<f64> {
        self.get(question_id)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }

    /// Parse an answer as an integer. Decimal input is truncated toward zero.
    pub fn integer(&self, question_id: &str) -> Option<i64> {
        let raw = self.get(question_id)?.trim();
        raw.parse::<i64>()
            .ok()
            .or_else(|| self.number(question_id).map(|v| v.trunc() as i64))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<'de> Deserialize<'de> for AnswerSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
        let values = raw
            .into_iter()
            .filter_map(|(key, value)| match value {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some((key, s)),
                other => Some((key, other.to_string())),
            })
            .collect();
        Ok(Self { values })
    }
}

/// A candidate plan shown on the results screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOffer {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub coverage: String,
    pub premium: u64,
    pub highlights: Vec<String>,
    pub rating: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Answers handed from the questionnaire to the results stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: Uuid,
    pub category: Category,
    pub answers: AnswerSet,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(category: Category, answers: AnswerSet) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            category,
            answers,
            created_at: Utc::now(),
        }
    }
}
