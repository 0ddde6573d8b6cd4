use crate::catalog;
use crate::data::{AnswerSet, Category, Question};
use crate::visibility::is_visible;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Collecting { position: usize },
    Submitted,
}

/// Where the flow stands after moving forward.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Question(&'static Question),
    /// No visible question remains; the answers are ready for scoring.
    Submitted(AnswerSet),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Retreat {
    Question(&'static Question),
    ExitToCategories,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("answer required: please answer '{question_id}' before proceeding")]
    AnswerRequired { question_id: &'static str },
    #[error("questionnaire has already been submitted")]
    AlreadySubmitted,
}

/// Walks one category's questions, skipping those hidden by earlier answers.
#[derive(Debug, Clone)]
pub struct FlowEngine {
    category: Category,
    questions: &'static [Question],
    answers: AnswerSet,
    state: FlowState,
}

impl FlowEngine {
    pub fn new(category: Category) -> Self {
        Self::with_answers(category, AnswerSet::new())
    }

    /// Resume a flow at the first question with answers already recorded.
    pub fn with_answers(category: Category, answers: AnswerSet) -> Self {
        Self {
            category,
            questions: catalog::questions(category),
            answers,
            state: FlowState::Collecting { position: 0 },
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn record_answer(&mut self, question_id: &str, value: impl Into<String>) {
        let value = value.into();
        if catalog::find(self.category, question_id).is_none() {
            tracing::debug!(
                category = %self.category,
                question_id,
                "Answer for question outside catalog"
            );
        }
        let previous = self.answers.record(question_id, value);
        tracing::debug!(
            question_id,
            overwritten = previous.is_some(),
            "Answer recorded"
        );
    }

    /// The question to present now.
    ///
    /// A position that landed on a hidden question is skipped forward the
    /// same way `advance` skips, which may complete the flow.
    pub fn current(&mut self) -> Result<Step, FlowError> {
        let position = self.collecting_position()?;
        let questions = self.questions;
        match questions.get(position) {
            Some(question) if is_visible(question.id, &self.answers) => {
                Ok(Step::Question(question))
            }
            _ => {
                tracing::debug!(position, "Skipping hidden question");
                Ok(self.move_forward_from(position + 1))
            }
        }
    }

    pub fn advance(&mut self) -> Result<Step, FlowError> {
        let position = self.collecting_position()?;
        let questions = self.questions;
        if let Some(question) = questions.get(position) {
            if question.required && !self.answers.is_answered(question.id) {
                tracing::info!(question_id = question.id, "Required answer missing");
                return Err(FlowError::AnswerRequired {
                    question_id: question.id,
                });
            }
        }
        Ok(self.move_forward_from(position + 1))
    }

    pub fn retreat(&mut self) -> Result<Retreat, FlowError> {
        let position = self.collecting_position()?;
        let questions = self.questions;
        match self.previous_visible(position) {
            Some(previous) => {
                self.state = FlowState::Collecting { position: previous };
                tracing::debug!(from = position, to = previous, "Retreated");
                Ok(Retreat::Question(&questions[previous]))
            }
            None => {
                tracing::debug!(category = %self.category, "Leaving questionnaire");
                Ok(Retreat::ExitToCategories)
            }
        }
    }

    /// 1-based index of the current question among the currently visible
    /// ones, and the visible total.
    pub fn progress(&self) -> Option<(usize, usize)> {
        let FlowState::Collecting { position } = self.state else {
            return None;
        };
        let visible: Vec<usize> = (0..self.questions.len())
            .filter(|&i| is_visible(self.questions[i].id, &self.answers))
            .collect();
        let index = visible.iter().filter(|&&i| i <= position).count();
        Some((index.max(1), visible.len()))
    }

    fn collecting_position(&self) -> Result<usize, FlowError> {
        match self.state {
            FlowState::Collecting { position } => Ok(position),
            FlowState::Submitted => Err(FlowError::AlreadySubmitted),
        }
    }

    fn move_forward_from(&mut self, start: usize) -> Step {
        let questions = self.questions;
        match self.next_visible(start) {
            Some(next) => {
                self.state = FlowState::Collecting { position: next };
                tracing::debug!(to = next, question_id = questions[next].id, "Advanced");
                Step::Question(&questions[next])
            }
            None => {
                self.state = FlowState::Submitted;
                tracing::info!(
                    category = %self.category,
                    answers = self.answers.len(),
                    "Questionnaire submitted"
                );
                Step::Submitted(self.answers.clone())
            }
        }
    }

    fn next_visible(&self, start: usize) -> Option<usize> {
        (start..self.questions.len())
            .find(|&i| is_visible(self.questions[i].id, &self.answers))
    }

    fn previous_visible(&self, end: usize) -> Option<usize> {
        (0..end)
            .rev()
            .find(|&i| is_visible(self.questions[i].id, &self.answers))
    }
}
