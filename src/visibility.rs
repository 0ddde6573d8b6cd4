//! Conditional question visibility.
//!
//! Each rule gates one question on the answer to a single earlier question.
//! Questions without a rule are always shown.

use crate::data::AnswerSet;

pub struct VisibilityRule {
    pub question_id: &'static str,
    /// The earlier question whose answer decides visibility.
    pub depends_on: &'static str,
    pub condition: &'static str,
    predicate: fn(&AnswerSet) -> bool,
}

impl VisibilityRule {
    pub fn evaluate(&self, answers: &AnswerSet) -> bool {
        (self.predicate)(answers)
    }
}

fn answered_yes(answers: &AnswerSet, question_id: &str) -> bool {
    answers.get(question_id) == Some("Yes")
}

fn has_pre_existing_conditions(answers: &AnswerSet) -> bool {
    answered_yes(answers, "preExistingConditions")
}

fn has_medical_history(answers: &AnswerSet) -> bool {
    answered_yes(answers, "medicalHistory")
}

fn has_previous_claims(answers: &AnswerSet) -> bool {
    answered_yes(answers, "previousClaims")
}

fn covers_family(answers: &AnswerSet) -> bool {
    answers
        .get("familySize")
        .and_then(|v| v.trim().parse::<i64>().ok())
        .is_some_and(|size| size > 1)
}

pub static RULES: &[VisibilityRule] = &[
    VisibilityRule {
        question_id: "preExistingDetails",
        depends_on: "preExistingConditions",
        condition: "preExistingConditions is Yes",
        predicate: has_pre_existing_conditions,
    },
    VisibilityRule {
        question_id: "medicalDetails",
        depends_on: "medicalHistory",
        condition: "medicalHistory is Yes",
        predicate: has_medical_history,
    },
    VisibilityRule {
        question_id: "claimDetails",
        depends_on: "previousClaims",
        condition: "previousClaims is Yes",
        predicate: has_previous_claims,
    },
    VisibilityRule {
        question_id: "familyAges",
        depends_on: "familySize",
        condition: "familySize greater than 1",
        predicate: covers_family,
    },
];

pub fn rule_for(question_id: &str) -> Option<&'static VisibilityRule> {
    RULES.iter().find(|rule| rule.question_id == question_id)
}

pub fn is_visible(question_id: &str, answers: &AnswerSet) -> bool {
    rule_for(question_id).map_or(true, |rule| rule.evaluate(answers))
}
