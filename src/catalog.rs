use crate::data::{Category, InputKind, Question};

const YES_NO: &[&str] = &["Yes", "No"];
const GENDERS: &[&str] = &["Male", "Female", "Other"];

const fn number(id: &'static str, prompt: &'static str, placeholder: &'static str) -> Question {
    Question {
        id,
        prompt,
        kind: InputKind::Number,
        options: &[],
        placeholder: Some(placeholder),
        required: true,
    }
}

const fn choice(
    id: &'static str,
    prompt: &'static str,
    kind: InputKind,
    options: &'static [&'static str],
) -> Question {
    Question {
        id,
        prompt,
        kind,
        options,
        placeholder: None,
        required: true,
    }
}

/// Free-text follow-up; never blocks the flow.
const fn details(id: &'static str, prompt: &'static str, placeholder: &'static str) -> Question {
    Question {
        id,
        prompt,
        kind: InputKind::Text,
        options: &[],
        placeholder: Some(placeholder),
        required: false,
    }
}

static HEALTH: &[Question] = &[
    number("age", "What is your age?", "Enter your age"),
    choice("gender", "What is your gender?", InputKind::Select, GENDERS),
    number(
        "familySize",
        "How many family members do you want to include in your health insurance?",
        "Number of family members",
    ),
    details(
        "familyAges",
        "What are the ages of the other family members?",
        "e.g. 34, 8, 5",
    ),
    choice(
        "preExistingConditions",
        "Do you have any pre-existing medical conditions?",
        InputKind::Radio,
        YES_NO,
    ),
    details(
        "preExistingDetails",
        "Please describe your pre-existing conditions.",
        "e.g. diabetes, hypertension",
    ),
    choice(
        "medicalHistory",
        "Have you been hospitalised or had surgery in the last 5 years?",
        InputKind::Radio,
        YES_NO,
    ),
    details(
        "medicalDetails",
        "Please describe the treatment you received.",
        "Procedure and year",
    ),
    number(
        "annualIncome",
        "What is your annual income (in rupees)?",
        "Annual income in rupees",
    ),
];

static TERM: &[Question] = &[
    number("age", "What is your age?", "Enter your age"),
    choice("gender", "What is your gender?", InputKind::Select, GENDERS),
    choice("smoker", "Are you a smoker?", InputKind::Radio, YES_NO),
    number(
        "annualIncome",
        "What is your annual income (in rupees)?",
        "Annual income in rupees",
    ),
    choice(
        "medicalHistory",
        "Have you been hospitalised or had surgery in the last 5 years?",
        InputKind::Radio,
        YES_NO,
    ),
    details(
        "medicalDetails",
        "Please describe the treatment you received.",
        "Procedure and year",
    ),
    number(
        "coverageAmount",
        "What amount of coverage are you looking for (in rupees)?",
        "Coverage amount in rupees",
    ),
    choice(
        "termLength",
        "For how many years do you want the insurance?",
        InputKind::Select,
        &["10 years", "15 years", "20 years", "25 years", "30 years"],
    ),
];

static VEHICLE: &[Question] = &[
    choice(
        "vehicleType",
        "What type of vehicle do you have?",
        InputKind::Select,
        &["Two wheeler", "Four wheeler", "Commercial vehicle"],
    ),
    number(
        "vehicleAge",
        "How old is your vehicle (in years)?",
        "Vehicle age in years",
    ),
    number(
        "vehicleValue",
        "What is the current market value of your vehicle (in rupees)?",
        "Value in rupees",
    ),
    number(
        "age",
        "What is the age of the primary driver?",
        "Driver age in years",
    ),
    choice(
        "previousClaims",
        "Have you made any insurance claims in the last 3 years?",
        InputKind::Radio,
        YES_NO,
    ),
    details(
        "claimDetails",
        "Please describe your previous claims.",
        "Number of claims and amounts",
    ),
    choice(
        "coverageType",
        "What type of coverage are you looking for?",
        InputKind::Select,
        &["Third party only", "Comprehensive", "Zero depreciation"],
    ),
];

/// Ordered question list for a category.
pub fn questions(category: Category) -> &'static [Question] {
    match category {
        Category::Health => HEALTH,
        Category::Term => TERM,
        Category::Vehicle => VEHICLE,
    }
}

pub fn find(category: Category, question_id: &str) -> Option<&'static Question> {
    questions(category).iter().find(|q| q.id == question_id)
}

#[cfg(test)]
pub fn position(category: Category, question_id: &str) -> Option<usize> {
    questions(category).iter().position(|q| q.id == question_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_question_ids_unique_per_category() {
        for category in Category::ALL {
            let ids: HashSet<_> = questions(category).iter().map(|q| q.id).collect();
            assert_eq!(
                ids.len(),
                questions(category).len(),
                "duplicate id in {category}"
            );
        }
    }

    #[test]
    fn test_options_only_on_choice_kinds() {
        for category in Category::ALL {
            for question in questions(category) {
                assert_eq!(
                    question.kind.has_options(),
                    !question.options.is_empty(),
                    "{category}/{} options do not match its kind",
                    question.id
                );
            }
        }
    }

    #[test]
    fn test_first_question_is_required() {
        for category in Category::ALL {
            assert!(questions(category)[0].required);
        }
    }

    #[test]
    fn test_find_and_position() {
        assert_eq!(
            find(Category::Vehicle, "vehicleValue").map(|q| q.kind),
            Some(InputKind::Number)
        );
        assert_eq!(position(Category::Health, "age"), Some(0));
        assert!(find(Category::Term, "vehicleValue").is_none());
    }

    #[test]
    fn test_scoring_inputs_are_asked() {
        for id in ["age", "familySize", "annualIncome"] {
            assert!(find(Category::Health, id).is_some(), "health asks {id}");
        }
        for id in ["age", "annualIncome", "smoker"] {
            assert!(find(Category::Term, id).is_some(), "term asks {id}");
        }
        for id in ["vehicleAge", "vehicleValue", "age"] {
            assert!(find(Category::Vehicle, id).is_some(), "vehicle asks {id}");
        }
    }
}
