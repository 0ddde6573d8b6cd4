use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;

use crate::catalog;
use crate::data::{AnswerSet, Category, InputKind, PlanOffer, Question, Session};
use crate::flow::{FlowEngine, FlowError, Retreat, Step};
use crate::gateway::{RecommendationGateway, RecommendationResponse};
use crate::scoring::{self, format_inr};
use crate::storage::{SessionError, SessionStore};
use crate::visibility;

#[derive(Debug, Clone, PartialEq)]
pub enum QuestionnaireOutcome {
    Submitted(AnswerSet),
    /// The user backed out of the first question or input ended.
    Exited,
}

/// List the categories in selection order.
pub fn list_categories<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "Choose the insurance you are looking for:")?;
    for (index, category) in Category::ALL.iter().enumerate() {
        writeln!(
            out,
            "  {}. {:<18} {}",
            index + 1,
            category.title(),
            category.description()
        )?;
    }
    Ok(())
}

/// Print a category's catalog with the rule gating each conditional question.
pub fn show_questions<W: Write>(category: Category, out: &mut W) -> Result<()> {
    writeln!(out, "{} questionnaire:", category.title())?;
    writeln!(out, "{:<24} {:<8} {:<9} OPTIONS", "ID", "KIND", "REQUIRED")?;
    writeln!(out, "{}", "-".repeat(70))?;

    for question in catalog::questions(category) {
        let kind = format!("{:?}", question.kind).to_lowercase();
        let required = if question.required { "yes" } else { "no" };
        writeln!(
            out,
            "{:<24} {:<8} {:<9} {}",
            question.id,
            kind,
            required,
            question.options.join(" | ")
        )?;
        writeln!(out, "    {}", question.prompt)?;
        if let Some(rule) = visibility::rule_for(question.id) {
            writeln!(out, "    depends on {}: shown when {}", rule.depends_on, rule.condition)?;
        }
    }
    Ok(())
}

/// Walk the questionnaire for `category` over line-based input.
///
/// `back` returns to the previous visible question. A blank line keeps the
/// current answer, so a required question left blank is reported and asked
/// again.
pub fn run_questionnaire<R: BufRead, W: Write>(
    category: Category,
    input: &mut R,
    out: &mut W,
) -> Result<QuestionnaireOutcome> {
    let mut flow = FlowEngine::new(category);
    let mut step = flow.current()?;
    writeln!(out, "{} questionnaire (type 'back' to go back)", category.title())?;

    loop {
        let question = match step {
            Step::Submitted(answers) => return Ok(QuestionnaireOutcome::Submitted(answers)),
            Step::Question(question) => question,
        };
        prompt_question(&flow, question, out)?;

        let Some(line) = read_line(input)? else {
            writeln!(out)?;
            tracing::info!(
                category = %flow.category(),
                state = ?flow.state(),
                "Input closed before submission"
            );
            return Ok(QuestionnaireOutcome::Exited);
        };
        let raw = line.trim();

        if raw.eq_ignore_ascii_case("back") {
            match flow.retreat()? {
                Retreat::Question(previous) => {
                    step = Step::Question(previous);
                    continue;
                }
                Retreat::ExitToCategories => return Ok(QuestionnaireOutcome::Exited),
            }
        }

        match normalize_input(question, raw) {
            Ok(Some(value)) => flow.record_answer(question.id, value),
            Ok(None) => {}
            Err(message) => {
                writeln!(out, "{message}")?;
                step = Step::Question(question);
                continue;
            }
        }

        step = match flow.advance() {
            Ok(next) => next,
            Err(FlowError::AnswerRequired { .. }) => {
                writeln!(out, "Answer required: please answer this question to continue.")?;
                Step::Question(question)
            }
            Err(err) => return Err(err.into()),
        };
    }
}

fn prompt_question<W: Write>(flow: &FlowEngine, question: &Question, out: &mut W) -> Result<()> {
    writeln!(out)?;
    match flow.progress() {
        Some((index, total)) => writeln!(out, "[{index}/{total}] {}", question.prompt)?,
        None => writeln!(out, "{}", question.prompt)?,
    }
    if question.kind.has_options() {
        for (index, option) in question.options.iter().enumerate() {
            writeln!(out, "  {}. {}", index + 1, option)?;
        }
    }
    if let Some(current) = flow.answers().get(question.id) {
        writeln!(out, "  (current answer: {current}; press Enter to keep)")?;
    } else if let Some(placeholder) = question.placeholder {
        writeln!(out, "  ({placeholder})")?;
    }
    if !question.required {
        writeln!(out, "  (optional)")?;
    }
    write!(out, "> ")?;
    out.flush()?;
    Ok(())
}

fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

/// Convert raw input to the stored answer. `Ok(None)` means nothing was
/// entered; `Err` carries a message to show before asking again.
pub fn normalize_input(question: &Question, raw: &str) -> Result<Option<String>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    match question.kind {
        InputKind::Select | InputKind::Radio => {
            let by_index = raw
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| question.options.get(i));
            let by_text = question
                .options
                .iter()
                .find(|option| option.eq_ignore_ascii_case(raw));
            by_index
                .or(by_text)
                .map(|option| Some(option.to_string()))
                .ok_or_else(|| {
                    format!(
                        "Please choose 1-{} or type one of: {}",
                        question.options.len(),
                        question.options.join(", ")
                    )
                })
        }
        InputKind::Number => {
            let cleaned: String = raw.chars().filter(|c| !matches!(c, ',' | '_')).collect();
            match cleaned.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(Some(cleaned)),
                _ => Err(format!("'{raw}' is not a number")),
            }
        }
        InputKind::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(|date| Some(date.format("%Y-%m-%d").to_string()))
            .map_err(|_| format!("'{raw}' is not a date (use YYYY-MM-DD)")),
        InputKind::Text => Ok(Some(raw.to_string())),
    }
}

/// Prompt for a category on the selection screen. `None` when input ends.
pub fn choose_category<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
) -> Result<Option<Category>> {
    list_categories(out)?;
    loop {
        write!(out, "Category [1-{}]: ", Category::ALL.len())?;
        out.flush()?;
        let Some(line) = read_line(input)? else {
            writeln!(out)?;
            return Ok(None);
        };
        let raw = line.trim();
        let chosen = raw
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| Category::ALL.get(i).copied())
            .or_else(|| raw.parse().ok());
        match chosen {
            Some(category) => return Ok(Some(category)),
            None => writeln!(out, "Unknown category '{raw}'")?,
        }
    }
}

/// Questionnaire and results stages joined by a session store.
pub struct Advisor<'a> {
    store: &'a dyn SessionStore,
    gateway: &'a dyn RecommendationGateway,
}

impl<'a> Advisor<'a> {
    pub fn new(store: &'a dyn SessionStore, gateway: &'a dyn RecommendationGateway) -> Self {
        Self { store, gateway }
    }

    /// Run the questionnaire from an empty answer set, hand the answers off
    /// through the store, then show results.
    ///
    /// Leaving the questionnaire returns to category selection; a new choice
    /// starts a fresh questionnaire.
    pub fn start<R: BufRead, W: Write>(
        &self,
        category: Category,
        input: &mut R,
        out: &mut W,
    ) -> Result<()> {
        let mut category = category;
        loop {
            self.store.clear()?;
            match run_questionnaire(category, input, out)? {
                QuestionnaireOutcome::Submitted(answers) => {
                    let session = Session::new(category, answers);
                    self.store.save(&session)?;
                    render_answers(&session, out)?;
                    return self.present_results(&session, input, out);
                }
                QuestionnaireOutcome::Exited => {
                    writeln!(out, "Questionnaire closed. Back to category selection.")?;
                    match choose_category(input, out)? {
                        Some(next) => category = next,
                        None => return Ok(()),
                    }
                }
            }
        }
    }

    /// Enter the results stage from the stored session.
    ///
    /// Without usable answers the user is sent into the questionnaire instead.
    pub fn results<R: BufRead, W: Write>(
        &self,
        requested: Option<Category>,
        input: &mut R,
        out: &mut W,
    ) -> Result<()> {
        let session = match self.store.load_for_results(requested) {
            Ok(session) => session,
            Err(err) if err.is_malformed_state() => {
                tracing::warn!(error = %err, "Results requested without usable answers");
                writeln!(out, "{err}. Starting the questionnaire.")?;
                let category = match redirect_category(&err, requested) {
                    Some(category) => category,
                    None => match choose_category(input, out)? {
                        Some(category) => category,
                        None => return Ok(()),
                    },
                };
                return self.start(category, input, out);
            }
            Err(err) => return Err(err.into()),
        };
        self.present_results(&session, input, out)
    }

    fn present_results<R: BufRead, W: Write>(
        &self,
        session: &Session,
        input: &mut R,
        out: &mut W,
    ) -> Result<()> {
        if let Some(offers) = self.fetch_with_retry(session, input, out)? {
            render_offers(session.category, &offers, out)?;
        }
        Ok(())
    }

    /// Request offers, offering a retry after each failure. Each retry is a
    /// fresh request with the same answers. `None` when the user quits.
    pub fn fetch_with_retry<R: BufRead, W: Write>(
        &self,
        session: &Session,
        input: &mut R,
        out: &mut W,
    ) -> Result<Option<Vec<PlanOffer>>> {
        let mut attempt = 1u32;
        loop {
            writeln!(
                out,
                "Finding the best {} plans for you...",
                session.category.as_str()
            )?;
            out.flush()?;

            let err = match self
                .gateway
                .request_recommendations(session.category, &session.answers)
            {
                Ok(offers) => return Ok(Some(offers)),
                Err(err) => err,
            };
            tracing::warn!(
                source = self.gateway.name(),
                attempt,
                error = %err,
                "Recommendation request failed"
            );
            writeln!(out, "Error: {err}")?;

            if !prompt_retry(input, out)? {
                writeln!(out, "No recommendations shown.")?;
                return Ok(None);
            }
            attempt += 1;
        }
    }
}

fn redirect_category(err: &SessionError, requested: Option<Category>) -> Option<Category> {
    match err {
        SessionError::Empty(stored) => requested.or(Some(*stored)),
        _ => requested,
    }
}

fn prompt_retry<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<bool> {
    loop {
        write!(out, "[R]etry / [Q]uit: ")?;
        out.flush()?;
        let Some(line) = read_line(input)? else {
            writeln!(out)?;
            return Ok(false);
        };
        match line.trim().to_uppercase().as_str() {
            "R" | "RETRY" => return Ok(true),
            "Q" | "QUIT" => return Ok(false),
            _ => {}
        }
    }
}

fn render_answers<W: Write>(session: &Session, out: &mut W) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "Your answers:")?;
    for (question_id, value) in session.answers.iter() {
        let label = catalog::find(session.category, question_id)
            .map_or(question_id, |question| question.prompt);
        writeln!(out, "  {label} {value}")?;
    }
    Ok(())
}

/// Print offers in the order received.
pub fn render_offers<W: Write>(
    category: Category,
    offers: &[PlanOffer],
    out: &mut W,
) -> Result<()> {
    writeln!(out)?;
    if offers.is_empty() {
        writeln!(out, "No {} plans matched your answers.", category.as_str())?;
        return Ok(());
    }

    writeln!(out, "Recommended {} plans:", category.as_str())?;
    for (rank, offer) in offers.iter().enumerate() {
        writeln!(out)?;
        writeln!(
            out,
            "{}. {} ({})  rating {:.1}/5",
            rank + 1,
            offer.name,
            offer.provider,
            offer.rating
        )?;
        writeln!(out, "   Coverage: {}", offer.coverage)?;
        writeln!(out, "   Premium:  {}/year", format_inr(offer.premium))?;
        for highlight in &offer.highlights {
            writeln!(out, "   - {highlight}")?;
        }
        if let Some(link) = &offer.link {
            writeln!(out, "   {link}")?;
        }
    }
    Ok(())
}

/// Score a JSON answer file and print the offers as JSON. An unrecognized
/// insurance type scores to the generic offer.
pub fn score_file<W: Write>(insurance_type: &str, path: &Path, out: &mut W) -> Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read answers from {}", path.display()))?;
    let answers: AnswerSet = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON object of answers", path.display()))?;

    let response = RecommendationResponse {
        recommendations: scoring::recommend_for(insurance_type, &answers),
    };
    writeln!(out, "{}", serde_json::to_string_pretty(&response)?)?;
    Ok(())
}

/// Start over: discard the stored answers.
pub fn reset<W: Write>(store: &dyn SessionStore, out: &mut W) -> Result<()> {
    if store.clear()? {
        writeln!(out, "Answers cleared.")?;
    } else {
        writeln!(out, "Nothing to clear.")?;
    }
    Ok(())
}
