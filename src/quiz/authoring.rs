use crate::{
    database::SlotStore,
    error::{QuizError, Result},
};

use super::{
    bank::QuestionBank,
    question::{sanitize, Question, CHOICE_COUNT},
};

const CHOICE_LETTERS: [char; CHOICE_COUNT] = ['A', 'B', 'C', 'D'];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionForm {
    pub text: String,
    pub options: [String; CHOICE_COUNT],
    /// Selector value as supplied; clamped into `0..=3` on submit.
    pub correct_index: i64,
}

impl QuestionForm {
    fn from_question(question: &Question) -> Self {
        let [a, b, c, d] = [0, 1, 2, 3].map(|i| question.choices()[i].clone());
        Self {
            text: question.text().to_owned(),
            options: [a, b, c, d],
            correct_index: question.correct_index() as i64,
        }
    }
}

#[derive(Debug)]
pub struct Saved {
    pub message: String,
    pub bank_size: usize,
    /// Set when the bank changed in memory but could not be persisted.
    pub persist_warning: Option<QuizError>,
}

/// Add/edit/delete on top of a [`QuestionBank`], with the edit cursor and the
/// form state.
#[derive(Debug, Default)]
pub struct BankEditor {
    editing_index: Option<usize>,
    form: QuestionForm,
}

impl BankEditor {
    pub fn editing_index(&self) -> Option<usize> {
        self.editing_index
    }

    pub fn form(&self) -> &QuestionForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut QuestionForm {
        &mut self.form
    }

    /// Validates `form` and writes it into the bank: in place when an edit is
    /// in progress, appended otherwise. Persists afterwards either way.
    pub async fn submit<S: SlotStore>(&mut self, bank: &mut QuestionBank<S>, form: QuestionForm) -> Result<Saved> {
        let text = sanitize(&form.text);
        if text.is_empty() {
            return Err(QuizError::EmptyQuestion);
        }
        let options = form.options.map(|o| sanitize(&o));
        if options.iter().any(|o| o.is_empty()) {
            return Err(QuizError::IncompleteOptions);
        }
        let correct_index = form.correct_index.clamp(0, CHOICE_COUNT as i64 - 1) as usize;

        let question = Question::new(text, options, correct_index);
        let message = match self.editing_index {
            Some(index) => {
                bank.replace_at(index, question)?;
                log::info!("Replaced question #{} in {}", index + 1, bank.slot());
                "Question updated."
            }
            None => {
                bank.append(question);
                log::info!("Appended question #{} to {}", bank.len(), bank.slot());
                "Question added."
            }
        };

        self.cancel_edit();
        Ok(Self::saved(bank, message).await)
    }

    /// Loads question `index` into the form and targets it with the next submit.
    pub fn begin_edit<S>(&mut self, bank: &QuestionBank<S>, index: usize) -> Result<&QuestionForm> {
        let question = bank.at(index)?;
        self.form = QuestionForm::from_question(question);
        self.editing_index = Some(index);
        Ok(&self.form)
    }

    pub fn cancel_edit(&mut self) {
        self.editing_index = None;
        self.form = QuestionForm::default();
    }

    /// Removes question `index`. Asking the user for confirmation is up to the caller.
    pub async fn delete<S: SlotStore>(&mut self, bank: &mut QuestionBank<S>, index: usize) -> Result<Saved> {
        let removed = bank.remove_at(index)?;
        log::info!("Deleted question #{} '{}' from {}", index + 1, removed.text(), bank.slot());

        // indices behind the removed one shifted
        match self.editing_index {
            Some(editing) if editing == index => self.cancel_edit(),
            Some(editing) if editing > index => self.editing_index = Some(editing - 1),
            _ => {}
        }

        Ok(Self::saved(bank, "Question deleted.").await)
    }

    pub fn export_snapshot<S>(&self, bank: &QuestionBank<S>) -> Result<String> {
        bank.export_snapshot()
    }

    /// Drops the persisted bank and reloads from the static resource. Edits
    /// that only lived in the slot are lost.
    pub async fn clear_persisted<S: SlotStore>(&mut self, bank: &mut QuestionBank<S>) -> Result<usize> {
        self.cancel_edit();
        bank.forget_persisted().await?;
        bank.load().await?;
        Ok(bank.len())
    }

    pub fn correct_choices(&self) -> [String; CHOICE_COUNT] {
        let mut labels: [String; CHOICE_COUNT] = Default::default();
        for (i, label) in labels.iter_mut().enumerate() {
            let text = sanitize(&self.form.options[i]);
            let text = if text.is_empty() { format!("Option {}", i + 1) } else { text };
            *label = format!("{}: {}", CHOICE_LETTERS[i], text);
        }
        labels
    }

    pub fn listing<S>(&self, bank: &QuestionBank<S>) -> String {
        if bank.is_empty() {
            return "No questions yet.".to_owned();
        }
        bank.questions()
            .iter()
            .enumerate()
            .map(|(i, q)| format!("{}. {}", i + 1, q.text()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    async fn saved<S: SlotStore>(bank: &QuestionBank<S>, message: &str) -> Saved {
        let bank_size = bank.len();
        match bank.persist().await {
            Ok(()) => Saved {
                message: format!("{message} Total questions: {bank_size}"),
                bank_size,
                persist_warning: None,
            },
            Err(e) => {
                log::warn!("Failed to persist {}: {}", bank.slot(), e);
                Saved {
                    message: format!("{message} Total questions: {bank_size} (not saved: {e})"),
                    bank_size,
                    persist_warning: Some(e),
                }
            }
        }
    }
}

/// Parses a correct-option selector value: a letter `A`-`D`, a label such as
/// `"B: Paris"`, or a 1-based number. Numbers are passed through unclamped.
pub fn parse_choice(input: &str) -> Option<i64> {
    let input = input.trim();
    let head = input.split(':').next().unwrap_or_default().trim();

    if let Ok(number) = head.parse::<i64>() {
        return Some(number - 1);
    }

    let mut chars = head.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), None) => CHOICE_LETTERS
            .iter()
            .position(|l| l.eq_ignore_ascii_case(&letter))
            .map(|i| i as i64),
        _ => None,
    }
}
