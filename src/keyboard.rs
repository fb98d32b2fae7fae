use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use crate::quiz::{AnswerOutcome, Question, CHOICE_COUNT};

pub(crate) const PLAY: &str = "Play▶️";
pub(crate) const ADD: &str = "Add question➕";
pub(crate) const LIST: &str = "List questions📋";
pub(crate) const EXPORT: &str = "Export📤";

const UNAVAILABLE: &str = "(unavailable)";
const REPLAY: &str = "replay";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CallbackAction {
    Answer { question: usize, slot: usize },
    Unavailable,
    Replay,
}

impl CallbackAction {
    pub(crate) fn parse(data: &str) -> Option<Self> {
        match data {
            REPLAY => Some(Self::Replay),
            "unavailable" => Some(Self::Unavailable),
            _ => {
                let mut parts = data.strip_prefix("answer:")?.split(':');
                let question = parts.next()?.parse().ok()?;
                let slot = parts.next()?.parse().ok()?;
                parts.next().is_none().then_some(Self::Answer { question, slot })
            }
        }
    }

    fn data(&self) -> String {
        match self {
            Self::Answer { question, slot } => format!("answer:{question}:{slot}"),
            Self::Unavailable => "unavailable".to_owned(),
            Self::Replay => REPLAY.to_owned(),
        }
    }
}

pub(crate) fn yes_no_keyboard() -> KeyboardMarkup {
    let keyboard: Vec<Vec<KeyboardButton>> = vec![vec![
        KeyboardButton::new("Yes✔️"),
        KeyboardButton::new("No❌"),
    ]];

    KeyboardMarkup::new(keyboard)
}

pub(crate) fn action_keyboard() -> KeyboardMarkup {
    let keyboard = vec![
        vec![KeyboardButton::new(PLAY)],
        vec![KeyboardButton::new(ADD), KeyboardButton::new(LIST)],
        vec![KeyboardButton::new(EXPORT)],
    ];

    KeyboardMarkup::new(keyboard)
}

/// The five option buttons of question `question_index`. Empty options get a
/// placeholder that does nothing when pressed.
pub(crate) fn answers_keyboard(question_index: usize, question: &Question) -> InlineKeyboardMarkup {
    answers_keyboard_marked(question_index, question, |_, text| text.to_owned())
}

/// Same buttons with the outcome marked on them: the chosen one, and the right
/// one when the choice was wrong.
pub(crate) fn feedback_keyboard(
    question_index: usize,
    question: &Question,
    chosen_slot: usize,
    outcome: &AnswerOutcome,
) -> InlineKeyboardMarkup {
    answers_keyboard_marked(question_index, question, |slot, text| {
        let mark = match outcome {
            AnswerOutcome::Neutral if slot == chosen_slot => "➡️ ",
            AnswerOutcome::Correct if slot == chosen_slot => "✅ ",
            AnswerOutcome::Wrong { .. } if slot == chosen_slot => "❌ ",
            AnswerOutcome::Wrong { correct } if slot < CHOICE_COUNT && text == correct => "✅ ",
            _ => "",
        };
        format!("{mark}{text}")
    })
}

fn answers_keyboard_marked(
    question_index: usize,
    question: &Question,
    label: impl Fn(usize, &str) -> String,
) -> InlineKeyboardMarkup {
    let keyboard: Vec<Vec<InlineKeyboardButton>> = question
        .options()
        .iter()
        .enumerate()
        .map(|(slot, option)| {
            let button = if option.is_empty() {
                InlineKeyboardButton::callback(UNAVAILABLE, CallbackAction::Unavailable.data())
            } else {
                let action = CallbackAction::Answer {
                    question: question_index,
                    slot,
                };
                InlineKeyboardButton::callback(label(slot, option.as_str()), action.data())
            };
            vec![button]
        })
        .collect();

    InlineKeyboardMarkup::new(keyboard)
}

pub(crate) fn replay_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "Play again🔁",
        CallbackAction::Replay.data(),
    )]])
}

pub(crate) fn correct_keyboard(labels: &[String]) -> KeyboardMarkup {
    let keyboard = labels
        .iter()
        .map(|label| vec![KeyboardButton::new(label)]);

    KeyboardMarkup::new(keyboard)
}
