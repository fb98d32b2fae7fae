use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Label of the fifth option. Choosing it moves on without touching the score.
pub const SKIP_LABEL: &str = "Next";

pub const OPTION_COUNT: usize = 5;

pub const CHOICE_COUNT: usize = 4;

/// A question in canonical form.
///
/// `options[4]` is always [`SKIP_LABEL`] and `correct` always equals one of
/// `options[0..4]`. The only way to build one is through [`normalize`] or
/// [`Question::new`], both of which restore those invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct Question {
    #[serde(rename = "question")]
    text: String,
    options: [String; OPTION_COUNT],
    correct: String,
}

impl From<Value> for Question {
    fn from(raw: Value) -> Self {
        normalize(&raw)
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.text)?;
        for (letter, option) in ['A', 'B', 'C', 'D'].iter().zip(self.choices()) {
            let mark = if option == &self.correct { 'V' } else { 'X' };
            writeln!(f, "{letter}) {option} ({mark})")?;
        }
        Ok(())
    }
}

impl Question {
    /// Builds a question from the four answer choices and the index of the
    /// correct one. The index is clamped into the choice range.
    pub fn new(text: impl Into<String>, choices: [String; CHOICE_COUNT], correct_index: usize) -> Self {
        let [a, b, c, d] = choices;
        let options = [a, b, c, d, SKIP_LABEL.to_owned()].map(|o| sanitize(&o));
        let correct = options[correct_index.min(CHOICE_COUNT - 1)].clone();
        Self::from_parts(sanitize(&text.into()), options, correct)
    }

    fn from_parts(text: String, mut options: [String; OPTION_COUNT], correct: String) -> Self {
        options[OPTION_COUNT - 1] = SKIP_LABEL.to_owned();

        let correct = if correct.is_empty()
            || correct == SKIP_LABEL
            || !options[..CHOICE_COUNT].contains(&correct)
        {
            options[0].clone()
        } else {
            correct
        };

        Self {
            text,
            options,
            correct,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    pub fn choices(&self) -> &[String] {
        &self.options[..CHOICE_COUNT]
    }

    pub fn correct(&self) -> &str {
        &self.correct
    }

    pub fn correct_index(&self) -> usize {
        self.choices()
            .iter()
            .position(|o| o == &self.correct)
            .unwrap_or(0)
    }

    pub fn has_answer(&self) -> bool {
        !self.correct.is_empty()
    }
}

/// Converts an arbitrary record into a [`Question`]. Never fails: missing or
/// malformed fields become empty strings.
pub fn normalize(raw: &Value) -> Question {
    let text = raw.get("question").map(field_text).unwrap_or_default();

    let mut options: [String; OPTION_COUNT] = Default::default();
    if let Some(Value::Array(supplied)) = raw.get("options") {
        for (slot, value) in options.iter_mut().zip(supplied.iter()) {
            *slot = field_text(value);
        }
    }

    let correct = raw.get("correct").map(field_text).unwrap_or_default();

    Question::from_parts(text, options, correct)
}

pub fn normalize_all(raw: &Value) -> Vec<Question> {
    match raw {
        Value::Array(records) => records.iter().map(normalize).collect(),
        _ => Vec::new(),
    }
}

pub(crate) fn sanitize(text: &str) -> String {
    text.trim().to_owned()
}

fn field_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => sanitize(s),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => sanitize(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_normalize_keeps_well_formed_record() {
        let q = normalize(&json!({
            "question": "  2+2?  ",
            "options": ["3", "4", "5", "6", "Next"],
            "correct": "4"
        }));

        assert_eq!(q.text(), "2+2?");
        assert_eq!(q.options(), &["3", "4", "5", "6", "Next"].map(String::from));
        assert_eq!(q.correct(), "4");
        assert_eq!(q.correct_index(), 1);
    }

    #[test]
    fn test_normalize_forces_skip_label() {
        let q = normalize(&json!({
            "question": "Capital of France?",
            "options": ["Paris", "Rome", "Berlin", "Madrid", "Skip me", "extra"],
            "correct": "Paris"
        }));

        assert_eq!(q.options()[4], SKIP_LABEL);
        assert_eq!(q.options().len(), OPTION_COUNT);
    }

    #[test]
    fn test_normalize_pads_short_options() {
        let q = normalize(&json!({ "question": "Q", "options": ["a", "b"], "correct": "b" }));

        assert_eq!(q.options(), &["a", "b", "", "", "Next"].map(String::from));
        assert_eq!(q.correct(), "b");
    }

    #[test]
    fn test_correct_pointing_at_skip_falls_back_to_first_option() {
        let q = normalize(&json!({ "question": "Q", "options": ["a", "b", "c", "d"], "correct": "Next" }));
        assert_eq!(q.correct(), "a");

        let q = normalize(&json!({ "question": "Q", "options": ["a", "b", "c", "d"], "correct": "  " }));
        assert_eq!(q.correct(), "a");
    }

    #[test]
    fn test_unknown_correct_falls_back_to_first_option() {
        let q = normalize(&json!({ "question": "Q", "options": ["a", "b", "c", "d"], "correct": "z" }));
        assert_eq!(q.correct(), "a");
    }

    #[test]
    fn test_garbage_record_becomes_empty_question() {
        let q = normalize(&json!(42));

        assert_eq!(q.text(), "");
        assert_eq!(q.options(), &["", "", "", "", "Next"].map(String::from));
        assert_eq!(q.correct(), "");
        assert!(!q.has_answer());
    }

    #[test]
    fn test_non_string_options_are_coerced() {
        let q = normalize(&json!({ "question": null, "options": [1, true, null, "x"], "correct": 1 }));

        assert_eq!(q.text(), "");
        assert_eq!(q.choices(), &["1", "true", "", "x"]);
        assert_eq!(q.correct(), "1");
    }

    #[test]
    fn test_new_clamps_correct_index() {
        let q = Question::new("Q", ["a", "b", "c", "d"].map(String::from), 9);
        assert_eq!(q.correct(), "d");
        assert_eq!(q.options()[4], SKIP_LABEL);
    }

    #[test]
    fn test_serialized_shape_matches_resource() {
        let q = Question::new("Q", ["a", "b", "c", "d"].map(String::from), 2);
        let value = serde_json::to_value(&q).unwrap();

        assert_eq!(
            value,
            json!({ "question": "Q", "options": ["a", "b", "c", "d", "Next"], "correct": "c" })
        );
        let back: Question = serde_json::from_value(value).unwrap();
        assert_eq!(back, q);
    }

    #[test]
    fn test_normalize_all_ignores_non_arrays() {
        assert!(normalize_all(&json!({ "question": "Q" })).is_empty());
        assert_eq!(normalize_all(&json!([{}, {}])).len(), 2);
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            prop_oneof![Just("Next".to_owned()), Just(" next ".to_owned()), ".{0,8}"].prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 24, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
                (inner.clone(), prop::collection::vec(inner.clone(), 0..8), inner).prop_map(
                    |(question, options, correct)| json!({
                        "question": question,
                        "options": options,
                        "correct": correct,
                    })
                ),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_normalize_always_canonical(raw in arb_json()) {
            let q = normalize(&raw);

            prop_assert_eq!(q.options().len(), OPTION_COUNT);
            prop_assert_eq!(q.options()[4].as_str(), SKIP_LABEL);
            prop_assert!(q.choices().iter().any(|o| o == q.correct()));
        }

        #[test]
        fn prop_normalize_is_idempotent(raw in arb_json()) {
            let once = normalize(&raw);
            let twice = normalize(&serde_json::to_value(&once).unwrap());
            prop_assert_eq!(once, twice);
        }
    }
}
