//! Integration tests for the bank lifecycle: loading, authoring, persisting
//! and playing through the public API, with an in-memory slot store.

use std::{io::Write, sync::Arc, time::Duration};

use quizbank::database::{MemoryStore, SlotStore};
use quizbank::error::QuizError;
use quizbank::quiz::{
    AnswerOutcome, BankEditor, LoadedFrom, QuestionBank, QuestionForm, QuizSession, SessionState,
};
use serde_json::json;
use tempfile::NamedTempFile;

const SLOT: &str = "quiz_questions_v1:42";

fn resource(value: serde_json::Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(value.to_string().as_bytes()).unwrap();
    file
}

fn arithmetic() -> NamedTempFile {
    resource(json!([
        {"question": "2+2?", "options": ["3", "4", "5", "6", "Next"], "correct": "4"},
        {"question": "3+3?", "options": ["6", "7", "8", "9", "Next"], "correct": "6"},
        {"question": "1+1?", "options": ["1", "2", "3", "4"], "correct": "2"}
    ]))
}

fn form(text: &str, options: [&str; 4], correct_index: i64) -> QuestionForm {
    QuestionForm {
        text: text.to_owned(),
        options: options.map(String::from),
        correct_index,
    }
}

#[tokio::test]
async fn test_export_reloads_to_equivalent_bank() {
    let store = Arc::new(MemoryStore::default());
    let file = arithmetic();
    let mut bank = QuestionBank::new(store.clone(), SLOT, file.path());
    assert_eq!(bank.load().await.unwrap(), LoadedFrom::StaticResource);

    let exported = resource(serde_json::from_str(&bank.export_snapshot().unwrap()).unwrap());
    let mut reloaded = QuestionBank::new(store, "other", exported.path());
    reloaded.load().await.unwrap();

    assert_eq!(reloaded.questions(), bank.questions());
    assert_eq!(reloaded.at(2).unwrap().options()[4], "Next");
}

#[tokio::test]
async fn test_edit_replaces_in_place_and_delete_shifts() {
    let store = Arc::new(MemoryStore::default());
    let file = arithmetic();
    let mut bank = QuestionBank::new(store.clone(), SLOT, file.path());
    bank.load().await.unwrap();
    let mut editor = BankEditor::default();

    editor.begin_edit(&bank, 1).unwrap();
    let saved = editor
        .submit(&mut bank, form("3*3?", ["9", "6", "33", "0"], 0))
        .await
        .unwrap();
    assert_eq!(saved.message, "Question updated. Total questions: 3");
    assert_eq!(bank.len(), 3);
    assert_eq!(bank.at(1).unwrap().text(), "3*3?");
    assert_eq!(bank.at(1).unwrap().correct(), "9");

    editor.delete(&mut bank, 0).await.unwrap();
    assert_eq!(bank.len(), 2);
    assert_eq!(bank.at(0).unwrap().text(), "3*3?");
    assert_eq!(bank.at(1).unwrap().text(), "1+1?");

    // the edits are what the next load sees
    let mut reopened = QuestionBank::new(store, SLOT, file.path());
    assert_eq!(reopened.load().await.unwrap(), LoadedFrom::Persisted);
    assert_eq!(reopened.questions(), bank.questions());
}

#[tokio::test]
async fn test_empty_question_is_rejected() {
    let store = Arc::new(MemoryStore::default());
    let file = arithmetic();
    let mut bank = QuestionBank::new(store.clone(), SLOT, file.path());
    bank.load().await.unwrap();

    let err = BankEditor::default()
        .submit(&mut bank, form("  ", ["a", "b", "c", "d"], 0))
        .await
        .unwrap_err();

    assert!(matches!(err, QuizError::EmptyQuestion));
    assert_eq!(bank.len(), 3);
    assert_eq!(store.read_slot(SLOT).await.unwrap(), None);
}

#[tokio::test]
async fn test_clear_persisted_falls_back_to_resource() {
    let store = Arc::new(MemoryStore::default());
    let file = arithmetic();
    let mut bank = QuestionBank::new(store.clone(), SLOT, file.path());
    bank.load().await.unwrap();
    let mut editor = BankEditor::default();
    editor
        .submit(&mut bank, form("New?", ["a", "b", "c", "d"], 7))
        .await
        .unwrap();
    assert_eq!(bank.at(3).unwrap().correct(), "d");

    assert_eq!(editor.clear_persisted(&mut bank).await.unwrap(), 3);
    assert_eq!(store.read_slot(SLOT).await.unwrap(), None);
}

#[tokio::test]
async fn test_single_question_playthrough() {
    let store = Arc::new(MemoryStore::default());
    let file = resource(json!([
        {"question": "2+2?", "options": ["3", "4", "5", "6", "Next"], "correct": "4"}
    ]));
    let mut bank = QuestionBank::new(store, SLOT, file.path());
    bank.load().await.unwrap();

    let mut session = QuizSession::start(bank.questions().to_vec());
    assert_eq!(session.current_index(), 0);

    let outcome = session.submit_answer("4", Duration::from_millis(500));
    assert_eq!(outcome, Some(AnswerOutcome::Correct));
    assert_eq!(session.score(), 1);
    assert_eq!(session.advance(), SessionState::Finished);
    assert!((session.average_time_seconds() - 0.5).abs() < f64::EPSILON);
}
