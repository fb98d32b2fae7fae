use std::{path::PathBuf, sync::Arc};

use serde_json::Value;

use crate::{
    database::SlotStore,
    error::{QuizError, Result},
};

use super::question::{normalize_all, Question};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadedFrom {
    Persisted,
    StaticResource,
}

/// Ordered questions of one client plus the hooks to load and save them.
pub struct QuestionBank<S> {
    questions: Vec<Question>,
    store: Arc<S>,
    slot: String,
    static_path: PathBuf,
}

impl<S: SlotStore> QuestionBank<S> {
    pub fn new(store: Arc<S>, slot: impl Into<String>, static_path: impl Into<PathBuf>) -> Self {
        Self {
            questions: Vec::new(),
            store,
            slot: slot.into(),
            static_path: static_path.into(),
        }
    }

    /// Fills the bank from the persisted slot, or from the static resource
    /// when the slot holds nothing usable.
    pub async fn load(&mut self) -> Result<LoadedFrom> {
        if let Some(questions) = self.load_persisted().await {
            log::info!("Loaded {} questions from slot {}", questions.len(), self.slot);
            self.questions = questions;
            return Ok(LoadedFrom::Persisted);
        }

        let questions = self.load_static().await?;
        log::info!(
            "Loaded {} questions from {}",
            questions.len(),
            self.static_path.display()
        );
        self.questions = questions;
        Ok(LoadedFrom::StaticResource)
    }

    async fn load_persisted(&self) -> Option<Vec<Question>> {
        let saved = match self.store.read_slot(&self.slot).await {
            Ok(Some(saved)) => saved,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Failed to read slot {}: {}", self.slot, e);
                return None;
            }
        };

        match serde_json::from_str::<Value>(&saved) {
            Ok(parsed) => {
                let questions = normalize_all(&parsed);
                (!questions.is_empty()).then_some(questions)
            }
            Err(e) => {
                log::warn!("Invalid saved questions in slot {}, ignoring: {}", self.slot, e);
                None
            }
        }
    }

    async fn load_static(&self) -> Result<Vec<Question>> {
        let content = tokio::fs::read_to_string(&self.static_path)
            .await
            .map_err(|e| {
                QuizError::Load(format!("cannot read {}: {}", self.static_path.display(), e))
            })?;

        let parsed: Value = serde_json::from_str(&content).map_err(|e| {
            QuizError::Load(format!("{} is not valid JSON: {}", self.static_path.display(), e))
        })?;

        if !parsed.is_array() {
            return Err(QuizError::Load(format!(
                "{} does not contain a list of questions",
                self.static_path.display()
            )));
        }

        let questions = normalize_all(&parsed);
        if questions.is_empty() {
            return Err(QuizError::Load(format!(
                "{} contains no questions",
                self.static_path.display()
            )));
        }

        Ok(questions)
    }

    pub async fn persist(&self) -> Result<()> {
        let serialized = serde_json::to_string(&self.questions)?;
        self.store.write_slot(&self.slot, &serialized).await?;
        Ok(())
    }

    /// Drops the persisted slot. The in-memory questions are left alone.
    pub async fn forget_persisted(&self) -> Result<()> {
        self.store.remove_slot(&self.slot).await?;
        Ok(())
    }
}

impl<S> QuestionBank<S> {
    pub fn append(&mut self, question: Question) {
        self.questions.push(question);
    }

    pub fn replace_at(&mut self, index: usize, question: Question) -> Result<()> {
        let slot = self.slot_mut(index)?;
        *slot = question;
        Ok(())
    }

    pub fn remove_at(&mut self, index: usize) -> Result<Question> {
        self.check_index(index)?;
        Ok(self.questions.remove(index))
    }

    pub fn at(&self, index: usize) -> Result<&Question> {
        self.check_index(index)?;
        Ok(&self.questions[index])
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    pub fn export_snapshot(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.questions)?)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.questions.len() {
            Ok(())
        } else {
            Err(QuizError::IndexOutOfRange {
                index,
                len: self.questions.len(),
            })
        }
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut Question> {
        let len = self.questions.len();
        self.questions
            .get_mut(index)
            .ok_or(QuizError::IndexOutOfRange { index, len })
    }
}
