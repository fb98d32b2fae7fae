use std::{collections::HashMap, path::PathBuf, sync::Arc, time::Duration};

use teloxide::types::ChatId;
use tokio::{sync::Mutex, time::Instant};

use crate::{
    config::Settings,
    database::SlotStore,
    error::Result,
    quiz::{BankEditor, LoadedFrom, QuestionBank, QuestionForm, QuizSession, Saved},
};

pub type SharedContext<S> = Arc<Mutex<QuizContext<S>>>;

/// Everything one chat owns. All mutation happens while holding its lock.
pub struct QuizContext<S> {
    pub bank: QuestionBank<S>,
    pub session: Option<QuizSession>,
    pub editor: BankEditor,
    loaded: bool,
    shown_at: Instant,
}

impl<S: SlotStore> QuizContext<S> {
    pub fn new(bank: QuestionBank<S>) -> Self {
        Self {
            bank,
            session: None,
            editor: BankEditor::default(),
            loaded: false,
            shown_at: Instant::now(),
        }
    }

    /// Loads the bank on first use. A failed attempt is retried on the next call.
    pub async fn ensure_loaded(&mut self) -> Result<Option<LoadedFrom>> {
        if self.loaded {
            return Ok(None);
        }
        let from = self.bank.load().await?;
        self.loaded = true;
        Ok(Some(from))
    }

    pub async fn clear_persisted(&mut self) -> Result<usize> {
        self.loaded = false;
        let size = self.editor.clear_persisted(&mut self.bank).await?;
        self.loaded = true;
        Ok(size)
    }

    /// Submits the authoring form. The bank is loaded first so a fresh
    /// context never persists over the saved questions.
    pub async fn submit_form(&mut self, form: QuestionForm) -> Result<Saved> {
        self.ensure_loaded().await?;
        self.editor.submit(&mut self.bank, form).await
    }

    /// Starts a new session over a copy of the current bank, loading it if
    /// needed. Later edits only show up in the next session.
    pub async fn start_session(&mut self) -> Result<&QuizSession> {
        self.ensure_loaded().await?;
        self.shown_at = Instant::now();
        Ok(self.session.insert(QuizSession::start(self.bank.questions().to_vec())))
    }

    pub fn mark_shown(&mut self) {
        self.shown_at = Instant::now();
    }

    pub fn elapsed(&self) -> Duration {
        self.shown_at.elapsed()
    }
}

pub struct ContextRegistry<S> {
    store: Arc<S>,
    storage_key: String,
    questions_path: PathBuf,
    settle_delay: Duration,
    contexts: Mutex<HashMap<ChatId, SharedContext<S>>>,
}

impl<S: SlotStore> ContextRegistry<S> {
    pub fn new(store: Arc<S>, settings: &Settings) -> Self {
        Self {
            store,
            storage_key: settings.storage_key.clone(),
            questions_path: settings.questions_path.clone(),
            settle_delay: settings.settle_delay,
            contexts: Mutex::new(HashMap::new()),
        }
    }

    pub async fn context(&self, chat_id: ChatId) -> SharedContext<S> {
        let mut contexts = self.contexts.lock().await;
        contexts
            .entry(chat_id)
            .or_insert_with(|| {
                log::debug!("Creating quiz context for chat {}", chat_id.0);
                let bank = QuestionBank::new(
                    self.store.clone(),
                    format!("{}:{}", self.storage_key, chat_id.0),
                    self.questions_path.clone(),
                );
                Arc::new(Mutex::new(QuizContext::new(bank)))
            })
            .clone()
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    pub fn questions_path(&self) -> &PathBuf {
        &self.questions_path
    }
}
