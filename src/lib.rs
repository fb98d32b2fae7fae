use state::QuizState;
use teloxide::{dispatching::dialogue::InMemStorage, prelude::Dialogue};

pub mod commands;
pub mod config;
pub mod constructor;
pub mod context;
pub mod database;
pub mod editor;
pub mod error;
pub mod keyboard;
pub mod quiz;
pub mod runner;
pub mod schema;
pub mod state;

type UserDialogue = Dialogue<QuizState, InMemStorage<QuizState>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;
