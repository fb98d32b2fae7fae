use std::sync::Arc;

use teloxide::{
    payloads::SendMessageSetters, prelude::Requester, types::Message, utils::command::BotCommands,
    Bot,
};
use tracing::instrument;

use crate::{
    context::ContextRegistry,
    database::SlotStore,
    keyboard::action_keyboard,
    quiz::LoadedFrom,
    state::QuizState,
    HandlerResult, UserDialogue,
};

#[derive(Debug, Clone, BotCommands)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "display help.")]
    Help,
    #[command(description = "start the bot")]
    Start,
    #[command(description = "play the quiz")]
    Play,
    #[command(description = "add a question")]
    Add,
    #[command(description = "list questions")]
    List,
    #[command(description = "edit question N, e.g. /edit 2")]
    Edit(String),
    #[command(description = "delete question N, e.g. /delete 2")]
    Delete(String),
    #[command(description = "download the questions as questions.json")]
    Export,
    #[command(description = "drop saved questions and reload questions.json")]
    Clear,
    #[command(description = "cancel the current form")]
    Cancel,
}

/// 1-based question number from a command argument.
pub(crate) fn parse_index(arg: &str) -> Option<usize> {
    arg.trim().parse::<usize>().ok()?.checked_sub(1)
}

pub(crate) fn load_error_text(e: impl std::fmt::Display, questions_path: &std::path::Path) -> String {
    format!(
        "{e}.\nPlace a JSON list of questions at {} (or point QUESTIONS_PATH at one) and try again.",
        questions_path.display()
    )
}

pub(crate) async fn help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, registry))]
pub(crate) async fn cancel<S: SlotStore>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    registry: Arc<ContextRegistry<S>>,
) -> HandlerResult {
    registry.context(msg.chat.id).await.lock().await.editor.cancel_edit();
    bot.send_message(msg.chat.id, "Cancelled.")
        .reply_markup(action_keyboard())
        .await?;
    dialogue.update(QuizState::Start).await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, registry))]
pub(crate) async fn start<S: SlotStore>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    registry: Arc<ContextRegistry<S>>,
) -> HandlerResult {
    let context = registry.context(msg.chat.id).await;
    let mut context = context.lock().await;
    let loaded = context.ensure_loaded().await;
    let size = context.bank.len();
    drop(context);

    let text = match loaded {
        Ok(Some(LoadedFrom::Persisted)) => {
            format!("Welcome back! Your saved bank has {size} questions.")
        }
        Ok(_) => format!("Welcome! The quiz has {size} questions."),
        Err(e) => {
            log::error!("Chat {}: {}", msg.chat.id.0, e);
            load_error_text(e, registry.questions_path())
        }
    };

    bot.send_message(msg.chat.id, format!("{text}\nPlease choose what to do:"))
        .reply_markup(action_keyboard())
        .await?;
    dialogue.update(QuizState::Start).await?;
    Ok(())
}
