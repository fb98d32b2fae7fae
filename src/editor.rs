use std::sync::Arc;

use teloxide::{
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{InputFile, Message, ReplyMarkup},
    Bot,
};
use tracing::instrument;

use crate::{
    commands::{load_error_text, parse_index},
    constructor::question_prompt,
    context::ContextRegistry,
    database::SlotStore,
    keyboard::{action_keyboard, yes_no_keyboard},
    state::QuizState,
    HandlerResult, UserDialogue,
};

const EXPORT_FILE_NAME: &str = "questions.json";

#[instrument(level = "info", skip(bot, registry))]
pub(crate) async fn list<S: SlotStore>(
    bot: Bot,
    msg: Message,
    registry: Arc<ContextRegistry<S>>,
) -> HandlerResult {
    let context = registry.context(msg.chat.id).await;
    let mut context = context.lock().await;
    if let Err(e) = context.ensure_loaded().await {
        log::error!("Chat {}: {}", msg.chat.id.0, e);
        bot.send_message(msg.chat.id, load_error_text(e, registry.questions_path()))
            .await?;
        return Ok(());
    }

    let listing = context.editor.listing(&context.bank);
    bot.send_message(
        msg.chat.id,
        format!("{listing}\n\n/edit N to change a question, /delete N to remove it."),
    )
    .await?;

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, registry))]
pub(crate) async fn begin_edit<S: SlotStore>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    arg: String,
    registry: Arc<ContextRegistry<S>>,
) -> HandlerResult {
    let Some(index) = parse_index(&arg) else {
        bot.send_message(msg.chat.id, "Usage: /edit N (see /list for numbers).")
            .await?;
        return Ok(());
    };

    let context = registry.context(msg.chat.id).await;
    let mut context = context.lock().await;
    let context = &mut *context;
    if let Err(e) = context.ensure_loaded().await {
        bot.send_message(msg.chat.id, load_error_text(e, registry.questions_path()))
            .await?;
        return Ok(());
    }

    let started = context.editor.begin_edit(&context.bank, index).map(|_| ());
    match started {
        Ok(()) => {
            log::info!(
                "{} edits question #{}",
                msg.chat.username().unwrap_or("anonymous"),
                index + 1
            );
            let current = context.bank.at(index)?.to_string();
            bot.send_message(msg.chat.id, format!("Editing question #{}:\n{current}", index + 1))
                .reply_markup(ReplyMarkup::kb_remove())
                .await?;
            bot.send_message(msg.chat.id, question_prompt(&context.editor))
                .await?;
            dialogue.update(QuizState::ReceiveQuestionText).await?;
        }
        Err(e) => {
            bot.send_message(msg.chat.id, e.to_string()).await?;
        }
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, registry))]
pub(crate) async fn begin_delete<S: SlotStore>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    arg: String,
    registry: Arc<ContextRegistry<S>>,
) -> HandlerResult {
    let Some(index) = parse_index(&arg) else {
        bot.send_message(msg.chat.id, "Usage: /delete N (see /list for numbers).")
            .await?;
        return Ok(());
    };

    let context = registry.context(msg.chat.id).await;
    let mut context = context.lock().await;
    if let Err(e) = context.ensure_loaded().await {
        bot.send_message(msg.chat.id, load_error_text(e, registry.questions_path()))
            .await?;
        return Ok(());
    }

    match context.bank.at(index) {
        Ok(question) => {
            bot.send_message(
                msg.chat.id,
                format!("Delete question #{}?\n{question}", index + 1),
            )
            .reply_markup(yes_no_keyboard())
            .await?;
            dialogue.update(QuizState::ConfirmDelete { index }).await?;
        }
        Err(e) => {
            bot.send_message(msg.chat.id, e.to_string()).await?;
        }
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, registry))]
pub(crate) async fn confirm_delete<S: SlotStore>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    index: usize,
    registry: Arc<ContextRegistry<S>>,
) -> HandlerResult {
    let reply = match msg.text() {
        Some("Yes") | Some("Yes✔️") => {
            let context = registry.context(msg.chat.id).await;
            let mut context = context.lock().await;
            let context = &mut *context;
            log::info!(
                "{} deletes question #{}",
                msg.chat.username().unwrap_or("anonymous"),
                index + 1
            );
            match context.editor.delete(&mut context.bank, index).await {
                Ok(saved) => saved.message,
                Err(e) => e.to_string(),
            }
        }
        Some("No") | Some("No❌") => "OK. Nothing deleted.".to_owned(),
        _ => {
            bot.send_message(msg.chat.id, "Please, answer Yes or No.")
                .reply_markup(yes_no_keyboard())
                .await?;
            return Ok(());
        }
    };

    bot.send_message(msg.chat.id, reply)
        .reply_markup(action_keyboard())
        .await?;
    dialogue.update(QuizState::Start).await?;

    Ok(())
}

#[instrument(level = "info", skip(bot, registry))]
pub(crate) async fn export<S: SlotStore>(
    bot: Bot,
    msg: Message,
    registry: Arc<ContextRegistry<S>>,
) -> HandlerResult {
    let context = registry.context(msg.chat.id).await;
    let mut context = context.lock().await;
    let snapshot = match context.ensure_loaded().await {
        Ok(_) => context.editor.export_snapshot(&context.bank),
        Err(e) => Err(e),
    };
    drop(context);

    match snapshot {
        Ok(snapshot) => {
            log::info!(
                "{} exports {} bytes of questions",
                msg.chat.username().unwrap_or("anonymous"),
                snapshot.len()
            );
            bot.send_document(
                msg.chat.id,
                InputFile::memory(snapshot.into_bytes()).file_name(EXPORT_FILE_NAME),
            )
            .await?;
            bot.send_message(msg.chat.id, format!("Exported {EXPORT_FILE_NAME}."))
                .await?;
        }
        Err(e) => {
            log::error!("Chat {}: export failed: {}", msg.chat.id.0, e);
            bot.send_message(msg.chat.id, format!("Export failed: {e}"))
                .await?;
        }
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, registry))]
pub(crate) async fn clear<S: SlotStore>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    registry: Arc<ContextRegistry<S>>,
) -> HandlerResult {
    let context = registry.context(msg.chat.id).await;
    let mut context = context.lock().await;
    let cleared = context.clear_persisted().await;
    drop(context);

    let reply = match cleared {
        Ok(size) => {
            log::info!(
                "{} cleared saved questions, reloaded {}",
                msg.chat.username().unwrap_or("anonymous"),
                size
            );
            format!(
                "Saved questions cleared. Reloaded {size} questions from {}.",
                registry.questions_path().display()
            )
        }
        Err(e) => {
            log::error!("Chat {}: clear failed: {}", msg.chat.id.0, e);
            load_error_text(e, registry.questions_path())
        }
    };

    bot.send_message(msg.chat.id, reply)
        .reply_markup(action_keyboard())
        .await?;
    dialogue.update(QuizState::Start).await?;

    Ok(())
}
