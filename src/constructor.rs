use std::sync::Arc;

use teloxide::types::ReplyMarkup;
use teloxide::{payloads::SendMessageSetters, prelude::Requester, types::Message, Bot};
use tracing::instrument;

use crate::commands::load_error_text;
use crate::context::ContextRegistry;
use crate::database::SlotStore;
use crate::keyboard::{action_keyboard, correct_keyboard};
use crate::quiz::{parse_choice, BankEditor, CHOICE_COUNT};
use crate::state::QuizState;
use crate::{HandlerResult, UserDialogue};

const KEEP: &str = "-";
const LETTERS: [char; CHOICE_COUNT] = ['A', 'B', 'C', 'D'];

fn prompt(editor: &BankEditor, field: &str, current: &str) -> String {
    match editor.editing_index() {
        Some(_) => format!("Send {field} (or '{KEEP}' to keep: {current})"),
        None => format!("Send {field}."),
    }
}

fn field_input(editor: &BankEditor, text: &str) -> Option<String> {
    if editor.editing_index().is_some() && text.trim() == KEEP {
        None
    } else {
        Some(text.trim().to_owned())
    }
}

pub(crate) fn option_prompt(editor: &BankEditor, slot: usize) -> String {
    prompt(
        editor,
        &format!("option {}", LETTERS[slot]),
        &editor.form().options[slot],
    )
}

pub(crate) fn question_prompt(editor: &BankEditor) -> String {
    prompt(editor, "the question text", &editor.form().text)
}

#[instrument(level = "info", skip(bot, dialogue, registry))]
pub(crate) async fn add_question<S: SlotStore>(
    bot: Bot,
    dialogue: UserDialogue,
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
    context.editor.cancel_edit();

    log::info!(
        "{} starts adding a question",
        msg.chat.username().unwrap_or("anonymous")
    );
    bot.send_message(msg.chat.id, question_prompt(&context.editor))
        .reply_markup(ReplyMarkup::kb_remove())
        .await?;
    dialogue.update(QuizState::ReceiveQuestionText).await?;

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, registry))]
pub(crate) async fn receive_question_text<S: SlotStore>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    registry: Arc<ContextRegistry<S>>,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Please, send the question as text.")
            .await?;
        return Ok(());
    };

    let context = registry.context(msg.chat.id).await;
    let mut context = context.lock().await;
    if let Some(text) = field_input(&context.editor, text) {
        context.editor.form_mut().text = text;
    }

    bot.send_message(msg.chat.id, option_prompt(&context.editor, 0))
        .await?;
    dialogue.update(QuizState::ReceiveOption { slot: 0 }).await?;

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, registry))]
pub(crate) async fn receive_option<S: SlotStore>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    slot: usize,
    registry: Arc<ContextRegistry<S>>,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Please, send the option as text.")
            .await?;
        return Ok(());
    };
    let slot = slot.min(CHOICE_COUNT - 1);

    let context = registry.context(msg.chat.id).await;
    let mut context = context.lock().await;
    if let Some(text) = field_input(&context.editor, text) {
        context.editor.form_mut().options[slot] = text;
    }

    if slot + 1 < CHOICE_COUNT {
        bot.send_message(msg.chat.id, option_prompt(&context.editor, slot + 1))
            .await?;
        dialogue
            .update(QuizState::ReceiveOption { slot: slot + 1 })
            .await?;
    } else {
        bot.send_message(msg.chat.id, "Which option is correct?")
            .reply_markup(correct_keyboard(&context.editor.correct_choices()))
            .await?;
        dialogue.update(QuizState::ReceiveCorrectOption).await?;
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, registry))]
pub(crate) async fn receive_correct_option<S: SlotStore>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    registry: Arc<ContextRegistry<S>>,
) -> HandlerResult {
    let Some(choice) = msg.text().and_then(parse_choice) else {
        let context = registry.context(msg.chat.id).await;
        let context = context.lock().await;
        bot.send_message(msg.chat.id, "Please pick A, B, C or D.")
            .reply_markup(correct_keyboard(&context.editor.correct_choices()))
            .await?;
        return Ok(());
    };

    let context = registry.context(msg.chat.id).await;
    let mut context = context.lock().await;
    context.editor.form_mut().correct_index = choice;
    let form = context.editor.form().clone();

    let reply = match context.submit_form(form).await {
        Ok(saved) => {
            log::info!(
                "{} saved a question, bank has {}",
                msg.chat.username().unwrap_or("anonymous"),
                saved.bank_size
            );
            saved.message
        }
        Err(e) => {
            log::info!(
                "{} submitted an invalid question: {}",
                msg.chat.username().unwrap_or("anonymous"),
                e
            );
            context.editor.cancel_edit();
            format!("{e}. Use /add or /edit to start over.")
        }
    };

    bot.send_message(msg.chat.id, reply)
        .reply_markup(action_keyboard())
        .await?;
    dialogue.update(QuizState::Start).await?;

    Ok(())
}
