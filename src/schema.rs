use std::{error::Error, sync::Arc};

use teloxide::{
    dispatching::{
        dialogue::{self, InMemStorage},
        DpHandlerDescription, UpdateFilterExt, UpdateHandler,
    },
    dptree::{self, Handler},
    prelude::{DependencyMap, Requester},
    types::{Message, Update},
    Bot,
};
use tracing::instrument;

use crate::{
    commands::{self, Command},
    constructor,
    context::ContextRegistry,
    database::SlotStore,
    editor,
    keyboard::{ADD, EXPORT, LIST, PLAY},
    runner,
    state::QuizState,
    HandlerResult, UserDialogue,
};

type SchemeHandler = Handler<
    'static,
    DependencyMap,
    Result<(), Box<dyn Error + Send + Sync + 'static>>,
    DpHandlerDescription,
>;

/// The dispatch tree of the bot. It expects `InMemStorage<QuizState>` and
/// `Arc<ContextRegistry<S>>` among the dependencies.
pub fn schema<S: SlotStore>() -> UpdateHandler<Box<dyn Error + Send + Sync + 'static>> {
    let handler = Update::filter_message()
        .branch(command_scheme::<S>())
        .branch(dptree::case![QuizState::Start].endpoint(choose_what_to_do::<S>))
        .branch(constructor_scheme::<S>())
        .branch(editor_scheme::<S>())
        .endpoint(invalid_state);

    dialogue::enter::<Update, InMemStorage<QuizState>, QuizState, _>()
        .branch(handler)
        .branch(callback_query_scheme::<S>())
}

#[instrument(level = "debug")]
fn command_scheme<S: SlotStore>() -> SchemeHandler {
    use dptree::case;
    log::debug!("Building a dispatch tree for commands");
    teloxide::filter_command::<Command, _>()
        .branch(case![Command::Help].endpoint(commands::help))
        .branch(case![Command::Start].endpoint(commands::start::<S>))
        .branch(case![Command::Cancel].endpoint(commands::cancel::<S>))
        .branch(case![Command::Play].endpoint(runner::play::<S>))
        .branch(case![Command::Add].endpoint(constructor::add_question::<S>))
        .branch(case![Command::List].endpoint(editor::list::<S>))
        .branch(case![Command::Edit(arg)].endpoint(editor::begin_edit::<S>))
        .branch(case![Command::Delete(arg)].endpoint(editor::begin_delete::<S>))
        .branch(case![Command::Export].endpoint(editor::export::<S>))
        .branch(case![Command::Clear].endpoint(editor::clear::<S>))
}

#[instrument(level = "debug")]
fn constructor_scheme<S: SlotStore>() -> SchemeHandler {
    use dptree::case;
    log::debug!("Building a dispatch tree for the question form");
    Update::filter_message()
        .branch(
            case![QuizState::ReceiveQuestionText]
                .endpoint(constructor::receive_question_text::<S>),
        )
        .branch(case![QuizState::ReceiveOption { slot }].endpoint(constructor::receive_option::<S>))
        .branch(
            case![QuizState::ReceiveCorrectOption]
                .endpoint(constructor::receive_correct_option::<S>),
        )
}

#[instrument(level = "debug")]
fn editor_scheme<S: SlotStore>() -> SchemeHandler {
    use dptree::case;
    log::debug!("Building a dispatch tree for the editor");
    Update::filter_message()
        .branch(case![QuizState::ConfirmDelete { index }].endpoint(editor::confirm_delete::<S>))
}

#[instrument(level = "debug")]
fn callback_query_scheme<S: SlotStore>() -> SchemeHandler {
    log::debug!("Building a dispatch tree for answer buttons");
    Update::filter_callback_query().endpoint(runner::take_answer::<S>)
}

async fn choose_what_to_do<S: SlotStore>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    registry: Arc<ContextRegistry<S>>,
) -> HandlerResult {
    match msg.text() {
        Some(PLAY) => runner::play(bot, msg, registry).await,
        Some(ADD) => constructor::add_question(bot, dialogue, msg, registry).await,
        Some(LIST) => editor::list(bot, msg, registry).await,
        Some(EXPORT) => editor::export(bot, msg, registry).await,
        other => {
            log::info!(
                "Invalid message {:?} from {}",
                other,
                msg.chat.username().unwrap_or("anonymous")
            );
            bot.send_message(msg.chat.id, "Invalid input. Please try again.")
                .await?;
            Ok(())
        }
    }
}

#[instrument(level = "info")]
async fn invalid_state(bot: Bot, msg: Message) -> HandlerResult {
    log::info!(
        "{}: invalid input '{:?}'",
        msg.chat.username().unwrap_or("anonymous"),
        msg.text()
    );
    bot.send_message(
        msg.chat.id,
        "Unable to handle the message. Enter /help to see usages.",
    )
    .await?;
    Ok(())
}
