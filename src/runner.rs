use std::{sync::Arc, time::Duration};

use teloxide::{
    dispatching::dialogue::GetChatId,
    payloads::{AnswerCallbackQuerySetters, EditMessageTextSetters, SendMessageSetters},
    prelude::Requester,
    types::{CallbackQuery, ChatId, InlineKeyboardMarkup, Message, MessageId},
    Bot,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    commands::load_error_text,
    context::{ContextRegistry, QuizContext, SharedContext},
    database::SlotStore,
    keyboard::{answers_keyboard, feedback_keyboard, replay_keyboard, CallbackAction},
    quiz::{AnswerOutcome, Question, QuizSession, SessionState, SessionSummary},
    HandlerResult,
};

fn header(session: &QuizSession) -> String {
    let (position, total) = session.position();
    format!("Question {}/{} · Score: {}", position, total, session.score())
}

fn feedback_text(outcome: &AnswerOutcome) -> String {
    match outcome {
        AnswerOutcome::Neutral => "Skipped ➡️".to_owned(),
        AnswerOutcome::Correct => "Correct! ✅".to_owned(),
        AnswerOutcome::Wrong { correct } if correct.is_empty() => {
            "Wrong ❌ This question has no answer set.".to_owned()
        }
        AnswerOutcome::Wrong { correct } => format!("Wrong ❌ The answer was: {correct}"),
    }
}

pub(crate) fn results_text(summary: &SessionSummary) -> String {
    format!(
        "Finished!\nScore: {}\nAverage time per question: {:.2} s\nTotal questions: {}",
        summary.score, summary.average_seconds, summary.total_questions
    )
}

fn screen(session: &QuizSession) -> (String, InlineKeyboardMarkup) {
    match session.current_question() {
        Some(question) => (
            format!("{}\n\n{}", header(session), question.text()),
            answers_keyboard(session.current_index(), question),
        ),
        None => (results_text(&session.summary()), replay_keyboard()),
    }
}

async fn show(
    bot: &Bot,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    (text, keyboard): (String, InlineKeyboardMarkup),
) -> HandlerResult {
    match message_id {
        Some(message_id) => {
            bot.edit_message_text(chat_id, message_id, text)
                .reply_markup(keyboard)
                .await?;
        }
        None => {
            bot.send_message(chat_id, text).reply_markup(keyboard).await?;
        }
    }
    Ok(())
}

#[instrument(level = "info", skip(bot, registry))]
pub(crate) async fn play<S: SlotStore>(
    bot: Bot,
    msg: Message,
    registry: Arc<ContextRegistry<S>>,
) -> HandlerResult {
    begin(&bot, msg.chat.id, &registry).await
}

async fn begin<S: SlotStore>(
    bot: &Bot,
    chat_id: ChatId,
    registry: &ContextRegistry<S>,
) -> HandlerResult {
    let context = registry.context(chat_id).await;
    let mut context = context.lock().await;

    let shown = match context.start_session().await {
        Ok(session) => {
            log::info!(
                "Chat {}: session {} starts with {} questions",
                chat_id.0,
                session.id(),
                session.total()
            );
            screen(session)
        }
        Err(e) => {
            log::error!("Chat {}: {}", chat_id.0, e);
            bot.send_message(chat_id, load_error_text(e, registry.questions_path()))
                .await?;
            return Ok(());
        }
    };
    show(bot, chat_id, None, shown).await?;
    context.mark_shown();

    Ok(())
}

#[derive(Debug)]
struct Scored {
    session_id: Uuid,
    question: Question,
    chosen: String,
    outcome: AnswerOutcome,
    elapsed: Duration,
    header: String,
}

/// Scores the button in `slot` of question `question`. The error is the
/// notice for presses that are not scored.
fn score_answer<S: SlotStore>(
    context: &mut QuizContext<S>,
    question: usize,
    slot: usize,
) -> Result<Scored, &'static str> {
    let elapsed = context.elapsed();
    let session = context
        .session
        .as_mut()
        .filter(|session| session.current_index() == question)
        .ok_or("This question is closed.")?;
    let current = session
        .current_question()
        .cloned()
        .ok_or("This question is closed.")?;
    let chosen = current.options().get(slot).cloned().unwrap_or_default();

    let outcome = session
        .submit_answer(&chosen, elapsed)
        .ok_or("Already answered.")?;

    Ok(Scored {
        session_id: *session.id(),
        question: current,
        chosen,
        outcome,
        elapsed,
        header: header(session),
    })
}

#[instrument(level = "info", skip(bot, registry))]
pub(crate) async fn take_answer<S: SlotStore>(
    bot: Bot,
    q: CallbackQuery,
    registry: Arc<ContextRegistry<S>>,
) -> HandlerResult {
    let action = q.data.as_deref().and_then(CallbackAction::parse);
    let (Some(chat_id), Some(action)) = (q.chat_id(), action) else {
        log::warn!("Unexpected callback {:?}", q.data);
        bot.answer_callback_query(&q.id).await?;
        return Ok(());
    };
    let message_id = q.message.as_ref().map(|message| message.id());

    match action {
        CallbackAction::Unavailable => {
            bot.answer_callback_query(&q.id)
                .text("This option is unavailable.")
                .await?;
        }
        CallbackAction::Replay => {
            bot.answer_callback_query(&q.id).await?;
            begin(&bot, chat_id, &registry).await?;
        }
        CallbackAction::Answer { question, slot } => {
            let shared = registry.context(chat_id).await;
            let scored = score_answer(&mut *shared.lock().await, question, slot);
            let scored = match scored {
                Ok(scored) => scored,
                Err(notice) => {
                    bot.answer_callback_query(&q.id).text(notice).await?;
                    return Ok(());
                }
            };

            // scheduled before any send, a failed send must not keep the question answered
            schedule_advance(
                bot.clone(),
                chat_id,
                message_id,
                Arc::clone(&shared),
                scored.session_id,
                registry.settle_delay(),
            );

            log::info!(
                "{} answers '{}' to question #{} '{}' in {:?}: {:?}",
                q.from.username.as_deref().unwrap_or("anonymous"),
                scored.chosen,
                question + 1,
                scored.question.text(),
                scored.elapsed,
                scored.outcome
            );

            let feedback = feedback_text(&scored.outcome);
            let text = format!("{}\n\n{}\n\n{}", scored.header, scored.question.text(), feedback);
            bot.answer_callback_query(&q.id).text(feedback).await?;
            show(
                &bot,
                chat_id,
                message_id,
                (
                    text,
                    feedback_keyboard(question, &scored.question, slot, &scored.outcome),
                ),
            )
            .await?;
        }
    }

    Ok(())
}

/// Moves the session on after `delay`, so the feedback stays visible for a
/// moment before the next question replaces it.
fn schedule_advance<S: SlotStore>(
    bot: Bot,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    context: SharedContext<S>,
    session_id: Uuid,
    delay: Duration,
) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let Some(shown) = settle(&mut *context.lock().await, chat_id, session_id) else {
            return;
        };
        if let Err(e) = show(&bot, chat_id, message_id, shown).await {
            log::error!("Chat {}: failed to show the next question: {}", chat_id.0, e);
        }
    });
}

/// Advances session `session_id` and returns the screen to show next. `None`
/// when a new session was started during the delay.
fn settle<S: SlotStore>(
    context: &mut QuizContext<S>,
    chat_id: ChatId,
    session_id: Uuid,
) -> Option<(String, InlineKeyboardMarkup)> {
    let session = context
        .session
        .as_mut()
        .filter(|session| session.id() == &session_id)?;

    if session.advance() == SessionState::Finished {
        let summary = session.summary();
        log::info!(
            "Chat {}: session {} finished with score {} (avg {:.2}s)",
            chat_id.0,
            session_id,
            summary.score,
            summary.average_seconds
        );
    }
    let shown = screen(session);
    context.mark_shown();
    Some(shown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        database::MemoryStore,
        quiz::{
            bank::tests::{sample_resource, write_resource},
            QuestionBank,
        },
    };

    fn session() -> QuizSession {
        QuizSession::start(vec![
            Question::new("2+2?", ["3", "4", "5", "6"].map(String::from), 1),
            Question::new("3+3?", ["6", "7", "8", "9"].map(String::from), 0),
        ])
    }

    #[test]
    fn test_screen_shows_current_question() {
        let session = session();
        let (text, keyboard) = screen(&session);

        assert_eq!(text, "Question 1/2 · Score: 0\n\n2+2?");
        assert_eq!(keyboard.inline_keyboard.len(), 5);
    }

    #[test]
    fn test_screen_shows_results_when_finished() {
        let mut session = session();
        session.submit_answer("4", Duration::from_millis(1500));
        session.advance();
        session.submit_answer("Next", Duration::from_millis(500));
        session.advance();

        let (text, keyboard) = screen(&session);
        assert_eq!(
            text,
            "Finished!\nScore: 1\nAverage time per question: 1.00 s\nTotal questions: 2"
        );
        assert_eq!(keyboard.inline_keyboard.len(), 1);
    }

    #[test]
    fn test_feedback_text() {
        assert_eq!(feedback_text(&AnswerOutcome::Neutral), "Skipped ➡️");
        assert_eq!(
            feedback_text(&AnswerOutcome::Wrong { correct: "4".into() }),
            "Wrong ❌ The answer was: 4"
        );
        assert_eq!(
            feedback_text(&AnswerOutcome::Wrong { correct: String::new() }),
            "Wrong ❌ This question has no answer set."
        );
    }

    #[test]
    fn test_empty_session_goes_straight_to_results() {
        let (text, _) = screen(&QuizSession::start(Vec::new()));
        assert!(text.contains("Total questions: 0"));
    }

    async fn playing_context() -> (QuizContext<MemoryStore>, tempfile::NamedTempFile) {
        let resource = write_resource(&sample_resource());
        let bank = QuestionBank::new(Arc::new(MemoryStore::default()), "slot", resource.path());
        let mut context = QuizContext::new(bank);
        context.start_session().await.unwrap();
        (context, resource)
    }

    #[tokio::test]
    async fn test_score_answer_scores_once() {
        let (mut context, _resource) = playing_context().await;

        let scored = score_answer(&mut context, 0, 1).unwrap();
        assert_eq!(scored.chosen, "4");
        assert_eq!(scored.outcome, AnswerOutcome::Correct);
        assert_eq!(scored.header, "Question 1/3 · Score: 1");

        assert_eq!(score_answer(&mut context, 0, 0).unwrap_err(), "Already answered.");
        assert_eq!(score_answer(&mut context, 2, 0).unwrap_err(), "This question is closed.");
        assert_eq!(context.session.as_ref().unwrap().score(), 1);
    }

    #[tokio::test]
    async fn test_settle_ignores_replaced_session() {
        let (mut context, _resource) = playing_context().await;
        let stale = score_answer(&mut context, 0, 1).unwrap().session_id;
        context.start_session().await.unwrap();

        assert!(settle(&mut context, ChatId(1), stale).is_none());
        assert_eq!(context.session.as_ref().unwrap().current_index(), 0);
    }

    #[tokio::test]
    async fn test_advance_survives_failed_render() {
        let (mut context, _resource) = playing_context().await;
        let session_id = score_answer(&mut context, 0, 4).unwrap().session_id;
        let shared = Arc::new(tokio::sync::Mutex::new(context));
        // nothing listens there, every request fails
        let bot = Bot::new("token").set_api_url(url::Url::parse("http://127.0.0.1:9/").unwrap());

        schedule_advance(bot, ChatId(1), None, Arc::clone(&shared), session_id, Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(200)).await;

        let context = shared.lock().await;
        let session = context.session.as_ref().unwrap();
        assert_eq!(session.current_index(), 1);
        assert!(!session.is_answered());
    }
}
