use std::borrow::Cow;
use std::error::Error;
use std::sync::Arc;

use quizbank::config::Settings;
use quizbank::context::ContextRegistry;
use quizbank::database::{Connection, MemoryStore, SlotStore};
use quizbank::schema::schema;
use quizbank::state::QuizState;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::error_handlers::IgnoringErrorHandlerSafe;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks::{self, Options};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let settings = Settings::from_env()?;

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::from_level(settings.log_level))
        .json()
        .with_span_events(FmtSpan::ENTER)
        .log_internal_errors(true)
        .with_line_number(true)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;

    match settings.database_url.clone() {
        Some(database_url) => {
            let connection = Connection::connect(Cow::Owned(database_url)).await?;
            connection.perform_migrations().await?;
            run(Arc::new(connection), settings).await
        }
        None => {
            log::warn!("DATABASE_URL is not set, saved questions live only as long as the process");
            run(Arc::new(MemoryStore::default()), settings).await
        }
    }
}

async fn run<S: SlotStore>(
    store: Arc<S>,
    settings: Settings,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let registry = Arc::new(ContextRegistry::new(store, &settings));
    let bot = Bot::new(&settings.teloxide_token);
    log::info!("Starting bot...");

    let mut dispatcher = Dispatcher::builder(bot.clone(), schema::<S>())
        .dependencies(dptree::deps![InMemStorage::<QuizState>::new(), registry])
        .enable_ctrlc_handler()
        .build();

    match settings.webhook {
        Some((url, addr)) => {
            log::info!("Listening for updates on {addr}");
            let listener = webhooks::axum(bot, Options::new(addr, url)).await?;
            dispatcher
                .dispatch_with_listener(listener, Arc::new(IgnoringErrorHandlerSafe))
                .await
        }
        None => dispatcher.dispatch().await,
    }

    Ok(())
}
