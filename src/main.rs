use std::error::Error;

use dotenvy::dotenv;
use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{error, info};

mod anilist;
mod config;
mod gallery;
mod handlers;
mod splitter;
mod state;
mod utils;

use config::CONFIG;
use handlers::commands;
use state::AppState;
use utils::logging::init_logging;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
enum Command {
    Start,
    Help,
    Anime,
    Setparams(String),
    Split,
}

type HandlerResult = Result<(), Box<dyn Error + Send + Sync>>;

#[tokio::main]
async fn main() -> HandlerResult {
    dotenv().ok();
    let _guards = init_logging();

    if CONFIG.bot_token.trim().is_empty() {
        return Err("BOT_TOKEN is required".into());
    }

    let bot = Bot::new(CONFIG.bot_token.clone());
    info!("Starting AnimeArchiveBot");

    let state = AppState::new();

    let command_handler = dptree::entry()
        .filter_command::<Command>()
        .endpoint(handle_command);

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .branch(
            dptree::filter(|msg: Message| msg.text().is_some()).endpoint(handle_text),
        )
        .endpoint(ignore_message);

    let callback_handler = Update::filter_callback_query().endpoint(handle_callback_query);

    let handler = dptree::entry()
        .branch(message_handler)
        .branch(callback_handler);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_command(
    bot: Bot,
    state: AppState,
    message: Message,
    command: Command,
) -> HandlerResult {
    fn optional_arg(arg: String) -> Option<String> {
        if arg.trim().is_empty() {
            None
        } else {
            Some(arg)
        }
    }

    match command {
        Command::Start => commands::start_handler(bot, message).await?,
        Command::Help => commands::help_handler(bot, message).await?,
        Command::Anime => commands::anime_handler(bot, state, message).await?,
        Command::Setparams(arg) => {
            commands::setparams_handler(bot, state, message, optional_arg(arg)).await?
        }
        Command::Split => commands::split_handler(bot, state, message).await?,
    }
    Ok(())
}

async fn handle_text(bot: Bot, state: AppState, message: Message) -> HandlerResult {
    // The gallery flow downloads and uploads sequentially and can run for a
    // while; spawning keeps the dispatcher responsive for other chats.
    tokio::spawn(async move {
        if let Err(err) = commands::text_handler(bot, state, message).await {
            error!("text handler failed: {err}");
        }
    });
    Ok(())
}

async fn handle_callback_query(bot: Bot, state: AppState, query: CallbackQuery) -> HandlerResult {
    tokio::spawn(async move {
        if let Err(err) = commands::callback_handler(bot, state, query).await {
            error!("callback handler failed: {err}");
        }
    });
    Ok(())
}

async fn ignore_message(_message: Message) -> HandlerResult {
    Ok(())
}
