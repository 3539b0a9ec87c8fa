use std::path::Path;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, InputFile, ParseMode, ReplyParameters,
};
use tracing::warn;

use crate::anilist::fetch_anime_info;
use crate::config::CONFIG;
use crate::gallery::{assemble, download_image, scrape_images};
use crate::handlers::access::{check_access, is_user_allowed, UNAUTHORIZED_MESSAGE};
use crate::handlers::captions::{render_caption, PostFormat};
use crate::splitter::expand_links;
use crate::state::{AppState, GalleryRequest, Session, SplitStage};

const QUALITY_OPTIONS: [(&str, &str); 5] = [
    ("480p", "480p"),
    ("720p", "720p"),
    ("1080p", "1080p"),
    ("720p & 1080p", "720p_1080p"),
    ("480p, 720p & 1080p", "480p_720p_1080p"),
];

pub async fn start_handler(bot: Bot, message: Message) -> Result<()> {
    if !check_access(&bot, &message).await {
        return Ok(());
    }

    bot.send_message(
        message.chat.id,
        "Welcome! This bot has multiple features:\n\n\
         1. Use /anime to search for anime info\n\
         2. Send a gallery page link to download images and create a PDF\n\
         3. Use /split to get episode links\n\
         4. Use /setparams to set the anime name template",
    )
    .reply_parameters(ReplyParameters::new(message.id))
    .await?;
    Ok(())
}

#[allow(deprecated)]
pub async fn help_handler(bot: Bot, message: Message) -> Result<()> {
    if !check_access(&bot, &message).await {
        return Ok(());
    }

    let help_text = format!(
        "*AnimeArchiveBot Commands*\n\n\
         /anime - Look up an anime and build a formatted channel post\n\
         Usage: send `/anime`, then the anime name, then pick quality and format.\n\n\
         /setparams - Set the episode name template used by /split\n\
         Usage: `/setparams <anime name with {{episode}}>`\n\n\
         /split - Expand a start/end t.me link pair into per-episode links\n\
         Usage: send `/split`, then the start link, then the end link.\n\n\
         Send a {}/... page link to download its images and receive them as a PDF.",
        CONFIG.gallery_origin
    );

    bot.send_message(message.chat.id, help_text)
        .reply_parameters(ReplyParameters::new(message.id))
        .parse_mode(ParseMode::Markdown)
        .await?;
    Ok(())
}

pub async fn anime_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    if !check_access(&bot, &message).await {
        return Ok(());
    }

    state.sessions.update(message.chat.id.0, |session| {
        session.anime_name = None;
        session.quality = None;
        session.awaiting_anime_name = true;
    });

    bot.send_message(message.chat.id, "📩 Send me the anime name:")
        .reply_parameters(ReplyParameters::new(message.id))
        .await?;
    Ok(())
}

pub async fn setparams_handler(
    bot: Bot,
    state: AppState,
    message: Message,
    arg: Option<String>,
) -> Result<()> {
    if !check_access(&bot, &message).await {
        return Ok(());
    }

    match arg {
        Some(template) => {
            let template = template.trim().to_string();
            state.sessions.update(message.chat.id.0, |session| {
                session.anime_name = Some(template.clone());
            });
            bot.send_message(message.chat.id, format!("✅ Anime name set to: {template}"))
                .await?;
        }
        None => {
            bot.send_message(
                message.chat.id,
                "❌ Invalid usage. Use /setparams <anime_name with {episode}>",
            )
            .await?;
        }
    }
    Ok(())
}

pub async fn split_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    if !check_access(&bot, &message).await {
        return Ok(());
    }

    state.sessions.update(message.chat.id.0, |session| {
        session.split = SplitStage::AwaitingStartLink;
    });
    bot.send_message(message.chat.id, "Send start link").await?;
    Ok(())
}

/// Routes plain text in private chats off the chat's session stage: split
/// links first, then gallery page links, then a pending image count, then a
/// pending anime name. Anything else is ignored.
pub async fn text_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    if !message.chat.is_private() {
        return Ok(());
    }
    let Some(text) = message.text() else {
        return Ok(());
    };
    let text = text.trim().to_string();
    if text.is_empty() || text.starts_with('/') {
        return Ok(());
    }
    if !check_access(&bot, &message).await {
        return Ok(());
    }

    let chat_id = message.chat.id;
    let session = state.sessions.get(chat_id.0).unwrap_or_default();

    if session.split != SplitStage::Idle {
        return handle_split_input(&bot, &state, chat_id, &session, &text).await;
    }

    if text.starts_with(&format!("{}/", CONFIG.gallery_origin)) {
        return handle_gallery_url(&bot, &state, chat_id, &text).await;
    }

    if let Some(gallery) = session.gallery.clone() {
        if gallery.limit.is_none() {
            return handle_gallery_limit(&bot, &state, chat_id, gallery, &text).await;
        }
    }

    if session.awaiting_anime_name {
        return handle_anime_name(&bot, &state, chat_id, &text).await;
    }

    Ok(())
}

async fn handle_split_input(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    session: &Session,
    text: &str,
) -> Result<()> {
    match &session.split {
        SplitStage::AwaitingStartLink => {
            state.sessions.update(chat_id.0, |session| {
                session.split = SplitStage::AwaitingEndLink {
                    start_link: text.to_string(),
                };
            });
            bot.send_message(chat_id, "Now send end link").await?;
        }
        SplitStage::AwaitingEndLink { start_link } => {
            let template = session.anime_name.clone().unwrap_or_default();
            match expand_links(start_link, text, &template) {
                Some(lines) => {
                    for batch in lines.chunks(CONFIG.split_batch_size) {
                        bot.send_message(chat_id, batch.concat()).await?;
                    }
                }
                None => {
                    bot.send_message(chat_id, "❌ Invalid links").await?;
                }
            }
            state.sessions.update(chat_id.0, |session| {
                session.split = SplitStage::Idle;
            });
        }
        SplitStage::Idle => {}
    }
    Ok(())
}

async fn handle_gallery_url(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    page_url: &str,
) -> Result<()> {
    let directory = CONFIG
        .download_root
        .join(format!("downloads_{}", chat_id.0));

    // Leftovers from a previous run in the same chat would pollute the
    // numbering, so the directory is recreated from scratch.
    if directory.exists() {
        if let Err(err) = tokio::fs::remove_dir_all(&directory).await {
            warn!(
                "Failed to clear download directory {}: {err}",
                directory.display()
            );
        }
    }

    state.sessions.update(chat_id.0, |session| {
        session.gallery = Some(GalleryRequest {
            page_url: page_url.to_string(),
            directory: directory.clone(),
            limit: None,
        });
    });

    bot.send_message(chat_id, "How many images would you like to download?")
        .await?;
    Ok(())
}

async fn handle_gallery_limit(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    gallery: GalleryRequest,
    text: &str,
) -> Result<()> {
    let limit = match text.parse::<usize>() {
        Ok(value) if value >= 1 => value,
        _ => {
            bot.send_message(chat_id, "❌ Please send a valid number.")
                .await?;
            return Ok(());
        }
    };

    state.sessions.update(chat_id.0, |session| {
        if let Some(request) = session.gallery.as_mut() {
            request.limit = Some(limit);
        }
    });

    bot.send_message(chat_id, "Fetching images, please wait...")
        .await?;

    let result = run_gallery_job(bot, chat_id, &gallery.page_url, &gallery.directory, limit).await;
    // The session is finished either way; a fresh link starts a new one.
    state.sessions.clear(chat_id.0);
    result
}

/// The gallery pipeline: scrape, truncate to the requested count, download
/// one at a time into numbered slots, assemble a PDF, upload everything.
/// Item-level download failures shrink the batch instead of aborting it.
async fn run_gallery_job(
    bot: &Bot,
    chat_id: ChatId,
    page_url: &str,
    directory: &Path,
    limit: usize,
) -> Result<()> {
    tokio::fs::create_dir_all(directory).await?;

    let images = match scrape_images(page_url).await {
        Ok(images) => images,
        Err(err) => {
            bot.send_message(chat_id, format!("Error: {err}")).await?;
            return Ok(());
        }
    };

    let selected = &images[..images.len().min(limit)];
    let total = selected.len();

    let progress = bot
        .send_message(chat_id, format!("0/{total} images downloaded"))
        .await?;

    let mut produced = 0usize;
    for (index, image) in selected.iter().enumerate() {
        let position = index + 1;
        if let Some(path) = download_image(&image.url).await {
            let extension = path
                .extension()
                .and_then(|value| value.to_str())
                .unwrap_or("jpg")
                .to_string();
            let target = directory.join(format!("{position}.{extension}"));
            match tokio::fs::rename(&path, &target).await {
                Ok(()) => produced += 1,
                Err(err) => warn!("Failed to move {} into place: {err}", path.display()),
            }
        }
        if position % CONFIG.progress_update_every == 0 || position == total {
            let _ = bot
                .edit_message_text(
                    chat_id,
                    progress.id,
                    format!("{position}/{total} images downloaded"),
                )
                .await;
        }
    }

    if produced == 0 {
        bot.send_message(chat_id, "❌ No images could be downloaded.")
            .await?;
        return Ok(());
    }

    bot.send_message(
        chat_id,
        format!("✅ {produced} image(s) downloaded. Generating PDF..."),
    )
    .await?;

    let pdf_path = directory.join(&CONFIG.pdf_file_name);
    let assemble_dir = directory.to_path_buf();
    let assemble_out = pdf_path.clone();
    match tokio::task::spawn_blocking(move || assemble(&assemble_dir, &assemble_out)).await? {
        Ok(_) => {}
        Err(err) => {
            bot.send_message(chat_id, format!("Error: {err}")).await?;
            return Ok(());
        }
    }

    bot.send_document(
        chat_id,
        InputFile::file(pdf_path).file_name(CONFIG.pdf_file_name.clone()),
    )
    .await?;

    // The numbered originals follow the PDF, one document each. Gaps from
    // failed downloads are simply skipped.
    for position in 1..=total {
        for extension in ["jpg", "jpeg", "png"] {
            let path = directory.join(format!("{position}.{extension}"));
            if path.exists() {
                bot.send_document(chat_id, InputFile::file(path)).await?;
                break;
            }
        }
    }

    bot.send_message(chat_id, "All images and PDF have been uploaded!")
        .await?;
    Ok(())
}

async fn handle_anime_name(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    text: &str,
) -> Result<()> {
    state.sessions.update(chat_id.0, |session| {
        session.anime_name = Some(text.to_string());
        session.awaiting_anime_name = false;
    });

    bot.send_message(chat_id, "📊 Choose quality:")
        .reply_markup(build_quality_keyboard())
        .await?;
    Ok(())
}

fn build_quality_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(QUALITY_OPTIONS.iter().map(|(label, data)| {
        vec![InlineKeyboardButton::callback(
            label.to_string(),
            data.to_string(),
        )]
    }))
}

fn build_format_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        [PostFormat::Otaku, PostFormat::Hanime, PostFormat::Ongoing]
            .iter()
            .map(|format| {
                vec![InlineKeyboardButton::callback(
                    format.label().to_string(),
                    format.callback_data().to_string(),
                )]
            }),
    )
}

pub async fn callback_handler(bot: Bot, state: AppState, query: CallbackQuery) -> Result<()> {
    let user_id = i64::try_from(query.from.id.0).unwrap_or_default();
    if !is_user_allowed(user_id) {
        let _ = bot
            .answer_callback_query(query.id.clone())
            .text(UNAUTHORIZED_MESSAGE)
            .await;
        return Ok(());
    }

    let Some(data) = query.data.clone() else {
        let _ = bot.answer_callback_query(query.id.clone()).await;
        return Ok(());
    };
    let Some(message) = query.message.as_ref() else {
        let _ = bot.answer_callback_query(query.id.clone()).await;
        return Ok(());
    };
    let chat_id = message.chat().id;

    let Some(session) = state.sessions.get(chat_id.0) else {
        let _ = bot
            .answer_callback_query(query.id.clone())
            .text("❌ No active selection found.")
            .await;
        return Ok(());
    };
    let _ = bot.answer_callback_query(query.id.clone()).await;

    if QUALITY_OPTIONS.iter().any(|(_, value)| *value == data) {
        state.sessions.update(chat_id.0, |session| {
            session.quality = Some(data.replace('_', ", "));
        });
        bot.send_message(chat_id, "📁 Choose format:")
            .reply_markup(build_format_keyboard())
            .await?;
        return Ok(());
    }

    if let Some(format) = PostFormat::from_callback(&data) {
        return send_formatted_post(&bot, &state, chat_id, &session, format).await;
    }

    Ok(())
}

async fn send_formatted_post(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    session: &Session,
    format: PostFormat,
) -> Result<()> {
    let Some(anime_name) = session.anime_name.clone() else {
        bot.send_message(chat_id, "❌ Anime not found.").await?;
        state.sessions.clear(chat_id.0);
        return Ok(());
    };
    let quality = session
        .quality
        .clone()
        .unwrap_or_else(|| "Unknown".to_string());

    let info = match fetch_anime_info(&anime_name).await {
        Ok(Some(info)) => info,
        Ok(None) => {
            bot.send_message(chat_id, "❌ Anime not found.").await?;
            state.sessions.clear(chat_id.0);
            return Ok(());
        }
        Err(err) => {
            warn!("AniList lookup failed for '{anime_name}': {err:#}");
            bot.send_message(chat_id, "❌ Anime not found.").await?;
            state.sessions.clear(chat_id.0);
            return Ok(());
        }
    };

    let caption = render_caption(format, &info, &quality);
    let poster = url::Url::parse(&info.poster_url())?;

    bot.send_photo(chat_id, InputFile::url(poster))
        .caption(caption)
        .parse_mode(ParseMode::Html)
        .await?;

    state.sessions.clear(chat_id.0);
    Ok(())
}
