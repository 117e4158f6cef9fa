use crate::bot::callback::CallbackAction;
use crate::bot::render;
use crate::bot::traits::ChatApi;
use crate::bot::types::{CallbackQuery, Message, OutgoingMessage, Update};
use crate::catalog::{self, CatalogOutcome};
use crate::config::Config;
use crate::models::{Category, Listing};
use crate::scrapers::Aggregator;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const POLL_TIMEOUT_SECS: u64 = 30;
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(3);

/// What a text message from the user asks for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MenuCommand {
    Start,
    Browse(Option<Category>),
    Help,
    Unknown,
}

impl MenuCommand {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text == "/start" || text.starts_with("/start ") || text.starts_with("/start@") {
            return MenuCommand::Start;
        }

        match text {
            render::BUTTON_ALL => MenuCommand::Browse(None),
            render::BUTTON_NEW => MenuCommand::Browse(Some(Category::New)),
            render::BUTTON_RETRO => MenuCommand::Browse(Some(Category::Retro)),
            render::BUTTON_CHILDREN => MenuCommand::Browse(Some(Category::Children)),
            render::BUTTON_HELP => MenuCommand::Help,
            _ => MenuCommand::Unknown,
        }
    }
}

/// Conversation logic: turns chat updates into scrapes and rendered replies
pub struct CarBot {
    chat: Arc<dyn ChatApi>,
    aggregator: Aggregator,
    send_delay: Duration,
    contact_phone: String,
}

impl CarBot {
    pub fn new(chat: Arc<dyn ChatApi>, aggregator: Aggregator, config: &Config) -> Self {
        Self {
            chat,
            aggregator,
            send_delay: config.send_delay,
            contact_phone: config.contact_phone.clone(),
        }
    }

    /// Long-poll for updates until `shutdown` is cancelled.
    ///
    /// Each update is handled in its own task so a slow scrape does not hold
    /// up other chats.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) -> Result<()> {
        info!("Polling for chat updates");
        let mut offset = 0;

        loop {
            let polled = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                polled = self.chat.get_updates(offset, POLL_TIMEOUT_SECS) => polled,
            };

            match polled {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        let bot = Arc::clone(&self);
                        tokio::spawn(async move { bot.handle_update(update).await });
                    }
                }
                Err(e) => {
                    warn!(error = %format!("{e:#}"), "Failed to poll updates");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(POLL_ERROR_BACKOFF) => {}
                    }
                }
            }
        }

        info!("Polling stopped");
        Ok(())
    }

    pub async fn handle_update(&self, update: Update) {
        if let Some(message) = update.message {
            if let Err(e) = self.handle_message(&message).await {
                error!(chat = message.chat.id, error = %format!("{e:#}"), "Failed to handle message");
            }
        } else if let Some(query) = update.callback_query {
            self.handle_callback(query).await;
        } else {
            debug!(update = update.update_id, "Ignoring update");
        }
    }

    async fn handle_message(&self, message: &Message) -> Result<()> {
        let Some(text) = message.text.as_deref() else {
            return Ok(());
        };
        let chat_id = message.chat.id;
        let reply_to = Some(message.message_id);

        match MenuCommand::parse(text) {
            MenuCommand::Start => {
                let welcome = OutgoingMessage::text(render::WELCOME_TEXT)
                    .markup(render::main_keyboard())
                    .reply_to(reply_to)
                    .no_preview();
                self.chat.send_message(chat_id, &welcome).await?;
            }
            MenuCommand::Browse(category) => {
                self.show_brands(chat_id, reply_to, category, 1).await?;
            }
            MenuCommand::Help => {
                let help = OutgoingMessage::text(render::help_text(&self.contact_phone)).no_preview();
                self.chat.send_message(chat_id, &help).await?;
            }
            MenuCommand::Unknown => {
                let hint = OutgoingMessage::text(render::USE_MENU_TEXT).reply_to(reply_to);
                self.chat.send_message(chat_id, &hint).await?;
            }
        }

        Ok(())
    }

    /// Scrape, then show one page of the brand menu
    async fn show_brands(
        &self,
        chat_id: i64,
        reply_to: Option<i64>,
        category: Option<Category>,
        page: usize,
    ) -> Result<()> {
        let searching = self
            .chat
            .send_message(chat_id, &OutgoingMessage::text(render::SEARCHING_TEXT))
            .await?;

        let listings = match category {
            Some(category) => self.aggregator.fetch_by_category(category).await,
            None => self.aggregator.fetch_all().await,
        };

        if let Err(e) = self.chat.delete_message(chat_id, searching.message_id).await {
            debug!(error = %e, "Could not delete progress message");
        }

        match catalog::browse_clamped(listings, category, page) {
            CatalogOutcome::NoChildrenListings => {
                let reply = OutgoingMessage::text(render::NO_CHILDREN_TEXT)
                    .markup(render::main_keyboard())
                    .reply_to(reply_to);
                self.chat.send_message(chat_id, &reply).await?;
            }
            CatalogOutcome::NothingLoaded => {
                warn!(category = ?category, "No listings to show");
                let reply = OutgoingMessage::text(render::LOAD_FAILED_TEXT).reply_to(reply_to);
                self.chat.send_message(chat_id, &reply).await?;
            }
            CatalogOutcome::Page(page) => {
                let menu = OutgoingMessage::text(render::brand_menu_text(&page, category))
                    .markup(render::brand_menu_keyboard(&page, category));
                self.chat.send_message(chat_id, &menu).await?;
            }
        }

        Ok(())
    }

    async fn handle_callback(&self, query: CallbackQuery) {
        let Some(message) = query.message.as_ref() else {
            self.answer(&query.id, None).await;
            return;
        };

        let action = query.data.as_deref().and_then(CallbackAction::parse);
        let result = match action {
            Some(CallbackAction::Brand { key, category }) => {
                self.show_brand_listings(message, &key, category).await
            }
            Some(CallbackAction::Page { page, category }) => {
                self.turn_page(message, page, category).await.map(|_| None)
            }
            None => {
                warn!(data = ?query.data, "Unrecognized callback payload");
                Ok(None)
            }
        };

        let notice = match result {
            Ok(notice) => notice,
            Err(e) => {
                error!(chat = message.chat.id, error = %format!("{e:#}"), "Callback failed");
                let report = OutgoingMessage::text(render::error_text(&e));
                if let Err(e) = self.chat.send_message(message.chat.id, &report).await {
                    error!(error = %e, "Failed to report callback error");
                }
                None
            }
        };

        self.answer(&query.id, notice).await;
    }

    async fn answer(&self, callback_id: &str, notice: Option<&str>) {
        if let Err(e) = self.chat.answer_callback_query(callback_id, notice).await {
            debug!(error = %e, "Failed to answer callback query");
        }
    }

    async fn turn_page(&self, message: &Message, page: usize, category: Option<Category>) -> Result<()> {
        self.chat
            .clear_inline_keyboard(message.chat.id, message.message_id)
            .await?;
        self.show_brands(message.chat.id, Some(message.message_id), category, page)
            .await
    }

    /// Send every listing of one brand as its own card.
    ///
    /// Returns the notice for the callback answer when the brand is gone.
    async fn show_brand_listings(
        &self,
        message: &Message,
        key: &str,
        category: Option<Category>,
    ) -> Result<Option<&'static str>> {
        let chat_id = message.chat.id;
        let listings = self.aggregator.fetch_all().await;
        let brand_listings = catalog::listings_for_brand(listings, key, category);

        let Some(first) = brand_listings.first() else {
            info!(brand = key, "Brand no longer listed");
            return Ok(Some(render::BRAND_NOT_FOUND_TEXT));
        };

        self.chat
            .edit_message_text(chat_id, message.message_id, &render::brand_heading(&first.brand))
            .await?;

        for (i, listing) in brand_listings.iter().enumerate() {
            self.send_listing_card(chat_id, listing, i + 1).await?;
            tokio::time::sleep(self.send_delay).await;
        }

        let done = OutgoingMessage::text(render::DONE_TEXT).markup(render::main_keyboard());
        self.chat.send_message(chat_id, &done).await?;

        Ok(None)
    }

    async fn send_listing_card(&self, chat_id: i64, listing: &Listing, index: usize) -> Result<()> {
        let caption = render::listing_caption(listing, index, &self.contact_phone);

        if let Some(photo) = &listing.photo {
            match self.chat.send_photo(chat_id, photo, &caption).await {
                Ok(_) => return Ok(()),
                Err(e) => {
                    error!(photo = %photo, error = %format!("{e:#}"), "Failed to send listing photo");
                    let fallback = OutgoingMessage::text(render::photo_fallback(&caption)).no_preview();
                    self.chat.send_message(chat_id, &fallback).await?;
                    return Ok(());
                }
            }
        }

        self.chat
            .send_message(chat_id, &OutgoingMessage::text(caption).no_preview())
            .await?;
        Ok(())
    }
}
