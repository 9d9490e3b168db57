//! Bot wiring: shared state, the dispatch tree, the startup notice and the
//! long-polling loop.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use zorya_core::config::Config;
use zorya_core::domain::{ChatId, UserId};
use zorya_core::generation::GenerationClient;
use zorya_core::history::TarotHistory;
use zorya_core::limits::RequestGate;
use zorya_core::messaging::{FormatMode, MessagingPort, SendOptions};
use zorya_core::posts::PostService;
use zorya_core::publisher::ChannelPublisher;
use zorya_core::readings::ReadingService;
use zorya_core::scheduler::{PostScheduler, TRIGGERS};
use zorya_core::users::UserDirectory;

use crate::handlers;
use crate::TelegramMessenger;

/// When armed, the next plain text from the admin is relayed to the channel.
#[derive(Default)]
pub struct RelayState {
    armed: Mutex<bool>,
}

impl RelayState {
    pub fn arm(&self) {
        *self.locked() = true;
    }

    pub fn disarm(&self) {
        *self.locked() = false;
    }

    /// Read-and-clear, so one armed relay forwards exactly one message.
    pub fn take(&self) -> bool {
        std::mem::take(&mut *self.locked())
    }

    fn locked(&self) -> MutexGuard<'_, bool> {
        self.armed.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct AppState {
    pub cfg: Config,
    pub bot_username: String,
    pub messenger: Arc<dyn MessagingPort>,
    pub readings: Arc<ReadingService>,
    pub posts: Arc<PostService>,
    pub history: Arc<TarotHistory>,
    pub users: Arc<UserDirectory>,
    pub relay: RelayState,
}

impl AppState {
    pub fn is_admin(&self, user: UserId) -> bool {
        user.0 == self.cfg.admin_id
    }
}

/// Build the full application around one bot token and poll until shutdown.
pub async fn run_polling(
    cfg: Config,
    generation: Arc<GenerationClient>,
    history: Arc<TarotHistory>,
    users: Arc<UserDirectory>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());
    let me = bot.get_me().await?;
    tracing::info!(username = me.username(), "bot authorized");

    let messenger: Arc<dyn MessagingPort> =
        Arc::new(TelegramMessenger::new(bot.clone(), cfg.channel_chat_id));
    let publisher = Arc::new(ChannelPublisher::new(
        messenger.clone(),
        cfg.channel_link.clone(),
    ));
    let posts = Arc::new(PostService::new(
        generation.clone(),
        history.clone(),
        publisher,
        cfg.schedule_offset,
    ));
    let readings = Arc::new(ReadingService::new(
        generation,
        users.clone(),
        RequestGate::new(),
        messenger.clone(),
        cfg.channel_link.clone(),
        cfg.soft_timeout,
    ));
    let scheduler = Arc::new(PostScheduler::new(posts.clone(), cfg.schedule_offset));
    scheduler.start().await?;

    let state = Arc::new(AppState {
        cfg,
        bot_username: me.username().to_string(),
        messenger,
        readings,
        posts,
        history,
        users,
        relay: RelayState::default(),
    });

    spawn_startup_notice(state.clone());

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::on_callback))
        .branch(Update::filter_message().endpoint(handlers::on_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    scheduler.stop().await;
    Ok(())
}

/// A short delayed hello to the admin chat once polling is up.
fn spawn_startup_notice(state: Arc<AppState>) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        let note = format!(
            "🤖 Бот запущено. Активних тригерів розкладу: {}.",
            TRIGGERS.len()
        );
        if let Err(e) = state
            .messenger
            .send_to_user(
                ChatId(state.cfg.admin_id),
                &note,
                FormatMode::Plain,
                SendOptions::default(),
            )
            .await
        {
            tracing::warn!(error = %e, "startup notice failed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_forwards_exactly_one_message() {
        let relay = RelayState::default();
        assert!(!relay.take());
        relay.arm();
        assert!(relay.take());
        assert!(!relay.take());
        relay.arm();
        relay.disarm();
        assert!(!relay.take());
    }
}
