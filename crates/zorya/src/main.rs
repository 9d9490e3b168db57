//! Zorya: a scheduled astrology channel bot with personal tarot readings.

use std::sync::Arc;

use zorya_core::config::Config;
use zorya_core::generation::{GenerationClient, TextGenerator};
use zorya_core::history::{TarotHistory, TAROT_DECK_SIZE};
use zorya_core::logging;
use zorya_core::users::UserDirectory;
use zorya_gemini::GeminiClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init("zorya")?;
    let cfg = Config::load()?;

    let provider: Arc<dyn TextGenerator> = Arc::new(GeminiClient::new(
        cfg.gemini_api_key.clone(),
        cfg.gemini_model.clone(),
        cfg.gemini_temperature,
    ));
    let generation = Arc::new(GenerationClient::new(provider, cfg.generation));
    let history = Arc::new(TarotHistory::load(
        cfg.tarot_history_file.clone(),
        TAROT_DECK_SIZE,
    ));
    let users = Arc::new(UserDirectory::load(cfg.users_file.clone()));

    tracing::info!(model = %cfg.gemini_model, "starting zorya");
    zorya_telegram::router::run_polling(cfg, generation, history, users).await
}
