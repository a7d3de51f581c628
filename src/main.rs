mod auth;
mod config;
mod error;
mod handlers;
mod quiz;

use std::{sync::Arc, time::Duration};

use chatgpt::client::ChatGPT;
use dotenv::dotenv;
use teloxide::{
    dispatching::dialogue::{ErasedStorage, InMemStorage, Storage},
    prelude::*,
};

use config::Settings;
use error::{AppError, Result};
use quiz::{
    ai_helper::QuizHelper,
    catalog::QuizCatalog,
    personality::{PersonalityQuiz, PersonalityRun},
    scramble::ScrambleChallenge,
    session::QuizSession,
    skills::Progress,
};

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Everything one logged-in chat owns. Dropped on logout.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Session {
    pub username: String,
    pub display_name: String,
    pub progress: Progress,
    /// AI quiz left through the menu, resumed without a new fetch if still unanswered.
    pub parked_ai_quiz: Option<QuizSession>,
    /// Skills detected by the personality quiz; empty until it is taken.
    pub interests: Vec<String>,
}

impl Session {
    pub fn new(username: String, display_name: String) -> Self {
        Self {
            username,
            display_name,
            progress: Progress::default(),
            parked_ai_quiz: None,
            interests: Vec::new(),
        }
    }
}

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    ReceiveUsername,
    ReceivePassword {
        username: String,
    },
    Menu {
        session: Session,
    },
    CatalogQuiz {
        session: Session,
        quiz: QuizSession,
    },
    AiQuiz {
        session: Session,
        quiz: QuizSession,
    },
    Scramble {
        session: Session,
        challenge: ScrambleChallenge,
    },
    Personality {
        session: Session,
        run: PersonalityRun,
    },
}

impl State {
    pub fn session(&self) -> Option<&Session> {
        match self {
            State::Start | State::ReceiveUsername | State::ReceivePassword { .. } => None,
            State::Menu { session }
            | State::CatalogQuiz { session, .. }
            | State::AiQuiz { session, .. }
            | State::Scramble { session, .. }
            | State::Personality { session, .. } => Some(session),
        }
    }
}

/// Shared, read-only services handed to every handler.
pub struct AppContext {
    pub settings: Settings,
    pub catalog: QuizCatalog,
    pub personality: PersonalityQuiz,
    pub helper: QuizHelper,
}

type SessionStorage = Arc<ErasedStorage<State>>;

#[tokio::main]
async fn main() {
    dotenv().ok();
    pretty_env_logger::init();
    log::info!("Starting STEM Quest bot...");

    if let Err(err) = run().await {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config_path =
        std::env::var("STEM_QUEST_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let settings = Settings::load(&config_path)?;
    log::info!(
        "Config loaded from {} ({} users, roadmap unlocks at {} XP)",
        config_path,
        settings.users.len(),
        settings.game.roadmap_unlock_xp
    );

    let catalog = QuizCatalog::load(&settings.game.catalog_path)?;
    log::info!("Quiz catalog loaded from {}", settings.game.catalog_path.display());

    let personality = PersonalityQuiz::load(&settings.game.personality_path)?;
    log::info!(
        "Personality quiz loaded from {} ({} questions)",
        settings.game.personality_path.display(),
        personality.len()
    );

    let chatgpt_api_key = std::env::var("CHATGPT_API_KEY")
        .map_err(|_| AppError::Config("CHATGPT_API_KEY is not set".into()))?;
    let gpt = {
        let mut gpt = ChatGPT::new(chatgpt_api_key)?;

        gpt.config.engine = settings.ai.chatgpt_engine()?;
        gpt.config.temperature = settings.ai.temperature;
        gpt.config.timeout = Duration::from_secs(settings.ai.timeout_secs);

        gpt
    };

    let token = std::env::var("TELOXIDE_TOKEN")
        .map_err(|_| AppError::Config("TELOXIDE_TOKEN is not set".into()))?;
    let bot = Bot::new(token);

    // Sessions live only as long as the process does.
    let storage: SessionStorage = InMemStorage::<State>::new().erase();

    let helper = QuizHelper::new(gpt, settings.game.reward_range());
    let ctx = Arc::new(AppContext {
        settings,
        catalog,
        personality,
        helper,
    });

    Dispatcher::builder(bot, handlers::schema())
        .dependencies(dptree::deps![storage, ctx])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Bot stopped");
    Ok(())
}
