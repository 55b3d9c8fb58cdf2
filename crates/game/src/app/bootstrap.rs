use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use town_engine::{resolve_app_paths, FileBlobStore, LoopConfig, Scene, StartupError};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::chat::{
    GeminiReplyService, HistoryStore, ReplyClientConfig, ReplyDispatcher, ReplyError,
    HISTORY_BLOB_KEY,
};
use super::town::TownScene;
use super::world::{load_world, WorldCompileError, WORLD_FILE_NAME};

/// Checked in order; the first non-blank value wins.
const API_KEY_ENV_VARS: [&str; 3] = ["ENGLISH_TOWN_API_KEY", "GEMINI_API_KEY", "API_KEY"];
const MODEL_ENV_VAR: &str = "ENGLISH_TOWN_MODEL";
const API_BASE_ENV_VAR: &str = "ENGLISH_TOWN_API_BASE";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const STORE_DIR_NAME: &str = "store";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("world content failed to compile: {0}")]
    World(#[from] WorldCompileError),
    #[error("reply client could not be created: {0}")]
    Reply(#[from] ReplyError),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GameConfig {
    pub(crate) api_key: Option<String>,
    pub(crate) model: String,
    pub(crate) api_base: String,
    pub(crate) request_timeout: Duration,
    pub(crate) history_key: String,
}

impl GameConfig {
    pub(crate) fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            api_key: API_KEY_ENV_VARS.into_iter().find_map(|name| non_blank(name)),
            model: non_blank(MODEL_ENV_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_base: non_blank(API_BASE_ENV_VAR).unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            request_timeout: REQUEST_TIMEOUT,
            history_key: HISTORY_BLOB_KEY.to_string(),
        }
    }

    pub(crate) fn credentials_ready(&self) -> bool {
        self.api_key.is_some()
    }

    fn reply_client_config(&self) -> ReplyClientConfig {
        ReplyClientConfig {
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            api_base: self.api_base.clone(),
            timeout: self.request_timeout,
        }
    }
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== English Town Startup ===");

    let paths = resolve_app_paths()?;
    info!(
        root = %paths.root.display(),
        content = %paths.base_content_dir.display(),
        cache = %paths.cache_dir.display(),
        "startup_paths"
    );

    let world = load_world(&paths.base_content_dir.join(WORLD_FILE_NAME))?;
    info!(
        maps = world.maps().len(),
        npcs = world.npcs().len(),
        "world_loaded"
    );

    let game_config = GameConfig::from_env();
    if !game_config.credentials_ready() {
        warn!(
            vars = %API_KEY_ENV_VARS.join(", "),
            "api_key_missing"
        );
    }
    info!(model = %game_config.model, api_base = %game_config.api_base, "reply_client_config");

    let store = FileBlobStore::new(paths.cache_dir.join(STORE_DIR_NAME));
    let history_store = HistoryStore::new(Box::new(store), game_config.history_key.clone());
    let service = GeminiReplyService::new(game_config.reply_client_config())?;
    let replies = ReplyDispatcher::new(Arc::new(service));

    let scene = TownScene::new(
        world,
        history_store,
        replies,
        game_config.credentials_ready(),
    );

    Ok(AppWiring {
        config: LoopConfig::default(),
        scene: Box::new(scene),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
