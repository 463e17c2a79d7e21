//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by the REST API.
//! Services are generic over repository traits, but AppState pins them to
//! the concrete SQLite implementations.

use std::path::PathBuf;
use std::sync::Arc;

use parley_core::chat::history::HistoryService;
use parley_core::chat::messaging::MessagingService;
use parley_core::chat::reply::TemplateReplyGenerator;
use parley_core::chat::session::SessionService;
use parley_infra::config::{load_global_config, resolve_data_dir};
use parley_infra::sqlite::chat::SqliteChatRepository;
use parley_infra::sqlite::pool::DatabasePool;
use parley_infra::sqlite::quota::SqliteQuotaRepository;
use parley_types::config::GlobalConfig;

/// Concrete type aliases for the service generics pinned to infra
/// implementations.
pub type ConcreteSessionService = SessionService<SqliteChatRepository, SqliteQuotaRepository>;

pub type ConcreteMessagingService =
    MessagingService<SqliteChatRepository, SqliteQuotaRepository, TemplateReplyGenerator>;

pub type ConcreteHistoryService = HistoryService<SqliteChatRepository, SqliteQuotaRepository>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub session_service: Arc<ConcreteSessionService>,
    pub messaging_service: Arc<ConcreteMessagingService>,
    pub history_service: Arc<ConcreteHistoryService>,
    pub config: GlobalConfig,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: connect to DB, load config, wire
    /// services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        // Initialize database
        let db_url = format!("sqlite://{}?mode=rwc", data_dir.join("parley.db").display());
        let db_pool = DatabasePool::new(&db_url).await?;

        let config = load_global_config(&data_dir).await;

        // Each service owns its repository instances; they all share the
        // same underlying pool.
        let session_service = SessionService::new(
            SqliteChatRepository::new(db_pool.clone()),
            SqliteQuotaRepository::new(db_pool.clone()),
            config.clone(),
        );

        let messaging_service = MessagingService::new(
            SqliteChatRepository::new(db_pool.clone()),
            SqliteQuotaRepository::new(db_pool.clone()),
            TemplateReplyGenerator::new(),
            config.message_limit,
        );

        let history_service = HistoryService::new(
            SqliteChatRepository::new(db_pool.clone()),
            SqliteQuotaRepository::new(db_pool.clone()),
        );

        Ok(Self {
            session_service: Arc::new(session_service),
            messaging_service: Arc::new(messaging_service),
            history_service: Arc::new(history_service),
            config,
            data_dir,
            db_pool,
        })
    }
}
