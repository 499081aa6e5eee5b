use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventBus;
use crate::token::TokenKeys;
use crate::upload::{CdnClient, UploadDisabled, Uploader};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<AppConfig>,
    pub keys: TokenKeys,
    pub uploader: Arc<dyn Uploader>,
    pub events: Arc<EventBus>,
}

impl AppState {
    pub fn new(pool: DbPool, config: AppConfig) -> Self {
        let keys = TokenKeys::new(&config.jwt_secret);
        let uploader: Arc<dyn Uploader> = match &config.cdn_upload_url {
            Some(endpoint) => Arc::new(CdnClient::new(endpoint.clone(), config.cdn_api_key.clone())),
            None => Arc::new(UploadDisabled),
        };
        Self {
            pool,
            config: Arc::new(config),
            keys,
            uploader,
            events: Arc::new(EventBus::new()),
        }
    }
}
