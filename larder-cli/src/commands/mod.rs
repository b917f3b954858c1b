mod config_cmd;
mod food;
mod household;
mod receipt;
mod shopping;
mod watch;

pub use config_cmd::ConfigCommand;
pub use food::FoodCommand;
pub use household::HouseholdCommand;
pub use receipt::ReceiptCommand;
pub use shopping::ShoppingCommand;
pub use watch::WatchCommand;

use std::sync::Arc;

use clap::ValueEnum;

use larder_core::{
    ApiError, Assistant, DataApi, FileStore, HttpAssistant, RestApi, Session, ShoppingSync,
    WsChannel,
};

use crate::config::Config;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Authenticated backend connection plus the session it resolved.
pub struct AppContext {
    pub api: Arc<dyn DataApi>,
    pub session: Session,
}

impl AppContext {
    pub async fn connect(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        let (Some(api_key), Some(token)) = (&config.auth.api_key, &config.auth.access_token)
        else {
            return Err(
                "Not signed in. Set auth.api_key and auth.access_token in the config file, \
                 or LARDER_API_KEY / LARDER_ACCESS_TOKEN in the environment."
                    .into(),
            );
        };
        let api: Arc<dyn DataApi> =
            Arc::new(RestApi::new(&config.backend_url.value, api_key, token));
        let session = Session::load(api.as_ref()).await?;
        Ok(Self { api, session })
    }
}

/// Build the shopping hook wired to the backend, the push channel, and the
/// per-device store, with lists already loaded.
pub async fn shopping_sync(
    ctx: &AppContext,
    config: &Config,
) -> Result<ShoppingSync, Box<dyn std::error::Error>> {
    let api_key = config.auth.api_key.clone().unwrap_or_default();
    let push = Arc::new(WsChannel::new(&config.backend_url.value, &api_key));
    let kv = Box::new(FileStore::in_data_dir(&config.data_dir.value));
    let mut sync = ShoppingSync::new(
        Arc::clone(&ctx.api),
        push,
        kv,
        ctx.session.user_id(),
        ctx.session.household_id(),
    );
    sync.load_lists().await?;
    Ok(sync)
}

/// Build the assistant client, or explain how to configure one.
pub fn assistant(config: &Config) -> Result<Arc<dyn Assistant>, Box<dyn std::error::Error>> {
    let (Some(url), Some(key)) = (&config.assistant.url, &config.assistant.api_key) else {
        return Err(
            "No assistant configured. Set assistant.url and assistant.api_key in the config \
             file, or LARDER_ASSISTANT_URL / LARDER_ASSISTANT_KEY in the environment."
                .into(),
        );
    };
    Ok(Arc::new(HttpAssistant::new(url, key)))
}

/// Banner for a failed mutation: the hook's error slot carries the message
/// shown to the user, falling back to the raw error.
pub fn slot_err(slot: Option<&str>, e: ApiError) -> Box<dyn std::error::Error> {
    match slot {
        Some(s) => s.to_string().into(),
        None => Box::new(e),
    }
}
