// Transport and storage wiring for CLI commands

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use parley_client::{ClientConfig, FileKeyValueStore, HttpRunApi};
use parley_core::{ConversationScope, RunPointers, SyncConfig, SyncController};

pub struct Client {
    config: ClientConfig,
    api: Arc<HttpRunApi>,
    store: Arc<FileKeyValueStore>,
}

impl Client {
    /// Environment configuration with command-line overrides applied on top
    pub fn new(
        api_url: Option<&str>,
        api_key: Option<&str>,
        data_dir: Option<&Path>,
    ) -> Result<Self> {
        let mut config = ClientConfig::from_env();
        if let Some(url) = api_url {
            config = config.with_api_url(url);
        }
        if let Some(key) = api_key {
            config = config.with_api_key(key);
        }
        if let Some(dir) = data_dir {
            config = config.with_data_dir(dir);
        }

        let api = HttpRunApi::new(&config).context("invalid API configuration")?;
        let store = FileKeyValueStore::in_dir(&config.data_dir);
        tracing::debug!(api_url = %config.api_url, store = %store.path().display(), "Client configured");

        Ok(Self {
            config,
            api: Arc::new(api),
            store: Arc::new(store),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.config.api_url
    }

    pub fn pointers(&self) -> RunPointers {
        RunPointers::new(self.store.clone())
    }

    /// Controller opened on `scope`, with its stored run resumed
    pub async fn open(&self, scope: ConversationScope) -> Result<SyncController> {
        let controller = SyncController::new(
            self.api.clone(),
            self.store.clone(),
            SyncConfig::from_env(),
        )?;
        controller
            .open(scope)
            .await
            .with_context(|| format!("failed to open conversation via {}", self.api_url()))?;
        Ok(controller)
    }
}
