use crate::cdp::CdpClient;
use crate::eval::{self, EvalSettings};
use async_trait::async_trait;
use formsense_engine::backend::{Backend, BackendError, Evaluation, NavigationResult, ScriptBridge};
use formsense_engine::config::EngineConfig;
use tracing::info;

pub struct HeadlessBackend {
    client: Option<CdpClient>,
    visible: bool,
    settings: EvalSettings,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::new_with_visibility(false)
    }

    pub fn new_with_visibility(visible: bool) -> Self {
        Self {
            client: None,
            visible,
            settings: EvalSettings::default(),
        }
    }

    /// Evaluation timeout and context retries come from the engine config.
    pub fn with_config(mut self, config: &EngineConfig) -> Self {
        self.settings = EvalSettings::from(config);
        self
    }

    pub fn get_client(&self) -> Option<&CdpClient> {
        self.client.as_ref()
    }

    async fn navigation_result(page: &chromiumoxide::Page) -> Result<NavigationResult, BackendError> {
        let title = page
            .get_title()
            .await
            .unwrap_or_default()
            .unwrap_or_default();
        let url = page
            .url()
            .await
            .map_err(|e| BackendError::Navigation(e.to_string()))?
            .unwrap_or_default();
        Ok(NavigationResult {
            url,
            title,
            status: 200,
        })
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScriptBridge for HeadlessBackend {
    async fn evaluate(&mut self, script: &str) -> Result<Evaluation, BackendError> {
        let client = self.client.as_ref().ok_or(BackendError::NotReady)?;
        eval::evaluate(&client.page, script, &self.settings).await
    }
}

#[async_trait]
impl Backend for HeadlessBackend {
    async fn launch(&mut self) -> Result<(), BackendError> {
        info!(visible = self.visible, "launching Chromium");
        let client = CdpClient::launch(self.visible)
            .await
            .map_err(|e| BackendError::Other(e.to_string()))?;
        self.client = Some(client);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        if let Some(client) = self.client.take() {
            client
                .close()
                .await
                .map_err(|e| BackendError::Other(e.to_string()))?;
        }
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError> {
        let client = self.client.as_mut().ok_or(BackendError::NotReady)?;

        info!(%url, "navigating");
        client
            .page
            .goto(url)
            .await
            .map_err(|e| BackendError::Navigation(e.to_string()))?;

        Self::navigation_result(&client.page).await
    }
}
