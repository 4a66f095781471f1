use log::{error, info, warn};

use super::client::{ChatMessage, ChatRequest, CompletionClient};
use super::error::CompletionError;
use super::prompt::{build_context, system_prompt, user_prompt};
use super::report::{format_report_for_display, EMPTY_COMPLETION_PLACEHOLDER};
use crate::macro_config::MacroConfig;
use crate::market::{MetricsSet, PriceTable};

pub const TEMPERATURE: f32 = 0.3;

pub struct MacroStrategist<C> {
    config: MacroConfig,
    client: C,
}

impl<C: CompletionClient> MacroStrategist<C> {
    pub fn new(config: MacroConfig, client: C) -> Self {
        info!("Initializing macro strategist (model={})", config.model);
        Self { config, client }
    }

    pub fn build_request(&self, metrics: &MetricsSet, recent: &PriceTable) -> ChatRequest {
        let context = build_context(metrics, &self.config);
        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(system_prompt(&self.config)),
                ChatMessage::user(user_prompt(&context, recent)),
            ],
            temperature: TEMPERATURE,
            stream: false,
        }
    }

    /// Asks the model for a report. `None` when the call itself failed; an
    /// empty completion yields a placeholder text instead.
    pub async fn generate_strategy_report(
        &self,
        metrics: &MetricsSet,
        recent: &PriceTable,
    ) -> Option<String> {
        info!("🧠 Requesting macro analysis from {}", self.config.model);
        let request = self.build_request(metrics, recent);

        match self.request_content(&request).await {
            Ok(Some(content)) => {
                info!("✅ Analysis complete");
                Some(content)
            }
            Ok(None) => {
                warn!("Completion returned no content");
                Some(EMPTY_COMPLETION_PLACEHOLDER.to_string())
            }
            Err(e) => {
                error!("Completion API call failed: {}", e);
                None
            }
        }
    }

    async fn request_content(&self, request: &ChatRequest) -> Result<Option<String>, CompletionError> {
        let response = self.client.complete(request).await?;
        Ok(response.first_content()?.map(str::to_string))
    }

    pub fn format_report_for_display(&self, raw_report: Option<&str>, metrics: &MetricsSet) -> String {
        format_report_for_display(raw_report, metrics)
    }
}
