use crate::assistant::{AssistantBackend, HttpAssistant, Prompts};
use crate::catalog::{CatalogSource, source_for};
use crate::chat::{AssistantRequest, Submission};
use crate::config::AppConfig;
use crate::state::AppState;
use crate::storage::{FileStore, KeyValueStore};
use crate::view::{AppView, UiAction};
use std::sync::Arc;
use tracing::warn;

/// Application state wired to a catalog source and an assistant backend.
///
/// Handlers take `&mut self`, so assistant requests from one app are
/// naturally processed one after another.
pub struct RoutineApp<K> {
    state: AppState<K>,
    catalog: Arc<dyn CatalogSource>,
    assistant: Arc<dyn AssistantBackend>,
}

impl RoutineApp<FileStore> {
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            FileStore::new(config.storage_dir.clone()),
            Prompts::for_brand(&config.brand),
            source_for(&config.catalog, config.catalog_timeout),
            Arc::new(HttpAssistant::new(&config.assistant)),
        )
    }
}

impl<K: KeyValueStore> RoutineApp<K> {
    pub fn new(
        store: K,
        prompts: Prompts,
        catalog: Arc<dyn CatalogSource>,
        assistant: Arc<dyn AssistantBackend>,
    ) -> Self {
        Self {
            state: AppState::new(store, prompts),
            catalog,
            assistant,
        }
    }

    pub fn state(&self) -> &AppState<K> {
        &self.state
    }

    pub fn view(&self) -> AppView {
        self.state.render()
    }

    pub async fn select_category(&mut self, category: &str) {
        if self.state.select_category(category) {
            let result = self.catalog.fetch().await;
            self.state.catalog_loaded(result);
        }
    }

    pub fn set_search_term(&mut self, term: &str) {
        self.state.set_search_term(term);
    }

    pub fn apply(&mut self, action: UiAction) {
        self.state.apply(action);
    }

    pub async fn send_chat(&mut self, text: &str) {
        let submission = self.state.submit_chat(text);
        self.drive(submission).await;
    }

    pub async fn generate_routine(&mut self) {
        match self.state.submit_routine() {
            Ok(submission) => self.drive(submission).await,
            Err(err) => warn!(error = %err, "could not build routine request"),
        }
    }

    async fn drive(&mut self, submission: Submission) {
        let mut next = match submission {
            Submission::Dispatch(request) => Some(request),
            Submission::Queued | Submission::Ignored | Submission::EmptySelection => None,
        };
        while let Some(AssistantRequest {
            ticket, messages, ..
        }) = next
        {
            let outcome = self.assistant.complete(&messages).await;
            next = self.state.chat_mut().finish(ticket, outcome);
        }
    }
}
