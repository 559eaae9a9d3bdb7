use std::sync::Arc;

use crate::interview::controller::SessionController;
use crate::interview::registry::SessionRegistry;
use crate::interview::turn::TurnProcessor;
use crate::store::InterviewStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn InterviewStore>,
    /// Stateless turn pipeline for callers that keep their own history.
    pub turns: TurnProcessor,
    pub controller: SessionController,
    /// Sessions started and driven by the server.
    pub registry: SessionRegistry,
}

impl AppState {
    pub fn new(store: Arc<dyn InterviewStore>, turns: TurnProcessor, controller: SessionController) -> Self {
        Self {
            store,
            turns,
            registry: SessionRegistry::new(controller.clone()),
            controller,
        }
    }
}
