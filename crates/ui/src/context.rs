use std::sync::Arc;

use exam_core::model::TestMode;
use services::attempts::{AttemptLoopService, ResultService};

/// Capabilities the composition root hands to the UI.
pub trait UiApp: Send + Sync {
    fn mode(&self) -> TestMode;
    fn attempt_loop(&self) -> Arc<AttemptLoopService>;
    fn results(&self) -> Arc<ResultService>;
}

#[derive(Clone)]
pub struct AppContext {
    mode: TestMode,
    attempt_loop: Arc<AttemptLoopService>,
    results: Arc<ResultService>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            mode: app.mode(),
            attempt_loop: app.attempt_loop(),
            results: app.results(),
        }
    }

    /// Scoring mode for every attempt this session starts.
    #[must_use]
    pub fn mode(&self) -> TestMode {
        self.mode
    }

    #[must_use]
    pub fn attempt_loop(&self) -> Arc<AttemptLoopService> {
        Arc::clone(&self.attempt_loop)
    }

    #[must_use]
    pub fn results(&self) -> Arc<ResultService> {
        Arc::clone(&self.results)
    }
}

// This context is provided by the application composition root (`crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
