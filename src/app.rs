use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::errors::ClientResult;
use crate::loading::LoadingIndicator;
use crate::router::ViewRouter;
use crate::session::{Session, SessionController};
use crate::surface::Surface;
use std::sync::Arc;

/// Composition root: one API client, one session, one router and the
/// shared loading indicator, all rendering to the same surface.
pub struct App {
    api: ApiClient,
    loading: Arc<LoadingIndicator>,
    router: Arc<ViewRouter>,
    session: SessionController,
}

impl App {
    pub fn new(config: &ClientConfig, surface: Arc<dyn Surface>) -> ClientResult<Self> {
        let api = ApiClient::new(config)?;
        let loading = LoadingIndicator::new(surface.clone());
        let state = Session::new();
        let router = Arc::new(ViewRouter::new(
            api.clone(),
            state.clone(),
            surface.clone(),
            loading.clone(),
        ));
        let session = SessionController::new(
            api.clone(),
            state,
            router.clone(),
            surface,
            loading.clone(),
        );

        Ok(Self {
            api,
            loading,
            router,
            session,
        })
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn loading(&self) -> &LoadingIndicator {
        &self.loading
    }

    pub fn router(&self) -> &ViewRouter {
        &self.router
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }
}
