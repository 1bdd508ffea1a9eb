use crate::api::ApiClient;
use crate::errors::{ClientError, ClientResult};
use crate::loading::LoadingIndicator;
use crate::models::{Contact, Filters, Goal, Habit, LifeArea, Task};
use crate::session::Session;
use crate::store::{LoadOutcome, ResourceStore};
use crate::surface::{Surface, ToastKind, View};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Keeps exactly one view visible. Every activation reloads the view's
/// collection and supersedes loads still pending for the other views.
pub struct ViewRouter {
    session: Arc<Session>,
    surface: Arc<dyn Surface>,
    active: Mutex<Option<View>>,
    areas: ResourceStore<LifeArea>,
    goals: ResourceStore<Goal>,
    habits: ResourceStore<Habit>,
    tasks: ResourceStore<Task>,
    contacts: ResourceStore<Contact>,
}

impl ViewRouter {
    pub fn new(
        api: ApiClient,
        session: Arc<Session>,
        surface: Arc<dyn Surface>,
        loading: Arc<LoadingIndicator>,
    ) -> Self {
        Self {
            areas: ResourceStore::new(api.clone(), surface.clone(), loading.clone()),
            goals: ResourceStore::new(api.clone(), surface.clone(), loading.clone()),
            habits: ResourceStore::new(api.clone(), surface.clone(), loading.clone()),
            tasks: ResourceStore::new(api.clone(), surface.clone(), loading.clone()),
            contacts: ResourceStore::new(api, surface.clone(), loading),
            session,
            surface,
            active: Mutex::new(None),
        }
    }

    pub async fn active(&self) -> Option<View> {
        *self.active.lock().await
    }

    pub async fn activate(&self, view: View) -> ClientResult<LoadOutcome> {
        self.activate_with(view, Filters::new()).await
    }

    /// Shows `view` and loads its collection with `filters`.
    pub async fn activate_with(&self, view: View, filters: Filters) -> ClientResult<LoadOutcome> {
        if !self.session.is_authenticated() {
            return Err(ClientError::validation(format!(
                "Sign in to open {}",
                view.as_str()
            )));
        }

        *self.active.lock().await = Some(view);
        self.surface.show_view(view);
        debug!(view = view.as_str(), "view activated");

        for other in View::ALL.into_iter().filter(|other| *other != view) {
            self.invalidate(other).await;
        }

        match view {
            View::Dashboard => self.areas.load(filters).await,
            View::Goals => self.goals.load(filters).await,
            View::Habits => self.habits.load(filters).await,
            View::Tasks => self.tasks.load(filters).await,
            View::Contacts => self.contacts.load(filters).await,
        }
    }

    /// Jumps straight to the dashboard; there is no history to pop.
    pub async fn back_to_dashboard(&self) -> ClientResult<LoadOutcome> {
        self.activate(View::Dashboard).await
    }

    /// Opens the goals view narrowed to one life area.
    pub async fn select_area(&self, area: &LifeArea) -> ClientResult<LoadOutcome> {
        self.surface
            .toast(&format!("Selected: {}", area.display_name), ToastKind::Success);
        self.activate_with(View::Goals, Filters::new().with("area_id", area.id))
            .await
    }

    /// Drops every cached collection and the active view.
    pub async fn reset(&self) {
        *self.active.lock().await = None;
        self.areas.clear().await;
        self.goals.clear().await;
        self.habits.clear().await;
        self.tasks.clear().await;
        self.contacts.clear().await;
        info!("cleared cached collections");
    }

    async fn invalidate(&self, view: View) {
        match view {
            View::Dashboard => self.areas.invalidate().await,
            View::Goals => self.goals.invalidate().await,
            View::Habits => self.habits.invalidate().await,
            View::Tasks => self.tasks.invalidate().await,
            View::Contacts => self.contacts.invalidate().await,
        }
    }

    pub fn areas(&self) -> &ResourceStore<LifeArea> {
        &self.areas
    }

    pub fn goals(&self) -> &ResourceStore<Goal> {
        &self.goals
    }

    pub fn habits(&self) -> &ResourceStore<Habit> {
        &self.habits
    }

    pub fn tasks(&self) -> &ResourceStore<Task> {
        &self.tasks
    }

    pub fn contacts(&self) -> &ResourceStore<Contact> {
        &self.contacts
    }
}
