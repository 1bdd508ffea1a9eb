//! Read-through cache for one server collection.
//!
//! Every successful mutation is followed by a full reload, so the cached
//! items are always a literal server snapshot. Each `load` takes a
//! generation token; a response whose token is no longer current is
//! dropped without touching the cache or the rendered view. A store the
//! router has moved away from is detached: the resync after a mutation is
//! skipped until the next explicit `load` attaches it again.

use crate::api::{ApiClient, Collection, Mutable};
use crate::errors::{ClientError, ClientResult};
use crate::loading::LoadingIndicator;
use crate::models::{EntityId, Filters};
use crate::surface::{Surface, ToastKind, View};
use crate::views::{ListView, ViewModel};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// A collection with a view of its own.
pub trait Resource: Collection + Clone + Sync {
    type Card: Clone + Send + Sync + 'static + for<'a> From<&'a Self>;

    const VIEW: View;
    /// Capitalized item noun used in toasts ("Goal").
    const SINGULAR: &'static str;
    /// Lowercase collection noun ("goals").
    const PLURAL: &'static str;
    const EMPTY_MESSAGE: &'static str;
    /// What a failed load toast names ("Error loading goals").
    const LOAD_SUBJECT: &'static str = Self::PLURAL;

    fn id(&self) -> EntityId;
    fn view_model(list: ListView<Self::Card>) -> ViewModel;
}

/// Client-side checks run before a request is issued.
pub trait Validate {
    fn validate(&self) -> ClientResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response replaced the cache; carries the item count.
    Applied(usize),
    /// A newer load or a view switch superseded this one.
    Stale,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Mutation {
    Create,
    Update,
    Delete,
    Checkin,
}

impl Mutation {
    fn verb(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Checkin => "check in",
        }
    }

    fn past(self) -> &'static str {
        match self {
            Self::Create => "created",
            Self::Update => "updated",
            Self::Delete => "deleted",
            Self::Checkin => "checked in",
        }
    }
}

struct StoreState<R: Resource> {
    items: Vec<R>,
    view: ListView<R::Card>,
    filters: Filters,
    generation: u64,
    detached: bool,
}

pub struct ResourceStore<R: Resource> {
    api: ApiClient,
    surface: Arc<dyn Surface>,
    loading: Arc<LoadingIndicator>,
    state: Mutex<StoreState<R>>,
}

impl<R: Resource> ResourceStore<R> {
    pub fn new(api: ApiClient, surface: Arc<dyn Surface>, loading: Arc<LoadingIndicator>) -> Self {
        Self {
            api,
            surface,
            loading,
            state: Mutex::new(StoreState {
                items: Vec::new(),
                view: ListView::Pending,
                filters: Filters::new(),
                generation: 0,
                detached: false,
            }),
        }
    }

    /// Cached items in server order.
    pub async fn items(&self) -> Vec<R> {
        self.state.lock().await.items.clone()
    }

    pub async fn find(&self, id: EntityId) -> Option<R> {
        self.state
            .lock()
            .await
            .items
            .iter()
            .find(|item| item.id() == id)
            .cloned()
    }

    pub async fn view(&self) -> ListView<R::Card> {
        self.state.lock().await.view.clone()
    }

    pub async fn filters(&self) -> Filters {
        self.state.lock().await.filters.clone()
    }

    /// Supersedes any load in flight and detaches the store from its view.
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        state.generation += 1;
        state.detached = true;
    }

    /// Empties the cache and supersedes any load in flight.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.generation += 1;
        state.detached = true;
        state.items.clear();
        state.view = ListView::Pending;
        state.filters = Filters::new();
    }

    /// Fetches the collection and replaces the cache wholesale. Filters are
    /// forwarded to the server as given.
    pub async fn load(&self, filters: Filters) -> ClientResult<LoadOutcome> {
        let token = {
            let mut state = self.state.lock().await;
            state.generation += 1;
            state.detached = false;
            state.filters = filters.clone();
            state.generation
        };
        self.fetch(token, filters).await
    }

    /// Reloads with the filters of the most recent `load`, unless the store
    /// was detached since.
    async fn resync(&self) -> ClientResult<LoadOutcome> {
        let (token, filters) = {
            let mut state = self.state.lock().await;
            if state.detached {
                debug!(collection = R::PLURAL, "view inactive, skipping resync");
                return Ok(LoadOutcome::Stale);
            }
            state.generation += 1;
            (state.generation, state.filters.clone())
        };
        self.fetch(token, filters).await
    }

    async fn fetch(&self, token: u64, filters: Filters) -> ClientResult<LoadOutcome> {
        let _loading = self.loading.acquire();
        let result = self.api.list::<R>(&filters).await;

        let mut state = self.state.lock().await;
        if state.generation != token {
            debug!(
                collection = R::PLURAL,
                token,
                current = state.generation,
                "discarding stale load"
            );
            return Ok(LoadOutcome::Stale);
        }

        match result {
            Ok(items) => {
                let cards = items.iter().map(<R::Card as From<&R>>::from).collect();
                state.view = ListView::from_cards(cards, R::EMPTY_MESSAGE);
                state.items = items;
                self.surface.render(R::VIEW, &R::view_model(state.view.clone()));
                debug!(collection = R::PLURAL, count = state.items.len(), "collection loaded");
                Ok(LoadOutcome::Applied(state.items.len()))
            }
            Err(err) => {
                warn!(collection = R::PLURAL, "load failed: {err}");
                state.view = ListView::Unavailable {
                    title: format!("{} unavailable", capitalize(R::PLURAL)),
                    message: err.user_message(),
                };
                self.surface.render(R::VIEW, &R::view_model(state.view.clone()));
                self.surface
                    .toast(&format!("Error loading {}", R::LOAD_SUBJECT), ToastKind::Error);
                Err(err)
            }
        }
    }

    /// Reports a mutation result; on success resynchronizes the cache.
    pub(crate) async fn settle<T>(
        &self,
        mutation: Mutation,
        result: ClientResult<T>,
        success_message: impl FnOnce(&T) -> String,
    ) -> ClientResult<T> {
        match result {
            Ok(value) => {
                if let Err(err) = self.resync().await {
                    debug!(
                        collection = R::PLURAL,
                        "reload after {} failed: {err}",
                        mutation.verb()
                    );
                }
                self.surface.toast(&success_message(&value), ToastKind::Success);
                Ok(value)
            }
            Err(err) => {
                warn!(collection = R::PLURAL, "{} failed: {err}", mutation.verb());
                self.surface.toast(
                    &format!(
                        "Could not {} {}: {}",
                        mutation.verb(),
                        R::SINGULAR.to_lowercase(),
                        err.user_message()
                    ),
                    ToastKind::Error,
                );
                Err(err)
            }
        }
    }

    pub(crate) async fn guarded<T>(
        &self,
        check: ClientResult<()>,
        request: impl Future<Output = ClientResult<T>>,
    ) -> ClientResult<T> {
        check?;
        let _loading = self.loading.acquire();
        request.await
    }

    pub(crate) fn api(&self) -> &ApiClient {
        &self.api
    }

    pub(crate) fn surface(&self) -> &dyn Surface {
        self.surface.as_ref()
    }

    pub(crate) fn loading(&self) -> &Arc<LoadingIndicator> {
        &self.loading
    }
}

impl<R> ResourceStore<R>
where
    R: Resource + Mutable,
    R::Draft: Validate,
    R::Patch: Validate,
{
    pub async fn create(&self, draft: &R::Draft) -> ClientResult<R> {
        let result = self
            .guarded(draft.validate(), self.api.create::<R>(draft))
            .await;
        self.settle(Mutation::Create, result, |_| {
            format!("{} {}", R::SINGULAR, Mutation::Create.past())
        })
        .await
    }

    pub async fn update(&self, id: EntityId, patch: &R::Patch) -> ClientResult<R> {
        let result = self
            .guarded(patch.validate(), self.api.update::<R>(id, patch))
            .await;
        self.settle(Mutation::Update, result, |_| {
            format!("{} {}", R::SINGULAR, Mutation::Update.past())
        })
        .await
    }

    pub async fn delete(&self, id: EntityId) -> ClientResult<bool> {
        let result = self.guarded(Ok(()), self.api.delete::<R>(id)).await;
        self.settle(Mutation::Delete, result, |_| {
            format!("{} {}", R::SINGULAR, Mutation::Delete.past())
        })
        .await
    }
}

pub(crate) fn require(value: &str, field: &str) -> ClientResult<()> {
    if value.trim().is_empty() {
        return Err(ClientError::validation(format!("{field} is required")));
    }
    Ok(())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
