use crate::config::ClientConfig;
use crate::errors::{ClientError, ClientResult, FALLBACK_MESSAGE, extract_error_message};
use crate::models::{
    BirthdayInfo, CheckinReceipt, CheckinRequest, Contact, ContactDraft, ContactPatch, EntityId,
    Filters, Goal, GoalDraft, GoalPatch, Habit, HabitDraft, HabitPatch, LifeArea, LoginRequest,
    LoginResponse, MessageResponse, RegisterRequest, Task, TaskDraft, TaskPatch, User,
};
use reqwest::{Client, Method, Response, StatusCode, Url};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

/// A server collection reachable under a fixed list path.
pub trait Collection: DeserializeOwned + Send + 'static {
    /// List path, with trailing slash (`/api/goals/`).
    const PATH: &'static str;
}

/// A collection the client may create, update and delete items in.
pub trait Mutable: Collection {
    type Draft: Serialize + Send + Sync;
    type Patch: Serialize + Send + Sync;
}

impl Collection for LifeArea {
    const PATH: &'static str = "/api/areas/";
}

impl Collection for Goal {
    const PATH: &'static str = "/api/goals/";
}

impl Mutable for Goal {
    type Draft = GoalDraft;
    type Patch = GoalPatch;
}

impl Collection for Habit {
    const PATH: &'static str = "/api/habits/";
}

impl Mutable for Habit {
    type Draft = HabitDraft;
    type Patch = HabitPatch;
}

impl Collection for Task {
    const PATH: &'static str = "/api/tasks/";
}

impl Mutable for Task {
    type Draft = TaskDraft;
    type Patch = TaskPatch;
}

impl Collection for Contact {
    const PATH: &'static str = "/api/contacts/";
}

impl Mutable for Contact {
    type Draft = ContactDraft;
    type Patch = ContactPatch;
}

/// Outcome of the shared response handler.
#[derive(Debug)]
pub enum Reply<T> {
    Body(T),
    NoContent,
}

impl<T> Reply<T> {
    fn into_body(self) -> ClientResult<T> {
        match self {
            Self::Body(body) => Ok(body),
            Self::NoContent => Err(ClientError::Network("expected a response body".into())),
        }
    }
}

/// Normalizes every backend response. A 204 is `NoContent`, any other
/// success must carry JSON, and a failure status becomes
/// [`ClientError::Request`] with the message taken from the error body.
pub async fn handle_response<T: DeserializeOwned>(response: Response) -> ClientResult<Reply<T>> {
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return Ok(Reply::NoContent);
    }

    let body = response.bytes().await;
    if !status.is_success() {
        let message = body
            .as_deref()
            .map(extract_error_message)
            .unwrap_or_else(|_| FALLBACK_MESSAGE.to_string());
        return Err(ClientError::Request {
            status: status.as_u16(),
            message,
        });
    }

    let body = body.map_err(ClientError::network)?;
    serde_json::from_slice(&body)
        .map(Reply::Body)
        .map_err(|err| ClientError::Network(format!("malformed response body: {err}")))
}

/// HTTP client for the life-areas backend. The cookie store carries the
/// session credential set by login on every later call.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let mut builder = Client::builder().cookie_store(true);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        let mut base_url = config.base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { http, base_url })
    }

    /// Resolves `path` against the base origin and appends `filters` as a
    /// query string in the order supplied.
    pub fn endpoint(&self, path: &str, filters: &Filters) -> ClientResult<Url> {
        let mut url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| ClientError::validation(format!("invalid path `{path}`: {err}")))?;
        if !filters.is_empty() {
            url.query_pairs_mut().extend_pairs(filters.iter());
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        filters: &Filters,
        body: Option<serde_json::Value>,
    ) -> ClientResult<Reply<T>> {
        let url = self.endpoint(path, filters)?;
        debug!(%method, %url, "sending request");

        let mut request = self.http.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|err| {
            warn!(%method, %url, "request failed before a response: {err}");
            ClientError::network(err)
        })?;

        let status = response.status();
        let reply = handle_response(response).await;
        match &reply {
            Ok(_) => debug!(%method, %url, status = status.as_u16(), "request succeeded"),
            Err(err) => warn!(%method, %url, status = status.as_u16(), "request failed: {err}"),
        }
        reply
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, filters: &Filters) -> ClientResult<T> {
        self.send(Method::GET, path, filters, None)
            .await?
            .into_body()
    }

    async fn write<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &impl Serialize,
    ) -> ClientResult<T> {
        let body = serde_json::to_value(body)
            .map_err(|err| ClientError::validation(format!("unserializable request body: {err}")))?;
        self.send(method, path, &Filters::new(), Some(body))
            .await?
            .into_body()
    }

    // ==================== auth ====================

    pub async fn register(&self, request: &RegisterRequest) -> ClientResult<User> {
        self.write(Method::POST, "/api/auth/register", request).await
    }

    pub async fn login(&self, request: &LoginRequest) -> ClientResult<LoginResponse> {
        self.write(Method::POST, "/api/auth/login", request).await
    }

    pub async fn logout(&self) -> ClientResult<MessageResponse> {
        match self
            .send(Method::POST, "/api/auth/logout", &Filters::new(), None)
            .await?
        {
            Reply::Body(body) => Ok(body),
            Reply::NoContent => Ok(MessageResponse::default()),
        }
    }

    pub async fn current_user(&self) -> ClientResult<User> {
        self.get("/api/auth/me", &Filters::new()).await
    }

    // ==================== collections ====================

    pub async fn list<R: Collection>(&self, filters: &Filters) -> ClientResult<Vec<R>> {
        self.get(R::PATH, filters).await
    }

    pub async fn create<R: Mutable>(&self, draft: &R::Draft) -> ClientResult<R> {
        self.write(Method::POST, R::PATH, draft).await
    }

    pub async fn update<R: Mutable>(&self, id: EntityId, patch: &R::Patch) -> ClientResult<R> {
        self.write(Method::PUT, &item_path(R::PATH, id), patch).await
    }

    /// Deletes one item. Success is `true` whether the server answers 204
    /// or a JSON body, which is discarded.
    pub async fn delete<R: Mutable>(&self, id: EntityId) -> ClientResult<bool> {
        let path = item_path(R::PATH, id);
        self.send::<serde_json::Value>(Method::DELETE, &path, &Filters::new(), None)
            .await?;
        Ok(true)
    }

    pub async fn life_areas(&self) -> ClientResult<Vec<LifeArea>> {
        self.list::<LifeArea>(&Filters::new()).await
    }

    pub async fn checkin_habit(
        &self,
        id: EntityId,
        request: &CheckinRequest,
    ) -> ClientResult<CheckinReceipt> {
        let path = format!("{}/checkin", item_path(Habit::PATH, id));
        self.write(Method::POST, &path, request).await
    }

    pub async fn contact_birthday(&self, id: EntityId) -> ClientResult<BirthdayInfo> {
        let path = format!("{}/birthday", item_path(Contact::PATH, id));
        self.get(&path, &Filters::new()).await
    }
}

fn item_path(collection: &str, id: EntityId) -> String {
    format!("{collection}{id}")
}
