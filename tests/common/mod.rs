#![allow(dead_code)]

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use life_client::{App, ClientConfig, RecordingSurface};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

pub const USERNAME: &str = "sam";
pub const PASSWORD: &str = "correct-horse";

const AREAS: [(&str, &str, Option<&str>); 8] = [
    ("physical_health", "Physical Health", Some("💪")),
    ("hobby", "Hobby", Some("🎨")),
    ("income_expenses", "Income & Expenses", Some("💵")),
    ("assets_liabilities", "Assets & Liabilities", Some("🏦")),
    ("one_on_one", "One on One", Some("🤝")),
    ("family_friends", "Family & Friends", Some("👪")),
    ("politics", "Politics", Some("🏛")),
    ("spiritual", "Spiritual", None),
];

struct MockUser {
    id: i64,
    username: String,
    email: String,
    full_name: String,
    password: String,
}

impl MockUser {
    fn json(&self) -> Value {
        json!({
            "id": self.id,
            "username": self.username,
            "email": self.email,
            "full_name": self.full_name,
            "created_at": "2026-01-05T09:30:00.000001"
        })
    }
}

#[derive(Default)]
struct Inner {
    users: Vec<MockUser>,
    collections: HashMap<String, Vec<Value>>,
    next_id: i64,
    delays: HashMap<String, Duration>,
    failures: HashMap<String, (StatusCode, String)>,
    calls: Vec<String>,
}

/// In-memory stand-in for the life-areas backend. Keys for delays and
/// failures are `"<METHOD> <path>"`, e.g. `"GET /api/goals/"`.
#[derive(Clone)]
pub struct Backend {
    inner: Arc<Mutex<Inner>>,
}

impl Backend {
    pub fn new() -> Self {
        let mut inner = Inner {
            next_id: 100,
            ..Inner::default()
        };
        let areas = AREAS
            .iter()
            .enumerate()
            .map(|(index, (name, display_name, icon))| {
                json!({
                    "id": index as i64 + 1,
                    "name": name,
                    "display_name": display_name,
                    "description": format!("Everything about {display_name}"),
                    "icon": icon,
                })
            })
            .collect();
        inner.collections.insert("areas".into(), areas);
        inner.users.push(MockUser {
            id: 1,
            username: USERNAME.into(),
            email: "sam@example.test".into(),
            full_name: "Sam Rivera".into(),
            password: PASSWORD.into(),
        });
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    pub fn seed(&self, kind: &str, items: Vec<Value>) {
        let mut inner = self.lock();
        let items = items
            .into_iter()
            .map(|item| inner.complete(kind, item))
            .collect();
        inner.collections.insert(kind.into(), items);
    }

    pub fn delay(&self, key: &str, delay: Duration) {
        self.lock().delays.insert(key.into(), delay);
    }

    pub fn fail(&self, key: &str, status: u16, body: &str) {
        self.lock()
            .failures
            .insert(key.into(), (StatusCode::from_u16(status).unwrap(), body.into()));
    }

    pub fn heal(&self, key: &str) {
        self.lock().failures.remove(key);
    }

    /// Every request received, as `"<METHOD> <path>[?query]"`.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn collection(&self, kind: &str) -> Vec<Value> {
        self.lock().collections.get(kind).cloned().unwrap_or_default()
    }

    pub fn has_user(&self, username: &str) -> bool {
        self.lock().users.iter().any(|user| user.username == username)
    }
}

impl Inner {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn area(&self, id: &Value) -> Option<Value> {
        self.collections
            .get("areas")?
            .iter()
            .find(|area| area["id"] == *id)
            .cloned()
    }

    /// Fills the server-side defaults and expands area ids into areas.
    fn complete(&mut self, kind: &str, item: Value) -> Value {
        let mut item = match item {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        if !item.contains_key("id") {
            let id = self.allocate_id();
            item.insert("id".into(), json!(id));
        }
        let defaults = match kind {
            "goals" => json!({ "status": "not_started", "progress_percentage": 0 }),
            "habits" => json!({
                "current_streak": 0,
                "longest_streak": 0,
                "last_checkin_date": null,
            }),
            "tasks" => json!({ "status": "todo", "priority": "medium" }),
            _ => json!({}),
        };
        if let Value::Object(defaults) = defaults {
            for (key, value) in defaults {
                item.entry(key).or_insert(value);
            }
        }
        self.attach_areas(&mut item);
        Value::Object(item)
    }

    fn attach_areas(&self, item: &mut Map<String, Value>) {
        if let Some(Value::Array(ids)) = item.remove("area_ids") {
            let areas: Vec<Value> = ids.iter().filter_map(|id| self.area(id)).collect();
            item.insert("areas".into(), Value::Array(areas));
        }
        if let Some(id) = item.remove("area_id") {
            if let Some(area) = self.area(&id) {
                item.insert("area".into(), area);
            }
        }
    }

    fn find_mut(&mut self, kind: &str, id: &str) -> Option<&mut Value> {
        let id: i64 = id.parse().ok()?;
        self.collections
            .get_mut(kind)?
            .iter_mut()
            .find(|item| item["id"] == json!(id))
    }

    fn route(
        &mut self,
        method: &Method,
        path: &str,
        body: Value,
        session: Option<i64>,
    ) -> Response {
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        match (method.as_str(), segments.as_slice()) {
            ("POST", ["api", "auth", "register"]) => return self.register(body),
            ("POST", ["api", "auth", "login"]) => return self.login(body),
            ("POST", ["api", "auth", "logout"]) => {
                return (
                    StatusCode::OK,
                    [(header::SET_COOKIE, "session=; Max-Age=0; Path=/")],
                    Json(json!({ "message": "Logged out successfully" })),
                )
                    .into_response();
            }
            _ => {}
        }

        let Some(user) = session.and_then(|id| self.users.iter().find(|user| user.id == id)) else {
            return error(StatusCode::UNAUTHORIZED, "Not authenticated");
        };

        match (method.as_str(), segments.as_slice()) {
            ("GET", ["api", "auth", "me"]) => Json(user.json()).into_response(),
            ("GET", ["api", kind, ""]) => {
                Json(self.collections.get(*kind).cloned().unwrap_or_default()).into_response()
            }
            ("POST", ["api", kind, ""]) => {
                let item = self.complete(kind, body);
                self.collections
                    .entry(kind.to_string())
                    .or_default()
                    .push(item.clone());
                (StatusCode::CREATED, Json(item)).into_response()
            }
            ("PUT", ["api", kind, id]) => {
                let mut patch = match body {
                    Value::Object(map) => map,
                    _ => Map::new(),
                };
                self.attach_areas(&mut patch);
                match self.find_mut(kind, id) {
                    Some(Value::Object(item)) => {
                        item.extend(patch);
                        Json(Value::Object(item.clone())).into_response()
                    }
                    _ => error(StatusCode::NOT_FOUND, "Item not found"),
                }
            }
            ("DELETE", ["api", kind, id]) => {
                let before = self.collection_len(kind);
                if let (Some(items), Ok(id)) =
                    (self.collections.get_mut(*kind), id.parse::<i64>())
                {
                    items.retain(|item| item["id"] != json!(id));
                }
                if self.collection_len(kind) < before {
                    StatusCode::NO_CONTENT.into_response()
                } else {
                    error(StatusCode::NOT_FOUND, "Item not found")
                }
            }
            ("POST", ["api", "habits", id, "checkin"]) => match self.find_mut("habits", id) {
                Some(habit) => {
                    let streak = habit["current_streak"].as_u64().unwrap_or(0) + 1;
                    let longest = habit["longest_streak"].as_u64().unwrap_or(0).max(streak);
                    habit["current_streak"] = json!(streak);
                    habit["longest_streak"] = json!(longest);
                    habit["last_checkin_date"] = json!("2026-10-18");
                    Json(json!({
                        "habit_id": habit["id"],
                        "checkin_date": "2026-10-18",
                        "current_streak": streak,
                        "longest_streak": longest,
                        "message": format!("Checked in! Current streak: {streak} days"),
                    }))
                    .into_response()
                }
                None => error(StatusCode::NOT_FOUND, "Habit not found"),
            },
            ("GET", ["api", "contacts", id, "birthday"]) => match self.find_mut("contacts", id) {
                Some(contact) if contact["birthday"].is_string() => Json(json!({
                    "contact_id": contact["id"],
                    "name": contact["name"],
                    "birthday": contact["birthday"],
                    "current_age": 36,
                    "next_birthday": "2027-06-02",
                    "days_until_birthday": 227,
                }))
                .into_response(),
                Some(_) => error(StatusCode::BAD_REQUEST, "Contact has no birthday"),
                None => error(StatusCode::NOT_FOUND, "Contact not found"),
            },
            _ => error(StatusCode::NOT_FOUND, "Not Found"),
        }
    }

    fn collection_len(&self, kind: &str) -> usize {
        self.collections.get(kind).map_or(0, Vec::len)
    }

    fn register(&mut self, body: Value) -> Response {
        let username = body["username"].as_str().unwrap_or_default().to_string();
        if self.users.iter().any(|user| user.username == username) {
            return error(
                StatusCode::BAD_REQUEST,
                &format!("Username '{username}' already exists"),
            );
        }
        let user = MockUser {
            id: self.allocate_id(),
            username,
            email: body["email"].as_str().unwrap_or_default().into(),
            full_name: body["full_name"].as_str().unwrap_or_default().into(),
            password: body["password"].as_str().unwrap_or_default().into(),
        };
        let created = user.json();
        self.users.push(user);
        (StatusCode::CREATED, Json(created)).into_response()
    }

    fn login(&mut self, body: Value) -> Response {
        let user = self.users.iter().find(|user| {
            Some(user.username.as_str()) == body["username"].as_str()
                && Some(user.password.as_str()) == body["password"].as_str()
        });
        match user {
            Some(user) => (
                StatusCode::OK,
                [(header::SET_COOKIE, format!("session={}; Path=/", user.id))],
                Json(json!({ "message": "Login successful", "user": user.json() })),
            )
                .into_response(),
            None => error(StatusCode::UNAUTHORIZED, "Invalid credentials"),
        }
    }
}

fn error(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

fn session_user(headers: &HeaderMap) -> Option<i64> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| pair.trim().strip_prefix("session="))
        .and_then(|id| id.parse().ok())
}

async fn dispatch(
    State(backend): State<Backend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let key = format!("{method} {path}");
    let (delay, failure) = {
        let mut inner = backend.lock();
        inner.calls.push(match uri.query() {
            Some(query) => format!("{key}?{query}"),
            None => key.clone(),
        });
        (
            inner.delays.get(&key).copied(),
            inner.failures.get(&key).cloned(),
        )
    };

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    if let Some((status, body)) = failure {
        return (status, [(header::CONTENT_TYPE, "application/json")], body).into_response();
    }

    let payload = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let session = session_user(&headers);
    backend.lock().route(&method, &path, payload, session)
}

/// Serves `backend` on an ephemeral port and returns its base url.
pub async fn spawn(backend: Backend) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(dispatch).with_state(backend);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// A base url nothing listens on.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

pub struct Harness {
    pub backend: Backend,
    pub surface: Arc<RecordingSurface>,
    pub app: App,
}

pub async fn harness() -> Harness {
    let backend = Backend::new();
    let base_url = spawn(backend.clone()).await;
    let surface = Arc::new(RecordingSurface::new());
    let app = App::new(&ClientConfig::new(&base_url).unwrap(), surface.clone()).unwrap();
    Harness {
        backend,
        surface,
        app,
    }
}

/// Harness with a signed-in session and the call log reset.
pub async fn signed_in() -> Harness {
    let harness = harness().await;
    harness.app.session().login(USERNAME, PASSWORD).await.unwrap();
    harness.backend.clear_calls();
    harness.surface.clear();
    harness
}

pub fn goal(title: &str, progress: u8) -> Value {
    json!({
        "title": title,
        "description": null,
        "timeframe": "short",
        "status": "in_progress",
        "progress_percentage": progress,
        "area_ids": [1],
    })
}

pub fn habit(name: &str) -> Value {
    json!({
        "name": name,
        "habit_type": "gain",
        "frequency_description": "daily",
        "area_ids": [1],
    })
}
