//! Authentication state machine.
//!
//! `Unauthenticated -> Authenticating -> Authenticated`, and back to
//! `Unauthenticated` on logout or a failed session check. A failed logout
//! leaves the session authenticated and reports the failure. A failed or
//! abandoned sign-in attempt restores whatever state preceded it.

use crate::api::ApiClient;
use crate::errors::{ClientError, ClientResult};
use crate::loading::LoadingIndicator;
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, User};
use crate::router::ViewRouter;
use crate::store::require;
use crate::surface::{Screen, Surface, ToastKind, View};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=50;
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Unauthenticated,
    Authenticating,
    Authenticated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub status: AuthStatus,
    pub user: Option<User>,
}

/// Client-side view of the server session: the auth status and the cached
/// user, shared between the controller and the router.
#[derive(Debug)]
pub struct Session {
    inner: RwLock<SessionSnapshot>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            inner: RwLock::new(SessionSnapshot {
                status: AuthStatus::Unauthenticated,
                user: None,
            }),
        }
    }
}

impl Session {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionSnapshot> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionSnapshot> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.read().clone()
    }

    pub fn status(&self) -> AuthStatus {
        self.read().status
    }

    pub fn current_user(&self) -> Option<User> {
        self.read().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.status() == AuthStatus::Authenticated
    }

    /// Marks a sign-in attempt as running. Until the returned guard is
    /// completed, dropping it puts back the state that preceded the attempt.
    fn begin(&self) -> SignInAttempt<'_> {
        let previous = self.snapshot();
        self.write().status = AuthStatus::Authenticating;
        SignInAttempt {
            session: self,
            previous: Some(previous),
        }
    }

    fn establish(&self, user: User) {
        let mut inner = self.write();
        inner.status = AuthStatus::Authenticated;
        inner.user = Some(user);
    }

    fn end(&self) {
        let mut inner = self.write();
        inner.status = AuthStatus::Unauthenticated;
        inner.user = None;
    }
}

#[must_use = "the previous session state is restored as soon as the attempt is dropped"]
struct SignInAttempt<'a> {
    session: &'a Session,
    previous: Option<SessionSnapshot>,
}

impl SignInAttempt<'_> {
    fn succeed(mut self, user: User) {
        self.previous = None;
        self.session.establish(user);
    }
}

impl Drop for SignInAttempt<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            debug!(status = ?previous.status, "sign-in attempt ended, restoring session");
            *self.session.write() = previous;
        }
    }
}

pub struct SessionController {
    api: ApiClient,
    session: Arc<Session>,
    router: Arc<ViewRouter>,
    surface: Arc<dyn Surface>,
    loading: Arc<LoadingIndicator>,
}

impl SessionController {
    pub fn new(
        api: ApiClient,
        session: Arc<Session>,
        router: Arc<ViewRouter>,
        surface: Arc<dyn Surface>,
        loading: Arc<LoadingIndicator>,
    ) -> Self {
        Self {
            api,
            session,
            router,
            surface,
            loading,
        }
    }

    pub fn state(&self) -> &Arc<Session> {
        &self.session
    }

    /// Checks the server session. On success the dashboard is activated,
    /// otherwise the sign-in screen is shown.
    pub async fn init(&self) -> AuthStatus {
        let current = {
            let _loading = self.loading.acquire();
            self.api.current_user().await
        };

        match current {
            Ok(user) => {
                info!(user = %user.username, "resumed existing session");
                self.enter(user).await;
            }
            Err(err) => {
                debug!("no active session: {err}");
                self.session.end();
                self.surface.show_screen(&Screen::Auth);
            }
        }
        self.session.status()
    }

    pub async fn login(&self, username: &str, password: &str) -> ClientResult<User> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        if let Err(err) = validate_login(&request) {
            return Err(self.reject(err));
        }

        let attempt = self.session.begin();
        let result = {
            let _loading = self.loading.acquire();
            self.api.login(&request).await
        };
        self.finish_login(attempt, result, "Welcome back!").await
    }

    /// Creates the account, then signs in with the same credentials. The
    /// login is only issued once registration has succeeded; if it then
    /// fails, the account exists but only the login failure is reported.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> ClientResult<User> {
        let request = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            full_name: full_name.to_string(),
        };
        if let Err(err) = validate_registration(&request) {
            return Err(self.reject(err));
        }

        let attempt = self.session.begin();
        let result = {
            let _loading = self.loading.acquire();
            match self.api.register(&request).await {
                Ok(user) => {
                    info!(user = %user.username, "account created, signing in");
                    let login = LoginRequest {
                        username: request.username,
                        password: request.password,
                    };
                    self.api.login(&login).await
                }
                Err(err) => Err(err),
            }
        };
        self.finish_login(attempt, result, "Account created successfully!")
            .await
    }

    /// Ends the server session. Local state is cleared only once the server
    /// confirms; on failure the user stays signed in and sees a toast.
    pub async fn logout(&self) -> ClientResult<()> {
        let result = {
            let _loading = self.loading.acquire();
            self.api.logout().await
        };

        match result {
            Ok(_) => {
                self.session.end();
                self.router.reset().await;
                self.surface.show_screen(&Screen::Auth);
                self.surface.toast("Logged out successfully", ToastKind::Success);
                info!("logged out");
                Ok(())
            }
            Err(err) => {
                warn!("logout failed: {err}");
                self.surface.toast("Error logging out", ToastKind::Error);
                Err(err)
            }
        }
    }

    async fn finish_login(
        &self,
        attempt: SignInAttempt<'_>,
        result: ClientResult<LoginResponse>,
        welcome: &str,
    ) -> ClientResult<User> {
        match result {
            Ok(response) => {
                info!(user = %response.user.username, "signed in");
                let user = response.user;
                attempt.succeed(user.clone());
                self.open_dashboard(&user).await;
                self.surface.toast(welcome, ToastKind::Success);
                Ok(user)
            }
            Err(err) => {
                drop(attempt);
                Err(self.reject(err))
            }
        }
    }

    async fn enter(&self, user: User) {
        self.session.establish(user.clone());
        self.open_dashboard(&user).await;
    }

    async fn open_dashboard(&self, user: &User) {
        let screen = Screen::App {
            user_label: user.display_name().to_string(),
        };
        self.surface.show_screen(&screen);
        if let Err(err) = self.router.activate(View::Dashboard).await {
            debug!("dashboard load failed: {err}");
        }
    }

    /// Reports a failed sign-in inline. Session state is left to the
    /// attempt guard.
    fn reject(&self, err: ClientError) -> ClientError {
        warn!("authentication failed: {err}");
        self.surface.auth_error(&err.user_message());
        err
    }
}

fn validate_login(request: &LoginRequest) -> ClientResult<()> {
    require(&request.username, "Username")?;
    require(&request.password, "Password")
}

fn validate_registration(request: &RegisterRequest) -> ClientResult<()> {
    let username = request.username.trim();
    if !USERNAME_LEN.contains(&username.chars().count()) {
        return Err(ClientError::validation(
            "Username must be between 3 and 50 characters",
        ));
    }
    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ClientError::validation(
            "Password must be at least 8 characters",
        ));
    }
    Ok(())
}
