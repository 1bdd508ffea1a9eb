use crate::errors::ClientError;
use crate::views::ViewModel;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Dashboard,
    Goals,
    Habits,
    Tasks,
    Contacts,
}

impl View {
    pub const ALL: [View; 5] = [
        View::Dashboard,
        View::Goals,
        View::Habits,
        View::Tasks,
        View::Contacts,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Goals => "goals",
            Self::Habits => "habits",
            Self::Tasks => "tasks",
            Self::Contacts => "contacts",
        }
    }
}

impl FromStr for View {
    type Err = ClientError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        View::ALL
            .into_iter()
            .find(|view| view.as_str() == name.trim())
            .ok_or_else(|| ClientError::validation(format!("unknown view `{name}`")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Login/registration forms.
    Auth,
    /// Signed-in shell, labelled with the user's display name.
    App { user_label: String },
}

/// The presentation collaborator. Implementations draw; they hold no
/// application state.
pub trait Surface: Send + Sync {
    fn show_loading(&self);
    fn hide_loading(&self);
    fn toast(&self, message: &str, kind: ToastKind);
    /// Inline error under the login/registration form.
    fn auth_error(&self, message: &str);
    fn show_modal(&self, title: &str, body: &str);
    fn hide_modal(&self);
    fn show_screen(&self, screen: &Screen);
    /// Shows `view` and hides every other one.
    fn show_view(&self, view: View);
    fn render(&self, view: View, model: &ViewModel);
}

/// Headless surface that reports through `tracing`.
#[derive(Debug, Default)]
pub struct TracingSurface;

impl Surface for TracingSurface {
    fn show_loading(&self) {
        info!("loading");
    }

    fn hide_loading(&self) {
        info!("idle");
    }

    fn toast(&self, message: &str, kind: ToastKind) {
        match kind {
            ToastKind::Success => info!(toast = message),
            ToastKind::Error => warn!(toast = message),
        }
    }

    fn auth_error(&self, message: &str) {
        warn!(auth_error = message);
    }

    fn show_modal(&self, title: &str, body: &str) {
        info!(title, body, "modal");
    }

    fn hide_modal(&self) {}

    fn show_screen(&self, screen: &Screen) {
        match screen {
            Screen::Auth => info!("showing sign-in screen"),
            Screen::App { user_label } => info!("signed in as {user_label}"),
        }
    }

    fn show_view(&self, view: View) {
        info!(view = view.as_str(), "view activated");
    }

    fn render(&self, view: View, model: &ViewModel) {
        for line in model.lines() {
            info!(view = view.as_str(), "{line}");
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    LoadingShown,
    LoadingHidden,
    Toast(String, ToastKind),
    AuthError(String),
    Modal { title: String, body: String },
    ModalHidden,
    Screen(Screen),
    ViewShown(View),
    Rendered(View, ViewModel),
}

/// Surface that records every call, for headless embedding and tests.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    events: Mutex<Vec<SurfaceEvent>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn log(&self) -> MutexGuard<'_, Vec<SurfaceEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, event: SurfaceEvent) {
        self.log().push(event);
    }

    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.log().clone()
    }

    pub fn clear(&self) {
        self.log().clear();
    }

    pub fn loading_visible(&self) -> bool {
        self.log()
            .iter()
            .rev()
            .find_map(|event| match event {
                SurfaceEvent::LoadingShown => Some(true),
                SurfaceEvent::LoadingHidden => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn toasts(&self) -> Vec<(String, ToastKind)> {
        self.log()
            .iter()
            .filter_map(|event| match event {
                SurfaceEvent::Toast(message, kind) => Some((message.clone(), *kind)),
                _ => None,
            })
            .collect()
    }

    pub fn auth_errors(&self) -> Vec<String> {
        self.log()
            .iter()
            .filter_map(|event| match event {
                SurfaceEvent::AuthError(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn renders(&self, view: View) -> Vec<ViewModel> {
        self.log()
            .iter()
            .filter_map(|event| match event {
                SurfaceEvent::Rendered(rendered, model) if *rendered == view => Some(model.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_screen(&self) -> Option<Screen> {
        self.log().iter().rev().find_map(|event| match event {
            SurfaceEvent::Screen(screen) => Some(screen.clone()),
            _ => None,
        })
    }

    pub fn last_view(&self) -> Option<View> {
        self.log().iter().rev().find_map(|event| match event {
            SurfaceEvent::ViewShown(view) => Some(*view),
            _ => None,
        })
    }
}

impl Surface for RecordingSurface {
    fn show_loading(&self) {
        self.push(SurfaceEvent::LoadingShown);
    }

    fn hide_loading(&self) {
        self.push(SurfaceEvent::LoadingHidden);
    }

    fn toast(&self, message: &str, kind: ToastKind) {
        self.push(SurfaceEvent::Toast(message.to_string(), kind));
    }

    fn auth_error(&self, message: &str) {
        self.push(SurfaceEvent::AuthError(message.to_string()));
    }

    fn show_modal(&self, title: &str, body: &str) {
        self.push(SurfaceEvent::Modal {
            title: title.to_string(),
            body: body.to_string(),
        });
    }

    fn hide_modal(&self) {
        self.push(SurfaceEvent::ModalHidden);
    }

    fn show_screen(&self, screen: &Screen) {
        self.push(SurfaceEvent::Screen(screen.clone()));
    }

    fn show_view(&self, view: View) {
        self.push(SurfaceEvent::ViewShown(view));
    }

    fn render(&self, view: View, model: &ViewModel) {
        self.push(SurfaceEvent::Rendered(view, model.clone()));
    }
}
