pub mod api;
pub mod app;
pub mod config;
pub mod errors;
pub mod loading;
pub mod models;
pub mod resources;
pub mod router;
pub mod session;
pub mod store;
pub mod surface;
pub mod views;

pub use api::ApiClient;
pub use app::App;
pub use config::ClientConfig;
pub use errors::{ClientError, ClientResult};
pub use router::ViewRouter;
pub use session::{AuthStatus, Session, SessionController};
pub use store::{LoadOutcome, ResourceStore};
pub use surface::{RecordingSurface, Surface, TracingSurface, View};
