use life_client::{App, AuthStatus, ClientConfig, TracingSurface, View};
use std::{env, sync::Arc};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = ClientConfig::from_env()?;
    info!("using backend at {}", config.base_url);

    let view = match env::args().nth(1) {
        Some(name) => name.parse::<View>()?,
        None => View::Dashboard,
    };

    let app = App::new(&config, Arc::new(TracingSurface))?;

    if app.session().init().await != AuthStatus::Authenticated {
        let (Ok(username), Ok(password)) = (env::var("LIFE_USERNAME"), env::var("LIFE_PASSWORD"))
        else {
            warn!("no active session; set LIFE_USERNAME and LIFE_PASSWORD to sign in");
            return Ok(());
        };
        app.session().login(&username, &password).await?;
    }

    if view != View::Dashboard {
        app.router().activate(view).await?;
    }

    Ok(())
}
