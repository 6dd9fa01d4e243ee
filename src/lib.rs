use anyhow::Result;
use tokio::{
    io::{stdin, stdout, BufReader},
    signal,
};
use tracing::{info, warn};

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod session;
pub mod terminal;
pub mod validation;
pub mod wizard;

pub use {
    api::{ApiClient, RegistrationApi},
    config::Config,
    error::RegistrationError,
    session::{Clock, RegistrationSession, SystemClock},
    wizard::{Navigator, Step, Wizard, WizardView},
};

use model::FormId;
use terminal::{Terminal, TerminalNavigator};

pub struct ClubSignup {
    config: Config,
}

impl ClubSignup {
    pub fn boot(config: Config) -> Self {
        Self { config }
    }

    pub fn wizard(&self, navigator: Box<dyn Navigator>) -> Result<Wizard> {
        let client = ApiClient::from_config(&self.config)?;
        info!("using registration API at {}", client.base_url().as_str());

        let form_id = self.config.form_id.clone().map(FormId::from);
        let session = RegistrationSession::new(Box::new(client)).for_form(form_id);

        Ok(Wizard::new(session, navigator).with_country_code(self.config.default_country_code))
    }

    /// Runs the interactive wizard on stdin/stdout until the user leaves.
    pub async fn serve(self) -> Result<()> {
        let navigator = TerminalNavigator::default();
        let mut wizard = self.wizard(Box::new(navigator.clone()))?;
        let mut terminal = Terminal::new(BufReader::new(stdin()), stdout(), navigator);

        tokio::select! {
            result = terminal.run(&mut wizard) => result?,
            _ = shutdown_signal() => {
                warn!("interrupted, registration was not submitted unless confirmed above");
            }
        }

        Ok(())
    }
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
