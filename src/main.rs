use anyhow::Result;
use clap::Parser as _;
use club_signup::{
    cli::{Cli, Command},
    config::{self, Config},
    ClubSignup,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("club_signup=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Command::ConfigTemplate) => println!("{}", config::get_config_template()),
        Some(Command::ConfigInit { config_path }) => {
            let config_path = config::init_config(config_path)?;
            println!("Configuration file created: {}", config_path.display());
        }
        None => {
            let mut config = Config::load(cli.args.config_path)?;
            if cli.args.form_id.is_some() {
                config.form_id = cli.args.form_id;
            }

            ClubSignup::boot(config).serve().await?;
        }
    }

    Ok(())
}
