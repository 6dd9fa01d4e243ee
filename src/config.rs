use confique::{yaml::FormatOptions, Config as _};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::validation::CountryCode;
type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Confique(#[from] confique::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not determine config dir parent path")]
    ParentPath,

    #[error(transparent)]
    Xdg(#[from] xdg::BaseDirectoriesError),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Environment {
    /// Talks to the API on the local loopback port
    Development,
    /// Talks to `/api` behind the site origin
    #[default]
    Production,
}

#[derive(Clone, Debug, Serialize, Deserialize, confique::Config)]
pub struct Config {
    /// Runtime environment: `development` or `production`
    #[config(env = "CLUB_SIGNUP_ENV", default = "production")]
    pub environment: Environment,

    /// Origin the registration API is reverse-proxied behind in production
    #[config(default = "http://localhost")]
    pub site_origin: String,

    /// Explicit API base URL. Overrides the environment-based choice
    #[config(env = "CLUB_SIGNUP_API_URL")]
    pub api_base_url: Option<String>,

    /// Load this registration form instead of the club's default form
    #[config(env = "CLUB_SIGNUP_FORM_ID")]
    pub form_id: Option<String>,

    /// Country code preselected for phone numbers: "+47", "+46" or "+44"
    #[config(default = "+47")]
    pub default_country_code: CountryCode,

    /// HTTP request timeout in seconds
    #[config(default = 30)]
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: Environment::Production,
            site_origin: "http://localhost".to_string(),
            api_base_url: None,
            form_id: None,
            default_country_code: CountryCode::default(),
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    pub fn load(config_path: Option<PathBuf>) -> Result<Config> {
        let config_path = get_config_path(config_path)?;
        let config = Config::builder().env().file(config_path).load()?;

        Ok(config)
    }
}

pub fn init_config(config_path: Option<PathBuf>) -> Result<PathBuf> {
    write_config_template(config_path)
}

pub fn get_config_template() -> String {
    confique::yaml::template::<Config>(FormatOptions::default())
}

pub fn get_config_path(config_path: Option<PathBuf>) -> Result<PathBuf> {
    match config_path {
        Some(path) => Ok(path),
        None => {
            let xdg_dirs = xdg::BaseDirectories::with_prefix("club-signup")?;
            Ok(xdg_dirs.get_config_file("config.yml"))
        }
    }
}

pub fn write_config_template(config_path: Option<PathBuf>) -> Result<PathBuf> {
    let config_path = get_config_path(config_path)?;
    let config_template = get_config_template();

    let config_path_dir = config_path.parent().ok_or(Error::ParentPath)?;

    std::fs::create_dir_all(config_path_dir)?;
    // @TODO this will overwrite an existing config with no warning.
    std::fs::write(config_path.clone(), config_template)?;

    Ok(config_path)
}
