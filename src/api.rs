use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{
    config::{Config, Environment},
    model::{FormId, RegistrationForm, RegistrationRequest, RegistrationResponse},
    validation::FieldErrors,
};

type Result<T> = std::result::Result<T, ApiError>;

pub const DEVELOPMENT_BASE_URL: &str = "http://localhost:8080/api";
pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";

const UNEXPECTED_ERROR: &str = "An unexpected error occurred. Please try again later.";
const CONNECTION_ERROR: &str = "Could not connect to server. Please check your internet connection.";
const FORM_FETCH_FAILED: &str = "Could not fetch registration form";
const REGISTRATION_FAILED: &str = "Registration failed";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Server-reported failure, already phrased for display.
    #[error("{message}")]
    Server {
        status: Option<StatusCode>,
        message: String,
    },

    /// Structured per-field rejection of a submitted registration.
    #[error("{}", .field_errors.render_with_summary(.message))]
    Validation {
        message: String,
        field_errors: FieldErrors,
    },

    #[error("Could not connect to server. Please check your internet connection.")]
    Connection(#[source] reqwest::Error),

    #[error("Unexpected response from server.")]
    UnexpectedResponse(#[source] reqwest::Error),

    #[error("{0}")]
    InvalidForm(String),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Server { status, .. } => *status,
            ApiError::Validation { .. } => Some(StatusCode::BAD_REQUEST),
            _ => None,
        }
    }
}

/// Error envelope returned alongside non-2xx responses.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub field_errors: Option<IndexMap<String, String>>,
}

impl ErrorEnvelope {
    fn message(&self) -> Option<&str> {
        self.message.as_deref().filter(|message| !message.is_empty())
    }

    fn field_errors(&self) -> Option<FieldErrors> {
        if self.error.as_deref() != Some(VALIDATION_ERROR) {
            return None;
        }

        self.field_errors.clone().map(FieldErrors)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FormPayload {
    Envelope {
        success: bool,
        #[serde(default)]
        data: Option<RegistrationForm>,
        #[serde(default)]
        message: Option<String>,
    },
    Bare(RegistrationForm),
}

/// Message shown when a failed response carries no parseable envelope.
pub fn status_message(status: StatusCode) -> String {
    match status {
        StatusCode::BAD_REQUEST => {
            "Invalid request. Please check that all fields are correctly filled out.".to_string()
        }
        StatusCode::NOT_FOUND => "Registration form not found.".to_string(),
        StatusCode::INTERNAL_SERVER_ERROR => "Server error. Please try again later.".to_string(),
        status => format!(
            "Error {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or_default()
        )
        .trim_end()
        .to_string(),
    }
}

/// The two calls the registration flow needs from the club's API.
#[async_trait]
pub trait RegistrationApi: Send + Sync {
    async fn get_form(&self) -> Result<RegistrationForm>;

    async fn get_form_by_id(&self, form_id: &FormId) -> Result<RegistrationForm>;

    async fn submit_registration(
        &self,
        form_id: &FormId,
        request: &RegistrationRequest,
    ) -> Result<RegistrationResponse>;
}

/// Where the registration API lives for a given configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiBaseUrl(String);

impl ApiBaseUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into().trim_end_matches('/').to_string())
    }

    pub fn resolve(config: &Config) -> Self {
        if let Some(ref url) = config.api_base_url {
            return Self::new(url.as_str());
        }

        match config.environment {
            Environment::Development => Self::new(DEVELOPMENT_BASE_URL),
            Environment::Production => {
                Self::new(format!("{}/api", config.site_origin.trim_end_matches('/')))
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn form(&self) -> String {
        format!("{}/form", self.0)
    }

    pub fn form_by_id(&self, form_id: &FormId) -> String {
        format!("{}/form/{}", self.0, form_id)
    }

    pub fn register(&self, form_id: &FormId) -> String {
        format!("{}/form/{}/register", self.0, form_id)
    }
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: ApiBaseUrl,
}

impl ApiClient {
    pub fn new(base_url: ApiBaseUrl) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("club-signup/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(ApiError::Connection)?;

        Ok(Self {
            http,
            base_url: ApiBaseUrl::resolve(config),
        })
    }

    pub fn base_url(&self) -> &ApiBaseUrl {
        &self.base_url
    }

    async fn fetch_form(&self, url: String) -> Result<RegistrationForm> {
        debug!("fetching registration form from {url}");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(ApiError::Connection)?;

        if !response.status().is_success() {
            return Err(form_error(response).await);
        }

        let form = match response
            .json::<FormPayload>()
            .await
            .map_err(ApiError::UnexpectedResponse)?
        {
            FormPayload::Envelope {
                success: true,
                data: Some(form),
                ..
            } => form,
            FormPayload::Envelope {
                success: true,
                data: None,
                ..
            } => {
                return Err(ApiError::InvalidForm(
                    "Registration form response did not contain a form".to_string(),
                ))
            }
            FormPayload::Envelope { message, .. } => {
                return Err(ApiError::Server {
                    status: None,
                    message: message
                        .filter(|message| !message.is_empty())
                        .unwrap_or_else(|| FORM_FETCH_FAILED.to_string()),
                })
            }
            FormPayload::Bare(form) => form,
        };

        form.check().map_err(ApiError::InvalidForm)?;

        Ok(form)
    }
}

#[async_trait]
impl RegistrationApi for ApiClient {
    async fn get_form(&self) -> Result<RegistrationForm> {
        self.fetch_form(self.base_url.form()).await
    }

    async fn get_form_by_id(&self, form_id: &FormId) -> Result<RegistrationForm> {
        self.fetch_form(self.base_url.form_by_id(form_id)).await
    }

    async fn submit_registration(
        &self,
        form_id: &FormId,
        request: &RegistrationRequest,
    ) -> Result<RegistrationResponse> {
        let url = self.base_url.register(form_id);
        debug!("submitting registration {request:?} to {url}");

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(ApiError::Connection)?;

        if !response.status().is_success() {
            return Err(submission_error(response).await);
        }

        let body = response
            .json::<RegistrationResponse>()
            .await
            .map_err(ApiError::UnexpectedResponse)?;

        if !body.success {
            return Err(ApiError::Server {
                status: None,
                message: non_empty_or(body.message, REGISTRATION_FAILED),
            });
        }

        Ok(body)
    }
}

async fn read_envelope(response: Response) -> (StatusCode, Option<ErrorEnvelope>) {
    let status = response.status();
    let envelope = match response.json::<ErrorEnvelope>().await {
        Ok(envelope) => Some(envelope),
        Err(e) => {
            warn!("could not parse error response ({status}): {e}");
            None
        }
    };

    (status, envelope)
}

async fn form_error(response: Response) -> ApiError {
    let (status, envelope) = read_envelope(response).await;

    let Some(envelope) = envelope else {
        return ApiError::Server {
            status: Some(status),
            message: status_message(status),
        };
    };

    let summary = envelope.message().unwrap_or(UNEXPECTED_ERROR).to_string();
    let message = match envelope.field_errors() {
        Some(field_errors) => {
            let details: Vec<&str> = field_errors.0.values().map(String::as_str).collect();
            format!("{summary} {}", details.join(", "))
        }
        None => summary,
    };

    ApiError::Server {
        status: Some(status),
        message,
    }
}

async fn submission_error(response: Response) -> ApiError {
    let (status, envelope) = read_envelope(response).await;

    let Some(envelope) = envelope else {
        return ApiError::Server {
            status: Some(status),
            message: status_message(status),
        };
    };

    let summary = envelope.message().unwrap_or(REGISTRATION_FAILED).to_string();
    match envelope.field_errors() {
        Some(field_errors) => ApiError::Validation {
            message: summary,
            field_errors,
        },
        None => ApiError::Server {
            status: Some(status),
            message: summary,
        },
    }
}

fn non_empty_or(message: String, fallback: &str) -> String {
    if message.is_empty() {
        fallback.to_string()
    } else {
        message
    }
}
