#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use club_signup::{
    api::{ApiBaseUrl, ApiClient, ApiError},
    model::{FormId, RegistrationForm, RegistrationRequest, RegistrationResponse},
    validation::FieldErrors,
    Clock, Navigator, RegistrationApi, RegistrationSession,
};

pub const ACTIVE_MEMBER: &str = "8FE4113D4E4020E0DCF887803A886981";
pub const SOCIAL_MEMBER: &str = "4237C55C5CC3B4B082CBF2540612778E";
pub const FORM_ID: &str = "B171388180BC457D9887AD92B6CCFC86";

pub fn form_json() -> serde_json::Value {
    serde_json::json!({
        "clubId": "britsport",
        "formId": FORM_ID,
        "title": "Coding camp summer 2025",
        "description": "Join our exciting coding camp this summer!",
        "registrationOpens": "2024-12-16T00:00:00",
        "memberTypes": [
            { "id": ACTIVE_MEMBER, "name": "Active Member" },
            { "id": SOCIAL_MEMBER, "name": "Social Member" }
        ]
    })
}

pub fn form() -> RegistrationForm {
    serde_json::from_value(form_json()).unwrap()
}

pub fn form_opening(opens: &str) -> RegistrationForm {
    let mut json = form_json();
    json["registrationOpens"] = serde_json::Value::from(opens);
    serde_json::from_value(json).unwrap()
}

pub fn accepted(name: &str) -> RegistrationResponse {
    RegistrationResponse {
        success: true,
        message: "Takk for din registrering! Du vil motta en bekreftelse på e-post.".to_string(),
        registration_id: Some(1234567890),
        member_name: Some(name.to_string()),
    }
}

/// A moment after the fixture form opened.
pub fn after_opening() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

#[derive(Clone)]
pub enum FormReply {
    Form(RegistrationForm),
    Fail(String),
}

#[derive(Clone)]
pub enum SubmitReply {
    Accepted(RegistrationResponse),
    Invalid(String, Vec<(String, String)>),
    Fail(String),
    /// Never answers.
    Hang,
}

#[derive(Default)]
pub struct Calls {
    pub get_form: AtomicUsize,
    pub get_form_by_id: AtomicUsize,
    pub submit: AtomicUsize,
    pub last_request: Mutex<Option<(FormId, RegistrationRequest)>>,
}

/// Scripted stand-in for the registration API.
#[derive(Clone)]
pub struct MockApi {
    pub form: Arc<Mutex<FormReply>>,
    pub submit: Arc<Mutex<SubmitReply>>,
    pub calls: Arc<Calls>,
}

impl MockApi {
    pub fn new(form: FormReply, submit: SubmitReply) -> Self {
        Self {
            form: Arc::new(Mutex::new(form)),
            submit: Arc::new(Mutex::new(submit)),
            calls: Arc::new(Calls::default()),
        }
    }

    pub fn serving(form: RegistrationForm) -> Self {
        Self::new(FormReply::Form(form), SubmitReply::Accepted(accepted("Test Testesen")))
    }

    pub fn set_form(&self, reply: FormReply) {
        *self.form.lock().unwrap() = reply;
    }

    pub fn set_submit(&self, reply: SubmitReply) {
        *self.submit.lock().unwrap() = reply;
    }

    pub fn submit_calls(&self) -> usize {
        self.calls.submit.load(Ordering::SeqCst)
    }

    pub fn form_calls(&self) -> usize {
        self.calls.get_form.load(Ordering::SeqCst) + self.calls.get_form_by_id.load(Ordering::SeqCst)
    }

    fn reply_form(&self) -> Result<RegistrationForm, ApiError> {
        match self.form.lock().unwrap().clone() {
            FormReply::Form(form) => Ok(form),
            FormReply::Fail(message) => Err(ApiError::Server {
                status: None,
                message,
            }),
        }
    }
}

#[async_trait]
impl RegistrationApi for MockApi {
    async fn get_form(&self) -> Result<RegistrationForm, ApiError> {
        self.calls.get_form.fetch_add(1, Ordering::SeqCst);
        self.reply_form()
    }

    async fn get_form_by_id(&self, _form_id: &FormId) -> Result<RegistrationForm, ApiError> {
        self.calls.get_form_by_id.fetch_add(1, Ordering::SeqCst);
        self.reply_form()
    }

    async fn submit_registration(
        &self,
        form_id: &FormId,
        request: &RegistrationRequest,
    ) -> Result<RegistrationResponse, ApiError> {
        self.calls.submit.fetch_add(1, Ordering::SeqCst);
        *self.calls.last_request.lock().unwrap() = Some((form_id.clone(), request.clone()));

        let reply = self.submit.lock().unwrap().clone();
        match reply {
            SubmitReply::Accepted(response) => Ok(response),
            SubmitReply::Invalid(message, fields) => Err(ApiError::Validation {
                message,
                field_errors: fields.into_iter().collect::<FieldErrors>(),
            }),
            SubmitReply::Fail(message) => Err(ApiError::Server {
                status: None,
                message,
            }),
            SubmitReply::Hang => std::future::pending().await,
        }
    }
}

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn session(api: &MockApi) -> RegistrationSession {
    RegistrationSession::with_clock(Box::new(api.clone()), Box::new(FixedClock(after_opening())))
}

#[derive(Clone, Default)]
pub struct RecordingNavigator {
    pub reloads: Arc<AtomicUsize>,
    pub homes: Arc<AtomicUsize>,
}

impl Navigator for RecordingNavigator {
    fn reload(&self) {
        self.reloads.fetch_add(1, Ordering::SeqCst);
    }

    fn go_home(&self) {
        self.homes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Serves `router` on an ephemeral loopback port and returns a client for it.
pub async fn stub_server(router: axum::Router) -> ApiClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    ApiClient::new(ApiBaseUrl::new(format!("http://{addr}/api")))
}
