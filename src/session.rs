use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::{
    api::RegistrationApi,
    error::RegistrationError,
    model::{FormId, RegistrationForm, RegistrationRequest, RegistrationResponse},
};

type Result<T> = std::result::Result<T, RegistrationError>;

const LOAD_FAILED: &str = "An error occurred";
const SUBMIT_FAILED: &str = "Registration failed";

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Owns the fetched form and the loading/submission lifecycle of one wizard
/// session. Nothing here outlives the session.
#[derive(derive_more::Debug)]
pub struct RegistrationSession {
    #[debug(skip)]
    api: Box<dyn RegistrationApi>,
    #[debug(skip)]
    clock: Box<dyn Clock>,
    form_id: Option<FormId>,
    form: Option<RegistrationForm>,
    loading: bool,
    error: Option<String>,
    submitting: bool,
    submitted: bool,
    response: Option<RegistrationResponse>,
}

impl RegistrationSession {
    pub fn new(api: Box<dyn RegistrationApi>) -> Self {
        Self::with_clock(api, Box::new(SystemClock))
    }

    pub fn with_clock(api: Box<dyn RegistrationApi>, clock: Box<dyn Clock>) -> Self {
        Self {
            api,
            clock,
            form_id: None,
            form: None,
            loading: true,
            error: None,
            submitting: false,
            submitted: false,
            response: None,
        }
    }

    /// Load a specific form instead of the club's default one.
    pub fn for_form(mut self, form_id: Option<FormId>) -> Self {
        self.form_id = form_id;
        self
    }

    pub fn form(&self) -> Option<&RegistrationForm> {
        self.form.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn response(&self) -> Option<&RegistrationResponse> {
        self.response.as_ref()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Fetches the form definition. Failures are kept as a display message.
    pub async fn load(&mut self) {
        self.loading = true;

        let result = match self.form_id {
            Some(ref form_id) => self.api.get_form_by_id(form_id).await,
            None => self.api.get_form().await,
        };

        match result {
            Ok(form) => {
                info!(form_id = %form.form_id, "loaded registration form {:?}", form.title);
                self.form = Some(form);
                self.error = None;
            }
            Err(e) => {
                warn!("could not load registration form: {e}");
                self.form = None;
                self.error = Some(display_message(&e.to_string(), LOAD_FAILED));
            }
        }

        self.loading = false;
    }

    pub async fn submit_registration(
        &mut self,
        request: RegistrationRequest,
    ) -> Result<RegistrationResponse> {
        let Some(form_id) = self.form.as_ref().map(|form| form.form_id.clone()) else {
            return Err(RegistrationError::NotReady);
        };

        self.error = None;

        let submitting = SubmittingFlag::raise(&mut self.submitting);
        let result = self.api.submit_registration(&form_id, &request).await;
        drop(submitting);

        match result {
            Ok(response) => {
                info!(
                    registration_id = ?response.registration_id,
                    "registration accepted for form {form_id}"
                );
                self.response = Some(response.clone());
                self.submitted = true;
                Ok(response)
            }
            Err(e) => {
                warn!("registration for form {form_id} failed: {e}");
                self.error = Some(display_message(&e.to_string(), SUBMIT_FAILED));
                Err(RegistrationError::from(e))
            }
        }
    }

    /// Open once the current moment has reached `registration_opens`.
    pub fn is_registration_open(&self) -> bool {
        match self.form {
            Some(ref form) => form.is_open_at(self.clock.now()),
            None => false,
        }
    }

    /// Back to a blank slate so another person can register.
    pub fn reset_form(&mut self) {
        self.submitted = false;
        self.response = None;
        self.error = None;
    }

    /// Forgets a submission failure once the user goes back to edit.
    pub fn clear_error(&mut self) {
        self.error = None;
    }
}

/// Holds `submitting` up for the duration of a request. Lowered on drop, so
/// an abandoned submission does not leave the session stuck.
struct SubmittingFlag<'a>(&'a mut bool);

impl<'a> SubmittingFlag<'a> {
    fn raise(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for SubmittingFlag<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

fn display_message(message: &str, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message.to_string()
    }
}
