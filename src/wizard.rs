use std::fmt;
use tracing::{debug, info};

use crate::{
    error::RegistrationError,
    model::{GroupId, MemberTypeId, RegistrationForm, RegistrationRequest, RegistrationResponse},
    session::RegistrationSession,
    validation::{CountryCode, FieldErrors, PersonalDetails},
};

type Result<T> = std::result::Result<T, RegistrationError>;

const FORM_MISSING: &str = "Could not load registration form";

/// Host capability for leaving or restarting the wizard.
pub trait Navigator: Send + Sync {
    fn reload(&self);
    fn go_home(&self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    SelectMemberType,
    PersonalDetails,
    Confirm,
}

impl Step {
    pub fn number(&self) -> u8 {
        match self {
            Step::SelectMemberType => 1,
            Step::PersonalDetails => 2,
            Step::Confirm => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Step::SelectMemberType => "Select membership",
            Step::PersonalDetails => "Personal information",
            Step::Confirm => "Confirm and submit",
        }
    }

    fn next(self) -> Option<Step> {
        match self {
            Step::SelectMemberType => Some(Step::PersonalDetails),
            Step::PersonalDetails => Some(Step::Confirm),
            Step::Confirm => None,
        }
    }

    fn prev(self) -> Option<Step> {
        match self {
            Step::SelectMemberType => None,
            Step::PersonalDetails => Some(Step::SelectMemberType),
            Step::Confirm => Some(Step::PersonalDetails),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Registration data collected so far. Survives moving back and forth.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Draft {
    pub member_type_id: Option<MemberTypeId>,
    pub group_id: Option<GroupId>,
    pub details: PersonalDetails,
}

impl Draft {
    pub fn new(country_code: CountryCode) -> Self {
        Self {
            details: PersonalDetails::with_country_code(country_code),
            ..Default::default()
        }
    }

    pub fn has_member_type(&self) -> bool {
        self.member_type_id.as_ref().is_some_and(|id| !id.is_empty())
    }

    /// Final payload. Only valid once both earlier steps pass.
    pub fn to_request(&self) -> Result<RegistrationRequest> {
        let Some(member_type_id) = self.member_type_id.clone().filter(|id| !id.is_empty()) else {
            let mut field_errors = FieldErrors::new();
            field_errors.insert("memberTypeId", "Member type must be selected");
            return Err(RegistrationError::Invalid(field_errors));
        };

        let field_errors = self.details.field_errors();
        if !field_errors.is_empty() {
            return Err(RegistrationError::Invalid(field_errors));
        }

        Ok(RegistrationRequest {
            full_name: self.details.full_name.trim().to_string(),
            email: self.details.email.trim().to_string(),
            phone_number: self.details.normalized_phone_number(),
            birth_date: self.details.birth_date.clone(),
            member_type_id,
            group_id: self.group_id.clone(),
        })
    }
}

/// What the host should render right now.
#[derive(Debug)]
pub enum WizardView<'a> {
    Loading,
    LoadFailed { message: &'a str },
    Closed { form: &'a RegistrationForm },
    Success { response: &'a RegistrationResponse },
    Step { step: Step, form: &'a RegistrationForm },
}

#[derive(derive_more::Debug)]
pub struct Wizard {
    session: RegistrationSession,
    #[debug(skip)]
    navigator: Box<dyn Navigator>,
    step: Step,
    draft: Draft,
    country_code: CountryCode,
}

impl Wizard {
    pub fn new(session: RegistrationSession, navigator: Box<dyn Navigator>) -> Self {
        Self {
            session,
            navigator,
            step: Step::SelectMemberType,
            draft: Draft::default(),
            country_code: CountryCode::default(),
        }
    }

    pub fn with_country_code(mut self, country_code: CountryCode) -> Self {
        self.country_code = country_code;
        self.draft.details.country_code = country_code;
        self
    }

    pub fn session(&self) -> &RegistrationSession {
        &self.session
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn details_mut(&mut self) -> &mut PersonalDetails {
        &mut self.draft.details
    }

    /// Runs the initial fetch.
    pub async fn load(&mut self) {
        self.session.load().await;
    }

    pub fn view(&self) -> WizardView<'_> {
        if self.session.is_loading() {
            return WizardView::Loading;
        }

        let Some(form) = self.session.form() else {
            return WizardView::LoadFailed {
                message: self.session.error().unwrap_or(FORM_MISSING),
            };
        };

        if self.session.is_submitted() {
            if let Some(response) = self.session.response() {
                return WizardView::Success { response };
            }
        }

        if !self.session.is_registration_open() {
            return WizardView::Closed { form };
        }

        WizardView::Step {
            step: self.step,
            form,
        }
    }

    pub fn select_member_type(&mut self, id: MemberTypeId) -> Result<()> {
        let form = self.session.form().ok_or(RegistrationError::NotReady)?;
        if form.member_type(&id).is_none() {
            return Err(RegistrationError::UnknownMemberType(id));
        }

        debug!("selected member type {id}");
        self.draft.member_type_id = Some(id);

        Ok(())
    }

    pub fn select_group(&mut self, id: Option<GroupId>) -> Result<()> {
        if let Some(ref id) = id {
            let form = self.session.form().ok_or(RegistrationError::NotReady)?;
            if form.group(id).is_none() {
                return Err(RegistrationError::UnknownGroup(id.clone()));
            }
        }

        self.draft.group_id = id;

        Ok(())
    }

    /// Whether the current step's forward control is enabled.
    pub fn can_proceed(&self) -> bool {
        match self.step {
            Step::SelectMemberType => self.draft.has_member_type(),
            Step::PersonalDetails => self.draft.details.can_proceed(),
            Step::Confirm => !self.session.is_submitting(),
        }
    }

    pub fn next_step(&mut self) -> Result<Step> {
        let field_errors = match self.step {
            Step::SelectMemberType if !self.draft.has_member_type() => {
                let mut field_errors = FieldErrors::new();
                field_errors.insert("memberTypeId", "Member type must be selected");
                Some(field_errors)
            }
            Step::PersonalDetails => Some(self.draft.details.field_errors()),
            _ => None,
        };

        if let Some(field_errors) = field_errors.filter(|errors| !errors.is_empty()) {
            return Err(RegistrationError::StepIncomplete {
                step: self.step,
                field_errors,
            });
        }

        if let Some(next) = self.step.next() {
            debug!("step {} -> {}", self.step, next);
            self.step = next;
        }

        Ok(self.step)
    }

    /// Always allowed; collected data is kept.
    pub fn prev_step(&mut self) -> Step {
        if self.step == Step::Confirm {
            self.session.clear_error();
        }

        if let Some(prev) = self.step.prev() {
            debug!("step {} -> {}", self.step, prev);
            self.step = prev;
        }

        self.step
    }

    /// Submits the draft from the confirmation step. On failure the wizard
    /// stays on that step and the session keeps the message.
    pub async fn submit(&mut self) -> Result<RegistrationResponse> {
        if self.step != Step::Confirm {
            return Err(RegistrationError::StepIncomplete {
                step: self.step,
                field_errors: FieldErrors::new(),
            });
        }

        if self.session.form().is_none() {
            return Err(RegistrationError::NotReady);
        }

        if !self.session.is_registration_open() {
            return Err(RegistrationError::Closed);
        }

        let request = self.draft.to_request()?;
        self.session.submit_registration(request).await
    }

    /// Error view action: fetch the form again from scratch.
    pub async fn retry(&mut self) {
        info!("reloading registration form");
        self.navigator.reload();
        self.step = Step::SelectMemberType;
        self.draft = Draft::new(self.country_code);
        self.session.load().await;
    }

    /// Success view action: start over for another person.
    pub fn register_another(&mut self) {
        self.session.reset_form();
        self.step = Step::SelectMemberType;
        self.draft = Draft::new(self.country_code);
    }

    pub fn leave(&self) {
        self.navigator.go_home();
    }
}
