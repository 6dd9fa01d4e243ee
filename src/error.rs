use crate::{
    api::ApiError,
    model::{GroupId, MemberTypeId},
    validation::FieldErrors,
    wizard::Step,
};

/// Everything that can stop a registration from going through.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// Submission attempted before the form was loaded.
    #[error("The registration form is not ready yet")]
    NotReady,

    #[error("Registration is not open yet")]
    Closed,

    /// Client-side validation failure; never reaches the network.
    #[error("{0}")]
    Invalid(FieldErrors),

    #[error("Step {step} is not complete")]
    StepIncomplete { step: Step, field_errors: FieldErrors },

    #[error("Member type {0} is not offered by this form")]
    UnknownMemberType(MemberTypeId),

    #[error("Group {0} is not offered by this form")]
    UnknownGroup(GroupId),

    /// Server-side validation or submission failure.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl RegistrationError {
    /// Per-field messages to show next to inputs, when the failure has any.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            RegistrationError::Invalid(field_errors)
            | RegistrationError::StepIncomplete { field_errors, .. }
            | RegistrationError::Api(ApiError::Validation { field_errors, .. }) => {
                Some(field_errors)
            }
            _ => None,
        }
    }
}
