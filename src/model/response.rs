use serde::{Deserialize, Serialize};

/// Server acknowledgement of a registration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub success: bool,

    #[serde(default)]
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_name: Option<String>,
}
