use derive_masked::DebugMasked;
use serde::{Deserialize, Serialize};

use crate::model::{GroupId, MemberTypeId};

/// Body of `POST {base}/form/{formId}/register`.
#[derive(Clone, DebugMasked, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub full_name: String,

    pub email: String,

    #[masked]
    pub phone_number: String,

    #[masked]
    pub birth_date: String,

    pub member_type_id: MemberTypeId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
}
