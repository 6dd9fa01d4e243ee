use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

use crate::model::{FormId, GroupId, MemberTypeId};

/// A club's registration form as served by `GET {base}/form`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
    #[serde(default)]
    pub club_id: String,

    #[serde(alias = "id")]
    pub form_id: FormId,

    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(alias = "registrationDate", deserialize_with = "deserialize_opening")]
    pub registration_opens: DateTime<Utc>,

    pub member_types: Vec<MemberType>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<Group>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemberType {
    pub id: MemberTypeId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl RegistrationForm {
    /// Shape checks the server contract promises but serde cannot express.
    pub fn check(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for member_type in &self.member_types {
            if !seen.insert(member_type.id.as_str()) {
                return Err(format!(
                    "Registration form lists member type {} more than once",
                    member_type.id
                ));
            }
        }

        Ok(())
    }

    pub fn member_type(&self, id: &MemberTypeId) -> Option<&MemberType> {
        self.member_types.iter().find(|member_type| &member_type.id == id)
    }

    pub fn group(&self, id: &GroupId) -> Option<&Group> {
        self.groups.iter().find(|group| &group.id == id)
    }

    /// Registration is open from the opening moment onwards.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.registration_opens
    }
}

/// Parses the opening moment. Accepts RFC 3339, a naive date-time or a bare
/// date; naive values are read as UTC.
pub fn parse_opening(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(moment) = DateTime::parse_from_rfc3339(value) {
        return Some(moment.with_timezone(&Utc));
    }

    if let Ok(moment) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(moment.and_utc());
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|moment| moment.and_utc())
}

fn deserialize_opening<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_opening(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid registration opening: {raw}")))
}
