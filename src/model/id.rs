use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt::Display, ops::Deref};

/// Declares a string-backed identifier that accepts either a JSON string or a
/// JSON integer on the way in and always serializes as a string.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value.to_string())
            }
        }

        impl Deref for $name {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                match RawId::deserialize(deserializer)? {
                    RawId::Text(text) => Ok(Self(text)),
                    RawId::Signed(number) => Ok(Self(number.to_string())),
                    RawId::Unsigned(number) => Ok(Self(number.to_string())),
                }
            }
        }
    };
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

string_id!(
    /// Identifier of a registration form.
    FormId
);

string_id!(
    /// Identifier of a selectable membership category.
    MemberTypeId
);

string_id!(
    /// Identifier of a training group. Only offered by older forms.
    GroupId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ids_become_strings() {
        let id: MemberTypeId = serde_json::from_str("42").unwrap();
        assert_eq!(id.as_str(), "42");

        let id: FormId = serde_json::from_str("\"B171388180BC457D9887AD92B6CCFC86\"").unwrap();
        assert_eq!(id.to_string(), "B171388180BC457D9887AD92B6CCFC86");
    }

    #[test]
    fn ids_serialize_as_strings() {
        let id = GroupId::from(7);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"7\"");
    }

    #[test]
    fn rejects_non_scalar_ids() {
        assert!(serde_json::from_str::<MemberTypeId>("{\"id\": 1}").is_err());
        assert!(serde_json::from_str::<MemberTypeId>("true").is_err());
    }
}
