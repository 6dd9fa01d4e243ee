use derive_masked::DebugMasked;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, fmt, ops::RangeInclusive, sync::LazyLock};
use validator::{Validate, ValidationError, ValidationErrors};

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

static BIRTH_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}\.\d{2}\.\d{4}$").expect("birth date pattern is valid"));

/// Dialling prefixes offered next to the phone number input.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum CountryCode {
    #[default]
    #[serde(rename = "+47")]
    #[strum(serialize = "+47")]
    Norway,

    #[serde(rename = "+46")]
    #[strum(serialize = "+46")]
    Sweden,

    #[serde(rename = "+44")]
    #[strum(serialize = "+44")]
    UnitedKingdom,
}

impl CountryCode {
    /// Number of digits a local number must have for this country.
    pub fn digits(&self) -> RangeInclusive<usize> {
        match self {
            CountryCode::Norway => 8..=8,
            CountryCode::Sweden => 8..=9,
            CountryCode::UnitedKingdom => 10..=11,
        }
    }

    pub fn requirement(&self) -> String {
        let digits = self.digits();
        if digits.start() == digits.end() {
            format!("Phone numbers for {self} must have exactly {} digits", digits.start())
        } else {
            format!(
                "Phone numbers for {self} must have {} to {} digits",
                digits.start(),
                digits.end()
            )
        }
    }
}

pub fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

pub fn is_valid_phone_number(number: &str, country: CountryCode) -> bool {
    let digits = strip_whitespace(number);

    !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
        && country.digits().contains(&digits.len())
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email.trim())
}

pub fn is_valid_birth_date(birth_date: &str) -> bool {
    BIRTH_DATE.is_match(birth_date)
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Reformats raw keystrokes into `DD.MM.YYYY`. Non-digits are dropped, at most
/// eight digits are kept, and a separator only follows the day or month once a
/// further digit has been typed.
pub fn format_birth_date(raw: &str) -> String {
    let digits: Vec<char> = raw.chars().filter(|c| c.is_ascii_digit()).take(8).collect();

    let mut formatted = String::with_capacity(10);
    for (position, digit) in digits.iter().enumerate() {
        if position == 2 || position == 4 {
            formatted.push('.');
        }
        formatted.push(*digit);
    }

    formatted
}

/// Validation failures keyed by wire field name, in a stable order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(pub IndexMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    /// `"<summary>\n\n<field>: <message>\n..."`, or just the summary when empty.
    pub fn render_with_summary(&self, summary: &str) -> String {
        if self.is_empty() {
            summary.to_string()
        } else {
            format!("{summary}\n\n{self}")
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self
            .0
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect();

        write!(f, "{}", lines.join("\n"))
    }
}

impl FromIterator<(String, String)> for FieldErrors {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

// Schema-level failures land under `__all__`; the only one is the phone check.
const FIELD_ORDER: [(&str, &str); 4] = [
    ("full_name", "fullName"),
    ("email", "email"),
    ("__all__", "phoneNumber"),
    ("birth_date", "birthDate"),
];

/// Step-two input: everything about the registrant except the membership.
#[derive(Validate, Serialize, Deserialize, DebugMasked, Clone, Default, PartialEq)]
#[validate(schema(function = "validate_phone_for_country", skip_on_field_errors = false))]
pub struct PersonalDetails {
    #[validate(custom(function = "validate_full_name"))]
    pub full_name: String,

    #[validate(custom(function = "validate_email"))]
    pub email: String,

    pub country_code: CountryCode,

    #[masked]
    pub phone_number: String,

    #[masked]
    #[validate(custom(function = "validate_birth_date"))]
    pub birth_date: String,
}

impl PersonalDetails {
    pub fn with_country_code(country_code: CountryCode) -> Self {
        Self {
            country_code,
            ..Default::default()
        }
    }

    pub fn set_birth_date(&mut self, raw: &str) {
        self.birth_date = format_birth_date(raw);
    }

    pub fn normalized_phone_number(&self) -> String {
        strip_whitespace(&self.phone_number)
    }

    /// Whether the "Next" control is enabled, recomputed from live values.
    pub fn can_proceed(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn field_errors(&self) -> FieldErrors {
        match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(errors) => flatten(&errors),
        }
    }
}

fn flatten(errors: &ValidationErrors) -> FieldErrors {
    let by_field = errors.field_errors();

    FIELD_ORDER
        .iter()
        .filter_map(|(key, wire_name)| {
            let first = by_field.get(*key)?.first()?;
            let message = first
                .message
                .as_ref()
                .map(|message| message.to_string())
                .unwrap_or_else(|| first.code.to_string());
            Some((wire_name.to_string(), message))
        })
        .collect()
}

fn validate_full_name(full_name: &str) -> Result<(), ValidationError> {
    if is_blank(full_name) {
        return Err(ValidationError::new("required")
            .with_message(Cow::Borrowed("Full name is required")));
    }

    Ok(())
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    if !is_valid_email(email) {
        return Err(ValidationError::new("email")
            .with_message(Cow::Borrowed("Invalid email address")));
    }

    Ok(())
}

fn validate_birth_date(birth_date: &str) -> Result<(), ValidationError> {
    if !is_valid_birth_date(birth_date) {
        return Err(ValidationError::new("birth_date")
            .with_message(Cow::Borrowed("Birth date must be in DD.MM.YYYY format")));
    }

    Ok(())
}

fn validate_phone_for_country(details: &PersonalDetails) -> Result<(), ValidationError> {
    if is_blank(&details.phone_number) {
        return Err(ValidationError::new("required")
            .with_message(Cow::Borrowed("Phone number is required")));
    }

    if !is_valid_phone_number(&details.phone_number, details.country_code) {
        return Err(ValidationError::new("phone_number")
            .with_message(Cow::Owned(details.country_code.requirement())));
    }

    Ok(())
}
