//! Registration payload, the steps that collect it and the schema it is
//! validated against before submission.

use std::fmt;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{is_known_option, BikeModel, COUNTRIES, GENDERS, LANGUAGES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    SerialNumber,
    ModelDescription,
    ShopName,
    FirstName,
    LastName,
    Email,
    Country,
    DateOfPurchase,
    PreferredLanguage,
    Gender,
    DateOfBirth,
    NewsOptIn,
    Consent,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SerialNumber => "serialNumber",
            Self::ModelDescription => "modelDescription",
            Self::ShopName => "shopName",
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::Email => "email",
            Self::Country => "country",
            Self::DateOfPurchase => "dateOfPurchase",
            Self::PreferredLanguage => "preferredLanguage",
            Self::Gender => "gender",
            Self::DateOfBirth => "dateOfBirth",
            Self::NewsOptIn => "newsOptIn",
            Self::Consent => "consent",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four panels of the registration flow, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistrationStep {
    SerialNumber,
    BikeInformation,
    PersonalInformation,
    Confirmation,
}

impl RegistrationStep {
    pub const ALL: [Self; 4] = [
        Self::SerialNumber,
        Self::BikeInformation,
        Self::PersonalInformation,
        Self::Confirmation,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::SerialNumber => 0,
            Self::BikeInformation => 1,
            Self::PersonalInformation => 2,
            Self::Confirmation => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::SerialNumber => "Serial number",
            Self::BikeInformation => "Bike information",
            Self::PersonalInformation => "Personal information",
            Self::Confirmation => "Registration confirmation",
        }
    }

    pub fn labels() -> Vec<String> {
        Self::ALL.iter().map(|step| step.label().to_string()).collect()
    }

    /// Fields whose errors block leaving this step.
    pub fn fields(self) -> &'static [Field] {
        match self {
            Self::SerialNumber => &[Field::SerialNumber],
            Self::BikeInformation => &[
                Field::SerialNumber,
                Field::ModelDescription,
                Field::ShopName,
                Field::DateOfPurchase,
            ],
            Self::PersonalInformation => &[
                Field::FirstName,
                Field::LastName,
                Field::Email,
                Field::Country,
                Field::PreferredLanguage,
                Field::Gender,
                Field::DateOfBirth,
                Field::Consent,
            ],
            Self::Confirmation => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationPayload {
    pub serial_number: String,
    pub model_description: String,
    pub shop_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub country: String,
    #[serde(with = "iso_date")]
    pub date_of_purchase: Option<NaiveDate>,
    pub preferred_language: String,
    pub gender: String,
    #[serde(with = "iso_date")]
    pub date_of_birth: Option<NaiveDate>,
    pub news_opt_in: bool,
    pub consent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

impl FieldError {
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Every field that failed validation, in field order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join_errors(&self.errors))]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }

    pub fn get(&self, field: Field) -> Option<&FieldError> {
        self.errors.iter().find(|err| err.field == field)
    }

    pub fn first_message(&self) -> &str {
        self.errors
            .first()
            .map(|err| err.message.as_str())
            .unwrap_or_default()
    }
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn earliest_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn required(value: &str) -> bool {
    !value.trim().is_empty()
}

pub fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

impl RegistrationPayload {
    /// Initial form data with the descriptive fields filled from a lookup.
    pub fn from_bike(bike: &BikeModel) -> Self {
        Self {
            serial_number: bike.serial_number.clone(),
            model_description: bike.model_description.clone(),
            shop_name: bike.shop_name.clone(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        self.validate_at(Utc::now().date_naive())
    }

    pub fn validate_at(&self, today: NaiveDate) -> Result<(), ValidationErrors> {
        self.collect_errors(today, |_| true)
    }

    pub fn validate_step(&self, step: RegistrationStep) -> Result<(), ValidationErrors> {
        self.validate_step_at(step, Utc::now().date_naive())
    }

    pub fn validate_step_at(
        &self,
        step: RegistrationStep,
        today: NaiveDate,
    ) -> Result<(), ValidationErrors> {
        let fields = step.fields();
        self.collect_errors(today, |field| fields.contains(&field))
    }

    pub fn check_field(&self, field: Field, today: NaiveDate) -> Option<FieldError> {
        let message = match field {
            Field::SerialNumber => {
                (!required(&self.serial_number)).then_some("Serial number is required")
            }
            Field::ModelDescription => {
                (!required(&self.model_description)).then_some("Model description is required")
            }
            Field::ShopName => (!required(&self.shop_name)).then_some("Shop name is required"),
            Field::FirstName => (!required(&self.first_name)).then_some("First name is required"),
            Field::LastName => (!required(&self.last_name)).then_some("Last name is required"),
            Field::Email => (!is_valid_email(&self.email)).then_some("Invalid email address"),
            Field::Country => {
                if !required(&self.country) {
                    Some("Country is required")
                } else if !is_known_option(COUNTRIES, &self.country) {
                    Some("Select a country from the list")
                } else {
                    None
                }
            }
            Field::DateOfPurchase => match self.date_of_purchase {
                None => Some("Date of purchase is required"),
                Some(date) => date_range_error(date, today),
            },
            Field::PreferredLanguage => {
                if !required(&self.preferred_language) {
                    Some("Language selection is required")
                } else if !is_known_option(LANGUAGES, &self.preferred_language) {
                    Some("Select a language from the list")
                } else {
                    None
                }
            }
            Field::Gender => {
                if !required(&self.gender) {
                    Some("Gender selection is required")
                } else if !is_known_option(GENDERS, &self.gender) {
                    Some("Select a gender from the list")
                } else {
                    None
                }
            }
            Field::DateOfBirth => self
                .date_of_birth
                .and_then(|date| date_range_error(date, today)),
            Field::NewsOptIn => None,
            Field::Consent => (!self.consent).then_some("You must provide consent to continue"),
        };
        message.map(|message| FieldError::new(field, message))
    }

    fn collect_errors(
        &self,
        today: NaiveDate,
        include: impl Fn(Field) -> bool,
    ) -> Result<(), ValidationErrors> {
        let errors: Vec<FieldError> = ALL_FIELDS
            .iter()
            .copied()
            .filter(|field| include(*field))
            .filter_map(|field| self.check_field(field, today))
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors { errors })
        }
    }
}

const ALL_FIELDS: [Field; 13] = [
    Field::SerialNumber,
    Field::ModelDescription,
    Field::ShopName,
    Field::FirstName,
    Field::LastName,
    Field::Email,
    Field::Country,
    Field::DateOfPurchase,
    Field::PreferredLanguage,
    Field::Gender,
    Field::DateOfBirth,
    Field::NewsOptIn,
    Field::Consent,
];

fn date_range_error(date: NaiveDate, today: NaiveDate) -> Option<&'static str> {
    if date > today {
        Some("Date cannot be in the future")
    } else if date < earliest_date() {
        Some("Date cannot be before 1900-01-01")
    } else {
        None
    }
}

/// Dates travel as midnight-UTC RFC 3339 timestamps; plain `YYYY-MM-DD`
/// values are accepted on input.
pub mod iso_date {
    use chrono::{DateTime, NaiveDate, Utc};
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT00:00:00.000Z";

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&date.format(TIMESTAMP_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => parse(text).map(Some).map_err(D::Error::custom),
        }
    }

    pub fn parse(text: &str) -> Result<NaiveDate, String> {
        if let Ok(stamp) = DateTime::parse_from_rfc3339(text) {
            return Ok(stamp.with_timezone(&Utc).date_naive());
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map_err(|err| format!("invalid date '{text}': {err}"))
    }
}

#[cfg(test)]
#[path = "tests/registration_tests.rs"]
mod tests;
