use chrono::NaiveDate;
use shared::{
    domain::BikeModel,
    registration::{Field, FieldError, RegistrationPayload, ValidationErrors},
};

/// Form data plus the messages shown next to individual fields.
///
/// Editing a field clears its message; the next validation pass decides
/// whether it comes back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    payload: RegistrationPayload,
    errors: Vec<FieldError>,
}

impl RegistrationForm {
    pub fn payload(&self) -> &RegistrationPayload {
        &self.payload
    }

    /// Initial data merged with a looked-up bike; drops every field error.
    pub fn reset_from_bike(&mut self, bike: &BikeModel) {
        self.payload = RegistrationPayload::from_bike(bike);
        self.errors.clear();
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn error(&self, field: Field) -> Option<&str> {
        self.errors
            .iter()
            .find(|err| err.field == field)
            .map(|err| err.message.as_str())
    }

    pub fn set_error(&mut self, field: Field, message: impl Into<String>) {
        self.clear_error(field);
        self.errors.push(FieldError::new(field, message));
    }

    pub fn clear_error(&mut self, field: Field) {
        self.errors.retain(|err| err.field != field);
    }

    /// Replaces all field errors with the outcome of a validation pass.
    pub fn record_validation(&mut self, result: Result<(), ValidationErrors>) {
        self.errors = match result {
            Ok(()) => Vec::new(),
            Err(errors) => errors.into_errors(),
        };
    }

    pub fn set_serial_number(&mut self, value: impl Into<String>) {
        self.payload.serial_number = value.into();
        self.clear_error(Field::SerialNumber);
    }

    pub fn set_date_of_purchase(&mut self, value: Option<NaiveDate>) {
        self.payload.date_of_purchase = value;
        self.clear_error(Field::DateOfPurchase);
    }

    pub fn set_first_name(&mut self, value: impl Into<String>) {
        self.payload.first_name = value.into();
        self.clear_error(Field::FirstName);
    }

    pub fn set_last_name(&mut self, value: impl Into<String>) {
        self.payload.last_name = value.into();
        self.clear_error(Field::LastName);
    }

    pub fn set_email(&mut self, value: impl Into<String>) {
        self.payload.email = value.into();
        self.clear_error(Field::Email);
    }

    pub fn set_country(&mut self, value: impl Into<String>) {
        self.payload.country = value.into();
        self.clear_error(Field::Country);
    }

    pub fn set_preferred_language(&mut self, value: impl Into<String>) {
        self.payload.preferred_language = value.into();
        self.clear_error(Field::PreferredLanguage);
    }

    pub fn set_gender(&mut self, value: impl Into<String>) {
        self.payload.gender = value.into();
        self.clear_error(Field::Gender);
    }

    pub fn set_date_of_birth(&mut self, value: Option<NaiveDate>) {
        self.payload.date_of_birth = value;
        self.clear_error(Field::DateOfBirth);
    }

    pub fn set_news_opt_in(&mut self, value: bool) {
        self.payload.news_opt_in = value;
    }

    pub fn set_consent(&mut self, value: bool) {
        self.payload.consent = value;
        self.clear_error(Field::Consent);
    }
}
