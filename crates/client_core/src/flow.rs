use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::{
    domain::BikeModel,
    protocol::RegistrationOutcome,
    registration::{Field, RegistrationPayload, RegistrationStep},
};
use stepper::{AccessibilityMode, StepLease, Stepper};
use tracing::{info, warn};

use crate::{ClientError, FlowError, RegistrationApi, RegistrationForm};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowOptions {
    pub mode: AccessibilityMode,
    pub default_step: usize,
}

/// Result shown on the last step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    pub success: bool,
    pub message: String,
}

impl Confirmation {
    pub fn heading(&self) -> &'static str {
        if self.success {
            "Registration Complete!"
        } else {
            "Registration Failed!"
        }
    }
}

impl From<RegistrationOutcome> for Confirmation {
    fn from(outcome: RegistrationOutcome) -> Self {
        Self {
            success: outcome.success,
            message: outcome.message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The active step changed.
    Moved,
    /// The action ran but the active step did not change.
    Stayed,
    /// The action is disabled right now.
    Blocked,
    /// A late response was dropped.
    Discarded,
}

/// First half of a split call: either a request to send or the outcome of
/// not sending one.
#[derive(Debug)]
pub enum Begin<P> {
    Started(P),
    Skipped(StepOutcome),
}

#[derive(Debug, Clone)]
pub struct PendingLookup {
    mount: u64,
    lease: StepLease,
    serial_number: String,
}

impl PendingLookup {
    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }
}

#[derive(Debug, Clone)]
pub struct PendingSubmit {
    mount: u64,
    lease: StepLease,
    payload: RegistrationPayload,
}

impl PendingSubmit {
    pub fn payload(&self) -> &RegistrationPayload {
        &self.payload
    }
}

pub struct RegistrationFlow<A> {
    api: A,
    options: FlowOptions,
    stepper: Option<Stepper>,
    mount: u64,
    form: RegistrationForm,
    confirmation: Option<Confirmation>,
    lookup_in_flight: bool,
    submit_in_flight: bool,
}

impl<A: RegistrationApi> RegistrationFlow<A> {
    pub fn new(api: A, options: FlowOptions) -> Self {
        Self {
            api,
            options,
            stepper: None,
            mount: 0,
            form: RegistrationForm::default(),
            confirmation: None,
            lookup_in_flight: false,
            submit_in_flight: false,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn mount(&mut self) {
        self.reset();
        self.stepper = Some(
            Stepper::with_steps(RegistrationStep::labels(), self.options.mode)
                .with_default_step(self.options.default_step),
        );
        info!(mount = self.mount, mode = ?self.options.mode, "registration flow mounted");
    }

    pub fn unmount(&mut self) {
        self.reset();
        info!(mount = self.mount, "registration flow unmounted");
    }

    fn reset(&mut self) {
        self.mount += 1;
        self.stepper = None;
        self.form = RegistrationForm::default();
        self.confirmation = None;
        self.lookup_in_flight = false;
        self.submit_in_flight = false;
    }

    pub fn is_mounted(&self) -> bool {
        self.stepper.is_some()
    }

    pub fn stepper(&self) -> Result<&Stepper, FlowError> {
        self.stepper.as_ref().ok_or(FlowError::NotMounted)
    }

    fn stepper_mut(&mut self) -> Result<&mut Stepper, FlowError> {
        self.stepper.as_mut().ok_or(FlowError::NotMounted)
    }

    pub fn active_step(&self) -> Result<Option<RegistrationStep>, FlowError> {
        Ok(RegistrationStep::from_index(self.stepper()?.active_step()))
    }

    fn is_on(&self, step: RegistrationStep) -> Result<bool, FlowError> {
        Ok(self.stepper()?.active_step() == step.index())
    }

    pub fn form(&self) -> &RegistrationForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut RegistrationForm {
        &mut self.form
    }

    pub fn confirmation(&self) -> Option<&Confirmation> {
        self.confirmation.as_ref()
    }

    pub fn is_lookup_in_flight(&self) -> bool {
        self.lookup_in_flight
    }

    pub fn is_submit_in_flight(&self) -> bool {
        self.submit_in_flight
    }

    pub fn set_serial_number(&mut self, serial_number: impl Into<String>) {
        self.form.set_serial_number(serial_number);
    }

    pub fn set_date_of_purchase(&mut self, date: Option<NaiveDate>) {
        self.form.set_date_of_purchase(date);
    }

    /// Whether the find button is enabled.
    pub fn can_find_bike(&self) -> Result<bool, FlowError> {
        Ok(self.is_on(RegistrationStep::SerialNumber)?
            && !self.lookup_in_flight
            && !self.form.payload().serial_number.trim().is_empty())
    }

    pub fn begin_find_bike(&mut self) -> Result<Begin<PendingLookup>, FlowError> {
        if !self.can_find_bike()? {
            return Ok(Begin::Skipped(StepOutcome::Blocked));
        }
        let lease = self.stepper()?.lease();
        self.lookup_in_flight = true;
        Ok(Begin::Started(PendingLookup {
            mount: self.mount,
            lease,
            serial_number: self.form.payload().serial_number.clone(),
        }))
    }

    pub fn complete_find_bike(
        &mut self,
        pending: PendingLookup,
        result: Result<BikeModel, ClientError>,
    ) -> Result<StepOutcome, FlowError> {
        if pending.mount != self.mount {
            warn!(serial_number = %pending.serial_number, "discarding lookup response for a previous mount");
            return Ok(StepOutcome::Discarded);
        }
        self.lookup_in_flight = false;
        let Some(stepper) = self.stepper.as_mut() else {
            return Err(FlowError::NotMounted);
        };
        if !stepper.is_lease_current(&pending.lease) {
            warn!(
                serial_number = %pending.serial_number,
                leased_step = pending.lease.step(),
                active_step = stepper.active_step(),
                "discarding stale lookup response"
            );
            return Ok(StepOutcome::Discarded);
        }

        match result {
            Ok(bike) => {
                info!(serial_number = %bike.serial_number, "bike found");
                self.form.reset_from_bike(&bike);
                stepper.set_step_completed(RegistrationStep::SerialNumber.index(), true);
                stepper.next_step();
                Ok(StepOutcome::Moved)
            }
            Err(err) => {
                warn!(serial_number = %pending.serial_number, error = %err, "bike lookup failed");
                self.form.set_error(Field::SerialNumber, err.to_string());
                Ok(StepOutcome::Stayed)
            }
        }
    }

    pub async fn find_bike(&mut self) -> Result<StepOutcome, FlowError> {
        let pending = match self.begin_find_bike()? {
            Begin::Started(pending) => pending,
            Begin::Skipped(outcome) => return Ok(outcome),
        };
        let result = self.api.verify_serial_number(pending.serial_number()).await;
        self.complete_find_bike(pending, result)
    }

    /// "Not my bike": back to the serial number.
    pub fn not_my_bike(&mut self) -> Result<StepOutcome, FlowError> {
        self.previous()
    }

    pub fn confirm_bike(&mut self) -> Result<StepOutcome, FlowError> {
        self.confirm_bike_at(Utc::now().date_naive())
    }

    pub fn confirm_bike_at(&mut self, today: NaiveDate) -> Result<StepOutcome, FlowError> {
        if !self.is_on(RegistrationStep::BikeInformation)? {
            return Ok(StepOutcome::Blocked);
        }
        if let Some(err) = self.form.payload().check_field(Field::DateOfPurchase, today) {
            self.form.set_error(err.field, err.message);
            return Ok(StepOutcome::Stayed);
        }
        self.form.clear_error(Field::DateOfPurchase);

        let stepper = self.stepper_mut()?;
        stepper.set_step_completed(RegistrationStep::BikeInformation.index(), true);
        Ok(moved_or_stayed(stepper.next_step()))
    }

    pub fn previous(&mut self) -> Result<StepOutcome, FlowError> {
        Ok(moved_or_stayed(self.stepper_mut()?.prev_step()))
    }

    pub fn begin_submit(&mut self) -> Result<Begin<PendingSubmit>, FlowError> {
        self.begin_submit_at(Utc::now().date_naive())
    }

    pub fn begin_submit_at(&mut self, today: NaiveDate) -> Result<Begin<PendingSubmit>, FlowError> {
        if !self.is_on(RegistrationStep::PersonalInformation)? || self.submit_in_flight {
            return Ok(Begin::Skipped(StepOutcome::Blocked));
        }
        let validation = self.form.payload().validate_at(today);
        let valid = validation.is_ok();
        self.form.record_validation(validation);
        if !valid {
            info!(
                errors = self.form.errors().len(),
                "registration not submitted, form is invalid"
            );
            return Ok(Begin::Skipped(StepOutcome::Stayed));
        }

        let lease = self.stepper()?.lease();
        self.submit_in_flight = true;
        Ok(Begin::Started(PendingSubmit {
            mount: self.mount,
            lease,
            payload: self.form.payload().clone(),
        }))
    }

    pub fn complete_submit(
        &mut self,
        pending: PendingSubmit,
        result: Result<RegistrationOutcome, ClientError>,
    ) -> Result<StepOutcome, FlowError> {
        if pending.mount != self.mount {
            warn!(serial_number = %pending.payload.serial_number, "discarding submission response for a previous mount");
            return Ok(StepOutcome::Discarded);
        }
        self.submit_in_flight = false;
        let Some(stepper) = self.stepper.as_mut() else {
            return Err(FlowError::NotMounted);
        };
        if !stepper.is_lease_current(&pending.lease) {
            warn!(
                serial_number = %pending.payload.serial_number,
                leased_step = pending.lease.step(),
                active_step = stepper.active_step(),
                "discarding stale submission response"
            );
            return Ok(StepOutcome::Discarded);
        }

        let confirmation = match result {
            Ok(outcome) => Confirmation::from(outcome),
            Err(err) => {
                warn!(serial_number = %pending.payload.serial_number, error = %err, "registration failed");
                Confirmation {
                    success: false,
                    message: err.to_string(),
                }
            }
        };
        info!(success = confirmation.success, "registration finished");
        self.confirmation = Some(confirmation);
        stepper.set_step_completed(RegistrationStep::PersonalInformation.index(), true);
        Ok(moved_or_stayed(stepper.next_step()))
    }

    pub async fn submit(&mut self) -> Result<StepOutcome, FlowError> {
        let pending = match self.begin_submit()? {
            Begin::Started(pending) => pending,
            Begin::Skipped(outcome) => return Ok(outcome),
        };
        let result = self.api.register_bike(pending.payload()).await;
        self.complete_submit(pending, result)
    }

    pub fn click_indicator(&mut self, index: usize) -> Result<StepOutcome, FlowError> {
        let stepper = self.stepper_mut()?;
        let before = stepper.active_step();
        if !stepper.click_indicator(index) {
            return Ok(StepOutcome::Blocked);
        }
        Ok(moved_or_stayed(stepper.active_step() != before))
    }
}

fn moved_or_stayed(moved: bool) -> StepOutcome {
    if moved {
        StepOutcome::Moved
    } else {
        StepOutcome::Stayed
    }
}

#[cfg(test)]
#[path = "tests/flow_tests.rs"]
mod tests;
