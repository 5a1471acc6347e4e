//! Client side of bike registration: the HTTP transport to the registration
//! service and the headless multi-step flow that drives a [`stepper::Stepper`].

use async_trait::async_trait;
use shared::{
    domain::BikeModel, protocol::RegistrationOutcome, registration::RegistrationPayload,
};

pub mod error;
pub mod flow;
pub mod form;
pub mod transport;

pub use error::{ClientError, FlowError};
pub use flow::{
    Begin, Confirmation, FlowOptions, PendingLookup, PendingSubmit, RegistrationFlow,
    StepOutcome,
};
pub use form::RegistrationForm;
pub use transport::HttpRegistrationApi;

/// Verification and submission calls. Both may be slow and both may fail;
/// callers never retry.
#[async_trait]
pub trait RegistrationApi: Send + Sync {
    async fn verify_serial_number(&self, serial_number: &str) -> Result<BikeModel, ClientError>;

    async fn register_bike(
        &self,
        payload: &RegistrationPayload,
    ) -> Result<RegistrationOutcome, ClientError>;
}
