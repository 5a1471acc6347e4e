use serde::{Deserialize, Serialize};

use crate::domain::RegistrationId;

/// Prefix shared by every registration endpoint.
pub const API_BASE_PATH: &str = "/api";

pub const SERIAL_NUMBER_REQUIRED: &str = "serialNumber is required";
pub const SERIAL_NUMBER_NOT_FOUND: &str =
    "Your Serial Number is wrong. Please check and try again.";
pub const INTERNAL_SERVER_ERROR: &str = "Internal server error";
pub const REGISTRATION_SUCCEEDED: &str =
    "Your bike has been successfully registered. You will receive a confirmation email shortly.";
pub const ALREADY_REGISTERED: &str = "This bike has already been registered.";

pub fn verify_serial_number_route() -> &'static str {
    "/verify-serial-number"
}

/// Older front ends post lookups to the catalog collection itself.
pub fn bikes_route() -> &'static str {
    "/bikes"
}

pub fn register_route() -> &'static str {
    "/register"
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifySerialNumberRequest {
    #[serde(default)]
    pub serial_number: Option<String>,
}

impl VerifySerialNumberRequest {
    pub fn new(serial_number: impl Into<String>) -> Self {
        Self {
            serial_number: Some(serial_number.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RegistrationId>,
    pub message: String,
}

impl RegistrationOutcome {
    pub fn registered(id: RegistrationId) -> Self {
        Self {
            success: true,
            id: Some(id),
            message: REGISTRATION_SUCCEEDED.to_string(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            id: None,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_request_tolerates_missing_serial_number() {
        let req: VerifySerialNumberRequest = serde_json::from_str("{}").expect("json");
        assert!(req.serial_number.is_none());

        let req: VerifySerialNumberRequest =
            serde_json::from_str(r#"{"serialNumber":"SN"}"#).expect("json");
        assert_eq!(req.serial_number.as_deref(), Some("SN"));
    }

    #[test]
    fn failed_outcome_omits_id() {
        let json = serde_json::to_value(RegistrationOutcome::failed("nope")).expect("json");
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "nope");
        assert!(json.get("id").is_none());
    }
}
