use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use shared::{
    domain::BikeModel,
    error::ErrorCode,
    protocol::{
        register_route, verify_serial_number_route, RegistrationOutcome,
        VerifySerialNumberRequest, API_BASE_PATH,
    },
    registration::RegistrationPayload,
};
use tracing::{debug, warn};
use url::Url;

use crate::{ClientError, RegistrationApi};

/// [`RegistrationApi`] over HTTP/JSON against `<server_url>/api`.
#[derive(Debug, Clone)]
pub struct HttpRegistrationApi {
    http: Client,
    api_base: Url,
}

impl HttpRegistrationApi {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: &str) -> Result<Self, ClientError> {
        let mut api_base = Url::parse(server_url.trim())?;
        let path = format!("{}{API_BASE_PATH}", api_base.path().trim_end_matches('/'));
        api_base.set_path(&path);
        Ok(Self { http, api_base })
    }

    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    fn endpoint(&self, route: &str) -> String {
        format!("{}{route}", self.api_base.as_str().trim_end_matches('/'))
    }
}

/// Either failure body the service produces: `{error, code}` from lookups,
/// `{success, message}` from registration.
#[derive(Debug, Default, Deserialize)]
struct FailureBody {
    #[serde(default)]
    code: Option<ErrorCode>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

async fn failure(response: Response) -> ClientError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let body: FailureBody = serde_json::from_str(&text).unwrap_or_default();
    let message = body
        .error
        .or(body.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| format!("request failed with status {status}"));
    ClientError::Api {
        status: status.as_u16(),
        code: body.code,
        message,
    }
}

#[async_trait]
impl RegistrationApi for HttpRegistrationApi {
    async fn verify_serial_number(&self, serial_number: &str) -> Result<BikeModel, ClientError> {
        let url = self.endpoint(verify_serial_number_route());
        debug!(%url, serial_number, "verifying serial number");
        let response = self
            .http
            .post(url)
            .json(&VerifySerialNumberRequest::new(serial_number))
            .send()
            .await?;

        if !response.status().is_success() {
            let err = failure(response).await;
            warn!(serial_number, error = %err, "serial number lookup failed");
            return Err(err);
        }
        Ok(response.json().await?)
    }

    async fn register_bike(
        &self,
        payload: &RegistrationPayload,
    ) -> Result<RegistrationOutcome, ClientError> {
        let url = self.endpoint(register_route());
        debug!(%url, serial_number = %payload.serial_number, "submitting registration");
        let response = self.http.post(url).json(payload).send().await?;

        if !response.status().is_success() {
            let err = failure(response).await;
            warn!(serial_number = %payload.serial_number, error = %err, "registration rejected");
            return Err(err);
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
