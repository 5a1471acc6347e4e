use chrono::{NaiveDate, Utc};
use shared::{
    domain::{BikeModel, RegistrationId},
    error::{ApiError, ErrorCode},
    protocol::{
        RegistrationOutcome, ALREADY_REGISTERED, INTERNAL_SERVER_ERROR, SERIAL_NUMBER_NOT_FOUND,
        SERIAL_NUMBER_REQUIRED,
    },
    registration::RegistrationPayload,
};
use storage::{RegistrationInsert, Storage};
use tracing::{error, info};

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

/// Looks up the catalog record for a user-entered serial number.
pub async fn verify_serial_number(
    ctx: &ApiContext,
    serial_number: Option<&str>,
) -> Result<BikeModel, ApiError> {
    let serial_number = serial_number
        .map(str::trim)
        .filter(|serial| !serial.is_empty())
        .ok_or_else(|| ApiError::new(ErrorCode::Validation, SERIAL_NUMBER_REQUIRED))?;

    ctx.storage
        .find_bike(serial_number)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, SERIAL_NUMBER_NOT_FOUND))
}

pub async fn register_bike(
    ctx: &ApiContext,
    payload: &RegistrationPayload,
) -> Result<RegistrationOutcome, ApiError> {
    register_bike_at(ctx, payload, Utc::now().date_naive()).await
}

/// Same as [`register_bike`] with an explicit "today" for date checks.
pub async fn register_bike_at(
    ctx: &ApiContext,
    payload: &RegistrationPayload,
    today: NaiveDate,
) -> Result<RegistrationOutcome, ApiError> {
    payload
        .validate_at(today)
        .map_err(|errors| ApiError::new(ErrorCode::Validation, errors.first_message()))?;

    let serial_number = payload.serial_number.trim();
    if ctx
        .storage
        .find_bike(serial_number)
        .await
        .map_err(internal)?
        .is_none()
    {
        return Err(ApiError::new(ErrorCode::NotFound, SERIAL_NUMBER_NOT_FOUND));
    }

    let mut record = payload.clone();
    record.serial_number = serial_number.to_string();

    let id = RegistrationId::new_v4();
    match ctx
        .storage
        .insert_registration(id, &record, Utc::now())
        .await
        .map_err(internal)?
    {
        RegistrationInsert::Inserted => {
            info!(%id, serial_number, "bike registered");
            Ok(RegistrationOutcome::registered(id))
        }
        RegistrationInsert::Duplicate => {
            Err(ApiError::new(ErrorCode::Conflict, ALREADY_REGISTERED))
        }
    }
}

fn internal(err: anyhow::Error) -> ApiError {
    error!(error = %err, "registration api failure");
    ApiError::new(ErrorCode::Internal, INTERNAL_SERVER_ERROR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::seed_catalog;

    async fn setup() -> ApiContext {
        let storage = Storage::new("sqlite::memory:").await.expect("db");
        storage.seed_catalog(&seed_catalog()).await.expect("seed");
        ApiContext { storage }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 1).expect("date")
    }

    fn payload(serial_number: &str) -> RegistrationPayload {
        RegistrationPayload {
            serial_number: serial_number.into(),
            model_description: "Bike Spark RC World Cup (TW) IGPG/L".into(),
            shop_name: "BMN SPORTECH".into(),
            first_name: "Kate".into(),
            last_name: "Courtney".into(),
            email: "kate@example.com".into(),
            country: "US".into(),
            date_of_purchase: NaiveDate::from_ymd_opt(2025, 7, 25),
            preferred_language: "English".into(),
            gender: "Female".into(),
            date_of_birth: None,
            news_opt_in: true,
            consent: true,
        }
    }

    #[tokio::test]
    async fn verify_returns_catalog_record() {
        let ctx = setup().await;
        let bike = verify_serial_number(&ctx, Some(" STM34D30L24110132N "))
            .await
            .expect("bike");
        assert_eq!(bike.shop_name, "BMN SPORTECH");
    }

    #[tokio::test]
    async fn verify_unknown_serial_is_not_found_with_user_message() {
        let ctx = setup().await;
        let err = verify_serial_number(&ctx, Some("UNKNOWN123"))
            .await
            .expect_err("should fail");
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, SERIAL_NUMBER_NOT_FOUND);
    }

    #[tokio::test]
    async fn verify_requires_a_serial_number() {
        let ctx = setup().await;
        for input in [None, Some(""), Some("   ")] {
            let err = verify_serial_number(&ctx, input)
                .await
                .expect_err("should fail");
            assert_eq!(err.code, ErrorCode::Validation);
            assert_eq!(err.message, SERIAL_NUMBER_REQUIRED);
        }
    }

    #[tokio::test]
    async fn register_stores_valid_payload() {
        let ctx = setup().await;
        let outcome = register_bike_at(&ctx, &payload("STM34D30L24110132N"), today())
            .await
            .expect("registered");
        assert!(outcome.success);
        let id = outcome.id.expect("id");

        let stored = ctx
            .storage
            .registration_for_serial("STM34D30L24110132N")
            .await
            .expect("query")
            .expect("stored");
        assert_eq!(stored.id, id);
    }

    #[tokio::test]
    async fn register_rejects_missing_consent_before_touching_storage() {
        let ctx = setup().await;
        let mut invalid = payload("STM34D30L24110132N");
        invalid.consent = false;
        let err = register_bike_at(&ctx, &invalid, today())
            .await
            .expect_err("should fail");
        assert_eq!(err.code, ErrorCode::Validation);
        assert_eq!(err.message, "You must provide consent to continue");
        assert!(ctx.storage.list_registrations().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn register_rejects_unknown_bike() {
        let ctx = setup().await;
        let err = register_bike_at(&ctx, &payload("UNKNOWN123"), today())
            .await
            .expect_err("should fail");
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn register_rejects_duplicate_registration() {
        let ctx = setup().await;
        register_bike_at(&ctx, &payload("STM34D30L24110132N"), today())
            .await
            .expect("first");
        let err = register_bike_at(&ctx, &payload("STM34D30L24110132N"), today())
            .await
            .expect_err("duplicate");
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.message, ALREADY_REGISTERED);
    }
}
