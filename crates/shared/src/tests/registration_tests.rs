use super::*;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, 1).expect("date")
}

fn complete_payload() -> RegistrationPayload {
    RegistrationPayload {
        serial_number: "STM34D30L24110132N".into(),
        model_description: "Bike Spark RC World Cup (TW) IGPG/L".into(),
        shop_name: "BMN SPORTECH".into(),
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        email: "ada@example.com".into(),
        country: "UK".into(),
        date_of_purchase: NaiveDate::from_ymd_opt(2025, 7, 25),
        preferred_language: "English".into(),
        gender: "Female".into(),
        date_of_birth: NaiveDate::from_ymd_opt(1990, 12, 10),
        news_opt_in: false,
        consent: true,
    }
}

#[test]
fn complete_payload_passes_validation() {
    complete_payload().validate_at(today()).expect("valid");
}

#[test]
fn missing_consent_fails_with_consent_message() {
    let payload = RegistrationPayload {
        consent: false,
        ..complete_payload()
    };
    let err = payload.validate_at(today()).expect_err("consent required");
    assert_eq!(err.errors().len(), 1);
    let consent = err.get(Field::Consent).expect("consent error");
    assert_eq!(consent.message, "You must provide consent to continue");
}

#[test]
fn validation_errors_display_each_field_and_box_as_std_error() {
    let payload = RegistrationPayload {
        first_name: String::new(),
        consent: false,
        ..complete_payload()
    };
    let err = payload.validate_at(today()).expect_err("invalid");
    assert_eq!(
        err.to_string(),
        "firstName: First name is required; consent: You must provide consent to continue"
    );
    let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(err);
    assert!(boxed.source().is_none());
}

#[test]
fn empty_payload_reports_every_required_field_in_order() {
    let err = RegistrationPayload::default()
        .validate_at(today())
        .expect_err("invalid");
    let fields: Vec<Field> = err.errors().iter().map(|e| e.field).collect();
    assert_eq!(
        fields,
        vec![
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
            Field::Consent,
        ]
    );
    assert_eq!(err.first_message(), "Serial number is required");
}

#[test]
fn whitespace_only_values_count_as_missing() {
    let payload = RegistrationPayload {
        first_name: "   ".into(),
        ..complete_payload()
    };
    let err = payload.validate_at(today()).expect_err("invalid");
    assert_eq!(
        err.get(Field::FirstName).map(|e| e.message.as_str()),
        Some("First name is required")
    );
}

#[test]
fn email_shapes() {
    assert!(is_valid_email("rider@shop.ch"));
    assert!(is_valid_email("first.last+tag@mail.example.org"));
    assert!(!is_valid_email("rider"));
    assert!(!is_valid_email("rider@shop"));
    assert!(!is_valid_email("@shop.ch"));
    assert!(!is_valid_email("rider@@shop.ch"));
    assert!(!is_valid_email("rider @shop.ch"));
    assert!(!is_valid_email("rider@shop..ch"));
}

#[test]
fn unknown_select_values_are_rejected() {
    let payload = RegistrationPayload {
        country: "Atlantis".into(),
        preferred_language: "Klingon".into(),
        gender: "Unknown".into(),
        ..complete_payload()
    };
    let err = payload.validate_at(today()).expect_err("invalid");
    assert!(err.get(Field::Country).is_some());
    assert!(err.get(Field::PreferredLanguage).is_some());
    assert!(err.get(Field::Gender).is_some());
}

#[test]
fn purchase_date_cannot_be_in_the_future_or_before_1900() {
    let future = RegistrationPayload {
        date_of_purchase: NaiveDate::from_ymd_opt(2025, 8, 2),
        ..complete_payload()
    };
    assert!(future.validate_at(today()).is_err());

    let ancient = RegistrationPayload {
        date_of_purchase: NaiveDate::from_ymd_opt(1899, 12, 31),
        ..complete_payload()
    };
    assert!(ancient.validate_at(today()).is_err());

    let same_day = RegistrationPayload {
        date_of_purchase: Some(today()),
        ..complete_payload()
    };
    assert!(same_day.validate_at(today()).is_ok());
}

#[test]
fn birthday_is_optional() {
    let payload = RegistrationPayload {
        date_of_birth: None,
        ..complete_payload()
    };
    assert!(payload.validate_at(today()).is_ok());
}

#[test]
fn step_validation_only_reports_fields_owned_by_the_step() {
    let payload = RegistrationPayload {
        serial_number: "SN".into(),
        ..RegistrationPayload::default()
    };
    payload
        .validate_step_at(RegistrationStep::SerialNumber, today())
        .expect("serial number step is complete");

    let err = payload
        .validate_step_at(RegistrationStep::BikeInformation, today())
        .expect_err("bike info incomplete");
    assert!(err.get(Field::DateOfPurchase).is_some());
    assert!(err.get(Field::FirstName).is_none());

    payload
        .validate_step_at(RegistrationStep::Confirmation, today())
        .expect("confirmation owns no fields");
}

#[test]
fn from_bike_prefills_descriptive_fields_only() {
    let bike = BikeModel::new("SN", "Model", "Shop");
    let payload = RegistrationPayload::from_bike(&bike);
    assert_eq!(payload.serial_number, "SN");
    assert_eq!(payload.model_description, "Model");
    assert_eq!(payload.shop_name, "Shop");
    assert!(payload.first_name.is_empty());
    assert!(!payload.consent);
}

#[test]
fn dates_serialize_as_midnight_utc_timestamps() {
    let json = serde_json::to_value(complete_payload()).expect("json");
    assert_eq!(json["dateOfPurchase"], "2025-07-25T00:00:00.000Z");
    assert_eq!(json["dateOfBirth"], "1990-12-10T00:00:00.000Z");
    assert_eq!(json["newsOptIn"], false);
}

#[test]
fn dates_deserialize_from_timestamps_plain_dates_and_null() {
    let payload: RegistrationPayload = serde_json::from_value(serde_json::json!({
        "serialNumber": "SN",
        "dateOfPurchase": "2025-07-24T22:00:00.000Z",
        "dateOfBirth": "1990-12-10",
    }))
    .expect("json");
    assert_eq!(payload.date_of_purchase, NaiveDate::from_ymd_opt(2025, 7, 24));
    assert_eq!(payload.date_of_birth, NaiveDate::from_ymd_opt(1990, 12, 10));

    let payload: RegistrationPayload =
        serde_json::from_value(serde_json::json!({ "dateOfBirth": null })).expect("json");
    assert!(payload.date_of_birth.is_none());
    assert!(payload.date_of_purchase.is_none());
}

#[test]
fn malformed_dates_are_rejected() {
    let result: Result<RegistrationPayload, _> =
        serde_json::from_value(serde_json::json!({ "dateOfPurchase": "yesterday" }));
    assert!(result.is_err());
}

#[test]
fn steps_round_trip_through_their_index() {
    for step in RegistrationStep::ALL {
        assert_eq!(RegistrationStep::from_index(step.index()), Some(step));
    }
    assert_eq!(RegistrationStep::from_index(4), None);
    assert_eq!(
        RegistrationStep::labels(),
        vec![
            "Serial number",
            "Bike information",
            "Personal information",
            "Registration confirmation"
        ]
    );
}
