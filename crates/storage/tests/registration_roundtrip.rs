use chrono::{NaiveDate, Utc};
use shared::{
    domain::{seed_catalog, RegistrationId},
    registration::RegistrationPayload,
};
use storage::{RegistrationInsert, Storage};

#[tokio::test]
async fn file_backed_database_keeps_registrations_across_reopen() {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = std::env::temp_dir().join(format!("bike_registration_storage_test_{suffix}"));
    let db_path = temp_root.join("nested").join("registrations.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let payload = RegistrationPayload {
        serial_number: "STR30A20L24110345N".into(),
        model_description: "Bike Solace Gravel 10 (EU) eRIDE HMX".into(),
        shop_name: "Sports Megève".into(),
        first_name: "Jolanda".into(),
        last_name: "Neff".into(),
        email: "jolanda@example.ch".into(),
        country: "FR".into(),
        date_of_purchase: NaiveDate::from_ymd_opt(2025, 3, 14),
        preferred_language: "French".into(),
        gender: "Female".into(),
        date_of_birth: NaiveDate::from_ymd_opt(1993, 1, 5),
        news_opt_in: false,
        consent: true,
    };
    let id = RegistrationId::new_v4();

    {
        let storage = Storage::new(&database_url).await.expect("db");
        storage.seed_catalog(&seed_catalog()).await.expect("seed");
        let insert = storage
            .insert_registration(id, &payload, Utc::now())
            .await
            .expect("insert");
        assert_eq!(insert, RegistrationInsert::Inserted);
    }

    assert!(db_path.exists(), "database file should exist: {}", db_path.display());

    let reopened = Storage::new(&database_url).await.expect("reopen");
    let stored = reopened.list_registrations().await.expect("list");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, id);
    assert_eq!(stored[0].payload.date_of_birth, payload.date_of_birth);
    drop(reopened);

    std::fs::remove_dir_all(temp_root).expect("cleanup");
}
