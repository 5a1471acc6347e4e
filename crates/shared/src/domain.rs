use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new_v4() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_newtype!(RegistrationId);

/// Catalog record returned by a serial number lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BikeModel {
    pub serial_number: String,
    pub model_description: String,
    pub shop_name: String,
}

impl BikeModel {
    pub fn new(
        serial_number: impl Into<String>,
        model_description: impl Into<String>,
        shop_name: impl Into<String>,
    ) -> Self {
        Self {
            serial_number: serial_number.into(),
            model_description: model_description.into(),
            shop_name: shop_name.into(),
        }
    }
}

/// A `value`/`label` pair offered by a select or radio field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
}

const fn option(value: &'static str, label: &'static str) -> SelectOption {
    SelectOption { value, label }
}

pub const COUNTRIES: &[SelectOption] = &[
    option("US", "United States"),
    option("UK", "United Kingdom"),
    option("DE", "Germany"),
    option("FR", "France"),
    option("ES", "Spain"),
];

pub const LANGUAGES: &[SelectOption] = &[
    option("English", "English"),
    option("French", "French"),
    option("German", "German"),
    option("Italian", "Italian"),
    option("Spanish", "Spanish"),
];

pub const GENDERS: &[SelectOption] = &[
    option("Male", "Male"),
    option("Female", "Female"),
    option("Other", "Other"),
];

pub fn is_known_option(options: &[SelectOption], value: &str) -> bool {
    options.iter().any(|candidate| candidate.value == value)
}

/// Bikes known to a freshly seeded catalog.
pub fn seed_catalog() -> Vec<BikeModel> {
    vec![
        BikeModel::new(
            "STM34D30L24110132N",
            "Bike Spark RC World Cup (TW) IGPG/L",
            "BMN SPORTECH",
        ),
        BikeModel::new(
            "STR30A20L24110345N",
            "Bike Solace Gravel 10 (EU) eRIDE HMX",
            "Sports Megève",
        ),
        BikeModel::new(
            "SCR29A20M24110345N",
            "Bike Foil RC Pro (TW)",
            "Tri bike Genève",
        ),
        BikeModel::new(
            "SCR33A20M24110345N",
            "Bike Addict Gravel RC",
            "C'est gravel ou pas SARL",
        ),
        BikeModel::new("SGM07F20M24110345N", "Bike Gambler RC", "Avalanche Sports"),
    ]
}
