use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

use crate::catalog::{self, COLORS, FEATURES, VEHICLE_MODELS, WHEELS};

pub const ORDER_ID_PREFIX: &str = "ORD";
const ORDER_ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please fill in all required fields")]
    MissingRequiredFields,
    #[error("Unknown {field}: {value}")]
    UnknownOption { field: &'static str, value: String },
    #[error("Unknown form field: {0}")]
    UnknownField(String),
}

/// Form state as the customer fills it in. Empty strings mean "not provided".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderInput {
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub model: String,
    pub color: String,
    pub wheels: String,
    /// Selected features in the order they were picked.
    pub features: Vec<String>,
    pub special_requests: String,
}

impl OrderInput {
    /// Sets one text field by its form name (`customerName`, `email`, ...).
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) -> Result<(), ValidationError> {
        let slot = match name {
            "customerName" => &mut self.customer_name,
            "email" => &mut self.email,
            "phone" => &mut self.phone,
            "model" => &mut self.model,
            "color" => &mut self.color,
            "wheels" => &mut self.wheels,
            "specialRequests" => &mut self.special_requests,
            other => return Err(ValidationError::UnknownField(other.to_string())),
        };
        *slot = value.into();
        Ok(())
    }

    /// Adds the feature when absent, removes it when present.
    pub fn toggle_feature(&mut self, feature: &str) {
        let before = self.features.len();
        self.features.retain(|f| f != feature);
        if self.features.len() == before {
            self.features.push(feature.to_string());
        }
    }

    pub fn reset(&mut self) { *self = Self::default(); }

    pub fn is_empty(&self) -> bool { *self == Self::default() }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [&self.customer_name, &self.email, &self.model, &self.color];
        if required.iter().any(|v| v.is_empty()) {
            return Err(ValidationError::MissingRequiredFields);
        }
        check_option("model", &self.model, VEHICLE_MODELS)?;
        check_option("color", &self.color, COLORS)?;
        if !self.wheels.is_empty() {
            check_option("wheels", &self.wheels, WHEELS)?;
        }
        for feature in &self.features {
            check_option("feature", feature, FEATURES)?;
        }
        Ok(())
    }
}

fn check_option(field: &'static str, value: &str, options: &[&str]) -> Result<(), ValidationError> {
    if catalog::contains(options, value) {
        Ok(())
    } else {
        Err(ValidationError::UnknownOption { field, value: value.to_string() })
    }
}

fn iso_millis<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// The order as published to the broker. Built once per accepted submission;
/// text fields are carried exactly as entered, so unset optionals stay `""`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub order_id: String,
    #[serde(serialize_with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub model: String,
    pub color: String,
    pub wheels: String,
    pub features: Vec<String>,
    pub special_requests: String,
}

impl OrderRecord {
    /// Validates the input and stamps a fresh order id and timestamp.
    pub fn build(input: &OrderInput) -> Result<Self, ValidationError> {
        input.validate()?;
        Ok(Self::stamped(input, generate_order_id(), Utc::now()))
    }

    fn stamped(input: &OrderInput, order_id: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            order_id,
            timestamp,
            customer_name: input.customer_name.clone(),
            email: input.email.clone(),
            phone: input.phone.clone(),
            model: input.model.clone(),
            color: input.color.clone(),
            wheels: input.wheels.clone(),
            features: distinct(&input.features),
            special_requests: input.special_requests.clone(),
        }
    }
}

// A JSON body may repeat a feature; the first pick wins.
fn distinct(features: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(features.len());
    for f in features {
        if !out.contains(f) {
            out.push(f.clone());
        }
    }
    out
}

/// `ORD-<epoch millis>-<9 base36 chars>`; the suffix is drawn from a v4 UUID.
pub fn generate_order_id() -> String {
    let mut bits = Uuid::new_v4().as_u128();
    let mut suffix = String::with_capacity(ORDER_ID_SUFFIX_LEN);
    for _ in 0..ORDER_ID_SUFFIX_LEN {
        suffix.push(BASE36[(bits % 36) as usize] as char);
        bits /= 36;
    }
    format!("{ORDER_ID_PREFIX}-{}-{suffix}", Utc::now().timestamp_millis())
}
