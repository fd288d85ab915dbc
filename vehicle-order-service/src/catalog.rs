//! Fixed option sets offered by the order form.

use serde::Serialize;

pub const VEHICLE_MODELS: &[&str] = &["Sedan", "SUV", "Truck", "Hatchback", "Convertible"];

pub const COLORS: &[&str] = &["Red", "Blue", "Black", "White", "Silver", "Green"];

pub const WHEELS: &[&str] = &["Standard Alloy", "Premium Alloy", "Chrome", "Carbon Fiber"];

pub const FEATURES: &[&str] = &[
    "Navigation System",
    "Heated Seats",
    "Sunroof",
    "Premium Audio",
    "Leather Interior",
    "Backup Camera",
];

#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    pub models: &'static [&'static str],
    pub colors: &'static [&'static str],
    pub wheels: &'static [&'static str],
    pub features: &'static [&'static str],
}

pub fn catalog() -> Catalog {
    Catalog { models: VEHICLE_MODELS, colors: COLORS, wheels: WHEELS, features: FEATURES }
}

pub fn contains(options: &[&str], value: &str) -> bool { options.iter().any(|o| *o == value) }
