//! Qualifiers used by the single-product commands and their mapping onto
//! catalog codes.

use std::str::FromStr;

use crate::catalog::{Catalog, Format, Product};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensor {
    Modis,
    Viirs,
}

impl FromStr for Sensor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MODIS" => Ok(Sensor::Modis),
            "VIIRS" => Ok(Sensor::Viirs),
            _ => Err(Error::UnknownQualifier {
                kind: "sensor",
                value: s.to_string(),
                expected: "MODIS, VIIRS",
            }),
        }
    }
}

/// Aggregation period for the chlorophyll command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Day,
    Week,
    Month,
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DAY" => Ok(Frequency::Day),
            "WEEK" => Ok(Frequency::Week),
            "MONTH" => Ok(Frequency::Month),
            _ => Err(Error::UnknownQualifier {
                kind: "frequency",
                value: s.to_string(),
                expected: "day, week, month",
            }),
        }
    }
}

/// Composite period for PAR and seascape products: `1d`, `8d` or `m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    OneDay,
    EightDay,
    Month,
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1d" => Ok(Period::OneDay),
            "8d" => Ok(Period::EightDay),
            "m" => Ok(Period::Month),
            _ => Err(Error::UnknownQualifier {
                kind: "product type",
                value: s.to_string(),
                expected: "m, 8d, 1d",
            }),
        }
    }
}

pub fn chl_code(sensor: Sensor, frequency: Frequency) -> &'static str {
    match (sensor, frequency) {
        (Sensor::Modis, Frequency::Day) => "mchl1d",
        (Sensor::Modis, Frequency::Week) => "mchl8d",
        (Sensor::Modis, Frequency::Month) => "mchl1m",
        (Sensor::Viirs, Frequency::Day) => "chl1d",
        (Sensor::Viirs, Frequency::Week) => "chl8d",
        (Sensor::Viirs, Frequency::Month) => "chl1m",
    }
}

pub fn par_code(period: Period) -> &'static str {
    match period {
        Period::OneDay => "par1d",
        Period::EightDay => "par8d",
        Period::Month => "par1m",
    }
}

/// Seascapes are only published as 8-day and monthly composites.
pub fn seascape_code(period: Period) -> Result<&'static str> {
    match period {
        Period::EightDay => Ok("ssc8d"),
        Period::Month => Ok("ssc1m"),
        Period::OneDay => Err(Error::UnknownQualifier {
            kind: "seascape product type",
            value: "1d".to_string(),
            expected: "m, 8d",
        }),
    }
}

/// Look up `code` and return the product with the requested response format.
pub fn resolve(catalog: &Catalog, code: &str, format: Option<Format>) -> Result<Product> {
    let product = catalog.get(code)?.clone();
    Ok(match format {
        Some(f) => product.with_format(f),
        None => product,
    })
}
