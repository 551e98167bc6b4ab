use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::error::{Error, Result};

const COASTWATCH: &str = "https://coastwatch.pfeg.noaa.gov/erddap/griddap";
const AOML: &str = "https://cwcgom.aoml.noaa.gov/erddap/griddap";
const PACIOOS: &str = "https://pae-paha.pacioos.hawaii.edu/erddap/griddap";

const DHW_VARIABLES: [&str; 4] = ["CRW_DHW", "CRW_HOTSPOT", "CRW_SST", "CRW_SSTANOMALY"];

const DHW_NOTE: &str =
    "dhw is served from NOAA_DHW (coastwatch) in catalog v1 and dhw_5km (pacioos) in catalog v2";

/// Codes accepted on the command line that neither built-in catalog defines.
/// The historical batch tooling listed `sstclim` without ever settling on a
/// dataset or variable set for it.
const RESERVED_CODES: [&str; 1] = ["sstclim"];

/// Response encoding requested from the server, selected by the dataset URL
/// extension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Csv,
    Nc,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Nc => "nc",
        }
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Format::Csv),
            "nc" | "netcdf" => Ok(Format::Nc),
            _ => Err(Error::UnknownQualifier {
                kind: "format",
                value: s.to_string(),
                expected: "nc, csv",
            }),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.extension())
    }
}

/// One griddap dataset and the variables requested from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Dataset URL without extension, e.g. `https://host/erddap/griddap/jplMURSST41`.
    pub dataset_url: String,
    pub variables: Vec<String>,
    /// Whether the dataset has a zero-altitude axis between time and latitude.
    #[serde(default)]
    pub fixed_altitude: bool,
    #[serde(default)]
    pub format: Format,
    /// Known disagreement between catalog versions for this entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Product {
    fn new(host: &str, dataset: &str, variables: &[&str], fixed_altitude: bool) -> Self {
        Self {
            dataset_url: format!("{host}/{dataset}"),
            variables: variables.iter().map(|v| v.to_string()).collect(),
            fixed_altitude,
            format: Format::Csv,
            note: None,
        }
    }

    fn noted(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }

    /// Same dataset, different response encoding.
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// `<dataset_url>.<csv|nc>?`
    pub fn base_url(&self) -> String {
        format!("{}.{}?", self.dataset_url, self.format.extension())
    }

    /// Last path segment of the dataset URL.
    pub fn dataset_id(&self) -> &str {
        self.dataset_url
            .rsplit('/')
            .next()
            .unwrap_or(&self.dataset_url)
    }
}

/// Built-in catalog revisions. They only disagree on the `dhw` dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CatalogVersion {
    V1,
    #[default]
    V2,
}

impl FromStr for CatalogVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(CatalogVersion::V1),
            "v2" | "2" => Ok(CatalogVersion::V2),
            _ => Err(Error::UnknownQualifier {
                kind: "catalog version",
                value: s.to_string(),
                expected: "v1, v2",
            }),
        }
    }
}

impl fmt::Display for CatalogVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogVersion::V1 => f.write_str("v1"),
            CatalogVersion::V2 => f.write_str("v2"),
        }
    }
}

/// Product code -> dataset mapping. Built once per run and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub version: String,
    /// Codes that are valid input but have no dataset in this catalog.
    #[serde(default)]
    pub reserved: Vec<String>,
    pub products: BTreeMap<String, Product>,
}

impl Catalog {
    pub fn builtin(version: CatalogVersion) -> Self {
        let mut products = BTreeMap::new();
        let mut add = |code: &str, p: Product| {
            products.insert(code.to_string(), p);
        };

        // MUR sea surface temperature
        add(
            "sst",
            Product::new(COASTWATCH, "jplMURSST41", &["analysed_sst", "analysis_error"], false),
        );
        add(
            "mursst",
            Product::new(
                COASTWATCH,
                "jplMURSST41",
                &["analysed_sst", "analysis_error", "mask", "sea_ice_fraction"],
                false,
            ),
        );
        add("ssta", Product::new(COASTWATCH, "jplMURSST41anom1day", &["sstAnom"], false));

        // MODIS particulate organic / inorganic carbon
        add("poc1d", Product::new(COASTWATCH, "erdMPOC1day", &["poc"], false));
        add("poc8d", Product::new(COASTWATCH, "erdMPOC8day", &["poc"], false));
        add("poc1m", Product::new(COASTWATCH, "erdMPOCmday", &["poc"], false));
        add("pic1d", Product::new(COASTWATCH, "erdMPIC1day", &["pic"], false));
        add("pic8d", Product::new(COASTWATCH, "erdMPIC8day", &["pic"], false));
        add("pic1m", Product::new(COASTWATCH, "erdMPICmday", &["pic"], false));

        // VIIRS chlorophyll (altitude axis) and MODIS chlorophyll
        add("chl1d", Product::new(COASTWATCH, "nesdisVHNSQchlaDaily", &["chlor_a"], true));
        add("chl8d", Product::new(COASTWATCH, "nesdisVHNSQchlaWeekly", &["chlor_a"], true));
        add("chl1m", Product::new(COASTWATCH, "nesdisVHNSQchlaMonthly", &["chlor_a"], true));
        add("mchl1d", Product::new(COASTWATCH, "erdMH1chla1day", &["chlorophyll"], false));
        add("mchl8d", Product::new(COASTWATCH, "erdMH1chla8day", &["chlorophyll"], false));
        add("mchl1m", Product::new(COASTWATCH, "erdMH1chlamday", &["chlorophyll"], false));

        // Coral Reef Watch degree heating week
        let dhw = match version {
            CatalogVersion::V1 => Product::new(COASTWATCH, "NOAA_DHW", &DHW_VARIABLES, false),
            CatalogVersion::V2 => Product::new(PACIOOS, "dhw_5km", &DHW_VARIABLES, false),
        };
        add("dhw", dhw.noted(DHW_NOTE));

        // MODIS photosynthetically available radiation
        add("par1d", Product::new(COASTWATCH, "erdMH1par01day", &["par"], false));
        add("par8d", Product::new(COASTWATCH, "erdMH1par08day", &["par"], false));
        add("par1m", Product::new(COASTWATCH, "erdMH1par0mday", &["par"], false));

        // Primary productivity
        add("pp1d", Product::new(COASTWATCH, "erdMH1pp1day", &["productivity"], true));
        add("pp3d", Product::new(COASTWATCH, "erdMH1pp3day", &["productivity"], true));
        add("pp8d", Product::new(COASTWATCH, "erdMH1pp8day", &["productivity"], true));
        add("pp1m", Product::new(COASTWATCH, "erdMH1ppmday", &["productivity"], true));

        // Seascapes
        add("ssc8d", Product::new(AOML, "noaa_aoml_seascapes_8day", &["CLASS", "P"], false));
        add("ssc1m", Product::new(AOML, "noaa_aoml_4729_9ee6_ab54", &["CLASS", "P"], false));

        // CHIRPS rainfall
        add("prec1d", Product::new(COASTWATCH, "chirps20GlobalDailyP05", &["precip"], false));
        add("prec1m", Product::new(COASTWATCH, "chirps20GlobalMonthlyP05", &["precip"], false));

        Self {
            version: version.to_string(),
            reserved: RESERVED_CODES.iter().map(|c| c.to_string()).collect(),
            products,
        }
    }

    pub fn from_json(s: &str) -> Result<Self> {
        let catalog: Catalog = serde_json::from_str(s)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Every dataset URL must be absolute http(s) and every product must
    /// request at least one variable.
    pub fn validate(&self) -> Result<()> {
        for (code, p) in &self.products {
            let url = Url::parse(&p.dataset_url)?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::InvalidRequest(format!(
                    "{code}: dataset url must be http(s), got {}",
                    p.dataset_url
                )));
            }
            if p.dataset_url.contains('?') {
                return Err(Error::InvalidRequest(format!(
                    "{code}: dataset url must not carry a query: {}",
                    p.dataset_url
                )));
            }
            if p.variables.is_empty() {
                return Err(Error::InvalidRequest(format!("{code}: no variables listed")));
            }
        }
        Ok(())
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.products
            .keys()
            .map(|k| k.as_str())
            .chain(self.reserved.iter().map(|k| k.as_str()))
    }

    /// Whether `code` is accepted as input (defined or reserved).
    pub fn is_known(&self, code: &str) -> bool {
        self.products.contains_key(code) || self.reserved.iter().any(|c| c == code)
    }

    /// Codes from `codes` that this catalog does not accept.
    pub fn unknown<'a>(&self, codes: &'a [String]) -> Vec<&'a str> {
        codes
            .iter()
            .filter(|c| !self.is_known(c))
            .map(|c| c.as_str())
            .collect()
    }

    pub fn get(&self, code: &str) -> Result<&Product> {
        if let Some(p) = self.products.get(code) {
            if let Some(note) = &p.note {
                warn!(
                    code,
                    catalog = %self.version,
                    note = %note,
                    "catalog entry differs between versions"
                );
            }
            return Ok(p);
        }
        if self.reserved.iter().any(|c| c == code) {
            return Err(Error::UndefinedProduct(code.to_string(), self.version.clone()));
        }
        Err(Error::UnknownProduct(code.to_string()))
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin(CatalogVersion::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalogs_validate() {
        Catalog::builtin(CatalogVersion::V1).validate().unwrap();
        Catalog::builtin(CatalogVersion::V2).validate().unwrap();
    }

    #[test]
    fn sst_resolves_to_mur() {
        let c = Catalog::default();
        let p = c.get("sst").unwrap();
        assert_eq!(
            p.base_url(),
            "https://coastwatch.pfeg.noaa.gov/erddap/griddap/jplMURSST41.csv?"
        );
        assert_eq!(p.variables, vec!["analysed_sst", "analysis_error"]);
        assert!(!p.fixed_altitude);
        assert_eq!(p.dataset_id(), "jplMURSST41");
    }

    #[test]
    fn versions_disagree_only_on_dhw() {
        let v1 = Catalog::builtin(CatalogVersion::V1);
        let v2 = Catalog::builtin(CatalogVersion::V2);
        assert_eq!(v1.get("dhw").unwrap().dataset_id(), "NOAA_DHW");
        assert_eq!(v2.get("dhw").unwrap().dataset_id(), "dhw_5km");
        assert_eq!(
            v1.get("dhw").unwrap().variables,
            v2.get("dhw").unwrap().variables
        );
        assert!(v2.get("dhw").unwrap().note.is_some());

        for (code, p) in &v1.products {
            if code != "dhw" {
                assert_eq!(Some(p), v2.products.get(code), "{code}");
            }
        }
    }

    #[test]
    fn unknown_and_reserved_codes() {
        let c = Catalog::default();
        assert!(matches!(c.get("bogus"), Err(Error::UnknownProduct(_))));
        assert!(matches!(c.get("sstclim"), Err(Error::UndefinedProduct(_, _))));
        assert!(c.is_known("sstclim"));
        assert!(!c.is_known("bogus"));

        let asked = vec!["sst".to_string(), "bogus".to_string(), "chl1d".to_string()];
        assert_eq!(c.unknown(&asked), vec!["bogus"]);
    }

    #[test]
    fn altitude_axis_products() {
        let c = Catalog::default();
        for code in ["chl1d", "chl8d", "chl1m", "pp1d", "pp3d", "pp8d", "pp1m"] {
            assert!(c.get(code).unwrap().fixed_altitude, "{code}");
        }
        assert!(!c.get("mchl1d").unwrap().fixed_altitude);
    }

    #[test]
    fn json_catalog_substitutes_builtin() {
        let json = r#"{
            "version": "test",
            "products": {
                "fake": {
                    "dataset_url": "http://localhost/erddap/griddap/fake",
                    "variables": ["a", "b"],
                    "format": "nc"
                }
            }
        }"#;
        let c = Catalog::from_json(json).unwrap();
        let p = c.get("fake").unwrap();
        assert_eq!(p.base_url(), "http://localhost/erddap/griddap/fake.nc?");
        assert!(!p.fixed_altitude);
        assert!(c.reserved.is_empty());
        assert!(matches!(c.get("sst"), Err(Error::UnknownProduct(_))));
    }

    #[test]
    fn json_catalog_is_validated() {
        let json =
            r#"{"version":"x","products":{"a":{"dataset_url":"ftp://h/a","variables":["v"]}}}"#;
        assert!(matches!(Catalog::from_json(json), Err(Error::InvalidRequest(_))));

        let json =
            r#"{"version":"x","products":{"a":{"dataset_url":"https://h/a","variables":[]}}}"#;
        assert!(matches!(Catalog::from_json(json), Err(Error::InvalidRequest(_))));

        let json =
            r#"{"version":"x","products":{"a":{"dataset_url":"not a url","variables":["v"]}}}"#;
        assert!(matches!(Catalog::from_json(json), Err(Error::Url(_))));
    }

    #[test]
    fn builtin_round_trips_through_json() {
        let c = Catalog::builtin(CatalogVersion::V1);
        let back = Catalog::from_json(&c.to_json_pretty().unwrap()).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn parses_version_and_format() {
        assert_eq!("V1".parse::<CatalogVersion>().unwrap(), CatalogVersion::V1);
        assert_eq!("v2".parse::<CatalogVersion>().unwrap(), CatalogVersion::V2);
        assert!("v3".parse::<CatalogVersion>().is_err());
        assert_eq!("NC".parse::<Format>().unwrap(), Format::Nc);
        assert_eq!("csv".parse::<Format>().unwrap(), Format::Csv);
        assert!("grib".parse::<Format>().is_err());
    }
}
