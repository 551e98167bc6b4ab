use std::path::PathBuf;

use crate::catalog::{Catalog, Format};
use crate::error::{Error, Result};
use crate::range::Range;

/// How the axis bounds are rendered into selectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Selection {
    /// Time interval `[(a):(b)]` at a single location `[(v):(v)]`.
    #[default]
    TimeSeries,
    /// Every axis as `[(a):1:(b)]`.
    Grid,
}

/// A retrieval for one or more products over the same bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub products: Vec<String>,
    pub time: Range,
    pub latitude: Range,
    pub longitude: Range,
    pub selection: Selection,
    /// Overrides the catalog response format.
    pub format: Option<Format>,
    pub target: Option<PathBuf>,
    /// Echo the parsed table on the console.
    pub display: bool,
}

impl Request {
    /// Time series at one location; a missing end date means a single day.
    pub fn point(
        product: impl Into<String>,
        latitude: impl Into<String>,
        longitude: impl Into<String>,
        date_start: impl Into<String>,
        date_end: Option<String>,
    ) -> Self {
        Self {
            products: vec![product.into()],
            time: Range::with_optional_end(date_start, date_end),
            latitude: Range::point(latitude),
            longitude: Range::point(longitude),
            selection: Selection::TimeSeries,
            format: None,
            target: None,
            display: false,
        }
    }

    pub fn grid(
        product: impl Into<String>,
        latitude: Range,
        longitude: Range,
        time: Range,
    ) -> Self {
        Self::batch(vec![product.into()], latitude, longitude, time)
    }

    /// Grid selection for several products sharing the same bounds.
    pub fn batch(products: Vec<String>, latitude: Range, longitude: Range, time: Range) -> Self {
        Self {
            products,
            time,
            latitude,
            longitude,
            selection: Selection::Grid,
            format: None,
            target: None,
            display: false,
        }
    }

    pub fn target(mut self, path: impl Into<PathBuf>) -> Self {
        self.target = Some(path.into());
        self
    }

    pub fn display(mut self, display: bool) -> Self {
        self.display = display;
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// The only product of a single-product request.
    pub fn product(&self) -> Result<&str> {
        match self.products.as_slice() {
            [code] => Ok(code),
            [] => Err(Error::InvalidRequest("no product requested".into())),
            _ => Err(Error::InvalidRequest(format!(
                "expected one product, got {}",
                self.products.len()
            ))),
        }
    }

    /// Reject requests naming codes the catalog does not accept, before any
    /// URL is built.
    pub fn validate(&self, catalog: &Catalog) -> Result<()> {
        if self.products.is_empty() {
            return Err(Error::InvalidRequest("no product requested".into()));
        }
        let unknown = catalog.unknown(&self.products);
        if !unknown.is_empty() {
            return Err(Error::UnknownProduct(unknown.join(", ")));
        }
        Ok(())
    }

    /// A batch locality ends up in file names and must not name a directory.
    pub fn check_locality(locality: &str) -> Result<()> {
        if locality.contains(['/', '\\']) {
            return Err(Error::InvalidRequest(format!(
                "locality must be a plain name without path separators, got {locality:?}"
            )));
        }
        Ok(())
    }

    /// `<locality>_<code>_<yyyymmdd>-<yyyymmdd>.csv`
    pub fn batch_file_name(&self, locality: &str, code: &str) -> String {
        format!(
            "{locality}_{code}_{}-{}.csv",
            self.time.start.replace('-', ""),
            self.time.end.replace('-', "")
        )
    }
}
