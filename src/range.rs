//! ERDDAP griddap axis selectors.
//!
//! Every value is taken verbatim: dates are expected as `yyyy-mm-dd` (or any
//! other form the server accepts, e.g. `last`) and coordinates as decimal
//! degrees, but nothing here parses or checks them.

/// Selector for the zero-altitude axis some chlorophyll and productivity
/// datasets carry between time and latitude.
pub const FIXED_ALTITUDE: &str = "[(0.0):1:(0.0)]";

/// `[(v):(v)]`
pub fn point_range(value: &str) -> String {
    format!("[({value}):({value})]")
}

/// `[(start):(end)]`
pub fn interval_range(start: &str, end: &str) -> String {
    format!("[({start}):({end})]")
}

/// `[(start):1:(end)]`
pub fn grid_range(start: &str, end: &str) -> String {
    format!("[({start}):1:({end})]")
}

/// Bounds on one axis. A single point has `start == end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    pub start: String,
    pub end: String,
}

impl Range {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn point(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            start: value.clone(),
            end: value,
        }
    }

    /// Bounds where a missing end collapses onto the start.
    pub fn with_optional_end(start: impl Into<String>, end: Option<String>) -> Self {
        let start = start.into();
        let end = end.unwrap_or_else(|| start.clone());
        Self { start, end }
    }

    pub fn is_point(&self) -> bool {
        self.start == self.end
    }

    pub fn point_selector(&self) -> String {
        point_range(&self.start)
    }

    pub fn interval_selector(&self) -> String {
        interval_range(&self.start, &self.end)
    }

    pub fn grid_selector(&self) -> String {
        grid_range(&self.start, &self.end)
    }
}
