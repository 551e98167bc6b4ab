//! Request URL assembly: `<base>?<var><constraint>,<var><constraint>,...`

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::catalog::Product;
use crate::range::FIXED_ALTITUDE;
use crate::request::{Request, Selection};

/// Everything except RFC 3986 unreserved characters and `/` is escaped, so
/// brackets, parentheses and colons reach the server as `%5B %28 %3A %29 %5D`.
const CONSTRAINT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// Axis selectors in server order: time, optional altitude, latitude, longitude.
pub fn constraint(request: &Request, fixed_altitude: bool) -> String {
    let mut out = match request.selection {
        Selection::TimeSeries => request.time.interval_selector(),
        Selection::Grid => request.time.grid_selector(),
    };
    if fixed_altitude {
        out.push_str(FIXED_ALTITUDE);
    }
    match request.selection {
        Selection::TimeSeries => {
            out.push_str(&request.latitude.point_selector());
            out.push_str(&request.longitude.point_selector());
        }
        Selection::Grid => {
            out.push_str(&request.latitude.grid_selector());
            out.push_str(&request.longitude.grid_selector());
        }
    }
    out
}

pub fn encode(constraint: &str) -> String {
    utf8_percent_encode(constraint, CONSTRAINT).to_string()
}

/// Base URL followed by each variable carrying the same encoded constraint.
pub fn assemble(base_url: &str, variables: &[String], encoded_constraint: &str) -> String {
    let terms: Vec<String> = variables
        .iter()
        .map(|v| format!("{v}{encoded_constraint}"))
        .collect();
    format!("{base_url}{}", terms.join(","))
}

pub fn build_url(product: &Product, request: &Request) -> String {
    let encoded = encode(&constraint(request, product.fixed_altitude));
    assemble(&product.base_url(), &product.variables, &encoded)
}
