use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unknown product code: {0}")]
    UnknownProduct(String),

    #[error("product {0} has no dataset defined in catalog {1}")]
    UndefinedProduct(String, String),

    #[error("unknown {kind}: {value} (expected one of {expected})")]
    UnknownQualifier {
        kind: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("response contained no table header")]
    EmptyTable,
}

impl Error {
    /// Input errors abort a run before any network activity; everything else
    /// is scoped to a single product request.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidRequest(_) | Error::UnknownProduct(_) | Error::UnknownQualifier { .. }
        )
    }
}
