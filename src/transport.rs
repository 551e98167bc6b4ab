use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::error::{Error, Result};

pub const DEFAULT_USER_AGENT: &str = concat!("erddap-harvest/", env!("CARGO_PKG_VERSION"));

/// Narrow network seam: one GET, whole body back.
pub trait Transport {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Blocking reqwest transport. No timeout beyond the client default.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: HttpClient,
}

impl HttpTransport {
    pub fn new(user_agent: &str, verify_tls: bool) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .unwrap_or(HeaderValue::from_static(DEFAULT_USER_AGENT)),
        );

        let mut builder = HttpClient::builder().default_headers(headers);
        if !verify_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build()?;

        Ok(Self { http })
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        debug!(url, "GET");
        let mut resp = self.http.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let mut buf = Vec::new();
        resp.copy_to(&mut buf)?;
        debug!(url, bytes = buf.len(), "response received");
        Ok(buf)
    }
}
