use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::catalog::{Catalog, CatalogVersion, Format};
use crate::error::Result;
use crate::fetch::{Outcome, Output, Payload, Saved, download, fetch_table};
use crate::query::build_url;
use crate::request::Request;
use crate::resolver::resolve;
use crate::transport::{DEFAULT_USER_AGENT, HttpTransport, Transport};

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub catalog_version: CatalogVersion,
    /// JSON catalog replacing the built-in one.
    pub catalog_path: Option<PathBuf>,
    pub verify_tls: bool,
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            catalog_version: CatalogVersion::default(),
            catalog_path: None,
            verify_tls: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Client<T = HttpTransport> {
    catalog: Catalog,
    transport: T,
}

impl Client<HttpTransport> {
    pub fn new(opts: ClientOptions) -> Result<Self> {
        let catalog = match &opts.catalog_path {
            Some(path) => Catalog::load(path)?,
            None => Catalog::builtin(opts.catalog_version),
        };
        let transport = HttpTransport::new(&opts.user_agent, opts.verify_tls)?;
        debug!(catalog = %catalog.version, products = catalog.products.len(), "client ready");
        Ok(Self::with_transport(catalog, transport))
    }

    pub fn default_client() -> Result<Self> {
        Self::new(ClientOptions::default())
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(catalog: Catalog, transport: T) -> Self {
        Self { catalog, transport }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Final request URL for `code` under the request's bounds.
    pub fn url_for(&self, code: &str, request: &Request) -> Result<String> {
        let product = resolve(&self.catalog, code, request.format)?;
        Ok(build_url(&product, request))
    }

    /// Retrieve the single product of `request`.
    ///
    /// Input errors (unknown code, several products) are returned before any
    /// network call. Transport, status and parse failures are reported in the
    /// returned [`Outcome`] instead.
    ///
    /// [`Output::Download`] writes to the request target, defaulting to
    /// `<code>.<csv|nc>`; [`Output::Table`] writes only when a target is set.
    pub fn retrieve(&self, request: &Request, output: Output) -> Result<Outcome> {
        request.validate(&self.catalog)?;
        let code = request.product()?;
        let product = match resolve(&self.catalog, code, request.format) {
            Ok(p) => p,
            Err(e) if e.is_input_error() => return Err(e),
            Err(e) => return Ok(Outcome::failed(code, None, e)),
        };
        let url = build_url(&product, request);
        debug!(product = code, url = %url, "request url");

        let result = match output {
            Output::Download => {
                let path = request.target.clone().unwrap_or_else(|| {
                    PathBuf::from(format!("{code}.{}", product.format.extension()))
                });
                download(&self.transport, &url, &path).map(|bytes| Saved {
                    path: Some(path),
                    payload: Payload::Bytes(bytes),
                })
            }
            Output::Table => {
                fetch_table(&self.transport, &url, request.target.as_deref()).map(|table| Saved {
                    path: request.target.clone(),
                    payload: Payload::Table(table),
                })
            }
        };

        Ok(match result {
            Ok(saved) => Outcome {
                product: code.to_string(),
                url: Some(url),
                result: Ok(saved),
            },
            Err(e) => Outcome::failed(code, Some(url), e),
        })
    }

    /// Fetch every product of `request` as a CSV table and write each one to
    /// `out_dir/<locality>_<code>_<start>-<end>.csv`, whatever the catalog
    /// format of the product.
    ///
    /// Products are processed lazily and strictly in order. A product that
    /// fails to resolve, download or parse yields a failed [`Outcome`] and
    /// the next product is still attempted. A locality containing a path
    /// separator fails every product.
    pub fn batch<'a>(
        &'a self,
        request: &'a Request,
        locality: &'a str,
        out_dir: &'a Path,
    ) -> impl Iterator<Item = Outcome> + 'a {
        request
            .products
            .iter()
            .map(move |code| self.batch_item(request, code, locality, out_dir))
    }

    fn batch_item(&self, request: &Request, code: &str, locality: &str, out_dir: &Path) -> Outcome {
        let url = match Request::check_locality(locality)
            .and_then(|()| resolve(&self.catalog, code, Some(Format::Csv)))
        {
            Ok(product) => build_url(&product, request),
            Err(e) => return Outcome::failed(code, None, e),
        };
        let path = out_dir.join(request.batch_file_name(locality, code));
        info!(product = code, url = %url, "fetching");

        match fetch_table(&self.transport, &url, Some(&path)) {
            Ok(table) => Outcome {
                product: code.to_string(),
                url: Some(url),
                result: Ok(Saved {
                    path: Some(path),
                    payload: Payload::Table(table),
                }),
            },
            Err(e) => Outcome::failed(code, Some(url), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    use super::*;
    use crate::error::Error;
    use crate::range::Range;

    const SST_CSV: &str = "time,latitude,longitude,analysed_sst,analysis_error\n\
                           UTC,degrees_north,degrees_east,degree_C,degree_C\n\
                           2020-01-01T09:00:00Z,10.0,-65.0,26.8,0.37\n";

    /// Canned bodies keyed by dataset id; records every URL it was asked for.
    #[derive(Default)]
    struct FakeTransport {
        bodies: BTreeMap<&'static str, &'static str>,
        requested: RefCell<Vec<String>>,
    }

    impl FakeTransport {
        fn with(mut self, dataset: &'static str, body: &'static str) -> Self {
            self.bodies.insert(dataset, body);
            self
        }
    }

    impl Transport for FakeTransport {
        fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.requested.borrow_mut().push(url.to_string());
            let dataset = url
                .split('?')
                .next()
                .and_then(|p| p.rsplit('/').next())
                .and_then(|f| f.split('.').next())
                .unwrap_or_default();
            match self.bodies.get(dataset) {
                Some(body) => Ok(body.as_bytes().to_vec()),
                None => Err(Error::Status {
                    status: 404,
                    url: url.to_string(),
                }),
            }
        }
    }

    fn sst_batch(products: &[&str]) -> Request {
        Request::batch(
            products.iter().map(|p| p.to_string()).collect(),
            Range::new("10", "12"),
            Range::new("-65", "-63"),
            Range::new("2020-01-01", "2020-01-31"),
        )
    }

    #[test]
    fn batch_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let client = Client::with_transport(
            Catalog::default(),
            FakeTransport::default().with("jplMURSST41", SST_CSV),
        );
        let req = sst_batch(&["bogus", "sst", "sstclim", "ssta"]);
        let outcomes: Vec<Outcome> = client.batch(&req, "carib", dir.path()).collect();

        assert_eq!(outcomes.len(), 4);
        assert!(matches!(outcomes[0].result, Err(Error::UnknownProduct(_))));
        assert!(outcomes[0].url.is_none());

        assert!(outcomes[1].is_success());
        let path = dir.path().join("carib_sst_20200101-20200131.csv");
        assert_eq!(outcomes[1].path(), Some(path.as_path()));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), SST_CSV);

        assert!(matches!(outcomes[2].result, Err(Error::UndefinedProduct(_, _))));
        assert!(matches!(outcomes[3].result, Err(Error::Status { status: 404, .. })));
        assert!(!dir.path().join("carib_ssta_20200101-20200131.csv").exists());

        // bogus and sstclim never reach the network
        assert_eq!(client.transport().requested.borrow().len(), 2);
    }

    #[test]
    fn batch_sst_url_matches_single_assembly() {
        let dir = tempfile::tempdir().unwrap();
        let client = Client::with_transport(
            Catalog::default(),
            FakeTransport::default().with("jplMURSST41", SST_CSV),
        );
        let req = sst_batch(&["sst"]);
        let outcome = client.batch(&req, "satprod", dir.path()).next().unwrap();
        let expected = client.url_for("sst", &req).unwrap();
        assert_eq!(outcome.url.as_deref(), Some(expected.as_str()));
        assert_eq!(client.transport().requested.borrow().as_slice(), &[expected]);
    }

    #[test]
    fn rerun_writes_identical_file() {
        let dir = tempfile::tempdir().unwrap();
        let client = Client::with_transport(
            Catalog::default(),
            FakeTransport::default().with("jplMURSST41", SST_CSV),
        );
        let req = sst_batch(&["sst"]);
        let first = client.batch(&req, "satprod", dir.path()).next().unwrap();
        let a = std::fs::read(first.path().unwrap()).unwrap();
        let second = client.batch(&req, "satprod", dir.path()).next().unwrap();
        let b = std::fs::read(second.path().unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn batch_requests_csv_for_netcdf_catalog_entries() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::from_json(
            r#"{"version":"t","products":{"g":{"dataset_url":"http://localhost/erddap/griddap/g","variables":["v"],"format":"nc"}}}"#,
        )
        .unwrap();
        let client = Client::with_transport(catalog, FakeTransport::default().with("g", SST_CSV));
        let req = sst_batch(&["g"]);

        let outcome = client.batch(&req, "satprod", dir.path()).next().unwrap();
        assert!(outcome.is_success());
        assert!(
            outcome
                .url
                .as_deref()
                .unwrap()
                .starts_with("http://localhost/erddap/griddap/g.csv?v%5B")
        );
        let path = dir.path().join("satprod_g_20200101-20200131.csv");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), SST_CSV);

        // single retrieval still honours the catalog format
        assert!(client.url_for("g", &req).unwrap().contains("/g.nc?"));
    }

    #[test]
    fn batch_rejects_locality_with_path_separator() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();
        let client = Client::with_transport(
            Catalog::default(),
            FakeTransport::default().with("jplMURSST41", SST_CSV),
        );
        let req = sst_batch(&["sst"]);

        let outcome = client.batch(&req, "../escaped", &out).next().unwrap();
        assert!(matches!(outcome.result, Err(Error::InvalidRequest(_))));
        assert!(client.transport().requested.borrow().is_empty());
        assert!(!dir.path().join("escaped_sst_20200101-20200131.csv").exists());
    }

    #[test]
    fn retrieve_rejects_unknown_product_before_network() {
        let client = Client::with_transport(Catalog::default(), FakeTransport::default());
        let req = Request::point("bogus", "1", "2", "2020-01-01", None);
        let err = client.retrieve(&req, Output::Download).unwrap_err();
        assert!(err.is_input_error());
        assert!(client.transport().requested.borrow().is_empty());
    }

    #[test]
    fn retrieve_downloads_netcdf_grid() {
        let dir = tempfile::tempdir().unwrap();
        let client = Client::with_transport(
            Catalog::default(),
            FakeTransport::default().with("noaa_aoml_seascapes_8day", "CDF"),
        );
        let target = dir.path().join("SEASCAPEgrid_output.nc");
        let req = Request::grid(
            "ssc8d",
            Range::new("20", "22"),
            Range::new("-90", "-88"),
            Range::new("2019-01-01", "2019-02-01"),
        )
        .format(Format::Nc)
        .target(&target);

        let outcome = client.retrieve(&req, Output::Download).unwrap();
        assert!(outcome.is_success());
        assert_eq!(std::fs::read(&target).unwrap(), b"CDF");
        let url = outcome.url.unwrap();
        assert!(url.starts_with(
            "https://cwcgom.aoml.noaa.gov/erddap/griddap/noaa_aoml_seascapes_8day.nc?CLASS%5B"
        ));
    }

    #[test]
    fn retrieve_reports_transport_failure() {
        let dir = tempfile::tempdir().unwrap();
        let client = Client::with_transport(Catalog::default(), FakeTransport::default());
        let target = dir.path().join("CHLoutput.csv");
        let req = Request::point("mchl1d", "1", "2", "2020-01-01", None).target(&target);
        let outcome = client.retrieve(&req, Output::Download).unwrap();
        assert!(!outcome.is_success());
        assert_eq!(outcome.product, "mchl1d");
        assert!(!target.exists());
    }

    #[test]
    fn retrieve_table_without_target_keeps_table_in_memory() {
        let client = Client::with_transport(
            Catalog::default(),
            FakeTransport::default().with("dhw_5km", SST_CSV),
        );
        let req = Request::point("dhw", "-17.5", "146.2", "2020-02-01", None).display(true);
        let outcome = client.retrieve(&req, Output::Table).unwrap();
        let saved = outcome.result.as_ref().unwrap();
        assert!(saved.path.is_none());
        assert_eq!(saved.table().unwrap().len(), 2);

        let url = outcome.url.unwrap();
        assert!(url.contains("%5B%282020-02-01%29%3A%282020-02-01%29%5D"));
    }

    #[test]
    fn retrieve_table_parse_failure_is_reported() {
        let client = Client::with_transport(
            Catalog::default(),
            FakeTransport::default().with("dhw_5km", "a,b\n1,2,3\n"),
        );
        let req = Request::point("dhw", "1", "2", "2020-01-01", None);
        let outcome = client.retrieve(&req, Output::Table).unwrap();
        assert!(matches!(outcome.result, Err(Error::Csv(_))));
    }

    #[test]
    fn substituted_catalog_drives_urls() {
        let catalog = Catalog::from_json(
            r#"{"version":"t","products":{"x":{"dataset_url":"http://localhost/erddap/griddap/x","variables":["v"],"fixed_altitude":true}}}"#,
        )
        .unwrap();
        let client = Client::with_transport(catalog, FakeTransport::default());
        let req = Request::point("x", "1", "2", "2020-01-01", None);
        assert_eq!(
            client.url_for("x", &req).unwrap(),
            "http://localhost/erddap/griddap/x.csv?v\
             %5B%282020-01-01%29%3A%282020-01-01%29%5D%5B%280.0%29%3A1%3A%280.0%29%5D\
             %5B%281%29%3A%281%29%5D%5B%282%29%3A%282%29%5D"
        );
    }
}
