//! Command line interface.

use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use erddap_harvest::resolver::{Frequency, Period, Sensor, chl_code, par_code, seascape_code};
use erddap_harvest::{
    CatalogVersion, Client, ClientOptions, Error, Format, Outcome, Output, Payload, Range,
    Request, Transport,
};

#[derive(Parser)]
#[command(name = "erddap-harvest", version, about, long_about = None)]
/// Download satellite ocean products from NOAA ERDDAP servers.
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Built-in catalog revision (v1 or v2)
    #[arg(long, global = true, default_value = "v2", value_parser = CatalogVersion::from_str)]
    pub catalog_version: CatalogVersion,

    /// JSON catalog replacing the built-in one
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Accept invalid TLS certificates
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,
}

// A single location over a date range. A missing end date means the start date only.
#[derive(Args)]
pub struct PointArgs {
    /// Latitude in decimal degrees, southern hemisphere negative
    #[arg(long = "lat", allow_hyphen_values = true)]
    pub latitude: String,

    /// Longitude in decimal degrees, western hemisphere negative
    #[arg(long = "lon", allow_hyphen_values = true)]
    pub longitude: String,

    /// Start date in yyyy-mm-dd
    #[arg(long = "from")]
    pub date_start: String,

    /// End date in yyyy-mm-dd
    #[arg(long = "to")]
    pub date_end: Option<String>,
}

// A bounding box over a date range.
#[derive(Args)]
pub struct BoxArgs {
    /// Minimum latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub minlat: String,

    /// Minimum longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub minlon: String,

    /// Maximum latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub maxlat: String,

    /// Maximum longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub maxlon: String,

    /// Start date in yyyy-mm-dd
    #[arg(long = "from")]
    pub date_start: String,

    /// End date in yyyy-mm-dd
    #[arg(long = "to")]
    pub date_end: Option<String>,
}

#[derive(Args)]
pub struct BatchArgs {
    /// Product codes, e.g. sst chl8d dhw (see `products`)
    #[arg(long, num_args = 1.., required = true)]
    pub param: Vec<String>,

    /// Start latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub latmin: String,

    /// End latitude; start latitude only when omitted
    #[arg(long, allow_hyphen_values = true)]
    pub latmax: Option<String>,

    /// Start longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lonmin: String,

    /// End longitude; start longitude only when omitted
    #[arg(long, allow_hyphen_values = true)]
    pub lonmax: Option<String>,

    /// Start date in yyyy-mm-dd
    #[arg(long)]
    pub ds: String,

    /// End date in yyyy-mm-dd; start date only when omitted
    #[arg(long)]
    pub de: Option<String>,

    /// Locality name used in output file names
    #[arg(long, default_value = "satprod")]
    pub loc: String,

    /// Directory for the result files
    #[arg(long, default_value = "./")]
    pub out: PathBuf,

    /// Print each table after saving it
    #[arg(long)]
    pub print: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Chlorophyll-a at one location from MODIS or VIIRS (CSV)
    Chl {
        /// Sensor: MODIS or VIIRS
        #[arg(long)]
        sensor: String,

        /// Aggregation: day, week or month
        #[arg(long)]
        frequency: String,

        #[command(flatten)]
        point: PointArgs,

        /// Output CSV file
        #[arg(long, default_value = "CHLoutput.csv")]
        fout: PathBuf,
    },

    /// Coral Reef Watch degree heating week and related variables at one location
    Dhw {
        #[command(flatten)]
        point: PointArgs,

        /// Output CSV file; nothing is written when omitted
        #[arg(long)]
        fout: Option<PathBuf>,

        /// Do not print the table
        #[arg(long)]
        quiet: bool,
    },

    /// MUR sea surface temperature, error, mask and sea ice fraction at one location (CSV)
    Sst {
        #[command(flatten)]
        point: PointArgs,

        /// Output CSV file
        #[arg(long, default_value = "SSToutput.csv")]
        fout: PathBuf,
    },

    /// Seascape classes at one location (CSV)
    Seascape {
        /// Product type: monthly (m) or 8 day (8d)
        #[arg(long = "type")]
        period: String,

        #[command(flatten)]
        point: PointArgs,

        /// Output CSV file
        #[arg(long, default_value = "SEASCAPEoutput.csv")]
        fout: PathBuf,
    },

    /// Seascape classes over a bounding box (NetCDF)
    SeascapeGrid {
        /// Product type: monthly (m) or 8 day (8d)
        #[arg(long = "type")]
        period: String,

        #[command(flatten)]
        bbox: BoxArgs,

        /// Output NetCDF file
        #[arg(long, default_value = "SEASCAPEgrid_output.nc")]
        fout: PathBuf,
    },

    /// MODIS photosynthetically available radiation over a bounding box
    ParGrid {
        /// Product type: monthly (m), 8 day (8d) or daily (1d)
        #[arg(long = "type")]
        period: String,

        #[command(flatten)]
        bbox: BoxArgs,

        /// Output format: nc or csv
        #[arg(long)]
        format: String,

        /// Output file name without extension
        #[arg(long, default_value = "PARgrid_output")]
        fout: String,
    },

    /// Several products over the same box, one CSV file per product
    Batch(BatchArgs),

    /// List the product codes of the active catalog
    Products {
        /// Dump the catalog as JSON (usable with --catalog)
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            catalog_version: self.catalog_version,
            catalog_path: self.catalog.clone(),
            verify_tls: !self.insecure,
            ..ClientOptions::default()
        }
    }
}

impl PointArgs {
    fn request(&self, code: &str) -> Request {
        Request::point(
            code,
            &self.latitude,
            &self.longitude,
            &self.date_start,
            self.date_end.clone(),
        )
    }
}

impl BoxArgs {
    fn request(&self, code: &str) -> Request {
        Request::grid(
            code,
            Range::new(&self.minlat, &self.maxlat),
            Range::new(&self.minlon, &self.maxlon),
            Range::with_optional_end(&self.date_start, self.date_end.clone()),
        )
    }
}

impl BatchArgs {
    fn request(&self) -> Request {
        Request::batch(
            self.param.clone(),
            Range::with_optional_end(&self.latmin, self.latmax.clone()),
            Range::with_optional_end(&self.lonmin, self.lonmax.clone()),
            Range::with_optional_end(&self.ds, self.de.clone()),
        )
        .display(self.print)
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let client = Client::new(cli.client_options()).context("failed to set up client")?;
    let mut out = io::stdout().lock();

    match &cli.command {
        Commands::Batch(args) => batch(&client, args, &mut out),
        Commands::Products { json } => products(&client, *json, &mut out),
        command => {
            let (req, output) = request(command)?;
            let outcome = client.retrieve(&req, output)?;
            report(&outcome, req.display, &mut out)
        }
    }
}

/// Request and retrieval strategy of a single-product command.
fn request(command: &Commands) -> Result<(Request, Output)> {
    Ok(match command {
        Commands::Chl {
            sensor,
            frequency,
            point,
            fout,
        } => {
            let code = chl_code(sensor.parse::<Sensor>()?, frequency.parse::<Frequency>()?);
            (point.request(code).target(fout), Output::Download)
        }
        Commands::Dhw { point, fout, quiet } => {
            let mut req = point.request("dhw").display(!quiet);
            if let Some(fout) = fout {
                req = req.target(fout);
            }
            (req, Output::Table)
        }
        Commands::Sst { point, fout } => (point.request("mursst").target(fout), Output::Download),
        Commands::Seascape { period, point, fout } => {
            let code = seascape_code(period.parse::<Period>()?)?;
            (point.request(code).target(fout), Output::Download)
        }
        Commands::SeascapeGrid { period, bbox, fout } => {
            let code = seascape_code(period.parse::<Period>()?)?;
            let req = bbox.request(code).format(Format::Nc).target(fout);
            (req, Output::Download)
        }
        Commands::ParGrid {
            period,
            bbox,
            format,
            fout,
        } => {
            let code = par_code(period.parse::<Period>()?);
            let format = format.parse::<Format>()?;
            let target = format!("{fout}.{}", format.extension());
            (bbox.request(code).format(format).target(target), Output::Download)
        }
        Commands::Batch(_) | Commands::Products { .. } => {
            bail!("not a single-product command")
        }
    })
}

fn report(outcome: &Outcome, display: bool, out: &mut impl Write) -> Result<()> {
    match &outcome.result {
        Ok(saved) => {
            match (&saved.path, &saved.payload) {
                (Some(path), Payload::Bytes(n)) => {
                    writeln!(out, "Results written to {} ({n} bytes)", path.display())?
                }
                (Some(path), Payload::Table(t)) => {
                    writeln!(out, "Results written to {} ({} rows)", path.display(), t.len())?
                }
                (None, Payload::Table(t)) if !display => {
                    writeln!(out, "{} rows retrieved", t.len())?
                }
                (None, _) => {}
            }
            if display {
                if let Some(t) = saved.table() {
                    writeln!(out, "{t}")?;
                }
            }
        }
        Err(e) => writeln!(out, "Failed: {}: {e}", outcome.product)?,
    }
    Ok(())
}

fn batch<T: Transport>(client: &Client<T>, args: &BatchArgs, out: &mut impl Write) -> Result<()> {
    let req = args.request();
    req.validate(client.catalog())?;
    Request::check_locality(&args.loc)?;
    if !args.out.is_dir() {
        bail!("output directory {} does not exist", args.out.display());
    }

    let mut failed = 0usize;
    for outcome in client.batch(&req, &args.loc, &args.out) {
        writeln!(out, "{}", outcome.product.to_uppercase())?;
        if let Some(url) = &outcome.url {
            writeln!(out, "{url}")?;
        }
        match &outcome.result {
            Ok(saved) => {
                if let Some(path) = &saved.path {
                    writeln!(out, "{}", path.display())?;
                }
                if req.display {
                    if let Some(t) = saved.table() {
                        writeln!(out, "{t}")?;
                    }
                }
            }
            Err(e) => {
                failed += 1;
                writeln!(out, "{e}")?;
                writeln!(out, "FAILED:{}", req.batch_file_name(&args.loc, &outcome.product))?;
            }
        }
    }

    if failed > 0 {
        writeln!(out, "{failed} of {} products failed", req.products.len())?;
    }
    Ok(())
}

fn products<T: Transport>(client: &Client<T>, json: bool, out: &mut impl Write) -> Result<()> {
    let catalog = client.catalog();
    if json {
        writeln!(out, "{}", catalog.to_json_pretty()?)?;
        return Ok(());
    }

    writeln!(out, "catalog {}", catalog.version)?;
    for (code, p) in &catalog.products {
        let altitude = if p.fixed_altitude { " +altitude" } else { "" };
        writeln!(
            out,
            "  {code:<8} {:<28} {:<3} {}{altitude}",
            p.dataset_id(),
            p.format,
            p.variables.join(",")
        )?;
        if let Some(note) = &p.note {
            writeln!(out, "           note: {note}")?;
        }
    }
    for code in &catalog.reserved {
        let undefined = Error::UndefinedProduct(code.clone(), catalog.version.clone());
        writeln!(out, "  {code:<8} {undefined}")?;
    }
    Ok(())
}
