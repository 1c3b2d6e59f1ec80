use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use clap::{App, Arg, ArgMatches};
use log::warn;
use rockdiff_algorithms::alpha_shape::AlphaMode;
use rockdiff_algorithms::pipeline::{ChangeDetectionParams, MinPoints};
use rockdiff_core::math::ProjectionPlane;
use rockdiff_core::{ChangeError, Stage};
use rockdiff_io::ascii::{Delimiter, DEFAULT_SKIP_ROWS, FORMAT_LITERALS};

pub struct Args {
    pub input_file: PathBuf,
    pub output_dir: PathBuf,
    pub params: ChangeDetectionParams,
    pub keep_noise: bool,
    pub per_cluster: bool,
    pub plots: bool,
    pub format: Option<String>,
    pub delimiter: Option<Delimiter>,
    pub diff_column: Option<String>,
    pub skip_rows: usize,
}

pub fn get_args() -> Result<Args> {
    let format_help = format!(
        "Column format of the input file, one literal per column:\n{}",
        FORMAT_LITERALS
    );
    let matches = build_app(&format_help).get_matches();
    crate::init_logger(matches.is_present("VERBOSE"));

    let input_file = PathBuf::from(required(&matches, "INPUT")?);
    let output_dir = PathBuf::from(required(&matches, "OUTPUT")?);
    let params = get_params(&matches)?;
    params.validate()?;

    Ok(Args {
        input_file,
        output_dir,
        params,
        keep_noise: matches.is_present("KEEP_NOISE"),
        per_cluster: matches.is_present("PER_CLUSTER"),
        plots: matches.is_present("PLOTS"),
        format: matches.value_of("FORMAT").map(str::to_owned),
        delimiter: parse_value::<Delimiter>(&matches, "DELIMITER")?,
        diff_column: matches.value_of("DIFF_COLUMN").map(str::to_owned),
        skip_rows: parse_value(&matches, "SKIP_ROWS")?.unwrap_or(DEFAULT_SKIP_ROWS),
    })
}

fn build_app(format_help: &str) -> App<'static, '_> {
    App::new("rockdiff")
        .version("0.1")
        .about("Detects rockfalls in a change point cloud and measures their area and volume")
        .arg(Arg::with_name("INPUT").short("i").long("input").takes_value(true).value_name("INPUT").help("Input point cloud with per-point displacement, as delimited text").required(true))
        .arg(Arg::with_name("OUTPUT").short("o").long("output").takes_value(true).value_name("OUTPUT").help("Output directory").required(true))
        .arg(Arg::with_name("CONFIG").long("config").takes_value(true).value_name("FILE").help("JSON parameter file. Command line options override its values"))
        .arg(Arg::with_name("THRESHOLD").long("threshold").takes_value(true).allow_hyphen_values(true).help("Signed displacement threshold. Negative values detect loss, positive values gain [default: 0.2]"))
        .arg(Arg::with_name("EPS").long("eps").takes_value(true).help("DBSCAN neighbourhood radius [default: 1.0]"))
        .arg(Arg::with_name("MIN_POINTS").long("min-points").takes_value(true).value_name("N|auto").help("DBSCAN minimum neighbourhood size, or 'auto' to derive it from the point density [default: 15]"))
        .arg(Arg::with_name("DENSITY_RADIUS").long("density-radius").takes_value(true).help("Search radius of the density estimation with --min-points auto [default: 0.5]"))
        .arg(Arg::with_name("SAFETY_FACTOR").long("safety-factor").takes_value(true).help("Fraction of the expected neighbourhood size used with --min-points auto [default: 0.5]"))
        .arg(Arg::with_name("ALPHA").long("alpha").takes_value(true).value_name("A|auto|optimize").help("Alpha of the cluster boundaries. 0 yields the convex hull [default: auto]"))
        .arg(Arg::with_name("PERCENTILE").long("percentile").takes_value(true).help("Nearest neighbour distance percentile of the automatic alpha [default: 50]"))
        .arg(Arg::with_name("PLANE").long("plane").takes_value(true).possible_values(&["xy", "xz", "yz", "auto"]).help("Projection plane of the cluster footprints [default: xz]"))
        .arg(Arg::with_name("PRECISION").long("precision").takes_value(true).help("Decimals of the summary values [default: 3]"))
        .arg(Arg::with_name("KEEP_NOISE").long("keep-noise").help("Keep noise points in the clustered cloud with label -1"))
        .arg(Arg::with_name("PER_CLUSTER").long("per-cluster").help("Write one point cloud file per cluster"))
        .arg(Arg::with_name("PLOTS").long("plots").help("Write boundary and surface images of every cluster"))
        .arg(Arg::with_name("FORMAT").long("format").takes_value(true).help(format_help))
        .arg(Arg::with_name("DELIMITER").long("delimiter").takes_value(true).possible_values(&["comma", "semicolon", "whitespace"]).help("Column delimiter of the input file. Detected from the first row by default"))
        .arg(Arg::with_name("DIFF_COLUMN").long("diff-column").takes_value(true).help("Header name of the displacement column"))
        .arg(Arg::with_name("SKIP_ROWS").long("skip-rows").takes_value(true).help("Maximum number of leading rows to skip before the header or the data"))
        .arg(Arg::with_name("VERBOSE").short("v").long("verbose").help("Log debug messages"))
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .value_of(name)
        .ok_or_else(|| anyhow!("Missing argument {}", name))
}

fn parse_value<T>(matches: &ArgMatches, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    matches
        .value_of(name)
        .map(|value| {
            value
                .parse::<T>()
                .map_err(|e| anyhow!("Invalid value '{}' for {}: {}", value, name, e))
        })
        .transpose()
}

fn load_config(path: &Path) -> Result<ChangeDetectionParams> {
    let file = File::open(path).map_err(|e| ChangeError::io(Stage::Configuration, path, e))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Invalid parameter file {}", path.display()))
}

/// Parameters from the optional config file, overridden by the command line options
fn get_params(matches: &ArgMatches) -> Result<ChangeDetectionParams> {
    let mut params = match matches.value_of("CONFIG") {
        Some(path) => load_config(Path::new(path))?,
        None => ChangeDetectionParams::default(),
    };

    if let Some(threshold) = parse_value(matches, "THRESHOLD")? {
        params.threshold = threshold;
    }
    if let Some(eps) = parse_value(matches, "EPS")? {
        params.clustering.eps = eps;
    }
    match matches.value_of("MIN_POINTS") {
        Some("auto") => params.clustering.min_points = MinPoints::auto(),
        Some(_) => {
            if let Some(min_points) = parse_value(matches, "MIN_POINTS")? {
                params.clustering.min_points = MinPoints::Fixed(min_points);
            }
        }
        None => {}
    }
    let density_radius = parse_value(matches, "DENSITY_RADIUS")?;
    let safety_factor = parse_value(matches, "SAFETY_FACTOR")?;
    match &mut params.clustering.min_points {
        MinPoints::Auto {
            density_radius: radius,
            safety_factor: factor,
        } => {
            if let Some(density_radius) = density_radius {
                *radius = density_radius;
            }
            if let Some(safety_factor) = safety_factor {
                *factor = safety_factor;
            }
        }
        MinPoints::Fixed(_) => {
            if density_radius.is_some() || safety_factor.is_some() {
                warn!("--density-radius and --safety-factor only apply with --min-points auto");
            }
        }
    }

    match matches.value_of("ALPHA") {
        Some("auto") => params.boundary.alpha = AlphaMode::default(),
        Some("optimize") => params.boundary.alpha = AlphaMode::Optimize,
        Some(_) => {
            if let Some(alpha) = parse_value(matches, "ALPHA")? {
                params.boundary.alpha = AlphaMode::Fixed(alpha);
            }
        }
        None => {}
    }
    if let Some(percentile) = parse_value(matches, "PERCENTILE")? {
        match params.boundary.alpha {
            AlphaMode::Auto { .. } => params.boundary.alpha = AlphaMode::Auto { percentile },
            alpha => warn!(
                "--percentile only applies with automatic alpha, keeping alpha {}",
                alpha
            ),
        }
    }
    if let Some(plane) = parse_value::<ProjectionPlane>(matches, "PLANE")? {
        params.boundary.plane = plane;
    }
    if let Some(precision) = parse_value(matches, "PRECISION")? {
        params.precision = precision;
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn params_from(args: &[&str]) -> Result<ChangeDetectionParams> {
        let matches = build_app("")
            .get_matches_from_safe(["rockdiff", "-i", "in.txt", "-o", "out"].iter().chain(args))?;
        get_params(&matches)
    }

    #[test]
    fn test_percentile_sets_automatic_alpha() -> Result<()> {
        let params = params_from(&["--percentile", "30"])?;
        assert_eq!(params.boundary.alpha, AlphaMode::Auto { percentile: 30.0 });
        Ok(())
    }

    #[test]
    fn test_percentile_keeps_explicit_alpha() -> Result<()> {
        let params = params_from(&["--alpha", "optimize", "--percentile", "30"])?;
        assert_eq!(params.boundary.alpha, AlphaMode::Optimize);
        let params = params_from(&["--alpha", "0.5", "--percentile", "30"])?;
        assert_eq!(params.boundary.alpha, AlphaMode::Fixed(0.5));
        Ok(())
    }

    #[test]
    fn test_percentile_keeps_alpha_from_config() -> Result<()> {
        let path = std::env::temp_dir().join(format!("rockdiff_args_{}.json", std::process::id()));
        File::create(&path)?.write_all(br#"{"threshold": -0.3, "boundary": {"alpha": "optimize"}}"#)?;
        let params = params_from(&["--config", path.to_str().unwrap_or_default(), "--percentile", "30"]);
        std::fs::remove_file(&path)?;
        let params = params?;
        assert_eq!(params.threshold, -0.3);
        assert_eq!(params.boundary.alpha, AlphaMode::Optimize);
        Ok(())
    }

    #[test]
    fn test_min_points_auto_with_overrides() -> Result<()> {
        let params = params_from(&["--min-points", "auto", "--safety-factor", "0.8"])?;
        assert_eq!(
            params.clustering.min_points,
            MinPoints::Auto {
                density_radius: 0.5,
                safety_factor: 0.8
            }
        );
        Ok(())
    }
}
