use std::path::PathBuf;
use std::time::Instant;

use anyhow::{anyhow, Result};
use clap::{value_t, App, Arg};
use log::warn;
use rockdiff_algorithms::density::estimate_density;
use rockdiff_core::{containers::PointCloud, math::minmax};
use rockdiff_io::ascii::{AsciiReader, DEFAULT_SKIP_ROWS};

struct Args {
    pub input_file: PathBuf,
    pub radius: f64,
    pub format: Option<String>,
    pub skip_rows: usize,
}

fn get_args() -> Result<Args> {
    let matches = App::new("rockdiff info")
        .version("0.1")
        .about("Prints information about the given change point cloud")
        .arg(
            Arg::with_name("INPUT")
                .short("i")
                .long("input")
                .takes_value(true)
                .value_name("INPUT")
                .help("Input point cloud with per-point displacement, as delimited text")
                .required(true),
        )
        .arg(
            Arg::with_name("RADIUS")
                .short("r")
                .long("radius")
                .takes_value(true)
                .default_value("0.5")
                .help("Search radius of the density estimation"),
        )
        .arg(
            Arg::with_name("FORMAT")
                .long("format")
                .takes_value(true)
                .help("Column format of the input file"),
        )
        .arg(
            Arg::with_name("SKIP_ROWS")
                .long("skip-rows")
                .takes_value(true)
                .help("Maximum number of leading rows to skip before the header or the data"),
        )
        .get_matches();

    let input_file = PathBuf::from(
        matches
            .value_of("INPUT")
            .ok_or_else(|| anyhow!("Missing input file"))?,
    );
    let radius = value_t!(matches, "RADIUS", f64)?;
    let skip_rows = if matches.is_present("SKIP_ROWS") {
        value_t!(matches, "SKIP_ROWS", usize)?
    } else {
        DEFAULT_SKIP_ROWS
    };

    Ok(Args {
        input_file,
        radius,
        format: matches.value_of("FORMAT").map(str::to_owned),
        skip_rows,
    })
}

fn print_ranges(cloud: &PointCloud) {
    println!("Ranges");
    if let Some(bounds) = cloud.bounds() {
        println!("\tX:                      {}  {}", bounds.min().x, bounds.max().x);
        println!("\tY:                      {}  {}", bounds.min().y, bounds.max().y);
        println!("\tZ:                      {}  {}", bounds.min().z, bounds.max().z);
    }
    if let Some((min, max)) = minmax(cloud.diffs().iter().copied()) {
        println!("\tDiff:                   {}  {}", min, max);
    }
    for (index, name) in cloud.layout().attributes().enumerate() {
        if let Some((min, max)) = minmax(cloud.attribute_column(index).iter().copied()) {
            println!("\t{:<24}{}  {}", format!("{}:", name), min, max);
        }
    }
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let args = get_args()?;
    let t_start = Instant::now();

    let mut reader = AsciiReader::from_path(&args.input_file)?.with_skip_rows(args.skip_rows);
    if let Some(format) = &args.format {
        reader = reader.with_format(format)?;
    }
    let cloud = reader.read()?;

    println!("rockdiff info report for {}", args.input_file.display());
    println!("Points: {}", cloud.len());
    println!("Attributes");
    println!("\t{}", cloud.layout());
    print_ranges(&cloud);

    match estimate_density(&cloud, args.radius) {
        Ok(estimate) => {
            println!("Density (radius {})", args.radius);
            println!("\tNeighbours:             {:.2}", estimate.mean_neighbors);
            println!("\tPoints per square unit: {:.2}", estimate.density);
            println!("\tMean spacing:           {:.4}", estimate.spacing);
        }
        Err(why) => warn!("No density estimate: {}", why),
    }

    println!("Took {:.2}s", t_start.elapsed().as_secs_f64());
    Ok(())
}
