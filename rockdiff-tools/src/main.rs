#![warn(clippy::all)]

mod args;
mod plotting;

use std::path::Path;
use std::time::Instant;

use anyhow::{anyhow, Result};
use log::{info, warn, LevelFilter};
use rockdiff_algorithms::pipeline::{detect_changes, ChangeReport};
use rockdiff_core::containers::PointCloud;
use rockdiff_core::{ChangeError, Stage};
use rockdiff_io::ascii::{
    write_cluster_files, AsciiFormat, AsciiReader, AsciiWriter, NoisePolicy, SummaryWriter,
};

use crate::args::{get_args, Args};

/// Initializes the logger with level `info`, or `debug` if `verbose` is set. `RUST_LOG` takes precedence
pub(crate) fn init_logger(verbose: bool) {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

fn read_cloud(args: &Args) -> Result<PointCloud> {
    let mut reader = AsciiReader::from_path(&args.input_file)?.with_skip_rows(args.skip_rows);
    if let Some(format) = &args.format {
        reader = reader.with_format(format)?;
    }
    if let Some(delimiter) = args.delimiter {
        reader = reader.with_delimiter(delimiter);
    }
    if let Some(diff_column) = &args.diff_column {
        reader = reader.with_diff_column(diff_column);
    }
    reader.read()
}

fn write_report(report: &ChangeReport, stem: &str, args: &Args) -> Result<()> {
    let clusters_path = args.output_dir.join(format!("{}_clusters.txt", stem));
    let noise = if args.keep_noise {
        NoisePolicy::Keep
    } else {
        NoisePolicy::Drop
    };
    let mut writer = AsciiWriter::from_path(&clusters_path)?;
    let written = writer.write_clustered_cloud(&report.filtered.cloud, &report.labels, noise)?;
    writer.flush()?;
    info!(
        "Wrote {} clustered points to {}",
        written,
        clusters_path.display()
    );

    let summary_path = args.output_dir.join(format!("{}_summary.csv", stem));
    let summaries = report.summaries().cloned().collect::<Vec<_>>();
    let mut writer = SummaryWriter::from_path(&summary_path)?;
    writer.set_precision(args.params.precision as usize);
    writer.write(report.kind, &summaries)?;
    writer.flush()?;
    info!("Wrote cluster summary to {}", summary_path.display());

    if args.per_cluster {
        let files = write_cluster_files(
            args.output_dir.join("clusters"),
            stem,
            &report.filtered.cloud,
            &report.labels,
            6,
        )?;
        info!("Wrote {} cluster files", files.len());
    }
    Ok(())
}

fn write_plots(report: &ChangeReport, stem: &str, output_dir: &Path) {
    let plot_dir = output_dir.join("plots");
    if let Err(why) = std::fs::create_dir_all(&plot_dir) {
        warn!("Could not create {}: {}", plot_dir.display(), why);
        return;
    }
    let diffs = report.filtered.cloud.diffs();
    for cluster in report.clusters.iter() {
        if cluster.mesh.is_empty() {
            continue;
        }
        let label = cluster.summary.label;
        let boundary_path = plot_dir.join(format!("{}_c{}_boundary.png", stem, label));
        if let Err(why) = plotting::plot_boundary(cluster, &boundary_path) {
            warn!("Could not plot {}: {}", boundary_path.display(), why);
        }

        let magnitudes = cluster
            .indices
            .iter()
            .map(|index| report.filtered.threshold.magnitude(diffs[*index]))
            .collect::<Vec<_>>();
        let surface_path = plot_dir.join(format!("{}_c{}_surface.png", stem, label));
        if let Err(why) = plotting::plot_surface(cluster, &magnitudes, &surface_path) {
            warn!("Could not plot {}: {}", surface_path.display(), why);
        }
    }
}

fn print_report(report: &ChangeReport) {
    println!(
        "{} {} clusters (min_points = {}), {} points labelled as noise",
        report.clusters.len(),
        report.kind,
        report.min_points,
        report.labels.noise_count()
    );
    for summary in report.summaries() {
        println!(
            "\tCluster {:>4}: {:>6} points  area {:>10}  volume {:>10}  {}",
            summary.label, summary.point_count, summary.area, summary.volume, summary.status
        );
    }
    println!(
        "Total area {:.3}, total volume {:.3}",
        report.total_area(),
        report.total_volume()
    );
}

fn main() -> Result<()> {
    let args = get_args()?;
    let t_start = Instant::now();

    let cloud = read_cloud(&args)?;
    info!(
        "Read {} points with attributes '{}' from {}",
        cloud.len(),
        cloud.layout(),
        args.input_file.display()
    );

    let report = detect_changes(&cloud, &args.params)?;

    std::fs::create_dir_all(&args.output_dir)
        .map_err(|e| ChangeError::io(Stage::Output, &args.output_dir, e))?;
    let stem = args
        .input_file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("Could not get file name of {}", args.input_file.display()))?;
    write_report(&report, &stem, &args)?;
    if args.plots {
        write_plots(&report, &stem, &args.output_dir);
    }

    print_report(&report);
    info!("Took {:.2}s", t_start.elapsed().as_secs_f64());
    Ok(())
}
