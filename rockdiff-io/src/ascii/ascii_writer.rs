use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use itertools::Itertools;
use log::debug;
use rockdiff_algorithms::summary::ClusterSummary;
use rockdiff_algorithms::threshold::ChangeKind;
use rockdiff_core::containers::{ClusterId, ClusterLabels, PointCloud};
use rockdiff_core::layout::attributes;
use rockdiff_core::{ChangeError, Stage};

use super::{format_value, Delimiter};

/// Name of the cluster label column of a clustered cloud
pub const LABEL_COLUMN: &str = "label";

/// Formatting options shared by all ascii writers
pub trait AsciiFormat {
    fn set_delimiter(&mut self, delimiter: Delimiter);
    /// Maximum number of decimals of written values. Trailing zeros are never written
    fn set_precision(&mut self, precision: usize);
}

/// What to do with noise points when writing a clustered cloud
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NoisePolicy {
    /// Noise points are written with the label `-1`
    Keep,
    Drop,
}

// A buffered file or caller supplied sink. Errors name the file if there is one
struct Sink<W: Write> {
    writer: W,
    path: Option<PathBuf>,
}

impl Sink<BufWriter<File>> {
    fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| ChangeError::io(Stage::Output, path, e))?;
        Ok(Self {
            writer: BufWriter::new(file),
            path: Some(path.to_owned()),
        })
    }
}

impl<W: Write> Sink<W> {
    fn line(&mut self, line: &str) -> Result<()> {
        let result = self
            .writer
            .write_all(line.as_bytes())
            .and_then(|_| self.writer.write_all(b"\n"));
        self.check(result)
    }

    fn flush(&mut self) -> Result<()> {
        let result = self.writer.flush();
        self.check(result)
    }

    fn check(&self, result: std::io::Result<()>) -> Result<()> {
        match (result, &self.path) {
            (Ok(()), _) => Ok(()),
            (Err(e), Some(path)) => Err(ChangeError::io(Stage::Output, path, e).into()),
            (Err(e), None) => Err(e.into()),
        }
    }
}

/// Writer for point clouds as delimited text, one point per line in the column order
/// `x y z <attributes...> diff`, optionally followed by the cluster label. A header row naming the columns is written
/// first, so the files can be read back with [AsciiReader](super::AsciiReader)
pub struct AsciiWriter<W: Write> {
    sink: Sink<W>,
    delimiter: Delimiter,
    precision: usize,
}

impl AsciiWriter<BufWriter<File>> {
    /// Creates a new `AsciiWriter` by creating or overwriting the file at the given `path`.
    ///
    /// # Examples
    /// ```no_run
    /// use anyhow::Result;
    /// use rockdiff_core::{containers::PointCloud, layout::PointLayout};
    /// use rockdiff_io::ascii::AsciiWriter;
    /// fn main() -> Result<()> {
    ///     let mut writer = AsciiWriter::from_path("output.txt")?;
    ///     writer.write_cloud(&PointCloud::new(PointLayout::new()))?;
    ///     writer.flush()?;
    ///     Ok(())
    /// }
    /// ```
    ///
    /// # Errors
    ///
    /// If `path` cannot be created or overwritten, a [ChangeError::Io] is returned
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_sink(Sink::create(path.as_ref())?))
    }
}

impl<W: Write> AsciiWriter<W> {
    /// Creates a new `AsciiWriter` writing to `write`, with comma delimiter and 6 decimals
    pub fn from_write(write: W) -> Self {
        Self::from_sink(Sink {
            writer: write,
            path: None,
        })
    }

    fn from_sink(sink: Sink<W>) -> Self {
        Self {
            sink,
            delimiter: Delimiter::Comma,
            precision: 6,
        }
    }

    /// Writes the header and all points of `cloud`
    pub fn write_cloud(&mut self, cloud: &PointCloud) -> Result<()> {
        self.write_header(cloud, false)?;
        for point in cloud.iter() {
            let row = self.point_row(cloud, point.index());
            self.sink.line(&row)?;
        }
        Ok(())
    }

    /// Writes the header and the points of `cloud` with their cluster label appended. Points are written in the
    /// order of `cloud`. Returns the number of written points
    pub fn write_clustered_cloud(
        &mut self,
        cloud: &PointCloud,
        labels: &ClusterLabels,
        noise: NoisePolicy,
    ) -> Result<usize> {
        if labels.len() != cloud.len() {
            bail!(
                "Expected one label per point ({}) but got {} labels.",
                cloud.len(),
                labels.len()
            );
        }
        self.write_header(cloud, true)?;
        let mut written = 0;
        for (index, label) in labels.labels().iter().enumerate() {
            if *label == ClusterId::Noise && noise == NoisePolicy::Drop {
                continue;
            }
            let row = format!(
                "{}{}{}",
                self.point_row(cloud, index),
                self.delimiter.as_separator(),
                label.as_i64()
            );
            self.sink.line(&row)?;
            written += 1;
        }
        debug!("Wrote {} of {} clustered points", written, cloud.len());
        Ok(written)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()
    }

    fn write_header(&mut self, cloud: &PointCloud, with_label: bool) -> Result<()> {
        let header = [
            attributes::POSITION_X,
            attributes::POSITION_Y,
            attributes::POSITION_Z,
        ]
        .iter()
        .copied()
        .chain(cloud.layout().attributes())
        .chain(std::iter::once(attributes::DIFF))
        .chain(if with_label { Some(LABEL_COLUMN) } else { None })
        .join(self.delimiter.as_separator());
        self.sink.line(&header)
    }

    fn point_row(&self, cloud: &PointCloud, index: usize) -> String {
        let point = cloud.point(index);
        let position = point.position();
        [position.x, position.y, position.z]
            .iter()
            .copied()
            .chain((0..cloud.layout().len()).map(|attribute| point.attribute(attribute)))
            .chain(std::iter::once(point.diff()))
            .map(|value| format_value(value, self.precision))
            .join(self.delimiter.as_separator())
    }
}

impl<W: Write> AsciiFormat for AsciiWriter<W> {
    fn set_delimiter(&mut self, delimiter: Delimiter) {
        self.delimiter = delimiter;
    }

    fn set_precision(&mut self, precision: usize) {
        self.precision = precision;
    }
}

/// Writer for the cluster summary table, one row per cluster
pub struct SummaryWriter<W: Write> {
    sink: Sink<W>,
    delimiter: Delimiter,
    precision: usize,
}

impl SummaryWriter<BufWriter<File>> {
    /// Creates a new `SummaryWriter` by creating or overwriting the file at the given `path`
    ///
    /// # Errors
    ///
    /// If `path` cannot be created or overwritten, a [ChangeError::Io] is returned
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_sink(Sink::create(path.as_ref())?))
    }
}

impl<W: Write> SummaryWriter<W> {
    /// Creates a new `SummaryWriter` writing to `write`, with comma delimiter and 3 decimals
    pub fn from_write(write: W) -> Self {
        Self::from_sink(Sink {
            writer: write,
            path: None,
        })
    }

    fn from_sink(sink: Sink<W>) -> Self {
        Self {
            sink,
            delimiter: Delimiter::Comma,
            precision: 3,
        }
    }

    /// Writes the header and one row per summary. All summaries must share the same extra attributes. Clusters
    /// without a boundary have an empty alpha field
    pub fn write(&mut self, kind: ChangeKind, summaries: &[ClusterSummary]) -> Result<()> {
        let attribute_names = summaries
            .first()
            .map(|summary| {
                summary
                    .median_attributes
                    .iter()
                    .map(|(name, _)| format!("median_{}", name))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        let separator = self.delimiter.as_separator();

        let header = [
            "label",
            "kind",
            "status",
            "point_count",
            "centroid_x",
            "centroid_y",
            "centroid_z",
            "median_x",
            "median_y",
            "median_z",
        ]
        .iter()
        .map(|name| name.to_string())
        .chain(attribute_names.iter().cloned())
        .chain(
            [
                "median_diff",
                "std_diff",
                "area",
                "volume",
                "alpha",
                "polygon_count",
            ]
            .iter()
            .map(|name| name.to_string()),
        )
        .join(separator);
        self.sink.line(&header)?;

        for summary in summaries {
            if summary.median_attributes.len() != attribute_names.len() {
                bail!(
                    "Cluster {} has {} attributes, expected {}.",
                    summary.label,
                    summary.median_attributes.len(),
                    attribute_names.len()
                );
            }
            let value = |value: f64| format_value(value, self.precision);
            let row = vec![
                summary.label.to_string(),
                kind.to_string(),
                summary.status.name().to_owned(),
                summary.point_count.to_string(),
                value(summary.centroid.x),
                value(summary.centroid.y),
                value(summary.centroid.z),
                value(summary.median_position.x),
                value(summary.median_position.y),
                value(summary.median_position.z),
            ]
            .into_iter()
            .chain(
                summary
                    .median_attributes
                    .iter()
                    .map(|(_, median)| value(*median)),
            )
            .chain(vec![
                value(summary.median_diff),
                value(summary.std_diff),
                value(summary.area),
                value(summary.volume),
                summary.alpha.map(value).unwrap_or_default(),
                summary.polygon_count.to_string(),
            ])
            .join(separator);
            self.sink.line(&row)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()
    }
}

impl<W: Write> AsciiFormat for SummaryWriter<W> {
    fn set_delimiter(&mut self, delimiter: Delimiter) {
        self.delimiter = delimiter;
    }

    fn set_precision(&mut self, precision: usize) {
        self.precision = precision;
    }
}

/// Path of the file of cluster `label` written by [write_cluster_files]
pub fn cluster_file_path(directory: &Path, stem: &str, label: u32) -> PathBuf {
    directory.join(format!("{}_c{}.txt", stem, label))
}

/// Writes the points of every cluster into its own file `<stem>_c<label>.txt` inside `directory`, which is created
/// if it does not exist. Noise points are not written. Returns the paths of the written files in label order
pub fn write_cluster_files<P: AsRef<Path>>(
    directory: P,
    stem: &str,
    cloud: &PointCloud,
    labels: &ClusterLabels,
    precision: usize,
) -> Result<Vec<PathBuf>> {
    let directory = directory.as_ref();
    if labels.len() != cloud.len() {
        bail!(
            "Expected one label per point ({}) but got {} labels.",
            cloud.len(),
            labels.len()
        );
    }
    fs::create_dir_all(directory).map_err(|e| ChangeError::io(Stage::Output, directory, e))?;

    labels
        .clusters()
        .iter()
        .enumerate()
        .map(|(label, members)| -> Result<PathBuf> {
            let path = cluster_file_path(directory, stem, label as u32);
            let mut writer = AsciiWriter::from_path(&path)?;
            writer.set_precision(precision);
            writer.write_cloud(&cloud.select(members))?;
            writer.flush()?;
            Ok(path)
        })
        .collect()
}
