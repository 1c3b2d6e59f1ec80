use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::debug;
use rockdiff_core::containers::PointCloud;
use rockdiff_core::{ChangeError, Stage};

use super::{is_numeric_row, Delimiter, ParseLayout};

/// Default number of leading rows that may be skipped before the header or the first data row
pub const DEFAULT_SKIP_ROWS: usize = 10;

/// Reader for point clouds stored as delimited text, one point per line.
///
/// Columns are mapped onto points in one of three ways:
/// - An explicit format string (see [FORMAT_LITERALS](super::FORMAT_LITERALS)) set with
///   [with_format](AsciiReader::with_format)
/// - A header row naming the columns, as written by CloudCompare and most point cloud tools
/// - Positionally as `x y z <attributes...> diff`, if the file has neither header nor format
///
/// Leading rows that are neither a usable header nor numeric data (survey metadata, units) are skipped, but at most
/// [skip_rows](AsciiReader::with_skip_rows) of them. Empty lines and lines starting with `#` are ignored everywhere
pub struct AsciiReader<R: BufRead> {
    reader: R,
    format: Option<String>,
    delimiter: Option<Delimiter>,
    diff_column: Option<String>,
    skip_rows: usize,
    source: Option<PathBuf>,
}

impl AsciiReader<BufReader<File>> {
    /// Creates a new `AsciiReader` by opening the file at the given `path`.
    ///
    /// # Examples
    /// ```no_run
    /// use anyhow::Result;
    /// use rockdiff_io::ascii::AsciiReader;
    /// fn main() -> Result<()> {
    ///     let cloud = AsciiReader::from_path("changes.txt")?.with_format("xyzud")?.read()?;
    ///     println!("{} points", cloud.len());
    ///     Ok(())
    /// }
    /// ```
    ///
    /// # Errors
    ///
    /// If `path` cannot be opened, a [ChangeError::Io] is returned
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ChangeError::io(Stage::Input, path, e))?;
        let mut reader = Self::from_read(BufReader::new(file));
        reader.source = Some(path.to_owned());
        Ok(reader)
    }
}

impl<R: BufRead> AsciiReader<R> {
    /// Creates a new `AsciiReader` from the given `read`, with automatic delimiter and header detection
    pub fn from_read(read: R) -> Self {
        Self {
            reader: read,
            format: None,
            delimiter: None,
            diff_column: None,
            skip_rows: DEFAULT_SKIP_ROWS,
            source: None,
        }
    }

    /// Maps the columns with the given format string instead of the header or the positional layout.
    ///
    /// # Errors
    ///
    /// If `format` contains unrecognized literals or does not contain `x`, `y`, `z` and `d` exactly once
    pub fn with_format(mut self, format: &str) -> Result<Self> {
        ParseLayout::from_format(format, None)?;
        self.format = Some(format.to_owned());
        Ok(self)
    }

    /// Uses the given delimiter instead of detecting it from the first row
    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Name of the header column holding the displacement, for headers where it cannot be guessed
    pub fn with_diff_column(mut self, name: &str) -> Self {
        self.diff_column = Some(name.to_owned());
        self
    }

    /// Maximum number of leading rows to skip before the header or the first data row
    pub fn with_skip_rows(mut self, skip_rows: usize) -> Self {
        self.skip_rows = skip_rows;
        self
    }

    /// Reads all points.
    ///
    /// # Errors
    ///
    /// If no header or data row is found within the allowed number of leading rows, if any data row cannot be parsed
    /// or if reading fails. Parse errors name the offending line, and the input file if the reader was opened with
    /// [from_path](AsciiReader::from_path)
    pub fn read(self) -> Result<PointCloud> {
        let context = match &self.source {
            Some(path) => format!(
                "[{}] Could not read points from '{}'",
                Stage::Input,
                path.display()
            ),
            None => format!("[{}] Could not read points", Stage::Input),
        };
        self.read_points().context(context)
    }

    fn read_points(self) -> Result<PointCloud> {
        let AsciiReader {
            reader,
            format,
            delimiter,
            diff_column,
            skip_rows,
            ..
        } = self;
        let mut lines = reader
            .lines()
            .enumerate()
            .map(|(index, line)| (index + 1, line));

        let mut skipped_rows = 0;
        let mut last_skipped_row: Option<String> = None;
        let (parse_layout, delimiter, first_row) = loop {
            let (line_number, line) = match lines.next() {
                Some((line_number, line)) => (line_number, line?),
                None => bail!("ReadError found no point data."),
            };
            let row = line.trim();
            if is_ignored(row) {
                continue;
            }
            let delimiter = delimiter.unwrap_or_else(|| Delimiter::detect(row));
            let fields = delimiter.split(row);

            if is_numeric_row(&fields) {
                let parse_layout = match &format {
                    Some(format) => {
                        let names = last_skipped_row
                            .as_deref()
                            .map(|header| delimiter.split(header));
                        ParseLayout::from_format(format, names.as_deref())?
                    }
                    None => ParseLayout::positional(fields.len())
                        .with_context(|| format!("ReadError in line {}.", line_number))?,
                };
                break (parse_layout, delimiter, Some((line_number, line)));
            }
            if format.is_none() {
                if let Some(parse_layout) = ParseLayout::from_header(&fields, diff_column.as_deref())
                {
                    debug!("Header in line {}: {}", line_number, row);
                    break (parse_layout, delimiter, None);
                }
            }

            skipped_rows += 1;
            if skipped_rows > skip_rows {
                bail!(
                    "ReadError found neither a header naming x, y, z and {} nor point data within the first {} rows.",
                    diff_column
                        .as_deref()
                        .map(|name| format!("'{}'", name))
                        .unwrap_or_else(|| "a diff/distance column".to_owned()),
                    skip_rows
                );
            }
            debug!("Skipping line {}: {}", line_number, row);
            last_skipped_row = Some(row.to_owned());
        };
        debug!(
            "Reading {} delimited points with attributes '{}'",
            delimiter,
            parse_layout.layout()
        );

        let mut cloud = PointCloud::new(parse_layout.layout().clone());
        let rows = first_row
            .into_iter()
            .map(|(line_number, line)| Ok((line_number, line)))
            .chain(lines.map(|(line_number, line)| line.map(|line| (line_number, line))));
        for row in rows {
            let (line_number, line) = row?;
            let line = line.trim();
            if is_ignored(line) {
                continue;
            }
            let point = parse_layout
                .parse_fields(&delimiter.split(line))
                .with_context(|| format!("ReadError in line {}.", line_number))?;
            cloud.push(point);
        }
        Ok(cloud)
    }
}

fn is_ignored(row: &str) -> bool {
    row.is_empty() || row.starts_with('#')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ascii::{get_test_file_path, test_data_diffs, test_data_positions};
    use rockdiff_core::layout::{attributes, PointLayout};
    use std::io::Cursor;

    fn read_str(text: &str) -> Result<PointCloud> {
        AsciiReader::from_read(Cursor::new(text)).read()
    }

    #[test]
    fn test_read_m3c2_header() -> Result<()> {
        let cloud = AsciiReader::from_path(get_test_file_path("10_points_m3c2_header.txt"))?.read()?;
        assert_eq!(cloud.len(), 10);
        assert_eq!(cloud.positions(), test_data_positions().as_slice());
        assert_eq!(cloud.diffs(), test_data_diffs().as_slice());
        assert_eq!(
            cloud.layout(),
            &PointLayout::from_attributes(&[
                "Npoints_cloud1",
                attributes::UNCERTAINTY,
                attributes::SIGNIFICANT_CHANGE
            ])
        );
        Ok(())
    }

    #[test]
    fn test_read_positional() -> Result<()> {
        let cloud = AsciiReader::from_path(get_test_file_path("10_points_positional.txt"))?.read()?;
        assert_eq!(cloud.positions(), test_data_positions().as_slice());
        assert_eq!(cloud.diffs(), test_data_diffs().as_slice());
        assert_eq!(cloud.layout(), &PointLayout::from_attributes(&["attribute_3"]));
        Ok(())
    }

    #[test]
    fn test_read_with_format() -> Result<()> {
        let cloud = AsciiReader::from_path(get_test_file_path("10_points_positional.txt"))?
            .with_format("xyzud")?
            .read()?;
        assert_eq!(
            cloud.layout(),
            &PointLayout::from_attributes(&[attributes::UNCERTAINTY])
        );
        assert_eq!(cloud.attribute(attributes::UNCERTAINTY).unwrap()[0], 0.01);
        Ok(())
    }

    #[test]
    fn test_skip_metadata_rows() -> Result<()> {
        let path = get_test_file_path("10_points_semicolon_metadata.txt");
        let cloud = AsciiReader::from_path(&path)?.read()?;
        assert_eq!(cloud.len(), 10);
        assert_eq!(cloud.diffs(), test_data_diffs().as_slice());

        assert!(AsciiReader::from_path(&path)?.with_skip_rows(1).read().is_err());
        Ok(())
    }

    #[test]
    fn test_format_names_generic_columns_from_header() -> Result<()> {
        let text = "x y z intensity diff\n1 2 3 40 0.5\n";
        let cloud = AsciiReader::from_read(Cursor::new(text))
            .with_format("xyzad")?
            .read()?;
        assert_eq!(cloud.attribute("intensity"), Some(&[40.0][..]));
        Ok(())
    }

    #[test]
    fn test_comments_and_blank_lines() -> Result<()> {
        let cloud = read_str("# exported points\n\n1 2 3 0.5\n\n# end\n4 5 6 -0.5\n")?;
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud.diffs(), &[0.5, -0.5]);
        Ok(())
    }

    #[test]
    fn test_errors() {
        assert!(read_str("").is_err());
        assert!(read_str("1 2 3\n").is_err());
        let error = read_str("1 2 3 0.5\n1 2 oops 0.5\n").unwrap_err();
        assert!(format!("{:#}", error).contains("line 2"));
        assert!(AsciiReader::from_read(Cursor::new("")).with_format("xyzk").is_err());
    }

    #[test]
    fn test_errors_name_stage_and_file() -> Result<()> {
        let path = get_test_file_path("10_points_semicolon_metadata.txt");
        let error = AsciiReader::from_path(&path)?
            .with_skip_rows(1)
            .read()
            .unwrap_err();
        let message = format!("{:#}", error);
        assert!(message.contains("[input]"));
        assert!(message.contains("10_points_semicolon_metadata.txt"));

        let error = read_str("1 2 3 0.5\nnan 2 3 0.5\n").unwrap_err();
        let message = format!("{:#}", error);
        assert!(message.starts_with("[input]"));
        assert!(message.contains("line 2"));
        Ok(())
    }

    #[test]
    fn test_missing_file_reports_path() {
        let error = AsciiReader::from_path("does/not/exist.txt")
            .err()
            .expect("Opening a missing file must fail");
        match error.downcast_ref::<ChangeError>() {
            Some(ChangeError::Io { stage, path, .. }) => {
                assert_eq!(*stage, Stage::Input);
                assert!(path.ends_with("exist.txt"));
            }
            other => panic!("Expected an I/O error, got {:?}", other),
        }
    }
}
