use std::fmt::Display;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use rockdiff_core::containers::Point;
use rockdiff_core::layout::{attributes, PointLayout};
use rockdiff_core::nalgebra::Vector3;

/// Help text listing the literals of a column format string
pub const FORMAT_LITERALS: &str = "s - skip this column
x - x coordinate
y - y coordinate
z - z coordinate
d - signed displacement (diff)
u - uncertainty of the displacement
f - significant change flag
a - generic attribute, named after the header column if there is one";

/// Column separator of a delimited text file
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Semicolon,
    /// Any run of spaces and tabs
    Whitespace,
}

impl Delimiter {
    /// Guesses the delimiter of a single line. Commas win over semicolons, everything else is whitespace separated
    pub fn detect(line: &str) -> Self {
        if line.contains(',') {
            Delimiter::Comma
        } else if line.contains(';') {
            Delimiter::Semicolon
        } else {
            Delimiter::Whitespace
        }
    }

    /// Splits `line` into its trimmed fields
    pub fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self {
            Delimiter::Comma => line.split(',').map(str::trim).collect(),
            Delimiter::Semicolon => line.split(';').map(str::trim).collect(),
            Delimiter::Whitespace => line.split_whitespace().collect(),
        }
    }

    /// The separator written between two fields
    pub fn as_separator(&self) -> &'static str {
        match self {
            Delimiter::Comma => ",",
            Delimiter::Semicolon => ";",
            Delimiter::Whitespace => " ",
        }
    }
}

impl FromStr for Delimiter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "," | "comma" => Ok(Delimiter::Comma),
            ";" | "semicolon" => Ok(Delimiter::Semicolon),
            " " | "\t" | "space" | "tab" | "whitespace" => Ok(Delimiter::Whitespace),
            _ => Err(anyhow!(
                "Unknown delimiter '{}', expected comma, semicolon or whitespace",
                s
            )),
        }
    }
}

impl Display for Delimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Delimiter::Comma => "comma",
            Delimiter::Semicolon => "semicolon",
            Delimiter::Whitespace => "whitespace",
        };
        f.write_str(name)
    }
}

// Maps one column of a line to the part of a point it is read into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Column {
    Skip,
    CoordinateX,
    CoordinateY,
    CoordinateZ,
    Diff,
    // Index of the extra attribute within the layout
    Attribute(usize),
}

/// How the columns of a file map onto a point and which extra attributes the resulting cloud has
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParseLayout {
    columns: Vec<Column>,
    layout: PointLayout,
}

impl ParseLayout {
    /// Parse layout from a format string such as `xyzuad`. `names` are the header fields of the file, if it has
    /// a header, and name the generic `a` columns
    pub(crate) fn from_format(format: &str, names: Option<&[&str]>) -> Result<Self> {
        let mut builder = LayoutBuilder::default();
        for (index, character) in format.chars().enumerate() {
            let column = match character {
                's' => Column::Skip,
                'x' => Column::CoordinateX,
                'y' => Column::CoordinateY,
                'z' => Column::CoordinateZ,
                'd' => Column::Diff,
                'u' => builder.attribute(attributes::UNCERTAINTY, index),
                'f' => builder.attribute(attributes::SIGNIFICANT_CHANGE, index),
                'a' => match names.and_then(|names| names.get(index)) {
                    Some(name) => builder.attribute(clean_header_name(name), index),
                    None => builder.attribute(&generic_attribute_name(index), index),
                },
                _ => {
                    bail!(
                        "FormatError can't interpret format literal '{}' in format string '{}'.",
                        character,
                        format
                    );
                }
            };
            builder.columns.push(column);
        }
        builder
            .build()
            .with_context(|| format!("FormatError in format string '{}'.", format))
    }

    /// Parse layout from the fields of a header row. Returns `None` if the header does not name all three
    /// coordinates and a displacement column.
    ///
    /// Coordinates are matched by name, ignoring case and a leading `//`. `diff_column` selects the displacement
    /// column by its exact name, otherwise the first column whose name contains `diff` or `distance` is used.
    /// Columns naming an uncertainty or a significance flag become the corresponding known attributes, all
    /// remaining columns are kept as attributes under their header name
    pub(crate) fn from_header(names: &[&str], diff_column: Option<&str>) -> Option<Self> {
        let mut builder = LayoutBuilder::default();
        let mut has_diff = false;
        for (index, raw_name) in names.iter().enumerate() {
            let name = clean_header_name(raw_name);
            let lower = name.to_lowercase();
            let is_diff_candidate = match diff_column {
                Some(diff_column) => lower == diff_column.trim().to_lowercase(),
                None => {
                    !lower.contains("uncertainty")
                        && (lower.contains("diff") || lower.contains("distance"))
                }
            };
            let column = match lower.as_str() {
                "x" => Column::CoordinateX,
                "y" => Column::CoordinateY,
                "z" => Column::CoordinateZ,
                _ if is_diff_candidate && !has_diff => {
                    has_diff = true;
                    Column::Diff
                }
                _ if lower.contains("uncertainty") => {
                    builder.attribute(attributes::UNCERTAINTY, index)
                }
                _ if lower.contains("significant") => {
                    builder.attribute(attributes::SIGNIFICANT_CHANGE, index)
                }
                _ if name.is_empty() => Column::Skip,
                _ => builder.attribute(name, index),
            };
            builder.columns.push(column);
        }
        builder.build().ok()
    }

    /// Parse layout of a file without header or format: `x y z <attributes...> diff`
    pub(crate) fn positional(column_count: usize) -> Result<Self> {
        if column_count < 4 {
            bail!(
                "Expected at least 4 columns (x y z diff) but found {}.",
                column_count
            );
        }
        let mut builder = LayoutBuilder::default();
        builder.columns.extend_from_slice(&[
            Column::CoordinateX,
            Column::CoordinateY,
            Column::CoordinateZ,
        ]);
        for index in 3..column_count - 1 {
            let column = builder.attribute(&generic_attribute_name(index), index);
            builder.columns.push(column);
        }
        builder.columns.push(Column::Diff);
        builder.build()
    }

    /// The extra attributes of clouds read with this parse layout
    pub(crate) fn layout(&self) -> &PointLayout {
        &self.layout
    }

    /// Number of columns a line must at least have
    pub(crate) fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Parses the fields of a single line into a point. Additional trailing fields are ignored
    pub(crate) fn parse_fields(&self, fields: &[&str]) -> Result<Point> {
        if fields.len() < self.columns.len() {
            bail!(
                "Expected {} columns but found {}.",
                self.columns.len(),
                fields.len()
            );
        }
        let mut position = Vector3::zeros();
        let mut diff = 0.0;
        let mut attributes = vec![0.0; self.layout.len()];
        for (column, field) in self.columns.iter().zip(fields) {
            match column {
                Column::Skip => continue,
                Column::CoordinateX => position.x = parse_coordinate(field, column)?,
                Column::CoordinateY => position.y = parse_coordinate(field, column)?,
                Column::CoordinateZ => position.z = parse_coordinate(field, column)?,
                Column::Diff => diff = parse_value(field, column)?,
                Column::Attribute(index) => attributes[*index] = parse_value(field, column)?,
            }
        }
        Ok(Point::with_attributes(position, diff, attributes))
    }
}

#[derive(Default)]
struct LayoutBuilder {
    columns: Vec<Column>,
    layout: PointLayout,
}

impl LayoutBuilder {
    // Columns with a name that is already taken are renamed after their column index
    fn attribute(&mut self, name: &str, column_index: usize) -> Column {
        let name = if self.layout.has_attribute(name) {
            format!("{}_{}", name, column_index)
        } else {
            name.to_owned()
        };
        Column::Attribute(self.layout.add_attribute(&name))
    }

    fn build(self) -> Result<ParseLayout> {
        for (column, literal) in [
            (Column::CoordinateX, 'x'),
            (Column::CoordinateY, 'y'),
            (Column::CoordinateZ, 'z'),
            (Column::Diff, 'd'),
        ]
        .iter()
        {
            let count = self.columns.iter().filter(|c| *c == column).count();
            if count != 1 {
                bail!(
                    "Expected exactly one '{}' column but found {}.",
                    literal,
                    count
                );
            }
        }
        Ok(ParseLayout {
            columns: self.columns,
            layout: self.layout,
        })
    }
}

fn clean_header_name(name: &str) -> &str {
    name.trim()
        .trim_start_matches("//")
        .trim_matches('"')
        .trim()
}

fn generic_attribute_name(column_index: usize) -> String {
    format!("attribute_{}", column_index)
}

// NaN marks a missing measurement and is allowed, infinite values are not
fn parse_value(field: &str, column: &Column) -> Result<f64> {
    let value = field
        .parse::<f64>()
        .map_err(|_| anyhow!("ParseError expected a number for {:?} found '{}'.", column, field))?;
    if value.is_infinite() {
        bail!("ParseError expected a finite number for {:?} found '{}'.", column, field);
    }
    Ok(value)
}

fn parse_coordinate(field: &str, column: &Column) -> Result<f64> {
    let value = parse_value(field, column)?;
    if value.is_nan() {
        bail!("ParseError expected a coordinate for {:?} found '{}'.", column, field);
    }
    Ok(value)
}

/// Returns true if every field of the line is a number
pub(crate) fn is_numeric_row(fields: &[&str]) -> bool {
    !fields.is_empty() && fields.iter().all(|field| field.parse::<f64>().is_ok())
}

/// Formats `value` with at most `precision` decimals, dropping trailing zeros but keeping one decimal
pub(crate) fn format_value(value: f64, precision: usize) -> String {
    let formatted = format!("{:.*}", precision, value);
    if !formatted.contains('.') {
        return formatted;
    }
    trim_unnecessary_tailing_zeros(&formatted).to_owned()
}

fn trim_unnecessary_tailing_zeros(slice: &str) -> &str {
    let mut end = slice.len();
    while slice[..end].ends_with('0') && !slice[..end].ends_with(".0") {
        end -= 1;
    }
    &slice[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_string() -> Result<()> {
        let parse_layout = ParseLayout::from_format("sxyzuad", None)?;
        assert_eq!(
            parse_layout.layout(),
            &PointLayout::from_attributes(&[attributes::UNCERTAINTY, "attribute_5"])
        );
        let point = parse_layout.parse_fields(&["9", "1", "2", "3", "0.01", "7", "-0.4"])?;
        assert_eq!(point.position, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(point.diff, -0.4);
        assert_eq!(point.attributes, vec![0.01, 7.0]);
        Ok(())
    }

    #[test]
    fn test_format_errors() {
        assert!(ParseLayout::from_format("xyzq", None).is_err());
        assert!(ParseLayout::from_format("xyz", None).is_err());
        assert!(ParseLayout::from_format("xyzdd", None).is_err());
        let parse_layout = ParseLayout::from_format("xyzd", None).unwrap();
        assert!(parse_layout.parse_fields(&["1", "2", "3"]).is_err());
        assert!(parse_layout.parse_fields(&["1", "2", "three", "0.1"]).is_err());
    }

    #[test]
    fn test_m3c2_header() {
        let names = [
            "//X",
            "Y",
            "Z",
            "Npoints_cloud1",
            "M3C2 distance uncertainty",
            "significant change",
            "M3C2 distance",
        ];
        let parse_layout = ParseLayout::from_header(&names, None).unwrap();
        assert_eq!(
            parse_layout.layout(),
            &PointLayout::from_attributes(&[
                "Npoints_cloud1",
                attributes::UNCERTAINTY,
                attributes::SIGNIFICANT_CHANGE
            ])
        );
        let point = parse_layout
            .parse_fields(&["1", "2", "3", "12", "0.02", "1", "0.35"])
            .unwrap();
        assert_eq!(point.diff, 0.35);
        assert_eq!(point.attributes, vec![12.0, 0.02, 1.0]);
    }

    #[test]
    fn test_header_diff_column_override() {
        let names = ["x", "y", "z", "C2C absolute distances", "height diff"];
        let default = ParseLayout::from_header(&names, None).unwrap();
        let point = default.parse_fields(&["0", "0", "0", "0.5", "-0.2"]).unwrap();
        assert_eq!(point.diff, 0.5);

        let overridden = ParseLayout::from_header(&names, Some("Height Diff")).unwrap();
        let point = overridden.parse_fields(&["0", "0", "0", "0.5", "-0.2"]).unwrap();
        assert_eq!(point.diff, -0.2);
        assert!(ParseLayout::from_header(&names, Some("m3c2")).is_none());
    }

    #[test]
    fn test_header_without_coordinates() {
        assert!(ParseLayout::from_header(&["Survey", "export"], None).is_none());
        assert!(ParseLayout::from_header(&["x", "y", "distance"], None).is_none());
    }

    #[test]
    fn test_positional() -> Result<()> {
        let parse_layout = ParseLayout::positional(5)?;
        assert_eq!(parse_layout.column_count(), 5);
        let point = parse_layout.parse_fields(&["1", "2", "3", "0.05", "0.3"])?;
        assert_eq!(point.attributes, vec![0.05]);
        assert_eq!(point.diff, 0.3);
        assert!(ParseLayout::positional(3).is_err());
        Ok(())
    }

    #[test]
    fn test_non_finite_values() -> Result<()> {
        let parse_layout = ParseLayout::positional(5)?;
        assert!(parse_layout.parse_fields(&["nan", "2", "3", "0.05", "0.3"]).is_err());
        assert!(parse_layout.parse_fields(&["1", "inf", "3", "0.05", "0.3"]).is_err());
        assert!(parse_layout.parse_fields(&["1", "2", "3", "0.05", "-inf"]).is_err());

        let point = parse_layout.parse_fields(&["1", "2", "3", "nan", "nan"])?;
        assert!(point.diff.is_nan());
        assert!(point.attributes[0].is_nan());
        Ok(())
    }

    #[test]
    fn test_delimiter() {
        assert_eq!(Delimiter::detect("1.0, 2.0, 3.0"), Delimiter::Comma);
        assert_eq!(Delimiter::detect("1.0;2.0;3.0"), Delimiter::Semicolon);
        assert_eq!(Delimiter::detect("1.0 \t2.0  3.0"), Delimiter::Whitespace);
        assert_eq!(
            Delimiter::Whitespace.split(" 1.0 \t2.0  3.0 "),
            vec!["1.0", "2.0", "3.0"]
        );
        assert_eq!(
            Delimiter::Comma.split("//X, M3C2 distance"),
            vec!["//X", "M3C2 distance"]
        );
        assert_eq!("tab".parse::<Delimiter>().unwrap(), Delimiter::Whitespace);
        assert!("|".parse::<Delimiter>().is_err());
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(1.5, 3), "1.5");
        assert_eq!(format_value(2.0, 3), "2.0");
        assert_eq!(format_value(0.123456, 3), "0.123");
        assert_eq!(format_value(-0.1004, 3), "-0.1");
        assert_eq!(format_value(12.0, 0), "12");
    }
}
