use std::fmt::Display;

/// Names of the attributes that rockdiff knows about. Position and displacement are always present in a
/// [PointCloud](crate::containers::PointCloud), all other attributes are optional scalar columns
pub mod attributes {
    /// Name of the x coordinate column
    pub const POSITION_X: &str = "x";
    /// Name of the y coordinate column
    pub const POSITION_Y: &str = "y";
    /// Name of the z coordinate column
    pub const POSITION_Z: &str = "z";
    /// Name of the signed displacement column
    pub const DIFF: &str = "diff";
    /// Per-point uncertainty of the displacement, e.g. the level of detection of M3C2
    pub const UNCERTAINTY: &str = "uncertainty";
    /// Flag (0 or 1) that marks a displacement as statistically significant
    pub const SIGNIFICANT_CHANGE: &str = "significant_change";
}

/// Schema of the optional scalar attributes that a [PointCloud](crate::containers::PointCloud) carries in addition
/// to its position and displacement. The order of the attributes is the column order used when reading and writing
/// points, so two clouds with the same attributes in a different order have different layouts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointLayout {
    attributes: Vec<String>,
}

impl PointLayout {
    /// Creates a layout without any extra attributes
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a layout from the given attribute names. Duplicate names are only added once
    /// ```
    /// # use rockdiff_core::layout::*;
    /// let layout = PointLayout::from_attributes(&[attributes::UNCERTAINTY, "intensity", "intensity"]);
    /// assert_eq!(layout.len(), 2);
    /// assert_eq!(layout.index_of("intensity"), Some(1));
    /// ```
    pub fn from_attributes<S: AsRef<str>>(attributes: &[S]) -> Self {
        let mut layout = Self::new();
        for attribute in attributes {
            layout.add_attribute(attribute.as_ref());
        }
        layout
    }

    /// Adds the attribute with the given name, returning its column index. If the attribute already exists,
    /// the existing index is returned
    pub fn add_attribute(&mut self, name: &str) -> usize {
        match self.index_of(name) {
            Some(index) => index,
            None => {
                self.attributes.push(name.to_owned());
                self.attributes.len() - 1
            }
        }
    }

    /// Returns the names of all extra attributes in column order
    pub fn attributes(&self) -> impl Iterator<Item = &str> + '_ {
        self.attributes.iter().map(|name| name.as_str())
    }

    /// Returns the column index of the attribute with the given name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|attr| attr == name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Returns the number of extra attributes
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl Display for PointLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {}",
            attributes::POSITION_X,
            attributes::POSITION_Y,
            attributes::POSITION_Z
        )?;
        for attribute in self.attributes() {
            write!(f, " {}", attribute)?;
        }
        write!(f, " {}", attributes::DIFF)
    }
}
