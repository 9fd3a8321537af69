use std::collections::HashMap;

use crate::{Category, Point};

/// Free-form key/value metadata in the OpenStreetMap style.
pub type Tags = HashMap<String, String>;

/// A location worth visiting on a tour.
///
/// # Examples
/// ```
/// use promenade_core::{Category, Point, PointOfInterest, Tags};
///
/// let poi = PointOfInterest::new(
///     7,
///     Point::new(55.7520, 37.6175),
///     Category::Monument,
///     Tags::from([("name".into(), "Tsar Bell".into())]),
/// );
///
/// assert_eq!(poi.id, 7);
/// assert_eq!(poi.tags.get("name"), Some(&"Tsar Bell".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointOfInterest {
    /// Catalogue identifier.
    pub id: u64,
    /// Where the POI is.
    pub location: Point,
    /// Category used by request filters.
    pub category: Category,
    /// Extra metadata such as `name`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub tags: Tags,
}

impl PointOfInterest {
    /// Construct a `PointOfInterest` with the provided tags.
    #[must_use]
    pub const fn new(id: u64, location: Point, category: Category, tags: Tags) -> Self {
        Self {
            id,
            location,
            category,
            tags,
        }
    }

    /// Construct a `PointOfInterest` without tags.
    ///
    /// # Examples
    /// ```
    /// use promenade_core::{Category, Point, PointOfInterest};
    ///
    /// let poi = PointOfInterest::with_empty_tags(1, Point::new(0.0, 0.0), Category::Park);
    /// assert!(poi.tags.is_empty());
    /// ```
    #[must_use]
    pub fn with_empty_tags(id: u64, location: Point, category: Category) -> Self {
        Self::new(id, location, category, Tags::new())
    }

    /// The `name` tag, when present.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.tags.get("name").map(String::as_str)
    }
}
