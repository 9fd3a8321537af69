//! POI categories and the category filter set used as a cache identity.
//!
//! # Examples
//! ```
//! use promenade_core::{Category, FilterSet};
//!
//! let filters = FilterSet::parse(&["Park", "museum", "park"])?;
//! assert!(filters.matches(Category::Park));
//! assert!(!filters.matches(Category::Food));
//! assert_eq!(filters, FilterSet::parse(&["museum", "park"])?);
//! # Ok::<(), promenade_core::ParseCategoryError>(())
//! ```

use std::str::FromStr;

use thiserror::Error;

/// Broad category a point of interest belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Category {
    /// Museums and galleries with collections.
    Museum,
    /// Monuments and memorials.
    Monument,
    /// Parks and gardens.
    Park,
    /// Churches, temples and other places of worship.
    Religious,
    /// Notable buildings.
    Architecture,
    /// Viewpoints and observation decks.
    Viewpoint,
    /// Public art and sculpture.
    Art,
    /// Theatres and concert halls.
    Theatre,
    /// Restaurants, cafes and markets.
    Food,
}

impl Category {
    /// Every category, in bit order.
    pub const ALL: [Self; 9] = [
        Self::Museum,
        Self::Monument,
        Self::Park,
        Self::Religious,
        Self::Architecture,
        Self::Viewpoint,
        Self::Art,
        Self::Theatre,
        Self::Food,
    ];

    /// Return the category as a lowercase `&str`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Museum => "museum",
            Self::Monument => "monument",
            Self::Park => "park",
            Self::Religious => "religious",
            Self::Architecture => "architecture",
            Self::Viewpoint => "viewpoint",
            Self::Art => "art",
            Self::Theatre => "theatre",
            Self::Food => "food",
        }
    }

    const fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a category name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category '{name}'")]
pub struct ParseCategoryError {
    /// The name as supplied by the caller.
    pub name: String,
}

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseCategoryError { name: s.to_owned() })
    }
}

/// A set of categories encoded as a bitmask.
///
/// The integer form is what caching compares, so two filter lists that
/// name the same categories in a different order or case are equal. An
/// empty set places no restriction on categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct FilterSet(u32);

impl FilterSet {
    /// The set that matches every category.
    pub const EMPTY: Self = Self(0);

    const MASK: u32 = (1 << Category::ALL.len()) - 1;

    /// Parse category names into a set.
    ///
    /// # Errors
    ///
    /// Returns [`ParseCategoryError`] for the first unrecognised name.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self, ParseCategoryError> {
        names
            .iter()
            .map(|name| name.as_ref().parse::<Category>())
            .collect()
    }

    /// Rebuild a set from its stored integer form, ignoring unknown bits.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & Self::MASK)
    }

    /// The integer form used for cache identity.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Report whether no category was selected.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Report whether the set contains `category` explicitly.
    #[must_use]
    pub const fn contains(self, category: Category) -> bool {
        self.0 & category.bit() != 0
    }

    /// Report whether a POI of `category` passes this filter.
    #[must_use]
    pub const fn matches(self, category: Category) -> bool {
        self.is_empty() || self.contains(category)
    }

    /// Return a copy of the set with `category` added.
    #[must_use]
    pub const fn with(self, category: Category) -> Self {
        Self(self.0 | category.bit())
    }

    /// Iterate over the explicitly selected categories.
    pub fn iter(self) -> impl Iterator<Item = Category> {
        Category::ALL
            .into_iter()
            .filter(move |category| self.contains(*category))
    }
}

impl FromIterator<Category> for FilterSet {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("museum", Category::Museum)]
    #[case("PARK", Category::Park)]
    #[case(" Theatre ", Category::Theatre)]
    fn parses_case_insensitively(#[case] input: &str, #[case] expected: Category) {
        assert_eq!(input.parse::<Category>(), Ok(expected));
    }

    #[rstest]
    fn parsing_rejects_unknown() {
        let err = "casino".parse::<Category>().expect_err("unknown category");
        assert_eq!(err.name, "casino");
        assert!(err.to_string().contains("unknown category"));
    }

    #[rstest]
    fn display_matches_as_str() {
        for category in Category::ALL {
            assert_eq!(category.to_string(), category.as_str());
        }
    }

    #[rstest]
    fn filter_identity_ignores_order_case_and_duplicates() {
        let a = FilterSet::parse(&["Food", "art"]).expect("valid filters");
        let b = FilterSet::parse(&["art", "ART", "food"]).expect("valid filters");
        assert_eq!(a, b);
        assert_eq!(a.bits(), b.bits());
    }

    #[rstest]
    fn empty_filter_matches_everything() {
        let filters = FilterSet::parse::<&str>(&[]).expect("empty list is valid");
        assert!(filters.is_empty());
        assert!(Category::ALL.into_iter().all(|c| filters.matches(c)));
    }

    #[rstest]
    fn from_bits_discards_unknown_bits() {
        let filters = FilterSet::from_bits(u32::MAX);
        assert_eq!(filters.iter().count(), Category::ALL.len());
        assert_eq!(FilterSet::from_bits(filters.bits()), filters);
    }

    #[rstest]
    fn iter_lists_selected_categories() {
        let filters: FilterSet = [Category::Viewpoint, Category::Museum].into_iter().collect();
        let listed: Vec<_> = filters.iter().collect();
        assert_eq!(listed, vec![Category::Museum, Category::Viewpoint]);
    }
}
