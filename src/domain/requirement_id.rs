use std::{fmt, num::NonZeroUsize, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::domain::{Category, category::UnknownCategoryError};

/// The fixed prefix of every requirement ID.
pub const PREFIX: &str = "REQ";

/// The identifier of a finalised requirement.
///
/// Format: `REQ-{CODE}-{SEQ}`, where:
/// - `CODE` is the [`Category`] code (`DM`, `UI`, `BL`, `INT`, `SEC`)
/// - `SEQ` is a positive, non-zero sequence number, counted separately per
///   category
///
/// Examples: `REQ-DM-1`, `REQ-SEC-12`
///
/// IDs order by category (in section order) and then by sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RequirementId {
    category: Category,
    sequence: NonZeroUsize,
}

impl RequirementId {
    /// Creates an ID from pre-validated parts.
    #[must_use]
    pub const fn new(category: Category, sequence: NonZeroUsize) -> Self {
        Self { category, sequence }
    }

    /// The category component.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// Returns a displayable representation with the sequence zero-padded to
    /// the given width.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::num::NonZeroUsize;
    ///
    /// use srsgen::{Category, RequirementId};
    ///
    /// let id = RequirementId::new(Category::DataManagement, NonZeroUsize::new(7).unwrap());
    ///
    /// assert_eq!(id.display(1).to_string(), "REQ-DM-7");
    /// assert_eq!(id.display(3).to_string(), "REQ-DM-007");
    /// ```
    #[must_use]
    pub const fn display(&self, digits: usize) -> FormattedId<'_> {
        FormattedId { id: self, digits }
    }
}

impl fmt::Display for RequirementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.display(1).fmt(f)
    }
}

/// A wrapper that formats a [`RequirementId`] with a fixed digit width.
///
/// Returned by [`RequirementId::display`].
#[derive(Debug, Clone, Copy)]
pub struct FormattedId<'a> {
    id: &'a RequirementId,
    digits: usize,
}

impl fmt::Display for FormattedId<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{PREFIX}-{}-{:0width$}",
            self.id.category.code(),
            self.id.sequence,
            width = self.digits
        )
    }
}

/// Errors that can occur while parsing a requirement ID.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// The string does not have the `REQ-CODE-SEQ` shape.
    #[error("Invalid requirement ID format: {0}")]
    Syntax(String),

    /// The sequence is not a positive integer.
    #[error("Invalid sequence in requirement ID '{0}': expected a non-zero integer, got {1}")]
    Sequence(String, String),

    /// The category code is unknown.
    #[error(transparent)]
    Category(#[from] UnknownCategoryError),
}

impl FromStr for RequirementId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('-');
        let (Some(prefix), Some(code), Some(sequence), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::Syntax(s.to_string()));
        };

        if prefix != PREFIX {
            return Err(Error::Syntax(s.to_string()));
        }

        let category = code.parse::<Category>()?;
        let sequence = sequence
            .parse::<usize>()
            .ok()
            .and_then(NonZeroUsize::new)
            .ok_or_else(|| Error::Sequence(s.to_string(), sequence.to_string()))?;

        Ok(Self::new(category, sequence))
    }
}

impl TryFrom<String> for RequirementId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RequirementId> for String {
    fn from(id: RequirementId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn id(category: Category, sequence: usize) -> RequirementId {
        RequirementId::new(category, NonZeroUsize::new(sequence).unwrap())
    }

    #[test_case(1, 1, "REQ-DM-1"; "no padding")]
    #[test_case(3, 1, "REQ-DM-001"; "three digits")]
    #[test_case(2, 123, "REQ-DM-123"; "expands past width")]
    fn display_width(digits: usize, sequence: usize, expected: &str) {
        assert_eq!(
            id(Category::DataManagement, sequence)
                .display(digits)
                .to_string(),
            expected
        );
    }

    #[test_case("REQ-SEC-4", Category::Security, 4)]
    #[test_case("REQ-INT-010", Category::Integration, 10; "padded")]
    #[test_case("REQ-UI-1", Category::Ui, 1)]
    fn parse_valid(input: &str, category: Category, sequence: usize) {
        assert_eq!(input.parse::<RequirementId>().unwrap(), id(category, sequence));
    }

    #[test]
    fn parse_rejects_wrong_prefix() {
        assert!(matches!(
            "SYS-DM-1".parse::<RequirementId>(),
            Err(Error::Syntax(_))
        ));
    }

    #[test]
    fn parse_rejects_extra_segments() {
        assert!(matches!(
            "REQ-DM-1-2".parse::<RequirementId>(),
            Err(Error::Syntax(_))
        ));
        assert!(matches!(
            "REQ-DM".parse::<RequirementId>(),
            Err(Error::Syntax(_))
        ));
    }

    #[test]
    fn parse_rejects_zero_sequence() {
        assert!(matches!(
            "REQ-BL-0".parse::<RequirementId>(),
            Err(Error::Sequence(_, _))
        ));
    }

    #[test]
    fn parse_rejects_unknown_category() {
        assert!(matches!(
            "REQ-XX-1".parse::<RequirementId>(),
            Err(Error::Category(_))
        ));
    }

    #[test]
    fn ordering_follows_section_then_sequence() {
        let mut ids = vec![
            id(Category::Security, 1),
            id(Category::DataManagement, 2),
            id(Category::BusinessLogic, 1),
            id(Category::DataManagement, 1),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                id(Category::DataManagement, 1),
                id(Category::DataManagement, 2),
                id(Category::BusinessLogic, 1),
                id(Category::Security, 1),
            ]
        );
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&id(Category::Ui, 3)).unwrap();
        assert_eq!(json, "\"REQ-UI-3\"");
        let back: RequirementId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id(Category::Ui, 3));
    }
}
