use std::{fmt, str::FromStr};

use borsh::BorshSerialize;
use serde::{Deserialize, Serialize};

/// One of the five groupings a software requirements specification is
/// organised into.
///
/// The declaration order is the section order of the rendered document.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    BorshSerialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Creating, reading, updating and archiving business records.
    DataManagement,
    /// Information presented to people.
    Ui,
    /// Business rules and validation.
    BusinessLogic,
    /// Data exchange with external systems.
    Integration,
    /// Access control and protection of sensitive data.
    Security,
}

impl Category {
    /// Every category, in document section order.
    pub const ALL: [Self; 5] = [
        Self::DataManagement,
        Self::Ui,
        Self::BusinessLogic,
        Self::Integration,
        Self::Security,
    ];

    /// The short code used in requirement IDs (`REQ-<code>-<n>`).
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::DataManagement => "DM",
            Self::Ui => "UI",
            Self::BusinessLogic => "BL",
            Self::Integration => "INT",
            Self::Security => "SEC",
        }
    }

    /// The human-readable section heading.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::DataManagement => "Data Management",
            Self::Ui => "User Interface",
            Self::BusinessLogic => "Business Logic",
            Self::Integration => "Integration",
            Self::Security => "Security and Compliance",
        }
    }

    /// Looks up a category by its ID code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.code() == code)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a string is not a known category code.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown category code '{0}': expected one of DM, UI, BL, INT, SEC")]
pub struct UnknownCategoryError(String);

impl FromStr for Category {
    type Err = UnknownCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| UnknownCategoryError(s.to_string()))
    }
}

/// How urgently a requirement must be satisfied.
///
/// Ordered so that `High` compares greatest.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    BorshSerialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Nice to have.
    Low,
    /// Expected for a complete system.
    Medium,
    /// Mandatory; touches security or data integrity.
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        })
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("DM", Category::DataManagement)]
    #[test_case("UI", Category::Ui)]
    #[test_case("BL", Category::BusinessLogic)]
    #[test_case("INT", Category::Integration)]
    #[test_case("SEC", Category::Security)]
    fn code_roundtrips(code: &str, expected: Category) {
        assert_eq!(code.parse::<Category>().unwrap(), expected);
        assert_eq!(expected.code(), code);
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert!("dm".parse::<Category>().is_err());
        assert!("XX".parse::<Category>().is_err());
    }

    #[test]
    fn section_order_matches_declaration_order() {
        let mut sorted = Category::ALL;
        sorted.sort();
        assert_eq!(sorted, Category::ALL);
    }

    #[test]
    fn high_priority_is_greatest() {
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
    }
}
