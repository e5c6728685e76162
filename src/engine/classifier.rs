//! Assigns requirement categories to function records.
//!
//! Classification walks an ordered table of named predicates. Each matching
//! rule contributes its category; a record matching nothing falls back to
//! [`Category::BusinessLogic`].

use std::collections::{BTreeSet, HashSet};

use nonempty::NonEmpty;
use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::domain::{Category, FunctionBatch, FunctionRecord, OperationKind};

/// Built-in patterns marking input names and error conditions as touching
/// sensitive data. Matched case-insensitively.
const SENSITIVE_PATTERNS: &[&str] = &[
    "password",
    "passwd",
    "token",
    "secret",
    "permission",
    "credential",
    "authori[sz]",
    "authentic",
    r"api_?key",
    "session",
    "privilege",
    r"\brole\b",
];

/// Output wording that indicates text meant to be read by people.
const HUMAN_OUTPUT_PATTERN: &str =
    r"\b(message|messages|text|display|page|screen|view|html|notification|report|label|prompt|email body)\b";

/// A named predicate contributing one category.
struct Rule {
    name: &'static str,
    category: Category,
    applies: fn(&Classifier, &FunctionRecord) -> bool,
}

/// The classification rules, in evaluation order.
const RULES: &[Rule] = &[
    Rule {
        name: "record management operation",
        category: Category::DataManagement,
        applies: |_, record| record.operation_kind.is_crud(),
    },
    Rule {
        name: "input validation rule",
        category: Category::BusinessLogic,
        applies: |_, record| record.has_validation(),
    },
    Rule {
        name: "depends on external-facing function",
        category: Category::Integration,
        applies: |classifier, record| {
            record
                .dependencies
                .iter()
                .any(|dependency| classifier.external.contains(dependency))
        },
    },
    Rule {
        name: "integration operation",
        category: Category::Integration,
        applies: |_, record| record.external || record.operation_kind == OperationKind::Integrate,
    },
    Rule {
        name: "sensitive data",
        category: Category::Security,
        applies: |classifier, record| classifier.touches_sensitive_data(record),
    },
    Rule {
        name: "human-readable output",
        category: Category::Ui,
        applies: |classifier, record| {
            record.user_facing || classifier.human_output.is_match(&record.outputs)
        },
    },
];

/// A configured sensitive-data pattern failed to compile.
#[derive(Debug, thiserror::Error)]
#[error("invalid sensitive-data pattern '{pattern}': {source}")]
pub struct PatternError {
    pattern: String,
    source: regex::Error,
}

/// The categories assigned to one function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    categories: NonEmpty<Category>,
    defaulted: bool,
}

impl Classification {
    /// The assigned categories, in section order, without repeats.
    #[must_use]
    pub const fn categories(&self) -> &NonEmpty<Category> {
        &self.categories
    }

    /// Whether the function was assigned `category`.
    #[must_use]
    pub fn contains(&self, category: Category) -> bool {
        self.categories.contains(&category)
    }

    /// Whether no rule matched and the default category was used.
    #[must_use]
    pub const fn is_default(&self) -> bool {
        self.defaulted
    }
}

/// Classifies the records of one batch.
///
/// Built per batch because the integration rule needs to know which records
/// in the batch are external-facing.
#[derive(Debug)]
pub struct Classifier {
    external: HashSet<String>,
    sensitive: Regex,
    human_output: Regex,
}

impl Classifier {
    /// Creates a classifier for `batch`, extending the built-in sensitive-data
    /// patterns with `extra_patterns`.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if an extra pattern is not a valid regular
    /// expression.
    pub fn new(batch: &FunctionBatch, extra_patterns: &[String]) -> Result<Self, PatternError> {
        for pattern in extra_patterns {
            Regex::new(pattern).map_err(|source| PatternError {
                pattern: pattern.clone(),
                source,
            })?;
        }

        let alternatives: Vec<&str> = SENSITIVE_PATTERNS
            .iter()
            .copied()
            .chain(extra_patterns.iter().map(String::as_str))
            .collect();
        let sensitive = case_insensitive(&format!("(?:{})", alternatives.join(")|(?:")))?;
        let human_output = case_insensitive(HUMAN_OUTPUT_PATTERN)?;

        let external = batch
            .records()
            .iter()
            .filter(|record| record.external)
            .map(|record| record.name.to_string())
            .collect();

        Ok(Self {
            external,
            sensitive,
            human_output,
        })
    }

    /// Assigns one or more categories to `record`.
    ///
    /// Never fails and never returns an empty set: a record matching no rule
    /// is assigned [`Category::BusinessLogic`] and flagged as defaulted.
    #[must_use]
    pub fn classify(&self, record: &FunctionRecord) -> Classification {
        let matched: BTreeSet<Category> = RULES
            .iter()
            .filter(|rule| (rule.applies)(self, record))
            .inspect(|rule| {
                debug!(
                    function = %record.name,
                    rule = rule.name,
                    category = rule.category.code(),
                    "classification rule matched"
                );
            })
            .map(|rule| rule.category)
            .collect();

        NonEmpty::from_vec(matched.into_iter().collect()).map_or_else(
            || {
                debug!(function = %record.name, "no classification rule matched");
                Classification {
                    categories: NonEmpty::new(Category::BusinessLogic),
                    defaulted: true,
                }
            },
            |categories| Classification {
                categories,
                defaulted: false,
            },
        )
    }

    fn touches_sensitive_data(&self, record: &FunctionRecord) -> bool {
        record
            .inputs
            .iter()
            .any(|input| self.sensitive.is_match(&input.name))
            || record.error_conditions.iter().any(|condition| {
                self.sensitive.is_match(&condition.trigger)
                    || self.sensitive.is_match(&condition.error)
            })
    }
}

fn case_insensitive(pattern: &str) -> Result<Regex, PatternError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| PatternError {
            pattern: pattern.to_string(),
            source,
        })
}
