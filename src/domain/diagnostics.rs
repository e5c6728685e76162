//! Non-fatal findings collected over a generation run.
//!
//! Diagnostics only ever name functions, categories and requirement IDs; they
//! never carry input names, validation rules or prose from the records.

use std::fmt;

use serde::Serialize;

use crate::domain::{Category, FunctionName, RequirementId};

/// Why a call to the prose service did not produce usable text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceFailure {
    /// No response arrived within the per-call timeout.
    Timeout,
    /// The response could not be interpreted.
    Malformed,
    /// The service could not be reached or refused the request.
    Unavailable,
    /// The service answered with blank text.
    Empty,
}

impl fmt::Display for ServiceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Timeout => "timed out",
            Self::Malformed => "malformed response",
            Self::Unavailable => "service unavailable",
            Self::Empty => "empty response",
        })
    }
}

/// A single non-fatal finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// No classification rule matched; the function fell back to business
    /// logic with low priority.
    ClassificationAmbiguous {
        /// The function that matched no rule.
        function: FunctionName,
    },

    /// Drafts with identical category, condition and action were merged.
    DuplicateDraft {
        /// The requirement the drafts were merged into.
        requirement: RequirementId,
        /// Every function that contributed a merged draft.
        functions: Vec<FunctionName>,
    },

    /// A dependency names a function that produced no requirement.
    DanglingDependency {
        /// The requirement holding the dependency.
        requirement: RequirementId,
        /// The category of that requirement.
        category: Category,
        /// The function named by the dependency.
        dependency: String,
    },

    /// Requirements reference each other in a loop.
    DependencyCycle {
        /// The requirements forming the loop, sorted.
        requirements: Vec<RequirementId>,
    },

    /// The prose service failed and the fallback sentence was used.
    ServiceError {
        /// The requirement that was rendered through the fallback.
        requirement: RequirementId,
        /// The category of that requirement.
        category: Category,
        /// What went wrong.
        failure: ServiceFailure,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClassificationAmbiguous { function } => write!(
                f,
                "{function}: no classification rule matched, defaulted to Business Logic"
            ),
            Self::DuplicateDraft {
                requirement,
                functions,
            } => {
                let names: Vec<&str> = functions.iter().map(FunctionName::as_str).collect();
                write!(f, "{requirement}: merged duplicates from {}", names.join(", "))
            }
            Self::DanglingDependency {
                requirement,
                category,
                dependency,
            } => write!(
                f,
                "{requirement} ({category}): dependency '{dependency}' has no generated requirement"
            ),
            Self::DependencyCycle { requirements } => {
                let ids: Vec<String> = requirements.iter().map(ToString::to_string).collect();
                write!(f, "dependency cycle: {}", ids.join(" → "))
            }
            Self::ServiceError {
                requirement,
                category,
                failure,
            } => write!(
                f,
                "{requirement} ({category}): prose service {failure}, fallback sentence used"
            ),
        }
    }
}

/// The run-level report returned alongside the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    rendered: usize,
    fallbacks: usize,
}

impl Diagnostics {
    /// Records a finding.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// Appends every finding from another report and adds its render counts.
    pub fn merge(&mut self, other: Self) {
        self.entries.extend(other.entries);
        self.rendered += other.rendered;
        self.fallbacks += other.fallbacks;
    }

    /// Records that a requirement was rendered, and whether the fallback
    /// sentence was used.
    pub const fn record_render(&mut self, via_fallback: bool) {
        self.rendered += 1;
        if via_fallback {
            self.fallbacks += 1;
        }
    }

    /// All findings, in the order they were recorded.
    #[must_use]
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Whether there are no findings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of requirements rendered.
    #[must_use]
    pub const fn rendered(&self) -> usize {
        self.rendered
    }

    /// Number of requirements rendered through the fallback sentence.
    #[must_use]
    pub const fn fallbacks(&self) -> usize {
        self.fallbacks
    }

    /// One-line summary of fallback usage, e.g. `2 of 9 requirements rendered
    /// via fallback`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} of {} requirements rendered via fallback",
            self.fallbacks, self.rendered
        )
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;

    #[test]
    fn summary_counts_fallbacks() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.record_render(false);
        diagnostics.record_render(true);
        diagnostics.record_render(false);

        assert_eq!(diagnostics.rendered(), 3);
        assert_eq!(diagnostics.fallbacks(), 1);
        assert_eq!(
            diagnostics.summary(),
            "1 of 3 requirements rendered via fallback"
        );
    }

    #[test]
    fn merge_keeps_order_and_counts() {
        let mut first = Diagnostics::default();
        first.push(Diagnostic::ClassificationAmbiguous {
            function: FunctionName::new("a").unwrap(),
        });
        first.record_render(true);

        let mut second = Diagnostics::default();
        second.push(Diagnostic::ClassificationAmbiguous {
            function: FunctionName::new("b").unwrap(),
        });
        second.record_render(false);

        first.merge(second);

        assert_eq!(first.entries().len(), 2);
        assert_eq!(first.rendered(), 2);
        assert_eq!(first.fallbacks(), 1);
    }

    #[test]
    fn service_error_names_only_id_and_category() {
        let diagnostic = Diagnostic::ServiceError {
            requirement: RequirementId::new(Category::Security, NonZeroUsize::MIN),
            category: Category::Security,
            failure: ServiceFailure::Timeout,
        };
        assert_eq!(
            diagnostic.to_string(),
            "REQ-SEC-1 (Security and Compliance): prose service timed out, fallback sentence used"
        );
    }
}
