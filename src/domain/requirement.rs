use std::collections::BTreeSet;

use borsh::BorshSerialize;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::domain::{Category, Diagnostic, FunctionName, Priority, RequirementId};

/// The structured content of a requirement, before any prose is generated.
///
/// Reads as "the system shall `action` when `condition` to `outcome`".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statement {
    /// The requirement grouping.
    pub category: Category,
    /// When the requirement applies.
    pub condition: String,
    /// What the system does.
    pub action: String,
    /// The business result.
    pub outcome: String,
    /// The documented rule or failure the requirement is traced to, verbatim.
    pub rationale: Option<String>,
    /// How urgently the requirement must be satisfied.
    pub priority: Priority,
}

impl Statement {
    /// Calculate the fingerprint of this statement.
    ///
    /// The fingerprint is a SHA256 hash of the Borsh-serialized category,
    /// condition, action, outcome and rationale. Priority is excluded. Used to
    /// detect requirements whose content changed between runs.
    ///
    /// # Panics
    ///
    /// Panics if borsh serialization fails (which should never happen for this
    /// data structure).
    #[must_use]
    pub fn fingerprint(&self) -> String {
        #[derive(BorshSerialize)]
        struct FingerprintData<'a> {
            category: Category,
            condition: &'a str,
            action: &'a str,
            outcome: &'a str,
            rationale: Option<&'a str>,
        }

        let data = FingerprintData {
            category: self.category,
            condition: &self.condition,
            action: &self.action,
            outcome: &self.outcome,
            rationale: self.rationale.as_deref(),
        };

        let encoded = borsh::to_vec(&data).expect("this should never fail");
        let hash = Sha256::digest(encoded);
        format!("{hash:x}")
    }

    /// The sentence used when the prose service cannot provide one.
    #[must_use]
    pub fn fallback_sentence(&self) -> String {
        format!(
            "The system shall {} when {} to {}.",
            self.action, self.condition, self.outcome
        )
    }
}

/// The identity drafts are deduplicated on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DraftKey {
    /// Requirement grouping.
    pub category: Category,
    /// Condition fragment.
    pub condition: String,
    /// Action fragment.
    pub action: String,
}

/// An unrendered candidate requirement produced from exactly one function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementDraft {
    /// The function the draft was synthesized from.
    pub source_function: FunctionName,
    /// The structured content.
    pub statement: Statement,
    /// The functions the source function depends on.
    pub depends_on: BTreeSet<String>,
}

impl RequirementDraft {
    /// The deduplication key: category, condition and action.
    #[must_use]
    pub fn key(&self) -> DraftKey {
        DraftKey {
            category: self.statement.category,
            condition: self.statement.condition.clone(),
            action: self.statement.action.clone(),
        }
    }
}

/// A finalised, uniquely identified, cross-referenced requirement.
///
/// Created by the resolver; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirement {
    pub(crate) id: RequirementId,
    pub(crate) statement: Statement,
    pub(crate) provenance: BTreeSet<FunctionName>,
    pub(crate) depends_on: BTreeSet<String>,
    pub(crate) related_ids: BTreeSet<RequirementId>,
    pub(crate) warnings: Vec<Diagnostic>,
}

impl Requirement {
    /// The immutable identifier.
    #[must_use]
    pub const fn id(&self) -> RequirementId {
        self.id
    }

    /// The structured content.
    #[must_use]
    pub const fn statement(&self) -> &Statement {
        &self.statement
    }

    /// The requirement grouping.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.id.category()
    }

    /// How urgently the requirement must be satisfied.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.statement.priority
    }

    /// Every function that contributed a draft to this requirement.
    #[must_use]
    pub const fn provenance(&self) -> &BTreeSet<FunctionName> {
        &self.provenance
    }

    /// The functions this requirement depends on.
    #[must_use]
    pub const fn depends_on(&self) -> &BTreeSet<String> {
        &self.depends_on
    }

    /// IDs of the requirements generated from the functions this one depends
    /// on.
    #[must_use]
    pub const fn related_ids(&self) -> &BTreeSet<RequirementId> {
        &self.related_ids
    }

    /// Warnings attached during resolution, such as dangling dependencies.
    #[must_use]
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// The content fingerprint. See [`Statement::fingerprint`].
    #[must_use]
    pub fn fingerprint(&self) -> String {
        self.statement.fingerprint()
    }
}
