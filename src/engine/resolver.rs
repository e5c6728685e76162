//! Promotes drafts to requirements.
//!
//! Resolution is a single sequential pass and the only serialization point of
//! a run:
//!
//! 1. drafts with the same category, condition and action are merged
//! 2. IDs are assigned per category in first-encounter order
//! 3. dependencies are resolved to the IDs generated from the named
//!    functions

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    num::NonZeroUsize,
};

use thiserror::Error;
use tracing::{instrument, warn};

use crate::domain::{
    Category, Diagnostic, Diagnostics, DraftKey, FunctionName, Requirement, RequirementDraft,
    RequirementGraph, RequirementId, Statement,
};

/// Errors that abort resolution.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// Two distinct requirements were given the same ID.
    ///
    /// This signals a sequencing defect and never occurs in correct operation.
    #[error("requirement ID {0} was assigned twice")]
    IdCollision(RequirementId),
}

/// The output of [`resolve`].
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Requirements in ID-assignment order.
    pub requirements: Vec<Requirement>,
    /// Cross-references between the requirements.
    pub graph: RequirementGraph,
    /// Merges, dangling dependencies and cycles found while resolving.
    pub diagnostics: Diagnostics,
}

/// Drafts merged under one key.
struct Merged {
    statement: Statement,
    contributors: Vec<FunctionName>,
    depends_on: BTreeSet<String>,
}

impl Merged {
    fn absorb(&mut self, draft: RequirementDraft) {
        if !self.contributors.contains(&draft.source_function) {
            self.contributors.push(draft.source_function);
        }
        self.depends_on.extend(draft.depends_on);
        self.statement.priority = self.statement.priority.max(draft.statement.priority);
    }
}

impl From<RequirementDraft> for Merged {
    fn from(draft: RequirementDraft) -> Self {
        Self {
            statement: draft.statement,
            contributors: vec![draft.source_function],
            depends_on: draft.depends_on,
        }
    }
}

/// Deduplicates drafts, assigns IDs and resolves cross-references.
///
/// Re-running on the same drafts in the same order yields the same IDs.
/// Running on an already deduplicated sequence merges nothing further.
///
/// # Errors
///
/// Returns [`ResolveError::IdCollision`] if two requirements would share an
/// ID.
#[instrument(level = "debug", skip(drafts))]
pub fn resolve(
    drafts: impl IntoIterator<Item = RequirementDraft>,
) -> Result<Resolution, ResolveError> {
    let merged = deduplicate(drafts);
    let ids = assign_ids(&merged)?;

    let mut diagnostics = Diagnostics::default();
    for (entry, id) in merged.iter().zip(&ids) {
        if entry.contributors.len() > 1 {
            diagnostics.push(Diagnostic::DuplicateDraft {
                requirement: *id,
                functions: entry.contributors.clone(),
            });
        }
    }

    let mut by_function: BTreeMap<&str, Vec<RequirementId>> = BTreeMap::new();
    for (entry, id) in merged.iter().zip(&ids) {
        for function in &entry.contributors {
            by_function.entry(function.as_str()).or_default().push(*id);
        }
    }

    let mut graph = RequirementGraph::with_capacity(ids.len());
    let mut resolved = Vec::with_capacity(ids.len());

    for (entry, &id) in merged.iter().zip(&ids) {
        graph.add(id);

        let mut related_ids = BTreeSet::new();
        let mut warnings = Vec::new();

        for dependency in &entry.depends_on {
            match by_function.get(dependency.as_str()) {
                Some(targets) => {
                    for &target in targets {
                        related_ids.insert(target);
                        graph.link(id, target);
                    }
                }
                None => {
                    warn!(requirement = %id, dependency = %dependency, "dangling dependency");
                    let dangling = Diagnostic::DanglingDependency {
                        requirement: id,
                        category: entry.statement.category,
                        dependency: dependency.clone(),
                    };
                    warnings.push(dangling.clone());
                    diagnostics.push(dangling);
                }
            }
        }

        resolved.push((entry, id, related_ids, warnings));
    }

    for cycle in graph.cycles() {
        diagnostics.push(Diagnostic::DependencyCycle {
            requirements: cycle,
        });
    }

    let requirements = resolved
        .into_iter()
        .map(|(entry, id, related_ids, warnings)| Requirement {
            id,
            statement: entry.statement.clone(),
            provenance: entry.contributors.iter().cloned().collect(),
            depends_on: entry.depends_on.clone(),
            related_ids,
            warnings,
        })
        .collect();

    Ok(Resolution {
        requirements,
        graph,
        diagnostics,
    })
}

fn deduplicate(drafts: impl IntoIterator<Item = RequirementDraft>) -> Vec<Merged> {
    let mut merged: Vec<Merged> = Vec::new();
    let mut index: HashMap<DraftKey, usize> = HashMap::new();

    for draft in drafts {
        let key = draft.key();
        if let Some(&position) = index.get(&key) {
            merged[position].absorb(draft);
        } else {
            index.insert(key, merged.len());
            merged.push(Merged::from(draft));
        }
    }

    merged
}

/// Assigns ascending per-category sequence numbers in input order.
fn assign_ids(merged: &[Merged]) -> Result<Vec<RequirementId>, ResolveError> {
    let mut counters: BTreeMap<Category, NonZeroUsize> = BTreeMap::new();
    let mut assigned = HashSet::with_capacity(merged.len());

    merged
        .iter()
        .map(|entry| {
            let category = entry.statement.category;
            let sequence = counters
                .get(&category)
                .map_or(NonZeroUsize::MIN, |last| last.saturating_add(1));
            counters.insert(category, sequence);

            let id = RequirementId::new(category, sequence);
            if assigned.insert(id) {
                Ok(id)
            } else {
                Err(ResolveError::IdCollision(id))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Priority;

    fn draft(
        function: &str,
        category: Category,
        condition: &str,
        depends_on: &[&str],
    ) -> RequirementDraft {
        RequirementDraft {
            source_function: FunctionName::new(function).unwrap(),
            statement: Statement {
                category,
                condition: condition.to_string(),
                action: format!("handle {function}"),
                outcome: "provide a result".to_string(),
                rationale: None,
                priority: Priority::Medium,
            },
            depends_on: depends_on.iter().map(ToString::to_string).collect(),
        }
    }

    fn ids(resolution: &Resolution) -> Vec<String> {
        resolution
            .requirements
            .iter()
            .map(|r| r.id().to_string())
            .collect()
    }

    fn find<'a>(resolution: &'a Resolution, id: &str) -> &'a Requirement {
        resolution
            .requirements
            .iter()
            .find(|r| r.id().to_string() == id)
            .unwrap()
    }

    fn example_drafts() -> Vec<RequirementDraft> {
        vec![
            draft("createUser", Category::DataManagement, "email must be unique", &[]),
            draft("createUser", Category::BusinessLogic, "email must be unique", &[]),
            draft("deleteUser", Category::DataManagement, "a request to delete the user is received", &["createUser"]),
        ]
    }

    #[test]
    fn ids_are_assigned_per_category_in_encounter_order() {
        let resolution = resolve(example_drafts()).unwrap();
        assert_eq!(ids(&resolution), ["REQ-DM-1", "REQ-BL-1", "REQ-DM-2"]);
    }

    #[test]
    fn dependencies_resolve_to_every_requirement_of_the_target() {
        let resolution = resolve(example_drafts()).unwrap();

        let delete = find(&resolution, "REQ-DM-2");
        let related: Vec<String> = delete.related_ids().iter().map(ToString::to_string).collect();
        assert_eq!(related, ["REQ-DM-1", "REQ-BL-1"]);

        assert!(find(&resolution, "REQ-DM-1").related_ids().is_empty());
        assert!(resolution.diagnostics.is_empty());
    }

    #[test]
    fn identical_drafts_are_merged_with_union_of_provenance_and_dependencies() {
        let mut first = draft("addUser", Category::DataManagement, "same", &["audit"]);
        first.statement.action = "register the user".to_string();
        let mut second = draft("createUser", Category::DataManagement, "same", &["notify"]);
        second.statement.action = "register the user".to_string();
        second.statement.priority = Priority::High;

        let resolution = resolve(vec![
            first,
            second,
            draft("audit", Category::BusinessLogic, "x", &[]),
            draft("notify", Category::Integration, "y", &[]),
        ])
        .unwrap();

        assert_eq!(ids(&resolution), ["REQ-DM-1", "REQ-BL-1", "REQ-INT-1"]);

        let merged = find(&resolution, "REQ-DM-1");
        let provenance: Vec<&str> = merged.provenance().iter().map(FunctionName::as_str).collect();
        assert_eq!(provenance, ["addUser", "createUser"]);
        assert_eq!(merged.depends_on().len(), 2);
        assert_eq!(merged.related_ids().len(), 2);
        assert_eq!(merged.priority(), Priority::High);

        assert!(matches!(
            resolution.diagnostics.entries(),
            [Diagnostic::DuplicateDraft { functions, .. }] if functions.len() == 2
        ));
    }

    #[test]
    fn dangling_dependency_is_a_warning() {
        let resolution = resolve(vec![draft(
            "checkout",
            Category::BusinessLogic,
            "cart is not empty",
            &["chargeCard"],
        )])
        .unwrap();

        let checkout = &resolution.requirements[0];
        assert!(checkout.related_ids().is_empty());
        assert!(matches!(
            checkout.warnings(),
            [Diagnostic::DanglingDependency { dependency, .. }] if dependency == "chargeCard"
        ));
        assert_eq!(resolution.diagnostics.entries().len(), 1);
    }

    #[test]
    fn self_dependency_relates_every_requirement_of_the_function() {
        let resolution = resolve(vec![
            draft("retry", Category::DataManagement, "a", &["retry"]),
            draft("retry", Category::BusinessLogic, "a", &["retry"]),
        ])
        .unwrap();

        let dm = find(&resolution, "REQ-DM-1");
        let related: Vec<String> = dm.related_ids().iter().map(ToString::to_string).collect();
        assert_eq!(related, ["REQ-DM-1", "REQ-BL-1"]);

        assert!(matches!(
            resolution.diagnostics.entries(),
            [Diagnostic::DependencyCycle { requirements }] if requirements.len() == 2
        ));
    }

    #[test]
    fn single_self_dependency_is_kept_and_reported_as_cycle() {
        let resolution = resolve(vec![draft(
            "retry",
            Category::DataManagement,
            "a",
            &["retry"],
        )])
        .unwrap();

        let retry = &resolution.requirements[0];
        let related: Vec<String> = retry.related_ids().iter().map(ToString::to_string).collect();
        assert_eq!(related, ["REQ-DM-1"]);
        assert!(retry.warnings().is_empty());

        assert!(resolution.graph.has_cycles());
        assert!(matches!(
            resolution.diagnostics.entries(),
            [Diagnostic::DependencyCycle { requirements }] if requirements == &[retry.id()]
        ));
    }

    #[test]
    fn merged_draft_depending_on_a_contributor_relates_to_itself() {
        let mut first = draft("addUser", Category::DataManagement, "same", &[]);
        first.statement.action = "register the user".to_string();
        let mut second = draft("createUser", Category::DataManagement, "same", &["addUser"]);
        second.statement.action = "register the user".to_string();

        let resolution = resolve(vec![first, second]).unwrap();

        let merged = &resolution.requirements[0];
        assert_eq!(merged.related_ids().iter().copied().collect::<Vec<_>>(), [merged.id()]);
        assert!(resolution
            .diagnostics
            .entries()
            .iter()
            .any(|d| matches!(d, Diagnostic::DependencyCycle { .. })));
    }

    #[test]
    fn cycles_are_reported() {
        let resolution = resolve(vec![
            draft("ping", Category::Integration, "a", &["pong"]),
            draft("pong", Category::Integration, "b", &["ping"]),
        ])
        .unwrap();

        assert!(resolution.graph.has_cycles());
        assert!(resolution
            .diagnostics
            .entries()
            .iter()
            .any(|d| matches!(d, Diagnostic::DependencyCycle { requirements } if requirements.len() == 2)));
    }

    #[test]
    fn resolution_is_deterministic() {
        let first = resolve(example_drafts()).unwrap();
        let second = resolve(example_drafts()).unwrap();
        assert_eq!(first.requirements, second.requirements);
    }

    #[test]
    fn deduplicated_input_is_not_merged_again() {
        let first = resolve(example_drafts()).unwrap();

        let redrafted: Vec<RequirementDraft> = first
            .requirements
            .iter()
            .flat_map(|requirement| {
                requirement.provenance().iter().map(|function| RequirementDraft {
                    source_function: function.clone(),
                    statement: requirement.statement().clone(),
                    depends_on: requirement.depends_on().clone(),
                })
            })
            .collect();

        let second = resolve(redrafted).unwrap();
        assert_eq!(first.requirements, second.requirements);
    }

    #[test]
    fn ids_are_pairwise_distinct() {
        let drafts: Vec<_> = (0..50)
            .map(|i| {
                let category = Category::ALL[i % Category::ALL.len()];
                draft(&format!("f{i}"), category, &format!("c{i}"), &[])
            })
            .collect();

        let resolution = resolve(drafts).unwrap();
        let unique: HashSet<_> = resolution.requirements.iter().map(Requirement::id).collect();
        assert_eq!(unique.len(), 50);
    }
}
