//! Turns a classified function into structured requirement drafts.
//!
//! This stage is pure: the same record and classification always yield the
//! same drafts, in the same order.

use nonempty::NonEmpty;

use crate::{
    domain::{
        Category, FunctionRecord, OperationKind, Priority, RequirementDraft, Statement,
        function::split_words,
    },
    engine::Classification,
};

/// Produces one draft per assigned category, in section order.
#[must_use]
pub fn synthesize(
    record: &FunctionRecord,
    classification: &Classification,
) -> NonEmpty<RequirementDraft> {
    let (condition, rationale) = condition(record);
    let action = action(record);
    let outcome = outcome(record);

    classification.categories().clone().map(|category| RequirementDraft {
        source_function: record.name.clone(),
        statement: Statement {
            category,
            condition: condition.clone(),
            action: action.clone(),
            outcome: outcome.clone(),
            rationale: rationale.clone(),
            priority: priority(record, category, classification),
        },
        depends_on: record.dependencies.clone(),
    })
}

/// The condition fragment and the rationale it is traced to.
///
/// Taken from the primary error condition if there is one, otherwise from
/// the first required input carrying a validation rule, otherwise a generic
/// request condition.
fn condition(record: &FunctionRecord) -> (String, Option<String>) {
    if let Some(primary) = record.error_conditions.first() {
        return (primary.trigger.trim().to_string(), Some(primary.error.clone()));
    }

    let validated = record
        .inputs
        .iter()
        .filter(|input| input.required)
        .find_map(|input| input.validation.as_ref().map(|rule| (input, rule)));

    if let Some((input, rule)) = validated {
        let condition = format!("{} {}", humanize(&input.name), rule.trim());
        return (condition, Some(rule.clone()));
    }

    let condition = format!(
        "a request to {} the {} is received",
        record.operation_kind,
        record.subject()
    );
    (condition, None)
}

fn action(record: &FunctionRecord) -> String {
    format!(
        "{} the {}",
        record.operation_kind.business_verb(),
        record.subject()
    )
}

/// Rewords the output description as a business result.
fn outcome(record: &FunctionRecord) -> String {
    let mut words: Vec<&str> = record
        .outputs
        .trim()
        .trim_end_matches('.')
        .split_whitespace()
        .collect();

    while let Some(first) = words.first() {
        let lowered = first.to_lowercase();
        if matches!(lowered.as_str(), "returns" | "return" | "the" | "a" | "an") {
            words.remove(0);
        } else {
            break;
        }
    }

    if words.is_empty() {
        format!(
            "complete the {} {} operation",
            record.subject(),
            record.operation_kind
        )
    } else {
        format!("provide the {}", words.join(" "))
    }
}

/// Security is always high; deleting records is high; otherwise medium when
/// the function validates its inputs and low when it does not.
fn priority(
    record: &FunctionRecord,
    category: Category,
    classification: &Classification,
) -> Priority {
    if classification.is_default() {
        return Priority::Low;
    }

    match category {
        Category::Security => Priority::High,
        Category::DataManagement if record.operation_kind == OperationKind::Delete => {
            Priority::High
        }
        _ if record.has_validation() => Priority::Medium,
        _ => Priority::Low,
    }
}

fn humanize(identifier: &str) -> String {
    let words = split_words(identifier);
    if words.is_empty() {
        identifier.to_string()
    } else {
        words.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{FunctionBatch, FunctionName, Input},
        engine::Classifier,
    };

    fn drafts_for(record: FunctionRecord) -> Vec<RequirementDraft> {
        let batch = FunctionBatch::new(vec![record]).unwrap();
        let classifier = Classifier::new(&batch, &[]).unwrap();
        let record = &batch.records()[0];
        synthesize(record, &classifier.classify(record)).into()
    }

    fn create_user() -> FunctionRecord {
        FunctionRecord::new(FunctionName::new("createUser").unwrap(), OperationKind::Create)
            .with_input(Input::required("email", "string").with_validation("must be unique"))
            .with_outputs("user id")
    }

    fn delete_user() -> FunctionRecord {
        FunctionRecord::new(FunctionName::new("deleteUser").unwrap(), OperationKind::Delete)
            .with_input(Input::required("id", "string"))
            .with_dependency("createUser")
    }

    #[test]
    fn one_draft_per_category() {
        let drafts = drafts_for(create_user());
        let categories: Vec<_> = drafts.iter().map(|d| d.statement.category).collect();
        assert_eq!(
            categories,
            vec![Category::DataManagement, Category::BusinessLogic]
        );
    }

    #[test]
    fn validation_rule_becomes_condition_and_rationale() {
        let drafts = drafts_for(create_user());
        let statement = &drafts[0].statement;

        assert_eq!(statement.condition, "email must be unique");
        assert_eq!(statement.rationale.as_deref(), Some("must be unique"));
        assert_eq!(statement.action, "register the user");
        assert_eq!(statement.outcome, "provide the user id");
        assert_eq!(statement.priority, Priority::Medium);
    }

    #[test]
    fn delete_is_high_priority_with_generic_condition() {
        let drafts = drafts_for(delete_user());
        assert_eq!(drafts.len(), 1);

        let draft = &drafts[0];
        assert_eq!(draft.statement.priority, Priority::High);
        assert_eq!(draft.statement.action, "archive the user");
        assert_eq!(
            draft.statement.condition,
            "a request to delete the user is received"
        );
        assert_eq!(
            draft.statement.outcome,
            "complete the user delete operation"
        );
        assert_eq!(draft.statement.rationale, None);
        assert!(draft.depends_on.contains("createUser"));
        assert_eq!(draft.source_function.as_str(), "deleteUser");
    }

    #[test]
    fn primary_error_condition_wins_over_validation() {
        let record = create_user()
            .with_error("the email is already registered", "DuplicateKeyError")
            .with_error("the database is unreachable", "ConnectionError");

        let drafts = drafts_for(record);

        assert_eq!(
            drafts[0].statement.condition,
            "the email is already registered"
        );
        assert_eq!(
            drafts[0].statement.rationale.as_deref(),
            Some("DuplicateKeyError")
        );
    }

    #[test]
    fn optional_inputs_do_not_provide_the_condition() {
        let record =
            FunctionRecord::new(FunctionName::new("updateProfile").unwrap(), OperationKind::Update)
                .with_input(Input {
                    name: "displayName".to_string(),
                    semantic_type: "string".to_string(),
                    required: false,
                    validation: Some("at most 40 characters".to_string()),
                });

        let drafts = drafts_for(record);

        assert_eq!(
            drafts[0].statement.condition,
            "a request to update the profile is received"
        );
        assert_eq!(drafts[0].statement.priority, Priority::Medium);
    }

    #[test]
    fn security_is_high_priority() {
        let record =
            FunctionRecord::new(FunctionName::new("resetPassword").unwrap(), OperationKind::Transform)
                .with_input(Input::required("password", "string"));

        let drafts = drafts_for(record);
        let security = drafts
            .iter()
            .find(|d| d.statement.category == Category::Security)
            .unwrap();
        assert_eq!(security.statement.priority, Priority::High);
    }

    #[test]
    fn defaulted_classification_is_low_priority() {
        let record =
            FunctionRecord::new(FunctionName::new("computeTotals").unwrap(), OperationKind::Transform);

        let drafts = drafts_for(record);

        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].statement.category, Category::BusinessLogic);
        assert_eq!(drafts[0].statement.priority, Priority::Low);
        assert_eq!(drafts[0].statement.action, "process the compute totals");
    }

    #[test]
    fn outcome_strips_leading_return_words() {
        let record = create_user().with_outputs("Returns the created user.");
        assert_eq!(drafts_for(record)[0].statement.outcome, "provide the created user");
    }

    #[test]
    fn synthesis_is_deterministic() {
        assert_eq!(drafts_for(create_user()), drafts_for(create_user()));
    }
}
