//! The canonical in-memory description of documented technical functions.
//!
//! A [`FunctionRecord`] is produced by an ingestion step (see
//! [`crate::storage::input`]) and is read-only to the rest of the pipeline.

use std::{
    borrow::Borrow,
    collections::{BTreeSet, HashSet},
    fmt,
    ops::Deref,
};

use non_empty_string::NonEmptyString;
use serde::{Deserialize, Serialize};

/// The name of a documented function, unique within a [`FunctionBatch`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionName(NonEmptyString);

impl FunctionName {
    /// Creates a function name.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyNameError`] if the trimmed name is empty.
    pub fn new(name: impl Into<String>) -> Result<Self, EmptyNameError> {
        let name = name.into().trim().to_string();
        NonEmptyString::new(name)
            .map(Self)
            .map_err(|_| EmptyNameError)
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Deref for FunctionName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl Borrow<str> for FunctionName {
    fn borrow(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for FunctionName {
    type Error = EmptyNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Serialize for FunctionName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Error returned when a function name is empty.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("function name must not be empty")]
pub struct EmptyNameError;

/// What a function does to the data it touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Brings a new record into existence.
    Create,
    /// Looks records up.
    Read,
    /// Changes an existing record.
    Update,
    /// Removes a record.
    Delete,
    /// Checks data against rules.
    Validate,
    /// Computes something from its inputs.
    Transform,
    /// Talks to another system.
    Integrate,
}

/// Name and description keywords, checked in order, that reveal an operation
/// kind.
const OPERATION_KEYWORDS: &[(OperationKind, &[&str])] = &[
    (
        OperationKind::Create,
        &["create", "add", "insert", "register", "new", "save", "post"],
    ),
    (
        OperationKind::Read,
        &[
            "get", "read", "fetch", "find", "list", "load", "search", "query", "retrieve", "show",
        ],
    ),
    (
        OperationKind::Update,
        &["update", "modify", "edit", "patch", "set", "change", "put"],
    ),
    (
        OperationKind::Delete,
        &["delete", "remove", "destroy", "archive", "drop", "purge"],
    ),
    (
        OperationKind::Validate,
        &["validate", "verify", "check", "ensure", "is", "can"],
    ),
    (
        OperationKind::Integrate,
        &[
            "sync",
            "send",
            "publish",
            "import",
            "export",
            "notify",
            "integrate",
            "webhook",
            "call",
        ],
    ),
];

impl OperationKind {
    /// Infers the operation kind from a function name and optional free-text
    /// description.
    ///
    /// Name words win over description words; the first keyword found decides.
    /// Falls back to [`OperationKind::Transform`].
    #[must_use]
    pub fn infer(name: &str, description: Option<&str>) -> Self {
        let from_words = |text: &str| split_words(text).iter().find_map(|w| Self::from_keyword(w));

        from_words(name)
            .or_else(|| description.and_then(from_words))
            .unwrap_or(Self::Transform)
    }

    fn from_keyword(word: &str) -> Option<Self> {
        OPERATION_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.contains(&word))
            .map(|(kind, _)| *kind)
    }

    /// The business verb this operation is described with.
    #[must_use]
    pub const fn business_verb(self) -> &'static str {
        match self {
            Self::Create => "register",
            Self::Read => "retrieve",
            Self::Update => "modify",
            Self::Delete => "archive",
            Self::Validate => "verify",
            Self::Transform => "process",
            Self::Integrate => "exchange data with",
        }
    }

    /// Whether the operation is one of the four record-management operations.
    #[must_use]
    pub const fn is_crud(self) -> bool {
        matches!(
            self,
            Self::Create | Self::Read | Self::Update | Self::Delete
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Validate => "validate",
            Self::Transform => "transform",
            Self::Integrate => "integrate",
        })
    }
}

/// Splits an identifier or phrase into lowercase words.
///
/// Handles `snake_case`, `kebab-case`, `camelCase`, `PascalCase` and spaces.
pub(crate) fn split_words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut previous_lower = false;

    for c in text.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            previous_lower = false;
            continue;
        }

        if c.is_uppercase() && previous_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }

        previous_lower = c.is_lowercase() || c.is_ascii_digit();
        current.extend(c.to_lowercase());
    }

    if !current.is_empty() {
        words.push(current);
    }

    words
}

/// One parameter of a documented function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    /// Parameter name.
    pub name: String,
    /// Semantic type, e.g. `email address` or `string`.
    #[serde(default, rename = "type")]
    pub semantic_type: String,
    /// Whether callers must supply the parameter.
    #[serde(default)]
    pub required: bool,
    /// The rule the value must satisfy, in the words of the documentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<String>,
}

impl Input {
    /// Creates a required input with no validation rule.
    #[must_use]
    pub fn required(name: impl Into<String>, semantic_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            semantic_type: semantic_type.into(),
            required: true,
            validation: None,
        }
    }

    /// Attaches a validation rule.
    #[must_use]
    pub fn with_validation(mut self, rule: impl Into<String>) -> Self {
        self.validation = Some(rule.into());
        self
    }
}

/// A documented failure mode: what triggers it and the technical error raised.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCondition {
    /// The circumstance that triggers the error.
    pub trigger: String,
    /// The technical error that results.
    pub error: String,
}

/// Documentation of one technical function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRecord {
    /// Unique name within the batch.
    pub name: FunctionName,
    /// What the function does to its data.
    pub operation_kind: OperationKind,
    /// Parameters, in declaration order.
    pub inputs: Vec<Input>,
    /// What the function returns or changes.
    pub outputs: String,
    /// Documented failure modes; the first is the primary one.
    pub error_conditions: Vec<ErrorCondition>,
    /// Names of the functions this one calls or requires.
    pub dependencies: BTreeSet<String>,
    /// Whether the function faces an external system.
    pub external: bool,
    /// Whether the function produces output meant to be read by people.
    pub user_facing: bool,
    /// Free-text documentation of the function.
    pub description: Option<String>,
}

impl FunctionRecord {
    /// Creates a record with no inputs, outputs or dependencies.
    #[must_use]
    pub const fn new(name: FunctionName, operation_kind: OperationKind) -> Self {
        Self {
            name,
            operation_kind,
            inputs: Vec::new(),
            outputs: String::new(),
            error_conditions: Vec::new(),
            dependencies: BTreeSet::new(),
            external: false,
            user_facing: false,
            description: None,
        }
    }

    /// Appends an input.
    #[must_use]
    pub fn with_input(mut self, input: Input) -> Self {
        self.inputs.push(input);
        self
    }

    /// Sets the output description.
    #[must_use]
    pub fn with_outputs(mut self, outputs: impl Into<String>) -> Self {
        self.outputs = outputs.into();
        self
    }

    /// Appends an error condition. Exact duplicates are ignored.
    #[must_use]
    pub fn with_error(mut self, trigger: impl Into<String>, error: impl Into<String>) -> Self {
        let condition = ErrorCondition {
            trigger: trigger.into(),
            error: error.into(),
        };
        if !self.error_conditions.contains(&condition) {
            self.error_conditions.push(condition);
        }
        self
    }

    /// Adds a dependency on another function.
    #[must_use]
    pub fn with_dependency(mut self, name: impl Into<String>) -> Self {
        self.dependencies.insert(name.into());
        self
    }

    /// Marks the function as external-facing.
    #[must_use]
    pub fn external(mut self) -> Self {
        self.external = true;
        self
    }

    /// Marks the function as producing human-readable output.
    #[must_use]
    pub fn user_facing(mut self) -> Self {
        self.user_facing = true;
        self
    }

    /// Whether any input carries a validation rule.
    #[must_use]
    pub fn has_validation(&self) -> bool {
        self.inputs.iter().any(|input| input.validation.is_some())
    }

    /// The business object the function acts on, derived from its name with
    /// the operation keyword removed.
    ///
    /// `createUser` yields `user`, `get_order_items` yields `order items`.
    #[must_use]
    pub fn subject(&self) -> String {
        let words = split_words(&self.name);
        let rest: Vec<&str> = words
            .iter()
            .filter(|w| OperationKind::from_keyword(w).is_none())
            .map(String::as_str)
            .collect();

        if rest.is_empty() {
            words.join(" ")
        } else {
            rest.join(" ")
        }
    }
}

/// Errors raised while assembling a [`FunctionBatch`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BatchError {
    /// Two records share a name.
    #[error("function '{0}' appears more than once in the batch")]
    DuplicateName(FunctionName),
}

/// An ordered batch of function records with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionBatch {
    records: Vec<FunctionRecord>,
}

impl FunctionBatch {
    /// Creates a batch, preserving input order.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::DuplicateName`] for the first name that appears
    /// twice.
    pub fn new(records: Vec<FunctionRecord>) -> Result<Self, BatchError> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(&record.name) {
                return Err(BatchError::DuplicateName(record.name.clone()));
            }
        }
        Ok(Self { records })
    }

    /// The records, in input order.
    #[must_use]
    pub fn records(&self) -> &[FunctionRecord] {
        &self.records
    }

    /// Looks a record up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FunctionRecord> {
        self.records.iter().find(|record| record.name.as_str() == name)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the batch has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
