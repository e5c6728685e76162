//! Domain models for requirement generation.
//!
//! This module contains the core domain types: function records, requirement
//! categories and IDs, drafts and finalised requirements, the cross-reference
//! graph, diagnostics and configuration.

/// Requirement categories and priorities.
pub mod category;
pub use category::{Category, Priority};

mod config;
pub use config::{Config, ConfigError, ProseConfig};

/// Non-fatal findings collected during a run.
pub mod diagnostics;
pub use diagnostics::{Diagnostic, Diagnostics, ServiceFailure};

/// Function records and batches.
pub mod function;
pub use function::{
    BatchError, ErrorCondition, FunctionBatch, FunctionName, FunctionRecord, Input, OperationKind,
};

mod graph;
pub use graph::RequirementGraph;

/// Requirement drafts and finalised requirements.
pub mod requirement;
pub use requirement::{DraftKey, Requirement, RequirementDraft, Statement};

/// Requirement identifier types and parsing.
pub mod requirement_id;
pub use requirement_id::{Error as RequirementIdError, RequirementId};
