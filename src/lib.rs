//! Software requirements specification generation
//!
//! Technical function documentation goes in; a categorised, numbered and
//! cross-referenced set of business-language requirements comes out.
//!
//! The pipeline runs [`classify`](engine::Classifier::classify) →
//! [`synthesize`](engine::synthesize) → [`resolve`](engine::resolve) →
//! [`render`](engine::Renderer::render). Everything except the prose call is
//! deterministic.

pub mod domain;
pub use domain::{
    Category, Config, Diagnostic, Diagnostics, FunctionBatch, FunctionName, FunctionRecord,
    Priority, Requirement, RequirementDraft, RequirementId,
};

/// The requirement inference and rendering pipeline.
pub mod engine;
pub use engine::{Document, Generation, GenerationError, Generator, ProseGenerator};

/// Reading function records and writing documents.
pub mod storage;
