//! Runs a batch of function records through the requirement pipeline.
//!
//! Classification and synthesis are independent per record and run in
//! parallel. Resolution is a single ordered pass over the drafts in input
//! order. Rendering calls the prose service concurrently and reassembles the
//! results deterministically.

use std::sync::Arc;

use nonempty::NonEmpty;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{Instrument, debug, info, info_span};
use uuid::Uuid;

use crate::domain::{Config, Diagnostic, Diagnostics, FunctionBatch, RequirementDraft};

mod classifier;
pub use classifier::{Classification, Classifier, PatternError};

mod synthesizer;
pub use synthesizer::synthesize;

mod resolver;
pub use resolver::{Resolution, ResolveError, resolve};

/// The external prose-generation capability.
pub mod prose;
pub use prose::{GeminiProse, OfflineProse, ProseGenerator, ServiceError, StructuredPrompt};

mod renderer;
pub use renderer::{Document, DocumentMetadata, RenderedRequirement, Renderer, Section};

/// Errors that abort a generation run.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Requirement IDs could not be assigned.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A configured sensitive-data pattern is invalid.
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// The result of a generation run.
#[derive(Debug, Clone)]
pub struct Generation {
    /// The rendered document.
    pub document: Document,
    /// Everything noteworthy found along the way, in pipeline order.
    pub diagnostics: Diagnostics,
}

/// Drives the full pipeline for one configuration.
#[derive(Debug, Clone)]
pub struct Generator {
    config: Config,
    renderer: Renderer,
}

impl Generator {
    /// Creates a generator rendering prose through `prose`.
    #[must_use]
    pub fn new(config: Config, prose: Arc<dyn ProseGenerator>) -> Self {
        let renderer = Renderer::new(prose, &config.prose);
        Self { config, renderer }
    }

    /// Overrides the number of prose calls in flight.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.renderer = self.renderer.with_concurrency(concurrency);
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Classifies, synthesizes and resolves `batch` without rendering.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured pattern is invalid or IDs collide.
    pub fn plan(&self, batch: &FunctionBatch) -> Result<Resolution, GenerationError> {
        let classifier = Classifier::new(batch, self.config.sensitive_patterns())?;

        let synthesized: Vec<(bool, NonEmpty<RequirementDraft>)> = batch
            .records()
            .par_iter()
            .map(|record| {
                let classification = classifier.classify(record);
                (
                    classification.is_default(),
                    synthesize(record, &classification),
                )
            })
            .collect();

        let mut diagnostics = Diagnostics::default();
        for (record, (defaulted, _)) in batch.records().iter().zip(&synthesized) {
            if *defaulted {
                diagnostics.push(Diagnostic::ClassificationAmbiguous {
                    function: record.name.clone(),
                });
            }
        }

        let drafts = synthesized.into_iter().flat_map(|(_, drafts)| drafts);
        let mut resolution = resolve(drafts)?;

        debug!(
            functions = batch.len(),
            requirements = resolution.requirements.len(),
            "resolved requirements"
        );

        diagnostics.merge(resolution.diagnostics);
        resolution.diagnostics = diagnostics;
        Ok(resolution)
    }

    /// Runs the whole pipeline and renders the document.
    ///
    /// Prose failures never abort the run; affected requirements use their
    /// fallback sentence and are reported in the diagnostics.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured pattern is invalid or IDs collide.
    pub async fn generate(&self, batch: &FunctionBatch) -> Result<Generation, GenerationError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("generate", %run_id);

        async {
            let resolution = self.plan(batch)?;
            let metadata = DocumentMetadata::new(&self.config, run_id);

            let (document, rendered) = self
                .renderer
                .render(&resolution.requirements, metadata)
                .await;

            let mut diagnostics = resolution.diagnostics;
            diagnostics.merge(rendered);

            info!(
                functions = batch.len(),
                requirements = document.len(),
                findings = diagnostics.entries().len(),
                "{}",
                diagnostics.summary()
            );

            Ok(Generation {
                document,
                diagnostics,
            })
        }
        .instrument(span)
        .await
    }
}
