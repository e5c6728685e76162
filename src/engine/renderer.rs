//! Orders requirements into document sections and renders their prose.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    domain::{
        Category, Config, Diagnostic, Diagnostics, FunctionName, Priority, ProseConfig,
        Requirement, RequirementId, ServiceFailure,
    },
    engine::prose::{ProseGenerator, ServiceError, StructuredPrompt},
};

/// Title-block information for a generated document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentMetadata {
    /// The system the document specifies.
    pub project_name: String,
    /// The organisation that owns the document.
    pub company_name: String,
    /// Document version.
    pub version: String,
    /// Document status, e.g. `Draft`.
    pub status: String,
    /// Width requirement sequence numbers are padded to when printed.
    pub digits: usize,
    /// When the document was generated.
    pub generated: DateTime<Utc>,
    /// Identifier of the generation run.
    pub run_id: Uuid,
}

impl DocumentMetadata {
    /// Builds the metadata for a run from the configuration.
    #[must_use]
    pub fn new(config: &Config, run_id: Uuid) -> Self {
        Self {
            project_name: config.project_name.clone(),
            company_name: config.company_name.clone(),
            version: config.document_version.clone(),
            status: config.document_status.clone(),
            digits: config.digits(),
            generated: Utc::now(),
            run_id,
        }
    }
}

/// One requirement as it appears in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedRequirement {
    /// The requirement ID.
    pub id: RequirementId,
    /// The requirement priority.
    pub priority: Priority,
    /// The rendered sentence.
    pub sentence: String,
    /// Whether the sentence is the deterministic fallback.
    pub via_fallback: bool,
    /// IDs of related requirements.
    pub related_ids: Vec<RequirementId>,
    /// Functions the requirement was generated from.
    pub provenance: Vec<FunctionName>,
    /// Content fingerprint of the requirement.
    pub fingerprint: String,
    /// Warnings attached during resolution.
    pub warnings: Vec<Diagnostic>,
}

/// A document section holding the requirements of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    /// The section's category.
    pub category: Category,
    /// Requirements in ascending sequence order.
    pub requirements: Vec<RenderedRequirement>,
}

impl Section {
    /// The section heading.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.category.label()
    }
}

/// The rendered requirements specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    /// Title-block information.
    pub metadata: DocumentMetadata,
    sections: Vec<Section>,
}

impl Document {
    /// Non-empty sections, in fixed category order.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Iterates over every requirement in document order.
    pub fn requirements(&self) -> impl Iterator<Item = &RenderedRequirement> {
        self.sections
            .iter()
            .flat_map(|section| section.requirements.iter())
    }

    /// Looks a requirement up by ID.
    #[must_use]
    pub fn requirement(&self, id: RequirementId) -> Option<&RenderedRequirement> {
        self.requirements().find(|requirement| requirement.id == id)
    }

    /// Number of requirements in the document.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections
            .iter()
            .map(|section| section.requirements.len())
            .sum()
    }

    /// Whether the document holds no requirements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Renders requirements through a [`ProseGenerator`].
///
/// Calls run concurrently up to the configured limit. A call that fails,
/// times out or returns blank text is replaced by the requirement's
/// fallback sentence; no requirement is ever dropped.
#[derive(Clone)]
pub struct Renderer {
    generator: Arc<dyn ProseGenerator>,
    concurrency: usize,
    timeout: Duration,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("concurrency", &self.concurrency)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Renderer {
    /// Creates a renderer with the concurrency and timeout from `config`.
    #[must_use]
    pub fn new(generator: Arc<dyn ProseGenerator>, config: &ProseConfig) -> Self {
        Self {
            generator,
            concurrency: config.concurrency.max(1),
            timeout: config.timeout(),
        }
    }

    /// Overrides the maximum number of calls in flight. Zero is treated as
    /// one.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Overrides the per-call timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Renders `requirements` into a document.
    ///
    /// Sections follow [`Category::ALL`]; within a section requirements are
    /// ordered by sequence number. Service failures are reported in the
    /// returned diagnostics in ID order.
    #[instrument(level = "debug", skip_all, fields(requirements = requirements.len()))]
    pub async fn render(
        &self,
        requirements: &[Requirement],
        metadata: DocumentMetadata,
    ) -> (Document, Diagnostics) {
        let mut prose = self.generate_all(requirements).await;

        let mut order: Vec<usize> = (0..requirements.len()).collect();
        order.sort_by_key(|&index| requirements[index].id());

        let mut diagnostics = Diagnostics::default();
        let mut sections: Vec<Section> = Vec::new();

        for index in order {
            let requirement = &requirements[index];
            let statement = requirement.statement();

            let (sentence, via_fallback) = match prose[index].take() {
                Some(Ok(sentence)) => (sentence, false),
                outcome => {
                    let failure = outcome.map_or(ServiceFailure::Unavailable, |result| {
                        result.err().unwrap_or(ServiceFailure::Unavailable)
                    });
                    diagnostics.push(Diagnostic::ServiceError {
                        requirement: requirement.id(),
                        category: statement.category,
                        failure,
                    });
                    (statement.fallback_sentence(), true)
                }
            };
            diagnostics.record_render(via_fallback);

            let rendered = RenderedRequirement {
                id: requirement.id(),
                priority: statement.priority,
                sentence,
                via_fallback,
                related_ids: requirement.related_ids().iter().copied().collect(),
                provenance: requirement.provenance().iter().cloned().collect(),
                fingerprint: requirement.fingerprint(),
                warnings: requirement.warnings().to_vec(),
            };

            match sections.last_mut() {
                Some(section) if section.category == statement.category => {
                    section.requirements.push(rendered);
                }
                _ => sections.push(Section {
                    category: statement.category,
                    requirements: vec![rendered],
                }),
            }
        }

        (Document { metadata, sections }, diagnostics)
    }

    /// Calls the generator for every requirement, bounded by the concurrency
    /// limit. Slot `i` holds the outcome for `requirements[i]`; a slot is
    /// `None` if its task panicked.
    async fn generate_all(
        &self,
        requirements: &[Requirement],
    ) -> Vec<Option<Result<String, ServiceFailure>>> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (index, requirement) in requirements.iter().enumerate() {
            let prompt = StructuredPrompt::from(requirement);
            let generator = Arc::clone(&self.generator);
            let semaphore = Arc::clone(&semaphore);
            let timeout = self.timeout;

            tasks.spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => call(generator.as_ref(), &prompt, timeout).await,
                    Err(_) => Err(ServiceFailure::Unavailable),
                };
                (index, outcome)
            });
        }

        let mut results = vec![None; requirements.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => results[index] = Some(outcome),
                Err(e) => warn!("prose task failed: {e}"),
            }
        }
        results
    }
}

async fn call(
    generator: &dyn ProseGenerator,
    prompt: &StructuredPrompt,
    timeout: Duration,
) -> Result<String, ServiceFailure> {
    let outcome = tokio::time::timeout(timeout, generator.generate(prompt))
        .await
        .unwrap_or(Err(ServiceError::Timeout));

    match outcome {
        Ok(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        Ok(_) => {
            warn!(requirement = %prompt.id, failure = %ServiceFailure::Empty, "falling back to structured sentence");
            Err(ServiceFailure::Empty)
        }
        Err(error) => {
            let failure = error.failure();
            warn!(requirement = %prompt.id, %failure, %error, "falling back to structured sentence");
            Err(failure)
        }
    }
}
