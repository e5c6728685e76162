use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use srsgen::{
    Config, Generator, RequirementId,
    engine::{Classifier, OfflineProse},
    storage::load_path,
};
use tracing::instrument;

use crate::cli::terminal::Palette;

#[derive(Debug, clap::Parser)]
pub struct Classify {
    /// File or directory of function documentation
    #[arg(default_value = "crud_docs")]
    input: PathBuf,
}

impl Classify {
    #[instrument(skip(config))]
    pub fn run(self, config: Config) -> anyhow::Result<()> {
        let batch = load_path(&self.input).with_context(|| {
            format!("failed to load function records from {}", self.input.display())
        })?;

        let classifier = Classifier::new(&batch, config.sensitive_patterns())?;
        let digits = config.digits();
        let palette = Palette::detect();

        println!("{}", palette.heading("Functions"));
        for record in batch.records() {
            let classification = classifier.classify(record);
            let categories: Vec<String> = classification
                .categories()
                .iter()
                .map(|&category| palette.category(category))
                .collect();
            let marker = if classification.is_default() {
                palette.muted(" (default)")
            } else {
                String::new()
            };
            println!(
                "  {:<24} {:<9} {}{marker}",
                record.name.as_str(),
                record.operation_kind.to_string(),
                categories.join(" ")
            );
        }

        let resolution = Generator::new(config, Arc::new(OfflineProse)).plan(&batch)?;
        let graph = &resolution.graph;

        println!();
        println!("{}", palette.heading("Requirements"));
        for requirement in &resolution.requirements {
            let id = requirement.id();
            let label = id.display(digits).to_string();
            if palette.is_narrow() {
                println!("  {label:<12} {}", palette.priority(requirement.priority()));
                continue;
            }

            let sources: Vec<&str> = requirement
                .provenance()
                .iter()
                .map(|name| name.as_str())
                .collect();

            let mut links = String::new();
            let related = join_ids(graph.related(id), digits);
            if !related.is_empty() {
                links.push_str(&palette.muted(&format!(" -> {related}")));
            }
            let referenced_by = join_ids(graph.referenced_by(id), digits);
            if !referenced_by.is_empty() {
                links.push_str(&palette.muted(&format!(" <- {referenced_by}")));
            }

            println!(
                "  {label:<12} {} {}{links}",
                palette.priority(requirement.priority()),
                sources.join(", ")
            );
        }

        if !resolution.diagnostics.is_empty() {
            println!();
            for diagnostic in resolution.diagnostics.entries() {
                println!("  {} {diagnostic}", palette.alert("!"));
            }
        }

        Ok(())
    }
}

fn join_ids(ids: impl Iterator<Item = RequirementId>, digits: usize) -> String {
    ids.map(|id| id.display(digits).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
