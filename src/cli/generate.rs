use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use srsgen::{
    Config, Generator, ProseGenerator,
    engine::{GeminiProse, OfflineProse},
    storage::{load_path, save_markdown},
};
use tracing::{instrument, warn};

use crate::cli::terminal::Palette;

const DEFAULT_INPUT: &str = "crud_docs";

#[derive(Debug, clap::Parser)]
pub struct Generate {
    /// File or directory of function documentation (prompted for if omitted)
    input: Option<PathBuf>,

    /// Where to write the Markdown document
    #[arg(short, long, default_value = "SRS_Document.md")]
    output: PathBuf,

    /// Skip the prose service and render every requirement with its
    /// structured sentence
    #[arg(long)]
    offline: bool,

    /// Maximum number of prose requests in flight (overrides the
    /// configuration)
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,
}

impl Generate {
    #[instrument(skip(config))]
    pub fn run(self, config: Config) -> anyhow::Result<()> {
        let input = match self.input {
            Some(input) => input,
            None => prompt_for_input()?,
        };

        let batch = load_path(&input).with_context(|| {
            format!("failed to load function records from {}", input.display())
        })?;
        if batch.is_empty() {
            warn!(input = %input.display(), "no function records found");
        }

        let prose = prose_generator(&config, self.offline);
        let mut generator = Generator::new(config, prose);
        if let Some(concurrency) = self.concurrency {
            generator = generator.with_concurrency(concurrency);
        }

        let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
        spinner.set_message(format!("Generating requirements for {} functions", batch.len()));
        spinner.enable_steady_tick(Duration::from_millis(100));

        let generation = runtime.block_on(generator.generate(&batch));
        spinner.finish_and_clear();
        let generation = generation?;

        save_markdown(&generation.document, &generation.diagnostics, &self.output)
            .with_context(|| format!("failed to write {}", self.output.display()))?;

        let palette = Palette::detect();
        println!(
            "{} {} for {}",
            palette.ok("Wrote"),
            self.output.display(),
            generator.config().project_name
        );
        println!(
            "  {} requirements in {} sections from {} functions",
            generation.document.len(),
            generation.document.sections().len(),
            batch.len()
        );

        let diagnostics = &generation.diagnostics;
        if diagnostics.fallbacks() > 0 {
            println!("  {}", palette.alert(&diagnostics.summary()));
        } else {
            println!("  {}", palette.muted(&diagnostics.summary()));
        }
        for diagnostic in diagnostics.entries() {
            println!("  {} {diagnostic}", palette.alert("!"));
        }

        Ok(())
    }
}

fn prompt_for_input() -> anyhow::Result<PathBuf> {
    let input: String = dialoguer::Input::new()
        .with_prompt("Directory containing function documentation")
        .default(DEFAULT_INPUT.to_string())
        .interact_text()?;
    Ok(PathBuf::from(input))
}

/// The configured prose service, or the offline generator if it was
/// requested or the service cannot be set up.
fn prose_generator(config: &Config, offline: bool) -> Arc<dyn ProseGenerator> {
    if offline {
        return Arc::new(OfflineProse);
    }

    match GeminiProse::from_config(&config.prose) {
        Ok(gemini) => Arc::new(gemini),
        Err(e) => {
            warn!("{e}; rendering every requirement with its structured sentence");
            Arc::new(OfflineProse)
        }
    }
}
