use std::path::Path;

use anyhow::Context;
use srsgen::Config;
use tracing::instrument;

use crate::cli::terminal::Palette;

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// Overwrite an existing configuration file
    #[arg(long)]
    force: bool,
}

impl Command {
    #[instrument]
    pub fn run(self, path: &Path) -> anyhow::Result<()> {
        if path.exists() && !self.force {
            anyhow::bail!(
                "{} already exists (use --force to overwrite)",
                path.display()
            );
        }

        Config::default()
            .save(path)
            .with_context(|| format!("failed to write {}", path.display()))?;

        println!("{} {}", Palette::detect().ok("Created"), path.display());
        println!();
        println!("Next steps:");
        println!("  export GEMINI_API_KEY=...");
        println!("  srs generate crud_docs -o SRS_Document.md");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn writes_default_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("srs.toml");

        Command { force: false }.run(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("srs.toml");
        std::fs::write(&path, "_version = \"1\"\nproject_name = \"Billing\"\n").unwrap();

        assert!(Command { force: false }.run(&path).is_err());
        assert_eq!(Config::load(&path).unwrap().project_name, "Billing");

        Command { force: true }.run(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }
}
