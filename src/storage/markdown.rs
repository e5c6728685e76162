use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use crate::{
    domain::{Diagnostics, RequirementId},
    engine::{Document, RenderedRequirement},
};

const NON_FUNCTIONAL: &[(&str, &[&str])] = &[
    (
        "Performance",
        &[
            "Response time for record operations should not exceed 2 seconds under normal load.",
            "The system should handle concurrent users efficiently.",
            "Database queries should be optimised for performance.",
        ],
    ),
    (
        "Security",
        &[
            "All input data must be validated and sanitised.",
            "Authentication is required for all record operations.",
            "An audit trail is kept for all data modifications.",
            "Sensitive information is encrypted.",
        ],
    ),
    (
        "Reliability",
        &[
            "System availability should be 99.9%.",
            "Errors are handled with appropriate recovery mechanisms.",
            "Data backup and recovery procedures are in place.",
        ],
    ),
    (
        "Usability",
        &[
            "The user interface is intuitive.",
            "Error messages and user feedback are clear.",
            "Comprehensive user documentation is provided.",
        ],
    ),
];

/// Writes `document` as a Markdown software requirements specification.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_markdown<W: Write>(
    document: &Document,
    diagnostics: &Diagnostics,
    writer: &mut W,
) -> io::Result<()> {
    let metadata = &document.metadata;
    let project = &metadata.project_name;

    writeln!(writer, "# Software Requirements Specification")?;
    writeln!(writer)?;
    writeln!(writer, "## {project}")?;
    writeln!(writer)?;
    writeln!(writer, "| | |")?;
    writeln!(writer, "|---|---|")?;
    writeln!(writer, "| Company | {} |", metadata.company_name)?;
    writeln!(writer, "| Version | {} |", metadata.version)?;
    writeln!(writer, "| Status | {} |", metadata.status)?;
    writeln!(writer, "| Date | {} |", metadata.generated.format("%B %d, %Y"))?;
    writeln!(writer, "| Run | `{}` |", metadata.run_id)?;
    writeln!(writer)?;

    writeln!(writer, "## Table of Contents")?;
    writeln!(writer)?;
    writeln!(writer, "1. Introduction")?;
    writeln!(writer, "2. System Overview")?;
    writeln!(writer, "3. Functional Requirements")?;
    for (index, section) in document.sections().iter().enumerate() {
        writeln!(writer, "   {}. {}", index + 1, section.label())?;
    }
    writeln!(writer, "4. Non-Functional Requirements")?;
    writeln!(writer, "5. Generation Report")?;
    writeln!(writer)?;

    writeln!(writer, "## 1. Introduction")?;
    writeln!(writer)?;
    writeln!(
        writer,
        "This Software Requirements Specification describes the functional and \
         non-functional requirements for the {project}. It is the foundation for system \
         design, development, testing and maintenance."
    )?;
    writeln!(writer)?;
    writeln!(writer, "### 1.1 Purpose")?;
    writeln!(writer)?;
    writeln!(
        writer,
        "This document describes what the {project} must do, in language shared by business \
         stakeholders and the delivery team."
    )?;
    writeln!(writer)?;
    writeln!(writer, "### 1.2 Scope")?;
    writeln!(writer)?;
    writeln!(
        writer,
        "The requirements cover every documented function of the system: data management, \
         business rules, integration with other systems, user-facing behaviour and security."
    )?;
    writeln!(writer)?;

    writeln!(writer, "## 2. System Overview")?;
    writeln!(writer)?;
    writeln!(
        writer,
        "The {project} provides {} requirements across {} functional areas. Each requirement \
         is numbered within its area and lists the requirements it depends on.",
        document.len(),
        document.sections().len()
    )?;
    writeln!(writer)?;

    writeln!(writer, "## 3. Functional Requirements")?;
    writeln!(writer)?;
    if document.is_empty() {
        writeln!(writer, "No functional requirements were identified.")?;
        writeln!(writer)?;
    }
    for (index, section) in document.sections().iter().enumerate() {
        writeln!(writer, "### 3.{} {}", index + 1, section.label())?;
        writeln!(writer)?;
        for requirement in &section.requirements {
            write_requirement(writer, requirement, metadata.digits)?;
        }
    }

    writeln!(writer, "## 4. Non-Functional Requirements")?;
    writeln!(writer)?;
    for (heading, items) in NON_FUNCTIONAL {
        writeln!(writer, "### {heading}")?;
        writeln!(writer)?;
        for item in *items {
            writeln!(writer, "- {item}")?;
        }
        writeln!(writer)?;
    }

    writeln!(writer, "## 5. Generation Report")?;
    writeln!(writer)?;
    writeln!(writer, "{}.", diagnostics.summary())?;
    if !diagnostics.is_empty() {
        writeln!(writer)?;
        for diagnostic in diagnostics.entries() {
            writeln!(writer, "- {diagnostic}")?;
        }
    }

    Ok(())
}

fn write_requirement<W: Write>(
    writer: &mut W,
    requirement: &RenderedRequirement,
    digits: usize,
) -> io::Result<()> {
    writeln!(writer, "#### {}", requirement.id.display(digits))?;
    writeln!(writer)?;
    writeln!(writer, "{}", requirement.sentence)?;
    writeln!(writer)?;
    writeln!(writer, "- **Priority:** {}", requirement.priority)?;
    if !requirement.related_ids.is_empty() {
        writeln!(
            writer,
            "- **Related:** {}",
            join_ids(&requirement.related_ids, digits)
        )?;
    }
    let sources: Vec<&str> = requirement
        .provenance
        .iter()
        .map(|name| name.as_str())
        .collect();
    writeln!(writer, "- **Source:** {}", sources.join(", "))?;
    writeln!(writer)?;
    writeln!(writer, "<!-- fingerprint: {} -->", requirement.fingerprint)?;
    writeln!(writer)?;
    Ok(())
}

fn join_ids(ids: &[RequirementId], digits: usize) -> String {
    ids.iter()
        .map(|id| id.display(digits).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Writes `document` to a Markdown file at `path`, replacing any existing
/// file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn save_markdown(document: &Document, diagnostics: &Diagnostics, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_markdown(document, diagnostics, &mut writer)?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::*;
    use crate::{
        domain::{Config, FunctionBatch, FunctionName, FunctionRecord, Input, OperationKind},
        engine::{Generation, Generator, OfflineProse},
    };

    async fn generate(config: Config, records: Vec<FunctionRecord>) -> Generation {
        Generator::new(config, Arc::new(OfflineProse))
            .generate(&FunctionBatch::new(records).unwrap())
            .await
            .unwrap()
    }

    fn example_records() -> Vec<FunctionRecord> {
        vec![
            FunctionRecord::new(FunctionName::new("createUser").unwrap(), OperationKind::Create)
                .with_input(Input::required("email", "string").with_validation("must be unique"))
                .with_outputs("user id"),
            FunctionRecord::new(FunctionName::new("deleteUser").unwrap(), OperationKind::Delete)
                .with_input(Input::required("id", "string"))
                .with_dependency("createUser"),
        ]
    }

    fn render(generation: &Generation) -> String {
        let mut buffer = Vec::new();
        write_markdown(&generation.document, &generation.diagnostics, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[tokio::test]
    async fn sections_appear_in_category_order() {
        let markdown = render(&generate(Config::default(), example_records()).await);

        let data = markdown.find("### 3.1 Data Management").unwrap();
        let logic = markdown.find("### 3.2 Business Logic").unwrap();
        assert!(data < logic);
        assert!(!markdown.contains("User Interface\n"));

        let dm1 = markdown.find("#### REQ-DM-1").unwrap();
        let dm2 = markdown.find("#### REQ-DM-2").unwrap();
        assert!(dm1 < dm2 && dm2 < logic);
    }

    #[tokio::test]
    async fn requirement_details_are_listed() {
        let markdown = render(&generate(Config::default(), example_records()).await);

        assert!(markdown.contains(
            "The system shall archive the user when a request to delete the user is received \
             to complete the user delete operation."
        ));
        assert!(markdown.contains("- **Related:** REQ-DM-1, REQ-BL-1"));
        assert!(markdown.contains("- **Source:** deleteUser"));
        assert!(markdown.contains("- **Priority:** High"));
    }

    #[tokio::test]
    async fn report_summarises_fallbacks() {
        let markdown = render(&generate(Config::default(), example_records()).await);

        assert!(markdown.contains("## 5. Generation Report"));
        assert!(markdown.contains("3 of 3 requirements rendered via fallback."));
        assert!(markdown.contains("## 4. Non-Functional Requirements"));
    }

    #[tokio::test]
    async fn ids_are_padded_to_configured_width() {
        let config: Config = toml::from_str("_version = \"1\"\ndigits = 3\n").unwrap();
        let markdown = render(&generate(config, example_records()).await);

        assert!(markdown.contains("#### REQ-DM-001"));
        assert!(markdown.contains("- **Related:** REQ-DM-001, REQ-BL-001"));
    }

    #[tokio::test]
    async fn empty_document_says_so() {
        let markdown = render(&generate(Config::default(), Vec::new()).await);
        assert!(markdown.contains("No functional requirements were identified."));
    }

    #[tokio::test]
    async fn saved_file_matches_rendered_text() {
        let generation = generate(Config::default(), example_records()).await;
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("SRS.md");

        save_markdown(&generation.document, &generation.diagnostics, &path).unwrap();

        assert_eq!(std::fs::read_to_string(path).unwrap(), render(&generation));
    }
}
