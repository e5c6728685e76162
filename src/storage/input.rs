//! Reading function records from YAML and JSON documentation files.
//!
//! A file holds either a single record or a list of records. A directory is
//! walked recursively; files are read in parallel and assembled in path order
//! so the resulting batch is the same on every run.

use std::{
    collections::BTreeSet,
    ffi::OsStr,
    fs,
    io,
    path::{Path, PathBuf},
};

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::Deserialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::domain::{
    BatchError, ErrorCondition, FunctionBatch, FunctionName, FunctionRecord, Input,
    OperationKind, function::EmptyNameError,
};

/// File extensions recognised as function documentation.
const EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Errors raised while loading function records.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The input path does not exist.
    #[error("input not found: {0}")]
    NotFound(PathBuf),

    /// A file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// A YAML file is malformed.
    #[error("failed to parse {path}: {source}")]
    Yaml {
        /// The file being parsed.
        path: PathBuf,
        /// The underlying error.
        source: serde_yaml::Error,
    },

    /// A JSON file is malformed.
    #[error("failed to parse {path}: {source}")]
    Json {
        /// The file being parsed.
        path: PathBuf,
        /// The underlying error.
        source: serde_json::Error,
    },

    /// A record has a blank name.
    #[error("a record in {0} has an empty name")]
    EmptyName(PathBuf),

    /// The loaded records do not form a valid batch.
    #[error(transparent)]
    Batch(#[from] BatchError),
}

/// A function record as written in a documentation file.
///
/// Every field but the name is optional. A missing operation kind is inferred
/// from the name and description.
#[derive(Debug, Deserialize)]
struct RecordFile {
    name: String,
    #[serde(default)]
    operation_kind: Option<OperationKind>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    inputs: Vec<Input>,
    #[serde(default)]
    outputs: String,
    #[serde(default)]
    error_conditions: Vec<ErrorCondition>,
    #[serde(default)]
    dependencies: BTreeSet<String>,
    #[serde(default)]
    external: bool,
    #[serde(default)]
    user_facing: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Records {
    Many(Vec<RecordFile>),
    One(RecordFile),
}

impl From<Records> for Vec<RecordFile> {
    fn from(records: Records) -> Self {
        match records {
            Records::Many(records) => records,
            Records::One(record) => vec![record],
        }
    }
}

impl TryFrom<RecordFile> for FunctionRecord {
    type Error = EmptyNameError;

    fn try_from(file: RecordFile) -> Result<Self, Self::Error> {
        let operation_kind = file
            .operation_kind
            .unwrap_or_else(|| OperationKind::infer(&file.name, file.description.as_deref()));

        let mut record = Self::new(FunctionName::new(file.name)?, operation_kind);
        record.inputs = file.inputs;
        record.outputs = file.outputs;
        record.dependencies = file.dependencies;
        record.external = file.external;
        record.user_facing = file.user_facing;
        record.description = file.description;

        for condition in file.error_conditions {
            record = record.with_error(condition.trigger, condition.error);
        }

        Ok(record)
    }
}

/// Reads every record in one file.
///
/// The format is chosen by extension: `.json` is parsed as JSON, anything
/// else as YAML.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or a record has an
/// empty name.
pub fn load_file(path: &Path) -> Result<Vec<FunctionRecord>, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let records: Records = if path.extension() == Some(OsStr::new("json")) {
        serde_json::from_str(&content).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        serde_yaml::from_str(&content).map_err(|source| LoadError::Yaml {
            path: path.to_path_buf(),
            source,
        })?
    };

    Vec::<RecordFile>::from(records)
        .into_iter()
        .map(|record| {
            FunctionRecord::try_from(record).map_err(|_| LoadError::EmptyName(path.to_path_buf()))
        })
        .collect()
}

/// Loads a batch from a file or a directory of files.
///
/// # Errors
///
/// Returns an error if the path does not exist, any file fails to load, or
/// two records share a name.
pub fn load_path(path: &Path) -> Result<FunctionBatch, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    if path.is_file() {
        return Ok(FunctionBatch::new(load_file(path)?)?);
    }

    let paths = collect_record_paths(path);
    debug!(files = paths.len(), root = %path.display(), "loading function records");

    let loaded = paths
        .par_iter()
        .map(|path| load_file(path))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FunctionBatch::new(loaded.into_iter().flatten().collect())?)
}

fn collect_record_paths(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| {
            entry
                .inspect_err(|e| warn!(error = %e, "skipping unreadable entry"))
                .ok()
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(OsStr::to_str)
                .is_some_and(|extension| EXTENSIONS.contains(&extension))
        })
        .map(walkdir::DirEntry::into_path)
        .collect()
}
