//! File loading: format detection, deserialization, and graph construction.
//!
//! Structured files (RON/TOML/JSON) follow [`GraphFile`]; `.txt` files hold
//! textual declarations read by [`parse_modules`].

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use pulsenet_core::config::RunConfig;
use pulsenet_core::graph::ModuleGraph;

use crate::parser::{parse_modules, ParseError};
use crate::schema::{GraphFile, SchemaError};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A textual declaration file was malformed.
    #[error("in {file}: {source}")]
    Declarations {
        file: PathBuf,
        #[source]
        source: ParseError,
    },

    /// A structured file has invalid names or does not form a valid graph.
    #[error("invalid graph in {file}: {source}")]
    Graph {
        file: PathBuf,
        #[source]
        source: SchemaError,
    },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
    /// One `name -> destinations` declaration per line.
    Text,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        Some("txt") => Ok(Format::Text),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        }),
        Format::Json => serde_json::from_str(&content).map_err(|e| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        }),
        Format::Toml => toml::from_str(&content).map_err(|e| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        }),
        Format::Text => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// Loading
// ===========================================================================

/// Load a module graph from a textual or structured file.
pub fn load_graph_file(path: &Path) -> Result<ModuleGraph, DataLoadError> {
    let graph = match detect_format(path)? {
        Format::Text => {
            let content = std::fs::read_to_string(path)?;
            parse_modules(&content).map_err(|source| DataLoadError::Declarations {
                file: path.to_path_buf(),
                source,
            })?
        }
        _ => {
            let file: GraphFile = deserialize_file(path)?;
            file.into_graph().map_err(|source| DataLoadError::Graph {
                file: path.to_path_buf(),
                source,
            })?
        }
    };
    tracing::debug!(
        path = %path.display(),
        modules = graph.module_count(),
        "loaded module graph"
    );
    Ok(graph)
}

/// Load run settings. Missing fields take their defaults.
pub fn load_run_config(path: &Path) -> Result<RunConfig, DataLoadError> {
    deserialize_file(path)
}

// ===========================================================================
// Tests
// ===========================================================================
