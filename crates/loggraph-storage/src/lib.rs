//! Persistence for log graphs.
//!
//! Two text formats are supported: a JSON node-link document (the default)
//! and GML. JSON carries content payloads natively; GML stores them through
//! the caller's [`Stringizer`]/[`Destringizer`] pair. Asking for a format
//! that does not exist falls back to JSON and reports a [`FormatFallback`].

use loggraph_core::{GraphError, IdError, LogGraph};
use std::fmt;
use std::path::Path;
use thiserror::Error;

mod gml;
mod json;
pub mod stringizer;

pub use gml::{read_gml, write_gml};
pub use json::{DOCUMENT_VERSION, GraphDocument, read_json, write_json};
pub use stringizer::{Destringizer, JsonStringizer, PlainTextStringizer, Stringizer};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Id(#[from] IdError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error(transparent)]
    FormatFallback(#[from] FormatFallback),
    #[error("Other error: {0}")]
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GraphFormat {
    #[default]
    Json,
    Gml,
}

impl GraphFormat {
    pub const ALL: [GraphFormat; 2] = [GraphFormat::Json, GraphFormat::Gml];

    pub fn name(&self) -> &'static str {
        match self {
            GraphFormat::Json => "json",
            GraphFormat::Gml => "gml",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().trim_start_matches('.').to_ascii_lowercase();
        Self::ALL.into_iter().find(|format| format.name() == name)
    }

    /// Format for `name`, or the default plus a fallback warning.
    pub fn resolve(name: &str) -> (Self, Option<FormatFallback>) {
        match Self::from_name(name) {
            Some(format) => (format, None),
            None => {
                let fallback = FormatFallback {
                    requested: name.to_string(),
                    used: Self::default(),
                };
                tracing::warn!("{}", fallback);
                (fallback.used, Some(fallback))
            }
        }
    }

    pub fn for_path(path: &Path) -> (Self, Option<FormatFallback>) {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::resolve(extension)
    }
}

impl fmt::Display for GraphFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Warning-level error: the requested format is unsupported and `used`
/// was applied instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported graph format {requested:?}, falling back to {used}")]
pub struct FormatFallback {
    pub requested: String,
    pub used: GraphFormat,
}

/// Result of a persistence call, with the fallback taken if any.
#[derive(Debug)]
pub struct Persisted<T> {
    pub value: T,
    pub format: GraphFormat,
    pub fallback: Option<FormatFallback>,
}

impl<T> Persisted<T> {
    /// Turns a fallback into a hard error.
    pub fn strict(self) -> Result<T, StorageError> {
        match self.fallback {
            Some(fallback) => Err(fallback.into()),
            None => Ok(self.value),
        }
    }
}

pub fn encode(
    graph: &LogGraph,
    format: GraphFormat,
    stringizer: &dyn Stringizer,
) -> Result<String, StorageError> {
    match format {
        GraphFormat::Json => write_json(graph),
        GraphFormat::Gml => write_gml(graph, stringizer),
    }
}

pub fn decode(
    text: &str,
    format: GraphFormat,
    destringizer: &dyn Destringizer,
) -> Result<LogGraph, StorageError> {
    match format {
        GraphFormat::Json => read_json(text),
        GraphFormat::Gml => read_gml(text, destringizer),
    }
}

/// Serializes `graph` in the format called `format_name`.
pub fn write_graph(
    graph: &LogGraph,
    format_name: &str,
    stringizer: &dyn Stringizer,
) -> Result<Persisted<String>, StorageError> {
    let (format, fallback) = GraphFormat::resolve(format_name);
    Ok(Persisted {
        value: encode(graph, format, stringizer)?,
        format,
        fallback,
    })
}

pub fn read_graph(
    text: &str,
    format_name: &str,
    destringizer: &dyn Destringizer,
) -> Result<Persisted<LogGraph>, StorageError> {
    let (format, fallback) = GraphFormat::resolve(format_name);
    Ok(Persisted {
        value: decode(text, format, destringizer)?,
        format,
        fallback,
    })
}

/// Writes `graph` to `path`, picking the format from the extension.
pub fn save_to_path(
    graph: &LogGraph,
    path: &Path,
    stringizer: &dyn Stringizer,
) -> Result<Persisted<()>, StorageError> {
    let (format, fallback) = GraphFormat::for_path(path);
    let text = encode(graph, format, stringizer)?;
    std::fs::write(path, text)?;
    tracing::debug!(
        "Saved {} vertices to {} as {}",
        graph.vertex_count(),
        path.display(),
        format
    );
    Ok(Persisted {
        value: (),
        format,
        fallback,
    })
}

pub fn load_from_path(
    path: &Path,
    destringizer: &dyn Destringizer,
) -> Result<Persisted<LogGraph>, StorageError> {
    let (format, fallback) = GraphFormat::for_path(path);
    let text = std::fs::read_to_string(path)?;
    let graph = decode(&text, format, destringizer)?;
    tracing::debug!(
        "Loaded {} vertices from {}",
        graph.vertex_count(),
        path.display()
    );
    Ok(Persisted {
        value: graph,
        format,
        fallback,
    })
}

#[cfg(test)]
mod tests;
