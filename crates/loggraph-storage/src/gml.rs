//! GML (Graph Modelling Language) reader and writer.
//!
//! Vertices are written with a numeric `id` plus their identifier as `label`;
//! edges reference vertices by numeric id. Content payloads go through the
//! caller's stringizer; timestamps are RFC 3339 strings.

use crate::StorageError;
use crate::stringizer::{Destringizer, Stringizer};
use chrono::{DateTime, SecondsFormat, Utc};
use loggraph_core::{
    ChapterData, ChapterId, ChapterMarker, ChapterMetadata, Content, EventNode, LogGraph, NodeData,
    NodeMetadata, Relation, RelationData, RelationMetadata, Vertex, VertexId,
};
use std::collections::HashMap;
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq)]
enum GmlValue {
    Int(i64),
    Real(f64),
    Str(String),
    List(Vec<(String, GmlValue)>),
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#10;", "\n")
        .replace("&#13;", "\r")
        .replace("&amp;", "&")
}

fn format_time(time: &Option<DateTime<Utc>>) -> Option<String> {
    time.map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

pub fn write_gml(graph: &LogGraph, stringizer: &dyn Stringizer) -> Result<String, StorageError> {
    let mut out = String::new();
    let mut numeric: HashMap<VertexId, usize> = HashMap::with_capacity(graph.vertex_count());

    let _ = writeln!(out, "graph [");
    let _ = writeln!(out, "  directed {}", u8::from(graph.is_directed()));

    for (idx, vertex) in graph.vertices().enumerate() {
        numeric.insert(vertex.id(), idx);
        let mut attrs: Vec<(&str, String)> = vec![("label", vertex.id().to_string())];
        match vertex {
            Vertex::Node(node) => {
                attrs.push(("kind", "node".to_string()));
                attrs.push(("column", node.metadata.column.clone()));
                attrs.push(("style", node.metadata.style.clone()));
                attrs.push(("chapter", node.metadata.chapter_id.to_string()));
                attrs.push(("content", stringizer.stringize(&node.data.content)?));
                if let Some(time) = format_time(&node.metadata.time) {
                    attrs.push(("time", time));
                }
            }
            Vertex::Chapter(chapter) => {
                attrs.push(("kind", "chapter".to_string()));
                attrs.push(("title", chapter.data.title.clone()));
                attrs.push(("style", chapter.metadata.style.clone()));
                attrs.push(("content", stringizer.stringize(&chapter.data.content)?));
                if let Some(time) = format_time(&chapter.metadata.time) {
                    attrs.push(("time", time));
                }
            }
        }

        let _ = writeln!(out, "  node [");
        let _ = writeln!(out, "    id {idx}");
        for (key, value) in attrs {
            let _ = writeln!(out, "    {key} \"{}\"", escape(&value));
        }
        if let Vertex::Node(node) = vertex {
            let _ = writeln!(out, "    stack {}", u8::from(node.metadata.stack));
        }
        let _ = writeln!(out, "  ]");
    }

    for edge in graph.edges() {
        let source = numeric
            .get(&edge.source)
            .ok_or_else(|| StorageError::Other(format!("dangling edge {}", edge.id)))?;
        let target = numeric
            .get(&edge.target)
            .ok_or_else(|| StorageError::Other(format!("dangling edge {}", edge.id)))?;
        let _ = writeln!(out, "  edge [");
        let _ = writeln!(out, "    source {source}");
        let _ = writeln!(out, "    target {target}");
        let _ = writeln!(out, "    label \"{}\"", escape(&edge.id.to_string()));
        let _ = writeln!(out, "    style \"{}\"", escape(&edge.metadata.style));
        let _ = writeln!(
            out,
            "    content \"{}\"",
            escape(&stringizer.stringize(&edge.data.content)?)
        );
        if let Some(time) = format_time(&edge.metadata.time) {
            let _ = writeln!(out, "    time \"{}\"", escape(&time));
        }
        let _ = writeln!(out, "  ]");
    }
    let _ = writeln!(out, "]");
    Ok(out)
}

struct Parser<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            line: 1,
        }
    }

    fn error(&self, message: impl Into<String>) -> StorageError {
        StorageError::Parse {
            line: self.line,
            message: message.into(),
        }
    }

    fn skip_blank(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch == '#' {
                while let Some(ch) = self.chars.next() {
                    if ch == '\n' {
                        self.line += 1;
                        break;
                    }
                }
            } else if ch.is_whitespace() {
                if ch == '\n' {
                    self.line += 1;
                }
                self.chars.next();
            } else {
                break;
            }
        }
    }

    fn key(&mut self) -> Result<Option<String>, StorageError> {
        self.skip_blank();
        match self.chars.peek().copied() {
            None | Some(']') => return Ok(None),
            Some(ch) if !ch.is_ascii_alphabetic() && ch != '_' => {
                return Err(self.error(format!("expected a key, found {ch:?}")));
            }
            _ => {}
        }
        let mut key = String::new();
        while let Some(&ch) = self.chars.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                key.push(ch);
                self.chars.next();
            } else {
                break;
            }
        }
        Ok(Some(key))
    }

    fn value(&mut self) -> Result<GmlValue, StorageError> {
        self.skip_blank();
        match self.chars.peek().copied() {
            Some('[') => {
                self.chars.next();
                let list = self.list()?;
                self.skip_blank();
                match self.chars.next() {
                    Some(']') => Ok(GmlValue::List(list)),
                    _ => Err(self.error("unterminated list")),
                }
            }
            Some('"') => {
                self.chars.next();
                let mut text = String::new();
                loop {
                    match self.chars.next() {
                        Some('"') => break,
                        Some(ch) => {
                            if ch == '\n' {
                                self.line += 1;
                            }
                            text.push(ch);
                        }
                        None => return Err(self.error("unterminated string")),
                    }
                }
                Ok(GmlValue::Str(unescape(&text)))
            }
            Some(_) => {
                let mut token = String::new();
                while let Some(&ch) = self.chars.peek() {
                    if ch.is_whitespace() || ch == ']' {
                        break;
                    }
                    token.push(ch);
                    self.chars.next();
                }
                if let Ok(int) = token.parse::<i64>() {
                    Ok(GmlValue::Int(int))
                } else if let Ok(real) = token.parse::<f64>() {
                    Ok(GmlValue::Real(real))
                } else {
                    Err(self.error(format!("bad value {token:?}")))
                }
            }
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn list(&mut self) -> Result<Vec<(String, GmlValue)>, StorageError> {
        let mut entries = Vec::new();
        while let Some(key) = self.key()? {
            let value = self.value()?;
            entries.push((key, value));
        }
        Ok(entries)
    }
}

struct Record<'a> {
    entries: &'a [(String, GmlValue)],
    what: &'static str,
}

impl<'a> Record<'a> {
    fn get(&self, key: &str) -> Option<&'a GmlValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    fn missing(&self, key: &str) -> StorageError {
        StorageError::Other(format!("{} is missing {key:?}", self.what))
    }

    fn str(&self, key: &str) -> Result<&'a str, StorageError> {
        match self.get(key) {
            Some(GmlValue::Str(text)) => Ok(text),
            _ => Err(self.missing(key)),
        }
    }

    fn int(&self, key: &str) -> Result<i64, StorageError> {
        match self.get(key) {
            Some(GmlValue::Int(value)) => Ok(*value),
            _ => Err(self.missing(key)),
        }
    }

    fn flag(&self, key: &str) -> bool {
        matches!(self.get(key), Some(GmlValue::Int(value)) if *value != 0)
    }

    fn content(&self, destringizer: &dyn Destringizer) -> Result<Content, StorageError> {
        match self.get("content") {
            Some(GmlValue::Str(text)) => destringizer.destringize(text),
            _ => Ok(Content::Null),
        }
    }

    fn time(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        match self.get("time") {
            Some(GmlValue::Str(text)) => DateTime::parse_from_rfc3339(text)
                .map(|t| Some(t.with_timezone(&Utc)))
                .map_err(|err| StorageError::Other(format!("bad time {text:?}: {err}"))),
            _ => Ok(None),
        }
    }
}

pub fn read_gml(text: &str, destringizer: &dyn Destringizer) -> Result<LogGraph, StorageError> {
    let mut parser = Parser::new(text);
    let top = parser.list()?;
    parser.skip_blank();
    if parser.chars.peek().is_some() {
        return Err(parser.error("trailing input after graph"));
    }
    let Some(GmlValue::List(body)) = top
        .iter()
        .find(|(key, _)| key == "graph")
        .map(|(_, value)| value)
    else {
        return Err(parser.error("no graph block"));
    };
    let graph_record = Record {
        entries: body,
        what: "graph",
    };
    let directed = graph_record.flag("directed");

    let mut labels: HashMap<i64, VertexId> = HashMap::new();
    let mut vertices = Vec::new();
    let mut edges = Vec::new();

    for (key, value) in body {
        let GmlValue::List(entries) = value else {
            continue;
        };
        match key.as_str() {
            "node" => {
                let record = Record {
                    entries,
                    what: "node",
                };
                let label: VertexId = record.str("label")?.parse()?;
                labels.insert(record.int("id")?, label);
                let content = record.content(destringizer)?;
                let vertex = match label {
                    VertexId::Node(id) => Vertex::Node(EventNode {
                        id,
                        data: NodeData { content },
                        metadata: NodeMetadata {
                            time: record.time()?,
                            column: record.str("column")?.to_string(),
                            style: record.str("style")?.to_string(),
                            stack: record.flag("stack"),
                            chapter_id: record.str("chapter")?.parse::<ChapterId>()?,
                        },
                    }),
                    VertexId::Chapter(id) => Vertex::Chapter(ChapterMarker {
                        id,
                        data: ChapterData {
                            title: record.str("title")?.to_string(),
                            content,
                        },
                        metadata: ChapterMetadata {
                            time: record.time()?,
                            style: record.str("style")?.to_string(),
                        },
                    }),
                };
                vertices.push(vertex);
            }
            "edge" => {
                let record = Record {
                    entries,
                    what: "edge",
                };
                let endpoint = |key: &str| -> Result<VertexId, StorageError> {
                    let numeric = record.int(key)?;
                    labels.get(&numeric).copied().ok_or_else(|| {
                        StorageError::Other(format!("edge {key} {numeric} names no node"))
                    })
                };
                let source = endpoint("source")?;
                let target = endpoint("target")?;
                let content = record.content(destringizer)?;
                edges.push(Relation {
                    id: loggraph_core::EdgeId::new(source, target, directed)?,
                    source,
                    target,
                    data: RelationData { content },
                    metadata: RelationMetadata {
                        style: record
                            .str("style")
                            .unwrap_or(loggraph_core::DEFAULT_STYLE)
                            .to_string(),
                        time: record.time()?,
                    },
                });
            }
            _ => {}
        }
    }

    Ok(LogGraph::from_parts(directed, vertices, edges)?)
}
