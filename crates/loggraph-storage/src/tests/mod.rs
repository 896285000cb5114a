use super::*;
use loggraph_core::{LogEntry, LogRecorder, Relation, Vertex};
use loggraph_layout::{LayoutConfig, LayoutEngine};
use serde_json::json;
use tempfile::tempdir;

fn sample_graph() -> Result<LogGraph, StorageError> {
    let mut recorder = LogRecorder::new();
    let early = recorder.log(LogEntry::new("system", "boot"))?;
    recorder.new_chapter("Plan \"A\"", "default", json!({"goal": "ship"}))?;
    let prompt = recorder.log(LogEntry {
        stack: true,
        ..LogEntry::new("llm", json!({"prompt": "line 1\nline 2 & more"}))
    })?;
    recorder.log(LogEntry {
        stack: true,
        relates_to: Some(prompt),
        relation_content: json!("answer"),
        ..LogEntry::new("llm", "reply")
    })?;
    recorder.log(LogEntry {
        relates_to: Some(early),
        ..LogEntry::new("tool", json!([1, 2.5, null]))
    })?;
    Ok(recorder.snapshot())
}

fn assert_same_graph(a: &LogGraph, b: &LogGraph) {
    assert_eq!(a.is_directed(), b.is_directed());
    let va: Vec<&Vertex> = a.vertices().collect();
    let vb: Vec<&Vertex> = b.vertices().collect();
    assert_eq!(va, vb);
    let ea: Vec<&Relation> = a.edges().collect();
    let eb: Vec<&Relation> = b.edges().collect();
    assert_eq!(ea, eb);
}

#[test]
fn test_json_round_trip() -> Result<(), StorageError> {
    let graph = sample_graph()?;
    let written = write_graph(&graph, "json", &JsonStringizer)?;
    assert!(written.fallback.is_none());
    let restored = read_graph(&written.value, "json", &JsonStringizer)?.strict()?;
    assert_same_graph(&graph, &restored);
    Ok(())
}

#[test]
fn test_gml_round_trip() -> Result<(), StorageError> {
    let graph = sample_graph()?;
    let written = write_graph(&graph, "gml", &JsonStringizer)?;
    assert_eq!(written.format, GraphFormat::Gml);
    assert!(written.value.starts_with("graph ["));
    let restored = read_graph(&written.value, "gml", &JsonStringizer)?.strict()?;
    assert_same_graph(&graph, &restored);
    Ok(())
}

#[test]
fn test_directed_graph_keeps_direction() -> Result<(), StorageError> {
    let mut recorder = LogRecorder::new_directed();
    let a = recorder.log(LogEntry::new("X", "a"))?;
    recorder.log(LogEntry {
        relates_to: Some(a),
        ..LogEntry::new("X", "b")
    })?;
    let graph = recorder.snapshot();
    for format in GraphFormat::ALL {
        let text = encode(&graph, format, &JsonStringizer)?;
        let restored = decode(&text, format, &JsonStringizer)?;
        assert!(restored.is_directed());
        assert_same_graph(&graph, &restored);
    }
    Ok(())
}

#[test]
fn test_round_trip_preserves_layout() -> Result<(), Box<dyn std::error::Error>> {
    let graph = sample_graph()?;
    let before = LayoutEngine::new(graph.clone(), LayoutConfig::default())?;
    for format in GraphFormat::ALL {
        let text = encode(&graph, format, &JsonStringizer)?;
        let restored = decode(&text, format, &JsonStringizer)?;
        let after = LayoutEngine::new(restored, LayoutConfig::default())?;
        assert_eq!(before.snapshot().positions, after.snapshot().positions);
        assert_eq!(
            before.snapshot().vertex_partitions,
            after.snapshot().vertex_partitions
        );
        assert_eq!(before.snapshot().related, after.snapshot().related);
    }
    Ok(())
}

#[test]
fn test_unknown_format_falls_back_to_json() -> Result<(), StorageError> {
    let graph = sample_graph()?;
    let written = write_graph(&graph, "graphml", &JsonStringizer)?;
    assert_eq!(written.format, GraphFormat::Json);
    let fallback = written.fallback.clone().expect("fallback should be reported");
    assert_eq!(fallback.requested, "graphml");
    assert_eq!(fallback.used, GraphFormat::Json);
    assert!(fallback.to_string().contains("graphml"));

    let restored = read_json(&written.value)?;
    assert_same_graph(&graph, &restored);

    assert!(matches!(
        written.strict(),
        Err(StorageError::FormatFallback(_))
    ));
    Ok(())
}

#[test]
fn test_format_names() {
    assert_eq!(GraphFormat::from_name("GML"), Some(GraphFormat::Gml));
    assert_eq!(GraphFormat::from_name(".json"), Some(GraphFormat::Json));
    assert_eq!(GraphFormat::from_name("yaml"), None);
    assert_eq!(GraphFormat::default().to_string(), "json");
}

#[test]
fn test_path_helpers_use_extension() -> Result<(), StorageError> {
    let dir = tempdir()?;
    let graph = sample_graph()?;

    let gml_path = dir.path().join("log.gml");
    let saved = save_to_path(&graph, &gml_path, &JsonStringizer)?;
    assert_eq!(saved.format, GraphFormat::Gml);
    assert!(std::fs::read_to_string(&gml_path)?.contains("node ["));
    let loaded = load_from_path(&gml_path, &JsonStringizer)?.strict()?;
    assert_same_graph(&graph, &loaded);

    let odd_path = dir.path().join("log.bin");
    let saved = save_to_path(&graph, &odd_path, &JsonStringizer)?;
    assert_eq!(saved.format, GraphFormat::Json);
    assert!(saved.fallback.is_some());
    let loaded = load_from_path(&odd_path, &JsonStringizer)?;
    assert!(loaded.fallback.is_some());
    assert_same_graph(&graph, &loaded.value);
    Ok(())
}

#[test]
fn test_plain_text_stringizer_in_gml() -> Result<(), StorageError> {
    let mut recorder = LogRecorder::new();
    recorder.new_chapter("A", "default", json!(null))?;
    recorder.log(LogEntry::new("X", "just text"))?;
    let graph = recorder.snapshot();

    let text = write_gml(&graph, &PlainTextStringizer)?;
    assert!(text.contains("content \"just text\""));
    let restored = read_gml(&text, &PlainTextStringizer)?;
    assert_same_graph(&graph, &restored);
    Ok(())
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let result = load_from_path(&dir.path().join("absent.json"), &JsonStringizer);
    assert!(matches!(result, Err(StorageError::Io(_))));
}

#[test]
fn test_newer_document_version_is_rejected() {
    let text = r#"{"version": 99, "vertices": []}"#;
    assert!(matches!(read_json(text), Err(StorageError::Other(_))));
}
