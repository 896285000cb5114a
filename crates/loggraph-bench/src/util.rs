use loggraph_core::{LogEntry, LogGraph, LogRecorder, NodeId};
use serde_json::json;

const COLUMNS: [&str; 4] = ["user", "llm", "tool", "memory"];

/// Records `chapter_count` chapters of `nodes_per_chapter` nodes each.
///
/// Columns rotate, every third node stacks on its predecessor and every
/// other node relates back to the node logged two steps earlier.
pub fn generate_synthetic_log(
    chapter_count: usize,
    nodes_per_chapter: usize,
) -> anyhow::Result<LogGraph> {
    let mut recorder = LogRecorder::new();
    let mut recent: Vec<NodeId> = Vec::with_capacity(chapter_count * nodes_per_chapter);

    for chapter in 0..chapter_count {
        recorder.new_chapter(format!("Chapter {chapter}"), "default", json!(null))?;
        for step in 0..nodes_per_chapter {
            let index = recent.len();
            let relates_to = (index % 2 == 1 && index >= 2).then(|| recent[index - 2]);
            let entry = LogEntry {
                stack: step % 3 != 0,
                relates_to,
                ..LogEntry::new(
                    COLUMNS[step % COLUMNS.len()],
                    json!({"chapter": chapter, "step": step, "text": "synthetic payload"}),
                )
            };
            recent.push(recorder.log(entry)?);
        }
    }
    Ok(recorder.snapshot())
}
