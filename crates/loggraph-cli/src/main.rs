use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use loggraph_core::{LogEntry, LogGraph, LogRecorder};
use loggraph_layout::{LayoutConfig, LayoutEngine, OutlineBackend, StyleSheet};
use loggraph_storage::{
    Destringizer, JsonStringizer, PlainTextStringizer, Stringizer, load_from_path, save_to_path,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Lay out and partition chaptered log graphs", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a small sample log and optionally save it
    Demo {
        /// Where to save the sample graph (format from the extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Lay out a saved graph and print the result
    Layout {
        /// Saved graph (.json or .gml)
        #[arg(short, long)]
        input: PathBuf,

        /// JSON file with layout settings; missing keys keep their defaults
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Column order, comma separated
        #[arg(long, value_delimiter = ',')]
        columns: Option<Vec<String>>,

        /// Fail on requested columns the graph does not have
        #[arg(long)]
        strict: bool,

        #[arg(long, value_enum, default_value_t = Output::Report)]
        output: Output,

        /// Also build outlines for every trace
        #[arg(long)]
        render: bool,

        #[arg(long, value_enum, default_value_t = Payloads::Json)]
        payloads: Payloads,
    },
    /// Re-save a graph in another format
    Convert {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, value_enum, default_value_t = Payloads::Json)]
        payloads: Payloads,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Output {
    Report,
    Json,
}

/// How content payloads are turned into GML strings.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Payloads {
    Json,
    Plain,
}

impl Payloads {
    fn stringizer(self) -> &'static dyn Stringizer {
        match self {
            Payloads::Json => &JsonStringizer,
            Payloads::Plain => &PlainTextStringizer,
        }
    }

    fn destringizer(self) -> &'static dyn Destringizer {
        match self {
            Payloads::Json => &JsonStringizer,
            Payloads::Plain => &PlainTextStringizer,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    match args.command {
        Command::Demo { output } => run_demo(output.as_deref()),
        Command::Layout {
            input,
            config,
            columns,
            strict,
            output,
            render,
            payloads,
        } => {
            let graph = load_graph(&input, payloads)?;
            let config = load_config(config.as_deref())?;
            run_layout(graph, config, columns, strict, output, render)
        }
        Command::Convert {
            input,
            output,
            payloads,
        } => {
            let graph = load_graph(&input, payloads)?;
            let saved = save_to_path(&graph, &output, payloads.stringizer())
                .with_context(|| format!("Failed to write {}", output.display()))?;
            if let Some(fallback) = saved.fallback {
                eprintln!("warning: {fallback}");
            }
            println!("Wrote {} as {}", output.display(), saved.format);
            Ok(())
        }
    }
}

fn load_graph(path: &Path, payloads: Payloads) -> Result<LogGraph> {
    let loaded = load_from_path(path, payloads.destringizer())
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if let Some(fallback) = loaded.fallback {
        eprintln!("warning: {fallback}");
    }
    Ok(loaded.value)
}

fn load_config(path: Option<&Path>) -> Result<LayoutConfig> {
    let Some(path) = path else {
        return Ok(LayoutConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: LayoutConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    Ok(config)
}

fn run_layout(
    graph: LogGraph,
    config: LayoutConfig,
    columns: Option<Vec<String>>,
    strict: bool,
    output: Output,
    render: bool,
) -> Result<()> {
    let mut engine = LayoutEngine::new(graph, config)?;
    if let Some(order) = columns {
        if strict {
            engine.update_column_order_strict(&order)?;
        } else {
            engine.update_column_order(&order)?;
        }
    }

    match output {
        Output::Report => {
            print!("{}", engine.report());
            for chapter in engine.chapters()? {
                println!(
                    "chapter {} {:?} at {:.3} ({:.1}%)",
                    chapter.id,
                    chapter.title,
                    chapter.scroll_absolute,
                    chapter.scroll_relative * 100.0
                );
            }
        }
        Output::Json => {
            println!("{}", serde_json::to_string_pretty(&engine.export()?)?);
        }
    }

    if render {
        let scene = engine.render(&mut OutlineBackend, &StyleSheet::default(), true)?;
        tracing::info!("Rendered {} outlines", scene.visuals().len());
    }
    Ok(())
}

/// A short session: two chapters, a stacked exchange and a tool call.
fn demo_graph() -> Result<LogGraph> {
    let mut recorder = LogRecorder::new();
    recorder.new_chapter("A", "default", json!(null))?;
    recorder.log(LogEntry {
        stack: true,
        ..LogEntry::new("other", "This is content.")
    })?;
    let prompt = recorder.log(LogEntry {
        stack: true,
        ..LogEntry::new("other", "This is content.")
    })?;
    recorder.log(LogEntry {
        stack: true,
        relates_to: Some(prompt),
        ..LogEntry::new("other", "This is content.")
    })?;

    recorder.new_chapter("B", "default", json!(null))?;
    let call = recorder.log(LogEntry::new("tool", json!({"name": "search", "query": "rust"})))?;
    recorder.log(LogEntry {
        relates_to: Some(call),
        relation_content: json!("result"),
        ..LogEntry::new("other", "Found 3 results.")
    })?;
    print!("{}", recorder.report());
    Ok(recorder.snapshot())
}

fn run_demo(output: Option<&Path>) -> Result<()> {
    let graph = demo_graph()?;
    if let Some(path) = output {
        let saved = save_to_path(&graph, path, &JsonStringizer)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if let Some(fallback) = saved.fallback {
            eprintln!("warning: {fallback}");
        }
        println!("Saved demo graph to {}", path.display());
    }
    let engine = LayoutEngine::new(graph, LayoutConfig::default())?;
    print!("{}", engine.report());
    Ok(())
}
