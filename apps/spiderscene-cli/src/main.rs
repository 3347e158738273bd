use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

use spiderscene_assets::{AssetLoader, LoadEvent, ModelAsset, ModelNode};
use spiderscene_common::Viewport;
use spiderscene_kernel::{Phase, SceneConfig, Stage, Transition};
use spiderscene_render::{DebugTextRenderer, Renderer};

#[derive(Parser)]
#[command(name = "spiderscene-cli", about = "CLI tool for spiderscene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and the default scene settings
    Info,
    /// Print the node tree of a glTF model
    Inspect {
        model: PathBuf,
        /// Print JSON instead of an indented tree
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration
    Config {
        /// YAML or JSON config file; defaults are used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write to this file (format picked by extension) instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Load the scene and run the render loop on a simulated clock
    Simulate {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Simulated seconds after load completion
        #[arg(short, long, default_value = "6")]
        seconds: f64,
        #[arg(long, default_value = "60")]
        fps: u32,
        /// Print a frame every N frames
        #[arg(long, default_value = "30")]
        every: u32,
    },
}

#[derive(Serialize)]
struct NodeSummary {
    name: String,
    vertices: usize,
    triangles: usize,
    children: Vec<NodeSummary>,
}

impl From<&ModelNode> for NodeSummary {
    fn from(node: &ModelNode) -> Self {
        Self {
            name: node.name.clone(),
            vertices: node.mesh.as_ref().map_or(0, |m| m.vertex_count()),
            triangles: node.mesh.as_ref().map_or(0, |m| m.triangle_count()),
            children: node.children.iter().map(NodeSummary::from).collect(),
        }
    }
}

#[derive(Serialize)]
struct ModelSummary {
    id: String,
    source: PathBuf,
    nodes: Vec<NodeSummary>,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SceneConfig> {
    match path {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("reading config {}", path.display())),
        None => Ok(SceneConfig::default()),
    }
}

fn print_tree(nodes: &[NodeSummary], depth: usize) {
    for node in nodes {
        let mesh = if node.vertices > 0 {
            format!(" (vertices={}, triangles={})", node.vertices, node.triangles)
        } else {
            String::new()
        };
        println!("{:indent$}{}{mesh}", "", node.name, indent = depth * 2);
        print_tree(&node.children, depth + 1);
    }
}

fn inspect(model: &Path, json: bool) -> anyhow::Result<()> {
    let config = SceneConfig::default();
    let asset = ModelAsset::open(model, &config.decoder_path)
        .with_context(|| format!("loading {}", model.display()))?;
    let summary = ModelSummary {
        id: asset.id.to_string(),
        source: asset.source.clone(),
        nodes: asset.nodes.iter().map(NodeSummary::from).collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Model {} ({})", summary.source.display(), summary.id);
    print_tree(&summary.nodes, 1);
    for spider in &config.spiders {
        let found = asset.find(&spider.node).is_some();
        println!("{}: {}", spider.node, if found { "found" } else { "MISSING" });
    }
    Ok(())
}

fn simulate(config: SceneConfig, seconds: f64, fps: u32, every: u32) -> anyhow::Result<()> {
    anyhow::ensure!(fps > 0, "fps must be positive");
    let mut stage = Stage::new(config, Viewport::default());
    let mut loader = AssetLoader::new(stage.config().decoder_path.clone());
    stage.start_loading(&mut loader);

    // Fetches run in real time; the simulated clock starts at completion.
    let deadline = Instant::now() + Duration::from_secs(30);
    while stage.phase() == Phase::Loading {
        anyhow::ensure!(Instant::now() < deadline, "assets did not finish loading");
        for event in loader.poll_wait(Duration::from_millis(50)) {
            if let LoadEvent::Progress(p) = &event {
                println!("progress {}/{} {}", p.loaded, p.total, p.url);
            }
            if let Some(Transition::Revealed { at }) = stage.handle(event, 0.0) {
                println!("t={at:.3}: all assets loaded, revealing");
            }
        }
    }
    for texture in stage.textures() {
        println!("texture {} {}x{}", texture.source.display(), texture.width, texture.height);
    }
    for failure in stage.failures() {
        println!("failed: {failure}");
    }

    let renderer = DebugTextRenderer::new();
    let step = 1.0 / fps as f64;
    let frames = (seconds * fps as f64).ceil() as u32;
    for frame in 0..=frames {
        let elapsed = frame as f64 * step;
        if let Some(Transition::Interactive { at }) = stage.tick(elapsed) {
            let folders = stage.panel().map_or(0, |p| p.folders().len());
            println!("t={at:.3}: interactive, panel folders={folders}");
        }
        if every > 0 && frame % every == 0 {
            println!(
                "t={elapsed:.3} phase={:?} indicator={}",
                stage.phase(),
                stage.indicator_visible(elapsed)
            );
            print!("{}", renderer.render(&stage.render_input(), stage.view()));
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Info => {
            let config = SceneConfig::default();
            println!("spiderscene-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("model: {}", config.model_path.display());
            println!(
                "reveal: fade at +{}s for {}s, panel at +{}s",
                config.reveal.fade_delay,
                config.reveal.fade_duration,
                config.reveal.panel_at()
            );
            for spider in &config.spiders {
                println!(
                    "{}: {:?} color={} rate={}",
                    spider.node, spider.material.program, spider.material.color, spider.rotation_rate
                );
            }
        }
        Commands::Inspect { model, json } => inspect(&model, json)?,
        Commands::Config { config, output } => {
            let config = load_config(config.as_deref())?;
            match output {
                Some(path) => {
                    config.save(&path)?;
                    tracing::info!(path = %path.display(), "config written");
                }
                None => print!("{}", config.to_yaml()?),
            }
        }
        Commands::Simulate {
            config,
            seconds,
            fps,
            every,
        } => simulate(load_config(config.as_deref())?, seconds, fps, every)?,
    }

    Ok(())
}
