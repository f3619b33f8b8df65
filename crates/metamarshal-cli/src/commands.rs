use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use colored::Colorize;
use metamarshal::{Document, GeneratorConfig, Reference, Symbol};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cli::*;

/// On-disk configuration, e.g. `[generator]\ndepth_limit = 64`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub generator: GeneratorConfig,
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref(), cli.depth_limit)?;
    match cli.command {
        Command::Inspect(args) => cmd_inspect(args, &cli.format),
        Command::Verify(args) => cmd_verify(args, &config, &cli.format),
        Command::Hex(args) => cmd_hex(args, &cli.format),
    }
}

/// Merge the config file (if any) with the command-line depth limit,
/// which wins when both are present.
pub fn load_config(path: Option<&Path>, depth_limit: Option<i64>) -> anyhow::Result<GeneratorConfig> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            let file: FileConfig = toml::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?;
            file.generator
        }
        None => GeneratorConfig::default(),
    };
    if let Some(limit) = depth_limit {
        config = GeneratorConfig::from_signed_limit(limit);
    }
    debug!(depth_limit = ?config.depth_limit, "generator config");
    Ok(config)
}

// ---------------------------------------------------------------------------
// inspect
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct Summary {
    pub path: PathBuf,
    pub version: String,
    pub bytes: usize,
    pub nodes: usize,
    pub symbols: usize,
    pub root: String,
    pub warnings: Vec<String>,
}

impl Summary {
    pub fn new(path: &Path, bytes: usize, doc: &Document) -> Self {
        Self {
            path: path.to_path_buf(),
            version: doc.version.to_string(),
            bytes,
            nodes: doc.graph.len(),
            symbols: distinct_symbols(doc),
            root: doc.display().to_string(),
            warnings: doc.warnings.iter().map(ToString::to_string).collect(),
        }
    }
}

fn distinct_symbols(doc: &Document) -> usize {
    let mut seen: HashSet<&Symbol> = doc.root.as_symbol().into_iter().collect();
    for id in doc.graph.ids() {
        let Ok(node) = doc.graph.get(id) else {
            continue;
        };
        if let Reference::Object(data) = node {
            seen.extend(&data.class_name);
            seen.extend(data.ivars.iter().map(|(name, _)| name));
        }
        seen.extend(node.children().into_iter().filter_map(|v| v.as_symbol()));
    }
    seen.len()
}

fn read_document(path: &Path) -> anyhow::Result<(Vec<u8>, Document)> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let doc = metamarshal::parse(&bytes).with_context(|| format!("parsing {}", path.display()))?;
    Ok((bytes, doc))
}

fn cmd_inspect(args: InspectArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let (bytes, doc) = read_document(&args.file)?;
    let summary = Summary::new(&args.file, bytes.len(), &doc);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => {
            println!("{} {}", "File:".bold(), summary.path.display());
            println!("  Version: {}", summary.version.cyan());
            println!("  Size: {} bytes", summary.bytes);
            println!("  Nodes: {}", summary.nodes);
            println!("  Symbols: {}", summary.symbols);
            for warning in &summary.warnings {
                println!("  {} {}", "warning:".yellow().bold(), warning);
            }
            println!("{}", summary.root);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// verify
// ---------------------------------------------------------------------------

/// Re-generate `bytes` and require an exact match plus an isomorphic
/// re-parse. Returns the number of bytes checked.
pub fn verify_bytes(bytes: &[u8], config: &GeneratorConfig) -> anyhow::Result<usize> {
    let doc = metamarshal::parse(bytes)?;
    let regenerated = doc.generate_with(config)?;

    if regenerated != bytes {
        let offset = bytes
            .iter()
            .zip(&regenerated)
            .position(|(a, b)| a != b)
            .unwrap_or_else(|| bytes.len().min(regenerated.len()));
        bail!(
            "re-generated stream differs at offset {offset} ({} bytes in, {} bytes out)",
            bytes.len(),
            regenerated.len()
        );
    }

    let reparsed = metamarshal::parse(&regenerated)?;
    if !doc.is_isomorphic(&reparsed) {
        bail!("re-parsed graph is not isomorphic to the original");
    }
    Ok(bytes.len())
}

#[derive(Debug, Serialize)]
struct VerifyReport {
    path: PathBuf,
    ok: bool,
    bytes: Option<usize>,
    error: Option<String>,
}

fn cmd_verify(args: VerifyArgs, config: &GeneratorConfig, format: &OutputFormat) -> anyhow::Result<()> {
    if args.files.is_empty() {
        bail!("no files given");
    }

    let mut reports = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let result = fs::read(path)
            .with_context(|| format!("reading {}", path.display()))
            .and_then(|bytes| verify_bytes(&bytes, config));
        reports.push(match result {
            Ok(n) => VerifyReport { path: path.clone(), ok: true, bytes: Some(n), error: None },
            Err(e) => VerifyReport { path: path.clone(), ok: false, bytes: None, error: Some(format!("{e:#}")) },
        });
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        OutputFormat::Text => {
            for report in &reports {
                match (&report.bytes, &report.error) {
                    (Some(n), _) => println!("{} {} ({} bytes)", "✓".green().bold(), report.path.display(), n),
                    (_, Some(e)) => println!("{} {}: {}", "✗".red().bold(), report.path.display(), e),
                    _ => {}
                }
            }
        }
    }

    let failed = reports.iter().filter(|r| !r.ok).count();
    if failed > 0 {
        bail!("{failed} of {} files failed verification", reports.len());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// hex
// ---------------------------------------------------------------------------

pub fn hex_lines(bytes: &[u8], width: usize) -> Vec<String> {
    bytes
        .chunks(width.max(1))
        .enumerate()
        .map(|(i, chunk)| format!("{:08x}  {}", i * width.max(1), hex::encode(chunk)))
        .collect()
}

fn cmd_hex(args: HexArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let bytes = fs::read(&args.file).with_context(|| format!("reading {}", args.file.display()))?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "hex": hex::encode(&bytes) })),
        OutputFormat::Text => {
            for line in hex_lines(&bytes, args.width) {
                println!("{line}");
            }
        }
    }
    Ok(())
}
