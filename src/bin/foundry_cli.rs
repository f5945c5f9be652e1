//! Glyph Foundry CLI - Bridge interface for tooling
//!
//! Commands: packs, expand, compile, adjacency, validate, stats, prompt
//! Outputs JSON to stdout, logs to stderr
//! Returns 2 on validation or compilation failure

use base64::Engine;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use glyph_foundry::{
    grammar::standard_grammars,
    packs::check_engine_version,
    EdgeSystem, FoundryConfig, GenerationPrompt, GrammarPackRegistry, PaletteRegistry, TileCompiler,
    TileGrammar, TileSpec, TileValidator,
};

#[derive(Parser)]
#[command(name = "foundry-cli")]
#[command(about = "Glyph Foundry CLI - Tile Grammar Compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to grammar packs directory
    #[arg(short, long, default_value = "packs")]
    packs_dir: PathBuf,

    /// Path to foundry config (JSON)
    #[arg(short, long, default_value = "foundry.json")]
    config: PathBuf,

    /// Extra palettes file (JSON), merged over the built-ins
    #[arg(long)]
    palettes: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available grammar packs
    Packs,

    /// Expand a pack into concrete grammars
    Expand {
        #[arg(long)]
        pack: String,
    },

    /// Compile a pack (or the standard grammars) into a glyph registry
    Compile {
        #[arg(long)]
        pack: Option<String>,

        /// Write the registry JSON here instead of embedding it in the output
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Emit WFC adjacency rules for a compiled pack
    Adjacency {
        #[arg(long)]
        pack: Option<String>,
    },

    /// Validate a rendered tile against its grammar
    Validate {
        /// JSON TileGrammar
        #[arg(short, long)]
        grammar: String,

        /// JSON payload {width, height, rgba_base64}
        #[arg(short, long)]
        payload: String,
    },

    /// Codepoint band usage after compiling every pack
    Stats,

    /// Build the generation prompt for a grammar
    Prompt {
        /// JSON TileGrammar
        #[arg(short, long)]
        grammar: String,
    },
}

#[derive(Deserialize)]
struct RasterPayload {
    width: u32,
    height: u32,
    rgba_base64: String,
}

fn emit(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => println!(r#"{{"success": false, "error": "{}"}}"#, e),
    }
}

fn fail(message: impl std::fmt::Display) -> ExitCode {
    emit(&json!({"success": false, "error": message.to_string()}));
    ExitCode::FAILURE
}

/// Specs for one pack, or every pack, or the standard grammars when no
/// packs are installed.
fn select_specs(registry: &GrammarPackRegistry, pack: Option<&str>) -> Result<Vec<TileSpec>, String> {
    match pack {
        Some(id) => {
            let pack = registry.get(id).ok_or_else(|| format!("Pack not found: {}", id))?;
            check_engine_version(pack).map_err(|e| e.to_string())?;
            Ok(pack.specs.clone())
        }
        None if registry.is_empty() => Ok(standard_grammars()
            .into_iter()
            .map(|(id, grammar)| TileSpec::new(id, grammar))
            .collect()),
        None => {
            let mut specs = vec![];
            for pack in registry.list() {
                check_engine_version(pack).map_err(|e| e.to_string())?;
                specs.extend(pack.specs.iter().cloned());
            }
            Ok(specs)
        }
    }
}

fn load_palettes(path: Option<&PathBuf>) -> glyph_foundry::Result<PaletteRegistry> {
    let mut palettes = PaletteRegistry::with_defaults();
    if let Some(path) = path {
        for palette in PaletteRegistry::load_from_file(path)?.list() {
            palettes.register(palette.clone());
        }
    }
    Ok(palettes)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match FoundryConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => return fail(format!("Failed to load config: {}", e)),
    };

    let packs = match GrammarPackRegistry::load_from_dir(&cli.packs_dir) {
        Ok(r) => r,
        Err(e) => return fail(format!("Failed to load packs: {}", e)),
    };

    match cli.command {
        Commands::Packs => {
            let listing: Vec<_> = packs
                .list()
                .iter()
                .map(|p| json!({
                    "id": p.id,
                    "name": p.name,
                    "version": p.pack_version,
                    "engine_min_version": p.engine_min_version,
                    "deprecated": p.deprecated,
                    "specs": p.specs.len(),
                    "tiles": p.tile_count(),
                }))
                .collect();
            emit(&json!(listing));
            ExitCode::SUCCESS
        }

        Commands::Expand { pack } => {
            let specs = match select_specs(&packs, Some(pack.as_str())) {
                Ok(s) => s,
                Err(e) => return fail(e),
            };
            let mut grammars = vec![];
            for spec in &specs {
                if let Err(e) = spec.validate() {
                    return fail(e);
                }
                grammars.extend(spec.expand());
            }
            emit(&json!({"success": true, "count": grammars.len(), "grammars": grammars}));
            ExitCode::SUCCESS
        }

        Commands::Compile { pack, out } => {
            let specs = match select_specs(&packs, pack.as_deref()) {
                Ok(s) => s,
                Err(e) => return fail(e),
            };

            let mut compiler = TileCompiler::new(config.compiler);
            let batch = match compiler.compile_batch(&specs) {
                Ok(b) => b,
                Err(e) => return fail(e),
            };

            let mut output = json!({
                "success": batch.errors.is_empty(),
                "batch_id": batch.batch_id,
                "created_at": batch.created_at,
                "engine_version": batch.engine_version,
                "compiled": batch.success_count(),
                "errors": batch.errors,
                "registry_hash": batch.registry_hash,
            });
            match &out {
                Some(path) => {
                    if let Err(e) = fs::write(path, &batch.registry_json) {
                        return fail(format!("Failed to write {}: {}", path.display(), e));
                    }
                    output["registry_path"] = json!(path.display().to_string());
                }
                None => {
                    let registry: Value = serde_json::from_str(&batch.registry_json).unwrap_or(Value::Null);
                    output["registry"] = registry;
                }
            }
            emit(&output);

            if batch.errors.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }

        Commands::Adjacency { pack } => {
            let specs = match select_specs(&packs, pack.as_deref()) {
                Ok(s) => s,
                Err(e) => return fail(e),
            };

            let mut compiler = TileCompiler::new(config.compiler);
            if let Err(e) = compiler.compile_batch(&specs) {
                return fail(e);
            }
            let mut edges = EdgeSystem::new();
            compiler.register_edges(&mut edges);

            emit(&json!(edges.generate_adjacency_rules()));
            ExitCode::SUCCESS
        }

        Commands::Validate { grammar, payload } => {
            let grammar: TileGrammar = match serde_json::from_str(&grammar) {
                Ok(g) => g,
                Err(e) => return fail(format!("Invalid grammar: {}", e)),
            };
            let payload: RasterPayload = match serde_json::from_str(&payload) {
                Ok(p) => p,
                Err(e) => return fail(format!("Invalid payload: {}", e)),
            };
            let bytes = match base64::engine::general_purpose::STANDARD.decode(&payload.rgba_base64) {
                Ok(b) => b,
                Err(e) => return fail(format!("Invalid rgba_base64: {}", e)),
            };
            let palettes = match load_palettes(cli.palettes.as_ref()) {
                Ok(p) => p,
                Err(e) => return fail(format!("Failed to load palettes: {}", e)),
            };

            let validator = TileValidator::from_config(&config.validator);
            let result = validator.validate_rgba_with(
                payload.width,
                payload.height,
                &bytes,
                &grammar,
                &palettes,
            );
            emit(&json!(result));

            if result.passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }

        Commands::Stats => {
            let specs = match select_specs(&packs, None) {
                Ok(s) => s,
                Err(e) => return fail(e),
            };

            let mut compiler = TileCompiler::new(config.compiler);
            let batch = match compiler.compile_batch(&specs) {
                Ok(b) => b,
                Err(e) => return fail(e),
            };
            emit(&json!({
                "compiled": compiler.compiled_count(),
                "errors": batch.error_count(),
                "bands": compiler.allocation_stats(),
            }));
            ExitCode::SUCCESS
        }

        Commands::Prompt { grammar } => {
            let grammar: TileGrammar = match serde_json::from_str(&grammar) {
                Ok(g) => g,
                Err(e) => return fail(format!("Invalid grammar: {}", e)),
            };
            let palettes = match load_palettes(cli.palettes.as_ref()) {
                Ok(p) => p,
                Err(e) => return fail(format!("Failed to load palettes: {}", e)),
            };
            emit(&json!(GenerationPrompt::for_grammar(&grammar, &palettes)));
            ExitCode::SUCCESS
        }
    }
}
