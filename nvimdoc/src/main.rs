//! nvimdoc: regenerate README and vimdoc API docs for a Neovim Lua plugin.
//!
//! Run from (or point at) the plugin root:
//!
//! - `nvimdoc` updates the README `Setup`/`API`/`TOC` sections and writes `doc/<module>.txt`
//! - `nvimdoc --check` fails if any of those would change
//! - `nvimdoc --print vimdoc` renders the API section to stdout

use anyhow::{bail, Context, Result};
use clap::Parser;
use nvimdoc::config::{Project, ProjectConfig};
use nvimdoc::generate::Generator;
use nvimdoc::render::create_renderer;
use nvimdoc::section::{DryRunReplacer, FsSectionReplacer};
use nvimdoc::{Registry, RegistryBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "nvimdoc",
    about = "Generate README and vimdoc API documentation from Lua doc comments"
)]
struct Cli {
    /// Plugin root directory
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Project file (default: <root>/nvimdoc.toml when present)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Lua module name (default: the only directory under lua/)
    #[arg(short = 'm', long)]
    module: Option<String>,

    /// Fail without writing anything if any diagnostic was reported
    #[arg(long)]
    deny_warnings: bool,

    /// Print the rendered API section instead of writing files: markdown or vimdoc
    #[arg(short = 'p', long, value_name = "FORMAT")]
    print: Option<String>,

    /// Write nothing; exit with an error if any generated file is out of date
    #[arg(long, conflicts_with = "print")]
    check: bool,

    /// Log every scanned file
    #[arg(short = 'v', long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short = 'q', long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let config = match cli.config {
        Some(ref path) => ProjectConfig::load(path)?,
        None => ProjectConfig::discover(&cli.root)?,
    };
    let project = Project::resolve(&cli.root, config, cli.module.clone())?;
    debug!("module {} in {}", project.module, project.lua_dir.display());

    let registry = build(&project)?;
    for diagnostic in &registry.diagnostics {
        warn!("{}", diagnostic);
    }
    if (cli.deny_warnings || project.deny_warnings) && !registry.diagnostics.is_empty() {
        bail!(
            "{} warning(s) reported and warnings are denied",
            registry.diagnostics.len()
        );
    }
    if registry.file(&project.api_file).is_none() {
        bail!(
            "API file not found: {}",
            project.lua_dir.join(&project.api_file).display()
        );
    }

    if let Some(ref format) = cli.print {
        let renderer = create_renderer(format, &project.module, project.render)?;
        let functions = registry.public_functions(&project.api_file);
        debug!(
            "rendering {} functions as {}",
            functions.len(),
            renderer.format_name()
        );
        for line in renderer.render(&functions, &registry) {
            println!("{}", line);
        }
        return Ok(());
    }

    let generator = Generator::new(&project, &registry);
    let options = generator
        .option_lines()
        .context("failed to read default options")?;
    let vimdoc = join_lines(&generator.vimdoc(options.as_deref()));

    if cli.check {
        return check(&project, &generator, &vimdoc);
    }

    generator
        .update_readme(&mut FsSectionReplacer)
        .with_context(|| format!("failed to update {}", project.readme.display()))?;
    write_if_changed(&project.vimdoc, &vimdoc)?;
    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn build(project: &Project) -> Result<Registry> {
    let mut builder = RegistryBuilder::new(&project.lua_dir);
    for pattern in &project.exclude {
        builder = builder.exclude(pattern)?;
    }
    let registry = builder
        .build()
        .with_context(|| format!("failed to scan {}", project.lua_dir.display()))?;
    info!(
        "scanned {} files, {} diagnostics",
        registry.files.len(),
        registry.diagnostics.len()
    );
    Ok(registry)
}

/// `--check`: render everything in memory and compare with disk.
fn check(project: &Project, generator: &Generator, vimdoc: &str) -> Result<()> {
    let mut replacer = DryRunReplacer::default();
    generator
        .update_readme(&mut replacer)
        .with_context(|| format!("failed to render {}", project.readme.display()))?;

    let mut stale: Vec<PathBuf> = replacer.stale().into_iter().map(Path::to_path_buf).collect();
    if fs::read_to_string(&project.vimdoc).ok().as_deref() != Some(vimdoc) {
        stale.push(project.vimdoc.clone());
    }

    if stale.is_empty() {
        info!("documentation is up to date");
        return Ok(());
    }
    for path in &stale {
        warn!("out of date: {}", path.display());
    }
    bail!("{} file(s) out of date; run nvimdoc to regenerate", stale.len())
}

fn write_if_changed(path: &Path, content: &str) -> Result<()> {
    if fs::read_to_string(path).ok().as_deref() == Some(content) {
        debug!("{} unchanged", path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    info!("wrote {}", path.display());
    Ok(())
}

fn join_lines(lines: &[String]) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joined_output_ends_with_newline() {
        assert_eq!(join_lines(&["a".to_string(), "b".to_string()]), "a\nb\n");
    }

    #[test]
    fn cli_flags_parse() {
        let cli = Cli::try_parse_from(["nvimdoc", "plugin", "--check", "-m", "demo", "-v"]).unwrap();
        assert_eq!(cli.root, PathBuf::from("plugin"));
        assert!(cli.check);
        assert_eq!(cli.module.as_deref(), Some("demo"));
        assert!(Cli::try_parse_from(["nvimdoc", "-v", "-q"]).is_err());
        assert!(Cli::try_parse_from(["nvimdoc", "--check", "--print", "md"]).is_err());
    }
}
