//! Quay - tooling for Caddy-style site configuration files
//!
//! This is the main entry point for the Quay CLI.

use anyhow::{bail, Context};
use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand};
use quay_config::{is_container, parse, serialize, to_container, validate, ParseError};
use quay_core::{ConfigStore, FileStore};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "quay",
    version,
    about = "Validate, format, and inspect Quayfile site configurations"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Structurally validate a Quayfile
    Validate { file: PathBuf },

    /// Reformat a Quayfile, preserving unedited directive lines
    Fmt {
        file: PathBuf,

        /// Write the result back to the file instead of printing it
        #[arg(long)]
        write: bool,
    },

    /// Show the site blocks and container services of a Quayfile
    Inspect {
        file: PathBuf,

        /// Emit the parsed document as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Validate { file } => cmd_validate(&file),
        Command::Fmt { file, write } => cmd_fmt(&file, write),
        Command::Inspect { file, json } => cmd_inspect(&file, json),
    }
}

fn cmd_validate(file: &Path) -> anyhow::Result<()> {
    let (name, raw) = read(file)?;

    let report = validate(&raw);
    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }
    if !report.valid {
        for error in &report.errors {
            eprintln!("error: {error}");
        }
        bail!("{name} failed structural validation");
    }

    match parse(&raw) {
        Ok(doc) => {
            println!("{name}: ok ({} site block(s))", doc.site_blocks.len());
            Ok(())
        }
        Err(err) => {
            render_parse_error(&name, &raw, &err);
            bail!("{name} failed to parse");
        }
    }
}

fn cmd_fmt(file: &Path, write: bool) -> anyhow::Result<()> {
    let (name, raw) = read(file)?;

    let doc = match parse(&raw) {
        Ok(doc) => doc,
        Err(err) => {
            render_parse_error(&name, &raw, &err);
            bail!("{name} failed to parse");
        }
    };

    let formatted = serialize(&doc);
    if write {
        FileStore::new(file)
            .store(&formatted)
            .with_context(|| format!("writing {name}"))?;
        tracing::info!("rewrote {name}");
    } else {
        print!("{formatted}");
    }
    Ok(())
}

fn cmd_inspect(file: &Path, json: bool) -> anyhow::Result<()> {
    let (name, raw) = read(file)?;

    let doc = match parse(&raw) {
        Ok(doc) => doc,
        Err(err) => {
            render_parse_error(&name, &raw, &err);
            bail!("{name} failed to parse");
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    if !doc.global_options.is_empty() {
        println!("global options: {} directive(s)", doc.global_options.len());
    }

    for block in &doc.site_blocks {
        let tag = block
            .tag
            .as_deref()
            .map(|t| format!(" [{t}]"))
            .unwrap_or_default();
        println!("{}{tag}", block.addresses.join(", "));

        if is_container(block) {
            let Some(decomposed) = to_container(block) else {
                continue;
            };
            for finding in &decomposed.findings {
                eprintln!("  warning: {finding}");
            }
            println!(
                "  container: {} shared directive(s), {} service(s)",
                decomposed.container.shared_config.len(),
                decomposed.container.services.len()
            );
            for service in &decomposed.container.services {
                let tag = service
                    .tag
                    .as_deref()
                    .map(|t| format!(" [{t}]"))
                    .unwrap_or_default();
                println!("    @{} -> {}{tag}", service.matcher_name, service.hostname);
            }
        } else {
            println!("  {} directive(s)", block.directives.len());
        }
    }

    Ok(())
}

fn read(file: &Path) -> anyhow::Result<(String, String)> {
    let raw = FileStore::new(file)
        .load()
        .with_context(|| format!("reading {}", file.display()))?;
    Ok((file.display().to_string(), raw))
}

/// Render a parse error as a span-labelled report on stderr.
fn render_parse_error(name: &str, source: &str, err: &ParseError) {
    let span = err.span();
    let range = span.start..span.end.max(span.start + 1).min(source.len().max(1));

    Report::build(ReportKind::Error, (name, range.clone()))
        .with_message(err.to_string())
        .with_label(
            Label::new((name, range))
                .with_message("the structure breaks here")
                .with_color(Color::Red),
        )
        .finish()
        .eprint((name, Source::from(source)))
        .ok();
}
