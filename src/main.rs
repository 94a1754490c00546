mod app;
mod config;
mod convert;
mod expr;
mod geometry;
mod primitive;
mod reproject;
mod rules;
mod sinks;
mod source;
mod tagging;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;

use app::{Cli, build_rule_set, detect_format, init_sink, open_source, process_features, resolve_settings};
use convert::Converter;
use reproject::Reprojector;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = resolve_settings(&cli)?;
    let format = detect_format(&cli)?;
    let rules = build_rule_set(&cli.rules, settings.include.as_deref())?;

    let reprojector = Reprojector::new(settings.source_crs.as_deref(), &settings.target_crs)
        .context("CLI: Failed to set up reprojection")?;
    if let Some(source_crs) = &settings.source_crs
        && !reprojector.is_identity()
    {
        tracing::info!("Converting from {} to {}", source_crs, settings.target_crs);
    }

    let features = open_source(&cli.input, format, reprojector)?;
    let mut sink = init_sink(&cli.output, &settings.generator)?;
    let converter = Converter::new(&rules, settings.only_tagged, settings.all_attributes);

    let start = std::time::Instant::now();
    let result = process_features(&converter, features, sink.as_mut(), cli.verbose);

    // Close the document even when the run aborts, so partial output stays well-formed.
    let finished = sink.finish().context("Sink: Failed to finalize output");
    let stats = result?;
    finished?;

    let written = sink.stats();
    let elapsed = start.elapsed();
    tracing::info!(
        "Done! Read {} features ({} converted, {} ignored); wrote {} nodes, {} ways, {} relations in {:.2}s",
        stats.read,
        stats.converted,
        stats.ignored,
        written.nodes,
        written.ways,
        written.relations,
        elapsed.as_secs_f64()
    );

    Ok(())
}
