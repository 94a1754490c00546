use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

use crate::config::ConversionSettings;
use crate::convert::Converter;
use crate::expr::InclusionPredicate;
use crate::reproject::Reprojector;
use crate::rules::{RuleClass, RuleSet, RuleTable};
use crate::sinks::{OsmXmlSink, PrimitiveSink};
use crate::source::{FeatureIter, GeoJsonSource, GeoJsonlSource, SourceError};
use crate::utils::ProgressCounter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input GeoJSON or GeoJSONL file (`-` for stdin)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Rule table: one `class,sourceKey,sourceValue,targetKey,targetValue` per line
    #[arg(short, long)]
    pub rules: PathBuf,

    /// Output OSM XML file (`-` for stdout)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Input format (auto-detected from the input extension if omitted)
    #[arg(long, value_enum)]
    pub format: Option<InputFormat>,

    /// Settings file (YAML); flags given here take precedence
    #[arg(short, long)]
    pub settings: Option<PathBuf>,

    /// Only write primitives carrying at least one tag (`--only-tagged=false`
    /// turns off a setting from the settings file)
    #[arg(short = 't', long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub only_tagged: Option<bool>,

    /// CEL expression over `kind` and `tags` selecting primitives to write
    #[arg(long)]
    pub include: Option<String>,

    /// CRS of the input coordinates, e.g. EPSG:3857
    #[arg(long)]
    pub source_crs: Option<String>,

    /// CRS written to the output (default: EPSG:4326)
    #[arg(long)]
    pub target_crs: Option<String>,

    /// Copy every attribute as a tag in addition to rule-derived tags
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub all_attributes: Option<bool>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum InputFormat {
    #[value(name = "geojson", alias = "json")]
    GeoJson,
    #[value(name = "geojsonl", aliases = ["jsonl", "ndjson"])]
    GeoJsonl,
}

/// Counters for one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub read: u64,
    pub converted: u64,
    pub ignored: u64,
}

pub fn detect_format(cli: &Cli) -> Result<InputFormat> {
    cli.format
        .or_else(|| {
            let ext = cli.input.extension()?.to_str()?;
            match ext.to_lowercase().as_str() {
                "geojson" | "json" => Some(InputFormat::GeoJson),
                "geojsonl" | "jsonl" | "ndjson" => Some(InputFormat::GeoJsonl),
                _ => None,
            }
        })
        .context("CLI: Could not detect input format from extension; use --format")
}

/// Settings file first, then command-line overrides.
pub fn resolve_settings(cli: &Cli) -> Result<ConversionSettings> {
    let mut settings = ConversionSettings::load(cli.settings.as_deref())
        .with_context(|| format!("CLI: Failed to load settings from {:?}", cli.settings))?;

    if let Some(only_tagged) = cli.only_tagged {
        settings.only_tagged = only_tagged;
    }
    if let Some(all_attributes) = cli.all_attributes {
        settings.all_attributes = all_attributes;
    }
    if let Some(include) = &cli.include {
        settings.include = Some(include.clone());
    }
    if let Some(crs) = &cli.source_crs {
        settings.source_crs = Some(crs.clone());
    }
    if let Some(crs) = &cli.target_crs {
        settings.target_crs = crs.clone();
    }

    Ok(settings)
}

/// Load the rule table, report skipped lines, and attach the inclusion
/// predicate.
pub fn build_rule_set(path: &Path, include: Option<&str>) -> Result<RuleSet> {
    let table = RuleTable::load(path)?;
    for diagnostic in &table.diagnostics {
        tracing::warn!("Rules: {}", diagnostic);
    }
    for class in [RuleClass::Point, RuleClass::Line, RuleClass::Outer, RuleClass::Inner] {
        for rule in table.rules.rules(class) {
            tracing::debug!("Adding rule {}", rule);
        }
    }
    tracing::info!(
        "Rules: {} loaded, {} skipped",
        table.rules.len(),
        table.diagnostics.len()
    );
    if table.rules.is_empty() {
        tracing::warn!("Rules: {:?} contains no usable rules", path);
    }

    let predicate = include
        .map(InclusionPredicate::compile)
        .transpose()
        .context("CLI: Invalid inclusion expression")?;
    if let Some(predicate) = &predicate {
        tracing::info!("Inclusion expression: {}", predicate.source());
    }

    Ok(table.rules.with_include(predicate))
}

pub fn open_source(input: &Path, format: InputFormat, reprojector: Reprojector) -> Result<FeatureIter> {
    let source: FeatureIter = match format {
        InputFormat::GeoJson => Box::new(
            GeoJsonSource::open(input, reprojector)
                .with_context(|| format!("Source: Failed to open {:?}", input))?,
        ),
        InputFormat::GeoJsonl => Box::new(
            GeoJsonlSource::open(input, reprojector)
                .with_context(|| format!("Source: Failed to open {:?}", input))?,
        ),
    };
    tracing::info!("Source: {:?} -> {:?}", format, input);
    Ok(source)
}

pub fn init_sink(output: &Path, generator: &str) -> Result<Box<dyn PrimitiveSink>> {
    if output == Path::new("-") {
        tracing::info!("Sink: osm -> stdout");
        return Ok(Box::new(OsmXmlSink::stdout(generator)?));
    }
    tracing::info!("Sink: osm -> {:?}", output);
    let sink = OsmXmlSink::new(output, generator)
        .with_context(|| format!("Sink: Failed to create {:?}", output))?;
    Ok(Box::new(sink))
}

/// Convert every feature and hand it to the sink.
///
/// Features are written as soon as they are converted. The first source,
/// geometry or sink error stops the run; what was written before stays.
pub fn process_features<I>(
    converter: &Converter,
    features: I,
    sink: &mut dyn PrimitiveSink,
    verbose: bool,
) -> Result<RunStats>
where
    I: IntoIterator<Item = Result<crate::source::Feature, SourceError>>,
{
    let mut stats = RunStats::default();
    let mut progress = ProgressCounter::new("Converting features", 1_000, verbose);

    for (index, item) in features.into_iter().enumerate() {
        let number = index + 1;
        let feature = item.with_context(|| format!("Source: Failed to read feature {}", number))?;
        stats.read += 1;

        let converted = converter.convert(&feature).with_context(|| {
            format!(
                "Convert: Feature {} ({}) has invalid geometry",
                number,
                feature.geometry.label()
            )
        })?;

        match converted {
            Some(converted) => {
                sink.add_feature(&converted)
                    .with_context(|| format!("Sink: Failed writing feature {}", number))?;
                stats.converted += 1;
            }
            None => stats.ignored += 1,
        }
        progress.inc();
    }

    progress.finish();
    Ok(stats)
}
