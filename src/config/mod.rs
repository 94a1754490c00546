use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_TARGET_CRS: &str = "EPSG:4326";

/// Conversion settings.
///
/// Loaded from an optional YAML file; command-line flags are layered on top
/// by the caller.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ConversionSettings {
    /// Strict inclusion: drop primitives without tags.
    pub only_tagged: bool,
    /// CEL inclusion expression over `kind` and `tags`.
    pub include: Option<String>,
    pub source_crs: Option<String>,
    pub target_crs: String,
    /// Copy every attribute as a tag in addition to rule tags.
    pub all_attributes: bool,
    pub generator: String,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            only_tagged: false,
            include: None,
            source_crs: None,
            target_crs: DEFAULT_TARGET_CRS.to_string(),
            all_attributes: false,
            generator: concat!("geo2osm ", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ConversionSettings {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
