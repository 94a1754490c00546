use anyhow::Result;

use crate::convert::ConvertedFeature;

pub mod osm_xml;

pub use self::osm_xml::OsmXmlSink;

/// Counts of primitives written by a sink.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SinkStats {
    pub nodes: u64,
    pub ways: u64,
    pub relations: u64,
}

/// Receives converted primitives, assigns identities and serializes them.
pub trait PrimitiveSink {
    /// Write the accepted primitives of one feature, in `emitted` order.
    fn add_feature(&mut self, feature: &ConvertedFeature) -> Result<()>;
    fn finish(&mut self) -> Result<()>;
    fn stats(&self) -> SinkStats;
}
