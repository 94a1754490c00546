use super::{PrimitiveSink, SinkStats};
use anyhow::Result;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::convert::ConvertedFeature;
use crate::primitive::{Graph, NodeId, PrimitiveId, RelationId, Tags, WayId};
use crate::utils::escape_xml;

/// Writes OSM XML 0.6.
///
/// Primitives get negative placeholder IDs counting down from -1. Nodes are
/// identified by arena handle, so a node shared by several ways is written
/// once. Anything a way or relation references is written before it.
pub struct OsmXmlSink {
    writer: BufWriter<Box<dyn Write + Send>>,
    next_id: i64,
    stats: SinkStats,
}

/// IDs handed out while writing one feature.
#[derive(Default)]
struct WrittenIds {
    nodes: HashMap<NodeId, i64>,
    ways: HashMap<WayId, i64>,
    relations: HashMap<RelationId, i64>,
}

impl OsmXmlSink {
    pub fn new<P: AsRef<Path>>(path: P, generator: &str) -> Result<Self> {
        let file = File::create(path)?;
        Self::from_writer(Box::new(file), generator)
    }

    pub fn stdout(generator: &str) -> Result<Self> {
        Self::from_writer(Box::new(std::io::stdout()), generator)
    }

    pub fn from_writer(writer: Box<dyn Write + Send>, generator: &str) -> Result<Self> {
        let mut writer = BufWriter::new(writer);

        writeln!(writer, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
        writeln!(
            writer,
            "<osm version=\"0.6\" upload=\"false\" generator=\"{}\">",
            escape_xml(generator)
        )?;

        Ok(Self {
            writer,
            next_id: -1,
            stats: SinkStats::default(),
        })
    }

    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id -= 1;
        id
    }

    fn write_tags(&mut self, tags: &Tags) -> Result<()> {
        // Keys and values arrive already escaped.
        for (k, v) in tags.iter() {
            writeln!(self.writer, "    <tag k=\"{}\" v=\"{}\"/>", k, v)?;
        }
        Ok(())
    }

    fn write_node(&mut self, graph: &Graph, id: NodeId, ids: &mut WrittenIds) -> Result<i64> {
        if let Some(osm_id) = ids.nodes.get(&id) {
            return Ok(*osm_id);
        }
        let osm_id = self.allocate_id();
        ids.nodes.insert(id, osm_id);

        let node = graph.node(id);
        let open = format!(
            "  <node id=\"{}\" visible=\"true\" lat=\"{}\" lon=\"{}\"",
            osm_id, node.lat, node.lon
        );
        if node.tags.is_empty() {
            writeln!(self.writer, "{}/>", open)?;
        } else {
            writeln!(self.writer, "{}>", open)?;
            self.write_tags(&node.tags)?;
            writeln!(self.writer, "  </node>")?;
        }

        self.stats.nodes += 1;
        Ok(osm_id)
    }

    fn write_way(&mut self, graph: &Graph, id: WayId, ids: &mut WrittenIds) -> Result<i64> {
        if let Some(osm_id) = ids.ways.get(&id) {
            return Ok(*osm_id);
        }

        let way = graph.way(id);
        let mut refs = Vec::with_capacity(way.nodes.len());
        for node in &way.nodes {
            refs.push(self.write_node(graph, *node, ids)?);
        }

        let osm_id = self.allocate_id();
        ids.ways.insert(id, osm_id);

        writeln!(self.writer, "  <way id=\"{}\" visible=\"true\">", osm_id)?;
        for node_ref in refs {
            writeln!(self.writer, "    <nd ref=\"{}\"/>", node_ref)?;
        }
        self.write_tags(&way.tags)?;
        writeln!(self.writer, "  </way>")?;

        self.stats.ways += 1;
        Ok(osm_id)
    }

    fn write_relation(&mut self, graph: &Graph, id: RelationId, ids: &mut WrittenIds) -> Result<i64> {
        if let Some(osm_id) = ids.relations.get(&id) {
            return Ok(*osm_id);
        }

        let relation = graph.relation(id);
        let mut members = Vec::with_capacity(relation.members.len());
        for member in &relation.members {
            let member_id = self.write_primitive(graph, member.member, ids)?;
            members.push((member.member.kind(), member_id, member.role.as_str()));
        }

        let osm_id = self.allocate_id();
        ids.relations.insert(id, osm_id);

        writeln!(self.writer, "  <relation id=\"{}\" visible=\"true\">", osm_id)?;
        for (kind, member_id, role) in members {
            writeln!(
                self.writer,
                "    <member type=\"{}\" ref=\"{}\" role=\"{}\"/>",
                kind,
                member_id,
                escape_xml(role)
            )?;
        }
        self.write_tags(&relation.tags)?;
        writeln!(self.writer, "  </relation>")?;

        self.stats.relations += 1;
        Ok(osm_id)
    }

    fn write_primitive(&mut self, graph: &Graph, id: PrimitiveId, ids: &mut WrittenIds) -> Result<i64> {
        match id {
            PrimitiveId::Node(node) => self.write_node(graph, node, ids),
            PrimitiveId::Way(way) => self.write_way(graph, way, ids),
            PrimitiveId::Relation(relation) => self.write_relation(graph, relation, ids),
        }
    }
}

impl PrimitiveSink for OsmXmlSink {
    fn add_feature(&mut self, feature: &ConvertedFeature) -> Result<()> {
        let mut ids = WrittenIds::default();
        for id in &feature.emitted {
            self.write_primitive(&feature.graph, *id, &mut ids)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        writeln!(self.writer, "</osm>")?;
        self.writer.flush()?;
        Ok(())
    }

    fn stats(&self) -> SinkStats {
        self.stats
    }
}
