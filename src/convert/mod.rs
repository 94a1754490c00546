//! Feature conversion.
//!
//! One feature at a time: decompose its geometry, tag each tier with the rule
//! list for that tier, and gate every primitive through the inclusion filter.
//! The result lists accepted primitives in emission order; nothing is written
//! here.

use crate::geometry::{self, GeometryError, PolygonLayout};
use crate::primitive::{Graph, PrimitiveId};
use crate::rules::{RuleClass, RuleSet};
use crate::source::{Feature, FeatureGeometry};
use crate::tagging::TagMapper;

/// Primitives produced for one feature.
#[derive(Debug, Default)]
pub struct ConvertedFeature {
    pub graph: Graph,
    /// Accepted primitives, in the order they must be written.
    pub emitted: Vec<PrimitiveId>,
}

impl ConvertedFeature {
    fn emit(&mut self, id: impl Into<PrimitiveId>) {
        self.emitted.push(id.into());
    }
}

pub struct Converter<'a> {
    rules: &'a RuleSet,
    mapper: TagMapper,
    only_tagged: bool,
}

impl<'a> Converter<'a> {
    /// `only_tagged` selects strict inclusion: untagged primitives are dropped
    /// before the rule set's predicate is consulted.
    pub fn new(rules: &'a RuleSet, only_tagged: bool, all_attributes: bool) -> Self {
        Self {
            rules,
            mapper: TagMapper::new(all_attributes),
            only_tagged,
        }
    }

    /// Inclusion filter, evaluated once per primitive.
    pub fn should_include(&self, graph: &Graph, id: PrimitiveId) -> bool {
        if self.only_tagged && !graph.has_tags(id) {
            return false;
        }
        self.rules.includes(id.kind(), graph.tags(id))
    }

    /// Convert one feature.
    ///
    /// Returns `Ok(None)` for geometry types the converter does not handle.
    pub fn convert(&self, feature: &Feature) -> Result<Option<ConvertedFeature>, GeometryError> {
        let mut out = ConvertedFeature::default();

        match &feature.geometry {
            FeatureGeometry::Point(coords) => {
                let nodes: Vec<PrimitiveId> = coords
                    .iter()
                    .map(|c| out.graph.add_node(c.y, c.x).into())
                    .collect();
                self.mapper
                    .apply(&mut out.graph, feature, &nodes, self.rules.rules(RuleClass::Point));
                for node in nodes {
                    if self.should_include(&out.graph, node) {
                        out.emit(node);
                    }
                }
            }
            FeatureGeometry::MultiLineString(lines) => {
                for line in lines {
                    let ways: Vec<PrimitiveId> = geometry::linestring_to_ways(&mut out.graph, &line.0)
                        .into_iter()
                        .map(PrimitiveId::from)
                        .collect();
                    self.mapper
                        .apply(&mut out.graph, feature, &ways, self.rules.rules(RuleClass::Line));
                    for way in ways {
                        if self.should_include(&out.graph, way) {
                            out.emit(way);
                        }
                    }
                }
            }
            FeatureGeometry::MultiPolygon(polygons) => {
                for polygon in polygons {
                    let layout = geometry::polygon_to_layout(&mut out.graph, polygon)?;
                    self.place_polygon(feature, layout, &mut out);
                }
            }
            FeatureGeometry::Other(label) => {
                tracing::debug!("Ignoring feature with {} geometry", label);
                return Ok(None);
            }
        }

        tracing::trace!(
            parts = feature.geometry.part_count(),
            nodes = out.graph.node_count(),
            ways = out.graph.way_count(),
            relations = out.graph.relation_count(),
            emitted = out.emitted.len(),
            "Converted {} feature",
            feature.geometry.label()
        );

        Ok(Some(out))
    }

    fn place_polygon(&self, feature: &Feature, layout: PolygonLayout, out: &mut ConvertedFeature) {
        let outer_rules = self.rules.rules(RuleClass::Outer);

        match layout {
            PolygonLayout::Simple(way) => {
                self.mapper
                    .apply(&mut out.graph, feature, &[way.into()], outer_rules);
                if self.should_include(&out.graph, way.into()) {
                    out.emit(way);
                }
            }
            PolygonLayout::SplitExterior { relation, outer } => {
                let outer: Vec<PrimitiveId> = outer.into_iter().map(PrimitiveId::from).collect();
                self.mapper.apply(&mut out.graph, feature, &outer, outer_rules);

                let rejected: Vec<PrimitiveId> = outer
                    .iter()
                    .copied()
                    .filter(|way| !self.should_include(&out.graph, *way))
                    .collect();
                out.graph
                    .relation_mut(relation)
                    .members
                    .retain(|m| !rejected.contains(&m.member));

                if self.should_include(&out.graph, relation.into()) {
                    out.emit(relation);
                }
            }
            PolygonLayout::WithHoles {
                relation, inner, ..
            } => {
                self.mapper
                    .apply(&mut out.graph, feature, &[relation.into()], outer_rules);

                let inner: Vec<PrimitiveId> = inner.into_iter().map(PrimitiveId::from).collect();
                self.mapper.apply_rules(
                    &mut out.graph,
                    feature,
                    &inner,
                    self.rules.rules(RuleClass::Inner),
                );

                if self.should_include(&out.graph, relation.into()) {
                    out.emit(relation);
                }
            }
        }
    }
}
