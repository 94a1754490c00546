//! Decomposition of coordinate sequences into bounded-size ways.
//!
//! Everything here is structural: ways, relations and the `type=multipolygon`
//! marker. Rule-derived tags are applied later by the converter.

use geo_types::{Coord, Polygon};
use thiserror::Error;

use crate::primitive::{Graph, NodeId, Relation, RelationId, Way, WayId};

/// Upper bound on node references held by a single way.
pub const MAX_NODES_IN_WAY: usize = 2000;

#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum GeometryError {
    /// A polygon ring cannot form a way with fewer than two coordinates.
    #[error("polygon ring has {count} coordinate(s), at least 2 are required")]
    DegenerateRing { count: usize },
}

/// How one polygon part was laid out as primitives.
#[derive(Debug, Clone, PartialEq)]
pub enum PolygonLayout {
    /// No holes and the exterior fits in one way.
    Simple(WayId),
    /// No holes, but the exterior had to be split over several ways.
    SplitExterior {
        relation: RelationId,
        outer: Vec<WayId>,
    },
    /// At least one hole; every ring way is a relation member.
    WithHoles {
        relation: RelationId,
        outer: Vec<WayId>,
        inner: Vec<WayId>,
    },
}

fn coord_node(graph: &mut Graph, coord: &Coord<f64>) -> NodeId {
    graph.add_node(coord.y, coord.x)
}

/// Cut a node path into ways of at most [`MAX_NODES_IN_WAY`] nodes.
///
/// Consecutive ways share their junction node.
fn split_path(graph: &mut Graph, nodes: &[NodeId]) -> Vec<WayId> {
    if nodes.is_empty() {
        return Vec::new();
    }
    if nodes.len() <= MAX_NODES_IN_WAY {
        return vec![graph.add_way(Way::with_nodes(nodes.to_vec()))];
    }

    let stride = MAX_NODES_IN_WAY - 1;
    let mut ways = Vec::with_capacity((nodes.len() - 1).div_ceil(stride));
    let mut start = 0;
    while start + 1 < nodes.len() {
        let end = (start + MAX_NODES_IN_WAY).min(nodes.len());
        ways.push(graph.add_way(Way::with_nodes(nodes[start..end].to_vec())));
        start = end - 1;
    }
    ways
}

/// Convert an open line into one or more ways.
///
/// Every coordinate becomes a fresh node; split ways share the boundary node.
pub fn linestring_to_ways(graph: &mut Graph, coords: &[Coord<f64>]) -> Vec<WayId> {
    let nodes: Vec<NodeId> = coords.iter().map(|c| coord_node(graph, c)).collect();
    split_path(graph, &nodes)
}

/// Convert a ring into one or more ways.
///
/// When the last coordinate equals the first, the ring is closed by reusing
/// the first node rather than creating a duplicate, so the last way ends with
/// the very node the first way starts with.
pub fn polygon_to_ways(graph: &mut Graph, ring: &[Coord<f64>]) -> Result<Vec<WayId>, GeometryError> {
    if ring.len() < 2 {
        return Err(GeometryError::DegenerateRing { count: ring.len() });
    }

    let first = ring[0];
    let last = ring[ring.len() - 1];
    let closed = first.x == last.x && first.y == last.y;

    let mut nodes: Vec<NodeId> = Vec::with_capacity(ring.len());
    for coord in &ring[..ring.len() - 1] {
        nodes.push(coord_node(graph, coord));
    }
    if closed {
        nodes.push(nodes[0]);
    } else {
        nodes.push(coord_node(graph, &last));
    }

    Ok(split_path(graph, &nodes))
}

fn multipolygon_relation() -> Relation {
    let mut relation = Relation::default();
    relation.tags.insert("type", "multipolygon");
    relation
}

/// Lay out a polygon with optional holes.
///
/// A hole-free polygon whose exterior fits in one way stays a bare way.
/// Otherwise a `type=multipolygon` relation is created holding the exterior
/// ways as `outer` members and every hole way as an `inner` member.
pub fn polygon_to_layout(graph: &mut Graph, polygon: &Polygon<f64>) -> Result<PolygonLayout, GeometryError> {
    let outer = polygon_to_ways(graph, &polygon.exterior().0)?;

    if polygon.interiors().is_empty() {
        if outer.len() == 1 {
            return Ok(PolygonLayout::Simple(outer[0]));
        }
        let mut relation = multipolygon_relation();
        for way in &outer {
            relation.add_member(*way, "outer");
        }
        let relation = graph.add_relation(relation);
        return Ok(PolygonLayout::SplitExterior { relation, outer });
    }

    let mut inner = Vec::new();
    for ring in polygon.interiors() {
        inner.extend(polygon_to_ways(graph, &ring.0)?);
    }

    let mut relation = multipolygon_relation();
    for way in &outer {
        relation.add_member(*way, "outer");
    }
    for way in &inner {
        relation.add_member(*way, "inner");
    }
    let relation = graph.add_relation(relation);

    Ok(PolygonLayout::WithHoles {
        relation,
        outer,
        inner,
    })
}
