//! Target graph primitives.
//!
//! Nodes, ways and relations produced for one feature live in a [`Graph`]
//! arena and refer to each other through integer handles. A node shared by two
//! split ways, or closing a ring, is the same [`NodeId`] in both places, so
//! "shares this node" is an identity guarantee rather than coordinate equality.

use std::collections::HashMap;
use std::fmt;

/// Handle of a node inside a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Handle of a way inside a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WayId(usize);

/// Handle of a relation inside a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationId(usize);

/// Handle of any primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveId {
    Node(NodeId),
    Way(WayId),
    Relation(RelationId),
}

impl PrimitiveId {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            PrimitiveId::Node(_) => PrimitiveKind::Node,
            PrimitiveId::Way(_) => PrimitiveKind::Way,
            PrimitiveId::Relation(_) => PrimitiveKind::Relation,
        }
    }
}

impl From<NodeId> for PrimitiveId {
    fn from(id: NodeId) -> Self {
        PrimitiveId::Node(id)
    }
}

impl From<WayId> for PrimitiveId {
    fn from(id: WayId) -> Self {
        PrimitiveId::Way(id)
    }
}

impl From<RelationId> for PrimitiveId {
    fn from(id: RelationId) -> Self {
        PrimitiveId::Relation(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Node,
    Way,
    Relation,
}

impl PrimitiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::Node => "node",
            PrimitiveKind::Way => "way",
            PrimitiveKind::Relation => "relation",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered tag list with unique keys.
///
/// Inserting an existing key replaces its value in place (last write wins)
/// and keeps the key's original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags(Vec<(String, String)>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn to_map(&self) -> HashMap<String, String> {
        self.0.iter().cloned().collect()
    }
}

/// A point. Coordinates are already in the target reference system.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub lat: f64,
    pub lon: f64,
    pub tags: Tags,
}

/// An ordered sequence of node references.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Way {
    pub nodes: Vec<NodeId>,
    pub tags: Tags,
}

impl Way {
    pub fn with_nodes(nodes: Vec<NodeId>) -> Self {
        Self {
            nodes,
            tags: Tags::new(),
        }
    }

    #[allow(dead_code)]
    pub fn first(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    #[allow(dead_code)]
    pub fn last(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub member: PrimitiveId,
    pub role: String,
}

/// An ordered list of role-labelled members.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Relation {
    pub members: Vec<Member>,
    pub tags: Tags,
}

impl Relation {
    pub fn add_member(&mut self, member: impl Into<PrimitiveId>, role: &str) {
        self.members.push(Member {
            member: member.into(),
            role: role.to_string(),
        });
    }

    #[allow(dead_code)]
    pub fn members_with_role<'a>(&'a self, role: &'a str) -> impl Iterator<Item = PrimitiveId> + 'a {
        self.members
            .iter()
            .filter(move |m| m.role == role)
            .map(|m| m.member)
    }
}

/// Arena owning every primitive created while converting one feature.
///
/// Handles are only meaningful for the graph that issued them.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    ways: Vec<Way>,
    relations: Vec<Relation>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, lat: f64, lon: f64) -> NodeId {
        self.nodes.push(Node {
            lat,
            lon,
            tags: Tags::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    pub fn add_way(&mut self, way: Way) -> WayId {
        self.ways.push(way);
        WayId(self.ways.len() - 1)
    }

    pub fn add_relation(&mut self, relation: Relation) -> RelationId {
        self.relations.push(relation);
        RelationId(self.relations.len() - 1)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn way(&self, id: WayId) -> &Way {
        &self.ways[id.0]
    }

    pub fn relation(&self, id: RelationId) -> &Relation {
        &self.relations[id.0]
    }

    pub fn relation_mut(&mut self, id: RelationId) -> &mut Relation {
        &mut self.relations[id.0]
    }

    pub fn tags(&self, id: PrimitiveId) -> &Tags {
        match id {
            PrimitiveId::Node(n) => &self.nodes[n.0].tags,
            PrimitiveId::Way(w) => &self.ways[w.0].tags,
            PrimitiveId::Relation(r) => &self.relations[r.0].tags,
        }
    }

    pub fn tags_mut(&mut self, id: PrimitiveId) -> &mut Tags {
        match id {
            PrimitiveId::Node(n) => &mut self.nodes[n.0].tags,
            PrimitiveId::Way(w) => &mut self.ways[w.0].tags,
            PrimitiveId::Relation(r) => &mut self.relations[r.0].tags,
        }
    }

    pub fn has_tags(&self, id: PrimitiveId) -> bool {
        !self.tags(id).is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn way_count(&self) -> usize {
        self.ways.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }
}
