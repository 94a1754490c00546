//! Tag derivation from feature attributes.
//!
//! Every attribute is normalized to text, escaped, and run through the whole
//! rule list for the geometry tier being tagged. All matching rules
//! contribute; there is no first-match cut-off.

use crate::primitive::{Graph, PrimitiveId};
use crate::rules::Rule;
use crate::source::{AttributeValue, Feature};
use crate::utils::escape_xml;

/// Render an attribute value as tag text.
///
/// Integral floats drop their fraction (`4.0` becomes `4`); text is trimmed.
pub fn normalize_value(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Float(f) => {
            if f.floor() == *f && f.abs() < i64::MAX as f64 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        AttributeValue::Integer(i) => i.to_string(),
        AttributeValue::Unsigned(u) => u.to_string(),
        AttributeValue::Bool(b) => b.to_string(),
        AttributeValue::Text(s) => s.trim().to_string(),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TagMapper {
    /// Also copy every attribute verbatim as a tag.
    pub all_attributes: bool,
}

impl TagMapper {
    pub fn new(all_attributes: bool) -> Self {
        Self { all_attributes }
    }

    /// Add tags derived from `feature` to every primitive in `targets`.
    ///
    /// Rule tags replace existing tags with the same key. In all-attributes
    /// mode attribute copies never replace a tag the target already holds,
    /// so structural tags like `type=multipolygon` survive. The attribute
    /// named like the geometry label is never tagged.
    pub fn apply(&self, graph: &mut Graph, feature: &Feature, targets: &[PrimitiveId], rules: &[Rule]) {
        self.tag(graph, feature, targets, rules, self.all_attributes);
    }

    /// Like [`TagMapper::apply`], but only rule tags are added. Used for
    /// inner rings, which must not inherit the area's attributes.
    pub fn apply_rules(&self, graph: &mut Graph, feature: &Feature, targets: &[PrimitiveId], rules: &[Rule]) {
        self.tag(graph, feature, targets, rules, false);
    }

    fn tag(
        &self,
        graph: &mut Graph,
        feature: &Feature,
        targets: &[PrimitiveId],
        rules: &[Rule],
        copy_attributes: bool,
    ) {
        let label = feature.geometry.label();

        for attribute in &feature.attributes {
            if attribute.name == label {
                continue;
            }
            let Some(value) = &attribute.value else {
                continue;
            };

            let text = normalize_value(value);
            if text.is_empty() {
                continue;
            }
            let escaped = escape_xml(&text);

            if copy_attributes {
                let key = escape_xml(&attribute.name);
                for target in targets {
                    let tags = graph.tags_mut(*target);
                    if tags.get(&key).is_none() {
                        tags.insert(&*key, &*escaped);
                    }
                }
            }

            for rule in rules {
                if let Some((key, value)) = rule.create_tag(&attribute.name, &escaped) {
                    for target in targets {
                        graph.tags_mut(*target).insert(key.as_str(), value.as_str());
                    }
                }
            }
        }
    }
}
