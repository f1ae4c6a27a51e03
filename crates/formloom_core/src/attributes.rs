//! Attribute compiler
//!
//! Node attributes (labels, options, validation rules, ...) arrive as their
//! own small AST of tagged nodes:
//!
//! - `["object", [[key, node], ...]]`
//! - `["array", [node, ...]]`
//! - `["value", [literal]]`
//!
//! [`compile_attributes`] expands that into an [`AttributeValue`] tree.

use indexmap::IndexMap;
use serde_json::Value as Json;

use crate::datum::Datum;
use crate::error::{FormError, Result};
use crate::schema::attributes as slots;

/// A compiled attribute tree
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    Object(IndexMap<String, AttributeValue>),
    Array(Vec<AttributeValue>),
    Value(Json),
}

impl Default for AttributeValue {
    fn default() -> Self {
        AttributeValue::Object(IndexMap::new())
    }
}

impl AttributeValue {
    /// Look up a key of an object
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        match self {
            AttributeValue::Object(map) => map.get(key),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Json> {
        match self {
            AttributeValue::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_literal().and_then(Json::as_str)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            AttributeValue::Object(map) => map.is_empty(),
            AttributeValue::Array(items) => items.is_empty(),
            AttributeValue::Value(_) => false,
        }
    }

    /// Plain JSON view, objects keep their declaration order
    pub fn to_json(&self) -> Json {
        match self {
            AttributeValue::Object(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            AttributeValue::Array(items) => {
                Json::Array(items.iter().map(AttributeValue::to_json).collect())
            }
            AttributeValue::Value(v) => v.clone(),
        }
    }
}

#[derive(Clone, Copy)]
enum AttributeKind {
    Object,
    Array,
    Value,
}

impl AttributeKind {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "object" => Some(AttributeKind::Object),
            "array" => Some(AttributeKind::Array),
            "value" => Some(AttributeKind::Value),
            _ => None,
        }
    }
}

/// Compile an attribute AST.
///
/// A missing (`null`) or empty node compiles to an empty object, so nodes
/// without attributes need no special casing downstream.
pub fn compile_attributes(node: &Datum) -> Result<AttributeValue> {
    match node {
        Datum::Null => Ok(AttributeValue::default()),
        Datum::List(items) if items.is_empty() => Ok(AttributeValue::default()),
        _ => visit(node),
    }
}

fn visit(node: &Datum) -> Result<AttributeValue> {
    let tag = node
        .get(slots::KIND)
        .and_then(Datum::as_str)
        .ok_or_else(|| malformed(format!("expected a `[kind, definition]` pair, got {node}")))?;
    let kind = AttributeKind::from_tag(tag)
        .ok_or_else(|| malformed(format!("unknown attribute kind `{tag}`")))?;
    let definition = node
        .get(slots::DEFINITION)
        .ok_or_else(|| malformed(format!("`{tag}` node has no definition")))?;

    match kind {
        AttributeKind::Object => visit_object(definition),
        AttributeKind::Array => visit_array(definition),
        AttributeKind::Value => visit_value(definition),
    }
}

fn visit_object(definition: &Datum) -> Result<AttributeValue> {
    let pairs = definition
        .as_list()
        .ok_or_else(|| malformed("object definition must be a list of pairs"))?;

    let mut map = IndexMap::with_capacity(pairs.len());
    for pair in pairs {
        let key = pair
            .get(slots::PAIR_KEY)
            .and_then(Datum::as_str)
            .ok_or_else(|| malformed(format!("object pair without a string key: {pair}")))?;
        let child = pair
            .get(slots::PAIR_NODE)
            .ok_or_else(|| malformed(format!("object key `{key}` has no node")))?;
        if map.contains_key(key) {
            return Err(FormError::DuplicateAttributeKey(key.to_string()));
        }
        map.insert(key.to_string(), visit(child)?);
    }
    Ok(AttributeValue::Object(map))
}

fn visit_array(definition: &Datum) -> Result<AttributeValue> {
    let children = definition
        .as_list()
        .ok_or_else(|| malformed("array definition must be a list"))?;
    children
        .iter()
        .map(visit)
        .collect::<Result<Vec<_>>>()
        .map(AttributeValue::Array)
}

fn visit_value(definition: &Datum) -> Result<AttributeValue> {
    definition
        .get(slots::VALUE)
        .map(|literal| AttributeValue::Value(literal.to_json()))
        .ok_or_else(|| malformed("value definition must hold a literal"))
}

fn malformed(reason: impl Into<String>) -> FormError {
    FormError::MalformedAttribute(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn radio_attributes() -> Datum {
        Datum::from(json!(
            ["object", [
                ["label", ["value", ["String (radio)"]]],
                ["options", ["array", [
                    ["array", [["value", ["1"]], ["value", ["One"]]]],
                    ["array", [["value", ["2"]], ["value", ["Two"]]]],
                    ["array", [["value", ["3"]], ["value", ["Three"]]]]
                ]]]
            ]]
        ))
    }

    #[test]
    fn test_compiles_object_into_keyed_map() {
        let attributes = compile_attributes(&radio_attributes()).unwrap();
        assert_eq!(attributes.get("label").and_then(AttributeValue::as_str), Some("String (radio)"));
    }

    #[test]
    fn test_arrays_keep_order() {
        let attributes = compile_attributes(&radio_attributes()).unwrap();
        let options = attributes.get("options").unwrap();
        assert!(options.as_array().is_some());
        assert_eq!(
            options.to_json(),
            json!([["1", "One"], ["2", "Two"], ["3", "Three"]])
        );
    }

    #[test]
    fn test_object_keeps_declaration_order() {
        let attributes = compile_attributes(&radio_attributes()).unwrap();
        let AttributeValue::Object(map) = attributes else {
            panic!("expected an object");
        };
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["label", "options"]);
    }

    #[test]
    fn test_missing_attributes_compile_to_empty_object() {
        assert_eq!(compile_attributes(&Datum::Null).unwrap(), AttributeValue::default());
        assert_eq!(compile_attributes(&Datum::empty_list()).unwrap(), AttributeValue::default());
    }

    #[test]
    fn test_unknown_kind_is_malformed() {
        let err = compile_attributes(&Datum::from(json!(["hash", []]))).unwrap_err();
        assert!(matches!(err, FormError::MalformedAttribute(_)));
    }

    #[test]
    fn test_duplicate_keys_are_rejected() {
        let node = Datum::from(json!(
            ["object", [["label", ["value", ["a"]]], ["label", ["value", ["b"]]]]]
        ));
        let err = compile_attributes(&node).unwrap_err();
        assert!(matches!(err, FormError::DuplicateAttributeKey(key) if key == "label"));
    }

    #[test]
    fn test_value_without_literal_is_malformed() {
        let err = compile_attributes(&Datum::from(json!(["value", []]))).unwrap_err();
        assert!(matches!(err, FormError::MalformedAttribute(_)));
    }
}
