//! Shared fixtures: a JSON-rendering config and a small rule validator

#![allow(dead_code)]

use std::sync::Arc;

use formloom::{
    AttrProps, AttributeValue, ChildFormProps, CompoundFieldProps, FieldProps, FormConfig,
    GroupProps, ManyChildFormsProps, ManyProps, SectionProps, Validator,
};
use serde_json::{json, Value as Json};

/// Every handler renders its props into a JSON summary
pub fn json_config() -> FormConfig<Json> {
    FormConfig::new()
        .default_field(|p: FieldProps| {
            json!({ "field": p.name_path, "type": p.type_name, "value": p.value.to_json(), "errors": p.errors })
        })
        .attr(|p: AttrProps<Json>| json!({ "attr": p.name_path, "children": p.children }))
        .compound_field(|p: CompoundFieldProps<Json>| {
            json!({ "compound_field": p.type_name, "children": p.children })
        })
        .many(|p: ManyProps<Json>| {
            json!({ "many": p.name_path, "errors": p.errors, "items": p.children })
        })
        .many_child_forms(|p: ManyChildFormsProps<Json>| {
            json!({ "many_child_forms": p.name_path, "errors": p.errors, "forms": p.children })
        })
        .child_form(|p: ChildFormProps<Json>| json!({ "child_form": p.name, "children": p.children }))
        .section(|p: SectionProps<Json>| json!({ "section": p.name, "children": p.children }))
        .group(|p: GroupProps<Json>| json!({ "group": p.type_name, "children": p.children }))
        .validator(rule_validator)
}

/// Understands `min_items` (containers) and `filled` (fields)
pub fn rule_validator(rules: &AttributeValue) -> Validator {
    let min_items = rules
        .get("min_items")
        .and_then(AttributeValue::as_literal)
        .and_then(Json::as_u64)
        .map(|min| min as usize);
    let filled = rules
        .get("filled")
        .and_then(AttributeValue::as_literal)
        .and_then(Json::as_bool)
        .unwrap_or(false);

    Arc::new(move |value: &Json| {
        let mut errors = Vec::new();
        if let Some(min) = min_items {
            if value.as_array().map_or(0, Vec::len) < min {
                errors.push(format!("size cannot be less than {min}"));
            }
        }
        if filled && value.as_str().map_or(true, str::is_empty) {
            errors.push("must be filled".to_string());
        }
        errors
    })
}

pub fn text(name: &str, value: &str) -> Json {
    json!(["field", [name, "text", value, null, []]])
}

pub fn required_text(name: &str, value: &str) -> Json {
    json!(["field", [name, "text", value, null,
        ["object", [["validation", ["object", [["filled", ["value", [true]]]]]]]]
    ]])
}

/// A `many` named `items`; every item holds a `label` and a `note` field
pub fn items_form(labels: &[&str], min_items: Option<u64>) -> Json {
    let attributes = match min_items {
        Some(min) => json!(["object", [["validation", ["object", [["min_items", ["value", [min]]]]]]]]),
        None => json!([]),
    };
    let template = json!([text("label", ""), text("note", "")]);
    let contents: Vec<Json> = labels
        .iter()
        .map(|label| json!([text("label", label), text("note", &format!("note {label}"))]))
        .collect();
    json!([["many", ["items", "default", null, attributes, template, contents]]])
}
