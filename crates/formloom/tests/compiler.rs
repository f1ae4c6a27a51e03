mod common;

use common::{json_config, text};
use formloom::{compose, CompiledForm, FieldProps, FormConfig, FormError, FormSettings};
use pretty_assertions::assert_eq;
use serde_json::{json, Value as Json};

#[test]
fn renders_nested_structure_with_name_paths() {
    let initial = json!([
        ["attr", ["address", "object", null, [], [
            text("street", "Main"),
            ["compound_field", ["pair", [], [text("city", "Oslo"), text("zip", "0150")]]]
        ]]],
        ["group", ["inline", [], [text("nickname", "")]]]
    ]);
    let mut form = compose(json_config()).create(&initial);
    let output = form.render().unwrap().into_nodes().unwrap();

    assert_eq!(
        output,
        vec![
            Some(json!({
                "attr": "address",
                "children": [
                    { "field": "address.street", "type": "text", "value": "Main", "errors": [] },
                    { "compound_field": "pair", "children": [
                        { "field": "address.city", "type": "text", "value": "Oslo", "errors": [] },
                        { "field": "address.zip", "type": "text", "value": "0150", "errors": [] }
                    ]}
                ]
            })),
            Some(json!({
                "group": "inline",
                "children": [{ "field": "nickname", "type": "text", "value": "", "errors": [] }]
            })),
        ]
    );
}

#[test]
fn many_items_get_indexed_name_paths() {
    let mut form = compose(json_config()).create(&common::items_form(&["A", "B"], None));
    let output = form.render().unwrap().into_nodes().unwrap();

    let items = &output[0].as_ref().unwrap()["items"];
    assert_eq!(items[0][0]["field"], json!("items.0.label"));
    assert_eq!(items[1][1]["field"], json!("items.1.note"));
    assert_eq!(items[1][1]["value"], json!("note B"));
}

#[test]
fn empty_sections_and_groups_render_nothing() {
    // No section or group handler is registered, so reaching one would fail
    let config = FormConfig::new().default_field(|p: FieldProps| p.name_path);
    let mut form = compose(config).create(&json!([
        ["section", ["empty", "plain", [], []]],
        ["section", ["missing", "plain", []]],
        ["group", ["bare", [], null]],
        text("after", "")
    ]));

    let output = form.render().unwrap().into_nodes().unwrap();
    assert_eq!(output, vec![None, None, None, Some("after".to_string())]);
}

#[test]
fn non_list_state_is_not_a_tree() {
    let mut form = compose(json_config()).create(&json!({ "not": "a form" }));
    assert!(matches!(form.render().unwrap(), CompiledForm::NotATree));
}

#[test]
fn missing_handler_is_reported() {
    let config: FormConfig<Json> = FormConfig::new().field("text", |p: FieldProps| p.value.to_json());
    let mut form = compose(config).create(&json!([
        text("title", "Hello"),
        ["field", ["when", "date", "2024-01-01", null, []]]
    ]));

    let err = form.render().unwrap_err();
    assert!(matches!(err, FormError::MissingHandler(ref what) if what == "field type `date`"));
}

#[test]
fn missing_container_handler_is_reported() {
    let config: FormConfig<Json> = FormConfig::new().default_field(|p: FieldProps| p.value.to_json());
    let mut form = compose(config).create(&common::items_form(&["A"], None));
    assert!(matches!(form.render(), Err(FormError::MissingHandler(kind)) if kind == "many"));
}

#[test]
fn default_field_handles_unregistered_types() {
    let config = FormConfig::new()
        .field("text", |p: FieldProps| format!("text:{}", p.name))
        .default_field(|p: FieldProps| format!("{}:{}", p.type_name, p.name));
    let mut form = compose(config).create(&json!([
        text("title", ""),
        ["field", ["rating", "stars", 4, null, []]]
    ]));

    let output = form.render().unwrap().into_nodes().unwrap();
    assert_eq!(
        output,
        vec![Some("text:title".to_string()), Some("stars:rating".to_string())]
    );
}

#[test]
fn malformed_nodes_fail_the_render() {
    let mut form = compose(json_config()).create(&json!([["fieldset", ["x"]]]));
    let err = form.render().unwrap_err();
    assert!(matches!(err, FormError::MalformedNode { ref reason, .. } if reason.contains("fieldset")));

    let mut form = compose(json_config()).create(&json!([["field", "not a list"]]));
    assert!(matches!(form.render(), Err(FormError::MalformedNode { .. })));
}

#[test]
fn failed_render_keeps_previous_mapping() {
    let mut form = compose(json_config()).create(&common::items_form(&["A"], None));
    form.render().unwrap();

    // Contents must be a list of items
    form.set_value("items", json!("oops")).unwrap();

    assert!(matches!(form.render(), Err(FormError::MalformedNode { .. })));
    assert!(form.path_mapping().contains("items"));
    assert!(form.path_mapping().contains("items.0.label"));
}

#[test]
fn custom_name_separator() {
    let settings = FormSettings::from_toml_str("[compiler]\nname_separator = \"/\"").unwrap();
    let mut form = compose(json_config().settings(settings)).create(&common::items_form(&["A"], None));
    form.render().unwrap();

    assert_eq!(form.get_value("items/0/label").unwrap(), json!("A"));
}

#[test]
fn keys_follow_structural_position() {
    let config = FormConfig::new().default_field(|p: FieldProps| p.key);
    let mut form = compose(config).create(&json!([text("a", ""), text("b", "")]));
    let first = form.render().unwrap().into_nodes().unwrap();
    let second = form.render().unwrap().into_nodes().unwrap();

    assert_eq!(first, second);
    assert_ne!(first[0], first[1]);
    assert_eq!(first[0], Some(formloom::Path::from([0, 1]).key()));
}

#[test]
fn addressable_nodes_need_a_name() {
    let mut form = compose(json_config()).create(&json!([["field", ["", "text", "x", null, []]]]));
    let err = form.render().unwrap_err();
    assert!(matches!(err, FormError::MalformedNode { ref reason, .. } if reason.contains("no name")));

    let mut form = compose(json_config()).create(&json!([["many", [null, "default", null, [], [], []]]]));
    assert!(matches!(form.render(), Err(FormError::MalformedNode { .. })));
}
