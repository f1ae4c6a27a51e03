mod common;

use common::{json_config, text};
use formloom::{compose, Form, FormConfig, FormError};
use pretty_assertions::assert_eq;
use serde_json::{json, Value as Json};

fn quote(body: &str) -> Json {
    json!(["child_form", ["quote", "block", [text("body", body)], []]])
}

fn image(src: &str) -> Json {
    json!(["child_form", ["image", "block", [text("src", src)], []]])
}

fn blocks_config() -> FormConfig<Json> {
    json_config()
        .child_form_template("quote", &quote(""))
        .child_form_template("image", &image(""))
}

fn blocks_form(children: Vec<Json>) -> Form<Json> {
    let initial = json!([["many_child_forms", ["blocks", "blocks", null, [], children]]]);
    let mut form = compose(blocks_config()).create(&initial);
    form.render().unwrap();
    form
}

fn kinds(form: &Form<Json>) -> Vec<String> {
    form.get_value("blocks")
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|child| child[1][0].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn child_forms_are_indexed_under_the_container() {
    let mut form = blocks_form(vec![quote("To be"), image("cat.png")]);
    let output = form.render().unwrap().into_nodes().unwrap();

    let blocks = output[0].as_ref().unwrap();
    assert_eq!(blocks["forms"][0]["child_form"], json!("quote"));
    assert_eq!(blocks["forms"][0]["children"][0]["field"], json!("blocks.0.body"));
    assert_eq!(blocks["forms"][1]["children"][0]["field"], json!("blocks.1.src"));
    assert_eq!(form.get_value("blocks.1.src").unwrap(), json!("cat.png"));
}

#[test]
fn handler_sees_available_templates() {
    let config = FormConfig::new()
        .child_form_template("quote", &quote(""))
        .child_form_template("image", &image(""))
        .many_child_forms(|p: formloom::ManyChildFormsProps<Vec<String>>| p.available_forms);
    let mut form = compose(config).create(&json!([["many_child_forms", ["blocks", "blocks", null, [], []]]]));

    let output = form.render().unwrap().into_nodes().unwrap();
    assert_eq!(output, vec![Some(vec!["image".to_string(), "quote".to_string()])]);
}

#[test]
fn add_child_form_appends_a_template_copy() {
    let mut form = blocks_form(vec![quote("first")]);

    form.path_mapping().child_forms("blocks").unwrap().add_child_form("image").unwrap();
    form.render().unwrap();

    assert_eq!(kinds(&form), vec!["quote", "image"]);
    assert_eq!(form.get_value("blocks.1.src").unwrap(), json!(""));

    // Editing the new child does not leak into the registered template
    form.set_value("blocks.1.src", json!("dog.png")).unwrap();
    form.path_mapping().child_forms("blocks").unwrap().add_child_form("image").unwrap();
    form.render().unwrap();
    assert_eq!(form.get_value("blocks.2.src").unwrap(), json!(""));
}

#[test]
fn unknown_template_is_rejected() {
    let form = blocks_form(Vec::new());
    let err = form
        .path_mapping()
        .child_forms("blocks")
        .unwrap()
        .add_child_form("video")
        .unwrap_err();

    assert!(matches!(err, FormError::UnknownTemplate(ref name) if name == "video"));
    assert_eq!(form.store().version(), 0);
}

#[test]
fn reorder_and_remove_child_forms() {
    let mut form = blocks_form(vec![quote("a"), image("b.png"), quote("c")]);
    let blocks = form.path_mapping().child_forms("blocks").unwrap().clone();

    blocks.reorder_children(vec![1, 2, 0]).unwrap();
    form.render().unwrap();
    assert_eq!(kinds(&form), vec!["image", "quote", "quote"]);
    assert_eq!(form.get_value("blocks.1.body").unwrap(), json!("c"));

    blocks.remove_child(0).unwrap();
    form.render().unwrap();
    assert_eq!(kinds(&form), vec!["quote", "quote"]);
    assert_eq!(form.get_value("blocks.0.body").unwrap(), json!("c"));

    assert!(matches!(
        blocks.reorder_children(vec![0]),
        Err(FormError::InvalidOrder { len: 2, .. })
    ));
}

#[test]
fn container_rules_validate_child_form_count() {
    let initial = json!([["many_child_forms", ["blocks", "blocks", null,
        ["object", [["validation", ["object", [["min_items", ["value", [1]]]]]]]],
        [quote("only")]
    ]]]);
    let mut form = compose(blocks_config()).create(&initial);
    form.render().unwrap();

    form.path_mapping().child_forms("blocks").unwrap().remove_child(0).unwrap();
    let output = form.render().unwrap().into_nodes().unwrap();

    assert_eq!(output[0].as_ref().unwrap()["errors"], json!(["size cannot be less than 1"]));
    assert_eq!(form.buses().invalid_count(), 1);
}
