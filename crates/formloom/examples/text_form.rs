//! Text Form Demo
//!
//! Renders a small contact form as plain text lines, edits it through the
//! handles the compiler hands out and prints every transition.
//!
//! Run with:
//! `cargo run -p formloom --example text_form`
//!
//! Pass a settings file as the first argument to override the defaults:
//! `cargo run -p formloom --example text_form -- form.toml`

use std::sync::Arc;

use anyhow::Result;
use formloom::{
    compose, AttributeValue, EventPayload, ExternalEvent, FieldProps, FormConfig, FormSettings,
    ManyProps, SectionProps, Validator,
};
use serde_json::{json, Value as Json};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let settings = match std::env::args().nth(1) {
        Some(path) => FormSettings::load(path)?,
        None => FormSettings::default(),
    };

    let config = FormConfig::new()
        .default_field(|p: FieldProps| {
            let errors = if p.errors.is_empty() {
                String::new()
            } else {
                format!("  ! {}", p.errors.join(", "))
            };
            vec![format!("{} [{}] = {}{}", p.name_path, p.type_name, p.value, errors)]
        })
        .section(|p: SectionProps<Vec<String>>| {
            let mut lines = vec![format!("== {} ==", p.name)];
            lines.extend(p.children.into_iter().flatten().flatten());
            lines
        })
        .many(|p: ManyProps<Vec<String>>| {
            let mut lines = vec![format!("{} ({} items)", p.name_path, p.children.len())];
            for (index, item) in p.children.into_iter().enumerate() {
                lines.push(format!("  #{index}"));
                lines.extend(item.into_iter().flatten().flatten().map(|l| format!("    {l}")));
            }
            lines
        })
        .validator(required)
        .settings(settings);

    let template = compose(config).on(ExternalEvent::FormInitialised, |_| {
        println!("form initialised");
    });

    let mut form = template.create(&json!([
        ["section", ["contact", "plain", [], [
            ["field", ["name", "text", "", null,
                ["object", [["validation", ["object", [["required", ["value", [true]]]]]]]]]],
            ["field", ["email", "email", "ada@example.com", null, []]]
        ]]],
        ["many", ["phones", "list", null, [],
            [["field", ["number", "tel", "", null, []]]],
            [[["field", ["number", "tel", "555-0100", null, []]]]]
        ]]
    ]));

    form.on(ExternalEvent::Invalid, |payload| println!("form invalid ({})", describe(payload)));
    form.on(ExternalEvent::Valid, |payload| println!("form valid ({})", describe(payload)));

    print(&mut form)?;

    form.set_value("name", json!(""))?;
    print(&mut form)?;

    form.set_value("name", json!("Ada Lovelace"))?;
    form.path_mapping().many("phones")?.add_child()?;
    print(&mut form)?;

    form.set_value("phones.1.number", json!("555-0199"))?;
    form.path_mapping().many("phones")?.reorder_children(vec![1, 0])?;
    print(&mut form)?;

    println!("final state: {}", form.get_state().to_json());
    Ok(())
}

fn print(form: &mut formloom::Form<Vec<String>>) -> Result<()> {
    let output = form.render()?;
    for line in output.into_nodes().into_iter().flatten().flatten().flatten() {
        println!("{line}");
    }
    println!();
    Ok(())
}

fn describe(payload: &EventPayload) -> &str {
    payload.id().unwrap_or("form")
}

fn required(rules: &AttributeValue) -> Validator {
    let required = rules
        .get("required")
        .and_then(AttributeValue::as_literal)
        .and_then(Json::as_bool)
        .unwrap_or(false);

    Arc::new(move |value: &Json| {
        if required && value.as_str().map_or(true, str::is_empty) {
            vec!["is required".to_string()]
        } else {
            Vec::new()
        }
    })
}
