//! Form configuration
//!
//! [`FormConfig`] is the handler registry the compiler resolves against:
//! one handler per structural kind, field handlers keyed by field type with
//! an optional `default` fallback, an optional validator factory and the
//! named templates `many_child_forms` containers can instantiate.

use std::sync::Arc;

use formloom_core::{AttributeValue, Datum, FormError, FormSettings, Result, Validator};
use rustc_hash::FxHashMap;
use serde_json::Value as Json;

use crate::props::{
    AttrProps, ChildFormProps, CompoundFieldProps, FieldProps, GroupProps, ManyChildFormsProps,
    ManyProps, SectionProps,
};

/// A host render function
pub type Handler<P, R> = Arc<dyn Fn(P) -> R + Send + Sync>;

/// Builds a validator from a node's compiled `validation` attribute
pub type ValidatorFactory = Arc<dyn Fn(&AttributeValue) -> Validator + Send + Sync>;

/// Handler registry, validator factory and child form templates
pub struct FormConfig<R> {
    fields: FxHashMap<String, Handler<FieldProps, R>>,
    default_field: Option<Handler<FieldProps, R>>,
    attr: Option<Handler<AttrProps<R>, R>>,
    compound_field: Option<Handler<CompoundFieldProps<R>, R>>,
    many: Option<Handler<ManyProps<R>, R>>,
    many_child_forms: Option<Handler<ManyChildFormsProps<R>, R>>,
    child_form: Option<Handler<ChildFormProps<R>, R>>,
    section: Option<Handler<SectionProps<R>, R>>,
    group: Option<Handler<GroupProps<R>, R>>,
    validator: Option<ValidatorFactory>,
    templates: FxHashMap<String, Datum>,
    settings: FormSettings,
}

impl<R> FormConfig<R> {
    pub fn new() -> Self {
        Self {
            fields: FxHashMap::default(),
            default_field: None,
            attr: None,
            compound_field: None,
            many: None,
            many_child_forms: None,
            child_form: None,
            section: None,
            group: None,
            validator: None,
            templates: FxHashMap::default(),
            settings: FormSettings::default(),
        }
    }

    /// Handler for fields of `field_type`
    pub fn field<F>(mut self, field_type: impl Into<String>, handler: F) -> Self
    where
        F: Fn(FieldProps) -> R + Send + Sync + 'static,
    {
        self.fields.insert(field_type.into(), Arc::new(handler));
        self
    }

    /// Handler for field types without a specific one
    pub fn default_field<F>(mut self, handler: F) -> Self
    where
        F: Fn(FieldProps) -> R + Send + Sync + 'static,
    {
        self.default_field = Some(Arc::new(handler));
        self
    }

    pub fn attr<F>(mut self, handler: F) -> Self
    where
        F: Fn(AttrProps<R>) -> R + Send + Sync + 'static,
    {
        self.attr = Some(Arc::new(handler));
        self
    }

    pub fn compound_field<F>(mut self, handler: F) -> Self
    where
        F: Fn(CompoundFieldProps<R>) -> R + Send + Sync + 'static,
    {
        self.compound_field = Some(Arc::new(handler));
        self
    }

    pub fn many<F>(mut self, handler: F) -> Self
    where
        F: Fn(ManyProps<R>) -> R + Send + Sync + 'static,
    {
        self.many = Some(Arc::new(handler));
        self
    }

    pub fn many_child_forms<F>(mut self, handler: F) -> Self
    where
        F: Fn(ManyChildFormsProps<R>) -> R + Send + Sync + 'static,
    {
        self.many_child_forms = Some(Arc::new(handler));
        self
    }

    pub fn child_form<F>(mut self, handler: F) -> Self
    where
        F: Fn(ChildFormProps<R>) -> R + Send + Sync + 'static,
    {
        self.child_form = Some(Arc::new(handler));
        self
    }

    pub fn section<F>(mut self, handler: F) -> Self
    where
        F: Fn(SectionProps<R>) -> R + Send + Sync + 'static,
    {
        self.section = Some(Arc::new(handler));
        self
    }

    pub fn group<F>(mut self, handler: F) -> Self
    where
        F: Fn(GroupProps<R>) -> R + Send + Sync + 'static,
    {
        self.group = Some(Arc::new(handler));
        self
    }

    /// Validator factory applied to every node carrying `validation` rules
    pub fn validator<F>(mut self, factory: F) -> Self
    where
        F: Fn(&AttributeValue) -> Validator + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(factory));
        self
    }

    /// Register a `child_form` node that `add_child_form(name)` appends
    pub fn child_form_template(mut self, name: impl Into<String>, ast: &Json) -> Self {
        self.templates.insert(name.into(), Datum::from(ast));
        self
    }

    pub fn settings(mut self, settings: FormSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn form_settings(&self) -> &FormSettings {
        &self.settings
    }

    /// Names of the registered child form templates
    pub fn template_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.templates.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    pub(crate) fn templates(&self) -> &FxHashMap<String, Datum> {
        &self.templates
    }

    /// Build the validator for a node, if it has rules and a factory exists
    pub(crate) fn validator_for(&self, rules: Option<&AttributeValue>) -> Option<Validator> {
        let factory = self.validator.as_ref()?;
        rules.map(|rules| factory(rules))
    }

    pub(crate) fn field_handler(&self, field_type: &str) -> Result<Handler<FieldProps, R>> {
        self.fields
            .get(field_type)
            .or(self.default_field.as_ref())
            .cloned()
            .ok_or_else(|| FormError::MissingHandler(format!("field type `{field_type}`")))
    }

    pub(crate) fn attr_handler(&self) -> Result<Handler<AttrProps<R>, R>> {
        resolve(&self.attr, "attr")
    }

    pub(crate) fn compound_field_handler(&self) -> Result<Handler<CompoundFieldProps<R>, R>> {
        resolve(&self.compound_field, "compound_field")
    }

    pub(crate) fn many_handler(&self) -> Result<Handler<ManyProps<R>, R>> {
        resolve(&self.many, "many")
    }

    pub(crate) fn many_child_forms_handler(&self) -> Result<Handler<ManyChildFormsProps<R>, R>> {
        resolve(&self.many_child_forms, "many_child_forms")
    }

    pub(crate) fn child_form_handler(&self) -> Result<Handler<ChildFormProps<R>, R>> {
        resolve(&self.child_form, "child_form")
    }

    pub(crate) fn section_handler(&self) -> Result<Handler<SectionProps<R>, R>> {
        resolve(&self.section, "section")
    }

    pub(crate) fn group_handler(&self) -> Result<Handler<GroupProps<R>, R>> {
        resolve(&self.group, "group")
    }
}

fn resolve<P, R>(handler: &Option<Handler<P, R>>, kind: &str) -> Result<Handler<P, R>> {
    handler
        .clone()
        .ok_or_else(|| FormError::MissingHandler(kind.to_string()))
}

impl<R> Default for FormConfig<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(props: FieldProps) -> String {
        format!("{}:{}", props.type_name, props.name)
    }

    #[test]
    fn test_field_resolution_falls_back_to_default() {
        let config = FormConfig::new()
            .field("text", label)
            .default_field(|props: FieldProps| format!("default:{}", props.name));

        assert!(config.field_handler("text").is_ok());
        assert!(config.field_handler("date").is_ok());
    }

    #[test]
    fn test_missing_handlers() {
        let config: FormConfig<String> = FormConfig::new().field("text", label);
        let err = config.field_handler("date").err().unwrap();
        assert_eq!(err.to_string(), "Expected a handler for field type `date` to be registered");
        assert!(matches!(config.many_handler(), Err(FormError::MissingHandler(kind)) if kind == "many"));
    }

    #[test]
    fn test_validator_needs_rules_and_factory() {
        let bare: FormConfig<()> = FormConfig::new();
        assert!(bare.validator_for(Some(&AttributeValue::default())).is_none());

        let config: FormConfig<()> = FormConfig::new().validator(|_rules| {
            let validate: Validator = Arc::new(|_value: &Json| Vec::new());
            validate
        });
        assert!(config.validator_for(None).is_none());
        assert!(config.validator_for(Some(&AttributeValue::default())).is_some());
    }

    #[test]
    fn test_template_names_are_sorted() {
        let config: FormConfig<()> = FormConfig::new()
            .child_form_template("quote", &serde_json::json!(["child_form", ["quote", "block", [], []]]))
            .child_form_template("image", &serde_json::json!(["child_form", ["image", "block", [], []]]));
        assert_eq!(config.template_names(), vec!["image", "quote"]);
    }
}
