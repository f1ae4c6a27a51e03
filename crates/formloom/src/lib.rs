//! formloom
//!
//! Compiles schema-indexed form ASTs into whatever the host renders.
//! The host registers one handler per node kind; the compiler walks the
//! AST, calls those handlers and hands them path-bound handles that edit
//! the form through its store.
//!
//! # Example
//!
//! ```rust
//! use formloom::{compose, FieldProps, FormConfig};
//! use serde_json::json;
//!
//! let template = compose(
//!     FormConfig::new().default_field(|props: FieldProps| format!("{}={}", props.name_path, props.value)),
//! );
//! let mut form = template.create(&json!([
//!     ["field", ["title", "text", "Hello", null, []]]
//! ]));
//!
//! let output = form.render().unwrap();
//! assert_eq!(output.nodes().unwrap()[0].as_deref(), Some("title=\"Hello\""));
//!
//! form.set_value("title", json!("Bye")).unwrap();
//! assert_eq!(form.get_value("title").unwrap(), json!("Bye"));
//! ```

pub mod compiler;
pub mod composer;
pub mod config;
pub mod context;
pub mod handles;
pub mod mapping;
pub mod props;

pub use compiler::CompiledForm;
pub use composer::{compose, Form, FormTemplate};
pub use config::{FormConfig, Handler, ValidatorFactory};
pub use context::FormContext;
pub use handles::{ChildFormsHandle, FieldHandle, ManyHandle};
pub use mapping::{MappingEntry, PathMapping};
pub use props::{
    AttrProps, ChildFormProps, CompoundFieldProps, FieldProps, GroupProps, ManyChildFormsProps,
    ManyProps, SectionProps,
};

pub use formloom_core::schema;
pub use formloom_core::{
    Action, AttributeValue, Datum, EventPayload, ExternalEvent, FormError, FormSettings,
    InternalEvent, Path, Result, Update, Validator,
};
