//! Inputs handed to host handlers, one struct per node kind
//!
//! `key` is a hash of the node's structural path, stable for as long as the
//! node does not move. `path` is the structural path of the node's
//! definition list.

use std::sync::Arc;

use formloom_core::{AttributeValue, Bus, Datum, InternalEvent, Path};

use crate::handles::{ChildFormsHandle, FieldHandle, ManyHandle};

pub struct FieldProps {
    pub key: u64,
    pub path: Path,
    pub name: String,
    pub name_path: String,
    pub type_name: String,
    pub value: Datum,
    pub errors: Vec<String>,
    pub attributes: AttributeValue,
    /// The compiled `validation` attribute, if any
    pub rules: Option<AttributeValue>,
    pub handle: FieldHandle,
    /// For raising `field:busy`/`field:idle` from the component
    pub bus: Arc<Bus<InternalEvent>>,
}

pub struct AttrProps<R> {
    pub key: u64,
    pub path: Path,
    pub name: String,
    pub name_path: String,
    pub type_name: String,
    pub errors: Vec<String>,
    pub attributes: AttributeValue,
    pub children: Vec<Option<R>>,
    pub bus: Arc<Bus<InternalEvent>>,
}

pub struct CompoundFieldProps<R> {
    pub key: u64,
    pub path: Path,
    pub type_name: String,
    pub attributes: AttributeValue,
    pub children: Vec<Option<R>>,
}

pub struct ManyProps<R> {
    pub key: u64,
    pub path: Path,
    pub name: String,
    pub name_path: String,
    pub type_name: String,
    pub errors: Vec<String>,
    pub attributes: AttributeValue,
    pub rules: Option<AttributeValue>,
    /// The raw item template `add_child` appends
    pub template: Datum,
    /// Rendered items, one inner list per content item
    pub children: Vec<Vec<Option<R>>>,
    pub handle: ManyHandle,
    pub bus: Arc<Bus<InternalEvent>>,
}

pub struct ManyChildFormsProps<R> {
    pub key: u64,
    pub path: Path,
    pub name: String,
    pub name_path: String,
    pub type_name: String,
    pub errors: Vec<String>,
    pub attributes: AttributeValue,
    pub rules: Option<AttributeValue>,
    /// Rendered child forms
    pub children: Vec<Option<R>>,
    /// Templates `add_child_form` accepts
    pub available_forms: Vec<String>,
    pub handle: ChildFormsHandle,
    pub bus: Arc<Bus<InternalEvent>>,
}

pub struct ChildFormProps<R> {
    pub key: u64,
    pub path: Path,
    pub name: String,
    pub type_name: String,
    pub attributes: AttributeValue,
    pub children: Vec<Option<R>>,
}

pub struct SectionProps<R> {
    pub key: u64,
    pub path: Path,
    pub name: String,
    pub type_name: String,
    pub attributes: AttributeValue,
    pub children: Vec<Option<R>>,
}

pub struct GroupProps<R> {
    pub key: u64,
    pub path: Path,
    pub type_name: String,
    pub attributes: AttributeValue,
    pub children: Vec<Option<R>>,
}
