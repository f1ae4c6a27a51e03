//! Path-bound operations produced by the compiler
//!
//! A handle captures the structural path its node had when it was rendered.
//! Paths shift after structural edits, so handles from an older render must
//! not be used once the form has been rendered again.

use std::fmt;
use std::sync::Arc;

use formloom_core::schema::field;
use formloom_core::{
    Action, Datum, EventPayload, FormError, InternalEvent, Path, Result, Update, Validator,
};
use serde_json::Value as Json;
use tracing::debug;

use crate::context::FormContext;

fn errors_of(datum: Option<&Datum>) -> Vec<String> {
    datum
        .and_then(Datum::as_list)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn errors_from(datum: &Datum) -> Vec<String> {
    errors_of(Some(datum))
}

/// Edit or remove one field
#[derive(Clone)]
pub struct FieldHandle {
    path: Path,
    name_path: String,
    validator: Option<Validator>,
    context: Arc<FormContext>,
}

impl FieldHandle {
    pub(crate) fn new(
        path: Path,
        name_path: String,
        validator: Option<Validator>,
        context: Arc<FormContext>,
    ) -> Self {
        Self {
            path,
            name_path,
            validator,
            context,
        }
    }

    /// Structural path of the field's definition
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name_path(&self) -> &str {
        &self.name_path
    }

    /// Current value in the store
    pub fn value(&self) -> Result<Datum> {
        let state = self.context.store.state();
        let definition = state
            .get_in(self.path.as_slice())
            .ok_or_else(|| FormError::PathNotFound(self.path.clone()))?;
        Ok(definition.get(field::VALUE).cloned().unwrap_or_default())
    }

    /// Replace the value and revalidate it in one batch.
    ///
    /// The update is resolved by the reducer against the value the field
    /// holds when the batch is applied, so edits queued from a listener
    /// build on each other. `field:change` and the validity signal carry
    /// the state that batch produced and are emitted once it is applied.
    pub fn edit(&self, update: impl Into<Update>) -> Result<()> {
        let mut actions = vec![Action::EditField {
            path: self.path.clone(),
            update: update.into(),
        }];
        if let Some(validate) = &self.validator {
            actions.push(Action::CheckField {
                path: self.path.clone(),
                validate: validate.clone(),
            });
        }

        debug!(name_path = %self.name_path, path = %self.path, "edit field");
        let (context, path, name_path) = (
            self.context.clone(),
            self.path.clone(),
            self.name_path.clone(),
        );
        let validated = self.validator.is_some();
        self.context.store.batch_dispatch_then(actions, move |state| {
            let definition = state.get_in(path.as_slice());
            let value = definition
                .and_then(|d| d.get(field::VALUE))
                .map_or(Json::Null, Datum::to_json);
            context.emit(
                InternalEvent::FieldChange,
                &EventPayload::field(&name_path, Some(value)),
            );
            if validated {
                let errors = errors_of(definition.and_then(|d| d.get(field::ERRORS)));
                context.report_validity(&name_path, &errors);
            }
        })?;
        Ok(())
    }

    /// Delete the field node from its parent list
    pub fn remove(&self) -> Result<()> {
        let node = self
            .path
            .parent()
            .ok_or_else(|| FormError::PathNotFound(self.path.clone()))?;

        debug!(name_path = %self.name_path, path = %node, "remove field");
        let (context, name_path) = (self.context.clone(), self.name_path.clone());
        self.context.store.batch_dispatch_then(
            vec![Action::RemoveField { path: node }],
            move |_| {
                context.emit(
                    InternalEvent::FieldRemoved,
                    &EventPayload::field(&name_path, None),
                );
                // A removed field can no longer hold the form invalid
                context.report_validity(&name_path, &[]);
            },
        )?;
        Ok(())
    }
}

impl fmt::Debug for FieldHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldHandle")
            .field("path", &format_args!("[{}]", self.path))
            .field("name_path", &self.name_path)
            .field("validated", &self.validator.is_some())
            .finish()
    }
}

/// Shared plumbing of the two repeating containers
#[derive(Clone)]
struct ContainerCore {
    path: Path,
    name_path: String,
    items_slot: usize,
    errors_slot: usize,
    validator: Option<Validator>,
    context: Arc<FormContext>,
}

impl ContainerCore {
    fn items_path(&self) -> Path {
        self.path.join(&[self.items_slot])
    }

    fn items(&self) -> Result<Json> {
        let state = self.context.store.state();
        let definition = state
            .get_in(self.path.as_slice())
            .ok_or_else(|| FormError::PathNotFound(self.path.clone()))?;
        Ok(items_of(definition.get(self.items_slot)))
    }

    /// Dispatch `structural` together with the container's validation.
    ///
    /// Events follow once the batch is applied, from the state it produced.
    fn commit(&self, structural: Action, validate: Action) -> Result<()> {
        debug!(
            name_path = %self.name_path,
            action = structural.kind(),
            "update container"
        );
        let core = self.clone();
        self.context
            .store
            .batch_dispatch_then(vec![structural, validate], move |state| {
                let definition = state.get_in(core.path.as_slice());
                let items = items_of(definition.and_then(|d| d.get(core.items_slot)));
                core.context.emit(
                    InternalEvent::FieldChange,
                    &EventPayload::field(&core.name_path, Some(items)),
                );
                if core.validator.is_some() {
                    let errors = errors_of(definition.and_then(|d| d.get(core.errors_slot)));
                    core.context.report_validity(&core.name_path, &errors);
                }
            })?;
        Ok(())
    }
}

fn items_of(list: Option<&Datum>) -> Json {
    match list {
        Some(Datum::List(items)) => Json::Array(items.iter().map(Datum::to_json).collect()),
        _ => Json::Array(Vec::new()),
    }
}

/// Operations of a `many` container
#[derive(Clone)]
pub struct ManyHandle {
    core: ContainerCore,
}

impl ManyHandle {
    pub(crate) fn new(
        path: Path,
        name_path: String,
        validator: Option<Validator>,
        context: Arc<FormContext>,
    ) -> Self {
        use formloom_core::schema::many;
        Self {
            core: ContainerCore {
                path,
                name_path,
                items_slot: many::CONTENTS,
                errors_slot: many::ERRORS,
                validator,
                context,
            },
        }
    }

    pub fn path(&self) -> &Path {
        &self.core.path
    }

    pub fn name_path(&self) -> &str {
        &self.core.name_path
    }

    /// JSON projection of the current contents
    pub fn items(&self) -> Result<Json> {
        self.core.items()
    }

    fn validate(&self) -> Action {
        Action::ValidateMany {
            path: self.core.path.clone(),
            validate: self.core.validator.clone(),
        }
    }

    /// Append a copy of the container's template
    pub fn add_child(&self) -> Result<()> {
        let add = Action::AddManyContent {
            path: self.core.path.clone(),
        };
        self.core.commit(add, self.validate())
    }

    pub fn remove_child(&self, index: usize) -> Result<()> {
        let delete = Action::DeleteManyContent {
            path: self.core.items_path().join(&[index]),
        };
        self.core.commit(delete, self.validate())
    }

    /// `order[i]` is the current index of the item that moves to `i`
    pub fn reorder_children(&self, order: Vec<usize>) -> Result<()> {
        let reorder = Action::ReorderManyContents {
            path: self.core.path.clone(),
            order,
        };
        self.core.commit(reorder, self.validate())
    }

    pub fn edit_children(&self, contents: impl Into<Update>) -> Result<()> {
        let edit = Action::EditManyContents {
            path: self.core.path.clone(),
            contents: contents.into(),
        };
        self.core.commit(edit, self.validate())
    }
}

impl fmt::Debug for ManyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManyHandle")
            .field("path", &format_args!("[{}]", self.core.path))
            .field("name_path", &self.core.name_path)
            .finish()
    }
}

/// Operations of a `many_child_forms` container
#[derive(Clone)]
pub struct ChildFormsHandle {
    core: ContainerCore,
}

impl ChildFormsHandle {
    pub(crate) fn new(
        path: Path,
        name_path: String,
        validator: Option<Validator>,
        context: Arc<FormContext>,
    ) -> Self {
        use formloom_core::schema::many_child_forms;
        Self {
            core: ContainerCore {
                path,
                name_path,
                items_slot: many_child_forms::CHILDREN,
                errors_slot: many_child_forms::ERRORS,
                validator,
                context,
            },
        }
    }

    pub fn path(&self) -> &Path {
        &self.core.path
    }

    pub fn name_path(&self) -> &str {
        &self.core.name_path
    }

    pub fn items(&self) -> Result<Json> {
        self.core.items()
    }

    fn validate(&self) -> Action {
        Action::ValidateManyChildForms {
            path: self.core.path.clone(),
            validate: self.core.validator.clone(),
        }
    }

    /// Append the child form template registered as `form_name`
    pub fn add_child_form(&self, form_name: &str) -> Result<()> {
        let form = self
            .core
            .context
            .template(form_name)
            .cloned()
            .ok_or_else(|| FormError::UnknownTemplate(form_name.to_string()))?;
        let add = Action::AddManyChildForm {
            path: self.core.path.clone(),
            form,
        };
        self.core.commit(add, self.validate())
    }

    pub fn remove_child(&self, index: usize) -> Result<()> {
        let remove = Action::RemoveManyChildForm {
            path: self.core.items_path().join(&[index]),
        };
        self.core.commit(remove, self.validate())
    }

    pub fn reorder_children(&self, order: Vec<usize>) -> Result<()> {
        let reorder = Action::ReorderManyChildForms {
            path: self.core.path.clone(),
            order,
        };
        self.core.commit(reorder, self.validate())
    }

    pub fn edit_children(&self, children: impl Into<Update>) -> Result<()> {
        let edit = Action::EditManyChildForms {
            path: self.core.path.clone(),
            children: children.into(),
        };
        self.core.commit(edit, self.validate())
    }
}

impl fmt::Debug for ChildFormsHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildFormsHandle")
            .field("path", &format_args!("[{}]", self.core.path))
            .field("name_path", &self.core.name_path)
            .finish()
    }
}
