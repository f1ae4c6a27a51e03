//! Actions understood by the reducer
//!
//! Every path carried by an action is structural. Field and container
//! actions address the node's `definition` list; `RemoveField`,
//! `DeleteManyContent` and `RemoveManyChildForm` address the list item to
//! delete.

use std::fmt;
use std::sync::Arc;

use serde_json::Value as Json;

use crate::datum::Datum;
use crate::path::Path;

/// Validation messages, empty when the value is valid
pub type Errors = Vec<String>;

/// A synchronous validator over the JSON projection of a value
pub type Validator = Arc<dyn Fn(&Json) -> Errors + Send + Sync>;

/// A replacement for a slot: either a fixed value or a function of the
/// previous one
#[derive(Clone)]
pub enum Update {
    Value(Datum),
    With(Arc<dyn Fn(&Datum) -> Datum + Send + Sync>),
}

impl Update {
    pub fn value(value: impl Into<Datum>) -> Self {
        Update::Value(value.into())
    }

    pub fn with<F>(f: F) -> Self
    where
        F: Fn(&Datum) -> Datum + Send + Sync + 'static,
    {
        Update::With(Arc::new(f))
    }

    /// Resolve against the previous slot content
    pub fn apply(&self, previous: &Datum) -> Datum {
        match self {
            Update::Value(value) => value.clone(),
            Update::With(f) => f(previous),
        }
    }
}

impl fmt::Debug for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Update::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Update::With(_) => f.write_str("With(<fn>)"),
        }
    }
}

impl From<Datum> for Update {
    fn from(value: Datum) -> Self {
        Update::Value(value)
    }
}

impl From<Json> for Update {
    fn from(value: Json) -> Self {
        Update::Value(Datum::from(value))
    }
}

/// A single state transition
#[derive(Clone)]
pub enum Action {
    RemoveField { path: Path },
    EditField { path: Path, update: Update },
    ValidateField { path: Path, errors: Option<Errors> },
    /// Run `validate` over the field's value as it stands at this point of
    /// the batch and store the result
    CheckField { path: Path, validate: Validator },

    AddManyContent { path: Path },
    DeleteManyContent { path: Path },
    EditManyContents { path: Path, contents: Update },
    ReorderManyContents { path: Path, order: Vec<usize> },
    ValidateMany { path: Path, validate: Option<Validator> },

    AddManyChildForm { path: Path, form: Datum },
    RemoveManyChildForm { path: Path },
    EditManyChildForms { path: Path, children: Update },
    ReorderManyChildForms { path: Path, order: Vec<usize> },
    ValidateManyChildForms { path: Path, validate: Option<Validator> },

    /// Host-defined action; the reducer leaves the state untouched
    Custom { kind: String, payload: Datum },
}

impl Action {
    /// Kebab-case name, used in logs
    pub fn kind(&self) -> &str {
        match self {
            Action::RemoveField { .. } => "remove-field",
            Action::EditField { .. } => "edit-field",
            Action::ValidateField { .. } => "validate-field",
            Action::CheckField { .. } => "check-field",
            Action::AddManyContent { .. } => "add-many-content",
            Action::DeleteManyContent { .. } => "delete-many-content",
            Action::EditManyContents { .. } => "edit-many-contents",
            Action::ReorderManyContents { .. } => "reorder-many-contents",
            Action::ValidateMany { .. } => "validate-many",
            Action::AddManyChildForm { .. } => "add-many-child-form",
            Action::RemoveManyChildForm { .. } => "remove-many-child-form",
            Action::EditManyChildForms { .. } => "edit-many-child-forms",
            Action::ReorderManyChildForms { .. } => "reorder-many-child-forms",
            Action::ValidateManyChildForms { .. } => "validate-many-child-forms",
            Action::Custom { kind, .. } => kind,
        }
    }

    /// The structural path the action targets, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            Action::RemoveField { path }
            | Action::EditField { path, .. }
            | Action::ValidateField { path, .. }
            | Action::CheckField { path, .. }
            | Action::AddManyContent { path }
            | Action::DeleteManyContent { path }
            | Action::EditManyContents { path, .. }
            | Action::ReorderManyContents { path, .. }
            | Action::ValidateMany { path, .. }
            | Action::AddManyChildForm { path, .. }
            | Action::RemoveManyChildForm { path }
            | Action::EditManyChildForms { path, .. }
            | Action::ReorderManyChildForms { path, .. }
            | Action::ValidateManyChildForms { path, .. } => Some(path),
            Action::Custom { .. } => None,
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Action");
        out.field("kind", &self.kind());
        if let Some(path) = self.path() {
            out.field("path", &format_args!("[{path}]"));
        }
        match self {
            Action::EditField { update, .. } => out.field("update", update),
            Action::ValidateField { errors, .. } => out.field("errors", errors),
            Action::EditManyContents { contents, .. } => out.field("contents", contents),
            Action::EditManyChildForms { children, .. } => out.field("children", children),
            Action::ReorderManyContents { order, .. }
            | Action::ReorderManyChildForms { order, .. } => out.field("order", order),
            Action::AddManyChildForm { form, .. } => out.field("form", form),
            Action::Custom { payload, .. } => out.field("payload", payload),
            _ => &mut out,
        };
        out.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_resolves_against_previous() {
        let previous = Datum::from(2);
        assert_eq!(Update::value("x").apply(&previous), Datum::from("x"));

        let double = Update::with(|prev| Datum::from(prev.as_i64().unwrap_or(0) * 2));
        assert_eq!(double.apply(&previous), Datum::from(4));
    }

    #[test]
    fn test_kind_names() {
        let edit = Action::EditField { path: Path::from([0, 1]), update: Update::value(1) };
        assert_eq!(edit.kind(), "edit-field");

        let custom = Action::Custom { kind: "touch".into(), payload: Datum::Null };
        assert_eq!(custom.kind(), "touch");
        assert!(custom.path().is_none());
    }

    #[test]
    fn test_debug_hides_closures() {
        let action = Action::EditField { path: Path::from([0, 1]), update: Update::with(|d| d.clone()) };
        let rendered = format!("{action:?}");
        assert!(rendered.contains("edit-field"));
        assert!(rendered.contains("With(<fn>)"));
    }
}
