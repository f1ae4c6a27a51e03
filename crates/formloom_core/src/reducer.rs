//! State reducer
//!
//! `reduce` is a pure `(state, action) -> state` transition. Every update
//! goes through [`Datum::set_in`]/[`Datum::delete_in`], so only the spine
//! from the root to the touched slot is rebuilt.

use std::sync::Arc;

use serde_json::Value as Json;
use tracing::{trace, warn};

use crate::action::{Action, Errors, Update, Validator};
use crate::datum::{Datum, NULL};
use crate::error::{FormError, Result};
use crate::path::Path;
use crate::schema::{field, many, many_child_forms};

/// Apply one action
pub fn reduce(state: &Datum, action: &Action) -> Result<Datum> {
    trace!(action = ?action, "reduce");

    match action {
        Action::RemoveField { path } => delete(state, path),
        Action::EditField { path, update } => {
            update_slot(state, path, field::VALUE, |previous| Ok(update.apply(previous)))
        }
        Action::ValidateField { path, errors } => match errors {
            Some(errors) => update_slot(state, path, field::ERRORS, |_| Ok(errors_datum(errors))),
            None => Ok(state.clone()),
        },
        Action::CheckField { path, validate } => {
            let value = definition(state, path)?
                .get(field::VALUE)
                .map_or(Json::Null, Datum::to_json);
            let errors = validate(&value);
            update_slot(state, path, field::ERRORS, |_| Ok(errors_datum(&errors)))
        }

        Action::AddManyContent { path } => {
            let template = definition(state, path)?
                .get(many::TEMPLATE)
                .cloned()
                .unwrap_or_else(Datum::empty_list);
            update_slot(state, path, many::CONTENTS, |contents| append(contents, template))
        }
        Action::DeleteManyContent { path } => delete(state, path),
        Action::EditManyContents { path, contents } => {
            update_slot(state, path, many::CONTENTS, |previous| Ok(contents.apply(previous)))
        }
        Action::ReorderManyContents { path, order } => {
            update_slot(state, path, many::CONTENTS, |contents| permute(contents, order))
        }
        Action::ValidateMany { path, validate } => {
            validate_items(state, path, many::CONTENTS, many::ERRORS, validate.as_ref())
        }

        Action::AddManyChildForm { path, form } => {
            update_slot(state, path, many_child_forms::CHILDREN, |children| {
                append(children, form.clone())
            })
        }
        Action::RemoveManyChildForm { path } => delete(state, path),
        Action::EditManyChildForms { path, children } => {
            update_slot(state, path, many_child_forms::CHILDREN, |previous| {
                Ok(children.apply(previous))
            })
        }
        Action::ReorderManyChildForms { path, order } => {
            update_slot(state, path, many_child_forms::CHILDREN, |children| {
                permute(children, order)
            })
        }
        Action::ValidateManyChildForms { path, validate } => validate_items(
            state,
            path,
            many_child_forms::CHILDREN,
            many_child_forms::ERRORS,
            validate.as_ref(),
        ),

        Action::Custom { .. } => Ok(state.clone()),
    }
}

/// Fold a whole batch; the first failing action aborts it
pub fn reduce_batch(state: &Datum, actions: &[Action]) -> Result<Datum> {
    actions
        .iter()
        .try_fold(state.clone(), |state, action| reduce(&state, action))
}

/// Resolve the `definition` list at `path`
fn definition<'a>(state: &'a Datum, path: &Path) -> Result<&'a [Datum]> {
    let node = state
        .get_in(path.as_slice())
        .ok_or_else(|| FormError::PathNotFound(path.clone()))?;
    node.as_list().ok_or_else(|| FormError::MalformedNode {
        path: path.clone(),
        reason: format!("expected a definition list, got {node}"),
    })
}

/// Replace one slot of the definition at `path`.
///
/// Definitions shorter than `slot` are padded with nulls, which lets
/// hand-written ASTs omit trailing empty slots.
fn update_slot<F>(state: &Datum, path: &Path, slot: usize, f: F) -> Result<Datum>
where
    F: FnOnce(&Datum) -> Result<Datum>,
{
    let items = definition(state, path)?;
    let next_value = f(items.get(slot).unwrap_or(&NULL))?;

    let mut next = items.to_vec();
    if next.len() <= slot {
        next.resize(slot + 1, Datum::Null);
    }
    next[slot] = next_value;

    state
        .set_in(path.as_slice(), Datum::List(Arc::new(next)))
        .ok_or_else(|| FormError::PathNotFound(path.clone()))
}

fn delete(state: &Datum, path: &Path) -> Result<Datum> {
    state.delete_in(path.as_slice()).ok_or_else(|| {
        warn!(path = %path, "remove rejected: no such node");
        FormError::PathNotFound(path.clone())
    })
}

fn items(list: &Datum) -> &[Datum] {
    list.as_list().unwrap_or(&[])
}

fn append(list: &Datum, item: Datum) -> Result<Datum> {
    let mut next = items(list).to_vec();
    next.push(item);
    Ok(Datum::from(next))
}

/// Rearrange `list` so that position `i` holds the item previously at
/// `order[i]`. `order` must be a permutation of `0..len`.
fn permute(list: &Datum, order: &[usize]) -> Result<Datum> {
    let current = items(list);
    if !is_permutation(order, current.len()) {
        warn!(?order, len = current.len(), "reorder rejected");
        return Err(FormError::InvalidOrder {
            order: order.to_vec(),
            len: current.len(),
        });
    }
    Ok(order.iter().map(|&index| current[index].clone()).collect())
}

fn is_permutation(order: &[usize], len: usize) -> bool {
    if order.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    order.iter().all(|&index| {
        index < len && !std::mem::replace(&mut seen[index], true)
    })
}

fn validate_items(
    state: &Datum,
    path: &Path,
    items_slot: usize,
    errors_slot: usize,
    validate: Option<&Validator>,
) -> Result<Datum> {
    let Some(validate) = validate else {
        return Ok(state.clone());
    };
    let projection = match definition(state, path)?.get(items_slot) {
        Some(Datum::List(list)) => Json::Array(list.iter().map(Datum::to_json).collect()),
        _ => Json::Array(Vec::new()),
    };
    let errors = validate(&projection);
    update_slot(state, path, errors_slot, |_| Ok(errors_datum(&errors)))
}

fn errors_datum(errors: &Errors) -> Datum {
    errors.iter().map(|e| Datum::from(e.as_str())).collect()
}

/// Convenience for callers building an `EditField` from a plain value
pub fn edit_field(path: Path, value: impl Into<Datum>) -> Action {
    Action::EditField {
        path,
        update: Update::value(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn text(name: &str, value: &str) -> Json {
        json!(["field", [name, "text", value, null, []]])
    }

    /// `[["many", [items, default, null, [], template, contents]]]`
    fn many_state(labels: &[&str]) -> Datum {
        let contents: Vec<Json> = labels.iter().map(|l| json!([text("label", l)])).collect();
        Datum::from(json!([
            ["many", ["items", "default", null, [], [text("label", "")], contents]]
        ]))
    }

    fn labels(state: &Datum) -> Vec<String> {
        items(state.get_in(&[0, 1, many::CONTENTS]).unwrap())
            .iter()
            .map(|item| item.get_in(&[0, 1, field::VALUE]).and_then(Datum::as_str).unwrap().to_string())
            .collect()
    }

    fn container() -> Path {
        Path::from([0, 1])
    }

    #[test]
    fn test_edit_field_replaces_value_only() {
        let state = Datum::from(json!([text("a", "one"), text("b", "two")]));
        let next = reduce(&state, &edit_field(Path::from([0, 1]), "changed")).unwrap();

        assert_eq!(next.get_in(&[0, 1, 2]).and_then(Datum::as_str), Some("changed"));
        assert_eq!(next.get_in(&[0, 1, 0]).and_then(Datum::as_str), Some("a"));
        assert!(state.get(1).unwrap().ptr_eq(next.get(1).unwrap()));
    }

    #[test]
    fn test_edit_field_with_function() {
        let state = Datum::from(json!([["field", ["n", "int", 2, null, []]]]));
        let action = Action::EditField {
            path: Path::from([0, 1]),
            update: Update::with(|prev| Datum::from(prev.as_i64().unwrap_or(0) + 1)),
        };
        let next = reduce(&state, &action).unwrap();
        assert_eq!(next.get_in(&[0, 1, 2]).and_then(Datum::as_i64), Some(3));
    }

    #[test]
    fn test_validate_field() {
        let state = Datum::from(json!([text("a", "")]));
        let action = Action::ValidateField {
            path: Path::from([0, 1]),
            errors: Some(vec!["is missing".into()]),
        };
        let next = reduce(&state, &action).unwrap();
        assert_eq!(next.get_in(&[0, 1, 3]).unwrap().to_json(), json!(["is missing"]));

        let skipped = Action::ValidateField { path: Path::from([0, 1]), errors: None };
        assert!(reduce(&state, &skipped).unwrap().ptr_eq(&state));
    }

    #[test]
    fn test_check_field_sees_earlier_edits_in_the_batch() {
        let state = Datum::from(json!([text("a", "")]));
        let validate: Validator = Arc::new(|value: &Json| {
            if value.as_str().map_or(true, str::is_empty) {
                vec!["must be filled".to_string()]
            } else {
                Vec::new()
            }
        });
        let path = Path::from([0, 1]);

        let check = Action::CheckField { path: path.clone(), validate: validate.clone() };
        let invalid = reduce(&state, &check).unwrap();
        assert_eq!(invalid.get_in(&[0, 1, 3]).unwrap().to_json(), json!(["must be filled"]));

        let batch = vec![
            Action::EditField {
                path: path.clone(),
                update: Update::with(|previous| Datum::from(format!("{}!", previous.as_str().unwrap_or_default()))),
            },
            Action::CheckField { path, validate },
        ];
        let valid = reduce_batch(&invalid, &batch).unwrap();
        assert_eq!(valid.get_in(&[0, 1, 2]).unwrap().to_json(), json!("!"));
        assert_eq!(valid.get_in(&[0, 1, 3]).unwrap().to_json(), json!([]));
    }

    #[test]
    fn test_remove_field() {
        let state = Datum::from(json!([text("a", "1"), text("b", "2"), text("c", "3")]));
        let next = reduce(&state, &Action::RemoveField { path: Path::from([1]) }).unwrap();
        assert_eq!(next.to_json(), json!([text("a", "1"), text("c", "3")]));
    }

    #[test]
    fn test_custom_action_is_identity() {
        let state = many_state(&["A"]);
        let action = Action::Custom { kind: "noop".into(), payload: Datum::Null };
        assert!(reduce(&state, &action).unwrap().ptr_eq(&state));
    }

    #[test]
    fn test_add_many_content_appends_template() {
        let state = many_state(&["A", "B"]);
        let next = reduce(&state, &Action::AddManyContent { path: container() }).unwrap();
        assert_eq!(labels(&next), vec!["A", "B", ""]);
    }

    #[test]
    fn test_add_many_content_to_null_contents() {
        let state = Datum::from(json!([
            ["many", ["items", "default", null, [], [text("label", "t")], null]]
        ]));
        let next = reduce(&state, &Action::AddManyContent { path: container() }).unwrap();
        assert_eq!(labels(&next), vec!["t"]);
    }

    #[test]
    fn test_delete_many_content() {
        let state = many_state(&["A", "B", "C"]);
        let path = container().join(&[many::CONTENTS, 1]);
        let next = reduce(&state, &Action::DeleteManyContent { path }).unwrap();
        assert_eq!(labels(&next), vec!["A", "C"]);
    }

    #[test]
    fn test_reorder_many_contents() {
        let state = many_state(&["A", "B", "C"]);
        let action = Action::ReorderManyContents { path: container(), order: vec![2, 0, 1] };
        let next = reduce(&state, &action).unwrap();
        assert_eq!(labels(&next), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_reorder_rejects_non_permutations() {
        let state = many_state(&["A", "B", "C"]);
        for order in [vec![0, 1], vec![0, 0, 1], vec![0, 1, 3], vec![0, 1, 2, 2]] {
            let action = Action::ReorderManyContents { path: container(), order: order.clone() };
            let err = reduce(&state, &action).unwrap_err();
            assert!(matches!(err, FormError::InvalidOrder { len: 3, .. }), "{order:?}");
        }
    }

    #[test]
    fn test_edit_many_contents() {
        let state = many_state(&["A", "B"]);
        let action = Action::EditManyContents {
            path: container(),
            contents: Update::with(|prev| items(prev).iter().rev().cloned().collect()),
        };
        let next = reduce(&state, &action).unwrap();
        assert_eq!(labels(&next), vec!["B", "A"]);
    }

    #[test]
    fn test_validate_many_sees_post_edit_contents() {
        let validate: Validator = Arc::new(|contents: &Json| {
            let len = contents.as_array().map_or(0, Vec::len);
            if len < 3 {
                vec!["too few".to_string()]
            } else {
                Vec::new()
            }
        });
        let state = many_state(&["A", "B"]);
        let check = Action::ValidateMany { path: container(), validate: Some(validate.clone()) };

        let invalid = reduce(&state, &check).unwrap();
        assert_eq!(invalid.get_in(&[0, 1, many::ERRORS]).unwrap().to_json(), json!(["too few"]));

        let batch = [Action::AddManyContent { path: container() }, check];
        let valid = reduce_batch(&invalid, &batch).unwrap();
        assert_eq!(valid.get_in(&[0, 1, many::ERRORS]).unwrap().to_json(), json!([]));
    }

    #[test]
    fn test_child_form_actions() {
        let child = |name: &str| json!(["child_form", [name, "plain", [text("f", name)], []]]);
        let state = Datum::from(json!([
            ["many_child_forms", ["blocks", "default", null, [], [child("a"), child("b")]]]
        ]));

        let added = reduce(
            &state,
            &Action::AddManyChildForm { path: container(), form: Datum::from(child("c")) },
        )
        .unwrap();
        let reordered = reduce(
            &added,
            &Action::ReorderManyChildForms { path: container(), order: vec![2, 1, 0] },
        )
        .unwrap();
        let removed = reduce(
            &reordered,
            &Action::RemoveManyChildForm { path: container().join(&[many_child_forms::CHILDREN, 1]) },
        )
        .unwrap();

        let names: Vec<_> = items(removed.get_in(&[0, 1, many_child_forms::CHILDREN]).unwrap())
            .iter()
            .map(|form| form.get_in(&[1, 0]).and_then(Datum::as_str).unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["c", "a"]);
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let state = many_state(&[]);
        let err = reduce(&state, &edit_field(Path::from([7, 1]), "x")).unwrap_err();
        assert!(matches!(err, FormError::PathNotFound(_)));
    }

    #[test]
    fn test_failing_batch_leaves_input_untouched() {
        let state = many_state(&["A"]);
        let batch = [
            Action::AddManyContent { path: container() },
            Action::ReorderManyContents { path: container(), order: vec![0] },
        ];
        assert!(reduce_batch(&state, &batch).is_err());
        assert_eq!(labels(&state), vec!["A"]);
    }
}
