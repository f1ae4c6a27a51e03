//! AST compiler
//!
//! Walks the positional AST depth first. For every node it
//!
//! 1. reads the kind tag and dispatches to the matching visit rule
//! 2. extends the structural path (and, for addressable kinds, the name path)
//! 3. binds handles to the node's current path and registers them in the
//!    [`PathMapping`]
//! 4. calls the host handler and passes its output through untouched
//!
//! The walk itself has no side effects besides filling the mapping and
//! whatever the host handlers do.

use std::sync::Arc;

use formloom_core::datum::NULL;
use formloom_core::schema::{
    attr, child_form, compound_field, field, group, many, many_child_forms, node, section,
};
use formloom_core::{compile_attributes, AttributeValue, Datum, FormError, NodeKind, Path, Result};
use tracing::{debug, trace};

use crate::config::FormConfig;
use crate::context::FormContext;
use crate::handles::{errors_from, ChildFormsHandle, FieldHandle, ManyHandle};
use crate::mapping::{MappingEntry, PathMapping};
use crate::props::{
    AttrProps, ChildFormProps, CompoundFieldProps, FieldProps, GroupProps, ManyChildFormsProps,
    ManyProps, SectionProps,
};

/// Output of one render pass
#[derive(Debug)]
pub enum CompiledForm<R> {
    /// One entry per root node; `None` where a node rendered nothing
    Nodes(Vec<Option<R>>),
    /// The store did not hold a list of nodes
    NotATree,
}

impl<R> CompiledForm<R> {
    pub fn nodes(&self) -> Option<&[Option<R>]> {
        match self {
            CompiledForm::Nodes(nodes) => Some(nodes),
            CompiledForm::NotATree => None,
        }
    }

    pub fn into_nodes(self) -> Option<Vec<Option<R>>> {
        match self {
            CompiledForm::Nodes(nodes) => Some(nodes),
            CompiledForm::NotATree => None,
        }
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, CompiledForm::Nodes(_))
    }
}

/// A node's definition list with slot accessors
struct Definition<'d> {
    path: Path,
    items: &'d [Datum],
}

impl<'d> Definition<'d> {
    fn get(&self, slot: usize) -> &'d Datum {
        self.items.get(slot).unwrap_or(&NULL)
    }

    fn string(&self, slot: usize) -> String {
        self.get(slot).as_str().unwrap_or_default().to_string()
    }

    /// A slot that must hold a non-empty string
    fn name(&self, slot: usize, kind: NodeKind) -> Result<String> {
        match self.get(slot).as_str() {
            Some(name) if !name.is_empty() => Ok(name.to_string()),
            _ => Err(FormError::MalformedNode {
                path: self.path.clone(),
                reason: format!("{kind} node has no name"),
            }),
        }
    }

    fn attributes(&self, slot: usize) -> Result<AttributeValue> {
        compile_attributes(self.get(slot))
    }

    fn errors(&self, slot: usize) -> Vec<String> {
        errors_from(self.get(slot))
    }

    /// A list slot; `null` or absent reads as empty
    fn list(&self, slot: usize) -> Result<&'d [Datum]> {
        match self.get(slot) {
            Datum::Null => Ok(&[]),
            Datum::List(items) => Ok(items.as_slice()),
            other => Err(FormError::MalformedNode {
                path: self.path.join(&[slot]),
                reason: format!("expected a list, got {other}"),
            }),
        }
    }
}

pub(crate) struct Compiler<'a, R> {
    config: &'a FormConfig<R>,
    context: &'a Arc<FormContext>,
    mapping: &'a mut PathMapping,
}

impl<'a, R> Compiler<'a, R> {
    pub(crate) fn new(
        config: &'a FormConfig<R>,
        context: &'a Arc<FormContext>,
        mapping: &'a mut PathMapping,
    ) -> Self {
        Self {
            config,
            context,
            mapping,
        }
    }

    /// Compile the root list
    pub(crate) fn compile(&mut self, state: &Datum) -> Result<CompiledForm<R>> {
        let Some(nodes) = state.as_list() else {
            debug!("state is not a list of nodes");
            return Ok(CompiledForm::NotATree);
        };
        let root = Path::root();
        let output = self.visit_all(&root, None, nodes)?;
        debug!(nodes = output.len(), entries = self.mapping.len(), "form compiled");
        Ok(CompiledForm::Nodes(output))
    }

    fn visit_all(
        &mut self,
        parent: &Path,
        name_path: Option<&str>,
        nodes: &[Datum],
    ) -> Result<Vec<Option<R>>> {
        nodes
            .iter()
            .enumerate()
            .map(|(index, node)| self.visit(parent, name_path, node, index))
            .collect()
    }

    fn visit(
        &mut self,
        parent: &Path,
        name_path: Option<&str>,
        node: &Datum,
        index: usize,
    ) -> Result<Option<R>> {
        let path = parent.extend(index, &[node::DEFINITION]);
        let malformed = |reason: String| FormError::MalformedNode {
            path: parent.join(&[index]),
            reason,
        };

        let tag = node
            .get(node::KIND)
            .and_then(Datum::as_str)
            .ok_or_else(|| malformed(format!("expected a `[kind, definition]` node, got {node}")))?;
        let kind = NodeKind::from_tag(tag).ok_or_else(|| malformed(format!("unknown node kind `{tag}`")))?;
        let items = node
            .get(node::DEFINITION)
            .and_then(Datum::as_list)
            .ok_or_else(|| malformed(format!("{kind} node has no definition list")))?;

        trace!(%kind, path = %path, ?name_path, "visit");
        let definition = Definition { path, items };

        match kind {
            NodeKind::Field => self.visit_field(definition, name_path).map(Some),
            NodeKind::Attr => self.visit_attr(definition, name_path).map(Some),
            NodeKind::CompoundField => self.visit_compound_field(definition, name_path).map(Some),
            NodeKind::Many => self.visit_many(definition, name_path).map(Some),
            NodeKind::ManyChildForms => self.visit_many_child_forms(definition, name_path).map(Some),
            NodeKind::ChildForm => self.visit_child_form(definition, name_path).map(Some),
            NodeKind::Section => self.visit_section(definition, name_path),
            NodeKind::Group => self.visit_group(definition, name_path),
        }
    }

    fn visit_field(&mut self, definition: Definition<'_>, name_path: Option<&str>) -> Result<R> {
        let name = definition.name(field::NAME, NodeKind::Field)?;
        let type_name = definition.string(field::TYPE);
        let handler = self.config.field_handler(&type_name)?;

        let name_path = self.context.name_path(name_path, &name);
        let attributes = definition.attributes(field::ATTRIBUTES)?;
        let rules = attributes.get("validation").cloned();
        let handle = FieldHandle::new(
            definition.path.clone(),
            name_path.clone(),
            self.config.validator_for(rules.as_ref()),
            self.context.clone(),
        );
        self.mapping
            .insert(name_path.clone(), MappingEntry::Field(handle.clone()));

        Ok(handler(FieldProps {
            key: definition.path.key(),
            value: definition.get(field::VALUE).clone(),
            errors: definition.errors(field::ERRORS),
            path: definition.path,
            name,
            name_path,
            type_name,
            attributes,
            rules,
            handle,
            bus: self.context.internal_bus().clone(),
        }))
    }

    fn visit_attr(&mut self, definition: Definition<'_>, name_path: Option<&str>) -> Result<R> {
        let handler = self.config.attr_handler()?;
        let name = definition.name(attr::NAME, NodeKind::Attr)?;
        let name_path = self.context.name_path(name_path, &name);

        let children_path = definition.path.join(&[attr::CHILDREN]);
        let children = self.visit_all(
            &children_path,
            Some(name_path.as_str()),
            definition.list(attr::CHILDREN)?,
        )?;

        Ok(handler(AttrProps {
            key: definition.path.key(),
            type_name: definition.string(attr::TYPE),
            errors: definition.errors(attr::ERRORS),
            attributes: definition.attributes(attr::ATTRIBUTES)?,
            path: definition.path,
            name,
            name_path,
            children,
            bus: self.context.internal_bus().clone(),
        }))
    }

    fn visit_compound_field(
        &mut self,
        definition: Definition<'_>,
        name_path: Option<&str>,
    ) -> Result<R> {
        let handler = self.config.compound_field_handler()?;
        let children_path = definition.path.join(&[compound_field::CHILDREN]);
        let children = self.visit_all(
            &children_path,
            name_path,
            definition.list(compound_field::CHILDREN)?,
        )?;

        Ok(handler(CompoundFieldProps {
            key: definition.path.key(),
            type_name: definition.string(compound_field::TYPE),
            attributes: definition.attributes(compound_field::ATTRIBUTES)?,
            path: definition.path,
            children,
        }))
    }

    fn visit_many(&mut self, definition: Definition<'_>, name_path: Option<&str>) -> Result<R> {
        let handler = self.config.many_handler()?;
        let name = definition.name(many::NAME, NodeKind::Many)?;
        let name_path = self.context.name_path(name_path, &name);

        let contents_path = definition.path.join(&[many::CONTENTS]);
        let mut children = Vec::new();
        for (index, item) in definition.list(many::CONTENTS)?.iter().enumerate() {
            let item_path = contents_path.join(&[index]);
            let nodes = item.as_list().ok_or_else(|| FormError::MalformedNode {
                path: item_path.clone(),
                reason: format!("content item must be a list of nodes, got {item}"),
            })?;
            let item_name = self.context.name_path(Some(name_path.as_str()), index);
            children.push(self.visit_all(&item_path, Some(item_name.as_str()), nodes)?);
        }

        let attributes = definition.attributes(many::ATTRIBUTES)?;
        let rules = attributes.get("validation").cloned();
        let handle = ManyHandle::new(
            definition.path.clone(),
            name_path.clone(),
            self.config.validator_for(rules.as_ref()),
            self.context.clone(),
        );
        self.mapping
            .insert(name_path.clone(), MappingEntry::Many(handle.clone()));

        Ok(handler(ManyProps {
            key: definition.path.key(),
            type_name: definition.string(many::TYPE),
            errors: definition.errors(many::ERRORS),
            template: definition.get(many::TEMPLATE).clone(),
            path: definition.path,
            name,
            name_path,
            attributes,
            rules,
            children,
            handle,
            bus: self.context.internal_bus().clone(),
        }))
    }

    fn visit_many_child_forms(
        &mut self,
        definition: Definition<'_>,
        name_path: Option<&str>,
    ) -> Result<R> {
        let handler = self.config.many_child_forms_handler()?;
        let name = definition.name(many_child_forms::NAME, NodeKind::ManyChildForms)?;
        let name_path = self.context.name_path(name_path, &name);

        let children_path = definition.path.join(&[many_child_forms::CHILDREN]);
        let mut children = Vec::new();
        for (index, form) in definition.list(many_child_forms::CHILDREN)?.iter().enumerate() {
            let form_name = self.context.name_path(Some(name_path.as_str()), index);
            children.push(self.visit(&children_path, Some(form_name.as_str()), form, index)?);
        }

        let attributes = definition.attributes(many_child_forms::ATTRIBUTES)?;
        let rules = attributes.get("validation").cloned();
        let handle = ChildFormsHandle::new(
            definition.path.clone(),
            name_path.clone(),
            self.config.validator_for(rules.as_ref()),
            self.context.clone(),
        );
        self.mapping
            .insert(name_path.clone(), MappingEntry::ManyChildForms(handle.clone()));

        Ok(handler(ManyChildFormsProps {
            key: definition.path.key(),
            type_name: definition.string(many_child_forms::TYPE),
            errors: definition.errors(many_child_forms::ERRORS),
            path: definition.path,
            name,
            name_path,
            attributes,
            rules,
            children,
            available_forms: self.config.template_names(),
            handle,
            bus: self.context.internal_bus().clone(),
        }))
    }

    fn visit_child_form(&mut self, definition: Definition<'_>, name_path: Option<&str>) -> Result<R> {
        let handler = self.config.child_form_handler()?;
        let children_path = definition.path.join(&[child_form::CHILDREN]);
        let children = self.visit_all(
            &children_path,
            name_path,
            definition.list(child_form::CHILDREN)?,
        )?;

        Ok(handler(ChildFormProps {
            key: definition.path.key(),
            name: definition.string(child_form::NAME),
            type_name: definition.string(child_form::TYPE),
            attributes: definition.attributes(child_form::ATTRIBUTES)?,
            path: definition.path,
            children,
        }))
    }

    /// Sections and groups without children render nothing
    fn visit_section(
        &mut self,
        definition: Definition<'_>,
        name_path: Option<&str>,
    ) -> Result<Option<R>> {
        let nodes = definition.list(section::CHILDREN)?;
        if nodes.is_empty() {
            return Ok(None);
        }
        let handler = self.config.section_handler()?;
        let children_path = definition.path.join(&[section::CHILDREN]);
        let children = self.visit_all(&children_path, name_path, nodes)?;

        Ok(Some(handler(SectionProps {
            key: definition.path.key(),
            name: definition.string(section::NAME),
            type_name: definition.string(section::TYPE),
            attributes: definition.attributes(section::ATTRIBUTES)?,
            path: definition.path,
            children,
        })))
    }

    fn visit_group(
        &mut self,
        definition: Definition<'_>,
        name_path: Option<&str>,
    ) -> Result<Option<R>> {
        let nodes = definition.list(group::CHILDREN)?;
        if nodes.is_empty() {
            return Ok(None);
        }
        let handler = self.config.group_handler()?;
        let children_path = definition.path.join(&[group::CHILDREN]);
        let children = self.visit_all(&children_path, name_path, nodes)?;

        Ok(Some(handler(GroupProps {
            key: definition.path.key(),
            type_name: definition.string(group::TYPE),
            attributes: definition.attributes(group::ATTRIBUTES)?,
            path: definition.path,
            children,
        })))
    }
}
