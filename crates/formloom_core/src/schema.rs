//! Schema index
//!
//! Every AST node is a positional list `[kind, definition]`, and the meaning
//! of each position inside `definition` is fixed per kind. This module is the
//! single source of truth for those offsets; nothing else in the workspace
//! indexes a definition with a literal number.
//!
//! Changing an offset is a schema migration, not a runtime operation.

use std::fmt;
use std::str::FromStr;

/// Offsets of the `[kind, definition]` pair every node is made of
pub mod node {
    pub const KIND: usize = 0;
    pub const DEFINITION: usize = 1;
}

pub mod field {
    pub const NAME: usize = 0;
    pub const TYPE: usize = 1;
    pub const VALUE: usize = 2;
    pub const ERRORS: usize = 3;
    pub const ATTRIBUTES: usize = 4;
}

pub mod attr {
    pub const NAME: usize = 0;
    pub const TYPE: usize = 1;
    pub const ERRORS: usize = 2;
    pub const ATTRIBUTES: usize = 3;
    pub const CHILDREN: usize = 4;
}

pub mod compound_field {
    pub const TYPE: usize = 0;
    pub const ATTRIBUTES: usize = 1;
    pub const CHILDREN: usize = 2;
}

pub mod group {
    pub const TYPE: usize = 0;
    pub const ATTRIBUTES: usize = 1;
    pub const CHILDREN: usize = 2;
}

pub mod section {
    pub const NAME: usize = 0;
    pub const TYPE: usize = 1;
    pub const ATTRIBUTES: usize = 2;
    pub const CHILDREN: usize = 3;
}

pub mod many {
    pub const NAME: usize = 0;
    pub const TYPE: usize = 1;
    pub const ERRORS: usize = 2;
    pub const ATTRIBUTES: usize = 3;
    pub const TEMPLATE: usize = 4;
    pub const CONTENTS: usize = 5;
}

pub mod child_form {
    pub const NAME: usize = 0;
    pub const TYPE: usize = 1;
    pub const CHILDREN: usize = 2;
    pub const ATTRIBUTES: usize = 3;
}

pub mod many_child_forms {
    pub const NAME: usize = 0;
    pub const TYPE: usize = 1;
    pub const ERRORS: usize = 2;
    pub const ATTRIBUTES: usize = 3;
    pub const CHILDREN: usize = 4;
}

/// Offsets inside the attribute AST
pub mod attributes {
    pub const KIND: usize = 0;
    pub const DEFINITION: usize = 1;
    /// `[key, node]` pairs inside an object definition
    pub const PAIR_KEY: usize = 0;
    pub const PAIR_NODE: usize = 1;
    /// The literal inside a value definition
    pub const VALUE: usize = 0;
}

/// The closed set of structural node kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Field,
    Attr,
    CompoundField,
    Many,
    Section,
    Group,
    ChildForm,
    ManyChildForms,
}

/// Semantic slot names used across the workspace
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    Name,
    Type,
    Value,
    Errors,
    Attributes,
    Children,
    Template,
    Contents,
}

impl NodeKind {
    pub const ALL: [NodeKind; 8] = [
        NodeKind::Field,
        NodeKind::Attr,
        NodeKind::CompoundField,
        NodeKind::Many,
        NodeKind::Section,
        NodeKind::Group,
        NodeKind::ChildForm,
        NodeKind::ManyChildForms,
    ];

    /// The tag used in the AST
    pub const fn as_str(self) -> &'static str {
        match self {
            NodeKind::Field => "field",
            NodeKind::Attr => "attr",
            NodeKind::CompoundField => "compound_field",
            NodeKind::Many => "many",
            NodeKind::Section => "section",
            NodeKind::Group => "group",
            NodeKind::ChildForm => "child_form",
            NodeKind::ManyChildForms => "many_child_forms",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }

    /// Offset of `slot` within this kind's definition, if the kind has it
    pub const fn slot(self, slot: Slot) -> Option<usize> {
        use NodeKind as K;
        use Slot as S;
        let offset = match (self, slot) {
            (K::Field, S::Name) => field::NAME,
            (K::Field, S::Type) => field::TYPE,
            (K::Field, S::Value) => field::VALUE,
            (K::Field, S::Errors) => field::ERRORS,
            (K::Field, S::Attributes) => field::ATTRIBUTES,

            (K::Attr, S::Name) => attr::NAME,
            (K::Attr, S::Type) => attr::TYPE,
            (K::Attr, S::Errors) => attr::ERRORS,
            (K::Attr, S::Attributes) => attr::ATTRIBUTES,
            (K::Attr, S::Children) => attr::CHILDREN,

            (K::CompoundField, S::Type) => compound_field::TYPE,
            (K::CompoundField, S::Attributes) => compound_field::ATTRIBUTES,
            (K::CompoundField, S::Children) => compound_field::CHILDREN,

            (K::Group, S::Type) => group::TYPE,
            (K::Group, S::Attributes) => group::ATTRIBUTES,
            (K::Group, S::Children) => group::CHILDREN,

            (K::Section, S::Name) => section::NAME,
            (K::Section, S::Type) => section::TYPE,
            (K::Section, S::Attributes) => section::ATTRIBUTES,
            (K::Section, S::Children) => section::CHILDREN,

            (K::Many, S::Name) => many::NAME,
            (K::Many, S::Type) => many::TYPE,
            (K::Many, S::Errors) => many::ERRORS,
            (K::Many, S::Attributes) => many::ATTRIBUTES,
            (K::Many, S::Template) => many::TEMPLATE,
            (K::Many, S::Contents) => many::CONTENTS,

            (K::ChildForm, S::Name) => child_form::NAME,
            (K::ChildForm, S::Type) => child_form::TYPE,
            (K::ChildForm, S::Children) => child_form::CHILDREN,
            (K::ChildForm, S::Attributes) => child_form::ATTRIBUTES,

            (K::ManyChildForms, S::Name) => many_child_forms::NAME,
            (K::ManyChildForms, S::Type) => many_child_forms::TYPE,
            (K::ManyChildForms, S::Errors) => many_child_forms::ERRORS,
            (K::ManyChildForms, S::Attributes) => many_child_forms::ATTRIBUTES,
            (K::ManyChildForms, S::Children) => many_child_forms::CHILDREN,

            _ => return None,
        };
        Some(offset)
    }

    /// Slot holding the repeated items of a container kind
    pub const fn items_slot(self) -> Option<usize> {
        match self {
            NodeKind::Many => Some(many::CONTENTS),
            NodeKind::ManyChildForms => Some(many_child_forms::CHILDREN),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognised node tag
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown node kind `{}`", self.0)
    }
}

impl std::error::Error for UnknownKind {}

impl FromStr for NodeKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| UnknownKind(s.to_string()))
    }
}
