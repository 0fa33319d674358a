//! Declarative per-language extraction rules.

use std::collections::HashMap;

use crate::symbol::SymbolKind;

/// How documentation is located for a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocStrategy {
    /// First statement of the body is a bare string literal (Python).
    DocstringInBody,
    /// Run of comment nodes immediately before the declaration.
    PrecedingComments,
}

/// Where a declaration's name lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRule {
    /// Text of a field on the node.
    Field(&'static str),
    /// Text of a field naming a type, reduced to its base name
    /// (`&mut Foo<T>` becomes `Foo`).
    TypeField(&'static str),
    /// Field of the first child whose kind is one of `child_kinds`.
    ChildField {
        child_kinds: &'static [&'static str],
        field: &'static str,
    },
    /// Field of the parent, when the parent is of `parent_kind`.
    ParentField {
        parent_kind: &'static str,
        field: &'static str,
    },
}

/// Pattern recognising constant declarations.
///
/// The node of `node_kind` is the declaration. When `declarator_kind` is set
/// every child of that kind is inspected for `name_field`; otherwise the field
/// is read from the declaration itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantRule {
    pub node_kind: &'static str,
    pub declarator_kind: Option<&'static str>,
    pub name_field: &'static str,
}

/// Immutable extraction rules for one language.
#[derive(Debug, Clone)]
pub struct LanguageProfile {
    pub(crate) extensions: Vec<&'static str>,
    pub(crate) symbol_kinds: HashMap<&'static str, SymbolKind>,
    pub(crate) name_rules: HashMap<&'static str, NameRule>,
    pub(crate) param_fields: HashMap<&'static str, &'static str>,
    pub(crate) return_type_fields: HashMap<&'static str, &'static str>,
    pub(crate) receiver_fields: HashMap<&'static str, &'static str>,
    pub(crate) body_field: &'static str,
    pub(crate) doc_strategy: DocStrategy,
    pub(crate) comment_kinds: Vec<&'static str>,
    pub(crate) attribute_kinds: Vec<&'static str>,
    pub(crate) attribute_holder: Option<&'static str>,
    pub(crate) wrapper_kinds: Vec<&'static str>,
    pub(crate) container_kinds: Vec<&'static str>,
    pub(crate) constant_rules: Vec<ConstantRule>,
}

impl LanguageProfile {
    pub fn builder(doc_strategy: DocStrategy) -> LanguageProfileBuilder {
        LanguageProfileBuilder {
            profile: LanguageProfile {
                extensions: Vec::new(),
                symbol_kinds: HashMap::new(),
                name_rules: HashMap::new(),
                param_fields: HashMap::new(),
                return_type_fields: HashMap::new(),
                receiver_fields: HashMap::new(),
                body_field: "body",
                doc_strategy,
                comment_kinds: Vec::new(),
                attribute_kinds: Vec::new(),
                attribute_holder: None,
                wrapper_kinds: Vec::new(),
                container_kinds: Vec::new(),
                constant_rules: Vec::new(),
            },
        }
    }

    /// Symbol kind declared by nodes of `node_kind`, if any.
    pub fn symbol_kind(&self, node_kind: &str) -> Option<SymbolKind> {
        self.symbol_kinds.get(node_kind).copied()
    }

    pub fn name_rule(&self, node_kind: &str) -> Option<NameRule> {
        self.name_rules.get(node_kind).copied()
    }

    pub fn param_field(&self, node_kind: &str) -> Option<&'static str> {
        self.param_fields.get(node_kind).copied()
    }

    pub fn return_type_field(&self, node_kind: &str) -> Option<&'static str> {
        self.return_type_fields.get(node_kind).copied()
    }

    pub fn receiver_field(&self, node_kind: &str) -> Option<&'static str> {
        self.receiver_fields.get(node_kind).copied()
    }

    pub fn body_field(&self) -> &'static str {
        self.body_field
    }

    pub fn doc_strategy(&self) -> DocStrategy {
        self.doc_strategy
    }

    pub fn is_comment(&self, node_kind: &str) -> bool {
        self.comment_kinds.contains(&node_kind)
    }

    pub fn is_attribute(&self, node_kind: &str) -> bool {
        self.attribute_kinds.contains(&node_kind)
    }

    pub fn attribute_holder(&self) -> Option<&'static str> {
        self.attribute_holder
    }

    /// Statements that wrap a declaration without being one themselves
    /// (`export_statement`). Leading comments attach to the outermost wrapper.
    pub fn is_wrapper(&self, node_kind: &str) -> bool {
        self.wrapper_kinds.contains(&node_kind)
    }

    pub fn is_container(&self, node_kind: &str) -> bool {
        self.container_kinds.contains(&node_kind)
    }

    pub fn constant_rule(&self, node_kind: &str) -> Option<&ConstantRule> {
        self.constant_rules.iter().find(|r| r.node_kind == node_kind)
    }

    /// File extensions (without the dot) this profile claims.
    pub fn extensions(&self) -> &[&'static str] {
        &self.extensions
    }
}

/// Builder for [`LanguageProfile`]; the built profile is never mutated.
pub struct LanguageProfileBuilder {
    profile: LanguageProfile,
}

impl LanguageProfileBuilder {
    pub fn extensions(mut self, extensions: &[&'static str]) -> Self {
        self.profile.extensions.extend_from_slice(extensions);
        self
    }

    /// Declare a symbol node kind named through its `name` field.
    pub fn symbol(self, node_kind: &'static str, kind: SymbolKind) -> Self {
        self.symbol_named(node_kind, kind, NameRule::Field("name"))
    }

    pub fn symbol_named(mut self, node_kind: &'static str, kind: SymbolKind, rule: NameRule) -> Self {
        self.profile.symbol_kinds.insert(node_kind, kind);
        self.profile.name_rules.insert(node_kind, rule);
        self
    }

    /// Declare a type or type-alias declaration named through `name`.
    pub fn type_decl(self, node_kind: &'static str) -> Self {
        self.symbol_named(node_kind, SymbolKind::Type, NameRule::Field("name"))
    }

    pub fn type_decl_named(self, node_kind: &'static str, rule: NameRule) -> Self {
        self.symbol_named(node_kind, SymbolKind::Type, rule)
    }

    pub fn params(mut self, node_kind: &'static str, field: &'static str) -> Self {
        self.profile.param_fields.insert(node_kind, field);
        self
    }

    pub fn return_type(mut self, node_kind: &'static str, field: &'static str) -> Self {
        self.profile.return_type_fields.insert(node_kind, field);
        self
    }

    pub fn receiver(mut self, node_kind: &'static str, field: &'static str) -> Self {
        self.profile.receiver_fields.insert(node_kind, field);
        self
    }

    pub fn body_field(mut self, field: &'static str) -> Self {
        self.profile.body_field = field;
        self
    }

    pub fn comments(mut self, kinds: &[&'static str]) -> Self {
        self.profile.comment_kinds.extend_from_slice(kinds);
        self
    }

    pub fn attributes(mut self, kinds: &[&'static str]) -> Self {
        self.profile.attribute_kinds.extend_from_slice(kinds);
        self
    }

    pub fn attribute_holder(mut self, kind: &'static str) -> Self {
        self.profile.attribute_holder = Some(kind);
        self
    }

    pub fn wrappers(mut self, kinds: &[&'static str]) -> Self {
        self.profile.wrapper_kinds.extend_from_slice(kinds);
        self
    }

    pub fn containers(mut self, kinds: &[&'static str]) -> Self {
        self.profile.container_kinds.extend_from_slice(kinds);
        self
    }

    pub fn constant(
        mut self,
        node_kind: &'static str,
        declarator_kind: Option<&'static str>,
        name_field: &'static str,
    ) -> Self {
        self.profile.constant_rules.push(ConstantRule {
            node_kind,
            declarator_kind,
            name_field,
        });
        self
    }

    pub fn build(self) -> LanguageProfile {
        self.profile
    }
}
