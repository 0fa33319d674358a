//! JavaScript profile.
//!
//! Extracts: function and generator declarations, classes, methods, arrow
//! functions bound to a variable, and upper-case `const` declarations.

use super::{DocStrategy, LanguageProfile, NameRule};
use crate::symbol::SymbolKind;

/// Arrow functions take the name of the variable they are assigned to.
pub(crate) const ARROW_NAME: NameRule = NameRule::ParentField {
    parent_kind: "variable_declarator",
    field: "name",
};

pub fn profile() -> LanguageProfile {
    LanguageProfile::builder(DocStrategy::PrecedingComments)
        .extensions(&["js", "jsx", "mjs", "cjs"])
        .symbol("function_declaration", SymbolKind::Function)
        .symbol("generator_function_declaration", SymbolKind::Function)
        .symbol("class_declaration", SymbolKind::Class)
        .symbol("method_definition", SymbolKind::Method)
        .symbol_named("arrow_function", SymbolKind::Function, ARROW_NAME)
        .params("function_declaration", "parameters")
        .params("generator_function_declaration", "parameters")
        .params("method_definition", "parameters")
        .params("arrow_function", "parameters")
        .comments(&["comment"])
        .wrappers(&["export_statement", "lexical_declaration", "variable_declaration"])
        .containers(&["class_declaration"])
        .constant("lexical_declaration", Some("variable_declarator"), "name")
        .build()
}
