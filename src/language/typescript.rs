//! TypeScript and TSX profile.
//!
//! Everything JavaScript extracts, plus abstract classes, interfaces, type
//! aliases, enums, decorators and return-type keywords.

use super::javascript::ARROW_NAME;
use super::{DocStrategy, LanguageProfile};
use crate::symbol::SymbolKind;

/// Both grammars share node kinds; only the extensions differ.
pub fn profile(extensions: &[&'static str]) -> LanguageProfile {
    let mut builder = LanguageProfile::builder(DocStrategy::PrecedingComments)
        .extensions(extensions)
        .symbol("function_declaration", SymbolKind::Function)
        .symbol("generator_function_declaration", SymbolKind::Function)
        .symbol("class_declaration", SymbolKind::Class)
        .symbol("abstract_class_declaration", SymbolKind::Class)
        .symbol("method_definition", SymbolKind::Method)
        .symbol_named("arrow_function", SymbolKind::Function, ARROW_NAME)
        .type_decl("interface_declaration")
        .type_decl("type_alias_declaration")
        .type_decl("enum_declaration");

    for kind in [
        "function_declaration",
        "generator_function_declaration",
        "method_definition",
        "arrow_function",
    ] {
        builder = builder.params(kind, "parameters").return_type(kind, "return_type");
    }

    builder
        .comments(&["comment"])
        .attributes(&["decorator"])
        .wrappers(&["export_statement", "lexical_declaration", "variable_declaration"])
        .containers(&["class_declaration", "abstract_class_declaration"])
        .constant("lexical_declaration", Some("variable_declarator"), "name")
        .build()
}
