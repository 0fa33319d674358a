//! Java profile.
//!
//! Extracts: classes, records, interfaces, enums, methods, constructors and
//! upper-case fields. Annotations live under the `modifiers` child.

use super::{DocStrategy, LanguageProfile};
use crate::symbol::SymbolKind;

pub fn profile() -> LanguageProfile {
    LanguageProfile::builder(DocStrategy::PrecedingComments)
        .extensions(&["java"])
        .symbol("class_declaration", SymbolKind::Class)
        .symbol("record_declaration", SymbolKind::Class)
        .symbol("method_declaration", SymbolKind::Method)
        .symbol("constructor_declaration", SymbolKind::Method)
        .type_decl("interface_declaration")
        .type_decl("enum_declaration")
        .params("method_declaration", "parameters")
        .params("constructor_declaration", "parameters")
        .return_type("method_declaration", "type")
        .comments(&["line_comment", "block_comment"])
        .attributes(&["marker_annotation", "annotation"])
        .attribute_holder("modifiers")
        .containers(&[
            "class_declaration",
            "record_declaration",
            "interface_declaration",
            "enum_declaration",
        ])
        .constant("field_declaration", Some("variable_declarator"), "name")
        .build()
}
