//! Go profile.
//!
//! Extracts: function_declaration, method_declaration (qualified by receiver
//! type), type_declaration and upper-case constants.

use super::{DocStrategy, LanguageProfile, NameRule};
use crate::symbol::SymbolKind;

pub fn profile() -> LanguageProfile {
    LanguageProfile::builder(DocStrategy::PrecedingComments)
        .extensions(&["go"])
        .symbol("function_declaration", SymbolKind::Function)
        .symbol("method_declaration", SymbolKind::Method)
        .type_decl_named(
            "type_declaration",
            NameRule::ChildField {
                child_kinds: &["type_spec", "type_alias"],
                field: "name",
            },
        )
        .params("function_declaration", "parameters")
        .params("method_declaration", "parameters")
        .return_type("function_declaration", "result")
        .return_type("method_declaration", "result")
        .receiver("method_declaration", "receiver")
        .comments(&["comment"])
        .constant("const_declaration", Some("const_spec"), "name")
        .build()
}
