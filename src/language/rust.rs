//! Rust profile.
//!
//! Extracts: functions, impl blocks (named after the implementing type),
//! structs, enums, traits, type aliases, consts and statics.

use super::{DocStrategy, LanguageProfile, NameRule};
use crate::symbol::SymbolKind;

pub fn profile() -> LanguageProfile {
    LanguageProfile::builder(DocStrategy::PrecedingComments)
        .extensions(&["rs"])
        .symbol("function_item", SymbolKind::Function)
        .symbol("function_signature_item", SymbolKind::Function)
        .symbol_named("impl_item", SymbolKind::Class, NameRule::TypeField("type"))
        .type_decl("struct_item")
        .type_decl("enum_item")
        .type_decl("trait_item")
        .type_decl("type_item")
        .params("function_item", "parameters")
        .params("function_signature_item", "parameters")
        .return_type("function_item", "return_type")
        .return_type("function_signature_item", "return_type")
        .comments(&["line_comment", "block_comment"])
        .attributes(&["attribute_item"])
        .containers(&["impl_item", "trait_item"])
        .constant("const_item", None, "name")
        .constant("static_item", None, "name")
        .build()
}
