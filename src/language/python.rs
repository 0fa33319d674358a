//! Python profile.
//!
//! Extracts: function_definition, class_definition, type_alias_statement and
//! upper-case module/class assignments. Documentation is the body docstring.

use super::{DocStrategy, LanguageProfile, NameRule};
use crate::symbol::SymbolKind;

pub fn profile() -> LanguageProfile {
    LanguageProfile::builder(DocStrategy::DocstringInBody)
        .extensions(&["py", "pyi"])
        .symbol("function_definition", SymbolKind::Function)
        .symbol("class_definition", SymbolKind::Class)
        .type_decl_named("type_alias_statement", NameRule::TypeField("left"))
        .params("function_definition", "parameters")
        .params("class_definition", "superclasses")
        .return_type("function_definition", "return_type")
        .comments(&["comment"])
        .attributes(&["decorator"])
        .containers(&["class_definition"])
        .constant("assignment", None, "left")
        .build()
}
