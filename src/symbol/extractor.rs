//! Generic symbol extraction.
//!
//! One algorithm walks any [`SyntaxNode`] tree and consults the language's
//! [`LanguageProfile`] for every decision: which node kinds declare symbols,
//! where names live, how documentation is found, which nodes qualify their
//! descendants. Nothing here is specific to a language.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use super::id::make_symbol_id;
use super::{Symbol, SymbolKind};
use crate::cst::SyntaxNode;
use crate::error::{IndexError, Result};
use crate::language::{ConstantRule, DocStrategy, LanguageProfile, NameRule, ProfileRegistry};

/// Maximum characters kept from a constant's declaration as its signature.
const CONSTANT_SIGNATURE_CHARS: usize = 100;

/// Receiver names that carry no search value.
const TRIVIAL_TOKENS: &[&str] = &["self", "this", "cls", "mut"];

/// Why a declaration node produced no symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The node or something below it is a syntax error.
    Erroneous,
    /// The name rule found nothing.
    UnnamedSymbol,
}

/// A declaration node that was passed over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedNode {
    pub kind: String,
    /// 1-indexed
    pub line: usize,
    pub reason: SkipReason,
}

impl SkippedNode {
    /// The error this skip stands for.
    pub fn to_error(&self) -> IndexError {
        match self.reason {
            SkipReason::UnnamedSymbol => IndexError::UnnamedSymbol {
                kind: self.kind.clone(),
                line: self.line,
            },
            SkipReason::Erroneous => IndexError::Parse(format!("{} node at line {}", self.kind, self.line)),
        }
    }
}

/// Result of extracting one file.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Flat symbols in source order
    pub symbols: Vec<Symbol>,
    pub skipped: Vec<SkippedNode>,
}

/// Turns a syntax tree into a flat list of [`Symbol`]s.
pub struct SymbolExtractor<'r> {
    registry: &'r ProfileRegistry,
}

impl<'r> SymbolExtractor<'r> {
    pub fn new(registry: &'r ProfileRegistry) -> Self {
        Self { registry }
    }

    /// Extract symbols from `root`, the tree of `source`.
    ///
    /// Fails only if `language` has no profile. Malformed or unnamed
    /// declarations are reported in [`Extraction::skipped`].
    pub fn extract<N: SyntaxNode>(
        &self,
        source: &[u8],
        file_path: &str,
        language: &str,
        root: N,
    ) -> Result<Extraction> {
        let profile = self.registry.resolve(language)?;

        let mut walk = Walk {
            profile,
            source,
            file: file_path,
            language,
            symbols: Vec::new(),
            skipped: Vec::new(),
            containers: Vec::new(),
            id_counts: HashMap::new(),
        };
        walk.visit(root);

        debug!(
            "Extracted {} symbols from {} ({} skipped)",
            walk.symbols.len(),
            file_path,
            walk.skipped.len()
        );

        Ok(Extraction {
            symbols: walk.symbols,
            skipped: walk.skipped,
        })
    }
}

/// Traversal state for one file.
struct Walk<'a> {
    profile: &'a LanguageProfile,
    source: &'a [u8],
    file: &'a str,
    language: &'a str,
    symbols: Vec<Symbol>,
    skipped: Vec<SkippedNode>,
    /// Indices into `symbols` of the enclosing containers, innermost last
    containers: Vec<usize>,
    id_counts: HashMap<String, usize>,
}

impl<'a> Walk<'a> {
    fn visit<N: SyntaxNode>(&mut self, node: N) {
        let kind = node.kind();

        if let Some(symbol_kind) = self.profile.symbol_kind(kind) {
            self.visit_declaration(node, symbol_kind);
            return;
        }

        if let Some(rule) = self.profile.constant_rule(kind).copied() {
            if !self.visit_constant(node, rule) {
                return;
            }
        }

        self.visit_children(node);
    }

    fn visit_children<N: SyntaxNode>(&mut self, node: N) {
        for child in node.named_children() {
            self.visit(child);
        }
    }

    fn visit_declaration<N: SyntaxNode>(&mut self, node: N, declared: SymbolKind) {
        if node.has_error() {
            self.skip(node, SkipReason::Erroneous);
            return;
        }

        let Some(name) = self.declared_name(node) else {
            self.skip(node, SkipReason::UnnamedSymbol);
            self.visit_children(node);
            return;
        };

        let kind = if declared == SymbolKind::Function && !self.containers.is_empty() {
            SymbolKind::Method
        } else {
            declared
        };

        let parent = self.containers.last().map(|&i| &self.symbols[i]);
        let qualified_name = match parent {
            Some(parent) => format!("{}.{}", parent.qualified_name, name),
            None => match self.receiver_type(node) {
                Some(receiver) => format!("{receiver}.{name}"),
                None => name.clone(),
            },
        };
        let parent_id = parent.map(|p| p.id.clone());

        let span = self.named_span(node);
        let leading = self.leading_run(node);
        let documentation = match self.profile.doc_strategy() {
            DocStrategy::DocstringInBody => self.body_docstring(node),
            DocStrategy::PrecedingComments => self.comment_text(&leading),
        };

        let symbol = Symbol {
            id: self.unique_id(&qualified_name),
            file: self.file.to_string(),
            name: name.clone(),
            qualified_name,
            kind,
            language: self.language.to_string(),
            signature: self.signature(node),
            documentation,
            summary: String::new(),
            attributes: self.attributes(node, &leading),
            keywords: self.keywords(node, &name),
            parent_id,
            start_line: span.start_point().row + 1,
            end_line: span.last_row() + 1,
            byte_offset: span.start_byte(),
            byte_length: span.end_byte() - span.start_byte(),
        };

        let index = self.symbols.len();
        self.symbols.push(symbol);

        // Function bodies hold locals, not symbols.
        if kind.is_callable() {
            return;
        }

        let is_container = self.profile.is_container(node.kind());
        if is_container {
            self.containers.push(index);
        }
        self.visit_children(node);
        if is_container {
            self.containers.pop();
        }
    }

    /// Emit constants declared by `node`. Returns whether to descend.
    fn visit_constant<N: SyntaxNode>(&mut self, node: N, rule: ConstantRule) -> bool {
        let declarators: Vec<N> = match rule.declarator_kind {
            Some(kind) => node
                .named_children()
                .into_iter()
                .filter(|c| c.kind() == kind)
                .collect(),
            None => vec![node],
        };

        let mut found = Vec::new();
        for declarator in &declarators {
            let Some(name_node) = declarator.child_by_field_name(rule.name_field) else {
                continue;
            };
            let name = name_node.text(self.source).trim().to_string();
            if !is_constant_name(&name) {
                continue;
            }
            // `const HANDLER = () => ...` is a function, not a constant.
            let value_declares = declarator
                .child_by_field_name("value")
                .is_some_and(|v| self.profile.symbol_kind(v.kind()).is_some());
            if value_declares {
                continue;
            }
            found.push((name, *declarator));
        }

        if found.is_empty() {
            return true;
        }
        if node.has_error() {
            self.skip(node, SkipReason::Erroneous);
            return false;
        }

        let single = declarators.len() <= 1;
        for (name, declarator) in found {
            // A lone declarator owns the whole statement; grouped ones own their own span.
            let span = if single { node } else { declarator };
            let parent = self.containers.last().map(|&i| &self.symbols[i]);
            let qualified_name = match parent {
                Some(parent) => format!("{}.{}", parent.qualified_name, name),
                None => name.clone(),
            };
            let parent_id = parent.map(|p| p.id.clone());
            let leading = self.leading_run(node);
            let documentation = match self.profile.doc_strategy() {
                DocStrategy::PrecedingComments => self.comment_text(&leading),
                DocStrategy::DocstringInBody => String::new(),
            };

            let symbol = Symbol {
                id: self.unique_id(&qualified_name),
                file: self.file.to_string(),
                keywords: split_identifier(&name),
                name,
                qualified_name,
                kind: SymbolKind::Constant,
                language: self.language.to_string(),
                signature: span
                    .text(self.source)
                    .trim()
                    .chars()
                    .take(CONSTANT_SIGNATURE_CHARS)
                    .collect(),
                documentation,
                summary: String::new(),
                attributes: Vec::new(),
                parent_id,
                start_line: span.start_point().row + 1,
                end_line: span.last_row() + 1,
                byte_offset: span.start_byte(),
                byte_length: span.end_byte() - span.start_byte(),
            };
            self.symbols.push(symbol);
        }

        true
    }

    fn skip<N: SyntaxNode>(&mut self, node: N, reason: SkipReason) {
        let skipped = SkippedNode {
            kind: node.kind().to_string(),
            line: node.start_point().row + 1,
            reason,
        };
        debug!("Skipping declaration in {}: {}", self.file, skipped.to_error());
        self.skipped.push(skipped);
    }

    /// Base ID, suffixed `~2`, `~3`, ... for repeats within the file.
    fn unique_id(&mut self, qualified_name: &str) -> String {
        let base = make_symbol_id(self.file, qualified_name);
        let count = self.id_counts.entry(base.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            base
        } else {
            format!("{base}~{count}")
        }
    }

    fn declared_name<N: SyntaxNode>(&self, node: N) -> Option<String> {
        let name = match self.profile.name_rule(node.kind())? {
            NameRule::Field(field) => node.child_by_field_name(field)?.text(self.source).trim().to_string(),
            NameRule::TypeField(field) => {
                base_type_name(&node.child_by_field_name(field)?.text(self.source))?
            }
            NameRule::ChildField { child_kinds, field } => node
                .named_children()
                .into_iter()
                .find(|c| child_kinds.contains(&c.kind()))?
                .child_by_field_name(field)?
                .text(self.source)
                .trim()
                .to_string(),
            NameRule::ParentField { parent_kind, field } => {
                let parent = node.parent().filter(|p| p.kind() == parent_kind)?;
                parent.child_by_field_name(field)?.text(self.source).trim().to_string()
            }
        };

        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }

    /// Receiver type used to qualify a method declared outside a container.
    fn receiver_type<N: SyntaxNode>(&self, node: N) -> Option<String> {
        let field = self.profile.receiver_field(node.kind())?;
        let receiver = node.child_by_field_name(field)?;

        let type_node = receiver.child_by_field_name("type").or_else(|| {
            receiver
                .named_children()
                .into_iter()
                .find_map(|c| c.child_by_field_name("type"))
        });

        match type_node {
            Some(t) => base_type_name(&t.text(self.source)),
            None => {
                let text = receiver.text(self.source);
                let inner = text.trim().trim_start_matches('(').trim_end_matches(')');
                base_type_name(inner.split_whitespace().last()?)
            }
        }
    }

    /// Node whose span a declaration covers: the naming parent for
    /// `add = () => ...`, else the declaration itself.
    fn named_span<N: SyntaxNode>(&self, node: N) -> N {
        match self.profile.name_rule(node.kind()) {
            Some(NameRule::ParentField { parent_kind, .. }) => {
                node.parent().filter(|p| p.kind() == parent_kind).unwrap_or(node)
            }
            _ => node,
        }
    }

    /// Declaration header: span start up to the body, else the first line.
    fn signature<N: SyntaxNode>(&self, node: N) -> String {
        let start = self.named_span(node).start_byte();

        let end = match node.child_by_field_name(self.profile.body_field()) {
            Some(body) => body.start_byte(),
            None => {
                let limit = node.end_byte().min(self.source.len());
                self.source[start.min(limit)..limit]
                    .iter()
                    .position(|&b| b == b'\n')
                    .map_or(limit, |offset| start + offset)
            }
        };

        let start = start.min(self.source.len());
        let end = end.clamp(start, self.source.len());
        clean_signature(&String::from_utf8_lossy(&self.source[start..end]))
    }

    /// The node comments and attributes attach to: the declaration itself,
    /// or the outermost wrapper statement around it.
    fn anchor<N: SyntaxNode>(&self, node: N) -> N {
        let mut anchor = self.named_span(node);
        while let Some(parent) = anchor.parent() {
            if !self.profile.is_wrapper(parent.kind()) {
                break;
            }
            anchor = parent;
        }
        anchor
    }

    /// Comment and attribute siblings directly above the declaration, in
    /// source order. The run stops at the first gap line or other node.
    fn leading_run<N: SyntaxNode>(&self, node: N) -> Vec<N> {
        let mut run = Vec::new();
        let mut current = self.anchor(node);
        let mut next_row = current.start_point().row;

        while let Some(prev) = current.prev_named_sibling() {
            let kind = prev.kind();
            if !self.profile.is_comment(kind) && !self.profile.is_attribute(kind) {
                break;
            }
            if prev.last_row() + 1 < next_row {
                break;
            }
            next_row = prev.start_point().row;
            run.push(prev);
            current = prev;
        }

        run.reverse();
        run
    }

    fn comment_text<N: SyntaxNode>(&self, run: &[N]) -> String {
        let text = run
            .iter()
            .filter(|n| self.profile.is_comment(n.kind()))
            .map(|n| n.text(self.source).into_owned())
            .collect::<Vec<_>>()
            .join("\n");
        clean_comment_markers(&text)
    }

    /// First statement of the body, when it is a bare string literal.
    fn body_docstring<N: SyntaxNode>(&self, node: N) -> String {
        let Some(body) = node.child_by_field_name(self.profile.body_field()) else {
            return String::new();
        };
        let Some(first) = body
            .named_children()
            .into_iter()
            .find(|c| !self.profile.is_comment(c.kind()))
        else {
            return String::new();
        };

        let literal = if is_string_kind(first.kind()) {
            Some(first)
        } else if first.kind() == "expression_statement" {
            first
                .named_children()
                .into_iter()
                .next()
                .filter(|c| is_string_kind(c.kind()))
        } else {
            None
        };

        literal
            .map(|l| strip_quotes(&l.text(self.source)))
            .unwrap_or_default()
    }

    fn attributes<N: SyntaxNode>(&self, node: N, leading: &[N]) -> Vec<String> {
        let mut attributes: Vec<String> = leading
            .iter()
            .filter(|n| self.profile.is_attribute(n.kind()))
            .map(|n| n.text(self.source).trim().to_string())
            .collect();

        for child in node.named_children() {
            if self.profile.is_attribute(child.kind()) {
                attributes.push(child.text(self.source).trim().to_string());
            } else if self.profile.attribute_holder() == Some(child.kind()) {
                attributes.extend(
                    child
                        .named_children()
                        .into_iter()
                        .filter(|c| self.profile.is_attribute(c.kind()))
                        .map(|c| c.text(self.source).trim().to_string()),
                );
            }
        }

        attributes
    }

    fn keywords<N: SyntaxNode>(&self, node: N, name: &str) -> Vec<String> {
        let mut keywords = split_identifier(name);

        let fields = [
            self.profile.param_field(node.kind()),
            self.profile.return_type_field(node.kind()),
        ];
        for field in fields.into_iter().flatten() {
            if let Some(child) = node.child_by_field_name(field) {
                keywords.extend(identifier_tokens(&child.text(self.source)));
            }
        }

        keywords.retain(|k| !TRIVIAL_TOKENS.contains(&k.as_str()));
        keywords.sort();
        keywords.dedup();
        keywords
    }
}

fn is_string_kind(kind: &str) -> bool {
    matches!(kind, "string" | "concatenated_string")
}

/// Upper-case convention: at least one letter, only `A-Z`, `0-9` and `_`.
pub fn is_constant_name(name: &str) -> bool {
    name.chars().any(|c| c.is_ascii_uppercase())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Trim and drop trailing `{`, `:`, `;` and whitespace.
pub fn clean_signature(text: &str) -> String {
    text.trim()
        .trim_end_matches(|c: char| matches!(c, '{' | ':' | ';') || c.is_whitespace())
        .to_string()
}

/// Strip string prefixes and quotes from a docstring literal.
pub fn strip_quotes(literal: &str) -> String {
    let text = literal
        .trim()
        .trim_start_matches(|c: char| matches!(c, 'r' | 'R' | 'u' | 'U' | 'b' | 'B' | 'f' | 'F'));

    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if text.len() >= 2 * quote.len() && text.starts_with(quote) && text.ends_with(quote) {
            let inner = &text[quote.len()..text.len() - quote.len()];
            return dedent(inner);
        }
    }
    text.to_string()
}

fn dedent(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Remove comment markers line by line and join with `\n`.
pub fn clean_comment_markers(text: &str) -> String {
    const PREFIXES: [&str; 7] = ["///", "//!", "//", "/**", "/*!", "/*", "*"];

    text.lines()
        .map(|line| {
            let mut line = line.trim();
            if let Some(stripped) = line.strip_suffix("*/") {
                line = stripped.trim_end();
            }
            if let Some(prefix) = PREFIXES.iter().find(|p| line.starts_with(**p)) {
                line = &line[prefix.len()..];
            }
            line.trim()
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Base name of a type expression: `&mut Foo<T>` and `*pkg.Server[T]` give
/// `Foo` and `Server`.
pub fn base_type_name(text: &str) -> Option<String> {
    let mut s = text.trim();
    loop {
        let t = s.trim_start_matches(|c: char| c == '&' || c == '*').trim_start();
        let t = t
            .strip_prefix("mut ")
            .or_else(|| t.strip_prefix("dyn "))
            .unwrap_or(t)
            .trim_start();
        if t == s {
            break;
        }
        s = t;
    }

    let end = s
        .find(|c: char| matches!(c, '<' | '[' | '(') || c.is_whitespace())
        .unwrap_or(s.len());
    let path = &s[..end];
    let base = path.rsplit("::").next()?.rsplit('.').next()?;

    if base.is_empty() {
        None
    } else {
        Some(base.to_string())
    }
}

/// Lowercase sub-words of an identifier, split on `_` and case changes.
/// `parseHTTPRequest` gives `parse`, `http`, `request`.
pub fn split_identifier(name: &str) -> Vec<String> {
    let mut words = Vec::new();

    for segment in name.split(|c: char| !c.is_alphanumeric()) {
        let chars: Vec<char> = segment.chars().collect();
        let mut current = String::new();
        for (i, &c) in chars.iter().enumerate() {
            let boundary = i > 0 && c.is_uppercase() && {
                let prev = chars[i - 1];
                let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower)
            };
            if boundary && !current.is_empty() {
                words.push(current.to_lowercase());
                current.clear();
            }
            current.push(c);
        }
        if !current.is_empty() {
            words.push(current.to_lowercase());
        }
    }

    words.retain(|w| !w.is_empty());
    words
}

/// Identifier-like tokens (two or more characters) of a parameter or type list.
fn identifier_tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| t.len() > 1 && t.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_'))
        .map(|t| t.to_lowercase())
        .collect()
}
