//! Textual module declarations.
//!
//! One module per line:
//!
//! ```text
//! broadcaster -> a, b, c
//! %a -> b
//! &inv -> a
//! ```
//!
//! `%` declares a toggle, `&` a conjunction, and a bare name the entry relay.
//! Blank lines are skipped. Any malformed line rejects the whole input.

use pulsenet_core::graph::{GraphBuilder, GraphError, ModuleGraph};
use pulsenet_core::module::ModuleKind;

/// Separator between a module and its destination list.
pub const ARROW: &str = "->";

// ===========================================================================
// Errors
// ===========================================================================

/// Errors raised while parsing declarations. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("line {line}: expected '->'")]
    MissingArrow { line: usize },

    #[error("line {line}: unknown kind prefix '{prefix}'")]
    UnknownPrefix { line: usize, prefix: char },

    #[error("line {line}: invalid module name '{name}'")]
    InvalidName { line: usize, name: String },

    #[error("line {line}: empty destination")]
    EmptyDestination { line: usize },

    #[error("line {line}: module '{name}' is declared more than once")]
    Duplicate { line: usize, name: String },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

// ===========================================================================
// Parsing
// ===========================================================================

/// A single parsed declaration line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration<'a> {
    pub line: usize,
    pub name: &'a str,
    pub kind: ModuleKind,
    pub destinations: Vec<&'a str>,
}

/// Names are non-empty runs of ASCII letters, digits, and `_`.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse one non-blank line.
pub fn parse_line(line: usize, text: &str) -> Result<Declaration<'_>, ParseError> {
    let (head, tail) = text
        .split_once(ARROW)
        .ok_or(ParseError::MissingArrow { line })?;
    let head = head.trim();

    let (kind, name) = match head.chars().next() {
        Some('%') => (ModuleKind::Toggle, head[1..].trim_start()),
        Some('&') => (ModuleKind::Conjunction, head[1..].trim_start()),
        Some(c) if !c.is_ascii_alphanumeric() && c != '_' => {
            return Err(ParseError::UnknownPrefix { line, prefix: c });
        }
        _ => (ModuleKind::Relay, head),
    };
    if !is_valid_name(name) {
        return Err(ParseError::InvalidName {
            line,
            name: name.to_string(),
        });
    }

    let mut destinations = Vec::new();
    for dest in tail.split(',').map(str::trim) {
        if dest.is_empty() {
            return Err(ParseError::EmptyDestination { line });
        }
        if !is_valid_name(dest) {
            return Err(ParseError::InvalidName {
                line,
                name: dest.to_string(),
            });
        }
        destinations.push(dest);
    }

    Ok(Declaration {
        line,
        name,
        kind,
        destinations,
    })
}

/// Parse every declaration, skipping blank lines.
pub fn parse_declarations(text: &str) -> Result<Vec<Declaration<'_>>, ParseError> {
    text.lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| parse_line(i + 1, l))
        .collect()
}

/// Parse declarations and build the module graph.
pub fn parse_modules(text: &str) -> Result<ModuleGraph, ParseError> {
    let declarations = parse_declarations(text)?;
    let mut builder = GraphBuilder::new();
    for decl in &declarations {
        builder
            .declare(decl.name, decl.kind, &decl.destinations)
            .map_err(|e| match e {
                GraphError::DuplicateModule(name) => ParseError::Duplicate {
                    line: decl.line,
                    name,
                },
                other => ParseError::Graph(other),
            })?;
    }
    let graph = builder.build()?;
    tracing::debug!(
        declarations = declarations.len(),
        "parsed module declarations"
    );
    Ok(graph)
}

// ===========================================================================
// Tests
// ===========================================================================
