use log::{trace, warn};
use tree_sitter::{Node, Parser};

/// Outcome of checking normalized text against the Python grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The text does not parse as Python.
    NotCode,
    /// Parses, but only as bare expressions (e.g. a column of words).
    AmbiguousAbstain,
    Code,
}

/// Statements that only Python 2 accepts; tree-sitter's grammar still parses them.
const LEGACY_STATEMENTS: [&str; 2] = ["print_statement", "exec_statement"];

/// Classify `source` as Python code, non-code, or too ambiguous to call.
///
/// REPL-derived content is never ambiguous: the prompts are evidence enough.
pub fn classify(source: &str, is_repl_code: bool) -> Verdict {
    let mut parser = Parser::new();
    let language: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
    if let Err(e) = parser.set_language(&language) {
        warn!("Failed to load the Python grammar: {e}");
        return Verdict::NotCode;
    }

    let Some(tree) = parser.parse(source, None) else {
        trace!("Parser gave up on the content.");
        return Verdict::NotCode;
    };

    let root = tree.root_node();
    if root.has_error() || contains_legacy_statement(root) || has_layout_error(root) {
        trace!("Content is not valid Python.");
        return Verdict::NotCode;
    }

    let mut cursor = root.walk();
    let only_expressions = root
        .named_children(&mut cursor)
        .filter(|node| node.kind() != "comment")
        .all(|node| is_bare_expression(&node));

    if only_expressions && !is_repl_code {
        trace!("Code consists only of expressions.");
        Verdict::AmbiguousAbstain
    } else {
        trace!("Content is valid Python.");
        Verdict::Code
    }
}

/// An `expression_statement` also wraps assignments in this grammar.
fn is_bare_expression(node: &Node) -> bool {
    if node.kind() != "expression_statement" {
        return false;
    }
    let mut cursor = node.walk();
    let bare = node
        .named_children(&mut cursor)
        .all(|child| !matches!(child.kind(), "assignment" | "augmented_assignment"));
    bare
}

fn contains_legacy_statement(node: Node) -> bool {
    if LEGACY_STATEMENTS.contains(&node.kind()) {
        return true;
    }
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(contains_legacy_statement);
    found
}

/// Indentation mistakes the grammar recovers from silently: an empty or
/// under-indented block, or sibling statements starting at different columns.
fn has_layout_error(node: Node) -> bool {
    match node.kind() {
        "module" => {
            if misaligned_statements(node) {
                return true;
            }
        }
        "block" => {
            // Blocks only belong to compound statements.
            let orphaned = node
                .parent()
                .map_or(true, |parent| matches!(parent.kind(), "module" | "block"));
            if orphaned
                || first_statement(node).is_none()
                || block_under_indented(node)
                || misaligned_statements(node)
            {
                return true;
            }
        }
        _ => {}
    }
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .any(has_layout_error);
    found
}

fn first_statement(block: Node) -> Option<Node> {
    let mut cursor = block.walk();
    let first = block
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment");
    first
}

/// A body on its own line must sit to the right of its header.
fn block_under_indented(block: Node) -> bool {
    let (Some(header), Some(first)) = (block.parent(), first_statement(block)) else {
        return false;
    };
    let header_start = header.start_position();
    let body_start = first.start_position();
    body_start.row != header_start.row && body_start.column <= header_start.column
}

/// Statements opening a new line must share a column. `;`-joined ones are skipped.
fn misaligned_statements(parent: Node) -> bool {
    let mut cursor = parent.walk();
    let mut column = None;
    let mut last_row = None;
    for child in parent.named_children(&mut cursor) {
        if child.kind() == "comment" {
            continue;
        }
        let start = child.start_position();
        if last_row == Some(start.row) {
            continue;
        }
        last_row = Some(start.row);
        match column {
            None => column = Some(start.column),
            Some(expected) if expected != start.column => return true,
            Some(_) => {}
        }
    }
    false
}
