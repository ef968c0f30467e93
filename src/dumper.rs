//! Serializes an AST back to nginx configuration text.
//!
//! Output is controlled by a [`Style`]: indentation, stable name sorting,
//! and Lua-block formatting. Dumping never mutates the AST: sorted output
//! works on a copied directive list.

use std::fmt;
use std::fs;

use crate::ast::{Block, Config, Directive, DirectiveKind, DirectiveRef};
use crate::error::{DumpError, DumpResult};
use crate::lua::{self, LuaFormatter};

/// Output style for the dumper.
#[derive(Clone)]
pub struct Style {
    /// Sort each block's directives by name (stable; the AST order is
    /// left untouched).
    pub sort_directives: bool,
    /// Emit a space before the terminating semicolon.
    pub space_before_semicolon: bool,
    /// Leading spaces for the current block level.
    pub start_indent: usize,
    /// Additional spaces per nested level.
    pub indent: usize,
    /// Emit Lua block bodies verbatim (trailing newlines trimmed).
    pub disable_lua_formatting: bool,
    /// Override for the default Lua formatter.
    pub lua_formatter: Option<LuaFormatter>,
}

impl Style {
    /// Default style: four-space nesting, no sorting.
    pub fn new() -> Self {
        Self {
            sort_directives: false,
            space_before_semicolon: false,
            start_indent: 0,
            indent: 4,
            disable_lua_formatting: false,
            lua_formatter: None,
        }
    }

    /// Flat output: no indentation at any level.
    pub fn no_indent() -> Self {
        Self {
            indent: 0,
            ..Self::new()
        }
    }

    /// Flat output with directives sorted by name.
    pub fn no_indent_sorted() -> Self {
        Self {
            sort_directives: true,
            ..Self::no_indent()
        }
    }

    /// Child style for one nesting level deeper.
    pub fn iterate(&self) -> Style {
        let mut child = self.clone();
        child.start_indent += child.indent;
        child
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Style")
            .field("sort_directives", &self.sort_directives)
            .field("space_before_semicolon", &self.space_before_semicolon)
            .field("start_indent", &self.start_indent)
            .field("indent", &self.indent)
            .field("disable_lua_formatting", &self.disable_lua_formatting)
            .field("lua_formatter", &self.lua_formatter.is_some())
            .finish()
    }
}

/// Serialize a whole config.
pub fn dump_config(config: &Config, style: &Style) -> String {
    dump_block(&config.block, style)
}

/// Serialize one block. Lua blocks route through the Lua formatting
/// pipeline; other blocks emit their directives joined by newlines, with
/// no trailing newline.
pub fn dump_block(block: &Block, style: &Style) -> String {
    if block.is_lua_block {
        return lua::dump_lua_block(block, style);
    }

    let mut directives: Vec<DirectiveRef> = block.directives.clone();
    if style.sort_directives {
        directives.sort_by(|a, b| a.borrow().name.cmp(&b.borrow().name));
    }

    let mut out = String::new();
    for (i, directive) in directives.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        dump_directive_into(&directive.borrow(), style, &mut out);
    }
    out
}

/// Serialize a single directive.
pub fn dump_directive(directive: &Directive, style: &Style) -> String {
    let mut out = String::new();
    dump_directive_into(directive, style, &mut out);
    out
}

fn dump_directive_into(directive: &Directive, style: &Style, out: &mut String) {
    let indent = " ".repeat(style.start_indent);

    for comment in &directive.comment {
        out.push_str(&indent);
        out.push_str(comment);
        out.push('\n');
    }

    out.push_str(&indent);
    out.push_str(&directive.name);

    // Parameters recorded on later source lines break onto continuation
    // lines one level deeper.
    let continuation = " ".repeat(style.start_indent + style.indent);
    let mut current_line = 0usize;
    for parameter in &directive.parameters {
        if parameter.relative_line_index > current_line {
            out.push('\n');
            out.push_str(&continuation);
            current_line = parameter.relative_line_index;
        } else {
            out.push(' ');
        }
        out.push_str(&parameter.value);
    }

    match &directive.block {
        Some(block) => {
            out.push_str(" {\n");
            let inner = dump_block(block, &style.iterate());
            if !inner.is_empty() {
                out.push_str(&inner);
                out.push('\n');
            }
            out.push_str(&indent);
            out.push('}');
        }
        None => {
            if style.space_before_semicolon {
                out.push(' ');
            }
            out.push(';');
        }
    }

    for comment in &directive.inline_comments {
        out.push(' ');
        out.push_str(&comment.value);
    }
}

/// Write a config's serialization to its recorded
/// [`file_path`](Config::file_path).
///
/// With `include_recursive`, every directive named `include` must be a
/// typed include (an unwrapped one fails with "include directive type
/// mismatch"), and each of its resolved configs is written to its own
/// recorded path.
pub fn write_config(config: &Config, style: &Style, include_recursive: bool) -> DumpResult<()> {
    fs::write(&config.file_path, dump_config(config, style))?;

    if include_recursive {
        for directive in config.find_directives("include") {
            let node = directive.borrow();
            let DirectiveKind::Include { configs, .. } = &node.kind else {
                return Err(DumpError::IncludeTypeMismatch);
            };
            for included in configs {
                write_config(included, style, include_recursive)?;
            }
        }
    }

    Ok(())
}
