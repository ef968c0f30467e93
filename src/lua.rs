//! Lua-block dumping and the `#`-comment rewriter.
//!
//! nginx configurations allow `#` line comments inside `*_by_lua_block`
//! bodies, but Lua formatters reject them: `#` is Lua's length operator.
//! Before the formatter runs, `#` comments are rewritten to sentinel `--`
//! comments; afterwards the sentinels are restored to `# `. The rewriter
//! must leave every other `#` alone, which requires tracking Lua lexical
//! context: quoted strings (with escapes), long-bracket strings, operator
//! positions, and keyword positions like `return #arr`.
//!
//! The default formatter parses the chunk with `full_moon` and re-emits
//! its lossless token stream, so malformed Lua surfaces as an error and
//! the dumper falls back to the original code. Callers can override it
//! via [`Style::lua_formatter`]; any panic at the formatter boundary is
//! caught and converted to an error.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::ast::Block;
use crate::dumper::Style;
use crate::error::DumpError;

/// Replacement for the default Lua formatter: receives the (already
/// sentinel-rewritten) code and the active style, returns formatted code.
pub type LuaFormatter = Arc<dyn Fn(&str, &Style) -> Result<String, DumpError> + Send + Sync>;

const HASH_COMMENT_SENTINEL: &str = "__NGINX_CONF_HASH_COMMENT__";

static HASH_COMMENT_RESTORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"--\s*{HASH_COMMENT_SENTINEL}\s*"))
        .expect("sentinel restore pattern is valid")
});

/// Serialize a Lua block's body.
///
/// Formatting failures fall back to the original code (trailing newlines
/// trimmed) so a malformed block never aborts a dump.
pub fn dump_lua_block(block: &Block, style: &Style) -> String {
    let lua_code = block.literal_code.as_str();
    if lua_code.is_empty() {
        return String::new();
    }

    if style.disable_lua_formatting {
        return lua_code.trim_end_matches('\n').to_string();
    }

    let normalized = dedent_continuation_lines(lua_code);
    let converted = convert_hash_comments(&normalized);
    let formatted = match format_lua_code(&converted, style) {
        Ok(formatted) => formatted,
        // Fall back to the original code to preserve semantics when the
        // formatter cannot parse it.
        Err(_) => return lua_code.trim_end_matches('\n').to_string(),
    };

    let restored = restore_hash_comments(&formatted);
    indent_lua_code(&restored, style.start_indent)
        .trim_end_matches('\n')
        .to_string()
}

fn format_lua_code(lua_code: &str, style: &Style) -> Result<String, DumpError> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| match &style.lua_formatter {
        Some(formatter) => formatter(lua_code, style),
        None => default_format(lua_code),
    }));
    match outcome {
        Ok(result) => result,
        Err(payload) => Err(DumpError::LuaFormatterPanic(panic_message(payload.as_ref()))),
    }
}

fn default_format(lua_code: &str) -> Result<String, DumpError> {
    let ast = full_moon::parse(lua_code).map_err(|err| DumpError::LuaFormat(err.to_string()))?;
    Ok(full_moon::print(&ast))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Removes the shared leading whitespace of continuation lines.
///
/// The captured block is trimmed as a whole, which strips the first
/// line's indentation but leaves the rest at their source depth; aligning
/// them with the first line keeps re-dumping stable, since the dumper
/// re-indents the whole body by the block's own nesting level.
fn dedent_continuation_lines(code: &str) -> String {
    let mut lines = code.split('\n');
    let Some(first) = lines.next() else {
        return code.to_string();
    };
    let rest: Vec<&str> = lines.collect();

    let min_indent = rest
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);
    if min_indent == 0 {
        return code.to_string();
    }

    let mut out = String::from(first);
    for line in rest {
        out.push('\n');
        if !line.trim().is_empty() {
            out.push_str(&line[min_indent..]);
        }
    }
    out
}

fn indent_lua_code(code: &str, indent: usize) -> String {
    if indent == 0 {
        return code.to_string();
    }

    let prefix = " ".repeat(indent);
    let mut out = String::new();
    for (i, line) in code.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if !line.is_empty() {
            out.push_str(&prefix);
            out.push_str(line);
        }
    }
    out
}

fn convert_hash_comments(code: &str) -> String {
    let mut out = String::new();
    for line in code.split_inclusive('\n') {
        out.push_str(&convert_hash_comments_in_line(line));
    }
    out
}

fn convert_hash_comments_in_line(line: &str) -> String {
    let Some(comment_idx) = find_hash_comment_index(line) else {
        return line.to_string();
    };

    let mut out = String::new();
    out.push_str(&line[..comment_idx]);
    out.push_str("-- ");
    out.push_str(HASH_COMMENT_SENTINEL);

    // Keep whatever followed the `#`, separated by one space when needed.
    let rest = &line[comment_idx + 1..];
    if !rest.is_empty() {
        let first = rest.as_bytes()[0];
        if !matches!(first, b' ' | b'\t' | b'\n' | b'\r') {
            out.push(' ');
        }
        out.push_str(rest);
    }
    out
}

fn restore_hash_comments(code: &str) -> String {
    let restored = HASH_COMMENT_RESTORE.replace_all(code, "# ").into_owned();
    let restored = restored.replace("# \n", "#\n");
    match restored.strip_suffix("# ") {
        Some(stripped) => stripped.to_string(),
        None => restored,
    }
}

/// Byte index of the `#` starting a comment on this line, if any.
fn find_hash_comment_index(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut escaped = false;
    let mut long_bracket_level: Option<usize> = None;

    let mut i = 0;
    while i < bytes.len() {
        let ch = bytes[i];

        if let Some(level) = long_bracket_level {
            if let Some(width) = long_bracket_close_width(bytes, i, level) {
                long_bracket_level = None;
                i += width;
            } else {
                i += 1;
            }
            continue;
        }

        if in_single_quote {
            if escaped {
                escaped = false;
            } else if ch == b'\\' {
                escaped = true;
            } else if ch == b'\'' {
                in_single_quote = false;
            }
            i += 1;
            continue;
        }

        if in_double_quote {
            if escaped {
                escaped = false;
            } else if ch == b'\\' {
                escaped = true;
            } else if ch == b'"' {
                in_double_quote = false;
            }
            i += 1;
            continue;
        }

        if ch == b'\'' {
            in_single_quote = true;
            i += 1;
            continue;
        }
        if ch == b'"' {
            in_double_quote = true;
            i += 1;
            continue;
        }

        if let Some((level, width)) = long_bracket_open_width(bytes, i) {
            long_bracket_level = Some(level);
            i += width;
            continue;
        }

        if ch == b'#' && is_hash_comment_start(line, i) {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn is_hash_comment_start(line: &str, idx: usize) -> bool {
    let bytes = line.as_bytes();

    let Some(prev) = previous_non_space(bytes, idx) else {
        // Nothing before the hash on this line.
        return true;
    };

    let Some(next) = next_non_space(bytes, idx + 1) else {
        // Nothing after it either.
        return true;
    };

    if idx + 1 < bytes.len() && is_space(bytes[idx + 1]) {
        return true;
    }

    if is_operator_byte(prev) {
        return false;
    }

    if is_lua_keyword(&previous_word(line, idx)) {
        return false;
    }

    // An inline comment follows an expression and is separated by
    // whitespace; a length operator's operand follows immediately.
    if idx > 0 && is_space(bytes[idx - 1]) && !is_operator_byte(next) {
        return true;
    }

    false
}

fn previous_non_space(bytes: &[u8], idx: usize) -> Option<u8> {
    bytes[..idx].iter().rev().copied().find(|b| !is_space(*b))
}

fn next_non_space(bytes: &[u8], idx: usize) -> Option<u8> {
    bytes[idx.min(bytes.len())..]
        .iter()
        .copied()
        .find(|b| !is_space(*b))
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

fn is_operator_byte(ch: u8) -> bool {
    matches!(
        ch,
        b'=' | b'+'
            | b'-'
            | b'*'
            | b'/'
            | b'%'
            | b'^'
            | b'#'
            | b'<'
            | b'>'
            | b'~'
            | b'&'
            | b'|'
            | b':'
            | b','
            | b'('
            | b'{'
            | b'['
    )
}

fn previous_word(line: &str, idx: usize) -> String {
    let bytes = line.as_bytes();
    let mut j = idx;
    while j > 0 && is_space(bytes[j - 1]) {
        j -= 1;
    }
    let end = j;
    while j > 0 && is_word_byte(bytes[j - 1]) {
        j -= 1;
    }
    String::from_utf8_lossy(&bytes[j..end]).to_ascii_lowercase()
}

fn is_word_byte(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_'
}

fn is_lua_keyword(word: &str) -> bool {
    matches!(
        word,
        "if" | "then"
            | "do"
            | "while"
            | "repeat"
            | "until"
            | "for"
            | "in"
            | "function"
            | "local"
            | "return"
            | "and"
            | "or"
            | "not"
            | "elseif"
            | "else"
    )
}

fn long_bracket_open_width(bytes: &[u8], idx: usize) -> Option<(usize, usize)> {
    if bytes.get(idx) != Some(&b'[') {
        return None;
    }
    let mut j = idx + 1;
    let mut level = 0;
    while bytes.get(j) == Some(&b'=') {
        level += 1;
        j += 1;
    }
    if bytes.get(j) == Some(&b'[') {
        Some((level, j - idx + 1))
    } else {
        None
    }
}

fn long_bracket_close_width(bytes: &[u8], idx: usize, level: usize) -> Option<usize> {
    if bytes.get(idx) != Some(&b']') {
        return None;
    }
    let mut j = idx + 1;
    let mut current_level = 0;
    while bytes.get(j) == Some(&b'=') {
        current_level += 1;
        j += 1;
    }
    if current_level == level && bytes.get(j) == Some(&b']') {
        Some(j - idx + 1)
    } else {
        None
    }
}
