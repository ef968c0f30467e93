//! nginx configuration parser and pretty-printer
//!
//! This crate parses nginx configuration files into a typed AST, resolves
//! `include` directives across the filesystem, and serializes the tree
//! back to text with configurable styling. Embedded OpenResty
//! `*_by_lua_block` bodies are captured verbatim and run through a
//! Lua-aware formatting pipeline on output.
//!
//! # Quick Start
//!
//! ```
//! use nginx_conf::{dump_config, parse_string, Style};
//!
//! let config = parse_string("http { server { listen 80; } }").unwrap();
//!
//! for directive in config.find_directives("listen") {
//!     println!("listen at line {}", directive.borrow().line);
//! }
//!
//! let text = dump_config(&config, &Style::new());
//! assert_eq!(text, "http {\n    server {\n        listen 80;\n    }\n}");
//! ```
//!
//! To parse a file and every file it includes:
//!
//! ```no_run
//! use nginx_conf::{parse_file_with, ParseOptions};
//!
//! let options = ParseOptions::new().parse_include(true);
//! let config = parse_file_with("/etc/nginx/nginx.conf", &options).unwrap();
//! ```
//!
//! # Modules
//!
//! - [`ast`] — AST types: [`Config`], [`Directive`], [`Block`],
//!   [`Parameter`], [`DirectiveKind`]
//! - [`lexer`] — Tokenizer: [`lexer::Lexer`], [`lexer::Token`],
//!   [`lexer::TokenKind`]
//! - [`parser`] — [`ParseOptions`] and the parse entry points
//! - [`dumper`] — [`Style`] and the dump/write entry points
//! - [`lua`] — Lua-block formatting and the `#`-comment rewriter
//! - [`registry`] — known-directive tables
//! - [`error`] — [`LexerError`], [`ParseError`], [`DumpError`]
//!
//! # Common Patterns
//!
//! ## Typed finders
//!
//! Directives with well-known names are upgraded to typed variants during
//! parsing; the finders filter by variant:
//!
//! ```
//! # use nginx_conf::parse_string;
//! let config = parse_string(
//!     "upstream backend { server 127.0.0.1:8080; }",
//! ).unwrap();
//!
//! let upstreams = config.find_upstreams();
//! assert_eq!(upstreams[0].borrow().upstream_name(), Some("backend"));
//! ```
//!
//! ## Stable sorted output
//!
//! ```
//! # use nginx_conf::{dump_config, parse_string, Style};
//! let config = parse_string("worker_processes 1;\nuser nginx;").unwrap();
//! assert_eq!(
//!     dump_config(&config, &Style::no_indent_sorted()),
//!     "user nginx;\nworker_processes 1;"
//! );
//! // The AST order is untouched:
//! assert_eq!(
//!     dump_config(&config, &Style::no_indent()),
//!     "worker_processes 1;\nuser nginx;"
//! );
//! ```

pub mod ast;
pub mod dumper;
pub mod error;
pub mod lexer;
pub mod lua;
pub mod parser;
pub mod registry;
pub mod wrappers;

pub use ast::{
    Block, Config, Directive, DirectiveKind, DirectiveRef, DirectiveWeak, InlineComment, Parameter,
};
pub use dumper::{dump_block, dump_config, dump_directive, write_config, Style};
pub use error::{
    DumpError, DumpResult, LexerError, ParseError, ParseResult, UnexpectedUpstreamTypeError,
    WrapperError,
};
pub use lua::LuaFormatter;
pub use parser::{parse_file, parse_file_with, parse_string, parse_string_with, ParseOptions};
