//! Recursive-descent parser for nginx configuration files.
//!
//! The parser consumes tokens from [`Lexer`] with a two-token lookahead,
//! builds the shared-node AST, and applies typed wrappers through the
//! [`registry`]. When include parsing is enabled it also resolves
//! `include` directives across the filesystem with glob expansion, cycle
//! detection, and a cache shared by the whole include graph.
//!
//! A single parse is strictly single threaded: the include cache and stack
//! are borrowed mutably down the depth-first recursion and are not safe to
//! share across threads. Independent parses of disjoint configurations may
//! run on parallel threads.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::rc::{Rc, Weak};

use crate::ast::{Block, Config, Directive, DirectiveKind, DirectiveRef, InlineComment, Parameter};
use crate::error::{ParseError, ParseResult};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::registry;

/// Options recognized by the parser. All off by default.
///
/// ```
/// use nginx_conf::ParseOptions;
///
/// let options = ParseOptions::new()
///     .parse_include(true)
///     .skip_include_parsing_err(true)
///     .custom_directives(["my_module_directive"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Resolve and recursively parse `include` directives.
    pub parse_include: bool,
    /// Swallow per-include errors and keep resolving the rest.
    pub skip_include_parsing_err: bool,
    /// Treat a cyclic include as a hard error instead of skipping the
    /// cyclic branch.
    pub include_cycle_err: bool,
    /// Discard comment tokens entirely.
    pub skip_comments: bool,
    /// Additional directive names accepted as valid.
    pub custom_directives: HashSet<String>,
    /// Directive names whose block contents bypass directive-name
    /// validation, in addition to the built-in set.
    pub skip_valid_sub_directive_block: HashSet<String>,
    /// Accept unknown directive names everywhere.
    pub skip_valid_directives_err: bool,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse_include(mut self, yes: bool) -> Self {
        self.parse_include = yes;
        self
    }

    pub fn skip_include_parsing_err(mut self, yes: bool) -> Self {
        self.skip_include_parsing_err = yes;
        self
    }

    pub fn include_cycle_err(mut self, yes: bool) -> Self {
        self.include_cycle_err = yes;
        self
    }

    pub fn skip_comments(mut self, yes: bool) -> Self {
        self.skip_comments = yes;
        self
    }

    pub fn skip_valid_directives_err(mut self, yes: bool) -> Self {
        self.skip_valid_directives_err = yes;
        self
    }

    /// Accept the given names as valid directives.
    pub fn custom_directives<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.custom_directives
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Skip directive-name validation inside blocks of the given names.
    pub fn skip_valid_blocks<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_valid_sub_directive_block
            .extend(names.into_iter().map(Into::into));
        self
    }
}

/// Parse nginx configuration from a string with default options.
pub fn parse_string(source: &str) -> ParseResult<Config> {
    parse_string_with(source, &ParseOptions::default())
}

/// Parse nginx configuration from a string.
///
/// Relative include paths resolve against the process working directory,
/// since string input carries no file location.
pub fn parse_string_with(source: &str, options: &ParseOptions) -> ParseResult<Config> {
    let mut ctx = IncludeContext::new(options.clone(), PathBuf::new());
    Parser::new(source, PathBuf::new(), &mut ctx).parse()
}

/// Parse a nginx configuration file from disk with default options.
pub fn parse_file(path: impl AsRef<Path>) -> ParseResult<Config> {
    parse_file_with(path, &ParseOptions::default())
}

/// Parse a nginx configuration file from disk.
///
/// The file is read eagerly; relative include paths resolve against the
/// parent directory of `path`, and that root is inherited by every
/// recursively included file.
pub fn parse_file_with(path: impl AsRef<Path>, options: &ParseOptions) -> ParseResult<Config> {
    let path = path.as_ref();
    let source = fs::read_to_string(path)?;
    let config_root = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let mut ctx = IncludeContext::new(options.clone(), config_root);
    Parser::new(&source, path.to_path_buf(), &mut ctx).parse()
}

/// State shared across the include graph of one parse: the option set, the
/// root directory for relative includes, the canonical-path cache, and the
/// active include stack used for cycle detection.
struct IncludeContext {
    options: ParseOptions,
    config_root: PathBuf,
    parsed_includes: HashMap<PathBuf, Rc<Config>>,
    include_stack: HashSet<PathBuf>,
}

impl IncludeContext {
    fn new(options: ParseOptions, config_root: PathBuf) -> Self {
        Self {
            options,
            config_root,
            parsed_includes: HashMap::new(),
            include_stack: HashSet::new(),
        }
    }
}

fn parse_included_file(path: &Path, ctx: &mut IncludeContext) -> ParseResult<Config> {
    let source = fs::read_to_string(path)?;
    Parser::new(&source, path.to_path_buf(), ctx).parse()
}

struct Parser<'src, 'ctx> {
    lexer: Lexer<'src>,
    current: Token,
    following: Token,
    comment_buffer: Vec<String>,
    file_path: PathBuf,
    ctx: &'ctx mut IncludeContext,
}

impl<'src, 'ctx> Parser<'src, 'ctx> {
    fn new(source: &'src str, file_path: PathBuf, ctx: &'ctx mut IncludeContext) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.scan();
        let following = lexer.scan();
        Self {
            lexer,
            current,
            following,
            comment_buffer: Vec::new(),
            file_path,
            ctx,
        }
    }

    fn next_token(&mut self) {
        self.current = std::mem::replace(&mut self.following, self.lexer.scan());
    }

    fn parse(mut self) -> ParseResult<Config> {
        let block = match self.parse_block(false, false) {
            Ok(block) => block,
            Err(err) => {
                // A sticky lexer error is the root cause of whatever the
                // parser tripped over; report it first.
                if let Some(lexer_err) = self.lexer.take_error() {
                    return Err(lexer_err.into());
                }
                return Err(err);
            }
        };
        if let Some(lexer_err) = self.lexer.take_error() {
            return Err(lexer_err.into());
        }
        Ok(Config {
            file_path: self.file_path,
            block,
        })
    }

    fn parse_block(&mut self, in_block: bool, skip_validation: bool) -> ParseResult<Block> {
        let mut block = Block::default();

        loop {
            match &self.current.kind {
                TokenKind::Eof => {
                    if in_block {
                        return Err(ParseError::UnexpectedEofInBlock);
                    }
                    break;
                }
                TokenKind::BlockEnd => break,
                TokenKind::LuaCode => {
                    block.is_lua_block = true;
                    block.literal_code = self.current.literal.trim().to_string();
                }
                TokenKind::Keyword | TokenKind::QuotedString => {
                    let statement = self.parse_statement(skip_validation)?;
                    self.finish_statement(&statement);
                    block.directives.push(statement);
                }
                TokenKind::Comment => {
                    if !self.ctx.options.skip_comments {
                        self.comment_buffer.push(self.current.literal.clone());
                    }
                }
                // Stray tokens (newlines, the opening brace skipped on
                // entry, illegal tokens) fall through.
                _ => {}
            }
            self.next_token();
        }

        Ok(block)
    }

    /// Records the directive line and wires parent links: children of the
    /// statement's block point at the statement, leaf statements stay
    /// parentless until an enclosing statement claims them.
    fn finish_statement(&self, statement: &DirectiveRef) {
        statement.borrow_mut().line = self.current.line;

        let has_block = statement.borrow().block.is_some();
        if !has_block {
            statement.borrow_mut().parent = Weak::new();
            return;
        }

        let children: Vec<DirectiveRef> = statement
            .borrow()
            .block
            .as_ref()
            .map(|b| b.directives.clone())
            .unwrap_or_default();
        for child in children {
            child.borrow_mut().parent = Rc::downgrade(statement);
        }
        if let Some(block) = statement.borrow_mut().block.as_mut() {
            block.parent = Rc::downgrade(statement);
        }
    }

    fn parse_statement(&mut self, skip_validation: bool) -> ParseResult<DirectiveRef> {
        let mut directive = Directive::new(self.current.literal.clone());
        let directive_line = self.current.line;

        if !self.ctx.options.skip_valid_directives_err
            && !skip_validation
            && !registry::is_valid_directive(&directive.name)
            && !self.ctx.options.custom_directives.contains(&directive.name)
        {
            return Err(ParseError::UnknownDirective {
                name: directive.name,
                line: self.current.line,
                column: self.current.column,
            });
        }

        if !self.comment_buffer.is_empty() {
            directive.comment = std::mem::take(&mut self.comment_buffer);
        }

        loop {
            self.next_token();

            if self.current.kind.is_parameter_eligible() {
                directive.parameters.push(Parameter {
                    value: self.current.literal.clone(),
                    relative_line_index: self.current.line - directive_line,
                });
                if self.current.is(&TokenKind::BlockEnd) {
                    return Ok(directive.into_ref());
                }
            } else if self.current.kind == TokenKind::Semicolon {
                if !self.ctx.options.skip_comments
                    && self.following.kind == TokenKind::Comment
                    && self.following.line == self.current.line
                {
                    self.next_token();
                    directive.inline_comments.push(InlineComment {
                        value: self.current.literal.clone(),
                        relative_line_index: self.current.line - directive_line,
                    });
                }

                let node = directive.into_ref();
                let name = node.borrow().name.clone();
                if let Some(wrapper) = registry::include_wrapper(&name) {
                    wrapper(&node)?;
                    self.parse_include(&node)?;
                    return Ok(node);
                }
                if let Some(wrapper) = registry::directive_wrapper(&name) {
                    wrapper(&node)?;
                }
                return Ok(node);
            } else if self.current.kind == TokenKind::Comment {
                if !self.ctx.options.skip_comments {
                    directive.inline_comments.push(InlineComment {
                        value: self.current.literal.clone(),
                        relative_line_index: self.current.line - directive_line,
                    });
                }
            } else if self.current.kind == TokenKind::BlockStart {
                let skip_block_validation = skip_validation
                    || registry::skip_validation_block(&directive.name)
                    || self
                        .ctx
                        .options
                        .skip_valid_sub_directive_block
                        .contains(&directive.name);

                // The opening brace is left in the stream; parse_block's
                // fall-through arm skips it before the first statement.
                let inner = self.parse_block(true, skip_block_validation)?;
                directive.block = Some(inner);

                let node = directive.into_ref();
                let name = node.borrow().name.clone();
                if let Some(wrapper) = registry::block_wrapper(&name) {
                    wrapper(&node)?;
                }
                return Ok(node);
            } else if self.current.kind == TokenKind::EndOfLine {
                continue;
            } else {
                return Err(ParseError::UnexpectedToken {
                    kind: self.current.kind.display_name().to_string(),
                    literal: self.current.literal.clone(),
                    line: self.current.line,
                    column: self.current.column,
                });
            }
        }
    }

    /// Resolves an `include` directive: glob expansion relative to the
    /// config root, hidden-file filtering for wildcard patterns, cycle
    /// detection against the active include stack, and cache sharing so
    /// that one canonical path is parsed at most once per parse.
    fn parse_include(&mut self, node: &DirectiveRef) -> ParseResult<()> {
        if !self.ctx.options.parse_include {
            return Ok(());
        }
        let skip_errors = self.ctx.options.skip_include_parsing_err;

        let include_path = node
            .borrow()
            .include_path()
            .unwrap_or_default()
            .to_string();
        let mut full_path = PathBuf::from(&include_path);
        if full_path.is_relative() {
            full_path = self.ctx.config_root.join(full_path);
        }
        let pattern = full_path.to_string_lossy().into_owned();
        let has_wildcard = pattern.contains(['*', '?', '[']);

        let matches = match glob::glob(&pattern) {
            Ok(paths) => paths,
            Err(err) => {
                if skip_errors {
                    return Ok(());
                }
                return Err(err.into());
            }
        };

        for entry in matches {
            let matched = match entry {
                Ok(path) => path,
                Err(err) => {
                    if skip_errors {
                        continue;
                    }
                    return Err(err.into());
                }
            };

            // Parity with nginx include globbing: wildcard includes
            // ignore hidden files.
            if has_wildcard && path_has_hidden_segment(&matched) {
                continue;
            }

            let canonical = match fs::canonicalize(&matched) {
                Ok(path) => path,
                Err(err) => {
                    if skip_errors {
                        continue;
                    }
                    return Err(err.into());
                }
            };

            if self.ctx.include_stack.contains(&canonical) {
                if self.ctx.options.include_cycle_err && !skip_errors {
                    return Err(ParseError::IncludeCycle { path: canonical });
                }
                // Cyclic include graph: skip this branch and continue.
                continue;
            }

            if let Some(cached) = self.ctx.parsed_includes.get(&canonical) {
                push_include_config(node, Rc::clone(cached));
                continue;
            }

            self.ctx.include_stack.insert(canonical.clone());
            let parsed = parse_included_file(&canonical, self.ctx);
            self.ctx.include_stack.remove(&canonical);

            match parsed {
                Ok(config) => {
                    let config = Rc::new(config);
                    self.ctx
                        .parsed_includes
                        .insert(canonical, Rc::clone(&config));
                    push_include_config(node, config);
                }
                Err(err) => {
                    if skip_errors {
                        continue;
                    }
                    return Err(err);
                }
            }
        }

        Ok(())
    }
}

fn push_include_config(node: &DirectiveRef, config: Rc<Config>) {
    if let DirectiveKind::Include { configs, .. } = &mut node.borrow_mut().kind {
        configs.push(config);
    }
}

/// Whether any normal path segment starts with a dot.
fn path_has_hidden_segment(path: &Path) -> bool {
    path.components().any(|component| match component {
        Component::Normal(segment) => segment.to_string_lossy().starts_with('.'),
        _ => false,
    })
}
