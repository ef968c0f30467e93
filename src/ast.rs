//! AST types for nginx configuration files.
//!
//! The tree produced by [`crate::parse_string`] and [`crate::parse_file`] is
//! built from shared nodes: directives are held as
//! [`DirectiveRef`] (`Rc<RefCell<Directive>>`) so that parent back-references
//! can be kept as weak pointers and included files can share one parsed
//! [`Config`] between every `include` that references them.
//!
//! # AST structure
//!
//! ```text
//! Config
//!  ├─ file_path
//!  └─ block: Block
//!       └─ directives: Vec<DirectiveRef>
//!            ├─ name, parameters, comments, line
//!            ├─ kind (typed wrapper data: include, upstream, …)
//!            └─ block: Option<Block> (recursive; Lua blocks carry
//!               verbatim literal_code instead of directives)
//! ```
//!
//! Parent pointers are weak: they express a lookup relation, not ownership,
//! and upgrade to `None` for root-level directives.
//!
//! # Example
//!
//! ```
//! use nginx_conf::parse_string;
//!
//! let config = parse_string("http { server { listen 80; } }").unwrap();
//! let servers = config.find_servers();
//! assert_eq!(servers.len(), 1);
//! assert_eq!(servers[0].borrow().name, "server");
//! ```

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use crate::error::UnexpectedUpstreamTypeError;

/// Shared handle to a directive node.
pub type DirectiveRef = Rc<RefCell<Directive>>;

/// Weak (non-owning) handle to a directive node, used for parent links.
pub type DirectiveWeak = Weak<RefCell<Directive>>;

/// A directive parameter: verbatim source text plus the line offset from
/// the directive's first line, which lets the dumper rebuild multi-line
/// directives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Verbatim parameter text (quotes preserved for quoted parameters).
    pub value: String,
    /// Line offset from the directive's first line (0 = same line).
    #[serde(default)]
    pub relative_line_index: usize,
}

impl Parameter {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            relative_line_index: 0,
        }
    }
}

/// A comment sharing a line with a directive (after the terminator or in
/// parameter position).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineComment {
    /// Comment text including the leading `#`.
    pub value: String,
    /// Line offset from the directive's first line.
    #[serde(default)]
    pub relative_line_index: usize,
}

/// Typed-wrapper data attached to a directive after shape validation.
///
/// Most directives stay [`Generic`](DirectiveKind::Generic); the parser
/// upgrades well-known names through the wrapper registry once their shape
/// has been checked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum DirectiveKind {
    /// Plain directive with no typed interpretation.
    #[default]
    Generic,
    /// `include path;` with the configs it resolved to (empty unless
    /// include parsing was enabled).
    Include {
        include_path: String,
        configs: Vec<Rc<Config>>,
    },
    /// `upstream name { … }`.
    Upstream { upstream_name: String },
    /// `server address …;` inside an upstream block.
    UpstreamServer { address: String },
    /// `server { … }`.
    Server,
    /// `location [modifier] match { … }`.
    Location {
        modifier: Option<String>,
        matcher: String,
    },
    /// `http { … }`.
    HttpContext,
    /// `map $source $target { … }`.
    Map {
        source_variable: String,
        target_variable: String,
    },
    /// `limit_req_zone key zone=name:size rate=…;`.
    LimitReqZone {
        key: String,
        zone_name: String,
        zone_size: String,
        rate: String,
    },
    /// A `*_by_lua_block` directive whose block carries verbatim Lua.
    LuaBlock,
}

/// A configuration directive, possibly with a block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Directive {
    /// Directive name (e.g. `"server"`, `"listen"`).
    pub name: String,
    /// Ordered parameters.
    pub parameters: Vec<Parameter>,
    /// Block body for block directives.
    pub block: Option<Block>,
    /// Comments sharing a line with the directive.
    pub inline_comments: Vec<InlineComment>,
    /// Outline comment lines immediately preceding the directive, each
    /// including its leading `#`.
    pub comment: Vec<String>,
    /// Source line recorded for the directive.
    pub line: usize,
    /// Weak back-reference to the enclosing directive; upgrades to `None`
    /// at root level.
    #[serde(skip)]
    pub parent: DirectiveWeak,
    /// Typed-wrapper data.
    pub kind: DirectiveKind,
}

impl Directive {
    /// Creates a generic directive with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Wraps the directive into a shared node.
    pub fn into_ref(self) -> DirectiveRef {
        Rc::new(RefCell::new(self))
    }

    /// Check if this directive has a specific name.
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// First parameter value, if any.
    pub fn first_parameter(&self) -> Option<&str> {
        self.parameters.first().map(|p| p.value.as_str())
    }

    /// The enclosing directive, if any.
    pub fn parent(&self) -> Option<DirectiveRef> {
        self.parent.upgrade()
    }

    /// Include path for typed includes.
    pub fn include_path(&self) -> Option<&str> {
        match &self.kind {
            DirectiveKind::Include { include_path, .. } => Some(include_path),
            _ => None,
        }
    }

    /// Resolved configs for typed includes.
    pub fn include_configs(&self) -> &[Rc<Config>] {
        match &self.kind {
            DirectiveKind::Include { configs, .. } => configs,
            _ => &[],
        }
    }

    /// Upstream name for typed upstreams.
    pub fn upstream_name(&self) -> Option<&str> {
        match &self.kind {
            DirectiveKind::Upstream { upstream_name } => Some(upstream_name),
            _ => None,
        }
    }

    /// Location match for typed locations.
    pub fn location_matcher(&self) -> Option<&str> {
        match &self.kind {
            DirectiveKind::Location { matcher, .. } => Some(matcher),
            _ => None,
        }
    }

    /// Appends a location to a server directive, creating the server's
    /// block when absent and fixing up both parent links: the location's
    /// parent becomes the server, and the location's block (when present)
    /// gets the location as its parent.
    pub fn add_location(server: &DirectiveRef, location: DirectiveRef) {
        {
            let mut loc = location.borrow_mut();
            loc.parent = Rc::downgrade(server);
            if let Some(block) = loc.block.as_mut() {
                block.parent = Rc::downgrade(&location);
            }
        }
        let mut srv = server.borrow_mut();
        srv.block
            .get_or_insert_with(Block::default)
            .directives
            .push(location);
    }
}

/// A brace-delimited group of directives.
///
/// For `*_by_lua_block` directives the block is marked
/// [`is_lua_block`](Block::is_lua_block) and carries the verbatim code in
/// [`literal_code`](Block::literal_code) (surrounding whitespace trimmed)
/// instead of parsed directives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Block {
    /// Child directives (empty for Lua blocks).
    pub directives: Vec<DirectiveRef>,
    /// Whether this block holds verbatim Lua code.
    pub is_lua_block: bool,
    /// Verbatim Lua code for Lua blocks; empty otherwise.
    pub literal_code: String,
    /// Weak back-reference to the directive owning this block.
    #[serde(skip)]
    pub parent: DirectiveWeak,
}

impl Block {
    /// The directive owning this block, if any.
    pub fn parent(&self) -> Option<DirectiveRef> {
        self.parent.upgrade()
    }

    /// Every directive (at any depth) with a matching name, in stable
    /// pre-order. Traversal descends through blocks and through typed
    /// includes into their resolved configs.
    pub fn find_directives(&self, name: &str) -> Vec<DirectiveRef> {
        let mut found = Vec::new();
        self.collect_directives(name, &mut found);
        found
    }

    fn collect_directives(&self, name: &str, found: &mut Vec<DirectiveRef>) {
        for directive in &self.directives {
            let node = directive.borrow();
            if node.name == name {
                found.push(Rc::clone(directive));
            }
            if let DirectiveKind::Include { configs, .. } = &node.kind {
                for config in configs {
                    config.block.collect_directives(name, found);
                }
            }
            if let Some(block) = &node.block {
                block.collect_directives(name, found);
            }
        }
    }
}

/// Root of a parsed configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Path the config was parsed from; empty for string input. The
    /// dumper's `write_config` writes back to this path.
    pub file_path: PathBuf,
    /// Root block.
    pub block: Block,
}

impl Config {
    /// Top-level directives.
    pub fn directives(&self) -> &[DirectiveRef] {
        &self.block.directives
    }

    /// Every directive (at any depth) with a matching name; see
    /// [`Block::find_directives`].
    pub fn find_directives(&self, name: &str) -> Vec<DirectiveRef> {
        self.block.find_directives(name)
    }

    /// Every typed upstream directive. Generic directives named
    /// `upstream` that were never wrapped are silently skipped; use
    /// [`find_upstreams_strict`](Config::find_upstreams_strict) to detect
    /// them instead.
    pub fn find_upstreams(&self) -> Vec<DirectiveRef> {
        self.find_directives("upstream")
            .into_iter()
            .filter(|d| matches!(d.borrow().kind, DirectiveKind::Upstream { .. }))
            .collect()
    }

    /// Like [`find_upstreams`](Config::find_upstreams), but an unwrapped
    /// `upstream` directive is an error identifying its position.
    pub fn find_upstreams_strict(
        &self,
    ) -> Result<Vec<DirectiveRef>, UnexpectedUpstreamTypeError> {
        let found = self.find_directives("upstream");
        for (index, directive) in found.iter().enumerate() {
            if !matches!(directive.borrow().kind, DirectiveKind::Upstream { .. }) {
                return Err(UnexpectedUpstreamTypeError { index });
            }
        }
        Ok(found)
    }

    /// Every typed server directive.
    pub fn find_servers(&self) -> Vec<DirectiveRef> {
        self.find_directives("server")
            .into_iter()
            .filter(|d| matches!(d.borrow().kind, DirectiveKind::Server))
            .collect()
    }

    /// Every typed location directive.
    pub fn find_locations(&self) -> Vec<DirectiveRef> {
        self.find_directives("location")
            .into_iter()
            .filter(|d| matches!(d.borrow().kind, DirectiveKind::Location { .. }))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str, params: &[&str]) -> DirectiveRef {
        let mut directive = Directive::new(name);
        directive.parameters = params.iter().map(|p| Parameter::new(*p)).collect();
        directive.into_ref()
    }

    #[test]
    fn test_find_directives_recurses_in_order() {
        let listen = leaf("listen", &["80"]);
        let inner_server = {
            let mut d = Directive::new("server");
            d.block = Some(Block {
                directives: vec![Rc::clone(&listen)],
                ..Block::default()
            });
            d.into_ref()
        };
        let http = {
            let mut d = Directive::new("http");
            d.block = Some(Block {
                directives: vec![leaf("server_tokens", &["off"]), Rc::clone(&inner_server)],
                ..Block::default()
            });
            d.into_ref()
        };
        let config = Config {
            file_path: PathBuf::new(),
            block: Block {
                directives: vec![http],
                ..Block::default()
            },
        };

        let servers = config.find_directives("server");
        assert_eq!(servers.len(), 1);
        assert!(Rc::ptr_eq(&servers[0], &inner_server));

        let listens = config.find_directives("listen");
        assert_eq!(listens.len(), 1);
        assert!(Rc::ptr_eq(&listens[0], &listen));
    }

    #[test]
    fn test_find_directives_descends_into_include_configs() {
        let included = Rc::new(Config {
            file_path: PathBuf::from("inner.conf"),
            block: Block {
                directives: vec![leaf("gzip", &["on"])],
                ..Block::default()
            },
        });
        let include = {
            let mut d = Directive::new("include");
            d.parameters = vec![Parameter::new("inner.conf")];
            d.kind = DirectiveKind::Include {
                include_path: "inner.conf".to_string(),
                configs: vec![included],
            };
            d.into_ref()
        };
        let config = Config {
            file_path: PathBuf::new(),
            block: Block {
                directives: vec![include],
                ..Block::default()
            },
        };

        assert_eq!(config.find_directives("gzip").len(), 1);
    }

    #[test]
    fn test_find_upstreams_skips_unexpected_types() {
        let generic = {
            let mut d = Directive::new("upstream");
            d.parameters = vec![Parameter::new("backend")];
            d.block = Some(Block::default());
            d.into_ref()
        };
        let config = Config {
            file_path: PathBuf::new(),
            block: Block {
                directives: vec![generic],
                ..Block::default()
            },
        };

        assert_eq!(config.find_upstreams().len(), 0);
    }

    #[test]
    fn test_find_upstreams_strict_returns_typed_error() {
        let generic = {
            let mut d = Directive::new("upstream");
            d.parameters = vec![Parameter::new("backend")];
            d.block = Some(Block::default());
            d.into_ref()
        };
        let config = Config {
            file_path: PathBuf::new(),
            block: Block {
                directives: vec![generic],
                ..Block::default()
            },
        };

        let err = config.find_upstreams_strict().unwrap_err();
        assert_eq!(err.index, 0);
    }

    #[test]
    fn test_find_upstreams_strict_success() {
        let upstream = {
            let mut d = Directive::new("upstream");
            d.kind = DirectiveKind::Upstream {
                upstream_name: "backend".to_string(),
            };
            d.into_ref()
        };
        let config = Config {
            file_path: PathBuf::new(),
            block: Block {
                directives: vec![upstream],
                ..Block::default()
            },
        };

        let upstreams = config.find_upstreams_strict().unwrap();
        assert_eq!(upstreams.len(), 1);
        assert_eq!(upstreams[0].borrow().upstream_name(), Some("backend"));
    }

    #[test]
    fn test_add_location_appends_and_sets_parents() {
        let server = {
            let mut d = Directive::new("server");
            d.kind = DirectiveKind::Server;
            d.block = Some(Block {
                directives: vec![leaf("listen", &["80"])],
                ..Block::default()
            });
            d.into_ref()
        };
        let location = {
            let mut d = Directive::new("location");
            d.parameters = vec![Parameter::new("/api")];
            d.kind = DirectiveKind::Location {
                modifier: None,
                matcher: "/api".to_string(),
            };
            d.block = Some(Block {
                directives: vec![leaf("proxy_pass", &["http://backend"])],
                ..Block::default()
            });
            d.into_ref()
        };

        Directive::add_location(&server, Rc::clone(&location));

        let srv = server.borrow();
        let block = srv.block.as_ref().unwrap();
        assert_eq!(block.directives.len(), 2);
        assert!(Rc::ptr_eq(&block.directives[1], &location));

        let loc = location.borrow();
        assert!(Rc::ptr_eq(&loc.parent().unwrap(), &server));
        let loc_block_parent = loc.block.as_ref().unwrap().parent().unwrap();
        assert!(Rc::ptr_eq(&loc_block_parent, &location));
    }

    #[test]
    fn test_add_location_initializes_server_block() {
        let server = {
            let mut d = Directive::new("server");
            d.kind = DirectiveKind::Server;
            d.into_ref()
        };
        let location = {
            let mut d = Directive::new("location");
            d.parameters = vec![Parameter::new("/")];
            d.kind = DirectiveKind::Location {
                modifier: None,
                matcher: "/".to_string(),
            };
            d.block = Some(Block::default());
            d.into_ref()
        };

        Directive::add_location(&server, Rc::clone(&location));

        let srv = server.borrow();
        let block = srv.block.as_ref().unwrap();
        assert_eq!(block.directives.len(), 1);
        assert!(Rc::ptr_eq(&location.borrow().parent().unwrap(), &server));
    }

    #[test]
    fn test_ast_serializes_to_json() {
        let config = Config {
            file_path: PathBuf::new(),
            block: Block {
                directives: vec![leaf("worker_processes", &["auto"])],
                ..Block::default()
            },
        };

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("worker_processes"));
        assert!(json.contains("auto"));
    }
}
