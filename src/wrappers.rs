//! Typed-wrapper constructors.
//!
//! The parser builds every statement as a generic
//! [`Directive`](crate::ast::Directive) first; once
//! the terminator has been consumed, the wrapper registered for the
//! directive's name validates its shape and upgrades
//! [`Directive::kind`](crate::ast::Directive::kind) to the typed variant.
//! A wrapper failure aborts the parse.

use crate::ast::{DirectiveKind, DirectiveRef};
use crate::error::WrapperError;

/// Shape-validating constructor applied to a freshly parsed directive.
pub type WrapperFn = fn(&DirectiveRef) -> Result<(), WrapperError>;

/// `include path;` — exactly one parameter, no block.
pub fn new_include(directive: &DirectiveRef) -> Result<(), WrapperError> {
    let mut node = directive.borrow_mut();
    if !matches!(node.kind, DirectiveKind::Generic) {
        return Err(WrapperError::IncludeType);
    }
    if node.parameters.len() != 1 {
        return Err(WrapperError::IncludeParameterCount(node.parameters.len()));
    }
    if node.block.is_some() {
        return Err(WrapperError::IncludeBlock);
    }
    node.kind = DirectiveKind::Include {
        include_path: node.parameters[0].value.clone(),
        configs: Vec::new(),
    };
    Ok(())
}

/// `upstream name { … }` — a name parameter and a block.
pub fn new_upstream(directive: &DirectiveRef) -> Result<(), WrapperError> {
    let mut node = directive.borrow_mut();
    if !matches!(node.kind, DirectiveKind::Generic) {
        return Err(WrapperError::UpstreamType);
    }
    let Some(name) = node.parameters.first().map(|p| p.value.clone()) else {
        return Err(WrapperError::UpstreamName);
    };
    if node.block.is_none() {
        return Err(WrapperError::UpstreamBlock);
    }
    node.kind = DirectiveKind::Upstream {
        upstream_name: name,
    };
    Ok(())
}

/// `server address …;` inside an upstream block.
pub fn new_upstream_server(directive: &DirectiveRef) -> Result<(), WrapperError> {
    let mut node = directive.borrow_mut();
    if !matches!(node.kind, DirectiveKind::Generic) {
        return Err(WrapperError::ServerType);
    }
    let Some(address) = node.parameters.first().map(|p| p.value.clone()) else {
        return Err(WrapperError::UpstreamServerAddress);
    };
    node.kind = DirectiveKind::UpstreamServer { address };
    Ok(())
}

/// `server { … }`.
pub fn new_server(directive: &DirectiveRef) -> Result<(), WrapperError> {
    let mut node = directive.borrow_mut();
    if !matches!(node.kind, DirectiveKind::Generic) {
        return Err(WrapperError::ServerType);
    }
    if node.block.is_none() {
        return Err(WrapperError::ServerBlock);
    }
    node.kind = DirectiveKind::Server;
    Ok(())
}

/// `location [modifier] match { … }`.
pub fn new_location(directive: &DirectiveRef) -> Result<(), WrapperError> {
    let mut node = directive.borrow_mut();
    if !matches!(node.kind, DirectiveKind::Generic) {
        return Err(WrapperError::LocationType);
    }
    let (modifier, matcher) = match node.parameters.as_slice() {
        [matcher] => (None, matcher.value.clone()),
        [modifier, matcher, ..] => (Some(modifier.value.clone()), matcher.value.clone()),
        [] => return Err(WrapperError::LocationMatch),
    };
    node.kind = DirectiveKind::Location { modifier, matcher };
    Ok(())
}

/// `http { … }`.
pub fn new_http(directive: &DirectiveRef) -> Result<(), WrapperError> {
    let mut node = directive.borrow_mut();
    if !matches!(node.kind, DirectiveKind::Generic) {
        return Err(WrapperError::HttpType);
    }
    if node.block.is_none() {
        return Err(WrapperError::HttpBlock);
    }
    node.kind = DirectiveKind::HttpContext;
    Ok(())
}

/// `map $source $target { … }`.
pub fn new_map(directive: &DirectiveRef) -> Result<(), WrapperError> {
    let mut node = directive.borrow_mut();
    if node.parameters.len() != 2 {
        return Err(WrapperError::MapParameterCount(node.parameters.len()));
    }
    if node.block.is_none() {
        return Err(WrapperError::MapBlock);
    }
    node.kind = DirectiveKind::Map {
        source_variable: node.parameters[0].value.clone(),
        target_variable: node.parameters[1].value.clone(),
    };
    Ok(())
}

/// `limit_req_zone key zone=name:size [rate=…];`.
pub fn new_limit_req_zone(directive: &DirectiveRef) -> Result<(), WrapperError> {
    let mut node = directive.borrow_mut();
    let Some(key) = node.parameters.first().map(|p| p.value.clone()) else {
        return Err(WrapperError::LimitReqZoneParameters);
    };
    let Some(zone) = node
        .parameters
        .iter()
        .find_map(|p| p.value.strip_prefix("zone="))
    else {
        return Err(WrapperError::LimitReqZoneParameters);
    };
    let (zone_name, zone_size) = match zone.split_once(':') {
        Some((name, size)) => (name.to_string(), size.to_string()),
        None => (zone.to_string(), String::new()),
    };
    let rate = node
        .parameters
        .iter()
        .find_map(|p| p.value.strip_prefix("rate="))
        .unwrap_or_default()
        .to_string();
    node.kind = DirectiveKind::LimitReqZone {
        key,
        zone_name,
        zone_size,
        rate,
    };
    Ok(())
}

/// Any `*_by_lua_block` directive — the block must carry verbatim Lua.
pub fn new_lua_block(directive: &DirectiveRef) -> Result<(), WrapperError> {
    let mut node = directive.borrow_mut();
    match &node.block {
        Some(block) if block.is_lua_block => {}
        _ => return Err(WrapperError::LuaBlock),
    }
    node.kind = DirectiveKind::LuaBlock;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, Directive, Parameter};

    fn directive(name: &str, params: &[&str], block: bool) -> DirectiveRef {
        let mut d = Directive::new(name);
        d.parameters = params.iter().map(|p| Parameter::new(*p)).collect();
        if block {
            d.block = Some(Block::default());
        }
        d.into_ref()
    }

    #[test]
    fn test_include_validation() {
        let err = new_include(&directive("include", &[], false)).unwrap_err();
        assert!(err.to_string().contains("requires exactly 1 parameter"));
        assert!(err.to_string().contains("got 0"));

        let err = new_include(&directive("include", &["a.conf", "b.conf"], false)).unwrap_err();
        assert!(err.to_string().contains("requires exactly 1 parameter, got 2"));

        let err = new_include(&directive("include", &["a.conf"], true)).unwrap_err();
        assert!(err
            .to_string()
            .contains("cannot have a block; missing semicolon?"));
    }

    #[test]
    fn test_include_type_error() {
        let node = directive("include", &["a.conf"], false);
        node.borrow_mut().kind = crate::ast::DirectiveKind::Server;
        let err = new_include(&node).unwrap_err();
        assert_eq!(err.to_string(), "include directive type error");
    }

    #[test]
    fn test_include_success_records_path() {
        let node = directive("include", &["conf.d/*.conf"], false);
        new_include(&node).unwrap();
        assert_eq!(node.borrow().include_path(), Some("conf.d/*.conf"));
        assert!(node.borrow().include_configs().is_empty());
    }

    #[test]
    fn test_upstream_requires_name() {
        let err = new_upstream(&directive("upstream", &[], true)).unwrap_err();
        assert!(err.to_string().contains("requires a name parameter"));
    }

    #[test]
    fn test_upstream_requires_block() {
        let err = new_upstream(&directive("upstream", &["backend"], false)).unwrap_err();
        assert_eq!(err, WrapperError::UpstreamBlock);
    }

    #[test]
    fn test_location_type_error_message() {
        let node = directive("location", &["/"], true);
        node.borrow_mut().kind = crate::ast::DirectiveKind::Server;
        let err = new_location(&node).unwrap_err();
        assert_eq!(err.to_string(), "location directive type error");
    }

    #[test]
    fn test_location_modifier_split() {
        let node = directive("location", &["~*", r"\.php$"], true);
        new_location(&node).unwrap();
        let node_ref = node.borrow();
        match &node_ref.kind {
            crate::ast::DirectiveKind::Location { modifier, matcher } => {
                assert_eq!(modifier.as_deref(), Some("~*"));
                assert_eq!(matcher, r"\.php$");
            }
            other => panic!("expected location kind, got {other:?}"),
        }
    }

    #[test]
    fn test_limit_req_zone_parses_zone_and_rate() {
        let node = directive(
            "limit_req_zone",
            &["$binary_remote_addr", "zone=one:10m", "rate=1r/s"],
            false,
        );
        new_limit_req_zone(&node).unwrap();
        let node_ref = node.borrow();
        match &node_ref.kind {
            crate::ast::DirectiveKind::LimitReqZone {
                key,
                zone_name,
                zone_size,
                rate,
            } => {
                assert_eq!(key, "$binary_remote_addr");
                assert_eq!(zone_name, "one");
                assert_eq!(zone_size, "10m");
                assert_eq!(rate, "1r/s");
            }
            other => panic!("expected limit_req_zone kind, got {other:?}"),
        }
    }

    #[test]
    fn test_upstream_server_records_address() {
        let node = directive("server", &["127.0.0.1:8080", "weight=5"], false);
        new_upstream_server(&node).unwrap();
        let node_ref = node.borrow();
        match &node_ref.kind {
            crate::ast::DirectiveKind::UpstreamServer { address } => {
                assert_eq!(address, "127.0.0.1:8080");
            }
            other => panic!("expected upstream server kind, got {other:?}"),
        }
    }
}
