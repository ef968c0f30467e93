//! Filesystem-backed include resolution tests.

use std::fs;
use std::path::Path;
use std::rc::Rc;

use nginx_conf::{parse_file_with, ParseOptions};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_literal_include_resolves() {
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "nginx.conf", "include servers.conf;\n");
    write(dir.path(), "servers.conf", "server {\n    listen 80;\n}\n");

    let options = ParseOptions::new().parse_include(true);
    let config = parse_file_with(&main, &options).unwrap();

    let include = &config.directives()[0];
    assert_eq!(include.borrow().include_configs().len(), 1);
    assert_eq!(config.find_directives("listen").len(), 1);
}

#[test]
fn test_includes_stay_empty_without_option() {
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "nginx.conf", "include servers.conf;\n");
    write(dir.path(), "servers.conf", "server {\n    listen 80;\n}\n");

    let config = parse_file_with(&main, &ParseOptions::new()).unwrap();
    assert!(config.directives()[0].borrow().include_configs().is_empty());
}

#[test]
fn test_glob_include_resolves_in_sorted_order() {
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "nginx.conf", "include conf.d/*.conf;\n");
    write(dir.path(), "conf.d/b.conf", "gzip on;\n");
    write(dir.path(), "conf.d/a.conf", "sendfile on;\n");

    let options = ParseOptions::new().parse_include(true);
    let config = parse_file_with(&main, &options).unwrap();

    let include = config.directives()[0].borrow();
    let configs = include.include_configs();
    assert_eq!(configs.len(), 2);
    assert!(configs[0].file_path.ends_with("a.conf"));
    assert!(configs[1].file_path.ends_with("b.conf"));
}

#[test]
fn test_wildcard_include_skips_hidden_files() {
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "nginx.conf", "include conf.d/*.conf;\n");
    write(dir.path(), "conf.d/a.conf", "gzip on;\n");
    write(dir.path(), "conf.d/.secret.conf", "sendfile on;\n");

    let options = ParseOptions::new().parse_include(true);
    let config = parse_file_with(&main, &options).unwrap();

    let include = config.directives()[0].borrow();
    assert_eq!(include.include_configs().len(), 1);
    assert!(include.include_configs()[0].file_path.ends_with("a.conf"));
}

#[test]
fn test_literal_include_of_hidden_file_is_allowed() {
    // Hidden-segment filtering only applies to wildcard expansions.
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "nginx.conf", "include conf.d/.secret.conf;\n");
    write(dir.path(), "conf.d/.secret.conf", "gzip on;\n");

    let options = ParseOptions::new().parse_include(true);
    let config = parse_file_with(&main, &options).unwrap();

    assert_eq!(config.directives()[0].borrow().include_configs().len(), 1);
}

#[test]
fn test_same_file_included_twice_shares_one_config() {
    let dir = TempDir::new().unwrap();
    let main = write(
        dir.path(),
        "nginx.conf",
        "include shared.conf;\ninclude shared.conf;\n",
    );
    write(dir.path(), "shared.conf", "gzip on;\n");

    let options = ParseOptions::new().parse_include(true);
    let config = parse_file_with(&main, &options).unwrap();

    let first = config.directives()[0].borrow().include_configs()[0].clone();
    let second = config.directives()[1].borrow().include_configs()[0].clone();
    assert!(Rc::ptr_eq(&first, &second));
}

#[test]
fn test_include_cycle_skipped_by_default() {
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "a.conf", "include b.conf;\ngzip on;\n");
    write(dir.path(), "b.conf", "include a.conf;\nsendfile on;\n");

    let options = ParseOptions::new().parse_include(true);
    let config = parse_file_with(&main, &options).unwrap();

    // The cyclic branch is dropped silently; everything reachable without
    // revisiting an in-flight file is still parsed.
    assert!(!config.find_directives("sendfile").is_empty());
}

#[test]
fn test_include_cycle_error_flag_reports_path() {
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "a.conf", "include b.conf;\n");
    write(dir.path(), "b.conf", "include a.conf;\n");

    let options = ParseOptions::new().parse_include(true).include_cycle_err(true);
    let err = parse_file_with(&main, &options).unwrap_err();
    assert!(err.to_string().contains("include cycle detected for"));
}

#[test]
fn test_cycle_error_suppressed_by_skip_include_errors() {
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "a.conf", "include b.conf;\n");
    write(dir.path(), "b.conf", "include a.conf;\n");

    let options = ParseOptions::new()
        .parse_include(true)
        .include_cycle_err(true)
        .skip_include_parsing_err(true);
    assert!(parse_file_with(&main, &options).is_ok());
}

#[test]
fn test_invalid_included_file_propagates_error() {
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "nginx.conf", "include bad.conf;\n");
    write(dir.path(), "bad.conf", "bogus_directive on;\n");

    let options = ParseOptions::new().parse_include(true);
    let err = parse_file_with(&main, &options).unwrap_err();
    assert!(err.to_string().contains("unknown directive 'bogus_directive'"));
}

#[test]
fn test_invalid_included_file_swallowed_with_skip() {
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "nginx.conf", "include bad.conf;\ngzip on;\n");
    write(dir.path(), "bad.conf", "bogus_directive on;\n");

    let options = ParseOptions::new()
        .parse_include(true)
        .skip_include_parsing_err(true);
    let config = parse_file_with(&main, &options).unwrap();
    assert!(config.directives()[0].borrow().include_configs().is_empty());
    assert_eq!(config.find_directives("gzip").len(), 1);
}

#[test]
fn test_missing_literal_include_resolves_to_nothing() {
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "nginx.conf", "include nowhere.conf;\n");

    let options = ParseOptions::new().parse_include(true);
    let config = parse_file_with(&main, &options).unwrap();
    assert!(config.directives()[0].borrow().include_configs().is_empty());
}

#[test]
fn test_nested_relative_includes_resolve_against_root() {
    // Relative include paths resolve against the root config's directory
    // even when the including file lives in a subdirectory.
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "nginx.conf", "include sub/inner.conf;\n");
    write(dir.path(), "sub/inner.conf", "include sub/other.conf;\n");
    write(dir.path(), "sub/other.conf", "gzip on;\n");

    let options = ParseOptions::new().parse_include(true);
    let config = parse_file_with(&main, &options).unwrap();
    assert_eq!(config.find_directives("gzip").len(), 1);
}

#[test]
fn test_parent_links_hold_across_parsed_tree() {
    let dir = TempDir::new().unwrap();
    let main = write(
        dir.path(),
        "nginx.conf",
        "http {\n    include servers/*.conf;\n}\n",
    );
    write(
        dir.path(),
        "servers/site.conf",
        "server {\n    listen 80;\n}\n",
    );

    let options = ParseOptions::new().parse_include(true);
    let config = parse_file_with(&main, &options).unwrap();

    // Directives in the included file form their own tree rooted at the
    // included config; the include node itself is a child of `http`.
    let http = &config.directives()[0];
    let include = Rc::clone(&http.borrow().block.as_ref().unwrap().directives[0]);
    assert!(Rc::ptr_eq(&include.borrow().parent().unwrap(), http));

    let node = include.borrow();
    let included = &node.include_configs()[0];
    let server = Rc::clone(&included.block.directives[0]);
    assert!(server.borrow().parent().is_none());
    let server_node = server.borrow();
    let listen = Rc::clone(&server_node.block.as_ref().unwrap().directives[0]);
    assert!(listen.borrow().parent().is_some());
}
