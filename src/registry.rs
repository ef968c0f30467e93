//! Static directive tables and wrapper dispatch.
//!
//! These tables are process-wide and immutable: they are initialized once
//! and never change during a parse. Validation can be relaxed per parse via
//! [`ParseOptions`](crate::parser::ParseOptions) (`custom_directives`,
//! `skip_valid_directives_err`, `skip_valid_sub_directive_block`).

use std::collections::HashSet;
use std::sync::LazyLock;

use crate::wrappers::{self, WrapperFn};

/// Directive names whose block bodies bypass name validation. Bodies of
/// these blocks contain arbitrary keys (map values, MIME types, geo CIDRs)
/// rather than directives.
const SKIP_VALIDATION_BLOCKS: &[&str] = &[
    "map",
    "geo",
    "types",
    "split_clients",
    "charset_map",
    "match",
];

/// Whether the block body of the named directive skips directive-name
/// validation.
pub fn skip_validation_block(name: &str) -> bool {
    SKIP_VALIDATION_BLOCKS.contains(&name)
}

/// Wrapper for directives that resolve included files. Applied after the
/// terminating semicolon, before include resolution runs.
pub(crate) fn include_wrapper(name: &str) -> Option<WrapperFn> {
    match name {
        "include" => Some(wrappers::new_include as WrapperFn),
        _ => None,
    }
}

/// Wrapper for leaf directives, applied after the terminating semicolon.
pub(crate) fn directive_wrapper(name: &str) -> Option<WrapperFn> {
    match name {
        "server" => Some(wrappers::new_upstream_server as WrapperFn),
        "limit_req_zone" => Some(wrappers::new_limit_req_zone as WrapperFn),
        _ => None,
    }
}

/// Wrapper for block directives, applied after the block has been parsed.
/// Any name ending in `_by_lua_block` routes to the Lua-block wrapper.
pub(crate) fn block_wrapper(name: &str) -> Option<WrapperFn> {
    if name.ends_with("_by_lua_block") {
        return Some(wrappers::new_lua_block as WrapperFn);
    }
    match name {
        "http" => Some(wrappers::new_http as WrapperFn),
        "server" => Some(wrappers::new_server as WrapperFn),
        "location" => Some(wrappers::new_location as WrapperFn),
        "upstream" => Some(wrappers::new_upstream as WrapperFn),
        "map" => Some(wrappers::new_map as WrapperFn),
        _ => None,
    }
}

static VALID_DIRECTIVE_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| VALID_DIRECTIVES.iter().copied().collect());

/// Whether the name is a known nginx (or bundled-module) directive.
pub fn is_valid_directive(name: &str) -> bool {
    VALID_DIRECTIVE_SET.contains(name)
}

/// Known directive names: nginx core, the standard http/stream/mail module
/// set, and the OpenResty lua-nginx-module family.
const VALID_DIRECTIVES: &[&str] = &[
    // core & events
    "accept_mutex",
    "accept_mutex_delay",
    "daemon",
    "debug_connection",
    "debug_points",
    "env",
    "error_log",
    "events",
    "include",
    "load_module",
    "lock_file",
    "master_process",
    "multi_accept",
    "pcre_jit",
    "pid",
    "ssl_engine",
    "thread_pool",
    "timer_resolution",
    "use",
    "user",
    "worker_aio_requests",
    "worker_connections",
    "worker_cpu_affinity",
    "worker_priority",
    "worker_processes",
    "worker_rlimit_core",
    "worker_rlimit_nofile",
    "worker_shutdown_timeout",
    "working_directory",
    // http core
    "absolute_redirect",
    "aio",
    "aio_write",
    "alias",
    "break",
    "chunked_transfer_encoding",
    "client_body_buffer_size",
    "client_body_in_file_only",
    "client_body_in_single_buffer",
    "client_body_temp_path",
    "client_body_timeout",
    "client_header_buffer_size",
    "client_header_timeout",
    "client_max_body_size",
    "connection_pool_size",
    "default_type",
    "directio",
    "directio_alignment",
    "disable_symlinks",
    "error_page",
    "etag",
    "http",
    "if",
    "if_modified_since",
    "ignore_invalid_headers",
    "internal",
    "keepalive_disable",
    "keepalive_requests",
    "keepalive_time",
    "keepalive_timeout",
    "large_client_header_buffers",
    "limit_except",
    "limit_rate",
    "limit_rate_after",
    "lingering_close",
    "lingering_time",
    "lingering_timeout",
    "listen",
    "location",
    "log_not_found",
    "log_subrequest",
    "max_ranges",
    "merge_slashes",
    "msie_padding",
    "msie_refresh",
    "open_file_cache",
    "open_file_cache_errors",
    "open_file_cache_min_uses",
    "open_file_cache_valid",
    "output_buffers",
    "port_in_redirect",
    "postpone_output",
    "read_ahead",
    "recursive_error_pages",
    "request_pool_size",
    "reset_timedout_connection",
    "resolver",
    "resolver_timeout",
    "root",
    "satisfy",
    "send_lowat",
    "send_timeout",
    "sendfile",
    "sendfile_max_chunk",
    "server",
    "server_name",
    "server_name_in_redirect",
    "server_names_hash_bucket_size",
    "server_names_hash_max_size",
    "server_tokens",
    "subrequest_output_buffer_size",
    "tcp_nodelay",
    "tcp_nopush",
    "try_files",
    "types",
    "types_hash_bucket_size",
    "types_hash_max_size",
    "underscores_in_headers",
    "variables_hash_bucket_size",
    "variables_hash_max_size",
    // rewrite
    "return",
    "rewrite",
    "rewrite_log",
    "set",
    "uninitialized_variable_warn",
    // index & autoindex
    "autoindex",
    "autoindex_exact_size",
    "autoindex_format",
    "autoindex_localtime",
    "index",
    "random_index",
    // access, auth
    "allow",
    "auth_basic",
    "auth_basic_user_file",
    "auth_delay",
    "auth_request",
    "auth_request_set",
    "deny",
    // logging
    "access_log",
    "log_format",
    "open_log_file_cache",
    // gzip & friends
    "gunzip",
    "gunzip_buffers",
    "gzip",
    "gzip_buffers",
    "gzip_comp_level",
    "gzip_disable",
    "gzip_http_version",
    "gzip_min_length",
    "gzip_proxied",
    "gzip_static",
    "gzip_types",
    "gzip_vary",
    // ssl & http/2, http/3
    "http2",
    "http2_body_preread_size",
    "http2_chunk_size",
    "http2_max_concurrent_streams",
    "http2_push",
    "http2_push_preload",
    "http2_recv_buffer_size",
    "http3",
    "http3_hq",
    "http3_max_concurrent_streams",
    "http3_stream_buffer_size",
    "quic_active_connection_id_limit",
    "quic_gso",
    "quic_retry",
    "ssl",
    "ssl_alpn",
    "ssl_buffer_size",
    "ssl_certificate",
    "ssl_certificate_key",
    "ssl_ciphers",
    "ssl_client_certificate",
    "ssl_conf_command",
    "ssl_crl",
    "ssl_dhparam",
    "ssl_early_data",
    "ssl_ecdh_curve",
    "ssl_handshake_timeout",
    "ssl_ocsp",
    "ssl_ocsp_cache",
    "ssl_password_file",
    "ssl_prefer_server_ciphers",
    "ssl_preread",
    "ssl_protocols",
    "ssl_reject_handshake",
    "ssl_session_cache",
    "ssl_session_ticket_key",
    "ssl_session_tickets",
    "ssl_session_timeout",
    "ssl_stapling",
    "ssl_stapling_file",
    "ssl_stapling_responder",
    "ssl_stapling_verify",
    "ssl_trusted_certificate",
    "ssl_verify_client",
    "ssl_verify_depth",
    // headers & charset
    "add_header",
    "add_trailer",
    "charset",
    "charset_map",
    "charset_types",
    "expires",
    "override_charset",
    "source_charset",
    // headers-more module
    "more_clear_headers",
    "more_clear_input_headers",
    "more_set_headers",
    "more_set_input_headers",
    // proxy
    "proxy_bind",
    "proxy_buffer_size",
    "proxy_buffering",
    "proxy_buffers",
    "proxy_busy_buffers_size",
    "proxy_cache",
    "proxy_cache_background_update",
    "proxy_cache_bypass",
    "proxy_cache_convert_head",
    "proxy_cache_key",
    "proxy_cache_lock",
    "proxy_cache_lock_age",
    "proxy_cache_lock_timeout",
    "proxy_cache_max_range_offset",
    "proxy_cache_methods",
    "proxy_cache_min_uses",
    "proxy_cache_path",
    "proxy_cache_revalidate",
    "proxy_cache_use_stale",
    "proxy_cache_valid",
    "proxy_connect_timeout",
    "proxy_cookie_domain",
    "proxy_cookie_flags",
    "proxy_cookie_path",
    "proxy_force_ranges",
    "proxy_headers_hash_bucket_size",
    "proxy_headers_hash_max_size",
    "proxy_hide_header",
    "proxy_http_version",
    "proxy_ignore_client_abort",
    "proxy_ignore_headers",
    "proxy_intercept_errors",
    "proxy_limit_rate",
    "proxy_max_temp_file_size",
    "proxy_method",
    "proxy_next_upstream",
    "proxy_next_upstream_timeout",
    "proxy_next_upstream_tries",
    "proxy_no_cache",
    "proxy_pass",
    "proxy_pass_header",
    "proxy_pass_request_body",
    "proxy_pass_request_headers",
    "proxy_read_timeout",
    "proxy_redirect",
    "proxy_request_buffering",
    "proxy_send_lowat",
    "proxy_send_timeout",
    "proxy_set_body",
    "proxy_set_header",
    "proxy_socket_keepalive",
    "proxy_ssl_certificate",
    "proxy_ssl_certificate_key",
    "proxy_ssl_ciphers",
    "proxy_ssl_crl",
    "proxy_ssl_name",
    "proxy_ssl_password_file",
    "proxy_ssl_protocols",
    "proxy_ssl_server_name",
    "proxy_ssl_session_reuse",
    "proxy_ssl_trusted_certificate",
    "proxy_ssl_verify",
    "proxy_ssl_verify_depth",
    "proxy_store",
    "proxy_store_access",
    "proxy_temp_file_write_size",
    "proxy_temp_path",
    // stream proxy extras
    "proxy_download_rate",
    "proxy_half_close",
    "proxy_protocol",
    "proxy_protocol_timeout",
    "proxy_requests",
    "proxy_responses",
    "proxy_session_drop",
    "proxy_timeout",
    "proxy_upload_rate",
    "preread_buffer_size",
    "preread_timeout",
    // fastcgi
    "fastcgi_bind",
    "fastcgi_buffer_size",
    "fastcgi_buffering",
    "fastcgi_buffers",
    "fastcgi_busy_buffers_size",
    "fastcgi_cache",
    "fastcgi_cache_background_update",
    "fastcgi_cache_bypass",
    "fastcgi_cache_key",
    "fastcgi_cache_lock",
    "fastcgi_cache_lock_age",
    "fastcgi_cache_lock_timeout",
    "fastcgi_cache_methods",
    "fastcgi_cache_min_uses",
    "fastcgi_cache_path",
    "fastcgi_cache_revalidate",
    "fastcgi_cache_use_stale",
    "fastcgi_cache_valid",
    "fastcgi_catch_stderr",
    "fastcgi_connect_timeout",
    "fastcgi_hide_header",
    "fastcgi_ignore_client_abort",
    "fastcgi_ignore_headers",
    "fastcgi_index",
    "fastcgi_intercept_errors",
    "fastcgi_keep_conn",
    "fastcgi_limit_rate",
    "fastcgi_max_temp_file_size",
    "fastcgi_next_upstream",
    "fastcgi_next_upstream_timeout",
    "fastcgi_next_upstream_tries",
    "fastcgi_no_cache",
    "fastcgi_param",
    "fastcgi_pass",
    "fastcgi_pass_header",
    "fastcgi_pass_request_body",
    "fastcgi_pass_request_headers",
    "fastcgi_read_timeout",
    "fastcgi_request_buffering",
    "fastcgi_send_lowat",
    "fastcgi_send_timeout",
    "fastcgi_socket_keepalive",
    "fastcgi_split_path_info",
    "fastcgi_store",
    "fastcgi_store_access",
    "fastcgi_temp_file_write_size",
    "fastcgi_temp_path",
    // uwsgi / scgi / grpc / memcached
    "grpc_bind",
    "grpc_buffer_size",
    "grpc_connect_timeout",
    "grpc_hide_header",
    "grpc_ignore_headers",
    "grpc_intercept_errors",
    "grpc_next_upstream",
    "grpc_next_upstream_timeout",
    "grpc_next_upstream_tries",
    "grpc_pass",
    "grpc_pass_header",
    "grpc_read_timeout",
    "grpc_send_timeout",
    "grpc_set_header",
    "grpc_socket_keepalive",
    "memcached_bind",
    "memcached_connect_timeout",
    "memcached_gzip_flag",
    "memcached_next_upstream",
    "memcached_pass",
    "memcached_read_timeout",
    "memcached_send_timeout",
    "scgi_bind",
    "scgi_buffer_size",
    "scgi_buffering",
    "scgi_buffers",
    "scgi_busy_buffers_size",
    "scgi_cache",
    "scgi_cache_key",
    "scgi_cache_path",
    "scgi_cache_valid",
    "scgi_connect_timeout",
    "scgi_hide_header",
    "scgi_ignore_headers",
    "scgi_intercept_errors",
    "scgi_next_upstream",
    "scgi_param",
    "scgi_pass",
    "scgi_pass_header",
    "scgi_read_timeout",
    "scgi_send_timeout",
    "scgi_temp_path",
    "uwsgi_bind",
    "uwsgi_buffer_size",
    "uwsgi_buffering",
    "uwsgi_buffers",
    "uwsgi_busy_buffers_size",
    "uwsgi_cache",
    "uwsgi_cache_key",
    "uwsgi_cache_path",
    "uwsgi_cache_valid",
    "uwsgi_connect_timeout",
    "uwsgi_hide_header",
    "uwsgi_ignore_headers",
    "uwsgi_intercept_errors",
    "uwsgi_modifier1",
    "uwsgi_modifier2",
    "uwsgi_next_upstream",
    "uwsgi_param",
    "uwsgi_pass",
    "uwsgi_pass_header",
    "uwsgi_read_timeout",
    "uwsgi_send_timeout",
    "uwsgi_temp_path",
    // upstream
    "hash",
    "ip_hash",
    "keepalive",
    "least_conn",
    "least_time",
    "ntlm",
    "queue",
    "random",
    "slow_start",
    "state",
    "sticky",
    "upstream",
    "zone",
    // map / geo / split_clients
    "geo",
    "geoip_city",
    "geoip_country",
    "geoip_org",
    "geoip_proxy",
    "geoip_proxy_recursive",
    "map",
    "map_hash_bucket_size",
    "map_hash_max_size",
    "split_clients",
    // limits
    "limit_conn",
    "limit_conn_dry_run",
    "limit_conn_log_level",
    "limit_conn_status",
    "limit_conn_zone",
    "limit_req",
    "limit_req_dry_run",
    "limit_req_log_level",
    "limit_req_status",
    "limit_req_zone",
    "limit_zone",
    // real ip / referer / secure link
    "real_ip_header",
    "real_ip_recursive",
    "referer_hash_bucket_size",
    "referer_hash_max_size",
    "secure_link",
    "secure_link_md5",
    "secure_link_secret",
    "set_real_ip_from",
    "valid_referers",
    // body filters & misc http modules
    "add_after_body",
    "add_before_body",
    "addition_types",
    "ancient_browser",
    "ancient_browser_value",
    "create_full_put_path",
    "dav_access",
    "dav_methods",
    "empty_gif",
    "flv",
    "image_filter",
    "image_filter_buffer",
    "image_filter_interlace",
    "image_filter_jpeg_quality",
    "image_filter_sharpen",
    "image_filter_transparency",
    "image_filter_webp_quality",
    "min_delete_depth",
    "mirror",
    "mirror_request_body",
    "modern_browser",
    "modern_browser_value",
    "mp4",
    "mp4_buffer_size",
    "mp4_max_buffer_size",
    "slice",
    "ssi",
    "ssi_last_modified",
    "ssi_min_file_chunk",
    "ssi_silent_errors",
    "ssi_types",
    "ssi_value_length",
    "stub_status",
    "sub_filter",
    "sub_filter_last_modified",
    "sub_filter_once",
    "sub_filter_types",
    "userid",
    "userid_domain",
    "userid_expires",
    "userid_flags",
    "userid_mark",
    "userid_name",
    "userid_p3p",
    "userid_path",
    "userid_service",
    "xml_entities",
    "xslt_last_modified",
    "xslt_param",
    "xslt_string_param",
    "xslt_stylesheet",
    "xslt_types",
    // njs
    "js_body_filter",
    "js_content",
    "js_fetch_trusted_certificate",
    "js_header_filter",
    "js_import",
    "js_include",
    "js_path",
    "js_set",
    "js_var",
    // stream & mail contexts
    "auth_http",
    "auth_http_header",
    "auth_http_pass_client_cert",
    "auth_http_timeout",
    "imap_auth",
    "imap_capabilities",
    "imap_client_buffer",
    "mail",
    "match",
    "pop3_auth",
    "pop3_capabilities",
    "protocol",
    "proxy_pass_error_message",
    "smtp_auth",
    "smtp_capabilities",
    "smtp_client_buffer",
    "smtp_greeting_delay",
    "starttls",
    "stream",
    "xclient",
    // health checks (plus & community modules)
    "check",
    "check_http_expect_alive",
    "check_http_send",
    "health_check",
    "health_check_timeout",
    // lua-nginx-module (OpenResty)
    "access_by_lua",
    "access_by_lua_block",
    "access_by_lua_file",
    "balancer_by_lua_block",
    "balancer_by_lua_file",
    "body_filter_by_lua",
    "body_filter_by_lua_block",
    "body_filter_by_lua_file",
    "content_by_lua",
    "content_by_lua_block",
    "content_by_lua_file",
    "exit_worker_by_lua_block",
    "exit_worker_by_lua_file",
    "header_filter_by_lua",
    "header_filter_by_lua_block",
    "header_filter_by_lua_file",
    "init_by_lua",
    "init_by_lua_block",
    "init_by_lua_file",
    "init_worker_by_lua",
    "init_worker_by_lua_block",
    "init_worker_by_lua_file",
    "log_by_lua",
    "log_by_lua_block",
    "log_by_lua_file",
    "lua_capture_error_log",
    "lua_check_client_abort",
    "lua_code_cache",
    "lua_load_resty_core",
    "lua_malloc_trim",
    "lua_max_pending_timers",
    "lua_max_running_timers",
    "lua_need_request_body",
    "lua_package_cpath",
    "lua_package_path",
    "lua_regex_cache_max_entries",
    "lua_regex_match_limit",
    "lua_sa_restart",
    "lua_shared_dict",
    "lua_socket_buffer_size",
    "lua_socket_connect_timeout",
    "lua_socket_keepalive_timeout",
    "lua_socket_log_errors",
    "lua_socket_pool_size",
    "lua_socket_read_timeout",
    "lua_socket_send_lowat",
    "lua_socket_send_timeout",
    "lua_ssl_ciphers",
    "lua_ssl_conf_command",
    "lua_ssl_crl",
    "lua_ssl_protocols",
    "lua_ssl_trusted_certificate",
    "lua_ssl_verify_depth",
    "lua_transform_underscores_in_response_headers",
    "lua_use_default_type",
    "rewrite_by_lua",
    "rewrite_by_lua_block",
    "rewrite_by_lua_file",
    "server_rewrite_by_lua_block",
    "server_rewrite_by_lua_file",
    "set_by_lua",
    "set_by_lua_block",
    "set_by_lua_file",
    "ssl_certificate_by_lua_block",
    "ssl_certificate_by_lua_file",
    "ssl_client_hello_by_lua_block",
    "ssl_client_hello_by_lua_file",
    "ssl_session_fetch_by_lua_block",
    "ssl_session_fetch_by_lua_file",
    "ssl_session_store_by_lua_block",
    "ssl_session_store_by_lua_file",
];
