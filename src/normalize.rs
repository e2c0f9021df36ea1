use url::form_urlencoded;

/// Escapes a single path segment: `/` becomes `%2F`, spaces become `+`.
pub fn quote_plus(s: &str) -> String {
    form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

/// Value of a `key:value` search operator, with spaces replaced by `+`.
pub fn normalize_query_value(value: &str) -> String {
    value.replace(' ', "+")
}
