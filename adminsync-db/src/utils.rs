use std::borrow::Cow;

/// Redact credentials from a database URL so it is safe to log.
pub fn sanitize_database_url(raw: &str) -> Cow<'_, str> {
    let Some(scheme_end) = raw.find("://") else {
        // No scheme, nothing to redact (bare sqlite paths and the like).
        return Cow::Borrowed(raw);
    };
    let rest = &raw[scheme_end + 3..];

    // The authority portion ends at / or end of string
    let host_end = rest.find('/').unwrap_or(rest.len());
    let authority = &rest[..host_end];

    // An @ in the authority indicates credentials
    if let Some(at_pos) = authority.rfind('@') {
        let scheme = &raw[..scheme_end + 3];
        let host_and_rest = &rest[at_pos + 1..];
        let mut result = String::with_capacity(scheme.len() + 10 + host_and_rest.len());
        result.push_str(scheme);
        result.push_str("****:****@");
        result.push_str(host_and_rest);
        Cow::Owned(result)
    } else {
        Cow::Borrowed(raw)
    }
}
