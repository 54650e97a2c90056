/// Builds `<login_path>?redirect=<encoded target>`.
///
/// The login page reads `redirect` back after a successful login; the target
/// is the full path (including any query) the user was trying to reach.
pub fn login_redirect(login_path: &str, target: &str) -> String {
    format!("{}?redirect={}", login_path, urlencoding::encode(target))
}

/// Path component of a location, without query or fragment.
pub fn path_of(location: &str) -> &str {
    let end = location.find(['?', '#']).unwrap_or(location.len());
    &location[..end]
}
