use std::sync::OnceLock;

use crate::error::Result;

pub(crate) const API_VERSION: &str = "v1";

pub(crate) fn urljoin(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, path)
    }
}

pub(crate) fn api_base(root: &str) -> String {
    // Common cases:
    // - https://host        -> https://host/v1
    // - https://host/       -> https://host/v1
    // - https://host/v1/    -> https://host/v1
    let b = root.trim_end_matches('/');
    if b.ends_with(&format!("/{}", API_VERSION)) {
        return b.to_string();
    }
    format!("{}/{}", b, API_VERSION)
}

/// First item whose name equals `name` exactly. Later duplicates are ignored.
pub(crate) fn first_named<T, F>(items: Vec<T>, name: &str, name_of: F) -> Option<T>
where
    F: Fn(&T) -> &str,
{
    items.into_iter().find(|item| name_of(item) == name)
}

/// Returns the cell's value, filling it with `init` on first access.
///
/// A failed `init` leaves the cell empty. Concurrent first accesses may each run
/// `init`, but only the first stored value is ever handed out.
pub(crate) fn cached<'a, T>(
    cell: &'a OnceLock<T>,
    init: impl FnOnce() -> Result<T>,
) -> Result<&'a T> {
    if let Some(v) = cell.get() {
        return Ok(v);
    }
    let v = init()?;
    Ok(cell.get_or_init(|| v))
}
