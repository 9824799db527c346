//! Remote path handling
//!
//! Remote paths are POSIX-style, `/`-separated strings. Keys supplied by the
//! calling pipeline are resolved relative to a configured root before any
//! wire operation is issued.

/// Lexically clean a path: collapse repeated slashes, resolve `.` and `..`
/// components, drop any trailing slash. An empty result becomes `.` for
/// relative input and `/` for rooted input.
pub fn clean(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|s| *s != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            _ => parts.push(segment),
        }
    }

    let joined = parts.join("/");
    if rooted {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Join two path elements and clean the result.
///
/// Empty elements are ignored; joining two empty strings yields an empty
/// string so that an unset root stays unset.
pub fn join(base: &str, rel: &str) -> String {
    if base.is_empty() && rel.is_empty() {
        return String::new();
    }
    if base.is_empty() {
        return clean(rel);
    }
    if rel.is_empty() {
        return clean(base);
    }
    clean(&format!("{base}/{rel}"))
}

/// All but the last element of the path, cleaned.
///
/// Returns `.` for a bare name and `/` for the root itself.
pub fn parent(path: &str) -> String {
    let cleaned = clean(path);
    match cleaned.rfind('/') {
        Some(0) => "/".to_string(),
        Some(pos) => cleaned[..pos].to_string(),
        None => ".".to_string(),
    }
}

/// The last element of the path, cleaned.
pub fn base_name(path: &str) -> String {
    let cleaned = clean(path);
    if cleaned == "/" {
        return cleaned;
    }
    match cleaned.rfind('/') {
        Some(pos) => cleaned[pos + 1..].to_string(),
        None => cleaned,
    }
}

/// Express `path` relative to `base`.
///
/// Both sides are cleaned first. When `path` equals `base` the result is `.`.
/// When `path` does not live under `base` it is returned cleaned but
/// otherwise unchanged; walk always constructs entry paths by joining onto
/// its own root, so that case does not arise there.
pub fn relative_to(base: &str, path: &str) -> String {
    let base = clean(base);
    let path = clean(path);

    if base == path {
        return ".".to_string();
    }

    if let Some(rest) = path.strip_prefix(base.as_str()) {
        if base == "/" {
            return rest.to_string();
        }
        if let Some(rest) = rest.strip_prefix('/') {
            return rest.to_string();
        }
    }

    path
}
