//! Path Resolution
//!
//! Turns user-typed paths into canonical absolute paths. Resolution is purely
//! lexical: it never touches storage and never follows symlinks, so the paths
//! stored in undo records stay stable.

/// The directory/user context every command resolves paths against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathContext {
    pub cwd: String,
    pub home: String,
    pub user: String,
}

impl PathContext {
    pub fn new(cwd: impl Into<String>, home: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            cwd: normalize(&cwd.into()),
            home: normalize(&home.into()),
            user: user.into(),
        }
    }

    /// Resolve a raw path against this context.
    pub fn resolve(&self, raw: &str) -> String {
        resolve(raw, self)
    }

    /// Return a copy of the context with a new working directory.
    pub fn with_cwd(&self, cwd: &str) -> Self {
        Self {
            cwd: normalize(cwd),
            home: self.home.clone(),
            user: self.user.clone(),
        }
    }
}

/// Resolve `raw` into an absolute, normalized path.
///
/// - `~` and `~<user>` (for the context's own user) expand to the home directory
/// - relative paths are joined onto `cwd`
/// - `.` segments are dropped, `..` pops one segment (never past the root)
pub fn resolve(raw: &str, ctx: &PathContext) -> String {
    let expanded = expand_tilde(raw, ctx);
    if expanded.starts_with('/') {
        normalize(&expanded)
    } else {
        normalize(&format!("{}/{}", ctx.cwd, expanded))
    }
}

fn expand_tilde(raw: &str, ctx: &PathContext) -> String {
    let Some(rest) = raw.strip_prefix('~') else {
        return raw.to_string();
    };
    if rest.is_empty() || rest.starts_with('/') {
        return format!("{}{}", ctx.home, rest);
    }
    if let Some(after_user) = rest.strip_prefix(ctx.user.as_str()) {
        if !ctx.user.is_empty() && (after_user.is_empty() || after_user.starts_with('/')) {
            return format!("{}{}", ctx.home, after_user);
        }
    }
    // ~otheruser stays literal (no user database to consult)
    raw.to_string()
}

/// Lexically normalize a path. Relative input is treated as rooted at `/`.
pub fn normalize(path: &str) -> String {
    let mut resolved: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                resolved.pop();
            }
            _ => resolved.push(part),
        }
    }
    if resolved.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", resolved.join("/"))
    }
}

/// Parent directory of a normalized path. The parent of `/` is `/`.
pub fn dirname(path: &str) -> String {
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(pos) => path[..pos].to_string(),
    }
}

/// Final segment of a normalized path (empty for `/`).
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or("")
}

/// Join a child name (or relative sub-path) onto a directory.
pub fn join(dir: &str, name: &str) -> String {
    let name = name.trim_start_matches('/');
    if name.is_empty() {
        dir.to_string()
    } else if dir == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", dir, name)
    }
}

/// True when `path` equals `ancestor` or lies somewhere beneath it.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    if ancestor == "/" {
        return true;
    }
    path == ancestor
        || path
            .strip_prefix(ancestor)
            .map_or(false, |rest| rest.starts_with('/'))
}

/// Path of `path` relative to `base`, or `None` if it is not beneath it.
/// Returns an empty string when both are equal.
pub fn relative_to<'a>(path: &'a str, base: &str) -> Option<&'a str> {
    if !is_within(path, base) {
        return None;
    }
    if path == base {
        return Some("");
    }
    let rest = if base == "/" { &path[1..] } else { &path[base.len() + 1..] };
    Some(rest)
}

/// Number of segments below the root.
pub fn depth(path: &str) -> usize {
    path.split('/').filter(|p| !p.is_empty()).count()
}

/// Every ancestor of `path` from the root down, excluding `path` itself.
pub fn ancestors(path: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = dirname(path);
    while current != "/" {
        out.push(current.clone());
        current = dirname(&current);
    }
    out.reverse();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> PathContext {
        PathContext::new("/home/test", "/home/test", "test")
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("/foo/bar/"), "/foo/bar");
        assert_eq!(normalize("foo/bar"), "/foo/bar");
        assert_eq!(normalize("/foo/./bar"), "/foo/bar");
        assert_eq!(normalize("/foo/../bar"), "/bar");
        assert_eq!(normalize("//foo///bar"), "/foo/bar");
        assert_eq!(normalize("/../.."), "/");
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let ctx = ctx();
        assert_eq!(resolve("docs", &ctx), "/home/test/docs");
        assert_eq!(resolve("./docs/../notes.txt", &ctx), "/home/test/notes.txt");
        assert_eq!(resolve("/etc", &ctx), "/etc");
        assert_eq!(resolve("..", &ctx), "/home");
        assert_eq!(resolve("../../../..", &ctx), "/");
        assert_eq!(resolve(".", &ctx), "/home/test");
    }

    #[test]
    fn test_resolve_tilde() {
        let ctx = PathContext::new("/tmp", "/home/test", "test");
        assert_eq!(resolve("~", &ctx), "/home/test");
        assert_eq!(resolve("~/photos", &ctx), "/home/test/photos");
        assert_eq!(resolve("~test", &ctx), "/home/test");
        assert_eq!(resolve("~test/a/../b", &ctx), "/home/test/b");
        assert_eq!(resolve("~other", &ctx), "/tmp/~other");
        assert_eq!(resolve("~tester", &ctx), "/tmp/~tester");
        assert_eq!(resolve("a~", &ctx), "/tmp/a~");
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let ctx = ctx();
        for raw in ["", ".", "..", "~", "~/x/../y", "a/b/./c", "/x/../../y", "../z/"] {
            let once = resolve(raw, &ctx);
            assert_eq!(resolve(&once, &ctx), once, "raw = {:?}", raw);
        }
    }

    #[test]
    fn test_dirname_basename_join() {
        assert_eq!(dirname("/"), "/");
        assert_eq!(dirname("/foo"), "/");
        assert_eq!(dirname("/foo/bar"), "/foo");
        assert_eq!(basename("/foo/bar.txt"), "bar.txt");
        assert_eq!(basename("/"), "");
        assert_eq!(join("/", "a"), "/a");
        assert_eq!(join("/a", "b/c"), "/a/b/c");
        assert_eq!(join("/a", ""), "/a");
    }

    #[test]
    fn test_is_within_and_relative_to() {
        assert!(is_within("/a/b", "/a"));
        assert!(is_within("/a", "/a"));
        assert!(!is_within("/ab", "/a"));
        assert!(is_within("/anything", "/"));
        assert_eq!(relative_to("/a/b/c", "/a"), Some("b/c"));
        assert_eq!(relative_to("/a", "/a"), Some(""));
        assert_eq!(relative_to("/a/b", "/"), Some("a/b"));
        assert_eq!(relative_to("/b", "/a"), None);
    }

    #[test]
    fn test_depth_and_ancestors() {
        assert_eq!(depth("/"), 0);
        assert_eq!(depth("/a/b/c"), 3);
        assert_eq!(ancestors("/a/b/c"), vec!["/a".to_string(), "/a/b".to_string()]);
        assert!(ancestors("/a").is_empty());
    }

    #[test]
    fn test_with_cwd() {
        let ctx = ctx().with_cwd("/etc/../var/");
        assert_eq!(ctx.cwd, "/var");
        assert_eq!(ctx.home, "/home/test");
    }
}
