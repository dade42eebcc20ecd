//! Static file serving from two roots.
//!
//! `/pages/...` resolves under the pages root, everything else under the public
//! root, and `/` is `/index.html`. Resolution is purely lexical: a path that
//! normalizes outside both roots is refused before the filesystem is touched.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};

use super::AppState;

/// Map a request path to a file inside one of the roots.
///
/// Returns `None` when the normalized path escapes both roots.
pub fn resolve(public_dir: &Path, pages_dir: &Path, request_path: &str) -> Option<PathBuf> {
    let path = if request_path == "/" {
        "/index.html"
    } else {
        request_path
    };

    let candidate = match path.strip_prefix("/pages/") {
        Some(rest) => pages_dir.join(rest.trim_start_matches('/')),
        None => public_dir.join(path.trim_start_matches('/')),
    };

    let normalized = normalize(&candidate);
    (normalized.starts_with(normalize(public_dir)) || normalized.starts_with(normalize(pages_dir)))
        .then_some(normalized)
}

/// Collapse `.` and `..` without consulting the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `/..` is `/`.
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Content type from the file extension.
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        _ => "text/plain; charset=utf-8",
    }
}

fn plain(status: StatusCode, body: &'static str) -> Response {
    (status, [(header::CONTENT_TYPE, "text/plain")], body).into_response()
}

pub(super) async fn serve(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    let Some(path) = resolve(&state.public_dir, &state.pages_dir, uri.path()) else {
        tracing::debug!(path = %uri.path(), "refusing path outside static roots");
        return plain(StatusCode::FORBIDDEN, "Access denied");
    };

    match tokio::fs::read(&path).await {
        Ok(content) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, content_type(&path))],
            content,
        )
            .into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            plain(StatusCode::NOT_FOUND, "404 Not Found")
        }
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "static file read failed");
            plain(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roots() -> (PathBuf, PathBuf) {
        (PathBuf::from("/srv/app/public"), PathBuf::from("/srv/app/pages"))
    }

    #[test]
    fn root_maps_to_index() {
        let (public, pages) = roots();
        assert_eq!(
            resolve(&public, &pages, "/"),
            Some(PathBuf::from("/srv/app/public/index.html"))
        );
    }

    #[test]
    fn pages_prefix_uses_pages_root() {
        let (public, pages) = roots();
        assert_eq!(
            resolve(&public, &pages, "/pages/help.html"),
            Some(PathBuf::from("/srv/app/pages/help.html"))
        );
        assert_eq!(
            resolve(&public, &pages, "/css/site.css"),
            Some(PathBuf::from("/srv/app/public/css/site.css"))
        );
    }

    #[test]
    fn traversal_outside_roots_is_refused() {
        let (public, pages) = roots();
        assert_eq!(resolve(&public, &pages, "/../secret.txt"), None);
        assert_eq!(resolve(&public, &pages, "/pages/../../etc/passwd"), None);
        assert_eq!(resolve(&public, &pages, "/pages//etc/passwd"), Some(PathBuf::from("/srv/app/pages/etc/passwd")));
    }

    #[test]
    fn traversal_between_roots_is_allowed() {
        let (public, pages) = roots();
        assert_eq!(
            resolve(&public, &pages, "/pages/../public/index.html"),
            Some(PathBuf::from("/srv/app/public/index.html"))
        );
    }

    #[test]
    fn sibling_with_shared_prefix_is_refused() {
        let (public, pages) = roots();
        assert_eq!(resolve(&public, &pages, "/../public-evil/x.html"), None);
    }

    #[test]
    fn normalize_relative_paths() {
        assert_eq!(normalize(Path::new("a/./b/../c")), PathBuf::from("a/c"));
        assert_eq!(normalize(Path::new("../../x")), PathBuf::from("../../x"));
        assert_eq!(normalize(Path::new("/..")), PathBuf::from("/"));
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type(Path::new("a.HTML")), "text/html; charset=utf-8");
        assert_eq!(content_type(Path::new("a.css")), "text/css; charset=utf-8");
        assert_eq!(content_type(Path::new("a.js")), "application/javascript; charset=utf-8");
        assert_eq!(content_type(Path::new("a.json")), "application/json; charset=utf-8");
        assert_eq!(content_type(Path::new("a.png")), "text/plain; charset=utf-8");
        assert_eq!(content_type(Path::new("README")), "text/plain; charset=utf-8");
    }
}
