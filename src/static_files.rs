//! Filesystem collaborator behind the static catch-all route.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use crate::context::RequestContext;
use crate::dispatcher::{HandlerResponse, HandlerResult, StaticServe};
use crate::error::abort;

/// Serves files below one base directory.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    base_dir: PathBuf,
}

impl StaticFiles {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self {
            base_dir: base.into(),
        }
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Map a captured URL path below the base directory. Anything but plain
    /// components (`..`, roots, prefixes) is refused.
    fn map_path(&self, url_path: &str) -> Option<PathBuf> {
        let mut pb = self.base_dir.clone();
        for comp in Path::new(url_path.trim_start_matches('/')).components() {
            match comp {
                Component::Normal(s) => pb.push(s),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(pb)
    }

    fn content_type(path: &Path) -> &'static str {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_ascii_lowercase()
            .as_str()
        {
            "html" | "htm" => "text/html",
            "css" => "text/css",
            "js" | "mjs" => "application/javascript",
            "json" => "application/json",
            "txt" => "text/plain",
            "yaml" | "yml" => "text/yaml",
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "svg" => "image/svg+xml",
            "ico" => "image/x-icon",
            "woff" => "font/woff",
            "woff2" => "font/woff2",
            _ => "application/octet-stream",
        }
    }

    /// Read the file for `url_path` and its content type.
    ///
    /// # Errors
    ///
    /// `NotFound` for refused paths, missing files and directories; other I/O
    /// errors as they come.
    pub fn load(&self, url_path: &str) -> io::Result<(Vec<u8>, &'static str)> {
        let path = self
            .map_path(url_path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "invalid path"))?;
        if !path.is_file() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        }
        let bytes = fs::read(&path)?;
        Ok((bytes, Self::content_type(&path)))
    }
}

impl StaticServe for StaticFiles {
    fn serve(&self, path: &str, ctx: &RequestContext) -> HandlerResult {
        match self.load(path) {
            Ok((bytes, content_type)) => {
                debug!(
                    request_id = %ctx.request_id(),
                    path = %path,
                    size_bytes = bytes.len(),
                    "Static file served"
                );
                Ok(HandlerResponse::bytes(200, content_type, bytes))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => abort(404),
            Err(err) => {
                warn!(request_id = %ctx.request_id(), path = %path, error = %err, "Static file read failed");
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Request;
    use crate::dispatcher::ResponseBody;
    use crate::router::ParamVec;
    use http::Method;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hello.txt"), "Hello\n").unwrap();
        fs::create_dir(dir.path().join("css")).unwrap();
        fs::write(dir.path().join("css").join("site.CSS"), "body{}").unwrap();
        dir
    }

    #[test]
    fn test_map_path_prevents_traversal() {
        let sf = StaticFiles::new("static");
        assert_eq!(sf.base_dir(), Path::new("static"));
        assert!(sf.map_path("../Cargo.toml").is_none());
        assert!(sf.map_path("a/../../Cargo.toml").is_none());
        assert_eq!(sf.map_path("./a/b.txt"), Some(PathBuf::from("static/a/b.txt")));
    }

    #[test]
    fn test_load_plain_file() {
        let dir = fixture();
        let sf = StaticFiles::new(dir.path());
        let (bytes, ct) = sf.load("hello.txt").unwrap();
        assert_eq!(ct, "text/plain");
        assert_eq!(bytes, b"Hello\n");

        let (_, ct) = sf.load("css/site.CSS").unwrap();
        assert_eq!(ct, "text/css");
    }

    #[test]
    fn test_directory_and_missing_are_not_found() {
        let dir = fixture();
        let sf = StaticFiles::new(dir.path());
        assert_eq!(sf.load("css").unwrap_err().kind(), io::ErrorKind::NotFound);
        assert_eq!(sf.load("nope.txt").unwrap_err().kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_serve() {
        let dir = fixture();
        let sf = StaticFiles::new(dir.path());
        let ctx = RequestContext::new(Request::new(Method::GET, "/"), ParamVec::new());

        let resp = sf.serve("hello.txt", &ctx).unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(
            resp.body,
            ResponseBody::Bytes {
                content_type: "text/plain",
                data: b"Hello\n".to_vec()
            }
        );
        assert_eq!(sf.serve("missing.txt", &ctx).unwrap_err().status(), 404);
        assert_eq!(sf.serve("../etc/passwd", &ctx).unwrap_err().status(), 404);
    }
}
