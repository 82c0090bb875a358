use crate::model::AppConfig;
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use reqwest::blocking::Client;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const PAGES_DIR: &str = "pages";
const PAGE_EXT: &str = "html";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("Could not load page: {status} ({path})")]
    Status { path: String, status: u16 },
    #[error("Could not reach {path}: {reason}")]
    Transport { path: String, reason: String },
}

/// Key -> document lookup over some transport.
pub trait FragmentSource: Send + Sync {
    /// Fetch the document at `path`, relative to the site root.
    fn get(&self, path: &str) -> Result<String, LoadError>;
    /// Human-readable location for logs and the header.
    fn describe(&self) -> String;
}

pub fn page_path(page_id: &str) -> String {
    format!("{PAGES_DIR}/{page_id}.{PAGE_EXT}")
}

pub fn fetch(source: &dyn FragmentSource, page_id: &str) -> Result<String, LoadError> {
    source.get(&page_path(page_id))
}

pub struct HttpSource {
    base: Url,
    client: Client,
}

impl HttpSource {
    pub fn new(base: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("frag-tui/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building http client")?;
        Ok(Self {
            base: base_url(base)?,
            client,
        })
    }

    pub(crate) fn url_for(&self, path: &str) -> Result<Url, LoadError> {
        self.base.join(path).map_err(|e| LoadError::Transport {
            path: path.to_string(),
            reason: format!("invalid url: {e}"),
        })
    }
}

// Url::join drops the last segment unless the base ends with '/'
fn base_url(base: &str) -> Result<Url> {
    let mut s = base.trim().to_string();
    if !s.ends_with('/') {
        s.push('/');
    }
    Url::parse(&s).with_context(|| format!("parsing site root url {base}"))
}

impl FragmentSource for HttpSource {
    fn get(&self, path: &str) -> Result<String, LoadError> {
        let url = self.url_for(path)?;
        let transport = |e: reqwest::Error| LoadError::Transport {
            path: path.to_string(),
            reason: e.to_string(),
        };
        let resp = self.client.get(url).send().map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }
        resp.text().map_err(transport)
    }

    fn describe(&self) -> String {
        self.base.to_string()
    }
}

pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FragmentSource for DirSource {
    fn get(&self, path: &str) -> Result<String, LoadError> {
        let full = self.root.join(path);
        std::fs::read_to_string(&full).map_err(|e| match e.kind() {
            ErrorKind::NotFound => LoadError::Status {
                path: path.to_string(),
                status: 404,
            },
            ErrorKind::PermissionDenied => LoadError::Status {
                path: path.to_string(),
                status: 403,
            },
            _ => LoadError::Transport {
                path: path.to_string(),
                reason: format!("reading {}: {e}", full.display()),
            },
        })
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

pub(crate) fn expand_env(s: &str) -> String {
    // ${VAR} from the environment, empty when unset
    let re = match Regex::new(r"\$\{([A-Za-z0-9_]+)\}") {
        Ok(re) => re,
        Err(_) => return s.to_string(),
    };
    re.replace_all(s, |caps: &regex::Captures| {
        std::env::var(&caps[1]).unwrap_or_default()
    })
    .to_string()
}

/// Pick the transport for the configured site root.
pub fn open_source(cfg: &AppConfig, config_dir: &Path) -> Result<Arc<dyn FragmentSource>> {
    let root = std::env::var("FRAG_TUI_SITE_ROOT").unwrap_or_else(|_| expand_env(&cfg.site_root));
    let root = root.trim();
    if root.is_empty() {
        return Err(anyhow!("site root is empty"));
    }
    if root.starts_with("http://") || root.starts_with("https://") {
        let src = HttpSource::new(root, Duration::from_secs(cfg.timeout_secs))?;
        return Ok(Arc::new(src));
    }
    if root.starts_with("file://") {
        let url = Url::parse(root).with_context(|| format!("parsing site root {root}"))?;
        let dir = url
            .to_file_path()
            .map_err(|_| anyhow!("site root {root} is not a local path"))?;
        return Ok(Arc::new(DirSource::new(dir)));
    }
    let pb = PathBuf::from(root);
    let dir = if pb.is_absolute() {
        pb
    } else {
        config_dir.join(pb)
    };
    Ok(Arc::new(DirSource::new(dir)))
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory source that records every requested path.
    #[derive(Default)]
    pub(crate) struct MockSource {
        pub(crate) docs: HashMap<String, Result<String, LoadError>>,
        pub(crate) requested: Mutex<Vec<String>>,
    }

    impl MockSource {
        pub(crate) fn with_page(mut self, page_id: &str, body: &str) -> Self {
            self.docs.insert(page_path(page_id), Ok(body.to_string()));
            self
        }

        pub(crate) fn with_doc(mut self, path: &str, body: &str) -> Self {
            self.docs.insert(path.to_string(), Ok(body.to_string()));
            self
        }

        pub(crate) fn requested(&self) -> Vec<String> {
            self.requested.lock().map(|g| g.clone()).unwrap_or_default()
        }
    }

    impl FragmentSource for MockSource {
        fn get(&self, path: &str) -> Result<String, LoadError> {
            if let Ok(mut g) = self.requested.lock() {
                g.push(path.to_string());
            }
            self.docs.get(path).cloned().unwrap_or(Err(LoadError::Status {
                path: path.to_string(),
                status: 404,
            }))
        }

        fn describe(&self) -> String {
            "mock".to_string()
        }
    }
}
