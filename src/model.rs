use serde::Deserialize;

pub const DEFAULT_PAGE: &str = "01_introduction";

/// Inline navigation entry (alternative to the shell document's markup).
#[derive(Debug, Deserialize, Clone, Default)]
pub struct NavEntry {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub page: Option<String>,
    // Non-clickable section title
    #[serde(default)]
    pub heading: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_title")]
    pub title: String,
    // URL (http/https/file) or directory holding index.html and pages/
    #[serde(default = "default_site_root")]
    pub site_root: String,
    #[serde(default = "default_shell")]
    pub shell: String,
    #[serde(default = "default_nav_selector")]
    pub nav_selector: String,
    #[serde(default = "default_page")]
    pub default_page: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    // Drop results of loads superseded by a newer click
    #[serde(default = "default_true")]
    pub discard_stale: bool,
    #[serde(default)]
    pub nav: Vec<NavEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            site_root: default_site_root(),
            shell: default_shell(),
            nav_selector: default_nav_selector(),
            default_page: default_page(),
            timeout_secs: default_timeout_secs(),
            discard_stale: true,
            nav: vec![],
        }
    }
}

fn default_title() -> String {
    "frag-tui".to_string()
}

fn default_site_root() -> String {
    ".".to_string()
}

fn default_shell() -> String {
    "index.html".to_string()
}

fn default_nav_selector() -> String {
    ".panel-left-nav".to_string()
}

fn default_page() -> String {
    DEFAULT_PAGE.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

pub(crate) fn validate_app_config(cfg: &AppConfig) -> Result<(), String> {
    if cfg.site_root.trim().is_empty() {
        return Err("site_root must not be empty".to_string());
    }
    if cfg.timeout_secs == 0 {
        return Err("timeout_secs must be greater than zero".to_string());
    }
    if cfg.nav.is_empty() {
        if let Err(e) = scraper::Selector::parse(&cfg.nav_selector) {
            return Err(format!(
                "nav_selector '{}' is not a valid CSS selector: {e}",
                cfg.nav_selector
            ));
        }
    }
    for (i, n) in cfg.nav.iter().enumerate() {
        if n.title.trim().is_empty() {
            let kind = if n.heading { "heading" } else { "link" };
            return Err(format!("nav[{i}] {kind} requires a 'title'"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_markup_contract() {
        let cfg: AppConfig = serde_yaml::from_str("site_root: ./site\n").unwrap();
        assert_eq!(cfg.site_root, "./site");
        assert_eq!(cfg.shell, "index.html");
        assert_eq!(cfg.nav_selector, ".panel-left-nav");
        assert_eq!(cfg.default_page, "01_introduction");
        assert!(cfg.discard_stale);
        assert!(validate_app_config(&cfg).is_ok());
    }

    #[test]
    fn inline_nav_parses_headings_and_links() {
        let y = r#"
site_root: https://docs.example.org/guide/
nav:
  - title: Basics
    heading: true
  - title: Introduction
    page: 01_introduction
  - title: Broken
"#;
        let cfg: AppConfig = serde_yaml::from_str(y).unwrap();
        assert_eq!(cfg.nav.len(), 3);
        assert!(cfg.nav[0].heading);
        assert_eq!(cfg.nav[1].page.as_deref(), Some("01_introduction"));
        assert!(cfg.nav[2].page.is_none());
        assert!(validate_app_config(&cfg).is_ok());
    }

    #[test]
    fn validate_rejects_bad_selector_and_zero_timeout() {
        let cfg = AppConfig {
            nav_selector: "[[nope".into(),
            ..Default::default()
        };
        let err = validate_app_config(&cfg).unwrap_err();
        assert!(err.contains("nav_selector"));

        let cfg = AppConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(validate_app_config(&cfg).unwrap_err().contains("timeout_secs"));
    }

    #[test]
    fn validate_requires_titles_on_inline_nav() {
        let cfg = AppConfig {
            nav: vec![NavEntry {
                title: " ".into(),
                page: Some("x".into()),
                heading: false,
            }],
            ..Default::default()
        };
        let err = validate_app_config(&cfg).unwrap_err();
        assert!(err.contains("nav[0]"));
    }
}
