use crate::model::NavEntry;
use anyhow::{anyhow, Result};
use scraper::{ElementRef, Html, Selector};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub label: String,
    // data-page verbatim; None when missing or empty
    pub page: Option<String>,
    // Never followed
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavRow {
    Heading(String),
    Link(usize),
}

/// Sidebar contents: links plus the visible rows that point at them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavTree {
    pub links: Vec<NavLink>,
    pub rows: Vec<NavRow>,
}

impl NavTree {
    /// Nearest enclosing link of the row under a click, if any.
    pub fn closest_link(&self, row: usize) -> Option<usize> {
        match self.rows.get(row)? {
            NavRow::Link(i) => Some(*i),
            NavRow::Heading(_) => None,
        }
    }

    pub fn row_of_link(&self, link: usize) -> Option<usize> {
        self.rows
            .iter()
            .position(|r| matches!(r, NavRow::Link(i) if *i == link))
    }

    pub fn find_page(&self, page: &str) -> Option<usize> {
        self.links
            .iter()
            .position(|l| l.page.as_deref() == Some(page))
    }

    fn push_link(&mut self, link: NavLink) {
        self.links.push(link);
        self.rows.push(NavRow::Link(self.links.len() - 1));
    }

    pub fn from_entries(entries: &[NavEntry]) -> Self {
        let mut tree = NavTree::default();
        for e in entries {
            if e.heading {
                tree.rows.push(NavRow::Heading(e.title.clone()));
            } else {
                tree.push_link(NavLink {
                    label: e.title.clone(),
                    page: non_empty(e.page.as_deref()),
                    href: None,
                });
            }
        }
        tree
    }
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.filter(|s| !s.is_empty()).map(str::to_string)
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_heading(name: &str) -> bool {
    matches!(name, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

/// Build the sidebar from the shell document's navigation container.
pub fn parse_nav_markup(shell: &str, container: &str) -> Result<NavTree> {
    let sel = Selector::parse(container)
        .map_err(|e| anyhow!("invalid nav selector '{container}': {e}"))?;
    let doc = Html::parse_document(shell);
    let root = doc
        .select(&sel)
        .next()
        .ok_or_else(|| anyhow!("no element matches nav selector '{container}'"))?;
    let mut tree = NavTree::default();
    walk(root, &mut tree);
    Ok(tree)
}

fn walk(el: ElementRef, tree: &mut NavTree) {
    for child in el.children().filter_map(ElementRef::wrap) {
        let name = child.value().name();
        if name == "a" {
            let label = collapse_ws(&child.text().collect::<String>());
            let page = non_empty(child.value().attr("data-page"));
            let label = if label.is_empty() {
                page.clone().unwrap_or_default()
            } else {
                label
            };
            tree.push_link(NavLink {
                label,
                page,
                href: child.value().attr("href").map(str::to_string),
            });
        } else if is_heading(name) && !contains_link(child) {
            let title = collapse_ws(&child.text().collect::<String>());
            if !title.is_empty() {
                tree.rows.push(NavRow::Heading(title));
            }
        } else {
            walk(child, tree);
        }
    }
}

fn contains_link(el: ElementRef) -> bool {
    el.descendants()
        .filter_map(ElementRef::wrap)
        .any(|d| d.value().name() == "a")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHELL: &str = r##"<!DOCTYPE html>
<html><body>
<nav class="panel-left-nav">
  <h3>Getting started</h3>
  <ul>
    <li><a href="#" data-page="01_introduction"><span>Intro</span>duction</a></li>
    <li><a href="#" data-page="02_setup">Setup</a></li>
    <li><a href="#">No page</a></li>
    <li><a href="#" data-page="  ">Blank page</a></li>
  </ul>
  <h3><a href="#" data-page="03_usage">Usage</a></h3>
</nav>
<main><a data-page="outside">Outside</a></main>
<div id="content-middle"></div><div id="content-right"></div>
</body></html>"##;

    #[test]
    fn parses_links_and_headings_in_document_order() {
        let tree = parse_nav_markup(SHELL, ".panel-left-nav").unwrap();
        assert_eq!(tree.links.len(), 5);
        assert_eq!(tree.rows.len(), 6);
        assert_eq!(tree.rows[0], NavRow::Heading("Getting started".into()));
        assert_eq!(tree.links[0].label, "Introduction");
        assert_eq!(tree.links[0].page.as_deref(), Some("01_introduction"));
        assert_eq!(tree.links[0].href.as_deref(), Some("#"));
        assert!(tree.links[2].page.is_none());
        // whitespace is still an identifier; it is not trimmed away
        assert_eq!(tree.links[3].page.as_deref(), Some("  "));
        // heading wrapping a link yields the link, not a heading row
        assert_eq!(tree.links[4].page.as_deref(), Some("03_usage"));
        assert!(tree.find_page("outside").is_none());
    }

    #[test]
    fn closest_link_resolves_rows() {
        let tree = parse_nav_markup(SHELL, ".panel-left-nav").unwrap();
        assert_eq!(tree.closest_link(0), None);
        assert_eq!(tree.closest_link(1), Some(0));
        assert_eq!(tree.closest_link(99), None);
        assert_eq!(tree.row_of_link(1), Some(2));
        assert_eq!(tree.find_page("02_setup"), Some(1));
    }

    #[test]
    fn missing_container_is_an_error() {
        let err = parse_nav_markup("<p>nothing</p>", ".panel-left-nav").unwrap_err();
        assert!(err.to_string().contains("no element matches"));
    }

    #[test]
    fn inline_entries_build_the_same_shape() {
        let tree = NavTree::from_entries(&[
            NavEntry {
                title: "Basics".into(),
                page: None,
                heading: true,
            },
            NavEntry {
                title: "Intro".into(),
                page: Some("01_introduction".into()),
                heading: false,
            },
            NavEntry {
                title: "Empty".into(),
                page: Some(String::new()),
                heading: false,
            },
        ]);
        assert_eq!(tree.rows.len(), 3);
        assert_eq!(tree.closest_link(1), Some(0));
        assert!(tree.links[1].page.is_none());
    }
}
