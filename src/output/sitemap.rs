use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::escape_xml;
use crate::catalog::{CatalogStore, ALL_CATEGORY};

pub const DEFAULT_BASE_URL: &str = "https://kloopik.com";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Daily,
    Weekly,
    Monthly,
}

impl ChangeFreq {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: String,
    pub changefreq: ChangeFreq,
    pub priority: f32,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Sitemap {
    pub entries: Vec<SitemapEntry>,
}

/// Home page, then every category, then every game.
pub struct SitemapBuilder {
    base_url: String,
    lastmod: String,
}

impl SitemapBuilder {
    /// `lastmod` is written verbatim, normally a `YYYY-MM-DD` date.
    pub fn new(base_url: &str, lastmod: &str) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            lastmod: lastmod.to_string(),
        }
    }

    pub fn today(base_url: &str) -> Self {
        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        Self::new(base_url, &today)
    }

    fn entry(&self, path: &str, changefreq: ChangeFreq, priority: f32) -> SitemapEntry {
        SitemapEntry {
            loc: format!("{}{}", self.base_url, path),
            lastmod: self.lastmod.clone(),
            changefreq,
            priority,
        }
    }

    pub fn build(&self, store: &CatalogStore) -> Sitemap {
        let mut entries = vec![self.entry("/", ChangeFreq::Daily, 1.0)];
        for category in store.categories() {
            if category == ALL_CATEGORY {
                continue;
            }
            let path = format!("/category/{}/", slugify(&category));
            entries.push(self.entry(&path, ChangeFreq::Weekly, 0.8));
        }
        for game in store.games() {
            let path = format!("/catalog/{}/", game.slug);
            entries.push(self.entry(&path, ChangeFreq::Monthly, 0.7));
        }
        Sitemap { entries }
    }
}

impl Sitemap {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        out.push('\n');
        out.push_str(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#);
        out.push('\n');
        for e in &self.entries {
            out.push_str("  <url>\n");
            out.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&e.loc)));
            out.push_str(&format!("    <lastmod>{}</lastmod>\n", escape_xml(&e.lastmod)));
            out.push_str(&format!(
                "    <changefreq>{}</changefreq>\n",
                e.changefreq.as_str()
            ));
            out.push_str(&format!("    <priority>{:.1}</priority>\n", e.priority));
            out.push_str("  </url>\n");
        }
        out.push_str("</urlset>\n");
        out
    }
}

/// Lower-cases, drops non-word characters and joins words with `-`.
pub fn slugify(text: &str) -> String {
    static NON_WORD: OnceLock<Regex> = OnceLock::new();
    static SPACES: OnceLock<Regex> = OnceLock::new();
    static DASHES: OnceLock<Regex> = OnceLock::new();
    let non_word = NON_WORD.get_or_init(|| Regex::new(r"[^\w\s-]").expect("static regex"));
    let spaces = SPACES.get_or_init(|| Regex::new(r"\s+").expect("static regex"));
    let dashes = DASHES.get_or_init(|| Regex::new(r"-+").expect("static regex"));

    let lowered = text.trim().to_lowercase();
    let cleaned = non_word.replace_all(&lowered, "");
    let spaced = spaces.replace_all(&cleaned, "-");
    dashes.replace_all(&spaced, "-").into_owned()
}
