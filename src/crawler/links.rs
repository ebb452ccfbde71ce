//! Link normalization
//!
//! Only same-site links survive: absolute URLs under the site root, rewritten
//! to their path, and root-relative paths. Results are lower-cased.

use std::sync::LazyLock;

use regex::Regex;

static RELATIVE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/[\w-]+[\w\-/]*(\.html)?$").expect("relative link pattern is valid")
});

/// Matcher for links of one site
#[derive(Debug, Clone)]
pub struct LinkNormalizer {
    absolute: Regex,
}

impl LinkNormalizer {
    /// `site_url` is the site root without a trailing slash
    pub fn new(site_url: &str) -> Result<Self, regex::Error> {
        let absolute = Regex::new(&format!(
            r"^{}(/[\w\-/]*(?:\.html)?)$",
            regex::escape(site_url)
        ))?;
        Ok(Self { absolute })
    }

    /// Site-relative path of `href`, if it points into the site
    pub fn normalize(&self, href: &str) -> Option<String> {
        let href = href.trim();

        if let Some(captures) = self.absolute.captures(href) {
            return captures.get(1).map(|path| path.as_str().to_lowercase());
        }

        if RELATIVE_LINK.is_match(href) {
            return Some(href.to_lowercase());
        }

        None
    }
}
