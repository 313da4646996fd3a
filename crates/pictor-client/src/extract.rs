use std::sync::LazyLock;

use pictor_core::error::AppError;
use pictor_core::traits::ArtifactExtractor;
use scraper::{Html, Selector};
use url::Url;

// Selector literals are compile-time constants; parsing cannot fail.
static OG_IMAGE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property="og:image"]"#).expect("static selector"));
static IMAGE_SRC_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"link[rel="image_src"]"#).expect("static selector"));
static IMG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img[src]").expect("static selector"));

/// Substrings that mark page chrome rather than product imagery.
const CHROME_MARKERS: &[&str] = &["sprite", "logo", "icon", "favicon", "pixel", "badge"];

/// Default extraction adapter: pulls product-image candidates out of an
/// HTML search or product page.
///
/// Candidate order reflects confidence: Open Graph image first, then an
/// explicit `image_src` link, then document `<img>` tags. Page chrome
/// (icons, sprites, logos, tracking pixels) and tiny images are dropped,
/// relative links are resolved against the final page URL, and duplicates
/// keep their first position.
#[derive(Debug, Clone)]
pub struct HtmlImageExtractor {
    /// Images whose width/height attributes fall below this are ignored.
    min_side_hint: u32,
}

impl HtmlImageExtractor {
    pub fn new() -> Self {
        Self { min_side_hint: 100 }
    }

    fn too_small(&self, element: &scraper::node::Element) -> bool {
        for attr in ["width", "height"] {
            if let Some(value) = element.attr(attr)
                && let Ok(size) = value.trim().parse::<u32>()
                && size < self.min_side_hint
            {
                return true;
            }
        }
        false
    }
}

impl Default for HtmlImageExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactExtractor for HtmlImageExtractor {
    fn extract(&self, content: &str, base_url: &str) -> Result<Vec<String>, AppError> {
        let base = Url::parse(base_url)
            .map_err(|e| AppError::Extraction(format!("bad base URL {base_url}: {e}")))?;

        let document = Html::parse_document(content);
        let mut candidates: Vec<String> = Vec::new();

        let mut push = |raw: &str| {
            let raw = raw.trim();
            if raw.is_empty() || raw.starts_with("data:") {
                return;
            }
            let Ok(resolved) = base.join(raw) else {
                return;
            };
            let url = resolved.to_string();
            if is_chrome_asset(&url) {
                return;
            }
            if !candidates.contains(&url) {
                candidates.push(url);
            }
        };

        for element in document.select(&OG_IMAGE) {
            if let Some(content) = element.value().attr("content") {
                push(content);
            }
        }
        for element in document.select(&IMAGE_SRC_LINK) {
            if let Some(href) = element.value().attr("href") {
                push(href);
            }
        }
        for element in document.select(&IMG) {
            if self.too_small(element.value()) {
                continue;
            }
            if let Some(src) = element.value().attr("src") {
                push(src);
            }
        }

        Ok(candidates)
    }
}

fn is_chrome_asset(url: &str) -> bool {
    let lower = url.to_lowercase();
    if lower.ends_with(".svg") {
        return true;
    }
    CHROME_MARKERS.iter().any(|marker| lower.contains(marker))
}
