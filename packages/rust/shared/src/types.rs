//! Core domain types: scraped pages, catalog rows, and scrape inputs.

use serde::{Deserialize, Deserializer, Serialize};

/// Text stored in place of page content when every fetch attempt failed
/// ("unable to retrieve").
pub const FETCH_FAILED_SENTINEL: &str = "ไม่สามารถดึงข้อมูลได้";

// ---------------------------------------------------------------------------
// ScrapedDocument
// ---------------------------------------------------------------------------

/// One page's extracted content plus the metadata it was scraped with.
///
/// Serialized with the corpus file's keys (`ID`, `URL`, `Header`, `Center`,
/// `NamePage`, `Tag`, `HTML`). Every field tolerates being missing, `null`,
/// or a number, and comes out as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedDocument {
    /// Opaque identifier from the link table.
    #[serde(rename = "ID", alias = "id", default, deserialize_with = "lenient_text")]
    pub id: String,
    /// Page URL.
    #[serde(rename = "URL", alias = "url", default, deserialize_with = "lenient_text")]
    pub url: String,
    /// Section header the page was filed under.
    #[serde(rename = "Header", alias = "header", default, deserialize_with = "lenient_text")]
    pub header: String,
    /// Owning center / department.
    #[serde(rename = "Center", alias = "center", default, deserialize_with = "lenient_text")]
    pub center: String,
    /// Page title.
    #[serde(
        rename = "NamePage",
        alias = "name_page",
        default,
        deserialize_with = "lenient_text"
    )]
    pub name_page: String,
    /// Free-text tags.
    #[serde(rename = "Tag", alias = "tag", default, deserialize_with = "lenient_text")]
    pub tag: String,
    /// Plain text extracted from the page. May be empty or [`FETCH_FAILED_SENTINEL`].
    #[serde(rename = "HTML", alias = "html_text", default, deserialize_with = "lenient_text")]
    pub html_text: String,
}

// ---------------------------------------------------------------------------
// CatalogRow
// ---------------------------------------------------------------------------

/// One product/service entry in the catalog. All fields are already
/// trimmed text; absent columns are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRow {
    pub id: String,
    pub name: String,
    pub center: String,
    pub link: String,
}

impl CatalogRow {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        center: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            center: center.into(),
            link: link.into(),
        }
    }

    /// The link, trimmed, if it is an `http://` or `https://` URL.
    /// Anything else must never be shown as a clickable reference.
    pub fn web_link(&self) -> Option<&str> {
        let link = self.link.trim();
        let lower = link.to_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Some(link)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// LinkRecord
// ---------------------------------------------------------------------------

/// One row of the link table the scraper consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkRecord {
    pub id: String,
    pub url: String,
    pub center: String,
    pub header: String,
    pub name_page: String,
    pub tag: String,
}

impl LinkRecord {
    /// Attach scraped text, producing a corpus document.
    pub fn into_document(self, html_text: String) -> ScrapedDocument {
        ScrapedDocument {
            id: self.id,
            url: self.url,
            header: self.header,
            center: self.center,
            name_page: self.name_page,
            tag: self.tag,
            html_text,
        }
    }
}

/// Accept strings, numbers, booleans, or null; always yield text.
fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}
