use std::sync::{Mutex, OnceLock};
use std::time::{Duration, Instant};

use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use scraper::{ElementRef, Html, Selector};

use crate::domain::PatentId;
use crate::error::PatentError;

pub const DEFAULT_BASE_URL: &str = "https://patents.google.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A downloaded front-page drawing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontImage {
    pub bytes: Vec<u8>,
    pub extension: String,
}

/// Remote source of the five document fields.
///
/// Each operation is independent: `Ok(None)` means the source answered but
/// had nothing for that field, `Err` means the fetch itself failed.
pub trait FieldFetcher: Send + Sync {
    fn fetch_title(&self, id: &PatentId) -> Result<Option<String>, PatentError>;
    fn fetch_abstract(&self, id: &PatentId) -> Result<Option<String>, PatentError>;
    fn fetch_cpc_classes(&self, id: &PatentId) -> Result<Option<Vec<String>>, PatentError>;
    fn fetch_first_claim(&self, id: &PatentId) -> Result<Option<String>, PatentError>;
    fn fetch_front_image(&self, id: &PatentId) -> Result<Option<FrontImage>, PatentError>;

    /// Canonical remote reference for `id`, used in logs.
    fn reference(&self, id: &PatentId) -> String {
        patent_url(DEFAULT_BASE_URL, id)
    }
}

pub fn patent_url(base_url: &str, id: &PatentId) -> String {
    format!(
        "{}/patent/{id}/en?oq={id}",
        base_url.trim_end_matches('/'),
        id = id.as_str()
    )
}

/// Fields extracted from one patent page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatentPage {
    pub title: Option<String>,
    pub abstract_text: Option<String>,
    pub cpc_classes: Vec<String>,
    pub first_claim: Option<String>,
    pub image_url: Option<String>,
}

pub fn extract_page(html: &str) -> PatentPage {
    let doc = Html::parse_document(html);
    PatentPage {
        title: extract_title(&doc),
        abstract_text: first_text(
            &doc,
            &["section[itemprop=\"abstract\"] div.abstract", "div.abstract"],
        ),
        cpc_classes: extract_cpc_classes(&doc),
        first_claim: extract_first_claim(&doc),
        image_url: extract_image_url(&doc),
    }
}

fn extract_title(doc: &Html) -> Option<String> {
    first_text(doc, &["h1#title", "span[itemprop=\"title\"]"]).or_else(|| {
        first_attr(doc, "meta[name=\"DC.title\"]", "content").map(|title| normalize_text(&title))
    })
}

/// Leaf CPC codes in page order, deduplicated.
fn extract_cpc_classes(doc: &Html) -> Vec<String> {
    let classification = selector("li[itemprop=\"classifications\"]");
    let code = selector("span[itemprop=\"Code\"]");
    let leaf = selector("meta[itemprop=\"Leaf\"]");

    let mut codes = Vec::new();
    for item in doc.select(&classification) {
        if item.select(&leaf).next().is_none() {
            continue;
        }
        let Some(value) = item.select(&code).next().map(element_text) else {
            continue;
        };
        if cpc_regex().is_match(&value) && !codes.contains(&value) {
            codes.push(value);
        }
    }
    codes
}

fn extract_first_claim(doc: &Html) -> Option<String> {
    first_text(
        doc,
        &[
            "section[itemprop=\"claims\"] div.claim[num=\"00001\"]",
            "section[itemprop=\"claims\"] div.claim",
            "div.claim",
        ],
    )
}

fn extract_image_url(doc: &Html) -> Option<String> {
    first_attr(doc, "li[itemprop=\"images\"] meta[itemprop=\"full\"]", "content")
        .or_else(|| first_attr(doc, "img[itemprop=\"thumbnail\"]", "src"))
        .or_else(|| first_attr(doc, "meta[property=\"og:image\"]", "content"))
}

fn first_text(doc: &Html, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|sel| {
        doc.select(&selector(sel))
            .map(element_text)
            .find(|text| !text.is_empty())
    })
}

fn first_attr(doc: &Html, sel: &str, attr: &str) -> Option<String> {
    doc.select(&selector(sel))
        .filter_map(|el| el.value().attr(attr))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

fn element_text(el: ElementRef<'_>) -> String {
    normalize_text(&el.text().collect::<String>())
}

fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn selector(sel: &str) -> Selector {
    Selector::parse(sel).unwrap()
}

fn cpc_regex() -> &'static Regex {
    static CPC: OnceLock<Regex> = OnceLock::new();
    CPC.get_or_init(|| Regex::new(r"^[A-HY]\d{2}[A-Z](\d{1,4}(/\d{1,6})?)?$").unwrap())
}

/// Image extension from the URL path, then the content type, then `png`.
pub fn image_extension(url: &str, content_type: Option<&str>) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let from_url = path
        .rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| {
            matches!(
                ext.as_str(),
                "png" | "jpg" | "jpeg" | "gif" | "tif" | "tiff" | "webp"
            )
        });
    if let Some(ext) = from_url {
        return ext;
    }
    let from_type = content_type
        .and_then(|value| value.split(';').next())
        .map(str::trim)
        .and_then(|mime| match mime {
            "image/png" => Some("png"),
            "image/jpeg" => Some("jpg"),
            "image/gif" => Some("gif"),
            "image/tiff" => Some("tif"),
            "image/webp" => Some("webp"),
            _ => None,
        });
    from_type.unwrap_or("png").to_string()
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: None,
        }
    }
}

/// Blocking client for Google Patents pages.
///
/// The five field operations for one id share a single page download: the
/// last extracted page is kept until a different id is requested.
pub struct GooglePatentsClient {
    client: Client,
    base_url: String,
    page: Mutex<Option<(PatentId, PatentPage)>>,
}

impl GooglePatentsClient {
    pub fn new(options: ClientOptions) -> Result<Self, PatentError> {
        let agent = options
            .user_agent
            .unwrap_or_else(|| format!("patcite/{}", env!("CARGO_PKG_VERSION")));
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&agent).map_err(|err| PatentError::FetchHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(options.timeout)
            .build()
            .map_err(|err| PatentError::FetchHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: options.base_url,
            page: Mutex::new(None),
        })
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, PatentError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .status()
            .canonical_reason()
            .unwrap_or("patent page request failed")
            .to_string();
        Err(PatentError::FetchStatus { status, message })
    }

    fn with_page<T>(
        &self,
        id: &PatentId,
        read: impl FnOnce(&PatentPage) -> T,
    ) -> Result<T, PatentError> {
        let mut guard = self
            .page
            .lock()
            .map_err(|_| PatentError::FetchHttp("page cache poisoned".to_string()))?;
        if let Some((cached, page)) = guard.as_ref() {
            if cached == id {
                return Ok(read(page));
            }
        }
        *guard = None;

        let url = patent_url(&self.base_url, id);
        let start = Instant::now();
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| PatentError::FetchHttp(err.to_string()))?;
        let body = Self::handle_status(response)?
            .text()
            .map_err(|err| PatentError::FetchHttp(err.to_string()))?;
        tracing::debug!(
            patent = id.as_str(),
            latency_ms = start.elapsed().as_millis() as u64,
            "fetched patent page"
        );

        let page = extract_page(&body);
        let value = read(&page);
        *guard = Some((id.clone(), page));
        Ok(value)
    }
}

impl FieldFetcher for GooglePatentsClient {
    fn fetch_title(&self, id: &PatentId) -> Result<Option<String>, PatentError> {
        self.with_page(id, |page| page.title.clone())
    }

    fn fetch_abstract(&self, id: &PatentId) -> Result<Option<String>, PatentError> {
        self.with_page(id, |page| page.abstract_text.clone())
    }

    fn fetch_cpc_classes(&self, id: &PatentId) -> Result<Option<Vec<String>>, PatentError> {
        self.with_page(id, |page| {
            (!page.cpc_classes.is_empty()).then(|| page.cpc_classes.clone())
        })
    }

    fn fetch_first_claim(&self, id: &PatentId) -> Result<Option<String>, PatentError> {
        self.with_page(id, |page| page.first_claim.clone())
    }

    fn fetch_front_image(&self, id: &PatentId) -> Result<Option<FrontImage>, PatentError> {
        let Some(url) = self.with_page(id, |page| page.image_url.clone())? else {
            return Ok(None);
        };
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| PatentError::AssetUnavailable(format!("{url}: {err}")))?;
        let response = Self::handle_status(response)?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .map_err(|err| PatentError::AssetUnavailable(format!("{url}: {err}")))?;
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(FrontImage {
            bytes: bytes.to_vec(),
            extension: image_extension(&url, content_type.as_deref()),
        }))
    }

    fn reference(&self, id: &PatentId) -> String {
        patent_url(&self.base_url, id)
    }
}
