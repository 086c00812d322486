//! Page extractor: turns one results page into structured records.
//!
//! The extractor only reads the current page state through [`PageActions`];
//! it never navigates. Capability errors propagate to the caller, which
//! decides whether the page is retried or skipped.

use crate::error::{CrawlError, Result};
use carwatch_browser::{site_origin, PageActions};
use carwatch_core::feeds::validate_feed_url;
use carwatch_core::{ExternalId, FeedSelectors, Record};
use indexmap::IndexMap;
use url::Url;

/// Records found on one page, keyed by external id in page order.
#[derive(Debug, Clone, Default)]
pub struct ExtractedPage {
    pub records: IndexMap<ExternalId, Record>,
    pub has_more_pages: bool,
}

/// Labels of the per-listing details table that map onto `Record` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailField {
    Year,
    Kilometers,
    Fuel,
    Transmission,
    Engine,
}

impl DetailField {
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().trim_end_matches(':') {
            "1.registracija" => Some(Self::Year),
            "Prevoženih" => Some(Self::Kilometers),
            "Gorivo" => Some(Self::Fuel),
            "Menjalnik" => Some(Self::Transmission),
            "Motor" => Some(Self::Engine),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Details {
    year: Option<i32>,
    kilometers: Option<i64>,
    fuel: Option<String>,
    transmission: Option<String>,
    engine: Option<String>,
}

impl Details {
    fn set(&mut self, field: DetailField, value: &str) {
        match field {
            DetailField::Year => {
                self.year = parse_number(value).and_then(|n| i32::try_from(n).ok());
            }
            DetailField::Kilometers => self.kilometers = parse_number(value),
            DetailField::Fuel => self.fuel = non_empty(leading_token(value)),
            DetailField::Transmission => self.transmission = non_empty(leading_token(value)),
            DetailField::Engine => self.engine = non_empty(value.trim()),
        }
    }
}

/// Extracts listings from results pages of one feed.
#[derive(Debug, Clone)]
pub struct PageExtractor {
    selectors: FeedSelectors,
    origin: Url,
}

impl PageExtractor {
    /// Create an extractor for a feed. Relative links are resolved against
    /// the feed's site origin.
    pub fn new(selectors: FeedSelectors, feed_url: &str) -> Result<Self> {
        validate_feed_url(feed_url)?;
        let origin = site_origin(feed_url)?;
        Ok(Self { selectors, origin })
    }

    #[must_use]
    pub fn selectors(&self) -> &FeedSelectors {
        &self.selectors
    }

    /// Extract every result row of the current page and report whether a
    /// usable "next" control exists.
    pub async fn extract<P: PageActions>(&self, page: &P) -> Result<ExtractedPage> {
        let url = page.current_url().await.unwrap_or_default();
        tracing::debug!("Parsing page {}", url);

        self.dismiss_cookie_overlay(page).await?;
        page.wait_until_loaded().await?;

        let mut records = IndexMap::new();
        for row in page.find_all(&self.selectors.result_row).await? {
            let record = self.parse_row(page, &row).await?;
            tracing::debug!(
                "Listing {}: {} | {} | year {:?} | {:?} km | {:?} | {:?} | {:?}",
                record.external_id,
                record.title,
                record.price,
                record.year,
                record.kilometers,
                record.fuel,
                record.transmission,
                record.engine
            );
            records.insert(record.external_id, record);
        }

        let has_more_pages = self.has_more_pages(page).await?;
        tracing::debug!("More pages: {}", has_more_pages);
        tracing::info!("Parsed {} listings from {}", records.len(), url);

        Ok(ExtractedPage {
            records,
            has_more_pages,
        })
    }

    async fn dismiss_cookie_overlay<P: PageActions>(&self, page: &P) -> Result<()> {
        if page.find(&self.selectors.cookie_decline).await?.is_some() {
            tracing::debug!("Declining cookie consent");
            page.click(&self.selectors.cookie_decline).await?;
        }
        Ok(())
    }

    async fn has_more_pages<P: PageActions>(&self, page: &P) -> Result<bool> {
        if page.find(&self.selectors.next_page).await?.is_none() {
            return Ok(false);
        }
        Ok(page
            .find(&self.selectors.next_page_disabled)
            .await?
            .is_none())
    }

    async fn parse_row<P: PageActions>(&self, page: &P, row: &P::Element) -> Result<Record> {
        let title_el = page
            .find_in(row, &self.selectors.title)
            .await?
            .ok_or_else(|| CrawlError::extraction("result row without title"))?;
        let title = page.text_of(&title_el).await?.trim().to_string();

        let image_url = match page.find_in(row, &self.selectors.image).await? {
            Some(img) => page
                .attribute_of(&img, "src")
                .await?
                .and_then(|src| match canonicalize_url(&self.origin, &src) {
                    Ok(url) => Some(url.to_string()),
                    Err(e) => {
                        tracing::warn!("Ignoring image for '{}': {}", title, e);
                        None
                    }
                }),
            None => None,
        };

        let details = self.parse_details(page, row).await?;

        let link = page
            .find_in(row, &self.selectors.detail_link)
            .await?
            .ok_or_else(|| CrawlError::extraction(format!("'{title}' has no detail link")))?;
        let href = page
            .attribute_of(&link, "href")
            .await?
            .ok_or_else(|| CrawlError::extraction(format!("'{title}' detail link has no href")))?;
        let url = canonicalize_url(&self.origin, &href)?;
        let external_id = external_id_from_url(&url)?;

        let price = self.parse_price(page, row).await?;

        Ok(Record {
            external_id,
            title,
            year: details.year,
            kilometers: details.kilometers,
            transmission: details.transmission,
            fuel: details.fuel,
            engine: details.engine,
            url: url.to_string(),
            price,
            image_url,
        })
    }

    async fn parse_details<P: PageActions>(&self, page: &P, row: &P::Element) -> Result<Details> {
        let mut details = Details::default();

        for detail_row in page.find_all_in(row, &self.selectors.detail_rows).await? {
            let cells = page
                .find_all_in(&detail_row, &self.selectors.detail_cells)
                .await?;
            let [label_cell, value_cell, ..] = cells.as_slice() else {
                tracing::warn!("Skipping details row with {} cells", cells.len());
                continue;
            };

            let label = page.text_of(label_cell).await?;
            let value = page.text_of(value_cell).await?;

            match DetailField::from_label(&label) {
                Some(field) => details.set(field, &value),
                None => tracing::warn!("Unknown table details name: {}", label.trim()),
            }
        }

        Ok(details)
    }

    async fn parse_price<P: PageActions>(&self, page: &P, row: &P::Element) -> Result<i64> {
        let group = page
            .find_in(row, &self.selectors.price_group)
            .await?
            .ok_or_else(|| CrawlError::extraction("result row without price"))?;

        let on_sale = page
            .find_in(&group, &self.selectors.sale_marker)
            .await?
            .is_some();
        let price_selector = if on_sale {
            &self.selectors.sale_price
        } else {
            &self.selectors.regular_price
        };

        let price_el = page
            .find_in(&group, price_selector)
            .await?
            .ok_or_else(|| CrawlError::extraction(format!("price element {price_selector} missing")))?;
        let text = page.text_of(&price_el).await?;

        parse_number(&text)
            .ok_or_else(|| CrawlError::extraction(format!("unreadable price '{}'", text.trim())))
    }
}

/// First whitespace-delimited token of a "value unit" string.
#[must_use]
pub fn leading_token(text: &str) -> &str {
    text.split_whitespace().next().unwrap_or("")
}

/// Integer value of the leading token with thousands separators removed,
/// e.g. `"12.990 €"` is `12990`.
#[must_use]
pub fn parse_number(text: &str) -> Option<i64> {
    let digits: String = leading_token(text)
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

/// Resolve an href against the site origin. Absolute URLs are kept.
pub fn canonicalize_url(origin: &Url, href: &str) -> Result<Url> {
    origin
        .join(href.trim())
        .map_err(|e| CrawlError::extraction(format!("invalid link '{href}': {e}")))
}

/// The listing's external id: the `id` query parameter of its detail URL.
pub fn external_id_from_url(url: &Url) -> Result<ExternalId> {
    let raw = url
        .query_pairs()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| CrawlError::extraction(format!("no id parameter in {url}")))?;

    raw.parse::<ExternalId>()
        .map_err(|e| CrawlError::extraction(format!("{e} in {url}")))
}
