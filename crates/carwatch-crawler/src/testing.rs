//! In-process page double backed by static HTML, plus results-page fixtures.

use carwatch_browser::{BrowserError, PageActions, PageFactory, Result};
use carwatch_core::FeedSelectors;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Element handle: position of the element in document order on one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeElement {
    page: usize,
    ordinal: usize,
}

#[derive(Debug, Default)]
pub struct FakeStats {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
}

/// A site made of feed URLs, each a sequence of HTML pages. Clicking the
/// enabled "next" control moves to the following page.
pub struct FakePage {
    site: Arc<HashMap<String, Vec<String>>>,
    current: Mutex<Option<(String, usize)>>,
    clicks: Mutex<Vec<String>>,
    stats: Arc<FakeStats>,
    selectors: FeedSelectors,
}

impl FakePage {
    pub fn new(site: Arc<HashMap<String, Vec<String>>>, stats: Arc<FakeStats>) -> Self {
        Self {
            site,
            current: Mutex::new(None),
            clicks: Mutex::new(Vec::new()),
            stats,
            selectors: FeedSelectors::default(),
        }
    }

    pub fn single(feed_url: &str, pages: Vec<String>) -> Self {
        let site = HashMap::from([(feed_url.to_string(), pages)]);
        Self::new(Arc::new(site), Arc::new(FakeStats::default()))
    }

    pub fn clicks(&self) -> Vec<String> {
        self.clicks.lock().unwrap().clone()
    }

    fn current_html(&self) -> Result<(usize, String)> {
        let current = self.current.lock().unwrap();
        let (url, idx) = current
            .as_ref()
            .ok_or_else(|| BrowserError::NavigationError("no page loaded".to_string()))?;
        Ok((*idx, self.site[url][*idx].clone()))
    }

    fn select(&self, scope: Option<&FakeElement>, selector: &str) -> Result<Vec<FakeElement>> {
        let (page, source) = self.current_html()?;
        let html = Html::parse_document(&source);
        let parsed = Selector::parse(selector)
            .map_err(|e| BrowserError::ChromiumError(format!("{selector}: {e:?}")))?;
        let any = Selector::parse("*").unwrap();
        let all: Vec<ElementRef> = html.select(&any).collect();

        let found: Vec<ElementRef> = match scope {
            None => html.select(&parsed).collect(),
            Some(scope) if scope.page != page => {
                return Err(BrowserError::ChromiumError("stale element".to_string()))
            }
            Some(scope) => all[scope.ordinal].select(&parsed).collect(),
        };

        Ok(found
            .into_iter()
            .filter_map(|el| all.iter().position(|candidate| candidate.id() == el.id()))
            .map(|ordinal| FakeElement { page, ordinal })
            .collect())
    }

    fn with_element<T>(&self, element: &FakeElement, f: impl FnOnce(ElementRef) -> T) -> Result<T> {
        let (page, source) = self.current_html()?;
        if element.page != page {
            return Err(BrowserError::ChromiumError("stale element".to_string()));
        }
        let html = Html::parse_document(&source);
        let any = Selector::parse("*").unwrap();
        let el = html
            .select(&any)
            .nth(element.ordinal)
            .ok_or_else(|| BrowserError::ChromiumError("element gone".to_string()))?;
        Ok(f(el))
    }

    fn do_navigate(&self, url: &str) -> Result<()> {
        if !self.site.contains_key(url) {
            return Err(BrowserError::NavigationError(format!("{url}: 404")));
        }
        *self.current.lock().unwrap() = Some((url.to_string(), 0));
        Ok(())
    }

    fn do_click(&self, selector: &str) -> Result<()> {
        if self.select(None, selector)?.is_empty() {
            return Err(BrowserError::SelectorNotFound(selector.to_string()));
        }
        self.clicks.lock().unwrap().push(selector.to_string());

        if selector == self.selectors.next_page
            && self.select(None, &self.selectors.next_page_disabled)?.is_empty()
        {
            let mut current = self.current.lock().unwrap();
            if let Some((url, idx)) = current.as_mut() {
                if *idx + 1 < self.site[url.as_str()].len() {
                    *idx += 1;
                }
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl PageActions for FakePage {
    type Element = FakeElement;

    async fn navigate(&self, url: &str) -> Result<()> {
        self.do_navigate(url)
    }

    async fn wait_until_loaded(&self) -> Result<()> {
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<FakeElement>> {
        self.select(None, selector)
    }

    async fn find_all_in(&self, scope: &FakeElement, selector: &str) -> Result<Vec<FakeElement>> {
        self.select(Some(scope), selector)
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.do_click(selector)
    }

    async fn text_of(&self, element: &FakeElement) -> Result<String> {
        self.with_element(element, |el| el.text().collect::<String>())
    }

    async fn attribute_of(&self, element: &FakeElement, name: &str) -> Result<Option<String>> {
        self.with_element(element, |el| el.value().attr(name).map(str::to_string))
    }

    async fn current_url(&self) -> Result<String> {
        let current = self.current.lock().unwrap();
        Ok(current
            .as_ref()
            .map(|(url, idx)| format!("{url}#page{}", idx + 1))
            .unwrap_or_default())
    }

    async fn close(self) -> Result<()> {
        self.stats.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out `FakePage`s over a shared site map.
pub struct FakeFactory {
    site: Arc<HashMap<String, Vec<String>>>,
    pub stats: Arc<FakeStats>,
    fail_open: bool,
}

impl FakeFactory {
    pub fn new(site: HashMap<String, Vec<String>>) -> Self {
        Self {
            site: Arc::new(site),
            stats: Arc::new(FakeStats::default()),
            fail_open: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_open: true,
            ..Self::new(HashMap::new())
        }
    }
}

#[async_trait::async_trait]
impl PageFactory for FakeFactory {
    type Page = FakePage;

    async fn open_page(&self) -> Result<FakePage> {
        if self.fail_open {
            return Err(BrowserError::ChromiumError("browser crashed".to_string()));
        }
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakePage::new(self.site.clone(), self.stats.clone()))
    }
}

#[derive(Debug, Clone, Copy)]
pub enum NextControl {
    Enabled,
    Disabled,
    Absent,
}

/// One result row of a results page.
#[derive(Debug, Clone)]
pub struct RowFixture {
    id: i64,
    title: String,
    price_text: String,
    sale_text: Option<String>,
    details: Vec<(String, String)>,
    image: Option<String>,
    with_link: bool,
}

impl RowFixture {
    pub fn new(id: i64, title: &str, price: i64) -> Self {
        Self {
            id,
            title: title.to_string(),
            price_text: format!("{} €", thousands(price)),
            sale_text: None,
            details: Vec::new(),
            image: None,
            with_link: true,
        }
    }

    pub fn detail(mut self, label: &str, value: &str) -> Self {
        self.details.push((label.to_string(), value.to_string()));
        self
    }

    pub fn image(mut self, src: &str) -> Self {
        self.image = Some(src.to_string());
        self
    }

    pub fn sale(mut self, price: i64) -> Self {
        self.sale_text = Some(format!("{} €", thousands(price)));
        self
    }

    pub fn price_text(mut self, text: &str) -> Self {
        self.price_text = text.to_string();
        self
    }

    pub fn without_link(mut self) -> Self {
        self.with_link = false;
        self
    }

    fn html(&self) -> String {
        let mut out = String::from("<div class=\"GO-Results-Row\">");

        out.push_str("<div class=\"GO-Results-Photo\"><div><a>");
        if let Some(src) = &self.image {
            write!(out, "<img src=\"{src}\">").unwrap();
        }
        out.push_str("</a></div></div>");

        write!(
            out,
            "<div class=\"GO-Results-Naziv \"><span>{}</span></div>",
            self.title
        )
        .unwrap();

        out.push_str("<div class=\"GO-Results-Data\"><div><table><tbody>");
        for (label, value) in &self.details {
            write!(out, "<tr><td>{label}</td><td>{value}</td></tr>").unwrap();
        }
        out.push_str("</tbody></table></div></div>");

        out.push_str("<div class=\"GO-Results-PriceLogo\"><div>");
        match &self.sale_text {
            Some(sale) => write!(
                out,
                "<div class=\"GO-Results-Price-Akcija\">AKCIJA</div>\
                 <div class=\"GO-Results-Price-TXT-StaraCena\">{}</div>\
                 <div class=\"GO-Results-Price-TXT-AkcijaCena\">{sale}</div>",
                self.price_text
            )
            .unwrap(),
            None => write!(
                out,
                "<div class=\"GO-Results-Price-TXT-Regular\">{}</div>",
                self.price_text
            )
            .unwrap(),
        }
        out.push_str("</div></div>");

        if self.with_link {
            write!(
                out,
                "<a class=\"stretched-link\" href=\"../Ads/details.asp?id={}&amp;display=Audi\"></a>",
                self.id
            )
            .unwrap();
        }

        out.push_str("</div>");
        out
    }
}

fn thousands(value: i64) -> String {
    let digits = value.to_string();
    let mut out = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// A complete results page in the listing site's markup.
pub fn results_page(rows: &[RowFixture], next: NextControl) -> String {
    let mut out = String::from("<html><head><title>Rezultati</title></head><body><div id=\"results\">");
    for row in rows {
        out.push_str(&row.html());
    }
    out.push_str("</div>");

    let next_li = match next {
        NextControl::Enabled => "<li class=\"GO-Rounded-R\"><a>Naprej</a></li>",
        NextControl::Disabled => "<li class=\"GO-Rounded-R disabled\"><a>Naprej</a></li>",
        NextControl::Absent => "",
    };
    write!(
        out,
        "<ul id=\"GO-naviprevnext\"><li class=\"GO-Rounded-L\"><a>Nazaj</a></li>{next_li}</ul>"
    )
    .unwrap();

    out.push_str("</body></html>");
    out
}

#[test]
fn test_thousands() {
    assert_eq!(thousands(12_990), "12.990");
    assert_eq!(thousands(999), "999");
    assert_eq!(thousands(1_000_000), "1.000.000");
}
