//! HTML-to-record extraction for the activity listing page.
//!
//! The listing is a `<ul id="main_list_result">` whose direct `<li>` children
//! each describe one activity. Every field is looked up independently inside
//! its item, so a missing node only nulls that one field.

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use super::error::{ActivityError, ActivityResult};
use super::model::{Activity, UNTITLED_ACTIVITY};
use super::text::{absolute_url, activity_id, clean_text, parse_count};

/// Listing container. Its absence means the page layout changed.
pub const CONTAINER: &str = "#main_list_result";
/// One activity per direct child of the container.
pub const ITEMS: &str = "#main_list_result > li";
/// Title link; its href is the primary detail link.
pub const TITLE_LINK: &str = ".txt2 h2 a";
/// Cover image link, fallback detail link.
pub const IMAGE_LINK: &str = ".img a";
/// Tag line nested inside the title link.
pub const TAG: &str = "span";
pub const AREA: &str = ".area";
pub const VENUE: &str = ".txt2 h3";
/// Details line holding the date text, an emphasis label and a status link.
pub const DETAILS: &str = ".txt2 h4";
/// Nodes stripped from the details line before reading the date text.
pub const DETAILS_NOISE: &str = "a, em";
/// Status link inside the details line.
pub const STATUS: &str = "a";
pub const HITS: &str = ".hits";
pub const IMAGE: &str = ".img_con img";

/// Compiled selectors for the listing page.
#[derive(Debug)]
struct Selectors {
    container: Selector,
    items: Selector,
    title_link: Selector,
    image_link: Selector,
    tag: Selector,
    area: Selector,
    venue: Selector,
    details: Selector,
    details_noise: Selector,
    status: Selector,
    hits: Selector,
    image: Selector,
}

impl Selectors {
    fn compile() -> ActivityResult<Self> {
        Ok(Self {
            container: compile(CONTAINER)?,
            items: compile(ITEMS)?,
            title_link: compile(TITLE_LINK)?,
            image_link: compile(IMAGE_LINK)?,
            tag: compile(TAG)?,
            area: compile(AREA)?,
            venue: compile(VENUE)?,
            details: compile(DETAILS)?,
            details_noise: compile(DETAILS_NOISE)?,
            status: compile(STATUS)?,
            hits: compile(HITS)?,
            image: compile(IMAGE)?,
        })
    }
}

fn compile(selector: &'static str) -> ActivityResult<Selector> {
    Selector::parse(selector)
        .map_err(|e| ActivityError::parse(format!("invalid selector `{selector}`: {e}")))
}

/// Turns a listing page into [`Activity`] records.
#[derive(Debug)]
pub struct Extractor {
    selectors: Selectors,
    base: Url,
}

impl Extractor {
    /// Create an extractor resolving relative links against `base`.
    pub fn new(base: Url) -> ActivityResult<Self> {
        Ok(Self {
            selectors: Selectors::compile()?,
            base,
        })
    }

    /// Create an extractor from a base URL string.
    pub fn with_base(base: &str) -> ActivityResult<Self> {
        let base = Url::parse(base)
            .map_err(|e| ActivityError::invalid_source(format!("base URL `{base}`: {e}")))?;
        Self::new(base)
    }

    /// Base URL used for link resolution.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Extract all activities in document order.
    ///
    /// Fails only when the listing container is missing from the document.
    pub fn extract(&self, html: &str) -> ActivityResult<Vec<Activity>> {
        let document = Html::parse_document(html);

        if !document.errors.is_empty() {
            debug!(count = document.errors.len(), "HTML parser recovered from errors");
        }

        if document.select(&self.selectors.container).next().is_none() {
            warn!("Listing container `{}` not found", CONTAINER);
            return Err(ActivityError::parse(format!(
                "listing container `{CONTAINER}` not found"
            )));
        }

        let activities: Vec<Activity> = document
            .select(&self.selectors.items)
            .map(|item| self.extract_item(item))
            .collect();

        debug!(count = activities.len(), "Extracted activities");
        Ok(activities)
    }

    fn extract_item(&self, item: ElementRef<'_>) -> Activity {
        let s = &self.selectors;

        let href = first_attr(item, &s.title_link, "href")
            .or_else(|| first_attr(item, &s.image_link, "href"));
        let url = absolute_url(href, &self.base);
        let id = url.as_deref().and_then(activity_id);

        let title = cleaned(&joined_text(item, &s.title_link, Some(&s.tag)))
            .unwrap_or_else(|| UNTITLED_ACTIVITY.to_string());

        let tags = item
            .select(&s.title_link)
            .flat_map(|link| link.select(&s.tag))
            .map(|tag| tag.text().collect::<String>())
            .collect::<String>();

        let details_status = item
            .select(&s.details)
            .flat_map(|details| details.select(&s.status))
            .map(|link| link.text().collect::<String>())
            .collect::<String>();

        Activity {
            title,
            tags: cleaned(&tags),
            area: cleaned(&joined_text(item, &s.area, None)),
            venue: cleaned(&joined_text(item, &s.venue, None)),
            date_time_text: cleaned(&joined_text(item, &s.details, Some(&s.details_noise))),
            status: cleaned(&details_status),
            hits: parse_count(&joined_text(item, &s.hits, None)),
            id,
            url,
            image: absolute_url(first_attr(item, &s.image, "src"), &self.base),
        }
    }
}

fn cleaned(text: &str) -> Option<String> {
    clean_text(Some(text))
}

/// Attribute of the first match that has it set to something non-blank.
fn first_attr<'a>(scope: ElementRef<'a>, selector: &Selector, attr: &str) -> Option<&'a str> {
    scope
        .select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .filter(|value| !value.trim().is_empty())
}

/// Concatenated text of every match, skipping text inside `exclude` descendants.
fn joined_text(scope: ElementRef<'_>, selector: &Selector, exclude: Option<&Selector>) -> String {
    scope
        .select(selector)
        .map(|el| match exclude {
            Some(exclude) => text_without(el, exclude),
            None => el.text().collect(),
        })
        .collect()
}

fn text_without(el: ElementRef<'_>, exclude: &Selector) -> String {
    let skipped: Vec<_> = el.select(exclude).map(|e| *e).collect();

    el.descendants()
        .filter(|node| !node.ancestors().any(|ancestor| skipped.contains(&ancestor)))
        .filter_map(|node| node.value().as_text().map(|text| &**text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = include_str!("fixtures/listing.html");

    fn extractor() -> Extractor {
        Extractor::with_base("https://cdyouth.cdcyl.org.cn").unwrap()
    }

    fn is_normalized(text: &str) -> bool {
        !text.is_empty()
            && text.trim() == text
            && !text.contains("  ")
            && !text.chars().any(|c| c.is_whitespace() && c != ' ')
    }

    #[test]
    fn test_extracts_items_in_document_order() {
        let activities = extractor().extract(LISTING).unwrap();
        let titles: Vec<_> = activities.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "周末 读书会",
                "青年志愿服务",
                "亲子 手工课",
                "活动四",
                "活动五",
                "活动六",
                UNTITLED_ACTIVITY,
                "活动八",
                UNTITLED_ACTIVITY,
                "活动十",
            ]
        );
    }

    #[test]
    fn test_first_item_fields() {
        let activities = extractor().extract(LISTING).unwrap();
        let first = &activities[0];
        assert_eq!(first.title, "周末 读书会");
        assert_eq!(first.tags.as_deref(), Some("阅读 · 公益"));
        assert_eq!(first.area.as_deref(), Some("锦江区"));
        assert_eq!(first.venue.as_deref(), Some("锦江区青年之家"));
        assert_eq!(first.date_time_text.as_deref(), Some("2025-06-01 09:00 - 11:00"));
        assert_eq!(first.status.as_deref(), Some("报名中"));
        assert_eq!(first.hits, Some(1234));
        assert_eq!(first.id, Some(1001));
        assert_eq!(
            first.url.as_deref(),
            Some("https://cdyouth.cdcyl.org.cn/activity/1001")
        );
        assert_eq!(
            first.image.as_deref(),
            Some("https://cdyouth.cdcyl.org.cn/upload/1001.png")
        );
    }

    #[test]
    fn test_absent_fields_are_null() {
        let activities = extractor().extract(LISTING).unwrap();

        let second = &activities[1];
        assert_eq!(second.tags, None);
        assert_eq!(second.area, None);
        assert_eq!(second.status, None);
        assert_eq!(second.image, None);
        assert_eq!(second.date_time_text.as_deref(), Some("2025-06-02 14:00"));
        assert_eq!(second.hits, Some(56));
        assert_eq!(second.id, Some(1002));

        let third = &activities[2];
        assert_eq!(third.tags, None, "blank tag span must not become an empty string");
        assert_eq!(third.date_time_text, None);
        assert_eq!(third.status.as_deref(), Some("已结束"));
        assert_eq!(third.hits, None);
        assert_eq!(
            third.url.as_deref(),
            Some("https://cdyouth.cdcyl.org.cn/activity/1003")
        );
        assert_eq!(
            third.image.as_deref(),
            Some("https://cdyouth.cdcyl.org.cn/upload/1003.jpg")
        );
    }

    #[test]
    fn test_falls_back_to_image_link() {
        let activities = extractor().extract(LISTING).unwrap();
        let seventh = &activities[6];
        assert_eq!(seventh.title, UNTITLED_ACTIVITY);
        assert_eq!(
            seventh.url.as_deref(),
            Some("https://cdn.example.com/activity/2007")
        );
        assert_eq!(seventh.id, Some(2007));
        assert_eq!(seventh.date_time_text.as_deref(), Some("2025-06-07"));
    }

    #[test]
    fn test_item_without_links_is_kept() {
        let activities = extractor().extract(LISTING).unwrap();
        let ninth = &activities[8];
        assert_eq!(ninth.title, UNTITLED_ACTIVITY);
        assert_eq!(ninth.url, None);
        assert_eq!(ninth.id, None);
        assert_eq!(ninth.tags, None);
        assert_eq!(ninth.area.as_deref(), Some("高新区"));
        assert_eq!(ninth.image.as_deref(), Some("https://cdn.example.com/x.png"));
    }

    #[test]
    fn test_missing_title_link_produces_placeholder_record() {
        let html = r#"<ul id="main_list_result"><li><div class="txt2"><h3>某场馆</h3></div></li></ul>"#;
        let activities = extractor().extract(html).unwrap();
        assert_eq!(activities.len(), 1);
        let only = &activities[0];
        assert_eq!(only.title, UNTITLED_ACTIVITY);
        assert_eq!(only.tags, None);
        assert_eq!(only.url, None);
        assert_eq!(only.id, None);
        assert_eq!(only.venue.as_deref(), Some("某场馆"));
    }

    #[test]
    fn test_text_fields_are_normalized() {
        let activities = extractor().extract(LISTING).unwrap();
        for activity in &activities {
            assert!(is_normalized(&activity.title), "title {:?}", activity.title);
            for field in [
                &activity.tags,
                &activity.area,
                &activity.venue,
                &activity.date_time_text,
                &activity.status,
            ] {
                if let Some(text) = field {
                    assert!(is_normalized(text), "field {:?}", text);
                }
            }
        }
    }

    #[test]
    fn test_ignores_items_outside_container() {
        let activities = extractor().extract(LISTING).unwrap();
        assert_eq!(activities.len(), 10);
        assert!(activities.iter().all(|a| a.title != "导航链接"));
        assert!(activities.iter().all(|a| a.id != Some(9999)));
    }

    #[test]
    fn test_nested_lists_are_not_items() {
        let html = r#"
            <ul id="main_list_result">
              <li><div class="txt2"><h2><a href="/activity/1">外层</a></h2>
                <ul><li>内层</li></ul>
              </div></li>
            </ul>"#;
        let activities = extractor().extract(html).unwrap();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].title, "外层");
    }

    #[test]
    fn test_empty_container_yields_no_records() {
        let activities = extractor()
            .extract(r#"<div><ul id="main_list_result"></ul></div>"#)
            .unwrap();
        assert!(activities.is_empty());
    }

    #[test]
    fn test_missing_container_is_parse_error() {
        let result = extractor().extract("<html><body><p>维护中</p></body></html>");
        assert!(matches!(result, Err(ActivityError::Parse(_))));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            Extractor::with_base("not a url"),
            Err(ActivityError::InvalidSource(_))
        ));
    }
}
