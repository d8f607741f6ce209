//! Activity data model.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Title used when a list item carries no usable title text.
pub const UNTITLED_ACTIVITY: &str = "(未命名活动)";

/// One entry of the public activity listing.
///
/// Text fields are whitespace-normalized and `None` (serialized as `null`)
/// rather than empty when the page has nothing for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Activity title, or the untitled placeholder.
    pub title: String,

    /// Tag line shown next to the title.
    pub tags: Option<String>,

    /// District / area label.
    pub area: Option<String>,

    /// Hosting venue.
    pub venue: Option<String>,

    /// Free-form date and time text as displayed on the page.
    pub date_time_text: Option<String>,

    /// Registration status (e.g. "报名中").
    pub status: Option<String>,

    /// View counter.
    pub hits: Option<u64>,

    /// Numeric activity id taken from the detail URL.
    pub id: Option<u64>,

    /// Absolute URL of the activity detail page.
    pub url: Option<String>,

    /// Absolute URL of the cover image.
    pub image: Option<String>,
}

impl Activity {
    /// Create a record with only a title set.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            tags: None,
            area: None,
            venue: None,
            date_time_text: None,
            status: None,
            hits: None,
            id: None,
            url: None,
            image: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_missing_fields_as_null() {
        let value = serde_json::to_value(Activity::titled("读书会")).unwrap();
        assert_eq!(value["title"], "读书会");
        assert!(value["dateTimeText"].is_null());
        assert!(value["hits"].is_null());
        assert!(value.as_object().unwrap().contains_key("tags"));
    }
}
