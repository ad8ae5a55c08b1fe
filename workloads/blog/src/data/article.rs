//! Article, taxonomy and about-page models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
}

/// A full article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: u64,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default = "published_default")]
    pub published: bool,
}

fn published_default() -> bool {
    true
}

impl Article {
    pub fn new(id: u64, title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: title.into(),
            content: content.into(),
            summary: None,
            created_at: now,
            updated_at: now,
            view_count: 0,
            tags: Vec::new(),
            category: None,
            published: true,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_tag(mut self, id: u64, name: impl Into<String>) -> Self {
        self.tags.push(Tag {
            id,
            name: name.into(),
        });
        self
    }

    pub fn with_category(mut self, id: u64, name: impl Into<String>) -> Self {
        self.category = Some(Category {
            id,
            name: name.into(),
        });
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self.updated_at = at;
        self
    }

    pub fn draft(mut self) -> Self {
        self.published = false;
        self
    }

    /// Summary, or the title when there is none.
    pub fn description(&self) -> &str {
        self.summary.as_deref().unwrap_or(&self.title)
    }

    pub fn list_item(&self) -> ArticleListItem {
        ArticleListItem {
            id: self.id,
            title: self.title.clone(),
            tags: self.tags.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// An article as shown in lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleListItem {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A category or tag with the number of published articles under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermCount {
    pub id: u64,
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMethod {
    #[serde(rename = "type")]
    pub kind: String,
    pub label: String,
    pub value: String,
}

/// About page content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct About {
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    #[serde(default)]
    pub contact_methods: Vec<ContactMethod>,
}

impl Default for About {
    fn default() -> Self {
        Self {
            title: "About".to_string(),
            content: "This is the about page. Edit it to tell readers who you are.".to_string(),
            summary: Some("About this blog".to_string()),
            contact_methods: vec![ContactMethod {
                kind: "email".to_string(),
                label: "Email".to_string(),
                value: "your-email@example.com".to_string(),
            }],
        }
    }
}

/// Long form date, e.g. `March 4, 2025`.
pub fn format_date(at: &DateTime<Utc>) -> String {
    at.format("%B %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_article_serializes_camel_case() {
        let at = Utc.with_ymd_and_hms(2025, 3, 4, 12, 0, 0).unwrap();
        let article = Article::new(1, "Hello", "Body").with_created_at(at);
        let json = serde_json::to_value(&article).unwrap();
        assert_eq!(json["createdAt"], "2025-03-04T12:00:00Z");
        assert_eq!(json["viewCount"], 0);
        assert!(json.get("summary").is_none());
    }

    #[test]
    fn test_description_falls_back_to_title() {
        let article = Article::new(1, "Hello", "Body");
        assert_eq!(article.description(), "Hello");
        assert_eq!(article.with_summary("Short").description(), "Short");
    }

    #[test]
    fn test_format_date() {
        let at = Utc.with_ymd_and_hms(2025, 3, 4, 0, 0, 0).unwrap();
        assert_eq!(format_date(&at), "March 4, 2025");
    }
}
