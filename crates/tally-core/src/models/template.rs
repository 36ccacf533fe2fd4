//! Hashtag templates — the concrete quota-gated resource.

use serde::{Deserialize, Serialize};

use crate::errors::{TallyError, TallyResult};

/// Upper bound on hashtags per template.
pub const MAX_HASHTAGS: usize = 30;

/// Default page size for template listings.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Maximum page size for template listings.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Social platform a template targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Instagram,
    Twitter,
    Facebook,
    Linkedin,
    #[default]
    All,
}

impl Platform {
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Instagram => "instagram",
            Self::Twitter => "twitter",
            Self::Facebook => "facebook",
            Self::Linkedin => "linkedin",
            Self::All => "all",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "instagram" => Some(Self::Instagram),
            "twitter" => Some(Self::Twitter),
            "facebook" => Some(Self::Facebook),
            "linkedin" => Some(Self::Linkedin),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

/// A stored hashtag template, owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashtagTemplate {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub hashtags: Vec<String>,
    pub category: Option<String>,
    pub platform: Platform,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for template creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTemplate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub platform: Platform,
}

impl NewTemplate {
    /// Input validation, run before any quota is consumed.
    pub fn validate(&self) -> TallyResult<()> {
        if self.name.trim().is_empty() {
            return Err(TallyError::InvalidInput(
                "template name must not be empty".to_string(),
            ));
        }
        if self.hashtags.is_empty() {
            return Err(TallyError::InvalidInput(
                "template must contain at least one hashtag".to_string(),
            ));
        }
        if self.hashtags.len() > MAX_HASHTAGS {
            return Err(TallyError::InvalidInput(format!(
                "template may contain at most {} hashtags, got {}",
                MAX_HASHTAGS,
                self.hashtags.len()
            )));
        }
        Ok(())
    }
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub hashtags: Option<Vec<String>>,
    pub category: Option<String>,
    pub platform: Option<Platform>,
}

impl TemplateUpdate {
    pub fn validate(&self) -> TallyResult<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(TallyError::InvalidInput(
                    "template name must not be empty".to_string(),
                ));
            }
        }
        if let Some(hashtags) = &self.hashtags {
            if hashtags.is_empty() || hashtags.len() > MAX_HASHTAGS {
                return Err(TallyError::InvalidInput(format!(
                    "template must contain between 1 and {} hashtags",
                    MAX_HASHTAGS
                )));
            }
        }
        Ok(())
    }
}

/// Listing filter; page size is clamped to `1..=MAX_PAGE_SIZE`.
#[derive(Debug, Clone, Default)]
pub struct TemplateFilter {
    pub category: Option<String>,
    /// `Some(Platform::All)` matches everything, same as `None`.
    pub platform: Option<Platform>,
    pub limit: Option<u32>,
    pub offset: u32,
}

impl TemplateFilter {
    pub fn page_size(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }
}

/// One page of a template listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatePage {
    pub templates: Vec<HashtagTemplate>,
    pub total_count: u64,
    pub has_more: bool,
}
