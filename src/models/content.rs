use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value, json};

use super::utc;
use crate::error::AppError;

/// Editable sections of the public website, keyed as they are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSection {
    Hero,
    Features,
    AboutUs,
    Programs,
}

impl ContentSection {
    pub const ALL: [ContentSection; 4] = [
        ContentSection::Hero,
        ContentSection::Features,
        ContentSection::AboutUs,
        ContentSection::Programs,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ContentSection::Hero => "heroSection",
            ContentSection::Features => "featuresSection",
            ContentSection::AboutUs => "aboutUsPage",
            ContentSection::Programs => "programsPageContent",
        }
    }

    pub fn parse(key: &str) -> Result<Self, AppError> {
        Self::ALL
            .into_iter()
            .find(|section| section.key() == key)
            .ok_or_else(|| AppError::NotFound(format!("Website section {} does not exist", key)))
    }

    /// Content served until an admin saves the section for the first time.
    pub fn defaults(&self) -> Map<String, Value> {
        let value = match self {
            ContentSection::Hero => json!({
                "title": "Welcome to CampusConnect Academy",
                "subtitle": "Nurturing bright futures through excellence in education, community, and character development.",
                "ctaButton1Text": "Learn More About Us",
                "ctaButton1Link": "/about",
                "ctaButton2Text": "Admissions Inquiry",
                "ctaButton2Link": "#admissions-inquiry",
            }),
            ContentSection::Features => json!({
                "pageTitle": "Why Choose CampusConnect Academy?",
                "features": [
                    { "title": "Holistic Education", "description": "Our curriculum focuses on academic rigor, character development, and extracurricular enrichment." },
                    { "title": "Engaged Parent Community", "description": "We foster strong partnerships with parents through open communication and involvement." },
                    { "title": "Dedicated Faculty", "description": "Our experienced educators are passionate about nurturing each student's potential." },
                ],
            }),
            ContentSection::AboutUs => json!({
                "pageTitle": "About CampusConnect Academy",
                "storyTitle": "Our Story",
                "missionTitle": "Our Mission",
                "missionStatement": "To provide an exceptional educational experience that empowers students to achieve academic excellence.",
                "visionTitle": "Our Vision",
                "visionStatement": "To be a leading educational institution recognized for its innovative teaching and vibrant community.",
            }),
            ContentSection::Programs => json!({
                "pageTitle": "Our Academic & Extracurricular Programs",
                "pageSubtitle": "A diverse range of programs designed to nurture well-rounded individuals.",
            }),
        };

        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WebsiteContent {
    pub section: String,
    pub body: Map<String, Value>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbWebsiteContent {
    pub section: Option<String>,
    pub body: Option<String>,
    pub updated_at: Option<NaiveDateTime>,
}

impl TryFrom<DbWebsiteContent> for WebsiteContent {
    type Error = AppError;

    fn try_from(db: DbWebsiteContent) -> Result<Self, Self::Error> {
        let body = match db.body.as_deref() {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str(raw)?,
            _ => Map::new(),
        };

        Ok(Self {
            section: db.section.unwrap_or_default(),
            body,
            updated_at: utc(db.updated_at),
        })
    }
}

/// Shallow merge: keys in `patch` overwrite, everything else is kept.
pub fn merge_content(mut current: Map<String, Value>, patch: Map<String, Value>) -> Map<String, Value> {
    for (key, value) in patch {
        current.insert(key, value);
    }
    current
}
