use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::ids::UserId;

pub const MIN_HEIGHT_CM: u16 = 50;
pub const MAX_HEIGHT_CM: u16 = 250;
const MAX_BIO_LEN: usize = 2_000;
const MAX_LIST_ITEMS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Female,
    Male,
    NonBinary,
    Other,
}

impl Gender {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Female => "female",
            Self::Male => "male",
            Self::NonBinary => "non-binary",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    #[default]
    Public,
    Hidden,
}

impl Visibility {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "PUBLIC",
            Self::Hidden => "HIDDEN",
        }
    }
}

/// Details only revealed under a granted contact permission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Row of `talent_profiles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalentProfile {
    pub user_id: UserId,
    pub stage_name: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub height_cm: Option<u16>,
    pub city: String,
    pub country: String,
    pub skills: Vec<String>,
    pub languages: Vec<String>,
    pub bio: Option<String>,
    pub contact: ContactDetails,
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TalentProfile {
    pub fn display_name(&self) -> String {
        match &self.stage_name {
            Some(stage) => stage.clone(),
            None => format!("{} {}", self.first_name, self.last_name),
        }
    }

    pub fn location(&self) -> String {
        format!("{}, {}", self.city, self.country)
    }

    pub fn age_on(&self, day: NaiveDate) -> Option<u32> {
        self.birth_date.and_then(|born| day.years_since(born))
    }

    /// Public view; `contact` is included only when `reveal_contact` is set.
    pub fn view(&self, reveal_contact: bool, today: NaiveDate) -> TalentProfileView {
        TalentProfileView {
            user_id: self.user_id,
            display_name: self.display_name(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            age: self.age_on(today),
            gender: self.gender,
            height_cm: self.height_cm,
            city: self.city.clone(),
            country: self.country.clone(),
            skills: self.skills.clone(),
            languages: self.languages.clone(),
            bio: self.bio.clone(),
            visibility: self.visibility,
            contact: reveal_contact.then(|| self.contact.clone()),
            contact_visible: reveal_contact,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalentProfileView {
    pub user_id: UserId,
    pub display_name: String,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub height_cm: Option<u16>,
    pub city: String,
    pub country: String,
    pub skills: Vec<String>,
    pub languages: Vec<String>,
    pub bio: Option<String>,
    pub visibility: Visibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactDetails>,
    pub contact_visible: bool,
    pub updated_at: DateTime<Utc>,
}

/// Client payload for creating or replacing a talent profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalentProfileInput {
    #[serde(default)]
    pub stage_name: Option<String>,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub height_cm: Option<u16>,
    pub city: String,
    pub country: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub contact: ContactDetails,
    #[serde(default)]
    pub visibility: Visibility,
}

impl TalentProfileInput {
    pub fn validate(&self, today: NaiveDate) -> Result<(), ServiceError> {
        required("first_name", &self.first_name)?;
        required("last_name", &self.last_name)?;
        required("city", &self.city)?;
        required("country", &self.country)?;

        if let Some(height) = self.height_cm {
            if !(MIN_HEIGHT_CM..=MAX_HEIGHT_CM).contains(&height) {
                return Err(ServiceError::validation(format!(
                    "height_cm must be between {MIN_HEIGHT_CM} and {MAX_HEIGHT_CM}"
                )));
            }
        }
        if let Some(born) = self.birth_date {
            if born > today {
                return Err(ServiceError::validation("birth_date cannot be in the future"));
            }
        }
        if self.bio.as_deref().map(|bio| bio.chars().count()).unwrap_or(0) > MAX_BIO_LEN {
            return Err(ServiceError::validation(format!(
                "bio must be at most {MAX_BIO_LEN} characters"
            )));
        }
        if self.skills.len() > MAX_LIST_ITEMS || self.languages.len() > MAX_LIST_ITEMS {
            return Err(ServiceError::validation(format!(
                "skills and languages are limited to {MAX_LIST_ITEMS} entries"
            )));
        }
        Ok(())
    }
}

/// Row of `agency_profiles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgencyProfile {
    pub user_id: UserId,
    pub company_name: String,
    pub website: Option<String>,
    pub city: String,
    pub country: String,
    pub description: Option<String>,
    pub contact: ContactDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgencyProfileInput {
    pub company_name: String,
    #[serde(default)]
    pub website: Option<String>,
    pub city: String,
    pub country: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub contact: ContactDetails,
}

impl AgencyProfileInput {
    pub fn validate(&self) -> Result<(), ServiceError> {
        required("company_name", &self.company_name)?;
        required("city", &self.city)?;
        required("country", &self.country)?;
        if let Some(website) = self.website.as_deref() {
            let website = website.trim();
            if !(website.starts_with("https://") || website.starts_with("http://")) {
                return Err(ServiceError::validation(
                    "website must start with http:// or https://",
                ));
            }
        }
        if self
            .description
            .as_deref()
            .map(|text| text.chars().count())
            .unwrap_or(0)
            > MAX_BIO_LEN
        {
            return Err(ServiceError::validation(format!(
                "description must be at most {MAX_BIO_LEN} characters"
            )));
        }
        Ok(())
    }
}

/// Trim, drop empties and de-duplicate case-insensitively, keeping order.
pub fn clean_list(values: &[String]) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        if cleaned
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(trimmed))
        {
            continue;
        }
        cleaned.push(trimmed.to_string());
    }
    cleaned
}

pub(crate) fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn required(field: &str, value: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        Err(ServiceError::validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}
