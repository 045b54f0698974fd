use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;

use crate::error::ServiceError;
use crate::ids::{JobId, UserId};
use crate::jobs::JobPost;
use crate::page::PageRequest;
use crate::profiles::{TalentProfile, Visibility};

use super::document::{SearchDocument, SearchKind, SearchQuery, SearchResults};
use super::index::SearchIndex;

/// Query string accepted by the search endpoints. `tags` is comma separated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

/// Keeps the index in sync with profiles and jobs and answers queries.
///
/// Indexing is secondary to the write that triggers it: failures are logged
/// and the originating operation still succeeds.
#[derive(Clone)]
pub struct SearchService {
    index: Arc<dyn SearchIndex>,
}

impl SearchService {
    pub fn new(index: Arc<dyn SearchIndex>) -> Self {
        Self { index }
    }

    pub fn talent_document(profile: &TalentProfile) -> SearchDocument {
        let mut body = profile.bio.clone().unwrap_or_default();
        for extra in profile.skills.iter().chain(profile.languages.iter()) {
            body.push(' ');
            body.push_str(extra);
        }

        let mut tags: Vec<String> = profile
            .skills
            .iter()
            .chain(profile.languages.iter())
            .map(|value| value.to_lowercase())
            .collect();
        if let Some(gender) = profile.gender {
            tags.push(gender.as_str().to_string());
        }

        SearchDocument {
            id: profile.user_id.to_string(),
            kind: SearchKind::Talent,
            title: profile.display_name(),
            body,
            tags,
            location: Some(profile.location()),
            updated_at: profile.updated_at,
        }
    }

    pub fn job_document(job: &JobPost) -> SearchDocument {
        let mut tags = vec![job.category.as_str().to_string()];
        if let Some(gender) = job.gender {
            tags.push(gender.as_str().to_string());
        }

        SearchDocument {
            id: job.id.to_string(),
            kind: SearchKind::Job,
            title: job.title.clone(),
            body: job.description.clone(),
            tags,
            location: Some(job.location.clone()),
            updated_at: job.updated_at,
        }
    }

    /// Index public profiles, drop hidden ones.
    pub fn sync_talent(&self, profile: &TalentProfile) {
        let result = match profile.visibility {
            Visibility::Public => self.index.upsert(Self::talent_document(profile)),
            Visibility::Hidden => self
                .index
                .remove(SearchKind::Talent, &profile.user_id.to_string()),
        };
        if let Err(err) = result {
            warn!(user_id = %profile.user_id, error = %err, "talent index sync failed");
        }
    }

    pub fn remove_talent(&self, user_id: UserId) {
        if let Err(err) = self.index.remove(SearchKind::Talent, &user_id.to_string()) {
            warn!(user_id = %user_id, error = %err, "talent index removal failed");
        }
    }

    /// Index open jobs, drop closed ones.
    pub fn sync_job(&self, job: &JobPost) {
        let result = if job.is_open() {
            self.index.upsert(Self::job_document(job))
        } else {
            self.index.remove(SearchKind::Job, &job.id.to_string())
        };
        if let Err(err) = result {
            warn!(job_id = %job.id, error = %err, "job index sync failed");
        }
    }

    pub fn remove_job(&self, job_id: JobId) {
        if let Err(err) = self.index.remove(SearchKind::Job, &job_id.to_string()) {
            warn!(job_id = %job_id, error = %err, "job index removal failed");
        }
    }

    pub fn search(
        &self,
        kind: SearchKind,
        params: SearchParams,
    ) -> Result<SearchResults, ServiceError> {
        let page = PageRequest {
            limit: params.limit,
            offset: params.offset,
        };
        let tags = params
            .tags
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let query = SearchQuery {
            kind,
            text: params.q.filter(|text| !text.trim().is_empty()),
            location: params.location,
            tags,
            limit: page.limit(),
            offset: page.offset(),
        };

        Ok(self.index.query(&query)?)
    }
}
