//! CSV export of a job's applicants for agencies working in spreadsheets.

use serde::Serialize;

use crate::profiles::TalentProfile;

use super::domain::JobApplication;

#[derive(Debug)]
pub enum ExportError {
    Csv(csv::Error),
    Encoding(std::string::FromUtf8Error),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Csv(err) => write!(f, "failed to write applicant CSV: {}", err),
            ExportError::Encoding(err) => write!(f, "applicant CSV is not valid UTF-8: {}", err),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Csv(err) => Some(err),
            ExportError::Encoding(err) => Some(err),
        }
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<std::string::FromUtf8Error> for ExportError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::Encoding(err)
    }
}

const HEADER: [&str; 7] = [
    "application_id",
    "talent_id",
    "display_name",
    "location",
    "status",
    "applied_at",
    "cover_letter",
];

#[derive(Debug, Serialize)]
struct ApplicantRow<'a> {
    application_id: String,
    talent_id: String,
    display_name: String,
    location: String,
    status: &'static str,
    applied_at: String,
    cover_letter: &'a str,
}

/// One row per application, in the order given. Applicants without a
/// profile keep their row with blank name and location. The header is
/// written even when nobody applied.
pub fn applications_csv(
    applications: &[(JobApplication, Option<TalentProfile>)],
) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(HEADER)?;

    for (application, profile) in applications {
        writer.serialize(ApplicantRow {
            application_id: application.id.to_string(),
            talent_id: application.talent_id.to_string(),
            display_name: profile
                .as_ref()
                .map(TalentProfile::display_name)
                .unwrap_or_default(),
            location: profile
                .as_ref()
                .map(TalentProfile::location)
                .unwrap_or_default(),
            status: application.status.as_str(),
            applied_at: application.created_at.to_rfc3339(),
            cover_letter: application.cover_letter.as_deref().unwrap_or(""),
        })?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Csv(err.into_error().into()))?;
    Ok(String::from_utf8(bytes)?)
}
