use crate::dashboard::*;

use serde::{Deserialize, Serialize};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct MeetingSettings {
    #[serde(rename = "organizationName")]
    pub organization_name: String,
    #[serde(rename = "meetingTitle")]
    pub meeting_title: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
}

/// Written in the summary, to tell which meeting the results are for.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub organization: String,
    pub meeting: String,
    pub candidates: usize,
    pub resolutions: u32,
}

/// The one account allowed to generate the results.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AdminSettings {
    pub email: String,
    /// `local` or `firebase`
    pub provider: String,
    /// Hexadecimal SHA-256 digest of the password, for the `local` provider.
    #[serde(rename = "passwordSha256")]
    pub password_sha256: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseSettings {
    #[serde(rename = "apiKey")]
    pub api_key: Option<String>,
    /// Name of the environment variable holding the API key, if it is not in the file.
    #[serde(rename = "apiKeyEnv")]
    pub api_key_env: Option<String>,
    #[serde(rename = "projectId")]
    pub project_id: String,
    #[serde(rename = "databaseId")]
    pub database_id: Option<String>,
    #[serde(rename = "authEndpoint")]
    pub auth_endpoint: Option<String>,
    #[serde(rename = "firestoreEndpoint")]
    pub firestore_endpoint: Option<String>,
}

impl FirebaseSettings {
    pub fn api_key(&self) -> DashResult<String> {
        if let Some(k) = self.api_key.clone() {
            return Ok(k);
        }
        self.api_key_env
            .as_ref()
            .and_then(|var| std::env::var(var).ok())
            .context(MissingApiKeySnafu {})
    }

    pub fn auth_endpoint(&self) -> String {
        self.auth_endpoint
            .clone()
            .unwrap_or_else(|| "https://identitytoolkit.googleapis.com".to_string())
    }

    pub fn firestore_endpoint(&self) -> String {
        self.firestore_endpoint
            .clone()
            .unwrap_or_else(|| "https://firestore.googleapis.com".to_string())
    }

    pub fn database_id(&self) -> String {
        self.database_id
            .clone()
            .unwrap_or_else(|| "(default)".to_string())
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RecordSource {
    /// `firestore`, `json`, `csv` or `xlsx`
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    pub collection: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "idColumn")]
    pub id_column: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
pub enum DirectorCategory {
    #[serde(rename = "regular")]
    Regular,
    #[serde(rename = "independent")]
    Independent,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSettings {
    /// The field of the ballot holding the votes for this candidate.
    pub key: String,
    pub name: String,
    pub category: DirectorCategory,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionSettings {
    /// As printed on the agenda, several resolutions may share a number.
    pub number: String,
    pub title: String,
}

/// The optional sections of the views.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PageFeatures {
    #[serde(rename = "statisticsCards")]
    pub statistics_cards: bool,
    #[serde(rename = "exportButtons")]
    pub export_buttons: bool,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(rename = "meetingSettings")]
    pub meeting_settings: MeetingSettings,
    pub admin: AdminSettings,
    pub firebase: Option<FirebaseSettings>,
    #[serde(rename = "recordSources", default)]
    pub record_sources: Vec<RecordSource>,
    /// In display order.
    pub candidates: Vec<CandidateSettings>,
    /// Resolution N of the ballot is the N-th entry.
    pub resolutions: Vec<ResolutionSettings>,
    #[serde(default)]
    pub features: PageFeatures,
}

impl DashboardConfig {
    pub fn candidate_keys(&self) -> Vec<String> {
        self.candidates.iter().map(|c| c.key.clone()).collect()
    }

    pub fn resolution_count(&self) -> u32 {
        self.resolutions.len() as u32
    }

    /// Display number and title of a resolution, by ballot index (starting at 1).
    pub fn resolution_settings(&self, index: u32) -> Option<&ResolutionSettings> {
        let idx = (index as usize).checked_sub(1)?;
        self.resolutions.get(idx)
    }
}

pub fn read_config(path: &str) -> BDashResult<DashboardConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: DashboardConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: String) -> BDashResult<JSValue> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_deployment_config() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/asm2025.json");
        let config = read_config(path).unwrap();
        assert_eq!(config.candidates.len(), 10);
        assert_eq!(config.resolution_count(), 13);
        assert_eq!(
            config.candidate_keys(),
            share_tally::DEFAULT_CANDIDATE_KEYS
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<String>>()
        );
        assert_eq!(config.resolution_settings(1).unwrap().number, "01");
        assert_eq!(config.resolution_settings(13).unwrap().number, "13");
        assert!(config.resolution_settings(0).is_none());
        assert!(config.resolution_settings(14).is_none());
        assert_eq!(config.record_sources[0].provider, "firestore");
        assert_eq!(config.record_sources[0].collection.as_deref(), Some("pmc2026"));
    }

    #[test]
    fn features_default_to_disabled() {
        let config: DashboardConfig = serde_json::from_str(
            r#"{
                "meetingSettings": { "organizationName": "A", "meetingTitle": "B" },
                "admin": { "email": "admin@example.com", "provider": "local" },
                "candidates": [],
                "resolutions": []
            }"#,
        )
        .unwrap();
        assert_eq!(config.features, PageFeatures::default());
        assert!(config.record_sources.is_empty());
        assert!(config.firebase.is_none());
    }

    #[test]
    fn api_key_from_environment() {
        let mut settings = FirebaseSettings {
            api_key: None,
            api_key_env: Some("ASM_TEST_FIREBASE_KEY".to_string()),
            project_id: "pmc".to_string(),
            database_id: None,
            auth_endpoint: None,
            firestore_endpoint: None,
        };
        std::env::set_var("ASM_TEST_FIREBASE_KEY", "k-123");
        assert_eq!(settings.api_key().unwrap(), "k-123");
        settings.api_key = Some("inline".to_string());
        assert_eq!(settings.api_key().unwrap(), "inline");
        settings.api_key = None;
        settings.api_key_env = None;
        assert!(matches!(settings.api_key(), Err(DashboardError::MissingApiKey {})));
        assert_eq!(settings.database_id(), "(default)");
    }
}
