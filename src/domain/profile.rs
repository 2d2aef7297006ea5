use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub label_selector: String,
    #[serde(default)]
    pub custom_rules: Vec<String>,
    #[serde(default)]
    pub use_default_rules: bool,
    #[serde(default)]
    pub read_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProfilesState {
    pub profiles: Vec<AnalysisProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_profile_id: Option<String>,
}

impl ProfilesState {
    pub fn active(&self) -> Option<&AnalysisProfile> {
        let id = self.active_profile_id.as_deref()?;
        self.profiles.iter().find(|profile| profile.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigError {
    pub kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// User-facing settings mirrored to the presentation surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub agent_mode: bool,
    pub solution_server_enabled: bool,
    pub auto_accept_on_save: bool,
    #[serde(default)]
    pub excluded_diagnostic_sources: Vec<String>,
}
