use serde::Deserialize;

/// Top level of a `reqres_quest.toml` file. Every field is optional; missing
/// values fall back to the built-in profile.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct QuestConfig {
    pub profile: Option<ProfileConfig>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ProfileConfig {
    pub base_url: Option<String>,
    pub verbose: Option<bool>,
    pub timeout_secs: Option<u64>,
    pub headers: Option<toml::Value>,
}
