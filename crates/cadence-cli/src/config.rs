use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize, Debug)]
pub struct Config {
    /// Path of the SQLite database file
    #[serde(default = "default_database")]
    pub database: String,
    /// Owner whose tasks this installation manages
    #[serde(default)]
    pub owner: Option<Uuid>,
    /// Filter applied when `list` is run without one
    #[serde(default)]
    pub default_filter: Option<String>,
}

fn default_database() -> String {
    "cadence.db".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            owner: None,
            default_filter: None,
        }
    }
}

impl Config {
    pub fn new() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("cadence.toml"))
            .merge(Env::prefixed("CADENCE_"))
            .extract()
    }

    /// The owner every command scopes to. An explicit `owner` setting wins;
    /// otherwise one is derived from the login name, so repeated runs on the
    /// same account always see the same tasks.
    pub fn owner_id(&self) -> Uuid {
        self.owner.unwrap_or_else(|| {
            let user = std::env::var("USER")
                .or_else(|_| std::env::var("USERNAME"))
                .unwrap_or_else(|_| "cadence".to_string());
            Uuid::new_v5(&Uuid::NAMESPACE_OID, user.as_bytes())
        })
    }
}
