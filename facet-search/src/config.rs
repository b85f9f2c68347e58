use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use serde_with::serde_as;
use strum::{Display, EnumString};

use crate::catalog::StaticCatalog;
use crate::ids::TenantId;
use crate::types::DEFAULT_PAGE_SIZE;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub backend: BackendSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub catalog: StaticCatalog,
}

#[serde_as]
#[derive(Deserialize, Clone, Debug)]
pub struct BackendSettings {
    pub url: String,
    pub index: String,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

#[serde_as]
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct SearchSettings {
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub default_page_size: u32,
    /// Field sorted on when results are ordered by date.
    pub date_field: String,
    pub tenant: TenantSettings,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            date_field: "post_date".to_string(),
            tenant: TenantSettings::default(),
        }
    }
}

/// Where tenants live in the index.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TenantSettings {
    /// Name of the aggregation counting hits per tenant.
    pub aggregation: String,
    /// Field holding the tenant's display name, aggregated on.
    pub name_field: String,
    /// Field holding the tenant id, read from each hit's source.
    pub id_field: String,
    /// Tenant assumed for hits without an id when the request has none.
    pub default: TenantId,
}

impl Default for TenantSettings {
    fn default() -> Self {
        Self {
            aggregation: "tenant".to_string(),
            name_field: "blog_name".to_string(),
            id_field: "blog_id".to_string(),
            default: TenantId::default(),
        }
    }
}

/// Reads `base.yaml` and `{environment}.yaml` from `config_directory`, then
/// `FACET_`-prefixed environment variables (`FACET_BACKEND__URL=...`).
pub fn read_config(config_directory: &Path) -> Result<Settings, config::ConfigError> {
    let environment = Environment::from_str(
        std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .as_str(),
    )
    .map_err(|e| config::ConfigError::Message(format!("Failed to parse APP_ENVIRONMENT: {}", e)))?;
    let environment_filename = format!("{}.yaml", environment);

    let settings = config::Config::builder()
        .add_source(config::File::from(config_directory.join("base.yaml")))
        .add_source(config::File::from(config_directory.join(environment_filename)).required(false))
        .add_source(
            config::Environment::with_prefix("FACET")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[derive(Display, Debug, EnumString, PartialEq)]
pub enum Environment {
    #[strum(ascii_case_insensitive, serialize = "local")]
    Local,
    #[strum(ascii_case_insensitive, serialize = "production")]
    Production,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::CatalogProvider;
    use crate::types::FieldKind;

    #[test]
    fn environment_parses_case_insensitively() {
        assert_eq!(Environment::from_str("Production").unwrap(), Environment::Production);
        assert_eq!(Environment::Local.to_string(), "local");
        assert!(Environment::from_str("staging").is_err());
    }

    #[test]
    fn bundled_config_deserializes() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("config");
        let settings = read_config(&dir).unwrap();

        assert_eq!(settings.backend.index, "posts");
        assert_eq!(settings.backend.timeout_secs, 10);
        assert_eq!(settings.search.default_page_size, 10);
        assert_eq!(settings.search.tenant.aggregation, "tenant");
        assert!(settings.catalog.is_enabled());
        assert_eq!(settings.catalog.taxonomies(), &["category".to_string(), "post_tag".to_string()]);
        assert_eq!(settings.catalog.score(FieldKind::Field, "post_title"), 3.0);
        assert!(settings.catalog.is_numeric("price"));
        assert_eq!(settings.catalog.ranges("price").len(), 3);
    }

    #[test]
    fn search_settings_default() {
        let settings = SearchSettings::default();
        assert_eq!(settings.date_field, "post_date");
        assert_eq!(settings.tenant.id_field, "blog_id");
        assert_eq!(settings.tenant.default, TenantId::from("1"));
    }
}
