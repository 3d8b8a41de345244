//! Configuration loader.

use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::schema::Config;

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }
}

impl Config {
    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extraction.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "extraction.concurrency".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.dedupe.amount_tolerance_cents < 0 {
            return Err(ConfigError::InvalidValue {
                field: "dedupe.amount_tolerance_cents".to_string(),
                message: "must not be negative".to_string(),
            });
        }
        if !self.expense_types.is_empty()
            && self
                .expense_types
                .iter()
                .all(|et| et.label != self.report.default_expense_type)
        {
            return Err(ConfigError::InvalidValue {
                field: "report.default_expense_type".to_string(),
                message: "must appear in the expense_types allow-list".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.extraction.concurrency, 4);
    }

    #[test]
    fn test_load_basic_config() {
        let content = r#"
            [llm]
            mode = "ocr_text"
            model = "gpt-4.1-mini"

            [user]
            full_name = "Ada Lovelace"
            home_city = "Austin"
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.llm.mode, crate::ExtractionMode::OcrText);
        assert_eq!(config.user.full_name, "Ada Lovelace");
        assert_eq!(config.user.home_city, "Austin");
    }

    #[test]
    fn test_load_expense_types() {
        let content = r#"
            [report]
            default_expense_type = "Other"

            [[expense_types]]
            label = "Other"

            [[expense_types]]
            label = "Travel-Airfare"
            category = "airfare"
            keywords = ["flight", "airline"]
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.expense_types.len(), 2);
        assert_eq!(
            config.category_for("Travel-Airfare"),
            crate::ExpenseCategory::Airfare
        );
    }

    #[test]
    fn test_env_var_expansion() {
        unsafe { std::env::set_var("EXPENSER_TEST_KEY", "sk-test") };
        let content = r#"
            [llm]
            api_key = "${EXPENSER_TEST_KEY}"
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.llm.api_key, "sk-test");
    }

    #[test]
    fn test_env_var_missing() {
        let content = r#"
            [llm]
            api_key = "${EXPENSER_DEFINITELY_UNSET}"
        "#;
        let result = ConfigLoader::load_str(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[user]").unwrap();
        writeln!(file, "home_city = \"Lisbon\"").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.user.home_city, "Lisbon");
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/expenser.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let content = r#"
            [extraction]
            concurrency = 0
        "#;
        let result = ConfigLoader::load_str(content);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_default_type_must_be_allowed() {
        let content = r#"
            [report]
            default_expense_type = "Ghost"

            [[expense_types]]
            label = "Meals"
            category = "meal"
        "#;
        let result = ConfigLoader::load_str(content);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
