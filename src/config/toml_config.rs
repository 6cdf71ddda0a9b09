use crate::adapters::command::{default_commands, CommandTemplate};
use crate::core::batch::BatchSettings;
use crate::core::containers::ContainerTitles;
use crate::core::presentation::PresentationSettings;
use crate::utils::error::{RelationsError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, Validate,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationsConfig {
    pub repository: RepositoryConfig,
    pub classifier: ClassifierConfig,
    pub batch: BatchSettings,
    pub presentation: PresentationSettings,
    /// Command templates by name, on top of the built-in ones.
    pub commands: BTreeMap<String, CommandTemplate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// JSON snapshot the CLI works on.
    pub snapshot: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub picture_type: String,
    pub containers: ContainerTitles,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            picture_type: "Picture".to_string(),
            containers: ContainerTitles::default(),
        }
    }
}

impl RelationsConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(RelationsError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${CURSOR_DIR})
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").expect("valid env var regex");

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        result.to_string()
    }

    /// Built-in command templates overridden by the configured ones.
    pub fn command_templates(&self) -> BTreeMap<String, CommandTemplate> {
        let mut commands = default_commands();
        commands.extend(self.commands.clone());
        commands
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("classifier.picture_type", &self.classifier.picture_type)?;
        let containers = &self.classifier.containers;
        validate_non_empty_string("classifier.containers.license_root", &containers.license_root)?;
        validate_non_empty_string(
            "classifier.containers.art_file_numbers",
            &containers.art_file_numbers,
        )?;
        validate_non_empty_string("classifier.containers.style_numbers", &containers.style_numbers)?;

        validate_positive_number("batch.page_size", self.batch.page_size, 1)?;
        validate_positive_number("batch.commit_modulo", self.batch.commit_modulo, 1)?;
        if let Some(cursor_file) = &self.batch.cursor_file {
            validate_path("batch.cursor_file", cursor_file)?;
        }
        if let Some(snapshot) = &self.repository.snapshot {
            validate_path("repository.snapshot", snapshot)?;
        }

        validate_non_empty_string("presentation.picture_view", &self.presentation.picture_view)?;
        if !self.command_templates().contains_key(&self.presentation.command) {
            return Err(RelationsError::InvalidConfigValueError {
                field: "presentation.command".to_string(),
                value: self.presentation.command.clone(),
                reason: "No command template with this name".to_string(),
            });
        }
        for (name, template) in &self.commands {
            validate_non_empty_string(&format!("commands.{}.command", name), &template.command)?;
        }

        Ok(())
    }
}

impl Validate for RelationsConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
