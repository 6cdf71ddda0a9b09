use crate::domain::model::ExecResult;
use crate::domain::ports::{CommandLineExecutor, CommandParameters};
use crate::utils::error::{RelationsError, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub const WKHTMLTOPDF_COMMAND: &str = "wkhtmltopdf-default";

/// A named command line; `#{name}` placeholders in `parameters` are filled
/// from the call's parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandTemplate {
    pub command: String,
    #[serde(default)]
    pub parameters: String,
}

pub fn default_commands() -> BTreeMap<String, CommandTemplate> {
    let mut commands = BTreeMap::new();
    commands.insert(
        WKHTMLTOPDF_COMMAND.to_string(),
        CommandTemplate {
            command: "wkhtmltopdf".to_string(),
            parameters:
                "--orientation #{orientation} --enable-local-file-access #{sourceFilePath} #{targetFilePath}"
                    .to_string(),
        },
    );
    commands
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#\{([^}]+)\}").expect("valid placeholder regex"))
}

/// Splits the template on whitespace first, so a substituted path containing
/// spaces stays one argument.
pub fn render_args(template: &str, params: &CommandParameters) -> Result<Vec<String>> {
    let re = placeholder_regex();
    let mut args = Vec::new();

    for token in template.split_whitespace() {
        if let Some(caps) = re.captures_iter(token).find(|c| !params.contains_key(&c[1])) {
            return Err(RelationsError::ConfigError {
                message: format!("Missing command parameter '{}'", &caps[1]),
            });
        }
        let arg = re.replace_all(token, |caps: &regex::Captures| params[&caps[1]].clone());
        args.push(arg.into_owned());
    }

    Ok(args)
}

/// Runs configured command templates as child processes. No timeout is applied.
pub struct TemplateCommandExecutor {
    commands: BTreeMap<String, CommandTemplate>,
}

impl TemplateCommandExecutor {
    pub fn new(commands: BTreeMap<String, CommandTemplate>) -> Self {
        Self { commands }
    }
}

impl Default for TemplateCommandExecutor {
    fn default() -> Self {
        Self::new(default_commands())
    }
}

#[async_trait]
impl CommandLineExecutor for TemplateCommandExecutor {
    async fn exec_command(&self, command: &str, params: &CommandParameters) -> Result<ExecResult> {
        let template = self
            .commands
            .get(command)
            .ok_or_else(|| RelationsError::ConfigError {
                message: format!("Unknown command '{}'", command),
            })?;

        let args = render_args(&template.parameters, params)?;
        let command_line = std::iter::once(template.command.clone())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        tracing::debug!("Running: {}", command_line);

        let result = match tokio::process::Command::new(&template.command)
            .args(&args)
            .output()
            .await
        {
            Ok(output) => {
                let mut lines: Vec<String> = String::from_utf8_lossy(&output.stdout)
                    .lines()
                    .map(str::to_string)
                    .collect();
                lines.extend(
                    String::from_utf8_lossy(&output.stderr)
                        .lines()
                        .map(str::to_string),
                );
                ExecResult {
                    successful: output.status.success(),
                    error: None,
                    return_code: output.status.code().unwrap_or(-1),
                    command_line,
                    output: lines,
                }
            }
            Err(e) => ExecResult {
                successful: false,
                error: Some(e.to_string()),
                return_code: -1,
                command_line,
                output: Vec::new(),
            },
        };

        Ok(result)
    }
}
