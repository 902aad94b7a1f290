//! Scripts extension.
//!
//! Runs the `[[scripts]]` entries from the config with the platform shell
//! and appends their output under "Other reports".

use std::process::{Command as ProcessCommand, Stdio};
use std::time::Instant;

use anyhow::Context;

use crate::core::{Config, Element, Extension, ExtensionContext, Report, ScriptConfig};

/// Registry name.
pub const NAME: &str = "scripts";

/// Captured result of one script.
#[derive(Debug, Clone)]
pub struct ScriptOutput {
    /// Standard output
    pub stdout: String,

    /// Exit code, if the process exited normally
    pub code: Option<i32>,

    /// Whether the script exited successfully
    pub success: bool,
}

/// Run a script with the platform shell.
///
/// Only a failure to start the shell is an error; a non-zero exit still
/// yields whatever the script printed.
pub fn run_script(script: &str) -> anyhow::Result<ScriptOutput> {
    let start = Instant::now();
    let (shell, shell_arg) = get_shell();

    let output = ProcessCommand::new(shell)
        .arg(shell_arg)
        .arg(script)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .with_context(|| format!("Failed to run script: {script}"))?;

    tracing::debug!(
        script,
        code = ?output.status.code(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Script finished"
    );

    Ok(ScriptOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        code: output.status.code(),
        success: output.status.success(),
    })
}

/// Element holding script output, escaped or passed through as HTML.
pub fn output_element(script: &ScriptConfig, stdout: String) -> Element {
    if script.escape {
        Element::Preformatted { text: stdout }
    } else {
        Element::Html { html: stdout }
    }
}

/// Extension running user-configured scripts.
#[derive(Debug)]
pub struct ScriptsExtension {
    scripts: Vec<ScriptConfig>,
}

impl ScriptsExtension {
    /// Create the extension for a list of scripts.
    pub fn new(scripts: Vec<ScriptConfig>) -> Self {
        Self { scripts }
    }
}

/// Build the extension when at least one script is configured.
pub fn factory(config: &Config) -> anyhow::Result<Option<Box<dyn Extension>>> {
    if config.scripts.is_empty() {
        return Ok(None);
    }
    if let Some(script) = config.scripts.iter().find(|s| s.script.trim().is_empty()) {
        anyhow::bail!("Script '{}' has an empty command", script.name);
    }
    Ok(Some(Box::new(ScriptsExtension::new(config.scripts.clone()))))
}

impl Extension for ScriptsExtension {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Output of the scripts listed in the config"
    }

    fn run(&self, _ctx: &ExtensionContext, report: &mut Report) -> anyhow::Result<()> {
        report.heading("Other reports", 0);

        for script in &self.scripts {
            let output = run_script(&script.script)?;
            if !output.success {
                tracing::warn!(
                    name = %script.name,
                    code = ?output.code,
                    "Script exited with failure"
                );
            }

            report.heading(script.name.as_str(), 1);
            if let Some(description) = &script.description {
                report.paragraph(description.as_str());
            }
            report.paragraph("Result:");
            report.add(output_element(script, output.stdout));
        }

        Ok(())
    }
}

/// Get the shell and argument for the current platform.
fn get_shell() -> (&'static str, &'static str) {
    if cfg!(target_os = "windows") {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_element() {
        let mut script = ScriptConfig::new("Calendar", "cal");
        let element = output_element(&script, "<b>x</b>".into());
        assert_eq!(element, Element::Preformatted { text: "<b>x</b>".into() });

        script.escape = false;
        let element = output_element(&script, "<b>x</b>".into());
        assert_eq!(element, Element::Html { html: "<b>x</b>".into() });
    }

    #[test]
    fn test_factory() {
        let mut config = Config::default();
        assert!(factory(&config).unwrap().is_none());

        config.scripts.push(ScriptConfig::new("Empty", "  "));
        assert!(factory(&config).is_err());

        config.scripts[0].script = "echo hi".into();
        assert!(factory(&config).unwrap().is_some());
    }

    #[cfg(unix)]
    #[test]
    fn test_run_script() {
        let output = run_script("echo hello").unwrap();
        assert_eq!(output.stdout, "hello\n");
        assert!(output.success);

        let output = run_script("echo partial; exit 3").unwrap();
        assert_eq!(output.stdout, "partial\n");
        assert_eq!(output.code, Some(3));
        assert!(!output.success);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_extension() {
        let mut script = ScriptConfig::new("Greeting", "echo hello");
        script.description = Some("Says hello".into());
        let ext = ScriptsExtension::new(vec![script]);

        let mut report = Report::new();
        ext.run(&ExtensionContext::default(), &mut report).unwrap();

        let texts: Vec<String> = report.elements().iter().map(ToString::to_string).collect();
        assert_eq!(texts, vec!["Other reports", "Greeting", "Says hello", "Result:", "hello\n"]);
    }
}
