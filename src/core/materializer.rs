// src/core/materializer.rs
//! Writes the configuration into the bot's own `config/*.py` modules and reads
//! the live values back by importing those modules in a Python subprocess.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::core::python_literal;
use crate::core::schema::{default_config, FieldSpec, Section};
use crate::core::FsOps;
use crate::types::BotConfig;

pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 15;

const LICENSE_WITH_PROFILE: &str = "'''
Author:     Sai Vignesh Golla
LinkedIn:   https://www.linkedin.com/in/saivigneshgolla/
Copyright (C) 2024 Sai Vignesh Golla
License:    GNU Affero General Public License
GitHub:     https://github.com/GodsScion/Auto_job_applier_linkedIn
'''
";

const LICENSE: &str = "'''
Author:     Sai Vignesh Golla
Copyright (C) 2024 Sai Vignesh Golla
License:    GNU Affero General Public License
GitHub:     https://github.com/GodsScion/Auto_job_applier_linkedIn
'''
";

const EASY_APPLY_BANNER: &str = "\n# >>>>>>>>>>> Easy Apply Questions & Inputs <<<<<<<<<<<\n\n";

const SEARCH_BANNER: &str = "\n# LINKEDIN SEARCH PREFERENCES\n\n";

/// Header the bot's own modules carry, kept as-is in the rewritten files.
fn module_header(section: Section) -> String {
    match section {
        Section::Personals => format!("{}{}", LICENSE_WITH_PROFILE, EASY_APPLY_BANNER),
        Section::Questions => format!("{}{}", LICENSE, EASY_APPLY_BANNER),
        Section::Search => format!("{}{}", LICENSE, SEARCH_BANNER),
        Section::Secrets | Section::Settings => format!("{}\n", LICENSE),
    }
}

#[derive(Debug, Clone)]
pub struct Materializer {
    reference_dir: PathBuf,
    interpreter: String,
    read_timeout: Duration,
}

impl Materializer {
    pub fn new(reference_dir: PathBuf, interpreter: impl Into<String>) -> Self {
        Self {
            reference_dir,
            interpreter: interpreter.into(),
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
        }
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn reference_dir(&self) -> &Path {
        &self.reference_dir
    }

    pub fn config_dir(&self) -> PathBuf {
        self.reference_dir.join("config")
    }

    pub fn module_path(&self, section: Section) -> PathBuf {
        self.config_dir().join(format!("{}.py", section.key()))
    }

    /// The bot checkout is present on disk
    pub fn reference_available(&self) -> bool {
        self.reference_dir.is_dir()
    }

    // ===== Writing =====

    /// Render one module. Fields come out in table order; fields missing
    /// from `values` take their default.
    pub fn render_section(section: Section, values: Option<&Map<String, Value>>) -> String {
        let mut out = module_header(section);

        for spec in section.fields() {
            let rendered = render_field(spec, values.and_then(|fields| fields.get(spec.name)));
            out.push_str(spec.name);
            out.push_str(" = ");
            out.push_str(&rendered);
            out.push('\n');
        }
        out
    }

    /// Write all five modules. Each module is written independently: a
    /// failure stops the remaining writes but leaves earlier ones in place.
    pub async fn write(&self, config: &BotConfig) -> Result<Vec<PathBuf>> {
        FsOps::ensure_dir_exists(&self.config_dir()).await?;

        let mut written = Vec::with_capacity(Section::ALL.len());
        for section in Section::ALL {
            let path = self.module_path(section);
            let content = Self::render_section(section, config.section(section));
            FsOps::write_file_safe(&path, &content)
                .await
                .with_context(|| format!("Failed to write {} config", section.key()))?;
            written.push(path);
        }

        info!(
            "Wrote {} config modules to {}",
            written.len(),
            self.config_dir().display()
        );
        Ok(written)
    }

    // ===== Reading =====

    /// Import the bot's modules and return their values over the defaults.
    /// Any failure yields the defaults.
    pub async fn read(&self) -> BotConfig {
        match self.try_read().await {
            Ok(config) => config,
            Err(e) => {
                warn!("Falling back to default config: {:#}", e);
                default_config()
            }
        }
    }

    async fn try_read(&self) -> Result<BotConfig> {
        if !self.reference_available() {
            anyhow::bail!(
                "Reference directory not found: {}",
                self.reference_dir.display()
            );
        }

        let child = Command::new(&self.interpreter)
            .arg("-B")
            .arg("-c")
            .arg(self.reader_script())
            .current_dir(&self.reference_dir)
            .env("PYTHONDONTWRITEBYTECODE", "1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn {}", self.interpreter))?;

        let output = tokio::time::timeout(self.read_timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                anyhow::anyhow!("Config reader timed out after {:?}", self.read_timeout)
            })?
            .context("Config reader process failed")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "Config reader exited with {}: {}",
                output.status,
                stderr.trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let live: Value = serde_json::from_str(stdout.trim())
            .context("Config reader printed invalid JSON")?;
        if !live.is_object() {
            anyhow::bail!("Config reader printed a non-object");
        }

        debug!("Read live config from {}", self.config_dir().display());

        let mut config = default_config();
        config.merge(&live);
        Ok(config)
    }

    /// Python program printing the enumerated fields of each module as JSON.
    /// Attributes a module does not define are skipped.
    fn reader_script(&self) -> String {
        let fields: Map<String, Value> = Section::ALL
            .iter()
            .map(|section| {
                let names = section
                    .fields()
                    .iter()
                    .map(|spec| Value::from(spec.name))
                    .collect();
                (section.key().to_string(), Value::Array(names))
            })
            .collect();
        let modules: Vec<&str> = Section::ALL.iter().map(|section| section.key()).collect();

        format!(
            r#"import json
import sys
sys.path.insert(0, {reference})
from config import {modules}

FIELDS = {fields}
MODULES = {{{module_map}}}
MISSING = object()

def sanitize(obj):
    if isinstance(obj, (str, int, float, bool, type(None))):
        return obj
    if isinstance(obj, (list, tuple)):
        return [sanitize(x) for x in obj]
    if isinstance(obj, dict):
        return {{str(k): sanitize(v) for k, v in obj.items()}}
    return str(obj)

out = {{}}
for section, names in FIELDS.items():
    module = MODULES[section]
    values = {{}}
    for name in names:
        value = getattr(module, name, MISSING)
        if value is not MISSING:
            values[name] = sanitize(value)
    out[section] = values
print(json.dumps(out))
"#,
            reference = python_literal::render_str(&self.reference_dir.to_string_lossy()),
            modules = modules.join(", "),
            fields = python_literal::render(&Value::Object(fields)),
            module_map = modules
                .iter()
                .map(|name| format!("'{name}': {name}"))
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

fn render_field(spec: &FieldSpec, value: Option<&Value>) -> String {
    let Some(value) = value else {
        return python_literal::render(&spec.default.to_value());
    };

    if spec.is_numeric() {
        if let Value::String(text) = value {
            if let Some(number) = python_literal::numeric_text(text) {
                return number;
            }
        }
    }

    python_literal::render(value)
}
