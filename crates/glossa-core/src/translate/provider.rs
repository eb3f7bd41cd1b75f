//! Built-in translation collaborators and the factory that selects one

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use serde::Serialize;
use tracing::debug;

use super::prompt::{build_prompt, parse_response};
use super::{TranslationProvider, TranslationRequest, TranslationResponse};
use crate::config::TranslationConfig;
use crate::error::{GlossaError, Result};
use crate::glossary::Glossary;

/// Name and purpose of a supported collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderInfo {
    pub name: &'static str,
    pub description: &'static str,
}

/// Collaborators that [`create_provider`] can build
pub fn list_providers() -> Vec<ProviderInfo> {
    vec![
        ProviderInfo {
            name: CommandProvider::NAME,
            description: "Pipe the prompt to an external program and read its JSON reply",
        },
        ProviderInfo {
            name: MappingProvider::NAME,
            description: "Apply a ready-made id to text JSON file",
        },
    ]
}

/// Build the configured collaborator
///
/// Unknown names and missing settings are rejected here, before any call.
pub fn create_provider(config: &TranslationConfig) -> Result<Box<dyn TranslationProvider>> {
    match config.provider.as_str() {
        CommandProvider::NAME => {
            let (program, args) = config.command.split_first().ok_or_else(|| {
                GlossaError::Configuration(
                    "provider 'command' needs `translation.command`".to_string(),
                )
            })?;
            Ok(Box::new(CommandProvider::new(program.clone(), args.to_vec())))
        }
        MappingProvider::NAME => {
            let path = config.mapping_file.as_deref().ok_or_else(|| {
                GlossaError::Configuration(
                    "provider 'mapping' needs `translation.mapping_file`".to_string(),
                )
            })?;
            Ok(Box::new(MappingProvider::load(path)?))
        }
        other => {
            let known: Vec<&str> = list_providers().iter().map(|p| p.name).collect();
            Err(GlossaError::Configuration(format!(
                "unknown translation provider '{}' (supported: {})",
                other,
                known.join(", ")
            )))
        }
    }
}

/// Runs an external program per request
///
/// The prompt is written to the program's stdin; its stdout must contain the
/// JSON reply.
#[derive(Debug, Clone)]
pub struct CommandProvider {
    program: String,
    args: Vec<String>,
}

impl CommandProvider {
    pub const NAME: &'static str = "command";

    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn run(&self, input: &str) -> Result<String> {
        let failure = |message: String| GlossaError::provider(Self::NAME, message);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| failure(format!("cannot start '{}': {}", self.program, e)))?;

        // Feed the prompt from its own thread while output is drained
        let stdin = child.stdin.take();
        let (written, output) = thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(input.as_bytes()),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            (writer.join(), output)
        });

        let output = output.map_err(|e| failure(format!("cannot read output: {}", e)))?;
        match written {
            Ok(Ok(())) => {}
            Ok(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => {
                debug!(program = %self.program, "command closed stdin before reading the prompt");
            }
            Ok(Err(e)) => return Err(failure(format!("cannot write prompt: {}", e))),
            Err(_) => return Err(failure("prompt writer thread panicked".to_string())),
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failure(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl TranslationProvider for CommandProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn translate_batch(
        &mut self,
        request: &TranslationRequest,
        glossary: &Glossary,
    ) -> Result<TranslationResponse> {
        let prompt = build_prompt(request, glossary)?;
        debug!(program = %self.program, bytes = prompt.len(), "running translation command");
        let reply = self.run(&prompt)?;
        Ok(TranslationResponse {
            translations: parse_response(Self::NAME, &reply)?,
            tokens_used: None,
        })
    }
}

/// Serves translations from a JSON file
///
/// The file holds either a flat `{"seg_0": "..."}` object or the reply shape
/// `{"translations": [{"id", "translated"}]}`.
#[derive(Debug, Clone, Default)]
pub struct MappingProvider {
    translations: HashMap<String, String>,
}

impl MappingProvider {
    pub const NAME: &'static str = "mapping";

    /// Use an in-memory mapping
    pub fn new(translations: HashMap<String, String>) -> Self {
        Self { translations }
    }

    /// Load the mapping file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GlossaError::Configuration(format!("cannot read mapping {}: {}", path.display(), e))
        })?;
        let translations = Self::decode(&content).map_err(|e| {
            GlossaError::Configuration(format!("invalid mapping {}: {}", path.display(), e))
        })?;
        debug!(entries = translations.len(), path = %path.display(), "loaded translation mapping");
        Ok(Self { translations })
    }

    fn decode(content: &str) -> Result<HashMap<String, String>> {
        match serde_json::from_str::<HashMap<String, String>>(content) {
            Ok(flat) => Ok(flat),
            Err(_) => parse_response(Self::NAME, content),
        }
    }
}

impl TranslationProvider for MappingProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn translate_batch(
        &mut self,
        request: &TranslationRequest,
        _glossary: &Glossary,
    ) -> Result<TranslationResponse> {
        let translations = request
            .units
            .iter()
            .filter_map(|unit| {
                self.translations
                    .get(&unit.id)
                    .map(|text| (unit.id.clone(), text.clone()))
            })
            .collect();
        Ok(TranslationResponse {
            translations,
            tokens_used: None,
        })
    }
}
