//! Loads the substance registry from a JSON or YAML mapping of id to display
//! name.

use std::{collections::HashMap, fs, path::PathBuf};

use config::{Config, File, FileFormat};
use thiserror::Error;

use crate::models::{SubstanceId, SubstanceRegistry, substance::RegistryError};

/// Errors that can occur while loading the substance registry.
#[derive(Debug, Error)]
pub enum SubstanceLoaderError {
    /// The file could not be read.
    #[error("Failed to read substance file: {0}")]
    IoError(#[from] std::io::Error),

    /// The file is not a valid id-to-name mapping.
    #[error("Failed to parse substance file: {0}")]
    ParseError(#[from] config::ConfigError),

    /// The file extension is neither JSON nor YAML.
    #[error("Unsupported substance file format: {0}")]
    UnsupportedFormat(String),

    /// A key is not an integer id.
    #[error("Substance id '{0}' is not an integer")]
    InvalidId(String),

    /// The entries do not form a valid registry.
    #[error("Invalid substance registry: {0}")]
    Registry(#[from] RegistryError),
}

/// Reads a substance file of the form `{"<id>": "<name>", ...}`.
pub struct SubstanceLoader {
    path: PathBuf,
}

impl SubstanceLoader {
    /// Creates a new `SubstanceLoader`.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads and validates the registry.
    pub fn load(&self) -> Result<SubstanceRegistry, SubstanceLoaderError> {
        let format = self.format()?;
        let contents = fs::read_to_string(&self.path)?;

        let raw: HashMap<String, String> = Config::builder()
            .add_source(File::from_str(&contents, format))
            .build()?
            .try_deserialize()?;

        let entries = raw
            .into_iter()
            .map(|(id, name)| {
                id.trim()
                    .parse::<SubstanceId>()
                    .map(|id| (id, name))
                    .map_err(|_| SubstanceLoaderError::InvalidId(id))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let registry = SubstanceRegistry::new(entries)?;
        tracing::info!(
            path = %self.path.display(),
            substances = registry.len(),
            "Substance registry loaded."
        );
        Ok(registry)
    }

    fn format(&self) -> Result<FileFormat, SubstanceLoaderError> {
        match self.path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(FileFormat::Json),
            Some("yaml") | Some("yml") => Ok(FileFormat::Yaml),
            _ => Err(SubstanceLoaderError::UnsupportedFormat(self.path.display().to_string())),
        }
    }
}
