// Stencil templates shipped with the studio: flash outlines users start from.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::editor::compositor::PlaceMode;
use crate::editor::error::CompositeError;
use crate::editor::loader::ImageSource;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    /// Tattoo style tag, e.g. "traditional" or "blackwork".
    #[serde(default)]
    pub style: Option<String>,
    /// Image file, relative to the manifest directory when not absolute.
    pub source: PathBuf,
    #[serde(default)]
    pub mode: PlaceMode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateCatalog {
    pub templates: Vec<Template>,
}

impl TemplateCatalog {
    /// Load a JSON manifest. Relative template paths are resolved against
    /// the manifest's directory.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("read template manifest: {}", path.display()))?;
        let mut catalog: TemplateCatalog =
            serde_json::from_str(&data).context("parse template manifest json")?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for template in &mut catalog.templates {
            if template.source.is_relative() {
                template.source = base.join(&template.source);
            }
        }

        let mut seen = std::collections::HashSet::new();
        for template in &catalog.templates {
            if !seen.insert(template.id.as_str()) {
                warn!(id = %template.id, "duplicate template id; first entry wins");
            }
        }

        debug!(count = catalog.templates.len(), "template catalog loaded");
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Result<&Template, CompositeError> {
        self.templates
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| CompositeError::UnknownTemplate(id.to_string()))
    }

    pub fn by_style<'a>(&'a self, style: &'a str) -> impl Iterator<Item = &'a Template> + 'a {
        self.templates
            .iter()
            .filter(move |t| t.style.as_deref().is_some_and(|s| s.eq_ignore_ascii_case(style)))
    }

    pub fn push(&mut self, template: Template) {
        self.templates.push(template);
    }
}

impl Template {
    pub fn image_source(&self) -> ImageSource {
        ImageSource::Path(self.source.clone())
    }
}
