use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde_json::Value;

use super::resolver::lookup_known;
use super::types::PricingTable;
use crate::error::AppError;

/// Per-model pricing supplied by the caller, keyed by model name
#[derive(Debug, Clone, Default)]
pub struct PricingCatalog {
    models: HashMap<String, PricingTable>,
}

impl PricingCatalog {
    /// Build from a LiteLLM-style price map (`{"model": {"input_cost_per_token": ..}}`).
    ///
    /// Entries that do not parse are skipped with a warning.
    pub fn from_value(data: &Value) -> Self {
        let mut models = HashMap::new();
        let Some(entries) = data.as_object() else {
            tracing::warn!("pricing data is not a JSON object, catalog left empty");
            return Self { models };
        };

        for (name, value) in entries {
            if name == "sample_spec" {
                continue;
            }
            match PricingTable::from_value(value) {
                Ok(table) => {
                    models.insert(name.clone(), table);
                }
                Err(err) => tracing::warn!(model = %name, "skipping pricing entry: {err}"),
            }
        }

        Self { models }
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path).map_err(|source| AppError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let data: Value =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| AppError::InvalidJson {
                path: path.to_path_buf(),
                source,
            })?;
        let catalog = Self::from_value(&data);
        tracing::debug!(path = %path.display(), models = catalog.len(), "loaded pricing catalog");
        Ok(catalog)
    }

    pub fn insert(&mut self, model: impl Into<String>, table: PricingTable) {
        self.models.insert(model.into(), table);
    }

    /// Look up a model by exact name, then without its provider prefix.
    pub fn get(&self, model: &str) -> Option<&PricingTable> {
        lookup_known(model, &self.models)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
