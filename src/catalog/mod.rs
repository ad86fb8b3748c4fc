//! In-memory service catalog.
//!
//! The catalog is populated once (by an external loader; here from a JSON
//! boundary file) and handed to the engine at construction. It is read-only
//! afterwards, which is what makes concurrent stage invocations safe without
//! locking.

pub mod category;
pub mod model;

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use model::Service;

/// On-disk catalog format: the boundary artifact produced by the external
/// metadata loader.
#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogFile {
    pub services: Vec<Service>,
}

/// The collection of services available to the engine, with id-indexed
/// lookup. Service ids are unique; on duplicate ids the first record wins.
#[derive(Debug)]
pub struct Catalog {
    services: Vec<Service>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(services: Vec<Service>) -> Self {
        let mut index = HashMap::with_capacity(services.len());
        for (pos, service) in services.iter().enumerate() {
            if index.contains_key(&service.id) {
                log::warn!("duplicate service id '{}' in catalog, keeping first", service.id);
                continue;
            }
            index.insert(service.id.clone(), pos);
        }
        Self { services, index }
    }

    /// Load a catalog from its JSON boundary file. A malformed file is the
    /// one fatal configuration error, and only at load time.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
        let file: CatalogFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog file as JSON: {}", path.display()))?;
        log::info!(
            "Loaded catalog with {} service(s) from {}",
            file.services.len(),
            path.display()
        );
        Ok(Self::new(file.services))
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn service(&self, id: &str) -> Option<&Service> {
        self.index.get(id).map(|&pos| &self.services[pos])
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
