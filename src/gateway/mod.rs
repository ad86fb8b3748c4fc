//! The three-stage engine: search, describe, execute.
//!
//! Built once from a loaded catalog and a transport; every stage is a pure
//! computation over the read-only catalog except the dispatcher's single
//! outbound transport call. One `Gateway` instance represents one caller
//! identity (the transport beneath it holds that caller's token).

pub mod describe;
pub mod discovery;
pub mod dispatch;
pub mod keys;
pub mod naming;

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::catalog::Catalog;
use crate::catalog::category::{Category, CategoryIndex};
use crate::error::GatewayError;
use crate::transport::{EntityTransport, QueryOptions};

use describe::EntityDescription;
use discovery::DiscoveryResult;
use dispatch::ExecutionOutcome;
use naming::ToolNameAllocator;

/// One catalog entry in the administrative listing.
#[derive(Debug, Serialize)]
pub struct CatalogEntry {
    pub id: String,
    pub title: String,
    pub entity_count: usize,
    pub categories: Vec<Category>,
}

pub struct Gateway {
    catalog: Arc<Catalog>,
    categories: CategoryIndex,
    transport: Arc<dyn EntityTransport>,
    names: ToolNameAllocator,
}

impl Gateway {
    pub fn new(catalog: Catalog, transport: Arc<dyn EntityTransport>) -> Self {
        let categories = CategoryIndex::build(&catalog);
        Self {
            catalog: Arc::new(catalog),
            categories,
            transport,
            names: ToolNameAllocator::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Stage 1: rank services and entities against a free-text query.
    pub fn discover(
        &self,
        query: Option<&str>,
        category: Option<&str>,
        limit: Option<usize>,
    ) -> DiscoveryResult {
        let category = category.map(Category::parse).unwrap_or(Category::All);
        discovery::discover(&self.catalog, &self.categories, query, category, limit)
    }

    /// Stage 2: resolve the complete schema for one (service, entity) pair.
    pub fn describe(
        &self,
        service_id: &str,
        entity_name: &str,
    ) -> Result<EntityDescription, GatewayError> {
        describe::describe(&self.catalog, service_id, entity_name)
    }

    /// Stage 3: validate and dispatch one CRUD operation.
    pub async fn execute(
        &self,
        service_id: &str,
        entity_name: &str,
        operation: &str,
        parameters: &Map<String, Value>,
        options: &QueryOptions,
    ) -> Result<ExecutionOutcome, GatewayError> {
        dispatch::execute(
            &self.catalog,
            self.transport.as_ref(),
            service_id,
            entity_name,
            operation,
            parameters,
            options,
        )
        .await
    }

    /// Short, collision-free identifier for a (operation, service, entity)
    /// triple, for embedders that need a static tool enumeration.
    pub fn allocate_tool_name(
        &self,
        operation: &str,
        service_id: &str,
        entity_name: &str,
    ) -> String {
        self.names.allocate(operation, service_id, entity_name)
    }

    pub fn tool_names(&self) -> &ToolNameAllocator {
        &self.names
    }

    /// Read-only catalog listing for human/administrative inspection,
    /// sorted by title.
    pub fn catalog_listing(&self) -> Vec<CatalogEntry> {
        let mut entries: Vec<CatalogEntry> = self
            .catalog
            .services()
            .iter()
            .map(|s| CatalogEntry {
                id: s.id.clone(),
                title: s.title.clone(),
                entity_count: s.entity_types().len(),
                categories: self.categories.categories_of(&s.id).to_vec(),
            })
            .collect();
        entries.sort_by(|a, b| a.title.cmp(&b.title));
        entries
    }
}
