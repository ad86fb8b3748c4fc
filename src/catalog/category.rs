//! Heuristic service categorization.
//!
//! Classification is a pure function of a service's identifier, title and
//! description: lower-cased substring containment against curated keyword
//! lists per category. A service matching nothing is assigned exactly
//! `{all}`. Kept separate from discovery so category rules can change
//! without touching ranking logic.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::Catalog;
use super::model::Service;

/// Fixed business-category vocabulary. `All` is both the default bucket and
/// the wildcard filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    BusinessPartner,
    Sales,
    Finance,
    Procurement,
    Hr,
    Logistics,
    All,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::BusinessPartner => "business-partner",
            Category::Sales => "sales",
            Category::Finance => "finance",
            Category::Procurement => "procurement",
            Category::Hr => "hr",
            Category::Logistics => "logistics",
            Category::All => "all",
        }
    }

    /// Parse a caller-supplied filter value. Unrecognized input coerces to
    /// `All`, never an error.
    pub fn parse(value: &str) -> Category {
        match value.trim().to_ascii_lowercase().as_str() {
            "business-partner" | "business_partner" => Category::BusinessPartner,
            "sales" => Category::Sales,
            "finance" => Category::Finance,
            "procurement" => Category::Procurement,
            "hr" => Category::Hr,
            "logistics" => Category::Logistics,
            _ => Category::All,
        }
    }

    /// Every concrete category (excludes the `All` wildcard).
    pub fn concrete() -> &'static [Category] {
        &[
            Category::BusinessPartner,
            Category::Sales,
            Category::Finance,
            Category::Procurement,
            Category::Hr,
            Category::Logistics,
        ]
    }
}

/// Curated keyword lists, matched by substring against id+title+description.
const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::BusinessPartner,
        &["business partner", "businesspartner", "customer", "supplier", "vendor", "contact"],
    ),
    (
        Category::Sales,
        &["sales", "order", "quotation", "billing", "opportunity"],
    ),
    (
        Category::Finance,
        &["finance", "financial", "ledger", "account", "payment", "invoice", "asset"],
    ),
    (
        Category::Procurement,
        &["procurement", "purchase", "purchasing", "requisition", "sourcing"],
    ),
    (
        Category::Hr,
        &["employee", "human resource", "personnel", "payroll", "timesheet", "workforce"],
    ),
    (
        Category::Logistics,
        &["logistics", "delivery", "shipment", "warehouse", "inventory", "material", "stock"],
    ),
];

/// Classify one service. Pure; no failure modes.
pub fn categorize(service: &Service) -> Vec<Category> {
    let haystack = format!(
        "{} {} {}",
        service.id, service.title, service.description
    )
    .to_lowercase();

    let mut categories: Vec<Category> = Vec::new();
    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|kw| haystack.contains(kw)) {
            categories.push(*category);
        }
    }
    if categories.is_empty() {
        categories.push(Category::All);
    }
    categories
}

/// Per-service category cache, computed once at construction. Invalidated
/// only by rebuilding with a new catalog.
#[derive(Debug)]
pub struct CategoryIndex {
    by_service: HashMap<String, Vec<Category>>,
}

impl CategoryIndex {
    pub fn build(catalog: &Catalog) -> Self {
        let by_service = catalog
            .services()
            .iter()
            .map(|s| (s.id.clone(), categorize(s)))
            .collect();
        Self { by_service }
    }

    pub fn categories_of(&self, service_id: &str) -> &[Category] {
        self.by_service
            .get(service_id)
            .map(|c| c.as_slice())
            .unwrap_or(&[])
    }

    /// Category filter semantics: `All` admits every service; a concrete
    /// category admits services carrying that category.
    pub fn service_in(&self, service_id: &str, category: Category) -> bool {
        if category == Category::All {
            return true;
        }
        self.categories_of(service_id).contains(&category)
    }
}
