//! Stage 1: free-text discovery over the catalog.
//!
//! Scoring is deliberately simple: case-insensitive substring containment in
//! a single pass, no tokenization, no fuzzy matching. A non-empty query that
//! matches nothing silently falls back to the unfiltered (empty-query)
//! result for the same category, so Stage 1 never returns an empty set when
//! the catalog is non-empty.

use serde::Serialize;

use crate::catalog::Catalog;
use crate::catalog::category::{Category, CategoryIndex};

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 50;

const SCORE_BROWSE: f64 = 0.5;
const SCORE_ID_MATCH: f64 = 0.9;
const SCORE_TITLE_MATCH: f64 = 0.85;
const SCORE_ENTITY_MATCH: f64 = 0.95;

/// One matched service with the entity names worth inspecting next.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceMatch {
    pub service_id: String,
    pub title: String,
    pub score: f64,
    pub categories: Vec<Category>,
    /// Matching entity names for targeted queries; the full entity-name list
    /// when the whole service matched.
    pub entities: Vec<String>,
}

/// Stage 1 result envelope.
#[derive(Debug, Serialize)]
pub struct DiscoveryResult {
    pub matches: Vec<ServiceMatch>,
    pub total_found: usize,
    pub total_shown: usize,
    /// True when the query matched nothing and the full (category-filtered)
    /// catalog was returned instead.
    pub fallback: bool,
}

/// Rank services and entities against a query and category filter.
pub fn discover(
    catalog: &Catalog,
    categories: &CategoryIndex,
    query: Option<&str>,
    category: Category,
    limit: Option<usize>,
) -> DiscoveryResult {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let query = query.map(str::trim).unwrap_or("");

    if query.is_empty() {
        return browse_all(catalog, categories, category, limit, false);
    }

    let needle = query.to_lowercase();
    let mut matches: Vec<ServiceMatch> = Vec::new();

    for service in catalog.services() {
        if !categories.service_in(&service.id, category) {
            continue;
        }

        let service_score = if service.id.to_lowercase().contains(&needle) {
            Some(SCORE_ID_MATCH)
        } else if service.title.to_lowercase().contains(&needle) {
            Some(SCORE_TITLE_MATCH)
        } else {
            None
        };

        let matched_entities: Vec<String> = service
            .entity_types()
            .iter()
            .filter(|e| e.name.to_lowercase().contains(&needle))
            .map(|e| e.name.clone())
            .collect();

        // A matched service keeps its own score; the entity score applies
        // when only entity names matched.
        let score = match (service_score, matched_entities.is_empty()) {
            (Some(s), _) => s,
            (None, false) => SCORE_ENTITY_MATCH,
            (None, true) => continue,
        };

        let entities = if matched_entities.is_empty() {
            service.entity_names()
        } else {
            matched_entities
        };

        matches.push(ServiceMatch {
            service_id: service.id.clone(),
            title: service.title.clone(),
            score,
            categories: categories.categories_of(&service.id).to_vec(),
            entities,
        });
    }

    if matches.is_empty() {
        log::debug!("query '{query}' matched nothing, falling back to full catalog");
        return browse_all(catalog, categories, category, limit, true);
    }

    matches.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    truncate_into_result(matches, limit, false)
}

/// Empty-query path: every category-filtered service at a fixed browse
/// score, sorted ascending by title for stable human browsing.
fn browse_all(
    catalog: &Catalog,
    categories: &CategoryIndex,
    category: Category,
    limit: usize,
    fallback: bool,
) -> DiscoveryResult {
    let mut matches: Vec<ServiceMatch> = catalog
        .services()
        .iter()
        .filter(|s| categories.service_in(&s.id, category))
        .map(|s| ServiceMatch {
            service_id: s.id.clone(),
            title: s.title.clone(),
            score: SCORE_BROWSE,
            categories: categories.categories_of(&s.id).to_vec(),
            entities: s.entity_names(),
        })
        .collect();
    matches.sort_by(|a, b| a.title.cmp(&b.title));
    truncate_into_result(matches, limit, fallback)
}

fn truncate_into_result(
    mut matches: Vec<ServiceMatch>,
    limit: usize,
    fallback: bool,
) -> DiscoveryResult {
    let total_found = matches.len();
    matches.truncate(limit);
    DiscoveryResult {
        total_shown: matches.len(),
        total_found,
        matches,
        fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::model::{EntityType, ODataVersion, Property, Service, ServiceMetadata};

    fn entity(name: &str) -> EntityType {
        EntityType {
            name: name.to_string(),
            namespace: String::new(),
            properties: vec![Property {
                name: "Id".to_string(),
                edm_type: "Edm.String".to_string(),
                nullable: false,
                max_length: None,
            }],
            keys: vec!["Id".to_string()],
            creatable: false,
            updatable: false,
            deletable: false,
        }
    }

    fn service(id: &str, title: &str, entities: &[&str]) -> Service {
        Service {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            version: ODataVersion::V2,
            base_path: format!("/odata/{id}"),
            metadata_path: String::new(),
            metadata: Some(ServiceMetadata {
                namespace: String::new(),
                entity_types: entities.iter().map(|e| entity(e)).collect(),
            }),
        }
    }

    fn fixture() -> (Catalog, CategoryIndex) {
        let catalog = Catalog::new(vec![
            service("SALES_SRV", "Sales Orders", &["SalesOrderHeader", "SalesOrderItem"]),
            service("ZC_CUSTOMER_SRV", "Customer Master", &["Customer"]),
            service("ZX_MISC_SRV", "Assorted Things", &["Widget"]),
        ]);
        let index = CategoryIndex::build(&catalog);
        (catalog, index)
    }

    #[test]
    fn test_empty_query_returns_everything_sorted_by_title() {
        let (catalog, index) = fixture();
        let result = discover(&catalog, &index, None, Category::All, None);
        assert!(!result.fallback);
        assert_eq!(result.total_found, 3);
        assert_eq!(result.total_shown, 3);
        let titles: Vec<&str> = result.matches.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Assorted Things", "Customer Master", "Sales Orders"]);
        assert!(result.matches.iter().all(|m| m.score == SCORE_BROWSE));
        // Entity-name lists ride along (names only).
        assert_eq!(
            result.matches[2].entities,
            vec!["SalesOrderHeader", "SalesOrderItem"]
        );
    }

    #[test]
    fn test_id_match_scores_higher_than_title_match() {
        let (catalog, index) = fixture();
        let result = discover(&catalog, &index, Some("sales"), Category::All, None);
        assert!(!result.fallback);
        let top = &result.matches[0];
        assert_eq!(top.service_id, "SALES_SRV");
        // The id substring won; matching entity names ride along.
        assert_eq!(top.score, SCORE_ID_MATCH);
        assert_eq!(top.entities, vec!["SalesOrderHeader", "SalesOrderItem"]);

        let result = discover(&catalog, &index, Some("customer master"), Category::All, None);
        assert_eq!(result.matches[0].score, SCORE_TITLE_MATCH);
    }

    #[test]
    fn test_entity_match_is_independent_of_service_match() {
        let (catalog, index) = fixture();
        let result = discover(&catalog, &index, Some("widget"), Category::All, None);
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].service_id, "ZX_MISC_SRV");
        assert_eq!(result.matches[0].score, SCORE_ENTITY_MATCH);
        assert_eq!(result.matches[0].entities, vec!["Widget"]);
    }

    #[test]
    fn test_zero_matches_falls_back_to_full_catalog() {
        let (catalog, index) = fixture();
        let result = discover(&catalog, &index, Some("nonexistent"), Category::All, None);
        assert!(result.fallback);
        assert_eq!(result.total_found, 3);
        // Fallback ordering is ascending by title.
        assert_eq!(result.matches[0].title, "Assorted Things");
    }

    #[test]
    fn test_fallback_preserves_category_filter() {
        let (catalog, index) = fixture();
        let result = discover(&catalog, &index, Some("nonexistent"), Category::Sales, None);
        assert!(result.fallback);
        assert_eq!(result.total_found, 1);
        assert_eq!(result.matches[0].service_id, "SALES_SRV");
    }

    #[test]
    fn test_unrecognized_category_coerces_to_all() {
        let (catalog, index) = fixture();
        let category = Category::parse("definitely-not-a-category");
        let result = discover(&catalog, &index, None, category, None);
        assert_eq!(result.total_found, 3);
    }

    #[test]
    fn test_limit_clamped_and_counts_reported() {
        let (catalog, index) = fixture();
        let result = discover(&catalog, &index, None, Category::All, Some(2));
        assert_eq!(result.total_found, 3);
        assert_eq!(result.total_shown, 2);

        // Out-of-range limits clamp instead of erroring.
        let result = discover(&catalog, &index, None, Category::All, Some(0));
        assert_eq!(result.total_shown, 1);
        let result = discover(&catalog, &index, None, Category::All, Some(500));
        assert_eq!(result.total_shown, 3);
    }
}
