//! Tool-name allocation for callers that need a fixed enumeration of named
//! operations instead of dynamic dispatch.
//!
//! Every (operation, service, entity) triple maps to a short name of at most
//! 64 characters, deterministic given the same allocator state, unique for
//! the allocator's lifetime and never reassigned. Shortening escalates in
//! steps: verbatim, abbreviated fragments, hash-digest fragments, and a
//! numeric suffix on collision.

use std::collections::HashMap;
use std::sync::Mutex;

use sha2::{Digest, Sha256};

/// Hard cap on generated names.
pub const MAX_NAME_LEN: usize = 64;
/// Above this, abbreviated candidates give way to hash fragments.
const HASH_THRESHOLD: usize = 60;
/// Fragment target when abbreviating ids and entity names.
const FRAGMENT_LEN: usize = 12;

/// Organizational prefixes stripped from service ids before abbreviation.
const SERVICE_PREFIXES: &[&str] = &["ZBP_", "ZC_", "ZI_", "YBP_", "YC_", "YI_"];
/// Organizational suffixes, longest first so `_SRV_0001` wins over `_SRV`.
const SERVICE_SUFFIXES: &[&str] = &["_SRV_0001", "_SRV", "_CDS", "_SERVICE"];

#[derive(Default)]
struct AllocatorState {
    /// long form -> short name (idempotency lookup).
    by_long: HashMap<String, String>,
    /// short name -> long form (collision check + reverse query).
    by_short: HashMap<String, String>,
}

/// Allocator for short tool names. The check-and-insert is one critical
/// section so two concurrent allocations can never race onto the same name.
pub struct ToolNameAllocator {
    state: Mutex<AllocatorState>,
}

impl ToolNameAllocator {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(AllocatorState::default()),
        }
    }

    /// Canonical long form of a triple.
    pub fn long_form(operation: &str, service_id: &str, entity_name: &str) -> String {
        format!("{operation}--{service_id}--{entity_name}")
    }

    /// Allocate (or look up) the short name for a triple. Repeated calls
    /// with the same logical triple resolve via the existing mapping rather
    /// than minting a new name.
    pub fn allocate(&self, operation: &str, service_id: &str, entity_name: &str) -> String {
        let long = Self::long_form(operation, service_id, entity_name);
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(existing) = state.by_long.get(&long) {
            return existing.clone();
        }

        let candidate = shorten(operation, service_id, entity_name);
        let short = if state.by_short.contains_key(&candidate) {
            suffixed(&candidate, &state.by_short)
        } else {
            candidate
        };

        state.by_long.insert(long.clone(), short.clone());
        state.by_short.insert(short.clone(), long);
        log::debug!("allocated tool name '{short}'");
        short
    }

    /// Reverse lookup: short name to long form.
    pub fn resolve(&self, short_name: &str) -> Option<String> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.by_short.get(short_name).cloned()
    }

    /// Forward lookup without allocating.
    pub fn short_name_of(&self, operation: &str, service_id: &str, entity_name: &str) -> Option<String> {
        let long = Self::long_form(operation, service_id, entity_name);
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.by_long.get(&long).cloned()
    }

    pub fn len(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.by_long.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ToolNameAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Steps 1-3 of the shortening algorithm (collision handling is separate).
fn shorten(operation: &str, service_id: &str, entity_name: &str) -> String {
    let verbatim = format!("{operation}-{service_id}-{entity_name}");
    if verbatim.len() <= MAX_NAME_LEN {
        return verbatim;
    }

    let abbreviated = format!(
        "{operation}-{}-{}",
        abbreviate_service_id(service_id),
        abbreviate_entity_name(entity_name)
    );
    if abbreviated.len() <= HASH_THRESHOLD {
        return abbreviated;
    }

    // Digests are taken over the original full strings, so the result stays
    // deterministic no matter how abbreviation behaved.
    format!(
        "{operation}-{}-{}",
        hash_fragment(service_id),
        hash_fragment(entity_name)
    )
}

/// Strip organizational affixes; collapse multi-segment ids to first+last
/// segment; hard-truncate to the fragment length.
fn abbreviate_service_id(service_id: &str) -> String {
    let mut id = service_id;
    for prefix in SERVICE_PREFIXES {
        if let Some(rest) = id.strip_prefix(prefix) {
            id = rest;
            break;
        }
    }
    for suffix in SERVICE_SUFFIXES {
        if let Some(rest) = id.strip_suffix(suffix) {
            id = rest;
            break;
        }
    }

    let mut abbreviated = id.to_string();
    if abbreviated.len() > FRAGMENT_LEN {
        let segments: Vec<&str> = abbreviated.split('_').filter(|s| !s.is_empty()).collect();
        if segments.len() > 2 {
            abbreviated = format!("{}_{}", segments[0], segments[segments.len() - 1]);
        }
        abbreviated = truncate(&abbreviated, FRAGMENT_LEN);
    }
    abbreviated
}

/// Acronym-style compression: if the name reads like CamelCase (upper then
/// lower start, more than one capital), keep the capitals; else truncate.
fn abbreviate_entity_name(entity_name: &str) -> String {
    let mut chars = entity_name.chars();
    let camel_start = matches!(
        (chars.next(), chars.next()),
        (Some(first), Some(second)) if first.is_uppercase() && second.is_lowercase()
    );
    let capitals: String = entity_name.chars().filter(|c| c.is_uppercase()).collect();
    if camel_start && capitals.len() > 1 {
        capitals
    } else {
        truncate(entity_name, FRAGMENT_LEN)
    }
}

/// First 8 hex characters of the sha256 digest of the full original string.
fn hash_fragment(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    truncate(&hex, 8)
}

/// Append `-1`, `-2`, … until no collision, truncating the base candidate as
/// needed so the total never exceeds the cap. Called with the lock held.
fn suffixed(candidate: &str, taken: &HashMap<String, String>) -> String {
    let mut n: u32 = 1;
    loop {
        let suffix = format!("-{n}");
        let base = truncate(candidate, MAX_NAME_LEN.saturating_sub(suffix.len()));
        let attempt = format!("{base}{suffix}");
        if !taken.contains_key(&attempt) {
            return attempt;
        }
        n += 1;
    }
}

fn truncate(input: &str, max_len: usize) -> String {
    input.chars().take(max_len).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_triple_is_verbatim() {
        let allocator = ToolNameAllocator::new();
        let name = allocator.allocate("read", "SALES_SRV", "SalesOrderHeader");
        assert_eq!(name, "read-SALES_SRV-SalesOrderHeader");
    }

    #[test]
    fn test_repeated_triple_is_idempotent() {
        let allocator = ToolNameAllocator::new();
        let first = allocator.allocate("read", "SALES_SRV", "SalesOrderHeader");
        let second = allocator.allocate("read", "SALES_SRV", "SalesOrderHeader");
        assert_eq!(first, second);
        assert_eq!(allocator.len(), 1);
    }

    #[test]
    fn test_mapping_is_queryable_both_ways() {
        let allocator = ToolNameAllocator::new();
        let short = allocator.allocate("delete", "HR_SRV", "Employee");
        assert_eq!(
            allocator.resolve(&short).as_deref(),
            Some("delete--HR_SRV--Employee")
        );
        assert_eq!(
            allocator.short_name_of("delete", "HR_SRV", "Employee"),
            Some(short)
        );
        assert_eq!(allocator.short_name_of("read", "HR_SRV", "Employee"), None);
    }

    #[test]
    fn test_service_id_abbreviation() {
        assert_eq!(abbreviate_service_id("ZBP_CUSTOMER_SRV"), "CUSTOMER");
        assert_eq!(abbreviate_service_id("SALES_SRV_0001"), "SALES");
        // Multi-segment collapse to first+last, then truncation.
        assert_eq!(
            abbreviate_service_id("FINANCE_GENERAL_LEDGER_POSTINGS"),
            "FINANCE_POST"
        );
    }

    #[test]
    fn test_entity_name_acronym_compression() {
        assert_eq!(abbreviate_entity_name("SalesOrderHeader"), "SOH");
        assert_eq!(abbreviate_entity_name("UPPERCASE_ENTITY_NAME"), "UPPERCASE_EN");
    }

    #[test]
    fn test_long_triple_stays_under_cap() {
        let allocator = ToolNameAllocator::new();
        let service = "ZBP_VERY_LONG_BUSINESS_PARTNER_MASTER_DATA_SRV";
        let entity = "BusinessPartnerAddressDependentContactInformationRecord";
        let name = allocator.allocate("read-single", service, entity);
        assert!(name.len() <= MAX_NAME_LEN, "name too long: {name}");
        assert!(name.starts_with("read-single-"));
    }

    #[test]
    fn test_hash_fragments_are_deterministic() {
        assert_eq!(hash_fragment("SALES_SRV"), hash_fragment("SALES_SRV"));
        assert_ne!(hash_fragment("SALES_SRV"), hash_fragment("SALES_SRV2"));
        assert_eq!(hash_fragment("anything").len(), 8);
    }

    #[test]
    fn test_collision_gets_numeric_suffix() {
        let allocator = ToolNameAllocator::new();
        // Two distinct service ids that abbreviate to the same fragment.
        let a = allocator.allocate(
            "read",
            "ZBP_CUSTOMER_MASTER_DATA_LONG_TAIL_SUFFIX_PADDING_FIELDS_SRV",
            "X",
        );
        let b = allocator.allocate(
            "read",
            "YBP_CUSTOMER_MASTER_DATA_LONG_TAIL_SUFFIX_PADDING_FIELDS_SRV",
            "X",
        );
        assert_ne!(a, b);
        assert!(b.len() <= MAX_NAME_LEN);
        // The second allocation carries a suffix.
        assert!(b.ends_with("-1"), "expected -1 suffix, got {b}");
    }
}
