//! Per-line-item cost-center attribution.
//!
//! Resolution order: the line item's `cost_center` tag, the `cost_center_other`
//! tag when the primary tag is the generic "Other" code, the account's default
//! cost center, and finally [`UNKNOWN_COST_CENTER`]. Whatever is chosen is
//! normalized and then canonicalized through a [`SynonymTable`].

use crate::model::{AccountDirectoryEntry, BillingLineItem};
use regex::Regex;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub const OTHER_COST_CENTER: &str = "Other / 000001";
pub const OTHER_UNSPECIFIED_COST_CENTER: &str = "Other (Unspecified) / 000001";
pub const NO_PROGRAM_COST_CENTER: &str = "NO PROGRAM / 000000";
pub const UNKNOWN_COST_CENTER: &str = "Unknown / 999999";

const NOT_AVAILABLE: &str = "na";

/// A cell that may or may not carry a usable value.
///
/// Absent cells, the literal `"na"` and NaN are invalid. Every other string
/// (even an empty one) and every other number is valid.
pub trait CellValue {
    fn is_valid(&self) -> bool;
}

impl CellValue for str {
    fn is_valid(&self) -> bool {
        self != NOT_AVAILABLE
    }
}

impl CellValue for String {
    fn is_valid(&self) -> bool {
        self.as_str().is_valid()
    }
}

impl CellValue for f64 {
    fn is_valid(&self) -> bool {
        !self.is_nan()
    }
}

impl<T: CellValue + ?Sized> CellValue for &T {
    fn is_valid(&self) -> bool {
        (**self).is_valid()
    }
}

impl<T: CellValue> CellValue for Option<T> {
    fn is_valid(&self) -> bool {
        self.as_ref().is_some_and(CellValue::is_valid)
    }
}

pub fn is_valid<V: CellValue + ?Sized>(value: &V) -> bool {
    value.is_valid()
}

fn legacy_code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"_([0-9]{5,6})").expect("legacy code pattern is valid"))
}

/// Rewrites legacy `Name_123456` tags into the canonical `Name / 123456` form.
pub fn normalize(label: &str) -> Cow<'_, str> {
    legacy_code_pattern().replace_all(label, " / $1")
}

/// Lookup of equivalent cost-center labels onto one canonical label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymTable {
    entries: BTreeMap<String, String>,
}

impl Default for SynonymTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table.insert("Indirects", NO_PROGRAM_COST_CENTER);
        table.insert("No Program / 000000", NO_PROGRAM_COST_CENTER);
        table
    }
}

impl SynonymTable {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.entries.insert(from.into(), to.into());
    }

    pub fn extend<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (from, to) in entries {
            self.insert(from, to);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn canonicalize(&self, label: &str) -> String {
        self.entries
            .get(label)
            .cloned()
            .unwrap_or_else(|| label.to_string())
    }
}

/// Resolves line items to cost-center labels against a fixed synonym table.
#[derive(Debug, Clone, Default)]
pub struct Attributor {
    synonyms: SynonymTable,
}

impl Attributor {
    pub fn new(synonyms: SynonymTable) -> Self {
        Self { synonyms }
    }

    pub fn synonyms(&self) -> &SynonymTable {
        &self.synonyms
    }

    pub fn resolve(
        &self,
        line_item: &BillingLineItem,
        account: Option<&AccountDirectoryEntry>,
    ) -> String {
        let raw = line_item_cost_center(line_item)
            .or_else(|| {
                account
                    .and_then(|entry| entry.cost_center.as_deref())
                    .filter(|value| value.is_valid())
            })
            .unwrap_or(UNKNOWN_COST_CENTER);

        let normalized = normalize(raw);
        self.synonyms.canonicalize(&normalized)
    }
}

/// Resolves with the built-in synonym table.
pub fn resolve(line_item: &BillingLineItem, account: Option<&AccountDirectoryEntry>) -> String {
    Attributor::default().resolve(line_item, account)
}

fn line_item_cost_center(line_item: &BillingLineItem) -> Option<&str> {
    let primary = line_item
        .cost_center
        .as_deref()
        .filter(|value| value.is_valid())?;

    if primary != OTHER_COST_CENTER {
        return Some(primary);
    }

    // "Other" is only a placeholder; the specific program lives in the second tag.
    let other = line_item
        .cost_center_other
        .as_deref()
        .filter(|value| value.is_valid())
        .unwrap_or(OTHER_UNSPECIFIED_COST_CENTER);
    Some(other)
}
