use crate::attribution::Attributor;
use crate::errors::CostReportError;
use crate::loader::AccountDirectory;
use crate::model::BillingLineItem;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Largest allowed gap between the grouped total and the billed total.
pub const RECONCILIATION_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostCenterTotal {
    pub cost_center: String,
    pub cost: f64,
    pub line_items: usize,
}

/// Grouped spend, ordered by cost descending then label ascending.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostCenterSummary {
    pub cost_centers: Vec<CostCenterTotal>,
    /// Sum of the grouped costs.
    pub total: f64,
    /// Sum of every billed line item, zero-cost rows included.
    pub billed_total: f64,
    pub excluded_zero_cost: usize,
}

impl CostCenterSummary {
    pub fn get(&self, cost_center: &str) -> Option<&CostCenterTotal> {
        self.cost_centers
            .iter()
            .find(|total| total.cost_center == cost_center)
    }
}

/// A retained line item together with its resolved cost center.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributedLineItem<'a> {
    pub line_item: &'a BillingLineItem,
    pub account_name: Option<&'a str>,
    pub cost_center: String,
}

#[derive(Debug, Clone)]
pub struct Aggregation<'a> {
    pub summary: CostCenterSummary,
    /// Retained line items in summary order.
    pub line_items: Vec<AttributedLineItem<'a>>,
}

/// Attributes, groups and reconciles one month of line items.
///
/// Every line item is left-joined against the directory: unmatched accounts
/// stay in the summary and resolve through the fallback chain.
pub fn aggregate<'a>(
    line_items: &'a [BillingLineItem],
    directory: &'a AccountDirectory,
    attributor: &Attributor,
) -> Result<Aggregation<'a>, CostReportError> {
    let billed_total: f64 = line_items.iter().map(|item| item.unblended_cost).sum();

    let mut attributed = Vec::new();
    let mut excluded_zero_cost = 0;
    for line_item in line_items {
        if line_item.unblended_cost == 0.0 {
            excluded_zero_cost += 1;
            continue;
        }
        let account = directory.get(&line_item.account_id);
        attributed.push(AttributedLineItem {
            line_item,
            account_name: account.map(|entry| entry.account_name.as_str()),
            cost_center: attributor.resolve(line_item, account),
        });
    }

    let mut groups: HashMap<&str, CostCenterTotal> = HashMap::new();
    for item in &attributed {
        let group = groups
            .entry(item.cost_center.as_str())
            .or_insert_with(|| CostCenterTotal {
                cost_center: item.cost_center.clone(),
                cost: 0.0,
                line_items: 0,
            });
        group.cost += item.line_item.unblended_cost;
        group.line_items += 1;
    }

    let mut cost_centers: Vec<CostCenterTotal> = groups.into_values().collect();
    cost_centers.sort_by(compare_totals);

    let total = verify_total(&cost_centers, billed_total)?;

    let rank: HashMap<&str, usize> = cost_centers
        .iter()
        .enumerate()
        .map(|(index, group)| (group.cost_center.as_str(), index))
        .collect();
    attributed.sort_by_key(|item| rank.get(item.cost_center.as_str()).copied());

    Ok(Aggregation {
        summary: CostCenterSummary {
            cost_centers,
            total,
            billed_total,
            excluded_zero_cost,
        },
        line_items: attributed,
    })
}

/// Sums the groups and checks them against the billed total.
pub fn verify_total(groups: &[CostCenterTotal], billed_total: f64) -> Result<f64, CostReportError> {
    let grouped: f64 = groups.iter().map(|group| group.cost).sum();
    // NaN on either side fails the comparison and is reported as a mismatch.
    if (grouped - billed_total).abs() <= RECONCILIATION_TOLERANCE {
        Ok(grouped)
    } else {
        Err(CostReportError::ReconciliationMismatch {
            grouped,
            baseline: billed_total,
        })
    }
}

fn compare_totals(a: &CostCenterTotal, b: &CostCenterTotal) -> Ordering {
    b.cost
        .total_cmp(&a.cost)
        .then_with(|| a.cost_center.cmp(&b.cost_center))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribution::{OTHER_UNSPECIFIED_COST_CENTER, UNKNOWN_COST_CENTER};
    use crate::model::AccountDirectoryEntry;

    fn tagged(account_id: &str, cost: f64, cost_center: Option<&str>) -> BillingLineItem {
        BillingLineItem {
            cost_center: cost_center.map(str::to_string),
            ..BillingLineItem::new(account_id, cost)
        }
    }

    fn directory() -> AccountDirectory {
        AccountDirectory::from_entries([
            AccountDirectoryEntry {
                account_id: "111111111111".to_string(),
                account_name: "dedicated".to_string(),
                cost_center: Some("Test Account / 789789".to_string()),
            },
            AccountDirectoryEntry {
                account_id: "222222222222".to_string(),
                account_name: "shared".to_string(),
                cost_center: Some("na".to_string()),
            },
        ])
        .expect("directory")
    }

    fn items() -> Vec<BillingLineItem> {
        vec![
            tagged("111111111111", 10.0, None),
            tagged("222222222222", 5.5, Some("Program_123456")),
            tagged("222222222222", 4.5, Some("Program / 123456")),
            tagged("222222222222", 3.0, Some("Indirects")),
            tagged("222222222222", 2.0, None),
            tagged("333333333333", 1.25, None),
            BillingLineItem {
                cost_center_other: Some("na".to_string()),
                ..tagged("222222222222", 0.75, Some("Other / 000001"))
            },
            tagged("222222222222", 0.0, Some("Zero / 000000")),
            tagged("222222222222", -0.5, Some("Credits / 555555")),
        ]
    }

    #[test]
    fn groups_sorts_and_reconciles() {
        let items = items();
        let directory = directory();
        let result = aggregate(&items, &directory, &Attributor::default()).expect("aggregate");
        let summary = result.summary;

        let labels: Vec<&str> = summary
            .cost_centers
            .iter()
            .map(|group| group.cost_center.as_str())
            .collect();
        assert_eq!(
            labels,
            vec![
                "Program / 123456",
                "Test Account / 789789",
                UNKNOWN_COST_CENTER,
                "NO PROGRAM / 000000",
                OTHER_UNSPECIFIED_COST_CENTER,
                "Credits / 555555",
            ]
        );
        assert_eq!(summary.cost_centers[0].cost, 10.0);
        assert_eq!(summary.cost_centers[0].line_items, 2);
        assert_eq!(summary.get(UNKNOWN_COST_CENTER).map(|g| g.cost), Some(3.25));
        assert_eq!(summary.excluded_zero_cost, 1);
        assert!((summary.total - summary.billed_total).abs() <= RECONCILIATION_TOLERANCE);
        assert!((summary.total - 26.5).abs() < 1e-9);
        assert!(summary.get("Zero / 000000").is_none());
    }

    #[test]
    fn unmatched_accounts_stay_in_the_summary() {
        let items = vec![tagged("999999999999", 7.0, None)];
        let directory = AccountDirectory::default();
        let result = aggregate(&items, &directory, &Attributor::default()).expect("aggregate");

        assert_eq!(result.summary.cost_centers.len(), 1);
        assert_eq!(result.summary.cost_centers[0].cost_center, UNKNOWN_COST_CENTER);
        assert_eq!(result.line_items[0].account_name, None);
    }

    #[test]
    fn ties_break_by_label() {
        let items = vec![
            tagged("1", 2.0, Some("B / 222222")),
            tagged("1", 2.0, Some("A / 111111")),
            tagged("1", 3.0, Some("C / 333333")),
        ];
        let directory = AccountDirectory::default();
        let result = aggregate(&items, &directory, &Attributor::default()).expect("aggregate");
        let labels: Vec<&str> = result
            .summary
            .cost_centers
            .iter()
            .map(|group| group.cost_center.as_str())
            .collect();
        assert_eq!(labels, vec!["C / 333333", "A / 111111", "B / 222222"]);
    }

    #[test]
    fn line_items_follow_summary_order() {
        let items = items();
        let directory = directory();
        let result = aggregate(&items, &directory, &Attributor::default()).expect("aggregate");

        assert_eq!(result.line_items.len(), items.len() - 1);
        assert_eq!(result.line_items[0].cost_center, "Program / 123456");
        assert_eq!(result.line_items[1].cost_center, "Program / 123456");
        assert_eq!(
            result.line_items.last().map(|item| item.cost_center.as_str()),
            Some("Credits / 555555")
        );
        assert_eq!(result.line_items[2].account_name, Some("dedicated"));
    }

    #[test]
    fn repeated_runs_are_identical() {
        let items = items();
        let directory = directory();
        let attributor = Attributor::default();
        let first = aggregate(&items, &directory, &attributor).expect("first");
        let second = aggregate(&items, &directory, &attributor).expect("second");

        assert_eq!(first.summary, second.summary);
        for (a, b) in first.summary.cost_centers.iter().zip(&second.summary.cost_centers) {
            assert_eq!(a.cost.to_bits(), b.cost.to_bits());
        }
    }

    #[test]
    fn mismatch_is_an_error() {
        let groups = vec![CostCenterTotal {
            cost_center: "A / 111111".to_string(),
            cost: 10.0,
            line_items: 1,
        }];
        assert!(verify_total(&groups, 10.005).is_ok());
        let err = verify_total(&groups, 10.02).expect_err("mismatch");
        assert!(matches!(err, CostReportError::ReconciliationMismatch { .. }));
        assert!(
            err.to_string()
                .contains("categorized costs do not add up to total bill")
        );
    }

    #[test]
    fn nan_costs_fail_reconciliation() {
        let items = vec![tagged("1", 1.0, None), tagged("1", f64::NAN, None)];
        let directory = AccountDirectory::default();
        let err = aggregate(&items, &directory, &Attributor::default()).expect_err("nan");
        assert!(matches!(err, CostReportError::ReconciliationMismatch { .. }));
    }

    #[test]
    fn empty_input_reconciles_to_zero() {
        let directory = AccountDirectory::default();
        let result = aggregate(&[], &directory, &Attributor::default()).expect("aggregate");
        assert!(result.summary.cost_centers.is_empty());
        assert_eq!(result.summary.total, 0.0);
    }
}
