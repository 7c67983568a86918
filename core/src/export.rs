use crate::aggregate::AttributedLineItem;
use crate::invocation::BillingPeriod;
use anyhow::{Result, anyhow};
use csv::Writer;

pub const DATASET_HEADERS: [&str; 14] = [
    "billing_period",
    "cost_center",
    "account_name",
    "identity_line_item_id",
    "line_item_usage_account_id",
    "line_item_unblended_cost",
    "resource_tags_user_cost_center",
    "resource_tags_user_cost_center_other",
    "resource_tags_aws_cloudformation_stack_name",
    "resource_tags_aws_servicecatalog_provisioning_principal_arn",
    "line_item_line_item_type",
    "product_product_name",
    "line_item_usage_type",
    "line_item_line_item_description",
];

/// Writes the attributed line items as CSV, one row per line item, each row
/// tagged with the billing period.
pub fn write_dataset_csv(period: BillingPeriod, items: &[AttributedLineItem<'_>]) -> Result<Vec<u8>> {
    let mut wtr = Writer::from_writer(vec![]);
    wtr.write_record(DATASET_HEADERS)?;

    let period = period.to_string();
    for item in items {
        let line = item.line_item;
        let cost = line.unblended_cost.to_string();
        wtr.write_record([
            period.as_str(),
            item.cost_center.as_str(),
            item.account_name.unwrap_or_default(),
            line.line_item_id.as_deref().unwrap_or_default(),
            line.account_id.as_str(),
            cost.as_str(),
            line.cost_center.as_deref().unwrap_or_default(),
            line.cost_center_other.as_deref().unwrap_or_default(),
            line.cloudformation_stack.as_deref().unwrap_or_default(),
            line.service_catalog_principal.as_deref().unwrap_or_default(),
            line.line_item_type.as_deref().unwrap_or_default(),
            line.product_name.as_deref().unwrap_or_default(),
            line.usage_type.as_deref().unwrap_or_default(),
            line.description.as_deref().unwrap_or_default(),
        ])?;
    }

    wtr.into_inner()
        .map_err(|err| anyhow!("flush dataset csv: {}", err.error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::attribution::Attributor;
    use crate::loader::{AccountDirectory, read_billing_csv};

    #[test]
    fn writes_period_label_and_original_columns() {
        let items = read_billing_csv(
            "\
identity_line_item_id,line_item_usage_account_id,line_item_unblended_cost,resource_tags_user_cost_center,product_product_name
li-1,012345678901,2.5,Program_123456,Amazon S3
li-2,012345678901,0,Program_123456,Amazon S3
"
            .as_bytes(),
        )
        .expect("billing");
        let directory = AccountDirectory::default();
        let result = aggregate(&items, &directory, &Attributor::default()).expect("aggregate");
        let period = BillingPeriod::new(2022, 6).expect("period");

        let bytes = write_dataset_csv(period, &result.line_items).expect("csv");
        let text = String::from_utf8(bytes).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("billing_period,cost_center,account_name"));
        assert_eq!(
            lines[1],
            "2022-06,Program / 123456,,li-1,012345678901,2.5,Program_123456,,,,,Amazon S3,,"
        );
    }
}
