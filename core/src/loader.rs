use crate::errors::CostReportError;
use crate::model::{AccountDirectoryEntry, BillingLineItem};
use anyhow::Result;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::io::Read;

const BILLING_TABLE: &str = "billing";
const DIRECTORY_TABLE: &str = "account directory";

/// Account id to directory entry, unique by account id.
#[derive(Debug, Clone, Default)]
pub struct AccountDirectory {
    entries: HashMap<String, AccountDirectoryEntry>,
}

impl AccountDirectory {
    pub fn from_entries(
        entries: impl IntoIterator<Item = AccountDirectoryEntry>,
    ) -> Result<Self, CostReportError> {
        let mut map = HashMap::new();
        for entry in entries {
            if map.contains_key(&entry.account_id) {
                return Err(CostReportError::DuplicateAccount(entry.account_id));
            }
            map.insert(entry.account_id.clone(), entry);
        }
        Ok(Self { entries: map })
    }

    pub fn get(&self, account_id: &str) -> Option<&AccountDirectoryEntry> {
        self.entries.get(account_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reads billing line items; a NaN or infinite cost rejects the table.
pub fn read_billing_csv<R: Read>(reader: R) -> Result<Vec<BillingLineItem>> {
    let rows: Vec<BillingLineItem> = read_table(reader, BILLING_TABLE)?;
    if let Some(index) = rows.iter().position(|row| !row.unblended_cost.is_finite()) {
        return Err(CostReportError::InvalidRow {
            table: BILLING_TABLE,
            row: index + 1,
            message: format!("non-finite cost {}", rows[index].unblended_cost),
        }
        .into());
    }
    Ok(rows)
}

pub fn read_directory_csv<R: Read>(reader: R) -> Result<AccountDirectory> {
    let entries: Vec<AccountDirectoryEntry> = read_table(reader, DIRECTORY_TABLE)?;
    Ok(AccountDirectory::from_entries(entries)?)
}

fn read_table<R: Read, T: DeserializeOwned>(reader: R, table: &'static str) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (index, result) in reader.deserialize().enumerate() {
        let row: T = result.map_err(|err| CostReportError::InvalidRow {
            table,
            row: index + 1,
            message: err.to_string(),
        })?;
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_billing_rows_without_optional_tag_columns() {
        let data = "\
line_item_usage_account_id,line_item_unblended_cost,resource_tags_user_cost_center
012345678901,1.50,Program_123456
012345678901,-0.25,
";
        let rows = read_billing_csv(data.as_bytes()).expect("read billing");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].account_id, "012345678901");
        assert_eq!(rows[0].unblended_cost, 1.5);
        assert_eq!(rows[0].cost_center.as_deref(), Some("Program_123456"));
        assert_eq!(rows[0].cost_center_other, None);
        assert_eq!(rows[0].service_catalog_principal, None);
        assert_eq!(rows[1].unblended_cost, -0.25);
        assert_eq!(rows[1].cost_center, None);
    }

    #[test]
    fn keeps_na_tag_values_verbatim() {
        let data = "\
line_item_usage_account_id,line_item_unblended_cost,resource_tags_user_cost_center,resource_tags_user_cost_center_other
111122223333,2.0,na,na
";
        let rows = read_billing_csv(data.as_bytes()).expect("read billing");
        assert_eq!(rows[0].cost_center.as_deref(), Some("na"));
        assert_eq!(rows[0].cost_center_other.as_deref(), Some("na"));
    }

    #[test]
    fn reports_row_number_for_bad_cost() {
        let data = "\
line_item_usage_account_id,line_item_unblended_cost
111122223333,1.0
111122223333,not-a-number
";
        let err = read_billing_csv(data.as_bytes()).expect_err("bad cost");
        let message = err.to_string();
        assert!(message.contains("billing row 2"), "{message}");
    }

    #[test]
    fn rejects_non_finite_costs() {
        let data = "\
line_item_usage_account_id,line_item_unblended_cost
111122223333,1.0
111122223333,NaN
";
        let err = read_billing_csv(data.as_bytes()).expect_err("nan cost");
        assert!(matches!(
            err.downcast_ref::<CostReportError>(),
            Some(CostReportError::InvalidRow { row: 2, .. })
        ));

        let data = "\
line_item_usage_account_id,line_item_unblended_cost
111122223333,inf
";
        assert!(read_billing_csv(data.as_bytes()).is_err());
    }

    #[test]
    fn directory_keeps_leading_zeros() {
        let data = "\
account_id,account_name,account_cost_center
000123456789,sandbox,Sandbox / 123123
";
        let directory = read_directory_csv(data.as_bytes()).expect("read directory");
        assert_eq!(directory.len(), 1);
        assert!(!directory.is_empty());
        assert!(AccountDirectory::default().is_empty());
        let entry = directory.get("000123456789").expect("entry");
        assert_eq!(entry.account_name, "sandbox");
        assert_eq!(entry.cost_center.as_deref(), Some("Sandbox / 123123"));
        assert!(directory.get("123456789").is_none());
    }

    #[test]
    fn directory_rejects_duplicate_accounts() {
        let data = "\
account_id,account_name,account_cost_center
111122223333,one,A / 111111
111122223333,two,B / 222222
";
        let err = read_directory_csv(data.as_bytes()).expect_err("duplicate");
        assert!(matches!(
            err.downcast_ref::<CostReportError>(),
            Some(CostReportError::DuplicateAccount(id)) if id == "111122223333"
        ));
    }
}
