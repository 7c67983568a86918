use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// One row of the Cost and Usage Report, using the Athena column names.
///
/// Tag columns that are missing from the export, or empty in a row, load as
/// `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingLineItem {
    #[serde(rename = "identity_line_item_id", default)]
    pub line_item_id: Option<String>,
    #[serde(rename = "line_item_usage_account_id")]
    pub account_id: String,
    #[serde(rename = "line_item_unblended_cost")]
    pub unblended_cost: f64,
    #[serde(rename = "resource_tags_user_cost_center", default)]
    pub cost_center: Option<String>,
    #[serde(rename = "resource_tags_user_cost_center_other", default)]
    pub cost_center_other: Option<String>,
    #[serde(rename = "resource_tags_aws_cloudformation_stack_name", default)]
    pub cloudformation_stack: Option<String>,
    #[serde(
        rename = "resource_tags_aws_servicecatalog_provisioning_principal_arn",
        default
    )]
    pub service_catalog_principal: Option<String>,
    #[serde(rename = "line_item_line_item_type", default)]
    pub line_item_type: Option<String>,
    #[serde(rename = "product_product_name", default)]
    pub product_name: Option<String>,
    #[serde(rename = "line_item_usage_type", default)]
    pub usage_type: Option<String>,
    #[serde(rename = "line_item_line_item_description", default)]
    pub description: Option<String>,
}

impl BillingLineItem {
    pub fn new(account_id: impl Into<String>, unblended_cost: f64) -> Self {
        Self {
            line_item_id: None,
            account_id: account_id.into(),
            unblended_cost,
            cost_center: None,
            cost_center_other: None,
            cloudformation_stack: None,
            service_catalog_principal: None,
            line_item_type: None,
            product_name: None,
            usage_type: None,
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountDirectoryEntry {
    pub account_id: String,
    pub account_name: String,
    #[serde(rename = "account_cost_center", default)]
    pub cost_center: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub code: i32,
    pub message: String,
    pub kind: Option<ErrorKind>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Args,
    Config,
    Input,
    Reconciliation,
    Runtime,
}
