use crate::aggregate::{Aggregation, aggregate};
use crate::attribution::Attributor;
use crate::errors::CostReportError;
use crate::export::write_dataset_csv;
use crate::invocation::{Invocation, ObjectLayout};
use crate::loader::{AccountDirectory, read_billing_csv, read_directory_csv};
use crate::model::BillingLineItem;
use crate::storage::ObjectStore;
use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::fs::File;
use std::path::Path;

/// The two tables one run works on. Either may be absent until loaded.
#[derive(Debug, Clone, Default)]
pub struct ReportInputs {
    pub billing: Option<Vec<BillingLineItem>>,
    pub directory: Option<AccountDirectory>,
}

impl ReportInputs {
    pub fn new(billing: Vec<BillingLineItem>, directory: AccountDirectory) -> Self {
        Self {
            billing: Some(billing),
            directory: Some(directory),
        }
    }

    pub fn from_files(billing: &Path, directory: &Path) -> Result<Self> {
        let directory = read_directory_csv(open_input(directory)?)
            .with_context(|| format!("load account directory {}", directory.display()))?;
        let billing = read_billing_csv(open_input(billing)?)
            .with_context(|| format!("load billing data {}", billing.display()))?;
        Ok(Self::new(billing, directory))
    }

    pub fn process(&self, attributor: &Attributor) -> Result<Aggregation<'_>, CostReportError> {
        let billing = self
            .billing
            .as_deref()
            .ok_or(CostReportError::InputMissing("cost and usage data"))?;
        let directory = self
            .directory
            .as_ref()
            .ok_or(CostReportError::InputMissing("account cost center data"))?;
        aggregate(billing, directory, attributor)
    }
}

fn open_input(path: &Path) -> Result<File> {
    if !path.exists() {
        return Err(CostReportError::ObjectMissing(path.to_path_buf()).into());
    }
    File::open(path).with_context(|| format!("open {}", path.display()))
}

pub async fn download_inputs(
    store: &dyn ObjectStore,
    invocation: &Invocation,
    layout: &ObjectLayout,
) -> Result<ReportInputs> {
    let accounts = store
        .get_object(&invocation.bucket, &layout.account_csv_key)
        .await
        .with_context(|| format!("download {}", layout.account_csv_key))?;
    let directory = read_directory_csv(accounts.as_slice())?;

    let billing = store
        .get_object(&invocation.bucket, &invocation.billing_key)
        .await
        .with_context(|| format!("download {}", invocation.billing_key))?;
    let billing = read_billing_csv(billing.as_slice())?;

    Ok(ReportInputs::new(billing, directory))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedReport {
    pub summary_key: String,
    pub dataset_key: String,
}

/// Stores the rendered summary and the attributed dataset next to the report.
pub async fn upload_outputs(
    store: &dyn ObjectStore,
    invocation: &Invocation,
    layout: &ObjectLayout,
    summary_html: &str,
    aggregation: &Aggregation<'_>,
) -> Result<UploadedReport> {
    if summary_html.is_empty() {
        return Err(CostReportError::InputMissing("summary").into());
    }
    let dataset = write_dataset_csv(invocation.period, &aggregation.line_items)?;

    let summary_key = layout.summary_key(invocation.period);
    store
        .put_object(&invocation.bucket, &summary_key, summary_html.as_bytes().to_vec())
        .await
        .with_context(|| format!("upload {}", summary_key))?;

    let dataset_key = layout.dataset_key(invocation.period);
    store
        .put_object(&invocation.bucket, &dataset_key, dataset)
        .await
        .with_context(|| format!("upload {}", dataset_key))?;

    Ok(UploadedReport {
        summary_key,
        dataset_key,
    })
}

/// Status document returned to whatever triggered the run.
pub fn invocation_response(result: &Result<()>) -> Value {
    match result {
        Ok(()) => json!({
            "statusCode": 200,
            "body": { "message": "Success" },
        }),
        Err(err) => json!({
            "statusCode": 500,
            "body": { "message": format!("Exception encountered: {}", format_error_chain(err)) },
        }),
    }
}

pub fn format_error_chain(err: &anyhow::Error) -> String {
    let mut parts: Vec<String> = err.chain().map(|e| e.to_string()).collect();
    if parts.is_empty() {
        return "Unknown error".to_string();
    }
    parts.dedup();
    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invocation::{BillingPeriod, Trigger};
    use crate::storage::LocalObjectStore;
    use crate::storage::test_support::TempDirGuard;
    use crate::utils::format_usd;

    const FIXTURE_BILLING: &str = include_str!("../fixtures/cur.csv");
    const FIXTURE_ACCOUNTS: &str = include_str!("../fixtures/acc.csv");

    fn fixture_inputs() -> ReportInputs {
        ReportInputs::new(
            read_billing_csv(FIXTURE_BILLING.as_bytes()).expect("billing fixture"),
            read_directory_csv(FIXTURE_ACCOUNTS.as_bytes()).expect("accounts fixture"),
        )
    }

    #[test]
    fn fixture_reconciles_to_known_total() {
        let inputs = fixture_inputs();
        let result = inputs.process(&Attributor::default()).expect("process");

        assert!((result.summary.billed_total - 101823.8892761993).abs() < 1e-6);
        assert_eq!(format_usd(result.summary.total), "$101823.89");
    }

    #[test]
    fn fixture_resolves_tag_and_account_fallbacks() {
        let inputs = fixture_inputs();
        let result = inputs.process(&Attributor::default()).expect("process");
        let summary = &result.summary;

        assert!(summary.get("Test Other / 456456").is_some());
        assert!(summary.get("Test Account / 789789").is_some());
        assert!(summary.get("NO PROGRAM / 000000").is_some());
        assert!(summary.get("Unknown / 999999").is_some());
        assert!(summary.get("Other / 000001").is_none());
        assert!(summary.get("Indirects").is_none());
    }

    #[test]
    fn missing_tables_are_reported() {
        let err = ReportInputs::default()
            .process(&Attributor::default())
            .expect_err("missing billing");
        assert!(matches!(err, CostReportError::InputMissing("cost and usage data")));

        let inputs = ReportInputs {
            billing: Some(Vec::new()),
            directory: None,
        };
        let err = inputs
            .process(&Attributor::default())
            .expect_err("missing directory");
        assert!(matches!(
            err,
            CostReportError::InputMissing("account cost center data")
        ));
    }

    #[test]
    fn missing_input_file_is_reported() {
        let temp = TempDirGuard::new("service-files");
        let err = ReportInputs::from_files(
            &temp.path().join("cur.csv"),
            &temp.path().join("acc.csv"),
        )
        .expect_err("missing files");
        assert!(
            err.chain()
                .any(|cause| matches!(
                    cause.downcast_ref::<CostReportError>(),
                    Some(CostReportError::ObjectMissing(_))
                ))
        );
    }

    #[tokio::test]
    async fn downloads_processes_and_uploads() {
        let temp = TempDirGuard::new("service-run");
        let store = LocalObjectStore::new(temp.path());
        let layout = ObjectLayout::default();
        let period = BillingPeriod::new(2022, 6).expect("period");
        let invocation = Invocation::plan(
            &Trigger::Schedule,
            Some("bucket"),
            &layout,
            period,
        )
        .expect("plan");

        store
            .put_object("bucket", &layout.account_csv_key, FIXTURE_ACCOUNTS.as_bytes().to_vec())
            .await
            .expect("seed accounts");
        store
            .put_object(
                "bucket",
                &invocation.billing_key,
                FIXTURE_BILLING.as_bytes().to_vec(),
            )
            .await
            .expect("seed billing");

        let inputs = download_inputs(&store, &invocation, &layout)
            .await
            .expect("download");
        let aggregation = inputs.process(&Attributor::default()).expect("process");
        let uploaded = upload_outputs(&store, &invocation, &layout, "<html></html>", &aggregation)
            .await
            .expect("upload");

        assert_eq!(uploaded.summary_key, layout.summary_key(period));
        let dataset = store
            .get_object("bucket", &uploaded.dataset_key)
            .await
            .expect("dataset");
        let dataset = String::from_utf8(dataset).expect("utf8");
        assert!(dataset.lines().skip(1).all(|line| line.starts_with("2022-06,")));
        assert_eq!(dataset.lines().count(), aggregation.line_items.len() + 1);
    }

    #[tokio::test]
    async fn missing_billing_object_fails_download() {
        let temp = TempDirGuard::new("service-missing");
        let store = LocalObjectStore::new(temp.path());
        let layout = ObjectLayout::default();
        let invocation = Invocation::plan(
            &Trigger::Schedule,
            Some("bucket"),
            &layout,
            BillingPeriod::new(2022, 6).expect("period"),
        )
        .expect("plan");
        store
            .put_object("bucket", &layout.account_csv_key, FIXTURE_ACCOUNTS.as_bytes().to_vec())
            .await
            .expect("seed accounts");

        let err = download_inputs(&store, &invocation, &layout)
            .await
            .expect_err("missing billing");
        assert!(err.to_string().contains("download sagebase/monthly-costs"));
    }

    #[test]
    fn response_reflects_outcome() {
        let ok = invocation_response(&Ok(()));
        assert_eq!(ok["statusCode"], 200);
        assert_eq!(ok["body"]["message"], "Success");

        let failed = invocation_response(&Err(CostReportError::ReconciliationMismatch {
            grouped: 1.0,
            baseline: 2.0,
        }
        .into()));
        assert_eq!(failed["statusCode"], 500);
        assert!(
            failed["body"]["message"]
                .as_str()
                .unwrap_or_default()
                .contains("categorized costs do not add up")
        );
    }
}
