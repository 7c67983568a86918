//! Turning a trigger payload into a concrete billing period and object keys.

use crate::errors::CostReportError;
use chrono::{Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;

pub const DEFAULT_CUR_PREFIX: &str = "sagebase";
pub const DEFAULT_REPORT_NAME: &str = "monthly-costs";
pub const DEFAULT_ACCOUNT_CSV_KEY: &str = "account_cost_centers/table.csv";
pub const SUMMARY_FILE: &str = "summary.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BillingPeriod {
    year: i32,
    month: u32,
}

impl BillingPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self, CostReportError> {
        if !(1..=12).contains(&month) || !(1000..=9999).contains(&year) {
            return Err(CostReportError::InvalidPeriod(format!("{year}-{month}")));
        }
        Ok(Self { year, month })
    }

    pub fn current(timezone: Tz) -> Self {
        let today = Utc::now().with_timezone(&timezone);
        Self {
            year: today.year(),
            month: today.month(),
        }
    }

    /// Finds a `year=YYYY/month=M` fragment anywhere in an object key.
    pub fn from_key(key: &str) -> Option<Self> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let pattern = PATTERN.get_or_init(|| {
            Regex::new(r"year=(\d{4})/month=(\d{1,2})").expect("period pattern is valid")
        });
        let captures = pattern.captures(key)?;
        let year = captures.get(1)?.as_str().parse().ok()?;
        let month = captures.get(2)?.as_str().parse().ok()?;
        Self::new(year, month).ok()
    }

    /// Accepts `YYYY-MM` or `YYYYMM`.
    pub fn parse(raw: &str) -> Result<Self, CostReportError> {
        let compact = raw.trim().replace('-', "");
        if compact.len() != 6 || !compact.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(CostReportError::InvalidPeriod(format!(
                "{raw}. expected YYYY-MM or YYYYMM"
            )));
        }
        let year = compact[0..4]
            .parse()
            .map_err(|_| CostReportError::InvalidPeriod(raw.to_string()))?;
        let month = compact[4..6]
            .parse()
            .map_err(|_| CostReportError::InvalidPeriod(raw.to_string()))?;
        Self::new(year, month)
    }

    /// Partition fragment used in object keys, e.g. `year=2022/month=6`.
    pub fn key_fragment(&self) -> String {
        format!("year={}/month={}", self.year, self.month)
    }

    /// Report title, e.g. `June 2022 (Complete)`.
    pub fn title(&self, current: BillingPeriod) -> String {
        let name = NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|date| date.format("%B %Y").to_string())
            .unwrap_or_else(|| self.to_string());
        if *self == current {
            format!("{name} (Month-to-Date)")
        } else {
            format!("{name} (Complete)")
        }
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Where the Cost and Usage Report and its derived outputs live in the bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLayout {
    pub cur_prefix: String,
    pub report_name: String,
    pub account_csv_key: String,
}

impl Default for ObjectLayout {
    fn default() -> Self {
        Self {
            cur_prefix: DEFAULT_CUR_PREFIX.to_string(),
            report_name: DEFAULT_REPORT_NAME.to_string(),
            account_csv_key: DEFAULT_ACCOUNT_CSV_KEY.to_string(),
        }
    }
}

impl ObjectLayout {
    pub fn period_key(&self, period: BillingPeriod, file: &str) -> String {
        format!(
            "{prefix}/{report}/{report}/{fragment}/{file}",
            prefix = self.cur_prefix,
            report = self.report_name,
            fragment = period.key_fragment(),
        )
    }

    pub fn billing_file(&self) -> String {
        format!("{}-00001.csv", self.report_name)
    }

    pub fn dataset_file(&self) -> String {
        format!("{}-by-center.csv", self.report_name)
    }

    pub fn billing_key(&self, period: BillingPeriod) -> String {
        self.period_key(period, &self.billing_file())
    }

    pub fn summary_key(&self, period: BillingPeriod) -> String {
        self.period_key(period, SUMMARY_FILE)
    }

    pub fn dataset_key(&self, period: BillingPeriod) -> String {
        self.period_key(period, &self.dataset_file())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// A new report object landed in the bucket.
    Object(ObjectLocation),
    /// Timer invocation, or an event that names no object.
    Schedule,
    /// The payload looked like a storage event but lacked the bucket or key.
    Incomplete(&'static str),
}

/// Reads an S3 notification (`Records`) or EventBridge (`detail`) payload.
pub fn parse_event(event: &Value) -> Trigger {
    if let Some(records) = event.get("Records") {
        let record = records.get(0);
        let s3 = record.and_then(|record| record.get("s3"));
        let key = s3
            .and_then(|s3| s3.pointer("/object/key"))
            .and_then(Value::as_str);
        let bucket = s3
            .and_then(|s3| s3.pointer("/bucket/name"))
            .and_then(Value::as_str);
        return match (bucket, key) {
            (Some(bucket), Some(key)) => Trigger::Object(ObjectLocation {
                bucket: unquote_plus(bucket),
                key: unquote_plus(key),
            }),
            _ => Trigger::Incomplete("no S3 info found in event record"),
        };
    }

    if let Some(detail) = event.get("detail") {
        let params = detail.get("requestParameters");
        let key = params
            .and_then(|params| params.get("key"))
            .and_then(Value::as_str);
        let bucket = params
            .and_then(|params| params.get("bucketName"))
            .and_then(Value::as_str);
        return match (bucket, key) {
            (Some(bucket), Some(key)) => Trigger::Object(ObjectLocation {
                bucket: unquote_plus(bucket),
                key: unquote_plus(key),
            }),
            _ => Trigger::Incomplete("no S3 info found in event detail"),
        };
    }

    Trigger::Schedule
}

/// Decodes a form-encoded key: `+` is a space, `%XX` an escaped byte.
fn unquote_plus(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

/// Everything one run needs to know about its inputs and outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub bucket: String,
    pub billing_key: String,
    pub period: BillingPeriod,
    /// False when an event key was present but carried no period fragment.
    pub period_from_key: bool,
    pub title: String,
}

impl Invocation {
    pub fn plan(
        trigger: &Trigger,
        default_bucket: Option<&str>,
        layout: &ObjectLayout,
        current: BillingPeriod,
    ) -> Result<Self, CostReportError> {
        let (bucket, billing_key, period, period_from_key) = match trigger {
            Trigger::Object(location) => {
                let found = BillingPeriod::from_key(&location.key);
                (
                    location.bucket.clone(),
                    location.key.clone(),
                    found.unwrap_or(current),
                    found.is_some(),
                )
            }
            Trigger::Schedule | Trigger::Incomplete(_) => {
                let bucket = default_bucket
                    .filter(|bucket| !bucket.trim().is_empty())
                    .ok_or(CostReportError::BucketMissing)?;
                (bucket.to_string(), layout.billing_key(current), current, true)
            }
        };

        Ok(Self {
            title: period.title(current),
            bucket,
            billing_key,
            period,
            period_from_key,
        })
    }
}
