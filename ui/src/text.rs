use anyhow::Result;
use cost_centers_core::aggregate::CostCenterSummary;
use cost_centers_core::invocation::BillingPeriod;
use cost_centers_core::model::OutputFormat;
use serde_json::{Value, json};

use crate::reports::{RenderOptions as TableOptions, render_summary_table};

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub format: OutputFormat,
    pub pretty: bool,
    pub json_only: bool,
    pub show_counts: bool,
}

pub fn summary_json(title: &str, period: BillingPeriod, summary: &CostCenterSummary) -> Result<Value> {
    Ok(json!({
        "title": title,
        "period": period.to_string(),
        "summary": serde_json::to_value(summary)?,
    }))
}

pub fn render_summary(
    title: &str,
    period: BillingPeriod,
    summary: &CostCenterSummary,
    options: &RenderOptions,
) -> Result<Option<String>> {
    match options.format {
        OutputFormat::Json => {
            let value = summary_json(title, period, summary)?;
            let json = if options.pretty {
                serde_json::to_string_pretty(&value)?
            } else {
                serde_json::to_string(&value)?
            };
            Ok(Some(json))
        }
        OutputFormat::Text => {
            if options.json_only {
                return Ok(None);
            }
            Ok(Some(render_summary_table(
                title,
                summary,
                &TableOptions {
                    show_counts: options.show_counts,
                },
            )))
        }
    }
}
