use anyhow::{Context, Result, anyhow};
use cost_centers_core::aggregate::CostCenterSummary;
use cost_centers_core::attribution::Attributor;
use cost_centers_core::config::Config;
use cost_centers_core::errors::CostReportError;
use cost_centers_core::export::write_dataset_csv;
use cost_centers_core::invocation::{BillingPeriod, Invocation, Trigger, parse_event};
use cost_centers_core::model::{ErrorKind, ErrorPayload, OutputFormat};
use cost_centers_core::service::{ReportInputs, download_inputs, invocation_response, upload_outputs};
use cost_centers_core::storage::LocalObjectStore;
use cost_centers_ui::html::render_summary_html;
use cost_centers_ui::text::{RenderOptions, render_summary, summary_json};
use serde_json::{Value, json};
use std::path::Path;

use crate::args::{ConfigArgs, ConfigCommand, ConfigCommandArgs, GlobalArgs, RunArgs, SummarizeArgs};
use crate::logger;

pub struct OutputPreferences {
    pub format: OutputFormat,
    pub pretty: bool,
    pub json_only: bool,
}

impl OutputPreferences {
    pub fn uses_json_output(&self) -> bool {
        self.json_only || self.format == OutputFormat::Json
    }
}

pub async fn run_job(args: RunArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(args.config.as_ref())?;
    let layout = config.layout();
    let timezone = config.timezone()?;
    let current = BillingPeriod::current(timezone);

    let trigger = match &args.event {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("read event {}", path.display()))?;
            let event: Value = serde_json::from_str(&raw)
                .with_context(|| format!("parse event {}", path.display()))?;
            parse_event(&event)
        }
        None => Trigger::Schedule,
    };
    match &trigger {
        Trigger::Object(location) => logger::info(
            "event_received",
            "Found bucket/key in event",
            Some(json!({ "bucket": location.bucket, "key": location.key })),
        ),
        Trigger::Incomplete(reason) => logger::warning("event_incomplete", *reason),
        Trigger::Schedule => logger::info("scheduled_run", "No event object; using current month", None),
    }

    let bucket = args.bucket.clone().or_else(|| config.bucket());
    let invocation = Invocation::plan(&trigger, bucket.as_deref(), &layout, current)?;
    if !invocation.period_from_key {
        logger::error(
            "period_missing",
            format!("Year/month could not be found in key {}", invocation.billing_key),
        );
    }
    logger::info(
        "invocation_planned",
        format!("Processing {}", invocation.title),
        Some(json!({
            "bucket": invocation.bucket,
            "billingKey": invocation.billing_key,
            "period": invocation.period.to_string(),
        })),
    );

    let root = args
        .storage_root
        .clone()
        .or_else(|| config.storage_root())
        .ok_or_else(|| anyhow!("no storage root configured (use --storage-root)"))?;
    let store = LocalObjectStore::new(root);

    logger::info(
        "download_started",
        "Reading account and billing tables",
        Some(json!({ "storageRoot": store.root().display().to_string() })),
    );
    let inputs = download_inputs(&store, &invocation, &layout).await?;
    let attributor = Attributor::new(config.synonyms());
    let aggregation = process(&inputs, &attributor)?;

    let html = render_summary_html(&invocation.title, &aggregation.summary);
    let uploaded = upload_outputs(&store, &invocation, &layout, &html, &aggregation).await?;
    logger::info(
        "report_uploaded",
        "Uploaded summary and dataset",
        Some(json!({
            "summaryKey": uploaded.summary_key,
            "datasetKey": uploaded.dataset_key,
        })),
    );

    let prefs = output_preferences(args.format.into(), args.json, args.pretty, global);
    if prefs.uses_json_output() {
        let mut response = invocation_response(&Ok(()));
        response["report"] = summary_json(
            &invocation.title,
            invocation.period,
            &aggregation.summary,
        )?;
        response["uploaded"] = json!({
            "summaryKey": uploaded.summary_key,
            "datasetKey": uploaded.dataset_key,
        });
        return print_json(&response, prefs.pretty);
    }

    print_summary(
        &invocation.title,
        invocation.period,
        &aggregation.summary,
        &prefs,
        args.show_counts,
    )
}

pub async fn run_summarize(args: SummarizeArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(args.config.as_ref())?;
    let current = BillingPeriod::current(config.timezone()?);
    let period = match args.period.as_deref() {
        Some(raw) => BillingPeriod::parse(raw)?,
        None => current,
    };
    let title = args.title.clone().unwrap_or_else(|| period.title(current));

    logger::info(
        "inputs_loading",
        "Reading billing and account csv files",
        Some(json!({
            "billing": args.billing.display().to_string(),
            "accounts": args.accounts.display().to_string(),
        })),
    );
    let inputs = ReportInputs::from_files(&args.billing, &args.accounts)?;
    let attributor = Attributor::new(config.synonyms());
    let aggregation = process(&inputs, &attributor)?;

    if let Some(path) = &args.html_out {
        write_output(path, render_summary_html(&title, &aggregation.summary).as_bytes()).await?;
    }
    if let Some(path) = &args.dataset_out {
        write_output(path, &write_dataset_csv(period, &aggregation.line_items)?).await?;
    }

    let prefs = output_preferences(args.format.into(), args.json, args.pretty, global);
    print_summary(&title, period, &aggregation.summary, &prefs, args.show_counts)
}

pub async fn run_config(cmd: ConfigCommandArgs, global: &GlobalArgs) -> Result<()> {
    let mut command = cmd.command;
    if global.json_only {
        match &mut command {
            ConfigCommand::Validate(args) => args.format = Some(crate::args::OutputFormatArg::Json),
            ConfigCommand::Dump(args) => args.format = Some(crate::args::OutputFormatArg::Json),
        }
    }

    match command {
        ConfigCommand::Validate(args) => validate_config(args),
        ConfigCommand::Dump(args) => dump_config(args),
    }
}

fn process<'a>(
    inputs: &'a ReportInputs,
    attributor: &Attributor,
) -> Result<cost_centers_core::aggregate::Aggregation<'a>> {
    if let Some(directory) = &inputs.directory {
        if directory.is_empty() {
            logger::warning(
                "accounts_empty",
                "Account table has no rows; untagged line items resolve to Unknown",
            );
        } else {
            logger::log(
                logger::LogLevel::Debug,
                "accounts_loaded",
                format!("Loaded {} accounts", directory.len()),
                None,
            );
        }
    }
    let aggregation = inputs.process(attributor).inspect_err(|err| {
        if let CostReportError::ReconciliationMismatch { .. } = err {
            logger::log(logger::LogLevel::Critical, "total_mismatch", err.to_string(), None);
        }
    })?;
    logger::info(
        "total_verified",
        "Categorized costs reconcile with the billed total",
        Some(json!({
            "costCenters": aggregation.summary.cost_centers.len(),
            "lineItems": aggregation.line_items.len(),
            "excludedZeroCost": aggregation.summary.excluded_zero_cost,
            "total": aggregation.summary.total,
            "billedTotal": aggregation.summary.billed_total,
        })),
    );
    Ok(aggregation)
}

fn load_config(path: Option<&std::path::PathBuf>) -> Result<Config> {
    let config = Config::load(path)?;
    if let Ok(path) = Config::path(path) {
        logger::log(
            logger::LogLevel::Debug,
            "config_loaded",
            "Loaded config",
            Some(json!({ "path": path.display().to_string(), "missing": !path.exists() })),
        );
    }
    Ok(config)
}

fn output_preferences(
    format: OutputFormat,
    json: bool,
    pretty: bool,
    global: &GlobalArgs,
) -> OutputPreferences {
    OutputPreferences {
        format: if json || global.json_only {
            OutputFormat::Json
        } else {
            format
        },
        pretty,
        json_only: global.json_only,
    }
}

fn print_summary(
    title: &str,
    period: BillingPeriod,
    summary: &CostCenterSummary,
    prefs: &OutputPreferences,
    show_counts: bool,
) -> Result<()> {
    let rendered = render_summary(
        title,
        period,
        summary,
        &RenderOptions {
            format: prefs.format,
            pretty: prefs.pretty,
            json_only: prefs.json_only,
            show_counts,
        },
    )?;
    if let Some(text) = rendered {
        println!("{}", text);
    }
    Ok(())
}

fn print_json(value: &Value, pretty: bool) -> Result<()> {
    if pretty {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", serde_json::to_string(value)?);
    }
    Ok(())
}

async fn write_output(path: &Path, body: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create {}", parent.display()))?;
    }
    tokio::fs::write(path, body)
        .await
        .with_context(|| format!("write {}", path.display()))?;
    logger::info(
        "output_written",
        format!("Wrote {}", path.display()),
        None,
    );
    Ok(())
}

fn validate_config(args: ConfigArgs) -> Result<()> {
    let path = Config::path(args.config.as_ref())?;
    let missing = !path.exists();
    let config = Config::load(args.config.as_ref())?;
    config.timezone()?;
    match args.format.map(Into::into).unwrap_or(OutputFormat::Text) {
        OutputFormat::Json => {
            let output = if missing {
                json!({
                    "status": "ok",
                    "missing": true,
                    "path": path.display().to_string()
                })
            } else {
                json!({"status": "ok"})
            };
            print_json(&output, args.pretty)?;
        }
        OutputFormat::Text => {
            if missing {
                println!("config ok (missing; using defaults): {}", path.display());
            } else {
                println!("config ok: {}", path.display());
            }
        }
    }

    Ok(())
}

fn dump_config(args: ConfigArgs) -> Result<()> {
    let config = Config::load(args.config.as_ref())?;
    match args.format.map(Into::into).unwrap_or(OutputFormat::Json) {
        OutputFormat::Json => print_json(&serde_json::to_value(&config)?, args.pretty)?,
        OutputFormat::Text => {
            let layout = config.layout();
            println!("bucket: {}", config.bucket().unwrap_or_else(|| "-".to_string()));
            println!(
                "storage root: {}",
                config
                    .storage_root()
                    .map(|root| root.display().to_string())
                    .unwrap_or_else(|| "-".to_string())
            );
            println!("report prefix: {}/{}", layout.cur_prefix, layout.report_name);
            println!("account table: {}", layout.account_csv_key);
            println!("cost center synonyms: {}", config.synonyms().len());
        }
    }

    Ok(())
}

pub fn cli_error_payload(code: i32, message: String, kind: ErrorKind) -> ErrorPayload {
    ErrorPayload {
        code,
        message,
        kind: Some(kind),
    }
}
