use cost_centers_core::errors::CostReportError;
use cost_centers_core::model::ErrorKind;

fn report_error(err: &anyhow::Error) -> Option<&CostReportError> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<CostReportError>())
}

pub fn exit_code_for_error(err: &anyhow::Error) -> i32 {
    if let Some(report_err) = report_error(err) {
        return match report_err {
            CostReportError::InvalidPeriod(_) => 2,
            CostReportError::InputMissing(_)
            | CostReportError::ObjectMissing(_)
            | CostReportError::InvalidRow { .. }
            | CostReportError::DuplicateAccount(_) => 3,
            CostReportError::BucketMissing | CostReportError::ConfigPathUnavailable => 4,
            CostReportError::ReconciliationMismatch { .. } => 5,
        };
    }
    if err
        .chain()
        .any(|cause| cause.downcast_ref::<csv::Error>().is_some())
    {
        return 3;
    }
    if err
        .chain()
        .any(|cause| cause.downcast_ref::<serde_json::Error>().is_some())
    {
        return 4;
    }
    1
}

pub fn error_kind_for_error(err: &anyhow::Error) -> ErrorKind {
    if let Some(report_err) = report_error(err) {
        return match report_err {
            CostReportError::InvalidPeriod(_) => ErrorKind::Args,
            CostReportError::InputMissing(_)
            | CostReportError::ObjectMissing(_)
            | CostReportError::InvalidRow { .. }
            | CostReportError::DuplicateAccount(_) => ErrorKind::Input,
            CostReportError::BucketMissing | CostReportError::ConfigPathUnavailable => {
                ErrorKind::Config
            }
            CostReportError::ReconciliationMismatch { .. } => ErrorKind::Reconciliation,
        };
    }
    ErrorKind::Runtime
}
