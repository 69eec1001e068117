use broker::message::WorkReport;
use serde::Deserialize;
use utoipa::ToSchema;

/// JSON body a subscriber POSTs back to a callback URL.
///
/// Beyond the correlation id, the shape is kind-specific (an email report
/// carries only `success`/`error`; an attendees report adds `attendees` and
/// `count`), so everything except the id flattens into the report.
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct ReportParams {
    #[serde(rename = "requestId")]
    pub request_id: String,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub report: WorkReport,
}
