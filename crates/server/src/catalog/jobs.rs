use sauce_mcp_http_tools::config::{ContextValue, ParamSpec, ResponseTransform, ToolSpec};
use serde_json::json;
use std::collections::BTreeMap;

/// Job timestamps reported by the REST v1 API as epoch seconds.
const JOB_EPOCH_FIELDS: [&str; 4] = ["start_time", "end_time", "creation_time", "modification_time"];

pub(crate) const TEST_ASSETS_REASONS: [&str; 3] = [
    "Job ID does not exist",
    "Job is a Real Device (RDC) job - use get_specific_real_device_job_asset instead",
    "Job data may have expired due to retention policies",
];

pub(crate) const TEST_ASSETS_SUGGESTIONS: [&str; 3] = [
    "Verify job ID is correct",
    "For RDC jobs, use get_specific_real_device_job_asset with asset types like 'deviceLogs', 'appiumLogs'",
    "Use get_recent_jobs to find available jobs",
];

fn job_epochs() -> ResponseTransform {
    ResponseTransform::EpochToTimestamp {
        fields: JOB_EPOCH_FIELDS.iter().map(ToString::to_string).collect(),
    }
}

pub(super) fn tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::get(
            "get_recent_jobs",
            "/rest/v1/{username}/jobs",
            "Retrieves a list of the most recent jobs run on Sauce Labs for the current user. \
             Useful for quickly checking the status of recent test runs.",
        )
        .param(ParamSpec::path("username").from_context(ContextValue::Username))
        .param(
            ParamSpec::query("limit")
                .integer()
                .default_value(json!(5))
                .describe("The upper limit of jobs to retrieve. Max is 100."),
        )
        .transform(job_epochs())
        .transform(ResponseTransform::Envelope {
            field: "jobs".to_string(),
            count_field: Some("total".to_string()),
            echo: BTreeMap::from([("per_page".to_string(), "limit".to_string())]),
            constants: serde_json::Map::from_iter([("page".to_string(), json!(1))]),
        }),
        ToolSpec::get(
            "get_job_details",
            "/rest/v1/{username}/jobs/{job_id}",
            "Retrieves the execution details of a particular job, by ID. Works for both Virtual \
             Device Cloud (VDC) and Real Device Cloud (RDC) jobs. If 'device_name' names a mobile \
             device it is an RDC job (use get_specific_real_device_job_asset for assets); if \
             'browser' names a web browser it is a VDC job (use get_test_assets).",
        )
        .param(ParamSpec::path("username").from_context(ContextValue::Username))
        .param(ParamSpec::path("job_id").describe("The Sauce Labs job ID (VDC or RDC)."))
        .transform(job_epochs())
        .not_found(
            &[
                "Job ID does not exist",
                "Job data may have expired due to retention policies",
                "Job may be from RDC platform (different endpoints)",
                "Insufficient permissions to access this job",
            ],
            &[
                "Verify job ID is correct",
                "Use get_recent_jobs to find available jobs",
                "Check if this is a VDC vs RDC job",
                "Ensure you have access to this job",
            ],
        ),
        ToolSpec::get(
            "get_test_assets",
            "/rest/v1/jobs/{job_id}/assets",
            "Returns the list of all assets for a test, based on the job ID. Only use this with \
             Virtual Device Cloud (VDC) jobs: Real Device Cloud (RDC) jobs return 404, use \
             get_specific_real_device_job_asset for those.",
        )
        .param(ParamSpec::path("job_id").describe("The Sauce Labs job ID (VDC jobs only)."))
        .not_found(&TEST_ASSETS_REASONS, &TEST_ASSETS_SUGGESTIONS),
    ]
}
