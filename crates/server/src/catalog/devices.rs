use sauce_mcp_http_tools::config::{ParamSpec, ResponseTransform, ToolSpec};
use serde_json::json;

const RDC_ASSET_TYPES: [&str; 10] = [
    "deviceLogs",
    "appiumLogs",
    "appiumRequests",
    "junit.xml",
    "xcuitestLogs",
    "video.mp4",
    "screenshots.zip",
    "network.har",
    "insights.json",
    "crash.json",
];

fn rdc_job_id() -> ParamSpec {
    ParamSpec::path("job_id").describe(
        "The unique identifier of a real device job. Use get_real_device_jobs to find it.",
    )
}

pub(super) fn tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::get(
            "get_specific_device",
            "/v1/rdc/devices/{device_id}",
            "Get information about the device specified in the request.",
        )
        .param(ParamSpec::path("device_id").describe(
            "The device identifier: the 'descriptor' value from get_devices_status.",
        )),
        ToolSpec::get(
            "get_devices_status",
            "/v1/rdc/devices/status",
            "Returns the devices in the data center with their current state (AVAILABLE, IN_USE, \
             CLEANING, MAINTENANCE, REBOOTING, OFFLINE). Each device's 'descriptor' is the \
             device_id for get_specific_device.",
        ),
        ToolSpec::get(
            "get_real_device_jobs",
            "/v1/rdc/jobs",
            "Get a list of jobs that are running on real devices in the data center.",
        )
        .param(
            ParamSpec::query("limit")
                .integer()
                .default_value(json!(5))
                .describe("The maximum number of jobs to return."),
        )
        .param(
            ParamSpec::query("offset")
                .integer()
                .default_value(json!(1))
                .describe("Return results following this index number."),
        )
        .param(ParamSpec::query("type").describe("Use LIVE to show manual tests only.")),
        ToolSpec::get(
            "get_specific_real_device_job",
            "/v1/rdc/jobs/{job_id}",
            "Get information about a specific job running on a real device in the data center.",
        )
        .param(rdc_job_id()),
        ToolSpec::get(
            "get_specific_real_device_job_asset",
            "/v1/rdc/jobs/{job_id}/{asset_type}",
            "Download a specific asset for a Real Device Cloud (RDC) job, returned base64-encoded. \
             Use this for jobs that ran on physical mobile devices, or when get_test_assets \
             reports a Real Device job.",
        )
        .param(rdc_job_id())
        .param(
            ParamSpec::path("asset_type")
                .one_of(&RDC_ASSET_TYPES)
                .describe("Which asset to download."),
        )
        .asset("{job_id}_{asset_type}"),
        ToolSpec::get(
            "get_private_devices",
            "/v1/rdc/device-management/devices",
            "Get a list of private devices with their device information and settings.",
        )
        .transform(ResponseTransform::Envelope {
            field: "devices".to_string(),
            count_field: None,
            echo: Default::default(),
            constants: serde_json::Map::new(),
        }),
    ]
}
