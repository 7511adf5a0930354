use sauce_mcp_http_tools::config::{ParamSpec, ResponseTransform, ToolSpec};
use serde_json::json;

fn build_source() -> ParamSpec {
    ParamSpec::path("build_source")
        .one_of(&["vdc", "rdc"])
        .default_value(json!("vdc"))
        .describe("'rdc' for Real Device builds, 'vdc' for Emulator or Simulator builds.")
}

fn job_state(name: &str, meaning: &str) -> ParamSpec {
    ParamSpec::query(name)
        .boolean()
        .describe(format!("Filter on whether jobs {meaning}."))
}

pub(super) fn tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::get(
            "lookup_builds",
            "/v2/builds/{build_source}/",
            "Returns a summary of each build matching the query, including the build ID required \
             by the other build tools. When filtering by time, provide both start and end.",
        )
        .param(build_source())
        .param(ParamSpec::query("user_id").describe("Builds owned by this user."))
        .param(ParamSpec::query("org_id").describe("Builds in this organization."))
        .param(ParamSpec::query("group_id").describe("Builds associated with this group."))
        .param(ParamSpec::query("team_id").describe("Builds for this team."))
        .param(ParamSpec::query("status").string_array().describe(
            "Build statuses to include: running, error, failed, complete, success.",
        ))
        .param(ParamSpec::query("start").describe(
            "Builds whose earliest job ran on or after this Unix timestamp.",
        ))
        .param(ParamSpec::query("end").describe(
            "Builds whose latest job ran on or before this Unix timestamp.",
        ))
        .param(ParamSpec::query("limit").integer().describe("Maximum number of builds to return."))
        .param(ParamSpec::query("name").describe("Builds with a matching name."))
        .param(ParamSpec::query("offset").integer().describe("Begins the results at this index."))
        .param(ParamSpec::query("sort").one_of(&["asc", "desc"]).describe("Sort order.")),
        ToolSpec::get(
            "get_build",
            "/v2/builds/{build_source}/{build_id}/",
            "Retrieve the details related to a specific build by its unique ID.",
        )
        .param(build_source())
        .param(ParamSpec::path("build_id").describe(
            "The unique identifier of the build. Use lookup_builds to find build IDs.",
        ))
        .not_found(
            &[
                "Build ID does not exist",
                "Build data may have expired due to retention policies",
                "Incorrect build source specified (rdc vs vdc)",
            ],
            &[
                "Use lookup_builds to find available builds",
                "Verify build ID and build_source are correct",
                "Try the other build_source (rdc vs vdc)",
            ],
        ),
        ToolSpec::get(
            "get_build_for_job",
            "/v2/builds/{build_source}/jobs/{job_id}/build/",
            "Retrieve the details of the build a specific job belongs to.",
        )
        .param(build_source())
        .param(ParamSpec::path("job_id").describe("The unique identifier of the job."))
        .not_found(
            &[
                "Job ID does not exist",
                "Job is not associated with a build",
                "Incorrect build source specified (rdc vs vdc)",
            ],
            &[
                "Use get_job_details to verify job exists",
                "Try the other build_source (rdc vs vdc)",
                "Some jobs may not be part of a build",
            ],
        ),
        ToolSpec::get(
            "lookup_jobs_in_build",
            "/v2/builds/{build_source}/{build_id}/jobs/",
            "Returns information about all jobs associated with the specified build, optionally \
             filtered by job state.",
        )
        .param(build_source())
        .param(ParamSpec::path("build_id").describe(
            "The unique identifier of the build. Use lookup_builds to find build IDs.",
        ))
        .param(ParamSpec::query("modified_since").describe(
            "Only jobs modified after this timestamp.",
        ))
        .param(job_state("completed", "ran uninterrupted to completion"))
        .param(job_state("errored", "errored"))
        .param(job_state("failed", "failed"))
        .param(job_state("finished", "are no longer running"))
        .param(job_state("new", "are new"))
        .param(job_state("passed", "passed"))
        .param(job_state("public", "ran on public devices"))
        .param(job_state("queued", "are queued"))
        .param(job_state("running", "are currently running"))
        .param(job_state("faulty", "errored or failed"))
        .transform(ResponseTransform::EmptyArrayNote {
            field: "jobs".to_string(),
            note_field: "data_retention_info".to_string(),
            note: json!({
                "message": "No jobs found for this build. Jobs may no longer be available due to data retention policies.",
                "note": "Jobs for builds older than ~3 months may have been archived or purged.",
                "suggestions": [
                    "Try a more recent build ID",
                    "Use get_recent_jobs to find currently available jobs",
                    "Verify this {build_source} build exists and has associated jobs"
                ]
            }),
        })
        .not_found(
            &[
                "Build ID does not exist",
                "Build data may have expired due to retention policies",
                "Incorrect build_source parameter (vdc vs rdc)",
            ],
            &[
                "Verify build ID is correct using lookup_builds",
                "Check if build_source should be 'vdc' or 'rdc'",
                "Try a more recent build",
            ],
        ),
    ]
}
