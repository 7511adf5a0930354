use sauce_mcp_http_tools::config::{ParamSpec, ToolSpec};

fn listing_params(tool: ToolSpec) -> ToolSpec {
    tool.param(ParamSpec::query("q").describe("Search term matched against names."))
        .param(ParamSpec::query("kind").describe("App kind, for example 'android' or 'ios'."))
        .param(ParamSpec::query("page").integer().describe("Page number, starting at 1."))
        .param(ParamSpec::query("per_page").integer().describe("Results per page."))
}

pub(super) fn tools() -> Vec<ToolSpec> {
    vec![
        listing_params(ToolSpec::get(
            "get_storage_files",
            "/v1/storage/files",
            "Returns the set of files that have been uploaded to Sauce Storage by the requestor.",
        )),
        listing_params(ToolSpec::get(
            "get_storage_groups",
            "/v1/storage/groups",
            "Returns the app groups (apps containing multiple files) currently in storage for the \
             requestor.",
        )),
        ToolSpec::get(
            "get_storage_groups_settings",
            "/v1/storage/groups/{group_id}/settings",
            "Returns the settings of an app group with the given ID.",
        )
        .param(ParamSpec::path("group_id").describe(
            "The unique identifier of the app group. Use get_storage_groups to find it.",
        )),
    ]
}
