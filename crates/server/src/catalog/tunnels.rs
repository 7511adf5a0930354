use sauce_mcp_http_tools::config::{ContextValue, ParamSpec, ResponseTransform, ToolSpec};
use std::collections::BTreeMap;

const TUNNEL_REASONS: [&str; 3] = [
    "Tunnel ID does not exist",
    "Tunnel has been terminated",
    "Insufficient permissions to access this tunnel",
];

const TUNNEL_SUGGESTIONS: [&str; 3] = [
    "Use get_tunnels_for_user to find active tunnels",
    "Verify tunnel ID is correct",
    "Check if tunnel is still running",
];

fn owner() -> ParamSpec {
    ParamSpec::path("username")
        .or_context(ContextValue::Username)
        .describe("Username of the tunnel owner. Defaults to the configured user.")
}

fn tunnel_id() -> ParamSpec {
    ParamSpec::path("tunnel_id").describe("The unique identifier of the tunnel.")
}

pub(super) fn tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::get(
            "get_tunnels_for_user",
            "/rest/v1/{username}/tunnels",
            "Returns the IDs of currently running Sauce Connect tunnels launched by or shared with \
             the specified user.",
        )
        .param(owner())
        .transform(ResponseTransform::Envelope {
            field: "tunnels".to_string(),
            count_field: Some("count".to_string()),
            echo: BTreeMap::from([("username".to_string(), "username".to_string())]),
            constants: serde_json::Map::new(),
        }),
        ToolSpec::get(
            "get_tunnel_information",
            "/rest/v1/{username}/tunnels/{tunnel_id}",
            "Returns information about the specified Sauce Connect tunnel.",
        )
        .param(owner())
        .param(tunnel_id())
        .not_found(&TUNNEL_REASONS, &TUNNEL_SUGGESTIONS),
        ToolSpec::get(
            "get_tunnel_version_downloads",
            "/rest/v1/public/tunnels/info/versions",
            "Returns the download URLs for versions of the Sauce Connect tunnel software.",
        )
        .param(ParamSpec::query("client_version").describe(
            "Sauce Connect client version, for example '5.2.3'.",
        )),
        ToolSpec::get(
            "get_current_jobs_for_tunnel",
            "/rest/v1/{username}/tunnels/{tunnel_id}/num_jobs",
            "Returns the number of currently running jobs for the specified Sauce Connect tunnel.",
        )
        .param(owner())
        .param(tunnel_id())
        .not_found(&TUNNEL_REASONS, &TUNNEL_SUGGESTIONS),
    ]
}
