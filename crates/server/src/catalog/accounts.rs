use sauce_mcp_http_tools::config::{ContextValue, ParamSpec, ToolSpec};

pub(super) fn tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::get(
            "get_account_info",
            "/team-management/v1/users",
            "Provides the current user's Sauce Labs account information, including username, jobs \
             run, minutes used, and overall account status. Useful for a quick overview of account \
             activity.",
        )
        .param(ParamSpec::query("username").from_context(ContextValue::Username)),
        ToolSpec::get(
            "lookup_teams",
            "/team-management/v1/teams",
            "Queries the organization of the requesting account and returns the number of teams \
             matching the query and a summary of each team, including the ID value, which other \
             team tools require.",
        )
        .param(ParamSpec::query("id").describe(
            "Comma-separated team IDs, to receive details of multiple teams at once.",
        ))
        .param(ParamSpec::query("name").describe(
            "Returns the teams whose names begin with this value.",
        )),
        ToolSpec::get(
            "get_team",
            "/team-management/v1/teams/{id}",
            "Returns the full profile of the specified team. The ID of the team is the only valid \
             unique identifier.",
        )
        .param(ParamSpec::path("id").describe(
            "The unique identifier of the team. Use lookup_teams to find team IDs.",
        ))
        .not_found(
            &[
                "Team ID does not exist",
                "Team has been deleted",
                "Insufficient permissions to access this team",
            ],
            &[
                "Use lookup_teams to find available teams",
                "Verify team ID is correct",
                "Check your organization permissions",
            ],
        ),
        ToolSpec::get(
            "list_team_members",
            "/team-management/v1/teams/{id}/members/",
            "Returns the number of members in the specified team and lists each member.",
        )
        .param(ParamSpec::path("id").describe("Identifies the team whose members are listed.")),
        ToolSpec::get(
            "lookup_users",
            "/team-management/v1/users",
            "Queries the organization of the requesting account and returns the number of users \
             matching the query and a basic profile of each user, including the ID value.",
        )
        .param(ParamSpec::query("id").describe("Comma-separated user IDs."))
        .param(ParamSpec::query("username").describe(
            "Limits the results to usernames that begin with this value.",
        ))
        .param(ParamSpec::query("teams").describe(
            "Comma-separated team IDs the users must belong to.",
        ))
        .param(ParamSpec::query("roles").describe(
            "Comma-separated roles: 1 (Organization Admin), 4 (Team Admin), 3 (Member).",
        ))
        .param(ParamSpec::query("phrase").describe(
            "Users whose first name, last name, or email address begins with this value.",
        ))
        .param(ParamSpec::query("status").describe("One of 'active', 'pending', 'inactive'."))
        .param(ParamSpec::query("limit").integer().describe(
            "Maximum number of results per page. Defaults to 20 upstream.",
        ))
        .param(ParamSpec::query("offset").integer().describe(
            "The starting record number from which to return results.",
        )),
        ToolSpec::get(
            "get_user",
            "/team-management/v1/users/{id}/",
            "Returns the full profile of the specified user. The ID of the user is the only valid \
             unique identifier.",
        )
        .param(ParamSpec::path("id").describe(
            "The user's unique identifier. Use lookup_users to find user IDs.",
        ))
        .not_found(
            &[
                "User ID does not exist",
                "User has been deleted or deactivated",
                "Insufficient permissions to access this user",
            ],
            &[
                "Use lookup_users to find available users",
                "Verify user ID is correct",
                "Check your organization permissions",
            ],
        ),
        ToolSpec::get(
            "get_my_active_team",
            "/team-management/v1/users/me/active-team/",
            "Retrieves the Sauce Labs active team for the currently authenticated user.",
        ),
        ToolSpec::get(
            "lookup_service_accounts",
            "/team-management/v1/service-accounts",
            "Lists existing service accounts in your organization.",
        )
        .param(ParamSpec::query("id").describe("Comma-separated service account IDs."))
        .param(ParamSpec::query("username").describe(
            "Limits the results to usernames that begin with this value.",
        ))
        .param(ParamSpec::query("teams").describe(
            "Comma-separated team IDs the service accounts must belong to.",
        ))
        .param(ParamSpec::query("limit").integer().describe(
            "Maximum number of results per page. Defaults to 20 upstream.",
        ))
        .param(ParamSpec::query("offset").integer().describe(
            "The starting record number from which to return results.",
        )),
        ToolSpec::get(
            "get_service_account",
            "/team-management/v1/service-accounts/{id}/",
            "Retrieves details of the specified service account.",
        )
        .param(ParamSpec::path("id").describe(
            "The unique identifier of the service account. Use lookup_service_accounts to find it.",
        ))
        .not_found(
            &[
                "Service account ID does not exist",
                "Service account has been deleted",
                "Insufficient permissions to access this service account",
            ],
            &[
                "Use lookup_service_accounts to find available service accounts",
                "Verify service account ID is correct",
                "Check your organization permissions",
            ],
        ),
        ToolSpec::get(
            "get_org_concurrency",
            "/usage-analytics/v1/concurrency/org",
            "Returns the concurrency usage of the specified organization.",
        )
        .param(ParamSpec::query("org_id").required().describe("The organization ID.")),
        ToolSpec::get(
            "get_team_concurrency",
            "/usage-analytics/v1/concurrency/teams",
            "Returns the concurrency usage of the specified team.",
        )
        .param(ParamSpec::query("org_id").required().describe("The organization ID."))
        .param(ParamSpec::query("team_id").required().describe("The team ID.")),
    ]
}
