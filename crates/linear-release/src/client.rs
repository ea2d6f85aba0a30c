//! GraphQL client for the Linear API.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::LinearError;
use crate::models::{CreateIssueInput, Issue, Team, TeamLookup, Viewer, WorkflowState};

/// Linear API endpoint
const LINEAR_API_URL: &str = "https://api.linear.app/graphql";

/// Per-request timeout. No retries; a slow call fails fast and the
/// caller decides what to do with it.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Issue tracker operations the release workflow depends on.
///
/// [`LinearClient`] is the production implementation; reconciler
/// tests mock this trait to run without a network.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Get the authenticated user. Used only for credential validation.
    async fn get_viewer(&self) -> Result<Viewer, LinearError>;

    /// Get a team with its workflow states.
    async fn get_team(&self, lookup: &TeamLookup) -> Result<Team, LinearError>;

    /// Get an issue by its human identifier (e.g., "ENG-123").
    async fn get_issue_by_identifier(&self, identifier: &str) -> Result<Issue, LinearError>;

    /// Create a new issue.
    async fn create_issue(&self, input: CreateIssueInput) -> Result<Issue, LinearError>;

    /// Move an issue to a workflow state.
    async fn update_issue_state(&self, issue_id: &str, state_id: &str)
        -> Result<(), LinearError>;

    /// Add a markdown comment to an issue.
    async fn add_comment(&self, issue_id: &str, body: &str) -> Result<(), LinearError>;
}

/// Linear GraphQL client
#[derive(Debug, Clone)]
pub struct LinearClient {
    client: reqwest::Client,
    api_url: String,
}

/// GraphQL request body
#[derive(Debug, Serialize)]
struct GraphQLRequest<V: Serialize> {
    query: &'static str,
    variables: V,
}

/// GraphQL response wrapper
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

/// GraphQL error
#[derive(Debug, Deserialize)]
struct GraphQLError {
    message: String,
    #[serde(default)]
    path: Option<Vec<String>>,
    #[serde(default)]
    extensions: Option<GraphQLErrorExtensions>,
}

/// Optional machine-readable error metadata
#[derive(Debug, Deserialize)]
struct GraphQLErrorExtensions {
    #[serde(default)]
    code: Option<String>,
}

#[derive(Serialize)]
struct EmptyVariables {}

/// Connection wrapper for paginated GraphQL fields
#[derive(Deserialize)]
struct Nodes<T> {
    nodes: Vec<T>,
}

impl LinearClient {
    /// Create a new Linear client with an access token.
    ///
    /// Linear API keys (`lin_api_*`) are sent as-is; OAuth tokens get
    /// a "Bearer" prefix.
    ///
    /// # Errors
    /// Returns [`LinearError::InvalidToken`] if the token cannot be
    /// used as a header value.
    pub fn new(access_token: &str) -> Result<Self, LinearError> {
        let auth_value = if access_token.starts_with("lin_api_") {
            access_token.to_string()
        } else {
            format!("Bearer {access_token}")
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value)
                .map_err(|e| LinearError::InvalidToken(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            .build()?;

        Ok(Self {
            client,
            api_url: LINEAR_API_URL.to_string(),
        })
    }

    /// Create a client with a custom API URL (for testing)
    #[cfg(test)]
    pub fn with_url(access_token: &str, api_url: &str) -> Result<Self, LinearError> {
        let mut client = Self::new(access_token)?;
        client.api_url = api_url.to_string();
        Ok(client)
    }

    /// Execute a GraphQL query/mutation
    async fn execute<V: Serialize, R: DeserializeOwned>(
        &self,
        query: &'static str,
        variables: V,
    ) -> Result<R, LinearError> {
        let request = GraphQLRequest { query, variables };

        let response = self.client.post(&self.api_url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LinearError::Status { status, body });
        }

        let gql_response: GraphQLResponse<R> = response.json().await?;

        if let Some(errors) = gql_response.errors {
            let message = errors
                .iter()
                .map(|e| {
                    let mut text = e.message.clone();
                    if let Some(code) = e.extensions.as_ref().and_then(|x| x.code.as_deref()) {
                        text.push_str(&format!(" ({code})"));
                    }
                    if let Some(path) = &e.path {
                        text.push_str(&format!(" at {}", path.join(".")));
                    }
                    text
                })
                .collect::<Vec<_>>()
                .join(", ");
            return Err(LinearError::Api(message));
        }

        gql_response
            .data
            .ok_or_else(|| LinearError::Api("no data in response".to_string()))
    }

    async fn get_team_by_id(&self, team_id: &str) -> Result<Team, LinearError> {
        #[derive(Serialize)]
        struct Variables<'a> {
            id: &'a str,
        }

        #[derive(Deserialize)]
        struct Response {
            team: Option<TeamNode>,
        }

        const QUERY: &str = r"
            query GetTeam($id: String!) {
                team(id: $id) {
                    id
                    key
                    name
                    states {
                        nodes {
                            id
                            name
                            type
                        }
                    }
                }
            }
        ";

        let response: Response = self.execute(QUERY, Variables { id: team_id }).await?;
        response
            .team
            .map(TeamNode::into_team)
            .ok_or_else(|| LinearError::NotFound(format!("team '{team_id}'")))
    }

    async fn get_team_by_key(&self, team_key: &str) -> Result<Team, LinearError> {
        #[derive(Deserialize)]
        struct Response {
            teams: Nodes<TeamNode>,
        }

        const QUERY: &str = r"
            query GetTeams {
                teams {
                    nodes {
                        id
                        key
                        name
                        states {
                            nodes {
                                id
                                name
                                type
                            }
                        }
                    }
                }
            }
        ";

        let response: Response = self.execute(QUERY, EmptyVariables {}).await?;
        response
            .teams
            .nodes
            .into_iter()
            .find(|team| team.key == team_key)
            .map(TeamNode::into_team)
            .ok_or_else(|| LinearError::NotFound(format!("team with key '{team_key}'")))
    }
}

/// Team as the API returns it, with states behind a connection.
#[derive(Deserialize)]
struct TeamNode {
    id: String,
    key: String,
    name: String,
    states: Nodes<WorkflowState>,
}

impl TeamNode {
    fn into_team(self) -> Team {
        Team {
            id: self.id,
            key: self.key,
            name: self.name,
            states: self.states.nodes,
        }
    }
}

#[async_trait]
impl IssueTracker for LinearClient {
    #[instrument(skip(self))]
    async fn get_viewer(&self) -> Result<Viewer, LinearError> {
        #[derive(Deserialize)]
        struct Response {
            viewer: Viewer,
        }

        const QUERY: &str = r"
            query GetViewer {
                viewer {
                    id
                    name
                    email
                }
            }
        ";

        let response: Response = self.execute(QUERY, EmptyVariables {}).await?;
        Ok(response.viewer)
    }

    #[instrument(skip(self))]
    async fn get_team(&self, lookup: &TeamLookup) -> Result<Team, LinearError> {
        let team = match lookup {
            TeamLookup::Id(id) => self.get_team_by_id(id).await?,
            TeamLookup::Key(key) => self.get_team_by_key(key).await?,
        };
        debug!(team = %team.key, states = team.states.len(), "Resolved team");
        Ok(team)
    }

    #[instrument(skip(self), fields(identifier = %identifier))]
    async fn get_issue_by_identifier(&self, identifier: &str) -> Result<Issue, LinearError> {
        #[derive(Serialize)]
        struct Variables<'a> {
            id: &'a str,
        }

        #[derive(Deserialize)]
        struct Response {
            issue: Option<Issue>,
        }

        const QUERY: &str = r"
            query GetIssue($id: String!) {
                issue(id: $id) {
                    id
                    identifier
                    title
                    url
                    state {
                        id
                        name
                        type
                    }
                }
            }
        ";

        let response: Response = self.execute(QUERY, Variables { id: identifier }).await?;
        response
            .issue
            .ok_or_else(|| LinearError::NotFound(format!("issue {identifier}")))
    }

    #[instrument(skip(self, input), fields(title = %input.title))]
    async fn create_issue(&self, input: CreateIssueInput) -> Result<Issue, LinearError> {
        #[derive(Serialize)]
        struct Variables {
            input: CreateIssueInput,
        }

        #[derive(Deserialize)]
        struct Response {
            #[serde(rename = "issueCreate")]
            issue_create: IssueCreateResult,
        }

        #[derive(Deserialize)]
        struct IssueCreateResult {
            success: bool,
            issue: Option<Issue>,
        }

        const MUTATION: &str = r"
            mutation CreateIssue($input: IssueCreateInput!) {
                issueCreate(input: $input) {
                    success
                    issue {
                        id
                        identifier
                        title
                        url
                        state {
                            id
                            name
                            type
                        }
                    }
                }
            }
        ";

        let response: Response = self.execute(MUTATION, Variables { input }).await?;

        if !response.issue_create.success {
            return Err(LinearError::MutationFailed(
                "issue create reported failure".to_string(),
            ));
        }

        response.issue_create.issue.ok_or_else(|| {
            LinearError::MutationFailed("issue not returned after creation".to_string())
        })
    }

    #[instrument(skip(self), fields(issue_id = %issue_id, state_id = %state_id))]
    async fn update_issue_state(
        &self,
        issue_id: &str,
        state_id: &str,
    ) -> Result<(), LinearError> {
        #[derive(Serialize)]
        struct StateInput<'a> {
            #[serde(rename = "stateId")]
            state_id: &'a str,
        }

        #[derive(Serialize)]
        struct Variables<'a> {
            id: &'a str,
            input: StateInput<'a>,
        }

        #[derive(Deserialize)]
        struct Response {
            #[serde(rename = "issueUpdate")]
            issue_update: SuccessResult,
        }

        const MUTATION: &str = r"
            mutation UpdateIssueState($id: String!, $input: IssueUpdateInput!) {
                issueUpdate(id: $id, input: $input) {
                    success
                }
            }
        ";

        let response: Response = self
            .execute(
                MUTATION,
                Variables {
                    id: issue_id,
                    input: StateInput { state_id },
                },
            )
            .await?;

        if !response.issue_update.success {
            return Err(LinearError::MutationFailed(
                "issue state update reported failure".to_string(),
            ));
        }

        Ok(())
    }

    #[instrument(skip(self, body), fields(issue_id = %issue_id))]
    async fn add_comment(&self, issue_id: &str, body: &str) -> Result<(), LinearError> {
        #[derive(Serialize)]
        struct CommentInput<'a> {
            #[serde(rename = "issueId")]
            issue_id: &'a str,
            body: &'a str,
        }

        #[derive(Serialize)]
        struct Variables<'a> {
            input: CommentInput<'a>,
        }

        #[derive(Deserialize)]
        struct Response {
            #[serde(rename = "commentCreate")]
            comment_create: SuccessResult,
        }

        const MUTATION: &str = r"
            mutation AddComment($input: CommentCreateInput!) {
                commentCreate(input: $input) {
                    success
                }
            }
        ";

        let response: Response = self
            .execute(
                MUTATION,
                Variables {
                    input: CommentInput { issue_id, body },
                },
            )
            .await?;

        if !response.comment_create.success {
            return Err(LinearError::MutationFailed(
                "comment create reported failure".to_string(),
            ));
        }

        Ok(())
    }
}

/// Success-only mutation payload
#[derive(Deserialize)]
struct SuccessResult {
    success: bool,
}
