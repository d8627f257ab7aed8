//! GraphQL documents sent to Linear.

const ISSUE_FIELDS: &str = "fragment IssueFields on Issue {
  id identifier title description priority url createdAt updatedAt
  state { name } assignee { name } team { key } project { name }
  labels { nodes { name } }
}";

const PROJECT_FIELDS: &str = "fragment ProjectFields on Project {
  id name description state progress url targetDate
  lead { name } teams { nodes { key } }
}";

const CYCLE_FIELDS: &str = "fragment CycleFields on Cycle { id number name startsAt endsAt progress }";

pub(super) fn issues() -> String {
    format!(
        "query Issues($filter: IssueFilter, $first: Int!) {{
  issues(filter: $filter, first: $first, orderBy: updatedAt) {{ nodes {{ ...IssueFields }} }}
}}
{ISSUE_FIELDS}"
    )
}

pub(super) fn issue() -> String {
    format!("query Issue($id: String!) {{ issue(id: $id) {{ ...IssueFields }} }}\n{ISSUE_FIELDS}")
}

pub(super) fn search_issues() -> String {
    format!(
        "query SearchIssues($term: String!, $first: Int!) {{
  searchIssues(term: $term, first: $first) {{ nodes {{ ...IssueFields }} }}
}}
{ISSUE_FIELDS}"
    )
}

pub(super) fn projects() -> String {
    format!("query Projects($first: Int!) {{ projects(first: $first) {{ nodes {{ ...ProjectFields }} }} }}\n{PROJECT_FIELDS}")
}

pub(super) fn project() -> String {
    format!("query Project($id: String!) {{ project(id: $id) {{ ...ProjectFields }} }}\n{PROJECT_FIELDS}")
}

pub(super) fn cycles() -> String {
    format!(
        "query Cycles($teamId: String!) {{ team(id: $teamId) {{ cycles {{ nodes {{ ...CycleFields }} }} }} }}\n{CYCLE_FIELDS}"
    )
}

pub(super) fn active_cycle() -> String {
    format!("query ActiveCycle($teamId: String!) {{ team(id: $teamId) {{ activeCycle {{ ...CycleFields }} }} }}\n{CYCLE_FIELDS}")
}

pub(super) const CREATE_ISSUE: &str = "mutation CreateIssue($input: IssueCreateInput!) {
  issueCreate(input: $input) { success issue { id identifier title url } }
}";

pub(super) const UPDATE_ISSUE: &str = "mutation UpdateIssue($id: String!, $input: IssueUpdateInput!) {
  issueUpdate(id: $id, input: $input) { success issue { id identifier title url } }
}";

pub(super) const CREATE_PROJECT: &str = "mutation CreateProject($input: ProjectCreateInput!) {
  projectCreate(input: $input) { success project { id name url } }
}";

pub(super) const TEAMS: &str = "query Teams($filter: TeamFilter) {
  teams(filter: $filter) { nodes { id key name description } }
}";

pub(super) const TEAM: &str = "query Team($id: String!) { team(id: $id) { id key name description } }";

pub(super) const COMMENTS: &str = "query Comments($id: String!) {
  issue(id: $id) { comments { nodes { id body createdAt user { name } } } }
}";

pub(super) const CREATE_COMMENT: &str = "mutation CreateComment($input: CommentCreateInput!) {
  commentCreate(input: $input) { success comment { id url } }
}";

pub(super) const USERS: &str = "query Users($first: Int!) {
  users(first: $first) { nodes { id name displayName email active admin } }
}";

pub(super) const VIEWER: &str = "query Viewer { viewer { id name displayName email active admin } }";

pub(super) const LABELS: &str = "query Labels($filter: IssueLabelFilter) {
  issueLabels(filter: $filter, first: 250) { nodes { id name color team { key } } }
}";

pub(super) const CREATE_LABEL: &str = "mutation CreateLabel($input: IssueLabelCreateInput!) {
  issueLabelCreate(input: $input) { success issueLabel { id name color } }
}";
