use crate::adapter::{execute_batched, ExecutionOutcome, ExecutionRequest, SourceAdapter};
use crate::error::AdapterError;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder};
use sparesults::{
    QueryResultsFormat, QueryResultsParser, QuerySolution, ReaderQueryResultsParserOutput,
};
use tracing::debug;

const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// Answers fragments with a remote [SPARQL 1.1 endpoint](https://www.w3.org/TR/sparql11-protocol/).
///
/// Queries are sent as URL-encoded `POST` requests to the endpoint URL, updates to `<url>/update`.
#[derive(Debug, Clone)]
pub struct RemoteStoreAdapter {
    id: String,
    url: String,
    graph: Option<String>,
    credentials: Option<(String, Option<String>)>,
    client: Client,
}

impl RemoteStoreAdapter {
    pub fn new(id: impl Into<String>, url: impl Into<String>, graph: Option<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            graph,
            credentials: None,
            client: Client::new(),
        }
    }

    /// Authenticates every request with HTTP basic authentication.
    #[must_use]
    pub fn with_credentials(mut self, user: impl Into<String>, password: Option<String>) -> Self {
        self.credentials = Some((user.into(), password));
        self
    }

    fn authenticated(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some((user, password)) => request.basic_auth(user, password.as_ref()),
            None => request,
        }
    }

    async fn select(&self, query: String) -> Result<Vec<QuerySolution>, AdapterError> {
        let request = self
            .client
            .post(&self.url)
            .header(ACCEPT, SPARQL_RESULTS_JSON)
            .form(&[("query", query)]);
        let response = self
            .authenticated(request)
            .send()
            .await?
            .error_for_status()?;
        parse_solutions(&response.bytes().await?)
    }
}

#[async_trait]
impl SourceAdapter for RemoteStoreAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn graph(&self) -> Option<&str> {
        self.graph.as_deref()
    }

    async fn execute(&self, request: ExecutionRequest<'_>) -> Result<ExecutionOutcome, AdapterError> {
        execute_batched(&self.id, self.graph(), request, |query| self.select(query)).await
    }

    async fn update(&self, update: &str) -> Result<(), AdapterError> {
        let url = format!("{}/update", self.url.trim_end_matches('/'));
        debug!(adapter = %self.id, %url, "Sending update");
        let request = self.client.post(&url).form(&[("update", update)]);
        self.authenticated(request)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

fn parse_solutions(body: &[u8]) -> Result<Vec<QuerySolution>, AdapterError> {
    match QueryResultsParser::from_format(QueryResultsFormat::Json).for_reader(body)? {
        ReaderQueryResultsParserOutput::Solutions(solutions) => {
            Ok(solutions.collect::<Result<Vec<_>, _>>()?)
        }
        ReaderQueryResultsParserOutput::Boolean(_) => Err(AdapterError::UnexpectedBoolean),
    }
}
