//! NCBI E-utilities client for PubMed publication summaries
//!
//! Only the ESummary endpoint is used. NCBI asks clients to identify
//! themselves with `tool` and `email` parameters (`NCBI_TOOL` /
//! `NCBI_EMAIL` in the environment); `email` is only attached when
//! configured. Requests without an API key are rate-limited to 3/sec,
//! which a per-compound lookup stays well under.

use crate::model::PubMedPublication;
use serde::Deserialize;
use serde_json::Value;

const EUTILS_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
const DEFAULT_TOOL: &str = "omnidex";

/// Errors from the E-utilities round trip.
#[derive(Debug, thiserror::Error)]
pub enum PubMedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected ESummary payload: {0}")]
    Payload(String),
}

/// Thin ESummary client. Cheap to clone; the underlying connection pool
/// is shared.
#[derive(Clone)]
pub struct PubMedClient {
    http: reqwest::Client,
    base_url: String,
    tool: String,
    email: Option<String>,
}

impl Default for PubMedClient {
    fn default() -> Self {
        Self::new()
    }
}

impl PubMedClient {
    pub fn new() -> Self {
        Self::with_base_url(EUTILS_BASE)
    }

    /// Point the client at a different base URL (used by tests to target
    /// a local mock server). The identity defaults come from `NCBI_TOOL`
    /// and `NCBI_EMAIL`.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            tool: std::env::var("NCBI_TOOL").unwrap_or_else(|_| DEFAULT_TOOL.to_string()),
            email: std::env::var("NCBI_EMAIL").ok(),
        }
    }

    /// Override the `tool`/`email` identity sent to NCBI.
    pub fn with_identity(mut self, tool: impl Into<String>, email: Option<String>) -> Self {
        self.tool = tool.into();
        self.email = email;
        self
    }

    /// Fetch publication summaries for a batch of PMIDs.
    ///
    /// An empty PMID list short-circuits without a request.
    pub async fn fetch_summaries(
        &self,
        pmids: &[String],
    ) -> Result<Vec<PubMedPublication>, PubMedError> {
        if pmids.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/esummary.fcgi", self.base_url);
        let ids = pmids.join(",");
        let mut query: Vec<(&str, &str)> = vec![
            ("db", "pubmed"),
            ("id", ids.as_str()),
            ("retmode", "json"),
            ("tool", self.tool.as_str()),
        ];
        if let Some(email) = &self.email {
            query.push(("email", email.as_str()));
        }
        let response = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await?
            .error_for_status()?;

        let body: ESummaryResponse = response.json().await?;
        let result = body
            .result
            .ok_or_else(|| PubMedError::Payload("missing result object".into()))?;

        let mut publications = Vec::with_capacity(pmids.len());
        for pmid in pmids {
            let Some(entry) = result.get(pmid) else {
                continue;
            };
            publications.push(parse_entry(pmid, entry));
        }
        Ok(publications)
    }
}

#[derive(Debug, Deserialize)]
struct ESummaryResponse {
    result: Option<serde_json::Map<String, Value>>,
}

fn parse_entry(pmid: &str, entry: &Value) -> PubMedPublication {
    let text = |key: &str| {
        entry
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    // fulljournalname is preferred; source is the abbreviated fallback
    let journal = text("fulljournalname").or_else(|| text("source"));
    let publication_date = text("sortpubdate").or_else(|| text("pubdate"));

    let authors = entry
        .get("authors")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|a| a.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let doi = entry
        .get("articleids")
        .and_then(Value::as_array)
        .and_then(|ids| {
            ids.iter().find_map(|id| {
                let idtype = id.get("idtype").and_then(Value::as_str)?;
                if idtype == "doi" {
                    id.get("value").and_then(Value::as_str).map(str::to_string)
                } else {
                    None
                }
            })
        });

    PubMedPublication {
        pmid: pmid.to_string(),
        title: text("title"),
        journal,
        publication_date,
        authors,
        doi,
        url: format!("https://pubmed.ncbi.nlm.nih.gov/{pmid}/"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn empty_pmid_list_makes_no_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.any_request();
                then.status(500);
            })
            .await;

        let client = PubMedClient::with_base_url(server.base_url());
        let result = client.fetch_summaries(&[]).await.unwrap();
        assert!(result.is_empty());
        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn summaries_parse_journal_date_authors_and_doi() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/esummary.fcgi")
                    .query_param("db", "pubmed")
                    .query_param("id", "26656082,21783528")
                    .query_param("retmode", "json")
                    .query_param("tool", "omnidex")
                    .query_param("email", "curator@example.org");
                then.status(200).json_body(json!({
                    "result": {
                        "uids": ["26656082", "21783528"],
                        "26656082": {
                            "title": "OmniPath: guidelines and gateway",
                            "fulljournalname": "Nature Methods",
                            "sortpubdate": "2016/12/01 00:00",
                            "authors": [
                                {"name": "Turei D"},
                                {"name": "Korcsmaros T"},
                                {"name": "Saez-Rodriguez J"}
                            ],
                            "articleids": [
                                {"idtype": "pubmed", "value": "26656082"},
                                {"idtype": "doi", "value": "10.1038/nmeth.4077"}
                            ]
                        },
                        "21783528": {
                            "title": "An older paper",
                            "source": "J Abbrev",
                            "pubdate": "2011 Aug",
                            "articleids": []
                        }
                    }
                }));
            })
            .await;

        let client = PubMedClient::with_base_url(server.base_url())
            .with_identity("omnidex", Some("curator@example.org".to_string()));
        let pubs = client
            .fetch_summaries(&["26656082".to_string(), "21783528".to_string()])
            .await
            .unwrap();

        assert_eq!(pubs.len(), 2);
        let first = &pubs[0];
        assert_eq!(first.pmid, "26656082");
        assert_eq!(first.journal.as_deref(), Some("Nature Methods"));
        assert_eq!(first.publication_date.as_deref(), Some("2016/12/01 00:00"));
        assert_eq!(first.authors.len(), 3);
        assert_eq!(first.doi.as_deref(), Some("10.1038/nmeth.4077"));
        assert_eq!(first.url, "https://pubmed.ncbi.nlm.nih.gov/26656082/");

        let second = &pubs[1];
        assert_eq!(second.journal.as_deref(), Some("J Abbrev"));
        assert_eq!(second.publication_date.as_deref(), Some("2011 Aug"));
        assert!(second.authors.is_empty());
        assert!(second.doi.is_none());
    }

    #[tokio::test]
    async fn email_is_omitted_when_not_configured() {
        let server = MockServer::start_async().await;
        // Mocks match in creation order: a request carrying an email
        // parameter hits this one and fails the fetch.
        let email_sent = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/esummary.fcgi")
                    .query_param_exists("email");
                then.status(500);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/esummary.fcgi");
                then.status(200).json_body(json!({
                    "result": { "uids": ["1"], "1": {"title": "No email"} }
                }));
            })
            .await;

        let client = PubMedClient::with_base_url(server.base_url())
            .with_identity("omnidex", None);
        let pubs = client.fetch_summaries(&["1".to_string()]).await.unwrap();
        assert_eq!(pubs.len(), 1);
        email_sent.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn pmids_missing_from_the_result_are_skipped() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/esummary.fcgi");
                then.status(200).json_body(json!({
                    "result": {
                        "uids": ["1"],
                        "1": {"title": "Only one"}
                    }
                }));
            })
            .await;

        let client = PubMedClient::with_base_url(server.base_url());
        let pubs = client
            .fetch_summaries(&["1".to_string(), "2".to_string()])
            .await
            .unwrap();
        assert_eq!(pubs.len(), 1);
        assert_eq!(pubs[0].pmid, "1");
    }

    #[tokio::test]
    async fn http_errors_surface_as_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/esummary.fcgi");
                then.status(503);
            })
            .await;

        let client = PubMedClient::with_base_url(server.base_url());
        let result = client.fetch_summaries(&["1".to_string()]).await;
        assert!(matches!(result, Err(PubMedError::Http(_))));
    }
}
