use super::{EnhanceError, SemanticExtractor, SemanticRequest, SemanticWeek};
use std::time::Duration;

/// Transport-level ceiling; the orchestrator applies its own tighter
/// per-call and per-document deadlines on top.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("stride/", env!("CARGO_PKG_VERSION"));

/// HTTP backend for the semantic-extraction collaborator: one POST per
/// week, JSON in, JSON out.
pub struct SemanticHttpClient {
    client: reqwest::Client,
    endpoint: String,
}

impl SemanticHttpClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, EnhanceError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| EnhanceError::Network(e.to_string()))?;
        Ok(SemanticHttpClient {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait::async_trait]
impl SemanticExtractor for SemanticHttpClient {
    async fn extract_week(
        &self,
        request: &SemanticRequest,
    ) -> Result<SemanticWeek, EnhanceError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| EnhanceError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnhanceError::Api(status.as_u16(), truncate_body(&body)));
        }

        response
            .json::<SemanticWeek>()
            .await
            .map_err(|e| EnhanceError::Parse(e.to_string()))
    }

    fn backend_name(&self) -> &str {
        "semantic-http"
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    }
}
