use crate::error::ApiError;
use crate::requests::RunRequest;
use async_trait::async_trait;
use configuration::{ApiSettings, RunConfig};
use core_types::{NewsItem, PriceHistoryEntry, RawSnapshot, TransactionItem};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt;

pub mod error;
pub mod requests;
pub mod responses;
// --- Public API ---
pub use responses::{ApiErrorResponse, RunResponse, StatusResponse};

/// The remote job API: submits a run and reports on its progress.
///
/// The lifecycle controller only ever talks to the backend through this trait, so tests
/// can script the backend's answers without a network.
#[async_trait]
pub trait SimulationApi: Send + Sync {
    /// Submits a new simulation job.
    async fn submit(&self, config: &RunConfig) -> Result<RunResponse, ApiError>;

    /// Fetches the status of the current job.
    async fn status(&self) -> Result<StatusResponse, ApiError>;
}

/// Read access to the artifacts of the last completed run.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    async fn fetch_snapshots(&self) -> Result<Vec<RawSnapshot>, ApiError>;

    async fn fetch_transactions(&self) -> Result<Vec<TransactionItem>, ApiError>;

    async fn fetch_price_history(&self) -> Result<Vec<PriceHistoryEntry>, ApiError>;

    async fn fetch_news(&self) -> Result<Vec<NewsItem>, ApiError>;

    /// Per-agent strategy parameters, keyed by agent name. Their shape differs per strategy.
    async fn fetch_agent_params(&self) -> Result<BTreeMap<String, serde_json::Value>, ApiError>;
}

/// A result collection published under `GET /data/<route>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    MarketPrices,
    AgentSnapshots,
    Transactions,
    News,
    AgentParams,
}

impl Artifact {
    pub fn route(&self) -> &'static str {
        match self {
            Artifact::MarketPrices => "market_prices",
            Artifact::AgentSnapshots => "agent_snapshots",
            Artifact::Transactions => "transactions",
            Artifact::News => "news",
            Artifact::AgentParams => "agent_params",
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.route())
    }
}

/// A concrete implementation of both traits for the HTTP simulation backend.
#[derive(Clone)]
pub struct HttpSimulationClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSimulationClient {
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn fetch_artifact<T: DeserializeOwned>(&self, artifact: Artifact) -> Result<T, ApiError> {
        let url = self.url(&format!("/data/{}", artifact.route()));
        tracing::debug!(%artifact, %url, "Fetching artifact");
        let response = self.client.get(&url).send().await?;
        decode(response, Some(artifact)).await
    }
}

/// Turns a response into `T`, mapping non-2xx statuses onto `ApiError`.
///
/// A 404 only means "no data yet" for artifact routes; anywhere else it is a server error.
async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
    artifact: Option<Artifact>,
) -> Result<T, ApiError> {
    let status = response.status();
    let text = response.text().await?;

    if status.is_success() {
        return serde_json::from_str::<T>(&text)
            .map_err(|e| ApiError::Deserialization(e.to_string()));
    }

    if let (reqwest::StatusCode::NOT_FOUND, Some(artifact)) = (status, artifact) {
        return Err(ApiError::NotFound {
            artifact: artifact.route().to_string(),
        });
    }

    let detail = serde_json::from_str::<ApiErrorResponse>(&text)
        .map(|body| body.detail)
        .unwrap_or(text);
    Err(ApiError::Server {
        status: status.as_u16(),
        detail,
    })
}

#[async_trait]
impl SimulationApi for HttpSimulationClient {
    async fn submit(&self, config: &RunConfig) -> Result<RunResponse, ApiError> {
        let url = self.url("/run-simulation");
        tracing::info!(%url, days = config.num_days, agents = config.agents.len(), "Submitting simulation job");
        let response = self
            .client
            .post(&url)
            .json(&RunRequest::from(config))
            .send()
            .await?;
        decode(response, None).await
    }

    async fn status(&self) -> Result<StatusResponse, ApiError> {
        let response = self.client.get(self.url("/status")).send().await?;
        decode(response, None).await
    }
}

#[async_trait]
impl ResultRepository for HttpSimulationClient {
    async fn fetch_snapshots(&self) -> Result<Vec<RawSnapshot>, ApiError> {
        self.fetch_artifact(Artifact::AgentSnapshots).await
    }

    async fn fetch_transactions(&self) -> Result<Vec<TransactionItem>, ApiError> {
        self.fetch_artifact(Artifact::Transactions).await
    }

    async fn fetch_price_history(&self) -> Result<Vec<PriceHistoryEntry>, ApiError> {
        self.fetch_artifact(Artifact::MarketPrices).await
    }

    async fn fetch_news(&self) -> Result<Vec<NewsItem>, ApiError> {
        self.fetch_artifact(Artifact::News).await
    }

    async fn fetch_agent_params(&self) -> Result<BTreeMap<String, serde_json::Value>, ApiError> {
        self.fetch_artifact(Artifact::AgentParams).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::http::header::CONTENT_TYPE;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use core_types::{BackendStatus, ErrorShape, TradeAction};
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    async fn serve(app: Router) -> HttpSimulationClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        client_for(&format!("http://{addr}/"))
    }

    fn client_for(base_url: &str) -> HttpSimulationClient {
        let settings = ApiSettings {
            base_url: base_url.to_string(),
            timeout_secs: 5,
        };
        HttpSimulationClient::new(&settings).unwrap()
    }

    #[tokio::test]
    async fn submit_posts_camel_case_body_and_parses_state() {
        let seen: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
        let recorder = seen.clone();
        let app = Router::new().route(
            "/run-simulation",
            post(move |Json(body): Json<Value>| {
                let recorder = recorder.clone();
                async move {
                    *recorder.lock().unwrap() = Some(body);
                    Json(json!({
                        "message": "Simulation started with custom config!",
                        "state": {"status": "GENERATING_NEWS", "day": 0, "total_days": 30}
                    }))
                }
            }),
        );
        let client = serve(app).await;

        let response = client.submit(&RunConfig::default()).await.unwrap();
        assert_eq!(response.state.status, BackendStatus::GeneratingNews);
        assert_eq!(response.state.total_days, 30);

        let body = seen.lock().unwrap().clone().unwrap();
        assert_eq!(body["numDays"], 30);
        assert_eq!(body["newsEnabled"], true);
        assert_eq!(body["initialPrices"]["Gold"], 1200.0);
    }

    #[tokio::test]
    async fn failed_status_without_day_fields_parses() {
        let app = Router::new().route(
            "/status",
            get(|| async { Json(json!({"status": "FAILED", "error": "agent crashed"})) }),
        );
        let client = serve(app).await;

        let status = client.status().await.unwrap();
        assert_eq!(status.status, BackendStatus::Failed);
        assert_eq!(status.day, 0);
        assert_eq!(status.error.as_deref(), Some("agent crashed"));
    }

    #[tokio::test]
    async fn missing_artifact_is_not_found() {
        let app = Router::new().route(
            "/data/news",
            get(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({"detail": "news.json not found. Run simulation first."})),
                )
            }),
        );
        let client = serve(app).await;

        let err = client.fetch_news().await.unwrap_err();
        assert!(matches!(&err, ApiError::NotFound { artifact } if artifact == "news"));
        assert_eq!(err.shape(), ErrorShape::NoDataYet);
    }

    #[tokio::test]
    async fn server_errors_carry_the_detail() {
        let app = Router::new().route(
            "/data/transactions",
            get(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"detail": "Error reading transactions.json"})),
                )
            }),
        );
        let client = serve(app).await;

        match client.fetch_transactions().await.unwrap_err() {
            ApiError::Server { status, detail } => {
                assert_eq!(status, 500);
                assert_eq!(detail, "Error reading transactions.json");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn artifacts_deserialize_into_records() {
        let app = Router::new()
            .route(
                "/data/market_prices",
                // Raw text keeps the backend's key order; `json!` would sort the keys.
                get(|| async {
                    (
                        [(CONTENT_TYPE, "application/json")],
                        r#"[{"Tech": 450.0, "Gold": 1200.0, "Day": 0},
                            {"Tech": 455.5, "Gold": 1190.0, "Day": 1}]"#,
                    )
                }),
            )
            .route(
                "/data/transactions",
                get(|| async {
                    Json(json!([{"Day": 1, "Agent": "ValueAgent", "Sector": "Tech",
                                 "Action": "BUY", "Price": 455.5, "Qty": 4}]))
                }),
            )
            .route(
                "/data/agent_params",
                get(|| async { Json(json!({"MomentumAgent": {"lookback": 5}})) }),
            );
        let client = serve(app).await;

        let prices = client.fetch_price_history().await.unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(prices[1].price("Tech"), Some(dec!(455.5)));
        assert_eq!(prices[0].sectors().collect::<Vec<_>>(), vec!["Tech", "Gold"]);
        assert_eq!(prices[1].sectors().collect::<Vec<_>>(), vec!["Tech", "Gold"]);

        let trades = client.fetch_transactions().await.unwrap();
        assert_eq!(trades[0].action, TradeAction::Buy);

        let params = client.fetch_agent_params().await.unwrap();
        assert_eq!(params["MomentumAgent"]["lookback"], 5);
    }

    #[tokio::test]
    async fn malformed_payload_is_a_deserialization_error() {
        let app = Router::new().route(
            "/data/agent_snapshots",
            get(|| async { Json(json!([{"Day": "soon"}])) }),
        );
        let client = serve(app).await;

        let err = client.fetch_snapshots().await.unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(&format!("http://{addr}"));
        let err = client.status().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert_eq!(err.shape(), ErrorShape::RunFailed);
    }
}
