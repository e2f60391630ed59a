//! LUIS HTTP clients
//!
//! Thin reqwest clients for the authoring and prediction endpoints. Both send
//! the subscription key in the `Ocp-Apim-Subscription-Key` header.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use super::api::{AuthoringApi, PredictionApi};
use super::types::*;
use crate::config::QuickstartConfig;

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const AUTHORING_API_PATH: &str = "luis/authoring/v3.0-preview/";
const PREDICTION_API_PATH: &str = "luis/prediction/v3.0/";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const ERROR_BODY_PREVIEW_CHARS: usize = 200;

/// Shared request plumbing for both surfaces.
#[derive(Clone)]
struct LuisHttp {
    http: Client,
    base: Url,
    api_key: String,
    surface: &'static str,
}

impl std::fmt::Debug for LuisHttp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LuisHttp")
            .field("base", &self.base.as_str())
            .field("surface", &self.surface)
            .finish_non_exhaustive()
    }
}

impl LuisHttp {
    fn new(endpoint: &Url, api_path: &str, api_key: String, surface: &'static str) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;
        let base = endpoint
            .join(api_path)
            .with_context(|| format!("Invalid {} endpoint {}", surface, endpoint))?;

        Ok(Self {
            http,
            base,
            api_key,
            surface,
        })
    }

    /// Append path segments to the API base. An empty final segment keeps a
    /// trailing slash.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("{} endpoint {} cannot be a base URL", self.surface, self.base))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(surface = self.surface, %method, %url, "LUIS request");
        self.http
            .request(method, url)
            .header(SUBSCRIPTION_KEY_HEADER, &self.api_key)
            .header("Accept", "application/json")
    }

    /// Send, reject non-2xx with a body preview, and decode the JSON body.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send {}", what))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "LUIS {} API error {}: {}",
                self.surface,
                status,
                body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect::<String>()
            ));
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {}", what))
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.url(segments)?;
        let what = format!("GET {}", url.path());
        self.send(self.request(Method::GET, url), &what).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<T> {
        let url = self.url(segments)?;
        let what = format!("POST {}", url.path());
        let mut request = self.request(Method::POST, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(request, &what).await
    }
}

// =============================================================================
// Authoring
// =============================================================================

/// Client for `https://{authoring-resource}.cognitiveservices.azure.com/`.
#[derive(Debug, Clone)]
pub struct AuthoringClient {
    inner: LuisHttp,
}

impl AuthoringClient {
    pub fn new(endpoint: &Url, api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            inner: LuisHttp::new(endpoint, AUTHORING_API_PATH, api_key.into(), "authoring")?,
        })
    }

    pub fn from_config(config: &QuickstartConfig) -> Result<Self> {
        Self::new(&config.authoring_endpoint, config.authoring_key.clone())
    }

    /// Base URL every authoring path is appended to.
    pub fn base_url(&self) -> &Url {
        &self.inner.base
    }
}

#[async_trait]
impl AuthoringApi for AuthoringClient {
    async fn add_app(&self, app: &ApplicationCreateObject) -> Result<Uuid> {
        self.inner.post(&["apps", ""], Some(app)).await
    }

    async fn add_intent(
        &self,
        app_id: Uuid,
        version_id: &str,
        intent: &ModelCreateObject,
    ) -> Result<Uuid> {
        let app = app_id.to_string();
        self.inner
            .post(&["apps", &app, "versions", version_id, "intents"], Some(intent))
            .await
    }

    async fn add_prebuilt(
        &self,
        app_id: Uuid,
        version_id: &str,
        prebuilt_names: &[String],
    ) -> Result<Vec<PrebuiltEntityExtractor>> {
        let app = app_id.to_string();
        self.inner
            .post(
                &["apps", &app, "versions", version_id, "prebuilts"],
                Some(prebuilt_names),
            )
            .await
    }

    async fn add_entity(
        &self,
        app_id: Uuid,
        version_id: &str,
        entity: &EntityNode,
    ) -> Result<Uuid> {
        let app = app_id.to_string();
        self.inner
            .post(&["apps", &app, "versions", version_id, "entities"], Some(entity))
            .await
    }

    async fn get_entity(
        &self,
        app_id: Uuid,
        version_id: &str,
        entity_id: Uuid,
    ) -> Result<EntityNode> {
        let app = app_id.to_string();
        let entity = entity_id.to_string();
        self.inner
            .get(&["apps", &app, "versions", version_id, "entities", &entity])
            .await
    }

    async fn add_phrase_list(
        &self,
        app_id: Uuid,
        version_id: &str,
        phrase_list: &PhraselistCreateObject,
    ) -> Result<i64> {
        let app = app_id.to_string();
        self.inner
            .post(
                &["apps", &app, "versions", version_id, "phraselists"],
                Some(phrase_list),
            )
            .await
    }

    async fn add_entity_feature(
        &self,
        app_id: Uuid,
        version_id: &str,
        entity_id: Uuid,
        feature: &ModelFeatureInformation,
    ) -> Result<OperationStatus> {
        let app = app_id.to_string();
        let entity = entity_id.to_string();
        self.inner
            .post(
                &["apps", &app, "versions", version_id, "entities", &entity, "features"],
                Some(feature),
            )
            .await
    }

    async fn add_example(
        &self,
        app_id: Uuid,
        version_id: &str,
        example: &ExampleLabelObject,
        enable_nested_children: bool,
    ) -> Result<LabelExampleResponse> {
        let app = app_id.to_string();
        let url = self
            .inner
            .url(&["apps", &app, "versions", version_id, "example"])?;
        let what = format!("POST {}", url.path());
        let request = self
            .inner
            .request(Method::POST, url)
            .query(&[("enableNestedChildren", enable_nested_children)])
            .json(example);
        self.inner.send(request, &what).await
    }

    async fn train_version(
        &self,
        app_id: Uuid,
        version_id: &str,
    ) -> Result<EnqueueTrainingResponse> {
        let app = app_id.to_string();
        self.inner
            .post::<(), _>(&["apps", &app, "versions", version_id, "train"], None)
            .await
    }

    async fn get_training_status(
        &self,
        app_id: Uuid,
        version_id: &str,
    ) -> Result<Vec<ModelTrainingInfo>> {
        let app = app_id.to_string();
        self.inner
            .get(&["apps", &app, "versions", version_id, "train"])
            .await
    }

    async fn publish(
        &self,
        app_id: Uuid,
        publish: &ApplicationPublishObject,
    ) -> Result<ProductionOrStagingEndpointInfo> {
        let app = app_id.to_string();
        self.inner
            .post(&["apps", &app, "publish"], Some(publish))
            .await
    }
}

// =============================================================================
// Prediction
// =============================================================================

/// Client for `https://{prediction-resource}.cognitiveservices.azure.com/`.
#[derive(Debug, Clone)]
pub struct RuntimeClient {
    inner: LuisHttp,
}

impl RuntimeClient {
    pub fn new(endpoint: &Url, api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            inner: LuisHttp::new(endpoint, PREDICTION_API_PATH, api_key.into(), "prediction")?,
        })
    }

    pub fn from_config(config: &QuickstartConfig) -> Result<Self> {
        Self::new(&config.prediction_endpoint, config.prediction_key.clone())
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base
    }
}

#[async_trait]
impl PredictionApi for RuntimeClient {
    async fn get_slot_prediction(
        &self,
        app_id: Uuid,
        slot_name: &str,
        request: &PredictionRequest,
    ) -> Result<PredictionResponse> {
        let app = app_id.to_string();
        self.inner
            .post(&["apps", &app, "slots", slot_name, "predict"], Some(request))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quickstart::sample::SampleApp;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    fn endpoint(resource: &str) -> Url {
        Url::parse(&format!("https://{}.cognitiveservices.azure.com/", resource)).unwrap()
    }

    #[test]
    fn test_authoring_base_url() {
        let client = AuthoringClient::new(&endpoint("contoso-authoring"), "key").unwrap();
        assert_eq!(
            client.base_url().as_str(),
            "https://contoso-authoring.cognitiveservices.azure.com/luis/authoring/v3.0-preview/"
        );
    }

    #[test]
    fn test_runtime_base_url() {
        let client = RuntimeClient::new(&endpoint("contoso-prediction"), "key").unwrap();
        assert_eq!(
            client.base_url().as_str(),
            "https://contoso-prediction.cognitiveservices.azure.com/luis/prediction/v3.0/"
        );
    }

    #[test]
    fn test_url_segments() {
        let client = AuthoringClient::new(&endpoint("contoso"), "key").unwrap();
        let app = Uuid::nil().to_string();

        let create = client.inner.url(&["apps", ""]).unwrap();
        assert!(create.as_str().ends_with("/luis/authoring/v3.0-preview/apps/"));

        let status = client
            .inner
            .url(&["apps", &app, "versions", "0.1", "train"])
            .unwrap();
        assert_eq!(
            status.path(),
            format!("/luis/authoring/v3.0-preview/apps/{}/versions/0.1/train", app)
        );
    }

    #[test]
    fn test_segments_are_percent_encoded() {
        let client = RuntimeClient::new(&endpoint("contoso"), "key").unwrap();
        let url = client.inner.url(&["apps", "x", "slots", "my slot", "predict"]).unwrap();
        assert!(url.path().contains("/slots/my%20slot/predict"));
    }

    #[test]
    fn test_debug_hides_key() {
        let client = AuthoringClient::new(&endpoint("contoso"), "super-secret").unwrap();
        assert!(!format!("{:?}", client).contains("super-secret"));
    }

    // -------------------------------------------------------------------------
    // Wire tests against a one-shot local server
    // -------------------------------------------------------------------------

    /// Accept one connection, answer with `status` and `body`, and hand back
    /// the raw request text.
    async fn serve_once(status: &'static str, body: String) -> (Url, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request
        });
        (Url::parse(&format!("http://{}/", addr)).unwrap(), handle)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let content_length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[tokio::test]
    async fn test_add_app_sends_key_and_decodes_bare_guid() {
        let app_id = Uuid::from_u128(0xA11);
        let (endpoint, server) = serve_once("201 Created", format!("\"{}\"", app_id)).await;
        let client = AuthoringClient::new(&endpoint, "authoring-key").unwrap();

        let created = client.add_app(&SampleApp::default().create_app()).await.unwrap();
        assert_eq!(created, app_id);

        let request = server.await.unwrap();
        assert!(
            request.starts_with("POST /luis/authoring/v3.0-preview/apps/ HTTP/1.1"),
            "{}",
            request
        );
        let lower = request.to_lowercase();
        assert!(lower.contains("ocp-apim-subscription-key: authoring-key"));
        assert!(lower.contains("content-type: application/json"));
        assert!(request.contains("\"culture\":\"en-us\""));
    }

    #[tokio::test]
    async fn test_add_phrase_list_decodes_bare_integer() {
        let (endpoint, server) = serve_once("201 Created", "42".to_string()).await;
        let client = AuthoringClient::new(&endpoint, "key").unwrap();
        let app_id = Uuid::nil();

        let id = client
            .add_phrase_list(app_id, "0.1", &SampleApp::default().phrase_list())
            .await
            .unwrap();
        assert_eq!(id, 42);

        let request = server.await.unwrap();
        assert!(request.starts_with(&format!(
            "POST /luis/authoring/v3.0-preview/apps/{}/versions/0.1/phraselists HTTP/1.1",
            app_id
        )));
    }

    #[tokio::test]
    async fn test_add_example_enables_nested_children() {
        let (endpoint, server) = serve_once(
            "201 Created",
            r#"{"utteranceText":"i want two small seafood pizzas","exampleId":7}"#.to_string(),
        )
        .await;
        let client = AuthoringClient::new(&endpoint, "key").unwrap();
        let app_id = Uuid::nil();

        let response = client
            .add_example(app_id, "0.1", &SampleApp::default().labeled_example(), true)
            .await
            .unwrap();
        assert_eq!(response.example_id, 7);

        let request = server.await.unwrap();
        let request_line = request.lines().next().unwrap_or_default();
        assert_eq!(
            request_line,
            format!(
                "POST /luis/authoring/v3.0-preview/apps/{}/versions/0.1/example?enableNestedChildren=true HTTP/1.1",
                app_id
            )
        );
    }

    #[tokio::test]
    async fn test_error_status_keeps_status_and_truncates_body() {
        let body = format!("{}{}", "x".repeat(ERROR_BODY_PREVIEW_CHARS), "y".repeat(300));
        let (endpoint, server) = serve_once("401 Unauthorized", body).await;
        let client = RuntimeClient::new(&endpoint, "prediction-key").unwrap();

        let err = client
            .get_slot_prediction(
                Uuid::nil(),
                "Production",
                &SampleApp::default().prediction_request(),
            )
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("401 Unauthorized"), "{}", message);
        assert!(message.contains(&"x".repeat(ERROR_BODY_PREVIEW_CHARS)));
        assert!(!message.contains("xy"), "{}", message);

        let request = server.await.unwrap();
        assert!(request
            .to_lowercase()
            .contains("ocp-apim-subscription-key: prediction-key"));
    }
}
