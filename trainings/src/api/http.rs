//! HTTP implementation of [`TrainingsApi`]

use super::{ApiError, ApiFuture, ApiResult, TrainingsApi, decode_training_list};
use crate::config::ApiConfig;
use crate::types::{Training, TrainingFields, TrainingId};
use reqwest::{Client, Response, Url};

/// Trainings collection served as JSON under `{base}/trainings`
#[derive(Clone, Debug)]
pub struct HttpTrainingsApi {
    client: Client,
    base_url: Url,
}

impl HttpTrainingsApi {
    /// Create a client for `base_url` with default settings
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] if `base_url` does not parse.
    pub fn new(base_url: &str) -> ApiResult<Self> {
        Ok(Self { client: Client::new(), base_url: parse_base(base_url)? })
    }

    /// Create a client from configuration, applying the request timeout
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] for a bad base URL and
    /// [`ApiError::Transport`] if the HTTP client cannot be built.
    pub fn from_config(config: &ApiConfig) -> ApiResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self { client, base_url: parse_base(&config.base_url)? })
    }

    /// URL of the collection, or of one training when `id` is given
    fn endpoint(&self, id: Option<&TrainingId>) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| ApiError::InvalidUrl(self.base_url.to_string()))?;
            segments.pop_if_empty().push("trainings");
            if let Some(id) = id {
                segments.push(&id.to_string());
            }
        }
        Ok(url)
    }
}

fn parse_base(base_url: &str) -> ApiResult<Url> {
    Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))
}

fn transport(error: &reqwest::Error) -> ApiError {
    ApiError::Transport(error.to_string())
}

/// Turn a non-success status into an [`ApiError`] carrying the body
async fn ensure_success(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::from_status(status.as_u16(), body))
}

async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> ApiResult<T> {
    ensure_success(response)
        .await?
        .json()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

async fn fetch_all(client: Client, url: ApiResult<Url>) -> ApiResult<Vec<Training>> {
    let url = url?;
    tracing::debug!(%url, "GET trainings");
    let response = client.get(url).send().await.map_err(|e| transport(&e))?;
    let values: Vec<serde_json::Value> = read_json(response).await?;
    Ok(decode_training_list(values))
}

async fn fetch_one(client: Client, url: ApiResult<Url>) -> ApiResult<Training> {
    let url = url?;
    tracing::debug!(%url, "GET training");
    let response = client.get(url).send().await.map_err(|e| transport(&e))?;
    read_json(response).await
}

async fn post(client: Client, url: ApiResult<Url>, fields: TrainingFields) -> ApiResult<Training> {
    let url = url?;
    tracing::debug!(%url, "POST training");
    let response = client.post(url).json(&fields).send().await.map_err(|e| transport(&e))?;
    read_json(response).await
}

async fn put(client: Client, url: ApiResult<Url>, training: Training) -> ApiResult<()> {
    let url = url?;
    tracing::debug!(%url, "PUT training");
    let response = client.put(url).json(&training).send().await.map_err(|e| transport(&e))?;
    ensure_success(response).await.map(drop)
}

async fn remove(client: Client, url: ApiResult<Url>) -> ApiResult<()> {
    let url = url?;
    tracing::debug!(%url, "DELETE training");
    let response = client.delete(url).send().await.map_err(|e| transport(&e))?;
    ensure_success(response).await.map(drop)
}

impl TrainingsApi for HttpTrainingsApi {
    fn list(&self) -> ApiFuture<Vec<Training>> {
        Box::pin(fetch_all(self.client.clone(), self.endpoint(None)))
    }

    fn get(&self, id: &TrainingId) -> ApiFuture<Training> {
        Box::pin(fetch_one(self.client.clone(), self.endpoint(Some(id))))
    }

    fn create(&self, fields: &TrainingFields) -> ApiFuture<Training> {
        Box::pin(post(self.client.clone(), self.endpoint(None), fields.clone()))
    }

    fn update(&self, training: &Training) -> ApiFuture<()> {
        Box::pin(put(self.client.clone(), self.endpoint(Some(&training.id)), training.clone()))
    }

    fn delete(&self, id: &TrainingId) -> ApiFuture<()> {
        Box::pin(remove(self.client.clone(), self.endpoint(Some(id))))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crate::types::WorkoutType;
    use chrono::NaiveDate;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fields() -> TrainingFields {
        TrainingFields {
            date: NaiveDate::from_ymd_opt(2021, 2, 2).unwrap(),
            workout_type: WorkoutType::Cycling,
            distance_in_km: 15.5,
            comment: "windy".to_string(),
        }
    }

    #[test]
    fn test_endpoints_keep_base_path() {
        let api = HttpTrainingsApi::new("http://localhost:3000").unwrap();
        assert_eq!(api.endpoint(None).unwrap().as_str(), "http://localhost:3000/trainings");

        let nested = HttpTrainingsApi::new("http://example.com/api/").unwrap();
        assert_eq!(
            nested.endpoint(Some(&TrainingId::from("a b"))).unwrap().as_str(),
            "http://example.com/api/trainings/a%20b"
        );
    }

    #[test]
    fn test_rejects_unusable_base_urls() {
        assert!(matches!(HttpTrainingsApi::new("not a url"), Err(ApiError::InvalidUrl(_))));
        let api = HttpTrainingsApi::new("mailto:someone@example.com").unwrap();
        assert!(matches!(api.endpoint(None), Err(ApiError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_list_decodes_and_skips_bad_entries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/trainings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "date": "2021-02-02", "workoutType": "cycling", "distanceInKM": 15.5, "comment": ""},
                {"id": 2, "date": "2021-02-02", "workoutType": "swimming", "distanceInKM": 1.0, "comment": ""}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let api = HttpTrainingsApi::new(&server.uri()).unwrap();
        let trainings = api.list().await.unwrap();

        assert_eq!(trainings.len(), 1);
        assert_eq!(trainings[0].id, TrainingId::from(1));
    }

    #[tokio::test]
    async fn test_get_missing_is_client_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/trainings/42"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&server)
            .await;

        let api = HttpTrainingsApi::new(&server.uri()).unwrap();
        let error = api.get(&TrainingId::from(42)).await.unwrap_err();

        assert_eq!(error, ApiError::Client { status: 404, message: "Not Found".to_string() });
        assert!(error.is_expected());
    }

    #[tokio::test]
    async fn test_create_posts_fields_without_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/trainings"))
            .and(body_json(json!({
                "date": "2021-02-02",
                "workoutType": "cycling",
                "distanceInKM": 15.5,
                "comment": "windy"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 17,
                "date": "2021-02-02",
                "workoutType": "cycling",
                "distanceInKM": 15.5,
                "comment": "windy"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = HttpTrainingsApi::new(&server.uri()).unwrap();
        let created = api.create(&fields()).await.unwrap();

        assert_eq!(created.id, TrainingId::from(17));
        assert_eq!(created.fields(), fields());
    }

    #[tokio::test]
    async fn test_update_puts_to_item_path() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/trainings/5"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let api = HttpTrainingsApi::new(&server.uri()).unwrap();
        let training = Training::from_fields(TrainingId::from(5), fields());
        api.update(&training).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_server_failure() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/trainings/5"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let api = HttpTrainingsApi::new(&server.uri()).unwrap();
        let error = api.delete(&TrainingId::from(5)).await.unwrap_err();

        assert_eq!(error.status(), Some(500));
        assert!(!error.is_expected());
    }

    #[tokio::test]
    async fn test_invalid_json_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/trainings"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let api = HttpTrainingsApi::new(&server.uri()).unwrap();
        assert!(matches!(api.list().await, Err(ApiError::Decode(_))));
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/trainings"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let config = ApiConfig {
            base_url: server.uri(),
            request_timeout: Some(Duration::from_millis(100)),
        };
        let api = HttpTrainingsApi::from_config(&config).unwrap();
        assert!(matches!(api.list().await, Err(ApiError::Transport(_))));
    }
}
