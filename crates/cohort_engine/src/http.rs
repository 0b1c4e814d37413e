use std::collections::BTreeMap;

use serde::Deserialize;

use crate::api::{
    ApiError, ApiSettings, MetaData, PageData, PageQuery, PlatformApi, StatsData, StatsParams,
    TaskRequest, TaskTick,
};

/// `PlatformApi` over the platform's HTTP/JSON endpoints.
#[derive(Debug, Clone)]
pub struct HttpApi {
    settings: ApiSettings,
    client: reqwest::Client,
}

impl HttpApi {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::Network(err.to_string()))?;
        Ok(Self { settings, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.settings.base_url.trim_end_matches('/'))
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.get(self.url(path)))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.settings.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::InvalidResponse(err.to_string()))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::Timeout;
    }
    ApiError::Network(err.to_string())
}

#[derive(Deserialize)]
struct StartedTask {
    task_id: String,
}

#[derive(Deserialize)]
struct ActiveTasks {
    #[serde(default)]
    tasks: BTreeMap<String, String>,
}

#[async_trait::async_trait]
impl PlatformApi for HttpApi {
    async fn query_collection(
        &self,
        project: u64,
        collection: &str,
        page: u32,
        query: &PageQuery,
    ) -> Result<PageData, ApiError> {
        let mut request = self
            .get(&format!("/projects/{project}/collections/{collection}"))
            .query(&[
                ("page", page.to_string()),
                ("page_size", query.page_size.to_string()),
            ]);
        if !query.search.is_empty() {
            request = request.query(&[("search", query.search.as_str())]);
        }
        for (key, value) in &query.params {
            request = request.query(&[(key.as_str(), value.as_str())]);
        }
        let response = request.send().await.map_err(map_reqwest_error)?;
        Self::decode(response).await
    }

    async fn query_stats(
        &self,
        project: u64,
        collection: &str,
        params: &StatsParams,
    ) -> Result<Option<StatsData>, ApiError> {
        let mut request = self
            .get(&format!(
                "/projects/{project}/collections/{collection}/stats"
            ))
            .query(&[
                ("period", params.period.as_str()),
                ("group_by", params.group_by.as_str()),
            ]);
        if let Some(from) = &params.date_from {
            request = request.query(&[("date_from", from.as_str())]);
        }
        if let Some(to) = &params.date_to {
            request = request.query(&[("date_to", to.as_str())]);
        }
        if let Some(can_write) = params.can_write {
            request = request.query(&[("can_write", can_write.to_string())]);
        }
        let response = request.send().await.map_err(map_reqwest_error)?;
        // The platform answers `null` for collections without statistics.
        Self::decode::<Option<StatsData>>(response).await
    }

    async fn fetch_project_meta(&self, project: u64) -> Result<MetaData, ApiError> {
        let response = self
            .get(&format!("/projects/{project}/meta"))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::decode(response).await
    }

    async fn start_task(
        &self,
        project: u64,
        task_type: &str,
        request: &TaskRequest,
    ) -> Result<String, ApiError> {
        let body = serde_json::json!({
            "task_type": task_type,
            "date_from": request.date_from,
            "date_to": request.date_to,
        });
        let response = self
            .authorize(self.client.post(self.url(&format!("/projects/{project}/tasks"))))
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let started: StartedTask = Self::decode(response).await?;
        Ok(started.task_id)
    }

    async fn poll_task(&self, task_id: &str) -> Result<TaskTick, ApiError> {
        let response = self
            .get(&format!("/tasks/{task_id}"))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::decode(response).await
    }

    async fn list_active_tasks(&self, project: u64) -> Result<Vec<(String, String)>, ApiError> {
        let response = self
            .get(&format!("/projects/{project}/tasks"))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let active: ActiveTasks = Self::decode(response).await?;
        Ok(active.tasks.into_iter().collect())
    }

    async fn clear_collection(&self, project: u64, collection: &str) -> Result<(), ApiError> {
        let response = self
            .authorize(self.client.delete(self.url(&format!(
                "/projects/{project}/collections/{collection}"
            ))))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        Ok(())
    }
}
