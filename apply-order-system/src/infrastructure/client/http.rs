use std::sync::Arc;
use std::time::Duration;

use infrastructure_architecture::base_dto::ResponseBase;
use reqwest::{Method, Url};
use serde::{de::DeserializeOwned, Serialize};

/// JSON caller of one collaborator. Replies are wrapped in [`ResponseBase`].
#[derive(Clone)]
pub struct JsonClient {
    client: Arc<reqwest::Client>,
    base_url: Url,
    /// Attempts of a read before giving up.
    max_times: u64,
    timeout: Duration,
}

impl JsonClient {
    pub fn new(
        client: Arc<reqwest::Client>,
        base_url: &str,
        max_times: u64,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            client,
            base_url,
            max_times: max_times.max(1),
            timeout,
        })
    }

    /// Read call, retried with a jittered backoff.
    pub async fn get<RES>(&self, path: &str) -> anyhow::Result<RES>
    where
        RES: DeserializeOwned,
    {
        let url = self.base_url.join(path)?;
        let mut times = 1u64;
        loop {
            match self.send::<(), RES>(Method::GET, url.clone(), None).await {
                Ok(res) => break Ok(res),
                Err(e) if times >= self.max_times => break Err(e),
                Err(e) => {
                    tracing::debug!(%url, times, "Request failed, retry: {e}");
                    times += 1;
                    sleep(times).await;
                }
            }
        }
    }

    /// Query posted as a body, retried like [`Self::get`].
    pub async fn query<REQ, RES>(&self, path: &str, body: &REQ) -> anyhow::Result<RES>
    where
        REQ: Serialize,
        RES: DeserializeOwned,
    {
        let url = self.base_url.join(path)?;
        let mut times = 1u64;
        loop {
            match self.send(Method::POST, url.clone(), Some(body)).await {
                Ok(res) => break Ok(res),
                Err(e) if times >= self.max_times => break Err(e),
                Err(e) => {
                    tracing::debug!(%url, times, "Request failed, retry: {e}");
                    times += 1;
                    sleep(times).await;
                }
            }
        }
    }

    /// Write call, sent once.
    pub async fn post<REQ, RES>(&self, path: &str, body: &REQ) -> anyhow::Result<RES>
    where
        REQ: Serialize,
        RES: DeserializeOwned,
    {
        let url = self.base_url.join(path)?;
        self.send(Method::POST, url, Some(body)).await
    }

    async fn send<REQ, RES>(&self, method: Method, url: Url, body: Option<&REQ>) -> anyhow::Result<RES>
    where
        REQ: Serialize,
        RES: DeserializeOwned,
    {
        let mut request = self.client.request(method, url.clone()).timeout(self.timeout);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?.error_for_status()?;
        let body: ResponseBase<RES> = response.json().await?;
        if body.status != 200 {
            anyhow::bail!("{url} answered {}: {}", body.status, body.message);
        }
        match body.content {
            Some(content) => Ok(content),
            // Unit replies carry no content.
            None => serde_json::from_value(serde_json::Value::Null)
                .map_err(|_| anyhow::anyhow!("{url} answered without content.")),
        }
    }
}

async fn sleep(time: u64) {
    let sleep_time = {
        let sleep_time = rand::random::<u8>() as u64;
        let jitter = rand::random::<u8>() as u64;
        (if sleep_time > 0 && sleep_time <= 10 {
            sleep_time * 100
        } else {
            500
        }) + jitter
    } * time;
    tokio::time::sleep(Duration::from_millis(sleep_time)).await;
}
