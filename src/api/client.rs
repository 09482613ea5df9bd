use std::convert::Infallible;
use std::path::Path;

use futures_util::stream;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::api::error::ApiError;
use crate::api::session::SharedSession;
use crate::api::types::{
    AuthResponse, DatasetDetail, HistoryResponse, RegisterRequest, UploadResponse,
};

const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Client for the equipment backend. Holds no per-request state and is
/// cloned freely into worker threads; the session context travels with it.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
    session: SharedSession,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: SharedSession) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
            session,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.session.lock().unwrap().token() {
            Some(token) => builder.header(AUTHORIZATION, format!("Token {}", token)),
            None => builder,
        }
    }

    /// Maps a non-2xx response onto the error taxonomy. A 401 from any
    /// endpoint tears the stored session down so the shell falls back to
    /// the login screen.
    async fn fail(&self, response: Response) -> ApiError {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.session.lock().unwrap().clear();
            return ApiError::Unauthorized;
        }
        let body = response.text().await.unwrap_or_default();
        ApiError::from_response(status.as_u16(), &body)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let response = self
            .http
            .post(self.url("auth/login/"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;

        // Bad credentials answer 401 here; that is a form error, not a
        // session teardown, so it bypasses fail().
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_response(status, &body));
        }

        let auth: AuthResponse = Self::decode(response).await?;
        self.session
            .lock()
            .unwrap()
            .establish(auth.token.clone(), auth.user.clone());
        Ok(auth)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        let response = self
            .http
            .post(self.url("auth/register/"))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_response(status, &body));
        }

        let auth: AuthResponse = Self::decode(response).await?;
        self.session
            .lock()
            .unwrap()
            .establish(auth.token.clone(), auth.user.clone());
        Ok(auth)
    }

    /// Best-effort logout. The local session is cleared no matter what the
    /// backend answers.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self
            .authorized(self.http.post(self.url("auth/logout/")))
            .send()
            .await;
        self.session.lock().unwrap().clear();
        result?;
        Ok(())
    }

    /// Uploads one CSV as a multipart form, feeding `on_progress` with the
    /// percentage of body bytes handed to the transport. Values are
    /// monotonically non-decreasing in [0, 100]; the last one before the
    /// request resolves is 100 once the body is fully sent.
    pub async fn upload_csv<F>(
        &self,
        path: &Path,
        on_progress: F,
    ) -> Result<UploadResponse, ApiError>
    where
        F: Fn(u8) + Send + Sync + 'static,
    {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ApiError::InvalidPath(path.to_path_buf()))?
            .to_string();

        let bytes = std::fs::read(path).map_err(|source| ApiError::File {
            path: path.to_path_buf(),
            source,
        })?;

        let total = bytes.len() as u64;
        let mut sent: u64 = 0;
        let chunks: Vec<Vec<u8>> = bytes
            .chunks(UPLOAD_CHUNK_SIZE)
            .map(|chunk| chunk.to_vec())
            .collect();
        let body = stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len() as u64;
            on_progress(progress_percent(sent, total));
            Ok::<Vec<u8>, Infallible>(chunk)
        }));

        let part = Part::stream_with_length(Body::wrap_stream(body), total)
            .file_name(file_name)
            .mime_str("text/csv")?;
        let form = Form::new().part("file", part);

        let response = self
            .authorized(self.http.post(self.url("datasets/upload_csv/")))
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(self.fail(response).await);
        }
        Self::decode(response).await
    }

    pub async fn history(&self) -> Result<HistoryResponse, ApiError> {
        let response = self
            .authorized(self.http.get(self.url("datasets/history/")))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(self.fail(response).await);
        }
        Self::decode(response).await
    }

    pub async fn dataset_summary(&self, id: i64) -> Result<DatasetDetail, ApiError> {
        let response = self
            .authorized(self.http.get(self.url(&format!("datasets/{}/summary/", id))))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(self.fail(response).await);
        }
        Self::decode(response).await
    }

    pub async fn download_pdf(&self, id: i64, destination: &Path) -> Result<(), ApiError> {
        let response = self
            .authorized(
                self.http
                    .get(self.url(&format!("datasets/{}/generate_pdf/", id))),
            )
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(self.fail(response).await);
        }
        let bytes = response.bytes().await?;
        std::fs::write(destination, &bytes).map_err(|source| ApiError::File {
            path: destination.to_path_buf(),
            source,
        })
    }

    pub async fn delete_dataset(&self, id: i64) -> Result<(), ApiError> {
        let response = self
            .authorized(self.http.delete(self.url(&format!("datasets/{}/", id))))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(self.fail(response).await);
        }
        Ok(())
    }
}

fn progress_percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    (sent.min(total) * 100 / total) as u8
}

#[cfg(test)]
mod tests {
    use super::progress_percent;

    #[test]
    fn percent_is_monotonic_and_bounded() {
        let total: u64 = 5 * 1024 * 1024;
        let mut last = 0;
        let mut sent = 0;
        while sent < total {
            sent = (sent + 64 * 1024).min(total);
            let percent = progress_percent(sent, total);
            assert!(percent >= last);
            assert!(percent <= 100);
            last = percent;
        }
        assert_eq!(last, 100);
    }

    #[test]
    fn overshoot_is_clamped() {
        assert_eq!(progress_percent(11, 10), 100);
    }

    #[test]
    fn empty_body_counts_as_complete() {
        assert_eq!(progress_percent(0, 0), 100);
    }
}
