//! One-time upload form handling
//!
//! An upload-type task hands back a form descriptor: a storage URL plus a
//! set of opaque parameters that must accompany the file in a single
//! multipart submission. The descriptor is valid for exactly one
//! submission, so [`UploadForm`] is consumed by value — a second submission
//! of the same value does not typecheck.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tokio_util::codec::{BytesCodec, FramedRead};

use crate::error::{Error, Result};

/// One-time descriptor enabling direct binary upload to a storage endpoint
///
/// Returned inside an upload task's result. Obtain one via
/// [`TaskResult::upload_form`](crate::TaskResult::upload_form) and submit it
/// with [`ConvertClient::upload_file`](crate::ConvertClient::upload_file),
/// which consumes the form.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadForm {
    /// Upload target URL
    pub url: String,

    /// Form parameters the storage endpoint requires alongside the file
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl UploadForm {
    /// Submit this form as a single multipart request carrying `file`
    ///
    /// Consumes the form. The declared parameters are attached as text
    /// fields and the file content is streamed as the `file` part, matching
    /// what the storage endpoint expects. The request is attempted exactly
    /// once.
    pub(crate) async fn submit(self, http: &reqwest::Client, file: &Path) -> Result<()> {
        let mut multipart = reqwest::multipart::Form::new();
        for (key, value) in self.parameters {
            // Parameter values are opaque; non-string values are sent in
            // their JSON text form.
            let text = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            multipart = multipart.text(key, text);
        }

        let handle = tokio::fs::File::open(file).await?;
        let length = handle.metadata().await?.len();
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        let stream = FramedRead::new(handle, BytesCodec::new());
        let part = reqwest::multipart::Part::stream_with_length(
            reqwest::Body::wrap_stream(stream),
            length,
        )
        .file_name(file_name);
        multipart = multipart.part("file", part);

        tracing::debug!(url = %self.url, bytes = length, "submitting upload form");

        let response = http.post(&self.url).multipart(multipart).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                code: None,
                message: body.trim().to_string(),
            });
        }

        tracing::info!(bytes = length, "upload form consumed");
        Ok(())
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn form_for(server_uri: &str) -> UploadForm {
        serde_json::from_value(serde_json::json!({
            "url": format!("{}/store", server_uri),
            "parameters": {"signature": "abc123", "expires": 1699999999}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn submit_posts_multipart_to_form_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/store"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("myvideo.mp4");
        let mut file = std::fs::File::create(&file_path).unwrap();
        file.write_all(b"not really a video").unwrap();

        let form = form_for(&server.uri());
        form.submit(&reqwest::Client::new(), &file_path)
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let content_type = requests[0]
            .headers
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(content_type.starts_with("multipart/form-data"));
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains("abc123"));
        assert!(body.contains("not really a video"));
        assert!(body.contains("myvideo.mp4"));
    }

    #[tokio::test]
    async fn submit_surfaces_storage_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/store"))
            .respond_with(ResponseTemplate::new(403).set_body_string("signature expired"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("doc.pdf");
        std::fs::write(&file_path, b"pdf bytes").unwrap();

        let form = form_for(&server.uri());
        let err = form
            .submit(&reqwest::Client::new(), &file_path)
            .await
            .unwrap_err();
        match err {
            Error::Api {
                status, message, ..
            } => {
                assert_eq!(status, 403);
                assert_eq!(message, "signature expired");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn submit_fails_on_missing_local_file() {
        let form = form_for("http://127.0.0.1:9");
        let err = form
            .submit(&reqwest::Client::new(), Path::new("/does/not/exist.bin"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
