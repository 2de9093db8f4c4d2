//! PDF upload.
//!
//! One multipart `POST` with the PDF in a `file` field. The endpoint answers
//! `{ "url": "..." }` with the stored location. There is no retry.

use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::error::{HostError, HostResult};

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

/// Upload file name for a PDF created at `millis` since the Unix epoch.
#[must_use]
pub fn file_name(millis: u128) -> String {
    format!("post-{millis}.pdf")
}

/// Milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
}

/// Upload `pdf` to `endpoint` and return the URL it was stored under.
///
/// # Errors
///
/// Returns [`HostError::Http`] if the request fails, [`HostError::Upload`]
/// for a non-success status and [`HostError::UnexpectedResponse`] if the
/// body carries no `url`.
pub async fn upload_pdf(
    client: &Client,
    endpoint: &Url,
    pdf: Vec<u8>,
    file_name: &str,
) -> HostResult<String> {
    let size = pdf.len();
    let part = Part::bytes(pdf)
        .file_name(file_name.to_string())
        .mime_str("application/pdf")?;
    let form = Form::new().part("file", part);

    tracing::debug!("Uploading {file_name} ({size} bytes) to {endpoint}");
    let response = client
        .post(endpoint.clone())
        .multipart(form)
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(HostError::Upload {
            status: status.as_u16(),
            body,
        });
    }

    let parsed: UploadResponse =
        serde_json::from_str(&body).map_err(|e| HostError::UnexpectedResponse(format!("{e}: {body}")))?;
    Ok(parsed.url)
}
