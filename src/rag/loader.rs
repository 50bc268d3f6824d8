//! Document download and text extraction

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;
use tracing::info;
use url::Url;

use crate::config::AppConfig;
use crate::embeddings::normalize_document;
use crate::errors::PolicyQaError;
use crate::errors::Result;

const PDF_MAGIC: &[u8] = b"%PDF";

/// Source format of a downloaded document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Text,
}

/// Raw bytes of a downloaded document
#[derive(Debug)]
pub struct FetchedDocument {
    pub url: Url,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FetchedDocument {
    /// Decide how to extract text: content type, then magic bytes, then path suffix
    pub fn format(&self) -> DocumentFormat {
        let is_pdf_type = self
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("application/pdf"));

        if is_pdf_type
            || self.bytes.starts_with(PDF_MAGIC)
            || self.url.path().to_ascii_lowercase().ends_with(".pdf")
        {
            DocumentFormat::Pdf
        } else {
            DocumentFormat::Text
        }
    }
}

/// Downloads documents and turns them into normalized plain text
pub struct DocumentLoader {
    client: Client,
    max_bytes: usize,
}

impl DocumentLoader {
    pub fn new(fetch_timeout: Duration, max_bytes: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(fetch_timeout)
            .build()
            .map_err(|e| PolicyQaError::HttpError(e.to_string()))?;

        Ok(Self { client, max_bytes })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            Duration::from_secs(config.rag.fetch_timeout_secs),
            config.rag.max_document_bytes,
        )
    }

    /// Download `url` and return its normalized text
    ///
    /// # Errors
    /// All failures are `DocumentFetchError`: invalid URL, transport errors,
    /// non-success status, oversize body, unreadable PDF or empty text.
    pub async fn load(&self, url: &str) -> Result<String> {
        let url = parse_document_url(url)?;
        let document = self.fetch(url).await?;
        let format = document.format();
        let raw = extract_text(document.bytes, format).await?;

        let text = normalize_document(&raw);
        if text.is_empty() {
            return Err(PolicyQaError::DocumentFetchError(
                "Document contains no extractable text".to_string(),
            ));
        }

        info!(
            "Loaded {:?} document from {} ({} chars)",
            format,
            document.url,
            text.len()
        );
        Ok(text)
    }

    /// Fetch raw bytes, enforcing the size cap while streaming
    pub async fn fetch(&self, url: Url) -> Result<FetchedDocument> {
        debug!("Fetching document: {}", url);

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| PolicyQaError::DocumentFetchError(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PolicyQaError::DocumentFetchError(format!(
                "{url}: server responded with {status}"
            )));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes as u64 {
                return Err(self.too_large(&url));
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| PolicyQaError::DocumentFetchError(format!("{url}: {e}")))?
        {
            if bytes.len() + chunk.len() > self.max_bytes {
                return Err(self.too_large(&url));
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(FetchedDocument {
            url,
            content_type,
            bytes,
        })
    }

    fn too_large(&self, url: &Url) -> PolicyQaError {
        PolicyQaError::DocumentFetchError(format!(
            "{url}: document exceeds {} bytes",
            self.max_bytes
        ))
    }
}

/// Accept only absolute http(s) URLs
pub fn parse_document_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| PolicyQaError::DocumentFetchError(format!("Invalid document URL: {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(PolicyQaError::DocumentFetchError(format!(
            "Unsupported URL scheme: {other}"
        ))),
    }
}

/// Extract text on a blocking thread; PDF parsing is CPU bound
pub async fn extract_text(bytes: Vec<u8>, format: DocumentFormat) -> Result<String> {
    match format {
        DocumentFormat::Text => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        DocumentFormat::Pdf => tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&bytes)
        })
        .await
        .map_err(|e| PolicyQaError::DocumentFetchError(format!("PDF extraction task failed: {e}")))?
        .map_err(|e| {
            PolicyQaError::DocumentFetchError(format!("Failed to extract text from PDF: {e}"))
        }),
    }
}
