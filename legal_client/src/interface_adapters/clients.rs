use crate::domain::{
    ApiRequest, ApiResponse, FormPart, Method, RequestBody, Transport, TransportError,
};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use url::Url;

// Thin wrapper around reqwest for backend calls.
#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    // Compose the endpoint URL; segments are percent-encoded by `url`.
    fn endpoint(&self, request: &ApiRequest) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                TransportError::Other(format!("base url {} cannot hold a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(&request.segments);
        Ok(url)
    }
}

// Build the reqwest form; each file part gets a guessed MIME type.
fn multipart_form(parts: Vec<FormPart>) -> Result<Form, TransportError> {
    let mut form = Form::new();
    for part in parts {
        form = match part {
            FormPart::Text { name, value } => form.text(name, value),
            FormPart::File { name, file } => {
                let mime = file.mime_type();
                let body = Part::bytes(file.content)
                    .file_name(file.filename)
                    .mime_str(&mime)
                    .map_err(|err| TransportError::Other(err.to_string()))?;
                form.part(name, body)
            }
        };
    }
    Ok(form)
}

// Map reqwest failures onto the transport error port.
fn transport_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.endpoint(&request)?;
        let method = request.method;
        tracing::debug!(method = method.as_str(), %url, "sending request");

        let mut builder = match method {
            Method::Get => self.http.get(url),
            Method::Post => self.http.post(url),
            Method::Put => self.http.put(url),
            Method::Delete => self.http.delete(url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::Multipart(parts) => builder.multipart(multipart_form(parts)?),
        };

        let res = builder.send().await.map_err(transport_error)?;
        let status = res.status().as_u16();
        // Read the whole body; decoding is the caller's job.
        let body = res.bytes().await.map_err(transport_error)?;

        tracing::debug!(method = method.as_str(), status, "response received");
        Ok(ApiResponse::new(status, body.to_vec()))
    }
}
