use serde::de::DeserializeOwned;
use serde_json::Value;

// Transport-neutral request/response model. The HTTP adapter turns these into
// reqwest calls; tests replay them against scripted responses.

// HTTP methods the backend API uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// A file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub filename: String,
    pub content: Vec<u8>,
}

impl UploadFile {
    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content,
        }
    }

    /// MIME type guessed from the file extension.
    pub fn mime_type(&self) -> String {
        mime_guess::from_path(&self.filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }
}

// One part of a multipart form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    Text { name: String, value: String },
    File { name: String, file: UploadFile },
}

// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart(Vec<FormPart>),
}

// Transport-neutral request built by the use cases.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    // Raw (unencoded) path segments; an empty last segment means a trailing slash.
    pub segments: Vec<String>,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: &str) -> Self {
        let segments = path
            .trim_start_matches('/')
            .split('/')
            .map(str::to_string)
            .collect();
        Self {
            method,
            segments,
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: &str) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: &str) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: &str) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Appends a single path segment; the adapter percent-encodes it.
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        if self.segments.last().is_some_and(|last| last.is_empty()) {
            self.segments.pop();
        }
        self.segments.push(segment.into());
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Human-readable path, used for logs and for matching in fakes.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

// Status code and raw body as returned by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_auth_rejection(&self) -> bool {
        matches!(self.status, 401 | 403)
    }

    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}
