// Typed form inputs with the validation each one needs before dispatch.

use crate::domain::errors::FieldErrors;
use crate::domain::request::UploadFile;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

const MIN_NAME_LEN: usize = 2;
const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const ALLOWED_UPLOAD_EXTENSIONS: [&str; 4] = ["pdf", "doc", "docx", "txt"];

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$")
            .expect("Failed to compile email regex")
    })
}

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9+\-\s()]+$").expect("Failed to compile phone regex"))
}

// Shared field checks used by the login, registration and profile forms.
fn check_name(errors: &mut FieldErrors, name: &str) {
    if name.trim().is_empty() {
        errors.push("name", "Full name is required");
    } else if name.trim().chars().count() < MIN_NAME_LEN {
        errors.push("name", "Name must be at least 2 characters");
    }
}

fn check_email(errors: &mut FieldErrors, email: &str) {
    if email.trim().is_empty() {
        errors.push("email", "Email is required");
    } else if !email_pattern().is_match(email.trim()) {
        errors.push("email", "Invalid email address");
    }
}

fn check_phone(errors: &mut FieldErrors, phone: &str) {
    if phone.trim().is_empty() {
        errors.push("phone", "Phone number is required");
    } else if !phone_pattern().is_match(phone) {
        errors.push("phone", "Invalid phone number");
    }
}

fn check_password(errors: &mut FieldErrors, password: &str) {
    if password.is_empty() {
        errors.push("password", "Password is required");
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push("password", "Password must be at least 6 characters");
    }
}

// Email/password pair submitted on sign in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_email(&mut errors, &self.email);
        check_password(&mut errors, &self.password);
        errors.into_result()
    }
}

// New account details; location fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub confirm_password: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_name(&mut errors, &self.name);
        check_email(&mut errors, &self.email);
        check_phone(&mut errors, &self.phone);
        check_password(&mut errors, &self.password);
        if self.confirm_password.is_empty() {
            errors.push("confirm_password", "Please confirm your password");
        } else if self.confirm_password != self.password {
            errors.push("confirm_password", "Passwords do not match");
        }
        errors.into_result()
    }
}

// Editable profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl ProfileForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_name(&mut errors, &self.name);
        check_email(&mut errors, &self.email);
        check_phone(&mut errors, &self.phone);
        errors.into_result()
    }
}

// Inputs a document request can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentField {
    Parties,
    Subject,
    Terms,
    Duration,
    Amount,
}

impl DocumentField {
    pub fn key(self) -> &'static str {
        match self {
            DocumentField::Parties => "parties",
            DocumentField::Subject => "subject",
            DocumentField::Terms => "terms",
            DocumentField::Duration => "duration",
            DocumentField::Amount => "amount",
        }
    }

    fn required_message(self) -> &'static str {
        match self {
            DocumentField::Parties => "Parties are required",
            DocumentField::Subject => "Subject is required",
            DocumentField::Terms | DocumentField::Duration | DocumentField::Amount => {
                "This field is required"
            }
        }
    }
}

// Document templates the backend can generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Contract,
    Nda,
    Employment,
    Lease,
    Partnership,
    Service,
    RentAgreement,
    PartnershipDeed,
    Affidavit,
    PowerOfAttorney,
    Custom,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 11] = [
        DocumentKind::Contract,
        DocumentKind::Nda,
        DocumentKind::Employment,
        DocumentKind::Lease,
        DocumentKind::Partnership,
        DocumentKind::Service,
        DocumentKind::RentAgreement,
        DocumentKind::PartnershipDeed,
        DocumentKind::Affidavit,
        DocumentKind::PowerOfAttorney,
        DocumentKind::Custom,
    ];

    /// Wire value sent as `document_type`.
    pub fn slug(self) -> &'static str {
        match self {
            DocumentKind::Contract => "contract",
            DocumentKind::Nda => "nda",
            DocumentKind::Employment => "employment",
            DocumentKind::Lease => "lease",
            DocumentKind::Partnership => "partnership",
            DocumentKind::Service => "service",
            DocumentKind::RentAgreement => "rent_agreement",
            DocumentKind::PartnershipDeed => "partnership_deed",
            DocumentKind::Affidavit => "affidavit",
            DocumentKind::PowerOfAttorney => "power_of_attorney",
            DocumentKind::Custom => "custom",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::Contract => "Contract Agreement",
            DocumentKind::Nda => "Non-Disclosure Agreement",
            DocumentKind::Employment => "Employment Contract",
            DocumentKind::Lease => "Lease Agreement",
            DocumentKind::Partnership => "Partnership Agreement",
            DocumentKind::Service => "Service Agreement",
            DocumentKind::RentAgreement => "Rent Agreement",
            DocumentKind::PartnershipDeed => "Partnership Deed",
            DocumentKind::Affidavit => "Affidavit",
            DocumentKind::PowerOfAttorney => "Power of Attorney",
            DocumentKind::Custom => "Custom Document",
        }
    }

    // Terms, duration and amount are "if applicable" for every kind.
    pub fn required_fields(self) -> &'static [DocumentField] {
        &[DocumentField::Parties, DocumentField::Subject]
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    // Accepts the slug or the display label, ignoring case, spaces and dashes.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_kind(value);
        DocumentKind::ALL
            .into_iter()
            .find(|kind| normalize_kind(kind.slug()) == wanted || normalize_kind(kind.label()) == wanted)
            .ok_or_else(|| format!("unknown document type: {value}"))
    }
}

// Lowercase alphanumerics only, so "Rent Agreement" matches "rent_agreement".
fn normalize_kind(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

// Field values for one document request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFields {
    pub parties: String,
    pub subject: String,
    pub terms: Option<String>,
    pub duration: Option<String>,
    pub amount: Option<String>,
}

impl DocumentFields {
    pub fn value(&self, field: DocumentField) -> Option<&str> {
        let value = match field {
            DocumentField::Parties => Some(self.parties.as_str()),
            DocumentField::Subject => Some(self.subject.as_str()),
            DocumentField::Terms => self.terms.as_deref(),
            DocumentField::Duration => self.duration.as_deref(),
            DocumentField::Amount => self.amount.as_deref(),
        };
        value.filter(|value| !value.trim().is_empty())
    }
}

// A document kind together with its field values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRequest {
    pub kind: DocumentKind,
    pub fields: DocumentFields,
}

impl DocumentRequest {
    pub fn new(kind: DocumentKind, fields: DocumentFields) -> Self {
        Self { kind, fields }
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        for field in self.kind.required_fields() {
            if self.fields.value(*field).is_none() {
                errors.push(field.key(), field.required_message());
            }
        }
        errors.into_result()
    }
}

// Files (and an optional question about them) for one upload submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadBatch {
    pub files: Vec<UploadFile>,
    pub question: Option<String>,
}

impl UploadBatch {
    pub fn new(files: Vec<UploadFile>) -> Self {
        Self {
            files,
            question: None,
        }
    }

    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        let question = question.into();
        if !question.trim().is_empty() {
            self.question = Some(question);
        }
        self
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.files.is_empty() {
            errors.push("files", "Select at least one file");
        }
        for file in &self.files {
            let extension = file
                .filename
                .rsplit_once('.')
                .map(|(_, ext)| ext.to_ascii_lowercase())
                .unwrap_or_default();
            if !ALLOWED_UPLOAD_EXTENSIONS.contains(&extension.as_str()) {
                errors.push(
                    file.filename.clone(),
                    "Supported formats: PDF, DOC, DOCX, TXT",
                );
            } else if file.content.len() > MAX_UPLOAD_BYTES {
                errors.push(file.filename.clone(), "File exceeds the 10MB limit");
            }
        }
        errors.into_result()
    }
}
