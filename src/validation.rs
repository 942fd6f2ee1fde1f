use reqwest::Url;

use crate::{
    error::{AppError, FieldError},
    models::{
        CreateAddressRequest, CreateAssistanceRequest, CreateAvatarRequest, CreateDocumentRequest,
        CreateEnrollmentRequest, CreateInviteRequest, CreateOrganizationRequest,
        CreatePersonRequest, CreateRelativeRequest, UpdateAddressRequest, UpdateAssistanceRequest,
        UpdateDocumentRequest, UpdateEnrollmentRequest, UpdatePersonRequest,
        UpdateRelativeRequest,
    },
};

/// Validate
///
/// Content rules that the type system alone cannot express (non-blank text, CPF and slug
/// shape, e-mail and URL format). Called by `ApiJson` right after deserialization.
pub trait Validate {
    fn validate(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Collects field errors so a client sees every problem at once.
#[derive(Debug, Default)]
pub struct Violations(Vec<FieldError>);

impl Violations {
    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.0.push(FieldError::new(field, message));
        }
        self
    }

    pub fn not_blank(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(!value.trim().is_empty(), field, "must not be empty")
    }

    fn not_blank_opt(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        match value {
            Some(value) => self.not_blank(field, value),
            None => self,
        }
    }

    fn cpf(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(is_document_number(value), field, "must contain only digits, '.' or '-'")
    }

    fn nis(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        match value {
            Some(value) => {
                self.check(is_document_number(value), field, "must contain only digits, '.' or '-'")
            }
            None => self,
        }
    }

    fn http_url(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(is_http_url(value), field, "must be an absolute http(s) URL")
    }

    fn non_negative(&mut self, field: &str, value: Option<i32>) -> &mut Self {
        self.check(value.is_none_or(|v| v >= 0), field, "must not be negative")
    }

    pub fn finish(&mut self) -> Result<(), AppError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(std::mem::take(&mut self.0)))
        }
    }
}

/// CPF and NIS are stored as typed by the client, punctuation included.
pub fn is_document_number(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty()
        && value.chars().any(|c| c.is_ascii_digit())
        && value.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '-')
}

/// Lowercase letters, digits and single inner hyphens.
pub fn is_slug(value: &str) -> bool {
    !value.is_empty()
        && !value.starts_with('-')
        && !value.ends_with('-')
        && !value.contains("--")
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

pub fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}

pub fn is_http_url(value: &str) -> bool {
    Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}

impl Validate for CreateOrganizationRequest {
    fn validate(&self) -> Result<(), AppError> {
        Violations::default()
            .not_blank("name", &self.name)
            .check(
                is_slug(&self.slug),
                "slug",
                "must contain only lowercase letters, digits and hyphens",
            )
            .finish()
    }
}

impl Validate for CreateInviteRequest {
    fn validate(&self) -> Result<(), AppError> {
        Violations::default()
            .check(is_email(&self.email), "email", "must be a valid e-mail address")
            .finish()
    }
}

impl Validate for CreatePersonRequest {
    fn validate(&self) -> Result<(), AppError> {
        Violations::default()
            .not_blank("fullName", &self.full_name)
            .cpf("cpf", &self.cpf)
            .nis("nis", self.nis.as_deref())
            .finish()
    }
}

impl Validate for UpdatePersonRequest {
    fn validate(&self) -> Result<(), AppError> {
        let mut violations = Violations::default();
        violations.not_blank_opt("fullName", self.full_name.as_deref());
        if let Some(cpf) = &self.cpf {
            violations.cpf("cpf", cpf);
        }
        violations.nis("nis", self.nis.as_ref().and_then(|nis| nis.as_deref()));
        violations.finish()
    }
}

impl Validate for CreateAddressRequest {
    fn validate(&self) -> Result<(), AppError> {
        Violations::default()
            .not_blank("cep", &self.cep)
            .not_blank("neighborhood", &self.neighborhood)
            .not_blank("street", &self.street)
            .not_blank("number", &self.number)
            .finish()
    }
}

impl Validate for UpdateAddressRequest {
    fn validate(&self) -> Result<(), AppError> {
        Violations::default()
            .not_blank_opt("cep", self.cep.as_deref())
            .not_blank_opt("neighborhood", self.neighborhood.as_deref())
            .not_blank_opt("street", self.street.as_deref())
            .not_blank_opt("number", self.number.as_deref())
            .finish()
    }
}

impl Validate for CreateRelativeRequest {
    fn validate(&self) -> Result<(), AppError> {
        Violations::default()
            .not_blank("relativeName", &self.relative_name)
            .finish()
    }
}

impl Validate for UpdateRelativeRequest {
    fn validate(&self) -> Result<(), AppError> {
        Violations::default()
            .not_blank_opt("relativeName", self.relative_name.as_deref())
            .finish()
    }
}

impl Validate for CreateEnrollmentRequest {}

impl Validate for UpdateEnrollmentRequest {}

impl Validate for CreateAssistanceRequest {
    fn validate(&self) -> Result<(), AppError> {
        Violations::default()
            .non_negative("quantity", self.quantity)
            .non_negative("valueCents", self.value_cents)
            .finish()
    }
}

impl Validate for UpdateAssistanceRequest {
    fn validate(&self) -> Result<(), AppError> {
        Violations::default()
            .non_negative("quantity", self.quantity.flatten())
            .non_negative("valueCents", self.value_cents.flatten())
            .finish()
    }
}

impl Validate for CreateDocumentRequest {
    fn validate(&self) -> Result<(), AppError> {
        Violations::default()
            .http_url("fileUrl", &self.file_url)
            .finish()
    }
}

impl Validate for CreateAvatarRequest {
    fn validate(&self) -> Result<(), AppError> {
        Violations::default()
            .http_url("fileUrl", &self.file_url)
            .finish()
    }
}

impl Validate for UpdateDocumentRequest {
    fn validate(&self) -> Result<(), AppError> {
        let mut violations = Violations::default();
        if let Some(url) = &self.file_url {
            violations.http_url("fileUrl", url);
        }
        violations.finish()
    }
}
