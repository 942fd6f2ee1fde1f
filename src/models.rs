use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enumerations (mirrored as Postgres enum types) ---

/// Role
///
/// A member's access level inside one organization.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, TS, ToSchema,
)]
#[sqlx(type_name = "role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Role {
    Owner,
    Admin,
    #[default]
    Member,
    Viewer,
}

impl Role {
    /// Only owners and admins may issue or revoke invites.
    pub fn can_manage_invites(self) -> bool {
        matches!(self, Role::Owner | Role::Admin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, TS, ToSchema)]
#[sqlx(type_name = "education_level", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum EducationLevel {
    None,
    ElementaryIncomplete,
    ElementaryComplete,
    HighSchoolIncomplete,
    HighSchoolComplete,
    Technical,
    UniversityIncomplete,
    UniversityComplete,
    Postgrad,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, TS, ToSchema,
)]
#[sqlx(type_name = "kinship_degree", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum KinshipDegree {
    Spouse,
    Child,
    Father,
    Mother,
    Sibling,
    Grandparent,
    Grandchild,
    UncleAunt,
    NephewNiece,
    Cousin,
    #[default]
    Other,
}

/// DocumentType
///
/// `WalletPhoto` documents double as the person's avatar.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, TS, ToSchema,
)]
#[sqlx(type_name = "person_document_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum DocumentType {
    WalletPhoto,
    #[default]
    Other,
}

// --- Core Schemas (Mapped to Database) ---

/// User
///
/// Identity record owned by the external identity provider. Read-only from this API.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Organization
///
/// Root of tenancy. Every business row is reachable only through one.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_by_id: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Membership
///
/// Links a user to an organization with a role. Unique per (user, organization).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Membership {
    pub id: Uuid,
    pub role: Role,
    pub user_id: Uuid,
    pub organization_id: Uuid,
}

/// Invite
///
/// A pending grant of `role` to `email`. Consumed when accepted or rejected.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Invite {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub organization_id: Uuid,
    pub author_id: Option<Uuid>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Person
///
/// The case subject. CPF and NIS are unique among live persons of an organization.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Person {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub full_name: String,
    pub cpf: String,
    #[ts(type = "string")]
    pub birth_date: NaiveDate,
    pub phone_number: Option<String>,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    pub education_level: Option<EducationLevel>,
    pub receives_bolsa_familia: bool,
    pub nis: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Address {
    pub id: Uuid,
    pub person_id: Uuid,
    pub cep: String,
    pub neighborhood: String,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Relative {
    pub id: Uuid,
    pub person_id: Uuid,
    pub relative_name: String,
    pub degree: KinshipDegree,
    pub degree_text: Option<String>,
    pub phone_number: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Enrollment
///
/// A person's enrollment in a course (`person_courses` table).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Enrollment {
    pub id: Uuid,
    pub person_id: Uuid,
    pub course_id: Uuid,
    #[ts(type = "string")]
    pub enrolled_at: DateTime<Utc>,
    #[ts(type = "string | null")]
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Assistance
///
/// One assistance delivery (`person_assistances` table). Money is kept in cents.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Assistance {
    pub id: Uuid,
    pub person_id: Uuid,
    pub assistance_type_id: Uuid,
    #[ts(type = "string")]
    pub received_at: DateTime<Utc>,
    pub quantity: Option<i32>,
    pub value_cents: Option<i32>,
    pub notes: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Document
///
/// `type` is a reserved keyword in Rust, so the column is read as `document_type`
/// and sent as "type" in JSON.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Document {
    pub id: Uuid,
    pub person_id: Uuid,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub document_type: DocumentType,
    pub file_url: String,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Course lookup row (organization independent).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
}

/// Assistance type lookup row (organization independent).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct AssistanceType {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

// --- Joined Read Models ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrganizationSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

impl From<Organization> for OrganizationSummary {
    fn from(org: Organization) -> Self {
        Self {
            id: org.id,
            name: org.name,
            slug: org.slug,
            description: org.description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct InviteAuthor {
    pub id: Uuid,
    pub name: Option<String>,
}

/// OrganizationInvite
///
/// An invite as listed to the organization's administrators.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrganizationInvite {
    pub id: Uuid,
    pub role: Role,
    pub email: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    pub author: Option<InviteAuthor>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct InviteOrganization {
    pub name: String,
}

/// PendingInvite
///
/// An invite as seen by its recipient, enriched with the inviting organization's name.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PendingInvite {
    pub id: Uuid,
    pub role: Role,
    pub email: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    pub organization: InviteOrganization,
    pub author: Option<InviteAuthor>,
}

// --- Request Payloads (Input Schemas) ---

/// Treats a present JSON value (including `null`) as `Some`, so partial updates can
/// tell "clear this field" apart from "leave it alone".
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Accepts either a calendar date (`2000-01-01`) or an RFC 3339 timestamp.
pub fn parse_lenient_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(value)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).date_naive())
    })
}

fn lenient_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_lenient_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}")))
}

fn lenient_date_opt<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_lenient_date(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}"))),
        None => Ok(None),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CreateOrganizationRequest {
    #[schema(example = "Instituto Esperança")]
    pub name: String,
    #[schema(example = "instituto-esperanca")]
    pub slug: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CreateInviteRequest {
    #[schema(example = "maria@example.com")]
    pub email: String,
    pub role: Role,
}

/// CreatePersonRequest
///
/// `birthDate` accepts a plain date or a full timestamp; only the date is kept.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreatePersonRequest {
    pub full_name: String,
    #[schema(example = "123.456.789-09")]
    pub cpf: String,
    #[serde(deserialize_with = "lenient_date")]
    #[schema(value_type = String, format = Date, example = "2000-01-01")]
    pub birth_date: NaiveDate,
    pub phone_number: Option<String>,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    pub education_level: Option<EducationLevel>,
    #[serde(default)]
    pub receives_bolsa_familia: bool,
    pub nis: Option<String>,
}

/// UpdatePersonRequest
///
/// Partial update. Absent fields are untouched; `null` clears nullable columns.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePersonRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    #[serde(default, deserialize_with = "lenient_date_opt", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, format = Date)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, nullable)]
    pub phone_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, nullable)]
    pub father_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, nullable)]
    pub mother_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<EducationLevel>, nullable)]
    pub education_level: Option<Option<EducationLevel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receives_bolsa_familia: Option<bool>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, nullable)]
    pub nis: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateAddressRequest {
    #[schema(example = "01001-000")]
    pub cep: String,
    pub neighborhood: String,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAddressRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cep: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, nullable)]
    pub complement: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateRelativeRequest {
    pub relative_name: String,
    pub degree: KinshipDegree,
    pub degree_text: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRelativeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<KinshipDegree>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, nullable)]
    pub degree_text: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, nullable)]
    pub phone_number: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateEnrollmentRequest {
    pub course_id: Uuid,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEnrollmentRequest {
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, format = DateTime, nullable)]
    pub completed_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, nullable)]
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssistanceRequest {
    pub assistance_type_id: Uuid,
    /// Defaults to the time of the request.
    pub received_at: Option<DateTime<Utc>>,
    pub quantity: Option<i32>,
    pub value_cents: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssistanceRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<i32>, nullable)]
    pub quantity: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<i32>, nullable)]
    pub value_cents: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, nullable)]
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentRequest {
    #[serde(rename = "type", default)]
    pub document_type: DocumentType,
    #[schema(example = "https://files.example.com/rg.pdf")]
    pub file_url: String,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
}

fn wallet_photo() -> DocumentType {
    DocumentType::WalletPhoto
}

/// CreateAvatarRequest
///
/// Same shape as a document, but the type defaults to `WALLET_PHOTO`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAvatarRequest {
    #[serde(rename = "type", default = "wallet_photo")]
    pub document_type: DocumentType,
    pub file_url: String,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
}

impl From<CreateAvatarRequest> for CreateDocumentRequest {
    fn from(req: CreateAvatarRequest) -> Self {
        Self {
            document_type: req.document_type,
            file_url: req.file_url,
            file_name: req.file_name,
            mime_type: req.mime_type,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocumentRequest {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<DocumentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, nullable)]
    pub file_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, nullable)]
    pub mime_type: Option<Option<String>>,
}

/// PersonFilter
///
/// Query parameters for the person listing.
#[derive(Debug, Clone, Deserialize, Default, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PersonFilter {
    /// Matches full name, CPF, phone number and parents' names (case-insensitive).
    pub search: Option<String>,
    /// 1-based page number. Without it every live person is returned.
    pub page: Option<u32>,
}

/// Fixed page size of the person listing.
pub const PERSON_PAGE_SIZE: u32 = 15;

impl PersonFilter {
    /// The trimmed search term, if any non-blank one was supplied.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// `(limit, offset)` for the requested page.
    pub fn page_window(&self) -> Option<(i64, i64)> {
        self.page.map(|page| {
            let page = page.max(1) as i64;
            let size = PERSON_PAGE_SIZE as i64;
            (size, (page - 1) * size)
        })
    }
}

// --- Response Envelopes (Output Schemas) ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreatedResponse {
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateOrganizationResponse {
    pub organization: CreatedResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateInviteResponse {
    pub invite_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct OrganizationsResponse {
    pub organizations: Vec<OrganizationSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct OrganizationResponse {
    pub organization: OrganizationSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct MembershipResponse {
    pub membership: Membership,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct InvitesResponse {
    pub invites: Vec<OrganizationInvite>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PendingInvitesResponse {
    pub invites: Vec<PendingInvite>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PersonsResponse {
    pub persons: Vec<Person>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PersonResponse {
    pub person: Person,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AddressResponse {
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RelativesResponse {
    pub relatives: Vec<Relative>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RelativeResponse {
    pub relative: Option<Relative>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct EnrollmentsResponse {
    pub enrollments: Vec<Enrollment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct EnrollmentResponse {
    pub enrollment: Option<Enrollment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AssistancesResponse {
    pub assistances: Vec<Assistance>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AssistanceResponse {
    pub assistance: Option<Assistance>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct DocumentsResponse {
    pub documents: Vec<Document>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct DocumentResponse {
    pub document: Option<Document>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AvatarResponse {
    pub avatar: Option<Document>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CoursesResponse {
    pub courses: Vec<Course>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AssistanceTypesResponse {
    pub assistance_types: Vec<AssistanceType>,
}
