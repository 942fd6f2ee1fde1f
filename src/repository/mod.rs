use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::RepoError,
    models::{
        Address, Assistance, AssistanceType, Course, CreateAddressRequest,
        CreateAssistanceRequest, CreateDocumentRequest, CreateEnrollmentRequest,
        CreateOrganizationRequest, CreatePersonRequest, CreateRelativeRequest, Document,
        DocumentType, Enrollment, Invite, Membership, Organization, OrganizationInvite,
        OrganizationSummary, PendingInvite, Person, PersonFilter, Relative, Role,
        UpdateAddressRequest, UpdateAssistanceRequest, UpdateDocumentRequest,
        UpdateEnrollmentRequest, UpdatePersonRequest, UpdateRelativeRequest, User,
    },
};

mod postgres;

pub use postgres::PostgresRepository;

/// Names of the unique constraints and partial unique indexes in `migrations/`.
/// Both repositories report violations with these names.
pub mod constraints {
    pub const ORGANIZATION_SLUG: &str = "organizations_slug_key";
    pub const MEMBERSHIP_ORG_USER: &str = "memberships_org_user_key";
    pub const INVITE_EMAIL_ORG: &str = "invites_email_org_key";
    pub const PERSON_CPF: &str = "persons_org_cpf_live_key";
    pub const PERSON_NIS: &str = "persons_org_nis_live_key";
    pub const ADDRESS_PERSON: &str = "addresses_person_live_key";
    pub const ENROLLMENT_PERSON_COURSE: &str = "person_courses_person_course_live_key";
}

pub type RepoResult<T> = Result<T, RepoError>;

/// SoftDeletable
///
/// Business tables that are never hard-deleted. `soft_delete` stamps `deleted_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftDeletable {
    Person,
    Address,
    Relative,
    Enrollment,
    Assistance,
    Document,
}

impl SoftDeletable {
    pub fn table(self) -> &'static str {
        match self {
            SoftDeletable::Person => "persons",
            SoftDeletable::Address => "addresses",
            SoftDeletable::Relative => "person_relatives",
            SoftDeletable::Enrollment => "person_courses",
            SoftDeletable::Assistance => "person_assistances",
            SoftDeletable::Document => "person_documents",
        }
    }
}

/// PersonConflicts
///
/// Which identifiers of a candidate person are already taken by another live person.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersonConflicts {
    pub cpf: bool,
    pub nis: bool,
}

impl PersonConflicts {
    /// The client-facing message for the detected conflict, if any.
    pub fn message(self) -> Option<&'static str> {
        match (self.cpf, self.nis) {
            (true, true) => Some("CPF e NIS já estão cadastrados"),
            (true, false) => Some("CPF já cadastrado"),
            (false, true) => Some("NIS já cadastrado"),
            (false, false) => None,
        }
    }
}

/// Repository Trait
///
/// The persistence contract. `PostgresRepository` implements it; tests substitute an in-memory store.
/// Every read of a soft-deletable table returns live rows only; callers never pass a
/// "include deleted" flag because none exists.
///
/// Person-scoped methods take the `person_id` of a person the caller already resolved
/// through `get_person`, which is what ties children to the caller's organization.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>>;

    // --- Organizations & Memberships ---
    /// Inserts the organization and the creator's OWNER membership atomically.
    async fn create_organization(
        &self,
        owner_id: Uuid,
        req: &CreateOrganizationRequest,
    ) -> RepoResult<Uuid>;
    async fn get_organization_by_slug(&self, slug: &str) -> RepoResult<Option<Organization>>;
    async fn list_organizations_for_user(
        &self,
        user_id: Uuid,
    ) -> RepoResult<Vec<OrganizationSummary>>;
    /// Membership of `user_id` in the live organization named by `slug`.
    async fn get_membership(
        &self,
        user_id: Uuid,
        slug: &str,
    ) -> RepoResult<Option<(Organization, Membership)>>;
    async fn member_email_exists(&self, organization_id: Uuid, email: &str) -> RepoResult<bool>;

    // --- Invites ---
    async fn create_invite(
        &self,
        organization_id: Uuid,
        author_id: Uuid,
        email: &str,
        role: Role,
    ) -> RepoResult<Uuid>;
    async fn get_invite(&self, id: Uuid) -> RepoResult<Option<Invite>>;
    async fn find_invite_by_email(
        &self,
        organization_id: Uuid,
        email: &str,
    ) -> RepoResult<Option<Invite>>;
    /// Newest first.
    async fn list_invites(&self, organization_id: Uuid) -> RepoResult<Vec<OrganizationInvite>>;
    async fn list_pending_invites(&self, email: &str) -> RepoResult<Vec<PendingInvite>>;
    async fn delete_invite(&self, id: Uuid) -> RepoResult<()>;
    /// Creates the membership and consumes the invite in one transaction.
    async fn accept_invite(&self, invite: &Invite, user_id: Uuid) -> RepoResult<()>;

    // --- Persons ---
    async fn list_persons(
        &self,
        organization_id: Uuid,
        filter: &PersonFilter,
    ) -> RepoResult<Vec<Person>>;
    async fn get_person(&self, organization_id: Uuid, id: Uuid) -> RepoResult<Option<Person>>;
    /// Checks `cpf`/`nis` against other live persons of the organization, ignoring `exclude`.
    async fn find_person_conflicts(
        &self,
        organization_id: Uuid,
        cpf: Option<&str>,
        nis: Option<&str>,
        exclude: Option<Uuid>,
    ) -> RepoResult<PersonConflicts>;
    async fn create_person(
        &self,
        organization_id: Uuid,
        req: &CreatePersonRequest,
    ) -> RepoResult<Uuid>;
    async fn update_person(&self, id: Uuid, req: &UpdatePersonRequest) -> RepoResult<()>;

    // --- Address ---
    async fn get_address(&self, person_id: Uuid) -> RepoResult<Option<Address>>;
    async fn create_address(
        &self,
        person_id: Uuid,
        req: &CreateAddressRequest,
    ) -> RepoResult<Uuid>;
    async fn update_address(&self, id: Uuid, req: &UpdateAddressRequest) -> RepoResult<()>;

    // --- Relatives ---
    /// Ordered by name.
    async fn list_relatives(&self, person_id: Uuid) -> RepoResult<Vec<Relative>>;
    async fn get_relative(&self, person_id: Uuid, id: Uuid) -> RepoResult<Option<Relative>>;
    async fn create_relative(
        &self,
        person_id: Uuid,
        req: &CreateRelativeRequest,
    ) -> RepoResult<Uuid>;
    async fn update_relative(&self, id: Uuid, req: &UpdateRelativeRequest) -> RepoResult<()>;

    // --- Courses & Enrollments ---
    async fn list_courses(&self) -> RepoResult<Vec<Course>>;
    async fn get_course(&self, id: Uuid) -> RepoResult<Option<Course>>;
    /// Newest enrollment first.
    async fn list_enrollments(&self, person_id: Uuid) -> RepoResult<Vec<Enrollment>>;
    async fn get_enrollment(&self, person_id: Uuid, id: Uuid) -> RepoResult<Option<Enrollment>>;
    async fn find_enrollment_by_course(
        &self,
        person_id: Uuid,
        course_id: Uuid,
    ) -> RepoResult<Option<Enrollment>>;
    async fn create_enrollment(
        &self,
        person_id: Uuid,
        req: &CreateEnrollmentRequest,
    ) -> RepoResult<Uuid>;
    async fn update_enrollment(&self, id: Uuid, req: &UpdateEnrollmentRequest) -> RepoResult<()>;

    // --- Assistance Types & Assistances ---
    async fn list_assistance_types(&self) -> RepoResult<Vec<AssistanceType>>;
    async fn get_assistance_type(&self, id: Uuid) -> RepoResult<Option<AssistanceType>>;
    /// Most recently received first.
    async fn list_assistances(&self, person_id: Uuid) -> RepoResult<Vec<Assistance>>;
    async fn get_assistance(&self, person_id: Uuid, id: Uuid) -> RepoResult<Option<Assistance>>;
    /// `received_at` defaults to now when the request leaves it out.
    async fn create_assistance(
        &self,
        person_id: Uuid,
        req: &CreateAssistanceRequest,
    ) -> RepoResult<Uuid>;
    async fn update_assistance(&self, id: Uuid, req: &UpdateAssistanceRequest) -> RepoResult<()>;

    // --- Documents ---
    /// Newest first.
    async fn list_documents(&self, person_id: Uuid) -> RepoResult<Vec<Document>>;
    async fn get_document(&self, person_id: Uuid, id: Uuid) -> RepoResult<Option<Document>>;
    /// Most recent live document of the given type (used for the avatar).
    async fn latest_document(
        &self,
        person_id: Uuid,
        document_type: DocumentType,
    ) -> RepoResult<Option<Document>>;
    async fn create_document(
        &self,
        person_id: Uuid,
        req: &CreateDocumentRequest,
    ) -> RepoResult<Uuid>;
    async fn update_document(&self, id: Uuid, req: &UpdateDocumentRequest) -> RepoResult<()>;

    // --- Soft Delete ---
    /// Stamps `deleted_at` on a live row. Returns false when no live row matched.
    async fn soft_delete(&self, resource: SoftDeletable, id: Uuid) -> RepoResult<bool>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;
