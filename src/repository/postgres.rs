use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, query_builder::QueryBuilder};
use uuid::Uuid;

use super::{PersonConflicts, RepoResult, Repository, SoftDeletable};
use crate::models::{
    Address, Assistance, AssistanceType, Course, CreateAddressRequest, CreateAssistanceRequest,
    CreateDocumentRequest, CreateEnrollmentRequest, CreateOrganizationRequest,
    CreatePersonRequest, CreateRelativeRequest, Document, DocumentType, Enrollment, Invite,
    InviteAuthor, InviteOrganization, Membership, Organization, OrganizationInvite,
    OrganizationSummary, PendingInvite, Person, PersonFilter, Relative, Role,
    UpdateAddressRequest, UpdateAssistanceRequest, UpdateDocumentRequest,
    UpdateEnrollmentRequest, UpdatePersonRequest, UpdateRelativeRequest, User,
};

const ORGANIZATION_COLUMNS: &str =
    "o.id, o.name, o.slug, o.description, o.created_by_id, o.created_at, o.updated_at, o.deleted_at";
const PERSON_COLUMNS: &str = "id, organization_id, full_name, cpf, birth_date, phone_number, \
    father_name, mother_name, education_level, receives_bolsa_familia, nis, created_at, \
    updated_at, deleted_at";
const ADDRESS_COLUMNS: &str = "id, person_id, cep, neighborhood, street, number, complement, \
    created_at, updated_at, deleted_at";
const RELATIVE_COLUMNS: &str = "id, person_id, relative_name, degree, degree_text, phone_number, \
    created_at, updated_at, deleted_at";
const ENROLLMENT_COLUMNS: &str = "id, person_id, course_id, enrolled_at, completed_at, notes, \
    created_at, updated_at, deleted_at";
const ASSISTANCE_COLUMNS: &str = "id, person_id, assistance_type_id, received_at, quantity, \
    value_cents, notes, created_at, updated_at, deleted_at";
const DOCUMENT_COLUMNS: &str = "id, person_id, type, file_url, file_name, mime_type, created_at, \
    updated_at, deleted_at";

/// Appends `, column = $n` to an UPDATE being built.
macro_rules! push_set {
    ($builder:expr, $column:literal, $value:expr) => {
        $builder.push(concat!(", ", $column, " = ")).push_bind($value);
    };
}

/// Organization joined with the caller's membership row.
#[derive(FromRow)]
struct MembershipRow {
    #[sqlx(flatten)]
    organization: Organization,
    membership_id: Uuid,
    role: Role,
    user_id: Uuid,
}

#[derive(FromRow)]
struct InviteRow {
    id: Uuid,
    role: Role,
    email: String,
    created_at: DateTime<Utc>,
    author_id: Option<Uuid>,
    author_name: Option<String>,
    #[sqlx(default)]
    organization_name: Option<String>,
}

impl InviteRow {
    fn author(&self) -> Option<InviteAuthor> {
        self.author_id.map(|id| InviteAuthor {
            id,
            name: self.author_name.clone(),
        })
    }
}

impl From<InviteRow> for OrganizationInvite {
    fn from(row: InviteRow) -> Self {
        Self {
            author: row.author(),
            id: row.id,
            role: row.role,
            email: row.email,
            created_at: row.created_at,
        }
    }
}

impl From<InviteRow> for PendingInvite {
    fn from(row: InviteRow) -> Self {
        Self {
            author: row.author(),
            id: row.id,
            role: row.role,
            email: row.email,
            created_at: row.created_at,
            organization: InviteOrganization {
                name: row.organization_name.unwrap_or_default(),
            },
        }
    }
}

/// Makes `term` match literally inside an `ILIKE ... ESCAPE '\'` pattern.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// PostgresRepository
///
/// The production `Repository`, backed by a shared `PgPool`. Queries are built at
/// runtime (`query_as`, `QueryBuilder`) so the crate compiles without a live database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Whether another live person in the organization already uses `value` in `column`.
    async fn live_person_with(
        &self,
        column: &'static str,
        organization_id: Uuid,
        value: &str,
        exclude: Option<Uuid>,
    ) -> RepoResult<bool> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT EXISTS (SELECT 1 FROM persons WHERE deleted_at IS NULL AND organization_id = ",
        );
        builder.push_bind(organization_id);
        builder.push(" AND ").push(column).push(" = ").push_bind(value.to_string());
        if let Some(id) = exclude {
            builder.push(" AND id <> ").push_bind(id);
        }
        builder.push(")");

        let exists = builder
            .build_query_scalar::<bool>()
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT id, name, email FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// create_organization
    ///
    /// Organization row and OWNER membership share one transaction; a slug collision
    /// rolls both back and surfaces as `organizations_slug_key`.
    async fn create_organization(
        &self,
        owner_id: Uuid,
        req: &CreateOrganizationRequest,
    ) -> RepoResult<Uuid> {
        let organization_id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO organizations (id, name, slug, description, created_by_id) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(organization_id)
        .bind(&req.name)
        .bind(&req.slug)
        .bind(&req.description)
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO memberships (id, role, user_id, organization_id) VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(Role::Owner)
        .bind(owner_id)
        .bind(organization_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(organization_id)
    }

    async fn get_organization_by_slug(&self, slug: &str) -> RepoResult<Option<Organization>> {
        let sql = format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations o \
             WHERE o.slug = $1 AND o.deleted_at IS NULL"
        );
        let org = sqlx::query_as::<_, Organization>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(org)
    }

    async fn list_organizations_for_user(
        &self,
        user_id: Uuid,
    ) -> RepoResult<Vec<OrganizationSummary>> {
        let orgs = sqlx::query_as::<_, OrganizationSummary>(
            "SELECT o.id, o.name, o.slug, o.description FROM organizations o \
             JOIN memberships m ON m.organization_id = o.id \
             WHERE m.user_id = $1 AND o.deleted_at IS NULL \
             ORDER BY o.name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(orgs)
    }

    /// get_membership
    ///
    /// One round trip: live organization by slug joined with the user's membership.
    /// A missing organization and a missing membership are deliberately the same `None`.
    async fn get_membership(
        &self,
        user_id: Uuid,
        slug: &str,
    ) -> RepoResult<Option<(Organization, Membership)>> {
        let sql = format!(
            "SELECT {ORGANIZATION_COLUMNS}, m.id AS membership_id, m.role, m.user_id \
             FROM memberships m JOIN organizations o ON o.id = m.organization_id \
             WHERE m.user_id = $1 AND o.slug = $2 AND o.deleted_at IS NULL"
        );
        let row = sqlx::query_as::<_, MembershipRow>(&sql)
            .bind(user_id)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| {
            let membership = Membership {
                id: row.membership_id,
                role: row.role,
                user_id: row.user_id,
                organization_id: row.organization.id,
            };
            (row.organization, membership)
        }))
    }

    async fn member_email_exists(&self, organization_id: Uuid, email: &str) -> RepoResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM memberships m JOIN users u ON u.id = m.user_id \
             WHERE m.organization_id = $1 AND u.email = $2)",
        )
        .bind(organization_id)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create_invite(
        &self,
        organization_id: Uuid,
        author_id: Uuid,
        email: &str,
        role: Role,
    ) -> RepoResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO invites (id, email, role, organization_id, author_id) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(email)
        .bind(role)
        .bind(organization_id)
        .bind(author_id)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn get_invite(&self, id: Uuid) -> RepoResult<Option<Invite>> {
        let invite = sqlx::query_as::<_, Invite>(
            "SELECT id, email, role, organization_id, author_id, created_at \
             FROM invites WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(invite)
    }

    async fn find_invite_by_email(
        &self,
        organization_id: Uuid,
        email: &str,
    ) -> RepoResult<Option<Invite>> {
        let invite = sqlx::query_as::<_, Invite>(
            "SELECT id, email, role, organization_id, author_id, created_at \
             FROM invites WHERE organization_id = $1 AND email = $2",
        )
        .bind(organization_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(invite)
    }

    async fn list_invites(&self, organization_id: Uuid) -> RepoResult<Vec<OrganizationInvite>> {
        let rows = sqlx::query_as::<_, InviteRow>(
            "SELECT i.id, i.role, i.email, i.created_at, u.id AS author_id, u.name AS author_name \
             FROM invites i LEFT JOIN users u ON u.id = i.author_id \
             WHERE i.organization_id = $1 \
             ORDER BY i.created_at DESC",
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(OrganizationInvite::from).collect())
    }

    async fn list_pending_invites(&self, email: &str) -> RepoResult<Vec<PendingInvite>> {
        let rows = sqlx::query_as::<_, InviteRow>(
            "SELECT i.id, i.role, i.email, i.created_at, u.id AS author_id, \
             u.name AS author_name, o.name AS organization_name \
             FROM invites i \
             JOIN organizations o ON o.id = i.organization_id AND o.deleted_at IS NULL \
             LEFT JOIN users u ON u.id = i.author_id \
             WHERE i.email = $1 \
             ORDER BY i.created_at DESC",
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(PendingInvite::from).collect())
    }

    async fn delete_invite(&self, id: Uuid) -> RepoResult<()> {
        sqlx::query("DELETE FROM invites WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn accept_invite(&self, invite: &Invite, user_id: Uuid) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO memberships (id, role, user_id, organization_id) VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(invite.role)
        .bind(user_id)
        .bind(invite.organization_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM invites WHERE id = $1")
            .bind(invite.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// list_persons
    ///
    /// Search is a case-insensitive substring match over name, CPF, phone and parents.
    async fn list_persons(
        &self,
        organization_id: Uuid,
        filter: &PersonFilter,
    ) -> RepoResult<Vec<Person>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT ");
        builder.push(PERSON_COLUMNS);
        builder.push(" FROM persons WHERE deleted_at IS NULL AND organization_id = ");
        builder.push_bind(organization_id);

        if let Some(term) = filter.search_term() {
            let pattern = format!("%{}%", escape_like(term));
            builder.push(" AND (");
            {
                let mut any = builder.separated(" OR ");
                for column in ["full_name", "cpf", "phone_number", "father_name", "mother_name"] {
                    any.push(column);
                    any.push_unseparated(" ILIKE ");
                    any.push_bind_unseparated(pattern.clone());
                    any.push_unseparated(" ESCAPE '\\'");
                }
            }
            builder.push(")");
        }

        builder.push(" ORDER BY full_name ASC");

        if let Some((limit, offset)) = filter.page_window() {
            builder.push(" LIMIT ").push_bind(limit);
            builder.push(" OFFSET ").push_bind(offset);
        }

        let persons = builder
            .build_query_as::<Person>()
            .fetch_all(&self.pool)
            .await?;
        Ok(persons)
    }

    async fn get_person(&self, organization_id: Uuid, id: Uuid) -> RepoResult<Option<Person>> {
        let sql = format!(
            "SELECT {PERSON_COLUMNS} FROM persons \
             WHERE id = $1 AND organization_id = $2 AND deleted_at IS NULL"
        );
        let person = sqlx::query_as::<_, Person>(&sql)
            .bind(id)
            .bind(organization_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(person)
    }

    async fn find_person_conflicts(
        &self,
        organization_id: Uuid,
        cpf: Option<&str>,
        nis: Option<&str>,
        exclude: Option<Uuid>,
    ) -> RepoResult<PersonConflicts> {
        let mut conflicts = PersonConflicts::default();
        if let Some(cpf) = cpf {
            conflicts.cpf = self
                .live_person_with("cpf", organization_id, cpf, exclude)
                .await?;
        }
        if let Some(nis) = nis {
            conflicts.nis = self
                .live_person_with("nis", organization_id, nis, exclude)
                .await?;
        }
        Ok(conflicts)
    }

    async fn create_person(
        &self,
        organization_id: Uuid,
        req: &CreatePersonRequest,
    ) -> RepoResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO persons (id, organization_id, full_name, cpf, birth_date, phone_number, \
             father_name, mother_name, education_level, receives_bolsa_familia, nis) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(id)
        .bind(organization_id)
        .bind(&req.full_name)
        .bind(&req.cpf)
        .bind(req.birth_date)
        .bind(&req.phone_number)
        .bind(&req.father_name)
        .bind(&req.mother_name)
        .bind(req.education_level)
        .bind(req.receives_bolsa_familia)
        .bind(&req.nis)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    /// update_person
    ///
    /// Only fields present in the request are written; `Some(None)` writes NULL.
    async fn update_person(&self, id: Uuid, req: &UpdatePersonRequest) -> RepoResult<()> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE persons SET updated_at = NOW()");
        if let Some(v) = &req.full_name {
            push_set!(builder, "full_name", v.clone());
        }
        if let Some(v) = &req.cpf {
            push_set!(builder, "cpf", v.clone());
        }
        if let Some(v) = req.birth_date {
            push_set!(builder, "birth_date", v);
        }
        if let Some(v) = &req.phone_number {
            push_set!(builder, "phone_number", v.clone());
        }
        if let Some(v) = &req.father_name {
            push_set!(builder, "father_name", v.clone());
        }
        if let Some(v) = &req.mother_name {
            push_set!(builder, "mother_name", v.clone());
        }
        if let Some(v) = req.education_level {
            push_set!(builder, "education_level", v);
        }
        if let Some(v) = req.receives_bolsa_familia {
            push_set!(builder, "receives_bolsa_familia", v);
        }
        if let Some(v) = &req.nis {
            push_set!(builder, "nis", v.clone());
        }
        builder.push(" WHERE id = ").push_bind(id);
        builder.push(" AND deleted_at IS NULL");

        builder.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn get_address(&self, person_id: Uuid) -> RepoResult<Option<Address>> {
        let sql = format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE person_id = $1 AND deleted_at IS NULL"
        );
        let address = sqlx::query_as::<_, Address>(&sql)
            .bind(person_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(address)
    }

    async fn create_address(
        &self,
        person_id: Uuid,
        req: &CreateAddressRequest,
    ) -> RepoResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO addresses (id, person_id, cep, neighborhood, street, number, complement) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(id)
        .bind(person_id)
        .bind(&req.cep)
        .bind(&req.neighborhood)
        .bind(&req.street)
        .bind(&req.number)
        .bind(&req.complement)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update_address(&self, id: Uuid, req: &UpdateAddressRequest) -> RepoResult<()> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE addresses SET updated_at = NOW()");
        if let Some(v) = &req.cep {
            push_set!(builder, "cep", v.clone());
        }
        if let Some(v) = &req.neighborhood {
            push_set!(builder, "neighborhood", v.clone());
        }
        if let Some(v) = &req.street {
            push_set!(builder, "street", v.clone());
        }
        if let Some(v) = &req.number {
            push_set!(builder, "number", v.clone());
        }
        if let Some(v) = &req.complement {
            push_set!(builder, "complement", v.clone());
        }
        builder.push(" WHERE id = ").push_bind(id);
        builder.push(" AND deleted_at IS NULL");

        builder.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn list_relatives(&self, person_id: Uuid) -> RepoResult<Vec<Relative>> {
        let sql = format!(
            "SELECT {RELATIVE_COLUMNS} FROM person_relatives \
             WHERE person_id = $1 AND deleted_at IS NULL ORDER BY relative_name ASC"
        );
        let relatives = sqlx::query_as::<_, Relative>(&sql)
            .bind(person_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(relatives)
    }

    async fn get_relative(&self, person_id: Uuid, id: Uuid) -> RepoResult<Option<Relative>> {
        let sql = format!(
            "SELECT {RELATIVE_COLUMNS} FROM person_relatives \
             WHERE id = $1 AND person_id = $2 AND deleted_at IS NULL"
        );
        let relative = sqlx::query_as::<_, Relative>(&sql)
            .bind(id)
            .bind(person_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(relative)
    }

    async fn create_relative(
        &self,
        person_id: Uuid,
        req: &CreateRelativeRequest,
    ) -> RepoResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO person_relatives (id, person_id, relative_name, degree, degree_text, \
             phone_number) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(person_id)
        .bind(&req.relative_name)
        .bind(req.degree)
        .bind(&req.degree_text)
        .bind(&req.phone_number)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update_relative(&self, id: Uuid, req: &UpdateRelativeRequest) -> RepoResult<()> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE person_relatives SET updated_at = NOW()");
        if let Some(v) = &req.relative_name {
            push_set!(builder, "relative_name", v.clone());
        }
        if let Some(v) = req.degree {
            push_set!(builder, "degree", v);
        }
        if let Some(v) = &req.degree_text {
            push_set!(builder, "degree_text", v.clone());
        }
        if let Some(v) = &req.phone_number {
            push_set!(builder, "phone_number", v.clone());
        }
        builder.push(" WHERE id = ").push_bind(id);
        builder.push(" AND deleted_at IS NULL");

        builder.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn list_courses(&self) -> RepoResult<Vec<Course>> {
        let courses = sqlx::query_as::<_, Course>(
            "SELECT id, title, description FROM courses WHERE deleted_at IS NULL ORDER BY title",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(courses)
    }

    async fn get_course(&self, id: Uuid) -> RepoResult<Option<Course>> {
        let course = sqlx::query_as::<_, Course>(
            "SELECT id, title, description FROM courses WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(course)
    }

    async fn list_enrollments(&self, person_id: Uuid) -> RepoResult<Vec<Enrollment>> {
        let sql = format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM person_courses \
             WHERE person_id = $1 AND deleted_at IS NULL ORDER BY enrolled_at DESC"
        );
        let enrollments = sqlx::query_as::<_, Enrollment>(&sql)
            .bind(person_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(enrollments)
    }

    async fn get_enrollment(&self, person_id: Uuid, id: Uuid) -> RepoResult<Option<Enrollment>> {
        let sql = format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM person_courses \
             WHERE id = $1 AND person_id = $2 AND deleted_at IS NULL"
        );
        let enrollment = sqlx::query_as::<_, Enrollment>(&sql)
            .bind(id)
            .bind(person_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(enrollment)
    }

    async fn find_enrollment_by_course(
        &self,
        person_id: Uuid,
        course_id: Uuid,
    ) -> RepoResult<Option<Enrollment>> {
        let sql = format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM person_courses \
             WHERE person_id = $1 AND course_id = $2 AND deleted_at IS NULL"
        );
        let enrollment = sqlx::query_as::<_, Enrollment>(&sql)
            .bind(person_id)
            .bind(course_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(enrollment)
    }

    async fn create_enrollment(
        &self,
        person_id: Uuid,
        req: &CreateEnrollmentRequest,
    ) -> RepoResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO person_courses (id, person_id, course_id, notes) VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(person_id)
        .bind(req.course_id)
        .bind(&req.notes)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update_enrollment(&self, id: Uuid, req: &UpdateEnrollmentRequest) -> RepoResult<()> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE person_courses SET updated_at = NOW()");
        if let Some(v) = req.completed_at {
            push_set!(builder, "completed_at", v);
        }
        if let Some(v) = &req.notes {
            push_set!(builder, "notes", v.clone());
        }
        builder.push(" WHERE id = ").push_bind(id);
        builder.push(" AND deleted_at IS NULL");

        builder.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn list_assistance_types(&self) -> RepoResult<Vec<AssistanceType>> {
        let types = sqlx::query_as::<_, AssistanceType>(
            "SELECT id, name, description FROM assistance_types \
             WHERE deleted_at IS NULL ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(types)
    }

    async fn get_assistance_type(&self, id: Uuid) -> RepoResult<Option<AssistanceType>> {
        let assistance_type = sqlx::query_as::<_, AssistanceType>(
            "SELECT id, name, description FROM assistance_types \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(assistance_type)
    }

    async fn list_assistances(&self, person_id: Uuid) -> RepoResult<Vec<Assistance>> {
        let sql = format!(
            "SELECT {ASSISTANCE_COLUMNS} FROM person_assistances \
             WHERE person_id = $1 AND deleted_at IS NULL ORDER BY received_at DESC"
        );
        let assistances = sqlx::query_as::<_, Assistance>(&sql)
            .bind(person_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(assistances)
    }

    async fn get_assistance(&self, person_id: Uuid, id: Uuid) -> RepoResult<Option<Assistance>> {
        let sql = format!(
            "SELECT {ASSISTANCE_COLUMNS} FROM person_assistances \
             WHERE id = $1 AND person_id = $2 AND deleted_at IS NULL"
        );
        let assistance = sqlx::query_as::<_, Assistance>(&sql)
            .bind(id)
            .bind(person_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(assistance)
    }

    async fn create_assistance(
        &self,
        person_id: Uuid,
        req: &CreateAssistanceRequest,
    ) -> RepoResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO person_assistances (id, person_id, assistance_type_id, received_at, \
             quantity, value_cents, notes) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(id)
        .bind(person_id)
        .bind(req.assistance_type_id)
        .bind(req.received_at.unwrap_or_else(Utc::now))
        .bind(req.quantity)
        .bind(req.value_cents)
        .bind(&req.notes)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update_assistance(&self, id: Uuid, req: &UpdateAssistanceRequest) -> RepoResult<()> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE person_assistances SET updated_at = NOW()");
        if let Some(v) = req.received_at {
            push_set!(builder, "received_at", v);
        }
        if let Some(v) = req.quantity {
            push_set!(builder, "quantity", v);
        }
        if let Some(v) = req.value_cents {
            push_set!(builder, "value_cents", v);
        }
        if let Some(v) = &req.notes {
            push_set!(builder, "notes", v.clone());
        }
        builder.push(" WHERE id = ").push_bind(id);
        builder.push(" AND deleted_at IS NULL");

        builder.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn list_documents(&self, person_id: Uuid) -> RepoResult<Vec<Document>> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM person_documents \
             WHERE person_id = $1 AND deleted_at IS NULL ORDER BY created_at DESC"
        );
        let documents = sqlx::query_as::<_, Document>(&sql)
            .bind(person_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(documents)
    }

    async fn get_document(&self, person_id: Uuid, id: Uuid) -> RepoResult<Option<Document>> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM person_documents \
             WHERE id = $1 AND person_id = $2 AND deleted_at IS NULL"
        );
        let document = sqlx::query_as::<_, Document>(&sql)
            .bind(id)
            .bind(person_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(document)
    }

    async fn latest_document(
        &self,
        person_id: Uuid,
        document_type: DocumentType,
    ) -> RepoResult<Option<Document>> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM person_documents \
             WHERE person_id = $1 AND type = $2 AND deleted_at IS NULL \
             ORDER BY created_at DESC LIMIT 1"
        );
        let document = sqlx::query_as::<_, Document>(&sql)
            .bind(person_id)
            .bind(document_type)
            .fetch_optional(&self.pool)
            .await?;
        Ok(document)
    }

    async fn create_document(
        &self,
        person_id: Uuid,
        req: &CreateDocumentRequest,
    ) -> RepoResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO person_documents (id, person_id, type, file_url, file_name, mime_type) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(person_id)
        .bind(req.document_type)
        .bind(&req.file_url)
        .bind(&req.file_name)
        .bind(&req.mime_type)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update_document(&self, id: Uuid, req: &UpdateDocumentRequest) -> RepoResult<()> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE person_documents SET updated_at = NOW()");
        if let Some(v) = req.document_type {
            push_set!(builder, "type", v);
        }
        if let Some(v) = &req.file_url {
            push_set!(builder, "file_url", v.clone());
        }
        if let Some(v) = &req.file_name {
            push_set!(builder, "file_name", v.clone());
        }
        if let Some(v) = &req.mime_type {
            push_set!(builder, "mime_type", v.clone());
        }
        builder.push(" WHERE id = ").push_bind(id);
        builder.push(" AND deleted_at IS NULL");

        builder.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn soft_delete(&self, resource: SoftDeletable, id: Uuid) -> RepoResult<bool> {
        let sql = format!(
            "UPDATE {} SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
            resource.table()
        );
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
