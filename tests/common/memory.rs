use std::{
    cmp::Reverse,
    sync::atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use case_portal::{
    error::RepoError,
    models::{
        Address, Assistance, AssistanceType, Course, CreateAddressRequest,
        CreateAssistanceRequest, CreateDocumentRequest, CreateEnrollmentRequest,
        CreateOrganizationRequest, CreatePersonRequest, CreateRelativeRequest, Document,
        DocumentType, Enrollment, Invite, InviteAuthor, InviteOrganization, Membership,
        Organization, OrganizationInvite, OrganizationSummary, PendingInvite, Person,
        PersonFilter, Relative, Role, UpdateAddressRequest, UpdateAssistanceRequest,
        UpdateDocumentRequest, UpdateEnrollmentRequest, UpdatePersonRequest,
        UpdateRelativeRequest, User,
    },
    repository::{PersonConflicts, RepoResult, Repository, SoftDeletable, constraints},
};

/// A lookup row plus its soft-delete marker.
struct Lookup<T> {
    row: T,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct Store {
    users: Vec<User>,
    organizations: Vec<Organization>,
    memberships: Vec<Membership>,
    invites: Vec<Invite>,
    persons: Vec<Person>,
    addresses: Vec<Address>,
    relatives: Vec<Relative>,
    courses: Vec<Lookup<Course>>,
    enrollments: Vec<Enrollment>,
    assistance_types: Vec<Lookup<AssistanceType>>,
    assistances: Vec<Assistance>,
    documents: Vec<Document>,
}

impl Store {
    fn live_person_with<F>(&self, organization_id: Uuid, exclude: Option<Uuid>, matches: F) -> bool
    where
        F: Fn(&Person) -> bool,
    {
        self.persons.iter().any(|p| {
            p.deleted_at.is_none()
                && p.organization_id == organization_id
                && Some(p.id) != exclude
                && matches(p)
        })
    }

    /// The unique indexes of `persons`, checked against the row as it would be stored.
    fn check_person_unique(&self, candidate: &Person) -> RepoResult<()> {
        let exclude = Some(candidate.id);
        if self.live_person_with(candidate.organization_id, exclude, |p| p.cpf == candidate.cpf) {
            return Err(RepoError::UniqueViolation(constraints::PERSON_CPF.into()));
        }
        if let Some(nis) = &candidate.nis {
            if self.live_person_with(candidate.organization_id, exclude, |p| {
                p.nis.as_ref() == Some(nis)
            }) {
                return Err(RepoError::UniqueViolation(constraints::PERSON_NIS.into()));
            }
        }
        Ok(())
    }

    fn author_of(&self, invite: &Invite) -> Option<InviteAuthor> {
        invite.author_id.map(|id| InviteAuthor {
            id,
            name: self.users.iter().find(|u| u.id == id).map(|u| u.name.clone()),
        })
    }

    fn insert_membership(&mut self, membership: Membership) -> RepoResult<()> {
        let taken = self.memberships.iter().any(|m| {
            m.organization_id == membership.organization_id && m.user_id == membership.user_id
        });
        if taken {
            return Err(RepoError::UniqueViolation(constraints::MEMBERSHIP_ORG_USER.into()));
        }
        self.memberships.push(membership);
        Ok(())
    }
}

/// Newest first; rows stamped with the same instant keep reverse insertion order.
fn newest_first<T, K: Ord>(rows: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    let mut rows: Vec<T> = rows.into_iter().rev().collect();
    rows.sort_by_key(|row| Reverse(key(row)));
    rows
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle))
}

/// InMemoryRepository
///
/// A `Repository` held entirely in process memory, with the same soft-delete filtering,
/// ordering and unique-index behavior as the Postgres implementation. The handler, router
/// and auth tests run against it.
///
/// Users, courses and assistance types are owned by other systems, so they are seeded
/// through the `insert_*` helpers instead of the trait.
#[derive(Default)]
pub struct InMemoryRepository {
    store: RwLock<Store>,
    delete_race: AtomicBool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, name: &str, email: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
        };
        self.store.write().await.users.push(user.clone());
        user
    }

    pub async fn insert_course(&self, title: &str) -> Course {
        let course = Course {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: None,
        };
        self.store.write().await.courses.push(Lookup {
            row: course.clone(),
            deleted_at: None,
        });
        course
    }

    pub async fn insert_assistance_type(&self, name: &str) -> AssistanceType {
        let assistance_type = AssistanceType {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
        };
        self.store.write().await.assistance_types.push(Lookup {
            row: assistance_type.clone(),
            deleted_at: None,
        });
        assistance_type
    }

    /// Retires a course so it no longer accepts enrollments.
    pub async fn retire_course(&self, id: Uuid) {
        let mut store = self.store.write().await;
        if let Some(course) = store.courses.iter_mut().find(|c| c.row.id == id) {
            course.deleted_at = Some(Utc::now());
        }
    }

    /// Raw row access for assertions, soft-deleted persons included.
    pub async fn person_row(&self, id: Uuid) -> Option<Person> {
        self.store.read().await.persons.iter().find(|p| p.id == id).cloned()
    }

    /// The next `soft_delete` behaves as if a concurrent request deleted the row between
    /// the caller's read and its write.
    pub fn lose_next_delete_race(&self) {
        self.delete_race.store(true, Ordering::SeqCst);
    }

    pub async fn membership_count(&self, organization_id: Uuid) -> usize {
        self.store
            .read()
            .await
            .memberships
            .iter()
            .filter(|m| m.organization_id == organization_id)
            .count()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_organization(
        &self,
        owner_id: Uuid,
        req: &CreateOrganizationRequest,
    ) -> RepoResult<Uuid> {
        let mut store = self.store.write().await;
        if store.organizations.iter().any(|o| o.slug == req.slug) {
            return Err(RepoError::UniqueViolation(constraints::ORGANIZATION_SLUG.into()));
        }

        let now = Utc::now();
        let organization = Organization {
            id: Uuid::new_v4(),
            name: req.name.clone(),
            slug: req.slug.clone(),
            description: req.description.clone(),
            created_by_id: owner_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let id = organization.id;
        store.organizations.push(organization);
        store.insert_membership(Membership {
            id: Uuid::new_v4(),
            role: Role::Owner,
            user_id: owner_id,
            organization_id: id,
        })?;
        Ok(id)
    }

    async fn get_organization_by_slug(&self, slug: &str) -> RepoResult<Option<Organization>> {
        let store = self.store.read().await;
        Ok(store
            .organizations
            .iter()
            .find(|o| o.slug == slug && o.deleted_at.is_none())
            .cloned())
    }

    async fn list_organizations_for_user(
        &self,
        user_id: Uuid,
    ) -> RepoResult<Vec<OrganizationSummary>> {
        let store = self.store.read().await;
        let mut orgs: Vec<OrganizationSummary> = store
            .organizations
            .iter()
            .filter(|o| o.deleted_at.is_none())
            .filter(|o| {
                store
                    .memberships
                    .iter()
                    .any(|m| m.organization_id == o.id && m.user_id == user_id)
            })
            .cloned()
            .map(OrganizationSummary::from)
            .collect();
        orgs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(orgs)
    }

    async fn get_membership(
        &self,
        user_id: Uuid,
        slug: &str,
    ) -> RepoResult<Option<(Organization, Membership)>> {
        let store = self.store.read().await;
        let Some(org) = store
            .organizations
            .iter()
            .find(|o| o.slug == slug && o.deleted_at.is_none())
        else {
            return Ok(None);
        };
        Ok(store
            .memberships
            .iter()
            .find(|m| m.organization_id == org.id && m.user_id == user_id)
            .map(|m| (org.clone(), m.clone())))
    }

    async fn member_email_exists(&self, organization_id: Uuid, email: &str) -> RepoResult<bool> {
        let store = self.store.read().await;
        Ok(store.memberships.iter().any(|m| {
            m.organization_id == organization_id
                && store
                    .users
                    .iter()
                    .any(|u| u.id == m.user_id && u.email == email)
        }))
    }

    async fn create_invite(
        &self,
        organization_id: Uuid,
        author_id: Uuid,
        email: &str,
        role: Role,
    ) -> RepoResult<Uuid> {
        let mut store = self.store.write().await;
        if store
            .invites
            .iter()
            .any(|i| i.organization_id == organization_id && i.email == email)
        {
            return Err(RepoError::UniqueViolation(constraints::INVITE_EMAIL_ORG.into()));
        }
        let invite = Invite {
            id: Uuid::new_v4(),
            email: email.to_string(),
            role,
            organization_id,
            author_id: Some(author_id),
            created_at: Utc::now(),
        };
        let id = invite.id;
        store.invites.push(invite);
        Ok(id)
    }

    async fn get_invite(&self, id: Uuid) -> RepoResult<Option<Invite>> {
        let store = self.store.read().await;
        Ok(store.invites.iter().find(|i| i.id == id).cloned())
    }

    async fn find_invite_by_email(
        &self,
        organization_id: Uuid,
        email: &str,
    ) -> RepoResult<Option<Invite>> {
        let store = self.store.read().await;
        Ok(store
            .invites
            .iter()
            .find(|i| i.organization_id == organization_id && i.email == email)
            .cloned())
    }

    async fn list_invites(&self, organization_id: Uuid) -> RepoResult<Vec<OrganizationInvite>> {
        let store = self.store.read().await;
        let invites: Vec<&Invite> = store
            .invites
            .iter()
            .filter(|i| i.organization_id == organization_id)
            .collect();
        Ok(newest_first(invites, |i| i.created_at)
            .into_iter()
            .map(|i| OrganizationInvite {
                id: i.id,
                role: i.role,
                email: i.email.clone(),
                created_at: i.created_at,
                author: store.author_of(i),
            })
            .collect())
    }

    async fn list_pending_invites(&self, email: &str) -> RepoResult<Vec<PendingInvite>> {
        let store = self.store.read().await;
        let invites: Vec<(&Invite, &Organization)> = store
            .invites
            .iter()
            .filter(|i| i.email == email)
            .filter_map(|i| {
                store
                    .organizations
                    .iter()
                    .find(|o| o.id == i.organization_id && o.deleted_at.is_none())
                    .map(|o| (i, o))
            })
            .collect();
        Ok(newest_first(invites, |(i, _)| i.created_at)
            .into_iter()
            .map(|(i, org)| PendingInvite {
                id: i.id,
                role: i.role,
                email: i.email.clone(),
                created_at: i.created_at,
                organization: InviteOrganization {
                    name: org.name.clone(),
                },
                author: store.author_of(i),
            })
            .collect())
    }

    async fn delete_invite(&self, id: Uuid) -> RepoResult<()> {
        self.store.write().await.invites.retain(|i| i.id != id);
        Ok(())
    }

    async fn accept_invite(&self, invite: &Invite, user_id: Uuid) -> RepoResult<()> {
        let mut store = self.store.write().await;
        store.insert_membership(Membership {
            id: Uuid::new_v4(),
            role: invite.role,
            user_id,
            organization_id: invite.organization_id,
        })?;
        store.invites.retain(|i| i.id != invite.id);
        Ok(())
    }

    async fn list_persons(
        &self,
        organization_id: Uuid,
        filter: &PersonFilter,
    ) -> RepoResult<Vec<Person>> {
        let store = self.store.read().await;
        let term = filter.search_term().map(str::to_lowercase);
        let mut persons: Vec<Person> = store
            .persons
            .iter()
            .filter(|p| p.organization_id == organization_id && p.deleted_at.is_none())
            .filter(|p| match &term {
                Some(term) => {
                    contains_ci(Some(p.full_name.as_str()), term)
                        || contains_ci(Some(p.cpf.as_str()), term)
                        || contains_ci(p.phone_number.as_deref(), term)
                        || contains_ci(p.father_name.as_deref(), term)
                        || contains_ci(p.mother_name.as_deref(), term)
                }
                None => true,
            })
            .cloned()
            .collect();
        persons.sort_by(|a, b| a.full_name.cmp(&b.full_name));

        if let Some((limit, offset)) = filter.page_window() {
            persons = persons
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect();
        }
        Ok(persons)
    }

    async fn get_person(&self, organization_id: Uuid, id: Uuid) -> RepoResult<Option<Person>> {
        let store = self.store.read().await;
        Ok(store
            .persons
            .iter()
            .find(|p| p.id == id && p.organization_id == organization_id && p.deleted_at.is_none())
            .cloned())
    }

    async fn find_person_conflicts(
        &self,
        organization_id: Uuid,
        cpf: Option<&str>,
        nis: Option<&str>,
        exclude: Option<Uuid>,
    ) -> RepoResult<PersonConflicts> {
        let store = self.store.read().await;
        Ok(PersonConflicts {
            cpf: cpf.is_some_and(|cpf| {
                store.live_person_with(organization_id, exclude, |p| p.cpf == cpf)
            }),
            nis: nis.is_some_and(|nis| {
                store.live_person_with(organization_id, exclude, |p| p.nis.as_deref() == Some(nis))
            }),
        })
    }

    async fn create_person(
        &self,
        organization_id: Uuid,
        req: &CreatePersonRequest,
    ) -> RepoResult<Uuid> {
        let mut store = self.store.write().await;
        let now = Utc::now();
        let person = Person {
            id: Uuid::new_v4(),
            organization_id,
            full_name: req.full_name.clone(),
            cpf: req.cpf.clone(),
            birth_date: req.birth_date,
            phone_number: req.phone_number.clone(),
            father_name: req.father_name.clone(),
            mother_name: req.mother_name.clone(),
            education_level: req.education_level,
            receives_bolsa_familia: req.receives_bolsa_familia,
            nis: req.nis.clone(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        store.check_person_unique(&person)?;
        let id = person.id;
        store.persons.push(person);
        Ok(id)
    }

    async fn update_person(&self, id: Uuid, req: &UpdatePersonRequest) -> RepoResult<()> {
        let mut store = self.store.write().await;
        let Some(current) = store
            .persons
            .iter()
            .find(|p| p.id == id && p.deleted_at.is_none())
            .cloned()
        else {
            return Ok(());
        };

        let mut next = current;
        if let Some(v) = &req.full_name {
            next.full_name = v.clone();
        }
        if let Some(v) = &req.cpf {
            next.cpf = v.clone();
        }
        if let Some(v) = req.birth_date {
            next.birth_date = v;
        }
        if let Some(v) = &req.phone_number {
            next.phone_number = v.clone();
        }
        if let Some(v) = &req.father_name {
            next.father_name = v.clone();
        }
        if let Some(v) = &req.mother_name {
            next.mother_name = v.clone();
        }
        if let Some(v) = req.education_level {
            next.education_level = v;
        }
        if let Some(v) = req.receives_bolsa_familia {
            next.receives_bolsa_familia = v;
        }
        if let Some(v) = &req.nis {
            next.nis = v.clone();
        }
        next.updated_at = Utc::now();

        store.check_person_unique(&next)?;
        if let Some(slot) = store.persons.iter_mut().find(|p| p.id == id) {
            *slot = next;
        }
        Ok(())
    }

    async fn get_address(&self, person_id: Uuid) -> RepoResult<Option<Address>> {
        let store = self.store.read().await;
        Ok(store
            .addresses
            .iter()
            .find(|a| a.person_id == person_id && a.deleted_at.is_none())
            .cloned())
    }

    async fn create_address(
        &self,
        person_id: Uuid,
        req: &CreateAddressRequest,
    ) -> RepoResult<Uuid> {
        let mut store = self.store.write().await;
        if store
            .addresses
            .iter()
            .any(|a| a.person_id == person_id && a.deleted_at.is_none())
        {
            return Err(RepoError::UniqueViolation(constraints::ADDRESS_PERSON.into()));
        }
        let now = Utc::now();
        let address = Address {
            id: Uuid::new_v4(),
            person_id,
            cep: req.cep.clone(),
            neighborhood: req.neighborhood.clone(),
            street: req.street.clone(),
            number: req.number.clone(),
            complement: req.complement.clone(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let id = address.id;
        store.addresses.push(address);
        Ok(id)
    }

    async fn update_address(&self, id: Uuid, req: &UpdateAddressRequest) -> RepoResult<()> {
        let mut store = self.store.write().await;
        if let Some(address) = store
            .addresses
            .iter_mut()
            .find(|a| a.id == id && a.deleted_at.is_none())
        {
            if let Some(v) = &req.cep {
                address.cep = v.clone();
            }
            if let Some(v) = &req.neighborhood {
                address.neighborhood = v.clone();
            }
            if let Some(v) = &req.street {
                address.street = v.clone();
            }
            if let Some(v) = &req.number {
                address.number = v.clone();
            }
            if let Some(v) = &req.complement {
                address.complement = v.clone();
            }
            address.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn list_relatives(&self, person_id: Uuid) -> RepoResult<Vec<Relative>> {
        let store = self.store.read().await;
        let mut relatives: Vec<Relative> = store
            .relatives
            .iter()
            .filter(|r| r.person_id == person_id && r.deleted_at.is_none())
            .cloned()
            .collect();
        relatives.sort_by(|a, b| a.relative_name.cmp(&b.relative_name));
        Ok(relatives)
    }

    async fn get_relative(&self, person_id: Uuid, id: Uuid) -> RepoResult<Option<Relative>> {
        let store = self.store.read().await;
        Ok(store
            .relatives
            .iter()
            .find(|r| r.id == id && r.person_id == person_id && r.deleted_at.is_none())
            .cloned())
    }

    async fn create_relative(
        &self,
        person_id: Uuid,
        req: &CreateRelativeRequest,
    ) -> RepoResult<Uuid> {
        let now = Utc::now();
        let relative = Relative {
            id: Uuid::new_v4(),
            person_id,
            relative_name: req.relative_name.clone(),
            degree: req.degree,
            degree_text: req.degree_text.clone(),
            phone_number: req.phone_number.clone(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let id = relative.id;
        self.store.write().await.relatives.push(relative);
        Ok(id)
    }

    async fn update_relative(&self, id: Uuid, req: &UpdateRelativeRequest) -> RepoResult<()> {
        let mut store = self.store.write().await;
        if let Some(relative) = store
            .relatives
            .iter_mut()
            .find(|r| r.id == id && r.deleted_at.is_none())
        {
            if let Some(v) = &req.relative_name {
                relative.relative_name = v.clone();
            }
            if let Some(v) = req.degree {
                relative.degree = v;
            }
            if let Some(v) = &req.degree_text {
                relative.degree_text = v.clone();
            }
            if let Some(v) = &req.phone_number {
                relative.phone_number = v.clone();
            }
            relative.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn list_courses(&self) -> RepoResult<Vec<Course>> {
        let store = self.store.read().await;
        let mut courses: Vec<Course> = store
            .courses
            .iter()
            .filter(|c| c.deleted_at.is_none())
            .map(|c| c.row.clone())
            .collect();
        courses.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(courses)
    }

    async fn get_course(&self, id: Uuid) -> RepoResult<Option<Course>> {
        let store = self.store.read().await;
        Ok(store
            .courses
            .iter()
            .find(|c| c.row.id == id && c.deleted_at.is_none())
            .map(|c| c.row.clone()))
    }

    async fn list_enrollments(&self, person_id: Uuid) -> RepoResult<Vec<Enrollment>> {
        let store = self.store.read().await;
        let enrollments: Vec<Enrollment> = store
            .enrollments
            .iter()
            .filter(|e| e.person_id == person_id && e.deleted_at.is_none())
            .cloned()
            .collect();
        Ok(newest_first(enrollments, |e| e.enrolled_at))
    }

    async fn get_enrollment(&self, person_id: Uuid, id: Uuid) -> RepoResult<Option<Enrollment>> {
        let store = self.store.read().await;
        Ok(store
            .enrollments
            .iter()
            .find(|e| e.id == id && e.person_id == person_id && e.deleted_at.is_none())
            .cloned())
    }

    async fn find_enrollment_by_course(
        &self,
        person_id: Uuid,
        course_id: Uuid,
    ) -> RepoResult<Option<Enrollment>> {
        let store = self.store.read().await;
        Ok(store
            .enrollments
            .iter()
            .find(|e| e.person_id == person_id && e.course_id == course_id && e.deleted_at.is_none())
            .cloned())
    }

    async fn create_enrollment(
        &self,
        person_id: Uuid,
        req: &CreateEnrollmentRequest,
    ) -> RepoResult<Uuid> {
        let mut store = self.store.write().await;
        if store.enrollments.iter().any(|e| {
            e.person_id == person_id && e.course_id == req.course_id && e.deleted_at.is_none()
        }) {
            return Err(RepoError::UniqueViolation(
                constraints::ENROLLMENT_PERSON_COURSE.into(),
            ));
        }
        let now = Utc::now();
        let enrollment = Enrollment {
            id: Uuid::new_v4(),
            person_id,
            course_id: req.course_id,
            enrolled_at: now,
            completed_at: None,
            notes: req.notes.clone(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let id = enrollment.id;
        store.enrollments.push(enrollment);
        Ok(id)
    }

    async fn update_enrollment(&self, id: Uuid, req: &UpdateEnrollmentRequest) -> RepoResult<()> {
        let mut store = self.store.write().await;
        if let Some(enrollment) = store
            .enrollments
            .iter_mut()
            .find(|e| e.id == id && e.deleted_at.is_none())
        {
            if let Some(v) = req.completed_at {
                enrollment.completed_at = v;
            }
            if let Some(v) = &req.notes {
                enrollment.notes = v.clone();
            }
            enrollment.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn list_assistance_types(&self) -> RepoResult<Vec<AssistanceType>> {
        let store = self.store.read().await;
        let mut types: Vec<AssistanceType> = store
            .assistance_types
            .iter()
            .filter(|t| t.deleted_at.is_none())
            .map(|t| t.row.clone())
            .collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(types)
    }

    async fn get_assistance_type(&self, id: Uuid) -> RepoResult<Option<AssistanceType>> {
        let store = self.store.read().await;
        Ok(store
            .assistance_types
            .iter()
            .find(|t| t.row.id == id && t.deleted_at.is_none())
            .map(|t| t.row.clone()))
    }

    async fn list_assistances(&self, person_id: Uuid) -> RepoResult<Vec<Assistance>> {
        let store = self.store.read().await;
        let assistances: Vec<Assistance> = store
            .assistances
            .iter()
            .filter(|a| a.person_id == person_id && a.deleted_at.is_none())
            .cloned()
            .collect();
        Ok(newest_first(assistances, |a| a.received_at))
    }

    async fn get_assistance(&self, person_id: Uuid, id: Uuid) -> RepoResult<Option<Assistance>> {
        let store = self.store.read().await;
        Ok(store
            .assistances
            .iter()
            .find(|a| a.id == id && a.person_id == person_id && a.deleted_at.is_none())
            .cloned())
    }

    async fn create_assistance(
        &self,
        person_id: Uuid,
        req: &CreateAssistanceRequest,
    ) -> RepoResult<Uuid> {
        let now = Utc::now();
        let assistance = Assistance {
            id: Uuid::new_v4(),
            person_id,
            assistance_type_id: req.assistance_type_id,
            received_at: req.received_at.unwrap_or(now),
            quantity: req.quantity,
            value_cents: req.value_cents,
            notes: req.notes.clone(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let id = assistance.id;
        self.store.write().await.assistances.push(assistance);
        Ok(id)
    }

    async fn update_assistance(&self, id: Uuid, req: &UpdateAssistanceRequest) -> RepoResult<()> {
        let mut store = self.store.write().await;
        if let Some(assistance) = store
            .assistances
            .iter_mut()
            .find(|a| a.id == id && a.deleted_at.is_none())
        {
            if let Some(v) = req.received_at {
                assistance.received_at = v;
            }
            if let Some(v) = req.quantity {
                assistance.quantity = v;
            }
            if let Some(v) = req.value_cents {
                assistance.value_cents = v;
            }
            if let Some(v) = &req.notes {
                assistance.notes = v.clone();
            }
            assistance.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn list_documents(&self, person_id: Uuid) -> RepoResult<Vec<Document>> {
        let store = self.store.read().await;
        let documents: Vec<Document> = store
            .documents
            .iter()
            .filter(|d| d.person_id == person_id && d.deleted_at.is_none())
            .cloned()
            .collect();
        Ok(newest_first(documents, |d| d.created_at))
    }

    async fn get_document(&self, person_id: Uuid, id: Uuid) -> RepoResult<Option<Document>> {
        let store = self.store.read().await;
        Ok(store
            .documents
            .iter()
            .find(|d| d.id == id && d.person_id == person_id && d.deleted_at.is_none())
            .cloned())
    }

    async fn latest_document(
        &self,
        person_id: Uuid,
        document_type: DocumentType,
    ) -> RepoResult<Option<Document>> {
        let documents = self.list_documents(person_id).await?;
        Ok(documents
            .into_iter()
            .find(|d| d.document_type == document_type))
    }

    async fn create_document(
        &self,
        person_id: Uuid,
        req: &CreateDocumentRequest,
    ) -> RepoResult<Uuid> {
        let now = Utc::now();
        let document = Document {
            id: Uuid::new_v4(),
            person_id,
            document_type: req.document_type,
            file_url: req.file_url.clone(),
            file_name: req.file_name.clone(),
            mime_type: req.mime_type.clone(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let id = document.id;
        self.store.write().await.documents.push(document);
        Ok(id)
    }

    async fn update_document(&self, id: Uuid, req: &UpdateDocumentRequest) -> RepoResult<()> {
        let mut store = self.store.write().await;
        if let Some(document) = store
            .documents
            .iter_mut()
            .find(|d| d.id == id && d.deleted_at.is_none())
        {
            if let Some(v) = req.document_type {
                document.document_type = v;
            }
            if let Some(v) = &req.file_url {
                document.file_url = v.clone();
            }
            if let Some(v) = &req.file_name {
                document.file_name = v.clone();
            }
            if let Some(v) = &req.mime_type {
                document.mime_type = v.clone();
            }
            document.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn soft_delete(&self, resource: SoftDeletable, id: Uuid) -> RepoResult<bool> {
        let mut store = self.store.write().await;
        let now = Some(Utc::now());
        if self.delete_race.swap(false, Ordering::SeqCst) {
            // Another writer gets there first.
            stamp_resource(&mut store, resource, id, now);
        }
        Ok(stamp_resource(&mut store, resource, id, now))
    }
}

fn stamp_resource(
    store: &mut Store,
    resource: SoftDeletable,
    id: Uuid,
    now: Option<DateTime<Utc>>,
) -> bool {
    match resource {
        SoftDeletable::Person => stamp(&mut store.persons, id, now, |r| (r.id, &mut r.deleted_at)),
        SoftDeletable::Address => stamp(&mut store.addresses, id, now, |r| (r.id, &mut r.deleted_at)),
        SoftDeletable::Relative => {
            stamp(&mut store.relatives, id, now, |r| (r.id, &mut r.deleted_at))
        }
        SoftDeletable::Enrollment => {
            stamp(&mut store.enrollments, id, now, |r| (r.id, &mut r.deleted_at))
        }
        SoftDeletable::Assistance => {
            stamp(&mut store.assistances, id, now, |r| (r.id, &mut r.deleted_at))
        }
        SoftDeletable::Document => {
            stamp(&mut store.documents, id, now, |r| (r.id, &mut r.deleted_at))
        }
    }
}

/// Sets `deleted_at` on the live row with `id`. Returns whether one was found.
fn stamp<T>(
    rows: &mut [T],
    id: Uuid,
    now: Option<DateTime<Utc>>,
    fields: impl Fn(&mut T) -> (Uuid, &mut Option<DateTime<Utc>>),
) -> bool {
    for row in rows.iter_mut() {
        let (row_id, deleted_at) = fields(row);
        if row_id == id && deleted_at.is_none() {
            *deleted_at = now;
            return true;
        }
    }
    false
}
