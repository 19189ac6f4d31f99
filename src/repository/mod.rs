use crate::{
    db::{DbConnection, DbPool, get_connection},
    domain::{
        lead::{Lead, NewLead, UpdateLead},
        types::{LeadId, UserId},
        user::{NewUser, User},
    },
    repository::errors::RepositoryResult,
};

pub mod errors;
pub mod lead;
#[cfg(feature = "test-mocks")]
pub mod mock;
pub mod user;

/// Diesel-backed repository sharing one connection pool across all traits.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool,
}

impl DieselRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(get_connection(&self.pool)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
}

impl Pagination {
    /// Number of rows to skip; page numbers start at 1 and 0 is treated as 1.
    /// Saturates instead of overflowing, which simply yields an empty page.
    pub fn offset(&self) -> usize {
        (self.page.max(1) - 1).saturating_mul(self.per_page)
    }
}

/// Conjunctive filter over leads. Every populated field narrows the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadListQuery {
    /// Substring match on the phone number.
    pub phone: Option<String>,
    /// Substring match on the WeChat handle.
    pub wechat: Option<String>,
    pub is_read: Option<bool>,
    pub assigned_user_id: Option<UserId>,
    pub pagination: Option<Pagination>,
}

impl LeadListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn wechat(mut self, wechat: impl Into<String>) -> Self {
        self.wechat = Some(wechat.into());
        self
    }

    pub fn is_read(mut self, is_read: bool) -> Self {
        self.is_read = Some(is_read);
        self
    }

    pub fn assigned_user(mut self, user_id: UserId) -> Self {
        self.assigned_user_id = Some(user_id);
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

pub trait LeadReader {
    fn get_lead_by_id(&self, id: LeadId) -> RepositoryResult<Option<Lead>>;
    /// Returns the total number of matching leads and the requested page.
    fn list_leads(&self, query: LeadListQuery) -> RepositoryResult<(usize, Vec<Lead>)>;
}

pub trait LeadWriter {
    fn create_lead(&self, new_lead: &NewLead) -> RepositoryResult<Lead>;
    /// Inserts all leads in order inside one transaction.
    fn create_leads(&self, new_leads: &[NewLead]) -> RepositoryResult<Vec<Lead>>;
    fn update_lead(&self, id: LeadId, updates: &UpdateLead) -> RepositoryResult<Lead>;
    /// Deletes the lead, returning the number of removed rows.
    fn delete_lead(&self, id: LeadId) -> RepositoryResult<usize>;
    /// Reassigns every listed lead in one statement, returning the affected count.
    fn assign_leads(&self, lead_ids: &[LeadId], user_id: UserId) -> RepositoryResult<usize>;
    fn set_lead_read(&self, id: LeadId, is_read: bool) -> RepositoryResult<usize>;
}

pub trait UserReader {
    fn get_user_by_id(&self, id: UserId) -> RepositoryResult<Option<User>>;
}

pub trait UserWriter {
    fn create_user(&self, new_user: &NewUser) -> RepositoryResult<User>;
}
