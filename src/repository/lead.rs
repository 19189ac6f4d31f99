//! Repository implementation for leads.

use diesel::sqlite::Sqlite;
use diesel::{Connection, prelude::*};

use crate::{
    domain::{
        lead::{Lead, NewLead, UpdateLead},
        types::{LeadId, UserId},
    },
    models::lead::{Lead as DbLead, NewLead as DbNewLead, UpdateLead as DbUpdateLead},
    repository::{
        DieselRepository, LeadListQuery, LeadReader, LeadWriter,
        errors::{RepositoryError, RepositoryResult},
    },
    schema::leads,
};

/// Wraps `needle` in `%` wildcards, escaping LIKE metacharacters with `\`.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn filtered(query: &LeadListQuery) -> leads::BoxedQuery<'static, Sqlite> {
    let mut items = leads::table.into_boxed();

    if let Some(phone) = &query.phone {
        items = items.filter(leads::phone.like(contains_pattern(phone)).escape('\\'));
    }
    if let Some(wechat) = &query.wechat {
        items = items.filter(leads::wechat.like(contains_pattern(wechat)).escape('\\'));
    }
    if let Some(is_read) = query.is_read {
        items = items.filter(leads::is_read.eq(is_read));
    }
    if let Some(user_id) = query.assigned_user_id {
        items = items.filter(leads::assigned_user_id.eq(user_id.get()));
    }

    items
}

fn into_domain(db_lead: DbLead) -> RepositoryResult<Lead> {
    Lead::try_from(db_lead).map_err(RepositoryError::from)
}

impl LeadReader for DieselRepository {
    fn get_lead_by_id(&self, id: LeadId) -> RepositoryResult<Option<Lead>> {
        let mut conn = self.conn()?;
        let db_lead = leads::table
            .find(id.get())
            .first::<DbLead>(&mut conn)
            .optional()?;

        db_lead.map(into_domain).transpose()
    }

    fn list_leads(&self, query: LeadListQuery) -> RepositoryResult<(usize, Vec<Lead>)> {
        let mut conn = self.conn()?;

        let total: i64 = filtered(&query).count().get_result(&mut conn)?;

        let mut items = filtered(&query).order(leads::id.desc());
        if let Some(pagination) = &query.pagination {
            items = items
                .limit(i64::try_from(pagination.per_page).unwrap_or(i64::MAX))
                .offset(i64::try_from(pagination.offset()).unwrap_or(i64::MAX));
        }

        let leads = items
            .load::<DbLead>(&mut conn)?
            .into_iter()
            .map(into_domain)
            .collect::<RepositoryResult<Vec<Lead>>>()?;

        Ok((total as usize, leads))
    }
}

impl LeadWriter for DieselRepository {
    fn create_lead(&self, new_lead: &NewLead) -> RepositoryResult<Lead> {
        let mut conn = self.conn()?;
        let db_new_lead: DbNewLead = new_lead.into();

        let db_lead = diesel::insert_into(leads::table)
            .values(&db_new_lead)
            .get_result::<DbLead>(&mut conn)?;

        into_domain(db_lead)
    }

    fn create_leads(&self, new_leads: &[NewLead]) -> RepositoryResult<Vec<Lead>> {
        let mut conn = self.conn()?;

        let db_leads = conn.transaction::<Vec<DbLead>, diesel::result::Error, _>(|conn| {
            new_leads
                .iter()
                .map(|new_lead| {
                    diesel::insert_into(leads::table)
                        .values(DbNewLead::from(new_lead))
                        .get_result::<DbLead>(conn)
                })
                .collect()
        })?;

        db_leads.into_iter().map(into_domain).collect()
    }

    fn update_lead(&self, id: LeadId, updates: &UpdateLead) -> RepositoryResult<Lead> {
        let mut conn = self.conn()?;
        let db_updates: DbUpdateLead = updates.into();

        let db_lead = diesel::update(leads::table.find(id.get()))
            .set(&db_updates)
            .get_result::<DbLead>(&mut conn)?;

        into_domain(db_lead)
    }

    fn delete_lead(&self, id: LeadId) -> RepositoryResult<usize> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(leads::table.find(id.get())).execute(&mut conn)?;
        Ok(deleted)
    }

    fn assign_leads(&self, lead_ids: &[LeadId], user_id: UserId) -> RepositoryResult<usize> {
        if lead_ids.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn()?;
        let ids = lead_ids.iter().map(|id| id.get()).collect::<Vec<i32>>();

        let affected = diesel::update(leads::table.filter(leads::id.eq_any(ids)))
            .set((
                leads::assigned_user_id.eq(user_id.get()),
                leads::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)?;

        Ok(affected)
    }

    fn set_lead_read(&self, id: LeadId, is_read: bool) -> RepositoryResult<usize> {
        let mut conn = self.conn()?;

        let affected = diesel::update(leads::table.find(id.get()))
            .set((
                leads::is_read.eq(is_read),
                leads::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)?;

        Ok(affected)
    }
}
