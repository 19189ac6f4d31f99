//! Diesel models for the `leads` table.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

use crate::domain::lead::{Lead as DomainLead, NewLead as DomainNewLead, UpdateLead as DomainUpdateLead};
use crate::domain::types::{
    IntentionLevel, LeadId, LeadPhone, LeadRemark, TypeConstraintError, UserId, WechatHandle,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::leads)]
/// Diesel model for [`crate::domain::lead::Lead`].
pub struct Lead {
    pub id: i32,
    pub time: NaiveDateTime,
    pub phone: String,
    pub wechat: String,
    pub remark: Option<String>,
    pub intention_level: i32,
    pub is_read: bool,
    pub assigned_user_id: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::leads)]
/// Insertable form of [`Lead`].
pub struct NewLead<'a> {
    pub time: NaiveDateTime,
    pub phone: &'a str,
    pub wechat: &'a str,
    pub remark: Option<&'a str>,
    pub intention_level: i32,
    pub is_read: bool,
    pub assigned_user_id: i32,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::leads)]
/// Data used when updating a [`Lead`] record. `None` columns are skipped,
/// `Some(None)` writes NULL.
pub struct UpdateLead<'a> {
    pub time: Option<NaiveDateTime>,
    pub phone: Option<&'a str>,
    pub wechat: Option<&'a str>,
    pub remark: Option<Option<&'a str>>,
    pub intention_level: Option<i32>,
    pub is_read: Option<bool>,
    pub assigned_user_id: Option<i32>,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<Lead> for DomainLead {
    type Error = TypeConstraintError;

    fn try_from(lead: Lead) -> Result<Self, Self::Error> {
        Ok(Self {
            id: LeadId::new(lead.id)?,
            time: lead.time,
            phone: LeadPhone::new(lead.phone)?,
            wechat: WechatHandle::new(lead.wechat)?,
            remark: LeadRemark::from_optional(lead.remark),
            intention_level: IntentionLevel::new(lead.intention_level)?,
            is_read: lead.is_read,
            assigned_user_id: UserId::new(lead.assigned_user_id)?,
            created_at: lead.created_at,
            updated_at: lead.updated_at,
        })
    }
}

impl<'a> From<&'a DomainNewLead> for NewLead<'a> {
    fn from(lead: &'a DomainNewLead) -> Self {
        Self {
            time: lead.time,
            phone: lead.phone.as_str(),
            wechat: lead.wechat.as_str(),
            remark: lead.remark.as_ref().map(LeadRemark::as_str),
            intention_level: lead.intention_level.get(),
            is_read: false,
            assigned_user_id: lead.assigned_user_id.get(),
        }
    }
}

impl<'a> From<&'a DomainUpdateLead> for UpdateLead<'a> {
    fn from(lead: &'a DomainUpdateLead) -> Self {
        Self {
            time: lead.time,
            phone: lead.phone.as_ref().map(|phone| phone.as_str()),
            wechat: lead.wechat.as_ref().map(|wechat| wechat.as_str()),
            remark: lead
                .remark
                .as_ref()
                .map(|remark| remark.as_ref().map(LeadRemark::as_str)),
            intention_level: lead.intention_level.map(IntentionLevel::get),
            is_read: lead.is_read,
            assigned_user_id: lead.assigned_user_id.map(UserId::get),
            updated_at: Utc::now().naive_utc(),
        }
    }
}
