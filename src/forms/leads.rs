//! Request payloads accepted by the `/leads` endpoints.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, de};
use validator::Validate;

use crate::domain::lead::{NewLead, UpdateLead};
use crate::domain::types::{
    IntentionLevel, LeadId, LeadPhone, LeadRemark, UserId, WechatHandle,
};
use crate::forms::FormError;
use crate::repository::LeadListQuery;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 1000;
/// Keeps `(page - 1) * page_size` far inside the SQL `OFFSET` range.
pub const MAX_PAGE: usize = 1_000_000_000;

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

/// Parses RFC 3339 timestamps, or naive ones which are taken as UTC.
pub fn parse_lead_time(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.naive_utc());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
}

fn deserialize_lead_time<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_lead_time(&raw).map_err(de::Error::custom)
}

fn deserialize_optional_lead_time<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| parse_lead_time(&raw).map_err(de::Error::custom))
        .transpose()
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field (`None`).
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Query string of `GET /leads/list`.
#[derive(Debug, Deserialize, Validate)]
pub struct LeadListParams {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, max = 1_000_000_000))]
    pub page: usize,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 1000))]
    pub page_size: usize,
    pub phone: Option<String>,
    pub wechat: Option<String>,
    pub is_read: Option<bool>,
    pub assigned_user_id: Option<i32>,
}

impl Default for LeadListParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
            phone: None,
            wechat: None,
            is_read: None,
            assigned_user_id: None,
        }
    }
}

impl LeadListParams {
    /// Validates the parameters and translates them into a typed filter.
    /// Blank phone and wechat values and an assignee of `0` do not filter.
    pub fn into_query(self) -> Result<LeadListQuery, FormError> {
        self.validate()?;

        let mut query = LeadListQuery::new().paginate(self.page, self.page_size);
        if let Some(phone) = non_blank(self.phone) {
            query = query.phone(phone);
        }
        if let Some(wechat) = non_blank(self.wechat) {
            query = query.wechat(wechat);
        }
        if let Some(is_read) = self.is_read {
            query = query.is_read(is_read);
        }
        if let Some(user_id) = self.assigned_user_id.filter(|&id| id != 0) {
            let user_id = UserId::new(user_id).map_err(|_| FormError::InvalidUserId)?;
            query = query.assigned_user(user_id);
        }
        Ok(query)
    }
}

/// Query string of `GET /leads/my`; the assignee is always the caller.
#[derive(Debug, Deserialize)]
pub struct MyLeadListParams {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    pub phone: Option<String>,
    pub wechat: Option<String>,
    pub is_read: Option<bool>,
}

impl From<MyLeadListParams> for LeadListParams {
    fn from(params: MyLeadListParams) -> Self {
        Self {
            page: params.page,
            page_size: params.page_size,
            phone: params.phone,
            wechat: params.wechat,
            is_read: params.is_read,
            assigned_user_id: None,
        }
    }
}

/// Body of `POST /leads/create` and each entry of a batch create.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLeadForm {
    #[serde(deserialize_with = "deserialize_lead_time")]
    pub time: NaiveDateTime,
    #[validate(length(min = 1))]
    pub phone: String,
    #[validate(length(min = 1))]
    pub wechat: String,
    #[serde(default)]
    pub remark: Option<String>,
    #[validate(range(min = 1, max = 5))]
    pub intention_level: i32,
    #[validate(range(min = 1))]
    pub assigned_user_id: i32,
}

impl TryFrom<CreateLeadForm> for NewLead {
    type Error = FormError;

    fn try_from(form: CreateLeadForm) -> Result<Self, Self::Error> {
        form.validate()?;

        Ok(NewLead::new(
            form.time,
            LeadPhone::new(form.phone).map_err(|_| FormError::InvalidPhone)?,
            WechatHandle::new(form.wechat).map_err(|_| FormError::InvalidWechat)?,
            LeadRemark::from_optional(form.remark),
            IntentionLevel::new(form.intention_level)
                .map_err(|_| FormError::InvalidIntentionLevel)?,
            UserId::new(form.assigned_user_id).map_err(|_| FormError::InvalidUserId)?,
        ))
    }
}

/// Body of `POST /leads/batch_create`.
#[derive(Debug, Deserialize, Validate)]
pub struct BatchCreateLeadsForm {
    #[validate(nested)]
    pub leads: Vec<CreateLeadForm>,
}

impl BatchCreateLeadsForm {
    /// Converts every entry, failing on the first invalid one.
    pub fn into_domain(self) -> Result<Vec<NewLead>, FormError> {
        self.validate()?;
        self.leads.into_iter().map(NewLead::try_from).collect()
    }
}

/// Body of `POST /leads/batch_assign`.
#[derive(Debug, Deserialize, Validate)]
pub struct BatchAssignLeadsForm {
    pub lead_ids: Vec<i32>,
    #[validate(range(min = 1))]
    pub assigned_user_id: i32,
}

/// Validated form of [`BatchAssignLeadsForm`].
#[derive(Debug, PartialEq)]
pub struct BatchAssignPayload {
    pub lead_ids: Vec<LeadId>,
    pub assigned_user_id: UserId,
}

impl TryFrom<BatchAssignLeadsForm> for BatchAssignPayload {
    type Error = FormError;

    fn try_from(form: BatchAssignLeadsForm) -> Result<Self, Self::Error> {
        form.validate()?;

        let mut lead_ids = form
            .lead_ids
            .into_iter()
            .map(|id| LeadId::new(id).map_err(|_| FormError::InvalidLeadId))
            .collect::<Result<Vec<_>, _>>()?;
        lead_ids.sort_unstable_by_key(|id| id.get());
        lead_ids.dedup();

        Ok(Self {
            lead_ids,
            assigned_user_id: UserId::new(form.assigned_user_id)
                .map_err(|_| FormError::InvalidUserId)?,
        })
    }
}

/// Body of `POST /leads/update`. Omitted fields are left untouched.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLeadForm {
    pub id: i32,
    #[serde(default, deserialize_with = "deserialize_optional_lead_time")]
    pub time: Option<NaiveDateTime>,
    #[validate(length(min = 1))]
    pub phone: Option<String>,
    #[validate(length(min = 1))]
    pub wechat: Option<String>,
    /// `null` or blank text clears the remark.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub remark: Option<Option<String>>,
    #[validate(range(min = 1, max = 5))]
    pub intention_level: Option<i32>,
    pub is_read: Option<bool>,
    #[validate(range(min = 1))]
    pub assigned_user_id: Option<i32>,
}

/// Validated form of [`UpdateLeadForm`].
#[derive(Debug, PartialEq)]
pub struct UpdateLeadPayload {
    pub id: LeadId,
    pub updates: UpdateLead,
}

impl TryFrom<UpdateLeadForm> for UpdateLeadPayload {
    type Error = FormError;

    fn try_from(form: UpdateLeadForm) -> Result<Self, Self::Error> {
        form.validate()?;

        let updates = UpdateLead {
            time: form.time,
            phone: form
                .phone
                .map(|phone| LeadPhone::new(phone).map_err(|_| FormError::InvalidPhone))
                .transpose()?,
            wechat: form
                .wechat
                .map(|wechat| WechatHandle::new(wechat).map_err(|_| FormError::InvalidWechat))
                .transpose()?,
            remark: form.remark.map(LeadRemark::from_optional),
            intention_level: form
                .intention_level
                .map(|level| {
                    IntentionLevel::new(level).map_err(|_| FormError::InvalidIntentionLevel)
                })
                .transpose()?,
            is_read: form.is_read,
            assigned_user_id: form
                .assigned_user_id
                .map(|id| UserId::new(id).map_err(|_| FormError::InvalidUserId))
                .transpose()?,
        };

        Ok(Self {
            id: LeadId::new(form.id).map_err(|_| FormError::InvalidLeadId)?,
            updates,
        })
    }
}

/// Single lead reference, used by delete (query) and mark read/unread (body).
#[derive(Debug, Deserialize)]
pub struct LeadIdForm {
    pub lead_id: i32,
}

impl TryFrom<LeadIdForm> for LeadId {
    type Error = FormError;

    fn try_from(form: LeadIdForm) -> Result<Self, Self::Error> {
        LeadId::new(form.lead_id).map_err(|_| FormError::InvalidLeadId)
    }
}
