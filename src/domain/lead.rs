use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::types::{IntentionLevel, LeadId, LeadPhone, LeadRemark, UserId, WechatHandle};

/// A prospective contact with its assignment and read state.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Lead {
    pub id: LeadId,
    /// When the lead originated, as reported by the caller (UTC).
    pub time: NaiveDateTime,
    pub phone: LeadPhone,
    pub wechat: WechatHandle,
    pub remark: Option<LeadRemark>,
    pub intention_level: IntentionLevel,
    pub is_read: bool,
    /// User that owns the lead for access purposes.
    pub assigned_user_id: UserId,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Lead {
    /// Whether `user_id` may change the read state of this lead.
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.assigned_user_id == user_id
    }
}

/// A lead that has not been persisted yet. New leads always start unread.
#[derive(Clone, Debug, PartialEq)]
pub struct NewLead {
    pub time: NaiveDateTime,
    pub phone: LeadPhone,
    pub wechat: WechatHandle,
    pub remark: Option<LeadRemark>,
    pub intention_level: IntentionLevel,
    pub assigned_user_id: UserId,
}

impl NewLead {
    #[must_use]
    pub fn new(
        time: NaiveDateTime,
        phone: LeadPhone,
        wechat: WechatHandle,
        remark: Option<LeadRemark>,
        intention_level: IntentionLevel,
        assigned_user_id: UserId,
    ) -> Self {
        Self {
            time,
            phone,
            wechat,
            remark,
            intention_level,
            assigned_user_id,
        }
    }
}

/// Partial update of a lead; `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateLead {
    pub time: Option<NaiveDateTime>,
    pub phone: Option<LeadPhone>,
    pub wechat: Option<WechatHandle>,
    /// `Some(None)` clears the remark.
    pub remark: Option<Option<LeadRemark>>,
    pub intention_level: Option<IntentionLevel>,
    pub is_read: Option<bool>,
    pub assigned_user_id: Option<UserId>,
}

impl UpdateLead {
    /// Update touching only the read flag.
    pub fn read_state(is_read: bool) -> Self {
        Self {
            is_read: Some(is_read),
            ..Self::default()
        }
    }
}
