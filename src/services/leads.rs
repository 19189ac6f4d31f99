//! Lead workflows: listing, creation, assignment, updates and read state.
//!
//! Superusers may do everything. Other callers may only list their own leads
//! and flip the read state of leads assigned to them.

use crate::domain::lead::{Lead, NewLead};
use crate::domain::types::{LeadId, UserId};
use crate::dto::leads::LeadsPage;
use crate::forms::leads::{
    BatchAssignLeadsForm, BatchAssignPayload, BatchCreateLeadsForm, CreateLeadForm,
    LeadIdForm, LeadListParams, MyLeadListParams, UpdateLeadForm, UpdateLeadPayload,
};
use crate::models::auth::AuthenticatedUser;
use crate::repository::errors::RepositoryError;
use crate::repository::{LeadListQuery, LeadReader, LeadWriter, UserReader};
use crate::services::{ServiceError, ServiceResult, ensure_superuser};

fn ensure_user_exists<R>(repo: &R, user_id: UserId) -> ServiceResult<()>
where
    R: UserReader + ?Sized,
{
    match repo.get_user_by_id(user_id)? {
        Some(_) => Ok(()),
        None => {
            log::warn!("Referenced user {user_id} does not exist");
            Err(ServiceError::UserNotFound)
        }
    }
}

fn load_page<R>(repo: &R, params: LeadListParams, owner: Option<UserId>) -> ServiceResult<LeadsPage>
where
    R: LeadReader + ?Sized,
{
    let (page, page_size) = (params.page, params.page_size);

    let mut query = params.into_query()?;
    if let Some(owner) = owner {
        query = query.assigned_user(owner);
    }

    let (total, items) = repo.list_leads(query).map_err(|err| {
        log::error!("Failed to list leads: {err}");
        err
    })?;

    Ok(LeadsPage {
        items,
        total,
        page,
        page_size,
    })
}

/// Lists all leads matching the filters. Superuser only.
pub fn list_leads<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: LeadListParams,
) -> ServiceResult<LeadsPage>
where
    R: LeadReader + ?Sized,
{
    ensure_superuser(user)?;
    load_page(repo, params, None)
}

/// Lists the leads assigned to the caller.
pub fn list_my_leads<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: MyLeadListParams,
) -> ServiceResult<LeadsPage>
where
    R: LeadReader + ?Sized,
{
    let user_id = user.user_id()?;
    load_page(repo, params.into(), Some(user_id))
}

/// Returns the total number of leads assigned to `user_id` and one page of them.
pub fn get_leads_by_user<R>(
    repo: &R,
    user_id: UserId,
    page: usize,
    page_size: usize,
) -> ServiceResult<(usize, Vec<Lead>)>
where
    R: LeadReader + ?Sized,
{
    repo.list_leads(
        LeadListQuery::new()
            .assigned_user(user_id)
            .paginate(page, page_size),
    )
    .map_err(ServiceError::from)
}

/// Fetches a single lead.
pub fn get_lead<R>(repo: &R, lead_id: LeadId) -> ServiceResult<Option<Lead>>
where
    R: LeadReader + ?Sized,
{
    repo.get_lead_by_id(lead_id).map_err(ServiceError::from)
}

/// Validates and stores one lead. Superuser only.
pub fn create_lead<R>(repo: &R, user: &AuthenticatedUser, form: CreateLeadForm) -> ServiceResult<Lead>
where
    R: LeadWriter + UserReader + ?Sized,
{
    ensure_superuser(user)?;

    let new_lead = NewLead::try_from(form)?;
    ensure_user_exists(repo, new_lead.assigned_user_id)?;

    let lead = repo.create_lead(&new_lead).map_err(|err| {
        log::error!("Failed to create a lead: {err}");
        err
    })?;

    log::info!(
        "Created lead {} assigned to user {}",
        lead.id,
        lead.assigned_user_id
    );
    Ok(lead)
}

/// Stores every lead of the batch or none of them. Superuser only.
pub fn batch_create_leads<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: BatchCreateLeadsForm,
) -> ServiceResult<Vec<Lead>>
where
    R: LeadWriter + UserReader + ?Sized,
{
    ensure_superuser(user)?;

    let new_leads = form.into_domain()?;

    let mut assignees = new_leads
        .iter()
        .map(|lead| lead.assigned_user_id)
        .collect::<Vec<_>>();
    assignees.sort_unstable_by_key(|id| id.get());
    assignees.dedup();
    for user_id in assignees {
        ensure_user_exists(repo, user_id)?;
    }

    let leads = repo.create_leads(&new_leads).map_err(|err| {
        log::error!("Failed to create a batch of leads: {err}");
        err
    })?;

    log::info!("Created {} leads in one batch", leads.len());
    Ok(leads)
}

/// Reassigns the listed leads to another user. Superuser only.
///
/// Unknown lead ids are ignored; the returned count is the number of rows
/// actually reassigned.
pub fn batch_assign_leads<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: BatchAssignLeadsForm,
) -> ServiceResult<usize>
where
    R: LeadWriter + UserReader + ?Sized,
{
    ensure_superuser(user)?;

    let payload = BatchAssignPayload::try_from(form)?;
    ensure_user_exists(repo, payload.assigned_user_id)?;

    let affected = repo
        .assign_leads(&payload.lead_ids, payload.assigned_user_id)
        .map_err(|err| {
            log::error!("Failed to assign leads: {err}");
            err
        })?;

    log::info!(
        "Assigned {affected} leads to user {}",
        payload.assigned_user_id
    );
    Ok(affected)
}

/// Applies a partial update to a lead. Superuser only.
pub fn update_lead<R>(repo: &R, user: &AuthenticatedUser, form: UpdateLeadForm) -> ServiceResult<Lead>
where
    R: LeadWriter + UserReader + ?Sized,
{
    ensure_superuser(user)?;

    let payload = UpdateLeadPayload::try_from(form)?;
    if let Some(user_id) = payload.updates.assigned_user_id {
        ensure_user_exists(repo, user_id)?;
    }

    repo.update_lead(payload.id, &payload.updates)
        .map_err(|err| match err {
            RepositoryError::NotFound => ServiceError::LeadNotFound,
            err => {
                log::error!("Failed to update lead {}: {err}", payload.id);
                err.into()
            }
        })
}

/// Permanently removes a lead. Removing a missing lead is not an error. Superuser only.
pub fn delete_lead<R>(repo: &R, user: &AuthenticatedUser, form: LeadIdForm) -> ServiceResult<()>
where
    R: LeadWriter + ?Sized,
{
    ensure_superuser(user)?;

    let lead_id = LeadId::try_from(form)?;
    let deleted = repo.delete_lead(lead_id).map_err(|err| {
        log::error!("Failed to delete lead {lead_id}: {err}");
        err
    })?;

    if deleted == 0 {
        log::info!("Lead {lead_id} does not exist, nothing deleted");
    }
    Ok(())
}

fn set_read_state<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: LeadIdForm,
    is_read: bool,
) -> ServiceResult<()>
where
    R: LeadReader + LeadWriter + ?Sized,
{
    let lead_id = LeadId::try_from(form)?;

    let lead = get_lead(repo, lead_id)?.ok_or(ServiceError::LeadNotFound)?;
    if !user.is_superuser && !lead.is_owned_by(user.user_id()?) {
        return Err(ServiceError::Forbidden);
    }

    repo.set_lead_read(lead_id, is_read).map_err(|err| {
        log::error!("Failed to change read state of lead {lead_id}: {err}");
        err
    })?;
    Ok(())
}

/// Marks a lead as read. Allowed for the assignee and superusers.
pub fn mark_as_read<R>(repo: &R, user: &AuthenticatedUser, form: LeadIdForm) -> ServiceResult<()>
where
    R: LeadReader + LeadWriter + ?Sized,
{
    set_read_state(repo, user, form, true)
}

/// Marks a lead as unread. Allowed for the assignee and superusers.
pub fn mark_as_unread<R>(repo: &R, user: &AuthenticatedUser, form: LeadIdForm) -> ServiceResult<()>
where
    R: LeadReader + LeadWriter + ?Sized,
{
    set_read_state(repo, user, form, false)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;
    use crate::domain::lead::UpdateLead;
    use crate::domain::types::{IntentionLevel, UserEmail, UserName};
    use crate::domain::user::User;
    use crate::repository::errors::RepositoryResult;

    fn new_year() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date")
    }

    /// In-memory stand-in for the Diesel repository.
    struct FakeRepo {
        leads: RefCell<Vec<Lead>>,
        users: Vec<User>,
    }

    impl FakeRepo {
        fn with_users(ids: &[i32]) -> Self {
            let users = ids
                .iter()
                .map(|&id| User {
                    id: UserId::new(id).expect("valid user id"),
                    username: UserName::new(format!("user{id}")).expect("valid name"),
                    email: UserEmail::new(format!("user{id}@example.com")).expect("valid email"),
                    is_superuser: id == 1,
                    is_active: true,
                    created_at: new_year(),
                })
                .collect();
            Self {
                leads: RefCell::new(Vec::new()),
                users,
            }
        }

        fn lead(&self, id: i32) -> Lead {
            self.leads
                .borrow()
                .iter()
                .find(|lead| lead.id.get() == id)
                .cloned()
                .expect("lead exists")
        }

        fn insert(&self, new_lead: &NewLead) -> Lead {
            let mut leads = self.leads.borrow_mut();
            let next_id = leads.iter().map(|lead| lead.id.get()).max().unwrap_or(0) + 1;
            let lead = Lead {
                id: LeadId::new(next_id).expect("valid lead id"),
                time: new_lead.time,
                phone: new_lead.phone.clone(),
                wechat: new_lead.wechat.clone(),
                remark: new_lead.remark.clone(),
                intention_level: new_lead.intention_level,
                is_read: false,
                assigned_user_id: new_lead.assigned_user_id,
                created_at: new_year(),
                updated_at: new_year(),
            };
            leads.push(lead.clone());
            lead
        }
    }

    impl LeadReader for FakeRepo {
        fn get_lead_by_id(&self, id: LeadId) -> RepositoryResult<Option<Lead>> {
            Ok(self.leads.borrow().iter().find(|lead| lead.id == id).cloned())
        }

        fn list_leads(&self, query: LeadListQuery) -> RepositoryResult<(usize, Vec<Lead>)> {
            let matching: Vec<Lead> = self
                .leads
                .borrow()
                .iter()
                .rev()
                .filter(|lead| query.phone.as_deref().is_none_or(|p| lead.phone.contains(p)))
                .filter(|lead| query.wechat.as_deref().is_none_or(|w| lead.wechat.contains(w)))
                .filter(|lead| query.is_read.is_none_or(|r| lead.is_read == r))
                .filter(|lead| query.assigned_user_id.is_none_or(|u| lead.assigned_user_id == u))
                .cloned()
                .collect();
            let total = matching.len();
            let items = match &query.pagination {
                Some(p) => matching.into_iter().skip(p.offset()).take(p.per_page).collect(),
                None => matching,
            };
            Ok((total, items))
        }
    }

    impl LeadWriter for FakeRepo {
        fn create_lead(&self, new_lead: &NewLead) -> RepositoryResult<Lead> {
            Ok(self.insert(new_lead))
        }

        fn create_leads(&self, new_leads: &[NewLead]) -> RepositoryResult<Vec<Lead>> {
            Ok(new_leads.iter().map(|lead| self.insert(lead)).collect())
        }

        fn update_lead(&self, id: LeadId, updates: &UpdateLead) -> RepositoryResult<Lead> {
            let mut leads = self.leads.borrow_mut();
            let lead = leads
                .iter_mut()
                .find(|lead| lead.id == id)
                .ok_or(RepositoryError::NotFound)?;
            if let Some(time) = updates.time {
                lead.time = time;
            }
            if let Some(phone) = &updates.phone {
                lead.phone = phone.clone();
            }
            if let Some(wechat) = &updates.wechat {
                lead.wechat = wechat.clone();
            }
            if let Some(remark) = &updates.remark {
                lead.remark = remark.clone();
            }
            if let Some(level) = updates.intention_level {
                lead.intention_level = level;
            }
            if let Some(is_read) = updates.is_read {
                lead.is_read = is_read;
            }
            if let Some(user_id) = updates.assigned_user_id {
                lead.assigned_user_id = user_id;
            }
            Ok(lead.clone())
        }

        fn delete_lead(&self, id: LeadId) -> RepositoryResult<usize> {
            let mut leads = self.leads.borrow_mut();
            let before = leads.len();
            leads.retain(|lead| lead.id != id);
            Ok(before - leads.len())
        }

        fn assign_leads(&self, lead_ids: &[LeadId], user_id: UserId) -> RepositoryResult<usize> {
            let mut affected = 0;
            for lead in self.leads.borrow_mut().iter_mut() {
                if lead_ids.contains(&lead.id) {
                    lead.assigned_user_id = user_id;
                    affected += 1;
                }
            }
            Ok(affected)
        }

        fn set_lead_read(&self, id: LeadId, is_read: bool) -> RepositoryResult<usize> {
            let mut affected = 0;
            for lead in self.leads.borrow_mut().iter_mut().filter(|lead| lead.id == id) {
                lead.is_read = is_read;
                affected += 1;
            }
            Ok(affected)
        }
    }

    impl UserReader for FakeRepo {
        fn get_user_by_id(&self, id: UserId) -> RepositoryResult<Option<User>> {
            Ok(self.users.iter().find(|user| user.id == id).cloned())
        }
    }

    fn superuser() -> AuthenticatedUser {
        AuthenticatedUser {
            sub: "1".to_string(),
            name: "Admin".to_string(),
            email: "admin@example.com".to_string(),
            is_superuser: true,
            exp: 0,
        }
    }

    fn member(id: i32) -> AuthenticatedUser {
        AuthenticatedUser {
            sub: id.to_string(),
            name: format!("Member {id}"),
            email: format!("user{id}@example.com"),
            is_superuser: false,
            exp: 0,
        }
    }

    fn create_form(phone: &str, wechat: &str, level: i32, assignee: i32) -> CreateLeadForm {
        CreateLeadForm {
            time: new_year(),
            phone: phone.to_string(),
            wechat: wechat.to_string(),
            remark: None,
            intention_level: level,
            assigned_user_id: assignee,
        }
    }

    fn seed(repo: &FakeRepo, assignees: &[i32]) {
        for (i, &assignee) in assignees.iter().enumerate() {
            create_lead(
                repo,
                &superuser(),
                create_form(&format!("555-010{i}"), &format!("wx{i}"), 3, assignee),
            )
            .expect("lead created");
        }
    }

    fn lead_id(id: i32) -> LeadIdForm {
        LeadIdForm { lead_id: id }
    }

    #[test]
    fn created_lead_shows_up_in_listing() {
        let repo = FakeRepo::with_users(&[1]);

        let lead = create_lead(&repo, &superuser(), create_form("555-0100", "wx1", 3, 1))
            .expect("lead created");
        assert!(!lead.is_read);

        let page = list_leads(&repo, &superuser(), LeadListParams::default()).expect("listed");
        assert_eq!(page.total, 1);
        assert_eq!(page.items, vec![lead]);
        assert_eq!((page.page, page.page_size), (1, 10));
    }

    #[test]
    fn non_superuser_cannot_touch_admin_operations() {
        let repo = FakeRepo::with_users(&[1, 2]);
        seed(&repo, &[2]);
        let caller = member(2);

        assert!(matches!(
            list_leads(&repo, &caller, LeadListParams::default()),
            Err(ServiceError::Unauthorized)
        ));
        assert!(matches!(
            create_lead(&repo, &caller, create_form("1", "w", 3, 2)),
            Err(ServiceError::Unauthorized)
        ));
        assert!(matches!(
            batch_create_leads(
                &repo,
                &caller,
                BatchCreateLeadsForm {
                    leads: vec![create_form("1", "w", 3, 2)]
                }
            ),
            Err(ServiceError::Unauthorized)
        ));
        assert!(matches!(
            batch_assign_leads(
                &repo,
                &caller,
                BatchAssignLeadsForm {
                    lead_ids: vec![1],
                    assigned_user_id: 2
                }
            ),
            Err(ServiceError::Unauthorized)
        ));
        let update = UpdateLeadForm {
            id: 1,
            time: None,
            phone: Some("999".to_string()),
            wechat: None,
            remark: None,
            intention_level: None,
            is_read: None,
            assigned_user_id: None,
        };
        assert!(matches!(
            update_lead(&repo, &caller, update),
            Err(ServiceError::Unauthorized)
        ));
        assert!(matches!(
            delete_lead(&repo, &caller, lead_id(1)),
            Err(ServiceError::Unauthorized)
        ));

        assert_eq!(repo.leads.borrow().len(), 1);
        assert_eq!(repo.lead(1).phone.as_str(), "555-0100");
    }

    #[test]
    fn intention_level_out_of_range_is_rejected() {
        let repo = FakeRepo::with_users(&[1]);

        for level in [0, 6] {
            assert!(matches!(
                create_lead(&repo, &superuser(), create_form("1", "w", level, 1)),
                Err(ServiceError::Form(_))
            ));
        }
        assert!(repo.leads.borrow().is_empty());
    }

    #[test]
    fn create_for_unknown_assignee_is_user_not_found() {
        let repo = FakeRepo::with_users(&[1]);

        assert!(matches!(
            create_lead(&repo, &superuser(), create_form("1", "w", 3, 42)),
            Err(ServiceError::UserNotFound)
        ));
        assert!(repo.leads.borrow().is_empty());
    }

    #[test]
    fn batch_create_is_all_or_nothing_on_bad_input() {
        let repo = FakeRepo::with_users(&[1, 2]);

        let result = batch_create_leads(
            &repo,
            &superuser(),
            BatchCreateLeadsForm {
                leads: vec![create_form("1", "a", 3, 2), create_form("2", "b", 3, 99)],
            },
        );
        assert!(matches!(result, Err(ServiceError::UserNotFound)));
        assert!(repo.leads.borrow().is_empty());

        let created = batch_create_leads(
            &repo,
            &superuser(),
            BatchCreateLeadsForm {
                leads: vec![create_form("1", "a", 3, 2), create_form("2", "b", 5, 1)],
            },
        )
        .expect("batch created");
        assert_eq!(created.len(), 2);
        assert_eq!(created[1].intention_level, IntentionLevel::new(5).expect("valid level"));
    }

    #[test]
    fn my_leads_only_contains_callers_leads() {
        let repo = FakeRepo::with_users(&[1, 2, 3]);
        seed(&repo, &[2, 3, 2, 3, 2]);

        let page = list_my_leads(
            &repo,
            &member(2),
            MyLeadListParams {
                page: 1,
                page_size: 10,
                phone: None,
                wechat: None,
                is_read: None,
            },
        )
        .expect("listed");

        assert_eq!(page.total, 3);
        assert!(page.items.iter().all(|lead| lead.assigned_user_id.get() == 2));
    }

    #[test]
    fn list_filters_are_conjunctive() {
        let repo = FakeRepo::with_users(&[1, 2]);
        seed(&repo, &[2, 2, 1]);
        mark_as_read(&repo, &superuser(), lead_id(1)).expect("marked");

        let params = LeadListParams {
            phone: Some("555".to_string()),
            is_read: Some(false),
            assigned_user_id: Some(2),
            ..LeadListParams::default()
        };
        let page = list_leads(&repo, &superuser(), params).expect("listed");

        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id.get(), 2);
    }

    #[test]
    fn get_leads_by_user_pages_through_assignments() {
        let repo = FakeRepo::with_users(&[1, 2]);
        seed(&repo, &[2, 2, 2, 1]);
        let owner = UserId::new(2).expect("valid user id");

        let (total, first) = get_leads_by_user(&repo, owner, 1, 2).expect("listed");
        let (_, second) = get_leads_by_user(&repo, owner, 2, 2).expect("listed");

        assert_eq!(total, 3);
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn read_state_transitions_are_explicit_and_idempotent() {
        let repo = FakeRepo::with_users(&[1, 2]);
        seed(&repo, &[2]);
        let owner = member(2);

        mark_as_read(&repo, &owner, lead_id(1)).expect("marked");
        mark_as_read(&repo, &owner, lead_id(1)).expect("marked again");
        assert!(repo.lead(1).is_read);

        mark_as_unread(&repo, &owner, lead_id(1)).expect("unmarked");
        assert!(!repo.lead(1).is_read);
    }

    #[test]
    fn read_state_requires_ownership_or_superuser() {
        let repo = FakeRepo::with_users(&[1, 2, 3]);
        seed(&repo, &[2]);

        assert!(matches!(
            mark_as_read(&repo, &member(3), lead_id(1)),
            Err(ServiceError::Forbidden)
        ));
        assert!(!repo.lead(1).is_read);

        mark_as_read(&repo, &superuser(), lead_id(1)).expect("superuser may mark");
        assert!(repo.lead(1).is_read);

        assert!(matches!(
            mark_as_unread(&repo, &member(2), lead_id(7)),
            Err(ServiceError::LeadNotFound)
        ));
    }

    #[test]
    fn batch_assign_to_unknown_user_changes_nothing() {
        let repo = FakeRepo::with_users(&[1, 2]);
        seed(&repo, &[2, 2]);

        let result = batch_assign_leads(
            &repo,
            &superuser(),
            BatchAssignLeadsForm {
                lead_ids: vec![1, 2],
                assigned_user_id: 77,
            },
        );

        assert!(matches!(result, Err(ServiceError::UserNotFound)));
        assert!(
            repo.leads
                .borrow()
                .iter()
                .all(|lead| lead.assigned_user_id.get() == 2)
        );
    }

    #[test]
    fn batch_assign_ignores_unknown_leads() {
        let repo = FakeRepo::with_users(&[1, 2]);
        seed(&repo, &[2, 2]);

        let affected = batch_assign_leads(
            &repo,
            &superuser(),
            BatchAssignLeadsForm {
                lead_ids: vec![1, 2, 40],
                assigned_user_id: 1,
            },
        )
        .expect("assigned");

        assert_eq!(affected, 2);
        assert_eq!(repo.lead(2).assigned_user_id.get(), 1);
    }

    #[test]
    fn update_changes_only_supplied_fields() {
        let repo = FakeRepo::with_users(&[1, 2]);
        seed(&repo, &[2]);
        let before = repo.lead(1);

        let updated = update_lead(
            &repo,
            &superuser(),
            UpdateLeadForm {
                id: 1,
                time: None,
                phone: None,
                wechat: Some("wx-new".to_string()),
                remark: Some(Some("met at expo".to_string())),
                intention_level: Some(5),
                is_read: None,
                assigned_user_id: None,
            },
        )
        .expect("updated");

        assert_eq!(updated.wechat.as_str(), "wx-new");
        assert_eq!(updated.remark.as_ref().map(|r| r.as_str()), Some("met at expo"));
        assert_eq!(updated.intention_level.get(), 5);
        assert_eq!(updated.phone, before.phone);
        assert_eq!(updated.time, before.time);
        assert_eq!(updated.assigned_user_id, before.assigned_user_id);
    }

    #[test]
    fn update_of_missing_lead_is_lead_not_found() {
        let repo = FakeRepo::with_users(&[1]);

        let result = update_lead(
            &repo,
            &superuser(),
            UpdateLeadForm {
                id: 3,
                time: None,
                phone: Some("1".to_string()),
                wechat: None,
                remark: None,
                intention_level: None,
                is_read: None,
                assigned_user_id: None,
            },
        );

        assert!(matches!(result, Err(ServiceError::LeadNotFound)));
    }

    #[test]
    fn delete_is_permanent_and_missing_ids_are_ignored() {
        let repo = FakeRepo::with_users(&[1]);
        seed(&repo, &[1]);

        delete_lead(&repo, &superuser(), lead_id(1)).expect("deleted");
        assert!(get_lead(&repo, LeadId::new(1).expect("valid id")).expect("fetched").is_none());

        delete_lead(&repo, &superuser(), lead_id(1)).expect("missing lead is a no-op");
    }
}
