use actix_web::{HttpResponse, Responder, Scope, delete, get, post, web};

use crate::dto::api::ApiResponse;
use crate::forms::leads::{
    BatchAssignLeadsForm, BatchCreateLeadsForm, CreateLeadForm, LeadIdForm, LeadListParams,
    MyLeadListParams, UpdateLeadForm,
};
use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::routes::error_response;
use crate::services::leads as leads_service;

#[get("/list")]
pub async fn list_leads(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Query(params): web::Query<LeadListParams>,
) -> impl Responder {
    match leads_service::list_leads(repo.get_ref(), &user, params) {
        Ok(page) => HttpResponse::Ok().json(ApiResponse::paged(page)),
        Err(err) => error_response(err, "only superuser may access"),
    }
}

#[get("/my")]
pub async fn list_my_leads(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Query(params): web::Query<MyLeadListParams>,
) -> impl Responder {
    match leads_service::list_my_leads(repo.get_ref(), &user, params) {
        Ok(page) => HttpResponse::Ok().json(ApiResponse::paged(page)),
        Err(err) => error_response(err, "forbidden"),
    }
}

#[post("/create")]
pub async fn create_lead(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<CreateLeadForm>,
) -> impl Responder {
    match leads_service::create_lead(repo.get_ref(), &user, form) {
        Ok(lead) => HttpResponse::Ok().json(ApiResponse::success("Created Successfully", lead)),
        Err(err) => error_response(err, "only superuser may create leads"),
    }
}

#[post("/batch_create")]
pub async fn batch_create_leads(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<BatchCreateLeadsForm>,
) -> impl Responder {
    match leads_service::batch_create_leads(repo.get_ref(), &user, form) {
        Ok(leads) => HttpResponse::Ok().json(ApiResponse::success("Created Successfully", leads)),
        Err(err) => error_response(err, "only superuser may batch create leads"),
    }
}

#[post("/batch_assign")]
pub async fn batch_assign_leads(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<BatchAssignLeadsForm>,
) -> impl Responder {
    match leads_service::batch_assign_leads(repo.get_ref(), &user, form) {
        Ok(affected) => {
            HttpResponse::Ok().json(ApiResponse::success("Assigned Successfully", affected))
        }
        Err(err) => error_response(err, "only superuser may assign leads"),
    }
}

#[post("/update")]
pub async fn update_lead(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<UpdateLeadForm>,
) -> impl Responder {
    match leads_service::update_lead(repo.get_ref(), &user, form) {
        Ok(lead) => HttpResponse::Ok().json(ApiResponse::success("Updated Successfully", lead)),
        Err(err) => error_response(err, "only superuser may update leads"),
    }
}

#[delete("/delete")]
pub async fn delete_lead(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Query(form): web::Query<LeadIdForm>,
) -> impl Responder {
    match leads_service::delete_lead(repo.get_ref(), &user, form) {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::ok("Deleted Successfully")),
        Err(err) => error_response(err, "only superuser may delete leads"),
    }
}

#[post("/mark_read")]
pub async fn mark_as_read(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<LeadIdForm>,
) -> impl Responder {
    match leads_service::mark_as_read(repo.get_ref(), &user, form) {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::ok("Marked as read")),
        Err(err) => error_response(err, "forbidden"),
    }
}

#[post("/mark_unread")]
pub async fn mark_as_unread(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<LeadIdForm>,
) -> impl Responder {
    match leads_service::mark_as_unread(repo.get_ref(), &user, form) {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::ok("Marked as unread")),
        Err(err) => error_response(err, "forbidden"),
    }
}

/// All lead endpoints mounted under `/leads`.
pub fn leads_scope() -> Scope {
    web::scope("/leads")
        .service(list_leads)
        .service(list_my_leads)
        .service(create_lead)
        .service(batch_create_leads)
        .service(batch_assign_leads)
        .service(update_lead)
        .service(delete_lead)
        .service(mark_as_read)
        .service(mark_as_unread)
}
