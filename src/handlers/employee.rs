use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::TryStreamExt;
use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::employee::{EmployeeUpdate, EmployeeView, NewEmployee};
use crate::photos::PhotoUpload;
use crate::services::directory::{DirectoryManager, ListQuery};
use crate::utils::jwt::AdminContext;

const MAX_EMPLOYEE_JSON_BYTES: usize = 16 * 1024;

/// Reads the admin form: an `employee` part holding JSON and an optional
/// `photo` part holding the image bytes.
async fn read_employee_form<T: DeserializeOwned>(
    mut payload: Multipart,
    photo_max_bytes: usize,
) -> Result<(T, Option<PhotoUpload>), AppError> {
    let mut employee: Option<T> = None;
    let mut photo: Option<PhotoUpload> = None;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|err| AppError::BadRequest(format!("Invalid form data: {}", err)))?
    {
        let name = field.content_disposition().get_name().unwrap_or_default().to_string();
        let limit = match name.as_str() {
            "employee" => MAX_EMPLOYEE_JSON_BYTES,
            "photo" => photo_max_bytes,
            other => return Err(AppError::BadRequest(format!("Unexpected form field '{}'", other))),
        };

        let mut data = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|err| AppError::BadRequest(format!("Invalid form data: {}", err)))?
        {
            if data.len() + chunk.len() > limit {
                return Err(AppError::BadRequest(format!(
                    "Form field '{}' exceeds {} byte limit",
                    name, limit
                )));
            }
            data.extend_from_slice(&chunk);
        }

        if name == "employee" {
            let parsed = serde_json::from_slice(&data)
                .map_err(|err| AppError::BadRequest(format!("Invalid employee payload: {}", err)))?;
            employee = Some(parsed);
        } else if !data.is_empty() {
            photo = Some(PhotoUpload { data });
        }
    }

    let employee =
        employee.ok_or_else(|| AppError::BadRequest("Missing 'employee' form field".to_string()))?;
    Ok((employee, photo))
}

fn parse_record_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("Invalid employee record ID".to_string()))
}

pub async fn create_employee(
    ctx: AdminContext,
    directory: web::Data<DirectoryManager>,
    config: web::Data<AppConfig>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let (fields, photo) = read_employee_form::<NewEmployee>(payload, config.photo_max_bytes).await?;
    let record = directory.create(&ctx, fields, photo).await?;

    Ok(HttpResponse::Created().json(directory.view(&record)))
}

pub async fn get_employees(
    ctx: AdminContext,
    directory: web::Data<DirectoryManager>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    let records = directory.list(&ctx, &query).await?;
    let views: Vec<EmployeeView> = records.iter().map(|record| directory.view(record)).collect();

    Ok(HttpResponse::Ok().json(views))
}

pub async fn get_employee(
    ctx: AdminContext,
    directory: web::Data<DirectoryManager>,
    record_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let record_id = parse_record_id(&record_id)?;
    let record = directory.get(&ctx, record_id).await?;

    Ok(HttpResponse::Ok().json(directory.view(&record)))
}

/// The ID-card page looks records up by the printed employee number.
pub async fn get_employee_by_number(
    ctx: AdminContext,
    directory: web::Data<DirectoryManager>,
    employee_number: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let record = directory.get_by_number(&ctx, &employee_number).await?;

    Ok(HttpResponse::Ok().json(directory.view(&record)))
}

pub async fn update_employee(
    ctx: AdminContext,
    directory: web::Data<DirectoryManager>,
    config: web::Data<AppConfig>,
    record_id: web::Path<String>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let record_id = parse_record_id(&record_id)?;
    let (updates, photo) = read_employee_form::<EmployeeUpdate>(payload, config.photo_max_bytes).await?;
    let record = directory.update(&ctx, record_id, updates, photo).await?;

    Ok(HttpResponse::Ok().json(directory.view(&record)))
}

pub async fn delete_employee(
    ctx: AdminContext,
    directory: web::Data<DirectoryManager>,
    record_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let record_id = parse_record_id(&record_id)?;
    directory.delete(&ctx, record_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee deleted successfully",
    })))
}

pub async fn get_credential(
    ctx: AdminContext,
    directory: web::Data<DirectoryManager>,
    record_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let record_id = parse_record_id(&record_id)?;
    let credential = directory.credential(&ctx, record_id).await?;

    Ok(HttpResponse::Ok().json(credential))
}

pub async fn get_barcode(
    ctx: AdminContext,
    directory: web::Data<DirectoryManager>,
    record_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let record_id = parse_record_id(&record_id)?;
    let svg = directory.barcode_svg(&ctx, record_id).await?;

    Ok(HttpResponse::Ok().content_type("image/svg+xml").body(svg))
}
