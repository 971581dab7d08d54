pub mod auth;
pub mod employee;
pub mod verify;

use actix_web::web;

/// Every route the service exposes. Shared state (`AppConfig`,
/// `DirectoryManager`, `VerificationResolver`, the admin store) is expected as
/// app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/v1/auth")
            .route(web::post().to(auth::auth_handler)),
    )
    .service(
        web::resource("/v1/employee")
            .route(web::post().to(employee::create_employee))
            .route(web::get().to(employee::get_employees)),
    )
    .service(
        web::resource("/v1/employee/by-number/{employee_number}")
            .route(web::get().to(employee::get_employee_by_number)),
    )
    .service(
        web::resource("/v1/employee/{record_id}")
            .route(web::get().to(employee::get_employee))
            .route(web::patch().to(employee::update_employee))
            .route(web::delete().to(employee::delete_employee)),
    )
    .service(
        web::resource("/v1/employee/{record_id}/credential")
            .route(web::get().to(employee::get_credential)),
    )
    .service(
        web::resource("/v1/employee/{record_id}/barcode.svg")
            .route(web::get().to(employee::get_barcode)),
    )
    .service(
        web::resource(["/v", "/v/", "/verify", "/verify/"])
            .route(web::get().to(verify::verify_by_query)),
    )
    .service(
        web::resource(["/v/{employee_number}", "/verify/{employee_number}"])
            .route(web::get().to(verify::verify_by_path)),
    )
    .service(
        web::resource("/scan")
            .route(web::get().to(verify::scan_redirect)),
    );
}
