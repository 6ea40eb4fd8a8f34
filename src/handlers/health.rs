//! 健康检查接口
//!
//! GET / 与 GET /health 返回纯文本 OK，其余路径 404

use actix_web::{web, HttpResponse};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().content_type(TEXT_PLAIN).body("OK")
}

pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().content_type(TEXT_PLAIN).body("Not Found")
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(health_check))
        .route("/health", web::get().to(health_check));
}
