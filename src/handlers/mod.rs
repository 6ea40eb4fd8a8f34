pub mod health;

use actix_web::web;

pub use health::not_found;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::config);
}
