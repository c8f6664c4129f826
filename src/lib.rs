//! Leave request workflow for an HRM system: submission, two-level approval
//! with balance accounting, role-scoped visibility and in-app notifications,
//! served over actix-web.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod docs;
pub mod leave;
pub mod model;
pub mod notify;
pub mod routes;
pub mod store;
