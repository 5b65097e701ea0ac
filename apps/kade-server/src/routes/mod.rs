//! HTTP handlers, one module per resource.
//!
//! ```text
//! /api
//!  ├── /products      products.rs
//!  ├── /customers     customers.rs
//!  ├── /sales         sales.rs
//!  ├── /dashboard     dashboard.rs
//!  └── /auth          auth.rs
//! /health             health.rs
//! ```

use serde::Serialize;

pub mod auth;
pub mod customers;
pub mod dashboard;
pub mod health;
pub mod products;
pub mod sales;

/// `{"message": "..."}`
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// `{"id": 1, "message": "..."}`
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: i64,
    pub message: &'static str,
}
