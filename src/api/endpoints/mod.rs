//! API endpoint handlers, one module per procedure group.

pub mod achievements;
pub mod admin;
pub mod appointments;
pub mod auth;
pub mod calendar;
pub mod dashboard;
pub mod health;
pub mod knowledge;
pub mod notifications;
pub mod patient;
pub mod prosthesis;
pub mod rehabilitation;
pub mod service;
