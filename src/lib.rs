//! CRAS Agenda - appointment scheduling for social assistance units
//!
//! This library provides slot availability, citizen document validation and
//! the booking services used by reception desks and interviewers.

pub mod agenda;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod validation;
