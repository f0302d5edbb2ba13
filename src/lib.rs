//! Administrative backend for an art school: CRUD over students and
//! day schedules, stored as JSON documents in Postgres.

pub mod config;
pub mod err;
pub mod gateway;
pub mod handlers;
pub mod migrate;
pub mod models;
pub mod reconcile;
