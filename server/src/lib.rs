//! Tabletop Server
//!
//! Backend for organizations running tabletop role-playing campaigns:
//! role-based access at platform, organization and campaign level, and a
//! shared campaign board filtered per viewer.

pub mod admin;
pub mod api;
pub mod auth;
pub mod campaigns;
pub mod config;
pub mod db;
pub mod organizations;
pub mod permissions;
