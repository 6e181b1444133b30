//! HTTP request handlers.
//!
//! This module contains all HTTP handlers organized by domain.

pub mod asistencia;
pub mod auth;
pub mod health;
pub mod importacion;
pub mod usuarios;
