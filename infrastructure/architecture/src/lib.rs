//! Layer abstractions shared by the domain, service and infrastructure crates.

pub mod background_service;
pub mod base_dto;
pub mod model;
pub mod repository;
