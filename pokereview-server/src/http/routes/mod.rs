//! Route handlers organized by resource
//!
//! Each module owns its wire types (DTOs, view-models) and a `router()`.

pub mod categories;
pub mod common;
pub mod countries;
pub mod health;
pub mod owners;
pub mod pokemon;
pub mod reviewers;
pub mod reviews;
