//! Gantry Core
//!
//! Platform-neutral types and abstractions for Gantry CI drivers.
//!
//! This crate contains:
//! - Domain types: the entities a driver exchanges with its caller (comments,
//!   pull requests, checks, runners, jobs)
//! - The [`CiDriver`] trait every platform binding implements

pub mod domain;
pub mod driver;

pub use domain::repo::{ParseRepoError, RepoRef};
pub use driver::CiDriver;
