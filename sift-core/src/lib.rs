//! Sift Core
//!
//! Core types and the workflow compiler for the Sift analysis service.
//!
//! This crate contains:
//! - Domain types: the analyzer catalog (platforms, data types, functions)
//!   and the compiled workflow (workers)
//! - Compiler: turns a service catalog plus a project's selections into a
//!   validated worker graph
//! - DTOs: pipeline requests and the build notification envelopes

pub mod compiler;
pub mod domain;
pub mod dto;

pub use compiler::{CompileError, generate};
