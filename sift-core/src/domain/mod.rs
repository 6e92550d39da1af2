//! Core domain types
//!
//! This module contains the catalog model read from service and project
//! configuration, and the compiled workflow handed to the orchestrator.
//! The catalog types are plain values; nothing here holds global state.

pub mod config;
pub mod function;
pub mod platform;
pub mod worker;

pub use config::{ProjectConfig, Selection, SelectionConfig, ServiceConfig};
pub use function::{
    CipdPackage, Cmd, ConfigDef, Function, FunctionKind, Impl, ImplKind, Recipe, ResolvedFunction,
};
pub use platform::{DataDetails, DataType, Platform, PlatformDetails};
pub use worker::{Worker, Workflow};
