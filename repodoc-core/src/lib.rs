#![doc = "repodoc-core: ingestion and classification pipeline for repodoc."]

//! This crate contains all business logic for repodoc: acquiring a repository,
//! discovering its files, analysing each file and profiling the project as a whole.
//! Terminal output, config files and the concrete text-generation client live in the CLI crate.
//!
//! # Usage
//! Build an [`download::Acquirer`], load [`config::AnalysisConfig`] and [`tables::LanguageTables`],
//! then call [`pipeline::run_pipeline`] (remote repository) or [`pipeline::inspect`] (local tree).

pub mod analyze;
pub mod classify;
pub mod config;
pub mod context;
pub mod contract;
pub mod decode;
pub mod download;
pub mod fallback;
pub mod metadata;
pub mod pipeline;
pub mod profile;
pub mod scan;
pub mod tables;
pub mod validate;
