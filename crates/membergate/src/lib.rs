//! Core library for the membership platform's vetting workflow engine and
//! event access control gate.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
