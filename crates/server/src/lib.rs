//! Pampa checkout server library.
//!
//! This crate provides the server functionality as a library, allowing the
//! router to be tested and reused.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
