//! Orderflow Core
//!
//! Core types and abstractions for the Orderflow pipeline engine.
//!
//! This crate contains:
//! - Domain types: Core business entities (Pipeline, Stage, Card, etc.)
//! - DTOs: Data transfer objects for the HTTP API
//! - Position allocation: the ordering-key arithmetic for stage placement

pub mod domain;
pub mod dto;
pub mod position;
