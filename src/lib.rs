//! Coverbot - Conversational Insurance Workflow Backend
//!
//! This crate implements a suspendable workflow engine for multi-turn
//! insurance processes: free-text user messages are turned into
//! structured, validated data while run progress persists across turns.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod workflows;
