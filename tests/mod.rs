//! Test suite for PollRoom
//!
//! This module organizes all tests

pub mod common;
pub mod integration;
