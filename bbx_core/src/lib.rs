//! # BBX Core
//!
//! This crate contains the core mechanisms and utilities
//! used throughout this workspace.

pub mod error;
pub mod format;
pub mod spsc;
pub mod stack_vec;

pub use error::{BbxError, Result};
pub use format::{AudioFormat, FrameFormat, sat_i16, sat_i24, sat_i32, sign_extend_s24};
pub use spsc::{Consumer, Producer, SpscRingBuffer};
pub use stack_vec::StackVec;
