//! Core types for Pampa Commerce.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod item;
pub mod status;

pub use email::{Email, EmailError};
pub use id::{PaymentId, PaymentIdError};
pub use item::{LineItem, cart_total};
pub use status::OrderStatus;
