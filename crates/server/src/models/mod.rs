//! Domain models for the checkout server.

pub mod order;

pub use order::{NewOrder, Order, OrderDetails};
