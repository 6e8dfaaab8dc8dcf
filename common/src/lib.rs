pub mod api;
pub mod error;
pub mod identity;
pub mod journey;
pub mod order;
pub mod payment;
pub mod product;
pub mod supply;
