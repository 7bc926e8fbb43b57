//! Voucher application: storage, services and configuration around the
//! `vouchers` engine.

pub mod config;
pub mod context;
pub mod database;
pub mod domain;
pub mod observability;
pub mod uuids;

#[cfg(test)]
mod test;
