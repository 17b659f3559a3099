//! Core domain types for the metering system

pub mod contract;
pub mod device;
pub mod invoice;
pub mod reading;
