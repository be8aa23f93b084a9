pub mod actor;
pub mod application;
pub mod audit_entry;
pub mod automation;
pub mod job;
