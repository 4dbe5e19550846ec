pub mod actor;
pub mod decision;
pub mod employee;
pub mod request;
pub mod role;
pub mod tenant;
