pub mod report;
pub mod rolling;
pub mod sip;
