pub mod deductions;
pub mod farmers;
pub mod performance;
