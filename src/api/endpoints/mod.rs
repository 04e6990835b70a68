pub mod appointments;
pub mod images;
pub mod patients;
pub mod stats;
