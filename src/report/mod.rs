pub mod contact_sheet;
pub mod csv;

pub use contact_sheet::write_contact_sheets;
pub use csv::write_report;
