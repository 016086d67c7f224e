//! Client for appending rows to a Google Sheets spreadsheet with a
//! service-account key.

pub mod client;
pub mod errors;
pub mod service_account;

pub use client::{AppendTarget, GoogleSheetsConnector, RowAppender, SheetsConnector};
pub use errors::SheetsError;
