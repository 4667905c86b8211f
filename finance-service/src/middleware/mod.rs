pub mod tenant;

pub use tenant::CompanyContext;
