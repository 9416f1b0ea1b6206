//! # Services
//!
//! Business operations composed from repositories and the remote driver.

pub mod invoices;
pub mod product_codes;
pub mod profiles;

pub use connection_test::{ConnectionTestResult, ConnectionTester};
pub use invoices::{
    BranchRow, InvoiceQueryError, InvoiceQueryService, InvoiceQuerySpec, InvoiceRow, MAX_REMOTE_YEAR,
};
pub use product_codes::{ProductCodeInfo, ProductCodeService};
pub use profiles::{
    PageRequest, ProfileError, ProfileInput, ProfilePage, ProfileService, ProfileStats,
    TestConnectionRequest,
};
