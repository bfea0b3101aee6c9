pub mod backend;
pub mod controller;
pub mod error;
pub mod loader;

pub use backend::DashboardBackend;
pub use backend::HttpBackend;
pub use controller::DashboardController;
pub use controller::SubmitStatus;
pub use error::ClientError;
pub use loader::dispatch_advisory;
pub use loader::load_advisories;
pub use loader::load_collection;
pub use loader::load_farmers;
