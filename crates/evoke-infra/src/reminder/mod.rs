pub mod http;

pub use http::HttpReminderClient;
