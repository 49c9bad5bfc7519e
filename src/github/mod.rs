mod api;
mod architecture;
mod authors;
mod clone;
mod security;

pub use api::GitHubClient;
pub use architecture::analyze_architecture;
pub use authors::extract_authors;
pub use clone::clone_repository;
pub use security::SecurityScanner;
