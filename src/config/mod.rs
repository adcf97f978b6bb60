//! Configuration module

mod site;

pub use site::PaginationConfig;
pub use site::ReadingConfig;
pub use site::RepositoryConfig;
pub use site::SiteConfig;
pub use site::ACCESS_TOKEN_ENV;
