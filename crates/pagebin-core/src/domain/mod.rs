mod site;
mod user;

pub use site::{Site, SiteFile, validate_slug};
pub use user::User;
