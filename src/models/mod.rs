pub mod credentials;
pub mod settings;
pub mod user;

pub use credentials::{Credentials, Registration, TokenGrant};
pub use settings::{Personality, UserSettings};
pub use user::UserProfile;
