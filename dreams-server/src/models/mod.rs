//! Domain models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod validation;
pub mod category;
pub mod comment;
pub mod dream;
pub mod media;
pub mod user;

pub use validation::ValidationError;
pub use category::{Category, DreamStatus};
pub use comment::CommentText;
pub use dream::{Cost, Description, DreamChanges, DreamName, Location, NewDream};
pub use media::{media_url, MediaPath};
pub use user::{AboutMe, Email, NewUser, Password, PersonName, ProfileChanges};
