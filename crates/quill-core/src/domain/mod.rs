//! Domain entities - the core business objects.

mod category;
mod post;
mod post_category;
mod user;

pub use category::{Category, CategoryChanges};
pub use post::{NewPost, Post, PostChanges, PostWithCategories};
pub use post_category::PostCategory;
pub use user::{NewUser, User, UserChanges};
