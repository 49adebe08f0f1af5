//! Data models
//!
//! Entities stored by ColorMyPage (categories, coloring pages, favorites,
//! users, sessions) and the offset pagination types used by listings.

mod category;
mod coloring_page;
mod favorite;
mod pagination;
mod session;
mod user;

pub use category::Category;
pub use coloring_page::ColoringPage;
pub use favorite::FavoriteCategory;
pub use pagination::{OffsetPage, PageRequest, PAGE_SIZE};
pub use session::Session;
pub use user::{CreateUserInput, User};
