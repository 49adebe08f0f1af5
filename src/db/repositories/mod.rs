//! Database repositories
//!
//! One repository per entity. Each exposes a trait for the services to
//! depend on and an SQLx implementation covering SQLite and MySQL.

pub mod category;
pub mod coloring_page;
pub mod favorite;
pub mod session;
pub mod user;

pub use category::{CategoryRepository, SqlxCategoryRepository};
pub use coloring_page::{ColoringPageRepository, SqlxColoringPageRepository};
pub use favorite::{FavoriteRepository, SqlxFavoriteRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};
