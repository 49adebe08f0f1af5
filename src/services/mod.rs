//! Services layer - business logic
//!
//! Services sit between the HTTP layer and the repositories:
//! - listing and favorites for categories
//! - identity (registration, sessions) and the login flow
//! - share links and header navigation

pub mod favorite;
pub mod listing;
pub mod login;
pub mod nav;
pub mod password;
pub mod rate_limiter;
pub mod share;
pub mod toast;
pub mod user;

pub use favorite::{FavoriteError, FavoriteService};
pub use listing::{CategoryListing, ListingError, ListingService, ListingSlice};
pub use login::{
    Authenticator, FieldErrors, FormControls, InFlightRegistry, LoginForm, LoginInput,
    LoginOutcome, LoginService, welcome_toast, DASHBOARD_PATH,
};
pub use nav::{AuthControl, NavLink, NavModel};
pub use password::{hash_password, verify_password};
pub use rate_limiter::{LoginRateLimiter, RateLimitReason};
pub use share::{
    absolute_url, copied_toast, copy_failed_toast, display_url, Browser, Clipboard,
    CopyIndicator, ShareLink, ShareModal, ShareTarget, ShareView,
};
pub use toast::{Toast, ToastVariant};
pub use user::{RegisterInput, UserService, UserServiceError};
