//! Header navigation
//!
//! Fixed links plus one control that depends on whether someone is signed in.

use crate::models::User;
use serde::Serialize;

/// A header link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub label: &'static str,
    pub href: &'static str,
}

/// The auth-dependent header control
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuthControl {
    /// Logout form posting to `action`
    SignOut { label: &'static str, action: &'static str },
    /// Link to the account page
    SignIn { label: &'static str, href: &'static str },
}

/// Header view model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavModel {
    pub links: Vec<NavLink>,
    pub auth: AuthControl,
    pub signed_in: bool,
}

pub const NAV_LINKS: [NavLink; 2] = [
    NavLink {
        label: "Categories",
        href: "/categories",
    },
    NavLink {
        label: "Favorites",
        href: "/dashboard",
    },
];

impl NavModel {
    /// Build the header for the current user, read once per render
    pub fn for_user(user: Option<&User>) -> Self {
        let auth = match user {
            Some(_) => AuthControl::SignOut {
                label: "Logout",
                action: "/logout",
            },
            None => AuthControl::SignIn {
                label: "Sign in / Register",
                href: "/account",
            },
        };
        Self {
            links: NAV_LINKS.to_vec(),
            auth,
            signed_in: user.is_some(),
        }
    }
}
