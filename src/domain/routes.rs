//! Screen routes and their paths.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::domain::entities::PostRecord;
use crate::domain::error::DomainError;
use crate::domain::slug::generate_slug;

/// Post id exactly as written in a path. Only a lookup decides whether it names a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRef(String);

impl PostRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id as a UUID, or `None` when it cannot name any stored post.
    pub fn uuid(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.0).ok()
    }
}

impl From<Uuid> for PostRef {
    fn from(id: Uuid) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for PostRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Signup,
    Vitamins,
    /// A single vitamin. The slug is display-only and never used for lookup.
    VitaminDetail {
        id: PostRef,
        slug: Option<String>,
    },
    ManageVitamins,
    About,
}

impl Route {
    pub fn for_post(post: &PostRecord) -> Self {
        Route::VitaminDetail {
            id: post.id.into(),
            slug: Some(generate_slug(&post.title)),
        }
    }

    /// Resolve a path, ignoring query string, fragment and trailing slashes.
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Some(Route::Home),
            ["login"] => Some(Route::Login),
            ["signup"] => Some(Route::Signup),
            ["vitamins"] => Some(Route::Vitamins),
            ["vitamins", id] => Some(Route::VitaminDetail {
                id: PostRef((*id).to_string()),
                slug: None,
            }),
            ["vitamins", id, slug] => Some(Route::VitaminDetail {
                id: PostRef((*id).to_string()),
                slug: Some((*slug).to_string()),
            }),
            ["manage-vitamins"] => Some(Route::ManageVitamins),
            ["about"] => Some(Route::About),
            _ => None,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::Signup => "/signup".to_string(),
            Route::Vitamins => "/vitamins".to_string(),
            Route::VitaminDetail { id, slug } => match slug.as_deref() {
                Some(slug) if !slug.is_empty() => format!("/vitamins/{id}/{slug}"),
                _ => format!("/vitamins/{id}"),
            },
            Route::ManageVitamins => "/manage-vitamins".to_string(),
            Route::About => "/about".to_string(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl FromStr for Route {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Route::parse(s).ok_or_else(|| DomainError::not_found("route"))
    }
}
