//! The per-user dashboard payload.

use crate::app::App;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The listing sections a dashboard is assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DashboardSection {
    /// Public apps ranked by recent job runs.
    PopularFeatured,
    /// Public apps, newest integration first.
    Public,
    /// Apps the user integrated.
    RecentlyAdded,
    /// Apps the user ran recently.
    RecentlyUsed,
}

impl DashboardSection {
    /// Every section, in dispatch order.
    pub const ALL: [DashboardSection; 4] = [
        DashboardSection::PopularFeatured,
        DashboardSection::Public,
        DashboardSection::RecentlyAdded,
        DashboardSection::RecentlyUsed,
    ];

    /// Snake-case name, matching the payload field.
    pub fn as_str(&self) -> &'static str {
        match self {
            DashboardSection::PopularFeatured => "popular_featured",
            DashboardSection::Public => "public",
            DashboardSection::RecentlyAdded => "recently_added",
            DashboardSection::RecentlyUsed => "recently_used",
        }
    }
}

/// Apps relevant to one user, grouped by listing section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DashboardApps {
    /// See [`DashboardSection::PopularFeatured`].
    pub popular_featured: Vec<App>,
    /// See [`DashboardSection::Public`].
    pub public: Vec<App>,
    /// See [`DashboardSection::RecentlyAdded`].
    pub recently_added: Vec<App>,
    /// See [`DashboardSection::RecentlyUsed`].
    pub recently_used: Vec<App>,
}

impl DashboardApps {
    /// Replaces the rows of one section.
    pub fn set_section(&mut self, section: DashboardSection, apps: Vec<App>) {
        match section {
            DashboardSection::PopularFeatured => self.popular_featured = apps,
            DashboardSection::Public => self.public = apps,
            DashboardSection::RecentlyAdded => self.recently_added = apps,
            DashboardSection::RecentlyUsed => self.recently_used = apps,
        }
    }
}
