//! Role gating for studio pages.

use thiserror::Error;
use tracing::debug;

use crate::{CurrentUser, Role};

/// Pages of the studio that may be gated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Area {
    Home,
    Designs,
    Artists,
    Booking,
    DesignEditor,
    Profile,
    CustomerDashboard,
    ArtistDashboard,
    AdminDashboard,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("{area:?} requires a signed-in user")]
    SignInRequired { area: Area },

    #[error("{role:?} may not open {area:?}")]
    Forbidden { area: Area, role: Role },
}

impl Area {
    /// Roles allowed in this area, or `None` when the area is public.
    pub fn allowed_roles(self) -> Option<&'static [Role]> {
        match self {
            Area::Home | Area::Designs | Area::Artists => None,
            Area::Booking | Area::DesignEditor | Area::Profile => {
                Some(&[Role::Customer, Role::Artist, Role::Admin])
            }
            Area::CustomerDashboard => Some(&[Role::Customer]),
            Area::ArtistDashboard => Some(&[Role::Artist]),
            Area::AdminDashboard => Some(&[Role::Admin]),
        }
    }

    pub fn check(self, user: Option<&CurrentUser>) -> Result<(), AccessError> {
        let Some(roles) = self.allowed_roles() else {
            return Ok(());
        };

        let user = user.ok_or(AccessError::SignInRequired { area: self })?;
        if roles.contains(&user.role) {
            debug!(area = ?self, role = ?user.role, "access granted");
            Ok(())
        } else {
            debug!(area = ?self, role = ?user.role, "access denied");
            Err(AccessError::Forbidden {
                area: self,
                role: user.role,
            })
        }
    }

    /// Where a user of this role lands after signing in.
    pub fn dashboard_for(role: Role) -> Area {
        match role {
            Role::Customer => Area::CustomerDashboard,
            Role::Artist => Area::ArtistDashboard,
            Role::Admin => Area::AdminDashboard,
        }
    }
}
