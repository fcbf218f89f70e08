//! Application context: who is signed in, their theme, and the store both
//! are persisted in. Built once at startup and torn down at shutdown; the
//! editor and the gated pages receive what they need from here explicitly.

use std::path::Path;

use serde::{Deserialize, Serialize};
use stencil_core::{AccessError, Area, CurrentUser};
use stencil_editor::{ConfigError, EditorConfig, EditorSession};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::store::{LocalStore, StoreError, THEME_KEY, USER_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Error)]
pub enum ContextError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("email must not be empty")]
    MissingEmail,
}

#[derive(Debug)]
pub struct AppContext {
    store: LocalStore,
    current_user: Option<CurrentUser>,
    theme: Theme,
}

impl AppContext {
    /// Start up from the store at `store_path`.
    pub fn init(store_path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let store = LocalStore::open(store_path)?;
        Ok(Self::with_store(store))
    }

    /// Start up from an already opened store. A user or theme record that no
    /// longer parses is dropped rather than failing startup.
    pub fn with_store(mut store: LocalStore) -> Self {
        let current_user = match store.get::<CurrentUser>(USER_KEY) {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "discarding unreadable user record");
                store.remove(USER_KEY);
                None
            }
        };
        let theme = store.get::<Theme>(THEME_KEY).ok().flatten().unwrap_or_default();

        info!(
            signed_in = current_user.is_some(),
            ?theme,
            "application context initialised"
        );

        Self {
            store,
            current_user,
            theme,
        }
    }

    pub fn current_user(&self) -> Option<&CurrentUser> {
        self.current_user.as_ref()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Record `user` as signed in and return the dashboard they land on.
    pub fn sign_in(&mut self, user: CurrentUser) -> Result<Area, ContextError> {
        if user.email.trim().is_empty() {
            return Err(ContextError::MissingEmail);
        }
        self.store.set(USER_KEY, &user)?;
        info!(user = %user.id, role = ?user.role, "signed in");
        let landing = Area::dashboard_for(user.role);
        self.current_user = Some(user);
        Ok(landing)
    }

    /// Forget the signed-in user. Returns who it was.
    pub fn sign_out(&mut self) -> Option<CurrentUser> {
        self.store.remove(USER_KEY);
        let user = self.current_user.take();
        if let Some(user) = &user {
            info!(user = %user.id, "signed out");
        }
        user
    }

    /// Change the display name of the signed-in user.
    pub fn rename(&mut self, name: Option<String>) -> Result<(), ContextError> {
        let user = self.current_user.as_mut().ok_or(AccessError::SignInRequired {
            area: Area::Profile,
        })?;
        user.name = name.filter(|n| !n.trim().is_empty());
        self.store.set(USER_KEY, &*user)?;
        debug!(user = %user.id, "profile updated");
        Ok(())
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<(), ContextError> {
        self.store.set(THEME_KEY, &theme)?;
        self.theme = theme;
        Ok(())
    }

    pub fn toggle_theme(&mut self) -> Result<Theme, ContextError> {
        let next = self.theme.toggled();
        self.set_theme(next)?;
        Ok(next)
    }

    pub fn authorize(&self, area: Area) -> Result<(), AccessError> {
        area.check(self.current_user.as_ref())
    }

    /// Open the design editor for the signed-in user.
    pub fn open_editor(&self, config: EditorConfig) -> Result<EditorSession, ContextError> {
        self.authorize(Area::DesignEditor)?;
        let owner = self
            .current_user
            .clone()
            .ok_or(AccessError::SignInRequired {
                area: Area::DesignEditor,
            })?;
        Ok(EditorSession::open(config, owner)?)
    }

    /// Persist everything and tear down.
    pub fn shutdown(mut self) -> anyhow::Result<()> {
        self.store.flush()?;
        info!("application context shut down");
        Ok(())
    }
}
