use adw::Application;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use directories::BaseDirs;

/// What the session keeps about the signed-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub nom: String,
    pub email: String,
    pub role: String,
}

/// The one place authentication state lives. Loaded once at startup,
/// saved after login, cleared on logout; windows receive a copy instead
/// of reading ambient storage.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Session {
    pub base_url: String,
    pub token: Option<String>,
    pub user: Option<SessionUser>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    fn config_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        Some(base.config_dir().join("protrans.toml"))
    }

    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if let Ok(text) = fs::read_to_string(&path) {
                if let Ok(session) = toml::from_str::<Session>(&text) {
                    return session;
                }
                log::warn!("unreadable session file at {}, starting signed out", path.display());
            }
        }
        Self::new()
    }

    pub fn save(&self) -> std::io::Result<()> {
        if let Some(path) = Self::config_path() {
            if let Some(parent) = path.parent() {
                let _ = fs::create_dir_all(parent);
            }
            let toml = toml::to_string_pretty(self)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
            fs::write(path, toml)
        } else {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "No config dir"))
        }
    }

    /// Teardown: the server stays configured, the identity goes away.
    pub fn logout(&mut self) -> std::io::Result<()> {
        self.token = None;
        self.user = None;
        self.save()
    }

    pub fn is_authenticated(&self) -> bool {
        !self.base_url.is_empty() && self.token.is_some() && self.user.is_some()
    }

    /// (base_url, token) for an API call, when signed in.
    pub fn auth(&self) -> Option<(String, String)> {
        let token = self.token.clone()?;
        if self.base_url.is_empty() {
            return None;
        }
        Some((self.base_url.clone(), token))
    }
}

pub fn build_ui(app: &Application) {
    let session = Session::load();
    if session.is_authenticated() {
        crate::ui::main_window::show_main_window(app, session);
    } else {
        crate::ui::login::show_login_window(app);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logout_keeps_server_drops_identity() {
        let mut session = Session {
            base_url: "https://protrans.ma".into(),
            token: Some("jwt".into()),
            user: Some(SessionUser {
                id: "u1".into(),
                nom: "Sara".into(),
                email: "sara@exemple.ma".into(),
                role: "client".into(),
            }),
        };
        assert!(session.is_authenticated());
        session.token = None;
        session.user = None;
        assert!(!session.is_authenticated());
        assert!(session.auth().is_none());
        assert_eq!(session.base_url, "https://protrans.ma");
    }
}
