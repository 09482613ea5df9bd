use std::sync::{Arc, Mutex};

use crate::api::types::UserInfo;

/// Process-wide session state, passed into the client explicitly instead of
/// living in ambient storage. Established on login or registration, cleared
/// on logout or whenever the backend answers 401.
#[derive(Default)]
pub struct Session {
    token: Option<String>,
    user: Option<UserInfo>,
}

impl Session {
    pub fn establish(&mut self, token: String, user: UserInfo) {
        self.token = Some(token);
        self.user = Some(user);
    }

    pub fn clear(&mut self) {
        self.token = None;
        self.user = None;
    }

    pub fn token(&self) -> Option<String> {
        self.token.clone()
    }

    pub fn user(&self) -> Option<UserInfo> {
        self.user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

pub type SharedSession = Arc<Mutex<Session>>;

pub fn shared() -> SharedSession {
    Arc::new(Mutex::new(Session::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> UserInfo {
        UserInfo {
            username: name.to_string(),
        }
    }

    #[test]
    fn establish_stores_token_and_user() {
        let mut session = Session::default();
        assert!(!session.is_authenticated());

        session.establish("abc123".to_string(), user("maria"));
        assert!(session.is_authenticated());
        assert_eq!(session.token().as_deref(), Some("abc123"));
        assert_eq!(session.user().unwrap().username, "maria");
    }

    #[test]
    fn clear_wipes_everything() {
        let mut session = Session::default();
        session.establish("abc123".to_string(), user("maria"));

        session.clear();
        assert!(!session.is_authenticated());
        assert!(session.token().is_none());
        assert!(session.user().is_none());
    }
}
