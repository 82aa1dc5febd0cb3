use crate::domain_model::SessionToken;

pub const SESSION_COOKIE: &str = "session_id";
pub const SESSION_HEADER: &str = "x-session-id";

/// Builds `Set-Cookie` values for the session token.
#[derive(Debug, Clone, Copy)]
pub struct SessionCookie {
    pub secure: bool,
}

impl SessionCookie {
    pub fn issue(&self, token: &SessionToken) -> String {
        self.render(&token.0, None)
    }

    pub fn clear(&self) -> String {
        self.render("", Some(0))
    }

    fn render(&self, value: &str, max_age: Option<u64>) -> String {
        let mut cookie = format!("{}={}; HttpOnly; SameSite=Lax; Path=/", SESSION_COOKIE, value);
        if let Some(max_age) = max_age {
            cookie.push_str(&format!("; Max-Age={}", max_age));
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_cookie_is_http_only() {
        let cookie = SessionCookie { secure: false }.issue(&SessionToken("abc.def".into()));
        assert_eq!(cookie, "session_id=abc.def; HttpOnly; SameSite=Lax; Path=/");
    }

    #[test]
    fn cleared_cookie_expires_now() {
        let cookie = SessionCookie { secure: true }.clear();
        assert_eq!(
            cookie,
            "session_id=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0; Secure"
        );
    }
}
