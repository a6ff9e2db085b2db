//! One-shot notices carried across a redirect in a short-lived cookie.

pub const FLASH_COOKIE: &str = "penlog_flash";

/// `Set-Cookie` value that drops a delivered notice.
pub const CLEAR_FLASH: &str = "penlog_flash=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0";

/// User-visible notices. Only the first two travel through the cookie; the
/// login failures are rendered directly on the login page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    LoginRequired,
    EmailTaken,
    UnknownEmail,
    IncorrectPassword,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::LoginRequired => "Login Required!",
            Notice::EmailTaken => {
                "The email you are trying to register is already exist please login!"
            }
            Notice::UnknownEmail => "The Email You Entered does not Exist please Register now!",
            Notice::IncorrectPassword => "Incorrect Password!",
        }
    }

    fn key(&self) -> &'static str {
        match self {
            Notice::LoginRequired => "login-required",
            Notice::EmailTaken => "email-taken",
            Notice::UnknownEmail => "unknown-email",
            Notice::IncorrectPassword => "incorrect-password",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        [
            Notice::LoginRequired,
            Notice::EmailTaken,
            Notice::UnknownEmail,
            Notice::IncorrectPassword,
        ]
        .into_iter()
        .find(|n| n.key() == key)
    }

    /// `Set-Cookie` value that queues this notice for the next page.
    pub fn cookie(&self) -> String {
        format!(
            "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age=300",
            FLASH_COOKIE,
            self.key()
        )
    }

    pub fn from_cookie(value: &str) -> Option<Self> {
        Self::from_key(value)
    }
}
