use std::env;

#[derive(Clone)]
pub struct SecurityConfig {
    /// Bearer secret expected by the cron endpoints (env: `CENTERBOOK_CRON_SECRET`).
    /// `None` rejects every cron call.
    pub cron_secret: Option<String>,
}

impl SecurityConfig {
    pub fn from_env() -> Self {
        Self {
            cron_secret: env::var("CENTERBOOK_CRON_SECRET")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        }
    }
}

// Keep the secret out of logs.
impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("cron_secret", &self.cron_secret.as_ref().map(|_| "****"))
            .finish()
    }
}
