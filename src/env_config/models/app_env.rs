use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Env {
    Local,
    Dev,
    Prod,
}

impl FromStr for Env {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Env::Local),
            "dev" => Ok(Env::Dev),
            "prod" => Ok(Env::Prod),
            other => Err(format!("unknown environment: {}", other)),
        }
    }
}

impl fmt::Display for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Env::Local => write!(f, "local"),
            Env::Dev => write!(f, "dev"),
            Env::Prod => write!(f, "prod"),
        }
    }
}

/// Values that come from the process environment (secrets and deployment paths).
pub struct AppEnv {
    pub env: Env,
    pub telegram_bot_token: String,
    pub db_path: String,
    pub coingecko_api_key: Option<String>,
}

impl AppEnv {
    pub fn is_local(&self) -> bool {
        self.env == Env::Local
    }
}

// Token stays out of debug dumps of the settings.
impl fmt::Debug for AppEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppEnv")
            .field("env", &self.env)
            .field("telegram_bot_token", &"***")
            .field("db_path", &self.db_path)
            .field(
                "coingecko_api_key",
                &self.coingecko_api_key.as_ref().map(|_| "***"),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_from_str() {
        assert_eq!(Env::from_str("local"), Ok(Env::Local));
        assert_eq!(Env::from_str("PROD"), Ok(Env::Prod));
        assert_eq!(Env::from_str(" dev "), Ok(Env::Dev));
        assert!(Env::from_str("staging").is_err());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let env = AppEnv {
            env: Env::Local,
            telegram_bot_token: "123:secret".to_string(),
            db_path: "test.db".to_string(),
            coingecko_api_key: Some("cg-key".to_string()),
        };
        let dump = format!("{:?}", env);
        assert!(!dump.contains("secret"));
        assert!(!dump.contains("cg-key"));
        assert!(dump.contains("test.db"));
    }
}
