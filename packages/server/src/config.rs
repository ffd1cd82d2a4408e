/// Listen address read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `BIND_ADDR`, default `127.0.0.1`.
    pub bind_addr: String,
    /// `PORT`, default 8080.
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("BIND_ADDR").ok(),
            std::env::var("PORT").ok(),
        )
    }

    fn from_vars(bind_addr: Option<String>, port: Option<String>) -> Self {
        Self {
            bind_addr: bind_addr.unwrap_or_else(|| "127.0.0.1".to_string()),
            port: port.and_then(|p| p.parse().ok()).unwrap_or(8080),
        }
    }
}
