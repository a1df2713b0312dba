use std::{
    sync::{Arc, LazyLock, RwLock},
    time::Duration,
};

use ureq::{Agent, Proxy};

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub user_agent: Option<String>,
    pub proxy: Option<Proxy>,
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: Some("perk-rt/perk".into()),
            proxy: None,
            timeout: None,
        }
    }
}

impl ClientConfig {
    /// Builds an HTTP `Agent` configured from this `ClientConfig`.
    pub fn build(&self) -> Agent {
        let mut config = ureq::Agent::config_builder()
            .proxy(self.proxy.clone())
            .timeout_global(self.timeout);

        if let Some(user_agent) = &self.user_agent {
            config = config.user_agent(user_agent);
        }

        config.build().into()
    }
}

static SHARED_AGENT_STATE: LazyLock<Arc<RwLock<Agent>>> =
    LazyLock::new(|| Arc::new(RwLock::new(ClientConfig::default().build())));

/// Replaces the process-wide HTTP agent.
///
/// Called once at startup when the CLI applies proxy/timeout settings from
/// its configuration file.
pub fn configure_http_client(config: &ClientConfig) {
    let mut agent = SHARED_AGENT_STATE.write().unwrap();
    *agent = config.build();
}

/// Returns a clone of the shared HTTP agent.
pub fn shared_agent() -> Agent {
    SHARED_AGENT_STATE.read().unwrap().clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.user_agent.as_deref(), Some("perk-rt/perk"));
        assert!(cfg.proxy.is_none());
        assert!(cfg.timeout.is_none());
    }

    #[test]
    fn test_configure_replaces_agent() {
        configure_http_client(&ClientConfig {
            user_agent: Some("perk-test".into()),
            proxy: None,
            timeout: Some(Duration::from_secs(5)),
        });
        let _agent = shared_agent();
        configure_http_client(&ClientConfig::default());
    }
}
