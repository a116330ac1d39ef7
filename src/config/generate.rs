pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# SEARCH-EXPORT CONFIGURATION
# =============================================================================
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/search-export/config.yml
#   3. /etc/search-export/config.yml
#
# Values may reference environment variables with $env{VAR_NAME}.

# =============================================================================
# SERVER
# =============================================================================
# Management endpoint of the search service.

server:
  # 'http' or 'https'
  scheme: https
  host: localhost
  port: 8089
  # Per-request timeout (humantime: 30s, 2m, ...)
  timeout: 30s
  # Accept self-signed certificates without verification
  accept_invalid_certs: false
  # Extra trusted root certificate (PEM), optional
  # ca_cert: ~/.config/search-export/ca.pem

# =============================================================================
# CREDENTIALS
# =============================================================================

credentials:
  username: admin
  password: $env{SPLUNK_PASSWORD}

# =============================================================================
# NAMESPACE (optional)
# =============================================================================
# Owner/app context for REST resources. Omit to use the default 'services' root.

# namespace:
#   owner: nobody
#   app: search
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[test]
    fn test_starter_config_parses() {
        std::env::set_var("SPLUNK_PASSWORD", "changeme");
        let config = parse_config(&generate_starter_config()).unwrap();
        assert_eq!(config.server.host, "localhost");
        assert_eq!(config.credentials.password, "changeme");
        assert!(config.namespace.is_default());
    }
}
