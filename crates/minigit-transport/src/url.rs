use crate::TransportError;

/// URL scheme for remote repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scheme::Http => write!(f, "http"),
            Scheme::Https => write!(f, "https"),
        }
    }
}

/// A parsed remote repository URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitUrl {
    pub scheme: Scheme,
    pub host: String,
    pub port: Option<u16>,
    /// Repository path, with any trailing `/` stripped.
    pub path: String,
}

impl GitUrl {
    /// Parse an `http://` or `https://` repository URL.
    pub fn parse(input: &str) -> Result<Self, TransportError> {
        let (scheme, rest) = if let Some(rest) = input.strip_prefix("https://") {
            (Scheme::Https, rest)
        } else if let Some(rest) = input.strip_prefix("http://") {
            (Scheme::Http, rest)
        } else {
            let scheme = input.split("://").next().unwrap_or(input);
            return Err(TransportError::UnsupportedScheme(scheme.to_string()));
        };

        let (authority, path) = match rest.find('/') {
            Some(slash) => (&rest[..slash], &rest[slash..]),
            None => (rest, ""),
        };

        if authority.is_empty() {
            return Err(TransportError::InvalidUrl(format!("missing host: {input}")));
        }

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port_str)) => {
                let port: u16 = port_str.parse().map_err(|_| {
                    TransportError::InvalidUrl(format!("invalid port: {port_str}"))
                })?;
                (host.to_string(), Some(port))
            }
            None => (authority.to_string(), None),
        };

        Ok(Self {
            scheme,
            host,
            port,
            path: path.trim_end_matches('/').to_string(),
        })
    }

    /// The base URL string, without a trailing slash.
    pub fn base(&self) -> String {
        let mut out = format!("{}://{}", self.scheme, self.host);
        if let Some(port) = self.port {
            out.push_str(&format!(":{port}"));
        }
        out.push_str(&self.path);
        out
    }
}

impl std::fmt::Display for GitUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.base())
    }
}
