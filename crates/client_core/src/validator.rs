//! Format predicates for the credential and domain fields.

const TOKEN_LEN: usize = 64;
const MAX_HOST_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;
const STRIPPED_PREFIXES: [&str; 3] = ["http://", "https://", "www."];

pub trait Validator: Send + Sync {
    fn is_token_valid(&self, token: &str) -> bool;
    fn is_domain_valid(&self, domain: &str) -> bool;
}

/// Default predicates: access tokens are 64 hex digits, domains are plain
/// host names with an optional port.
#[derive(Debug, Default, Clone, Copy)]
pub struct FormatValidator;

impl Validator for FormatValidator {
    fn is_token_valid(&self, token: &str) -> bool {
        token.len() == TOKEN_LEN && token.bytes().all(|b| b.is_ascii_hexdigit())
    }

    fn is_domain_valid(&self, domain: &str) -> bool {
        let (host, port) = match domain.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (domain, None),
        };

        if let Some(port) = port {
            match port.parse::<u16>() {
                Ok(port) if port > 0 => {}
                _ => return false,
            }
        }

        is_host_name(host)
    }
}

fn is_host_name(host: &str) -> bool {
    if host.is_empty() || host.len() > MAX_HOST_LEN {
        return false;
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= MAX_LABEL_LEN
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    });

    let tld_ok = labels
        .last()
        .is_some_and(|tld| tld.len() >= 2 && tld.bytes().all(|b| b.is_ascii_lowercase()));

    labels_ok && tld_ok
}

/// Normalizes user input into a bare host: trims, lower-cases and strips any
/// leading scheme or `www.` prefix. Applying it twice yields the same string.
pub fn normalize_domain(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let mut host = lowered.as_str();

    while let Some(rest) = strip_known_prefix(host) {
        host = rest.trim_start();
    }

    host.to_string()
}

fn strip_known_prefix(host: &str) -> Option<&str> {
    STRIPPED_PREFIXES
        .iter()
        .find_map(|prefix| host.strip_prefix(*prefix))
}

#[cfg(test)]
#[path = "tests/validator_tests.rs"]
mod tests;
