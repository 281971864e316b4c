use crate::errors::EnomError;
use once_cell::sync::Lazy;
use publicsuffix::{List, Psl};
use tracing::warn;

// ICANN section of the upstream list; private suffixes are not sold by registries
static PUBLIC_SUFFIXES: &str = include_str!("../data/public_suffix_list.dat");

// Global PSL instance - parsed once, read by every lookup
static PSL: Lazy<List> = Lazy::new(|| match PUBLIC_SUFFIXES.parse::<List>() {
    Ok(list) => list,
    Err(e) => {
        warn!("Failed to parse bundled public suffix list ({}), using default rule only", e);
        List::new()
    }
});

/// Split a domain name into its second-level label and public suffix.
///
/// `"www.example.co.uk"` gives `("example", "co.uk")`. The input is
/// lowercased first, and a name that is itself a public suffix is rejected.
pub fn parse_sld_and_tld(name: &str) -> Result<(String, String), EnomError> {
    let normalized = name.trim().trim_end_matches('.').to_lowercase();

    if normalized.is_empty() {
        return Err(EnomError::InvalidDomain("Empty domain".to_string()));
    }
    if !normalized.contains('.') || normalized.contains("..") || normalized.starts_with('.') {
        return Err(EnomError::InvalidDomain(format!("Invalid domain format: {}", name)));
    }

    let parsed = PSL
        .domain(normalized.as_bytes())
        .ok_or_else(|| EnomError::InvalidDomain(format!("{} is not a registrable domain", name)))?;

    let registrable = std::str::from_utf8(parsed.as_bytes())
        .map_err(|_| EnomError::InvalidDomain(format!("Invalid UTF-8 in domain: {}", name)))?;
    let tld = std::str::from_utf8(parsed.suffix().as_bytes())
        .map_err(|_| EnomError::InvalidDomain(format!("Invalid UTF-8 in TLD for domain: {}", name)))?;

    let sld = registrable
        .strip_suffix(tld)
        .and_then(|rest| rest.strip_suffix('.'))
        .filter(|sld| !sld.is_empty())
        .ok_or_else(|| EnomError::InvalidDomain(format!("No second-level label in {}", name)))?;

    Ok((sld.to_string(), tld.to_string()))
}
