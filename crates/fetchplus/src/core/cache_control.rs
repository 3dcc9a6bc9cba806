//! `Cache-Control` directive parsing.

/// Parsed `max-stale` request directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxStale {
    /// `max-stale` without a value: any staleness is acceptable.
    Any,
    Seconds(u64),
}

/// Directives a private cache acts on.
///
/// Shared-cache directives (`s-maxage`, `proxy-revalidate`, `private`) have
/// no effect on a private cache and are skipped like unknown ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheControl {
    pub max_age: Option<u64>,
    pub min_fresh: Option<u64>,
    pub max_stale: Option<MaxStale>,
    pub no_cache: bool,
    pub no_store: bool,
    pub must_revalidate: bool,
    pub public: bool,
    pub immutable: bool,
}

impl CacheControl {
    /// Parse a header value. Unknown directives are ignored; a numeric
    /// directive with an unparsable value counts as zero.
    pub fn parse(header: &str) -> Self {
        let mut control = Self::default();

        for directive in header.split(',') {
            let directive = directive.trim();
            if directive.is_empty() {
                continue;
            }

            let (name, value) = match directive.split_once('=') {
                Some((name, value)) => (name.trim(), Some(value.trim().trim_matches('"'))),
                None => (directive, None),
            };
            let seconds = || value.map(|v| v.parse::<u64>().unwrap_or(0));

            match name.to_ascii_lowercase().as_str() {
                "max-age" => control.max_age = seconds(),
                "min-fresh" => control.min_fresh = seconds(),
                "max-stale" => {
                    control.max_stale = Some(match seconds() {
                        Some(s) => MaxStale::Seconds(s),
                        None => MaxStale::Any,
                    })
                }
                "no-cache" => control.no_cache = true,
                "no-store" => control.no_store = true,
                "must-revalidate" => control.must_revalidate = true,
                "public" => control.public = true,
                "immutable" => control.immutable = true,
                _ => {}
            }
        }

        control
    }

    /// Parse an optional header value, treating absence as no directives.
    pub fn from_header(header: Option<&str>) -> Self {
        header.map(Self::parse).unwrap_or_default()
    }
}
