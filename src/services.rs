//! Service registry: command aliases → upstream services.
//!
//! Two static tables feed the registry: bypass services (cloud-storage link
//! resolvers) and poster workers (OTT artwork scrapers). Endpoints can be
//! overridden once, at construction.

use std::collections::HashMap;

/// Canonical id of the bulk bypass endpoint (not reachable through an alias).
pub const BULK_SERVICE_ID: &str = "bypass_bulk";

/// What a service produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    /// Direct-download link resolver
    Bypass,
    /// OTT poster / thumbnail scraper
    Poster,
}

/// How the target URL is handed to the upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestShape {
    /// `GET <endpoint><url-encoded target>`
    GetQuery,
    /// `POST <endpoint>` with a JSON body
    PostJson,
}

/// Immutable description of one upstream service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// Canonical id, also used as cache namespace
    pub id: &'static str,
    /// Human-readable name for messages
    pub display_name: &'static str,
    /// Command aliases (lowercase, no slash)
    pub aliases: &'static [&'static str],
    /// Bypass or poster
    pub kind: ServiceKind,
    /// Endpoint prefix; `None` when an operator-specific service is not configured
    pub endpoint: Option<String>,
    /// Request shape
    pub request: RequestShape,
    /// Operator-specific service with its own endpoint construction
    pub custom: bool,
}

struct ServiceSpec {
    id: &'static str,
    display_name: &'static str,
    aliases: &'static [&'static str],
    endpoint: &'static str,
    request: RequestShape,
    custom: bool,
}

const fn get(
    id: &'static str,
    display_name: &'static str,
    aliases: &'static [&'static str],
    endpoint: &'static str,
) -> ServiceSpec {
    ServiceSpec {
        id,
        display_name,
        aliases,
        endpoint,
        request: RequestShape::GetQuery,
        custom: false,
    }
}

const BYPASS_SERVICES: &[ServiceSpec] = &[
    get(
        "gdflix",
        "GDFlix",
        &["gdflix", "gdf"],
        "https://hgbots.vercel.app/bypaas/gd.php?url=",
    ),
    get(
        "hubcloud",
        "HubCloud",
        &["hubcloud", "hc"],
        "https://hgbots.vercel.app/bypaas/hubcloud.php?url=",
    ),
    get(
        "hubdrive",
        "HubDrive",
        &["hubdrive", "hd"],
        "https://hgbots.vercel.app/bypaas/hubdrive.php?url=",
    ),
    ServiceSpec {
        id: "transfer_it",
        display_name: "Transfer.it",
        aliases: &["transfer_it", "ti"],
        endpoint: "https://transfer-it-henna.vercel.app/post",
        request: RequestShape::PostJson,
        custom: false,
    },
    get(
        "terabox",
        "Terabox",
        &["terabox", "tb"],
        "https://true-link-vercel-api.vercel.app/api/terabox/api?url=",
    ),
    get(
        "bypass",
        "Bypass",
        &["bypass", "bp"],
        "https://true-link-vercel-api.vercel.app/api/bypass?url=",
    ),
    // Endpoint comes from `GOFILE_API_URL`.
    ServiceSpec {
        id: "gofile",
        display_name: "Gofile",
        aliases: &["gofile", "gf"],
        endpoint: "",
        request: RequestShape::GetQuery,
        custom: true,
    },
    ServiceSpec {
        id: BULK_SERVICE_ID,
        display_name: "Bulk Bypass",
        aliases: &[],
        endpoint: "https://true-link-vercel-api.vercel.app/api/bypass-bulk",
        request: RequestShape::PostJson,
        custom: false,
    },
];

const POSTER_SERVICES: &[ServiceSpec] = &[
    get("primevideo", "Prime Video", &["prime", "pv"], "https://primevideo.the-zake.workers.dev/?url="),
    get("zee5", "ZEE5", &["zee5", "z5"], "https://zee5.the-zake.workers.dev/?url="),
    get("appletv", "Apple TV+", &["appletv", "atv"], "https://appletv.the-zake.workers.dev/?url="),
    get("airtelxstream", "Airtel Xstream", &["airtel", "ax"], "https://airtelxstream.the-zake.workers.dev/?url="),
    get("sunnxt", "Sun NXT", &["sunnxt", "sn"], "https://sunnxt.the-zake.workers.dev/?url="),
    get("ahavideo", "Aha Video", &["aha", "ah"], "https://ahavideo.the-zake.workers.dev/?url="),
    get("iqiyi", "iQIYI", &["iqiyi", "iq"], "https://iqiyi.the-zake.workers.dev/?url="),
    get("wetv", "WeTV", &["wetv", "wt"], "https://wetv.the-zake.workers.dev/?url="),
    get("shemaroo", "ShemarooMe", &["shemaroo", "sm"], "https://shemaroo.the-zake.workers.dev/?url="),
    get("bookmyshow", "BookMyShow", &["bms", "bm"], "https://bookmyshow.the-zake.workers.dev/?url="),
    get("plextv", "Plex TV", &["plex", "px"], "https://plextv.the-zake.workers.dev/?url="),
    get("addatimes", "Addatimes", &["adda", "ad"], "https://addatimes.the-zake.workers.dev/?url="),
    get("stage", "Stage", &["stage", "stg"], "https://stage.the-zake.workers.dev/?url="),
    get("netflix", "Netflix", &["netflix", "nf"], "https://netflix.the-zake.workers.dev/?url="),
    get("mxplayer", "MX Player", &["mxplayer", "mx"], "https://mxplayer.the-zake.workers.dev/?url="),
    get("ytdl", "YouTube", &["youtube", "yt"], "https://youtubedl.the-zake.workers.dev/?url="),
    get("instagram", "Instagram", &["instagram", "ig"], "https://instagramdl.the-zake.workers.dev/?url="),
    get("facebook", "Facebook", &["facebook", "fb"], "https://facebookdl.the-zake.workers.dev/?url="),
    get("tiktok", "TikTok", &["tiktok", "tk"], "https://tiktokdl.the-zake.workers.dev/?url="),
    get("hotstar", "Disney+ Hotstar", &["hotstar", "hs"], "https://hotstar.the-zake.workers.dev/?url="),
    get("sonyliv", "SonyLIV", &["sonyliv", "sl"], "https://sonyliv.the-zake.workers.dev/?url="),
    get("voot", "Voot", &["voot", "vo"], "https://voot.the-zake.workers.dev/?url="),
    get("jiocinema", "JioCinema", &["jiocinema", "jc"], "https://jiocinema.the-zake.workers.dev/?url="),
];

/// Normalizes a raw command token into a lookup key.
///
/// Strips a leading `/`, drops an `@botname` suffix and lowercases.
#[must_use]
pub fn normalize_alias(raw: &str) -> String {
    let token = raw.trim().trim_start_matches('/');
    let token = token.split('@').next().unwrap_or_default();
    token.to_lowercase()
}

/// Alias → service lookup over the built-in tables
#[derive(Debug, Clone)]
pub struct ServiceRegistry {
    services: Vec<ServiceDescriptor>,
    by_alias: HashMap<&'static str, usize>,
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new(&HashMap::new())
    }
}

impl ServiceRegistry {
    /// Builds the registry, replacing endpoints for the ids in `overrides`.
    #[must_use]
    pub fn new(overrides: &HashMap<String, String>) -> Self {
        let specs = BYPASS_SERVICES
            .iter()
            .map(|s| (s, ServiceKind::Bypass))
            .chain(POSTER_SERVICES.iter().map(|s| (s, ServiceKind::Poster)));

        let mut services = Vec::new();
        let mut by_alias = HashMap::new();

        for (spec, kind) in specs {
            let endpoint = overrides
                .get(spec.id)
                .cloned()
                .or_else(|| (!spec.endpoint.is_empty()).then(|| spec.endpoint.to_string()));

            for alias in spec.aliases {
                by_alias.insert(*alias, services.len());
            }
            services.push(ServiceDescriptor {
                id: spec.id,
                display_name: spec.display_name,
                aliases: spec.aliases,
                kind,
                endpoint,
                request: spec.request,
                custom: spec.custom,
            });
        }

        Self { services, by_alias }
    }

    /// Builds the registry from settings-derived endpoints.
    #[must_use]
    pub fn from_settings(settings: &crate::config::Settings) -> Self {
        let mut overrides = HashMap::new();
        if let Some(url) = &settings.gofile_api_url {
            overrides.insert("gofile".to_string(), url.clone());
        }
        Self::new(&overrides)
    }

    /// Resolves a command alias (`/GDF@my_bot`, `gdf`, ...) to its service.
    #[must_use]
    pub fn resolve(&self, alias: &str) -> Option<&ServiceDescriptor> {
        let key = normalize_alias(alias);
        self.by_alias.get(key.as_str()).map(|&i| &self.services[i])
    }

    /// Looks a service up by canonical id.
    #[must_use]
    pub fn by_id(&self, id: &str) -> Option<&ServiceDescriptor> {
        self.services.iter().find(|s| s.id == id)
    }

    /// All services of a kind that users can reach through an alias, in table order.
    pub fn of_kind(&self, kind: ServiceKind) -> impl Iterator<Item = &ServiceDescriptor> {
        self.services
            .iter()
            .filter(move |s| s.kind == kind && !s.aliases.is_empty())
    }
}

/// Human-readable name for a service id, falling back to title case.
#[must_use]
pub fn display_name(id: &str) -> String {
    BYPASS_SERVICES
        .iter()
        .chain(POSTER_SERVICES)
        .find(|s| s.id == id)
        .map_or_else(|| crate::normalize::labels::title_case(id), |s| s.display_name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_short_alias() {
        let registry = ServiceRegistry::default();
        let svc = registry.resolve("gdf").map(|s| s.id);
        assert_eq!(svc, Some("gdflix"));
    }

    #[test]
    fn test_resolve_strips_slash_botname_and_case() {
        let registry = ServiceRegistry::default();
        assert_eq!(registry.resolve("/HC@relay_bot").map(|s| s.id), Some("hubcloud"));
        assert_eq!(registry.resolve("/nf").map(|s| s.id), Some("netflix"));
    }

    #[test]
    fn test_unknown_alias() {
        let registry = ServiceRegistry::default();
        assert!(registry.resolve("/nope").is_none());
        assert!(registry.resolve("").is_none());
        assert!(registry.resolve(BULK_SERVICE_ID).is_none());
    }

    #[test]
    fn test_transfer_it_posts_json() {
        let registry = ServiceRegistry::default();
        let svc = registry.resolve("ti");
        assert_eq!(svc.map(|s| s.request), Some(RequestShape::PostJson));
    }

    #[test]
    fn test_gofile_needs_configuration() {
        let registry = ServiceRegistry::default();
        let svc = registry.resolve("gf");
        assert!(svc.is_some_and(|s| s.custom && s.endpoint.is_none()));

        let mut overrides = HashMap::new();
        overrides.insert("gofile".to_string(), "https://gf.example/?id=".to_string());
        let registry = ServiceRegistry::new(&overrides);
        assert_eq!(
            registry.resolve("gofile").and_then(|s| s.endpoint.as_deref()),
            Some("https://gf.example/?id=")
        );
    }

    #[test]
    fn test_kinds_are_partitioned() {
        let registry = ServiceRegistry::default();
        assert_eq!(registry.of_kind(ServiceKind::Poster).count(), 23);
        assert!(registry
            .of_kind(ServiceKind::Bypass)
            .all(|s| s.id != BULK_SERVICE_ID));
        assert!(registry.by_id(BULK_SERVICE_ID).is_some());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("transfer_it"), "Transfer.it");
        assert_eq!(display_name("something_new"), "Something New");
    }
}
