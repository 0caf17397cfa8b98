//! Basemap configuration. Tile servers are third-party network resources;
//! the engine only selects among a fixed set of named configurations and
//! never manages availability or caching.

/// Named basemap selections.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Basemap {
    Street,
    Terrain,
    Hybrid,
    Satellite,
}

/// Tile source configuration for one basemap.
pub struct BasemapConfig {
    pub name: &'static str,
    pub url_template: &'static str,
    pub attribution: &'static str,
    /// Hybrid stacks a translucent street layer over imagery.
    pub overlay_template: Option<&'static str>,
}

impl Basemap {
    pub const ALL: [Basemap; 4] =
        [Basemap::Street, Basemap::Terrain, Basemap::Hybrid, Basemap::Satellite];

    pub fn config(self) -> BasemapConfig {
        match self {
            Basemap::Street => BasemapConfig {
                name: "street",
                url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
                attribution: "© OpenStreetMap contributors",
                overlay_template: None,
            },
            Basemap::Terrain => BasemapConfig {
                name: "terrain",
                url_template: "https://{s}.tile.opentopomap.org/{z}/{x}/{y}.png",
                attribution: "© OpenStreetMap contributors",
                overlay_template: None,
            },
            Basemap::Hybrid => BasemapConfig {
                name: "hybrid",
                url_template: "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
                attribution: "© Esri",
                overlay_template: Some("https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png"),
            },
            Basemap::Satellite => BasemapConfig {
                name: "satellite",
                url_template: "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
                attribution: "© Esri",
                overlay_template: None,
            },
        }
    }

    /// Next basemap in the fixed cycle (shell hotkey).
    pub fn next(self) -> Basemap {
        match self {
            Basemap::Street => Basemap::Terrain,
            Basemap::Terrain => Basemap::Hybrid,
            Basemap::Hybrid => Basemap::Satellite,
            Basemap::Satellite => Basemap::Street,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_visits_all() {
        let mut seen = Vec::new();
        let mut b = Basemap::Satellite;
        for _ in 0..4 {
            b = b.next();
            seen.push(b);
        }
        for expected in Basemap::ALL {
            assert!(seen.contains(&expected));
        }
        assert_eq!(b, Basemap::Satellite);
    }

    #[test]
    fn test_only_hybrid_stacks_an_overlay() {
        for b in Basemap::ALL {
            let has_overlay = b.config().overlay_template.is_some();
            assert_eq!(has_overlay, b == Basemap::Hybrid);
        }
    }
}
