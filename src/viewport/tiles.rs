//! Tile-source construction for the external deep-zoom engine.
//!
//! The viewer hands the tile engine one source per page (slice), built
//! for whichever backend protocol the configuration names:
//!
//! - **File**: each slice is a plain tile-file pyramid under the data
//!   root; the engine asks us for per-tile URLs.
//! - **IIIF**: each slice is a remote image-info endpoint URL; per-tile
//!   URLs are the server's own business.
//! - **IIP**: one pyramidal-image descriptor is fetched once and reused
//!   for every slice (all slices share tile geometry); per-tile URLs
//!   come from level/scale-factor bookkeeping plus optional
//!   gamma/contrast query parameters.

use crate::config::{BackendMode, ViewerConfig};
use crate::model::Plane;

/// Image geometry of an IIP pyramidal image, fetched once from the
/// server's metadata endpoint.
#[derive(Debug, Clone, Copy)]
pub struct IipImageInfo {
    /// Full-resolution width in pixels.
    pub width: u32,
    /// Full-resolution height in pixels.
    pub height: u32,
    /// Tile edge length in pixels.
    pub tile_size: u32,
    /// Number of pyramid levels the server exposes.
    pub num_resolutions: u32,
}

/// One tile source, addressed to a specific plane and slice.
#[derive(Debug, Clone)]
pub struct TileSource {
    /// Plane this source belongs to.
    pub plane: Plane,
    /// Slice index within the plane.
    pub slice: usize,
    /// Protocol-specific descriptor.
    pub kind: TileSourceKind,
}

/// Protocol-specific part of a tile source.
#[derive(Debug, Clone)]
pub enum TileSourceKind {
    /// File pyramid; the engine computes per-tile URLs through
    /// [`FilePyramidSource::tile_url`].
    File(FilePyramidSource),
    /// IIIF: plain info-endpoint URL.
    IiifUrl(String),
    /// IIP pyramid descriptor with per-tile URL derivation.
    Iip(IipTileSource),
}

/// Descriptor of a file-based tile pyramid for one slice.
#[derive(Debug, Clone)]
pub struct FilePyramidSource {
    base: String,
    /// Source image edge length in pixels.
    pub width: u32,
    /// Source image edge length in pixels.
    pub height: u32,
}

impl FilePyramidSource {
    /// URL of one tile.
    pub fn tile_url(&self, level: u32, x: u32, y: u32) -> String {
        format!("{}/{}/{}_{}.jpg", self.base, level, x, y)
    }
}

/// Descriptor of the shared IIP pyramid, bound to one slice's image path.
#[derive(Debug, Clone)]
pub struct IipTileSource {
    base_url: String,
    image_path: String,
    /// Full-resolution width in pixels.
    pub width: u32,
    /// Full-resolution height in pixels.
    pub height: u32,
    /// Tile edge length in pixels.
    pub tile_size: u32,
    /// Smallest pyramid level (coarsest).
    pub min_level: u32,
    /// Largest pyramid level (full resolution).
    pub max_level: u32,
    gamma: Option<f64>,
    contrast: Option<f64>,
}

impl IipTileSource {
    /// Downscale factor of a level relative to full resolution.
    fn level_scale(&self, level: u32) -> f64 {
        1.0 / f64::from(1u32 << (self.max_level - level.min(self.max_level)))
    }

    /// Number of tile columns at a level.
    ///
    /// `x_tiles_at(level) = ceil(x_tiles_at_max_level * level_scale)`.
    pub fn x_tiles_at(&self, level: u32) -> u32 {
        let at_max = self.width.div_ceil(self.tile_size);
        (f64::from(at_max) * self.level_scale(level)).ceil() as u32
    }

    /// URL of one tile: the server takes a flat tile index per level.
    pub fn tile_url(&self, level: u32, x: u32, y: u32) -> String {
        let index = y * self.x_tiles_at(level) + x;
        let mut url = format!(
            "{}?FIF={}&JTL={},{}",
            self.base_url, self.image_path, level, index
        );
        if let Some(gamma) = self.gamma {
            url.push_str(&format!("&GAM={}", gamma));
        }
        if let Some(contrast) = self.contrast {
            url.push_str(&format!("&CNT={}", contrast));
        }
        url
    }
}

/// Build the ordered tile-source list for every slice of every enabled
/// plane, in flat page order.
///
/// `iip_info` carries the pyramid geometry for the IIP backend; passing
/// `None` under IIP yields an empty list (the caller fetches the info
/// first).
pub fn build_tile_sources(
    config: &ViewerConfig,
    gamma: Option<f64>,
    contrast: Option<f64>,
    iip_info: Option<&IipImageInfo>,
) -> Vec<TileSource> {
    let multi_plane = Plane::ALL
        .iter()
        .filter(|p| config.slide_count(**p) > 0)
        .count()
        > 1;

    let mut sources = Vec::with_capacity(config.total_pages());
    for plane in Plane::ALL {
        for slice in 0..config.slide_count(plane) {
            let kind = match &config.backend {
                BackendMode::File => {
                    // Plane label only disambiguates multi-plane data sets.
                    let base = if multi_plane {
                        format!(
                            "{}/{}/{}/{}",
                            config.data_root_path,
                            config.layer,
                            plane.name(),
                            slice
                        )
                    } else {
                        format!("{}/{}/{}", config.data_root_path, config.layer, slice)
                    };
                    TileSourceKind::File(FilePyramidSource {
                        base,
                        width: config.image_size,
                        height: config.image_size,
                    })
                }
                BackendMode::Iiif { base_url } => TileSourceKind::IiifUrl(format!(
                    "{}/{}/{}/{}/info.json",
                    base_url,
                    config.layer,
                    plane.name(),
                    slice
                )),
                BackendMode::Iip {
                    base_url,
                    image_path,
                } => {
                    let Some(info) = iip_info else {
                        log::warn!("IIP backend without image info; no tile sources built");
                        return Vec::new();
                    };
                    let path = image_path
                        .replace("{plane}", plane.name())
                        .replace("{slice}", &slice.to_string());
                    TileSourceKind::Iip(IipTileSource {
                        base_url: base_url.clone(),
                        image_path: path,
                        width: info.width,
                        height: info.height,
                        tile_size: info.tile_size,
                        min_level: 0,
                        max_level: info.num_resolutions.saturating_sub(1),
                        gamma,
                        contrast,
                    })
                }
            };
            sources.push(TileSource { plane, slice, kind });
        }
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;

    #[test]
    fn test_file_sources_in_page_order() {
        let config = test_config();
        let sources = build_tile_sources(&config, None, None, None);
        assert_eq!(sources.len(), 30);
        assert_eq!(sources[0].plane, Plane::Axial);
        assert_eq!(sources[10].plane, Plane::Coronal);
        assert_eq!(sources[10].slice, 0);
        let TileSourceKind::File(pyramid) = &sources[10].kind else {
            panic!("expected file pyramid");
        };
        assert_eq!(
            pyramid.tile_url(12, 3, 4),
            "/data/atlas/nissl/coronal/0/12/3_4.jpg"
        );
    }

    #[test]
    fn test_single_plane_omits_plane_label() {
        let mut config = test_config();
        config.planes[Plane::Coronal.index()].enabled = false;
        let sources = build_tile_sources(&config, None, None, None);
        assert_eq!(sources.len(), 10);
        let TileSourceKind::File(pyramid) = &sources[2].kind else {
            panic!("expected file pyramid");
        };
        assert!(pyramid.tile_url(0, 0, 0).starts_with("/data/atlas/nissl/2/"));
    }

    #[test]
    fn test_iiif_sources_are_info_urls() {
        let mut config = test_config();
        config.backend = BackendMode::Iiif {
            base_url: "https://tiles.example.org".to_string(),
        };
        let sources = build_tile_sources(&config, None, None, None);
        let TileSourceKind::IiifUrl(url) = &sources[11].kind else {
            panic!("expected IIIF url");
        };
        assert_eq!(url, "https://tiles.example.org/nissl/coronal/1/info.json");
    }

    #[test]
    fn test_iip_tile_math_and_urls() {
        let mut config = test_config();
        config.backend = BackendMode::Iip {
            base_url: "https://iip.example.org/fcgi-bin/iipsrv.fcgi".to_string(),
            image_path: "/atlas/{plane}/{slice}.tif".to_string(),
        };
        let info = IipImageInfo {
            width: 1000,
            height: 1000,
            tile_size: 256,
            num_resolutions: 4,
        };
        let sources = build_tile_sources(&config, Some(1.5), None, Some(&info));
        let TileSourceKind::Iip(iip) = &sources[0].kind else {
            panic!("expected IIP source");
        };
        assert_eq!(iip.max_level, 3);
        // ceil(1000 / 256) = 4 columns at full resolution.
        assert_eq!(iip.x_tiles_at(3), 4);
        assert_eq!(iip.x_tiles_at(2), 2);
        assert_eq!(iip.x_tiles_at(0), 1);
        assert_eq!(
            iip.tile_url(3, 1, 2),
            "https://iip.example.org/fcgi-bin/iipsrv.fcgi?FIF=/atlas/axial/0.tif&JTL=3,9&GAM=1.5"
        );
    }

    #[test]
    fn test_iip_without_info_builds_nothing() {
        let mut config = test_config();
        config.backend = BackendMode::Iip {
            base_url: "https://iip.example.org".to_string(),
            image_path: "/atlas/{slice}.tif".to_string(),
        };
        assert!(build_tile_sources(&config, None, None, None).is_empty());
    }
}
