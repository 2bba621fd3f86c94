//! Geometric variants of a query image.
//!
//! A variant is named after the transform a copier is assumed to have
//! applied to the registered original. Generating it applies the *inverse*
//! of that transform to the query, so a query that really is `Rot90(O)`
//! turns back into `O` under the `Rot90` variant.
//!
//! Catalogue order drives tie-breaking in the matcher and never changes:
//! the eight symmetries of the square first, then the configured zoom-out
//! factors (each optionally followed by its mirrored form).

use std::fmt;

use image::{imageops, DynamicImage, Rgb, RgbImage};

use crate::error::{Result, VerimarkError};
use crate::fingerprint::preprocess::within_pixel_budget;
use crate::fingerprint::MAX_PIXELS;
use crate::policy::MatchPolicy;

/// Canvas colour used to pad zoom-out variants.
pub const NEUTRAL_GRAY: Rgb<u8> = Rgb([128, 128, 128]);

/// The dihedral group of the square. Rotations are clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symmetry {
    Original,
    Rot90,
    Rot180,
    Rot270,
    MirrorH,
    MirrorHRot90,
    MirrorHRot180,
    MirrorHRot270,
}

impl Symmetry {
    pub const ALL: [Symmetry; 8] = [
        Symmetry::Original,
        Symmetry::Rot90,
        Symmetry::Rot180,
        Symmetry::Rot270,
        Symmetry::MirrorH,
        Symmetry::MirrorHRot90,
        Symmetry::MirrorHRot180,
        Symmetry::MirrorHRot270,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Original => "Original",
            Self::Rot90 => "Rot90",
            Self::Rot180 => "Rot180",
            Self::Rot270 => "Rot270",
            Self::MirrorH => "MirrorH",
            Self::MirrorHRot90 => "MirrorH+Rot90",
            Self::MirrorHRot180 => "MirrorH+Rot180",
            Self::MirrorHRot270 => "MirrorH+Rot270",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Original => "Original",
            Self::Rot90 => "90deg Rotation",
            Self::Rot180 => "180deg Rotation",
            Self::Rot270 => "270deg Rotation",
            Self::MirrorH => "Horizontal Mirror",
            Self::MirrorHRot90 => "Mirrored 90deg Rotation",
            Self::MirrorHRot180 => "Mirrored 180deg Rotation",
            Self::MirrorHRot270 => "Mirrored 270deg Rotation",
        }
    }

    /// The transform itself: what a copier would do to the original.
    /// Mirrored forms rotate first, then flip horizontally.
    pub fn apply(self, image: &DynamicImage) -> DynamicImage {
        match self {
            Self::Original => image.clone(),
            Self::Rot90 => image.rotate90(),
            Self::Rot180 => image.rotate180(),
            Self::Rot270 => image.rotate270(),
            Self::MirrorH => image.fliph(),
            Self::MirrorHRot90 => image.rotate90().fliph(),
            Self::MirrorHRot180 => image.rotate180().fliph(),
            Self::MirrorHRot270 => image.rotate270().fliph(),
        }
    }

    /// Inverse of [`Symmetry::apply`].
    pub fn undo(self, image: &DynamicImage) -> DynamicImage {
        match self {
            Self::Original => image.clone(),
            Self::Rot90 => image.rotate270(),
            Self::Rot180 => image.rotate180(),
            Self::Rot270 => image.rotate90(),
            // Every reflection is its own inverse.
            Self::MirrorH | Self::MirrorHRot90 | Self::MirrorHRot180 | Self::MirrorHRot270 => {
                self.apply(image)
            }
        }
    }
}

/// One entry of the variant catalogue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeometricVariant {
    Symmetry(Symmetry),
    /// Pad the query onto a neutral canvas `factor` times larger, centred.
    ZoomOut { factor: f64, mirrored: bool },
}

impl GeometricVariant {
    pub fn name(&self) -> String {
        match self {
            Self::Symmetry(s) => s.name().to_string(),
            Self::ZoomOut {
                factor,
                mirrored: false,
            } => format!("ZoomOut({factor})"),
            Self::ZoomOut {
                factor,
                mirrored: true,
            } => format!("MirrorH+ZoomOut({factor})"),
        }
    }

    pub fn description(&self) -> String {
        match self {
            Self::Symmetry(s) => s.description().to_string(),
            Self::ZoomOut {
                factor,
                mirrored: false,
            } => format!("Zoom-out {factor}x"),
            Self::ZoomOut {
                factor,
                mirrored: true,
            } => format!("Mirrored Zoom-out {factor}x"),
        }
    }

    /// True for the untransformed query.
    pub fn is_identity(&self) -> bool {
        matches!(self, Self::Symmetry(Symmetry::Original))
    }

    /// Produce this variant of the query.
    pub fn generate(&self, query: &DynamicImage) -> Result<DynamicImage> {
        match *self {
            Self::Symmetry(s) => Ok(s.undo(query)),
            Self::ZoomOut { factor, mirrored } => {
                let source = if mirrored { query.fliph() } else { query.clone() };
                zoom_out(&source, factor).map_err(|reason| VerimarkError::variant(self.name(), reason))
            }
        }
    }
}

impl fmt::Display for GeometricVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Center `image` on a neutral gray canvas enlarged by `factor`.
fn zoom_out(image: &DynamicImage, factor: f64) -> std::result::Result<DynamicImage, String> {
    if !factor.is_finite() || factor < 1.0 {
        return Err(format!("invalid zoom factor {factor}"));
    }
    let (w, h) = (image.width(), image.height());
    if w == 0 || h == 0 {
        return Err("image has no pixels".into());
    }

    let canvas_w = (f64::from(w) * factor).round();
    let canvas_h = (f64::from(h) * factor).round();
    if canvas_w > f64::from(u32::MAX)
        || canvas_h > f64::from(u32::MAX)
        || !within_pixel_budget(canvas_w as u32, canvas_h as u32, MAX_PIXELS)
    {
        return Err(format!(
            "canvas {canvas_w}x{canvas_h} exceeds the {MAX_PIXELS} pixel limit"
        ));
    }
    let (canvas_w, canvas_h) = (canvas_w as u32, canvas_h as u32);

    let mut canvas = RgbImage::from_pixel(canvas_w, canvas_h, NEUTRAL_GRAY);
    let x = i64::from((canvas_w - w) / 2);
    let y = i64::from((canvas_h - h) / 2);
    imageops::overlay(&mut canvas, &image.to_rgb8(), x, y);
    Ok(DynamicImage::ImageRgb8(canvas))
}

/// Fixed, ordered list of variants derived from a policy.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantCatalogue {
    variants: Vec<GeometricVariant>,
}

impl VariantCatalogue {
    /// Catalogue with an explicit variant order.
    pub fn new(variants: Vec<GeometricVariant>) -> Self {
        Self { variants }
    }

    /// The eight symmetries only.
    pub fn symmetries() -> Self {
        Self {
            variants: Symmetry::ALL
                .iter()
                .copied()
                .map(GeometricVariant::Symmetry)
                .collect(),
        }
    }

    pub fn from_policy(policy: &MatchPolicy) -> Self {
        let mut catalogue = Self::symmetries();
        for &factor in &policy.zoom_factors {
            catalogue.variants.push(GeometricVariant::ZoomOut {
                factor,
                mirrored: false,
            });
            if policy.mirror_zoom {
                catalogue.variants.push(GeometricVariant::ZoomOut {
                    factor,
                    mirrored: true,
                });
            }
        }
        catalogue
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeometricVariant> {
        self.variants.iter()
    }

    /// Lazily generate every variant of `query` in catalogue order.
    ///
    /// Each call starts over; nothing is cached between calls.
    pub fn variants<'a>(
        &'a self,
        query: &'a DynamicImage,
    ) -> impl Iterator<Item = (&'a GeometricVariant, Result<DynamicImage>)> + 'a {
        self.variants.iter().map(move |v| (v, v.generate(query)))
    }
}

impl Default for VariantCatalogue {
    fn default() -> Self {
        Self::symmetries()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    fn asymmetric() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(5, 3, |x, y| {
            Rgb([(x * 40) as u8, (y * 70) as u8, (x + y * 5) as u8])
        }))
    }

    #[test]
    fn test_catalogue_order() {
        let names: Vec<String> = VariantCatalogue::symmetries()
            .iter()
            .map(|v| v.name())
            .collect();
        assert_eq!(
            names,
            [
                "Original",
                "Rot90",
                "Rot180",
                "Rot270",
                "MirrorH",
                "MirrorH+Rot90",
                "MirrorH+Rot180",
                "MirrorH+Rot270"
            ]
        );
    }

    #[test]
    fn test_undo_inverts_apply() {
        let img = asymmetric();
        for s in Symmetry::ALL {
            let restored = s.undo(&s.apply(&img));
            assert_eq!(restored.to_rgb8(), img.to_rgb8(), "{}", s.name());
        }
    }

    #[test]
    fn test_symmetries_are_distinct() {
        let img = asymmetric();
        let outputs: Vec<_> = Symmetry::ALL.iter().map(|s| s.apply(&img).to_rgb8()).collect();
        for i in 0..outputs.len() {
            for j in i + 1..outputs.len() {
                assert_ne!(outputs[i], outputs[j]);
            }
        }
    }

    #[test]
    fn test_quarter_turns_swap_dimensions() {
        let img = asymmetric();
        assert_eq!(Symmetry::Rot90.apply(&img).dimensions(), (3, 5));
        assert_eq!(Symmetry::MirrorHRot270.undo(&img).dimensions(), (3, 5));
        assert_eq!(Symmetry::Rot180.apply(&img).dimensions(), (5, 3));
    }

    #[test]
    fn test_zoom_out_centres_on_gray() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([255, 0, 0])));
        let zoomed = GeometricVariant::ZoomOut {
            factor: 2.0,
            mirrored: false,
        }
        .generate(&img)
        .unwrap()
        .to_rgb8();
        assert_eq!(zoomed.dimensions(), (8, 8));
        assert_eq!(zoomed.get_pixel(0, 0), &NEUTRAL_GRAY);
        assert_eq!(zoomed.get_pixel(2, 2), &Rgb([255, 0, 0]));
        assert_eq!(zoomed.get_pixel(5, 5), &Rgb([255, 0, 0]));
        assert_eq!(zoomed.get_pixel(6, 6), &NEUTRAL_GRAY);
    }

    #[test]
    fn test_zoom_out_rejects_empty_image() {
        let empty = DynamicImage::new_rgb8(0, 0);
        let err = GeometricVariant::ZoomOut {
            factor: 1.5,
            mirrored: true,
        }
        .generate(&empty)
        .unwrap_err();
        assert!(matches!(err, VerimarkError::VariantComputation { .. }));
    }

    #[test]
    fn test_zoom_out_canvas_respects_pixel_budget() {
        // 100 × 100 at factor 100 is a 10⁸ pixel canvas
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 100, Rgb([9, 9, 9])));
        let err = GeometricVariant::ZoomOut {
            factor: 100.0,
            mirrored: false,
        }
        .generate(&img)
        .unwrap_err();
        assert!(
            matches!(err, VerimarkError::VariantComputation { ref reason, .. } if reason.contains("pixel limit"))
        );
    }

    #[test]
    fn test_catalogue_from_policy() {
        let policy = MatchPolicy {
            zoom_factors: vec![1.25, 2.0],
            mirror_zoom: true,
            ..Default::default()
        };
        let catalogue = VariantCatalogue::from_policy(&policy);
        assert_eq!(catalogue.len(), 12);
        let tail: Vec<String> = catalogue.iter().skip(8).map(|v| v.name()).collect();
        assert_eq!(
            tail,
            [
                "ZoomOut(1.25)",
                "MirrorH+ZoomOut(1.25)",
                "ZoomOut(2)",
                "MirrorH+ZoomOut(2)"
            ]
        );

        let unmirrored = MatchPolicy {
            mirror_zoom: false,
            ..policy
        };
        assert_eq!(VariantCatalogue::from_policy(&unmirrored).len(), 10);
    }

    #[test]
    fn test_variants_are_restartable() {
        let img = asymmetric();
        let catalogue = VariantCatalogue::symmetries();
        let first: Vec<_> = catalogue
            .variants(&img)
            .map(|(_, r)| r.unwrap().to_rgb8())
            .collect();
        let second: Vec<_> = catalogue
            .variants(&img)
            .map(|(_, r)| r.unwrap().to_rgb8())
            .collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 8);
    }
}
