//! Tile Validation - Rendered artifacts checked against their grammar
//!
//! Rules produce structured violations. Errors fail the tile; warnings
//! are recorded and never fail it. Failing tiles go back for regeneration.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::config::ValidatorConfig;
use crate::edges::{Direction, EdgeCode};
use crate::grammar::TileGrammar;
use crate::palette::{Palette, PaletteProvider, Rgba};
use crate::raster::{is_transparent, PixelBuffer, Raster};

const MAX_REPORTED_COLORS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorType {
    SizeMismatch,
    InvalidColor,
    EdgeMismatch,
    StrayPixels,
    CenterInconsistent,
    TransparencyError,
    AntiAliasing,
    FormatError,
}

impl ValidationErrorType {
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationErrorType::SizeMismatch => "size_mismatch",
            ValidationErrorType::InvalidColor => "invalid_color",
            ValidationErrorType::EdgeMismatch => "edge_mismatch",
            ValidationErrorType::StrayPixels => "stray_pixels",
            ValidationErrorType::CenterInconsistent => "center_inconsistent",
            ValidationErrorType::TransparencyError => "transparency_error",
            ValidationErrorType::AntiAliasing => "anti_aliasing",
            ValidationErrorType::FormatError => "format_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationViolation {
    pub error_type: ValidationErrorType,
    pub severity: ViolationSeverity,
    pub message: String,
    pub location: Option<(u32, u32)>,
    pub remediation: Vec<String>,
}

impl ValidationViolation {
    fn new(error_type: ValidationErrorType, severity: ViolationSeverity, message: impl Into<String>) -> Self {
        Self {
            error_type,
            severity,
            message: message.into(),
            location: None,
            remediation: vec![],
        }
    }

    fn error(error_type: ValidationErrorType, message: impl Into<String>) -> Self {
        Self::new(error_type, ViolationSeverity::Error, message)
    }

    fn warning(error_type: ValidationErrorType, message: impl Into<String>) -> Self {
        Self::new(error_type, ViolationSeverity::Warning, message)
    }

    fn at(mut self, x: u32, y: u32) -> Self {
        self.location = Some((x, y));
        self
    }

    fn fix(mut self, remediation: &str) -> Self {
        self.remediation.push(remediation.to_string());
        self
    }
}

impl fmt::Display for ValidationViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            ViolationSeverity::Error => "ERROR",
            ViolationSeverity::Warning => "WARNING",
        };
        write!(f, "[{}] {}: {}", severity, self.error_type.as_str(), self.message)?;
        if let Some((x, y)) = self.location {
            write!(f, " at ({}, {})", x, y)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub tile_id: String,
    pub passed: bool,
    pub errors: Vec<ValidationViolation>,
    pub warnings: Vec<ValidationViolation>,
    pub stats: BTreeMap<String, Value>,
}

impl ValidationResult {
    pub fn new(tile_id: impl Into<String>) -> Self {
        Self {
            tile_id: tile_id.into(),
            passed: true,
            errors: vec![],
            warnings: vec![],
            stats: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, violation: ValidationViolation) {
        match violation.severity {
            ViolationSeverity::Warning => self.warnings.push(violation),
            ViolationSeverity::Error => {
                self.errors.push(violation);
                self.passed = false;
            }
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn has_error(&self, error_type: ValidationErrorType) -> bool {
        self.errors.iter().any(|e| e.error_type == error_type)
    }

    pub fn summary(&self) -> String {
        let status = if self.passed { "PASSED" } else { "FAILED" };
        format!(
            "{}: {} ({} errors, {} warnings)",
            self.tile_id,
            status,
            self.error_count(),
            self.warning_count()
        )
    }
}

/// How strictly artifacts are judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationPolicy {
    pub strict: bool,
    /// Per-channel tolerance for palette matching; 0 means exact.
    pub color_tolerance: u8,
    /// Color budget when no palette is supplied.
    pub default_max_colors: usize,
}

impl ValidationPolicy {
    pub fn strict() -> Self {
        Self { strict: true, color_tolerance: 0, default_max_colors: 4 }
    }

    pub fn lenient() -> Self {
        Self { strict: false, color_tolerance: 10, default_max_colors: 4 }
    }
}

/// Everything a rule may look at.
pub struct RuleInput<'a> {
    pub image: &'a dyn Raster,
    pub grammar: &'a TileGrammar,
    pub palette: Option<&'a Palette>,
    pub policy: &'a ValidationPolicy,
}

pub trait ValidationRule {
    fn name(&self) -> &'static str;
    fn validate(&self, input: &RuleInput<'_>) -> Vec<ValidationViolation>;
}

// --- Concrete Rules ---

pub struct SizeRule;

impl ValidationRule for SizeRule {
    fn name(&self) -> &'static str {
        "size"
    }

    fn validate(&self, input: &RuleInput<'_>) -> Vec<ValidationViolation> {
        let (expected_w, expected_h) = input.grammar.size.dimensions();
        let (w, h) = (input.image.width(), input.image.height());

        if (w, h) != (expected_w, expected_h) {
            vec![ValidationViolation::error(
                ValidationErrorType::SizeMismatch,
                format!("Expected {}×{}, got {}×{}", expected_w, expected_h, w, h),
            )
            .fix("Re-render at the grammar's tile size")]
        } else {
            vec![]
        }
    }
}

fn channels_within(a: Rgba, b: Rgba, tolerance: u8) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x.abs_diff(*y) <= tolerance)
}

/// Distinct colors in the image that match no palette entry.
pub fn invalid_colors(image: &dyn Raster, palette: &Palette, tolerance: u8) -> Vec<Rgba> {
    let allowed = palette.allowed_rgba();
    image
        .colors_used()
        .into_iter()
        .filter(|color| {
            if is_transparent(*color) && palette.allow_transparency {
                false
            } else if tolerance == 0 {
                !allowed.contains(color)
            } else {
                !allowed.iter().any(|a| channels_within(*color, *a, tolerance))
            }
        })
        .collect()
}

pub struct PaletteRule;

impl ValidationRule for PaletteRule {
    fn name(&self) -> &'static str {
        "palette"
    }

    fn validate(&self, input: &RuleInput<'_>) -> Vec<ValidationViolation> {
        let Some(palette) = input.palette else {
            return vec![];
        };

        invalid_colors(input.image, palette, input.policy.color_tolerance)
            .into_iter()
            .take(MAX_REPORTED_COLORS)
            .map(|color| {
                ValidationViolation::error(
                    ValidationErrorType::InvalidColor,
                    format!("Color {:?} not in palette {}", color, palette.id),
                )
                .fix("Quantize to the palette colors")
            })
            .collect()
    }
}

pub struct TransparencyRule;

impl ValidationRule for TransparencyRule {
    fn name(&self) -> &'static str {
        "transparency"
    }

    fn validate(&self, input: &RuleInput<'_>) -> Vec<ValidationViolation> {
        let image = input.image;
        let mut partial = 0usize;
        let mut first_partial = None;
        let mut any_transparent = false;

        for y in 0..image.height() {
            for x in 0..image.width() {
                let alpha = image.pixel(x, y)[3];
                if alpha < 255 {
                    any_transparent = true;
                }
                if alpha > 0 && alpha < 255 {
                    partial += 1;
                    first_partial.get_or_insert((x, y));
                }
            }
        }

        let mut violations = vec![];
        if let Some((x, y)) = first_partial {
            violations.push(
                ValidationViolation::error(
                    ValidationErrorType::TransparencyError,
                    format!("{} semi-transparent pixels", partial),
                )
                .at(x, y)
                .fix("Use fully opaque or fully transparent pixels only"),
            );
        }

        let forbids = input.palette.is_some_and(|p| !p.allow_transparency);
        if forbids && any_transparent {
            violations.push(ValidationViolation::error(
                ValidationErrorType::TransparencyError,
                "Palette does not allow transparency",
            ));
        }

        violations
    }
}

pub struct AntiAliasingRule;

impl ValidationRule for AntiAliasingRule {
    fn name(&self) -> &'static str {
        "anti_aliasing"
    }

    fn validate(&self, input: &RuleInput<'_>) -> Vec<ValidationViolation> {
        let used = input
            .image
            .colors_used()
            .into_iter()
            .filter(|c| !is_transparent(*c))
            .count();
        let max = input
            .palette
            .map(|p| p.max_colors)
            .unwrap_or(input.policy.default_max_colors);

        if used <= max {
            return vec![];
        }

        let message = format!("Too many colors ({}), possible anti-aliasing. Max: {}", used, max);
        let violation = if input.policy.strict {
            ValidationViolation::error(ValidationErrorType::AntiAliasing, message)
        } else {
            ValidationViolation::warning(ValidationErrorType::AntiAliasing, message)
        };
        vec![violation.fix("Disable smoothing in the rasterizer")]
    }
}

fn edge_pixels(image: &dyn Raster, direction: Direction) -> Vec<Rgba> {
    let (w, h) = (image.width(), image.height());
    match direction {
        Direction::North => (0..w).map(|x| image.pixel(x, 0)).collect(),
        Direction::South => (0..w).map(|x| image.pixel(x, h - 1)).collect(),
        Direction::West => (0..h).map(|y| image.pixel(0, y)).collect(),
        Direction::East => (0..h).map(|y| image.pixel(w - 1, y)).collect(),
    }
}

fn blue_dominant(px: Rgba) -> bool {
    px[2] > px[0] && px[2] >= px[1]
}

pub struct EdgePatternRule;

impl EdgePatternRule {
    fn check(direction: Direction, code: EdgeCode, pixels: &[Rgba]) -> Option<ValidationViolation> {
        let len = pixels.len();
        let opaque: Vec<Rgba> = pixels.iter().copied().filter(|p| !is_transparent(*p)).collect();
        let filled = opaque.len();

        let problem = match code {
            EdgeCode::Empty if filled * 2 > len => Some((ViolationSeverity::Error, "majority transparent")),
            EdgeCode::Solid if filled < len => Some((ViolationSeverity::Error, "continuous solid fill")),
            EdgeCode::Water => {
                let blue = opaque.iter().filter(|p| blue_dominant(**p)).count();
                (filled > 0 && blue * 2 < filled).then_some((ViolationSeverity::Warning, "blue water tones"))
            }
            EdgeCode::DoorFrame => {
                let centre_open = is_transparent(pixels[len / 2]);
                let partial = filled > 0 && filled < len;
                (!(partial && centre_open))
                    .then_some((ViolationSeverity::Warning, "partial fill with a centred opening"))
            }
            EdgeCode::Empty | EdgeCode::Solid => None,
            _ if filled * 2 < len => Some((ViolationSeverity::Warning, "majority filled")),
            _ => None,
        }?;

        let (severity, expected) = problem;
        Some(
            ValidationViolation::new(
                ValidationErrorType::EdgeMismatch,
                severity,
                format!(
                    "{} edge declared {:?}: expected {}, {}/{} pixels filled",
                    direction, code, expected, filled, len
                ),
            )
            .fix("Redraw the edge to match its declared edge code"),
        )
    }
}

impl ValidationRule for EdgePatternRule {
    fn name(&self) -> &'static str {
        "edge_pattern"
    }

    fn validate(&self, input: &RuleInput<'_>) -> Vec<ValidationViolation> {
        if input.image.width() == 0 || input.image.height() == 0 {
            return vec![];
        }

        Direction::ALL
            .into_iter()
            .filter_map(|d| {
                let pixels = edge_pixels(input.image, d);
                Self::check(d, input.grammar.edges.edge(d), &pixels)
            })
            .collect()
    }
}

pub struct StrayPixelRule;

impl ValidationRule for StrayPixelRule {
    fn name(&self) -> &'static str {
        "stray_pixels"
    }

    fn validate(&self, input: &RuleInput<'_>) -> Vec<ValidationViolation> {
        let image = input.image;
        let (w, h) = (image.width(), image.height());
        let mut strays = vec![];

        for y in 0..h {
            for x in 0..w {
                if is_transparent(image.pixel(x, y)) {
                    continue;
                }
                let neighbors = [
                    (x.checked_sub(1), Some(y)),
                    ((x + 1 < w).then_some(x + 1), Some(y)),
                    (Some(x), y.checked_sub(1)),
                    (Some(x), (y + 1 < h).then_some(y + 1)),
                ];
                let mut present = neighbors
                    .iter()
                    .filter_map(|&(nx, ny)| Some((nx?, ny?)))
                    .peekable();
                if present.peek().is_none() {
                    continue;
                }
                if present.all(|(nx, ny)| is_transparent(image.pixel(nx, ny))) {
                    strays.push((x, y));
                }
            }
        }

        match strays.first() {
            Some(&(x, y)) => vec![ValidationViolation::warning(
                ValidationErrorType::StrayPixels,
                format!("{} isolated pixels", strays.len()),
            )
            .at(x, y)
            .fix("Remove isolated pixels or connect them to a shape")],
            None => vec![],
        }
    }
}

pub struct CenterRule;

impl ValidationRule for CenterRule {
    fn name(&self) -> &'static str {
        "center"
    }

    fn validate(&self, input: &RuleInput<'_>) -> Vec<ValidationViolation> {
        let image = input.image;
        let (w, h) = (image.width(), image.height());
        let (x0, x1) = (w / 4, w - w / 4);
        let (y0, y1) = (h / 4, h - h / 4);

        let mut total = 0usize;
        let mut filled = 0usize;
        for y in y0..y1 {
            for x in x0..x1 {
                total += 1;
                if !is_transparent(image.pixel(x, y)) {
                    filled += 1;
                }
            }
        }
        if total == 0 {
            return vec![];
        }

        let expects_empty = input.grammar.center == "empty";
        let consistent = if expects_empty { filled * 2 <= total } else { filled * 2 >= total };
        if consistent {
            return vec![];
        }

        let expected = if expects_empty { "mostly transparent" } else { "mostly filled" };
        vec![ValidationViolation::error(
            ValidationErrorType::CenterInconsistent,
            format!(
                "Center '{}' should be {}, {}/{} pixels filled",
                input.grammar.center, expected, filled, total
            ),
        )
        .at(x0, y0)
        .fix("Redraw the center region to match the center content")]
    }
}

/// Aggregate over a validated batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectionSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f64,
    pub error_breakdown: BTreeMap<ValidationErrorType, usize>,
}

/// Runs every rule against an artifact and collects the verdict.
pub struct TileValidator {
    policy: ValidationPolicy,
    rules: Vec<Box<dyn ValidationRule>>,
}

impl TileValidator {
    pub fn new(strict: bool) -> Self {
        let policy = if strict { ValidationPolicy::strict() } else { ValidationPolicy::lenient() };
        Self::with_policy(policy)
    }

    pub fn from_config(config: &ValidatorConfig) -> Self {
        let mut policy = if config.strict { ValidationPolicy::strict() } else { ValidationPolicy::lenient() };
        if let Some(tolerance) = config.color_tolerance {
            policy.color_tolerance = tolerance;
        }
        policy.default_max_colors = config.default_max_colors;
        Self::with_policy(policy)
    }

    pub fn with_policy(policy: ValidationPolicy) -> Self {
        Self {
            policy,
            rules: vec![
                Box::new(SizeRule),
                Box::new(PaletteRule),
                Box::new(TransparencyRule),
                Box::new(AntiAliasingRule),
                Box::new(EdgePatternRule),
                Box::new(StrayPixelRule),
                Box::new(CenterRule),
            ],
        }
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    pub fn validate(
        &self,
        image: &dyn Raster,
        grammar: &TileGrammar,
        palette: Option<&Palette>,
    ) -> ValidationResult {
        let mut result = ValidationResult::new(grammar.generation_id());
        let input = RuleInput {
            image,
            grammar,
            palette,
            policy: &self.policy,
        };

        for rule in &self.rules {
            let violations = rule.validate(&input);
            if !violations.is_empty() {
                debug!(rule = rule.name(), count = violations.len(), "rule reported violations");
            }
            for violation in violations {
                result.add(violation);
            }
        }

        result.stats.insert("width".into(), json!(image.width()));
        result.stats.insert("height".into(), json!(image.height()));
        result.stats.insert("colors_used".into(), json!(image.colors_used().len()));
        if let Some(palette) = palette {
            let invalid = invalid_colors(image, palette, self.policy.color_tolerance).len();
            result.stats.insert("invalid_colors".into(), json!(invalid));
        }
        result.stats.insert("center_type".into(), json!(grammar.center));
        result.stats.insert("edges_validated".into(), json!(true));

        debug!(summary = %result.summary(), "validated tile");
        result
    }

    /// Validate packed RGBA bytes; a malformed buffer is reported as a
    /// `format_error` instead of aborting.
    pub fn validate_rgba(
        &self,
        width: u32,
        height: u32,
        bytes: &[u8],
        grammar: &TileGrammar,
        palette: Option<&Palette>,
    ) -> ValidationResult {
        match PixelBuffer::from_rgba_bytes(width, height, bytes) {
            Ok(image) => self.validate(&image, grammar, palette),
            Err(e) => {
                let mut result = ValidationResult::new(grammar.generation_id());
                result.add(ValidationViolation::error(
                    ValidationErrorType::FormatError,
                    format!("Failed to parse image: {}", e),
                ));
                result
            }
        }
    }

    /// Validate against the grammar's palette as drawn at its lighting state.
    pub fn validate_with(
        &self,
        image: &dyn Raster,
        grammar: &TileGrammar,
        palettes: &dyn PaletteProvider,
    ) -> ValidationResult {
        let palette = palettes.palette_for(&grammar.palette, grammar.lighting_state);
        self.validate(image, grammar, palette.as_ref())
    }

    pub fn validate_rgba_with(
        &self,
        width: u32,
        height: u32,
        bytes: &[u8],
        grammar: &TileGrammar,
        palettes: &dyn PaletteProvider,
    ) -> ValidationResult {
        let palette = palettes.palette_for(&grammar.palette, grammar.lighting_state);
        self.validate_rgba(width, height, bytes, grammar, palette.as_ref())
    }

    pub fn validate_batch(
        &self,
        tiles: &[(&dyn Raster, &TileGrammar, Option<&Palette>)],
    ) -> Vec<ValidationResult> {
        tiles
            .iter()
            .map(|(image, grammar, palette)| self.validate(*image, grammar, *palette))
            .collect()
    }

    pub fn rejection_summary(&self, results: &[ValidationResult]) -> RejectionSummary {
        let total = results.len();
        let passed = results.iter().filter(|r| r.passed).count();

        let mut error_breakdown = BTreeMap::new();
        for error in results.iter().flat_map(|r| &r.errors) {
            *error_breakdown.entry(error.error_type).or_insert(0) += 1;
        }

        RejectionSummary {
            total,
            passed,
            failed: total - passed,
            pass_rate: if total > 0 { passed as f64 / total as f64 } else { 0.0 },
            error_breakdown,
        }
    }
}

impl Default for TileValidator {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edges::EdgeSignature;
    use crate::palette::{Color, PaletteRegistry};

    const CLEAR: Rgba = [0, 0, 0, 0];
    const DARK: Rgba = [0x1a, 0x1a, 0x2e, 255];
    const MID: Rgba = [0x8a, 0x8a, 0x9e, 255];

    fn stone() -> Palette {
        Palette::new(
            "stone",
            "Stone",
            vec![Color::rgb(0x1a, 0x1a, 0x2e), Color::rgb(0x8a, 0x8a, 0x9e)],
        )
    }

    fn wall() -> TileGrammar {
        TileGrammar::new("wall", "stone")
            .with_edges(EdgeSignature::uniform(EdgeCode::Solid))
            .with_center("stone")
    }

    fn solid_tile() -> PixelBuffer {
        let mut buf = PixelBuffer::filled(8, 8, DARK);
        buf.fill_rect(2, 2, 4, 4, MID);
        buf
    }

    #[test]
    fn test_clean_wall_passes() {
        let result = TileValidator::new(true).validate(&solid_tile(), &wall(), Some(&stone()));
        assert!(result.passed, "{:?}", result.errors);
        assert!(result.warnings.is_empty());
        assert_eq!(result.stats["width"], json!(8));
        assert_eq!(result.stats["invalid_colors"], json!(0));
    }

    #[test]
    fn test_size_mismatch() {
        let buf = PixelBuffer::filled(16, 16, DARK);
        let result = TileValidator::new(true).validate(&buf, &wall(), None);
        assert!(!result.passed);
        assert!(result.has_error(ValidationErrorType::SizeMismatch));
    }

    #[test]
    fn test_invalid_color_exact_and_tolerant() {
        let mut buf = solid_tile();
        buf.set(3, 3, [0x8c, 0x8a, 0x9e, 255]);

        let strict = TileValidator::new(true).validate(&buf, &wall(), Some(&stone()));
        assert!(strict.has_error(ValidationErrorType::InvalidColor));

        let lenient = TileValidator::new(false).validate(&buf, &wall(), Some(&stone()));
        assert!(!lenient.has_error(ValidationErrorType::InvalidColor));
    }

    #[test]
    fn test_invalid_colors_capped_at_five() {
        let mut buf = solid_tile();
        for i in 0..7 {
            buf.set(2 + (i % 4), 2 + (i / 4), [200, i as u8, 0, 255]);
        }
        let result = TileValidator::new(true).validate(&buf, &wall(), Some(&stone()));
        let reported = result
            .errors
            .iter()
            .filter(|e| e.error_type == ValidationErrorType::InvalidColor)
            .count();
        assert_eq!(reported, 5);
        assert_eq!(result.stats["invalid_colors"], json!(7));
    }

    #[test]
    fn test_anti_aliasing_severity_follows_strictness() {
        let mut buf = solid_tile();
        for (i, shade) in [10u8, 20, 30, 40].iter().enumerate() {
            buf.set(2 + i as u32, 2, [*shade, *shade, *shade, 255]);
        }

        let strict = TileValidator::new(true).validate(&buf, &wall(), None);
        assert!(strict.has_error(ValidationErrorType::AntiAliasing));

        let lenient = TileValidator::new(false).validate(&buf, &wall(), None);
        assert!(!lenient.has_error(ValidationErrorType::AntiAliasing));
        assert!(lenient
            .warnings
            .iter()
            .any(|w| w.error_type == ValidationErrorType::AntiAliasing));
    }

    #[test]
    fn test_solid_edge_with_gap_is_error() {
        let mut buf = solid_tile();
        buf.set(4, 0, CLEAR);
        let result = TileValidator::new(true).validate(&buf, &wall(), Some(&stone()));
        assert!(result.has_error(ValidationErrorType::EdgeMismatch));
        assert_eq!(result.error_count(), 1);
    }

    #[test]
    fn test_empty_edge_must_be_open() {
        let grammar = wall().with_edges(EdgeSignature::new(
            EdgeCode::Empty,
            EdgeCode::Solid,
            EdgeCode::Solid,
            EdgeCode::Solid,
        ));
        let result = TileValidator::new(true).validate(&solid_tile(), &grammar, Some(&stone()));
        let edge = result
            .errors
            .iter()
            .find(|e| e.error_type == ValidationErrorType::EdgeMismatch)
            .unwrap();
        assert!(edge.message.starts_with("north"));
    }

    #[test]
    fn test_center_inconsistent() {
        let mut buf = solid_tile();
        buf.fill_rect(2, 2, 4, 4, CLEAR);
        let result = TileValidator::new(true).validate(&buf, &wall(), Some(&stone()));
        assert!(result.has_error(ValidationErrorType::CenterInconsistent));
    }

    #[test]
    fn test_stray_pixel_is_warning() {
        let mut buf = PixelBuffer::filled(8, 8, CLEAR);
        buf.set(4, 4, MID);
        buf.fill_rect(3, 3, 3, 1, CLEAR);
        let grammar = TileGrammar::new("floor", "stone");
        let result = TileValidator::new(true).validate(&buf, &grammar, Some(&stone()));
        assert!(result.passed, "{:?}", result.errors);
        let stray = &result.warnings[0];
        assert_eq!(stray.error_type, ValidationErrorType::StrayPixels);
        assert_eq!(stray.location, Some((4, 4)));
    }

    #[test]
    fn test_semi_transparent_pixels() {
        let mut buf = solid_tile();
        buf.set(3, 4, [0x8a, 0x8a, 0x9e, 128]);
        let result = TileValidator::new(false).validate(&buf, &wall(), None);
        assert!(result.has_error(ValidationErrorType::TransparencyError));
    }

    #[test]
    fn test_malformed_buffer_reports_format_error() {
        let result = TileValidator::new(true).validate_rgba(8, 8, &[0; 10], &wall(), None);
        assert!(!result.passed);
        assert!(result.has_error(ValidationErrorType::FormatError));
    }

    #[test]
    fn test_rejection_summary() {
        let validator = TileValidator::new(true);
        let good_tile = solid_tile();
        let bad_tile = PixelBuffer::filled(4, 4, DARK);
        let good: &dyn Raster = &good_tile;
        let bad: &dyn Raster = &bad_tile;
        let grammar = wall();
        let palette = stone();
        let results = validator.validate_batch(&[
            (good, &grammar, Some(&palette)),
            (bad, &grammar, Some(&palette)),
        ]);

        let summary = validator.rejection_summary(&results);
        assert_eq!((summary.total, summary.passed, summary.failed), (2, 1, 1));
        assert_eq!(summary.pass_rate, 0.5);
        assert_eq!(summary.error_breakdown[&ValidationErrorType::SizeMismatch], 1);
    }

    #[test]
    fn test_palette_resolved_for_lighting() {
        let mut palettes = PaletteRegistry::new();
        palettes.register(stone());
        let validator = TileValidator::new(true);
        let shadowed = wall().with_states(0, 0, 0, 0);

        let result = validator.validate_with(&solid_tile(), &shadowed, &palettes);
        assert!(result
            .errors
            .iter()
            .any(|e| e.error_type == ValidationErrorType::InvalidColor));

        let dark = stone().for_lighting(0);
        let to_rgba = |c: &Color| [c.r, c.g, c.b, c.a];
        let mut tile = PixelBuffer::filled(8, 8, to_rgba(&dark.colors[0]));
        tile.fill_rect(2, 2, 4, 4, to_rgba(&dark.colors[1]));
        let result = validator.validate_with(&tile, &shadowed, &palettes);
        assert!(result.passed, "{:?}", result.errors);

        let clean = solid_tile();
        let bytes: Vec<u8> = (0..8)
            .flat_map(|y| (0..8).map(move |x| (x, y)))
            .flat_map(|(x, y)| clean.pixel(x, y))
            .collect();
        assert!(validator.validate_rgba_with(8, 8, &bytes, &wall(), &palettes).passed);
    }

    #[test]
    fn test_violation_display() {
        let v = ValidationViolation::error(ValidationErrorType::StrayPixels, "1 isolated pixels").at(2, 3);
        assert_eq!(v.to_string(), "[ERROR] stray_pixels: 1 isolated pixels at (2, 3)");
    }
}
