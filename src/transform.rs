//! Coordinate Transform Module
//!
//! Converts positions, sizes and damage between guest pixel space and host
//! logical space. Two strategies exist and only one is active at a time:
//!
//! - **Uniform**: every surface divides (guest → host) or multiplies
//!   (host → guest) by the global scale factor.
//! - **Direct**: every surface uses a per-axis scale pair, either its own
//!   calibrated override or the process-wide direct pair.
//!
//! Everything here is a pure function over the scale configuration; no
//! conversion can fail.

use crosswl_proto::Fixed;

/// Lower clamp for damage coordinates before outset
pub const MIN_SIZE: i64 = i32::MIN as i64 / 10;
/// Upper clamp for damage coordinates before outset
pub const MAX_SIZE: i64 = i32::MAX as i64 / 10;

/// Independent X and Y scale factors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalePair {
    pub x: f64,
    pub y: f64,
}

impl ScalePair {
    pub const IDENTITY: ScalePair = ScalePair { x: 1.0, y: 1.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn uniform(scale: f64) -> Self {
        Self { x: scale, y: scale }
    }
}

/// Which scaling strategy is active
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleMode {
    /// Divide/multiply by the global scale
    Uniform,
    /// Per-axis factors; surfaces without their own override use this pair
    Direct(ScalePair),
}

/// Process-wide scale configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleConfig {
    /// Global scale. Used by uniform mode and for output dimensions.
    pub scale: f64,
    pub mode: ScaleMode,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

impl ScaleConfig {
    pub fn uniform(scale: f64) -> Self {
        Self {
            scale,
            mode: ScaleMode::Uniform,
        }
    }

    pub fn direct(scale: f64, global: ScalePair) -> Self {
        Self {
            scale,
            mode: ScaleMode::Direct(global),
        }
    }

    pub fn is_direct(&self) -> bool {
        matches!(self.mode, ScaleMode::Direct(_))
    }

    /// Scale pair a conversion for `surface` uses.
    ///
    /// The surface override only counts in direct mode.
    pub fn effective(&self, surface: Option<&SurfaceScale>) -> ScalePair {
        match self.mode {
            ScaleMode::Uniform => ScalePair::uniform(self.scale),
            ScaleMode::Direct(global) => surface.and_then(|s| s.own).unwrap_or(global),
        }
    }
}

/// Per-surface direct-scale override
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfaceScale {
    own: Option<ScalePair>,
    round_x: bool,
    round_y: bool,
    logical: Option<Size>,
}

impl SurfaceScale {
    /// Override with explicit factors and rounding modes
    pub fn with_override(scale: ScalePair, round_x: bool, round_y: bool) -> Self {
        Self {
            own: Some(scale),
            round_x,
            round_y,
            logical: None,
        }
    }

    pub fn has_own_scale(&self) -> bool {
        self.own.is_some()
    }

    pub fn own_scale(&self) -> Option<ScalePair> {
        self.own
    }

    pub fn rounds_x(&self) -> bool {
        self.round_x
    }

    pub fn rounds_y(&self) -> bool {
        self.round_y
    }

    /// Logical size computed by the calibration that installed the override
    pub fn cached_logical_size(&self) -> Option<Size> {
        self.logical
    }

    /// Drop the override and fall back to the global factors
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Integer coordinate pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Integer width and height
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Sub-pixel coordinate pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FixedPoint {
    pub x: Fixed,
    pub y: Fixed,
}

impl FixedPoint {
    pub fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }
}

/// Damage rectangle as two corners, `(x1, y1)` inclusive and `(x2, y2)` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DamageRect {
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
}

impl DamageRect {
    pub fn new(x1: i64, y1: i64, x2: i64, y2: i64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn contains(&self, other: &DamageRect) -> bool {
        self.x1 <= other.x1 && self.y1 <= other.y1 && self.x2 >= other.x2 && self.y2 >= other.y2
    }
}

/// Scroll axis of a `wl_pointer.axis` value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAxis {
    /// Scales with the Y factor
    Vertical,
    /// Scales with the X factor
    Horizontal,
}

impl ScrollAxis {
    pub fn from_wire(axis: u32) -> Option<Self> {
        match axis {
            0 => Some(Self::Vertical),
            1 => Some(Self::Horizontal),
            _ => None,
        }
    }
}

fn whole(value: f64, round: bool) -> i32 {
    if round {
        value.round() as i32
    } else {
        value.trunc() as i32
    }
}

fn rounding(config: &ScaleConfig, surface: Option<&SurfaceScale>) -> (bool, bool) {
    match (config.mode, surface) {
        (ScaleMode::Direct(_), Some(surface)) => (surface.round_x, surface.round_y),
        _ => (false, false),
    }
}

/// Guest pixels to host logical coordinates
pub fn guest_to_host(config: &ScaleConfig, surface: Option<&SurfaceScale>, point: Point) -> Point {
    let scale = config.effective(surface);
    let (round_x, round_y) = rounding(config, surface);
    Point::new(
        whole(f64::from(point.x) / scale.x, round_x),
        whole(f64::from(point.y) / scale.y, round_y),
    )
}

/// Host logical coordinates to guest pixels.
///
/// Truncates, except on an axis the surface's calibration flagged for rounding.
pub fn host_to_guest(config: &ScaleConfig, surface: Option<&SurfaceScale>, point: Point) -> Point {
    let scale = config.effective(surface);
    let (round_x, round_y) = rounding(config, surface);
    Point::new(
        whole(f64::from(point.x) * scale.x, round_x),
        whole(f64::from(point.y) * scale.y, round_y),
    )
}

pub fn guest_to_host_fixed(
    config: &ScaleConfig,
    surface: Option<&SurfaceScale>,
    point: FixedPoint,
) -> FixedPoint {
    let scale = config.effective(surface);
    FixedPoint::new(
        Fixed::from_f64(point.x.to_f64() / scale.x),
        Fixed::from_f64(point.y.to_f64() / scale.y),
    )
}

pub fn host_to_guest_fixed(
    config: &ScaleConfig,
    surface: Option<&SurfaceScale>,
    point: FixedPoint,
) -> FixedPoint {
    let scale = config.effective(surface);
    FixedPoint::new(
        Fixed::from_f64(point.x.to_f64() * scale.x),
        Fixed::from_f64(point.y.to_f64() * scale.y),
    )
}

fn axis_scale(config: &ScaleConfig, surface: Option<&SurfaceScale>, axis: ScrollAxis) -> f64 {
    let scale = config.effective(surface);
    match axis {
        ScrollAxis::Vertical => scale.y,
        ScrollAxis::Horizontal => scale.x,
    }
}

/// Single scroll-axis value, guest to host
pub fn guest_to_host_axis(
    config: &ScaleConfig,
    surface: Option<&SurfaceScale>,
    value: Fixed,
    axis: ScrollAxis,
) -> Fixed {
    Fixed::from_f64(value.to_f64() / axis_scale(config, surface, axis))
}

/// Single scroll-axis value, host to guest
pub fn host_to_guest_axis(
    config: &ScaleConfig,
    surface: Option<&SurfaceScale>,
    value: Fixed,
    axis: ScrollAxis,
) -> Fixed {
    Fixed::from_f64(value.to_f64() * axis_scale(config, surface, axis))
}

/// Convert buffer damage to host surface damage.
///
/// Uniform mode outsets by one pixel on every side before scaling and rounds
/// outward, so host-side filtering never samples outside the damaged area.
/// Direct mode divides each corner and truncates.
pub fn damage_to_host(
    config: &ScaleConfig,
    surface: Option<&SurfaceScale>,
    buffer_scale: ScalePair,
    rect: DamageRect,
) -> DamageRect {
    match config.mode {
        ScaleMode::Direct(_) => {
            let scale = config.effective(surface);
            let sx = scale.x * buffer_scale.x;
            let sy = scale.y * buffer_scale.y;
            DamageRect::new(
                (rect.x1 as f64 / sx).trunc() as i64,
                (rect.y1 as f64 / sy).trunc() as i64,
                (rect.x2 as f64 / sx).trunc() as i64,
                (rect.y2 as f64 / sy).trunc() as i64,
            )
        }
        ScaleMode::Uniform => {
            let sx = buffer_scale.x * config.scale;
            let sy = buffer_scale.y * config.scale;
            DamageRect::new(
                (rect.x1.saturating_sub(1).max(MIN_SIZE) as f64 / sx).floor() as i64,
                (rect.y1.saturating_sub(1).max(MIN_SIZE) as f64 / sy).floor() as i64,
                (rect.x2.saturating_add(1).min(MAX_SIZE) as f64 / sx).ceil() as i64,
                (rect.y2.saturating_add(1).min(MAX_SIZE) as f64 / sy).ceil() as i64,
            )
        }
    }
}

/// Logical destination size for a surface of `size` pixels.
///
/// Direct mode never yields a zero or negative dimension.
pub fn viewport_size(
    config: &ScaleConfig,
    surface: Option<&SurfaceScale>,
    contents_scale: f64,
    size: Size,
) -> Size {
    match config.mode {
        ScaleMode::Direct(_) => {
            let logical = guest_to_host(config, surface, Point::new(size.width, size.height));
            Size::new(logical.x.max(1), logical.y.max(1))
        }
        ScaleMode::Uniform => {
            let scale = config.scale * contents_scale;
            Size::new(
                (f64::from(size.width) / scale).ceil() as i32,
                (f64::from(size.height) / scale).ceil() as i32,
            )
        }
    }
}

/// Output mode dimensions advertised to the guest
pub fn output_dimensions(config: &ScaleConfig, size: Size) -> Size {
    Size::new(
        (f64::from(size.width) * config.scale) as i32,
        (f64::from(size.height) * config.scale) as i32,
    )
}

/// Clear the override and both rounding flags of `surface`
pub fn reset_surface_scale(surface: &mut SurfaceScale) {
    surface.reset();
}

/// Decide whether `surface` needs its own scale for a window of `pixels`.
///
/// Round-trips the size through the global direct factors. An exact round trip
/// (or a degenerate logical size) clears any override. Otherwise the exact
/// `pixel / logical` ratio is installed, and an axis that still does not round
/// trip switches from truncation to rounding.
pub fn try_window_scale(config: &ScaleConfig, surface: &mut SurfaceScale, pixels: Size) {
    if !config.is_direct() {
        return;
    }

    let requested = Point::new(pixels.width, pixels.height);
    let logical = guest_to_host(config, None, requested);
    let reverse = host_to_guest(config, None, logical);

    if reverse == requested || logical.x <= 0 || logical.y <= 0 {
        reset_surface_scale(surface);
        return;
    }

    *surface = SurfaceScale {
        own: Some(ScalePair::new(
            f64::from(pixels.width) / f64::from(logical.x),
            f64::from(pixels.height) / f64::from(logical.y),
        )),
        round_x: false,
        round_y: false,
        logical: Some(Size::new(logical.x, logical.y)),
    };

    let reverse = host_to_guest(
        config,
        Some(surface),
        guest_to_host(config, Some(surface), requested),
    );
    surface.round_x = reverse.x != requested.x;
    surface.round_y = reverse.y != requested.y;
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn round_trip(config: &ScaleConfig, surface: Option<&SurfaceScale>, size: Size) -> Point {
        let point = Point::new(size.width, size.height);
        host_to_guest(config, surface, guest_to_host(config, surface, point))
    }

    #[test]
    fn test_unit_scale_is_identity() {
        let config = ScaleConfig::uniform(1.0);
        let logical = guest_to_host(&config, None, Point::new(800, 600));
        assert_eq!(logical, Point::new(800, 600));
        assert_eq!(host_to_guest(&config, None, logical), Point::new(800, 600));
    }

    #[test]
    fn test_uniform_scale_two() {
        let config = ScaleConfig::uniform(2.0);
        assert_eq!(guest_to_host(&config, None, Point::new(800, 600)), Point::new(400, 300));
        assert_eq!(host_to_guest(&config, None, Point::new(400, 300)), Point::new(800, 600));
        assert_eq!(
            output_dimensions(&config, Size::new(800, 600)),
            Size::new(1600, 1200)
        );
    }

    #[test]
    fn test_uniform_truncates_toward_zero() {
        let config = ScaleConfig::uniform(2.0);
        assert_eq!(guest_to_host(&config, None, Point::new(5, -5)), Point::new(2, -2));
        let config = ScaleConfig::uniform(1.5);
        assert_eq!(host_to_guest(&config, None, Point::new(3, -3)), Point::new(4, -4));
    }

    #[test]
    fn test_uniform_ignores_surface_override() {
        let config = ScaleConfig::uniform(2.0);
        let surface = SurfaceScale::with_override(ScalePair::new(3.0, 3.0), true, true);
        assert_eq!(
            guest_to_host(&config, Some(&surface), Point::new(9, 9)),
            Point::new(4, 4)
        );
        assert_eq!(config.effective(Some(&surface)), ScalePair::uniform(2.0));
    }

    #[test]
    fn test_direct_falls_back_to_global_pair() {
        let config = ScaleConfig::direct(1.0, ScalePair::new(2.0, 4.0));
        let surface = SurfaceScale::default();
        assert_eq!(
            guest_to_host(&config, Some(&surface), Point::new(100, 100)),
            Point::new(50, 25)
        );
        assert_eq!(guest_to_host(&config, None, Point::new(100, 100)), Point::new(50, 25));
    }

    #[test]
    fn test_direct_uses_surface_override() {
        let config = ScaleConfig::direct(1.0, ScalePair::new(2.0, 2.0));
        let surface = SurfaceScale::with_override(ScalePair::new(1.5, 1.5), false, false);
        assert_eq!(
            guest_to_host(&config, Some(&surface), Point::new(9, 9)),
            Point::new(6, 6)
        );
    }

    #[test]
    fn test_direct_rounding_flag_per_axis() {
        let config = ScaleConfig::direct(1.0, ScalePair::new(2.0, 2.0));
        let surface = SurfaceScale::with_override(ScalePair::new(1.5, 1.5), true, false);
        // 3 * 1.5 = 4.5: x rounds half away from zero, y truncates
        assert_eq!(
            host_to_guest(&config, Some(&surface), Point::new(3, 3)),
            Point::new(5, 4)
        );
        // 7 / 1.5 = 4.67
        assert_eq!(
            guest_to_host(&config, Some(&surface), Point::new(7, 7)),
            Point::new(5, 4)
        );
        assert_eq!(
            host_to_guest(&config, Some(&surface), Point::new(-3, -3)),
            Point::new(-5, -4)
        );
    }

    #[test]
    fn test_fixed_conversions() {
        let config = ScaleConfig::uniform(2.0);
        let point = FixedPoint::new(Fixed::from_f64(10.5), Fixed::from_f64(-3.0));
        let host = guest_to_host_fixed(&config, None, point);
        assert_eq!(host, FixedPoint::new(Fixed::from_f64(5.25), Fixed::from_f64(-1.5)));
        assert_eq!(host_to_guest_fixed(&config, None, host), point);
    }

    #[test]
    fn test_axis_uses_matching_factor() {
        let config = ScaleConfig::direct(1.0, ScalePair::new(2.0, 4.0));
        let value = Fixed::from_int(8);
        assert_eq!(
            guest_to_host_axis(&config, None, value, ScrollAxis::Vertical),
            Fixed::from_int(2)
        );
        assert_eq!(
            guest_to_host_axis(&config, None, value, ScrollAxis::Horizontal),
            Fixed::from_int(4)
        );
        assert_eq!(
            host_to_guest_axis(&config, None, Fixed::from_int(2), ScrollAxis::Vertical),
            Fixed::from_int(8)
        );
        assert_eq!(ScrollAxis::from_wire(1), Some(ScrollAxis::Horizontal));
        assert_eq!(ScrollAxis::from_wire(2), None);
    }

    #[test]
    fn test_uniform_damage_outset() {
        let config = ScaleConfig::uniform(2.0);
        let damage = damage_to_host(
            &config,
            None,
            ScalePair::IDENTITY,
            DamageRect::new(10, 10, 20, 21),
        );
        assert_eq!(damage, DamageRect::new(4, 4, 11, 11));
    }

    #[test]
    fn test_direct_damage_truncates_without_outset() {
        let config = ScaleConfig::direct(1.0, ScalePair::new(2.0, 2.0));
        let damage = damage_to_host(
            &config,
            None,
            ScalePair::IDENTITY,
            DamageRect::new(10, 11, 20, 21),
        );
        assert_eq!(damage, DamageRect::new(5, 5, 10, 10));

        let damage = damage_to_host(
            &config,
            None,
            ScalePair::new(2.0, 1.0),
            DamageRect::new(10, 11, 20, 21),
        );
        assert_eq!(damage, DamageRect::new(2, 5, 5, 10));
    }

    #[test]
    fn test_viewport_size() {
        let config = ScaleConfig::uniform(2.0);
        assert_eq!(
            viewport_size(&config, None, 1.0, Size::new(801, 600)),
            Size::new(401, 300)
        );
        assert_eq!(
            viewport_size(&config, None, 0.5, Size::new(801, 600)),
            Size::new(801, 600)
        );
    }

    #[test]
    fn test_direct_viewport_never_zero() {
        let config = ScaleConfig::direct(1.0, ScalePair::new(2.0, 2.0));
        assert_eq!(
            viewport_size(&config, None, 1.0, Size::new(1, 1)),
            Size::new(1, 1)
        );
        assert_eq!(
            viewport_size(&config, None, 1.0, Size::new(0, 7)),
            Size::new(1, 3)
        );
    }

    #[test]
    fn test_calibration_noop_in_uniform_mode() {
        let config = ScaleConfig::uniform(1.5);
        let mut surface = SurfaceScale::with_override(ScalePair::new(2.0, 2.0), true, true);
        try_window_scale(&config, &mut surface, Size::new(5, 5));
        assert!(surface.has_own_scale());
        assert!(surface.rounds_x());
    }

    #[test]
    fn test_calibration_keeps_global_when_exact() {
        let config = ScaleConfig::direct(1.0, ScalePair::new(2.0, 2.0));
        let mut surface = SurfaceScale::with_override(ScalePair::new(3.0, 3.0), true, true);
        try_window_scale(&config, &mut surface, Size::new(800, 600));
        assert_eq!(surface, SurfaceScale::default());
    }

    #[test]
    fn test_calibration_installs_override() {
        // 5 / 1.5 truncates to 3, and 3 * 1.5 truncates to 4
        let config = ScaleConfig::direct(1.0, ScalePair::new(1.5, 1.5));
        let mut surface = SurfaceScale::default();
        try_window_scale(&config, &mut surface, Size::new(5, 6));

        assert!(surface.has_own_scale());
        let own = surface.own_scale().unwrap();
        assert_eq!(own.x, 5.0 / 3.0);
        assert_eq!(own.y, 1.5);
        assert_eq!(surface.cached_logical_size(), Some(Size::new(3, 4)));
        assert_eq!(round_trip(&config, Some(&surface), Size::new(5, 6)), Point::new(5, 6));
    }

    #[test]
    fn test_calibration_degenerate_logical_size() {
        let config = ScaleConfig::direct(1.0, ScalePair::new(4.0, 4.0));
        let mut surface = SurfaceScale::with_override(ScalePair::new(3.0, 3.0), false, true);
        try_window_scale(&config, &mut surface, Size::new(3, 100));
        assert_eq!(surface, SurfaceScale::default());
    }

    #[test]
    fn test_calibration_reset_after_override() {
        let config = ScaleConfig::direct(1.0, ScalePair::new(1.5, 1.5));
        let mut surface = SurfaceScale::default();
        try_window_scale(&config, &mut surface, Size::new(5, 5));
        assert!(surface.has_own_scale());
        try_window_scale(&config, &mut surface, Size::new(6, 6));
        assert!(!surface.has_own_scale());
        assert!(!surface.rounds_x() && !surface.rounds_y());
    }

    proptest! {
        #[test]
        fn prop_calibration_round_trip_is_exact(
            width in 1i32..8192,
            height in 1i32..8192,
            scale_x in 0.5f64..4.0,
            scale_y in 0.5f64..4.0,
        ) {
            let config = ScaleConfig::direct(1.0, ScalePair::new(scale_x, scale_y));
            let mut surface = SurfaceScale::default();
            let pixels = Size::new(width, height);
            try_window_scale(&config, &mut surface, pixels);

            let result = round_trip(&config, Some(&surface), pixels);
            if result != Point::new(width, height) {
                // Only a degenerate logical size may leave the size inexact
                let logical = guest_to_host(&config, None, Point::new(width, height));
                prop_assert!(!surface.has_own_scale());
                prop_assert!(logical.x <= 0 || logical.y <= 0);
            }
        }

        #[test]
        fn prop_uniform_damage_contains_naive_division(
            x1 in -100_000i64..100_000,
            y1 in -100_000i64..100_000,
            w in 0i64..50_000,
            h in 0i64..50_000,
            scale in 0.25f64..8.0,
        ) {
            let config = ScaleConfig::uniform(scale);
            let rect = DamageRect::new(x1, y1, x1 + w, y1 + h);
            let outset = damage_to_host(&config, None, ScalePair::IDENTITY, rect);
            let naive = DamageRect::new(
                (rect.x1 as f64 / scale).trunc() as i64,
                (rect.y1 as f64 / scale).trunc() as i64,
                (rect.x2 as f64 / scale).trunc() as i64,
                (rect.y2 as f64 / scale).trunc() as i64,
            );
            prop_assert!(outset.contains(&naive));
        }
    }
}
