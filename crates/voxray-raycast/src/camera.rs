//! Orbit/zoom camera.
//!
//! Turns raw pointer and key deltas into the projection/view/model matrix triple
//! consumed by the raycasting shader. The camera is a small state machine:
//! `Idle` is the resting state, a left drag enters `Rotating`, a right drag
//! enters `Zooming`, and releasing the button returns to `Idle`.

use glam::{Mat4, Vec3};

/// Pointer-to-angle factor while rotating (radians per logical pixel).
pub const ROTATION_SPEED: f32 = 0.01;

/// Pointer-to-distance factor while zooming (units per logical pixel).
pub const ZOOM_SPEED: f32 = 0.01;

/// Angle added per discrete `rotate(±1)` step (radians).
pub const KEY_ROTATION_STEP: f32 = 5.0 * std::f32::consts::PI / 180.0;

/// Distance added per discrete `zoom(±1)` step.
pub const KEY_ZOOM_STEP: f32 = 0.1;

/// Lower bound for the eye distance. Reaching zero would collapse the view matrix.
pub const MIN_ZOOM_DISTANCE: f32 = 0.05;

/// Eye distance at startup.
pub const INITIAL_DISTANCE: f32 = 3.0;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CameraMode {
    Idle,
    Rotating,
    Zooming,
}

/// Viewport rectangle in physical pixels.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Width over height; a zero height counts as one pixel.
    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 1,
            height: 1,
        }
    }
}

/// Perspective parameters. `fov_y_degrees` is the vertical field of view.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ProjectionParams {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ProjectionParams {
    fn default() -> Self {
        Self {
            fov_y_degrees: 60.0,
            near: 0.1,
            far: 10.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Camera {
    viewport: Viewport,
    projection: ProjectionParams,
    mode: CameraMode,

    /// Pointer position recorded at the last start/move while dragging.
    anchor: (f32, f32),

    /// Rotation around the X axis (vertical drag).
    angle_x: f32,
    /// Rotation around the Y axis (horizontal drag, keyboard rotate).
    angle_y: f32,

    distance: f32,

    /// Fit transform derived from the last loaded dataset bounds.
    centering: Vec3,
    scaling: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(ProjectionParams::default())
    }
}

impl Camera {
    pub fn new(projection: ProjectionParams) -> Self {
        Self {
            viewport: Viewport::default(),
            projection,
            mode: CameraMode::Idle,
            anchor: (0.0, 0.0),
            angle_x: 0.0,
            angle_y: 0.0,
            distance: INITIAL_DISTANCE,
            centering: Vec3::ZERO,
            scaling: 1.0,
        }
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn angles(&self) -> (f32, f32) {
        (self.angle_x, self.angle_y)
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.viewport = Viewport {
            x,
            y,
            width,
            height,
        };
    }

    /// Stores perspective parameters; the matrix is built by [`Camera::projection`].
    pub fn set_projection(&mut self, fov_y_degrees: f32, near: f32, far: f32) {
        self.projection = ProjectionParams {
            fov_y_degrees,
            near,
            far,
        };
    }

    pub fn projection_params(&self) -> ProjectionParams {
        self.projection
    }

    /// Current projection matrix (right-handed, 0..1 depth).
    pub fn projection(&self) -> Mat4 {
        let p = self.projection;
        Mat4::perspective_rh(
            p.fov_y_degrees.to_radians(),
            self.viewport.aspect(),
            p.near,
            p.far,
        )
    }

    /// Fits the model transform to a dataset bounding box.
    ///
    /// The box centre maps to the origin and its largest half-extent to 1, so the
    /// dataset fills the reference cube `[-1, 1]^3`.
    pub fn update_model(&mut self, min: Vec3, max: Vec3) {
        let half_extent = ((max - min) * 0.5).abs().max_element();
        self.centering = (min + max) * 0.5;
        self.scaling = if half_extent > f32::EPSILON {
            1.0 / half_extent
        } else {
            1.0
        };
        log::debug!(
            "camera fit: centre {:?}, scale {}",
            self.centering,
            self.scaling
        );
    }

    /// Current view matrix: orbit rotation followed by a pull-back along -Z.
    pub fn view(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, -self.distance))
            * Mat4::from_rotation_x(self.angle_x)
            * Mat4::from_rotation_y(self.angle_y)
    }

    /// Current model matrix: recentre, then uniform scale.
    pub fn model(&self) -> Mat4 {
        Mat4::from_scale(Vec3::splat(self.scaling)) * Mat4::from_translation(-self.centering)
    }

    // ── rotation ──────────────────────────────────────────────────────────

    pub fn start_rotating(&mut self, x: f32, y: f32) {
        if self.enter(CameraMode::Rotating) {
            self.anchor = (x, y);
        }
    }

    pub fn stop_rotating(&mut self, _x: f32, _y: f32) {
        self.leave(CameraMode::Rotating);
    }

    /// Vertical pointer position drives rotation around X. Ignored unless rotating.
    pub fn set_rotation_x(&mut self, y: f32) {
        if self.mode != CameraMode::Rotating {
            return;
        }
        self.angle_x += (y - self.anchor.1) * ROTATION_SPEED;
        self.anchor.1 = y;
    }

    /// Horizontal pointer position drives rotation around Y. Ignored unless rotating.
    pub fn set_rotation_y(&mut self, x: f32) {
        if self.mode != CameraMode::Rotating {
            return;
        }
        self.angle_y += (x - self.anchor.0) * ROTATION_SPEED;
        self.anchor.0 = x;
    }

    /// Discrete rotation around Y, in steps of [`KEY_ROTATION_STEP`].
    pub fn rotate(&mut self, delta: f32) {
        self.angle_y += delta * KEY_ROTATION_STEP;
    }

    // ── zoom ──────────────────────────────────────────────────────────────

    pub fn start_zooming(&mut self, x: f32, y: f32) {
        if self.enter(CameraMode::Zooming) {
            self.anchor = (x, y);
        }
    }

    pub fn stop_zooming(&mut self, _x: f32, _y: f32) {
        self.leave(CameraMode::Zooming);
    }

    /// Vertical pointer position drives the eye distance. Ignored unless zooming.
    pub fn safe_zoom(&mut self, y: f32) {
        if self.mode != CameraMode::Zooming {
            return;
        }
        self.add_distance((y - self.anchor.1) * ZOOM_SPEED);
        self.anchor.1 = y;
    }

    /// Discrete zoom, in steps of [`KEY_ZOOM_STEP`]. Negative moves closer.
    pub fn zoom(&mut self, delta: f32) {
        self.add_distance(delta * KEY_ZOOM_STEP);
    }

    fn add_distance(&mut self, delta: f32) {
        let next = self.distance + delta;
        // Non-finite steps are dropped so the view matrix stays finite.
        if next.is_finite() {
            self.distance = next.max(MIN_ZOOM_DISTANCE);
        }
    }

    // ── mode transitions ──────────────────────────────────────────────────

    fn enter(&mut self, mode: CameraMode) -> bool {
        if self.mode != CameraMode::Idle {
            log::debug!("camera: ignoring {mode:?} while {:?}", self.mode);
            return false;
        }
        self.mode = mode;
        log::debug!("camera: Idle -> {mode:?}");
        true
    }

    fn leave(&mut self, mode: CameraMode) {
        if self.mode == mode {
            self.mode = CameraMode::Idle;
            log::debug!("camera: {mode:?} -> Idle");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn mat_approx(a: Mat4, b: Mat4) -> bool {
        a.to_cols_array()
            .iter()
            .zip(b.to_cols_array().iter())
            .all(|(x, y)| approx(*x, *y))
    }

    // ── state machine ─────────────────────────────────────────────────────

    #[test]
    fn starts_idle_and_round_trips_modes() {
        let mut cam = Camera::default();
        assert_eq!(cam.mode(), CameraMode::Idle);

        cam.start_rotating(0.0, 0.0);
        assert_eq!(cam.mode(), CameraMode::Rotating);
        cam.stop_rotating(0.0, 0.0);
        assert_eq!(cam.mode(), CameraMode::Idle);

        cam.start_zooming(0.0, 0.0);
        assert_eq!(cam.mode(), CameraMode::Zooming);
        cam.stop_zooming(0.0, 0.0);
        assert_eq!(cam.mode(), CameraMode::Idle);
    }

    #[test]
    fn modes_are_mutually_exclusive() {
        let mut cam = Camera::default();
        cam.start_rotating(0.0, 0.0);
        cam.start_zooming(0.0, 0.0);
        assert_eq!(cam.mode(), CameraMode::Rotating);

        // Stopping the other mode does nothing.
        cam.stop_zooming(0.0, 0.0);
        assert_eq!(cam.mode(), CameraMode::Rotating);
    }

    #[test]
    fn moves_outside_a_drag_are_ignored() {
        let mut cam = Camera::default();
        let view = cam.view();
        cam.set_rotation_x(120.0);
        cam.set_rotation_y(-40.0);
        cam.safe_zoom(300.0);
        assert_eq!(cam.view(), view);
        assert_eq!(cam.distance(), INITIAL_DISTANCE);
    }

    #[test]
    fn zoom_moves_do_not_rotate() {
        let mut cam = Camera::default();
        cam.start_zooming(10.0, 10.0);
        cam.set_rotation_x(50.0);
        cam.set_rotation_y(50.0);
        assert_eq!(cam.angles(), (0.0, 0.0));
    }

    // ── rotation ──────────────────────────────────────────────────────────

    #[test]
    fn rotation_depends_only_on_total_delta() {
        let mut coarse = Camera::default();
        coarse.start_rotating(100.0, 100.0);
        coarse.set_rotation_x(160.0);
        coarse.set_rotation_y(40.0);
        coarse.stop_rotating(40.0, 160.0);

        let mut fine = Camera::default();
        fine.start_rotating(100.0, 100.0);
        for i in 1..=30 {
            let t = i as f32 / 30.0;
            fine.set_rotation_x(100.0 + 60.0 * t);
            fine.set_rotation_y(100.0 - 60.0 * t);
        }
        fine.stop_rotating(40.0, 160.0);

        let (ax, ay) = coarse.angles();
        assert!(approx(ax, 60.0 * ROTATION_SPEED));
        assert!(approx(ay, -60.0 * ROTATION_SPEED));
        assert!(mat_approx(coarse.view(), fine.view()));
    }

    #[test]
    fn back_and_forth_cancels_out() {
        let mut cam = Camera::default();
        let view = cam.view();
        cam.start_rotating(0.0, 0.0);
        cam.set_rotation_y(80.0);
        cam.set_rotation_y(-15.0);
        cam.set_rotation_y(0.0);
        cam.stop_rotating(0.0, 0.0);
        assert!(mat_approx(cam.view(), view));
    }

    #[test]
    fn second_drag_starts_from_new_anchor() {
        let mut cam = Camera::default();
        cam.start_rotating(0.0, 0.0);
        cam.set_rotation_y(10.0);
        cam.stop_rotating(10.0, 0.0);

        cam.start_rotating(500.0, 0.0);
        cam.set_rotation_y(510.0);
        assert!(approx(cam.angles().1, 20.0 * ROTATION_SPEED));
    }

    #[test]
    fn keyboard_rotate_steps() {
        let mut cam = Camera::default();
        cam.rotate(1.0);
        cam.rotate(1.0);
        cam.rotate(-1.0);
        assert!(approx(cam.angles().1, KEY_ROTATION_STEP));
    }

    // ── zoom ──────────────────────────────────────────────────────────────

    #[test]
    fn safe_zoom_follows_pointer() {
        let mut cam = Camera::default();
        cam.start_zooming(0.0, 0.0);
        cam.safe_zoom(50.0);
        assert!(approx(cam.distance(), INITIAL_DISTANCE + 50.0 * ZOOM_SPEED));
    }

    #[test]
    fn zoom_never_reaches_below_minimum() {
        let deltas = [-1.0, -10.0, -1e3, -1e9, f32::MIN, f32::NEG_INFINITY, f32::NAN, 0.5];
        let mut cam = Camera::default();
        for d in deltas {
            cam.zoom(d);
            assert!(cam.distance() >= MIN_ZOOM_DISTANCE, "delta {d}");
        }

        let mut cam = Camera::default();
        cam.start_zooming(0.0, 1e6);
        for y in [0.0, -1e6, 3.0, -1e12] {
            cam.safe_zoom(y);
            assert!(cam.distance() >= MIN_ZOOM_DISTANCE, "y {y}");
        }
    }

    #[test]
    fn infinite_zoom_keeps_view_finite() {
        let mut cam = Camera::default();
        let before = cam.distance();
        cam.zoom(f32::INFINITY);
        assert_eq!(cam.distance(), before);
        assert!(cam.view().is_finite());

        cam.start_zooming(0.0, 0.0);
        cam.safe_zoom(f32::MAX);
        cam.safe_zoom(-f32::MAX);
        assert!(cam.distance().is_finite());
        assert!(cam.view().is_finite());
    }

    #[test]
    fn zoom_out_after_clamp_recovers() {
        let mut cam = Camera::default();
        cam.zoom(-1000.0);
        assert_eq!(cam.distance(), MIN_ZOOM_DISTANCE);
        cam.zoom(1.0);
        assert!(approx(cam.distance(), MIN_ZOOM_DISTANCE + KEY_ZOOM_STEP));
    }

    // ── matrices ──────────────────────────────────────────────────────────

    #[test]
    fn update_model_centres_and_scales_box() {
        let mut cam = Camera::default();
        cam.update_model(Vec3::ZERO, Vec3::splat(2.0));
        let model = cam.model();

        let centre = model * Vec4::new(1.0, 1.0, 1.0, 1.0);
        assert!(approx(centre.x, 0.0) && approx(centre.y, 0.0) && approx(centre.z, 0.0));

        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { 0.0 } else { 2.0 },
                if i & 2 == 0 { 0.0 } else { 2.0 },
                if i & 4 == 0 { 0.0 } else { 2.0 },
            );
            let p = model.transform_point3(corner);
            let opposite = model.transform_point3(Vec3::splat(2.0) - corner);
            // Symmetric around the origin, on the unit reference cube.
            assert!((p + opposite).length() < 1e-5);
            assert!(approx(p.x.abs(), 1.0) && approx(p.y.abs(), 1.0) && approx(p.z.abs(), 1.0));
        }
    }

    #[test]
    fn update_model_uses_largest_extent() {
        let mut cam = Camera::default();
        cam.update_model(Vec3::new(-4.0, -1.0, 0.0), Vec3::new(4.0, 1.0, 2.0));
        let p = cam.model().transform_point3(Vec3::new(4.0, 1.0, 2.0));
        assert!(approx(p.x, 1.0));
        assert!(approx(p.y, 0.25));
        assert!(approx(p.z, 0.25));
    }

    #[test]
    fn degenerate_box_keeps_unit_scale() {
        let mut cam = Camera::default();
        cam.update_model(Vec3::splat(3.0), Vec3::splat(3.0));
        let p = cam.model().transform_point3(Vec3::new(4.0, 3.0, 3.0));
        assert!(approx(p.x, 1.0) && approx(p.y, 0.0));
    }

    #[test]
    fn projection_uses_viewport_aspect() {
        let mut cam = Camera::default();
        cam.set_viewport(0, 0, 800, 400);
        cam.set_projection(90.0, 0.1, 10.0);
        let m = cam.projection();
        // For fov 90°, focal length is 1; x scale is divided by aspect 2.
        assert!(approx(m.y_axis.y, 1.0));
        assert!(approx(m.x_axis.x, 0.5));
    }

    #[test]
    fn zero_height_viewport_is_safe() {
        let mut cam = Camera::default();
        cam.set_viewport(0, 0, 640, 0);
        assert!(cam.projection().is_finite());
    }

    #[test]
    fn view_places_eye_at_distance() {
        let cam = Camera::default();
        let origin_in_eye = cam.view().transform_point3(Vec3::ZERO);
        assert!(approx(origin_in_eye.z, -INITIAL_DISTANCE));
    }
}
