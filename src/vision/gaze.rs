use std::collections::VecDeque;

use serde::Serialize;

use super::Point;

/// Gaze points kept for smoothing.
const HISTORY_SIZE: usize = 10;
const MIN_SENSITIVITY: f64 = 0.5;
const MAX_SENSITIVITY: f64 = 2.0;
/// Gap between the last two blinks that counts as a deliberate double blink.
const DOUBLE_BLINK_MIN_GAP_MS: u64 = 100;
const DOUBLE_BLINK_MAX_GAP_MS: u64 = 400;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum GazeDirection {
    Center,
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Band {
    Low,
    Middle,
    High,
}

impl GazeDirection {
    fn from_bands(horizontal: Band, vertical: Band) -> Self {
        match (horizontal, vertical) {
            (Band::Low, Band::Low) => GazeDirection::UpLeft,
            (Band::High, Band::Low) => GazeDirection::UpRight,
            (Band::Low, Band::High) => GazeDirection::DownLeft,
            (Band::High, Band::High) => GazeDirection::DownRight,
            (Band::Low, Band::Middle) => GazeDirection::Left,
            (Band::High, Band::Middle) => GazeDirection::Right,
            (Band::Middle, Band::Low) => GazeDirection::Up,
            (Band::Middle, Band::High) => GazeDirection::Down,
            (Band::Middle, Band::Middle) => GazeDirection::Center,
        }
    }
}

/// Frame split into a 3x3 grid; the middle cell is "center".
#[derive(Debug, Clone, Copy)]
struct Calibration {
    center: Point,
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
}

impl Calibration {
    fn for_frame(width: u32, height: u32) -> Self {
        let (width, height) = (f64::from(width), f64::from(height));
        Self {
            center: Point::new(width / 2.0, height / 2.0),
            left: width / 3.0,
            right: width * 2.0 / 3.0,
            top: height / 3.0,
            bottom: height * 2.0 / 3.0,
        }
    }
}

fn band(value: f64, low: f64, high: f64) -> Band {
    if value < low {
        Band::Low
    } else if value > high {
        Band::High
    } else {
        Band::Middle
    }
}

/// Coarse gaze direction from the midpoint between the eyes, smoothed over
/// recent frames. Drives hands-free control when gaze control is enabled.
#[derive(Debug)]
pub struct GazeTracker {
    calibration: Option<Calibration>,
    history: VecDeque<Point>,
    current: Point,
    horizontal_sensitivity: f64,
    vertical_sensitivity: f64,
}

impl Default for GazeTracker {
    fn default() -> Self {
        Self {
            calibration: None,
            history: VecDeque::with_capacity(HISTORY_SIZE),
            current: Point::new(0.0, 0.0),
            horizontal_sensitivity: 1.0,
            vertical_sensitivity: 1.0,
        }
    }
}

impl GazeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one frame's eye centres. The first frame fixes the calibration
    /// grid; later frame sizes are ignored until `recalibrate`.
    pub fn update(
        &mut self,
        left_eye: Point,
        right_eye: Point,
        frame_width: u32,
        frame_height: u32,
    ) -> GazeDirection {
        let calibration = *self
            .calibration
            .get_or_insert_with(|| Calibration::for_frame(frame_width, frame_height));

        let midpoint = Point::new(
            (left_eye.x + right_eye.x) / 2.0,
            (left_eye.y + right_eye.y) / 2.0,
        );
        if self.history.len() == HISTORY_SIZE {
            self.history.pop_front();
        }
        self.history.push_back(midpoint);

        self.current = self.smoothed();
        self.direction(calibration)
    }

    /// Smoothed gaze position in frame coordinates.
    pub fn current_position(&self) -> Point {
        self.current
    }

    /// Both values are clamped to 0.5..=2.0. Higher values need less eye
    /// movement to leave the center cell.
    pub fn set_sensitivity(&mut self, horizontal: f64, vertical: f64) {
        self.horizontal_sensitivity = horizontal.clamp(MIN_SENSITIVITY, MAX_SENSITIVITY);
        self.vertical_sensitivity = vertical.clamp(MIN_SENSITIVITY, MAX_SENSITIVITY);
    }

    pub fn sensitivity(&self) -> (f64, f64) {
        (self.horizontal_sensitivity, self.vertical_sensitivity)
    }

    pub fn recalibrate(&mut self) {
        self.calibration = None;
        self.history.clear();
    }

    // Linear weights: the newest point counts HISTORY_SIZE times the oldest.
    fn smoothed(&self) -> Point {
        let mut total = Point::new(0.0, 0.0);
        let mut total_weight = 0.0;
        for (index, point) in self.history.iter().enumerate() {
            let weight = (index + 1) as f64;
            total.x += point.x * weight;
            total.y += point.y * weight;
            total_weight += weight;
        }
        if total_weight == 0.0 {
            return total;
        }
        Point::new(total.x / total_weight, total.y / total_weight)
    }

    fn direction(&self, calibration: Calibration) -> GazeDirection {
        let x = calibration.center.x
            + (self.current.x - calibration.center.x) * self.horizontal_sensitivity;
        let y = calibration.center.y
            + (self.current.y - calibration.center.y) * self.vertical_sensitivity;

        GazeDirection::from_bands(
            band(x, calibration.left, calibration.right),
            band(y, calibration.top, calibration.bottom),
        )
    }
}

/// True when the two most recent blinks (timestamps in ms, oldest first) are
/// 100-400 ms apart.
pub fn detect_double_blink(blink_times_ms: &[u64]) -> bool {
    match blink_times_ms {
        [.., previous, last] => {
            let gap = last.saturating_sub(*previous);
            (DOUBLE_BLINK_MIN_GAP_MS..=DOUBLE_BLINK_MAX_GAP_MS).contains(&gap)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDTH: u32 = 600;
    const HEIGHT: u32 = 300;

    fn look_at(tracker: &mut GazeTracker, x: f64, y: f64) -> GazeDirection {
        // eyes 40 px apart, centred on (x, y)
        tracker.update(
            Point::new(x - 20.0, y),
            Point::new(x + 20.0, y),
            WIDTH,
            HEIGHT,
        )
    }

    #[test]
    fn grid_cells_map_to_directions() {
        let cases = [
            (300.0, 150.0, GazeDirection::Center),
            (300.0, 50.0, GazeDirection::Up),
            (300.0, 250.0, GazeDirection::Down),
            (100.0, 150.0, GazeDirection::Left),
            (500.0, 150.0, GazeDirection::Right),
            (100.0, 50.0, GazeDirection::UpLeft),
            (500.0, 50.0, GazeDirection::UpRight),
            (100.0, 250.0, GazeDirection::DownLeft),
            (500.0, 250.0, GazeDirection::DownRight),
        ];
        for (x, y, expected) in cases {
            let mut tracker = GazeTracker::new();
            assert_eq!(look_at(&mut tracker, x, y), expected, "({x}, {y})");
        }
    }

    #[test]
    fn boundaries_belong_to_the_center_cell() {
        let mut tracker = GazeTracker::new();
        assert_eq!(look_at(&mut tracker, 200.0, 100.0), GazeDirection::Center);
    }

    #[test]
    fn smoothing_weights_recent_points() {
        let mut tracker = GazeTracker::new();
        look_at(&mut tracker, 300.0, 150.0);
        let direction = look_at(&mut tracker, 570.0, 150.0);

        // (300 * 1 + 570 * 2) / 3
        assert!((tracker.current_position().x - 480.0).abs() < 1e-9);
        assert_eq!(direction, GazeDirection::Right);
    }

    #[test]
    fn history_keeps_the_last_ten_points() {
        let mut tracker = GazeTracker::new();
        for _ in 0..5 {
            look_at(&mut tracker, 0.0, 150.0);
        }
        for _ in 0..HISTORY_SIZE {
            look_at(&mut tracker, 300.0, 150.0);
        }
        assert!((tracker.current_position().x - 300.0).abs() < 1e-9);
    }

    #[test]
    fn first_frame_fixes_calibration_until_reset() {
        let mut tracker = GazeTracker::new();
        assert_eq!(look_at(&mut tracker, 300.0, 150.0), GazeDirection::Center);

        // a larger frame does not move the grid
        let direction = tracker.update(
            Point::new(280.0, 150.0),
            Point::new(320.0, 150.0),
            1_800,
            900,
        );
        assert_eq!(direction, GazeDirection::Center);

        tracker.recalibrate();
        let direction = tracker.update(
            Point::new(280.0, 150.0),
            Point::new(320.0, 150.0),
            1_800,
            900,
        );
        assert_eq!(direction, GazeDirection::UpLeft);
    }

    #[test]
    fn sensitivity_is_clamped_and_scales_offsets() {
        let mut tracker = GazeTracker::new();
        tracker.set_sensitivity(5.0, 0.1);
        assert_eq!(tracker.sensitivity(), (2.0, 0.5));

        // 80 px right of center doubles to 160, past the 100 px boundary;
        // 80 px up halves to 40, still inside
        assert_eq!(look_at(&mut tracker, 380.0, 70.0), GazeDirection::Right);
    }

    #[test]
    fn double_blink_needs_a_gap_between_100_and_400_ms() {
        assert!(!detect_double_blink(&[]));
        assert!(!detect_double_blink(&[1_000]));
        assert!(detect_double_blink(&[1_000, 1_100]));
        assert!(detect_double_blink(&[0, 1_000, 1_400]));
        assert!(!detect_double_blink(&[1_000, 1_050]));
        assert!(!detect_double_blink(&[1_000, 1_401]));
        assert!(!detect_double_blink(&[1_400, 1_000]));
    }
}
