use egui::Color32;
use uom::si::f64::{Length, Velocity};
use uom::si::length::{kilometer, meter};
use uom::si::velocity::{kilometer_per_hour, meter_per_second};

pub(crate) mod viewer;

pub(crate) const PALETTE_BLACK: Color32 = Color32::from_rgb(12, 12, 12);
pub(crate) const PALETTE_BROWN: Color32 = Color32::from_rgb(72, 30, 20);
pub(crate) const PALETTE_MAROON: Color32 = Color32::from_rgb(155, 57, 34);
pub(crate) const PALETTE_ORANGE: Color32 = Color32::from_rgb(242, 97, 63);

pub(crate) fn stroke_shade(start: Color32, end: Color32, y: f32) -> Color32 {
    let y = if y.is_finite() { y.clamp(0., 1.) } else { 0. };
    let channel =
        |a: u8, b: u8| (a as f32 + y * (b as f32 - a as f32)).round().clamp(0., 255.) as u8;
    Color32::from_rgb(
        channel(start.r(), end.r()),
        channel(start.g(), end.g()),
        channel(start.b(), end.b()),
    )
}

/// `MM:SS`, minutes keep counting past an hour. Unknown times show `00:00`.
pub(crate) fn format_clock(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0. {
        return "00:00".to_string();
    }
    let whole = seconds.floor() as u64;
    format!("{:02}:{:02}", whole / 60, whole % 60)
}

pub(crate) fn format_speed(speed_mps: Option<f64>) -> String {
    match speed_mps {
        Some(speed) => format!(
            "{:.1} km/h",
            Velocity::new::<meter_per_second>(speed).get::<kilometer_per_hour>()
        ),
        None => "--".to_string(),
    }
}

pub(crate) fn format_elevation(elevation_m: Option<f64>) -> String {
    match elevation_m {
        Some(elevation) => format!("{:.0} m", elevation),
        None => "--".to_string(),
    }
}

pub(crate) fn format_distance(distance_m: f64) -> String {
    format!("{:.2} km", Length::new::<meter>(distance_m).get::<kilometer>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0.), "00:00");
        assert_eq!(format_clock(59.9), "00:59");
        assert_eq!(format_clock(61.), "01:01");
        assert_eq!(format_clock(3725.), "62:05");
        assert_eq!(format_clock(f64::NAN), "00:00");
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_speed(Some(10.)), "36.0 km/h");
        assert_eq!(format_speed(None), "--");
        assert_eq!(format_elevation(Some(102.4)), "102 m");
        assert_eq!(format_distance(1234.), "1.23 km");
    }

    #[test]
    fn test_stroke_shade_endpoints() {
        assert_eq!(stroke_shade(PALETTE_ORANGE, Color32::RED, 0.), PALETTE_ORANGE);
        assert_eq!(stroke_shade(PALETTE_ORANGE, Color32::RED, 1.), Color32::RED);
        assert_eq!(stroke_shade(PALETTE_ORANGE, Color32::RED, 7.), Color32::RED);
    }
}
