use std::sync::Arc;

use egui::{Color32, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoints, VLine};
use itertools::Itertools;
use telesync::ProjectedPoint;
use uom::si::f64::Velocity;
use uom::si::velocity::{kilometer_per_hour, meter_per_second};

use crate::ui::{PALETTE_ORANGE, stroke_shade};

fn speed_kmh(point: &ProjectedPoint) -> Option<f64> {
    point
        .sample
        .speed()
        .map(|s| Velocity::new::<meter_per_second>(s).get::<kilometer_per_hour>())
}

/// Splits a channel into runs of consecutive values so dropouts leave a gap
/// in the line instead of a straight segment across them.
fn runs(
    points: &[ProjectedPoint],
    channel: fn(&ProjectedPoint) -> Option<f64>,
) -> Vec<Vec<[f64; 2]>> {
    points
        .iter()
        .map(|p| channel(p).map(|v| [p.video_time_ms / 1000., v]))
        .chunk_by(Option::is_some)
        .into_iter()
        .filter(|(present, _)| *present)
        .map(|(_, run)| run.flatten().collect_vec())
        .collect()
}

/// Speed and elevation over video time from the per-second projection, with
/// a line at the current position. Returns the video second clicked, if any.
pub(crate) fn show_graph(
    ui: &mut Ui,
    seconds: &[ProjectedPoint],
    current_time_s: f64,
) -> Option<f64> {
    let speed_runs = runs(seconds, speed_kmh);
    let elevation_runs = runs(seconds, |p| p.sample.elevation());
    let max_speed = speed_runs
        .iter()
        .flatten()
        .map(|[_, v]| *v)
        .fold(1., f64::max);

    let plot_response = Plot::new("telemetry_graph")
        .legend(Legend::default())
        .show_background(false)
        .include_y(0.)
        .allow_drag(false)
        .show(ui, |plot_ui| {
            for run in speed_runs {
                plot_ui.line(
                    Line::new("Speed (km/h)", PlotPoints::new(run))
                        .gradient_color(
                            Arc::new(move |point| {
                                stroke_shade(
                                    PALETTE_ORANGE,
                                    Color32::RED,
                                    (point.y / max_speed) as f32,
                                )
                            }),
                            false,
                        )
                        .color(PALETTE_ORANGE),
                );
            }
            for run in elevation_runs {
                plot_ui.line(
                    Line::new("Elevation (m)", PlotPoints::new(run)).color(Color32::LIGHT_BLUE),
                );
            }
            plot_ui.vline(VLine::new("Position", current_time_s).color(Color32::WHITE));
        });

    if plot_response.response.clicked()
        && let Some(mouse_pos) = plot_response.response.interact_pointer_pos()
    {
        let clicked_s = plot_response.transform.value_from_position(mouse_pos).x;
        return Some(clicked_s.max(0.));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use telesync::Sample;

    fn point(second: usize, speed: Option<f64>) -> ProjectedPoint {
        let t = second as f64 * 1000.;
        ProjectedPoint {
            frame_index: second,
            video_time_ms: t,
            sample: Sample::from_raw(t, Some(10.), Some(20.), None, speed),
        }
    }

    #[test]
    fn test_dropouts_split_the_line() {
        let points = vec![
            point(0, Some(1.)),
            point(1, Some(2.)),
            point(2, None),
            point(3, Some(3.)),
        ];
        let speed_runs = runs(&points, |p| p.sample.speed());
        assert_eq!(speed_runs, vec![vec![[0., 1.], [1., 2.]], vec![[3., 3.]]]);
    }
}
