use egui::{Color32, Ui};
use egui_plot::{Line, Plot, PlotBounds, PlotPoint, PlotPoints, Points};
use itertools::Itertools;
use telesync::{LatLon, Sample, Track};

use crate::ui::{PALETTE_MAROON, PALETTE_ORANGE};

/// Equirectangular projection around the track's mean latitude, good enough
/// for the few kilometres a recording usually covers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct MapProjection {
    lon_scale: f64,
}

impl MapProjection {
    pub(crate) fn for_track(track: &Track) -> Self {
        let lats = track
            .valid_samples()
            .iter()
            .filter_map(Sample::position)
            .map(|p| p.lat)
            .collect_vec();
        let mean_lat = if lats.is_empty() {
            0.
        } else {
            lats.iter().sum::<f64>() / lats.len() as f64
        };
        Self {
            lon_scale: mean_lat.to_radians().cos().max(1e-6),
        }
    }

    pub(crate) fn to_plot(&self, position: LatLon) -> [f64; 2] {
        [position.lon * self.lon_scale, position.lat]
    }

    pub(crate) fn from_plot(&self, point: PlotPoint) -> LatLon {
        LatLon::new(point.y, point.x / self.lon_scale)
    }
}

pub(crate) enum MapInteraction {
    Clicked(LatLon),
    DragStarted,
    DragReleased(LatLon),
}

pub(crate) struct MapView {
    projection: MapProjection,
    route: Vec<[f64; 2]>,
    drag_position: Option<LatLon>,
}

impl MapView {
    pub(crate) fn new(track: &Track) -> Self {
        let projection = MapProjection::for_track(track);
        let route = track
            .valid_samples()
            .iter()
            .filter_map(Sample::position)
            .map(|p| projection.to_plot(p))
            .collect();
        Self {
            projection,
            route,
            drag_position: None,
        }
    }

    /// Draws the route and the marker. Dragging the pointer moves a ghost
    /// marker; releasing it hands the position back for a seek.
    pub(crate) fn show(
        &mut self,
        ui: &mut Ui,
        marker: Option<LatLon>,
        follow_marker: bool,
    ) -> Option<MapInteraction> {
        let projection = self.projection;
        let route = PlotPoints::new(self.route.clone());
        let drag_position = self.drag_position;

        let plot_response = Plot::new("map")
            .data_aspect(1.0)
            .show_axes(false)
            .show_grid(false)
            .show_background(false)
            .allow_drag(false)
            .allow_double_click_reset(true)
            .show(ui, |plot_ui| {
                plot_ui.line(Line::new("Route", route).color(PALETTE_MAROON).width(2.));
                if let Some(ghost) = drag_position {
                    plot_ui.points(
                        Points::new("Drag", vec![projection.to_plot(ghost)])
                            .color(Color32::LIGHT_GRAY)
                            .radius(6.),
                    );
                }
                if let Some(position) = marker {
                    let [x, y] = projection.to_plot(position);
                    plot_ui.points(
                        Points::new("Position", vec![[x, y]])
                            .color(PALETTE_ORANGE)
                            .radius(7.),
                    );
                    if follow_marker && drag_position.is_none() {
                        let bounds = plot_ui.plot_bounds();
                        let (half_w, half_h) = (bounds.width() / 2., bounds.height() / 2.);
                        plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                            [x - half_w, y - half_h],
                            [x + half_w, y + half_h],
                        ));
                    }
                }
            });

        let response = &plot_response.response;
        let pointer = response
            .interact_pointer_pos()
            .map(|pos| projection.from_plot(plot_response.transform.value_from_position(pos)));

        if response.drag_started() {
            self.drag_position = pointer;
            return Some(MapInteraction::DragStarted);
        }
        if response.dragged() {
            if pointer.is_some() {
                self.drag_position = pointer;
            }
            return None;
        }
        if response.drag_stopped() {
            let released = pointer.or(self.drag_position.take());
            self.drag_position = None;
            return released.map(MapInteraction::DragReleased);
        }
        if response.clicked() {
            return pointer.map(MapInteraction::Clicked);
        }
        None
    }
}
