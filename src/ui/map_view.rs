use std::cell::RefCell;
use std::f64::consts::PI;
use std::rc::Rc;
use std::time::Instant;

use geo::LineString;
use gtk::prelude::*;
use gtk::{cairo, glib, Align, Label, Orientation};

use crate::controller::DashboardState;
use crate::data::{Incident, Severity};
use crate::geometry::WorldGeometry;
use crate::map_scene::{
    build_markers, country_at, hit_test, is_animating, project_countries, CountryPath, MarkerSprite,
    DANGER_RING_RADIUS, DEEP_NAVY, HOVER_FILL, OFF_WHITE, VIBRANT_PURPLE,
};
use crate::projection::{scroll_zoom_factor, Mercator, ZoomTransform};

use super::SelectHandler;

/// Size assumed until the first allocation arrives.
const INITIAL_SIZE: (f64, f64) = (800.0, 600.0);
/// Pointer travel that turns a press into a pan instead of a click.
const DRAG_THRESHOLD: f64 = 3.0;
const SCROLL_STEP: f64 = 0.5;

struct MapState {
    width: f64,
    height: f64,
    projection: Mercator,
    transform: ZoomTransform,
    world: Option<WorldGeometry>,
    countries: Vec<CountryPath>,
    hovered_country: Option<usize>,
    incidents: Vec<Incident>,
    selected: Option<String>,
    markers: Vec<MarkerSprite>,
    started: Instant,
    built: Instant,
    pointer: Option<(f64, f64)>,
    drag_start: Option<ZoomTransform>,
    dragged: bool,
}

impl MapState {
    fn new() -> Self {
        let (width, height) = INITIAL_SIZE;
        let now = Instant::now();
        Self {
            width,
            height,
            projection: Mercator::fit(width, height),
            transform: ZoomTransform::IDENTITY,
            world: None,
            countries: Vec::new(),
            hovered_country: None,
            incidents: Vec::new(),
            selected: None,
            markers: Vec::new(),
            started: now,
            built: now,
            pointer: None,
            drag_start: None,
            dragged: false,
        }
    }

    fn resize(&mut self, width: f64, height: f64) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        self.width = width;
        self.height = height;
        self.projection = Mercator::fit(width, height);
        self.transform = self.transform.constrain(width, height);
        self.reproject_countries();
        self.rebuild_markers();
    }

    fn reproject_countries(&mut self) {
        self.countries = match &self.world {
            Some(world) => project_countries(world, &self.projection),
            None => Vec::new(),
        };
        self.hovered_country = None;
    }

    fn rebuild_markers(&mut self) {
        self.markers = build_markers(&self.incidents, self.selected.as_deref(), &self.projection);
        self.built = Instant::now();
    }

    fn animating(&self) -> bool {
        is_animating(&self.markers, self.built.elapsed())
    }
}

/// The world map: country shapes plus incident markers, drawn with cairo
/// under a pan/zoom transform.
#[derive(Clone)]
pub struct MapView {
    area: gtk::DrawingArea,
    state: Rc<RefCell<MapState>>,
}

impl MapView {
    pub fn new(on_select: SelectHandler) -> Self {
        let area = gtk::DrawingArea::builder()
            .hexpand(true)
            .vexpand(true)
            .build();
        let state = Rc::new(RefCell::new(MapState::new()));

        let draw_state = state.clone();
        area.set_draw_func(move |_, cr, _width, _height| {
            draw(&draw_state.borrow(), cr);
        });

        let resize_state = state.clone();
        area.connect_resize(move |_, width, height| {
            resize_state
                .borrow_mut()
                .resize(f64::from(width), f64::from(height));
        });

        // Keep redrawing while pulses or the grow-in are running
        let tick_state = state.clone();
        area.add_tick_callback(move |area, _clock| {
            if tick_state.borrow().animating() {
                area.queue_draw();
            }
            glib::ControlFlow::Continue
        });

        install_drag(&area, &state);
        install_click(&area, &state, on_select);
        install_scroll(&area, &state);
        install_motion(&area, &state);

        Self { area, state }
    }

    pub fn widget(&self) -> &gtk::DrawingArea {
        &self.area
    }

    pub fn set_geometry(&self, world: WorldGeometry) {
        {
            let mut state = self.state.borrow_mut();
            state.world = Some(world);
            state.reproject_countries();
        }
        self.area.queue_draw();
    }

    /// Rebuilds the markers when the incident list or selection changed.
    pub fn update(&self, dashboard: &DashboardState) {
        {
            let mut state = self.state.borrow_mut();
            if state.incidents == dashboard.incidents && state.selected == dashboard.selected {
                return;
            }
            state.incidents = dashboard.incidents.clone();
            state.selected = dashboard.selected.clone();
            state.rebuild_markers();
        }
        self.area.queue_draw();
    }
}

fn install_drag(area: &gtk::DrawingArea, state: &Rc<RefCell<MapState>>) {
    let drag = gtk::GestureDrag::new();

    let begin_state = state.clone();
    drag.connect_drag_begin(move |_, _x, _y| {
        let mut state = begin_state.borrow_mut();
        state.drag_start = Some(state.transform);
        state.dragged = false;
    });

    let update_state = state.clone();
    let area_weak = area.downgrade();
    drag.connect_drag_update(move |_, dx, dy| {
        {
            let mut state = update_state.borrow_mut();
            let Some(start) = state.drag_start else {
                return;
            };
            if dx.hypot(dy) > DRAG_THRESHOLD {
                state.dragged = true;
            }
            if !state.dragged {
                return;
            }
            let (width, height) = (state.width, state.height);
            state.transform = start.pan_by(dx, dy, width, height);
        }
        if let Some(area) = area_weak.upgrade() {
            area.queue_draw();
        }
    });

    let end_state = state.clone();
    drag.connect_drag_end(move |_, _dx, _dy| {
        end_state.borrow_mut().drag_start = None;
    });

    area.add_controller(drag);
}

fn install_click(area: &gtk::DrawingArea, state: &Rc<RefCell<MapState>>, on_select: SelectHandler) {
    let click = gtk::GestureClick::new();
    let click_state = state.clone();
    click.connect_released(move |_, _n_press, x, y| {
        let selection = {
            let state = click_state.borrow();
            if state.dragged {
                return;
            }
            hit_test(&state.markers, &state.transform, (x, y)).map(str::to_string)
        };
        // Clicking empty map closes the detail view
        on_select(selection);
    });
    area.add_controller(click);
}

fn install_scroll(area: &gtk::DrawingArea, state: &Rc<RefCell<MapState>>) {
    let scroll = gtk::EventControllerScroll::new(gtk::EventControllerScrollFlags::VERTICAL);
    let scroll_state = state.clone();
    let area_weak = area.downgrade();
    scroll.connect_scroll(move |_, _dx, dy| {
        {
            let mut state = scroll_state.borrow_mut();
            let (width, height) = (state.width, state.height);
            let anchor = state.pointer.unwrap_or((width / 2.0, height / 2.0));
            let factor = scroll_zoom_factor(dy, SCROLL_STEP);
            state.transform = state.transform.zoom_at(factor, anchor, width, height);
        }
        if let Some(area) = area_weak.upgrade() {
            area.queue_draw();
        }
        glib::Propagation::Stop
    });
    area.add_controller(scroll);
}

fn install_motion(area: &gtk::DrawingArea, state: &Rc<RefCell<MapState>>) {
    let motion = gtk::EventControllerMotion::new();

    let motion_state = state.clone();
    let area_weak = area.downgrade();
    motion.connect_motion(move |_, x, y| {
        let (hover_changed, over_marker) = {
            let mut state = motion_state.borrow_mut();
            state.pointer = Some((x, y));
            let hovered = country_at(&state.countries, state.transform.invert((x, y)));
            let changed = hovered != state.hovered_country;
            state.hovered_country = hovered;
            (changed, hit_test(&state.markers, &state.transform, (x, y)).is_some())
        };
        let Some(area) = area_weak.upgrade() else {
            return;
        };
        area.set_cursor_from_name(over_marker.then_some("pointer"));
        if hover_changed {
            area.queue_draw();
        }
    });

    let leave_state = state.clone();
    let area_weak = area.downgrade();
    motion.connect_leave(move |_| {
        {
            let mut state = leave_state.borrow_mut();
            state.pointer = None;
            state.hovered_country = None;
        }
        if let Some(area) = area_weak.upgrade() {
            area.set_cursor_from_name(None);
            area.queue_draw();
        }
    });

    area.add_controller(motion);
}

fn draw(state: &MapState, cr: &cairo::Context) {
    let (r, g, b) = OFF_WHITE;
    cr.set_source_rgb(r, g, b);
    let _ = cr.paint();

    let transform = state.transform;
    cr.translate(transform.x, transform.y);
    cr.scale(transform.k, transform.k);

    draw_countries(state, cr);
    draw_markers(state, cr);
}

fn draw_countries(state: &MapState, cr: &cairo::Context) {
    cr.set_fill_rule(cairo::FillRule::EvenOdd);
    cr.set_line_width(0.5);

    for (index, country) in state.countries.iter().enumerate() {
        let hovered = state.hovered_country == Some(index);

        cr.new_path();
        for polygon in country.shape.iter() {
            trace_ring(cr, polygon.exterior());
            for hole in polygon.interiors() {
                trace_ring(cr, hole);
            }
        }

        let (r, g, b) = if hovered { HOVER_FILL } else { (1.0, 1.0, 1.0) };
        cr.set_source_rgb(r, g, b);
        let _ = cr.fill_preserve();

        let (r, g, b) = DEEP_NAVY;
        cr.set_source_rgba(r, g, b, if hovered { 0.5 } else { 0.2 });
        let _ = cr.stroke();
    }
}

fn trace_ring(cr: &cairo::Context, ring: &LineString<f64>) {
    let mut coords = ring.coords();
    let Some(first) = coords.next() else {
        return;
    };
    cr.move_to(first.x, first.y);
    for coord in coords {
        cr.line_to(coord.x, coord.y);
    }
    cr.close_path();
}

fn draw_markers(state: &MapState, cr: &cairo::Context) {
    let elapsed = state.started.elapsed();
    let since_build = state.built.elapsed();

    for marker in &state.markers {
        let (x, y) = marker.center;
        let (r, g, b) = marker.color();

        if marker.has_danger_ring() {
            cr.new_path();
            cr.arc(x, y, DANGER_RING_RADIUS, 0.0, 2.0 * PI);
            cr.set_source_rgba(r, g, b, 0.8);
            cr.set_line_width(1.5);
            let _ = cr.stroke();
        }

        if let Some(ripple) = marker.ripple() {
            let (radius, opacity) = ripple.sample(elapsed);
            cr.new_path();
            cr.arc(x, y, radius, 0.0, 2.0 * PI);
            cr.set_source_rgba(r, g, b, 0.5 * opacity);
            let _ = cr.fill();
        }

        if let Some(pulse) = marker.selection_pulse() {
            let (radius, opacity) = pulse.sample(elapsed);
            let (pr, pg, pb) = VIBRANT_PURPLE;
            cr.new_path();
            cr.arc(x, y, radius, 0.0, 2.0 * PI);
            cr.set_source_rgba(pr, pg, pb, opacity);
            cr.set_line_width(3.0);
            let _ = cr.stroke();
        }

        cr.new_path();
        cr.arc(x, y, marker.core_radius_at(since_build), 0.0, 2.0 * PI);
        cr.set_source_rgb(r, g, b);
        let _ = cr.fill_preserve();
        cr.set_source_rgb(1.0, 1.0, 1.0);
        cr.set_line_width(1.5);
        let _ = cr.stroke();
    }
}

/// Severity key pinned to the bottom-left corner of the map.
pub fn legend() -> gtk::Box {
    let legend = gtk::Box::builder()
        .orientation(Orientation::Vertical)
        .spacing(6)
        .halign(Align::Start)
        .valign(Align::End)
        .margin_start(24)
        .margin_bottom(24)
        .can_target(false)
        .build();
    legend.add_css_class("map-legend");

    let heading = Label::builder()
        .label("Impact Severity")
        .halign(Align::Start)
        .build();
    heading.add_css_class("legend-title");
    legend.append(&heading);

    for severity in Severity::ALL {
        let row = gtk::Box::builder()
            .orientation(Orientation::Horizontal)
            .spacing(8)
            .build();

        let dot = gtk::Box::builder().valign(Align::Center).build();
        dot.add_css_class("legend-dot");
        dot.add_css_class(severity.css_class());
        row.append(&dot);

        let label = Label::builder()
            .label(legend_label(severity))
            .halign(Align::Start)
            .build();
        row.append(&label);

        legend.append(&row);
    }

    legend
}

fn legend_label(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "High Risk",
        Severity::Medium => "Medium Impact",
        Severity::Low => "Low Impact",
    }
}
