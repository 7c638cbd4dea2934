use gtk::prelude::*;
use gtk::{pango, Align, Label, Orientation};

use crate::controller::DashboardState;
use crate::data::{CitationSource, Incident, Severity};
use crate::sidebar::{
    build_footer, build_view, format_coordinate, format_date, SidebarView, SourceFooter, Stats,
};

use super::SelectHandler;

const SIDEBAR_MIN_WIDTH: i32 = 360;

/// Left-hand panel: stats and incident cards, or one incident in detail,
/// with the global citation list pinned underneath.
pub struct SidebarPanel {
    root: gtk::Box,
    content: gtk::Box,
    footer: gtk::Box,
    footer_links: gtk::FlowBox,
    on_select: SelectHandler,
}

impl SidebarPanel {
    pub fn new(on_select: SelectHandler) -> Self {
        let root = gtk::Box::builder()
            .orientation(Orientation::Vertical)
            .width_request(SIDEBAR_MIN_WIDTH)
            .build();
        root.add_css_class("sidebar");

        let subtitle = Label::builder()
            .label("Global Freight Disruptions")
            .halign(Align::Start)
            .margin_top(12)
            .margin_bottom(8)
            .margin_start(16)
            .build();
        subtitle.add_css_class("sidebar-heading");
        root.append(&subtitle);

        let content = gtk::Box::builder()
            .orientation(Orientation::Vertical)
            .spacing(12)
            .margin_top(4)
            .margin_bottom(16)
            .margin_start(16)
            .margin_end(16)
            .build();

        let scrolled_window = gtk::ScrolledWindow::builder()
            .hscrollbar_policy(gtk::PolicyType::Never)
            .vexpand(true)
            .child(&content)
            .build();
        root.append(&scrolled_window);

        let footer = gtk::Box::builder()
            .orientation(Orientation::Vertical)
            .spacing(8)
            .build();
        footer.add_css_class("sidebar-footer");

        let footer_heading = Label::builder()
            .label("General Live Feed Sources")
            .halign(Align::Start)
            .build();
        footer_heading.add_css_class("sidebar-heading");
        footer.append(&footer_heading);

        let footer_links = gtk::FlowBox::builder()
            .selection_mode(gtk::SelectionMode::None)
            .column_spacing(6)
            .row_spacing(6)
            .max_children_per_line(3)
            .build();
        let footer_scroll = gtk::ScrolledWindow::builder()
            .hscrollbar_policy(gtk::PolicyType::Never)
            .max_content_height(96)
            .propagate_natural_height(true)
            .child(&footer_links)
            .build();
        footer.append(&footer_scroll);
        root.append(&footer);

        Self {
            root,
            content,
            footer,
            footer_links,
            on_select,
        }
    }

    pub fn widget(&self) -> &gtk::Box {
        &self.root
    }

    pub fn render(&self, state: &DashboardState) {
        while let Some(child) = self.content.first_child() {
            self.content.remove(&child);
        }

        match build_view(state) {
            SidebarView::Scanning => self.content.append(&scanning_placeholder()),
            SidebarView::List { stats, incidents } => {
                self.content.append(&stats_row(stats));
                for incident in incidents {
                    self.content.append(&self.incident_card(incident));
                }
            }
            SidebarView::Detail { incident } => {
                self.content.append(&self.incident_detail(incident))
            }
        }

        self.render_footer(build_footer(state));
    }

    fn render_footer(&self, footer: Option<SourceFooter<'_>>) {
        while let Some(child) = self.footer_links.first_child() {
            self.footer_links.remove(&child);
        }

        let Some(footer) = footer else {
            self.footer.set_visible(false);
            return;
        };
        self.footer.set_visible(true);

        match footer {
            SourceFooter::Sources(sources) => {
                for source in sources {
                    self.footer_links.insert(&citation_link(source), -1);
                }
            }
            SourceFooter::Placeholder(text) => {
                let placeholder = Label::builder().label(text).halign(Align::Start).build();
                placeholder.add_css_class("placeholder");
                self.footer_links.insert(&placeholder, -1);
            }
        }
    }

    fn incident_card(&self, incident: &Incident) -> gtk::Box {
        let card = gtk::Box::builder()
            .orientation(Orientation::Vertical)
            .spacing(6)
            .build();
        card.set_cursor_from_name(Some("pointer"));
        card.add_css_class("incident-card");
        if incident.severity == Severity::High {
            card.add_css_class("incident-card-high");
        }

        // Category on the left, severity dot on the right
        let top_row = gtk::Box::builder()
            .orientation(Orientation::Horizontal)
            .spacing(6)
            .build();
        let icon = gtk::Image::from_icon_name(incident.category.icon_name());
        icon.add_css_class("category-icon");
        top_row.append(&icon);

        let category = Label::builder()
            .label(incident.category.as_str())
            .hexpand(true)
            .halign(Align::Start)
            .build();
        category.add_css_class("incident-meta");
        top_row.append(&category);

        top_row.append(&severity_dot(incident.severity));
        card.append(&top_row);

        let title = Label::builder()
            .label(&incident.title)
            .wrap(true)
            .wrap_mode(pango::WrapMode::WordChar)
            .xalign(0.0)
            .lines(2)
            .ellipsize(pango::EllipsizeMode::End)
            .build();
        title.add_css_class("incident-title");
        card.append(&title);

        let bottom_row = gtk::Box::builder()
            .orientation(Orientation::Horizontal)
            .spacing(6)
            .build();
        let location = Label::builder()
            .label(&incident.location_name)
            .hexpand(true)
            .halign(Align::Start)
            .ellipsize(pango::EllipsizeMode::End)
            .build();
        location.add_css_class("incident-meta");
        bottom_row.append(&location);

        let date = Label::new(Some(&format_date(&incident.date)));
        date.add_css_class("incident-meta");
        bottom_row.append(&date);
        card.append(&bottom_row);

        let gesture = gtk::GestureClick::new();
        let on_select = self.on_select.clone();
        let id = incident.id.clone();
        gesture.connect_released(move |_, _, _, _| {
            on_select(Some(id.clone()));
        });
        card.add_controller(gesture);

        card
    }

    fn incident_detail(&self, incident: &Incident) -> gtk::Box {
        let detail = gtk::Box::builder()
            .orientation(Orientation::Vertical)
            .spacing(12)
            .build();

        let back = gtk::Button::builder()
            .label("← BACK TO LIST")
            .halign(Align::Start)
            .build();
        back.add_css_class("flat");
        back.add_css_class("back-button");
        let on_select = self.on_select.clone();
        back.connect_clicked(move |_| on_select(None));
        detail.append(&back);

        let badge = Label::builder()
            .label(format!("{} SEVERITY", incident.severity.as_str().to_uppercase()))
            .halign(Align::Start)
            .build();
        badge.add_css_class("severity-badge");
        badge.add_css_class(incident.severity.css_class());
        detail.append(&badge);

        let title = Label::builder()
            .label(&incident.title)
            .wrap(true)
            .wrap_mode(pango::WrapMode::WordChar)
            .xalign(0.0)
            .build();
        title.add_css_class("detail-title");
        detail.append(&title);

        let meta_row = gtk::Box::builder()
            .orientation(Orientation::Horizontal)
            .spacing(6)
            .build();
        let icon = gtk::Image::from_icon_name(incident.category.icon_name());
        icon.add_css_class("category-icon");
        meta_row.append(&icon);
        let meta = Label::builder()
            .label(format!(
                "{} • {} • {}",
                incident.category.as_str(),
                incident.location_name,
                format_date(&incident.date)
            ))
            .wrap(true)
            .xalign(0.0)
            .build();
        meta.add_css_class("incident-meta");
        meta_row.append(&meta);
        detail.append(&meta_row);

        let impact = gtk::Box::builder()
            .orientation(Orientation::Vertical)
            .spacing(8)
            .build();
        impact.add_css_class("impact-card");
        let impact_heading = Label::builder()
            .label("Impact Analysis")
            .halign(Align::Start)
            .build();
        impact_heading.add_css_class("impact-heading");
        impact.append(&impact_heading);
        let description = Label::builder()
            .label(&incident.description)
            .wrap(true)
            .wrap_mode(pango::WrapMode::WordChar)
            .xalign(0.0)
            .selectable(true)
            .build();
        impact.append(&description);
        detail.append(&impact);

        if !incident.sources.is_empty() {
            detail.append(&section_heading("Verified Report Sources"));
            for source in &incident.sources {
                detail.append(&link_button(&source.title, &source.url));
            }
        }

        detail.append(&section_heading("Location Data"));
        let coordinates = gtk::Box::builder()
            .orientation(Orientation::Horizontal)
            .spacing(8)
            .homogeneous(true)
            .build();
        for text in [
            format!("LAT: {}", format_coordinate(incident.coordinates.lat)),
            format!("LNG: {}", format_coordinate(incident.coordinates.lng)),
        ] {
            let cell = Label::builder().label(text).xalign(0.0).selectable(true).build();
            cell.add_css_class("coordinate-cell");
            coordinates.append(&cell);
        }
        detail.append(&coordinates);

        detail
    }
}

fn scanning_placeholder() -> gtk::Box {
    let container = gtk::Box::builder()
        .orientation(Orientation::Vertical)
        .spacing(16)
        .valign(Align::Center)
        .vexpand(true)
        .margin_top(64)
        .build();

    let spinner = gtk::Spinner::builder()
        .spinning(true)
        .width_request(48)
        .height_request(48)
        .halign(Align::Center)
        .build();
    container.append(&spinner);

    let heading = Label::new(Some("SYSTEM SCANNING"));
    heading.add_css_class("scanning-title");
    container.append(&heading);

    let text = Label::builder()
        .label("Acquiring real-time maritime disruption data from global sources...")
        .wrap(true)
        .justify(gtk::Justification::Center)
        .max_width_chars(32)
        .build();
    text.add_css_class("incident-meta");
    container.append(&text);

    container
}

fn stats_row(stats: Stats) -> gtk::Box {
    let row = gtk::Box::builder()
        .orientation(Orientation::Horizontal)
        .spacing(8)
        .homogeneous(true)
        .margin_bottom(4)
        .build();

    for (value, label, accent) in [
        (stats.total, "Active", None),
        (stats.high, "High Risk", Some("stat-value-high")),
        (stats.medium, "Med Risk", Some("stat-value-medium")),
    ] {
        let card = gtk::Box::builder()
            .orientation(Orientation::Vertical)
            .spacing(2)
            .build();
        card.add_css_class("stat-card");

        let value_label = Label::new(Some(&value.to_string()));
        value_label.add_css_class("stat-value");
        if let Some(accent) = accent {
            value_label.add_css_class(accent);
        }
        card.append(&value_label);

        let name = Label::new(Some(label));
        name.add_css_class("stat-label");
        card.append(&name);

        row.append(&card);
    }

    row
}

fn severity_dot(severity: Severity) -> gtk::Box {
    let dot = gtk::Box::builder().valign(Align::Center).build();
    dot.add_css_class("severity-dot");
    dot.add_css_class(severity.css_class());
    dot
}

fn section_heading(text: &str) -> Label {
    let heading = Label::builder()
        .label(text)
        .halign(Align::Start)
        .margin_top(4)
        .build();
    heading.add_css_class("sidebar-heading");
    heading
}

fn citation_link(source: &CitationSource) -> gtk::Button {
    link_button(&source.title, &source.uri)
}

fn link_button(title: &str, url: &str) -> gtk::Button {
    let label = Label::builder()
        .label(title)
        .xalign(0.0)
        .ellipsize(pango::EllipsizeMode::End)
        .max_width_chars(28)
        .build();
    let button = gtk::Button::builder()
        .child(&label)
        .tooltip_text(url)
        .build();
    button.add_css_class("flat");
    button.add_css_class("source-link");

    let url = url.to_string();
    button.connect_clicked(move |_| {
        if let Err(e) = open::that(&url) {
            log::error!("Failed to open URL {url}: {e}");
        }
    });
    button
}
