//! GTK front end. Widgets only render `DashboardState` and turn user input
//! into `Action`s; fetching runs on the tokio runtime.

mod map_view;
mod sidebar;
mod style;

use std::future::Future;
use std::rc::Rc;
use std::sync::Arc;

use gtk::prelude::*;
use gtk::{glib, Orientation};
use libadwaita::prelude::*;
use libadwaita::{
    ApplicationWindow, Banner, ColorScheme, HeaderBar, StyleManager, ToolbarView, WindowTitle,
};
use tokio::runtime::Handle;

use crate::config::Config;
use crate::controller::{Action, DashboardState, Effect, Store};
use crate::fetcher::DisruptionFetcher;
use crate::gemini::GeminiClient;
use crate::geometry;
use crate::sidebar::{format_updated, local_timezone, refresh_button};

use map_view::MapView;
use sidebar::SidebarPanel;

const WINDOW_TITLE: &str = "Maritime Watch";
const SIDEBAR_WIDTH: i32 = 400;

/// Called with the incident id a view wants selected, or `None` to clear.
type SelectHandler = Rc<dyn Fn(Option<String>)>;

/// Routes actions into the store and runs the fetches they ask for.
#[derive(Clone)]
struct Dispatcher {
    inner: Rc<DispatcherInner>,
}

struct DispatcherInner {
    store: Store,
    fetcher: Arc<DisruptionFetcher>,
    runtime: Handle,
}

impl Dispatcher {
    fn new(fetcher: Arc<DisruptionFetcher>, runtime: Handle) -> Self {
        Self {
            inner: Rc::new(DispatcherInner {
                store: Store::new(),
                fetcher,
                runtime,
            }),
        }
    }

    fn subscribe(&self, observer: impl Fn(&DashboardState) + 'static) {
        self.inner.store.subscribe(observer);
    }

    fn dispatch(&self, action: Action) {
        if let Some(Effect::StartFetch) = self.inner.store.dispatch(action) {
            self.start_fetch();
        }
    }

    /// Dispatch from inside a widget callback, after the callback returns.
    fn dispatch_idle(&self, action: Action) {
        let this = self.clone();
        glib::idle_add_local_once(move || this.dispatch(action));
    }

    fn start_fetch(&self) {
        let fetcher = self.inner.fetcher.clone();
        let result_rx = spawn_on(&self.inner.runtime, async move { fetcher.fetch().await });

        let this = self.clone();
        glib::spawn_future_local(async move {
            let result = result_rx.recv_async().await.unwrap_or_else(|e| {
                log::error!("Disruption fetch task ended without a result");
                Err(e.into())
            });
            this.dispatch(Action::FetchFinished(result));
        });
    }
}

/// Runs `future` on the tokio runtime and hands its output back over a
/// channel the GTK main loop can await.
fn spawn_on<F>(runtime: &Handle, future: F) -> flume::Receiver<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let (tx, rx) = flume::bounded(1);
    runtime.spawn(async move {
        let _ = tx.send(future.await);
    });
    rx
}

pub fn build_ui(app: &libadwaita::Application, config: &Config, runtime: Handle) {
    // Enable dark theme support
    let style_manager = StyleManager::default();
    style_manager.set_color_scheme(ColorScheme::PreferDark);

    if config.api_key().is_none() {
        log::warn!("No Gemini API key configured; set GEMINI_API_KEY or api_key in config.toml");
    }

    let backend = Arc::new(GeminiClient::from_config(config));
    let fetcher = Arc::new(DisruptionFetcher::new(backend));
    let dispatcher = Dispatcher::new(fetcher, runtime.clone());

    let select: SelectHandler = {
        let dispatcher = dispatcher.clone();
        Rc::new(move |id| dispatcher.dispatch_idle(Action::Select(id)))
    };

    let sidebar = SidebarPanel::new(select.clone());
    let map = MapView::new(select);

    // Header: refresh on the left, title plus last update time in the middle
    let refresh = gtk::Button::builder()
        .icon_name("view-refresh-symbolic")
        .tooltip_text("Refresh disruptions")
        .build();
    let dispatcher_for_refresh = dispatcher.clone();
    refresh.connect_clicked(move |_| dispatcher_for_refresh.dispatch(Action::Refresh));

    let title = WindowTitle::new(WINDOW_TITLE, "");
    let header_bar = HeaderBar::builder().title_widget(&title).build();
    header_bar.pack_start(&refresh);

    let banner = Banner::builder().button_label("Dismiss").revealed(false).build();
    let dispatcher_for_banner = dispatcher.clone();
    banner.connect_button_clicked(move |_| {
        dispatcher_for_banner.dispatch_idle(Action::DismissError)
    });

    // Map with the legend floating in the bottom-left corner
    let overlay = gtk::Overlay::new();
    overlay.set_child(Some(map.widget()));
    overlay.add_overlay(&map_view::legend());
    overlay.set_vexpand(true);
    overlay.set_hexpand(true);

    let map_column = gtk::Box::builder().orientation(Orientation::Vertical).build();
    map_column.append(&banner);
    map_column.append(&overlay);

    let paned = gtk::Paned::builder()
        .orientation(Orientation::Horizontal)
        .start_child(sidebar.widget())
        .end_child(&map_column)
        .resize_start_child(false)
        .shrink_start_child(false)
        .resize_end_child(true)
        .shrink_end_child(false)
        .position(SIDEBAR_WIDTH)
        .build();

    let toolbar_view = ToolbarView::builder().build();
    toolbar_view.add_top_bar(&header_bar);
    toolbar_view.set_content(Some(&paned));

    let window = ApplicationWindow::builder()
        .application(app)
        .title(WINDOW_TITLE)
        .default_width(1280)
        .default_height(800)
        .content(&toolbar_view)
        .build();

    style::install(&gtk::prelude::WidgetExt::display(&window));

    load_geometry(config.geometry_url.clone(), &runtime, map.clone());

    // Re-render every view after each state change
    let tz = local_timezone();
    dispatcher.subscribe(move |state| {
        sidebar.render(state);
        map.update(state);

        let button = refresh_button(state);
        refresh.set_sensitive(button.sensitive);
        if button.spinning {
            refresh.add_css_class("refresh-spinning");
        } else {
            refresh.remove_css_class("refresh-spinning");
        }

        match &state.error {
            Some(message) => {
                banner.set_title(message);
                banner.set_revealed(true);
            }
            None => banner.set_revealed(false),
        }

        let subtitle = state
            .last_updated
            .map(|updated| format_updated(updated, tz))
            .unwrap_or_default();
        title.set_subtitle(&subtitle);
    });

    window.present();
    dispatcher.dispatch(Action::Start);
}

/// Country outlines are decoration: failure leaves an empty map.
fn load_geometry(url: String, runtime: &Handle, map: MapView) {
    let world_rx = spawn_on(runtime, async move { geometry::fetch_world(&url).await });
    glib::spawn_future_local(async move {
        match world_rx.recv_async().await {
            Ok(Ok(world)) => {
                log::info!("Loaded {} country shapes", world.countries.len());
                map.set_geometry(world);
            }
            Ok(Err(e)) => log::warn!("Failed to load world geometry: {e}"),
            Err(_) => log::error!("World geometry task ended without a result"),
        }
    });
}
