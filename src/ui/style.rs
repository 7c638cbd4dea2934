const CSS: &str = "
.sidebar {
    background-color: #1c1053;
    color: white;
}
.sidebar-footer {
    background-color: #150a42;
    border-top: 1px solid #2a215c;
    padding: 12px;
}
.sidebar-heading {
    font-size: 11px;
    font-weight: 600;
    color: alpha(white, 0.6);
    text-transform: uppercase;
    letter-spacing: 1px;
}
.stat-card {
    background-color: alpha(#2a215c, 0.5);
    border: 1px solid #3e327a;
    border-radius: 8px;
    padding: 10px;
}
.stat-value {
    font-size: 22px;
    font-weight: 700;
}
.stat-value-high {
    color: #f87171;
}
.stat-value-medium {
    color: #fbbf24;
}
.stat-label {
    font-size: 10px;
    text-transform: uppercase;
    letter-spacing: 1px;
    color: alpha(white, 0.7);
}
.incident-card {
    background-color: alpha(#2a215c, 0.4);
    border: 1px solid #3e327a;
    border-radius: 8px;
    padding: 12px;
    transition: all 150ms ease;
}
.incident-card:hover {
    background-color: #2a215c;
}
.incident-card-high {
    background-color: alpha(#7f1d1d, 0.1);
    border-color: alpha(#ef4444, 0.3);
}
.incident-card-high:hover {
    border-color: #f87171;
    background-color: alpha(#7f1d1d, 0.2);
}
.incident-title {
    font-size: 14px;
    font-weight: 600;
}
.incident-meta {
    font-size: 11px;
    color: alpha(white, 0.55);
}
.category-icon {
    color: #ab39dc;
}
.severity-dot {
    min-width: 8px;
    min-height: 8px;
    border-radius: 4px;
}
.legend-dot {
    min-width: 12px;
    min-height: 12px;
    border-radius: 6px;
}
.severity-high {
    background-color: #ef4444;
    color: #f87171;
}
.severity-medium {
    background-color: #f59e0b;
    color: #fbbf24;
}
.severity-low {
    background-color: #3b82f6;
    color: #60a5fa;
}
.severity-badge {
    border-radius: 4px;
    padding: 3px 8px;
    font-size: 11px;
    font-weight: 700;
    background-color: alpha(white, 0.1);
}
.detail-title {
    font-size: 20px;
    font-weight: 700;
}
.impact-card {
    background-color: #2a215c;
    border: 1px solid #3e327a;
    border-radius: 8px;
    padding: 14px;
}
.impact-heading {
    color: #ab39dc;
    font-weight: 600;
    font-size: 12px;
    text-transform: uppercase;
}
.back-button {
    color: #ab39dc;
    font-weight: 600;
    font-size: 11px;
}
.source-link {
    background-color: alpha(#150a42, 0.5);
    border: 1px solid #2a215c;
    border-radius: 4px;
    padding: 6px 10px;
    color: alpha(white, 0.85);
}
.source-link:hover {
    background-color: #ab39dc;
    color: white;
}
.coordinate-cell {
    font-family: monospace;
    font-size: 11px;
    background-color: #150a42;
    border: 1px solid #2a215c;
    border-radius: 4px;
    padding: 6px;
}
.scanning-title {
    color: #ab39dc;
    font-weight: 700;
    font-size: 11px;
    letter-spacing: 3px;
}
.placeholder {
    font-style: italic;
    color: alpha(white, 0.45);
}
.map-legend {
    background-color: alpha(white, 0.95);
    color: #1c1053;
    border: 1px solid #cbd5e1;
    border-radius: 8px;
    padding: 12px;
    font-size: 11px;
    box-shadow: 0 4px 12px alpha(black, 0.2);
}
.legend-title {
    font-weight: 700;
    text-transform: uppercase;
    letter-spacing: 1px;
}
@keyframes spin {
    from { -gtk-icon-transform: rotate(0turn); }
    to { -gtk-icon-transform: rotate(1turn); }
}
.refresh-spinning {
    animation: spin 1s linear infinite;
}";

pub fn install(display: &gdk::Display) {
    let provider = gtk::CssProvider::new();
    provider.load_from_data(CSS);
    gtk::style_context_add_provider_for_display(
        display,
        &provider,
        gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
    );
}
