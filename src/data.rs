pub const APP_ID: &str = "com.toasterrepair.MaritimeWatch";
pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const WORLD_GEOJSON_URL: &str =
    "https://raw.githubusercontent.com/holtzy/D3-graph-gallery/master/DATA/world.geojson";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::High, Severity::Medium, Severity::Low];

    /// Ordinal used for sorting: High=3, Medium=2, Low=1.
    pub fn rank(self) -> u8 {
        match self {
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|severity| severity.as_str().eq_ignore_ascii_case(value))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }

    /// Marker and badge color as linear RGB components.
    pub fn color(self) -> (f64, f64, f64) {
        match self {
            Severity::High => rgb(0xef, 0x44, 0x44),   // red-500
            Severity::Medium => rgb(0xf5, 0x9e, 0x0b), // amber-500
            Severity::Low => rgb(0x3b, 0x82, 0xf6),    // blue-500
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Severity::High => "severity-high",
            Severity::Medium => "severity-medium",
            Severity::Low => "severity-low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Conflict,
    Weather,
    Strike,
    Accident,
    Regulatory,
    Other,
}

impl Category {
    const ALL: [Category; 6] = [
        Category::Conflict,
        Category::Weather,
        Category::Strike,
        Category::Accident,
        Category::Regulatory,
        Category::Other,
    ];

    /// Unknown labels collapse into `Other`.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(value))
            .unwrap_or(Category::Other)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Conflict => "Conflict",
            Category::Weather => "Weather",
            Category::Strike => "Strike",
            Category::Accident => "Accident",
            Category::Regulatory => "Regulatory",
            Category::Other => "Other",
        }
    }

    pub fn icon_name(self) -> &'static str {
        match self {
            Category::Conflict => "dialog-error-symbolic",
            Category::Weather => "weather-storm-symbolic",
            Category::Strike => "security-high-symbolic",
            _ => "mark-location-symbolic",
        }
    }
}

/// Longitude/latitude pair in degrees, in that order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coordinates {
    pub lng: f64,
    pub lat: f64,
}

impl Coordinates {
    pub const ORIGIN: Coordinates = Coordinates { lng: 0.0, lat: 0.0 };

    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn is_valid(&self) -> bool {
        self.lng.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lng)
            && (-90.0..=90.0).contains(&self.lat)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidentSource {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Incident {
    pub id: String,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub category: Category,
    pub location_name: String,
    pub coordinates: Coordinates,
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    pub sources: Vec<IncidentSource>,
}

/// A citation returned in the backend's grounding metadata, shown in the
/// sidebar footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationSource {
    pub title: String,
    pub uri: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOutcome {
    pub incidents: Vec<Incident>,
    pub sources: Vec<CitationSource>,
}

fn rgb(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    (
        f64::from(r) / 255.0,
        f64::from(g) / 255.0,
        f64::from(b) / 255.0,
    )
}
