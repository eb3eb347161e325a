use std::fmt;
use std::str::FromStr;

/// A statistic count. `None` means the source did not report it, which is not
/// the same as zero.
pub type Count = Option<u64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Cases,
    Recovered,
    Deaths,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Cases, Metric::Recovered, Metric::Deaths];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Cases => "cases",
            Metric::Recovered => "recovered",
            Metric::Deaths => "deaths",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Metric::Cases => "Coronavirus cases",
            Metric::Recovered => "Recovered",
            Metric::Deaths => "Deaths",
        }
    }

    // Marker radius in metres per sqrt(count).
    pub fn marker_multiplier(self) -> f64 {
        match self {
            Metric::Cases => 800.0,
            Metric::Recovered => 1200.0,
            Metric::Deaths => 2000.0,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Metric::Cases => Metric::Recovered,
            Metric::Recovered => Metric::Deaths,
            Metric::Deaths => Metric::Cases,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "cases" => Ok(Metric::Cases),
            "recovered" => Ok(Metric::Recovered),
            "deaths" => Ok(Metric::Deaths),
            other => Err(format!("unknown metric: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub long: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountryRecord {
    pub name: String,
    pub iso_code: String,
    pub cases: Count,
    pub today_cases: Count,
    pub deaths: Count,
    pub today_deaths: Count,
    pub recovered: Count,
    pub today_recovered: Count,
    pub coordinates: Coordinates,
}

impl CountryRecord {
    pub fn count(&self, metric: Metric) -> Count {
        match metric {
            Metric::Cases => self.cases,
            Metric::Recovered => self.recovered,
            Metric::Deaths => self.deaths,
        }
    }

    pub fn today(&self, metric: Metric) -> Count {
        match metric {
            Metric::Cases => self.today_cases,
            Metric::Recovered => self.today_recovered,
            Metric::Deaths => self.today_deaths,
        }
    }
}

/// Totals shown in the info boxes: either worldwide or one country.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GlobalSummary {
    pub country: Option<String>,
    pub iso_code: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub cases: Count,
    pub today_cases: Count,
    pub deaths: Count,
    pub today_deaths: Count,
    pub recovered: Count,
    pub today_recovered: Count,
    /// Epoch millis of the upstream refresh, when reported.
    pub updated: Option<i64>,
}

impl GlobalSummary {
    pub fn count(&self, metric: Metric) -> Count {
        match metric {
            Metric::Cases => self.cases,
            Metric::Recovered => self.recovered,
            Metric::Deaths => self.deaths,
        }
    }

    pub fn today(&self, metric: Metric) -> Count {
        match metric {
            Metric::Cases => self.today_cases,
            Metric::Recovered => self.today_recovered,
            Metric::Deaths => self.today_deaths,
        }
    }
}

pub const WORLDWIDE: &str = "worldwide";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CountrySelector {
    Worldwide,
    Country(String),
}

impl CountrySelector {
    pub fn iso_code(&self) -> Option<&str> {
        match self {
            CountrySelector::Worldwide => None,
            CountrySelector::Country(iso) => Some(iso),
        }
    }

    pub fn is_worldwide(&self) -> bool {
        matches!(self, CountrySelector::Worldwide)
    }
}

impl fmt::Display for CountrySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountrySelector::Worldwide => f.write_str(WORLDWIDE),
            CountrySelector::Country(iso) => f.write_str(iso),
        }
    }
}

impl FromStr for CountrySelector {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err("empty country selector".to_string());
        }
        if trimmed.eq_ignore_ascii_case(WORLDWIDE) {
            Ok(CountrySelector::Worldwide)
        } else {
            Ok(CountrySelector::Country(trimmed.to_string()))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: Coordinates,
    pub zoom: u8,
}

impl Viewport {
    pub const DEFAULT_ZOOM: u8 = 3;
    pub const COUNTRY_ZOOM: u8 = 4;

    pub const DEFAULT: Viewport = Viewport {
        center: Coordinates {
            lat: 34.80746,
            long: -40.4796,
        },
        zoom: Self::DEFAULT_ZOOM,
    };

    pub fn for_country(center: Coordinates) -> Self {
        Viewport {
            center,
            zoom: Self::COUNTRY_ZOOM,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub selected_country: CountrySelector,
    pub active_metric: Metric,
    pub viewport: Viewport,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            selected_country: CountrySelector::Worldwide,
            active_metric: Metric::Cases,
            viewport: Viewport::DEFAULT,
        }
    }
}
