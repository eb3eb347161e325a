use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::TrackerConfig;
use crate::error::TrackerError;
use crate::history::HistorySeries;
use crate::http_client::{fetch_json, http_client};
use crate::model::{Coordinates, Count, CountryRecord, CountrySelector, GlobalSummary};
use crate::source::StatsSource;

const HISTORY_DATE_FORMAT: &str = "%m/%d/%y";

/// disease.sh v3 COVID-19 endpoints over a blocking reqwest client.
#[derive(Debug, Clone)]
pub struct DiseaseShSource {
    base: String,
    summary_path: String,
    timeout: Duration,
}

impl DiseaseShSource {
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            base: config.api_base.clone(),
            summary_path: config.summary_path.clone(),
            timeout: config.http_timeout,
        }
    }

    pub fn countries_url(&self) -> String {
        format!("{}/countries", self.base)
    }

    pub fn summary_url(&self, selector: &CountrySelector) -> String {
        match selector {
            CountrySelector::Worldwide => format!("{}{}", self.base, self.summary_path),
            CountrySelector::Country(iso) => format!("{}/countries/{iso}", self.base),
        }
    }

    pub fn history_url(&self, days: u32) -> String {
        format!("{}/historical/all?lastdays={days}", self.base)
    }

    fn get(&self, url: &str) -> Result<String> {
        let client = http_client(self.timeout)?;
        fetch_json(client, url)
    }
}

impl StatsSource for DiseaseShSource {
    fn fetch_countries(&self) -> Result<Vec<CountryRecord>, TrackerError> {
        let body = self.get(&self.countries_url())?;
        Ok(parse_countries_json(&body)?)
    }

    fn fetch_summary(&self, selector: &CountrySelector) -> Result<GlobalSummary, TrackerError> {
        let body = self.get(&self.summary_url(selector))?;
        let summary = match selector {
            CountrySelector::Worldwide => parse_summary_json(&body)?,
            CountrySelector::Country(_) => parse_country_summary_json(&body)?,
        };
        Ok(summary)
    }

    fn fetch_history(&self, days: u32) -> Result<HistorySeries, TrackerError> {
        let body = self.get(&self.history_url(days))?;
        Ok(parse_history_json(&body)?)
    }
}

/// Parses `GET /countries`. Entries without an iso2 code cannot be selected and
/// are skipped; every other malformed entry fails the whole snapshot.
pub fn parse_countries_json(raw: &str) -> Result<Vec<CountryRecord>> {
    let root: Value = serde_json::from_str(raw.trim()).context("invalid countries json")?;
    let list = root
        .as_array()
        .ok_or_else(|| anyhow!("countries response is not an array"))?;

    let mut out = Vec::with_capacity(list.len());
    for (idx, entry) in list.iter().enumerate() {
        let obj = as_object(entry).with_context(|| format!("country entry {idx}"))?;
        if let Some(record) =
            parse_country_record(obj).with_context(|| format!("country entry {idx}"))?
        {
            out.push(record);
        }
    }
    Ok(out)
}

/// Parses the worldwide summary. Country fields are read when present.
pub fn parse_summary_json(raw: &str) -> Result<GlobalSummary> {
    let root: Value = serde_json::from_str(raw.trim()).context("invalid summary json")?;
    let obj = as_object(&root)?;
    let mut summary = parse_counts(obj)?;
    if obj.contains_key("countryInfo") {
        let (country, iso_code, coordinates) = parse_identity(obj)?;
        summary.country = Some(country);
        summary.iso_code = iso_code;
        summary.coordinates = Some(coordinates);
    }
    Ok(summary)
}

/// Parses `GET /countries/{iso}`; the identity fields are required here.
pub fn parse_country_summary_json(raw: &str) -> Result<GlobalSummary> {
    let root: Value = serde_json::from_str(raw.trim()).context("invalid country json")?;
    let obj = as_object(&root)?;
    let mut summary = parse_counts(obj)?;
    let (country, iso_code, coordinates) = parse_identity(obj)?;
    summary.country = Some(country);
    summary.iso_code = iso_code;
    summary.coordinates = Some(coordinates);
    Ok(summary)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawHistory {
    // The per-country endpoint nests the series under "timeline".
    Wrapped { timeline: RawTimeline },
    Flat(RawTimeline),
}

// Unknown keys are rejected so a malformed "timeline" wrapper cannot fall
// through to an empty flat series.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTimeline {
    #[serde(default)]
    cases: BTreeMap<String, u64>,
    #[serde(default)]
    deaths: BTreeMap<String, u64>,
    #[serde(default)]
    recovered: BTreeMap<String, u64>,
}

pub fn parse_history_json(raw: &str) -> Result<HistorySeries> {
    let parsed: RawHistory =
        serde_json::from_str(raw.trim()).context("invalid historical json")?;
    let timeline = match parsed {
        RawHistory::Wrapped { timeline } | RawHistory::Flat(timeline) => timeline,
    };
    Ok(HistorySeries {
        cases: parse_timeline(timeline.cases).context("cases timeline")?,
        deaths: parse_timeline(timeline.deaths).context("deaths timeline")?,
        recovered: parse_timeline(timeline.recovered).context("recovered timeline")?,
    })
}

fn parse_country_record(obj: &Map<String, Value>) -> Result<Option<CountryRecord>> {
    let counts = parse_counts(obj)?;
    let (name, iso_code, coordinates) = parse_identity(obj)?;
    let Some(iso_code) = iso_code else {
        return Ok(None);
    };
    Ok(Some(CountryRecord {
        name,
        iso_code,
        cases: counts.cases,
        today_cases: counts.today_cases,
        deaths: counts.deaths,
        today_deaths: counts.today_deaths,
        recovered: counts.recovered,
        today_recovered: counts.today_recovered,
        coordinates,
    }))
}

fn parse_counts(obj: &Map<String, Value>) -> Result<GlobalSummary> {
    Ok(GlobalSummary {
        cases: required_count(obj, "cases")?,
        today_cases: required_count(obj, "todayCases")?,
        deaths: required_count(obj, "deaths")?,
        today_deaths: required_count(obj, "todayDeaths")?,
        recovered: required_count(obj, "recovered")?,
        today_recovered: required_count(obj, "todayRecovered")?,
        updated: obj.get("updated").and_then(Value::as_i64),
        ..GlobalSummary::default()
    })
}

fn parse_identity(obj: &Map<String, Value>) -> Result<(String, Option<String>, Coordinates)> {
    let name = obj
        .get("country")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .ok_or_else(|| anyhow!("missing string field `country`"))?;
    let info = obj
        .get("countryInfo")
        .ok_or_else(|| anyhow!("missing field `countryInfo`"))
        .and_then(as_object)?;
    let iso_code = match info.get("iso2") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::String(_)) | Some(Value::Null) => None,
        Some(other) => return Err(anyhow!("`countryInfo.iso2` is not a string: {other}")),
        None => return Err(anyhow!("missing field `countryInfo.iso2`")),
    };
    let coordinates = Coordinates {
        lat: required_f64(info, "lat")?,
        long: required_f64(info, "long")?,
    };
    Ok((name, iso_code, coordinates))
}

// Missing key or non-number fails; explicit null or a negative number is unknown.
fn required_count(obj: &Map<String, Value>, key: &str) -> Result<Count> {
    match obj.get(key) {
        None => Err(anyhow!("missing field `{key}`")),
        Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => {
            if let Some(v) = n.as_u64() {
                return Ok(Some(v));
            }
            if n.as_i64().is_some() {
                return Ok(None);
            }
            match n.as_f64() {
                Some(v) if v >= 0.0 && v.fract() == 0.0 => Ok(Some(v as u64)),
                Some(v) if v < 0.0 => Ok(None),
                _ => Err(anyhow!("field `{key}` is not an integer: {n}")),
            }
        }
        Some(other) => Err(anyhow!("field `{key}` is not numeric: {other}")),
    }
}

fn required_f64(obj: &Map<String, Value>, key: &str) -> Result<f64> {
    obj.get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| anyhow!("missing numeric field `{key}`"))
}

fn parse_timeline(raw: BTreeMap<String, u64>) -> Result<Vec<(NaiveDate, u64)>> {
    let mut points = raw
        .into_iter()
        .map(|(raw_date, count)| {
            NaiveDate::parse_from_str(&raw_date, HISTORY_DATE_FORMAT)
                .map(|date| (date, count))
                .with_context(|| format!("bad date `{raw_date}`"))
        })
        .collect::<Result<Vec<_>>>()?;
    // Keys sort as strings, which is not date order for m/d/yy.
    points.sort_by_key(|(date, _)| *date);
    Ok(points)
}

fn as_object(value: &Value) -> Result<&Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| anyhow!("expected a json object"))
}
