use std::collections::BTreeSet;

use compact_str::CompactString;
use gtfs_kit_model::{
    Agency, Attribution, Container, Fare, Level, Pathway, Route, Service, ServiceDate, Shape,
    Stop, StopRef, StopTime, Transfer, Trip,
};
use rustc_hash::FxHashMap;

pub const AGENCY_FILE: &str = "agency.txt";
pub const STOPS_FILE: &str = "stops.txt";
pub const ROUTES_FILE: &str = "routes.txt";
pub const TRIPS_FILE: &str = "trips.txt";
pub const STOP_TIMES_FILE: &str = "stop_times.txt";
pub const CALENDAR_FILE: &str = "calendar.txt";
pub const CALENDAR_DATES_FILE: &str = "calendar_dates.txt";
pub const SHAPES_FILE: &str = "shapes.txt";
pub const FREQUENCIES_FILE: &str = "frequencies.txt";
pub const FARE_ATTRIBUTES_FILE: &str = "fare_attributes.txt";
pub const FARE_RULES_FILE: &str = "fare_rules.txt";
pub const TRANSFERS_FILE: &str = "transfers.txt";
pub const LEVELS_FILE: &str = "levels.txt";
pub const PATHWAYS_FILE: &str = "pathways.txt";
pub const FEED_INFO_FILE: &str = "feed_info.txt";
pub const ATTRIBUTIONS_FILE: &str = "attributions.txt";

/// Tables in the order they are loaded.
pub const GTFS_FILE_NAMES: &[&str] = &[
    AGENCY_FILE,
    LEVELS_FILE,
    STOPS_FILE,
    ROUTES_FILE,
    CALENDAR_FILE,
    CALENDAR_DATES_FILE,
    SHAPES_FILE,
    TRIPS_FILE,
    STOP_TIMES_FILE,
    FREQUENCIES_FILE,
    FARE_ATTRIBUTES_FILE,
    FARE_RULES_FILE,
    TRANSFERS_FILE,
    PATHWAYS_FILE,
    FEED_INFO_FILE,
    ATTRIBUTIONS_FILE,
];

pub const AGENCY_COLUMNS: &[&str] = &[
    "agency_id",
    "agency_name",
    "agency_url",
    "agency_timezone",
    "agency_lang",
    "agency_phone",
    "agency_fare_url",
    "agency_email",
];

pub const STOPS_COLUMNS: &[&str] = &[
    "stop_id",
    "stop_code",
    "stop_name",
    "stop_desc",
    "stop_lat",
    "stop_lon",
    "zone_id",
    "stop_url",
    "location_type",
    "parent_station",
    "stop_timezone",
    "wheelchair_boarding",
    "platform_code",
    "level_id",
];

pub const ROUTES_COLUMNS: &[&str] = &[
    "route_id",
    "agency_id",
    "route_short_name",
    "route_long_name",
    "route_desc",
    "route_type",
    "route_url",
    "route_color",
    "route_text_color",
    "route_sort_order",
    "continuous_pickup",
    "continuous_drop_off",
];

pub const TRIPS_COLUMNS: &[&str] = &[
    "route_id",
    "service_id",
    "trip_id",
    "trip_headsign",
    "trip_short_name",
    "direction_id",
    "block_id",
    "shape_id",
    "wheelchair_accessible",
    "bikes_allowed",
];

/// Publisher metadata from `feed_info.txt`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedInfo {
    pub publisher_name: String,
    pub publisher_url: String,
    pub lang: String,
    pub start_date: Option<ServiceDate>,
    pub end_date: Option<ServiceDate>,
    pub version: String,
    pub contact_email: String,
    pub contact_url: String,
    pub default_lang: String,
}

impl FeedInfo {
    pub fn has_publisher(&self) -> bool {
        !self.publisher_name.is_empty() && !self.publisher_url.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    fn around(lat: f64, lon: f64) -> Self {
        Self {
            min_lat: lat,
            min_lon: lon,
            max_lat: lat,
            max_lon: lon,
        }
    }

    fn extend(&mut self, lat: f64, lon: f64) {
        self.min_lat = self.min_lat.min(lat);
        self.min_lon = self.min_lon.min(lon);
        self.max_lat = self.max_lat.max(lat);
        self.max_lon = self.max_lon.max(lon);
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }
}

/// Non-standard columns of one table, kept per entity id so they can be
/// written back out.
#[derive(Debug, Clone, Default)]
pub struct ExtraFields {
    columns: Vec<String>,
    values: FxHashMap<String, FxHashMap<CompactString, String>>,
}

impl ExtraFields {
    pub fn insert(&mut self, column: &str, id: &str, value: impl Into<String>) {
        if !self.values.contains_key(column) {
            self.columns.push(column.to_string());
        }
        self.values
            .entry(column.to_string())
            .or_default()
            .insert(CompactString::from(id), value.into());
    }

    /// Columns in the order they were first seen.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn get(&self, column: &str, id: &str) -> Option<&str> {
        self.values.get(column)?.get(id).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// A fully linked GTFS dataset.
///
/// Entities live in per-table containers owned by the feed; references
/// between them are handles into those containers.
#[derive(Debug, Clone, Default)]
pub struct Feed {
    pub agencies: Container<Agency>,
    stops: Container<Stop>,
    pub routes: Container<Route>,
    pub services: Container<Service>,
    pub shapes: Container<Shape>,
    pub trips: Container<Trip>,
    pub fares: Container<Fare>,
    pub levels: Container<Level>,
    pub pathways: Container<Pathway>,
    pub transfers: Vec<Transfer>,
    pub attributions: Vec<Attribution>,
    pub info: FeedInfo,
    pub agency_extra: ExtraFields,
    pub stop_extra: ExtraFields,
    pub route_extra: ExtraFields,
    pub trip_extra: ExtraFields,
    zones: BTreeSet<String>,
    bounding_box: Option<BoundingBox>,
}

impl Feed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stops(&self) -> &Container<Stop> {
        &self.stops
    }

    /// Mutable access to stops. Coordinate edits made here are not reflected
    /// in [`Feed::bounding_box`].
    pub fn stops_mut(&mut self) -> &mut Container<Stop> {
        &mut self.stops
    }

    /// Adds a stop, growing the bounding box and zone set. On an id collision
    /// the stop is handed back.
    pub fn add_stop(&mut self, stop: Stop) -> Result<StopRef, Stop> {
        let (lat, lon) = (stop.lat, stop.lon);
        let valid = stop.has_valid_coordinates();
        let zone = stop.zone_id.clone();
        let handle = self.stops.add(stop)?;
        if valid {
            self.bounding_box = Some(match self.bounding_box {
                Some(mut bbox) => {
                    bbox.extend(lat, lon);
                    bbox
                }
                None => BoundingBox::around(lat, lon),
            });
        }
        if !zone.is_empty() {
            self.zones.insert(zone);
        }
        Ok(handle)
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounding_box
    }

    /// Fare zone ids referenced by stops.
    pub fn zones(&self) -> &BTreeSet<String> {
        &self.zones
    }

    pub fn parent_station(&self, stop: &Stop) -> Option<&Stop> {
        stop.parent_station.map(|parent| &self.stops[parent])
    }

    pub fn route_agency(&self, route: &Route) -> Option<&Agency> {
        route.agency.map(|agency| &self.agencies[agency])
    }

    pub fn trip_route(&self, trip: &Trip) -> &Route {
        &self.routes[trip.route]
    }

    pub fn trip_service(&self, trip: &Trip) -> &Service {
        &self.services[trip.service]
    }

    pub fn trip_shape(&self, trip: &Trip) -> Option<&Shape> {
        trip.shape.map(|shape| &self.shapes[shape])
    }

    pub fn stop_time_stop(&self, stop_time: &StopTime) -> &Stop {
        &self.stops[stop_time.stop]
    }

    pub fn stop_time_count(&self) -> usize {
        self.trips.iter().map(|trip| trip.stop_times().len()).sum()
    }

    pub fn has_frequencies(&self) -> bool {
        self.trips.iter().any(|trip| !trip.frequencies().is_empty())
    }
}
