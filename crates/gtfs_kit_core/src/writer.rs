use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use gtfs_kit_model::{ContinuousPickupDropOff, Keyed};
use tracing::{debug, info};

use crate::csv_writer::CsvWriter;
use crate::error::{ErrorKind, GtfsError, Result};
use crate::feed::*;

/// Tables in the order they are written.
pub const WRITE_ORDER: &[&str] = &[
    AGENCY_FILE,
    STOPS_FILE,
    ROUTES_FILE,
    TRIPS_FILE,
    STOP_TIMES_FILE,
    CALENDAR_FILE,
    CALENDAR_DATES_FILE,
    SHAPES_FILE,
    FREQUENCIES_FILE,
    TRANSFERS_FILE,
    FARE_ATTRIBUTES_FILE,
    FARE_RULES_FILE,
    FEED_INFO_FILE,
    LEVELS_FILE,
    PATHWAYS_FILE,
    ATTRIBUTIONS_FILE,
];

const STOP_TIMES_COLUMNS: &[&str] = &[
    "trip_id",
    "arrival_time",
    "departure_time",
    "stop_id",
    "stop_sequence",
    "stop_headsign",
    "pickup_type",
    "drop_off_type",
    "shape_dist_traveled",
    "timepoint",
    "continuous_pickup",
    "continuous_drop_off",
];

const SHAPES_COLUMNS: &[&str] = &[
    "shape_id",
    "shape_pt_lat",
    "shape_pt_lon",
    "shape_pt_sequence",
    "shape_dist_traveled",
];

const CALENDAR_COLUMNS: &[&str] = &[
    "service_id",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
    "start_date",
    "end_date",
];

const CALENDAR_DATES_COLUMNS: &[&str] = &["service_id", "date", "exception_type"];

const FREQUENCIES_COLUMNS: &[&str] = &[
    "trip_id",
    "start_time",
    "end_time",
    "headway_secs",
    "exact_times",
];

const TRANSFERS_COLUMNS: &[&str] = &[
    "from_stop_id",
    "to_stop_id",
    "from_route_id",
    "to_route_id",
    "from_trip_id",
    "to_trip_id",
    "transfer_type",
    "min_transfer_time",
];

const FARE_ATTRIBUTES_COLUMNS: &[&str] = &[
    "fare_id",
    "price",
    "currency_type",
    "payment_method",
    "transfers",
    "agency_id",
    "transfer_duration",
];

const FARE_RULES_COLUMNS: &[&str] = &[
    "fare_id",
    "route_id",
    "origin_id",
    "destination_id",
    "contains_id",
];

const FEED_INFO_COLUMNS: &[&str] = &[
    "feed_publisher_name",
    "feed_publisher_url",
    "feed_lang",
    "feed_start_date",
    "feed_end_date",
    "feed_version",
    "feed_contact_email",
    "feed_contact_url",
    "default_lang",
];

const LEVELS_COLUMNS: &[&str] = &["level_id", "level_index", "level_name"];

const PATHWAYS_COLUMNS: &[&str] = &[
    "pathway_id",
    "from_stop_id",
    "to_stop_id",
    "pathway_mode",
    "is_bidirectional",
    "length",
    "traversal_time",
    "stair_count",
    "max_slope",
    "min_width",
    "signposted_as",
    "reversed_signposted_as",
];

const ATTRIBUTIONS_COLUMNS: &[&str] = &[
    "attribution_id",
    "agency_id",
    "route_id",
    "trip_id",
    "organization_name",
    "is_producer",
    "is_operator",
    "is_authority",
    "attribution_url",
    "attribution_email",
    "attribution_phone",
];

/// Serializes a [`Feed`] back into GTFS tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct Writer;

impl Writer {
    pub fn new() -> Self {
        Self
    }

    /// Writes every table the feed has content for into `dir`, creating it
    /// if needed.
    pub fn write_to_dir(&self, feed: &Feed, dir: &Path) -> Result<()> {
        info!(target_dir = %dir.display(), "writing feed");
        fs::create_dir_all(dir).map_err(|err| io_error(err, dir))?;

        let mut written = 0;
        for &file in WRITE_ORDER {
            if !self.has_table(feed, file) {
                debug!(file, "nothing to write");
                continue;
            }
            let path = dir.join(file);
            let out = File::create(&path).map_err(|err| io_error(err, &path))?;
            let mut out = self
                .write_table(feed, file, BufWriter::new(out))
                .map_err(|err| err.in_file(path.display().to_string()))?;
            out.flush().map_err(|err| io_error(err, &path))?;
            written += 1;
        }

        info!(tables = written, "feed written");
        Ok(())
    }

    /// Whether `file` is emitted for this feed. Core tables always are,
    /// even when empty.
    pub fn has_table(&self, feed: &Feed, file: &str) -> bool {
        match file {
            AGENCY_FILE | STOPS_FILE | ROUTES_FILE | TRIPS_FILE | STOP_TIMES_FILE
            | CALENDAR_FILE | CALENDAR_DATES_FILE | SHAPES_FILE => true,
            FREQUENCIES_FILE => feed.has_frequencies(),
            TRANSFERS_FILE => !feed.transfers.is_empty(),
            FARE_ATTRIBUTES_FILE | FARE_RULES_FILE => !feed.fares.is_empty(),
            FEED_INFO_FILE => feed.info.has_publisher(),
            LEVELS_FILE => !feed.levels.is_empty(),
            PATHWAYS_FILE => !feed.pathways.is_empty(),
            ATTRIBUTIONS_FILE => !feed.attributions.is_empty(),
            _ => false,
        }
    }

    /// Writes one table to `out` and hands the sink back.
    pub fn write_table<W: Write>(&self, feed: &Feed, file: &str, out: W) -> Result<W> {
        match file {
            AGENCY_FILE => write_agencies(feed, out),
            STOPS_FILE => write_stops(feed, out),
            ROUTES_FILE => write_routes(feed, out),
            TRIPS_FILE => write_trips(feed, out),
            STOP_TIMES_FILE => write_stop_times(feed, out),
            CALENDAR_FILE => write_calendar(feed, out),
            CALENDAR_DATES_FILE => write_calendar_dates(feed, out),
            SHAPES_FILE => write_shapes(feed, out),
            FREQUENCIES_FILE => write_frequencies(feed, out),
            TRANSFERS_FILE => write_transfers(feed, out),
            FARE_ATTRIBUTES_FILE => write_fare_attributes(feed, out),
            FARE_RULES_FILE => write_fare_rules(feed, out),
            FEED_INFO_FILE => write_feed_info(feed, out),
            LEVELS_FILE => write_levels(feed, out),
            PATHWAYS_FILE => write_pathways(feed, out),
            ATTRIBUTIONS_FILE => write_attributions(feed, out),
            other => Err(GtfsError::new(
                ErrorKind::WriterIo,
                format!("unknown table '{}'", other),
            )),
        }
    }
}

fn io_error(err: std::io::Error, path: &Path) -> GtfsError {
    GtfsError::new(ErrorKind::WriterIo, "Could not write to file.")
        .in_file(path.display().to_string())
        .with_source(err)
}

fn columns(base: &[&str], extra: &ExtraFields) -> Vec<String> {
    base.iter()
        .map(|column| column.to_string())
        .chain(extra.columns().iter().cloned())
        .collect()
}

fn table<W: Write>(out: W, base: &[&str]) -> CsvWriter<W> {
    CsvWriter::new(out, base.iter().map(|column| column.to_string()).collect())
}

fn write_extra<W: Write>(csv: &mut CsvWriter<W>, extra: &ExtraFields, id: &str) -> Result<()> {
    for column in extra.columns() {
        csv.write_str(extra.get(column, id).unwrap_or(""))?;
    }
    Ok(())
}

fn write_optional_id<W: Write, T: Keyed>(csv: &mut CsvWriter<W>, entity: Option<&T>) -> Result<()> {
    match entity {
        Some(entity) => csv.write_str(entity.id()),
        None => csv.skip(),
    }
}

fn write_optional_int<W: Write>(csv: &mut CsvWriter<W>, value: Option<i64>) -> Result<()> {
    match value {
        Some(value) => csv.write_int(value),
        None => csv.skip(),
    }
}

fn write_optional_double<W: Write>(
    csv: &mut CsvWriter<W>,
    value: Option<f64>,
    digits: u32,
) -> Result<()> {
    match value {
        Some(value) => csv.write_double_rounded(value, digits),
        None => csv.skip(),
    }
}

/// `1` (no continuous service) is the implied default and left empty.
fn write_continuous<W: Write>(
    csv: &mut CsvWriter<W>,
    value: ContinuousPickupDropOff,
) -> Result<()> {
    if value == ContinuousPickupDropOff::NoContinuous {
        csv.skip()
    } else {
        csv.write_int(value.code() as i64)
    }
}

fn write_flag_if_set<W: Write>(csv: &mut CsvWriter<W>, flag: bool) -> Result<()> {
    if flag {
        csv.write_int(1)
    } else {
        csv.skip()
    }
}

fn write_agencies<W: Write>(feed: &Feed, out: W) -> Result<W> {
    let mut csv = CsvWriter::new(out, columns(AGENCY_COLUMNS, &feed.agency_extra));
    csv.write_header()?;
    for agency in &feed.agencies {
        csv.write_str(&agency.id)?;
        csv.write_str(&agency.name)?;
        csv.write_str(&agency.url)?;
        csv.write_str(&agency.timezone)?;
        csv.write_str(&agency.lang)?;
        csv.write_str(&agency.phone)?;
        csv.write_str(&agency.fare_url)?;
        csv.write_str(&agency.email)?;
        write_extra(&mut csv, &feed.agency_extra, &agency.id)?;
        csv.flush_line()?;
    }
    csv.finish()
}

fn write_stops<W: Write>(feed: &Feed, out: W) -> Result<W> {
    let mut csv = CsvWriter::new(out, columns(STOPS_COLUMNS, &feed.stop_extra));
    csv.write_header()?;
    for stop in feed.stops() {
        csv.write_str(&stop.id)?;
        csv.write_str(&stop.code)?;
        csv.write_str(&stop.name)?;
        csv.write_str(&stop.desc)?;
        // Out-of-range values are kept so a leniently loaded feed reads back.
        csv.write_double_rounded(stop.lat, 6)?;
        csv.write_double_rounded(stop.lon, 6)?;
        csv.write_str(&stop.zone_id)?;
        csv.write_str(&stop.url)?;
        csv.write_int(stop.location_type.code() as i64)?;
        write_optional_id(&mut csv, feed.parent_station(stop))?;
        csv.write_str(&stop.timezone)?;
        csv.write_int(stop.wheelchair_boarding.code() as i64)?;
        csv.write_str(&stop.platform_code)?;
        write_optional_id(&mut csv, stop.level.map(|level| &feed.levels[level]))?;
        write_extra(&mut csv, &feed.stop_extra, &stop.id)?;
        csv.flush_line()?;
    }
    csv.finish()
}

fn write_routes<W: Write>(feed: &Feed, out: W) -> Result<W> {
    let mut csv = CsvWriter::new(out, columns(ROUTES_COLUMNS, &feed.route_extra));
    csv.write_header()?;
    for route in &feed.routes {
        csv.write_str(&route.id)?;
        write_optional_id(&mut csv, feed.route_agency(route))?;
        csv.write_str(&route.short_name)?;
        csv.write_str(&route.long_name)?;
        csv.write_str(&route.desc)?;
        csv.write_int(route.route_type.code() as i64)?;
        csv.write_str(&route.url)?;
        match route.color {
            Some(color) => csv.write_str(&color.to_string())?,
            None => csv.skip()?,
        }
        match route.text_color {
            Some(color) => csv.write_str(&color.to_string())?,
            None => csv.skip()?,
        }
        write_optional_int(&mut csv, route.sort_order.map(i64::from))?;
        write_continuous(&mut csv, route.continuous_pickup)?;
        write_continuous(&mut csv, route.continuous_drop_off)?;
        write_extra(&mut csv, &feed.route_extra, &route.id)?;
        csv.flush_line()?;
    }
    csv.finish()
}

fn write_trips<W: Write>(feed: &Feed, out: W) -> Result<W> {
    let mut csv = CsvWriter::new(out, columns(TRIPS_COLUMNS, &feed.trip_extra));
    csv.write_header()?;
    for trip in &feed.trips {
        csv.write_str(&feed.trip_route(trip).id)?;
        csv.write_str(&feed.trip_service(trip).id)?;
        csv.write_str(&trip.id)?;
        csv.write_str(&trip.headsign)?;
        csv.write_str(&trip.short_name)?;
        write_optional_int(&mut csv, trip.direction.map(|dir| dir.code() as i64))?;
        csv.write_str(&trip.block_id)?;
        write_optional_id(&mut csv, feed.trip_shape(trip))?;
        csv.write_int(trip.wheelchair_accessible.code() as i64)?;
        csv.write_int(trip.bikes_allowed.code() as i64)?;
        write_extra(&mut csv, &feed.trip_extra, &trip.id)?;
        csv.flush_line()?;
    }
    csv.finish()
}

fn write_stop_times<W: Write>(feed: &Feed, out: W) -> Result<W> {
    let mut csv = table(out, STOP_TIMES_COLUMNS);
    csv.write_header()?;
    for trip in &feed.trips {
        for stop_time in trip.stop_times() {
            csv.write_str(&trip.id)?;
            csv.write_str(&stop_time.arrival_time.to_string())?;
            csv.write_str(&stop_time.departure_time.to_string())?;
            csv.write_str(&feed.stop_time_stop(stop_time).id)?;
            csv.write_int(stop_time.sequence as i64)?;
            csv.write_str(&stop_time.headsign)?;
            csv.write_int(stop_time.pickup_type.code() as i64)?;
            csv.write_int(stop_time.drop_off_type.code() as i64)?;
            write_optional_double(&mut csv, stop_time.dist_traveled, 3)?;
            csv.write_int(stop_time.is_timepoint as i64)?;
            write_continuous(&mut csv, stop_time.continuous_pickup)?;
            write_continuous(&mut csv, stop_time.continuous_drop_off)?;
            csv.flush_line()?;
        }
    }
    csv.finish()
}

fn write_calendar<W: Write>(feed: &Feed, out: W) -> Result<W> {
    let mut csv = table(out, CALENDAR_COLUMNS);
    csv.write_header()?;
    for service in &feed.services {
        // Services known only from calendar_dates.txt have no range.
        let (Some(start), Some(end)) = (service.start_date, service.end_date) else {
            continue;
        };
        csv.write_str(&service.id)?;
        for runs in service.days.flags() {
            csv.write_int(runs as i64)?;
        }
        csv.write_str(&start.to_string())?;
        csv.write_str(&end.to_string())?;
        csv.flush_line()?;
    }
    csv.finish()
}

fn write_calendar_dates<W: Write>(feed: &Feed, out: W) -> Result<W> {
    let mut csv = table(out, CALENDAR_DATES_COLUMNS);
    csv.write_header()?;
    for service in &feed.services {
        for (date, exception) in service.exceptions() {
            csv.write_str(&service.id)?;
            csv.write_str(&date.to_string())?;
            csv.write_int(exception.code() as i64)?;
            csv.flush_line()?;
        }
    }
    csv.finish()
}

fn write_shapes<W: Write>(feed: &Feed, out: W) -> Result<W> {
    let mut csv = table(out, SHAPES_COLUMNS);
    csv.write_header()?;
    for shape in &feed.shapes {
        for point in shape.points() {
            csv.write_str(&shape.id)?;
            csv.write_double_rounded(point.lat, 6)?;
            csv.write_double_rounded(point.lon, 6)?;
            csv.write_int(point.sequence as i64)?;
            write_optional_double(&mut csv, point.dist_traveled, 3)?;
            csv.flush_line()?;
        }
    }
    csv.finish()
}

fn write_frequencies<W: Write>(feed: &Feed, out: W) -> Result<W> {
    let mut csv = table(out, FREQUENCIES_COLUMNS);
    for trip in &feed.trips {
        for frequency in trip.frequencies() {
            csv.write_str(&trip.id)?;
            csv.write_str(&frequency.start_time.to_string())?;
            csv.write_str(&frequency.end_time.to_string())?;
            csv.write_int(frequency.headway_secs as i64)?;
            csv.write_int(frequency.exact_times as i64)?;
            csv.flush_line()?;
        }
    }
    csv.finish()
}

fn write_transfers<W: Write>(feed: &Feed, out: W) -> Result<W> {
    let mut csv = table(out, TRANSFERS_COLUMNS);
    for transfer in &feed.transfers {
        write_optional_id(&mut csv, transfer.from_stop.map(|stop| &feed.stops()[stop]))?;
        write_optional_id(&mut csv, transfer.to_stop.map(|stop| &feed.stops()[stop]))?;
        write_optional_id(&mut csv, transfer.from_route.map(|route| &feed.routes[route]))?;
        write_optional_id(&mut csv, transfer.to_route.map(|route| &feed.routes[route]))?;
        write_optional_id(&mut csv, transfer.from_trip.map(|trip| &feed.trips[trip]))?;
        write_optional_id(&mut csv, transfer.to_trip.map(|trip| &feed.trips[trip]))?;
        csv.write_int(transfer.transfer_type.code() as i64)?;
        write_optional_int(&mut csv, transfer.min_transfer_time.map(i64::from))?;
        csv.flush_line()?;
    }
    csv.finish()
}

fn write_fare_attributes<W: Write>(feed: &Feed, out: W) -> Result<W> {
    let mut csv = table(out, FARE_ATTRIBUTES_COLUMNS);
    for fare in &feed.fares {
        csv.write_str(&fare.id)?;
        csv.write_double_rounded(fare.price, 2)?;
        csv.write_str(&fare.currency_type)?;
        csv.write_int(fare.payment_method.code() as i64)?;
        // Empty means unlimited transfers.
        write_optional_int(&mut csv, fare.transfers.map(i64::from))?;
        write_optional_id(&mut csv, fare.agency.map(|agency| &feed.agencies[agency]))?;
        write_optional_int(&mut csv, fare.transfer_duration.map(i64::from))?;
        csv.flush_line()?;
    }
    csv.finish()
}

fn write_fare_rules<W: Write>(feed: &Feed, out: W) -> Result<W> {
    let mut csv = table(out, FARE_RULES_COLUMNS);
    csv.write_header()?;
    for fare in &feed.fares {
        for rule in &fare.rules {
            csv.write_str(&fare.id)?;
            write_optional_id(&mut csv, rule.route.map(|route| &feed.routes[route]))?;
            csv.write_str(&rule.origin_id)?;
            csv.write_str(&rule.destination_id)?;
            csv.write_str(&rule.contains_id)?;
            csv.flush_line()?;
        }
    }
    csv.finish()
}

fn write_feed_info<W: Write>(feed: &Feed, out: W) -> Result<W> {
    let info = &feed.info;
    let mut csv = table(out, FEED_INFO_COLUMNS);
    csv.write_str(&info.publisher_name)?;
    csv.write_str(&info.publisher_url)?;
    csv.write_str(&info.lang)?;
    for date in [info.start_date, info.end_date] {
        match date {
            Some(date) => csv.write_str(&date.to_string())?,
            None => csv.skip()?,
        }
    }
    csv.write_str(&info.version)?;
    csv.write_str(&info.contact_email)?;
    csv.write_str(&info.contact_url)?;
    csv.write_str(&info.default_lang)?;
    csv.flush_line()?;
    csv.finish()
}

fn write_levels<W: Write>(feed: &Feed, out: W) -> Result<W> {
    let mut csv = table(out, LEVELS_COLUMNS);
    for level in &feed.levels {
        csv.write_str(&level.id)?;
        csv.write_double(level.index)?;
        csv.write_str(&level.name)?;
        csv.flush_line()?;
    }
    csv.finish()
}

fn write_pathways<W: Write>(feed: &Feed, out: W) -> Result<W> {
    let mut csv = table(out, PATHWAYS_COLUMNS);
    for pathway in &feed.pathways {
        csv.write_str(&pathway.id)?;
        csv.write_str(&feed.stops()[pathway.from_stop].id)?;
        csv.write_str(&feed.stops()[pathway.to_stop].id)?;
        csv.write_int(pathway.mode.code() as i64)?;
        csv.write_int(pathway.is_bidirectional as i64)?;
        write_optional_double(&mut csv, pathway.length, 4)?;
        write_optional_int(&mut csv, pathway.traversal_time.map(i64::from))?;
        write_optional_int(&mut csv, pathway.stair_count.map(i64::from))?;
        write_optional_double(&mut csv, pathway.max_slope, 4)?;
        write_optional_double(&mut csv, pathway.min_width, 4)?;
        csv.write_str(&pathway.signposted_as)?;
        csv.write_str(&pathway.reversed_signposted_as)?;
        csv.flush_line()?;
    }
    csv.finish()
}

fn write_attributions<W: Write>(feed: &Feed, out: W) -> Result<W> {
    let mut csv = table(out, ATTRIBUTIONS_COLUMNS);
    for attribution in &feed.attributions {
        csv.write_str(&attribution.id)?;
        write_optional_id(&mut csv, attribution.agency.map(|agency| &feed.agencies[agency]))?;
        write_optional_id(&mut csv, attribution.route.map(|route| &feed.routes[route]))?;
        write_optional_id(&mut csv, attribution.trip.map(|trip| &feed.trips[trip]))?;
        csv.write_str(&attribution.organization_name)?;
        write_flag_if_set(&mut csv, attribution.is_producer)?;
        write_flag_if_set(&mut csv, attribution.is_operator)?;
        write_flag_if_set(&mut csv, attribution.is_authority)?;
        csv.write_str(&attribution.url)?;
        csv.write_str(&attribution.email)?;
        csv.write_str(&attribution.phone)?;
        csv.flush_line()?;
    }
    csv.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtfs_kit_model::{
        Agency, Fare, GtfsTime, Route, RouteType, Service, ServiceDate, ServiceDays, Stop,
        StopTime, Trip,
    };

    fn render(feed: &Feed, file: &str) -> String {
        let bytes = Writer::new().write_table(feed, file, Vec::new()).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    fn sample_feed() -> Feed {
        let mut feed = Feed::new();
        let agency = feed.agencies.add(Agency::new("A1", "Agency")).unwrap();
        let s1 = feed.add_stop(Stop::new("S1", "Main, north", 48.1234567, 7.8)).unwrap();
        feed.add_stop(Stop::new("S2", "Broken", 91.0, 7.8)).unwrap();
        let mut route = Route::new("R1", RouteType::BUS);
        route.agency = Some(agency);
        let route = feed.routes.add(route).unwrap();
        let start = ServiceDate::parse("20240101").unwrap();
        let end = ServiceDate::parse("20241231").unwrap();
        let service = feed
            .services
            .add(Service::with_calendar("SVC1", ServiceDays::WEEKDAYS, start, end))
            .unwrap();
        feed.services.add(Service::new("ONLY_DATES")).unwrap();
        let mut trip = Trip::new("T1", route, service);
        let mut stop_time = StopTime::new(s1, 1, GtfsTime::new(8, 0, 0), GtfsTime::new(8, 1, 0));
        stop_time.dist_traveled = Some(12.34567);
        trip.add_stop_time(stop_time).unwrap();
        feed.trips.add(trip).unwrap();
        feed
    }

    #[test]
    fn route_row_leaves_defaults_empty() {
        let out = render(&sample_feed(), ROUTES_FILE);
        assert_eq!(
            out,
            "route_id,agency_id,route_short_name,route_long_name,route_desc,route_type,route_url,route_color,route_text_color,route_sort_order,continuous_pickup,continuous_drop_off\n\
             R1,A1,,,,3,,,,,,\n"
        );
    }

    #[test]
    fn stop_coordinates_are_rounded_and_kept_when_out_of_range() {
        let out = render(&sample_feed(), STOPS_FILE);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[1], "S1,,\"Main, north\",,48.123457,7.8,,,0,,,0,,");
        assert_eq!(lines[2], "S2,,Broken,,91,7.8,,,0,,,0,,");
    }

    #[test]
    fn stop_times_round_distance() {
        let out = render(&sample_feed(), STOP_TIMES_FILE);
        assert_eq!(
            out.lines().nth(1),
            Some("T1,08:00:00,08:01:00,S1,1,,0,0,12.346,1,,")
        );
    }

    #[test]
    fn calendar_skips_services_without_range() {
        let out = render(&sample_feed(), CALENDAR_FILE);
        assert_eq!(out.lines().count(), 2);
        assert!(out.ends_with("SVC1,1,1,1,1,1,0,0,20240101,20241231\n"));
    }

    #[test]
    fn always_created_tables_get_a_header() {
        let feed = Feed::new();
        assert_eq!(render(&feed, SHAPES_FILE), "shape_id,shape_pt_lat,shape_pt_lon,shape_pt_sequence,shape_dist_traveled\n");
        assert!(Writer::new().has_table(&feed, CALENDAR_DATES_FILE));
        assert!(!Writer::new().has_table(&feed, TRANSFERS_FILE));
        assert!(!Writer::new().has_table(&feed, FEED_INFO_FILE));
    }

    #[test]
    fn fare_with_unlimited_transfers() {
        let mut feed = sample_feed();
        let mut fare = Fare::new("F1", 2.5, "EUR");
        fare.transfers = None;
        feed.fares.add(fare).unwrap();
        let out = render(&feed, FARE_ATTRIBUTES_FILE);
        assert_eq!(out.lines().nth(1), Some("F1,2.5,EUR,0,,,"));
        assert!(Writer::new().has_table(&feed, FARE_RULES_FILE));
    }

    #[test]
    fn unknown_table_is_rejected() {
        let err = Writer::new()
            .write_table(&Feed::new(), "translations.txt", Vec::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WriterIo);
    }
}
