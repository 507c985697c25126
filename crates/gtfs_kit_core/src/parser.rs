use std::io::Read;
use std::path::Path;

use compact_str::CompactString;
use gtfs_kit_model::{
    Accessibility, Agency, Attribution, Container, ContinuousPickupDropOff, DirectionId,
    EntityRef, ExceptionType, Fare, FareRule, Frequency, Keyed, Level, LocationType, Pathway,
    PathwayMode, PaymentMethod, PickupDropOffType, Route, Service, ServiceDays, Shape,
    ShapePoint, Stop, StopRef, StopTime, Transfer, TransferType, Trip,
};
use tracing::{debug, info, trace};

use crate::csv_reader::CsvReader;
use crate::error::{ErrorKind, GtfsError, Result};
use crate::feed::*;
use crate::field::FieldAccessor;
use crate::input::{open_source, FileSource};
use crate::progress::ProgressHandler;

const MAX_U32: i64 = u32::MAX as i64;
const DAY_COLUMNS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserConfig {
    /// Reject values the lenient default tolerates.
    pub strict: bool,
    /// Keep non-standard columns of agency, stops, routes and trips.
    pub parse_additional_fields: bool,
}

/// Loads a feed table by table, linking each table against the ones
/// loaded before it. The first problem found aborts the whole load.
pub struct Parser<'p> {
    config: ParserConfig,
    progress: Option<&'p dyn ProgressHandler>,
}

impl<'p> Parser<'p> {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            progress: None,
        }
    }

    pub fn with_progress(mut self, handler: &'p dyn ProgressHandler) -> Self {
        self.progress = Some(handler);
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn parse_path(&self, path: &Path) -> Result<Feed> {
        let mut source = open_source(path)?;
        self.parse_source(source.as_mut())
    }

    pub fn parse_source(&self, source: &mut dyn FileSource) -> Result<Feed> {
        info!(
            source = %source.describe(),
            strict = self.config.strict,
            "loading feed"
        );
        if let Some(progress) = self.progress {
            progress.set_total_tables(GTFS_FILE_NAMES.len());
        }

        let mut feed = Feed::new();
        self.load_agencies(source, &mut feed)?;
        self.load_levels(source, &mut feed)?;
        self.load_stops(source, &mut feed)?;
        self.load_routes(source, &mut feed)?;
        self.load_calendar(source, &mut feed)?;
        self.load_calendar_dates(source, &mut feed)?;
        self.load_shapes(source, &mut feed)?;
        self.load_trips(source, &mut feed)?;
        self.load_stop_times(source, &mut feed)?;
        self.load_frequencies(source, &mut feed)?;
        self.load_fare_attributes(source, &mut feed)?;
        self.load_fare_rules(source, &mut feed)?;
        self.load_transfers(source, &mut feed)?;
        self.load_pathways(source, &mut feed)?;
        self.load_feed_info(source, &mut feed)?;
        self.load_attributions(source, &mut feed)?;

        info!(
            agencies = feed.agencies.len(),
            stops = feed.stops().len(),
            routes = feed.routes.len(),
            trips = feed.trips.len(),
            stop_times = feed.stop_time_count(),
            "feed loaded"
        );
        Ok(feed)
    }

    /// Streams one table through `handle_row`. Returns whether the file exists.
    fn read_table<F>(
        &self,
        source: &mut dyn FileSource,
        file: &str,
        required: bool,
        handle_row: F,
    ) -> Result<bool>
    where
        F: FnMut(&FieldAccessor<'_>) -> Result<()>,
    {
        let Some(stream) = source.open(file)? else {
            if required {
                let path = Path::new(&source.describe()).join(file);
                return Err(GtfsError::file_not_found(path.display().to_string()));
            }
            trace!(file, "optional table not present");
            return Ok(false);
        };

        debug!(file, "reading table");
        if let Some(progress) = self.progress {
            progress.on_start_table(file);
        }
        let rows = self
            .read_rows(stream, handle_row)
            .map_err(|err| err.in_file(file))?;
        debug!(file, rows, "table done");
        if let Some(progress) = self.progress {
            progress.on_finish_table(file, rows);
        }
        Ok(true)
    }

    fn read_rows<F>(&self, stream: Box<dyn Read + '_>, mut handle_row: F) -> Result<u64>
    where
        F: FnMut(&FieldAccessor<'_>) -> Result<()>,
    {
        let mut reader = CsvReader::new(stream)?;
        let mut rows = 0;
        while let Some(record) = reader.next_record()? {
            let row = FieldAccessor::new(reader.header(), &record).strict(self.config.strict);
            handle_row(&row)?;
            rows += 1;
        }
        Ok(rows)
    }

    fn capture_extra(
        &self,
        row: &FieldAccessor<'_>,
        known: &[&str],
        id: &str,
        extra: &mut ExtraFields,
    ) {
        if !self.config.parse_additional_fields {
            return;
        }
        for column in row.columns() {
            if column.is_empty() || known.contains(&column.as_str()) {
                continue;
            }
            extra.insert(column, id, row.string_or(column, ""));
        }
    }

    fn check_coordinates(
        &self,
        row: &FieldAccessor<'_>,
        fields: (&str, &str),
        lat: f64,
        lon: f64,
    ) -> Result<()> {
        if !self.config.strict {
            return Ok(());
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(row.error(
                ErrorKind::Range,
                fields.0,
                format!("latitude {} out of range [-90,90]", lat),
            ));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(row.error(
                ErrorKind::Range,
                fields.1,
                format!("longitude {} out of range [-180,180]", lon),
            ));
        }
        Ok(())
    }

    fn load_agencies(&self, source: &mut dyn FileSource, feed: &mut Feed) -> Result<()> {
        self.read_table(source, AGENCY_FILE, true, |row| {
            let id = row.string_or("agency_id", "");
            let agency = Agency {
                id: CompactString::from(id),
                name: row.string("agency_name")?.to_string(),
                url: row.required_url("agency_url")?.to_string(),
                timezone: row.string("agency_timezone")?.to_string(),
                lang: row.string_or("agency_lang", "").to_string(),
                phone: row.string_or("agency_phone", "").to_string(),
                fare_url: row.url("agency_fare_url")?.to_string(),
                email: row.string_or("agency_email", "").to_string(),
            };
            feed.agencies
                .add(agency)
                .map_err(|agency| duplicate_id(row, "agency_id", &agency.id))?;
            self.capture_extra(row, AGENCY_COLUMNS, id, &mut feed.agency_extra);
            Ok(())
        })?;

        if feed.agencies.is_empty() {
            return Err(GtfsError::new(
                ErrorKind::Validation,
                "the feed has no agency defined. This is a required field.",
            )
            .with_line(1)
            .in_file(AGENCY_FILE));
        }
        Ok(())
    }

    fn load_levels(&self, source: &mut dyn FileSource, feed: &mut Feed) -> Result<()> {
        self.read_table(source, LEVELS_FILE, false, |row| {
            let level = Level {
                id: CompactString::from(row.string("level_id")?),
                index: row.double("level_index")?,
                name: row.string_or("level_name", "").to_string(),
            };
            feed.levels
                .add(level)
                .map_err(|level| duplicate_id(row, "level_id", &level.id))?;
            Ok(())
        })?;
        Ok(())
    }

    fn load_stops(&self, source: &mut dyn FileSource, feed: &mut Feed) -> Result<()> {
        let mut parents: Vec<(StopRef, String, u64)> = Vec::new();

        self.read_table(source, STOPS_FILE, true, |row| {
            let id = row.string("stop_id")?;
            let lat = row.double("stop_lat")?;
            let lon = row.double("stop_lon")?;
            self.check_coordinates(row, ("stop_lat", "stop_lon"), lat, lon)?;

            let location_type =
                row.code_or("location_type", 0, 2, LocationType::Stop, LocationType::from_code)?;
            let parent_id = row.string_or("parent_station", "");
            if !parent_id.is_empty() && location_type == LocationType::Station {
                return Err(row.error(
                    ErrorKind::Validation,
                    "parent_station",
                    "a stop with location_type 'station' (1) cannot have a parent station",
                ));
            }

            let stop = Stop {
                id: CompactString::from(id),
                code: row.string_or("stop_code", "").to_string(),
                name: row.string("stop_name")?.to_string(),
                desc: row.string_or("stop_desc", "").to_string(),
                lat,
                lon,
                zone_id: row.string_or("zone_id", "").to_string(),
                url: row.url("stop_url")?.to_string(),
                location_type,
                parent_station: None,
                timezone: row.string_or("stop_timezone", "").to_string(),
                wheelchair_boarding: row.code_or(
                    "wheelchair_boarding",
                    0,
                    2,
                    Accessibility::NoInformation,
                    Accessibility::from_code,
                )?,
                platform_code: row.string_or("platform_code", "").to_string(),
                level: resolve_optional(row, &feed.levels, "level_id", "level")?,
            };
            let handle = feed
                .add_stop(stop)
                .map_err(|stop| duplicate_id(row, "stop_id", &stop.id))?;
            if !parent_id.is_empty() {
                parents.push((handle, parent_id.to_string(), row.line()));
            }
            self.capture_extra(row, STOPS_COLUMNS, id, &mut feed.stop_extra);
            Ok(())
        })?;

        // Parents may appear after their children, so they are linked once
        // every stop is known.
        for (child, parent_id, line) in parents {
            let parent_error = |kind: ErrorKind, message: String| {
                GtfsError::new(kind, message)
                    .with_field("parent_station")
                    .with_line(line)
                    .in_file(STOPS_FILE)
            };
            let parent = feed.stops().handle(&parent_id).ok_or_else(|| {
                parent_error(
                    ErrorKind::Reference,
                    format!("no stop with id '{}' defined, cannot reference here.", parent_id),
                )
            })?;
            if self.config.strict && feed.stops()[parent].location_type != LocationType::Station {
                return Err(parent_error(
                    ErrorKind::Validation,
                    format!(
                        "parent station '{}' must have location_type 'station' (1)",
                        parent_id
                    ),
                ));
            }
            feed.stops_mut()[child].parent_station = Some(parent);
        }
        Ok(())
    }

    fn load_routes(&self, source: &mut dyn FileSource, feed: &mut Feed) -> Result<()> {
        self.read_table(source, ROUTES_FILE, true, |row| {
            let id = row.string("route_id")?;
            let short_name = row.string_or("route_short_name", "");
            let long_name = row.string_or("route_long_name", "");
            if self.config.strict && short_name.is_empty() && long_name.is_empty() {
                return Err(row.error(
                    ErrorKind::MissingField,
                    "route_short_name",
                    "either route_short_name or route_long_name must be given",
                ));
            }

            let route = Route {
                id: CompactString::from(id),
                agency: resolve_optional(row, &feed.agencies, "agency_id", "agency")?,
                short_name: short_name.to_string(),
                long_name: long_name.to_string(),
                desc: row.string_or("route_desc", "").to_string(),
                route_type: row.route_type("route_type")?,
                url: row.url("route_url")?.to_string(),
                color: row.optional_hex_color("route_color")?,
                text_color: row.optional_hex_color("route_text_color")?,
                sort_order: row
                    .optional_ranged_integer("route_sort_order", 0, MAX_U32)?
                    .map(|order| order as u32),
                continuous_pickup: continuous(row, "continuous_pickup")?,
                continuous_drop_off: continuous(row, "continuous_drop_off")?,
            };
            feed.routes
                .add(route)
                .map_err(|route| duplicate_id(row, "route_id", &route.id))?;
            self.capture_extra(row, ROUTES_COLUMNS, id, &mut feed.route_extra);
            Ok(())
        })?;
        Ok(())
    }

    fn load_calendar(&self, source: &mut dyn FileSource, feed: &mut Feed) -> Result<()> {
        self.read_table(source, CALENDAR_FILE, false, |row| {
            let id = row.string("service_id")?;
            let mut flags = [false; 7];
            for (flag, column) in flags.iter_mut().zip(DAY_COLUMNS) {
                *flag = row.ranged_integer(column, 0, 1)? == 1;
            }
            let start_date = row.service_date("start_date")?;
            let end_date = row.service_date("end_date")?;
            if self.config.strict && end_date < start_date {
                return Err(row.error(
                    ErrorKind::Validation,
                    "end_date",
                    format!(
                        "end date '{}' lies before start date '{}'",
                        end_date, start_date
                    ),
                ));
            }

            let service =
                Service::with_calendar(id, ServiceDays::from_flags(flags), start_date, end_date);
            feed.services.add(service).map_err(|service| {
                row.error(
                    ErrorKind::DuplicateId,
                    "service_id",
                    format!(
                        "'service_id' must be unique in {}. Collision with id '{}'",
                        CALENDAR_FILE, service.id
                    ),
                )
            })?;
            Ok(())
        })?;
        Ok(())
    }

    fn load_calendar_dates(&self, source: &mut dyn FileSource, feed: &mut Feed) -> Result<()> {
        self.read_table(source, CALENDAR_DATES_FILE, false, |row| {
            let id = row.string("service_id")?;
            let date = row.service_date("date")?;
            let code = row.ranged_integer("exception_type", 1, 2)?;
            let exception = ExceptionType::from_code(code).unwrap_or(ExceptionType::Added);

            // Services only named here run on their exception dates alone.
            let handle = match feed.services.handle(id) {
                Some(handle) => handle,
                None => feed
                    .services
                    .add(Service::new(id))
                    .map_err(|service| duplicate_id(row, "service_id", &service.id))?,
            };
            let replaced = feed.services[handle].add_exception(date, exception);
            if replaced.is_some() && self.config.strict {
                return Err(row.error(
                    ErrorKind::DuplicateId,
                    "date",
                    format!(
                        "date '{}' is listed more than once for service '{}'",
                        date, id
                    ),
                ));
            }
            Ok(())
        })?;
        Ok(())
    }

    fn load_shapes(&self, source: &mut dyn FileSource, feed: &mut Feed) -> Result<()> {
        self.read_table(source, SHAPES_FILE, false, |row| {
            let id = row.string("shape_id")?;
            let lat = row.double("shape_pt_lat")?;
            let lon = row.double("shape_pt_lon")?;
            self.check_coordinates(row, ("shape_pt_lat", "shape_pt_lon"), lat, lon)?;
            let point = ShapePoint {
                lat,
                lon,
                sequence: row.ranged_integer("shape_pt_sequence", 0, MAX_U32)? as u32,
                dist_traveled: distance(row, "shape_dist_traveled")?,
            };

            let handle = match feed.shapes.handle(id) {
                Some(handle) => handle,
                None => feed
                    .shapes
                    .add(Shape::new(id))
                    .map_err(|shape| duplicate_id(row, "shape_id", &shape.id))?,
            };
            feed.shapes[handle].add_point(point).map_err(|_| {
                row.error(
                    ErrorKind::Sequence,
                    "shape_pt_sequence",
                    "shape_pt_sequence collision, shape_pt_sequence has to be increasing for a single shape.",
                )
            })?;
            Ok(())
        })?;
        Ok(())
    }

    fn load_trips(&self, source: &mut dyn FileSource, feed: &mut Feed) -> Result<()> {
        self.read_table(source, TRIPS_FILE, true, |row| {
            let id = row.string("trip_id")?;
            let route = resolve(row, &feed.routes, "route_id", "route")?;
            let service = resolve(row, &feed.services, "service_id", "service")?;

            let mut trip = Trip::new(id, route, service);
            trip.shape = resolve_optional(row, &feed.shapes, "shape_id", "shape")?;
            trip.headsign = row.string_or("trip_headsign", "").to_string();
            trip.short_name = row.string_or("trip_short_name", "").to_string();
            trip.direction = row.optional_code("direction_id", 0, 1, DirectionId::from_code)?;
            trip.block_id = row.string_or("block_id", "").to_string();
            trip.wheelchair_accessible = accessibility(row, "wheelchair_accessible")?;
            trip.bikes_allowed = accessibility(row, "bikes_allowed")?;

            feed.trips
                .add(trip)
                .map_err(|trip| duplicate_id(row, "trip_id", &trip.id))?;
            self.capture_extra(row, TRIPS_COLUMNS, id, &mut feed.trip_extra);
            Ok(())
        })?;
        Ok(())
    }

    fn load_stop_times(&self, source: &mut dyn FileSource, feed: &mut Feed) -> Result<()> {
        self.read_table(source, STOP_TIMES_FILE, true, |row| {
            let trip = resolve(row, &feed.trips, "trip_id", "trip")?;
            let stop = resolve(row, feed.stops(), "stop_id", "stop")?;
            let arrival = row.time("arrival_time")?;
            let departure = row.time("departure_time")?;
            // Empty cells take part as 00:00:00, the value they are written back as.
            if arrival > departure {
                return Err(row.error(
                    ErrorKind::Validation,
                    "departure_time",
                    format!(
                        "arrival time '{}' is later than departure time '{}'. \
                         You cannot depart earlier than you arrive.",
                        arrival, departure
                    ),
                ));
            }

            let sequence = row.ranged_integer("stop_sequence", 0, MAX_U32)? as u32;
            let mut stop_time = StopTime::new(stop, sequence, arrival, departure);
            stop_time.headsign = row.string_or("stop_headsign", "").to_string();
            stop_time.pickup_type = pickup_drop_off(row, "pickup_type")?;
            stop_time.drop_off_type = pickup_drop_off(row, "drop_off_type")?;
            stop_time.dist_traveled = distance(row, "shape_dist_traveled")?;
            stop_time.is_timepoint = row.flag_or("timepoint", true)?;
            stop_time.continuous_pickup = continuous(row, "continuous_pickup")?;
            stop_time.continuous_drop_off = continuous(row, "continuous_drop_off")?;

            feed.trips[trip].add_stop_time(stop_time).map_err(|_| {
                row.error(
                    ErrorKind::Sequence,
                    "stop_sequence",
                    "stop_sequence collision, stop_sequence has to be increasing for a single trip.",
                )
            })?;
            Ok(())
        })?;
        Ok(())
    }

    fn load_frequencies(&self, source: &mut dyn FileSource, feed: &mut Feed) -> Result<()> {
        self.read_table(source, FREQUENCIES_FILE, false, |row| {
            let trip = resolve(row, &feed.trips, "trip_id", "trip")?;
            row.string("start_time")?;
            row.string("end_time")?;
            let frequency = Frequency {
                start_time: row.time("start_time")?,
                end_time: row.time("end_time")?,
                headway_secs: row.ranged_integer("headway_secs", 0, MAX_U32)? as u32,
                exact_times: row.flag_or("exact_times", false)?,
            };
            if self.config.strict && frequency.end_time < frequency.start_time {
                return Err(row.error(
                    ErrorKind::Validation,
                    "end_time",
                    format!(
                        "end time '{}' is earlier than start time '{}'",
                        frequency.end_time, frequency.start_time
                    ),
                ));
            }
            feed.trips[trip].add_frequency(frequency);
            Ok(())
        })?;
        Ok(())
    }

    fn load_fare_attributes(&self, source: &mut dyn FileSource, feed: &mut Feed) -> Result<()> {
        self.read_table(source, FARE_ATTRIBUTES_FILE, false, |row| {
            let payment = row.ranged_integer("payment_method", 0, 1)?;
            let fare = Fare {
                id: CompactString::from(row.string("fare_id")?),
                price: row.double("price")?,
                currency_type: row.string("currency_type")?.to_string(),
                payment_method: PaymentMethod::from_code(payment).unwrap_or_default(),
                transfers: row
                    .optional_ranged_integer("transfers", 0, 2)?
                    .map(|count| count as u8),
                agency: resolve_optional(row, &feed.agencies, "agency_id", "agency")?,
                transfer_duration: row
                    .optional_ranged_integer("transfer_duration", 0, MAX_U32)?
                    .map(|secs| secs as u32),
                rules: Vec::new(),
            };
            if self.config.strict && fare.price < 0.0 {
                return Err(row.error(
                    ErrorKind::Range,
                    "price",
                    format!("negative fare price ({})", fare.price),
                ));
            }
            feed.fares
                .add(fare)
                .map_err(|fare| duplicate_id(row, "fare_id", &fare.id))?;
            Ok(())
        })?;
        Ok(())
    }

    fn load_fare_rules(&self, source: &mut dyn FileSource, feed: &mut Feed) -> Result<()> {
        self.read_table(source, FARE_RULES_FILE, false, |row| {
            let fare = resolve(row, &feed.fares, "fare_id", "fare")?;
            let rule = FareRule {
                route: resolve_optional(row, &feed.routes, "route_id", "route")?,
                origin_id: self.zone(row, feed, "origin_id")?,
                destination_id: self.zone(row, feed, "destination_id")?,
                contains_id: self.zone(row, feed, "contains_id")?,
            };
            feed.fares[fare].rules.push(rule);
            Ok(())
        })?;
        Ok(())
    }

    fn zone(&self, row: &FieldAccessor<'_>, feed: &Feed, field: &str) -> Result<String> {
        let zone = row.string_or(field, "");
        if self.config.strict && !zone.is_empty() && !feed.zones().contains(zone) {
            return Err(missing_reference(row, field, "zone", zone));
        }
        Ok(zone.to_string())
    }

    fn load_transfers(&self, source: &mut dyn FileSource, feed: &mut Feed) -> Result<()> {
        self.read_table(source, TRANSFERS_FILE, false, |row| {
            let transfer = Transfer {
                from_stop: resolve_optional(row, feed.stops(), "from_stop_id", "stop")?,
                to_stop: resolve_optional(row, feed.stops(), "to_stop_id", "stop")?,
                from_route: resolve_optional(row, &feed.routes, "from_route_id", "route")?,
                to_route: resolve_optional(row, &feed.routes, "to_route_id", "route")?,
                from_trip: resolve_optional(row, &feed.trips, "from_trip_id", "trip")?,
                to_trip: resolve_optional(row, &feed.trips, "to_trip_id", "trip")?,
                transfer_type: row.code_or(
                    "transfer_type",
                    0,
                    5,
                    TransferType::Recommended,
                    TransferType::from_code,
                )?,
                min_transfer_time: row
                    .optional_ranged_integer("min_transfer_time", 0, MAX_U32)?
                    .map(|secs| secs as u32),
            };
            feed.transfers.push(transfer);
            Ok(())
        })?;
        Ok(())
    }

    fn load_pathways(&self, source: &mut dyn FileSource, feed: &mut Feed) -> Result<()> {
        self.read_table(source, PATHWAYS_FILE, false, |row| {
            let id = row.string("pathway_id")?;
            let from_stop = resolve(row, feed.stops(), "from_stop_id", "stop")?;
            let to_stop = resolve(row, feed.stops(), "to_stop_id", "stop")?;
            let mode = row.ranged_integer("pathway_mode", 1, 7)?;

            let mut pathway = Pathway::new(
                id,
                from_stop,
                to_stop,
                PathwayMode::from_code(mode).unwrap_or_default(),
            );
            pathway.is_bidirectional = row.ranged_integer("is_bidirectional", 0, 1)? == 1;
            pathway.length = self.measure(row, "length")?;
            pathway.traversal_time = row
                .optional_ranged_integer("traversal_time", 0, MAX_U32)?
                .map(|secs| secs as u32);
            pathway.stair_count = row
                .optional_ranged_integer("stair_count", i32::MIN as i64, i32::MAX as i64)?
                .map(|count| count as i32);
            pathway.max_slope = row.optional_double("max_slope")?;
            pathway.min_width = self.measure(row, "min_width")?;
            pathway.signposted_as = row.string_or("signposted_as", "").to_string();
            pathway.reversed_signposted_as =
                row.string_or("reversed_signposted_as", "").to_string();

            feed.pathways
                .add(pathway)
                .map_err(|pathway| duplicate_id(row, "pathway_id", &pathway.id))?;
            Ok(())
        })?;
        Ok(())
    }

    fn measure(&self, row: &FieldAccessor<'_>, field: &str) -> Result<Option<f64>> {
        let value = row.optional_double(field)?;
        match value {
            Some(measure) if self.config.strict && measure < 0.0 => Err(row.error(
                ErrorKind::Range,
                field,
                format!("expected a non-negative value, found {}", measure),
            )),
            _ => Ok(value),
        }
    }

    fn load_feed_info(&self, source: &mut dyn FileSource, feed: &mut Feed) -> Result<()> {
        let mut seen = false;
        self.read_table(source, FEED_INFO_FILE, false, |row| {
            if seen {
                return Ok(());
            }
            seen = true;
            feed.info = FeedInfo {
                publisher_name: row.string("feed_publisher_name")?.to_string(),
                publisher_url: row.required_url("feed_publisher_url")?.to_string(),
                lang: row.string_or("feed_lang", "").to_string(),
                start_date: row.optional_service_date("feed_start_date")?,
                end_date: row.optional_service_date("feed_end_date")?,
                version: row.string_or("feed_version", "").to_string(),
                contact_email: row.string_or("feed_contact_email", "").to_string(),
                contact_url: row.url("feed_contact_url")?.to_string(),
                default_lang: row.string_or("default_lang", "").to_string(),
            };
            Ok(())
        })?;
        Ok(())
    }

    fn load_attributions(&self, source: &mut dyn FileSource, feed: &mut Feed) -> Result<()> {
        self.read_table(source, ATTRIBUTIONS_FILE, false, |row| {
            let attribution = Attribution {
                id: CompactString::from(row.string_or("attribution_id", "")),
                agency: resolve_optional(row, &feed.agencies, "agency_id", "agency")?,
                route: resolve_optional(row, &feed.routes, "route_id", "route")?,
                trip: resolve_optional(row, &feed.trips, "trip_id", "trip")?,
                organization_name: row.string("organization_name")?.to_string(),
                is_producer: row.flag_or("is_producer", false)?,
                is_operator: row.flag_or("is_operator", false)?,
                is_authority: row.flag_or("is_authority", false)?,
                url: row.url("attribution_url")?.to_string(),
                email: row.string_or("attribution_email", "").to_string(),
                phone: row.string_or("attribution_phone", "").to_string(),
            };
            feed.attributions.push(attribution);
            Ok(())
        })?;
        Ok(())
    }
}

impl Default for Parser<'_> {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

fn duplicate_id(row: &FieldAccessor<'_>, field: &str, id: &str) -> GtfsError {
    row.error(
        ErrorKind::DuplicateId,
        field,
        format!(
            "'{}' must be dataset unique. Collision with id '{}'",
            field, id
        ),
    )
}

fn missing_reference(row: &FieldAccessor<'_>, field: &str, entity: &str, id: &str) -> GtfsError {
    row.error(
        ErrorKind::Reference,
        field,
        format!("no {} with id '{}' defined, cannot reference here.", entity, id),
    )
}

fn resolve<T: Keyed>(
    row: &FieldAccessor<'_>,
    container: &Container<T>,
    field: &str,
    entity: &str,
) -> Result<EntityRef<T>> {
    let id = row.string(field)?;
    container
        .handle(id)
        .ok_or_else(|| missing_reference(row, field, entity, id))
}

fn resolve_optional<T: Keyed>(
    row: &FieldAccessor<'_>,
    container: &Container<T>,
    field: &str,
    entity: &str,
) -> Result<Option<EntityRef<T>>> {
    if row.is_empty(field) {
        return Ok(None);
    }
    resolve(row, container, field, entity).map(Some)
}

/// A distance along a shape; tiny negative values from rounding are clamped to zero.
fn distance(row: &FieldAccessor<'_>, field: &str) -> Result<Option<f64>> {
    match row.optional_double(field)? {
        Some(value) if value < -0.01 => Err(row.error(
            ErrorKind::Range,
            field,
            format!(
                "negative values not supported for distances (value was: {})",
                value
            ),
        )),
        Some(value) => Ok(Some(value.max(0.0))),
        None => Ok(None),
    }
}

fn continuous(row: &FieldAccessor<'_>, field: &str) -> Result<ContinuousPickupDropOff> {
    row.code_or(
        field,
        0,
        3,
        ContinuousPickupDropOff::NoContinuous,
        ContinuousPickupDropOff::from_code,
    )
}

fn pickup_drop_off(row: &FieldAccessor<'_>, field: &str) -> Result<PickupDropOffType> {
    row.code_or(
        field,
        0,
        3,
        PickupDropOffType::Regular,
        PickupDropOffType::from_code,
    )
}

fn accessibility(row: &FieldAccessor<'_>, field: &str) -> Result<Accessibility> {
    row.code_or(
        field,
        0,
        2,
        Accessibility::NoInformation,
        Accessibility::from_code,
    )
}
