use std::collections::BTreeMap;

use compact_str::CompactString;

use crate::codes::{
    Accessibility, ContinuousPickupDropOff, DirectionId, ExceptionType, LocationType,
    PathwayMode, PaymentMethod, PickupDropOffType, TransferType,
};
use crate::container::{EntityRef, Keyed};
use crate::route_type::RouteType;
use crate::{GtfsColor, GtfsTime, ServiceDate, ServiceDays};

pub type AgencyRef = EntityRef<Agency>;
pub type StopRef = EntityRef<Stop>;
pub type RouteRef = EntityRef<Route>;
pub type ServiceRef = EntityRef<Service>;
pub type ShapeRef = EntityRef<Shape>;
pub type TripRef = EntityRef<Trip>;
pub type FareRef = EntityRef<Fare>;
pub type LevelRef = EntityRef<Level>;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Agency {
    /// Empty for the single anonymous agency of a feed without `agency_id`.
    pub id: CompactString,
    pub name: String,
    pub url: String,
    pub timezone: String,
    pub lang: String,
    pub phone: String,
    pub fare_url: String,
    pub email: String,
}

impl Agency {
    pub fn new(id: impl Into<CompactString>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stop {
    pub id: CompactString,
    pub code: String,
    pub name: String,
    pub desc: String,
    pub lat: f64,
    pub lon: f64,
    pub zone_id: String,
    pub url: String,
    pub location_type: LocationType,
    pub parent_station: Option<StopRef>,
    pub timezone: String,
    pub wheelchair_boarding: Accessibility,
    pub platform_code: String,
    pub level: Option<LevelRef>,
}

impl Stop {
    pub fn new(id: impl Into<CompactString>, name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lat,
            lon,
            ..Default::default()
        }
    }

    pub fn has_valid_coordinates(&self) -> bool {
        self.lat.abs() <= 90.0 && self.lon.abs() <= 180.0
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Route {
    pub id: CompactString,
    pub agency: Option<AgencyRef>,
    pub short_name: String,
    pub long_name: String,
    pub desc: String,
    pub route_type: RouteType,
    pub url: String,
    pub color: Option<GtfsColor>,
    pub text_color: Option<GtfsColor>,
    pub sort_order: Option<u32>,
    pub continuous_pickup: ContinuousPickupDropOff,
    pub continuous_drop_off: ContinuousPickupDropOff,
}

impl Route {
    pub fn new(id: impl Into<CompactString>, route_type: RouteType) -> Self {
        Self {
            id: id.into(),
            route_type,
            ..Default::default()
        }
    }

    pub fn effective_color(&self) -> GtfsColor {
        self.color.unwrap_or(GtfsColor::WHITE)
    }

    pub fn effective_text_color(&self) -> GtfsColor {
        self.text_color.unwrap_or(GtfsColor::BLACK)
    }
}

/// Operating calendar: a weekly pattern within a date range, refined by
/// per-date exceptions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Service {
    pub id: CompactString,
    pub days: ServiceDays,
    pub start_date: Option<ServiceDate>,
    pub end_date: Option<ServiceDate>,
    exceptions: BTreeMap<ServiceDate, ExceptionType>,
}

impl Service {
    /// A service defined only through calendar exceptions.
    pub fn new(id: impl Into<CompactString>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_calendar(
        id: impl Into<CompactString>,
        days: ServiceDays,
        start_date: ServiceDate,
        end_date: ServiceDate,
    ) -> Self {
        Self {
            id: id.into(),
            days,
            start_date: Some(start_date),
            end_date: Some(end_date),
            exceptions: BTreeMap::new(),
        }
    }

    /// Records an exception, returning the one it replaced.
    pub fn add_exception(
        &mut self,
        date: ServiceDate,
        exception: ExceptionType,
    ) -> Option<ExceptionType> {
        self.exceptions.insert(date, exception)
    }

    pub fn exceptions(&self) -> &BTreeMap<ServiceDate, ExceptionType> {
        &self.exceptions
    }

    pub fn exception_on(&self, date: ServiceDate) -> Option<ExceptionType> {
        self.exceptions.get(&date).copied()
    }

    pub fn has_service_days(&self) -> bool {
        !self.days.is_empty()
    }

    pub fn is_active_on(&self, date: ServiceDate) -> bool {
        match self.exception_on(date) {
            Some(ExceptionType::Added) => return true,
            Some(ExceptionType::Removed) => return false,
            None => {}
        }
        let Some(weekday) = date.weekday() else {
            return false;
        };
        if !self.days.runs_on(weekday) {
            return false;
        }
        let after_start = self.start_date.map_or(true, |start| date >= start);
        let before_end = self.end_date.map_or(true, |end| date <= end);
        after_start && before_end
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapePoint {
    pub lat: f64,
    pub lon: f64,
    pub sequence: u32,
    pub dist_traveled: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Shape {
    pub id: CompactString,
    points: Vec<ShapePoint>,
}

impl Shape {
    pub fn new(id: impl Into<CompactString>) -> Self {
        Self {
            id: id.into(),
            points: Vec::new(),
        }
    }

    /// Appends a point. Sequence numbers must be strictly increasing; an
    /// out-of-order point is handed back.
    pub fn add_point(&mut self, point: ShapePoint) -> Result<(), ShapePoint> {
        if let Some(last) = self.points.last() {
            if point.sequence <= last.sequence {
                return Err(point);
            }
        }
        self.points.push(point);
        Ok(())
    }

    pub fn points(&self) -> &[ShapePoint] {
        &self.points
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StopTime {
    pub arrival_time: GtfsTime,
    pub departure_time: GtfsTime,
    pub stop: StopRef,
    pub sequence: u32,
    pub headsign: String,
    pub pickup_type: PickupDropOffType,
    pub drop_off_type: PickupDropOffType,
    pub dist_traveled: Option<f64>,
    pub is_timepoint: bool,
    pub continuous_pickup: ContinuousPickupDropOff,
    pub continuous_drop_off: ContinuousPickupDropOff,
}

impl StopTime {
    pub fn new(stop: StopRef, sequence: u32, arrival_time: GtfsTime, departure_time: GtfsTime) -> Self {
        Self {
            arrival_time,
            departure_time,
            stop,
            sequence,
            headsign: String::new(),
            pickup_type: PickupDropOffType::Regular,
            drop_off_type: PickupDropOffType::Regular,
            dist_traveled: None,
            is_timepoint: true,
            continuous_pickup: ContinuousPickupDropOff::NoContinuous,
            continuous_drop_off: ContinuousPickupDropOff::NoContinuous,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frequency {
    pub start_time: GtfsTime,
    pub end_time: GtfsTime,
    pub headway_secs: u32,
    pub exact_times: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub id: CompactString,
    pub route: RouteRef,
    pub service: ServiceRef,
    pub shape: Option<ShapeRef>,
    pub headsign: String,
    pub short_name: String,
    pub direction: Option<DirectionId>,
    pub block_id: String,
    pub wheelchair_accessible: Accessibility,
    pub bikes_allowed: Accessibility,
    stop_times: Vec<StopTime>,
    frequencies: Vec<Frequency>,
}

impl Trip {
    pub fn new(id: impl Into<CompactString>, route: RouteRef, service: ServiceRef) -> Self {
        Self {
            id: id.into(),
            route,
            service,
            shape: None,
            headsign: String::new(),
            short_name: String::new(),
            direction: None,
            block_id: String::new(),
            wheelchair_accessible: Accessibility::NoInformation,
            bikes_allowed: Accessibility::NoInformation,
            stop_times: Vec::new(),
            frequencies: Vec::new(),
        }
    }

    /// Appends a stop time. Sequence numbers must be strictly increasing; an
    /// out-of-order stop time is handed back.
    pub fn add_stop_time(&mut self, stop_time: StopTime) -> Result<(), StopTime> {
        if let Some(last) = self.stop_times.last() {
            if stop_time.sequence <= last.sequence {
                return Err(stop_time);
            }
        }
        self.stop_times.push(stop_time);
        Ok(())
    }

    pub fn stop_times(&self) -> &[StopTime] {
        &self.stop_times
    }

    pub fn add_frequency(&mut self, frequency: Frequency) {
        self.frequencies.push(frequency);
    }

    pub fn frequencies(&self) -> &[Frequency] {
        &self.frequencies
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FareRule {
    pub route: Option<RouteRef>,
    pub origin_id: String,
    pub destination_id: String,
    pub contains_id: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fare {
    pub id: CompactString,
    pub price: f64,
    pub currency_type: String,
    pub payment_method: PaymentMethod,
    /// `None` means unlimited transfers.
    pub transfers: Option<u8>,
    pub agency: Option<AgencyRef>,
    pub transfer_duration: Option<u32>,
    pub rules: Vec<FareRule>,
}

impl Fare {
    pub fn new(id: impl Into<CompactString>, price: f64, currency_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            price,
            currency_type: currency_type.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Transfer {
    pub from_stop: Option<StopRef>,
    pub to_stop: Option<StopRef>,
    pub from_route: Option<RouteRef>,
    pub to_route: Option<RouteRef>,
    pub from_trip: Option<TripRef>,
    pub to_trip: Option<TripRef>,
    pub transfer_type: TransferType,
    pub min_transfer_time: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Level {
    pub id: CompactString,
    pub index: f64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pathway {
    pub id: CompactString,
    pub from_stop: StopRef,
    pub to_stop: StopRef,
    pub mode: PathwayMode,
    pub is_bidirectional: bool,
    pub length: Option<f64>,
    pub traversal_time: Option<u32>,
    pub stair_count: Option<i32>,
    pub max_slope: Option<f64>,
    pub min_width: Option<f64>,
    pub signposted_as: String,
    pub reversed_signposted_as: String,
}

impl Pathway {
    pub fn new(
        id: impl Into<CompactString>,
        from_stop: StopRef,
        to_stop: StopRef,
        mode: PathwayMode,
    ) -> Self {
        Self {
            id: id.into(),
            from_stop,
            to_stop,
            mode,
            is_bidirectional: false,
            length: None,
            traversal_time: None,
            stair_count: None,
            max_slope: None,
            min_width: None,
            signposted_as: String::new(),
            reversed_signposted_as: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Attribution {
    pub id: CompactString,
    pub agency: Option<AgencyRef>,
    pub route: Option<RouteRef>,
    pub trip: Option<TripRef>,
    pub organization_name: String,
    pub is_producer: bool,
    pub is_operator: bool,
    pub is_authority: bool,
    pub url: String,
    pub email: String,
    pub phone: String,
}

macro_rules! keyed_by_id {
    ($($entity:ty),+ $(,)?) => {
        $(
            impl Keyed for $entity {
                fn id(&self) -> &str {
                    &self.id
                }
            }
        )+
    };
}

keyed_by_id!(Agency, Stop, Route, Service, Shape, Trip, Fare, Level, Pathway);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;

    fn trip_with_refs() -> Trip {
        let mut routes = Container::new();
        let route = routes.add(Route::new("R1", RouteType::BUS)).unwrap();
        let mut services = Container::new();
        let service = services.add(Service::new("SVC1")).unwrap();
        Trip::new("T1", route, service)
    }

    fn stop_time(stop: StopRef, sequence: u32) -> StopTime {
        StopTime::new(
            stop,
            sequence,
            GtfsTime::new(8, 0, 0),
            GtfsTime::new(8, 0, 0),
        )
    }

    #[test]
    fn stop_times_must_strictly_increase() {
        let mut stops = Container::new();
        let stop = stops.add(Stop::new("S1", "Main", 48.0, 7.8)).unwrap();
        let mut trip = trip_with_refs();

        assert!(trip.add_stop_time(stop_time(stop, 1)).is_ok());
        assert!(trip.add_stop_time(stop_time(stop, 2)).is_ok());
        let rejected = trip.add_stop_time(stop_time(stop, 2)).unwrap_err();
        assert_eq!(rejected.sequence, 2);
        assert_eq!(trip.stop_times().len(), 2);

        assert!(trip.add_stop_time(stop_time(stop, 3)).is_ok());
        let sequences: Vec<u32> = trip.stop_times().iter().map(|st| st.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[test]
    fn shape_points_must_strictly_increase() {
        let mut shape = Shape::new("SH1");
        let point = |sequence| ShapePoint {
            lat: 48.0,
            lon: 7.8,
            sequence,
            dist_traveled: None,
        };
        assert!(shape.add_point(point(5)).is_ok());
        assert!(shape.add_point(point(3)).is_err());
        assert!(shape.add_point(point(5)).is_err());
        assert!(shape.add_point(point(6)).is_ok());
        assert_eq!(shape.points().len(), 2);
    }

    #[test]
    fn service_activity_combines_pattern_and_exceptions() {
        let mut service = Service::with_calendar(
            "SVC1",
            ServiceDays::WEEKDAYS,
            ServiceDate::new(2024, 1, 1),
            ServiceDate::new(2024, 12, 31),
        );
        // 2024-01-01 is a Monday, 2024-01-06 a Saturday.
        assert!(service.is_active_on(ServiceDate::new(2024, 1, 1)));
        assert!(!service.is_active_on(ServiceDate::new(2024, 1, 6)));
        assert!(!service.is_active_on(ServiceDate::new(2025, 1, 6)));

        service.add_exception(ServiceDate::new(2024, 1, 1), ExceptionType::Removed);
        service.add_exception(ServiceDate::new(2024, 1, 6), ExceptionType::Added);
        assert!(!service.is_active_on(ServiceDate::new(2024, 1, 1)));
        assert!(service.is_active_on(ServiceDate::new(2024, 1, 6)));
        assert_eq!(
            service.exception_on(ServiceDate::new(2024, 1, 6)),
            Some(ExceptionType::Added)
        );
    }

    #[test]
    fn exception_only_service_has_no_weekly_days() {
        let mut service = Service::new("HOLIDAY");
        assert!(!service.has_service_days());
        assert_eq!(
            service.add_exception(ServiceDate::new(2024, 12, 25), ExceptionType::Added),
            None
        );
        assert_eq!(
            service.add_exception(ServiceDate::new(2024, 12, 25), ExceptionType::Removed),
            Some(ExceptionType::Added)
        );
        assert!(!service.is_active_on(ServiceDate::new(2024, 12, 25)));
        assert!(!service.is_active_on(ServiceDate::new(2024, 12, 26)));
    }

    #[test]
    fn route_colors_fall_back_to_defaults() {
        let mut route = Route::new("R1", RouteType::BUS);
        assert_eq!(route.effective_color(), GtfsColor::WHITE);
        assert_eq!(route.effective_text_color(), GtfsColor::BLACK);
        route.color = Some(GtfsColor::new(0x12, 0x34, 0x56));
        assert_eq!(route.effective_color().to_string(), "123456");
    }
}
