#![no_main]
use gtfs_kit_model::{GtfsColor, GtfsTime, RouteType, ServiceDate};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(time) = GtfsTime::parse(text) {
        assert_eq!(GtfsTime::parse(&time.to_string()), Ok(time));
    }
    let _ = GtfsTime::parse_strict(text);

    if let Ok(date) = ServiceDate::parse_checked(text) {
        assert!(date.to_naive_date().is_some());
    }
    let _ = ServiceDate::parse(text).map(|date| date.weekday());

    if let Ok(color) = GtfsColor::parse(text) {
        assert_eq!(GtfsColor::parse(&color.to_string()), Ok(color));
    }
    let _ = RouteType::types_from_name(text);
});
