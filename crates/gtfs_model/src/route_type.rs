use std::fmt;

use crate::GtfsParseError;

/// Canonical vehicle category a route type code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RouteCategory {
    Tram,
    Subway,
    Rail,
    Bus,
    Ferry,
    CableCar,
    Gondola,
    Funicular,
    Coach,
    Trolleybus,
    Monorail,
}

impl RouteCategory {
    pub const ALL: [RouteCategory; 11] = [
        RouteCategory::Tram,
        RouteCategory::Subway,
        RouteCategory::Rail,
        RouteCategory::Bus,
        RouteCategory::Ferry,
        RouteCategory::CableCar,
        RouteCategory::Gondola,
        RouteCategory::Funicular,
        RouteCategory::Coach,
        RouteCategory::Trolleybus,
        RouteCategory::Monorail,
    ];

    /// The basic GTFS code for this category.
    pub fn base_code(self) -> u16 {
        match self {
            RouteCategory::Tram => 0,
            RouteCategory::Subway => 1,
            RouteCategory::Rail => 2,
            RouteCategory::Bus => 3,
            RouteCategory::Ferry => 4,
            RouteCategory::CableCar => 5,
            RouteCategory::Gondola => 6,
            RouteCategory::Funicular => 7,
            RouteCategory::Coach => 200,
            RouteCategory::Trolleybus => 11,
            RouteCategory::Monorail => 12,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RouteCategory::Tram => "tram",
            RouteCategory::Subway => "subway",
            RouteCategory::Rail => "rail",
            RouteCategory::Bus => "bus",
            RouteCategory::Ferry => "ferry",
            RouteCategory::CableCar => "cablecar",
            RouteCategory::Gondola => "gondola",
            RouteCategory::Funicular => "funicular",
            RouteCategory::Coach => "coach",
            RouteCategory::Trolleybus => "trolleybus",
            RouteCategory::Monorail => "monorail",
        }
    }

    /// Every code, basic or extended, that maps onto this category.
    pub fn codes(self) -> impl Iterator<Item = u16> {
        TAXONOMY
            .iter()
            .filter(move |(category, _, _)| *category == self)
            .flat_map(|(_, from, to)| *from..=*to)
    }

    /// Resolves a category by name, accepting the usual synonyms
    /// (`streetcar`, `metro`, `boat`, `trolley`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        let lowered = name.trim().to_ascii_lowercase();
        NAME_SYNONYMS
            .iter()
            .find(|(synonym, _)| *synonym == lowered)
            .map(|(_, category)| *category)
    }
}

impl fmt::Display for RouteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inclusive code ranges per category, covering the basic GTFS codes and the
/// extended hierarchical vehicle types.
const TAXONOMY: &[(RouteCategory, u16, u16)] = &[
    (RouteCategory::Tram, 0, 0),
    (RouteCategory::Tram, 900, 906),
    (RouteCategory::Subway, 1, 1),
    (RouteCategory::Subway, 401, 402),
    (RouteCategory::Subway, 500, 500),
    (RouteCategory::Subway, 600, 600),
    (RouteCategory::Rail, 2, 2),
    (RouteCategory::Rail, 100, 115),
    (RouteCategory::Rail, 117, 117),
    (RouteCategory::Rail, 300, 300),
    (RouteCategory::Rail, 400, 400),
    (RouteCategory::Rail, 403, 404),
    (RouteCategory::Rail, 1503, 1503),
    (RouteCategory::Bus, 3, 3),
    (RouteCategory::Bus, 700, 717),
    (RouteCategory::Bus, 1500, 1501),
    (RouteCategory::Bus, 1505, 1507),
    (RouteCategory::Ferry, 4, 4),
    (RouteCategory::Ferry, 1000, 1021),
    (RouteCategory::Ferry, 1200, 1200),
    (RouteCategory::Ferry, 1502, 1502),
    (RouteCategory::CableCar, 5, 5),
    (RouteCategory::Gondola, 6, 6),
    (RouteCategory::Gondola, 1101, 1114),
    (RouteCategory::Gondola, 1300, 1301),
    (RouteCategory::Gondola, 1304, 1307),
    (RouteCategory::Funicular, 7, 7),
    (RouteCategory::Funicular, 116, 116),
    (RouteCategory::Funicular, 1302, 1303),
    (RouteCategory::Funicular, 1400, 1400),
    (RouteCategory::Coach, 200, 209),
    (RouteCategory::Trolleybus, 11, 11),
    (RouteCategory::Trolleybus, 800, 800),
    (RouteCategory::Monorail, 12, 12),
    (RouteCategory::Monorail, 405, 405),
];

const NAME_SYNONYMS: &[(&str, RouteCategory)] = &[
    ("tram", RouteCategory::Tram),
    ("streetcar", RouteCategory::Tram),
    ("light_rail", RouteCategory::Tram),
    ("lightrail", RouteCategory::Tram),
    ("light-rail", RouteCategory::Tram),
    ("subway", RouteCategory::Subway),
    ("metro", RouteCategory::Subway),
    ("rail", RouteCategory::Rail),
    ("train", RouteCategory::Rail),
    ("bus", RouteCategory::Bus),
    ("ferry", RouteCategory::Ferry),
    ("boat", RouteCategory::Ferry),
    ("ship", RouteCategory::Ferry),
    ("cablecar", RouteCategory::CableCar),
    ("cable_car", RouteCategory::CableCar),
    ("cable-car", RouteCategory::CableCar),
    ("gondola", RouteCategory::Gondola),
    ("funicular", RouteCategory::Funicular),
    ("coach", RouteCategory::Coach),
    ("trolleybus", RouteCategory::Trolleybus),
    ("trolley-bus", RouteCategory::Trolleybus),
    ("trolley", RouteCategory::Trolleybus),
    ("monorail", RouteCategory::Monorail),
    ("mono-rail", RouteCategory::Monorail),
];

/// A validated `route_type` value.
///
/// The raw code is kept so that extended types survive a parse/write cycle;
/// [`RouteType::category`] gives the canonical category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteType {
    code: u16,
    category: RouteCategory,
}

impl RouteType {
    pub const TRAM: RouteType = RouteType::basic(RouteCategory::Tram, 0);
    pub const SUBWAY: RouteType = RouteType::basic(RouteCategory::Subway, 1);
    pub const RAIL: RouteType = RouteType::basic(RouteCategory::Rail, 2);
    pub const BUS: RouteType = RouteType::basic(RouteCategory::Bus, 3);
    pub const FERRY: RouteType = RouteType::basic(RouteCategory::Ferry, 4);
    pub const CABLE_CAR: RouteType = RouteType::basic(RouteCategory::CableCar, 5);
    pub const GONDOLA: RouteType = RouteType::basic(RouteCategory::Gondola, 6);
    pub const FUNICULAR: RouteType = RouteType::basic(RouteCategory::Funicular, 7);
    pub const COACH: RouteType = RouteType::basic(RouteCategory::Coach, 200);
    pub const TROLLEYBUS: RouteType = RouteType::basic(RouteCategory::Trolleybus, 11);
    pub const MONORAIL: RouteType = RouteType::basic(RouteCategory::Monorail, 12);

    const fn basic(category: RouteCategory, code: u16) -> Self {
        Self { code, category }
    }

    pub fn from_code(code: i64) -> Result<Self, GtfsParseError> {
        let unsupported = || GtfsParseError::UnsupportedRouteType(code);
        let narrow = u16::try_from(code).map_err(|_| unsupported())?;
        TAXONOMY
            .iter()
            .find(|(_, from, to)| (*from..=*to).contains(&narrow))
            .map(|(category, _, _)| Self {
                code: narrow,
                category: *category,
            })
            .ok_or_else(unsupported)
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn category(&self) -> RouteCategory {
        self.category
    }

    /// Resolves a user-facing name to the set of matching route types.
    ///
    /// `all` yields one type per category, a category name or synonym yields
    /// that category, and a numeric string yields the route type with that code.
    pub fn types_from_name(name: &str) -> Vec<RouteType> {
        let trimmed = name.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return RouteCategory::ALL
                .iter()
                .map(|category| Self::for_category(*category))
                .collect();
        }
        if let Some(category) = RouteCategory::from_name(trimmed) {
            return vec![Self::for_category(category)];
        }
        trimmed
            .parse::<i64>()
            .ok()
            .and_then(|code| Self::from_code(code).ok())
            .into_iter()
            .collect()
    }

    pub fn for_category(category: RouteCategory) -> Self {
        Self::basic(category, category.base_code())
    }
}

impl Default for RouteType {
    fn default() -> Self {
        Self::BUS
    }
}

impl fmt::Display for RouteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}
