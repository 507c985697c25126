//! Small enumerations stored as integer codes in GTFS files.

macro_rules! code_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $code:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn from_code(code: i64) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)+
                    _ => None,
                }
            }

            pub fn code(self) -> u8 {
                match self {
                    $(Self::$variant => $code,)+
                }
            }
        }
    };
}

code_enum! {
    /// `stops.location_type`
    LocationType {
        Stop = 0,
        Station = 1,
        StationEntrance = 2,
    }
}

code_enum! {
    /// Shared by `wheelchair_boarding`, `wheelchair_accessible` and `bikes_allowed`.
    Accessibility {
        NoInformation = 0,
        Possible = 1,
        NotPossible = 2,
    }
}

code_enum! {
    DirectionId {
        Outbound = 0,
        Inbound = 1,
    }
}

code_enum! {
    /// `stop_times.pickup_type` and `stop_times.drop_off_type`
    PickupDropOffType {
        Regular = 0,
        NotAvailable = 1,
        MustPhone = 2,
        MustCoordinateWithDriver = 3,
    }
}

code_enum! {
    /// `continuous_pickup` and `continuous_drop_off` on routes and stop times.
    ContinuousPickupDropOff {
        Continuous = 0,
        NoContinuous = 1,
        MustPhone = 2,
        MustCoordinateWithDriver = 3,
    }
}

code_enum! {
    ExceptionType {
        Added = 1,
        Removed = 2,
    }
}

code_enum! {
    PaymentMethod {
        OnBoard = 0,
        BeforeBoarding = 1,
    }
}

code_enum! {
    TransferType {
        Recommended = 0,
        Timed = 1,
        MinimumTime = 2,
        NotPossible = 3,
        InSeat = 4,
        NoInSeat = 5,
    }
}

code_enum! {
    PathwayMode {
        Walkway = 1,
        Stairs = 2,
        MovingSidewalk = 3,
        Escalator = 4,
        Elevator = 5,
        FareGate = 6,
        ExitGate = 7,
    }
}

impl Default for LocationType {
    fn default() -> Self {
        Self::Stop
    }
}

impl Default for Accessibility {
    fn default() -> Self {
        Self::NoInformation
    }
}

impl Default for PickupDropOffType {
    fn default() -> Self {
        Self::Regular
    }
}

impl Default for ContinuousPickupDropOff {
    fn default() -> Self {
        Self::NoContinuous
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        Self::OnBoard
    }
}

impl Default for TransferType {
    fn default() -> Self {
        Self::Recommended
    }
}

impl Default for PathwayMode {
    fn default() -> Self {
        Self::Walkway
    }
}
