use std::fmt;

use serde::Serialize;

/// Flight phase of one aircraft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlightPhase {
    #[default]
    Predeparture,
    OriginGate,
    RampDeparting,
    TaxiDeparting,
    Takeoff,
    Climbout,
    ClimbToCruiseAltitude,
    Cruise,
    InitialDescent,
    Approach,
    FinalApproach,
    Land,
    TaxiArriving,
    RampArriving,
}

impl FlightPhase {
    pub const ALL: [FlightPhase; 14] = [
        Self::Predeparture,
        Self::OriginGate,
        Self::RampDeparting,
        Self::TaxiDeparting,
        Self::Takeoff,
        Self::Climbout,
        Self::ClimbToCruiseAltitude,
        Self::Cruise,
        Self::InitialDescent,
        Self::Approach,
        Self::FinalApproach,
        Self::Land,
        Self::TaxiArriving,
        Self::RampArriving,
    ];

    /// Moving on the airport surface, including the landing roll.
    pub fn is_surface(self) -> bool {
        matches!(
            self,
            Self::OriginGate
                | Self::RampDeparting
                | Self::TaxiDeparting
                | Self::Land
                | Self::TaxiArriving
                | Self::RampArriving
        )
    }

    pub fn is_airborne(self) -> bool {
        matches!(
            self,
            Self::Takeoff
                | Self::Climbout
                | Self::ClimbToCruiseAltitude
                | Self::Cruise
                | Self::InitialDescent
                | Self::Approach
                | Self::FinalApproach
        )
    }

    pub fn is_climbing(self) -> bool {
        matches!(self, Self::Takeoff | Self::Climbout | Self::ClimbToCruiseAltitude)
    }

    pub fn is_descending(self) -> bool {
        matches!(self, Self::InitialDescent | Self::Approach | Self::FinalApproach)
    }

    /// Surface phases flown at ramp speed instead of taxi speed.
    pub fn uses_ramp_speed(self) -> bool {
        matches!(self, Self::OriginGate | Self::RampDeparting | Self::RampArriving)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Predeparture => "PREDEPARTURE",
            Self::OriginGate => "ORIGIN_GATE",
            Self::RampDeparting => "RAMP_DEPARTING",
            Self::TaxiDeparting => "TAXI_DEPARTING",
            Self::Takeoff => "TAKEOFF",
            Self::Climbout => "CLIMBOUT",
            Self::ClimbToCruiseAltitude => "CLIMB_TO_CRUISE_ALTITUDE",
            Self::Cruise => "CRUISE",
            Self::InitialDescent => "INITIAL_DESCENT",
            Self::Approach => "APPROACH",
            Self::FinalApproach => "FINAL_APPROACH",
            Self::Land => "LAND",
            Self::TaxiArriving => "TAXI_ARRIVING",
            Self::RampArriving => "RAMP_ARRIVING",
        }
    }
}

impl fmt::Display for FlightPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
