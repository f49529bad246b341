//! The fixed catalog of anomaly definitions.
//!
//! Seven definitions, each independent and order-insensitive; the order here
//! only fixes execution and log ordering. Five relational-integrity checks
//! contribute scalar counts to the summary; the two statistical checks are
//! positionally distinct — `OutlierAirports` contributes a count plus a
//! detail table, `AirlineRank` is reported as a ranked table with no scalar.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnomalyKind {
    MissingSourceAirports,
    MissingDestinationAirports,
    MissingAirlines,
    DuplicateRoutes,
    IncompleteRoutes,
    OutlierAirports,
    AirlineRank,
}

/// Fixed execution order
pub static CATALOG: &[AnomalyKind] = &[
    AnomalyKind::MissingSourceAirports,
    AnomalyKind::MissingDestinationAirports,
    AnomalyKind::MissingAirlines,
    AnomalyKind::DuplicateRoutes,
    AnomalyKind::IncompleteRoutes,
    AnomalyKind::OutlierAirports,
    AnomalyKind::AirlineRank,
];

impl AnomalyKind {
    /// Stable snake_case label, used in the summary table and log lines
    pub fn label(self) -> &'static str {
        match self {
            AnomalyKind::MissingSourceAirports => "missing_source_airports",
            AnomalyKind::MissingDestinationAirports => "missing_destination_airports",
            AnomalyKind::MissingAirlines => "missing_airlines",
            AnomalyKind::DuplicateRoutes => "duplicate_routes",
            AnomalyKind::IncompleteRoutes => "incomplete_routes",
            AnomalyKind::OutlierAirports => "outlier_airports",
            AnomalyKind::AirlineRank => "airline_rank",
        }
    }

    /// Filename of the detail artifact, where one is written
    pub fn detail_filename(self) -> Option<&'static str> {
        match self {
            AnomalyKind::MissingSourceAirports => Some("missing_source_airports.csv"),
            AnomalyKind::MissingDestinationAirports => Some("missing_destination_airports.csv"),
            AnomalyKind::MissingAirlines => Some("missing_airlines.csv"),
            AnomalyKind::DuplicateRoutes => Some("duplicate_routes.csv"),
            AnomalyKind::IncompleteRoutes => Some("incomplete_routes.csv"),
            AnomalyKind::OutlierAirports => Some("outlier_airports.csv"),
            AnomalyKind::AirlineRank => Some("top_10_airlines.csv"),
        }
    }

    /// Whether this definition contributes a scalar count to the summary
    pub fn in_summary(self) -> bool {
        !matches!(self, AnomalyKind::AirlineRank)
    }

    pub fn description(self) -> &'static str {
        match self {
            AnomalyKind::MissingSourceAirports => {
                "routes whose source airport reference has no matching airport"
            }
            AnomalyKind::MissingDestinationAirports => {
                "routes whose destination airport reference has no matching airport"
            }
            AnomalyKind::MissingAirlines => {
                "routes whose airline reference has no matching airline"
            }
            AnomalyKind::DuplicateRoutes => {
                "groups of routes sharing (airline, source, destination), group size > 1"
            }
            AnomalyKind::IncompleteRoutes => {
                "routes with a null airline, source, or destination reference"
            }
            AnomalyKind::OutlierAirports => {
                "source airports whose route count falls outside mean +/- 2 population stddev"
            }
            AnomalyKind::AirlineRank => {
                "top 10 airlines by route count, dense-ranked"
            }
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
