//! Query routing across connected servers

mod router;

pub use router::{route, QueryType, RoutingError, RoutingPlan, RoutingResult, WEATHER_KEYWORDS};
