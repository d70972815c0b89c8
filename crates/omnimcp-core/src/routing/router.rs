//! Picks the primary server for a query

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::profile::{Domain, ServerProfile};

/// Query words that send a query to a weather server when one is connected
pub const WEATHER_KEYWORDS: &[&str] = &["weather", "temperature", "forecast"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    #[error("No suitable servers found for query")]
    NoServerAvailable,
}

pub type RoutingResult<T> = Result<T, RoutingError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Weather,
    General,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Weather => "weather",
            QueryType::General => "general",
        }
    }
}

/// Transient per-query routing decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingPlan {
    pub primary_server: String,
    pub query_type: QueryType,
}

/// Route `query` to one of `profiles`, in enumeration order
pub fn route(query: &str, profiles: &[ServerProfile]) -> RoutingResult<RoutingPlan> {
    let query = query.to_lowercase();

    if WEATHER_KEYWORDS.iter().any(|k| query.contains(k)) {
        if let Some(profile) = profiles.iter().find(|p| p.has_domain(Domain::Weather)) {
            return Ok(RoutingPlan {
                primary_server: profile.server_id.clone(),
                query_type: QueryType::Weather,
            });
        }
    }

    profiles
        .first()
        .map(|profile| RoutingPlan {
            primary_server: profile.server_id.clone(),
            query_type: QueryType::General,
        })
        .ok_or(RoutingError::NoServerAvailable)
}
