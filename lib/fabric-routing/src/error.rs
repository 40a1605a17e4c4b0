use fabric_api::{Destination, EventError, Vni};
use fabric_core::DataplaneError;
use std::net::IpAddr;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RoutingError>;

#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("refusing non-IPv4 destination {destination} (IPv4-only mode)")]
    Ipv4Only { destination: Destination },

    #[error(transparent)]
    InvalidEvent(#[from] EventError),

    #[error("no registered load balancer for vni {vni} and ip {address}")]
    NoLoadBalancer { vni: Vni, address: IpAddr },

    #[error("error {action} in vni {vni}: {source}")]
    Dataplane {
        action: &'static str,
        vni: Vni,
        #[source]
        source: DataplaneError,
    },

    /// Every failure of a multi-network operation, in attempt order
    #[error("{}", join_errors(.0))]
    Aggregate(Vec<RoutingError>),
}

impl RoutingError {
    pub(crate) fn dataplane(action: &'static str, vni: Vni, source: DataplaneError) -> Self {
        RoutingError::Dataplane { action, vni, source }
    }

    /// The individual failures; a non-aggregate error is its own only member
    pub fn errors(&self) -> &[RoutingError] {
        match self {
            RoutingError::Aggregate(errors) => errors,
            other => std::slice::from_ref(other),
        }
    }
}

fn join_errors(errors: &[RoutingError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabric_core::StatusError;

    #[test]
    fn test_aggregate_joins_messages() {
        let err = RoutingError::Aggregate(vec![
            RoutingError::NoLoadBalancer {
                vni: 100,
                address: "45.86.6.1".parse().unwrap(),
            },
            RoutingError::dataplane("creating route", 300, StatusError::new(303, "insert failed").into()),
        ]);

        assert_eq!(
            err.to_string(),
            "no registered load balancer for vni 100 and ip 45.86.6.1\n\
             error creating route in vni 300: [error code 303] insert failed"
        );
        assert_eq!(err.errors().len(), 2);
    }

    #[test]
    fn test_single_error_is_its_own_member() {
        let err = RoutingError::Ipv4Only {
            destination: Destination::from_prefix("2001:db8::/64".parse().unwrap()),
        };
        assert_eq!(err.errors().len(), 1);
        assert_eq!(err.to_string(), "refusing non-IPv4 destination 2001:db8::/64 (IPv4-only mode)");
    }
}
