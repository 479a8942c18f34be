//! Rate limit entities and proposal validation

use crate::error::{EngineError, EngineResult};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

const NANOS_PER_HOUR: u64 = 3_600 * 1_000_000_000;

lazy_static! {
    static ref CHANNEL_ID: Regex = Regex::new(r"^channel-[0-9]{1,20}$").unwrap();
}

/// Whether `channel_id` is a well-formed `channel-{N}` identifier
pub fn is_valid_channel_id(channel_id: &str) -> bool {
    CHANNEL_ID.is_match(channel_id) && channel_id["channel-".len()..].parse::<u64>().is_ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowDirection {
    Send,
    Receive,
}

impl fmt::Display for FlowDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowDirection::Send => f.write_str("send"),
            FlowDirection::Receive => f.write_str("receive"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RateLimitPath {
    pub denom: String,
    pub channel_id: String,
}

impl RateLimitPath {
    pub fn new(denom: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            channel_id: channel_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quota {
    pub max_percent_send: u64,
    pub max_percent_recv: u64,
    pub duration_hours: u64,
}

impl Quota {
    fn threshold(&self, direction: FlowDirection, channel_value: u128) -> u128 {
        let percent = match direction {
            FlowDirection::Send => self.max_percent_send,
            FlowDirection::Receive => self.max_percent_recv,
        };
        channel_value.saturating_mul(percent as u128) / 100
    }

    pub fn duration_nanos(&self) -> u64 {
        self.duration_hours.saturating_mul(NANOS_PER_HOUR)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flow {
    pub inflow: u128,
    pub outflow: u128,
    /// Denom supply snapshotted when the window opened
    pub channel_value: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub path: RateLimitPath,
    pub quota: Quota,
    pub flow: Flow,
    /// Unix nanos at which the current window opened
    pub window_start: u64,
}

impl RateLimit {
    pub fn window_expired(&self, now: u64) -> bool {
        now >= self.window_start.saturating_add(self.quota.duration_nanos())
    }

    /// The rate limit after letting `amount` flow in `direction`, or
    /// `QuotaExceeded` if the net flow would cross the threshold.
    pub fn with_flow(&self, direction: FlowDirection, amount: u128, now: u64) -> EngineResult<RateLimit> {
        let mut next = self.clone();
        if next.window_expired(now) {
            next.flow.inflow = 0;
            next.flow.outflow = 0;
            next.window_start = now;
        }

        let (gross, counter) = match direction {
            FlowDirection::Send => (next.flow.outflow, next.flow.inflow),
            FlowDirection::Receive => (next.flow.inflow, next.flow.outflow),
        };
        let gross = gross
            .checked_add(amount)
            .ok_or_else(|| EngineError::Overflow(format!("{} flow on {}", direction, self.path.channel_id)))?;
        let net = gross.saturating_sub(counter);
        let threshold = next.quota.threshold(direction, next.flow.channel_value);

        // no supply on the path, nothing to protect
        if next.flow.channel_value > 0 && net > threshold {
            return Err(EngineError::QuotaExceeded {
                channel_id: self.path.channel_id.clone(),
                denom: self.path.denom.clone(),
                direction: direction.to_string(),
                amount,
                threshold,
            });
        }

        match direction {
            FlowDirection::Send => next.flow.outflow = gross,
            FlowDirection::Receive => next.flow.inflow = gross,
        }
        Ok(next)
    }
}

/// Governance proposal adding or updating a rate limit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitProposal {
    pub title: String,
    pub description: String,
    pub denom: String,
    pub channel_id: String,
    pub max_percent_send: i64,
    pub max_percent_recv: i64,
    pub duration_hours: u64,
}

impl RateLimitProposal {
    pub fn path(&self) -> RateLimitPath {
        RateLimitPath::new(self.denom.clone(), self.channel_id.clone())
    }

    /// The quota carried by the proposal. Only meaningful after validation.
    pub fn quota(&self) -> Quota {
        Quota {
            max_percent_send: self.max_percent_send.max(0) as u64,
            max_percent_recv: self.max_percent_recv.max(0) as u64,
            duration_hours: self.duration_hours,
        }
    }
}

/// Stateless checks on a rate limit proposal
pub fn validate_update(proposal: &RateLimitProposal) -> EngineResult<()> {
    if proposal.title.trim().is_empty() {
        return Err(EngineError::InvalidProposal("proposal title cannot be blank".to_string()));
    }
    if proposal.description.trim().is_empty() {
        return Err(EngineError::InvalidProposal(
            "proposal description cannot be blank".to_string(),
        ));
    }
    if proposal.denom.is_empty() {
        return Err(EngineError::InvalidProposal("invalid denom".to_string()));
    }
    if !is_valid_channel_id(&proposal.channel_id) {
        return Err(EngineError::InvalidProposal(format!(
            "invalid channel-id ({})",
            proposal.channel_id
        )));
    }

    let in_range = |percent: i64| (0..=100).contains(&percent);
    if !in_range(proposal.max_percent_send) || !in_range(proposal.max_percent_recv) {
        return Err(EngineError::InvalidProposal(format!(
            "percent must be between 0 and 100 (inclusively), Provided: send - {}, recv - {}",
            proposal.max_percent_send, proposal.max_percent_recv
        )));
    }
    if proposal.max_percent_send == 0 && proposal.max_percent_recv == 0 {
        return Err(EngineError::InvalidProposal(
            "either the max send or max receive threshold must be greater than 0".to_string(),
        ));
    }
    if proposal.duration_hours == 0 {
        return Err(EngineError::InvalidProposal("duration can not be zero".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_proposal() -> RateLimitProposal {
        RateLimitProposal {
            title: "UpdateRateLimit".to_string(),
            description: "Updating a rate limit".to_string(),
            denom: "denom".to_string(),
            channel_id: "channel-0".to_string(),
            max_percent_send: 10,
            max_percent_recv: 10,
            duration_hours: 60,
        }
    }

    #[test]
    fn test_validate_update() {
        let cases: Vec<(&str, Box<dyn Fn(&mut RateLimitProposal)>, Option<&str>)> = vec![
            ("successful proposal", Box::new(|_| {}), None),
            ("invalid title", Box::new(|p| p.title = String::new()), Some("title cannot be blank")),
            (
                "invalid description",
                Box::new(|p| p.description = "  ".to_string()),
                Some("description cannot be blank"),
            ),
            ("invalid denom", Box::new(|p| p.denom = String::new()), Some("invalid denom")),
            (
                "invalid channel-id",
                Box::new(|p| p.channel_id = "channel-".to_string()),
                Some("invalid channel-id"),
            ),
            (
                "invalid send percent (lt 0)",
                Box::new(|p| p.max_percent_send = -1),
                Some("percent must be between 0 and 100"),
            ),
            (
                "invalid send percent (gt 100)",
                Box::new(|p| p.max_percent_send = 101),
                Some("percent must be between 0 and 100"),
            ),
            (
                "invalid receive percent (lt 0)",
                Box::new(|p| p.max_percent_recv = -1),
                Some("percent must be between 0 and 100"),
            ),
            (
                "invalid receive percent (gt 100)",
                Box::new(|p| p.max_percent_recv = 101),
                Some("percent must be between 0 and 100"),
            ),
            (
                "invalid send and receive percent",
                Box::new(|p| {
                    p.max_percent_send = 0;
                    p.max_percent_recv = 0;
                }),
                Some("either the max send or max receive threshold must be greater than 0"),
            ),
            ("invalid duration", Box::new(|p| p.duration_hours = 0), Some("duration can not be zero")),
            ("boundary percents", Box::new(|p| {
                p.max_percent_send = 0;
                p.max_percent_recv = 100;
            }), None),
        ];

        for (name, mutate, expected) in cases {
            let mut proposal = valid_proposal();
            mutate(&mut proposal);
            let before = proposal.clone();
            let result = validate_update(&proposal);

            match expected {
                None => {
                    assert!(result.is_ok(), "test: {}", name);
                    assert_eq!(proposal, before, "test: {}", name);
                }
                Some(msg) => {
                    let err = result.expect_err(name).to_string();
                    assert!(err.contains(msg), "test: {}: got {}", name, err);
                }
            }
        }
    }

    #[test]
    fn test_channel_id_format() {
        assert!(is_valid_channel_id("channel-0"));
        assert!(is_valid_channel_id("channel-142"));
        assert!(!is_valid_channel_id("channel-"));
        assert!(!is_valid_channel_id("chan-1"));
        assert!(!is_valid_channel_id("channel-99999999999999999999"));
    }

    #[test]
    fn test_with_flow_nets_against_counter_direction() {
        let rate_limit = RateLimit {
            path: RateLimitPath::new("uatom", "channel-0"),
            quota: Quota {
                max_percent_send: 10,
                max_percent_recv: 10,
                duration_hours: 1,
            },
            flow: Flow {
                inflow: 50,
                outflow: 0,
                channel_value: 1_000,
            },
            window_start: 0,
        };

        // net outflow 150 - 50 = 100, exactly the threshold
        let updated = rate_limit.with_flow(FlowDirection::Send, 150, 10).unwrap();
        assert_eq!(updated.flow.outflow, 150);

        let err = updated.with_flow(FlowDirection::Send, 1, 20).unwrap_err();
        assert!(matches!(err, EngineError::QuotaExceeded { threshold: 100, .. }));
    }

    #[test]
    fn test_with_flow_resets_expired_window() {
        let rate_limit = RateLimit {
            path: RateLimitPath::new("uatom", "channel-0"),
            quota: Quota {
                max_percent_send: 10,
                max_percent_recv: 0,
                duration_hours: 1,
            },
            flow: Flow {
                inflow: 0,
                outflow: 100,
                channel_value: 1_000,
            },
            window_start: 0,
        };

        let now = NANOS_PER_HOUR;
        let updated = rate_limit.with_flow(FlowDirection::Send, 100, now).unwrap();
        assert_eq!(updated.window_start, now);
        assert_eq!(updated.flow.outflow, 100);

        // inflow is netted against the outflow already in the window
        let received = rate_limit.with_flow(FlowDirection::Receive, 1, 0).unwrap();
        assert_eq!(received.flow.inflow, 1);

        // with no outflow a zero percent blocks the direction entirely
        let idle = RateLimit {
            flow: Flow {
                outflow: 0,
                ..rate_limit.flow.clone()
            },
            ..rate_limit
        };
        assert!(matches!(
            idle.with_flow(FlowDirection::Receive, 1, 0),
            Err(EngineError::QuotaExceeded { threshold: 0, .. })
        ));
    }

    #[test]
    fn test_zero_channel_value_is_unrestricted() {
        let rate_limit = RateLimit {
            path: RateLimitPath::new("uatom", "channel-0"),
            quota: Quota {
                max_percent_send: 10,
                max_percent_recv: 10,
                duration_hours: 1,
            },
            flow: Flow::default(),
            window_start: 0,
        };

        let updated = rate_limit.with_flow(FlowDirection::Send, 1_000_000, 1).unwrap();
        assert_eq!(updated.flow.outflow, 1_000_000);
    }
}
