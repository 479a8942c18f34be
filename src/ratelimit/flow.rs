//! Quota bookkeeping against the ledger

use super::types::{validate_update, Flow, FlowDirection, RateLimit, RateLimitPath, RateLimitProposal};
use crate::error::{EngineError, EngineResult};
use crate::state::Ledger;

use tracing::{info, warn};

/// The rate limit for a path after admitting `amount`, without writing it.
/// `None` when the path has no rate limit.
pub fn preview_flow(
    ledger: &Ledger,
    channel_id: &str,
    denom: &str,
    direction: FlowDirection,
    amount: u128,
    now: u64,
) -> EngineResult<Option<RateLimit>> {
    let path = RateLimitPath::new(denom, channel_id);
    let Some(rate_limit) = ledger.get_rate_limit(&path) else {
        return Ok(None);
    };

    match rate_limit.with_flow(direction, amount, now) {
        Ok(updated) => Ok(Some(updated)),
        Err(e) => {
            warn!("Rate limit rejected {} of {} {} on {}: {}", direction, amount, denom, channel_id, e);
            crate::metrics::record_rate_limit_rejection(channel_id, denom);
            Err(e)
        }
    }
}

/// Admit `amount` on a path, recording the flow. Paths without a rate limit
/// are unrestricted.
pub fn check_and_update_flow(
    ledger: &mut Ledger,
    channel_id: &str,
    denom: &str,
    direction: FlowDirection,
    amount: u128,
    now: u64,
) -> EngineResult<()> {
    if let Some(updated) = preview_flow(ledger, channel_id, denom, direction, amount, now)? {
        ledger.set_rate_limit(updated);
    }
    Ok(())
}

/// Give back an outflow recorded for a send that never left the hub. Only
/// the window that recorded it is adjusted; once it has rolled over the flow
/// was already cleared. Returns whether the outflow was returned.
pub fn undo_outflow(
    ledger: &mut Ledger,
    channel_id: &str,
    denom: &str,
    amount: u128,
    window_start: u64,
    now: u64,
) -> bool {
    let path = RateLimitPath::new(denom, channel_id);
    let Some(mut rate_limit) = ledger.get_rate_limit(&path).cloned() else {
        return false;
    };
    if rate_limit.window_start != window_start || rate_limit.window_expired(now) {
        return false;
    }

    rate_limit.flow.outflow = rate_limit.flow.outflow.saturating_sub(amount);
    info!("Returned {} {} of outflow on {}", amount, denom, channel_id);
    ledger.set_rate_limit(rate_limit);
    true
}

pub fn add_rate_limit(
    ledger: &mut Ledger,
    proposal: &RateLimitProposal,
    channel_value: u128,
    now: u64,
) -> EngineResult<()> {
    validate_update(proposal)?;

    let path = proposal.path();
    if ledger.get_rate_limit(&path).is_some() {
        return Err(EngineError::RateLimitAlreadyExists {
            denom: path.denom,
            channel_id: path.channel_id,
        });
    }

    info!("Adding rate limit for {} on {}", path.denom, path.channel_id);
    ledger.set_rate_limit(RateLimit {
        path,
        quota: proposal.quota(),
        flow: Flow {
            inflow: 0,
            outflow: 0,
            channel_value,
        },
        window_start: now,
    });
    Ok(())
}

/// Replace the quota of an existing rate limit. The flow starts over.
pub fn update_rate_limit(ledger: &mut Ledger, proposal: &RateLimitProposal, now: u64) -> EngineResult<()> {
    validate_update(proposal)?;

    let path = proposal.path();
    let mut rate_limit = ledger
        .get_rate_limit(&path)
        .cloned()
        .ok_or_else(|| EngineError::RateLimitNotFound {
            denom: path.denom.clone(),
            channel_id: path.channel_id.clone(),
        })?;

    rate_limit.quota = proposal.quota();
    rate_limit.flow.inflow = 0;
    rate_limit.flow.outflow = 0;
    rate_limit.window_start = now;

    info!("Updated rate limit for {} on {}", path.denom, path.channel_id);
    ledger.set_rate_limit(rate_limit);
    Ok(())
}

pub fn remove_rate_limit(ledger: &mut Ledger, denom: &str, channel_id: &str) -> EngineResult<()> {
    let path = RateLimitPath::new(denom, channel_id);
    if ledger.remove_rate_limit(&path).is_none() {
        return Err(EngineError::RateLimitNotFound {
            denom: denom.to_string(),
            channel_id: channel_id.to_string(),
        });
    }
    info!("Removed rate limit for {} on {}", denom, channel_id);
    Ok(())
}

/// Zero the flow and re-snapshot the channel value
pub fn reset_rate_limit(
    ledger: &mut Ledger,
    denom: &str,
    channel_id: &str,
    channel_value: u128,
    now: u64,
) -> EngineResult<()> {
    let path = RateLimitPath::new(denom, channel_id);
    let mut rate_limit = ledger
        .get_rate_limit(&path)
        .cloned()
        .ok_or_else(|| EngineError::RateLimitNotFound {
            denom: denom.to_string(),
            channel_id: channel_id.to_string(),
        })?;

    rate_limit.flow = Flow {
        inflow: 0,
        outflow: 0,
        channel_value,
    };
    rate_limit.window_start = now;
    ledger.set_rate_limit(rate_limit);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal(send: i64, recv: i64) -> RateLimitProposal {
        RateLimitProposal {
            title: "AddRateLimit".to_string(),
            description: "Adding a rate limit".to_string(),
            denom: "ibc/uatom".to_string(),
            channel_id: "channel-0".to_string(),
            max_percent_send: send,
            max_percent_recv: recv,
            duration_hours: 24,
        }
    }

    #[test]
    fn test_unlimited_path_is_admitted() {
        let mut ledger = Ledger::default();
        check_and_update_flow(&mut ledger, "channel-9", "ibc/uatom", FlowDirection::Send, u128::MAX, 0).unwrap();
        assert!(ledger.all_rate_limits().is_empty());
    }

    #[test]
    fn test_quota_exceeded_leaves_flow_untouched() {
        let mut ledger = Ledger::default();
        add_rate_limit(&mut ledger, &proposal(10, 10), 1_000, 0).unwrap();

        check_and_update_flow(&mut ledger, "channel-0", "ibc/uatom", FlowDirection::Send, 60, 1).unwrap();
        let before = ledger.clone();

        let err = check_and_update_flow(&mut ledger, "channel-0", "ibc/uatom", FlowDirection::Send, 41, 2)
            .unwrap_err();
        assert!(matches!(err, EngineError::QuotaExceeded { .. }));
        assert_eq!(ledger, before);

        check_and_update_flow(&mut ledger, "channel-0", "ibc/uatom", FlowDirection::Send, 40, 3).unwrap();
        let path = RateLimitPath::new("ibc/uatom", "channel-0");
        assert_eq!(ledger.get_rate_limit(&path).unwrap().flow.outflow, 100);
    }

    #[test]
    fn test_undo_outflow_within_recording_window() {
        let mut ledger = Ledger::default();
        add_rate_limit(&mut ledger, &proposal(10, 10), 1_000, 0).unwrap();
        check_and_update_flow(&mut ledger, "channel-0", "ibc/uatom", FlowDirection::Send, 80, 1).unwrap();
        let path = RateLimitPath::new("ibc/uatom", "channel-0");

        // a different window recorded it
        assert!(!undo_outflow(&mut ledger, "channel-0", "ibc/uatom", 80, 7, 2));
        assert_eq!(ledger.get_rate_limit(&path).unwrap().flow.outflow, 80);

        assert!(undo_outflow(&mut ledger, "channel-0", "ibc/uatom", 80, 0, 2));
        assert_eq!(ledger.get_rate_limit(&path).unwrap().flow.outflow, 0);

        // the window has rolled over
        check_and_update_flow(&mut ledger, "channel-0", "ibc/uatom", FlowDirection::Send, 80, 3).unwrap();
        let day = 24 * 3_600 * 1_000_000_000;
        assert!(!undo_outflow(&mut ledger, "channel-0", "ibc/uatom", 80, 0, day));
        assert!(!undo_outflow(&mut ledger, "channel-9", "ibc/uatom", 80, 0, 4));
    }

    #[test]
    fn test_admin_lifecycle() {
        let mut ledger = Ledger::default();
        add_rate_limit(&mut ledger, &proposal(10, 10), 1_000, 0).unwrap();
        assert!(matches!(
            add_rate_limit(&mut ledger, &proposal(10, 10), 1_000, 0),
            Err(EngineError::RateLimitAlreadyExists { .. })
        ));
        assert!(add_rate_limit(&mut Ledger::default(), &proposal(0, 0), 1_000, 0).is_err());

        check_and_update_flow(&mut ledger, "channel-0", "ibc/uatom", FlowDirection::Receive, 100, 1).unwrap();
        update_rate_limit(&mut ledger, &proposal(50, 5), 2).unwrap();

        let path = RateLimitPath::new("ibc/uatom", "channel-0");
        let rate_limit = ledger.get_rate_limit(&path).unwrap();
        assert_eq!(rate_limit.quota.max_percent_send, 50);
        assert_eq!(rate_limit.flow.inflow, 0);
        assert_eq!(rate_limit.window_start, 2);

        reset_rate_limit(&mut ledger, "ibc/uatom", "channel-0", 5_000, 3).unwrap();
        assert_eq!(ledger.get_rate_limit(&path).unwrap().flow.channel_value, 5_000);

        remove_rate_limit(&mut ledger, "ibc/uatom", "channel-0").unwrap();
        assert!(matches!(
            remove_rate_limit(&mut ledger, "ibc/uatom", "channel-0"),
            Err(EngineError::RateLimitNotFound { .. })
        ));
    }
}
