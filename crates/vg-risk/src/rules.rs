//! Risk rules and the factors they emit.
//!
//! Each rule maps one event attribute to at most one [`RiskFactor`]. Rules are
//! evaluated in a fixed order (IP, user agent, time of day), which is also the
//! order factors are reported in.

/// A triggered rule: explanatory label plus score contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RiskFactor {
    pub label: &'static str,
    pub weight: u32,
}

pub const INTERNAL_NETWORK_IP: RiskFactor = RiskFactor {
    label: "Internal network IP",
    weight: 10,
};
pub const INVALID_IP_ADDRESS: RiskFactor = RiskFactor {
    label: "Invalid IP address",
    weight: 50,
};
pub const LOCALHOST_ACCESS: RiskFactor = RiskFactor {
    label: "Localhost access",
    weight: 20,
};
pub const BOT_USER_AGENT: RiskFactor = RiskFactor {
    label: "Bot-like user agent",
    weight: 30,
};
pub const UNUSUAL_ACCESS_TIME: RiskFactor = RiskFactor {
    label: "Unusual access time",
    weight: 15,
};

/// How an [`IpRule`] compares against the submitted address text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpMatch {
    Prefix(&'static str),
    Exact(&'static str),
}

impl IpMatch {
    pub fn matches(self, ip: &str) -> bool {
        match self {
            IpMatch::Prefix(prefix) => ip.starts_with(prefix),
            IpMatch::Exact(value) => ip == value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpRule {
    pub matcher: IpMatch,
    pub factor: RiskFactor,
}

/// Ordered IP rules; the first match wins and later rules are not consulted.
pub const IP_RULES: &[IpRule] = &[
    IpRule {
        matcher: IpMatch::Prefix("192.168."),
        factor: INTERNAL_NETWORK_IP,
    },
    IpRule {
        matcher: IpMatch::Exact("0.0.0.0"),
        factor: INVALID_IP_ADDRESS,
    },
    IpRule {
        matcher: IpMatch::Exact("127.0.0.1"),
        factor: LOCALHOST_ACCESS,
    },
];

/// Case-sensitive marker for automated clients.
pub const BOT_MARKER: &str = "bot";

/// Hours strictly before this are unusual.
pub const EARLIEST_USUAL_HOUR: u32 = 6;
/// Hours strictly after this are unusual.
pub const LATEST_USUAL_HOUR: u32 = 22;

pub fn match_ip(ip: &str) -> Option<RiskFactor> {
    IP_RULES
        .iter()
        .find(|rule| rule.matcher.matches(ip))
        .map(|rule| rule.factor)
}

pub fn match_user_agent(user_agent: &str) -> Option<RiskFactor> {
    user_agent.contains(BOT_MARKER).then_some(BOT_USER_AGENT)
}

pub fn match_hour(hour: u32) -> Option<RiskFactor> {
    (hour < EARLIEST_USUAL_HOUR || hour > LATEST_USUAL_HOUR).then_some(UNUSUAL_ACCESS_TIME)
}

/// Sum of factor weights.
pub fn total_weight(factors: &[RiskFactor]) -> u32 {
    factors
        .iter()
        .fold(0u32, |acc, factor| acc.saturating_add(factor.weight))
}
