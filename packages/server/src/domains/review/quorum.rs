//! Quorum voter: the generic decision primitive.
//!
//! Converts N independent votes into exactly one decision: the first choice
//! to accumulate a majority wins, which means a 3-member committee resolves
//! as soon as 2 votes agree — the third vote is history, not input.
//!
//! The rules are a value and the choice set is a type parameter, so the
//! misconduct-report and specialization-conflict flows reuse this primitive
//! with their own choice enums and thresholds while keeping their side
//! effects in their own case engines. Pure tallying lives here; persistence
//! and side effects live in `actions`.

/// A choice set usable by the quorum primitive.
pub trait QuorumChoice: Copy + Eq + Sized {
    fn as_str(&self) -> &'static str;
    fn parse(s: &str) -> Option<Self>;
}

/// Decision rules for one voting flow: a committee size and the majority a
/// choice must reach. What happens when the deadline passes without any
/// majority belongs to the owning case engine (for disciplinary cases:
/// auto-expulsion), not to the tally.
#[derive(Debug, Clone, Copy)]
pub struct DecisionRules {
    pub committee_size: usize,
    pub majority: i32,
}

impl DecisionRules {
    /// The first choice holding at least `majority` votes, if any.
    ///
    /// With majority > total/2 at most one choice can qualify, so "first to
    /// reach" and "any at threshold" coincide and the result is
    /// deterministic under concurrent submissions.
    pub fn decide<C: QuorumChoice>(&self, counts: &[(C, i32)]) -> Option<C> {
        counts
            .iter()
            .find(|(_, count)| *count >= self.majority)
            .map(|(choice, _)| *choice)
    }
}

// =============================================================================
// Disciplinary (expulsion) instantiation
// =============================================================================

/// Fixed committee size for disciplinary cases.
pub const COMMITTEE_SIZE: usize = 3;

/// Votes needed to decide a disciplinary case.
pub const MAJORITY: i32 = 2;

/// A committee member's choice on a disciplinary case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteChoice {
    Expel,
    Absolve,
    Extend,
}

impl QuorumChoice for VoteChoice {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Expel => "expel",
            Self::Absolve => "absolve",
            Self::Extend => "extend",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "expel" => Some(Self::Expel),
            "absolve" => Some(Self::Absolve),
            "extend" => Some(Self::Extend),
            _ => None,
        }
    }
}

/// Running tally of a disciplinary case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub for_expulsion: i32,
    pub against: i32,
    pub to_extend: i32,
}

impl Tally {
    pub fn counts(&self) -> [(VoteChoice, i32); 3] {
        [
            (VoteChoice::Expel, self.for_expulsion),
            (VoteChoice::Absolve, self.against),
            (VoteChoice::Extend, self.to_extend),
        ]
    }

    pub fn count(&self, choice: VoteChoice) -> i32 {
        match choice {
            VoteChoice::Expel => self.for_expulsion,
            VoteChoice::Absolve => self.against,
            VoteChoice::Extend => self.to_extend,
        }
    }

    pub fn total(&self) -> i32 {
        self.for_expulsion + self.against + self.to_extend
    }
}

/// Rules for disciplinary expulsion cases: 3 voters, first to 2 wins.
pub fn expulsion_rules() -> DecisionRules {
    DecisionRules {
        committee_size: COMMITTEE_SIZE,
        majority: MAJORITY,
    }
}
