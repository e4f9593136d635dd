use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

/// Derived classification of a product's expiration relative to the
/// reported problem and to the time of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpirationStatus {
    UnknownExpiration,
    ExpiredBeforeProblem,
    Expired,
    Valid,
    /// Neither date column exists anywhere in the batch
    Unknown,
}

impl ExpirationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ExpirationStatus::UnknownExpiration => "Unknown Expiration",
            ExpirationStatus::ExpiredBeforeProblem => "Expired Before Problem",
            ExpirationStatus::Expired => "Expired",
            ExpirationStatus::Valid => "Valid",
            ExpirationStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ExpirationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for ExpirationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// The two dates a classification looks at
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpirationInput {
    pub problem_date: Option<DateTime<Utc>>,
    pub expiration_date: Option<DateTime<Utc>>,
}

type Condition = fn(&ExpirationInput, DateTime<Utc>) -> bool;

/// One entry of an ordered rule list
struct Rule {
    condition: Condition,
    status: ExpirationStatus,
}

fn expiration_missing(input: &ExpirationInput, _now: DateTime<Utc>) -> bool {
    input.expiration_date.is_none()
}

fn expired_before_problem(input: &ExpirationInput, _now: DateTime<Utc>) -> bool {
    matches!(
        (input.problem_date, input.expiration_date),
        (Some(problem), Some(expiration)) if expiration < problem
    )
}

fn expired_before_now(input: &ExpirationInput, now: DateTime<Utc>) -> bool {
    matches!(input.expiration_date, Some(expiration) if expiration < now)
}

const FULL_RULES: [Rule; 3] = [
    Rule { condition: expiration_missing, status: ExpirationStatus::UnknownExpiration },
    Rule { condition: expired_before_problem, status: ExpirationStatus::ExpiredBeforeProblem },
    Rule { condition: expired_before_now, status: ExpirationStatus::Expired },
];

const EXPIRATION_ONLY_RULES: [Rule; 2] = [
    Rule { condition: expiration_missing, status: ExpirationStatus::UnknownExpiration },
    Rule { condition: expired_before_now, status: ExpirationStatus::Expired },
];

/// Which rule list applies, chosen from the date columns present in the batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSet {
    /// Both columns present: all rules plus the missing-problem-date override
    Full,
    /// No `problemDate` column: expiration-vs-now only
    ExpirationOnly,
    /// No `productExpirationDate` column: every expiration is unknown
    ProblemOnly,
    /// Neither column present
    Unavailable,
}

impl RuleSet {
    pub fn for_columns(has_problem_date: bool, has_expiration_date: bool) -> Self {
        match (has_problem_date, has_expiration_date) {
            (true, true) => RuleSet::Full,
            (false, true) => RuleSet::ExpirationOnly,
            (true, false) => RuleSet::ProblemOnly,
            (false, false) => RuleSet::Unavailable,
        }
    }
}

/// Evaluates an ordered rule list top to bottom, first match wins, with
/// `Valid` as the fallthrough. Under the full rule set a correction layer
/// runs after the rules.
#[derive(Debug, Clone, Copy)]
pub struct ExpirationClassifier {
    rule_set: RuleSet,
    now: DateTime<Utc>,
}

impl ExpirationClassifier {
    pub fn new(rule_set: RuleSet, now: DateTime<Utc>) -> Self {
        Self { rule_set, now }
    }

    pub fn classify(&self, input: &ExpirationInput) -> ExpirationStatus {
        match self.rule_set {
            RuleSet::Full => {
                let status = Self::first_match(&FULL_RULES, input, self.now);
                self.apply_override(input, status)
            }
            RuleSet::ExpirationOnly => Self::first_match(&EXPIRATION_ONLY_RULES, input, self.now),
            // No expiration column means rule 1 fires for every row
            RuleSet::ProblemOnly => ExpirationStatus::UnknownExpiration,
            RuleSet::Unavailable => ExpirationStatus::Unknown,
        }
    }

    fn first_match(rules: &[Rule], input: &ExpirationInput, now: DateTime<Utc>) -> ExpirationStatus {
        rules
            .iter()
            .find(|rule| (rule.condition)(input, now))
            .map(|rule| rule.status)
            .unwrap_or(ExpirationStatus::Valid)
    }

    /// Correction layer: a known expiration that has passed is `Expired`
    /// whenever the problem date is missing, whatever the rules decided.
    fn apply_override(&self, input: &ExpirationInput, status: ExpirationStatus) -> ExpirationStatus {
        match (input.problem_date, input.expiration_date) {
            (None, Some(expiration)) if expiration < self.now => ExpirationStatus::Expired,
            _ => status,
        }
    }
}
