//! Parameter-driven animation state machine.
//!
//! Gameplay code sets boolean flags and numeric parameters; rules map
//! parameter conditions to animation keys. The first matching rule wins,
//! otherwise the fallback key applies. Rules are evaluated once per frame
//! by [`animator`](crate::systems::animator) after gameplay updates.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Comparison operator for numeric conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CmpOp {
    pub fn eval(&self, lhs: f32, rhs: f32) -> bool {
        match self {
            CmpOp::Lt => lhs < rhs,
            CmpOp::Le => lhs <= rhs,
            CmpOp::Gt => lhs > rhs,
            CmpOp::Ge => lhs >= rhs,
            CmpOp::Eq => lhs == rhs,
            CmpOp::Ne => lhs != rhs,
        }
    }
}

/// Condition over animator parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Condition {
    /// Boolean parameter is set and true.
    Flag { key: String },
    /// Boolean parameter is absent or false.
    NotFlag { key: String },
    /// Numeric parameter compares against a constant; absent reads as 0.
    NumCmp { key: String, op: CmpOp, value: f32 },
    All(Vec<Condition>),
    Any(Vec<Condition>),
}

/// One transition rule: when the condition holds, play `set_key`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimRule {
    pub when: Condition,
    pub set_key: String,
}

/// Animator component: parameters plus ordered rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Animator {
    /// Boolean parameters.
    #[serde(default)]
    pub flags: FxHashMap<String, bool>,
    /// Numeric parameters.
    #[serde(default)]
    pub numbers: FxHashMap<String, f32>,
    /// Rules in priority order.
    #[serde(default)]
    pub rules: Vec<AnimRule>,
    /// Animation used when no rule matches.
    pub fallback_key: String,
}

impl Animator {
    pub fn new(fallback_key: impl Into<String>) -> Self {
        Self {
            flags: FxHashMap::default(),
            numbers: FxHashMap::default(),
            rules: Vec::new(),
            fallback_key: fallback_key.into(),
        }
    }

    pub fn with_rule(mut self, when: Condition, set_key: impl Into<String>) -> Self {
        self.rules.push(AnimRule {
            when,
            set_key: set_key.into(),
        });
        self
    }

    pub fn set_flag(&mut self, key: impl Into<String>, value: bool) {
        self.flags.insert(key.into(), value);
    }

    pub fn set_number(&mut self, key: impl Into<String>, value: f32) {
        self.numbers.insert(key.into(), value);
    }

    /// Reset every parameter to its default (false / 0). Used when a
    /// projectile reverts to normal AI behavior.
    pub fn reset_params(&mut self) {
        self.flags.clear();
        self.numbers.clear();
    }

    pub fn eval(&self, cond: &Condition) -> bool {
        match cond {
            Condition::Flag { key } => self.flags.get(key).copied().unwrap_or(false),
            Condition::NotFlag { key } => !self.flags.get(key).copied().unwrap_or(false),
            Condition::NumCmp { key, op, value } => {
                op.eval(self.numbers.get(key).copied().unwrap_or(0.0), *value)
            }
            Condition::All(conds) => conds.iter().all(|c| self.eval(c)),
            Condition::Any(conds) => conds.iter().any(|c| self.eval(c)),
        }
    }

    /// Animation key selected by the current parameters.
    pub fn select_key(&self) -> &str {
        for rule in &self.rules {
            if self.eval(&rule.when) {
                return &rule.set_key;
            }
        }
        &self.fallback_key
    }
}
