//! Engine condition predicates such as `node<16.0.0`

use std::sync::LazyLock;

use regex::Regex;
use semver::Version;

use crate::runtime::Runtime;
use crate::version::semver::parse_version;

static CONDITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z][\w-]*)\s*(<=|>=|==|=|<|>)\s*(\S+)\s*$")
        .expect("valid condition regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
}

impl Operator {
    fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "<" => Some(Operator::Lt),
            "<=" => Some(Operator::Lte),
            ">" => Some(Operator::Gt),
            ">=" => Some(Operator::Gte),
            "=" | "==" => Some(Operator::Eq),
            _ => None,
        }
    }

    fn compare(self, left: &Version, right: &Version) -> bool {
        match self {
            Operator::Lt => left < right,
            Operator::Lte => left <= right,
            Operator::Gt => left > right,
            Operator::Gte => left >= right,
            Operator::Eq => left == right,
        }
    }
}

/// A parsed `<engine><operator><version>` predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCondition {
    pub engine: String,
    pub operator: Operator,
    pub version: Version,
}

impl EngineCondition {
    /// Parse a condition string, returning `None` when it is malformed
    pub fn parse(condition: &str) -> Option<Self> {
        let captures = CONDITION.captures(condition)?;
        let operator = Operator::from_symbol(&captures[2])?;
        let version = parse_version(&captures[3])?;

        Some(Self {
            engine: captures[1].to_ascii_lowercase(),
            operator,
            version,
        })
    }

    /// Evaluate against the running engine.
    ///
    /// Only `node` is known; any other engine, or an unknown runtime
    /// version, is treated as "condition not met".
    pub fn evaluate(&self, runtime: &Runtime) -> bool {
        if self.engine != "node" {
            return false;
        }
        runtime
            .node_version()
            .is_some_and(|current| self.operator.compare(current, &self.version))
    }
}

/// Parse and evaluate a condition string in one step; malformed input is `false`.
pub fn condition_holds(condition: &str, runtime: &Runtime) -> bool {
    EngineCondition::parse(condition).is_some_and(|c| c.evaluate(runtime))
}
