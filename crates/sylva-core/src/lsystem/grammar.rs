//! Parallel string rewriting.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SylvaError;

/// Canned grammar presets, selectable by index 0-3 or by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "TreeTypeRepr")]
pub enum TreeType {
    #[default]
    Simple,
    Bushy,
    Willow,
    ThreeD,
}

impl TreeType {
    pub const ALL: [TreeType; 4] = [TreeType::Simple, TreeType::Bushy, TreeType::Willow, TreeType::ThreeD];

    pub fn from_index(index: i64) -> Result<Self, SylvaError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(SylvaError::UnknownTreeType(index))
    }

    pub fn from_name(name: &str) -> Result<Self, SylvaError> {
        Self::ALL
            .into_iter()
            .find(|t| format!("{t:?}") == name || t.label() == name)
            .ok_or_else(|| SylvaError::UnknownTreeName(name.to_string()))
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            TreeType::Simple => "Simple",
            TreeType::Bushy => "Bushy",
            TreeType::Willow => "Willow",
            TreeType::ThreeD => "3D Tree",
        }
    }
}

/// Wire form of a tree selector: the preset index or its name.
#[derive(Deserialize)]
#[serde(untagged)]
enum TreeTypeRepr {
    Index(i64),
    Name(String),
}

impl TryFrom<TreeTypeRepr> for TreeType {
    type Error = SylvaError;

    fn try_from(repr: TreeTypeRepr) -> Result<Self, Self::Error> {
        match repr {
            TreeTypeRepr::Index(i) => TreeType::from_index(i),
            TreeTypeRepr::Name(name) => TreeType::from_name(&name),
        }
    }
}

/// Axiom, per-symbol rules, and an iteration count.
///
/// Immutable once built; switching preset builds a fresh value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grammar {
    pub axiom: String,
    pub rules: BTreeMap<char, String>,
    pub iterations: u32,
}

impl Grammar {
    pub fn new(axiom: impl Into<String>) -> Self {
        Self { axiom: axiom.into(), rules: BTreeMap::new(), iterations: 0 }
    }

    pub fn with_rule(mut self, symbol: char, replacement: impl Into<String>) -> Self {
        self.rules.insert(symbol, replacement.into());
        self
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn preset(tree_type: TreeType, iterations: u32) -> Self {
        let grammar = match tree_type {
            TreeType::Simple => Self::new("F").with_rule('F', "FF+[+F-F-F]-[-F+F+F]"),
            TreeType::Bushy => Self::new("X").with_rule('X', "F[+X]F[-X]+X").with_rule('F', "FF"),
            TreeType::Willow => Self::new("F").with_rule('F', "F[+F]F[-F][F]"),
            TreeType::ThreeD => Self::new("F").with_rule('F', "F[+&F][-&F][^F][/F]"),
        };
        grammar.with_iterations(iterations)
    }

    /// Upper bound on how much one pass can grow the string.
    fn growth_bound(&self) -> usize {
        self.rules.values().map(|r| r.chars().count()).max().unwrap_or(1).max(1)
    }

    /// Rewrite the axiom `iterations` times.
    ///
    /// Every pass reads only the previous pass's string, so replacement text
    /// is never rewritten within the pass that produced it. Symbols without
    /// a rule are copied through.
    pub fn expand(&self) -> String {
        let growth = self.growth_bound();
        let mut current = self.axiom.clone();
        for _ in 0..self.iterations {
            let mut next = String::with_capacity(current.len().saturating_mul(growth));
            for c in current.chars() {
                match self.rules.get(&c) {
                    Some(replacement) => next.push_str(replacement),
                    None => next.push(c),
                }
            }
            current = next;
        }
        tracing::debug!(iterations = self.iterations, len = current.len(), "grammar expanded");
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_f(s: &str) -> usize {
        s.chars().filter(|&c| c == 'F').count()
    }

    #[test]
    fn simple_tree_one_iteration() {
        let s = Grammar::preset(TreeType::Simple, 1).expand();
        assert_eq!(s, "FF+[+F-F-F]-[-F+F+F]");
        assert_eq!(s.len(), 20);
    }

    #[test]
    fn simple_tree_two_iterations_rewrites_every_f() {
        let once = Grammar::preset(TreeType::Simple, 1).expand();
        let twice = Grammar::preset(TreeType::Simple, 2).expand();
        let manual: String = once
            .chars()
            .map(|c| if c == 'F' { "FF+[+F-F-F]-[-F+F+F]".to_string() } else { c.to_string() })
            .collect();
        assert_eq!(twice, manual);
        assert_eq!(count_f(&twice), 8 * 8);
    }

    #[test]
    fn zero_iterations_returns_axiom() {
        assert_eq!(Grammar::preset(TreeType::Bushy, 0).expand(), "X");
    }

    #[test]
    fn rewriting_is_parallel() {
        // Sequential rewriting would turn "A" into "C" within one pass.
        let g = Grammar::new("A").with_rule('A', "B").with_rule('B', "C").with_iterations(1);
        assert_eq!(g.expand(), "B");
        assert_eq!(g.clone().with_iterations(2).expand(), "C");
    }

    #[test]
    fn unknown_symbols_pass_through() {
        let g = Grammar::new("+F[-Q]").with_rule('F', "FF").with_iterations(2);
        assert_eq!(g.expand(), "+FFFF[-Q]");
    }

    #[test]
    fn three_d_tree_growth() {
        // One F becomes 5 Fs and 14 other symbols; non-F symbols are never rewritten.
        let rule_len = "F[+&F][-&F][^F][/F]".len();
        assert_eq!(rule_len, 19);
        for n in 0..5u32 {
            let s = Grammar::preset(TreeType::ThreeD, n).expand();
            let fives = 5usize.pow(n);
            assert_eq!(count_f(&s), fives, "F count at n={n}");
            assert_eq!(s.len(), 1 + (rule_len - 1) * (fives - 1) / 4, "length at n={n}");
        }
    }

    #[test]
    fn expansion_deterministic() {
        let g = Grammar::preset(TreeType::Willow, 4);
        assert_eq!(g.expand(), g.expand());
    }

    #[test]
    fn tree_type_from_index() {
        assert_eq!(TreeType::from_index(3).unwrap(), TreeType::ThreeD);
        assert!(matches!(TreeType::from_index(4), Err(SylvaError::UnknownTreeType(4))));
        assert!(TreeType::from_index(-1).is_err());
    }

    #[test]
    fn tree_type_deserialises_from_index_or_name() {
        let parse = |json: &str| serde_json::from_str::<TreeType>(json);
        assert_eq!(parse("2").unwrap(), TreeType::Willow);
        assert_eq!(parse(r#""Bushy""#).unwrap(), TreeType::Bushy);
        assert_eq!(parse(r#""3D Tree""#).unwrap(), TreeType::ThreeD);
        assert!(parse("7").is_err());
        assert!(parse(r#""Oak""#).is_err());
        let json = serde_json::to_string(&TreeType::ThreeD).unwrap();
        assert_eq!(parse(&json).unwrap(), TreeType::ThreeD);
    }
}
