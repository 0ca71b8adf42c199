//! Declarative transition rules.

use crate::core::State;
use serde::Deserialize;

/// One row of a transition list: a source state and its legal targets.
///
/// A missing `from` or `to` entry in configuration normalizes to the null
/// state rather than failing to parse.
///
/// # Example
///
/// ```rust
/// use phasecraft::builder::TransitionRule;
/// use phasecraft::game::GamePhase;
///
/// let rule: TransitionRule<GamePhase> =
///     serde_json::from_str(r#"{"from": "Playing", "to": ["Pause", "Gameover"]}"#).unwrap();
///
/// assert_eq!(rule.from, GamePhase::Playing);
/// assert_eq!(rule.to, vec![GamePhase::Pause, GamePhase::Gameover]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(bound = "")]
pub struct TransitionRule<S: State> {
    #[serde(default)]
    pub from: S,
    #[serde(default)]
    pub to: Vec<S>,
}

impl<S: State> TransitionRule<S> {
    pub fn new(from: S, to: impl IntoIterator<Item = S>) -> Self {
        Self {
            from,
            to: to.into_iter().collect(),
        }
    }

    /// Expand into `(from, to)` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (S, S)> + '_ {
        self.to.iter().map(move |to| (self.from.clone(), to.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
    enum TestState {
        #[default]
        None,
        Initial,
        Processing,
        Complete,
    }

    impl State for TestState {
        fn name(&self) -> &str {
            match self {
                Self::None => "None",
                Self::Initial => "Initial",
                Self::Processing => "Processing",
                Self::Complete => "Complete",
            }
        }
    }

    #[test]
    fn pairs_expand_every_target() {
        let rule = TransitionRule::new(
            TestState::Initial,
            [TestState::Processing, TestState::Complete],
        );
        let pairs: Vec<_> = rule.pairs().collect();
        assert_eq!(
            pairs,
            vec![
                (TestState::Initial, TestState::Processing),
                (TestState::Initial, TestState::Complete),
            ]
        );
    }

    #[test]
    fn missing_fields_normalize_to_null() {
        let rule: TransitionRule<TestState> = serde_json::from_str("{}").unwrap();
        assert!(rule.from.is_null());
        assert!(rule.to.is_empty());
    }
}
