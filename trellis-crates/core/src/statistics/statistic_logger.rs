use std::fmt::Display;

use itertools::Itertools;

use super::statistic_logging::log_statistic;

/// The solver component a statistic belongs to, given as the path of fields leading to it.
///
/// The written name is the path joined with underscores, so the `num_failures` field of the search
/// statistics is written as `search_num_failures`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StatisticScope {
    path: Vec<String>,
}

impl StatisticScope {
    /// The scope of a top-level solver component such as `propagation` or `search`.
    pub fn component(name: impl Display) -> Self {
        Self {
            path: vec![name.to_string()],
        }
    }

    /// The scope of the field `name` inside this scope.
    pub fn field(&self, name: impl Display) -> Self {
        let mut path = self.path.clone();
        path.push(name.to_string());
        Self { path }
    }

    /// The name under which a statistic in this scope is written; empty segments are skipped.
    pub fn name(&self) -> String {
        self.path
            .iter()
            .filter(|segment| !segment.is_empty())
            .join("_")
    }

    /// Writes `value` as the statistic of this scope.
    pub fn log(&self, value: impl Display) {
        log_statistic(self.name(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_are_named_after_their_component() {
        let scope = StatisticScope::component("search").field("num_failures");

        assert_eq!("search_num_failures", scope.name());
    }

    #[test]
    fn nested_fields_extend_the_path() {
        let scope = StatisticScope::component("propagation")
            .field("arcs")
            .field("num_executions");

        assert_eq!("propagation_arcs_num_executions", scope.name());
    }

    #[test]
    fn an_unnamed_scope_names_only_its_fields() {
        let scope = StatisticScope::default().field("num_solutions");

        assert_eq!("num_solutions", scope.name());
        assert_eq!(StatisticScope::component("num_solutions"), scope);
    }
}
