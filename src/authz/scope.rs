use std::collections::BTreeSet;

use super::location::{LgaId, StateId};
use super::principal::Principal;

/// Which records a principal may list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordScope {
    All,
    /// Records whose state is in `states` OR whose LGA is in `lgas`.
    Restricted {
        states: BTreeSet<StateId>,
        lgas: BTreeSet<LgaId>,
    },
}

impl RecordScope {
    pub fn for_principal(principal: &Principal) -> Self {
        if principal.is_admin() {
            return RecordScope::All;
        }

        RecordScope::Restricted {
            states: principal.state_grants.iter().copied().collect(),
            lgas: principal.lga_grants.iter().copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RecordScope::All => false,
            RecordScope::Restricted { states, lgas } => states.is_empty() && lgas.is_empty(),
        }
    }

    /// SQL predicate over `state_id` / `lga_id` columns plus the values to bind
    /// in order. Ids are bound, never interpolated.
    pub fn sql_predicate(&self) -> (String, Vec<i64>) {
        match self {
            RecordScope::All => ("1 = 1".to_string(), Vec::new()),
            RecordScope::Restricted { states, lgas } => {
                let mut clauses = Vec::new();
                let mut binds = Vec::new();
                if !states.is_empty() {
                    clauses.push(format!("state_id IN ({})", placeholders(states.len())));
                    binds.extend(states.iter().map(|s| s.0));
                }
                if !lgas.is_empty() {
                    clauses.push(format!("lga_id IN ({})", placeholders(lgas.len())));
                    binds.extend(lgas.iter().map(|l| l.0));
                }
                if clauses.is_empty() {
                    ("1 = 0".to_string(), binds)
                } else {
                    (format!("({})", clauses.join(" OR ")), binds)
                }
            }
        }
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::location::Placement;

    fn matches(scope: &RecordScope, placement: &Placement) -> bool {
        match scope {
            RecordScope::All => true,
            RecordScope::Restricted { states, lgas } => {
                states.contains(&placement.state_id) || lgas.contains(&placement.lga_id)
            }
        }
    }

    #[test]
    fn admin_sees_everything() {
        let admin = Principal::new(1).with_role("admin", Vec::<String>::new());
        let scope = RecordScope::for_principal(&admin);
        assert_eq!(scope, RecordScope::All);
        assert!(matches(&scope, &Placement::new(1, 2, None)));
        assert_eq!(scope.sql_predicate(), ("1 = 1".to_string(), vec![]));
    }

    #[test]
    fn grants_restrict_by_state_or_lga() {
        let user = Principal::new(2).with_state_grants([5]).with_lga_grants([30]);
        let scope = RecordScope::for_principal(&user);

        assert!(matches(&scope, &Placement::new(5, 9, None)));
        assert!(matches(&scope, &Placement::new(20, 30, None)));
        assert!(!matches(&scope, &Placement::new(20, 31, None)));

        let (sql, binds) = scope.sql_predicate();
        assert_eq!(sql, "(state_id IN (?) OR lga_id IN (?))");
        assert_eq!(binds, vec![5, 30]);
    }

    #[test]
    fn no_grants_means_no_records() {
        let user = Principal::new(3)
            .with_role("editor", ["view_records"])
            .with_ward_grants([42]);
        let scope = RecordScope::for_principal(&user);

        assert!(scope.is_empty());
        assert!(!matches(&scope, &Placement::new(5, 9, Some(42))));
        assert_eq!(scope.sql_predicate().0, "1 = 0");
    }
}
