//! Rule evaluation with three-valued logic.
//!
//! `evaluate` is a pure function of a rule tree and a snapshot. Leaves
//! that read an absent fact are UNKNOWN and report that fact as missing;
//! combinators propagate the union of their evaluated children's missing
//! sets. `dependency` leaves are answered by a [`DependencyResolver`].

use civicnav_catalog::{Rule, StatusCondition};

use crate::compare::compare_values;
use crate::ternary::{Evaluation, Tri};
use crate::types::{FactKey, FactValue, Snapshot, StatusStore};

/// Answers `dependency` leaves: does another service's status match?
pub trait DependencyResolver {
    fn resolve(&mut self, service: &str, condition: StatusCondition) -> Evaluation;
}

/// Resolves dependencies from recorded statuses alone.
///
/// An `unknown` status stays UNKNOWN; no proxy evaluation of the other
/// service's rules is attempted.
pub struct RecordedStatuses<'a> {
    statuses: &'a StatusStore,
}

impl<'a> RecordedStatuses<'a> {
    pub fn new(statuses: &'a StatusStore) -> Self {
        RecordedStatuses { statuses }
    }
}

impl DependencyResolver for RecordedStatuses<'_> {
    fn resolve(&mut self, service: &str, condition: StatusCondition) -> Evaluation {
        let status = self.statuses.get(service);
        if status.is_known() {
            Evaluation::known(status.satisfies(condition))
        } else {
            Evaluation::unknown()
        }
    }
}

/// Evaluate `rule`, answering dependencies from recorded statuses only.
pub fn evaluate(rule: &Rule, snapshot: &Snapshot) -> Evaluation {
    let mut deps = RecordedStatuses::new(&snapshot.statuses);
    evaluate_with(rule, snapshot, &mut deps)
}

/// Evaluate a service's top-level rule list (an implicit `all`).
pub fn evaluate_all(
    rules: &[Rule],
    snapshot: &Snapshot,
    deps: &mut dyn DependencyResolver,
) -> Evaluation {
    conjunction(rules, snapshot, deps)
}

/// Evaluate `rule` with a caller-supplied dependency resolver.
pub fn evaluate_with(
    rule: &Rule,
    snapshot: &Snapshot,
    deps: &mut dyn DependencyResolver,
) -> Evaluation {
    match rule {
        Rule::Boolean {
            label,
            field,
            expected,
        } => match snapshot.facts.get(field) {
            None => Evaluation::missing(field.clone()),
            Some(FactValue::Bool(b)) => Evaluation::known(b == expected),
            Some(other) => degraded(label, field, format!("expected boolean, got {}", other.type_name())),
        },

        Rule::Comparison {
            label,
            field,
            op,
            value,
        } => match snapshot.facts.get(field) {
            None => Evaluation::missing(field.clone()),
            Some(actual) => match compare_values(actual, *op, value) {
                Ok(b) => Evaluation::known(b),
                Err(e) => degraded(label, field, e.to_string()),
            },
        },

        Rule::EnumMembership {
            label,
            field,
            values,
        } => match snapshot.facts.get(field) {
            None => Evaluation::missing(field.clone()),
            Some(FactValue::Label(l)) => Evaluation::known(values.contains(l)),
            Some(other) => degraded(label, field, format!("expected label, got {}", other.type_name())),
        },

        Rule::Deadline {
            label,
            trigger,
            max_days,
        } => match snapshot.facts.get(trigger) {
            None => Evaluation::missing(trigger.clone()),
            Some(FactValue::Date(event)) => {
                let delta = (snapshot.today - *event).whole_days();
                Evaluation::known(within_deadline(delta, *max_days))
            }
            Some(other) => degraded(label, trigger, format!("expected date, got {}", other.type_name())),
        },

        Rule::Dependency {
            service, condition, ..
        } => deps.resolve(service, *condition),

        Rule::Not { child, .. } => evaluate_with(child, snapshot, deps).negate(),

        Rule::Any { children, .. } => disjunction(children, snapshot, deps),

        Rule::All { children, .. } => conjunction(children, snapshot, deps),
    }
}

/// Deadline sign convention.
///
/// `delta` is today minus the event date, in days. A non-negative
/// `max_days` means "within N days after the event"; a negative one means
/// "at least |N| days before the event".
pub fn within_deadline(delta: i64, max_days: i64) -> bool {
    if max_days >= 0 {
        (0..=max_days).contains(&delta)
    } else {
        delta <= max_days
    }
}

/// TRUE if any child is TRUE; else UNKNOWN if any is UNKNOWN; else FALSE.
fn disjunction(children: &[Rule], snapshot: &Snapshot, deps: &mut dyn DependencyResolver) -> Evaluation {
    let mut acc = Evaluation::known(false);
    for child in children {
        let e = evaluate_with(child, snapshot, deps);
        acc.missing.extend(e.missing);
        match e.value {
            Tri::True => {
                acc.value = Tri::True;
                return acc;
            }
            Tri::Unknown => acc.value = Tri::Unknown,
            Tri::False => {}
        }
    }
    acc
}

/// FALSE if any child is FALSE; else UNKNOWN if any is UNKNOWN; else TRUE.
fn conjunction(children: &[Rule], snapshot: &Snapshot, deps: &mut dyn DependencyResolver) -> Evaluation {
    let mut acc = Evaluation::known(true);
    for child in children {
        let e = evaluate_with(child, snapshot, deps);
        acc.missing.extend(e.missing);
        match e.value {
            Tri::False => {
                acc.value = Tri::False;
                return acc;
            }
            Tri::Unknown => acc.value = Tri::Unknown,
            Tri::True => {}
        }
    }
    acc
}

/// A leaf whose stored fact has the wrong type: UNKNOWN, logged, re-asked.
fn degraded(label: &str, field: &FactKey, reason: String) -> Evaluation {
    tracing::warn!(rule = %label, fact = %field, reason = %reason, "rule leaf degraded to unknown");
    Evaluation::missing(field.clone())
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ServiceStatus;
    use civicnav_catalog::CompareOp;
    use rust_decimal::Decimal;
    use std::collections::BTreeSet;
    use time::macros::date;
    use time::Duration;

    const TODAY: time::Date = date!(2026 - 10 - 18);

    fn snapshot() -> Snapshot {
        Snapshot::new(TODAY)
    }

    fn flag(name: &str) -> Rule {
        Rule::Boolean {
            label: name.to_string(),
            field: FactKey::custom(name),
            expected: true,
        }
    }

    fn adult() -> Rule {
        Rule::Comparison {
            label: "adult".to_string(),
            field: FactKey::field("age"),
            op: CompareOp::Ge,
            value: FactValue::Number(Decimal::from(18)),
        }
    }

    fn all(children: Vec<Rule>) -> Rule {
        Rule::All {
            label: "all".to_string(),
            children,
        }
    }

    fn any(children: Vec<Rule>) -> Rule {
        Rule::Any {
            label: "any".to_string(),
            children,
        }
    }

    fn not(child: Rule) -> Rule {
        Rule::Not {
            label: "not".to_string(),
            child: Box::new(child),
        }
    }

    fn deadline(max_days: i64) -> Rule {
        Rule::Deadline {
            label: "deadline".to_string(),
            trigger: FactKey::field("born_on"),
            max_days,
        }
    }

    fn born_days_ago(days: i64) -> Snapshot {
        snapshot().with_fact(
            FactKey::field("born_on"),
            FactValue::Date(TODAY - Duration::days(days)),
        )
    }

    fn keys(e: &Evaluation) -> Vec<String> {
        e.missing.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn absent_leaf_is_unknown_with_missing_key() {
        let e = evaluate(&adult(), &snapshot());
        assert_eq!(e.value, Tri::Unknown);
        assert_eq!(keys(&e), vec!["age"]);
    }

    #[test]
    fn present_leaf_is_conclusive_with_nothing_missing() {
        let s = snapshot().with_fact(FactKey::field("age"), FactValue::Number(Decimal::from(17)));
        let e = evaluate(&adult(), &s);
        assert_eq!(e, Evaluation::known(false));
    }

    #[test]
    fn enum_membership() {
        let rule = Rule::EnumMembership {
            label: "partnered".to_string(),
            field: FactKey::field("relationship"),
            values: BTreeSet::from(["married".to_string(), "civil-partnership".to_string()]),
        };
        let s = snapshot().with_fact(
            FactKey::field("relationship"),
            FactValue::Label("civil-partnership".to_string()),
        );
        assert_eq!(evaluate(&rule, &s).value, Tri::True);
        let s = snapshot().with_fact(FactKey::field("relationship"), FactValue::Label("single".to_string()));
        assert_eq!(evaluate(&rule, &s).value, Tri::False);
    }

    #[test]
    fn empty_combinators_are_vacuous() {
        assert_eq!(evaluate(&all(vec![]), &snapshot()), Evaluation::known(true));
        assert_eq!(evaluate(&any(vec![]), &snapshot()), Evaluation::known(false));
        assert_eq!(
            evaluate_all(&[], &snapshot(), &mut RecordedStatuses::new(&StatusStore::new())),
            Evaluation::known(true)
        );
    }

    #[test]
    fn any_and_all_truth_tables() {
        let s = snapshot()
            .with_fact(FactKey::custom("yes"), FactValue::Bool(true))
            .with_fact(FactKey::custom("no"), FactValue::Bool(false));

        assert_eq!(evaluate(&any(vec![flag("no"), flag("yes")]), &s).value, Tri::True);
        assert_eq!(evaluate(&any(vec![flag("no"), flag("unset")]), &s).value, Tri::Unknown);
        assert_eq!(evaluate(&any(vec![flag("no"), flag("no")]), &s).value, Tri::False);

        assert_eq!(evaluate(&all(vec![flag("yes"), flag("no")]), &s).value, Tri::False);
        assert_eq!(evaluate(&all(vec![flag("yes"), flag("unset")]), &s).value, Tri::Unknown);
        assert_eq!(evaluate(&all(vec![flag("yes"), flag("yes")]), &s).value, Tri::True);
    }

    #[test]
    fn combinators_union_missing_of_evaluated_children() {
        let s = snapshot().with_fact(FactKey::custom("no"), FactValue::Bool(false));
        let e = evaluate(&any(vec![flag("a"), flag("no"), flag("b")]), &s);
        assert_eq!(e.value, Tri::Unknown);
        assert_eq!(keys(&e), vec!["custom.a", "custom.b"]);

        // Short-circuits at the first FALSE child; later children are not evaluated.
        let e = evaluate(&all(vec![flag("a"), flag("no"), flag("b")]), &s);
        assert_eq!(e.value, Tri::False);
        assert_eq!(keys(&e), vec!["custom.a"]);
    }

    #[test]
    fn double_negation() {
        let yes = snapshot().with_fact(FactKey::custom("x"), FactValue::Bool(true));
        let no = snapshot().with_fact(FactKey::custom("x"), FactValue::Bool(false));
        for s in [&yes, &no] {
            let base = evaluate(&flag("x"), s).value;
            assert_eq!(evaluate(&not(not(flag("x"))), s).value, base);
            assert_eq!(evaluate(&not(flag("x")), s).value, base.negate());
        }
        let e = evaluate(&not(flag("x")), &snapshot());
        assert_eq!(e.value, Tri::Unknown);
        assert_eq!(keys(&e), vec!["custom.x"]);
    }

    #[test]
    fn deadline_within_window() {
        assert_eq!(evaluate(&deadline(42), &born_days_ago(10)).value, Tri::True);
        assert_eq!(evaluate(&deadline(42), &born_days_ago(42)).value, Tri::True);
        assert_eq!(evaluate(&deadline(42), &born_days_ago(0)).value, Tri::True);
        assert_eq!(evaluate(&deadline(42), &born_days_ago(50)).value, Tri::False);
    }

    #[test]
    fn deadline_event_in_future_is_false_for_window_rules() {
        assert_eq!(evaluate(&deadline(42), &born_days_ago(-3)).value, Tri::False);
    }

    #[test]
    fn deadline_absent_trigger_is_unknown() {
        let e = evaluate(&deadline(42), &snapshot());
        assert_eq!(e.value, Tri::Unknown);
        assert_eq!(keys(&e), vec!["born_on"]);
    }

    #[test]
    fn deadline_lead_time() {
        // "at least 14 days before the event"
        assert_eq!(evaluate(&deadline(-14), &born_days_ago(-30)).value, Tri::True);
        assert_eq!(evaluate(&deadline(-14), &born_days_ago(-14)).value, Tri::True);
        assert_eq!(evaluate(&deadline(-14), &born_days_ago(-13)).value, Tri::False);
        assert_eq!(evaluate(&deadline(-14), &born_days_ago(5)).value, Tri::False);
    }

    #[test]
    fn type_mismatch_degrades_only_that_leaf() {
        let s = snapshot()
            .with_fact(FactKey::field("age"), FactValue::Label("forty".to_string()))
            .with_fact(FactKey::custom("yes"), FactValue::Bool(true));
        let e = evaluate(&any(vec![adult(), flag("yes")]), &s);
        assert_eq!(e.value, Tri::True);
        let e = evaluate(&all(vec![adult(), flag("yes")]), &s);
        assert_eq!(e.value, Tri::Unknown);
        assert_eq!(keys(&e), vec!["age"]);
    }

    #[test]
    fn dependency_from_recorded_status() {
        let rule = Rule::Dependency {
            label: "on uc".to_string(),
            service: "uc".to_string(),
            condition: StatusCondition::Receiving,
        };
        assert_eq!(evaluate(&rule, &snapshot()).value, Tri::Unknown);
        let s = snapshot().with_status("uc", ServiceStatus::Receiving);
        assert_eq!(evaluate(&rule, &s).value, Tri::True);
        let s = snapshot().with_status("uc", ServiceStatus::Completed);
        assert_eq!(evaluate(&rule, &s).value, Tri::False);
    }

    #[test]
    fn monotonic_refinement() {
        let rule = any(vec![
            all(vec![adult(), flag("a")]),
            not(flag("b")),
            deadline(30),
        ]);
        let steps: Vec<(FactKey, FactValue)> = vec![
            (FactKey::custom("a"), FactValue::Bool(true)),
            (FactKey::field("age"), FactValue::Number(Decimal::from(30))),
            (FactKey::custom("b"), FactValue::Bool(true)),
            (FactKey::field("born_on"), FactValue::Date(TODAY - Duration::days(100))),
        ];
        let mut s = snapshot();
        let mut settled: Option<Tri> = None;
        for (k, v) in steps {
            s.facts.set(k, v);
            let value = evaluate(&rule, &s).value;
            if let Some(prev) = settled {
                assert_eq!(value, prev, "conclusive value changed after adding facts");
            } else if value.is_known() {
                settled = Some(value);
            }
        }
        assert_eq!(settled, Some(Tri::True));
    }

    #[test]
    fn within_deadline_sign_convention() {
        assert!(within_deadline(0, 0));
        assert!(!within_deadline(1, 0));
        assert!(!within_deadline(-1, 0));
        assert!(within_deadline(-7, -7));
        assert!(!within_deadline(-6, -7));
    }
}
