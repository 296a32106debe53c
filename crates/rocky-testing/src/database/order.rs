//! Deletion ordering
//!
//! Tables are ordered so that every dependent precedes the principals it
//! references. The graph is rebuilt from the model on every call.

use std::collections::{HashMap, HashSet};

use rocky_orm::{Entity, TableMetadata};

use crate::{TestError, TestResult};

/// Options for a wipe call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WipeOptions {
    /// Quote identifiers and include the schema
    pub add_brackets_and_schema: bool,
    /// Number of peeling passes after the leaf pass before giving up
    pub max_depth: usize,
    /// Entity identities left out of the wipe
    pub excluded: HashSet<String>,
}

impl Default for WipeOptions {
    fn default() -> Self {
        Self {
            add_brackets_and_schema: false,
            max_depth: 10,
            excluded: HashSet::new(),
        }
    }
}

impl WipeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_brackets_and_schema(mut self, enabled: bool) -> Self {
        self.add_brackets_and_schema = enabled;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Leave the table with this entity identity untouched
    pub fn exclude(mut self, entity: impl Into<String>) -> Self {
        self.excluded.insert(entity.into());
        self
    }

    pub fn exclude_entity<E: Entity>(self) -> Self {
        self.exclude(E::entity_name())
    }

    pub fn is_excluded(&self, entity: &str) -> bool {
        self.excluded.contains(entity)
    }
}

/// Order `tables` for deletion, dependents first.
///
/// Excluded tables and every key pointing at them are dropped first. Tables with
/// a self-reference that would block a bulk delete fail the whole call. Leaves
/// (tables nothing else references) come first in declaration order, then each
/// pass emits the tables whose remaining dependents have all been emitted.
pub fn deletion_order<'a>(
    tables: &'a [TableMetadata],
    options: &WipeOptions,
) -> TestResult<Vec<&'a TableMetadata>> {
    let in_scope: Vec<&TableMetadata> = tables
        .iter()
        .filter(|table| !options.is_excluded(&table.entity))
        .collect();

    let self_referencing: Vec<String> = in_scope
        .iter()
        .filter(|table| {
            table
                .self_references()
                .any(|fk| fk.delete_behavior.blocks_self_delete())
        })
        .map(|table| table.entity.clone())
        .collect();
    if !self_referencing.is_empty() {
        return Err(TestError::UnsupportedSelfReference {
            tables: self_referencing,
        });
    }

    let known: HashSet<&str> = in_scope.iter().map(|table| table.entity.as_str()).collect();

    // Distinct in-scope dependents per principal
    let mut dependents: HashMap<&str, HashSet<&str>> = HashMap::new();
    for table in &in_scope {
        for principal in table.principals().filter(|p| known.contains(p)) {
            dependents
                .entry(principal)
                .or_default()
                .insert(table.entity.as_str());
        }
    }

    let mut ordered: Vec<&TableMetadata> = Vec::with_capacity(in_scope.len());
    let mut emitted: HashSet<&str> = HashSet::with_capacity(in_scope.len());
    let mut remaining = in_scope;
    let mut depth = 0;

    while !remaining.is_empty() {
        let (ready, blocked): (Vec<&TableMetadata>, Vec<&TableMetadata>) =
            remaining.into_iter().partition(|table| {
                dependents
                    .get(table.entity.as_str())
                    .map_or(true, |deps| deps.iter().all(|dep| emitted.contains(dep)))
            });

        if ready.is_empty() {
            return Err(circular(depth, &blocked));
        }

        tracing::trace!(depth, tables = ready.len(), "Resolved deletion pass");
        emitted.extend(ready.iter().map(|table| table.entity.as_str()));
        ordered.extend(ready);
        remaining = blocked;

        if !remaining.is_empty() {
            depth += 1;
            if depth > options.max_depth {
                return Err(circular(options.max_depth, &remaining));
            }
        }
    }

    Ok(ordered)
}

fn circular(depth: usize, remaining: &[&TableMetadata]) -> TestError {
    TestError::CircularReferenceSuspected {
        depth,
        remaining: remaining.iter().map(|table| table.entity.clone()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocky_orm::DeleteBehavior;

    fn entities<'a>(order: &[&'a TableMetadata]) -> Vec<&'a str> {
        order.iter().map(|table| table.entity.as_str()).collect()
    }

    fn position(order: &[&str], entity: &str) -> usize {
        order.iter().position(|e| *e == entity).unwrap()
    }

    fn shop() -> Vec<TableMetadata> {
        vec![
            TableMetadata::new("Customer"),
            TableMetadata::new("Order").references("Customer", DeleteBehavior::Cascade),
            TableMetadata::new("OrderLine").references("Order", DeleteBehavior::Cascade),
        ]
    }

    #[test]
    fn test_customer_order_line_scenario() {
        let tables = shop();
        let order = deletion_order(&tables, &WipeOptions::default()).unwrap();
        assert_eq!(entities(&order), vec!["OrderLine", "Order", "Customer"]);
    }

    #[test]
    fn test_self_referencing_restrict_is_rejected() {
        let tables = vec![TableMetadata::new("Category").references("Category", DeleteBehavior::Restrict)];

        match deletion_order(&tables, &WipeOptions::default()) {
            Err(TestError::UnsupportedSelfReference { tables }) => assert_eq!(tables, vec!["Category"]),
            other => panic!("expected UnsupportedSelfReference, got {:?}", other),
        }
    }

    #[test]
    fn test_self_reference_guard_names_every_offender() {
        let tables = vec![
            TableMetadata::new("Category").references("Category", DeleteBehavior::ClientSetNull),
            TableMetadata::new("Tag"),
            TableMetadata::new("Employee").references("Employee", DeleteBehavior::Restrict),
        ];

        match deletion_order(&tables, &WipeOptions::default()) {
            Err(TestError::UnsupportedSelfReference { tables }) => {
                assert_eq!(tables, vec!["Category", "Employee"])
            }
            other => panic!("expected UnsupportedSelfReference, got {:?}", other),
        }
    }

    #[test]
    fn test_permissive_self_reference_is_ignored() {
        let tables = vec![
            TableMetadata::new("Folder").references("Folder", DeleteBehavior::Cascade),
            TableMetadata::new("Node").references("Node", DeleteBehavior::SetNull),
        ];
        let order = deletion_order(&tables, &WipeOptions::default()).unwrap();
        assert_eq!(entities(&order), vec!["Folder", "Node"]);
    }

    #[test]
    fn test_excluded_self_reference_is_not_checked() {
        let tables = vec![
            TableMetadata::new("Category").references("Category", DeleteBehavior::Restrict),
            TableMetadata::new("Product").references("Category", DeleteBehavior::Restrict),
        ];
        let options = WipeOptions::default().exclude("Category");

        let order = deletion_order(&tables, &options).unwrap();
        assert_eq!(entities(&order), vec!["Product"]);
    }

    #[test]
    fn test_two_table_cycle_is_rejected() {
        let tables = vec![
            TableMetadata::new("A").references("B", DeleteBehavior::Restrict),
            TableMetadata::new("B").references("A", DeleteBehavior::Restrict),
        ];

        match deletion_order(&tables, &WipeOptions::default()) {
            Err(TestError::CircularReferenceSuspected { depth, remaining }) => {
                assert_eq!(depth, 0);
                assert_eq!(remaining, vec!["A", "B"]);
            }
            other => panic!("expected CircularReferenceSuspected, got {:?}", other),
        }
    }

    #[test]
    fn test_cycle_behind_leaves_reports_remaining() {
        let tables = vec![
            TableMetadata::new("Audit").references("A", DeleteBehavior::NoAction),
            TableMetadata::new("A").references("B", DeleteBehavior::Restrict),
            TableMetadata::new("B").references("A", DeleteBehavior::Restrict),
        ];

        match deletion_order(&tables, &WipeOptions::default()) {
            Err(TestError::CircularReferenceSuspected { depth, remaining }) => {
                assert_eq!(depth, 1);
                assert_eq!(remaining, vec!["A", "B"]);
            }
            other => panic!("expected CircularReferenceSuspected, got {:?}", other),
        }
    }

    #[test]
    fn test_exclusion_breaks_cycle() {
        let tables = vec![
            TableMetadata::new("A").references("B", DeleteBehavior::Restrict),
            TableMetadata::new("B").references("A", DeleteBehavior::Restrict),
            TableMetadata::new("C").references("A", DeleteBehavior::Cascade),
        ];
        let options = WipeOptions::default().exclude("B");

        let order = deletion_order(&tables, &options).unwrap();
        assert_eq!(entities(&order), vec!["C", "A"]);
    }

    #[test]
    fn test_max_depth_bounds_long_chains() {
        let tables: Vec<TableMetadata> = (0..5)
            .map(|i| {
                let table = TableMetadata::new(format!("T{}", i));
                if i == 0 {
                    table
                } else {
                    table.references(format!("T{}", i - 1), DeleteBehavior::Restrict)
                }
            })
            .collect();

        let order = deletion_order(&tables, &WipeOptions::default().with_max_depth(4)).unwrap();
        assert_eq!(entities(&order), vec!["T4", "T3", "T2", "T1", "T0"]);

        match deletion_order(&tables, &WipeOptions::default().with_max_depth(2)) {
            Err(TestError::CircularReferenceSuspected { depth, remaining }) => {
                assert_eq!(depth, 2);
                assert_eq!(remaining, vec!["T0", "T1"]);
            }
            other => panic!("expected CircularReferenceSuspected, got {:?}", other),
        }
    }

    #[test]
    fn test_dependents_precede_principals_in_diamond() {
        let tables = vec![
            TableMetadata::new("Tenant"),
            TableMetadata::new("User").references("Tenant", DeleteBehavior::Restrict),
            TableMetadata::new("Project").references("Tenant", DeleteBehavior::Restrict),
            TableMetadata::new("Membership")
                .references("User", DeleteBehavior::Restrict)
                .references("Project", DeleteBehavior::Restrict),
            TableMetadata::new("Invoice")
                .references("Tenant", DeleteBehavior::Restrict)
                .references("Membership", DeleteBehavior::NoAction),
        ];

        let order = deletion_order(&tables, &WipeOptions::default()).unwrap();
        let order = entities(&order);
        assert_eq!(order.len(), tables.len());

        for table in &tables {
            for principal in table.principals() {
                assert!(
                    position(&order, &table.entity) < position(&order, principal),
                    "{} must be deleted before {}",
                    table.entity,
                    principal
                );
            }
        }
    }

    #[test]
    fn test_leaves_and_unknown_principals() {
        let tables = vec![
            TableMetadata::new("Setting"),
            TableMetadata::new("Log").references("Archive", DeleteBehavior::Restrict),
            TableMetadata::new("Country"),
            TableMetadata::new("Address").references("Country", DeleteBehavior::Restrict),
        ];

        let order = deletion_order(&tables, &WipeOptions::default()).unwrap();
        assert_eq!(entities(&order), vec!["Setting", "Log", "Address", "Country"]);
    }

    #[test]
    fn test_duplicate_keys_count_once() {
        let tables = vec![
            TableMetadata::new("Account"),
            TableMetadata::new("Transfer")
                .references("Account", DeleteBehavior::Restrict)
                .references("Account", DeleteBehavior::Restrict),
        ];

        let order = deletion_order(&tables, &WipeOptions::default()).unwrap();
        assert_eq!(entities(&order), vec!["Transfer", "Account"]);
    }

    #[test]
    fn test_empty_model() {
        let order = deletion_order(&[], &WipeOptions::default()).unwrap();
        assert!(order.is_empty());
    }

    #[test]
    fn test_exclude_entity() {
        struct Customer;
        impl Entity for Customer {
            fn table() -> TableMetadata {
                TableMetadata::new("Customer")
            }
        }

        let tables = shop();
        let options = WipeOptions::default().exclude_entity::<Customer>();
        let order = deletion_order(&tables, &options).unwrap();
        assert_eq!(entities(&order), vec!["OrderLine", "Order"]);
    }
}
