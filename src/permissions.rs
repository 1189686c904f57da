use std::collections::{HashMap, HashSet};

use crate::models::{CapabilityNode, RoleCapability};

/// capability_tree
///
/// Nests a role's flat `role_capablities` rows by `PARENTID`.
///
/// - Roots are rows without a parent, or whose parent is not among `rows`.
/// - Siblings are ordered by `ID`.
/// - Rows whose ancestry never reaches a root (a `PARENTID` cycle) are left out.
///
/// The walk is iterative, so arbitrarily deep menus cannot overflow the stack.
pub fn capability_tree(mut rows: Vec<RoleCapability>) -> Vec<CapabilityNode> {
    rows.sort_by_key(|row| row.id);
    let ids: HashSet<i64> = rows.iter().map(|row| row.id).collect();

    let mut children: HashMap<i64, Vec<usize>> = HashMap::new();
    let mut roots = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        match row.parentid {
            Some(parent) if ids.contains(&parent) => children.entry(parent).or_default().push(idx),
            _ => roots.push(idx),
        }
    }

    // Pre-order walk. Each entry is (row index, slot of the parent entry).
    let mut order: Vec<(usize, Option<usize>)> = Vec::with_capacity(rows.len());
    let mut stack: Vec<(usize, Option<usize>)> = roots.iter().rev().map(|&idx| (idx, None)).collect();
    while let Some((idx, parent)) = stack.pop() {
        let slot = order.len();
        order.push((idx, parent));
        if let Some(kids) = children.get(&rows[idx].id) {
            stack.extend(kids.iter().rev().map(|&kid| (kid, Some(slot))));
        }
    }

    if order.len() < rows.len() {
        tracing::warn!(
            omitted = rows.len() - order.len(),
            "role capabilities unreachable from a root were left out of the tree"
        );
    }

    // Assemble bottom-up: every entry's children are complete before the entry itself.
    let mut rows: Vec<Option<RoleCapability>> = rows.into_iter().map(Some).collect();
    let mut pending: Vec<Vec<CapabilityNode>> = (0..order.len()).map(|_| Vec::new()).collect();
    let mut tree = Vec::new();
    for slot in (0..order.len()).rev() {
        let (idx, parent) = order[slot];
        let Some(capability) = rows[idx].take() else {
            continue;
        };
        let mut kids = std::mem::take(&mut pending[slot]);
        kids.reverse();
        let node = CapabilityNode {
            capability,
            children: kids,
        };
        match parent {
            Some(parent_slot) => pending[parent_slot].push(node),
            None => tree.push(node),
        }
    }
    tree.reverse();
    tree
}
