use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Breadth-first shortest path from `start` to `goal`, both ends included.
///
/// Neighbours are visited in their set order, so ties resolve the same way on
/// every run. Returns `None` when `goal` is unreachable.
pub fn bfs_shortest_path<N>(graph: &BTreeMap<N, BTreeSet<N>>, start: &N, goal: &N) -> Option<Vec<N>>
where
    N: Ord + Clone,
{
    if start == goal {
        return Some(vec![start.clone()]);
    }

    let mut came_from: BTreeMap<N, N> = BTreeMap::new();
    let mut visited: BTreeSet<N> = BTreeSet::from([start.clone()]);
    let mut queue: VecDeque<N> = VecDeque::from([start.clone()]);

    while let Some(node) = queue.pop_front() {
        let Some(neighbours) = graph.get(&node) else {
            continue;
        };
        for next in neighbours {
            if !visited.insert(next.clone()) {
                continue;
            }
            came_from.insert(next.clone(), node.clone());
            if next == goal {
                let mut path = vec![goal.clone()];
                let mut cursor = goal;
                while let Some(prev) = came_from.get(cursor) {
                    path.push(prev.clone());
                    cursor = prev;
                }
                path.reverse();
                return Some(path);
            }
            queue.push_back(next.clone());
        }
    }
    None
}
