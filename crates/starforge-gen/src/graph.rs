//! Graph building blocks: the hyperlane simulation behind chokepoints, the
//! balanced tree behind the crew hierarchy and the DGM graph behind crew
//! friendships.

use std::collections::BTreeSet;

use rand::Rng;

use crate::stats::poisson;

// ─── Union-find ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct UnionFind {
  parent: Vec<usize>,
  rank:   Vec<u8>,
}

impl UnionFind {
  pub fn new(n: usize) -> Self {
    Self { parent: (0..n).collect(), rank: vec![0; n] }
  }

  pub fn find(&mut self, mut x: usize) -> usize {
    while self.parent[x] != x {
      self.parent[x] = self.parent[self.parent[x]];
      x = self.parent[x];
    }
    x
  }

  /// Merge the sets holding `a` and `b`. Returns `false` if they were
  /// already joined.
  pub fn union(&mut self, a: usize, b: usize) -> bool {
    let (ra, rb) = (self.find(a), self.find(b));
    if ra == rb {
      return false;
    }
    match self.rank[ra].cmp(&self.rank[rb]) {
      std::cmp::Ordering::Less => self.parent[ra] = rb,
      std::cmp::Ordering::Greater => self.parent[rb] = ra,
      std::cmp::Ordering::Equal => {
        self.parent[rb] = ra;
        self.rank[ra] += 1;
      }
    }
    true
  }
}

// ─── Hyperlanes ──────────────────────────────────────────────────────────────

/// An undirected lane network between star nodes.
#[derive(Debug, Clone)]
pub struct Hyperlanes {
  adjacency: Vec<BTreeSet<usize>>,
}

impl Hyperlanes {
  /// Simulate a clustered lane network over `nodes` stars.
  ///
  /// Nodes are split into `clusters` contiguous, evenly sized groups. Each
  /// group is a random recursive tree with a Poisson number of extra local
  /// lanes; groups are then linked by a Poisson number of long lanes, and
  /// whatever is still disconnected is bridged until one component remains.
  pub fn simulate(
    rng:      &mut impl Rng,
    nodes:    usize,
    clusters: usize,
    density:  f64,
  ) -> Self {
    let mut lanes = Self { adjacency: vec![BTreeSet::new(); nodes] };
    if nodes < 2 {
      return lanes;
    }

    let clusters = clusters.clamp(1, nodes);
    let bounds: Vec<(usize, usize)> = (0..clusters)
      .map(|k| (k * nodes / clusters, (k + 1) * nodes / clusters))
      .collect();

    for &(start, end) in &bounds {
      let size = end - start;
      for local in 1..size {
        let parent = rng.gen_range(0..local);
        lanes.connect(start + local, start + parent);
      }

      if size >= 2 {
        for _ in 0..poisson(rng, density * size as f64 / 4.0) {
          let a = rng.gen_range(start..end);
          let b = rng.gen_range(start..end);
          lanes.connect(a, b);
        }
      }
    }

    if clusters >= 2 {
      for _ in 0..poisson(rng, density * clusters as f64) {
        let ca = rng.gen_range(0..clusters);
        let mut cb = rng.gen_range(0..clusters - 1);
        if cb >= ca {
          cb += 1;
        }
        let a = rng.gen_range(bounds[ca].0..bounds[ca].1);
        let b = rng.gen_range(bounds[cb].0..bounds[cb].1);
        lanes.connect(a, b);
      }
    }

    lanes.bridge_components(rng);
    lanes
  }

  fn connect(&mut self, a: usize, b: usize) {
    if a != b {
      self.adjacency[a].insert(b);
      self.adjacency[b].insert(a);
    }
  }

  /// Link consecutive components, in order of their lowest node.
  fn bridge_components(&mut self, rng: &mut impl Rng) {
    let n = self.adjacency.len();
    let mut sets = UnionFind::new(n);
    for (a, neighbours) in self.adjacency.iter().enumerate() {
      for &b in neighbours {
        sets.union(a, b);
      }
    }

    let mut roots = Vec::new();
    let mut members: Vec<Vec<usize>> = Vec::new();
    for node in 0..n {
      let root = sets.find(node);
      match roots.iter().position(|r| *r == root) {
        Some(i) => members[i].push(node),
        None => {
          roots.push(root);
          members.push(vec![node]);
        }
      }
    }

    for pair in members.windows(2) {
      let a = pair[0][rng.gen_range(0..pair[0].len())];
      let b = pair[1][rng.gen_range(0..pair[1].len())];
      self.connect(a, b);
    }
  }

  pub fn len(&self) -> usize { self.adjacency.len() }

  pub fn is_empty(&self) -> bool { self.adjacency.is_empty() }

  pub fn degree(&self, node: usize) -> usize { self.adjacency[node].len() }

  /// Share of nodes with exactly one lane.
  pub fn dead_end_ratio(&self) -> f64 {
    if self.adjacency.is_empty() {
      return 0.0;
    }
    let dead_ends = self.adjacency.iter().filter(|n| n.len() == 1).count();
    dead_ends as f64 / self.adjacency.len() as f64
  }

  pub fn is_connected(&self) -> bool {
    if self.adjacency.is_empty() {
      return true;
    }
    let mut seen = vec![false; self.adjacency.len()];
    let mut stack = vec![0];
    seen[0] = true;
    while let Some(node) = stack.pop() {
      for &next in &self.adjacency[node] {
        if !seen[next] {
          seen[next] = true;
          stack.push(next);
        }
      }
    }
    seen.into_iter().all(|s| s)
  }
}

// ─── Balanced tree ───────────────────────────────────────────────────────────

/// A complete `branching`-ary tree of the given depth in BFS numbering.
/// Node 0 is the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalancedTree {
  pub branching: usize,
  pub depth:     u32,
}

impl BalancedTree {
  /// The shallowest tree with at least `nodes` nodes on its deepest level.
  pub fn for_nodes(nodes: usize, branching: usize) -> Self {
    Self { branching, depth: tree_depth(nodes, branching) }
  }

  pub fn size(&self) -> usize {
    (0..=self.depth).map(|level| self.branching.saturating_pow(level)).sum()
  }

  /// Parent of a non-root node.
  pub fn parent(&self, node: usize) -> Option<usize> {
    match node {
      0 => None,
      k => Some((k - 1) / self.branching),
    }
  }
}

/// Smallest `h` with `branching^h >= nodes`.
pub fn tree_depth(nodes: usize, branching: usize) -> u32 {
  let branching = branching.max(2);
  let mut depth = 0;
  let mut reach = 1usize;
  while reach < nodes {
    reach = reach.saturating_mul(branching);
    depth += 1;
  }
  depth
}

// ─── DGM graph ───────────────────────────────────────────────────────────────

/// The Dorogovtsev–Goltsev–Mendes graph of generation `generation`, as an
/// adjacency list in insertion order.
///
/// Generation 0 is a single edge. Each later generation adds, for every
/// existing edge, a new node joined to both its endpoints.
pub fn dgm_graph(generation: u32) -> Vec<Vec<usize>> {
  let mut adjacency = vec![vec![1], vec![0]];
  let mut edges = vec![(0, 1)];

  for _ in 0..generation {
    let snapshot = std::mem::take(&mut edges);
    edges.reserve(snapshot.len() * 3);
    for &(u, v) in &snapshot {
      let w = adjacency.len();
      adjacency.push(vec![u, v]);
      adjacency[u].push(w);
      adjacency[v].push(w);
      edges.extend([(u, v), (w, u), (w, v)]);
    }
  }
  adjacency
}

/// DGM generation used to give `n` crew members friends.
pub fn friendship_generation(n: usize) -> u32 {
  let x = n as f64 / 3.0 - 1.0;
  if x > 1.0 { x.log(3.0).ceil() as u32 } else { 0 }
}

#[cfg(test)]
mod tests {
  use rand::SeedableRng;
  use rand_chacha::ChaCha8Rng;

  use super::*;

  #[test]
  fn simulated_network_is_connected() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    for (nodes, clusters) in [(2, 2), (50, 3), (500, 12), (2000, 40)] {
      let lanes = Hyperlanes::simulate(&mut rng, nodes, clusters, 1.0);
      assert_eq!(lanes.len(), nodes);
      assert!(lanes.is_connected(), "{nodes} nodes in {clusters} clusters");
      assert!((0..nodes).all(|n| lanes.degree(n) >= 1));
      let ratio = lanes.dead_end_ratio();
      assert!((0.0..=1.0).contains(&ratio));
    }
  }

  #[test]
  fn tiny_networks_have_no_lanes() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let lanes = Hyperlanes::simulate(&mut rng, 1, 4, 1.0);
    assert_eq!(lanes.dead_end_ratio(), 0.0);
    assert!(Hyperlanes::simulate(&mut rng, 0, 2, 1.0).is_empty());
  }

  #[test]
  fn union_find_merges_once() {
    let mut sets = UnionFind::new(4);
    assert!(sets.union(0, 1));
    assert!(sets.union(2, 3));
    assert!(!sets.union(1, 0));
    assert!(sets.union(1, 3));
    assert_eq!(sets.find(0), sets.find(2));
  }

  #[test]
  fn tree_depth_is_ceil_log() {
    assert_eq!(tree_depth(1, 3), 0);
    assert_eq!(tree_depth(3, 3), 1);
    assert_eq!(tree_depth(4, 3), 2);
    assert_eq!(tree_depth(100, 10), 2);
    assert_eq!(tree_depth(101, 10), 3);
  }

  #[test]
  fn balanced_tree_parents_precede_children() {
    let tree = BalancedTree::for_nodes(20, 3);
    assert_eq!(tree.depth, 3);
    assert_eq!(tree.size(), 1 + 3 + 9 + 27);
    assert_eq!(tree.parent(0), None);
    assert_eq!(tree.parent(1), Some(0));
    assert_eq!(tree.parent(3), Some(0));
    assert_eq!(tree.parent(4), Some(1));
    assert!((1..tree.size()).all(|k| tree.parent(k).is_some_and(|p| p < k)));
  }

  #[test]
  fn dgm_node_and_edge_counts() {
    for g in 0..5u32 {
      let graph = dgm_graph(g);
      assert_eq!(graph.len(), (3usize.pow(g) + 3) / 2);
      let degree_sum: usize = graph.iter().map(Vec::len).sum();
      assert_eq!(degree_sum, 2 * 3usize.pow(g));
    }
    assert_eq!(dgm_graph(1), [vec![1, 2], vec![0, 2], vec![0, 1]]);
  }

  #[test]
  fn friendship_generation_thresholds() {
    assert_eq!(friendship_generation(2), 0);
    assert_eq!(friendship_generation(6), 0);
    assert_eq!(friendship_generation(7), 1);
    assert_eq!(friendship_generation(12), 1);
    assert_eq!(friendship_generation(13), 2);
  }
}
