//! 分类树（子节点 -> 父节点），含合并 ID 重定向与 LCA 归约。
//!
//! 在 worker 启动前从 NCBI `nodes.dmp` / `merged.dmp` 格式的文件加载一次，之后只读共享。

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::warn;

use crate::error::TaxonomyError;

/// NCBI 根节点
pub const ROOT: u64 = 1;

/// 向上回溯的最大步数，损坏的分类树中可能有环
const MAX_DEPTH: usize = 4096;

#[derive(Debug, Default, Clone)]
pub struct Taxonomy {
    parents: HashMap<u64, u64>,
    merged: HashMap<u64, u64>,
}

impl Taxonomy {
    pub fn from_parents<I: IntoIterator<Item = (u64, u64)>>(pairs: I) -> Self {
        Self { parents: pairs.into_iter().collect(), merged: HashMap::new() }
    }

    pub fn with_merged<I: IntoIterator<Item = (u64, u64)>>(mut self, pairs: I) -> Self {
        self.merged.extend(pairs);
        self
    }

    /// 解析 `taxid | parent | ...` 记录，多余的列忽略
    pub fn parse_nodes<R: BufRead>(reader: R) -> Result<HashMap<u64, u64>, TaxonomyError> {
        parse_pairs(reader)
    }

    /// 加载 `nodes.dmp`，以及可选的 `merged.dmp`（`old | new |`）
    pub fn load(nodes: &Path, merged: Option<&Path>) -> Result<Self, TaxonomyError> {
        let parents = parse_pairs(open(nodes)?)?;
        if parents.is_empty() {
            return Err(TaxonomyError::Empty);
        }
        let mut tax = Self { parents, merged: HashMap::new() };
        if let Some(m) = merged {
            tax.merged = parse_pairs(open(m)?)?;
        }
        Ok(tax)
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// 沿合并重定向找到当前 ID
    pub fn resolve(&self, mut id: u64) -> u64 {
        for _ in 0..MAX_DEPTH {
            match self.merged.get(&id) {
                Some(&next) if next != id => id = next,
                _ => break,
            }
        }
        id
    }

    pub fn contains(&self, id: u64) -> bool {
        self.parents.contains_key(&id)
    }

    pub fn parent(&self, id: u64) -> Option<u64> {
        self.parents.get(&id).copied()
    }

    /// 从 `id` 到根的路径（两端都含）；未知 ID 返回空
    pub fn lineage(&self, id: u64) -> Vec<u64> {
        let mut path = Vec::new();
        if !self.contains(id) {
            return path;
        }
        let mut node = id;
        path.push(node);
        while path.len() < MAX_DEPTH {
            match self.parents.get(&node) {
                Some(&p) if p != node && !path.contains(&p) => {
                    path.push(p);
                    node = p;
                }
                _ => break,
            }
        }
        path
    }

    /// 两个（已重定向的）分类号的 LCA
    pub fn lca_pair(&self, a: u64, b: u64) -> u64 {
        self.lca([a, b]).unwrap_or(ROOT)
    }

    /// `ids` 经合并重定向后所有不同分类号的最近公共祖先。
    /// 树中不存在的 ID 被跳过，没有可用 ID 时返回 None；只在根处交汇时返回根。
    pub fn lca<I: IntoIterator<Item = u64>>(&self, ids: I) -> Option<u64> {
        let mut distinct: BTreeSet<u64> = BTreeSet::new();
        for id in ids {
            let r = self.resolve(id);
            if self.contains(r) {
                distinct.insert(r);
            } else {
                warn!("taxon id {} is not contained in the taxonomic tree", id);
            }
        }
        let mut iter = distinct.into_iter();
        let first = iter.next()?;
        let mut path = self.lineage(first);
        for id in iter {
            let other: HashSet<u64> = self.lineage(id).into_iter().collect();
            match path.iter().position(|t| other.contains(t)) {
                Some(i) => {
                    path.drain(..i);
                }
                // disconnected trees only share the conceptual root
                None => return Some(ROOT),
            }
            if path.len() == 1 {
                break;
            }
        }
        path.first().copied()
    }

    /// `a` 与 `b` 是否在根以下有共同祖先
    pub fn compatible(&self, a: u64, b: u64) -> bool {
        let a = self.resolve(a);
        let b = self.resolve(b);
        if !self.contains(a) || !self.contains(b) {
            return false;
        }
        let l = self.lca_pair(a, b);
        !self.is_root(l)
    }

    pub fn is_root(&self, id: u64) -> bool {
        id == ROOT || self.parents.get(&id).map_or(false, |&p| p == id)
    }
}

fn open(path: &Path) -> Result<BufReader<File>, TaxonomyError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| TaxonomyError::Io { path: path.to_path_buf(), source })
}

fn parse_pairs<R: BufRead>(reader: R) -> Result<HashMap<u64, u64>, TaxonomyError> {
    let mut map = HashMap::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| TaxonomyError::Io { path: "<stream>".into(), source })?;
        if line.trim().is_empty() {
            continue;
        }
        let mut cols = line.split('|').map(str::trim);
        let child = cols.next().and_then(|c| c.parse::<u64>().ok());
        let parent = cols.next().and_then(|c| c.parse::<u64>().ok());
        match (child, parent) {
            (Some(c), Some(p)) => {
                map.insert(c, p);
            }
            _ => return Err(TaxonomyError::Malformed { line: n + 1, record: line }),
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    /// 1 -> 5 -> 7 -> 10, 5 -> 20, 1 -> 30
    fn small_tree() -> Taxonomy {
        Taxonomy::from_parents([(1, 1), (5, 1), (7, 5), (10, 7), (20, 5), (30, 1)])
            .with_merged([(99, 10)])
    }

    #[test]
    fn parse_nodes_dmp() {
        let data = "1\t|\t1\t|\tno rank\t|\n2\t|\t1\t|\tsuperkingdom\t|\n\n6\t|\t2\t|\tgenus\t|\n";
        let map = Taxonomy::parse_nodes(Cursor::new(data)).expect("parse");
        assert_eq!(map.len(), 3);
        assert_eq!(map[&6], 2);
        assert_eq!(map[&1], 1);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = Taxonomy::parse_nodes(Cursor::new("1\t|\t1\t|\nabc\t|\t1\n")).unwrap_err();
        assert!(matches!(err, TaxonomyError::Malformed { line: 2, .. }));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = Taxonomy::load(Path::new("/nonexistent/nodes.dmp"), None).unwrap_err();
        assert!(matches!(err, TaxonomyError::Io { .. }));
    }

    #[test]
    fn load_nodes_and_merged() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nodes = dir.path().join("nodes.dmp");
        let merged = dir.path().join("merged.dmp");
        std::fs::write(&nodes, "1\t|\t1\t|\n5\t|\t1\t|\n10\t|\t5\t|\n").expect("write");
        std::fs::write(&merged, "42\t|\t10\t|\n").expect("write");
        let tax = Taxonomy::load(&nodes, Some(&merged)).expect("load");
        assert_eq!(tax.len(), 3);
        assert_eq!(tax.resolve(42), 10);
        assert_eq!(tax.lca([42, 10]), Some(10));
    }

    #[test]
    fn lineage_walks_to_root() {
        let tax = small_tree();
        assert_eq!(tax.lineage(10), vec![10, 7, 5, 1]);
        assert!(tax.lineage(12345).is_empty());
    }

    #[test]
    fn lca_of_siblings_and_single() {
        let tax = small_tree();
        assert_eq!(tax.lca([10, 20]), Some(5));
        assert_eq!(tax.lca([10]), Some(10));
        assert_eq!(tax.lca([10, 10, 10]), Some(10));
        assert_eq!(tax.lca([10, 7]), Some(7));
    }

    #[test]
    fn lca_meeting_only_at_root_is_root() {
        let tax = small_tree();
        assert_eq!(tax.lca([10, 30]), Some(ROOT));
        assert!(!tax.compatible(10, 30));
        assert!(tax.compatible(10, 20));
    }

    #[test]
    fn lca_follows_merged_and_skips_unknown() {
        let tax = small_tree();
        assert_eq!(tax.lca([99, 20]), Some(5));
        assert_eq!(tax.lca([12345, 20]), Some(20));
        assert_eq!(tax.lca([12345]), None);
        assert_eq!(tax.lca(std::iter::empty()), None);
    }

    proptest! {
        #[test]
        fn lca_is_order_independent(mut ids in proptest::collection::vec(
            prop::sample::select(vec![1u64, 5, 7, 10, 20, 30, 99]), 1..12)) {
            let tax = small_tree();
            let forward = tax.lca(ids.iter().copied());
            ids.reverse();
            prop_assert_eq!(forward, tax.lca(ids.iter().copied()));
            ids.sort_unstable();
            prop_assert_eq!(forward, tax.lca(ids.iter().copied()));
        }

        #[test]
        fn lca_is_idempotent(ids in proptest::collection::vec(
            prop::sample::select(vec![5u64, 7, 10, 20, 30]), 1..8)) {
            let tax = small_tree();
            let once = tax.lca(ids.iter().copied()).expect("known ids");
            prop_assert_eq!(tax.lca([once]), Some(once));
            let mut doubled = ids.clone();
            doubled.extend(ids.iter().copied());
            prop_assert_eq!(tax.lca(doubled), Some(once));
        }
    }
}
