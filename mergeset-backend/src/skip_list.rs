//! An ordered sequence keyed by opaque element ids with O(log n) positional
//! lookup, grounded on the probabilistic skip list used by the reference
//! backend for exactly the same purpose: indexing the elements of a list or
//! text object by the op id that inserted them.
//!
//! Tie-breaking during iteration is insertion order, not key order -- the
//! level towers only exist to make `key_of`/`index_of` fast, they don't
//! change what order the list logically holds its elements in.
#![allow(dead_code)]

use std::{
    cmp::{max, min},
    fmt::Debug,
    hash::Hash,
    ops::AddAssign,
};

use im_rc::HashMap;
use rand::Rng;

use crate::error::{MergesetError, Result};

#[derive(Debug, Clone, PartialEq)]
struct Link<K>
where
    K: Clone + Debug + PartialEq,
{
    key: Option<K>,
    count: usize,
}

impl<K> AddAssign for Link<K>
where
    K: Clone + Debug + PartialEq,
{
    fn add_assign(&mut self, other: Self) {
        *self = Self {
            key: other.key,
            count: self.count + other.count,
        };
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Tower<K>
where
    K: Clone + Debug + PartialEq,
{
    next: Vec<Link<K>>,
    prev: Vec<Link<K>>,
    level: usize,
    is_head: bool,
}

impl<K> Tower<K>
where
    K: Debug + Clone + PartialEq,
{
    fn successor(&self) -> &Option<K> {
        if self.next.is_empty() {
            &None
        } else {
            &self.next[0].key
        }
    }

    fn remove_after(&mut self, from_level: usize, removed_level: usize, links: &[Link<K>]) {
        for (level, item) in links.iter().enumerate().take(self.level).skip(from_level) {
            if level < removed_level {
                self.next[level] = item.clone();
            } else {
                self.next[level].count -= 1;
            }
        }
    }

    fn remove_before(&mut self, from_level: usize, removed_level: usize, links: &[Link<K>]) {
        for (level, item) in links.iter().enumerate().take(self.level).skip(from_level) {
            if level < removed_level {
                self.prev[level] = item.clone();
            } else {
                self.prev[level].count -= 1;
            }
        }
    }

    fn insert_after(
        &mut self,
        new_key: &K,
        new_level: usize,
        from_level: usize,
        distance: usize,
    ) -> Result<()> {
        if new_level > self.level && !self.is_head {
            return Err(MergesetError::SkipList(
                "cannot increase the level of a non-head node".to_string(),
            ));
        }
        self.level = max(self.level, new_level);
        for level in from_level..self.level {
            if level < new_level {
                let link = Link {
                    key: Some(new_key.clone()),
                    count: distance,
                };
                if self.next.len() == level {
                    self.next.push(link);
                } else {
                    self.next[level] = link;
                }
            } else {
                self.next[level].count += 1;
            }
        }
        Ok(())
    }

    fn insert_before(
        &mut self,
        new_key: &K,
        new_level: usize,
        from_level: usize,
        distance: usize,
    ) -> Result<()> {
        if new_level > self.level {
            return Err(MergesetError::SkipList(
                "cannot increase the level on insert-before".to_string(),
            ));
        }
        for level in from_level..self.level {
            if level < new_level {
                self.prev[level] = Link {
                    key: Some(new_key.clone()),
                    count: distance,
                };
            } else {
                self.prev[level].count += 1;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Node<K, V>
where
    K: Clone + Debug + PartialEq,
    V: Clone + Debug + PartialEq,
{
    tower: Tower<K>,
    key: K,
    value: V,
}

/// Ordered sequence of `(key, value)` pairs. Cloning is O(1) amortized: the
/// node table is a persistent (structurally shared) map, so cloning a
/// `SkipList` at a version-registry boundary doesn't copy the whole thing.
#[derive(Debug, Clone)]
pub(crate) struct SkipList<K, V>
where
    K: Clone + Debug + Hash + PartialEq + Eq,
    V: Clone + Debug + PartialEq,
{
    nodes: HashMap<K, Node<K, V>>,
    head: Tower<K>,
    len: usize,
}

impl<K, V> PartialEq for SkipList<K, V>
where
    K: Clone + Debug + Hash + PartialEq + Eq,
    V: Clone + Debug + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.nodes.eq(&other.nodes)
    }
}

impl<K, V> Default for SkipList<K, V>
where
    K: Clone + Debug + Hash + PartialEq + Eq,
    V: Clone + Debug + PartialEq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> SkipList<K, V>
where
    K: Clone + Debug + Hash + PartialEq + Eq,
    V: Clone + Debug + PartialEq,
{
    pub fn new() -> Self {
        SkipList {
            nodes: HashMap::new(),
            head: Tower {
                next: Vec::new(),
                prev: Vec::new(),
                level: 1,
                is_head: true,
            },
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.nodes.get(key).map(|n| &n.value)
    }

    fn get_tower(&self, key: &Option<K>) -> Result<&Tower<K>> {
        match key {
            Some(k) => self
                .nodes
                .get(k)
                .map(|n| &n.tower)
                .ok_or_else(|| MergesetError::SkipList("key not found".to_string())),
            None => Ok(&self.head),
        }
    }

    fn get_tower_mut(&mut self, key: &Option<K>) -> Result<&mut Tower<K>> {
        match key {
            Some(k) => self
                .nodes
                .get_mut(k)
                .map(|n| &mut n.tower)
                .ok_or_else(|| MergesetError::SkipList("key not found".to_string())),
            None => Ok(&mut self.head),
        }
    }

    fn predecessors(&self, predecessor: &Option<K>, max_level: usize) -> Result<Vec<Link<K>>> {
        let mut pre = vec![Link {
            key: predecessor.clone(),
            count: 1,
        }];
        for level in 1..max_level {
            let mut link = pre[level - 1].clone();
            while link.key.is_some() {
                let node = self.get_tower(&link.key)?;
                if node.level > level {
                    break;
                }
                if node.level < level {
                    return Err(MergesetError::SkipList(
                        "level lower than expected".to_string(),
                    ));
                }
                link += node.prev[level - 1].clone();
            }
            pre.push(link);
        }
        Ok(pre)
    }

    fn successors(&self, successor: &Option<K>, max_level: usize) -> Result<Vec<Link<K>>> {
        let mut suc = vec![Link {
            key: successor.clone(),
            count: 1,
        }];
        for level in 1..max_level {
            let mut link = suc[level - 1].clone();
            while link.key.is_some() {
                let tower = self.get_tower(&link.key)?;
                if tower.level > level {
                    break;
                }
                if tower.level < level {
                    return Err(MergesetError::SkipList(
                        "level lower than expected".to_string(),
                    ));
                }
                link += tower.next[level - 1].clone();
            }
            suc.push(link);
        }
        Ok(suc)
    }

    /// Inserts `key` after `predecessor` (or at the head if `None`). Fails
    /// if `key` is already present.
    pub fn insert_after(&mut self, predecessor: Option<&K>, key: K, value: V) -> Result<()> {
        let predecessor = predecessor.cloned();
        if self.nodes.contains_key(&key) {
            return Err(MergesetError::SkipList(format!(
                "key {:?} already present",
                key
            )));
        }

        let new_level = self.random_level();
        let max_level = max(new_level, self.head.level);
        let successor = self.get_tower(&predecessor)?.successor().clone();
        let mut pre = self.predecessors(&predecessor, max_level)?;
        let mut suc = self.successors(&successor, max_level)?;

        self.len += 1;

        let mut pre_level = 0;
        let mut suc_level = 0;
        for level in 1..(max_level + 1) {
            let update_level = min(level, new_level);
            if level == max_level || pre.get(level).map(|l| &l.key) != pre.get(pre_level).map(|l| &l.key)
            {
                self.get_tower_mut(&pre[pre_level].key)?.insert_after(
                    &key,
                    update_level,
                    pre_level,
                    pre[pre_level].count,
                )?;
                pre_level = level;
            }
            if suc[suc_level].key.is_some()
                && (level == max_level
                    || suc.get(level).map(|l| &l.key) != suc.get(suc_level).map(|l| &l.key))
            {
                self.get_tower_mut(&suc[suc_level].key)?.insert_before(
                    &key,
                    update_level,
                    suc_level,
                    suc[suc_level].count,
                )?;
                suc_level = level;
            }
        }

        pre.truncate(new_level);
        suc.truncate(new_level);
        self.nodes.insert(
            key.clone(),
            Node {
                key,
                value,
                tower: Tower {
                    level: new_level,
                    prev: pre,
                    next: suc,
                    is_head: false,
                },
            },
        );
        Ok(())
    }

    /// Removes `key`. Fails if it is absent.
    pub fn remove_key(&mut self, key: &K) -> Result<V> {
        let removed = self
            .nodes
            .remove(key)
            .ok_or_else(|| MergesetError::SkipList(format!("key {:?} not present", key)))?;
        let max_level = self.head.level;
        let mut pre = self.predecessors(&removed.tower.prev[0].key, max_level)?;
        let mut suc = self.successors(&removed.tower.next[0].key, max_level)?;

        for i in 0..max_level {
            let distance = pre[i].count + suc[i].count - 1;
            pre[i].count = distance;
            suc[i].count = distance;
        }

        self.len -= 1;
        let mut pre_level = 0;
        let mut suc_level = 0;

        for level in 1..(max_level + 1) {
            let update_level = min(level, removed.tower.level);
            if level == max_level
                || pre.get(level).map(|l| &l.key) != pre.get(pre_level).map(|l| &l.key)
            {
                self.get_tower_mut(&pre[pre_level].key)?
                    .remove_after(pre_level, update_level, &suc);
                pre_level = level;
            }
            if suc[suc_level].key.is_some()
                && (level == max_level
                    || suc.get(level).map(|l| &l.key) != suc.get(suc_level).map(|l| &l.key))
            {
                self.get_tower_mut(&suc[suc_level].key)?
                    .remove_before(suc_level, update_level, &pre);
                suc_level = level;
            }
        }
        Ok(removed.value)
    }

    /// 0-based positional lookup, O(log n).
    pub fn key_of(&self, index: usize) -> Option<&K> {
        if index >= self.len {
            return None;
        }
        let target = index + 1;
        let mut node = &self.head;
        let mut level = node.level - 1;
        let mut count = 0;
        loop {
            while count + node.next[level].count > target {
                level -= 1;
            }
            count += node.next[level].count;
            let k = &node.next[level].key;
            if count == target {
                return k.as_ref();
            }
            node = self.get_tower(k).ok()?;
        }
    }

    pub fn index_of(&self, key: &K) -> Option<usize> {
        if !self.nodes.contains_key(key) {
            return None;
        }
        let mut count = 0;
        let mut k = key.clone();
        loop {
            let node = self.nodes.get(&k)?;
            let link = &node.tower.prev[node.tower.level - 1];
            count += link.count;
            match &link.key {
                Some(next) => k = next.clone(),
                None => break,
            }
        }
        Some(count - 1)
    }

    pub fn iter(&self) -> SkipIter<'_, K, V> {
        SkipIter {
            next: self.head.successor(),
            nodes: &self.nodes,
        }
    }

    // Returns k with probability (1/4)^(k-1) * 3/4 -- the usual skip list
    // geometric level distribution with p = 0.75.
    fn random_level(&self) -> usize {
        let mut rng = rand::thread_rng();
        let rand: u32 = rng.gen();
        let mut level = 1;
        while rand < 1 << (32 - 2 * level) && level < 16 {
            level += 1;
        }
        level
    }
}

pub(crate) struct SkipIter<'a, K, V>
where
    K: Debug + Clone + Hash + PartialEq + Eq,
    V: Debug + Clone + PartialEq,
{
    next: &'a Option<K>,
    nodes: &'a HashMap<K, Node<K, V>>,
}

impl<'a, K, V> Iterator for SkipIter<'a, K, V>
where
    K: Debug + Clone + Hash + PartialEq + Eq,
    V: Debug + Clone + PartialEq,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.next.as_ref()?;
        let node = self.nodes.get(key).expect("skip list iterator hit a dangling key");
        self.next = node.tower.successor();
        Some((key, &node.value))
    }
}

impl<'a, K, V> IntoIterator for &'a SkipList<K, V>
where
    K: Debug + Clone + Hash + PartialEq + Eq,
    V: Debug + Clone + PartialEq,
{
    type Item = (&'a K, &'a V);
    type IntoIter = SkipIter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_of(n: usize) -> SkipList<usize, ()> {
        let mut list = SkipList::new();
        let mut prev = None;
        for i in 0..n {
            list.insert_after(prev.as_ref(), i, ()).unwrap();
            prev = Some(i);
        }
        list
    }

    #[test]
    fn keeps_insertion_order_and_supports_positional_lookup() {
        let list = list_of(10);
        assert_eq!(list.len(), 10);
        for i in 0..10 {
            assert_eq!(list.key_of(i), Some(&i));
            assert_eq!(list.index_of(&i), Some(i));
        }
        assert_eq!(list.key_of(10), None);
    }

    #[test]
    fn insert_after_middle_shifts_indices() {
        let mut list = list_of(3); // 0, 1, 2
        list.insert_after(Some(&0), 99, ()).unwrap();
        assert_eq!(list.key_of(0), Some(&0));
        assert_eq!(list.key_of(1), Some(&99));
        assert_eq!(list.key_of(2), Some(&1));
        assert_eq!(list.key_of(3), Some(&2));
    }

    #[test]
    fn remove_key_updates_length_and_positions() {
        let mut list = list_of(5); // 0..4
        list.remove_key(&1).unwrap();
        assert_eq!(list.len(), 4);
        assert_eq!(list.index_of(&1), None);
        assert_eq!(list.key_of(0), Some(&0));
        assert_eq!(list.key_of(1), Some(&2));
    }

    #[test]
    fn duplicate_insert_fails() {
        let mut list = list_of(1);
        assert!(list.insert_after(None, 0, ()).is_err());
    }

    #[test]
    fn remove_absent_key_fails() {
        let mut list: SkipList<usize, ()> = SkipList::new();
        assert!(list.remove_key(&5).is_err());
    }
}
