//! Grouping of catalog records by phonetic code
//!
//! Pure functions over a snapshot: nothing here touches the store. Groups
//! are recomputed on every call and have no identity of their own.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::phonetic::{encode, PhoneticCode};

/// A product as seen by duplicate detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: i64,
    pub name: String,
    pub verified: bool,
}

impl CatalogRecord {
    pub fn unverified(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            verified: false,
        }
    }
}

/// Two or more records sharing a phonetic code, in input order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub code: PhoneticCode,
    pub members: Vec<CatalogRecord>,
}

impl DuplicateGroup {
    pub fn member_ids(&self) -> Vec<i64> {
        self.members.iter().map(|m| m.id).collect()
    }
}

/// Grouping policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupingOptions {
    /// When false, records with the empty code are never grouped
    pub include_empty_code: bool,
}

impl Default for GroupingOptions {
    fn default() -> Self {
        Self {
            include_empty_code: true,
        }
    }
}

/// Result of one grouping run
///
/// Groups appear in the order their code was first seen in the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateGroups {
    groups: Vec<DuplicateGroup>,
}

impl DuplicateGroups {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, code: &PhoneticCode) -> Option<&DuplicateGroup> {
        self.groups.iter().find(|g| &g.code == code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DuplicateGroup> {
        self.groups.iter()
    }

    /// Whether any group contains the record
    pub fn contains_id(&self, id: i64) -> bool {
        self.groups
            .iter()
            .any(|g| g.members.iter().any(|m| m.id == id))
    }

    pub fn into_map(self) -> BTreeMap<PhoneticCode, Vec<CatalogRecord>> {
        self.groups
            .into_iter()
            .map(|g| (g.code, g.members))
            .collect()
    }
}

impl IntoIterator for DuplicateGroups {
    type Item = DuplicateGroup;
    type IntoIter = std::vec::IntoIter<DuplicateGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

/// What a reviewer sees for each member
#[derive(Serialize)]
struct MemberView<'a> {
    id: i64,
    name: &'a str,
}

/// Serialized as `{code: [{id, name}, ...]}`
impl Serialize for DuplicateGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for group in &self.groups {
            let members: Vec<MemberView<'_>> = group
                .members
                .iter()
                .map(|m| MemberView {
                    id: m.id,
                    name: &m.name,
                })
                .collect();
            map.serialize_entry(group.code.as_str(), &members)?;
        }
        map.end()
    }
}

/// Group records by the in-process encoder
pub fn group(records: Vec<CatalogRecord>, options: GroupingOptions) -> DuplicateGroups {
    group_coded(
        records.into_iter().map(|r| (encode(&r.name), r)),
        options,
    )
}

/// Group records whose codes were computed elsewhere
pub fn group_coded<I>(coded: I, options: GroupingOptions) -> DuplicateGroups
where
    I: IntoIterator<Item = (PhoneticCode, CatalogRecord)>,
{
    let mut buckets: Vec<DuplicateGroup> = Vec::new();
    let mut index: HashMap<PhoneticCode, usize> = HashMap::new();

    for (code, record) in coded {
        if code.is_empty() && !options.include_empty_code {
            continue;
        }

        match index.get(&code) {
            Some(&slot) => buckets[slot].members.push(record),
            None => {
                index.insert(code.clone(), buckets.len());
                buckets.push(DuplicateGroup {
                    code,
                    members: vec![record],
                });
            }
        }
    }

    buckets.retain(|g| g.members.len() >= 2);

    DuplicateGroups { groups: buckets }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(names: &[&str]) -> Vec<CatalogRecord> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| CatalogRecord::unverified(i as i64 + 1, *n))
            .collect()
    }

    #[test]
    fn singletons_are_elided() {
        let groups = group(records(&["Pepsi", "Arroz", "Leche"]), GroupingOptions::default());
        assert!(groups.is_empty());
    }

    #[test]
    fn soundalikes_group_in_input_order() {
        let groups = group(
            records(&["Coca Cola", "Coka Cola", "Pepsi"]),
            GroupingOptions::default(),
        );

        assert_eq!(groups.len(), 1);
        let g = groups.iter().next().unwrap();
        assert_eq!(g.code.as_str(), "C224");
        assert_eq!(g.member_ids(), vec![1, 2]);
        assert!(!groups.contains_id(3));
    }

    #[test]
    fn anchor_letter_separates_otherwise_equal_sounds() {
        let groups = group(
            records(&["Coca Cola", "Koka Kola"]),
            GroupingOptions::default(),
        );
        assert!(groups.is_empty());
    }

    #[test]
    fn groups_follow_first_seen_order() {
        let groups = group(
            records(&["Smith", "Robert", "Smyth", "Rupert", "Schmidt"]),
            GroupingOptions::default(),
        );

        let codes: Vec<&str> = groups.iter().map(|g| g.code.as_str()).collect();
        assert_eq!(codes, vec!["S530", "R163"]);
        assert_eq!(groups.get(&encode("Smith")).unwrap().member_ids(), vec![1, 3, 5]);
        assert_eq!(groups.get(&encode("Rupert")).unwrap().member_ids(), vec![2, 4]);
    }

    #[test]
    fn empty_code_is_its_own_class_unless_excluded() {
        let input = records(&["", "123", "Pan"]);

        let included = group(input.clone(), GroupingOptions::default());
        assert_eq!(included.len(), 1);
        assert_eq!(included.get(&PhoneticCode::empty()).unwrap().member_ids(), vec![1, 2]);

        let excluded = group(
            input,
            GroupingOptions {
                include_empty_code: false,
            },
        );
        assert!(excluded.is_empty());
    }

    #[test]
    fn membership_matches_code_equality() {
        let input = records(&[
            "Fideos", "Fidos", "Harina", "Harrina", "Yerba", "Yerva", "Sal", "Azucar",
        ]);
        let groups = group(input.clone(), GroupingOptions::default());

        for a in &input {
            for b in &input {
                let together = groups
                    .iter()
                    .any(|g| g.member_ids().contains(&a.id) && g.member_ids().contains(&b.id));
                let same_code = encode(&a.name) == encode(&b.name);
                assert_eq!(
                    together,
                    same_code && groups.contains_id(a.id),
                    "{} / {}",
                    a.name,
                    b.name
                );
            }
        }
        assert!(groups.iter().all(|g| g.members.len() >= 2));
    }

    #[test]
    fn serializes_as_code_to_members_map() {
        let groups = group(records(&["Smith", "Smyth"]), GroupingOptions::default());
        let json = serde_json::to_value(&groups).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "S530": [{"id": 1, "name": "Smith"}, {"id": 2, "name": "Smyth"}]
            })
        );
    }

    #[test]
    fn into_map_keeps_member_order() {
        let map = group(records(&["Robert", "Rupert"]), GroupingOptions::default()).into_map();
        let members = &map[&encode("Robert")];
        assert_eq!(members.iter().map(|m| m.id).collect::<Vec<_>>(), vec![1, 2]);
    }
}
