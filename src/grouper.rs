use std::collections::BTreeMap;

use log::{debug, info};

use crate::scanner::FileRecord;

/// Files bucketed by exact byte size. Only buckets with two or more members
/// survive [`group_by_size`].
pub type SizeGroups = BTreeMap<u64, Vec<FileRecord>>;

/// Partitions `records` by size and drops every bucket with a single member,
/// so nothing downstream ever hashes a file that has no same-size peer.
///
/// Zero-byte files are grouped like any other size. Order inside a bucket
/// follows input order.
pub fn group_by_size<I>(records: I) -> SizeGroups
where
    I: IntoIterator<Item = FileRecord>,
{
    let mut groups: SizeGroups = BTreeMap::new();
    let mut total = 0usize;
    for record in records {
        total += 1;
        groups.entry(record.size).or_default().push(record);
    }

    let sizes_seen = groups.len();
    groups.retain(|size, bucket| {
        if bucket.len() < 2 {
            debug!("Unique size {} bytes: '{}'", size, bucket[0].path.display());
            false
        } else {
            true
        }
    });

    let candidates: usize = groups.values().map(Vec::len).sum();
    info!(
        "Grouped {} files into {} distinct sizes; {} candidates in {} size groups",
        total,
        sizes_seen,
        candidates,
        groups.len()
    );
    groups
}

/// Number of files that will need a digest.
pub fn candidate_count(groups: &SizeGroups) -> usize {
    groups.values().map(Vec::len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{Duration, UNIX_EPOCH};

    fn record(path: &str, size: u64) -> FileRecord {
        FileRecord {
            path: PathBuf::from(path),
            size,
            mtime: UNIX_EPOCH + Duration::from_secs(1),
        }
    }

    #[test]
    fn drops_unique_sizes() {
        let groups = group_by_size(vec![
            record("/a", 10),
            record("/b", 20),
            record("/c", 10),
        ]);
        assert_eq!(groups.len(), 1);
        let bucket = &groups[&10];
        assert_eq!(bucket.len(), 2);
        assert_eq!(bucket[0].path, PathBuf::from("/a"));
        assert_eq!(bucket[1].path, PathBuf::from("/c"));
        assert!(!groups.contains_key(&20));
        assert_eq!(candidate_count(&groups), 2);
    }

    #[test]
    fn keeps_zero_byte_files() {
        let groups = group_by_size(vec![record("/e1", 0), record("/e2", 0)]);
        assert_eq!(groups[&0].len(), 2);
    }

    #[test]
    fn every_bucket_shares_one_size() {
        let records: Vec<_> = (0..30)
            .map(|i| record(&format!("/f{i}"), (i % 7) as u64))
            .collect();
        let groups = group_by_size(records);
        for (size, bucket) in &groups {
            assert!(bucket.len() >= 2);
            assert!(bucket.iter().all(|r| r.size == *size));
        }
    }

    #[test]
    fn empty_input() {
        assert!(group_by_size(Vec::new()).is_empty());
    }
}
