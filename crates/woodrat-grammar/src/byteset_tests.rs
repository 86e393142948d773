use crate::ByteSet;

#[test]
fn membership_after_insert() {
    let mut set = ByteSet::new();
    set.insert(b'a');
    set.insert_range(b'0', b'9');

    assert!(set.contains(b'a'));
    assert!(set.contains(b'0'));
    assert!(set.contains(b'5'));
    assert!(set.contains(b'9'));
    assert!(!set.contains(b'b'));
    assert_eq!(set.len(), 11);
}

#[test]
fn inverted_range_is_empty() {
    let mut set = ByteSet::new();
    set.insert_range(b'z', b'a');
    assert!(set.is_empty());
}

#[test]
fn complement_flips_every_value() {
    let digits = ByteSet::range(b'0', b'9');
    let other = digits.complement();

    for b in 0..=255u8 {
        assert_eq!(digits.contains(b), !other.contains(b), "byte {b:#04x}");
    }
    assert_eq!(other.len(), 246);
}

#[test]
fn union_merges_members() {
    let lower = ByteSet::range(b'a', b'z');
    let upper = ByteSet::range(b'A', b'Z');
    let both = lower.union(&upper);

    assert!(both.contains(b'q'));
    assert!(both.contains(b'Q'));
    assert!(!both.contains(b'0'));
    assert_eq!(both.len(), 52);
}

#[test]
fn ranges_reconstruct_the_set() {
    let mut set = ByteSet::new();
    set.insert_range(b'0', b'9');
    set.insert(b'_');
    set.insert_range(b'a', b'f');
    set.insert(0);
    set.insert(255);

    let rebuilt: ByteSet = set
        .ranges()
        .flat_map(|(lo, hi)| lo..=hi)
        .collect();
    assert_eq!(rebuilt, set);

    let runs: Vec<(u8, u8)> = set.ranges().collect();
    assert_eq!(
        runs,
        [(0, 0), (b'0', b'9'), (b'_', b'_'), (b'a', b'f'), (255, 255)]
    );
}

#[test]
fn full_set_is_one_run() {
    let runs: Vec<(u8, u8)> = ByteSet::FULL.ranges().collect();
    assert_eq!(runs, [(0, 255)]);
}

#[test]
fn display_uses_compact_runs() {
    let mut set = ByteSet::range(b'0', b'9');
    set.insert(b'x');
    assert_eq!(set.to_string(), "[0-9x]");

    let pair = ByteSet::range(b'a', b'b');
    assert_eq!(pair.to_string(), "[ab]");

    let mut escaped = ByteSet::single(b'\n');
    escaped.insert(0x01);
    assert_eq!(escaped.to_string(), "[\\x01\\n]");
}
